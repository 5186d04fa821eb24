//! OS File System Implementation
//!
//! The real-disk backend used by production completion, built on
//! `tokio::fs`.

use async_trait::async_trait;

use super::types::*;

/// Real filesystem backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl OsFs {
    pub fn new() -> Self {
        Self
    }
}

fn stat_from_metadata(meta: &std::fs::Metadata) -> FsStat {
    FsStat {
        is_file: meta.is_file(),
        is_directory: meta.is_dir(),
        is_symlink: meta.file_type().is_symlink(),
    }
}

fn io_error(operation: &str, path: &str, e: std::io::Error) -> FsError {
    if e.kind() == std::io::ErrorKind::NotFound {
        FsError::not_found(operation, path)
    } else {
        FsError::Other {
            message: format!("{}: {} '{}'", e, operation, path),
        }
    }
}

#[async_trait]
impl FileSystem for OsFs {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        tokio::fs::metadata(path)
            .await
            .map(|m| stat_from_metadata(&m))
            .map_err(|e| io_error("stat", path, e))
    }

    async fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        tokio::fs::symlink_metadata(path)
            .await
            .map(|m| stat_from_metadata(&m))
            .map_err(|e| io_error("lstat", path, e))
    }

    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| io_error("scandir", path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| io_error("scandir", path, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io_error("scandir", path, e))?;
            entries.push(DirentEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_file: file_type.is_file(),
                is_directory: file_type.is_dir(),
                is_symlink: file_type.is_symlink(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| io_error("mkdir", path, e))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        tokio::fs::write(path, content)
            .await
            .map_err(|e| io_error("write", path, e))
    }

    async fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError> {
        #[cfg(unix)]
        {
            tokio::fs::symlink(target, link_path)
                .await
                .map_err(|e| io_error("symlink", link_path, e))
        }
        #[cfg(not(unix))]
        {
            let _ = target;
            Err(FsError::Other {
                message: format!("symlink unsupported on this platform: '{}'", link_path),
            })
        }
    }

    fn resolve_path(&self, base: &str, path: &str) -> String {
        let joined = if std::path::Path::new(path).is_absolute() {
            std::path::PathBuf::from(path)
        } else {
            std::path::Path::new(base).join(path)
        };
        joined.to_string_lossy().to_string()
    }
}
