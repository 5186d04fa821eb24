//! In-Memory File System Implementation
//!
//! A pure in-memory tree used for hermetic file-completion tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::*;

#[derive(Debug, Clone)]
enum FsEntry {
    File,
    Directory,
    Symlink { target: String },
}

/// In-memory virtual file system.
pub struct InMemoryFs {
    data: RwLock<HashMap<String, FsEntry>>,
}

impl InMemoryFs {
    /// Create a new filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut data = HashMap::new();
        data.insert("/".to_string(), FsEntry::Directory);
        Self {
            data: RwLock::new(data),
        }
    }

    fn resolve_symlinks(
        data: &HashMap<String, FsEntry>,
        path: &str,
        operation: &str,
    ) -> Result<String, FsError> {
        let mut current = normalize_path(path);
        for _ in 0..16 {
            match data.get(&current) {
                Some(FsEntry::Symlink { target }) => {
                    current = normalize_path(target);
                }
                _ => return Ok(current),
            }
        }
        Err(FsError::SymlinkLoop {
            path: path.to_string(),
            operation: operation.to_string(),
        })
    }

    fn stat_entry(entry: &FsEntry) -> FsStat {
        FsStat {
            is_file: matches!(entry, FsEntry::File),
            is_directory: matches!(entry, FsEntry::Directory),
            is_symlink: matches!(entry, FsEntry::Symlink { .. }),
        }
    }
}

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn exists(&self, path: &str) -> bool {
        let data = self.data.read().await;
        match Self::resolve_symlinks(&data, path, "exists") {
            Ok(resolved) => data.contains_key(&resolved),
            Err(_) => false,
        }
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let data = self.data.read().await;
        let resolved = Self::resolve_symlinks(&data, path, "stat")?;
        match data.get(&resolved) {
            Some(entry) => Ok(Self::stat_entry(entry)),
            None => Err(FsError::not_found("stat", path)),
        }
    }

    async fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        let data = self.data.read().await;
        match data.get(&normalize_path(path)) {
            Some(entry) => Ok(Self::stat_entry(entry)),
            None => Err(FsError::not_found("lstat", path)),
        }
    }

    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError> {
        let data = self.data.read().await;
        let resolved = Self::resolve_symlinks(&data, path, "scandir")?;
        match data.get(&resolved) {
            Some(FsEntry::Directory) => {}
            Some(_) => {
                return Err(FsError::NotDirectory {
                    path: path.to_string(),
                    operation: "scandir".to_string(),
                })
            }
            None => return Err(FsError::not_found("scandir", path)),
        }

        let prefix = if resolved == "/" {
            "/".to_string()
        } else {
            format!("{}/", resolved)
        };
        let mut entries: Vec<DirentEntry> = data
            .iter()
            .filter(|(p, _)| {
                p.starts_with(&prefix) && *p != &resolved && !p[prefix.len()..].contains('/')
            })
            .map(|(p, entry)| {
                let stat = Self::stat_entry(entry);
                DirentEntry {
                    name: p[prefix.len()..].to_string(),
                    is_file: stat.is_file,
                    is_directory: stat.is_directory,
                    is_symlink: stat.is_symlink,
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let mut data = self.data.write().await;
        let normalized = normalize_path(path);
        let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        let mut current = String::new();
        for part in parts {
            current = format!("{}/{}", current, part);
            data.entry(current.clone()).or_insert(FsEntry::Directory);
        }
        Ok(())
    }

    async fn write_file(&self, path: &str, _content: &[u8]) -> Result<(), FsError> {
        let mut data = self.data.write().await;
        let normalized = normalize_path(path);
        ensure_parent_dirs(&mut data, &normalized);
        data.insert(normalized, FsEntry::File);
        Ok(())
    }

    async fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError> {
        let mut data = self.data.write().await;
        let normalized = normalize_path(link_path);
        if data.contains_key(&normalized) {
            return Err(FsError::AlreadyExists {
                path: link_path.to_string(),
                operation: "symlink".to_string(),
            });
        }
        ensure_parent_dirs(&mut data, &normalized);
        data.insert(
            normalized,
            FsEntry::Symlink {
                target: target.to_string(),
            },
        );
        Ok(())
    }

    fn resolve_path(&self, base: &str, path: &str) -> String {
        if path.starts_with('/') {
            normalize_path(path)
        } else {
            normalize_path(&format!("{}/{}", base, path))
        }
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

fn ensure_parent_dirs(data: &mut HashMap<String, FsEntry>, path: &str) {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let mut current = String::new();
    for part in &parts[..parts.len().saturating_sub(1)] {
        current = format!("{}/{}", current, part);
        data.entry(current.clone()).or_insert(FsEntry::Directory);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mkdir_and_readdir() {
        let fs = InMemoryFs::new();
        fs.mkdir("/testdata/dir1").await.unwrap();
        fs.mkdir("/testdata/dir2").await.unwrap();
        fs.write_file("/testdata/file.txt", b"x").await.unwrap();
        let entries = fs.readdir_with_file_types("/testdata").await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["dir1", "dir2", "file.txt"]);
        assert!(entries[0].is_directory);
        assert!(entries[2].is_file);
    }

    #[tokio::test]
    async fn test_stat_follows_symlink() {
        let fs = InMemoryFs::new();
        fs.mkdir("/real").await.unwrap();
        fs.symlink("/real", "/link").await.unwrap();
        assert!(fs.stat("/link").await.unwrap().is_directory);
        assert!(fs.lstat("/link").await.unwrap().is_symlink);
    }

    #[tokio::test]
    async fn test_missing_path_errors() {
        let fs = InMemoryFs::new();
        assert!(!fs.exists("/nope").await);
        assert!(matches!(fs.stat("/nope").await, Err(FsError::NotFound { .. })));
        assert!(matches!(
            fs.readdir_with_file_types("/nope").await,
            Err(FsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_symlink_loop_detected() {
        let fs = InMemoryFs::new();
        fs.symlink("/b", "/a").await.unwrap();
        fs.symlink("/a", "/b").await.unwrap();
        assert!(matches!(fs.stat("/a").await, Err(FsError::SymlinkLoop { .. })));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/../c/./d"), "/a/c/d");
        assert_eq!(normalize_path("a//b/"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_resolve_path() {
        let fs = InMemoryFs::new();
        assert_eq!(fs.resolve_path("/home", "docs"), "/home/docs");
        assert_eq!(fs.resolve_path("/home", "/abs"), "/abs");
    }
}
