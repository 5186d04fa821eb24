//! Sync FileSystem Adapter
//!
//! Bridges the async `FileSystem` trait into the synchronous engine.
//! Uses `tokio::task::block_in_place` + `Handle::block_on`, so callers
//! must be running under a multi-threaded runtime.

use std::sync::Arc;

use super::types::{DirentEntry, FileSystem, FsError, FsStat};

/// The synchronous view consumed by the file completer and validators.
pub trait SyncFileSystem: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn stat(&self, path: &str) -> Result<FsStat, FsError>;
    fn lstat(&self, path: &str) -> Result<FsStat, FsError>;
    fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError>;
    fn resolve_path(&self, base: &str, path: &str) -> String;
}

/// Adapter that wraps an async FileSystem and provides a sync interface.
pub struct SyncFsAdapter {
    inner: Arc<dyn FileSystem>,
    handle: tokio::runtime::Handle,
}

impl SyncFsAdapter {
    pub fn new(fs: Arc<dyn FileSystem>, handle: tokio::runtime::Handle) -> Self {
        Self { inner: fs, handle }
    }

    /// Wrap using the ambient runtime handle.
    pub fn from_current(fs: Arc<dyn FileSystem>) -> Self {
        Self::new(fs, tokio::runtime::Handle::current())
    }

    fn block_on<F, T>(&self, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        tokio::task::block_in_place(|| self.handle.block_on(f))
    }
}

impl SyncFileSystem for SyncFsAdapter {
    fn exists(&self, path: &str) -> bool {
        self.block_on(self.inner.exists(path))
    }

    fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        self.block_on(self.inner.stat(path))
    }

    fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        self.block_on(self.inner.lstat(path))
    }

    fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError> {
        self.block_on(self.inner.readdir_with_file_types(path))
    }

    fn resolve_path(&self, base: &str, path: &str) -> String {
        self.inner.resolve_path(base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::in_memory_fs::InMemoryFs;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_adapter_bridges_async_fs() {
        let fs = Arc::new(InMemoryFs::new());
        fs.mkdir("/dir").await.unwrap();
        fs.write_file("/dir/file", b"x").await.unwrap();
        let sync = SyncFsAdapter::from_current(fs);
        assert!(sync.exists("/dir/file"));
        assert!(sync.stat("/dir").unwrap().is_directory);
        let names: Vec<String> = sync
            .readdir_with_file_types("/dir")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["file"]);
    }
}
