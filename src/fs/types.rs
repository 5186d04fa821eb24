//! File System Types
//!
//! The async filesystem abstraction consumed by file completion and the
//! filesystem validators. Two backends: the real disk (`OsFs`) and an
//! in-memory tree for hermetic tests (`InMemoryFs`).

use async_trait::async_trait;
use thiserror::Error;

/// File system errors
#[derive(Error, Debug, Clone)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("ENOTDIR: not a directory, {operation} '{path}'")]
    NotDirectory { path: String, operation: String },

    #[error("ELOOP: too many levels of symbolic links, {operation} '{path}'")]
    SymlinkLoop { path: String, operation: String },

    #[error("{message}")]
    Other { message: String },
}

impl FsError {
    pub fn not_found(operation: &str, path: &str) -> Self {
        FsError::NotFound {
            path: path.to_string(),
            operation: operation.to_string(),
        }
    }
}

/// File status information
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// Directory entry with file type information
#[derive(Debug, Clone)]
pub struct DirentEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// Abstract filesystem interface, cut to the operations completion needs
/// plus the writes tests use to build fixtures.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists (follows symlinks)
    async fn exists(&self, path: &str) -> bool;

    /// Get file/directory information (follows symlinks)
    async fn stat(&self, path: &str) -> Result<FsStat, FsError>;

    /// Get file/directory information (does not follow symlinks)
    async fn lstat(&self, path: &str) -> Result<FsStat, FsError>;

    /// Read directory contents with file type information
    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError>;

    /// Create a directory and any missing parents
    async fn mkdir(&self, path: &str) -> Result<(), FsError>;

    /// Write content to a file, creating it if it doesn't exist
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Create a symbolic link
    async fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError>;

    /// Resolve a relative path against a base path
    fn resolve_path(&self, base: &str, path: &str) -> String;
}
