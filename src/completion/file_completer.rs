//! File Completer
//!
//! Completes filesystem paths: splits the cursor token into a directory
//! part and a basename, lists the directory through the filesystem
//! abstraction, and suggests matching entries with a trailing separator on
//! directories so the shell can keep descending.

use std::sync::Arc;

use regex_lite::Regex;

use crate::core::errors::CmdError;
use crate::data::Data;
use crate::fs::SyncFileSystem;

use super::completers::Completer;
use super::record::Completion;

type IgnoreFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub struct FileCompleter {
    fs: Arc<dyn SyncFileSystem>,
    base_dir: String,
    exclude: Option<String>,
    ignore_files: bool,
    ignore_directories: bool,
    ignore_func: Option<IgnoreFn>,
    regexp: Option<Regex>,
    file_types: Vec<String>,
    max_depth: Option<usize>,
}

impl FileCompleter {
    pub fn new(fs: Arc<dyn SyncFileSystem>) -> Self {
        Self {
            fs,
            base_dir: ".".to_string(),
            exclude: None,
            ignore_files: false,
            ignore_directories: false,
            ignore_func: None,
            regexp: None,
            file_types: Vec::new(),
            max_depth: None,
        }
    }

    /// Complete relative to this directory instead of the working dir.
    pub fn base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Skip the given directory (e.g. the working directory itself).
    pub fn exclude_pwd(mut self, path: impl Into<String>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    pub fn ignore_files(mut self) -> Self {
        self.ignore_files = true;
        self
    }

    pub fn ignore_directories(mut self) -> Self {
        self.ignore_directories = true;
        self
    }

    /// Skip entries for which the function returns true.
    pub fn ignore_func<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.ignore_func = Some(Arc::new(f));
        self
    }

    /// Only suggest entries whose name matches the pattern.
    pub fn regexp(mut self, pattern: &str) -> Result<Self, CmdError> {
        let regex = Regex::new(pattern)
            .map_err(|e| CmdError::custom(format!("invalid regex \"{}\": {}", pattern, e)))?;
        self.regexp = Some(regex);
        Ok(self)
    }

    /// Only suggest files with one of the given extensions (sans dot).
    pub fn file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_types = types.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Stop descending past this many directory separators.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    fn empty() -> Completion {
        Completion {
            ignore_filter: true,
            case_insensitive: true,
            space_sentinel: true,
            ..Completion::default()
        }
    }

    fn complete_path(&self, value: &str, data: &Data) -> Result<Completion, CmdError> {
        // During complexecute, a token already naming a directory resolves
        // to itself rather than to its children.
        if data.complexecute && value.ends_with('/') {
            let resolved = self.fs.resolve_path(&self.base_dir, value);
            if self.fs.stat(&resolved).map(|s| s.is_directory).unwrap_or(false) {
                return Ok(Completion {
                    suggestions: vec![value.to_string()],
                    ..Self::empty()
                });
            }
        }

        let (dir_part, base) = match value.rfind('/') {
            Some(i) => (&value[..=i], &value[i + 1..]),
            None => ("", value),
        };

        if let Some(max) = self.max_depth {
            if dir_part.matches('/').count() >= max {
                return Ok(Self::empty());
            }
        }

        let search_dir = if dir_part.is_empty() {
            self.base_dir.clone()
        } else {
            self.fs.resolve_path(&self.base_dir, dir_part)
        };
        let entries = match self.fs.readdir_with_file_types(&search_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(Self::empty()),
        };

        let lowered_base = base.to_lowercase();
        let mut suggestions = Vec::new();
        for entry in entries {
            if !entry.name.to_lowercase().starts_with(&lowered_base) {
                continue;
            }
            if entry.name.starts_with('.') && !base.starts_with('.') {
                continue;
            }
            if let Some(f) = &self.ignore_func {
                if f(&entry.name) {
                    continue;
                }
            }
            if let Some(regex) = &self.regexp {
                if !regex.is_match(&entry.name) {
                    continue;
                }
            }

            let full = self.fs.resolve_path(&search_dir, &entry.name);
            let is_dir = entry.is_directory
                || (entry.is_symlink
                    && self.fs.stat(&full).map(|s| s.is_directory).unwrap_or(false));

            if is_dir {
                if self.ignore_directories {
                    continue;
                }
                if self.exclude.as_deref() == Some(full.as_str()) {
                    continue;
                }
                suggestions.push(format!("{}{}/", dir_part, entry.name));
            } else {
                if self.ignore_files {
                    continue;
                }
                if !self.file_types.is_empty()
                    && !self
                        .file_types
                        .iter()
                        .any(|t| entry.name.ends_with(&format!(".{}", t)))
                {
                    continue;
                }
                suggestions.push(format!("{}{}", dir_part, entry.name));
            }
        }

        Ok(Completion {
            suggestions,
            ..Self::empty()
        })
    }
}

impl Completer<String> for FileCompleter {
    fn complete(&self, sofar: &String, data: &Data) -> Result<Completion, CmdError> {
        self.complete_path(sofar, data)
    }
}

impl Completer<Vec<String>> for FileCompleter {
    fn complete(&self, sofar: &Vec<String>, data: &Data) -> Result<Completion, CmdError> {
        let cursor = sofar.last().map(|s| s.as_str()).unwrap_or("");
        self.complete_path(cursor, data)
    }
}

// ============================================================================
// Tests
// ============================================================================
