use crate::config::IndexerConfig;
use beanscope_api::uri::path_to_uri;
use beanscope_plugin::FileMatcherCap;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// A source file found by a directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub uri: String,
    /// Modification time in milliseconds since the epoch.
    pub last_modified: u64,
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            uri: path_to_uri(path),
            last_modified: modified_millis(path),
        }
    }
}

pub fn modified_millis(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Walks directories for files some language plugin recognizes.
#[derive(Clone)]
pub struct Scanner {
    matchers: Vec<Arc<dyn FileMatcherCap>>,
    ignored_dirs: Vec<String>,
    include_tests: bool,
}

impl Scanner {
    pub fn new(matchers: Vec<Arc<dyn FileMatcherCap>>, config: &IndexerConfig) -> Self {
        Self {
            matchers,
            ignored_dirs: config.ignored_directories.clone(),
            include_tests: config.scan_test_sources,
        }
    }

    pub fn is_relevant_path(&self, path: &Path) -> bool {
        self.matchers.iter().any(|m| {
            m.supports_path(path) && (self.include_tests || !m.is_test_source(path))
        })
    }

    /// Sorted list of relevant files below `root`. A missing root yields none.
    pub fn collect(&self, root: &Path) -> Vec<SourceFile> {
        if !root.exists() {
            return Vec::new();
        }
        let ignored = self.ignored_dirs.clone();
        let mut files: Vec<SourceFile> = WalkBuilder::new(root)
            .filter_entry(move |entry| {
                !entry.file_type().is_some_and(|t| t.is_dir())
                    || entry
                        .file_name()
                        .to_str()
                        .is_none_or(|name| !ignored.iter().any(|d| d == name))
            })
            .build()
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let path = entry.path();
                (path.is_file() && self.is_relevant_path(path)).then(|| SourceFile::from_path(path))
            })
            .collect();
        files.sort_by(|a, b| a.uri.cmp(&b.uri));
        files
    }
}
