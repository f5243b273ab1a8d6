//! Indexer settings.
//!
//! Every field has a default, so a partial JSON document (or none at all) is a
//! valid configuration. `BEANSCOPE_CACHE_DIR` overrides the symbol cache
//! location when loading from the environment.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CACHE_DIR_ENV: &str = "BEANSCOPE_CACHE_DIR";

/// Result limit applied by `search` when the configuration sets none.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Index `src/test/java` in addition to `src/main/java`.
    pub scan_test_sources: bool,
    /// Cap on `get_all_symbols` results. `None` returns everything.
    pub max_symbols_in_response: Option<usize>,
    pub symbol_cache_dir: Option<PathBuf>,
    pub use_symbol_cache: bool,
    pub watch_debounce_ms: u64,
    /// Run project `update()` hooks on the blocking pool instead of inline.
    pub async_project_updates: bool,
    /// Fire `Changed` on every descriptor change, even when nothing differs.
    pub always_fire_project_changed: bool,
    /// Queue updates of the same document instead of letting them race.
    pub serialize_document_updates: bool,
    pub ignored_directories: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            scan_test_sources: true,
            max_symbols_in_response: None,
            symbol_cache_dir: None,
            use_symbol_cache: false,
            watch_debounce_ms: 500,
            async_project_updates: false,
            always_fire_project_changed: false,
            serialize_document_updates: false,
            ignored_directories: ["target", "build", "node_modules", ".git"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl IndexerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.symbol_cache_dir = Some(PathBuf::from(dir));
        }
    }

    /// Effective symbol cache directory, `~/.beanscope/symbol_cache` unless set.
    pub fn symbol_cache_location(&self) -> PathBuf {
        self.symbol_cache_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".beanscope")
                .join("symbol_cache")
        })
    }

    pub fn search_limit(&self) -> usize {
        self.max_symbols_in_response.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_directories.iter().any(|d| d == name)
    }
}
