//! Persistent per-project symbol cache.
//!
//! One file per project, keyed by a hash of the descriptor path, holding the
//! symbols of every document together with the modification time they were
//! extracted at. A project scan restores from the file only when the set of
//! files and all their timestamps are unchanged.

use crate::error::{BeanscopeError, Result};
use beanscope_api::models::{ProjectKey, Symbol};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;
use xxhash_rust::xxh3::xxh3_64;

const CACHE_VERSION: u32 = 1;
const CACHE_EXTENSION: &str = "symbols";

/// Symbols of one document as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDocument {
    pub last_modified: u64,
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCacheStats {
    pub projects: usize,
    pub documents: usize,
    pub symbols: usize,
    pub size_bytes: u64,
    pub cache_dir: Option<PathBuf>,
}

pub trait SymbolCache: Send + Sync {
    /// Stored symbols when `files` (URI, mtime) matches the stored set exactly.
    fn retrieve(&self, project: &ProjectKey, files: &[(String, u64)]) -> Option<BTreeMap<String, CachedDocument>>;

    fn store(&self, project: &ProjectKey, documents: BTreeMap<String, CachedDocument>);

    fn update_document(&self, project: &ProjectKey, uri: &str, document: CachedDocument);

    fn remove_document(&self, project: &ProjectKey, uri: &str);

    fn remove_project(&self, project: &ProjectKey);

    fn clear(&self) -> Result<()>;

    fn stats(&self) -> SymbolCacheStats;
}

/// Cache that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolCacheVoid;

impl SymbolCache for SymbolCacheVoid {
    fn retrieve(&self, _: &ProjectKey, _: &[(String, u64)]) -> Option<BTreeMap<String, CachedDocument>> {
        None
    }

    fn store(&self, _: &ProjectKey, _: BTreeMap<String, CachedDocument>) {}

    fn update_document(&self, _: &ProjectKey, _: &str, _: CachedDocument) {}

    fn remove_document(&self, _: &ProjectKey, _: &str) {}

    fn remove_project(&self, _: &ProjectKey) {}

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> SymbolCacheStats {
        SymbolCacheStats::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymbolCacheFile {
    version: u32,
    project: String,
    created_at: u64,
    documents: BTreeMap<String, CachedDocument>,
}

impl SymbolCacheFile {
    fn new(project: &ProjectKey) -> Self {
        Self {
            version: CACHE_VERSION,
            project: project.to_string(),
            created_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            documents: BTreeMap::new(),
        }
    }

    fn matches(&self, files: &[(String, u64)]) -> bool {
        self.documents.len() == files.len()
            && files.iter().all(|(uri, mtime)| {
                self.documents
                    .get(uri)
                    .is_some_and(|doc| doc.last_modified == *mtime)
            })
    }
}

/// rmp-serde + zstd files under a cache directory.
pub struct SymbolCacheOnDisk {
    base_dir: PathBuf,
    loaded: DashMap<u64, SymbolCacheFile>,
}

impl SymbolCacheOnDisk {
    pub fn new(base_dir: PathBuf) -> Self {
        if let Err(err) = fs::create_dir_all(&base_dir) {
            tracing::warn!("Cannot create symbol cache dir {}: {}", base_dir.display(), err);
        }
        Self {
            base_dir,
            loaded: DashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn project_hash(project: &ProjectKey) -> u64 {
        xxh3_64(project.to_string().as_bytes())
    }

    fn cache_path(&self, hash: u64) -> PathBuf {
        self.base_dir.join(format!("{:016x}.{}", hash, CACHE_EXTENSION))
    }

    fn read_file(&self, hash: u64, project: &ProjectKey) -> Option<SymbolCacheFile> {
        let path = self.cache_path(hash);
        let bytes = fs::read(&path).ok()?;
        let decoded = zstd::decode_all(bytes.as_slice())
            .map_err(|e| BeanscopeError::Cache(e.to_string()))
            .and_then(|raw| {
                rmp_serde::from_slice::<SymbolCacheFile>(&raw).map_err(|e| BeanscopeError::Cache(e.to_string()))
            });
        match decoded {
            Ok(file) if file.version == CACHE_VERSION && file.project == project.to_string() => Some(file),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("Discarding unreadable symbol cache {}: {}", path.display(), err);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    fn write_file(&self, hash: u64, file: &SymbolCacheFile) {
        let path = self.cache_path(hash);
        let encoded = rmp_serde::to_vec(file)
            .map_err(|e| BeanscopeError::Cache(e.to_string()))
            .and_then(|raw| zstd::encode_all(raw.as_slice(), 3).map_err(BeanscopeError::from));
        let result = encoded.and_then(|bytes| fs::write(&path, bytes).map_err(BeanscopeError::from));
        if let Err(err) = result {
            tracing::warn!("Failed to write symbol cache {}: {}", path.display(), err);
        }
    }

    fn with_file(&self, project: &ProjectKey, f: impl FnOnce(&mut SymbolCacheFile)) {
        let hash = Self::project_hash(project);
        let mut entry = self
            .loaded
            .entry(hash)
            .or_insert_with(|| self.read_file(hash, project).unwrap_or_else(|| SymbolCacheFile::new(project)));
        f(&mut entry);
        self.write_file(hash, &entry);
    }

    fn cache_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.base_dir) else {
            return Vec::new();
        };
        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == CACHE_EXTENSION))
            .collect()
    }
}

impl SymbolCache for SymbolCacheOnDisk {
    fn retrieve(&self, project: &ProjectKey, files: &[(String, u64)]) -> Option<BTreeMap<String, CachedDocument>> {
        let hash = Self::project_hash(project);
        if !self.loaded.contains_key(&hash) {
            let file = self.read_file(hash, project)?;
            self.loaded.entry(hash).or_insert(file);
        }
        let file = self.loaded.get(&hash)?;
        file.matches(files).then(|| file.documents.clone())
    }

    fn store(&self, project: &ProjectKey, documents: BTreeMap<String, CachedDocument>) {
        let hash = Self::project_hash(project);
        let mut file = SymbolCacheFile::new(project);
        file.documents = documents;
        self.write_file(hash, &file);
        self.loaded.insert(hash, file);
    }

    fn update_document(&self, project: &ProjectKey, uri: &str, document: CachedDocument) {
        self.with_file(project, |file| {
            file.documents.insert(uri.to_string(), document);
        });
    }

    fn remove_document(&self, project: &ProjectKey, uri: &str) {
        self.with_file(project, |file| {
            file.documents.remove(uri);
        });
    }

    fn remove_project(&self, project: &ProjectKey) {
        let hash = Self::project_hash(project);
        self.loaded.remove(&hash);
        let _ = fs::remove_file(self.cache_path(hash));
    }

    fn clear(&self) -> Result<()> {
        self.loaded.clear();
        for path in self.cache_files() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn stats(&self) -> SymbolCacheStats {
        let mut stats = SymbolCacheStats {
            cache_dir: Some(self.base_dir.clone()),
            ..Default::default()
        };
        for path in self.cache_files() {
            let Ok(bytes) = fs::read(&path) else { continue };
            stats.size_bytes += bytes.len() as u64;
            let Ok(raw) = zstd::decode_all(bytes.as_slice()) else { continue };
            let Ok(file) = rmp_serde::from_slice::<SymbolCacheFile>(&raw) else { continue };
            stats.projects += 1;
            stats.documents += file.documents.len();
            stats.symbols += file.documents.values().map(|d| d.symbols.len()).sum::<usize>();
        }
        stats
    }
}
