//! The symbol index.
//!
//! One slot per document URI in a concurrent map; a slot holds either the
//! document's symbols or a tombstone left by a deletion. Every write carries a
//! sequence number taken when the write started, and a slot only accepts
//! writes that started after the one it holds. That keeps a long scan from
//! resurrecting a document deleted while it ran. Removing a project leaves a
//! fence with its sequence number, so documents of that project still in
//! flight are dropped too. Tombstones and fences are pruned whenever no write
//! is in flight.

use crate::cache::{CachedDocument, ParseCache, SymbolCache};
use crate::config::IndexerConfig;
use crate::error::{BeanscopeError, Result};
use crate::project::Project;
use crate::project::scanner::{Scanner, SourceFile, modified_millis};
use crate::registry::SymbolExtractionRegistry;
use beanscope_api::models::{Language, ProjectKey, Symbol, TextDocument};
use beanscope_api::uri::uri_to_path;
use beanscope_api::{DocumentStore, ProjectDiscovery};
use beanscope_plugin::LanguageCaps;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

const LOCATION_PREFIX: &str = "locationPrefix:";

/// Symbols of one document at the time they were committed.
#[derive(Debug)]
pub struct IndexedDocument {
    pub project: Option<ProjectKey>,
    pub symbols: Vec<Symbol>,
    seq: u64,
}

#[derive(Debug, Clone)]
enum Slot {
    Indexed(Arc<IndexedDocument>),
    Removed { seq: u64 },
}

impl Slot {
    fn seq(&self) -> u64 {
        match self {
            Slot::Indexed(doc) => doc.seq,
            Slot::Removed { seq } => *seq,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub files: usize,
    pub symbols: usize,
    pub failed: usize,
    pub restored: usize,
}

impl ScanSummary {
    fn merge(&mut self, other: ScanSummary) {
        self.files += other.files;
        self.symbols += other.symbols;
        self.failed += other.failed;
        self.restored += other.restored;
    }
}

struct WriteGuard<'a> {
    index: &'a SymbolIndex,
    scan: bool,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if self.scan {
            self.index.scans.fetch_sub(1, Ordering::SeqCst);
        }
        // writes numbered up to the horizon have all finished once the
        // writer count drops to zero
        let horizon = self.index.seq.load(Ordering::SeqCst);
        if self.index.writers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.index.prune_tombstones(horizon);
        }
    }
}

pub struct SymbolIndex {
    config: Arc<IndexerConfig>,
    parse_cache: Arc<ParseCache>,
    registry: SymbolExtractionRegistry,
    discovery: Arc<dyn ProjectDiscovery>,
    documents: Arc<dyn DocumentStore>,
    symbol_cache: Arc<dyn SymbolCache>,
    scanner: Scanner,
    slots: DashMap<String, Slot>,
    // project -> seq of its last removal
    fences: DashMap<ProjectKey, u64>,
    seq: AtomicU64,
    writers: AtomicUsize,
    scans: AtomicUsize,
    tombstones: AtomicUsize,
}

impl SymbolIndex {
    pub fn new(
        config: Arc<IndexerConfig>,
        caps: &[LanguageCaps],
        discovery: Arc<dyn ProjectDiscovery>,
        documents: Arc<dyn DocumentStore>,
        symbol_cache: Arc<dyn SymbolCache>,
    ) -> Self {
        let scanner = Scanner::new(caps.iter().map(|c| c.matcher.clone()).collect(), &config);
        Self {
            parse_cache: Arc::new(ParseCache::new(discovery.clone(), caps)),
            registry: SymbolExtractionRegistry::from_caps(caps),
            config,
            discovery,
            documents,
            symbol_cache,
            scanner,
            slots: DashMap::new(),
            fences: DashMap::new(),
            seq: AtomicU64::new(0),
            writers: AtomicUsize::new(0),
            scans: AtomicUsize::new(0),
            tombstones: AtomicUsize::new(0),
        }
    }

    pub fn parse_cache(&self) -> &Arc<ParseCache> {
        &self.parse_cache
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    fn begin_write(&self, scan: bool) -> (WriteGuard<'_>, u64) {
        self.writers.fetch_add(1, Ordering::SeqCst);
        if scan {
            self.scans.fetch_add(1, Ordering::SeqCst);
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        (WriteGuard { index: self, scan }, seq)
    }

    fn prune_tombstones(&self, horizon: u64) {
        self.fences.retain(|_, seq| *seq > horizon);
        if self.tombstones.load(Ordering::SeqCst) == 0 {
            return;
        }
        let mut pruned = 0;
        self.slots.retain(|_, slot| match slot {
            Slot::Removed { seq } if *seq <= horizon => {
                pruned += 1;
                false
            }
            _ => true,
        });
        self.tombstones.fetch_sub(pruned, Ordering::SeqCst);
    }

    fn fenced(&self, project: Option<&ProjectKey>, seq: u64) -> bool {
        project
            .and_then(|key| self.fences.get(key))
            .is_some_and(|fence| *fence > seq)
    }

    /// Store `symbols` for `uri` unless a later write already landed.
    fn commit(&self, uri: &str, project: Option<ProjectKey>, mut symbols: Vec<Symbol>, seq: u64) -> bool {
        symbols.sort_by(Symbol::cmp_by_location);
        let entry = self.slots.entry(uri.to_string());
        // checked under the slot lock so a concurrent remove_project either
        // sees this document or its fence rejects it
        if self.fenced(project.as_ref(), seq) {
            tracing::debug!("Dropping write for {} of a removed project", uri);
            return false;
        }
        let doc = Slot::Indexed(Arc::new(IndexedDocument { project, symbols, seq }));
        match entry {
            Entry::Occupied(mut existing) => {
                if existing.get().seq() > seq {
                    tracing::debug!("Dropping stale write for {}", uri);
                    return false;
                }
                if let Slot::Removed { .. } = existing.insert(doc) {
                    self.tombstones.fetch_sub(1, Ordering::SeqCst);
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(doc);
            }
        }
        true
    }

    fn remove(&self, uri: &str, seq: u64) -> bool {
        match self.slots.entry(uri.to_string()) {
            Entry::Occupied(mut existing) => {
                if existing.get().seq() > seq {
                    return false;
                }
                let previous = existing.insert(Slot::Removed { seq });
                let was_indexed = matches!(previous, Slot::Indexed(_));
                if was_indexed {
                    self.tombstones.fetch_add(1, Ordering::SeqCst);
                }
                was_indexed
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Removed { seq });
                self.tombstones.fetch_add(1, Ordering::SeqCst);
                false
            }
        }
    }

    /// Parse and extract `document`, committing the result with `seq`.
    /// A parse failure commits an empty list and is returned.
    fn index_document(&self, document: &TextDocument, project: Option<ProjectKey>, seq: u64) -> Result<Vec<Symbol>> {
        self.parse_cache.on_document_changed(&document.uri);
        let project = project.or_else(|| self.discovery.find_project_for_uri(&document.uri));
        match self
            .parse_cache
            .with_parsed_unit(document, |unit| self.registry.extract(unit))
        {
            Ok(Some(symbols)) => {
                self.commit(&document.uri, project, symbols.clone(), seq);
                Ok(symbols)
            }
            Ok(None) => {
                tracing::debug!("{} belongs to no project, not indexed", document.uri);
                Ok(Vec::new())
            }
            Err(err) => {
                self.commit(&document.uri, project, Vec::new(), seq);
                Err(err)
            }
        }
    }

    fn remember_in_cache(&self, project: Option<&ProjectKey>, uri: &str, symbols: &[Symbol]) {
        if !self.config.use_symbol_cache {
            return;
        }
        let (Some(project), Some(path)) = (project, uri_to_path(uri)) else {
            return;
        };
        self.symbol_cache.update_document(
            project,
            uri,
            CachedDocument {
                last_modified: modified_millis(&path),
                symbols: symbols.to_vec(),
            },
        );
    }

    /// Walk `root` and index every recognized source file.
    pub fn scan_files(&self, root: &Path) -> Result<ScanSummary> {
        self.scan_files_with(root, &CancellationToken::new())
    }

    pub fn scan_files_with(&self, root: &Path, cancel: &CancellationToken) -> Result<ScanSummary> {
        let (_guard, seq) = self.begin_write(true);
        tracing::info!("Scanning {}", root.display());
        let files = self.scanner.collect(root);
        let mut groups: BTreeMap<Option<ProjectKey>, Vec<SourceFile>> = BTreeMap::new();
        for file in files {
            let project = self.discovery.find_project_for_uri(&file.uri);
            groups.entry(project).or_default().push(file);
        }

        let mut summary = ScanSummary::default();
        for (project, files) in groups {
            summary.merge(self.index_files(project.as_ref(), &files, seq, cancel)?);
        }
        tracing::info!(
            "Scanned {}: {} files, {} symbols, {} failed",
            root.display(),
            summary.files,
            summary.symbols,
            summary.failed
        );
        Ok(summary)
    }

    /// Index every source root of `project`, then drop documents of the
    /// project that no longer exist on disk.
    pub fn scan_project(&self, project: &Project, cancel: &CancellationToken) -> Result<ScanSummary> {
        let (_guard, seq) = self.begin_write(true);
        let key = project.key();
        let mut seen = HashSet::new();
        let files: Vec<SourceFile> = project
            .source_roots()
            .iter()
            .flat_map(|root| self.scanner.collect(root))
            .filter(|file| seen.insert(file.uri.clone()))
            .filter(|file| self.discovery.find_project_for_uri(&file.uri).as_ref() == Some(key))
            .collect();

        let summary = self.index_files(Some(key), &files, seq, cancel)?;

        let scanned: HashSet<&str> = files.iter().map(|f| f.uri.as_str()).collect();
        let stale: Vec<String> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Indexed(doc) if doc.project.as_ref() == Some(key) && !scanned.contains(entry.key().as_str()) => {
                    Some(entry.key().clone())
                }
                _ => None,
            })
            .collect();
        for uri in stale {
            if self.remove(&uri, seq) {
                self.parse_cache.on_document_closed(&uri);
                tracing::debug!("Dropped vanished document {}", uri);
            }
        }

        tracing::info!(
            "Project {} (generation {}): {} files, {} symbols, {} restored from cache",
            project.name(),
            project.generation(),
            summary.files,
            summary.symbols,
            summary.restored
        );
        Ok(summary)
    }

    fn index_files(
        &self,
        project: Option<&ProjectKey>,
        files: &[SourceFile],
        seq: u64,
        cancel: &CancellationToken,
    ) -> Result<ScanSummary> {
        if cancel.is_cancelled() {
            return Err(BeanscopeError::Cancelled);
        }
        let use_cache = self.config.use_symbol_cache && project.is_some();

        if let (true, Some(key)) = (use_cache, project) {
            let stamps: Vec<(String, u64)> = files.iter().map(|f| (f.uri.clone(), f.last_modified)).collect();
            if let Some(cached) = self.symbol_cache.retrieve(key, &stamps) {
                let mut summary = ScanSummary::default();
                for (uri, doc) in cached {
                    summary.files += 1;
                    summary.restored += 1;
                    summary.symbols += doc.symbols.len();
                    self.commit(&uri, Some(key.clone()), doc.symbols, seq);
                }
                tracing::debug!("Restored {} documents of {} from the symbol cache", summary.restored, key);
                return Ok(summary);
            }
        }

        let results: Vec<(String, u64, Option<Vec<Symbol>>)> = files
            .par_iter()
            .filter_map(|file| {
                if cancel.is_cancelled() {
                    return None;
                }
                let text = match self.documents.read_content(&file.uri) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!("Cannot read {}: {}", file.uri, err);
                        return Some((file.uri.clone(), file.last_modified, None));
                    }
                };
                let document = TextDocument::new(file.uri.clone(), Language::from_uri(&file.uri), 0, text);
                let outcome = self.index_document(&document, project.cloned(), seq).ok();
                // batch scans keep no trees alive
                self.parse_cache.on_document_closed(&file.uri);
                Some((file.uri.clone(), file.last_modified, outcome))
            })
            .collect();

        if cancel.is_cancelled() {
            tracing::debug!("Scan cancelled after {} of {} files", results.len(), files.len());
            return Err(BeanscopeError::Cancelled);
        }

        let mut summary = ScanSummary::default();
        let mut to_cache = BTreeMap::new();
        for (uri, last_modified, outcome) in results {
            summary.files += 1;
            match outcome {
                Some(symbols) => {
                    summary.symbols += symbols.len();
                    to_cache.insert(uri, CachedDocument { last_modified, symbols });
                }
                None => summary.failed += 1,
            }
        }
        if let (true, Some(key), 0) = (use_cache, project, summary.failed) {
            self.symbol_cache.store(key, to_cache);
        }
        Ok(summary)
    }

    /// Re-index `uri` from `content`.
    pub fn update_document(&self, uri: &str, content: &str) -> Result<()> {
        self.update_text_document(&TextDocument::from_content(uri, content))
    }

    /// Unsaved editor text never reaches the symbol cache.
    pub fn update_text_document(&self, document: &TextDocument) -> Result<()> {
        let (_guard, seq) = self.begin_write(false);
        self.index_document(document, None, seq)?;
        Ok(())
    }

    /// Read `uri` from the document store, then index it. The result is
    /// stamped with the file's modification time in the symbol cache.
    pub fn create_document(&self, uri: &str) -> Result<()> {
        let (_guard, seq) = self.begin_write(false);
        let content = self.documents.read_content(uri)?;
        let project = self.discovery.find_project_for_uri(uri);
        let document = TextDocument::from_content(uri, content);
        let symbols = self.index_document(&document, project.clone(), seq)?;
        self.remember_in_cache(project.as_ref(), uri, &symbols);
        Ok(())
    }

    /// Forget `uri`. Returns whether it was indexed.
    pub fn delete_document(&self, uri: &str) -> bool {
        let (_guard, seq) = self.begin_write(false);
        let project = match self.slots.get(uri).as_deref() {
            Some(Slot::Indexed(doc)) => doc.project.clone(),
            _ => None,
        };
        let removed = self.remove(uri, seq);
        self.parse_cache.on_document_closed(uri);
        if let (true, Some(project)) = (self.config.use_symbol_cache, project.as_ref()) {
            self.symbol_cache.remove_document(project, uri);
        }
        removed
    }

    /// Forget every document of `project`. Returns how many were dropped.
    pub fn remove_project(&self, project: &ProjectKey) -> usize {
        let (_guard, seq) = self.begin_write(false);
        self.fences.insert(project.clone(), seq);
        let uris: Vec<String> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Indexed(doc) if doc.project.as_ref() == Some(project) => Some(entry.key().clone()),
                _ => None,
            })
            .collect();
        let removed = uris.iter().filter(|uri| self.remove(uri, seq)).count();
        self.parse_cache.on_project_deleted(project);
        if self.config.use_symbol_cache {
            self.symbol_cache.remove_project(project);
        }
        tracing::info!("Removed {} documents of {}", removed, project);
        removed
    }

    pub fn is_initializing(&self) -> bool {
        self.scans.load(Ordering::SeqCst) > 0
    }

    /// `None` when `uri` is not indexed.
    pub fn get_symbols(&self, uri: &str) -> Option<Vec<Symbol>> {
        match self.slots.get(uri).as_deref() {
            Some(Slot::Indexed(doc)) => Some(doc.symbols.clone()),
            _ => None,
        }
    }

    fn indexed_documents(&self) -> Vec<(String, Arc<IndexedDocument>)> {
        let mut docs: Vec<_> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Indexed(doc) => Some((entry.key().clone(), doc.clone())),
                Slot::Removed { .. } => None,
            })
            .collect();
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        docs
    }

    /// Every symbol satisfying `predicate`, ordered by URI then position.
    pub fn get_symbols_matching(&self, predicate: impl Fn(&Symbol) -> bool) -> Vec<Symbol> {
        self.indexed_documents()
            .iter()
            .flat_map(|(_, doc)| doc.symbols.iter())
            .filter(|&s| predicate(s))
            .cloned()
            .collect()
    }

    /// Symbols whose name contains `query` (case-sensitive); all for an empty query.
    pub fn get_all_symbols(&self, query: &str) -> Vec<Symbol> {
        let mut symbols = self.get_symbols_matching(|s| query.is_empty() || s.name.contains(query));
        if let Some(max) = self.config.max_symbols_in_response {
            symbols.truncate(max);
        }
        symbols
    }

    /// Query with optional `locationPrefix:<uri prefix>?` scoping. A leading
    /// `*` lifts the result limit.
    pub fn search(&self, query: &str) -> Vec<Symbol> {
        let (prefix, query) = match query.strip_prefix(LOCATION_PREFIX) {
            Some(rest) => match rest.split_once('?') {
                Some((prefix, query)) => (Some(prefix), query),
                None => (Some(rest), ""),
            },
            None => (None, query),
        };
        let (unlimited, query) = match query.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, query),
        };
        let mut symbols = self.get_symbols_matching(|s| {
            prefix.is_none_or(|p| s.uri().starts_with(p)) && (query.is_empty() || s.name.contains(query))
        });
        if !unlimited {
            symbols.truncate(self.config.search_limit());
        }
        symbols
    }

    pub fn symbols_for_project(&self, project: &ProjectKey) -> Vec<Symbol> {
        self.indexed_documents()
            .iter()
            .filter(|(_, doc)| doc.project.as_ref() == Some(project))
            .flat_map(|(_, doc)| doc.symbols.iter().cloned())
            .collect()
    }

    pub fn indexed_uris(&self) -> Vec<String> {
        self.indexed_documents().into_iter().map(|(uri, _)| uri).collect()
    }

    pub fn document_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Indexed(_)))
            .count()
    }
}
