//! Per-document parse cache.
//!
//! Each URI owns one slot behind its own lock, so at most one parsed unit is
//! stored per document and parses of different documents never contend. A
//! slot is refilled when the document version or content hash no longer
//! matches, and emptied by the invalidation entry points.

use crate::error::{BeanscopeError, Result};
use beanscope_api::models::{Language, ProjectKey, TextDocument};
use beanscope_api::{ApiError, ProjectDiscovery};
use beanscope_plugin::{LanguageCaps, LanguageParseCap, ParsedUnit};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use xxhash_rust::xxh3::xxh3_64;

struct CachedUnit {
    unit: Arc<ParsedUnit>,
    version: i32,
    content_hash: u64,
    project: ProjectKey,
}

type Slot = Arc<Mutex<Option<CachedUnit>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<CachedUnit>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ParseCache {
    discovery: Arc<dyn ProjectDiscovery>,
    parsers: HashMap<Language, Arc<dyn LanguageParseCap>>,
    slots: DashMap<String, Slot>,
    by_project: DashMap<ProjectKey, HashSet<String>>,
    // (version, content hash) of the last failure logged per URI
    reported_failures: DashMap<String, (i32, u64)>,
}

impl ParseCache {
    pub fn new(discovery: Arc<dyn ProjectDiscovery>, caps: &[LanguageCaps]) -> Self {
        Self {
            discovery,
            parsers: caps
                .iter()
                .map(|c| (c.language.clone(), c.parser.clone()))
                .collect(),
            slots: DashMap::new(),
            by_project: DashMap::new(),
            reported_failures: DashMap::new(),
        }
    }

    pub fn supports(&self, language: &Language) -> bool {
        self.parsers.contains_key(language)
    }

    /// Run `f` against the parsed unit of `document`, parsing only when no
    /// valid unit is cached. `Ok(None)` means the document belongs to no
    /// project.
    pub fn with_parsed_unit<R>(
        &self,
        document: &TextDocument,
        f: impl FnOnce(&Arc<ParsedUnit>) -> R,
    ) -> Result<Option<R>> {
        let Some(project) = self.discovery.find_project_for_uri(&document.uri) else {
            tracing::debug!("No project for {}, skipping parse", document.uri);
            return Ok(None);
        };
        let parser = self.parsers.get(&document.language).ok_or_else(|| {
            ApiError::UnsupportedLanguage {
                language: document.language.to_string(),
                uri: document.uri.clone(),
            }
        })?;

        let content_hash = xxh3_64(document.text.as_bytes());
        let slot: Slot = self.slots.entry(document.uri.clone()).or_default().clone();

        let unit = {
            let mut guard = lock(&slot);
            match guard.as_ref() {
                Some(cached)
                    if cached.version == document.version
                        && cached.content_hash == content_hash
                        && cached.project == project =>
                {
                    cached.unit.clone()
                }
                _ => {
                    let previous = guard.take();
                    if let Some(previous) = previous {
                        self.forget_project_member(&previous.project, &document.uri);
                    }
                    match parser.parse_document(document) {
                        Ok(unit) => {
                            let unit = Arc::new(unit);
                            self.reported_failures.remove(&document.uri);
                            self.by_project
                                .entry(project.clone())
                                .or_default()
                                .insert(document.uri.clone());
                            *guard = Some(CachedUnit {
                                unit: unit.clone(),
                                version: document.version,
                                content_hash,
                                project,
                            });
                            unit
                        }
                        Err(err) => {
                            self.report_failure(document, content_hash, &err.to_string());
                            return Err(BeanscopeError::Parsing(format!("{}: {}", document.uri, err)));
                        }
                    }
                }
            }
        };

        Ok(Some(f(&unit)))
    }

    fn report_failure(&self, document: &TextDocument, content_hash: u64, message: &str) {
        let revision = (document.version, content_hash);
        let previous = self.reported_failures.insert(document.uri.clone(), revision);
        if previous != Some(revision) {
            tracing::warn!("Failed to parse {} (version {}): {}", document.uri, document.version, message);
        }
    }

    fn forget_project_member(&self, project: &ProjectKey, uri: &str) {
        if let Some(mut members) = self.by_project.get_mut(project) {
            members.remove(uri);
        }
    }

    /// Currently cached unit, without parsing.
    pub fn cached(&self, uri: &str) -> Option<Arc<ParsedUnit>> {
        let slot = self.slots.get(uri)?.clone();
        let guard = lock(&slot);
        guard.as_ref().map(|c| c.unit.clone())
    }

    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| lock(entry.value()).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn invalidate(&self, uri: &str) {
        let Some(slot) = self.slots.get(uri).map(|s| s.clone()) else {
            return;
        };
        let removed = lock(&slot).take();
        if let Some(removed) = removed {
            self.forget_project_member(&removed.project, uri);
        }
    }

    pub fn on_document_changed(&self, uri: &str) {
        self.invalidate(uri);
    }

    pub fn on_document_closed(&self, uri: &str) {
        self.invalidate(uri);
        self.reported_failures.remove(uri);
        // drop the slot itself unless a parse is holding it right now
        self.slots.remove_if(uri, |_, slot| Arc::strong_count(slot) == 1 && lock(slot).is_none());
    }

    /// Drop every unit of `project`, e.g. after its descriptor changed.
    pub fn on_project_changed(&self, project: &ProjectKey) {
        let members: Vec<String> = self
            .by_project
            .get(project)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        for uri in members {
            self.invalidate(&uri);
        }
    }

    pub fn on_project_deleted(&self, project: &ProjectKey) {
        self.on_project_changed(project);
        self.by_project.remove(project);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanscope_api::models::Range;
    use beanscope_plugin::{BoxError, FileMatcherCap, SymbolDraft};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct OneProject;

    impl ProjectDiscovery for OneProject {
        fn find_project_for_uri(&self, uri: &str) -> Option<ProjectKey> {
            uri.starts_with("file:///p/").then(|| ProjectKey::new("/p/pom.xml"))
        }

        fn all_projects(&self) -> Vec<ProjectKey> {
            vec![ProjectKey::new("/p/pom.xml")]
        }
    }

    #[derive(Default)]
    struct CountingParser {
        parses: AtomicUsize,
    }

    impl LanguageParseCap for CountingParser {
        fn parse_document(&self, document: &TextDocument) -> std::result::Result<ParsedUnit, BoxError> {
            self.parses.fetch_add(1, Ordering::SeqCst);
            if document.text.contains("broken") {
                return Err("unrecoverable".into());
            }
            let mut parser = tree_sitter::Parser::new();
            parser.set_language(&tree_sitter_java::LANGUAGE.into())?;
            let tree = parser.parse(&document.text, None).ok_or("no tree")?;
            Ok(ParsedUnit::new(
                document.uri.clone(),
                document.version,
                document.language.clone(),
                Arc::from(document.text.as_str()),
                tree,
            ))
        }
    }

    struct JavaFiles;

    impl FileMatcherCap for JavaFiles {
        fn supports_path(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "java")
        }

        fn watch_globs(&self) -> Vec<String> {
            vec!["**/*.java".to_string()]
        }
    }

    fn cache() -> (ParseCache, Arc<CountingParser>) {
        let parser = Arc::new(CountingParser::default());
        let caps = LanguageCaps::new(Language::JAVA, Arc::new(JavaFiles), parser.clone());
        (ParseCache::new(Arc::new(OneProject), &[caps]), parser)
    }

    fn doc(uri: &str, version: i32, text: &str) -> TextDocument {
        TextDocument::new(uri, Language::JAVA, version, text)
    }

    #[test]
    fn repeated_calls_share_one_unit() {
        let (cache, parser) = cache();
        let d = doc("file:///p/A.java", 1, "class A {}");
        let first = cache.with_parsed_unit(&d, |u| u.clone()).unwrap().unwrap();
        let second = cache.with_parsed_unit(&d, |u| u.clone()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(parser.parses.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidation_forces_a_new_unit() {
        let (cache, _) = cache();
        let d = doc("file:///p/A.java", 1, "class A {}");
        let first = cache.with_parsed_unit(&d, |u| u.clone()).unwrap().unwrap();
        cache.on_document_changed(&d.uri);
        assert!(cache.cached(&d.uri).is_none());
        let second = cache.with_parsed_unit(&d, |u| u.clone()).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn new_version_replaces_the_slot() {
        let (cache, _) = cache();
        let first = cache
            .with_parsed_unit(&doc("file:///p/A.java", 1, "class A {}"), |u| u.clone())
            .unwrap()
            .unwrap();
        let second = cache
            .with_parsed_unit(&doc("file:///p/A.java", 2, "class A { int x; }"), |u| u.clone())
            .unwrap()
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.version(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn project_change_drops_its_units() {
        let (cache, _) = cache();
        for name in ["A", "B"] {
            let d = doc(&format!("file:///p/{name}.java"), 0, "class X {}");
            cache.with_parsed_unit(&d, |_| ()).unwrap();
        }
        assert_eq!(cache.len(), 2);
        cache.on_project_changed(&ProjectKey::new("/p/pom.xml"));
        assert!(cache.is_empty());
    }

    #[test]
    fn failures_are_not_cached() {
        let (cache, parser) = cache();
        let d = doc("file:///p/A.java", 1, "broken");
        assert!(cache.with_parsed_unit(&d, |_| ()).is_err());
        assert!(cache.with_parsed_unit(&d, |_| ()).is_err());
        assert_eq!(parser.parses.load(Ordering::SeqCst), 2);
        assert!(cache.cached(&d.uri).is_none());
    }

    #[test]
    fn no_project_no_unit() {
        let (cache, parser) = cache();
        let d = doc("file:///elsewhere/A.java", 1, "class A {}");
        assert!(cache.with_parsed_unit(&d, |_| ()).unwrap().is_none());
        assert_eq!(parser.parses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closing_releases_the_slot() {
        let (cache, _) = cache();
        let d = doc("file:///p/A.java", 1, "class A {}");
        cache.with_parsed_unit(&d, |_| ()).unwrap();
        cache.on_document_closed(&d.uri);
        assert!(cache.slots.is_empty());
    }

    #[test]
    fn unit_ranges_are_available_to_callers() {
        let (cache, _) = cache();
        let d = doc("file:///p/A.java", 1, "class A {}");
        let draft = cache
            .with_parsed_unit(&d, |u| SymbolDraft::new("A", u.range_of(&u.root())))
            .unwrap()
            .unwrap();
        assert_eq!(draft.range, Range::new(0, 0, 0, 10));
    }
}
