//! Assembly of the indexing services for one workspace root.

use crate::cache::{ProjectCache, ProjectCacheOptions, SymbolCache, SymbolCacheOnDisk, SymbolCacheVoid};
use crate::config::IndexerConfig;
use crate::documents::FsDocumentStore;
use crate::driver::IndexDriver;
use crate::error::Result;
use crate::index::SymbolIndex;
use crate::project::{DescriptorProjectFactory, DescriptorProjectFinder, ProjectFactory};
use crate::watch::{BasicFileObserver, spawn_fs_watcher};
use beanscope_api::{DocumentStore, FileObserver, ProjectDiscovery};
use beanscope_plugin::LanguageCaps;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct BeanscopeEngine {
    root: PathBuf,
    config: Arc<IndexerConfig>,
    index: Arc<SymbolIndex>,
    projects: Arc<ProjectCache>,
    observer: Arc<BasicFileObserver>,
    documents: Arc<dyn DocumentStore>,
    symbol_cache: Arc<dyn SymbolCache>,
    driver: IndexDriver,
    source_globs: Vec<String>,
    cancel_token: CancellationToken,
}

pub struct BeanscopeEngineBuilder {
    root: PathBuf,
    config: IndexerConfig,
    lang_caps: Vec<LanguageCaps>,
    discovery: Option<Arc<dyn ProjectDiscovery>>,
    factory: Option<Arc<dyn ProjectFactory>>,
    documents: Option<Arc<dyn DocumentStore>>,
    symbol_cache: Option<Arc<dyn SymbolCache>>,
}

impl BeanscopeEngineBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: IndexerConfig::default(),
            lang_caps: Vec::new(),
            discovery: None,
            factory: None,
            documents: None,
            symbol_cache: None,
        }
    }

    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_language_caps(mut self, caps: LanguageCaps) -> Self {
        self.lang_caps.push(caps);
        self
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn ProjectDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_project_factory(mut self, factory: Arc<dyn ProjectFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_symbol_cache(mut self, cache: Arc<dyn SymbolCache>) -> Self {
        self.symbol_cache = Some(cache);
        self
    }

    /// Wire everything together. Needs a tokio runtime.
    pub fn build(self) -> Result<BeanscopeEngine> {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let config = Arc::new(self.config);

        let discovery = self.discovery.unwrap_or_else(|| {
            Arc::new(DescriptorProjectFinder::new(&root).with_ignored_dirs(config.ignored_directories.clone()))
        });
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(DescriptorProjectFactory::new(config.scan_test_sources)));
        let documents = self.documents.unwrap_or_else(|| Arc::new(FsDocumentStore::new()));
        let symbol_cache: Arc<dyn SymbolCache> = match self.symbol_cache {
            Some(cache) => cache,
            None if config.use_symbol_cache => Arc::new(SymbolCacheOnDisk::new(config.symbol_cache_location())),
            None => Arc::new(SymbolCacheVoid),
        };

        let observer = Arc::new(BasicFileObserver::new());
        let projects = Arc::new(ProjectCache::new(
            factory,
            observer.clone(),
            ProjectCacheOptions {
                async_updates: config.async_project_updates,
                always_fire_changed: config.always_fire_project_changed,
            },
        ));
        let index = Arc::new(SymbolIndex::new(
            config.clone(),
            &self.lang_caps,
            discovery.clone(),
            documents.clone(),
            symbol_cache.clone(),
        ));
        let driver = IndexDriver::new(
            index.clone(),
            projects.clone(),
            discovery,
            observer.clone() as Arc<dyn FileObserver>,
        )?;

        let mut source_globs: Vec<String> = self.lang_caps.iter().flat_map(|c| c.matcher.watch_globs()).collect();
        source_globs.dedup();

        Ok(BeanscopeEngine {
            root,
            config,
            index,
            projects,
            observer,
            documents,
            symbol_cache,
            driver,
            source_globs,
            cancel_token: CancellationToken::new(),
        })
    }
}

impl Drop for BeanscopeEngine {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl BeanscopeEngine {
    pub fn builder(root: PathBuf) -> BeanscopeEngineBuilder {
        BeanscopeEngineBuilder::new(root)
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<SymbolIndex> {
        &self.index
    }

    pub fn projects(&self) -> &Arc<ProjectCache> {
        &self.projects
    }

    pub fn observer(&self) -> &Arc<BasicFileObserver> {
        &self.observer
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn symbol_cache(&self) -> &Arc<dyn SymbolCache> {
        &self.symbol_cache
    }

    pub fn driver(&self) -> &IndexDriver {
        &self.driver
    }

    /// Discover projects and schedule their initial scans.
    pub fn start(&self) {
        self.driver.start(&self.source_globs);
    }

    /// Start, then wait for the initial scans to finish.
    pub async fn index_workspace(&self) {
        self.start();
        self.driver.wait_idle().await;
    }

    pub async fn wait_idle(&self) {
        self.driver.wait_idle().await;
    }

    /// Feed file-system changes below the root into the observer until the
    /// engine is dropped.
    pub fn watch(&self) -> Result<tokio::task::JoinHandle<()>> {
        spawn_fs_watcher(
            &self.root,
            Arc::downgrade(&self.observer),
            Duration::from_millis(self.config.watch_debounce_ms),
            self.config.ignored_directories.clone(),
            self.cancel_token.child_token(),
        )
    }
}
