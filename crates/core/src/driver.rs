//! Keeps the symbol index in step with projects and source files.
//!
//! Project events schedule full rescans; file events for recognized sources
//! schedule single-document updates. All work runs as tracked tokio tasks so
//! callers can wait for the index to settle.

use crate::cache::{ProjectCache, ProjectEvent};
use crate::error::{BeanscopeError, Result};
use crate::event::Subscription;
use crate::index::SymbolIndex;
use crate::project::Project;
use beanscope_api::services::{FileCallback, SubscriptionId};
use beanscope_api::{FileObserver, ProjectDiscovery};
use beanscope_api::models::ProjectKey;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentAction {
    Create,
    Change,
    Delete,
}

struct DriverInner {
    index: Arc<SymbolIndex>,
    projects: Arc<ProjectCache>,
    discovery: Arc<dyn ProjectDiscovery>,
    handle: Handle,
    tasks: TaskTracker,
    cancel: CancellationToken,
    // running rescan per project: (generation, token)
    rescans: DashMap<ProjectKey, (u64, CancellationToken)>,
    // per-URI queues, only used when updates are serialized
    document_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    serialize_updates: bool,
}

pub struct IndexDriver {
    inner: Arc<DriverInner>,
    project_events: Mutex<Option<Subscription<ProjectEvent>>>,
    observer: Arc<dyn FileObserver>,
    file_watches: Mutex<Vec<SubscriptionId>>,
}

impl IndexDriver {
    /// Must be called inside a tokio runtime; the driver spawns onto it.
    pub fn new(
        index: Arc<SymbolIndex>,
        projects: Arc<ProjectCache>,
        discovery: Arc<dyn ProjectDiscovery>,
        observer: Arc<dyn FileObserver>,
    ) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| BeanscopeError::Internal(e.to_string()))?;
        let serialize_updates = index.config().serialize_document_updates;
        Ok(Self {
            inner: Arc::new(DriverInner {
                index,
                projects,
                discovery,
                handle,
                tasks: TaskTracker::new(),
                cancel: CancellationToken::new(),
                rescans: DashMap::new(),
                document_locks: DashMap::new(),
                serialize_updates,
            }),
            project_events: Mutex::new(None),
            observer,
            file_watches: Mutex::new(Vec::new()),
        })
    }

    /// Subscribe to project and file events, then materialize every project
    /// discovery knows about, which schedules their initial scans.
    pub fn start(&self, source_globs: &[String]) {
        let weak = Arc::downgrade(&self.inner);
        let subscription = self.inner.projects.listen(move |event| {
            if let Some(inner) = weak.upgrade() {
                DriverInner::on_project_event(&inner, event);
            }
        });
        *self.project_events.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        let globs: Vec<&str> = source_globs.iter().map(String::as_str).collect();
        let watches = [
            self.observer.on_file_created(&globs, self.file_callback(DocumentAction::Create)),
            self.observer.on_file_changed(&globs, self.file_callback(DocumentAction::Change)),
            self.observer.on_file_deleted(&globs, self.file_callback(DocumentAction::Delete)),
        ];
        self.file_watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(watches);

        for key in self.inner.discovery.all_projects() {
            self.inner.projects.get(&key);
        }
    }

    fn file_callback(&self, action: DocumentAction) -> FileCallback {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |uri: &str| {
            if let Some(inner) = weak.upgrade() {
                DriverInner::schedule_document(&inner, uri.to_string(), action);
            }
        })
    }

    /// Resolve and cache the project owning `uri`, scheduling its first scan.
    pub fn ensure_project(&self, uri: &str) -> Option<Arc<Project>> {
        let key = self.inner.discovery.find_project_for_uri(uri)?;
        self.inner.projects.get(&key)
    }

    /// Schedule a rescan of `project`, superseding one already running.
    pub fn rescan(&self, project: Arc<Project>) {
        DriverInner::schedule_rescan(&self.inner, project);
    }

    pub fn index(&self) -> &Arc<SymbolIndex> {
        &self.inner.index
    }

    /// Resolve once every scheduled task, including ones they scheduled,
    /// has finished.
    pub async fn wait_idle(&self) {
        loop {
            self.inner.tasks.close();
            self.inner.tasks.wait().await;
            self.inner.tasks.reopen();
            if self.inner.tasks.is_empty() {
                break;
            }
        }
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Stop listening and cancel running scans.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.project_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let watches: Vec<_> = self
            .file_watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for id in watches {
            self.observer.unsubscribe(id);
        }
    }
}

impl Drop for IndexDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl DriverInner {
    fn on_project_event(inner: &Arc<DriverInner>, event: &ProjectEvent) {
        match event {
            ProjectEvent::Created(project) => {
                Self::schedule_rescan(inner, project.clone());
            }
            ProjectEvent::Changed(project) => {
                inner.index.parse_cache().on_project_changed(project.key());
                Self::schedule_rescan(inner, project.clone());
            }
            ProjectEvent::Deleted(project) => {
                if let Some((_, (_, token))) = inner.rescans.remove(project.key()) {
                    token.cancel();
                }
                inner.index.remove_project(project.key());
            }
        }
    }

    fn schedule_rescan(inner: &Arc<DriverInner>, project: Arc<Project>) {
        let key = project.key().clone();
        let token = inner.cancel.child_token();
        let generation = project.bump_generation();
        if let Some((_, previous)) = inner.rescans.insert(key.clone(), (generation, token.clone())) {
            previous.cancel();
        }
        tracing::debug!("Scheduling rescan of {} (generation {})", key, generation);

        let task_inner = inner.clone();
        inner.tasks.spawn_on(
            async move {
                let index = task_inner.index.clone();
                let outcome = tokio::task::spawn_blocking(move || index.scan_project(&project, &token)).await;
                match outcome {
                    Ok(Ok(_)) => {}
                    Ok(Err(BeanscopeError::Cancelled)) => {
                        tracing::debug!("Rescan of {} (generation {}) superseded", key, generation);
                    }
                    Ok(Err(err)) => tracing::error!("Rescan of {} failed: {}", key, err),
                    Err(err) => tracing::error!("Rescan task of {} panicked: {}", key, err),
                }
                task_inner.rescans.remove_if(&key, |_, (current, _)| *current == generation);
            },
            &inner.handle,
        );
    }

    fn schedule_document(inner: &Arc<DriverInner>, uri: String, action: DocumentAction) {
        if inner.cancel.is_cancelled() {
            return;
        }
        let task_inner = inner.clone();
        inner.tasks.spawn_on(
            async move {
                let lock = task_inner.serialize_updates.then(|| {
                    task_inner
                        .document_locks
                        .entry(uri.clone())
                        .or_default()
                        .clone()
                });
                let _queued = match &lock {
                    Some(lock) => Some(lock.lock().await),
                    None => None,
                };

                let worker = task_inner.clone();
                let target = uri.clone();
                let outcome = tokio::task::spawn_blocking(move || worker.apply_document(&target, action)).await;
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => tracing::debug!("Document {} not indexed: {}", uri, err),
                    Err(err) => tracing::error!("Update task for {} panicked: {}", uri, err),
                }
            },
            &inner.handle,
        );
    }

    fn apply_document(&self, uri: &str, action: DocumentAction) -> Result<()> {
        match action {
            DocumentAction::Delete => {
                self.index.delete_document(uri);
                Ok(())
            }
            DocumentAction::Create | DocumentAction::Change => {
                // a source file may be the first sign of its project
                if let Some(key) = self.discovery.find_project_for_uri(uri) {
                    self.projects.get(&key);
                }
                self.index.create_document(uri)
            }
        }
    }
}
