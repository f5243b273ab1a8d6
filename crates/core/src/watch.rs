//! File observation: an in-process glob dispatcher plus a `notify` bridge
//! feeding it from the file system.

use crate::error::{BeanscopeError, Result};
use beanscope_api::services::{FileCallback, SubscriptionId};
use beanscope_api::uri::{path_to_uri, uri_to_path};
use beanscope_api::FileObserver;
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileEventKind {
    Created,
    Changed,
    Deleted,
}

struct FileSubscription {
    id: u64,
    kind: FileEventKind,
    globs: GlobSet,
    callback: FileCallback,
}

/// Dispatches file events to subscribers whose globs match the file path.
/// Callbacks run on the notifying thread, outside the subscription lock.
#[derive(Default)]
pub struct BasicFileObserver {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<FileSubscription>>,
}

impl BasicFileObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&self, kind: FileEventKind, globs: &[&str], callback: FileCallback) -> SubscriptionId {
        let mut builder = GlobSetBuilder::new();
        for pattern in globs {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => tracing::warn!("Ignoring invalid glob {:?}: {}", pattern, err),
            }
        }
        let globs = builder.build().unwrap_or_else(|err| {
            tracing::warn!("Cannot build glob set: {}", err);
            GlobSet::empty()
        });
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FileSubscription { id, kind, globs, callback });
        SubscriptionId(id)
    }

    /// Invoke every callback subscribed to `kind` whose globs match `uri`.
    /// Returns how many callbacks ran.
    pub fn notify(&self, kind: FileEventKind, uri: &str) -> usize {
        let Some(path) = uri_to_path(uri) else {
            return 0;
        };
        let callbacks: Vec<FileCallback> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind == kind && s.globs.is_match(&path))
            .map(|s| s.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(uri);
        }
        callbacks.len()
    }

    pub fn notify_file_created(&self, uri: &str) -> usize {
        self.notify(FileEventKind::Created, uri)
    }

    pub fn notify_file_changed(&self, uri: &str) -> usize {
        self.notify(FileEventKind::Changed, uri)
    }

    pub fn notify_file_deleted(&self, uri: &str) -> usize {
        self.notify(FileEventKind::Deleted, uri)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl FileObserver for BasicFileObserver {
    fn on_file_created(&self, globs: &[&str], callback: FileCallback) -> SubscriptionId {
        self.subscribe(FileEventKind::Created, globs, callback)
    }

    fn on_file_changed(&self, globs: &[&str], callback: FileCallback) -> SubscriptionId {
        self.subscribe(FileEventKind::Changed, globs, callback)
    }

    fn on_file_deleted(&self, globs: &[&str], callback: FileCallback) -> SubscriptionId {
        self.subscribe(FileEventKind::Deleted, globs, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.id != id.0);
        subs.len() != before
    }
}

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Some(Ok(event)) => return Some(event),
                Some(Err(err)) => tracing::warn!("Watch error: {}", err),
                None => return None,
            }
        }
    }
}

fn classify(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Remove(_) => Some(FileEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(FileEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(FileEventKind::Created),
        EventKind::Modify(_) => Some(FileEventKind::Changed),
        _ => None,
    }
}

/// Fold a burst of raw events into one event per path.
fn coalesce(pending: &[Event]) -> Vec<(PathBuf, FileEventKind)> {
    let mut folded: HashMap<PathBuf, FileEventKind> = HashMap::new();
    for event in pending {
        let Some(kind) = classify(&event.kind) else { continue };
        for path in &event.paths {
            let merged = match (folded.get(path), kind) {
                // created then modified within one burst is still a creation
                (Some(FileEventKind::Created), FileEventKind::Changed) => FileEventKind::Created,
                (Some(FileEventKind::Deleted), FileEventKind::Created) => FileEventKind::Changed,
                _ => kind,
            };
            folded.insert(path.clone(), merged);
        }
    }
    let mut out: Vec<_> = folded
        .into_iter()
        .map(|(path, kind)| {
            // the file system is the final word on existence
            let kind = match (kind, path.exists()) {
                (FileEventKind::Deleted, true) => FileEventKind::Changed,
                (FileEventKind::Created | FileEventKind::Changed, false) => FileEventKind::Deleted,
                (kind, _) => kind,
            };
            (path, kind)
        })
        .collect();
    out.sort();
    out
}

/// Watch `root` recursively and forward debounced events to `observer`.
/// The task ends when `cancel` fires or the observer is dropped.
pub fn spawn_fs_watcher(
    root: &Path,
    observer: Weak<BasicFileObserver>,
    debounce: Duration,
    ignored_dirs: Vec<String>,
    cancel: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    let mut watcher = FsWatcher::new(root).map_err(|e| BeanscopeError::Internal(e.to_string()))?;
    let root = root.to_path_buf();

    Ok(tokio::spawn(async move {
        tracing::info!("Started watching {}", root.display());
        let mut pending_events: Vec<Event> = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break;
                }
                event = watcher.next_event_async() => {
                    match event {
                        Some(e) => pending_events.push(e),
                        None => break,
                    }
                }
                _ = tokio::time::sleep(debounce), if !pending_events.is_empty() => {
                    let changes = coalesce(&pending_events);
                    pending_events.clear();

                    let Some(observer) = observer.upgrade() else {
                        break;
                    };
                    let relevant: Vec<_> = changes
                        .into_iter()
                        .filter(|(path, _)| !is_ignored(&root, path, &ignored_dirs))
                        .collect();
                    if !relevant.is_empty() {
                        tracing::debug!("Dispatching {} file events", relevant.len());
                    }
                    for (path, kind) in relevant {
                        observer.notify(kind, &path_to_uri(&path));
                    }
                }
            }
        }
        tracing::info!("File watcher task ended for {}", root.display());
    }))
}

/// Only components below `root` count; the workspace may itself live under
/// a directory named like an ignored one.
fn is_ignored(root: &Path, path: &Path, ignored_dirs: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| ignored_dirs.iter().any(|d| d == name))
    })
}
