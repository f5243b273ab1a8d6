//! Project-keyed cache with descriptor watching.
//!
//! Handles are built on first request. Each cached project watches its
//! descriptor: a change runs the factory's `update` hook, a deletion evicts
//! the project. Listeners observe `Created`, `Changed` and `Deleted` through
//! the cache's event bus.

use crate::event::{EventBus, Subscription};
use crate::project::{Project, ProjectFactory};
use beanscope_api::FileObserver;
use beanscope_api::models::ProjectKey;
use beanscope_api::services::SubscriptionId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Debug, Clone)]
pub enum ProjectEvent {
    Created(Arc<Project>),
    Changed(Arc<Project>),
    Deleted(Arc<Project>),
}

impl ProjectEvent {
    pub fn project(&self) -> &Arc<Project> {
        match self {
            ProjectEvent::Created(p) | ProjectEvent::Changed(p) | ProjectEvent::Deleted(p) => p,
        }
    }

    pub fn key(&self) -> &ProjectKey {
        self.project().key()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectCacheOptions {
    pub async_updates: bool,
    pub always_fire_changed: bool,
}

/// Whether `Created` went out for a cached project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Announcement {
    Pending,
    Done,
    // evicted before `Created` went out; the creator fires `Deleted`
    EvictedEarly,
}

type AnnouncementSlot = Arc<Mutex<Announcement>>;

fn lock(slot: &AnnouncementSlot) -> MutexGuard<'_, Announcement> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

struct CachedProject {
    project: Arc<Project>,
    watches: Vec<SubscriptionId>,
    announcement: AnnouncementSlot,
}

struct Inner {
    factory: Arc<dyn ProjectFactory>,
    observer: Arc<dyn FileObserver>,
    entries: DashMap<ProjectKey, CachedProject>,
    events: EventBus<ProjectEvent>,
    options: ProjectCacheOptions,
}

pub struct ProjectCache {
    inner: Arc<Inner>,
}

impl ProjectCache {
    pub fn new(
        factory: Arc<dyn ProjectFactory>,
        observer: Arc<dyn FileObserver>,
        options: ProjectCacheOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                factory,
                observer,
                entries: DashMap::new(),
                events: EventBus::new(),
                options,
            }),
        }
    }

    /// Cached project for `key`, built on a miss. Build failures are logged
    /// and yield `None`; the next call tries again.
    pub fn get(&self, key: &ProjectKey) -> Option<Arc<Project>> {
        if let Some(cached) = self.inner.entries.get(key) {
            return Some(cached.project.clone());
        }

        let project = match self.inner.factory.create(key) {
            Ok(project) => Arc::new(project),
            Err(err) => {
                tracing::warn!("Failed to create project {}: {}", key, err);
                return None;
            }
        };

        let announcement = Arc::new(Mutex::new(Announcement::Pending));
        match self.inner.entries.entry(key.clone()) {
            // lost a race with a concurrent build; keep the first one
            Entry::Occupied(existing) => return Some(existing.get().project.clone()),
            Entry::Vacant(vacant) => {
                let watches = Inner::watch_descriptor(&self.inner, key);
                vacant.insert(CachedProject {
                    project: project.clone(),
                    watches,
                    announcement: announcement.clone(),
                });
            }
        }

        tracing::info!("Project {} created ({})", project.name(), key);
        self.inner.events.fire(ProjectEvent::Created(project.clone()));
        let evicted = {
            let mut state = lock(&announcement);
            let evicted = *state == Announcement::EvictedEarly;
            *state = Announcement::Done;
            evicted
        };
        if evicted {
            tracing::info!("Project {} deleted", key);
            self.inner.events.fire(ProjectEvent::Deleted(project.clone()));
        }
        Some(project)
    }

    /// Cached project without building on a miss.
    pub fn peek(&self, key: &ProjectKey) -> Option<Arc<Project>> {
        self.inner.entries.get(key).map(|c| c.project.clone())
    }

    pub fn projects(&self) -> Vec<Arc<Project>> {
        let mut projects: Vec<_> = self.inner.entries.iter().map(|c| c.project.clone()).collect();
        projects.sort_by(|a, b| a.key().cmp(b.key()));
        projects
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn subscribe(&self) -> Subscription<ProjectEvent> {
        self.inner.events.subscribe()
    }

    pub fn listen(&self, callback: impl Fn(&ProjectEvent) + Send + Sync + 'static) -> Subscription<ProjectEvent> {
        self.inner.events.listen(callback)
    }

    /// Handle a descriptor change as if reported by the file observer.
    pub fn descriptor_changed(&self, key: &ProjectKey) {
        Inner::on_descriptor_changed(&self.inner, key);
    }

    /// Evict `key`. Returns whether this call performed the eviction.
    pub fn evict(&self, key: &ProjectKey) -> bool {
        self.inner.on_descriptor_deleted(key)
    }
}

impl Inner {
    fn watch_descriptor(inner: &Arc<Inner>, key: &ProjectKey) -> Vec<SubscriptionId> {
        let glob = literal_glob(&key.descriptor().to_string_lossy());
        let globs = [glob.as_str()];

        let weak: Weak<Inner> = Arc::downgrade(inner);
        let changed_key = key.clone();
        let changed = inner.observer.on_file_changed(
            &globs,
            Arc::new(move |_uri: &str| {
                if let Some(inner) = weak.upgrade() {
                    Inner::on_descriptor_changed(&inner, &changed_key);
                }
            }),
        );

        let weak: Weak<Inner> = Arc::downgrade(inner);
        let deleted_key = key.clone();
        let deleted = inner.observer.on_file_deleted(
            &globs,
            Arc::new(move |_uri: &str| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_descriptor_deleted(&deleted_key);
                }
            }),
        );

        vec![changed, deleted]
    }

    fn on_descriptor_changed(inner: &Arc<Inner>, key: &ProjectKey) {
        let Some(project) = inner.entries.get(key).map(|c| c.project.clone()) else {
            return;
        };
        if inner.options.async_updates {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let inner = inner.clone();
                handle.spawn_blocking(move || inner.refresh(&project));
                return;
            }
        }
        inner.refresh(&project);
    }

    fn refresh(&self, project: &Arc<Project>) {
        let changed = match self.factory.update(project) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!("Failed to update project {}: {}", project.key(), err);
                return;
            }
        };
        if !changed && !self.options.always_fire_changed {
            tracing::debug!("Descriptor of {} changed without effect", project.key());
            return;
        }
        // an eviction that ran meanwhile wins over the update, and a project
        // not yet announced is reported by `Created` with its fresh state
        let announced = self
            .entries
            .get(project.key())
            .filter(|c| Arc::ptr_eq(&c.project, project))
            .map(|c| c.announcement.clone())
            .is_some_and(|slot| *lock(&slot) == Announcement::Done);
        if announced {
            tracing::info!("Project {} changed", project.key());
            self.events.fire(ProjectEvent::Changed(project.clone()));
        }
    }

    fn on_descriptor_deleted(&self, key: &ProjectKey) -> bool {
        // DashMap::remove hands the entry to exactly one caller
        let Some((_, cached)) = self.entries.remove(key) else {
            return false;
        };
        for id in cached.watches {
            self.observer.unsubscribe(id);
        }
        let announced = {
            let mut state = lock(&cached.announcement);
            if *state == Announcement::Pending {
                *state = Announcement::EvictedEarly;
            }
            *state == Announcement::Done
        };
        if announced {
            tracing::info!("Project {} deleted", key);
            self.events.fire(ProjectEvent::Deleted(cached.project));
        }
        true
    }
}

/// Escape glob metacharacters so `path` matches only itself.
fn literal_glob(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_glob_escapes_metacharacters() {
        assert_eq!(literal_glob("/a/b[1]/pom.xml"), "/a/b[[]1[]]/pom.xml");
        assert_eq!(literal_glob("/plain/pom.xml"), "/plain/pom.xml");
    }
}
