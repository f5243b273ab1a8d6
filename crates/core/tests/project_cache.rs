mod common;

use beanscope_api::FileObserver;
use beanscope_api::models::ProjectKey;
use beanscope_core::cache::{ProjectCache, ProjectCacheOptions, ProjectEvent};
use beanscope_core::error::{BeanscopeError, Result};
use beanscope_core::project::{DescriptorProjectFactory, Project, ProjectFactory};
use beanscope_core::watch::BasicFileObserver;
use common::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn cache_with(factory: Arc<dyn ProjectFactory>, options: ProjectCacheOptions) -> (ProjectCache, Arc<BasicFileObserver>) {
    let observer = Arc::new(BasicFileObserver::new());
    let cache = ProjectCache::new(factory, observer.clone() as Arc<dyn FileObserver>, options);
    (cache, observer)
}

fn fixture_key(ws: &Workspace) -> ProjectKey {
    ProjectKey::new(ws.project_dir().join("pom.xml"))
}

fn record(cache: &ProjectCache) -> (Arc<Mutex<Vec<String>>>, beanscope_core::event::Subscription<ProjectEvent>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = cache.listen(move |event| {
        let label = match event {
            ProjectEvent::Created(p) => format!("created {}", p.name()),
            ProjectEvent::Changed(p) => format!("changed {}", p.name()),
            ProjectEvent::Deleted(p) => format!("deleted {}", p.name()),
        };
        sink.lock().unwrap().push(label);
    });
    (seen, subscription)
}

#[test]
fn projects_are_built_once_and_announced() {
    let ws = Workspace::with_fixture();
    let (cache, _observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), Default::default());
    let (seen, _sub) = record(&cache);
    let key = fixture_key(&ws);

    assert!(cache.peek(&key).is_none());
    let first = cache.get(&key).unwrap();
    let second = cache.get(&key).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.name(), "test-annotation-indexing");
    assert_eq!(first.source_roots().len(), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(*seen.lock().unwrap(), vec!["created test-annotation-indexing"]);
}

#[test]
fn descriptor_edits_fire_changed_only_when_effective() {
    let ws = Workspace::with_fixture();
    let (cache, observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), Default::default());
    let key = fixture_key(&ws);
    cache.get(&key).unwrap();
    let (seen, _sub) = record(&cache);

    // untouched descriptor: the update hook reports no change
    observer.notify_file_changed(&key.descriptor_uri());
    assert!(seen.lock().unwrap().is_empty());

    let pom = ws.read("pom.xml").replace(
        "<artifactId>test-annotation-indexing</artifactId>",
        "<artifactId>renamed</artifactId>",
    );
    ws.write("pom.xml", &pom);
    observer.notify_file_changed(&key.descriptor_uri());
    assert_eq!(*seen.lock().unwrap(), vec!["changed renamed"]);
}

#[test]
fn always_fire_changed_reports_no_op_updates() {
    let ws = Workspace::with_fixture();
    let options = ProjectCacheOptions {
        always_fire_changed: true,
        ..Default::default()
    };
    let (cache, _observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), options);
    let key = fixture_key(&ws);
    cache.get(&key).unwrap();
    let (seen, _sub) = record(&cache);

    cache.descriptor_changed(&key);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn deleting_the_descriptor_evicts_the_project() {
    let ws = Workspace::with_fixture();
    let (cache, observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), Default::default());
    let key = fixture_key(&ws);
    cache.get(&key).unwrap();
    let watches = observer.subscription_count();
    let (seen, _sub) = record(&cache);

    std::fs::remove_file(key.descriptor()).unwrap();
    assert_eq!(observer.notify_file_deleted(&key.descriptor_uri()), 1);

    assert!(cache.peek(&key).is_none());
    assert!(cache.is_empty());
    assert_eq!(observer.subscription_count(), watches - 2);
    assert_eq!(*seen.lock().unwrap(), vec!["deleted test-annotation-indexing"]);

    // a missing descriptor cannot be rebuilt
    assert!(cache.get(&key).is_none());
}

#[test]
fn concurrent_evictions_fire_one_deleted_event() {
    let ws = Workspace::with_fixture();
    let (cache, _observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), Default::default());
    let cache = Arc::new(cache);
    let key = fixture_key(&ws);
    cache.get(&key).unwrap();
    let (seen, _sub) = record(&cache);

    let threads = 8;
    let start = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = cache.clone();
            let key = key.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                cache.evict(&key)
            })
        })
        .collect();
    let evicted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();

    assert_eq!(evicted, 1);
    assert!(cache.peek(&key).is_none());
    assert_eq!(seen.lock().unwrap().len(), 1);
}

struct FlakyFactory {
    inner: DescriptorProjectFactory,
    fail: AtomicBool,
    creates: AtomicUsize,
}

impl ProjectFactory for FlakyFactory {
    fn create(&self, key: &ProjectKey) -> Result<Project> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BeanscopeError::Project("not yet".to_string()));
        }
        self.inner.create(key)
    }

    fn update(&self, project: &Project) -> Result<bool> {
        self.inner.update(project)
    }
}

#[test]
fn failed_builds_are_retried_on_the_next_request() {
    let ws = Workspace::with_fixture();
    let factory = Arc::new(FlakyFactory {
        inner: DescriptorProjectFactory::default(),
        fail: AtomicBool::new(true),
        creates: AtomicUsize::new(0),
    });
    let (cache, _observer) = cache_with(factory.clone(), Default::default());
    let key = fixture_key(&ws);

    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());

    factory.fail.store(false, Ordering::SeqCst);
    assert!(cache.get(&key).is_some());
    assert_eq!(factory.creates.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn channel_subscribers_see_events_in_order() {
    let ws = Workspace::with_fixture();
    let (cache, _observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), Default::default());
    let mut events = cache.subscribe();
    let key = fixture_key(&ws);

    cache.get(&key).unwrap();
    cache.evict(&key);

    assert!(matches!(events.recv().await, Some(ProjectEvent::Created(_))));
    let deleted = events.recv().await.unwrap();
    assert!(matches!(deleted, ProjectEvent::Deleted(_)));
    assert_eq!(deleted.key(), &key);
    assert!(events.try_recv().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn async_updates_fire_changed_off_the_caller() {
    let ws = Workspace::with_fixture();
    let options = ProjectCacheOptions {
        async_updates: true,
        ..Default::default()
    };
    let (cache, _observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), options);
    let key = fixture_key(&ws);
    cache.get(&key).unwrap();
    let (seen, _sub) = record(&cache);

    let pom = ws.read("pom.xml").replace(
        "<artifactId>test-annotation-indexing</artifactId>",
        "<artifactId>renamed</artifactId>",
    );
    ws.write("pom.xml", &pom);
    cache.descriptor_changed(&key);

    let deadline = Instant::now() + Duration::from_secs(10);
    while seen.lock().unwrap().is_empty() {
        assert!(Instant::now() < deadline, "no Changed event");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*seen.lock().unwrap(), vec!["changed renamed"]);
}

/// Holds `update` until the test lets it finish.
struct StallingFactory {
    inner: DescriptorProjectFactory,
    entered: Barrier,
    release: Barrier,
}

impl ProjectFactory for StallingFactory {
    fn create(&self, key: &ProjectKey) -> Result<Project> {
        self.inner.create(key)
    }

    fn update(&self, _project: &Project) -> Result<bool> {
        self.entered.wait();
        self.release.wait();
        Ok(true)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn eviction_during_an_update_suppresses_changed() {
    let ws = Workspace::with_fixture();
    let factory = Arc::new(StallingFactory {
        inner: DescriptorProjectFactory::default(),
        entered: Barrier::new(2),
        release: Barrier::new(2),
    });
    let options = ProjectCacheOptions {
        async_updates: true,
        ..Default::default()
    };
    let (cache, _observer) = cache_with(factory.clone(), options);
    let key = fixture_key(&ws);
    let project = cache.get(&key).unwrap();
    let (seen, _sub) = record(&cache);

    cache.descriptor_changed(&key);
    factory.entered.wait();
    assert!(cache.evict(&key));
    factory.release.wait();

    // the refresh task holds the only other handle until it is done
    let deadline = Instant::now() + Duration::from_secs(10);
    while Arc::strong_count(&project) > 1 {
        assert!(Instant::now() < deadline, "refresh never finished");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(*seen.lock().unwrap(), vec!["deleted test-annotation-indexing"]);
}

#[test]
fn an_eviction_racing_creation_is_reported_after_created() {
    let ws = Workspace::with_fixture();
    let (cache, _observer) = cache_with(Arc::new(DescriptorProjectFactory::default()), Default::default());
    let cache = Arc::new(cache);
    let key = fixture_key(&ws);
    let (seen, _sub) = record(&cache);

    // hold the Created delivery open while another thread evicts
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let gated = Arc::new(AtomicBool::new(false));
    let _gate = {
        let (entered, release, gated) = (entered.clone(), release.clone(), gated.clone());
        cache.listen(move |event| {
            if matches!(event, ProjectEvent::Created(_)) && !gated.swap(true, Ordering::SeqCst) {
                entered.wait();
                release.wait();
            }
        })
    };

    let creating = cache.clone();
    let create_key = key.clone();
    let creator = thread::spawn(move || creating.get(&create_key).is_some());

    entered.wait();
    assert!(cache.evict(&key));
    assert!(cache.is_empty());
    release.wait();
    assert!(creator.join().unwrap());

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["created test-annotation-indexing", "deleted test-annotation-indexing"]
    );
}
