mod common;

use beanscope_core::cache::{SymbolCache, SymbolCacheOnDisk};
use beanscope_core::project::{DescriptorProjectFactory, ProjectFactory};
use beanscope_core::index::SymbolIndex;
use beanscope_core::{BeanscopeEngine, IndexerConfig};
use beanscope_api::models::ProjectKey;
use common::*;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio_util::sync::CancellationToken;

fn engine(ws: &Workspace, config: IndexerConfig) -> BeanscopeEngine {
    BeanscopeEngine::builder(ws.root.clone())
        .with_config(config)
        .with_language_caps(java_caps())
        .build()
        .unwrap()
}

fn names(engine: &BeanscopeEngine) -> Vec<String> {
    names_of(engine.index())
}

fn names_of(index: &SymbolIndex) -> Vec<String> {
    index.get_all_symbols("").into_iter().map(|s| s.name).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn indexing_follows_file_events() {
    let ws = Workspace::with_fixture();
    let engine = engine(&ws, IndexerConfig::default());

    engine.index_workspace().await;
    assert_eq!(engine.projects().len(), 1);
    assert_eq!(names(&engine).len(), 8);
    assert!(!engine.index().is_initializing());

    // rename a mapping on disk and report the change
    let simple = ws.uri(SIMPLE_MAPPING_CLASS);
    let changed = ws.read(SIMPLE_MAPPING_CLASS).replace("mapping1", "mapping1-CHANGED");
    ws.write(SIMPLE_MAPPING_CLASS, &changed);
    engine.observer().notify_file_changed(&simple);
    engine.wait_idle().await;

    let symbols = engine.index().get_all_symbols("");
    assert_eq!(symbols.len(), 8);
    let renamed = symbols
        .iter()
        .find(|s| s.name == "@/mapping1-CHANGED")
        .expect("renamed mapping");
    assert_eq!(renamed.uri(), simple);
    assert_eq!(renamed.range().start_line, 6);
    assert_eq!(renamed.range().end_col, 36);

    // delete the file
    fs::remove_file(ws.path(SIMPLE_MAPPING_CLASS)).unwrap();
    engine.observer().notify_file_deleted(&simple);
    engine.wait_idle().await;
    assert_eq!(names(&engine).len(), 6);
    assert!(engine.index().get_symbols(&simple).is_none());

    // and create another one
    let created = "src/main/java/org/test/Created.java";
    ws.write(
        created,
        "package org.test;\n\nimport org.springframework.stereotype.Service;\n\n@Service\npublic class Created {}\n",
    );
    engine.observer().notify_file_created(&ws.uri(created));
    engine.wait_idle().await;
    assert!(names(&engine).contains(&"@+ 'created' (@Service <: @Component) Created".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn descriptor_events_rescan_or_drop_the_project() {
    let ws = Workspace::with_fixture();
    let engine = engine(&ws, IndexerConfig::default());
    engine.index_workspace().await;
    let key = ProjectKey::new(ws.project_dir().join("pom.xml"));

    // a file written without any file event shows up after the descriptor changes
    ws.write(
        "src/main/java/org/test/Quiet.java",
        "package org.test;\n\nimport org.springframework.stereotype.Component;\n\n@Component\nclass Quiet {}\n",
    );
    let pom = ws.read("pom.xml").replace("0.0.1-SNAPSHOT", "0.0.2-SNAPSHOT");
    ws.write("pom.xml", &pom);
    engine.observer().notify_file_changed(&key.descriptor_uri());
    engine.wait_idle().await;
    assert_eq!(names(&engine).len(), 9);

    fs::remove_file(key.descriptor()).unwrap();
    engine.observer().notify_file_deleted(&key.descriptor_uri());
    engine.wait_idle().await;
    assert!(engine.projects().is_empty());
    assert!(names(&engine).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn serialized_updates_keep_the_last_content() {
    let ws = Workspace::with_fixture();
    let config = IndexerConfig {
        serialize_document_updates: true,
        ..IndexerConfig::default()
    };
    let engine = engine(&ws, config);
    engine.index_workspace().await;

    let simple = ws.uri(SIMPLE_MAPPING_CLASS);
    let original = ws.read(SIMPLE_MAPPING_CLASS);
    for round in 0..5 {
        ws.write(
            SIMPLE_MAPPING_CLASS,
            &original.replace("mapping1", &format!("mapping1-{round}")),
        );
        engine.observer().notify_file_changed(&simple);
    }
    engine.wait_idle().await;

    let symbols = engine.index().get_symbols(&simple).unwrap();
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[0].name, "@/mapping1-4");
}

#[tokio::test(flavor = "multi_thread")]
async fn the_file_watcher_reports_edits() {
    let ws = Workspace::with_fixture();
    let config = IndexerConfig {
        watch_debounce_ms: 50,
        ..IndexerConfig::default()
    };
    let engine = engine(&ws, config);
    engine.index_workspace().await;
    let _watcher = engine.watch().unwrap();
    // let the watcher register before editing
    tokio::time::sleep(Duration::from_millis(200)).await;

    let changed = ws.read(SIMPLE_MAPPING_CLASS).replace("mapping2", "mapping2-WATCHED");
    ws.write(SIMPLE_MAPPING_CLASS, &changed);

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        engine.wait_idle().await;
        if names(&engine).iter().any(|n| n == "@/mapping2-WATCHED") {
            break;
        }
        assert!(Instant::now() < deadline, "watcher never delivered the edit");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[test]
fn symbol_cache_restores_unchanged_projects() {
    let ws = Workspace::with_fixture();
    let cache_dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        use_symbol_cache: true,
        ..IndexerConfig::default()
    };
    let key = ProjectKey::new(ws.project_dir().join("pom.xml"));
    let project = DescriptorProjectFactory::default().create(&key).unwrap();
    let token = CancellationToken::new();

    let first_cache = Arc::new(SymbolCacheOnDisk::new(cache_dir.path().to_path_buf()));
    let first = java_index_with_cache(&ws.root, config.clone(), first_cache);
    let summary = first.scan_project(&project, &token).unwrap();
    assert_eq!((summary.files, summary.symbols, summary.restored), (3, 8, 0));

    // a fresh index on the same cache directory skips parsing
    let second_cache = Arc::new(SymbolCacheOnDisk::new(cache_dir.path().to_path_buf()));
    let stats = second_cache.stats();
    assert_eq!((stats.projects, stats.documents, stats.symbols), (1, 3, 8));
    let second = java_index_with_cache(&ws.root, config.clone(), second_cache.clone());
    let summary = second.scan_project(&project, &token).unwrap();
    assert_eq!((summary.files, summary.symbols, summary.restored), (3, 8, 3));
    assert_eq!(second.get_all_symbols("").len(), 8);

    // a touched file invalidates the stored set
    let file = fs::File::options().write(true).open(ws.path(MAIN_CLASS)).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
    drop(file);
    let summary = second.scan_project(&project, &token).unwrap();
    assert_eq!(summary.restored, 0);
    assert_eq!(summary.symbols, 8);

    second_cache.clear().unwrap();
    assert_eq!(second_cache.stats().projects, 0);
}

#[test]
fn unsaved_edits_stay_out_of_the_symbol_cache() {
    let ws = Workspace::with_fixture();
    let cache_dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        use_symbol_cache: true,
        ..IndexerConfig::default()
    };
    let key = ProjectKey::new(ws.project_dir().join("pom.xml"));
    let project = DescriptorProjectFactory::default().create(&key).unwrap();
    let token = CancellationToken::new();

    let first_cache = Arc::new(SymbolCacheOnDisk::new(cache_dir.path().to_path_buf()));
    let first = java_index_with_cache(&ws.root, config.clone(), first_cache);
    first.scan_project(&project, &token).unwrap();

    // editor text that was never written to disk
    let simple = ws.uri(SIMPLE_MAPPING_CLASS);
    let unsaved = ws.read(SIMPLE_MAPPING_CLASS).replace("mapping1", "UNSAVED");
    first.update_document(&simple, &unsaved).unwrap();
    assert_eq!(first.get_all_symbols("@/UNSAVED").len(), 1);

    let second_cache = Arc::new(SymbolCacheOnDisk::new(cache_dir.path().to_path_buf()));
    let second = java_index_with_cache(&ws.root, config.clone(), second_cache);
    let summary = second.scan_project(&project, &token).unwrap();
    assert_eq!(summary.restored, 3);
    let restored = names_of(&second);
    assert!(restored.contains(&"@/mapping1".to_string()));
    assert!(!restored.iter().any(|n| n.contains("UNSAVED")));

    // saving the edit and reporting the file does reach the cache
    ws.write(SIMPLE_MAPPING_CLASS, &unsaved);
    let file = fs::File::options().write(true).open(ws.path(SIMPLE_MAPPING_CLASS)).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
    drop(file);
    second.create_document(&simple).unwrap();

    let third_cache = Arc::new(SymbolCacheOnDisk::new(cache_dir.path().to_path_buf()));
    let third = java_index_with_cache(&ws.root, config, third_cache);
    let summary = third.scan_project(&project, &token).unwrap();
    assert_eq!(summary.restored, 3);
    assert!(names_of(&third).contains(&"@/UNSAVED".to_string()));
}

#[test]
fn a_cancelled_scan_reports_cancellation() {
    let ws = Workspace::with_fixture();
    let index = java_index(&ws.root, IndexerConfig::default());
    let key = ProjectKey::new(ws.project_dir().join("pom.xml"));
    let project = DescriptorProjectFactory::default().create(&key).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    assert!(matches!(
        index.scan_project(&project, &token),
        Err(beanscope_core::BeanscopeError::Cancelled)
    ));
    assert!(!index.is_initializing());
}
