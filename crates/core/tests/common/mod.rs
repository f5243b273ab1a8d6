#![allow(dead_code)]

use beanscope_api::uri::path_to_uri;
use beanscope_core::IndexerConfig;
use beanscope_core::cache::{SymbolCache, SymbolCacheVoid};
use beanscope_core::documents::FsDocumentStore;
use beanscope_core::index::SymbolIndex;
use beanscope_core::project::DescriptorProjectFinder;
use beanscope_plugin::LanguageCaps;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const FIXTURE: &str = "test-annotation-indexing";

pub const MAIN_CLASS: &str = "src/main/java/org/test/MainClass.java";
pub const SIMPLE_MAPPING_CLASS: &str = "src/main/java/org/test/SimpleMappingClass.java";
pub const SUBPACKAGE_CLASS: &str = "src/main/java/org/test/sub/MappingClassSubpackage.java";

pub const MAIN_CLASS_SYMBOL: &str =
    "@+ 'mainClass' (@SpringBootApplication <: @SpringBootConfiguration, @Configuration, @Component) MainClass";

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// A scratch workspace holding a copy of the fixture project.
pub struct Workspace {
    _dir: TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn with_fixture() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(FIXTURE);
        copy_dir(&source, &root.join(FIXTURE));
        Self { _dir: dir, root }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root.join(FIXTURE)
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.project_dir().join(relative)
    }

    pub fn uri(&self, relative: &str) -> String {
        path_to_uri(&self.path(relative))
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

pub fn java_caps() -> LanguageCaps {
    beanscope_java::java_caps().expect("java caps")
}

pub fn java_index(root: &Path, config: IndexerConfig) -> SymbolIndex {
    java_index_with_cache(root, config, Arc::new(SymbolCacheVoid))
}

pub fn java_index_with_cache(root: &Path, config: IndexerConfig, cache: Arc<dyn SymbolCache>) -> SymbolIndex {
    SymbolIndex::new(
        Arc::new(config),
        &[java_caps()],
        Arc::new(DescriptorProjectFinder::new(root)),
        Arc::new(FsDocumentStore::new()),
        cache,
    )
}
