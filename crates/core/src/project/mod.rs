//! Projects: a build descriptor, the sources below it, and how both are found.

pub mod discovery;
pub mod factory;
pub mod scanner;

pub use discovery::DescriptorProjectFinder;
pub use factory::{DescriptorProjectFactory, ProjectFactory};

use beanscope_api::models::ProjectKey;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// File names that mark a project root.
pub const DESCRIPTOR_FILES: &[&str] = &["pom.xml", "build.gradle", "build.gradle.kts"];

pub fn is_descriptor(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| DESCRIPTOR_FILES.contains(&n))
}

/// Materialized project handle shared through the project cache.
#[derive(Debug)]
pub struct Project {
    key: ProjectKey,
    name: RwLock<String>,
    source_roots: Vec<PathBuf>,
    descriptor_hash: AtomicU64,
    generation: AtomicU64,
}

impl Project {
    pub fn new(key: ProjectKey, name: impl Into<String>, source_roots: Vec<PathBuf>, descriptor_hash: u64) -> Self {
        Self {
            key,
            name: RwLock::new(name.into()),
            source_roots,
            descriptor_hash: AtomicU64::new(descriptor_hash),
            generation: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &ProjectKey {
        &self.key
    }

    pub fn name(&self) -> String {
        match self.name.read() {
            Ok(name) => name.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn set_name(&self, name: String) {
        match self.name.write() {
            Ok(mut slot) => *slot = name,
            Err(poisoned) => *poisoned.into_inner() = name,
        }
    }

    pub fn root(&self) -> &Path {
        self.key.root()
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn descriptor_hash(&self) -> u64 {
        self.descriptor_hash.load(Ordering::Acquire)
    }

    /// Stores a new descriptor hash, returning whether it differed.
    pub(crate) fn swap_descriptor_hash(&self, hash: u64) -> bool {
        self.descriptor_hash.swap(hash, Ordering::AcqRel) != hash
    }

    /// Number of full rescans started for this project.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.source_roots.iter().any(|root| path.starts_with(root))
    }
}
