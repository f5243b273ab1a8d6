use super::Project;
use crate::error::{BeanscopeError, Result};
use beanscope_api::models::ProjectKey;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Builds and refreshes [`Project`] handles for the project cache.
pub trait ProjectFactory: Send + Sync {
    fn create(&self, key: &ProjectKey) -> Result<Project>;

    /// Refresh `project` after its descriptor changed.
    /// Returns true when the effective project state differs.
    fn update(&self, project: &Project) -> Result<bool>;
}

/// Factory for Maven/Gradle layouts: sources under `src/main/java` and,
/// optionally, `src/test/java`.
#[derive(Debug, Clone)]
pub struct DescriptorProjectFactory {
    include_test_sources: bool,
}

impl DescriptorProjectFactory {
    pub fn new(include_test_sources: bool) -> Self {
        Self { include_test_sources }
    }

    fn read_descriptor(key: &ProjectKey) -> Result<String> {
        std::fs::read_to_string(key.descriptor()).map_err(|e| {
            BeanscopeError::Project(format!("cannot read descriptor {}: {}", key, e))
        })
    }

    fn project_name(key: &ProjectKey, descriptor: &str) -> String {
        let from_pom = key
            .descriptor()
            .file_name()
            .is_some_and(|n| n == "pom.xml")
            .then(|| artifact_id(descriptor))
            .flatten();
        from_pom.unwrap_or_else(|| dir_name(key.root()))
    }
}

impl Default for DescriptorProjectFactory {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProjectFactory for DescriptorProjectFactory {
    fn create(&self, key: &ProjectKey) -> Result<Project> {
        let descriptor = Self::read_descriptor(key)?;
        let root = key.root();
        let mut roots = vec![root.join("src").join("main").join("java")];
        if self.include_test_sources {
            roots.push(root.join("src").join("test").join("java"));
        }
        Ok(Project::new(
            key.clone(),
            Self::project_name(key, &descriptor),
            roots,
            xxh3_64(descriptor.as_bytes()),
        ))
    }

    fn update(&self, project: &Project) -> Result<bool> {
        let descriptor = Self::read_descriptor(project.key())?;
        let changed = project.swap_descriptor_hash(xxh3_64(descriptor.as_bytes()));
        if changed {
            project.set_name(Self::project_name(project.key(), &descriptor));
        }
        Ok(changed)
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The `<artifactId>` child of the root `<project>` element.
fn artifact_id(pom: &str) -> Option<String> {
    let doc = match roxmltree::Document::parse(pom) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!("Unparsable pom.xml: {}", err);
            return None;
        }
    };
    let project = doc.root_element();
    if project.tag_name().name() != "project" {
        return None;
    }
    project
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "artifactId")
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
