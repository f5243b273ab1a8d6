use super::{DESCRIPTOR_FILES, is_descriptor};
use beanscope_api::ProjectDiscovery;
use beanscope_api::models::ProjectKey;
use beanscope_api::uri::uri_to_path;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Resolves a document to the nearest enclosing directory that holds a build
/// descriptor. With a workspace root, `all_projects` lists every descriptor
/// below it.
#[derive(Debug, Clone, Default)]
pub struct DescriptorProjectFinder {
    workspace_root: Option<PathBuf>,
    ignored_dirs: Vec<String>,
}

impl DescriptorProjectFinder {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: Some(workspace_root.into()),
            ignored_dirs: Vec::new(),
        }
    }

    pub fn with_ignored_dirs(mut self, dirs: Vec<String>) -> Self {
        self.ignored_dirs = dirs;
        self
    }

    pub fn find_for_path(&self, path: &Path) -> Option<ProjectKey> {
        path.ancestors().skip(1).find_map(|dir| {
            DESCRIPTOR_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
                .map(ProjectKey::new)
        })
    }
}

impl ProjectDiscovery for DescriptorProjectFinder {
    fn find_project_for_uri(&self, uri: &str) -> Option<ProjectKey> {
        let path = uri_to_path(uri)?;
        self.find_for_path(&path)
    }

    fn all_projects(&self) -> Vec<ProjectKey> {
        let Some(root) = &self.workspace_root else {
            return Vec::new();
        };
        let ignored = self.ignored_dirs.clone();
        let mut keys: Vec<ProjectKey> = WalkBuilder::new(root)
            .filter_entry(move |entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !ignored.iter().any(|d| d == name))
            })
            .build()
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let path = entry.path();
                (path.is_file() && is_descriptor(path)).then(|| ProjectKey::new(path))
            })
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanscope_api::uri::path_to_uri;

    #[test]
    fn nearest_descriptor_wins() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path();
        let child = parent.join("module");
        std::fs::create_dir_all(child.join("src/main/java/a")).unwrap();
        std::fs::write(parent.join("pom.xml"), "<project/>").unwrap();
        std::fs::write(child.join("build.gradle"), "").unwrap();

        let finder = DescriptorProjectFinder::new(parent);
        let uri = path_to_uri(&child.join("src/main/java/a/A.java"));
        assert_eq!(
            finder.find_project_for_uri(&uri),
            Some(ProjectKey::new(child.join("build.gradle")))
        );
        assert_eq!(finder.all_projects().len(), 2);
    }

    #[test]
    fn no_descriptor_no_project() {
        let dir = tempfile::tempdir().unwrap();
        let finder = DescriptorProjectFinder::new(dir.path());
        let uri = path_to_uri(&dir.path().join("A.java"));
        assert!(finder.find_project_for_uri(&uri).is_none());
        assert!(finder.find_project_for_uri("untitled:Untitled-1").is_none());
    }
}
