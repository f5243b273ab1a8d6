use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a project: the path of its build descriptor
/// (`pom.xml`, `build.gradle`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(PathBuf);

impl ProjectKey {
    pub fn new(descriptor: impl Into<PathBuf>) -> Self {
        Self(descriptor.into())
    }

    pub fn descriptor(&self) -> &Path {
        &self.0
    }

    /// Directory containing the build descriptor.
    pub fn root(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }

    pub fn descriptor_uri(&self) -> String {
        crate::uri::path_to_uri(&self.0)
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&Path> for ProjectKey {
    fn from(p: &Path) -> Self {
        Self::new(p.to_path_buf())
    }
}

impl From<PathBuf> for ProjectKey {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}
