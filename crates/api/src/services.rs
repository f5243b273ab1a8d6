//! Interfaces of the collaborators the indexing core consumes.

use crate::error::ApiResult;
use crate::models::ProjectKey;
use std::sync::Arc;

/// Callback receiving the URI of the file an event refers to.
pub type FileCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by every [`FileObserver`] subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Resolves which project a document belongs to.
pub trait ProjectDiscovery: Send + Sync {
    fn find_project_for_uri(&self, uri: &str) -> Option<ProjectKey>;

    fn all_projects(&self) -> Vec<ProjectKey>;
}

/// File-watch service. Glob patterns are matched against file-system paths.
pub trait FileObserver: Send + Sync {
    fn on_file_created(&self, globs: &[&str], callback: FileCallback) -> SubscriptionId;

    fn on_file_changed(&self, globs: &[&str], callback: FileCallback) -> SubscriptionId;

    fn on_file_deleted(&self, globs: &[&str], callback: FileCallback) -> SubscriptionId;

    /// Returns false when the subscription was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Read-only access to document content owned by the editor or the disk.
pub trait DocumentStore: Send + Sync {
    fn read_content(&self, uri: &str) -> ApiResult<String>;
}
