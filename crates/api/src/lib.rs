pub mod error;
pub mod models;
pub mod services;
pub mod uri;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use models::*;
pub use services::{
    DocumentStore, FileCallback, FileObserver, ProjectDiscovery, SubscriptionId,
};
