use beanscope_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeanscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Project error: {0}")]
    Project(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Plugin error: {0}")]
    Plugin(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for BeanscopeError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        BeanscopeError::Plugin(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BeanscopeError>;
