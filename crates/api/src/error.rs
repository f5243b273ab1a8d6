#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unsupported language {language} for document {uri}")]
    UnsupportedLanguage { language: String, uri: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
