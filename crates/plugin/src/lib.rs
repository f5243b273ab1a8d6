//! Capabilities a language plugin contributes to the indexing core.

pub mod cap;
pub mod model;
pub mod registration;
pub mod utils;

pub use cap::*;
pub use model::{ParsedUnit, SymbolDraft};
pub use registration::{LanguageCaps, ProviderRegistration};

/// Error type for plugin operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
