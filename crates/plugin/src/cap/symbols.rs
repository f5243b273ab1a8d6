use crate::BoxError;
use crate::model::{ParsedUnit, SymbolDraft};
use beanscope_api::models::CapabilityTag;

/// Turns one parsed unit into the symbols for a single capability.
///
/// Implementations must not keep per-call state: the same provider is invoked
/// concurrently for different documents, and may be registered under several
/// tags.
pub trait SymbolProvider: Send + Sync {
    fn extract(&self, unit: &ParsedUnit, tag: &CapabilityTag) -> Result<Vec<SymbolDraft>, BoxError>;
}
