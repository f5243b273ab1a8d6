use crate::BoxError;
use crate::model::ParsedUnit;
use beanscope_api::models::TextDocument;

pub trait LanguageParseCap: Send + Sync {
    /// Parse a document snapshot. Fails only when the source cannot be
    /// recovered into a usable unit; recoverable syntax errors are tolerated.
    fn parse_document(&self, document: &TextDocument) -> Result<ParsedUnit, BoxError>;
}
