use super::language::Language;
use serde::{Deserialize, Serialize};

/// Snapshot of an editable unit of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    pub uri: String,
    pub language: Language,
    pub version: i32,
    pub text: String,
}

impl TextDocument {
    pub fn new(
        uri: impl Into<String>,
        language: Language,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            language,
            version,
            text: text.into(),
        }
    }

    /// Document with a language guessed from its URI and version 0.
    pub fn from_content(uri: impl Into<String>, text: impl Into<String>) -> Self {
        let uri = uri.into();
        let language = Language::from_uri(&uri);
        Self::new(uri, language, 0, text)
    }
}
