use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Language identifier of a document, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(Cow<'static, str>);

impl Language {
    pub const JAVA: Language = Language(Cow::Borrowed("java"));
    pub const XML: Language = Language(Cow::Borrowed("xml"));
    pub const PROPERTIES: Language = Language(Cow::Borrowed("properties"));
    pub const PLAINTEXT: Language = Language(Cow::Borrowed("plaintext"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Map a file extension to a Language.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "java" => Self::JAVA,
            "xml" => Self::XML,
            "properties" => Self::PROPERTIES,
            _ => Self::PLAINTEXT,
        }
    }

    /// Guess the language from the file name at the end of a URI.
    pub fn from_uri(uri: &str) -> Self {
        uri.rsplit_once('.')
            .map(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(Self::PLAINTEXT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Identifies the extraction rule that produced a symbol.
///
/// For annotation based providers this is the fully-qualified annotation name,
/// e.g. `org.springframework.web.bind.annotation.RequestMapping`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityTag(Cow<'static, str>);

impl CapabilityTag {
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last segment of a dotted tag (`RequestMapping` for the request mapping tag).
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for CapabilityTag {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

impl From<String> for CapabilityTag {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
