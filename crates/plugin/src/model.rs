use crate::utils::{LineIndex, range_from_ts};
use beanscope_api::models::{Language, Range};
use std::any::Any;
use std::sync::Arc;
use tree_sitter::{Node, Tree};

/// Parsed representation of one document revision.
///
/// The tree and the text it was parsed from travel together so providers can
/// slice node text and compute UTF-16 ranges without re-reading the document.
pub struct ParsedUnit {
    uri: String,
    version: i32,
    language: Language,
    source: Arc<str>,
    tree: Tree,
    lines: LineIndex,
    extension: Option<Arc<dyn Any + Send + Sync>>,
}

impl ParsedUnit {
    pub fn new(uri: impl Into<String>, version: i32, language: Language, source: Arc<str>, tree: Tree) -> Self {
        let lines = LineIndex::new(&source);
        Self {
            uri: uri.into(),
            version,
            language,
            source,
            tree,
            lines,
            extension: None,
        }
    }

    /// Attach language-specific data computed once at parse time.
    pub fn with_extension<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.extension = Some(Arc::new(data));
        self
    }

    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extension.as_deref().and_then(|ext| ext.downcast_ref::<T>())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`. Empty if the node lies outside the source.
    pub fn text(&self, node: &Node) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// LSP-style range of `node` (0-based lines, UTF-16 columns).
    pub fn range_of(&self, node: &Node) -> Range {
        range_from_ts(&self.source, &self.lines, node.range())
    }
}

impl std::fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("language", &self.language)
            .field("len", &self.source.len())
            .finish()
    }
}

/// A symbol as produced by a provider, before the registry stamps it with
/// the document URI and the capability tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDraft {
    pub name: String,
    pub range: Range,
}

impl SymbolDraft {
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }
}
