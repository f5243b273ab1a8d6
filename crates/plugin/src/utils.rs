use crate::BoxError;
use beanscope_api::models::Range;
use tree_sitter::{Language, Node, Query};

/// Loads a Tree-sitter query from an SCM string.
pub fn load_query(language: &Language, scm: &str) -> Result<Query, BoxError> {
    Query::new(language, scm).map_err(|e| format!("Invalid query: {:?}", e).into())
}

/// Gets the index of a capture name in a query.
pub fn get_capture_index(query: &Query, name: &str) -> Result<u32, BoxError> {
    query
        .capture_index_for_name(name)
        .ok_or_else(|| format!("Capture name '{}' not found in SCM", name).into())
}

/// Declares a struct of capture indices with a `new` that looks each one up
/// in a compiled query.
#[macro_export]
macro_rules! decl_indices {
    ($name:ident, { $($field:ident => $capture:expr),+ $(,)? }) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            $(pub $field: u32,)+
        }

        impl $name {
            pub fn new(query: &tree_sitter::Query) -> std::result::Result<Self, $crate::BoxError> {
                Ok(Self {
                    $($field: $crate::utils::get_capture_index(query, $capture)?,)+
                })
            }
        }
    };
}

/// Byte offsets of every line start in a source text.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Converts a byte column on `line` into UTF-16 code units.
    pub fn utf16_col(&self, text: &str, line: usize, byte_col: usize) -> usize {
        let Some(&start) = self.starts.get(line) else {
            return byte_col;
        };
        let end = (start + byte_col).min(text.len());
        match text.get(start..end) {
            Some(prefix) => prefix.chars().map(char::len_utf16).sum(),
            None => byte_col,
        }
    }
}

/// Convert a tree-sitter range (byte columns) into an LSP-style range.
pub fn range_from_ts(text: &str, lines: &LineIndex, range: tree_sitter::Range) -> Range {
    Range {
        start_line: range.start_point.row,
        start_col: lines.utf16_col(text, range.start_point.row, range.start_point.column),
        end_line: range.end_point.row,
        end_col: lines.utf16_col(text, range.end_point.row, range.end_point.column),
    }
}

/// Named children of `node`, collected through a cursor.
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// First named child of the given kind.
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).find(|c| c.kind() == kind)
}

/// Pre-order traversal calling `visit` on every named node.
pub fn walk_named<'t>(node: Node<'t>, visit: &mut dyn FnMut(Node<'t>)) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        visit(current);
        let children = named_children(&current);
        stack.extend(children.into_iter().rev());
    }
}
