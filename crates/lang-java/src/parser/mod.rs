use crate::error::JavaParseError;
use crate::model::{AnnotationTarget, AnnotationUse, AnnotationValue, JavaFileInfo, JavaImport};
use crate::queries::java_annotations::{AnnotationIndices, JAVA_ANNOTATIONS_SCM};
use beanscope_plugin::utils::named_children;
use beanscope_plugin::{BoxError, ParsedUnit};
use std::collections::BTreeMap;
use std::sync::Arc;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

pub(crate) const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const COMMENTS: &[&str] = &["line_comment", "block_comment"];

#[derive(Clone)]
pub struct JavaParser {
    language: tree_sitter::Language,
    query: Arc<Query>,
    indices: AnnotationIndices,
}

impl JavaParser {
    pub fn new() -> Result<Self, BoxError> {
        let language: tree_sitter::Language = tree_sitter_java::LANGUAGE.into();
        let query = beanscope_plugin::utils::load_query(&language, JAVA_ANNOTATIONS_SCM)?;
        let indices = AnnotationIndices::new(&query)?;
        Ok(Self {
            language,
            query: Arc::new(query),
            indices,
        })
    }

    /// Parse `source`, tolerating syntax errors as long as a top-level type
    /// declaration survived.
    pub fn parse(&self, uri: &str, source: &str) -> Result<Tree, JavaParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| JavaParseError::Language(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| JavaParseError::NoTree(uri.to_string()))?;
        let root = tree.root_node();
        if root.has_error() && !has_type_declaration(&root) {
            return Err(JavaParseError::Unrecoverable(uri.to_string()));
        }
        Ok(tree)
    }

    /// Collect package, imports and annotation uses of a parsed unit.
    pub fn file_info(&self, unit: &ParsedUnit) -> JavaFileInfo {
        let mut info = JavaFileInfo::default();
        let source = unit.source();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, unit.root(), source.as_bytes());
        while let Some(mat) = matches.next() {
            if let Some(cap) = mat.captures.iter().find(|c| c.index == self.indices.package) {
                info.package = Some(compact(unit.text(&cap.node)));
            } else if let Some(cap) = mat.captures.iter().find(|c| c.index == self.indices.import) {
                if let Some(import) = JavaImport::parse(unit.text(&cap.node)) {
                    info.imports.push(import);
                }
            } else if let Some(cap) = mat.captures.iter().find(|c| c.index == self.indices.annotation) {
                let node = cap.node;
                let Some(name) = mat.captures.iter().find(|c| c.index == self.indices.name) else {
                    continue;
                };
                info.annotations.push(AnnotationUse {
                    name: compact(unit.text(&name.node)),
                    range: unit.range_of(&node),
                    target: annotation_target(unit, &node),
                    attributes: attributes(unit, &node),
                });
            }
        }
        info.annotations.sort_by_key(|a| (a.range.start_line, a.range.start_col));
        info
    }
}

fn has_type_declaration(root: &Node) -> bool {
    named_children(root)
        .iter()
        .any(|n| TYPE_DECLARATIONS.contains(&n.kind()))
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn enclosing_type(node: &Node) -> Option<usize> {
    let mut current = node.parent();
    while let Some(n) = current {
        if TYPE_DECLARATIONS.contains(&n.kind()) {
            return Some(n.id());
        }
        current = n.parent();
    }
    None
}

fn annotation_target(unit: &ParsedUnit, node: &Node) -> AnnotationTarget {
    let Some(decl) = node
        .parent()
        .filter(|p| p.kind() == "modifiers")
        .and_then(|p| p.parent())
    else {
        return AnnotationTarget::Other;
    };
    let name = decl
        .child_by_field_name("name")
        .map(|n| unit.text(&n).to_string())
        .unwrap_or_default();
    match decl.kind() {
        kind if TYPE_DECLARATIONS.contains(&kind) => AnnotationTarget::Type { id: decl.id(), name },
        "method_declaration" => AnnotationTarget::Method {
            name,
            return_type: decl.child_by_field_name("type").map(|t| compact(unit.text(&t))),
            owner: enclosing_type(&decl),
        },
        _ => AnnotationTarget::Other,
    }
}

fn attributes(unit: &ParsedUnit, node: &Node) -> BTreeMap<String, Vec<AnnotationValue>> {
    let mut attributes = BTreeMap::new();
    let Some(args) = node.child_by_field_name("arguments") else {
        return attributes;
    };
    for child in named_children(&args) {
        if COMMENTS.contains(&child.kind()) {
            continue;
        }
        if child.kind() == "element_value_pair" {
            let (Some(key), Some(value)) = (child.child_by_field_name("key"), child.child_by_field_name("value"))
            else {
                continue;
            };
            let mut values = Vec::new();
            element_values(unit, &value, &mut values);
            attributes.insert(unit.text(&key).to_string(), values);
        } else {
            let mut values = Vec::new();
            element_values(unit, &child, &mut values);
            attributes.insert("value".to_string(), values);
        }
    }
    attributes
}

fn element_values(unit: &ParsedUnit, node: &Node, out: &mut Vec<AnnotationValue>) {
    match node.kind() {
        "element_value_array_initializer" => {
            for child in named_children(node) {
                if !COMMENTS.contains(&child.kind()) {
                    element_values(unit, &child, out);
                }
            }
        }
        _ => match fold_text(unit, node) {
            Some(text) => out.push(AnnotationValue::Text(text)),
            None => out.push(AnnotationValue::Name(compact(unit.text(node)))),
        },
    }
}

/// Constant-fold string literals and their `+` concatenations.
fn fold_text(unit: &ParsedUnit, node: &Node) -> Option<String> {
    match node.kind() {
        "string_literal" => Some(unquote(unit.text(node)).to_string()),
        "parenthesized_expression" => node.named_child(0).and_then(|inner| fold_text(unit, &inner)),
        "binary_expression" => {
            let operator = node.child_by_field_name("operator")?;
            if operator.kind() != "+" {
                return None;
            }
            let left = fold_text(unit, &node.child_by_field_name("left")?)?;
            let right = fold_text(unit, &node.child_by_field_name("right")?)?;
            Some(left + &right)
        }
        _ => None,
    }
}

fn unquote(literal: &str) -> &str {
    for quote in ["\"\"\"", "\""] {
        if let Some(inner) = literal.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    literal
}
