//! Per-file facts gathered once at parse time and shared by every provider.

use beanscope_api::models::Range;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaImport {
    /// Dotted path without the trailing `.*`.
    pub path: String,
    pub on_demand: bool,
    pub is_static: bool,
}

impl JavaImport {
    /// Parse the text of an `import_declaration` node.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix("import")?.trim_end().trim_end_matches(';');
        let mut body = body.trim();
        let is_static = match body.strip_prefix("static") {
            Some(rest) if rest.starts_with(char::is_whitespace) => {
                body = rest.trim_start();
                true
            }
            _ => false,
        };
        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        let (path, on_demand) = match compact.strip_suffix(".*") {
            Some(path) => (path.to_string(), true),
            None => (compact, false),
        };
        if path.is_empty() {
            return None;
        }
        Some(Self {
            path,
            on_demand,
            is_static,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// String literal content, concatenations already folded.
    Text(String),
    /// Any other expression, kept as written (e.g. `RequestMethod.GET`).
    Name(String),
}

impl AnnotationValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationValue::Text(text) => Some(text),
            AnnotationValue::Name(_) => None,
        }
    }

    /// Last dotted segment of a name value, or the text itself.
    pub fn simple(&self) -> &str {
        match self {
            AnnotationValue::Text(text) => text,
            AnnotationValue::Name(name) => name.rsplit('.').next().unwrap_or(name),
        }
    }
}

/// The declaration an annotation is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationTarget {
    Type {
        id: usize,
        name: String,
    },
    Method {
        name: String,
        return_type: Option<String>,
        /// Node id of the enclosing type declaration.
        owner: Option<usize>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationUse {
    /// Annotation type name as written, simple or qualified.
    pub name: String,
    pub range: Range,
    pub target: AnnotationTarget,
    /// Element values by key; a single unnamed element is stored as `value`.
    pub attributes: BTreeMap<String, Vec<AnnotationValue>>,
}

impl AnnotationUse {
    pub fn attribute(&self, key: &str) -> Option<&[AnnotationValue]> {
        self.attributes.get(key).map(Vec::as_slice)
    }

    /// Values of the first present key among `keys`.
    pub fn first_attribute(&self, keys: &[&str]) -> Option<&[AnnotationValue]> {
        keys.iter().find_map(|key| self.attribute(key))
    }

    /// String literal values of the first present key among `keys`.
    pub fn texts(&self, keys: &[&str]) -> Option<Vec<&str>> {
        self.first_attribute(keys)
            .map(|values| values.iter().filter_map(AnnotationValue::as_text).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JavaFileInfo {
    pub package: Option<String>,
    pub imports: Vec<JavaImport>,
    pub annotations: Vec<AnnotationUse>,
}

impl JavaFileInfo {
    /// Whether an annotation written as `written` names the type `fqn`,
    /// judged from the imports and package of this file.
    pub fn resolves_to(&self, written: &str, fqn: &str) -> bool {
        if written.contains('.') {
            return written == fqn;
        }
        let Some((package, simple)) = fqn.rsplit_once('.') else {
            return written == fqn;
        };
        if written != simple {
            return false;
        }
        let imported = self.imports.iter().filter(|i| !i.is_static).any(|i| {
            if i.on_demand {
                i.path == package
            } else {
                i.path == fqn
            }
        });
        imported || self.package.as_deref() == Some(package)
    }

    /// Annotations using type `fqn`.
    pub fn uses_of<'a>(&'a self, fqn: &'a str) -> impl Iterator<Item = &'a AnnotationUse> + 'a {
        self.annotations
            .iter()
            .filter(move |a| self.resolves_to(&a.name, fqn))
    }

    /// Annotations placed directly on the type declaration with node id `id`.
    pub fn annotations_on_type(&self, id: usize) -> impl Iterator<Item = &AnnotationUse> {
        self.annotations
            .iter()
            .filter(move |a| matches!(a.target, AnnotationTarget::Type { id: t, .. } if t == id))
    }
}
