use super::language::CapabilityTag;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Zero-based line/column range. Columns count UTF-16 code units, as in LSP.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Range {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn contains(&self, line: usize, col: usize) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && col < self.start_col {
            return false;
        }
        if line == self.end_line && col > self.end_col {
            return false;
        }
        true
    }
}

impl Ord for Range {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.start_line, self.start_col, self.end_line, self.end_col).cmp(&(
            other.start_line,
            other.start_col,
            other.end_line,
            other.end_col,
        ))
    }
}

impl PartialOrd for Range {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

/// An indexed, named, located fact extracted from a document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub location: Location,
    pub capability: CapabilityTag,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        range: Range,
        capability: CapabilityTag,
    ) -> Self {
        Self {
            name: name.into(),
            location: Location {
                uri: uri.into(),
                range,
            },
            capability,
        }
    }

    pub fn uri(&self) -> &str {
        &self.location.uri
    }

    pub fn range(&self) -> &Range {
        &self.location.range
    }

    /// Ordering used by every query surface: document URI, then source position.
    pub fn cmp_by_location(&self, other: &Self) -> Ordering {
        self.location
            .uri
            .cmp(&other.location.uri)
            .then_with(|| self.location.range.cmp(&other.location.range))
            .then_with(|| self.name.cmp(&other.name))
    }
}
