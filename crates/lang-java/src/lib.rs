//! Java support: a tree-sitter parser that records annotation uses, and
//! symbol providers for Spring request mappings and beans.

pub mod annotations;
pub mod cap;
pub mod error;
pub mod model;
pub mod parser;
pub mod providers;
pub mod queries;

pub use cap::registration::java_caps;
pub use error::JavaParseError;
pub use model::JavaFileInfo;

use beanscope_plugin::BoxError;

pub struct JavaPlugin {
    parser: parser::JavaParser,
}

impl JavaPlugin {
    pub fn new() -> std::result::Result<Self, BoxError> {
        Ok(Self {
            parser: parser::JavaParser::new()?,
        })
    }

    pub fn parser(&self) -> &parser::JavaParser {
        &self.parser
    }
}
