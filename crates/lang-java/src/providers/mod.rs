//! Symbol providers for Spring annotations. Each provider serves every tag
//! it is registered under; the tag is the annotation's qualified name.

mod bean;
mod request_mapping;
mod stereotype;

pub use bean::BeanMethodProvider;
pub use request_mapping::{RequestMappingProvider, combine_path};
pub use stereotype::{StereotypeProvider, decapitalize};

use crate::error::JavaParseError;
use crate::model::JavaFileInfo;
use beanscope_plugin::{BoxError, ParsedUnit};

fn file_info(unit: &ParsedUnit) -> Result<&JavaFileInfo, BoxError> {
    unit.extension::<JavaFileInfo>()
        .ok_or_else(|| JavaParseError::MissingFileInfo(unit.uri().to_string()).into())
}

/// First non-empty string among the values of `keys`.
fn first_text<'a>(annotation: &'a crate::model::AnnotationUse, keys: &[&str]) -> Option<&'a str> {
    annotation
        .texts(keys)?
        .into_iter()
        .find(|text| !text.is_empty())
}
