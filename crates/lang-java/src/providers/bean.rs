use super::{file_info, first_text};
use crate::annotations::simple_name;
use crate::model::AnnotationTarget;
use beanscope_api::models::CapabilityTag;
use beanscope_plugin::{BoxError, ParsedUnit, SymbolDraft, SymbolProvider};

/// `@+ 'name' (@Bean) ReturnType` for every annotated factory method.
#[derive(Debug, Default)]
pub struct BeanMethodProvider;

impl SymbolProvider for BeanMethodProvider {
    fn extract(&self, unit: &ParsedUnit, tag: &CapabilityTag) -> Result<Vec<SymbolDraft>, BoxError> {
        let info = file_info(unit)?;
        let label = simple_name(tag.as_str());

        Ok(info
            .uses_of(tag.as_str())
            .filter_map(|annotation| {
                let AnnotationTarget::Method { name, return_type, .. } = &annotation.target else {
                    return None;
                };
                let bean = first_text(annotation, &["name", "value"]).unwrap_or(name.as_str());
                let returns = return_type.as_deref().unwrap_or("void");
                Some(SymbolDraft::new(
                    format!("@+ '{bean}' (@{label}) {returns}"),
                    annotation.range,
                ))
            })
            .collect())
    }
}
