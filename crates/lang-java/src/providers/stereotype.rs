use super::{file_info, first_text};
use crate::annotations::{meta_annotations, simple_name};
use crate::model::AnnotationTarget;
use beanscope_api::models::CapabilityTag;
use beanscope_plugin::{BoxError, ParsedUnit, SymbolDraft, SymbolProvider};

/// Bean symbols for classes carrying a stereotype annotation, e.g.
/// `@+ 'mainClass' (@SpringBootApplication <: @SpringBootConfiguration, @Configuration, @Component) MainClass`.
#[derive(Debug, Default)]
pub struct StereotypeProvider;

impl SymbolProvider for StereotypeProvider {
    fn extract(&self, unit: &ParsedUnit, tag: &CapabilityTag) -> Result<Vec<SymbolDraft>, BoxError> {
        let info = file_info(unit)?;
        let fqn = tag.as_str();
        let chain = annotation_chain(fqn);

        Ok(info
            .uses_of(fqn)
            .filter_map(|annotation| {
                let AnnotationTarget::Type { name, .. } = &annotation.target else {
                    return None;
                };
                let bean = first_text(annotation, &["value"])
                    .map(str::to_string)
                    .unwrap_or_else(|| decapitalize(name));
                Some(SymbolDraft::new(
                    format!("@+ '{bean}' ({chain}) {name}"),
                    annotation.range,
                ))
            })
            .collect())
    }
}

fn annotation_chain(fqn: &str) -> String {
    let mut chain = format!("@{}", simple_name(fqn));
    let metas = meta_annotations(fqn);
    if !metas.is_empty() {
        let metas: Vec<String> = metas.iter().map(|m| format!("@{}", simple_name(m))).collect();
        chain.push_str(" <: ");
        chain.push_str(&metas.join(", "));
    }
    chain
}

/// Default bean name of a class: the first letter lowercased, unless the
/// name starts with two capitals (`URLHandler` stays as is).
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => name.to_string(),
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}
