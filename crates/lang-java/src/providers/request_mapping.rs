use super::file_info;
use crate::annotations::{REQUEST_MAPPING, implied_method};
use crate::model::{AnnotationTarget, AnnotationUse, AnnotationValue, JavaFileInfo};
use beanscope_api::models::CapabilityTag;
use beanscope_plugin::{BoxError, ParsedUnit, SymbolDraft, SymbolProvider};

const PATH_KEYS: &[&str] = &["value", "path"];

/// One symbol per mapped route of an annotated handler method, named
/// `@/route -- METHOD`.
#[derive(Debug, Default)]
pub struct RequestMappingProvider;

impl SymbolProvider for RequestMappingProvider {
    fn extract(&self, unit: &ParsedUnit, tag: &CapabilityTag) -> Result<Vec<SymbolDraft>, BoxError> {
        let info = file_info(unit)?;
        let fqn = tag.as_str();
        let mut symbols = Vec::new();

        for mapping in info.uses_of(fqn) {
            let AnnotationTarget::Method { owner, .. } = &mapping.target else {
                continue;
            };
            let class_mapping = owner.and_then(|id| class_level_mapping(info, id));

            let paths = mapping_paths(mapping);
            let parents = class_mapping
                .map(mapping_paths)
                .unwrap_or_else(|| vec![String::new()]);
            let methods = match implied_method(fqn) {
                Some(method) => vec![method.to_string()],
                None => inherited_values(mapping, class_mapping, "method"),
            };
            let produces = inherited_values(mapping, class_mapping, "produces");
            let consumes = inherited_values(mapping, class_mapping, "consumes");

            for parent in &parents {
                for path in &paths {
                    let route = combine_path(parent, path);
                    symbols.push(SymbolDraft::new(
                        route_label(&route, &methods, &produces, &consumes),
                        mapping.range,
                    ));
                }
            }
        }
        Ok(symbols)
    }
}

fn class_level_mapping(info: &JavaFileInfo, type_id: usize) -> Option<&AnnotationUse> {
    info.annotations_on_type(type_id)
        .find(|a| info.resolves_to(&a.name, REQUEST_MAPPING))
}

fn mapping_paths(annotation: &AnnotationUse) -> Vec<String> {
    match annotation.texts(PATH_KEYS) {
        Some(texts) => texts.into_iter().map(str::to_string).collect(),
        None => vec![String::new()],
    }
}

/// Values of `key` on the method annotation, falling back to the class one.
fn inherited_values(mapping: &AnnotationUse, class_mapping: Option<&AnnotationUse>, key: &str) -> Vec<String> {
    mapping
        .attribute(key)
        .or_else(|| class_mapping.and_then(|c| c.attribute(key)))
        .map(|values| values.iter().map(|v| AnnotationValue::simple(v).to_string()).collect())
        .unwrap_or_default()
}

/// Join a class-level and a method-level path into a route with a leading
/// slash. A trailing slash on the method path is kept.
pub fn combine_path(parent: &str, path: &str) -> String {
    let separator = if !parent.ends_with('/') && !path.starts_with('/') && !path.is_empty() {
        "/"
    } else {
        ""
    };
    let joined = format!("{parent}{separator}{path}");
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

fn route_label(route: &str, methods: &[String], produces: &[String], consumes: &[String]) -> String {
    let mut label = format!("@{route}");
    if !methods.is_empty() {
        label.push_str(" -- ");
        label.push_str(&methods.join(" || "));
    }
    if !produces.is_empty() {
        label.push_str(" - Content-Type: ");
        label.push_str(&produces.join(" || "));
    }
    if !consumes.is_empty() {
        label.push_str(" - Accept: ");
        label.push_str(&consumes.join(" || "));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_joined_with_a_single_slash() {
        assert_eq!(combine_path("", "mapping1"), "/mapping1");
        assert_eq!(combine_path("", ""), "/");
        assert_eq!(combine_path("classlevel", "mapping-subpackage"), "/classlevel/mapping-subpackage");
        assert_eq!(combine_path("/foo-root-mapping", "/embedded"), "/foo-root-mapping/embedded");
        assert_eq!(combine_path("/person", "/"), "/person/");
        assert_eq!(combine_path("/person/", "{id}"), "/person/{id}");
        assert_eq!(combine_path("/root", ""), "/root");
    }

    #[test]
    fn labels_list_methods_and_media_types() {
        assert_eq!(route_label("/hello", &["GET".into()], &[], &[]), "@/hello -- GET");
        assert_eq!(
            route_label(
                "/a",
                &["GET".into(), "POST".into()],
                &["application/json".into()],
                &["text/plain".into()]
            ),
            "@/a -- GET || POST - Content-Type: application/json - Accept: text/plain"
        );
        assert_eq!(route_label("/plain", &[], &[], &[]), "@/plain");
    }
}
