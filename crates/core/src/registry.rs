use beanscope_api::models::{CapabilityTag, Language, Symbol};
use beanscope_plugin::{LanguageCaps, ParsedUnit, SymbolProvider};
use std::sync::Arc;

struct Registration {
    language: Language,
    tag: CapabilityTag,
    provider: Arc<dyn SymbolProvider>,
}

/// Capability tag to symbol provider table, fixed at construction.
#[derive(Default)]
pub struct SymbolExtractionRegistry {
    registrations: Vec<Registration>,
}

impl SymbolExtractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_caps(caps: &[LanguageCaps]) -> Self {
        let mut registry = Self::new();
        for cap in caps {
            for reg in &cap.providers {
                registry.register(cap.language.clone(), reg.tag.clone(), reg.provider.clone());
            }
        }
        registry
    }

    pub fn register(&mut self, language: Language, tag: CapabilityTag, provider: Arc<dyn SymbolProvider>) {
        self.registrations.push(Registration { language, tag, provider });
    }

    pub fn tags(&self) -> Vec<&CapabilityTag> {
        self.registrations.iter().map(|r| &r.tag).collect()
    }

    /// Symbols of `unit` from every provider registered for its language,
    /// each stamped with the producing capability. A failing provider is
    /// logged and contributes nothing.
    pub fn extract(&self, unit: &ParsedUnit) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for reg in self.registrations.iter().filter(|r| &r.language == unit.language()) {
            match reg.provider.extract(unit, &reg.tag) {
                Ok(drafts) => symbols.extend(
                    drafts
                        .into_iter()
                        .map(|d| Symbol::new(d.name, unit.uri(), d.range, reg.tag.clone())),
                ),
                Err(err) => {
                    tracing::warn!("Provider {} failed on {}: {}", reg.tag, unit.uri(), err);
                }
            }
        }
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanscope_api::models::Range;
    use beanscope_plugin::{BoxError, SymbolDraft};

    struct Fixed(&'static str);

    impl SymbolProvider for Fixed {
        fn extract(&self, _unit: &ParsedUnit, _tag: &CapabilityTag) -> Result<Vec<SymbolDraft>, BoxError> {
            Ok(vec![SymbolDraft::new(self.0, Range::new(0, 0, 0, 1))])
        }
    }

    struct Failing;

    impl SymbolProvider for Failing {
        fn extract(&self, _unit: &ParsedUnit, _tag: &CapabilityTag) -> Result<Vec<SymbolDraft>, BoxError> {
            Err("boom".into())
        }
    }

    fn unit(language: Language) -> ParsedUnit {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_java::LANGUAGE.into()).unwrap();
        let tree = parser.parse("class A {}", None).unwrap();
        ParsedUnit::new("file:///p/A.java", 0, language, Arc::from("class A {}"), tree)
    }

    #[test]
    fn concatenates_and_tags() {
        let mut registry = SymbolExtractionRegistry::new();
        registry.register(Language::JAVA, CapabilityTag::from_static("a.One"), Arc::new(Fixed("@one")));
        registry.register(Language::JAVA, CapabilityTag::from_static("a.Broken"), Arc::new(Failing));
        registry.register(Language::JAVA, CapabilityTag::from_static("a.Two"), Arc::new(Fixed("@two")));

        let symbols = registry.extract(&unit(Language::JAVA));
        let names: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.capability.as_str())).collect();
        assert_eq!(names, vec![("@one", "a.One"), ("@two", "a.Two")]);
        assert!(symbols.iter().all(|s| s.uri() == "file:///p/A.java"));
    }

    #[test]
    fn providers_only_see_their_language() {
        let mut registry = SymbolExtractionRegistry::new();
        registry.register(Language::XML, CapabilityTag::from_static("x.Bean"), Arc::new(Fixed("@xml")));
        assert!(registry.extract(&unit(Language::JAVA)).is_empty());
    }
}
