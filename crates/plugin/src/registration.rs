use crate::cap::{FileMatcherCap, LanguageParseCap, SymbolProvider};
use beanscope_api::models::{CapabilityTag, Language};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProviderRegistration {
    pub tag: CapabilityTag,
    pub provider: Arc<dyn SymbolProvider>,
}

#[derive(Clone)]
pub struct LanguageCaps {
    pub language: Language,
    pub matcher: Arc<dyn FileMatcherCap>,
    pub parser: Arc<dyn LanguageParseCap>,
    pub providers: Vec<ProviderRegistration>,
}

impl LanguageCaps {
    pub fn new(
        language: Language,
        matcher: Arc<dyn FileMatcherCap>,
        parser: Arc<dyn LanguageParseCap>,
    ) -> Self {
        Self {
            language,
            matcher,
            parser,
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, tag: CapabilityTag, provider: Arc<dyn SymbolProvider>) -> Self {
        self.providers.push(ProviderRegistration { tag, provider });
        self
    }
}
