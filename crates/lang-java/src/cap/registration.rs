use crate::JavaPlugin;
use crate::annotations::{BEAN, REQUEST_MAPPINGS, STEREOTYPES};
use crate::providers::{BeanMethodProvider, RequestMappingProvider, StereotypeProvider};
use beanscope_api::models::{CapabilityTag, Language};
use beanscope_plugin::{BoxError, LanguageCaps, SymbolProvider};
use std::sync::Arc;

/// Java parsing plus the Spring providers, one registration per annotation.
pub fn java_caps() -> std::result::Result<LanguageCaps, BoxError> {
    let plugin = Arc::new(JavaPlugin::new()?);
    let mut caps = LanguageCaps::new(Language::JAVA, plugin.clone(), plugin);

    let mappings: Arc<dyn SymbolProvider> = Arc::new(RequestMappingProvider);
    for fqn in REQUEST_MAPPINGS {
        caps = caps.with_provider(CapabilityTag::from_static(*fqn), mappings.clone());
    }
    let stereotypes: Arc<dyn SymbolProvider> = Arc::new(StereotypeProvider);
    for fqn in STEREOTYPES {
        caps = caps.with_provider(CapabilityTag::from_static(*fqn), stereotypes.clone());
    }
    Ok(caps.with_provider(CapabilityTag::from_static(BEAN), Arc::new(BeanMethodProvider)))
}
