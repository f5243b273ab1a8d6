use beanscope_core::cache::{SymbolCache, SymbolCacheOnDisk};
use beanscope_core::{BeanscopeEngine, IndexerConfig, Result};
use beanscope_plugin::LanguageCaps;
use std::path::PathBuf;

/// Language capabilities shipped with Beanscope. A language whose queries
/// fail to load is logged and skipped.
pub fn default_language_caps() -> Vec<LanguageCaps> {
    let mut caps = Vec::new();
    match beanscope_java::java_caps() {
        Ok(java) => caps.push(java),
        Err(e) => tracing::error!("Failed to load Java support: {}", e),
    }
    caps
}

/// Builds an engine for `root` with every bundled language registered.
/// Must be called inside a tokio runtime.
pub fn build_default_engine(root: PathBuf, config: IndexerConfig) -> Result<BeanscopeEngine> {
    default_language_caps()
        .into_iter()
        .fold(BeanscopeEngine::builder(root).with_config(config), |builder, caps| {
            builder.with_language_caps(caps)
        })
        .build()
}

/// Initializes logging for a component. Keep the guard alive for the
/// lifetime of the process so buffered lines reach the log file.
pub fn init_logging(component: &str, to_stderr: bool) -> tracing_appender::non_blocking::WorkerGuard {
    beanscope_core::logging::init_logging(component, to_stderr)
}

/// The on-disk symbol cache at the location `config` points to.
pub fn symbol_cache(config: &IndexerConfig) -> SymbolCacheOnDisk {
    SymbolCacheOnDisk::new(config.symbol_cache_location())
}

/// Removes every cached symbol file.
pub fn clear_symbol_cache(config: &IndexerConfig) -> Result<()> {
    symbol_cache(config).clear()
}
