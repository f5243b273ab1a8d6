use beanscope_core::IndexerConfig;
use beanscope_core::cache::SymbolCache;
use tracing::info;

pub fn run(config: &IndexerConfig) -> anyhow::Result<()> {
    let cache = beanscope_runtime::symbol_cache(config);
    let stats = cache.stats();
    info!("Clearing symbol cache at {}", config.symbol_cache_location().display());
    cache.clear()?;
    println!(
        "Removed {} cached projects ({} documents, {} bytes).",
        stats.projects, stats.documents, stats.size_bytes
    );
    Ok(())
}
