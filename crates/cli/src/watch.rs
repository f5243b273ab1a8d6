use beanscope_core::IndexerConfig;
use std::path::PathBuf;
use tracing::info;

pub async fn run(path: PathBuf, config: IndexerConfig) -> anyhow::Result<()> {
    let engine = beanscope_runtime::build_default_engine(path.clone(), config)?;

    info!("Initializing: indexing {}...", path.display());
    engine.index_workspace().await;
    info!(
        "Initial indexing complete: {} documents",
        engine.index().document_count()
    );

    let watcher = engine.watch()?;
    println!(
        "Watching {} ({} symbols). Press Ctrl+C to stop.",
        path.display(),
        engine.index().get_symbols_matching(|_| true).len()
    );

    tokio::signal::ctrl_c().await?;
    watcher.abort();
    engine.wait_idle().await;
    info!("Watcher stopped.");
    Ok(())
}
