use beanscope_api::models::Symbol;
use beanscope_api::uri::uri_to_path;
use beanscope_core::IndexerConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tabled::{Table, Tabled};
use tracing::info;

pub enum Filter {
    /// Substring of the symbol name; `None` keeps everything.
    Name(Option<String>),
    /// Full search syntax.
    Search(String),
}

#[derive(Tabled, Serialize)]
struct SymbolRow {
    #[tabled(rename = "Symbol")]
    name: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Col")]
    column: usize,
}

impl From<Symbol> for SymbolRow {
    fn from(symbol: Symbol) -> Self {
        let file = uri_to_path(symbol.uri())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| symbol.uri().to_string());
        // editors count from one
        Self {
            line: symbol.range().start_line + 1,
            column: symbol.range().start_col + 1,
            file,
            name: symbol.name,
        }
    }
}

pub async fn run(path: PathBuf, config: IndexerConfig, filter: Filter, json: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    let engine = beanscope_runtime::build_default_engine(path.clone(), config)?;

    info!("Indexing {}...", path.display());
    engine.index_workspace().await;
    info!(
        "Indexed {} documents in {} projects ({:?})",
        engine.index().document_count(),
        engine.projects().len(),
        started.elapsed()
    );

    let symbols = match &filter {
        Filter::Name(query) => engine.index().get_all_symbols(query.as_deref().unwrap_or("")),
        Filter::Search(search) => engine.index().search(search),
    };
    let rows: Vec<SymbolRow> = symbols.into_iter().map(SymbolRow::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No symbols found.");
    } else {
        let count = rows.len();
        println!("{}", Table::new(rows));
        println!("{count} symbols");
    }
    Ok(())
}
