mod clear;
mod index;
mod watch;

use beanscope_core::IndexerConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "beanscope",
    version,
    about = "Incremental index of Spring beans and request mappings",
    long_about = "Beanscope scans Java projects for Spring stereotypes, @Bean methods and request \
                  mappings, keeps the resulting symbols up to date as files change, and answers \
                  substring queries against them."
)]
pub struct Cli {
    /// JSON file with indexer settings. Unset fields keep their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also log to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index every project below a directory and print the symbols
    Index {
        /// Workspace root to scan for pom.xml / build.gradle projects
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Only print symbols whose name contains this text
        #[arg(long, short)]
        query: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Index a directory, then run one search against it
    #[command(
        long_about = "Runs a search after indexing. `locationPrefix:<uri-prefix>?<text>` restricts \
                      results to documents below a URI prefix; a leading `*` lifts the result limit."
    )]
    Query {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "SEARCH")]
        search: String,
        #[arg(long)]
        json: bool,
    },
    /// Index a directory and keep the index current until Ctrl+C
    Watch {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Delete the on-disk symbol cache
    ClearCache,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<IndexerConfig> {
    let mut config = match path {
        Some(path) => IndexerConfig::from_file(path)?,
        None => IndexerConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = beanscope_runtime::init_logging("cli", cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Index { path, query, json } => rt.block_on(index::run(path, config, index::Filter::Name(query), json)),
        Commands::Query { path, search, json } => rt.block_on(index::run(path, config, index::Filter::Search(search), json)),
        Commands::Watch { path } => rt.block_on(watch::run(path, config)),
        Commands::ClearCache => clear::run(&config),
    }
}
