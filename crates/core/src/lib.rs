pub mod cache;
pub mod config;
pub mod documents;
pub mod driver;
pub mod engine;
pub mod error;
pub mod event;
pub mod index;
pub mod logging;
pub mod project;
pub mod registry;
pub mod watch;

pub use config::IndexerConfig;
pub use engine::{BeanscopeEngine, BeanscopeEngineBuilder};
pub use error::{BeanscopeError, Result};
pub use index::{ScanSummary, SymbolIndex};
