pub mod parse_cache;
pub mod project_cache;
pub mod symbol_cache;

pub use parse_cache::ParseCache;
pub use project_cache::{ProjectCache, ProjectCacheOptions, ProjectEvent};
pub use symbol_cache::{CachedDocument, SymbolCache, SymbolCacheOnDisk, SymbolCacheStats, SymbolCacheVoid};
