pub mod document;
pub mod language;
pub mod project;
pub mod symbol;

pub use document::*;
pub use language::*;
pub use project::*;
pub use symbol::*;
