pub mod matcher;
pub mod parse;
pub mod symbols;

pub use matcher::*;
pub use parse::*;
pub use symbols::*;
