use thiserror::Error;

#[derive(Debug, Error)]
pub enum JavaParseError {
    #[error("no syntax tree produced for {0}")]
    NoTree(String),

    #[error("{0} has syntax errors and no type declaration")]
    Unrecoverable(String),

    #[error("cannot load the Java grammar: {0}")]
    Language(String),

    #[error("parsed unit for {0} carries no Java file info")]
    MissingFileInfo(String),
}
