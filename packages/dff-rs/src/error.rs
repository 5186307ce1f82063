use thiserror::Error;

#[derive(Error, Debug)]
pub enum DffError {
    #[error("Unknown {what}: '{value}'")]
    Config { what: &'static str, value: String },

    #[error("Invalid {param}: {reason}")]
    Validation { param: &'static str, reason: String },

    #[error("Missing capability: {0} support is not compiled into this build")]
    MissingDependency(&'static str),

    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to parse input table: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Numeric computation failed: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, DffError>;
