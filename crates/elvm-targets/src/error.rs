#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("failed to parse IR text at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
