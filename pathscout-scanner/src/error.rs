use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url}: timed out waiting for a response")]
    Timeout { url: String },

    #[error("{url}: HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("{url}: response has no usable content-type header")]
    MissingContentType { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A classified literal had no reportable ancestor. This points at a gap in
    /// the reportable node set, not at bad input.
    #[error("No reportable context for literal {literal} at byte {offset}")]
    MissingContext { offset: usize, literal: String },

    #[error("Parser error: {0}")]
    ParserError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// True when the source text simply is not valid JavaScript.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ScanError::Syntax { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
