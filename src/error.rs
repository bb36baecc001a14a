//! Error types for the GraphQL HTTP handler

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the handler
///
/// None of these reach the client directly. Decoding failures are folded into
/// an empty request by the normalizer so the engine can report them, and the
/// remaining variants surface from the builder or the demo server.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid handler configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// GraphQL schema errors
    #[error("GraphQL schema error: {0}")]
    Schema(String),

    /// Request body could not be read
    #[error("Body read error: {0}")]
    Body(#[from] axum::Error),

    /// Multipart decoding errors, including the size ceiling
    #[error("Multipart error: {0}")]
    Multipart(#[from] multer::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A `map` path could not be applied to the operations document
    #[error("Upload injection error: {0}")]
    Inject(#[from] InjectError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error code, used as a structured log field
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Schema(_) => "SCHEMA_ERROR",
            Error::Body(_) => "BODY_READ_ERROR",
            Error::Multipart(_) => "MULTIPART_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Inject(_) => "UPLOAD_INJECTION_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

/// Reasons a single `map` path fails to resolve against the request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// The path had no segments to walk or assign
    #[error("empty path")]
    EmptyPath,

    /// Only `variables` may be selected at the top of the request
    #[error("unknown top-level field `{0}`")]
    UnknownRootField(String),

    /// An array segment was not a non-negative integer
    #[error("`{0}` is not an array index")]
    InvalidIndex(String),

    /// An array index past the end of the array
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Tried to step into or assign through a scalar or missing node
    #[error("cannot resolve `{segment}` through a {kind} node")]
    NotTraversable { segment: String, kind: &'static str },
}
