/*!
 * Error types for the polytrans pipeline.
 *
 * Errors from translation backends are always recovered inside the fallback
 * cascade. Input, backend-construction and checkpoint errors are fatal and
 * bubble up to the application controller through `AppError`.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting or quota
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The backend answered, but with nothing usable
    #[error("Backend returned an empty translation")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RequestFailed(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) | Self::AuthenticationError(_) | Self::EmptyResponse => false,
        }
    }
}

/// Errors raised while reading the input collection
#[derive(Error, Debug)]
pub enum InputError {
    /// The input file could not be read
    #[error("Failed to read input file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content is neither a JSON array, JSON lines, nor tagged blocks
    #[error("Input could not be parsed as records: {0}")]
    Unparseable(String),

    /// Tagged-block mode found no block between the given tags
    #[error("No blocks found between '{start}' and '{end}'")]
    NoTaggedBlocks { start: String, end: String },
}

/// Errors raised while persisting or loading checkpoint artifacts
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// A checkpoint artifact could not be written, synced or removed
    #[error("Checkpoint I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The accumulated output could not be serialized
    #[error("Failed to serialize checkpoint: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a checkpoint found at startup is discarded instead of resumed
#[derive(Error, Debug)]
pub enum CheckpointLoadError {
    /// A snapshot exists but the marker that vouches for it does not
    #[error("snapshot {0:?} present without progress marker")]
    OrphanSnapshot(PathBuf),

    /// The input records changed since the checkpoint was written
    #[error("input records changed since the checkpoint was written")]
    Stale,

    /// The marker claims more completed records than the input holds
    #[error("marker claims {completed} completed records but the input has {total}")]
    BeyondInput { completed: usize, total: usize },

    /// The snapshot is behind the marker
    #[error("snapshot holds {snapshot} records, marker expects {marker}")]
    Mismatch { snapshot: usize, marker: usize },

    /// An artifact could not be read
    #[error("cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact is not valid JSON of the expected shape
    #[error("cannot parse {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Input could not be turned into records; nothing was processed
    #[error("Input parse failure: {0}")]
    InputParseFailure(#[from] InputError),

    /// No translation backend could be constructed; nothing was processed
    #[error("Backend initialization failure: {0}")]
    BackendInitFailure(String),

    /// Checkpoint artifacts could not be persisted
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider that escaped the fallback cascade
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
