//! Error types for the radiko client

use std::fmt;

/// Result type alias for radiko operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the two-step authorization handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// `auth1`: partial token and key metadata
    Stage1,
    /// `auth2`: partial key exchange
    Stage2,
}

impl AuthStage {
    /// Stage number as used in logs and error messages (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            AuthStage::Stage1 => 1,
            AuthStage::Stage2 => 2,
        }
    }
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.number())
    }
}

/// Error reported by a [`RequestContext`](crate::context::RequestContext)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The context was cancelled
    #[error("context canceled")]
    Canceled,

    /// The context deadline has passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors that can occur when using the radiko client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid client configuration (missing transport, bad config file, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No request context was supplied
    #[error("Invalid context: a request context is required")]
    InvalidContext,

    /// Transport failure, passed through unmodified
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request context was cancelled or its deadline expired
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Non-success status during the authorization handshake
    #[error("Authorization failed at {stage}: HTTP status {status}")]
    Auth { stage: AuthStage, status: u16 },

    /// Malformed response where structured data was expected
    #[error("Decode error: {0}")]
    Decode(String),

    /// Non-success status returned by an API endpoint
    #[error("API returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// No program starts at the requested time
    #[error("No program of {station_id} starts at {start}")]
    ProgramNotFound { station_id: String, start: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Header name or value rejected by the HTTP layer
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// YAML configuration parsing failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether the error comes from the authorization handshake
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    /// Whether the error is the request context's own cancellation/deadline error
    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Context(_))
    }
}
