//! Error handling for sinkbridge

use thiserror::Error;

/// Main error type crossing the bridge boundary.
///
/// Every variant maps to a short machine-readable code via [`BridgeError::code`];
/// the Display impl carries the human-readable message. Raw panics never cross
/// the boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("The fetched entity is not a playable video: {0}")]
    WrongStreamType(String),

    #[error("No {0} stream available")]
    NoStreamAvailable(&'static str),

    #[error("yt-dlp could not be executed: {0}")]
    Permission(String),

    #[error("yt-dlp not found. Please install yt-dlp")]
    ToolNotFound,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl PartialEq for BridgeError {
    /// Variants wrapping `reqwest::Error`/`io::Error` cannot be compared
    /// structurally, so equality is variant identity plus rendered message.
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.to_string() == other.to_string()
    }
}

impl BridgeError {
    /// Short error code delivered alongside the message at the call boundary.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Network(_) => "NETWORK_ERROR",
            BridgeError::Provider(_) => "PROVIDER_ERROR",
            BridgeError::WrongStreamType(_) => "WRONG_STREAM_TYPE",
            BridgeError::NoStreamAvailable(_) => "NO_STREAM_AVAILABLE",
            BridgeError::Permission(_) => "PERMISSION_ERROR",
            BridgeError::ToolNotFound => "TOOL_NOT_FOUND",
            BridgeError::Cancelled => "CANCELLED",
            BridgeError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            BridgeError::Io(_) => "IO_ERROR",
            BridgeError::Serialization(_) => "PROVIDER_ERROR",
            BridgeError::InvalidUrl(_) => "INVALID_URL",
        }
    }

    /// Whether the orchestrator may retry after this error.
    ///
    /// Transport and provider failures can succeed on a later attempt;
    /// a wrong stream type or an empty rendition category cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Network(_)
                | BridgeError::Provider(_)
                | BridgeError::Io(_)
                | BridgeError::Serialization(_)
        )
    }
}
