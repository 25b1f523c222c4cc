//! Transport error types

use thiserror::Error;

/// Errors that can occur while dispatching a state to one bulb
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Bulb did not answer in time")]
    Timeout,

    #[error("Bulb unreachable: {0}")]
    Unreachable(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    BadResponse(String),

    #[error("Bulb rejected command: {0}")]
    Rejected(String),

    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether the failure means the bulb could not be contacted at all
    /// (as opposed to a bulb that answered with something unexpected).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unreachable(_))
    }
}
