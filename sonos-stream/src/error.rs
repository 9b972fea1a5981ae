//! Error types for the sonos-stream crate.

/// Errors from GENA subscription requests.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// The request could not be sent or no response arrived in time
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The device answered with a non-success status
    #[error("{method} rejected with HTTP {status}")]
    Rejected {
        /// GENA method that was rejected
        method: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// A SUBSCRIBE response did not carry a `SID` header
    #[error("Missing SID header in SUBSCRIBE response")]
    MissingSid,

    /// The endpoint URL could not be parsed
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience type alias for Results using SubscriptionError.
pub type Result<T> = std::result::Result<T, SubscriptionError>;
