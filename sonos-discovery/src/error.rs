//! Error types for the discovery system.

use std::fmt;

/// Error type for discovery operations.
///
/// Only socket setup can fail loudly; malformed or unrelated SSDP traffic is
/// discarded silently by the scanner.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Socket creation, option or bind failure
    NetworkError(String),
    /// Local network interfaces could not be enumerated
    InterfaceError(String),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DiscoveryError::InterfaceError(msg) => write!(f, "Interface error: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
