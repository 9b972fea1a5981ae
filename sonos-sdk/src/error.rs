use std::net::IpAddr;
use thiserror::Error;

use crate::soap::SoapError;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] sonos_discovery::DiscoveryError),

    #[error("Notification listener error: {0}")]
    Listener(#[from] callback_server::ListenerError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] sonos_stream::SubscriptionError),

    #[error("State error: {0}")]
    State(#[from] sonos_state::StateError),

    #[error("SOAP error: {0}")]
    Soap(#[from] SoapError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No route to device at {0}")]
    NoRoute(IpAddr),

    #[error("Invalid device URL: {0}")]
    InvalidDeviceUrl(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;
