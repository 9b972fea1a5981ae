//! Configuration for a single GENA subscriber.

use std::time::Duration;

use crate::error::{Result, SubscriptionError};

/// Default subscription timeout requested from devices.
pub const DEFAULT_TIMEOUT_SECS: u32 = 600;

/// Default delay before retrying after a failed request.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(5000);

/// Configuration for a [`crate::Subscriber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Event subscription URL, e.g.
    /// `http://192.168.1.100:1400/MediaRenderer/AVTransport/Event`
    pub endpoint: String,

    /// URL the device delivers NOTIFY requests to
    pub callback_url: String,

    /// Timeout requested with every SUBSCRIBE
    /// Default: 600 seconds
    pub timeout_secs: u32,

    /// Delay between a failed request and the next attempt
    /// Default: 5 seconds
    pub retry_interval: Duration,
}

impl SubscriberConfig {
    pub fn new(
        endpoint: impl Into<String>,
        callback_url: impl Into<String>,
        timeout_secs: u32,
        retry_interval_ms: u64,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            callback_url: callback_url.into(),
            timeout_secs,
            retry_interval: Duration::from_millis(retry_interval_ms),
        }
    }

    /// Configuration with the default timeout and retry interval.
    pub fn with_defaults(endpoint: impl Into<String>, callback_url: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            callback_url: callback_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Delay between a successful request and the renewal that follows it.
    ///
    /// Renewal happens at 85% of the requested timeout.
    pub fn renewal_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_secs) * 850)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(SubscriptionError::Configuration(
                "Subscription timeout must be greater than 0".to_string(),
            ));
        }

        if self.retry_interval == Duration::ZERO {
            return Err(SubscriptionError::Configuration(
                "Retry interval must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.endpoint)
            .map_err(|e| SubscriptionError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;
        url::Url::parse(&self.callback_url).map_err(|e| {
            SubscriptionError::Configuration(format!("Invalid callback URL {}: {}", self.callback_url, e))
        })?;

        Ok(())
    }
}
