//! Configuration for [`crate::SonosSystem`]
//!
//! Defaults match what players expect; `from_env` lets deployments override
//! the listener port, subscription timeout and household without code
//! changes.

use callback_server::ListenerConfig;
use sonos_discovery::ScannerConfig;
use std::time::Duration;

use crate::error::{Result, SdkError};

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Notification listener port selection
    pub listener: ListenerConfig,

    /// SSDP scanner timing and interfaces
    pub scanner: ScannerConfig,

    /// Timeout requested with every SUBSCRIBE
    /// Default: 600 seconds
    pub subscription_timeout_secs: u32,

    /// Delay before retrying a failed subscription
    /// Default: 5 seconds
    pub retry_interval: Duration,

    /// Only bootstrap from players of this household (`X-RINCON-HOUSEHOLD`)
    pub household: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            scanner: ScannerConfig::default(),
            subscription_timeout_secs: sonos_stream::DEFAULT_TIMEOUT_SECS,
            retry_interval: sonos_stream::DEFAULT_RETRY_INTERVAL,
            household: None,
        }
    }
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the environment:
    ///
    /// - `SONOS_LISTENER_PORT`: first callback port to try
    /// - `SONOS_SUBSCRIPTION_TIMEOUT`: subscription timeout in seconds
    /// - `SONOS_HOUSEHOLD`: household id to bootstrap from
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = lookup("SONOS_LISTENER_PORT") {
            config.listener.start_port = port.trim().parse().map_err(|_| {
                SdkError::Config(format!("Invalid SONOS_LISTENER_PORT: {}", port))
            })?;
        }

        if let Some(timeout) = lookup("SONOS_SUBSCRIPTION_TIMEOUT") {
            config.subscription_timeout_secs = timeout.trim().parse().map_err(|_| {
                SdkError::Config(format!("Invalid SONOS_SUBSCRIPTION_TIMEOUT: {}", timeout))
            })?;
        }

        if let Some(household) = lookup("SONOS_HOUSEHOLD") {
            let household = household.trim().to_string();
            if !household.is_empty() {
                config.household = Some(household);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.subscription_timeout_secs == 0 {
            return Err(SdkError::Config(
                "Subscription timeout must be greater than 0".to_string(),
            ));
        }

        if self.retry_interval == Duration::ZERO {
            return Err(SdkError::Config(
                "Retry interval must be greater than 0".to_string(),
            ));
        }

        if self.listener.max_port_attempts == 0 {
            return Err(SdkError::Config(
                "Listener needs at least one port attempt".to_string(),
            ));
        }

        if self.scanner.send_interval == Duration::ZERO
            || self.scanner.rebind_interval == Duration::ZERO
        {
            return Err(SdkError::Config(
                "Scanner intervals must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SystemConfig::default();
        assert_eq!(config.listener.start_port, 3500);
        assert_eq!(config.subscription_timeout_secs, 600);
        assert_eq!(config.retry_interval, Duration::from_millis(5000));
        assert!(config.household.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_overrides() {
        let config = SystemConfig::from_lookup(lookup(&[
            ("SONOS_LISTENER_PORT", "3600"),
            ("SONOS_SUBSCRIPTION_TIMEOUT", "1800"),
            ("SONOS_HOUSEHOLD", "Sonos_abc123"),
        ]))
        .unwrap();

        assert_eq!(config.listener.start_port, 3600);
        assert_eq!(config.subscription_timeout_secs, 1800);
        assert_eq!(config.household.as_deref(), Some("Sonos_abc123"));
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        assert!(matches!(
            SystemConfig::from_lookup(lookup(&[("SONOS_LISTENER_PORT", "port")])),
            Err(SdkError::Config(_))
        ));
        assert!(SystemConfig::from_lookup(lookup(&[("SONOS_SUBSCRIPTION_TIMEOUT", "0")])).is_err());
    }

    #[test]
    fn test_empty_household_is_ignored() {
        let config = SystemConfig::from_lookup(lookup(&[("SONOS_HOUSEHOLD", "  ")])).unwrap();
        assert!(config.household.is_none());
    }
}
