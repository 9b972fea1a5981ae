//! Sonos device discovery library
//!
//! This crate continuously probes the local network for Sonos ZonePlayers
//! using SSDP (Simple Service Discovery Protocol) and reports every answer
//! as a [`DiscoveryResult`].
//!
//! # Quick Start
//!
//! ```no_run
//! use sonos_discovery::{Scanner, ScannerConfig};
//! use tokio::sync::mpsc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut scanner = Scanner::start(ScannerConfig::default(), tx);
//!
//! if let Some(found) = rx.recv().await {
//!     println!("Found a player at {} ({})", found.location, found.ip);
//! }
//! scanner.stop();
//! # }
//! ```
//!
//! The scanner sends an `M-SEARCH` every second and rebinds to the next local
//! IPv4 interface every five seconds, so hosts with several network
//! interfaces eventually probe from each of them. Responses are not
//! deduplicated; consumers decide what to do with repeats.

mod error;
mod interfaces;
mod scanner;
mod ssdp;

pub use error::{DiscoveryError, Result};
pub use interfaces::local_ipv4_interfaces;
pub use scanner::{MulticastBinder, ProbeSocket, Scanner, ScannerConfig, SocketBinder};
pub use ssdp::{build_msearch, parse_ssdp_response, MULTICAST_ADDR, ZONE_PLAYER_SEARCH_TARGET};

use std::net::IpAddr;

/// A single ZonePlayer answer to an `M-SEARCH` probe.
///
/// Produced once per received response. The same device typically shows up
/// many times while the scanner runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// Household identifier from `X-RINCON-HOUSEHOLD`, when present
    pub household: Option<String>,
    /// Device description URL from the `LOCATION` header
    pub location: String,
    /// Source address of the response datagram
    pub ip: IpAddr,
}

impl DiscoveryResult {
    /// Base URL of the device (`http://host:port`), derived from `location`.
    pub fn base_url(&self) -> Option<String> {
        base_url_from_location(&self.location)
    }
}

/// Strip the path from a device description URL.
///
/// `http://192.168.1.100:1400/xml/device_description.xml` becomes
/// `http://192.168.1.100:1400`.
pub fn base_url_from_location(location: &str) -> Option<String> {
    let (scheme, rest) = location.split_once("://")?;
    let authority = rest.split('/').next().filter(|a| !a.is_empty())?;
    Some(format!("{}://{}", scheme, authority))
}
