//! # Sonos SDK - live household model for Sonos
//!
//! Discovers a household, keeps event subscriptions to every player alive and
//! maintains the zone graph from the events they push:
//!
//! ```rust,no_run
//! use sonos_sdk::{SonosSystem, SystemConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sonos_sdk::SdkError> {
//!     sonos_sdk::init_logging(sonos_sdk::LoggingMode::Development).ok();
//!
//!     let system = SonosSystem::start(SystemConfig::default()).await?;
//!
//!     system.events().on_last_change(|event| {
//!         println!("{} is at volume {}", event.player.room_name(), event.player.volume());
//!     });
//!     system.events().on_dead(|event| eprintln!("Lost {}", event.endpoint));
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     if let Some(kitchen) = system.get_player("Kitchen") {
//!         println!("Kitchen is {}", kitchen.transport_state());
//!     }
//!     println!("{}", system.snapshot().to_json().unwrap_or_default());
//!
//!     system.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - `sonos-discovery` finds the first player by SSDP
//! - `sonos-stream` holds a self-renewing GENA subscription per event endpoint
//! - `callback-server` receives NOTIFY requests and parses them as they stream in
//! - `sonos-state` turns topology and LastChange events into players and zones
//!
//! Control commands go through [`ActionInvoker`]; [`SonosSystem::set_group_volume`]
//! is built on it.

mod config;
mod error;
pub mod events;
mod logging;
pub mod snapshot;
pub mod soap;
mod system;

pub use config::SystemConfig;
pub use error::{Result, SdkError};
pub use events::{
    DeadEvent, EventHandlers, FavoritesChangeEvent, LastChangeEvent, QueueChangeEvent,
    TopologyEvent,
};
pub use logging::{init_logging, init_logging_from_env, is_initialized, LoggingError, LoggingMode};
pub use snapshot::{HouseholdSnapshot, PlayerSnapshot, ZoneSnapshot};
pub use soap::{ActionInvoker, ActionResponse, HttpActionInvoker, SoapError};
pub use system::{Components, SonosSystem, PLAYER_EVENT_PATHS, TOPOLOGY_EVENT_PATH};

// Re-export the model so callers need no direct dependency on sonos-state
pub use sonos_state::{
    ChannelRole, GroupId, GroupState, Player, PlayerId, PlayerState, Satellite, TransportState,
    Zone,
};
