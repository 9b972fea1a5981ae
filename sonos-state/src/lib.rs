//! # sonos-state
//!
//! Player and zone model for a Sonos household.
//!
//! [`PlayerRegistry`] is fed from two event kinds:
//!
//! - ZoneGroupState snapshots ([`PlayerRegistry::apply_topology`]) create
//!   players, regroup them and attach satellites.
//! - LastChange maps ([`PlayerRegistry::apply_last_change`]) update volume,
//!   mute, output mode and transport state of one player.
//!
//! Both are idempotent, so duplicated or reordered event delivery leaves the
//! registry consistent. Group volume is derived from member volumes in
//! [`volume`]; [`Zone::apply_volume`] writes a group volume change to the
//! members before the devices confirm it.

pub mod channel_map;
mod error;
pub mod last_change;
pub mod model;
pub mod topology;
pub mod volume;

pub use channel_map::{parse_channel_map, satellite_owner, ChannelEntry, ChannelRole};
pub use error::{Result, StateError};
pub use last_change::apply_last_change;
pub use model::{
    GroupId, Player, PlayerId, PlayerState, Satellite, TransportState, VolumeChange, Zone,
};
pub use topology::{PlayerRegistry, TopologyUpdate};
pub use volume::{distribute, group_state, GroupState, MemberVolume, MAX_VOLUME};
