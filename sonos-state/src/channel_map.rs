//! Channel map decoding
//!
//! Bonded units describe their roles with a channel map such as
//! `RINCON_A:LF,RF;RINCON_SUB:SW,SW` (home theater with subwoofer) or
//! `RINCON_L:LF,LF;RINCON_R:RF,RF` (stereo pair).

use serde::{Deserialize, Serialize};

use crate::model::PlayerId;

/// Role of one unit within a bonded set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelRole {
    /// `LF,RF`: full-range unit, home-theater primary
    Primary,
    /// `LF,LF`: left of a stereo pair
    Left,
    /// `RF,RF`: right of a stereo pair
    Right,
    /// `SW,SW`
    Subwoofer,
    /// `LR,LR`
    SurroundLeft,
    /// `RR,RR`
    SurroundRight,
    Other(String),
}

impl ChannelRole {
    pub fn parse(channels: &str) -> Self {
        match channels.trim() {
            "LF,RF" => ChannelRole::Primary,
            "LF,LF" => ChannelRole::Left,
            "RF,RF" => ChannelRole::Right,
            "SW,SW" => ChannelRole::Subwoofer,
            "LR,LR" => ChannelRole::SurroundLeft,
            "RR,RR" => ChannelRole::SurroundRight,
            other => ChannelRole::Other(other.to_string()),
        }
    }

    /// Whether a unit in this role can be attached to another player.
    pub fn is_satellite(&self) -> bool {
        !matches!(self, ChannelRole::Primary | ChannelRole::Other(_))
    }
}

/// One `uuid:CH,CH` entry of a channel map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub uuid: PlayerId,
    pub role: ChannelRole,
}

/// Parse a channel map into its entries, skipping malformed ones.
pub fn parse_channel_map(map: &str) -> Vec<ChannelEntry> {
    map.split(';')
        .filter_map(|entry| {
            let (uuid, channels) = entry.trim().split_once(':')?;
            if uuid.is_empty() || channels.is_empty() {
                return None;
            }
            Some(ChannelEntry {
                uuid: PlayerId::new(uuid),
                role: ChannelRole::parse(channels),
            })
        })
        .collect()
}

/// Find the player an invisible unit belongs to.
///
/// The unit must appear in the map with a satellite role, and the owner is
/// the first other entry accepted by `is_visible` whose role differs from
/// the unit's own.
pub fn satellite_owner(
    satellite: &PlayerId,
    map: &str,
    is_visible: impl Fn(&PlayerId) -> bool,
) -> Option<(PlayerId, ChannelRole)> {
    let entries = parse_channel_map(map);
    let own_role = entries
        .iter()
        .find(|e| &e.uuid == satellite)
        .map(|e| e.role.clone())?;

    if !own_role.is_satellite() {
        return None;
    }

    entries
        .into_iter()
        .find(|e| &e.uuid != satellite && e.role != own_role && is_visible(&e.uuid))
        .map(|e| (e.uuid, own_role))
}
