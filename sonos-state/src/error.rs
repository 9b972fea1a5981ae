//! Error types for sonos-state

use crate::model::{GroupId, PlayerId};

/// Result type for sonos-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur while reading or changing the player registry
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// No player with this UUID has been seen in any topology
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// No visible player carries this room name
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// The player is not a member of any current zone
    #[error("Player {0} is not in a zone")]
    NotInZone(PlayerId),

    /// Every member of the zone has a fixed-level output
    #[error("Zone {0} has no adjustable volume")]
    FixedVolume(GroupId),
}
