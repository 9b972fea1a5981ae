//! Transport state as reported by AVTransport

use serde::{Deserialize, Serialize};
use std::fmt;

/// `TransportState` of a player's AVTransport service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportState {
    Playing,
    PausedPlayback,
    #[default]
    Stopped,
    Transitioning,
    NoMediaPresent,
}

impl TransportState {
    /// Parse a `TransportState` value. Unrecognized values read as stopped.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" | "PAUSED" => TransportState::PausedPlayback,
            "TRANSITIONING" => TransportState::Transitioning,
            "NO_MEDIA_PRESENT" => TransportState::NoMediaPresent,
            _ => TransportState::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::Playing => "PLAYING",
            TransportState::PausedPlayback => "PAUSED_PLAYBACK",
            TransportState::Stopped => "STOPPED",
            TransportState::Transitioning => "TRANSITIONING",
            TransportState::NoMediaPresent => "NO_MEDIA_PRESENT",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Transitioning)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
