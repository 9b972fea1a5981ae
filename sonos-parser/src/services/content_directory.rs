//! ContentDirectory `ContainerUpdateIDs` decoding
//!
//! The property is plain text of comma-separated `name,counter` pairs, e.g.
//! `Q:0,12,FV:2,40`. Only the presence of the queue (`Q:0`) and favorites
//! (`FV:2`) containers matters to consumers.

use serde::{Deserialize, Serialize};

/// Which well-known containers a `ContainerUpdateIDs` value mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerUpdates {
    pub queue_changed: bool,
    pub favorites_changed: bool,
}

impl ContainerUpdates {
    pub fn is_empty(&self) -> bool {
        !self.queue_changed && !self.favorites_changed
    }
}

/// Decode a `ContainerUpdateIDs` value. Never fails; unknown containers are ignored.
pub fn parse_container_update_ids(value: &str) -> ContainerUpdates {
    ContainerUpdates {
        queue_changed: value.contains("Q:0"),
        favorites_changed: value.contains("FV:2"),
    }
}
