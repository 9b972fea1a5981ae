//! Model types for sonos-state

mod id_types;
mod player;
mod transport;
mod zone;

pub use id_types::{GroupId, PlayerId};
pub use player::{Player, PlayerState, Satellite};
pub use transport::TransportState;
pub use zone::{VolumeChange, Zone};
