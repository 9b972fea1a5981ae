//! Player type
//!
//! A [`Player`] is created once per UUID and shared as `Arc<Player>`; later
//! topology refreshes update it in place.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sonos_parser::TrackMetadata;
use sonos_stream::Subscriber;

use super::{GroupId, PlayerId, TransportState};
use crate::channel_map::ChannelRole;
use crate::volume::MemberVolume;

/// An invisible unit bonded to a visible player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Satellite {
    pub uuid: PlayerId,
    pub role: ChannelRole,
    pub location: String,
}

/// Mutable state of a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub room_name: String,
    /// Device description URL
    pub location: String,
    /// `http://host:port`
    pub base_url: String,
    pub group_id: Option<GroupId>,
    pub coordinator: Option<PlayerId>,
    pub satellites: Vec<Satellite>,
    pub volume: u8,
    pub muted: bool,
    pub output_fixed: bool,
    pub transport_state: TransportState,
    pub current_track_uri: Option<String>,
    pub current_track: Option<TrackMetadata>,
}

/// A visible Sonos player.
pub struct Player {
    uuid: PlayerId,
    state: RwLock<PlayerState>,
    subscriptions: Mutex<Vec<Subscriber>>,
}

impl Player {
    pub fn new(uuid: PlayerId, state: PlayerState) -> Self {
        Self {
            uuid,
            state: RwLock::new(state),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn uuid(&self) -> &PlayerId {
        &self.uuid
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> PlayerState {
        self.state.read().clone()
    }

    pub fn room_name(&self) -> String {
        self.state.read().room_name.clone()
    }

    pub fn base_url(&self) -> String {
        self.state.read().base_url.clone()
    }

    pub fn coordinator(&self) -> Option<PlayerId> {
        self.state.read().coordinator.clone()
    }

    pub fn is_coordinator(&self) -> bool {
        self.state.read().coordinator.as_ref() == Some(&self.uuid)
    }

    pub fn satellites(&self) -> Vec<Satellite> {
        self.state.read().satellites.clone()
    }

    pub fn volume(&self) -> u8 {
        self.state.read().volume
    }

    pub fn muted(&self) -> bool {
        self.state.read().muted
    }

    pub fn transport_state(&self) -> TransportState {
        self.state.read().transport_state
    }

    pub fn current_track(&self) -> Option<TrackMetadata> {
        self.state.read().current_track.clone()
    }

    pub fn member_volume(&self) -> MemberVolume {
        let state = self.state.read();
        MemberVolume {
            volume: state.volume,
            muted: state.muted,
            output_fixed: state.output_fixed,
        }
    }

    /// Change state in place. Returns whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        f(&mut self.state.write())
    }

    /// Take ownership of a subscription for this player.
    pub fn add_subscription(&self, subscriber: Subscriber) {
        self.subscriptions.lock().push(subscriber);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Whether a subscription to `endpoint` is held.
    pub fn has_subscription(&self, endpoint: &str) -> bool {
        self.subscriptions
            .lock()
            .iter()
            .any(|s| s.endpoint() == endpoint)
    }

    /// Release the subscription to `endpoint`, if held.
    pub fn take_subscription(&self, endpoint: &str) -> Option<Subscriber> {
        let mut subscriptions = self.subscriptions.lock();
        let index = subscriptions.iter().position(|s| s.endpoint() == endpoint)?;
        Some(subscriptions.remove(index))
    }

    /// Dispose every subscription this player owns.
    pub async fn dispose_subscriptions(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscriber in &subscriptions {
            subscriber.dispose().await;
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("uuid", &self.uuid)
            .field("state", &*self.state.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(
            PlayerId::new("RINCON_1"),
            PlayerState {
                room_name: "Kitchen".to_string(),
                coordinator: Some(PlayerId::new("RINCON_1")),
                volume: 20,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_update_in_place() {
        let p = player();
        let old = p.update(|s| std::mem::replace(&mut s.volume, 35));
        assert_eq!(old, 20);
        assert_eq!(p.volume(), 35);
        assert_eq!(p.room_name(), "Kitchen");
    }

    #[test]
    fn test_is_coordinator() {
        let p = player();
        assert!(p.is_coordinator());
        p.update(|s| s.coordinator = Some(PlayerId::new("RINCON_2")));
        assert!(!p.is_coordinator());
    }

    #[tokio::test]
    async fn test_dispose_without_subscriptions() {
        let p = player();
        p.dispose_subscriptions().await;
        assert_eq!(p.subscription_count(), 0);
    }
}
