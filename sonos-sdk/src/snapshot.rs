//! Household snapshot for read-only consumers

use serde::Serialize;
use sonos_state::{GroupId, GroupState, PlayerId, PlayerRegistry, PlayerState};

/// Copy of one zone taken without holding any registry lock afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSnapshot {
    pub id: GroupId,
    pub name: String,
    pub coordinator: PlayerId,
    pub members: Vec<PlayerId>,
    pub group_state: GroupState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub uuid: PlayerId,
    #[serde(flatten)]
    pub state: PlayerState,
}

/// A point-in-time copy of the whole household
#[derive(Debug, Clone, Default, Serialize)]
pub struct HouseholdSnapshot {
    pub zones: Vec<ZoneSnapshot>,
    /// All known players, sorted by uuid
    pub players: Vec<PlayerSnapshot>,
}

impl HouseholdSnapshot {
    pub fn capture(registry: &PlayerRegistry) -> Self {
        let zones = registry
            .zones()
            .iter()
            .map(|zone| ZoneSnapshot {
                id: zone.id.clone(),
                name: zone.name(),
                coordinator: zone.coordinator_id().clone(),
                members: zone.members.iter().map(|m| m.uuid().clone()).collect(),
                group_state: zone.group_state(),
            })
            .collect();

        let mut players: Vec<PlayerSnapshot> = registry
            .players()
            .iter()
            .map(|player| PlayerSnapshot {
                uuid: player.uuid().clone(),
                state: player.snapshot(),
            })
            .collect();
        players.sort_by(|a, b| a.uuid.cmp(&b.uuid));

        Self { zones, players }
    }

    pub fn player(&self, uuid: &PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| &p.uuid == uuid)
    }

    pub fn zone_of(&self, uuid: &PlayerId) -> Option<&ZoneSnapshot> {
        self.zones.iter().find(|z| z.members.contains(uuid))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
