//! Topology synchronization
//!
//! [`PlayerRegistry`] turns ZoneGroupState snapshots into players and zones.
//! Players are keyed by UUID and never recreated: a refresh updates room
//! name, location, group and coordinator of the existing `Arc<Player>`.
//! Invisible members are not players; when their channel map ties them to a
//! visible player they are recorded as that player's satellites.

use parking_lot::RwLock;
use sonos_parser::{PropertyMap, ZoneGroup};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::channel_map::satellite_owner;
use crate::error::{Result, StateError};
use crate::last_change::apply_last_change;
use crate::model::{GroupId, Player, PlayerId, PlayerState, Satellite, Zone};

/// Outcome of applying one topology snapshot
#[derive(Debug, Clone, Default)]
pub struct TopologyUpdate {
    /// Players seen for the first time
    pub added: Vec<Arc<Player>>,
    /// Zones after the update
    pub zones: Vec<Zone>,
}

/// All known players and the current zones.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: RwLock<HashMap<PlayerId, Arc<Player>>>,
    zones: RwLock<Vec<Zone>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ZoneGroupState snapshot.
    ///
    /// Applying the same snapshot again creates nothing and leaves every
    /// player as it was. Known players missing from the snapshot stay in the
    /// registry but leave their group: each becomes its own coordinator with
    /// no group id and no satellites.
    pub fn apply_topology(&self, groups: &[ZoneGroup]) -> TopologyUpdate {
        let visible: HashSet<PlayerId> = groups
            .iter()
            .flat_map(|g| g.visible_members())
            .map(|m| PlayerId::new(&m.uuid))
            .collect();

        let mut satellites = collect_satellites(groups, &visible);
        let mut added = Vec::new();
        let mut zones = Vec::with_capacity(groups.len());

        let mut players = self.players.write();
        for group in groups {
            let members: Vec<_> = group.visible_members().collect();
            let Some(first) = members.first() else {
                tracing::debug!("Skipping zone group {} without visible members", group.id);
                continue;
            };

            let declared = PlayerId::new(&group.coordinator);
            let coordinator = if members.iter().any(|m| PlayerId::new(&m.uuid) == declared) {
                declared
            } else {
                tracing::debug!(
                    "Coordinator {} of {} is not a visible member, using {}",
                    declared,
                    group.id,
                    first.uuid
                );
                PlayerId::new(&first.uuid)
            };
            let group_id = GroupId::new(&group.id);

            let mut zone_members = Vec::with_capacity(members.len());
            for member in members {
                let uuid = PlayerId::new(&member.uuid);
                let member_satellites = satellites.remove(&uuid).unwrap_or_default();
                let base_url = member.base_url().unwrap_or_default();

                let player = match players.get(&uuid) {
                    Some(existing) => Arc::clone(existing),
                    None => {
                        tracing::info!("New player {} ({})", member.room_name, uuid);
                        let player = Arc::new(Player::new(uuid.clone(), PlayerState::default()));
                        players.insert(uuid.clone(), Arc::clone(&player));
                        added.push(Arc::clone(&player));
                        player
                    }
                };

                player.update(|state| {
                    state.room_name = member.room_name.clone();
                    state.location = member.location.clone();
                    state.base_url = base_url;
                    state.group_id = Some(group_id.clone());
                    state.coordinator = Some(coordinator.clone());
                    state.satellites = member_satellites;
                });
                zone_members.push(player);
            }

            let coordinator_player = zone_members
                .iter()
                .find(|p| p.uuid() == &coordinator)
                .map(Arc::clone);
            if let Some(coordinator) = coordinator_player {
                zones.push(Zone {
                    id: group_id,
                    coordinator,
                    members: zone_members,
                });
            }
        }

        for (uuid, player) in players.iter().filter(|(uuid, _)| !visible.contains(*uuid)) {
            let changed = player.update(|state| {
                let changed = state.group_id.is_some()
                    || state.coordinator.as_ref() != Some(uuid)
                    || !state.satellites.is_empty();
                state.group_id = None;
                state.coordinator = Some(uuid.clone());
                state.satellites.clear();
                changed
            });
            if changed {
                tracing::debug!("Player {} left the topology, now ungrouped", uuid);
            }
        }
        drop(players);

        *self.zones.write() = zones.clone();
        tracing::debug!("Topology applied: {} zones, {} new players", zones.len(), added.len());

        TopologyUpdate { added, zones }
    }

    /// Apply a LastChange map to the player with this UUID.
    ///
    /// Returns whether the player's state changed.
    pub fn apply_last_change(&self, uuid: &PlayerId, properties: &PropertyMap) -> Result<bool> {
        let player = self
            .player(uuid)
            .ok_or_else(|| StateError::PlayerNotFound(uuid.clone()))?;
        Ok(player.update(|state| apply_last_change(state, properties)))
    }

    pub fn player(&self, uuid: &PlayerId) -> Option<Arc<Player>> {
        self.players.read().get(uuid).map(Arc::clone)
    }

    /// Visible player in a current zone whose room name matches,
    /// ignoring case.
    pub fn player_by_room(&self, room_name: &str) -> Option<Arc<Player>> {
        self.zones
            .read()
            .iter()
            .flat_map(|z| z.members.iter())
            .find(|p| p.room_name().eq_ignore_ascii_case(room_name))
            .map(Arc::clone)
    }

    /// Every player seen so far, including ones no longer in a zone.
    /// Those report themselves as coordinator with no group.
    pub fn players(&self) -> Vec<Arc<Player>> {
        self.players.read().values().map(Arc::clone).collect()
    }

    /// Snapshot of the current zones.
    pub fn zones(&self) -> Vec<Zone> {
        self.zones.read().clone()
    }

    /// Zone containing the player.
    pub fn zone_of(&self, uuid: &PlayerId) -> Result<Zone> {
        self.zones
            .read()
            .iter()
            .find(|z| z.contains(uuid))
            .cloned()
            .ok_or_else(|| StateError::NotInZone(uuid.clone()))
    }

    /// Zone containing the visible player with this room name.
    pub fn zone_of_room(&self, room_name: &str) -> Result<Zone> {
        let player = self
            .player_by_room(room_name)
            .ok_or_else(|| StateError::RoomNotFound(room_name.to_string()))?;
        self.zone_of(player.uuid())
    }
}

/// Satellites per owning player for one snapshot.
fn collect_satellites(
    groups: &[ZoneGroup],
    visible: &HashSet<PlayerId>,
) -> HashMap<PlayerId, Vec<Satellite>> {
    let mut satellites: HashMap<PlayerId, Vec<Satellite>> = HashMap::new();

    for member in groups.iter().flat_map(|g| g.members.iter()).filter(|m| m.invisible) {
        let uuid = PlayerId::new(&member.uuid);
        let Some(map) = member.channel_map.as_deref() else {
            continue;
        };
        let Some((owner, role)) = satellite_owner(&uuid, map, |id| visible.contains(id)) else {
            tracing::debug!("Invisible member {} has no visible owner", uuid);
            continue;
        };

        let entry = satellites.entry(owner).or_default();
        if !entry.iter().any(|s| s.uuid == uuid) {
            entry.push(Satellite {
                uuid,
                role,
                location: member.location.clone(),
            });
        }
    }

    satellites
}
