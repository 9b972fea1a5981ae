//! Zone type

use std::sync::Arc;

use super::{GroupId, Player, PlayerId};
use crate::error::{Result, StateError};
use crate::volume::{self, GroupState, MemberVolume};

/// A planned volume for one member
#[derive(Debug, Clone)]
pub struct VolumeChange {
    pub player: Arc<Player>,
    pub volume: u8,
}

/// A zone group: one coordinator and its visible members
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: GroupId,
    pub coordinator: Arc<Player>,
    /// Visible members; satellites hang off their players instead
    pub members: Vec<Arc<Player>>,
}

impl Zone {
    pub fn coordinator_id(&self) -> &PlayerId {
        self.coordinator.uuid()
    }

    pub fn contains(&self, uuid: &PlayerId) -> bool {
        self.members.iter().any(|m| m.uuid() == uuid)
    }

    /// Room names of the members, coordinator first.
    pub fn name(&self) -> String {
        let mut names = vec![self.coordinator.room_name()];
        names.extend(
            self.members
                .iter()
                .filter(|m| m.uuid() != self.coordinator.uuid())
                .map(|m| m.room_name()),
        );
        names.join(" + ")
    }

    pub fn member_volumes(&self) -> Vec<MemberVolume> {
        self.members.iter().map(|m| m.member_volume()).collect()
    }

    /// Group volume and mute derived from the members' current state.
    pub fn group_state(&self) -> GroupState {
        volume::group_state(&self.member_volumes())
    }

    /// Member volumes that move the group volume to `target`.
    ///
    /// Members with a fixed-level output are left out.
    pub fn plan_volume(&self, target: u8) -> Vec<VolumeChange> {
        let targets = volume::distribute(&self.member_volumes(), target);
        self.members
            .iter()
            .zip(targets)
            .filter_map(|(player, volume)| {
                volume.map(|volume| VolumeChange {
                    player: Arc::clone(player),
                    volume,
                })
            })
            .collect()
    }

    /// Plan a group volume change and write it to the members right away.
    ///
    /// Returns the plan and the group state recomputed from the new member
    /// volumes.
    pub fn apply_volume(&self, target: u8) -> Result<(Vec<VolumeChange>, GroupState)> {
        let changes = self.plan_volume(target);
        if changes.is_empty() {
            return Err(StateError::FixedVolume(self.id.clone()));
        }

        for change in &changes {
            change.player.update(|s| s.volume = change.volume);
        }
        Ok((changes, self.group_state()))
    }
}
