//! Group volume aggregation and distribution
//!
//! Group volume is the rounded mean volume of the members whose output can
//! be attenuated. Setting it raises every member by the same amount, or
//! lowers every member proportionally so the balance between rooms is kept.

use serde::{Deserialize, Serialize};

/// Highest volume a player accepts.
pub const MAX_VOLUME: u8 = 100;

/// Volume-related state of one zone member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberVolume {
    pub volume: u8,
    pub muted: bool,
    /// Line-level output that cannot be attenuated
    pub output_fixed: bool,
}

/// Derived volume state of a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    pub volume: u8,
    /// True when every adjustable member is muted
    pub muted: bool,
}

/// Compute the group state from member volumes.
///
/// Fixed-output members count toward neither the sum nor the member count.
/// A zone without adjustable members reports volume 0, unmuted.
pub fn group_state(members: &[MemberVolume]) -> GroupState {
    let adjustable: Vec<&MemberVolume> = members.iter().filter(|m| !m.output_fixed).collect();
    if adjustable.is_empty() {
        return GroupState::default();
    }

    let n = adjustable.len() as u32;
    let sum: u32 = adjustable.iter().map(|m| u32::from(m.volume)).sum();
    // round(sum / n), halves rounded up
    let volume = (2 * sum + n) / (2 * n);

    GroupState {
        volume: clamp_volume(volume as i64),
        muted: adjustable.iter().all(|m| m.muted),
    }
}

/// Target volume for one member when the group moves from `current` to
/// `target`.
pub fn member_target(member_volume: u8, current: u8, target: u8) -> u8 {
    if target < 1 {
        return 0;
    }

    if target > current {
        let delta = i64::from(target) - i64::from(current);
        clamp_volume(i64::from(member_volume) + delta)
    } else {
        // ceil(member_volume / current * target); current >= target >= 1 here
        let numerator = u32::from(member_volume) * u32::from(target);
        let current = u32::from(current);
        clamp_volume(((numerator + current - 1) / current) as i64)
    }
}

/// Target volumes for every member, in input order. Fixed-output members
/// are skipped and yield `None`.
pub fn distribute(members: &[MemberVolume], target: u8) -> Vec<Option<u8>> {
    let target = target.min(MAX_VOLUME);
    let current = group_state(members).volume;

    members
        .iter()
        .map(|m| {
            if m.output_fixed {
                None
            } else {
                Some(member_target(m.volume, current, target))
            }
        })
        .collect()
}

pub fn clamp_volume(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_VOLUME)) as u8
}
