//! Applying LastChange properties to player state
//!
//! Only the properties the model tracks are read; everything else in the
//! map is ignored. Applying the same map twice changes nothing the second
//! time, so duplicated or replayed events are harmless.

use sonos_parser::{PropertyMap, TrackMetadata};

use crate::model::{PlayerState, TransportState};
use crate::volume::clamp_volume;

/// Apply a LastChange property map. Returns whether anything changed.
pub fn apply_last_change(state: &mut PlayerState, properties: &PropertyMap) -> bool {
    let mut changed = false;

    if let Some(volume) = master(properties, "Volume").and_then(|v| v.trim().parse::<i64>().ok()) {
        changed |= set(&mut state.volume, clamp_volume(volume));
    }

    if let Some(muted) = master(properties, "Mute").map(parse_bool) {
        changed |= set(&mut state.muted, muted);
    }

    if let Some(fixed) = master(properties, "OutputFixed").map(parse_bool) {
        changed |= set(&mut state.output_fixed, fixed);
    }

    if let Some(transport) = master(properties, "TransportState") {
        changed |= set(&mut state.transport_state, TransportState::parse(transport));
    }

    if let Some(uri) = master(properties, "CurrentTrackURI") {
        let uri = Some(uri.to_string()).filter(|u| !u.is_empty());
        changed |= set(&mut state.current_track_uri, uri);
    }

    if let Some(didl) = master(properties, "CurrentTrackMetaData") {
        match TrackMetadata::from_didl(didl) {
            Ok(track) => {
                let track = Some(track).filter(|t| *t != TrackMetadata::default());
                changed |= set(&mut state.current_track, track);
            }
            Err(e) => tracing::debug!("Ignoring unreadable track metadata: {}", e),
        }
    }

    changed
}

fn master<'a>(properties: &'a PropertyMap, name: &str) -> Option<&'a str> {
    properties.get(name).and_then(|v| v.master())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "True")
}

fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
