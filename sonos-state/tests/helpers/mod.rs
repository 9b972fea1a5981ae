//! Shared builders for sonos-state integration tests.

#![allow(dead_code)]

/// ZoneGroupState document as carried (escaped) by a ZoneGroupTopology event.
pub fn zone_group_state(groups: &[&str]) -> String {
    format!(
        "<ZoneGroupState><ZoneGroups>{}</ZoneGroups><VanishedDevices/></ZoneGroupState>",
        groups.concat()
    )
}

pub fn member(uuid: &str, room: &str, host: u8, extra: &str) -> String {
    format!(
        r#"<ZoneGroupMember UUID="{uuid}" Location="http://192.168.1.{host}:1400/xml/device_description.xml" ZoneName="{room}" {extra}/>"#
    )
}

pub fn group(id: &str, coordinator: &str, members: &[String]) -> String {
    format!(
        r#"<ZoneGroup Coordinator="{coordinator}" ID="{id}">{}</ZoneGroup>"#,
        members.concat()
    )
}

pub fn rendering_control(volume: u8, muted: bool) -> String {
    format!(
        r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"><InstanceID val="0"><Volume channel="Master" val="{}"/><Mute channel="Master" val="{}"/></InstanceID></Event>"#,
        volume,
        u8::from(muted)
    )
}
