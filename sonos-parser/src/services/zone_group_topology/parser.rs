//! ZoneGroupState document parser
//!
//! The `ZoneGroupState` property of a ZoneGroupTopology event carries an
//! escaped document describing every group in the household. Recent firmware
//! wraps it as `<ZoneGroupState><ZoneGroups>…</ZoneGroups></ZoneGroupState>`,
//! older firmware sends `<ZoneGroups>` as the root. Both are accepted.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::common::xml_decode;
use crate::error::{ParseError, ParseResult};

/// A group of players as reported by the household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneGroup {
    pub id: String,
    /// UUID of the declared coordinator
    pub coordinator: String,
    /// Members in document order; home-theater satellites follow their parent
    pub members: Vec<ZoneGroupMember>,
}

/// A single unit inside a [`ZoneGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneGroupMember {
    pub uuid: String,
    pub room_name: String,
    /// Device description URL
    pub location: String,
    /// Hidden from the user: satellites, stereo-pair partners, bridges
    pub invisible: bool,
    /// `uuid:CH,CH;uuid:CH,CH`
    pub channel_map: Option<String>,
}

impl ZoneGroup {
    /// Members that a user would see as rooms.
    pub fn visible_members(&self) -> impl Iterator<Item = &ZoneGroupMember> {
        self.members.iter().filter(|m| !m.invisible)
    }
}

impl ZoneGroupMember {
    /// Base URL (`http://host:port`) derived from the location.
    pub fn base_url(&self) -> Option<String> {
        let (scheme, rest) = self.location.split_once("://")?;
        let authority = rest.split('/').next().filter(|a| !a.is_empty())?;
        Some(format!("{}://{}", scheme, authority))
    }
}

#[derive(Debug, Deserialize)]
struct ZoneGroupStateDoc {
    #[serde(rename = "ZoneGroups", default)]
    zone_groups: Option<ZoneGroupsDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct ZoneGroupsDoc {
    #[serde(rename = "ZoneGroup", default)]
    zone_groups: Vec<RawZoneGroup>,
}

#[derive(Debug, Deserialize)]
struct RawZoneGroup {
    #[serde(rename = "@Coordinator", default)]
    coordinator: String,
    #[serde(rename = "@ID", default)]
    id: String,
    #[serde(rename = "ZoneGroupMember", default)]
    members: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(rename = "@UUID")]
    uuid: String,
    #[serde(rename = "@Location", default)]
    location: String,
    #[serde(rename = "@ZoneName", default)]
    zone_name: String,
    #[serde(rename = "@Invisible", default)]
    invisible: Option<String>,
    #[serde(rename = "@IsZoneBridge", default)]
    is_zone_bridge: Option<String>,
    #[serde(rename = "@ChannelMapSet", default)]
    channel_map_set: Option<String>,
    #[serde(rename = "@HTSatChanMapSet", default)]
    ht_sat_chan_map_set: Option<String>,
    #[serde(rename = "Satellite", default)]
    satellites: Vec<RawMember>,
}

impl RawMember {
    fn flag(value: &Option<String>) -> bool {
        value.as_deref() == Some("1")
    }

    fn own_channel_map(&self) -> Option<String> {
        self.channel_map_set
            .clone()
            .or_else(|| self.ht_sat_chan_map_set.clone())
            .filter(|m| !m.is_empty())
    }

    fn into_members(self, out: &mut Vec<ZoneGroupMember>) {
        let parent_map = self.ht_sat_chan_map_set.clone().filter(|m| !m.is_empty());
        let channel_map = self.own_channel_map();
        let invisible = Self::flag(&self.invisible) || Self::flag(&self.is_zone_bridge);

        out.push(ZoneGroupMember {
            uuid: self.uuid,
            room_name: self.zone_name,
            location: self.location,
            invisible,
            channel_map,
        });

        for satellite in self.satellites {
            let channel_map = satellite.own_channel_map().or_else(|| parent_map.clone());
            out.push(ZoneGroupMember {
                uuid: satellite.uuid,
                room_name: satellite.zone_name,
                location: satellite.location,
                invisible: true,
                channel_map,
            });
        }
    }
}

impl From<RawZoneGroup> for ZoneGroup {
    fn from(raw: RawZoneGroup) -> Self {
        let mut members = Vec::with_capacity(raw.members.len());
        for member in raw.members {
            member.into_members(&mut members);
        }
        ZoneGroup {
            id: raw.id,
            coordinator: raw.coordinator,
            members,
        }
    }
}

/// Parse a decoded ZoneGroupState document into its groups.
pub fn parse_zone_group_state(xml: &str) -> ParseResult<Vec<ZoneGroup>> {
    let groups = match root_element(xml)?.as_str() {
        "ZoneGroupState" => {
            let doc: ZoneGroupStateDoc = xml_decode::parse(xml)?;
            doc.zone_groups.unwrap_or_default()
        }
        "ZoneGroups" => xml_decode::parse::<ZoneGroupsDoc>(xml)?,
        other => {
            return Err(ParseError::MissingRequiredElement(format!(
                "ZoneGroupState (found <{}>)",
                other
            )))
        }
    };

    Ok(groups.zone_groups.into_iter().map(ZoneGroup::from).collect())
}

fn root_element(xml: &str) -> ParseResult<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => return Ok(xml_decode::element_name(&e)),
            Event::Eof => {
                return Err(ParseError::MissingRequiredElement("ZoneGroupState".to_string()))
            }
            _ => {}
        }
    }
}
