//! LastChange document parser
//!
//! AVTransport and RenderingControl report state through a `LastChange`
//! property whose decoded content looks like:
//! ```xml
//! <Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/">
//!   <InstanceID val="0">
//!     <Volume channel="Master" val="12"/>
//!     <Volume channel="LF" val="100"/>
//!     <Mute channel="Master" val="0"/>
//!     <OutputFixed val="0"/>
//!   </InstanceID>
//! </Event>
//! ```
//! Every element below `InstanceID` becomes one entry of a [`PropertyMap`].
//! Elements carrying a `channel` attribute are grouped per channel.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::xml_decode::element_name;
use crate::error::{ParseError, ParseResult};

/// Value of a single last-change property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    Value(String),
    /// Channel-scoped values such as `Volume` or `Mute`, keyed by channel
    Channels(BTreeMap<String, String>),
}

impl PropertyValue {
    /// The plain value, or the `Master` channel of a channel-scoped value.
    pub fn master(&self) -> Option<&str> {
        match self {
            PropertyValue::Value(v) => Some(v),
            PropertyValue::Channels(channels) => channels.get("Master").map(String::as_str),
        }
    }

    pub fn channel(&self, channel: &str) -> Option<&str> {
        match self {
            PropertyValue::Value(_) => None,
            PropertyValue::Channels(channels) => channels.get(channel).map(String::as_str),
        }
    }
}

/// Property name to value, as carried by one LastChange document.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Parse a decoded LastChange document.
pub fn parse_last_change(xml: &str) -> ParseResult<PropertyMap> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut properties = PropertyMap::new();
    let mut saw_root = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                handle_element(&mut properties, &mut saw_root, &e)?;
            }
            Event::Empty(e) => handle_element(&mut properties, &mut saw_root, &e)?,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(ParseError::InvalidXmlStructure(
            "LastChange document ended with open elements".to_string(),
        ));
    }

    if !saw_root {
        return Err(ParseError::MissingRequiredElement("Event".to_string()));
    }
    Ok(properties)
}

fn handle_element(
    properties: &mut PropertyMap,
    saw_root: &mut bool,
    e: &BytesStart<'_>,
) -> ParseResult<()> {
    let name = element_name(e);
    match name.as_str() {
        "Event" => *saw_root = true,
        "InstanceID" => {}
        _ => insert_property(properties, name, e)?,
    }
    Ok(())
}

fn insert_property(properties: &mut PropertyMap, name: String, e: &BytesStart<'_>) -> ParseResult<()> {
    let mut val = None;
    let mut channel = None;

    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"val" => val = Some(attr.unescape_value()?.into_owned()),
            b"channel" => channel = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    let val = val.unwrap_or_default();
    match channel {
        Some(channel) => {
            let entry = properties
                .entry(name)
                .or_insert_with(|| PropertyValue::Channels(BTreeMap::new()));
            match entry {
                PropertyValue::Channels(channels) => {
                    channels.insert(channel, val);
                }
                // A channel-less value already seen for this name wins
                PropertyValue::Value(_) => {}
            }
        }
        None => {
            properties.insert(name, PropertyValue::Value(val));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rendering_control() {
        let xml = r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"><InstanceID val="0"><Volume channel="Master" val="12"/><Volume channel="LF" val="100"/><Volume channel="RF" val="100"/><Mute channel="Master" val="0"/><OutputFixed val="0"/><PresetNameList val="FactoryDefaults"/></InstanceID></Event>"#;

        let props = parse_last_change(xml).unwrap();
        assert_eq!(props["Volume"].master(), Some("12"));
        assert_eq!(props["Volume"].channel("LF"), Some("100"));
        assert_eq!(props["Mute"].master(), Some("0"));
        assert_eq!(props["OutputFixed"], PropertyValue::Value("0".to_string()));
        assert_eq!(props["OutputFixed"].channel("Master"), None);
    }

    #[test]
    fn test_parse_av_transport_with_nested_metadata() {
        let xml = r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/" xmlns:r="urn:schemas-rinconnetworks-com:metadata-1-0/"><InstanceID val="0"><TransportState val="PLAYING"/><CurrentTrackURI val="x-sonos-spotify:track%3a1"/><CurrentTrackMetaData val="&lt;DIDL-Lite&gt;&lt;item&gt;&lt;dc:title&gt;Song&lt;/dc:title&gt;&lt;/item&gt;&lt;/DIDL-Lite&gt;"/><r:NextTrackURI val=""/></InstanceID></Event>"#;

        let props = parse_last_change(xml).unwrap();
        assert_eq!(props["TransportState"].master(), Some("PLAYING"));
        assert_eq!(props["CurrentTrackURI"].master(), Some("x-sonos-spotify:track%3a1"));
        assert_eq!(
            props["CurrentTrackMetaData"].master(),
            Some("<DIDL-Lite><item><dc:title>Song</dc:title></item></DIDL-Lite>")
        );
        assert_eq!(props["NextTrackURI"].master(), Some(""));
    }

    #[test]
    fn test_parse_missing_event_root() {
        assert!(parse_last_change("").is_err());
        assert!(parse_last_change("<ZoneGroups/>").is_err());
    }

    #[test]
    fn test_parse_unclosed_document() {
        assert!(parse_last_change("<Event><InstanceID>").is_err());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_last_change(r#"<Event><InstanceID val="0"><Volume channel="Master" val="1"/></Event>"#).is_err());
    }
}
