//! XML decoding utilities for UPnP event parsing.
//!
//! Sonos documents mix namespace prefixes freely (`e:`, `dc:`, `upnp:`, `r:`).
//! Serde structs in this crate are written against local names only, so every
//! document is normalised through [`strip_namespaces`] before deserializing.

use crate::error::{ParseError, ParseResult};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::de::DeserializeOwned;

/// Parse XML string into a deserializable type with namespace stripping.
pub fn parse<T: DeserializeOwned>(xml: &str) -> ParseResult<T> {
    let stripped = strip_namespaces(xml)?;
    quick_xml::de::from_str(&stripped)
        .map_err(|e| ParseError::XmlDeserializationFailed(e.to_string()))
}

/// Rewrite a document with every element and attribute reduced to its local
/// name. `xmlns` declarations are dropped.
///
/// Input: `<e:propertyset xmlns:e="urn:x"><dc:title>Song</dc:title></e:propertyset>`
/// Output: `<propertyset><title>Song</title></propertyset>`
pub fn strip_namespaces(xml: &str) -> ParseResult<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    loop {
        match reader.read_event()? {
            Event::Start(e) => writer.write_event(Event::Start(localize(&e)?))?,
            Event::Empty(e) => writer.write_event(Event::Empty(localize(&e)?))?,
            Event::End(e) => {
                let name = local_name_of(e.local_name().as_ref());
                writer.write_event(Event::End(BytesEnd::new(name)))?
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| ParseError::InvalidXmlStructure(e.to_string()))
}

/// Local name of a start/empty element as an owned string.
pub(crate) fn element_name(e: &BytesStart<'_>) -> String {
    local_name_of(e.local_name().as_ref())
}

fn local_name_of(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn localize(e: &BytesStart<'_>) -> ParseResult<BytesStart<'static>> {
    let mut out = BytesStart::new(element_name(e));

    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::InvalidXmlStructure(err.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let local = attr.key.local_name();
        out.push_attribute((local.as_ref(), attr.value.as_ref()));
    }

    Ok(out)
}
