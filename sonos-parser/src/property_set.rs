//! Incremental `propertyset` reader
//!
//! GENA notification bodies are read as a stream of XML events straight from
//! the socket. Each `<property>` child is accumulated on its own (bounded by
//! [`MAX_PROPERTY_LEN`]) and decoded once its closing tag has been seen, so a
//! property is only ever yielded after its inner document parsed completely.
//!
//! The limit caps what is pulled from the source, not just what is kept: the
//! underlying reader is wrapped in [`Take`] and re-armed at every property, so
//! an oversized value fails after roughly [`MAX_PROPERTY_LEN`] bytes whatever
//! the body size.
//!
//! ```rust
//! use sonos_parser::{EventProperty, PropertySetReader};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let body: &[u8] = b"<e:propertyset xmlns:e=\"urn:schemas-upnp-org:event-1-0\">\
//!     <e:property><ContainerUpdateIDs>Q:0,3</ContainerUpdateIDs></e:property>\
//!     </e:propertyset>";
//! let mut reader = PropertySetReader::new(body);
//! while let Some(property) = reader.next_property().await.unwrap() {
//!     if let EventProperty::ContainerUpdateIds(updates) = property {
//!         assert!(updates.queue_changed);
//!     }
//! }
//! # }
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::io::{AsyncBufRead, AsyncReadExt, Take};

use crate::common::xml_decode::element_name;
use crate::error::{ParseError, ParseResult};
use crate::services::content_directory::{parse_container_update_ids, ContainerUpdates};
use crate::services::last_change::{parse_last_change, PropertyMap};
use crate::services::zone_group_topology::{parse_zone_group_state, ZoneGroup};

/// Upper bound for the text of a single property.
pub const MAX_PROPERTY_LEN: usize = 4 * 1024 * 1024;

/// Bytes that may be read from the source between two property boundaries:
/// one value plus the markup around it.
const READ_BUDGET: u64 = MAX_PROPERTY_LEN as u64 + 4096;

/// One fully decoded property of a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum EventProperty {
    ZoneGroupState(Vec<ZoneGroup>),
    LastChange(PropertyMap),
    ContainerUpdateIds(ContainerUpdates),
    /// Any other evented variable, kept verbatim
    Other { name: String, value: String },
}

impl EventProperty {
    fn decode(name: String, value: String) -> ParseResult<Self> {
        Ok(match name.as_str() {
            "ZoneGroupState" => EventProperty::ZoneGroupState(parse_zone_group_state(&value)?),
            "LastChange" => EventProperty::LastChange(parse_last_change(&value)?),
            "ContainerUpdateIDs" => {
                EventProperty::ContainerUpdateIds(parse_container_update_ids(&value))
            }
            _ => EventProperty::Other { name, value },
        })
    }
}

enum Token {
    Open(String),
    Empty(String),
    Close(String),
    Text(String),
    Eof,
    Skip,
    /// The read budget ran out mid-token
    Overflow,
}

/// Pull-style reader over a `propertyset` document.
pub struct PropertySetReader<R> {
    reader: Reader<Take<R>>,
    buf: Vec<u8>,
    depth: usize,
    in_property: bool,
}

impl<R: AsyncBufRead + Unpin> PropertySetReader<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner.take(READ_BUDGET));
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            in_property: false,
        }
    }

    /// Give back the underlying reader, positioned after the last consumed event.
    pub fn into_inner(self) -> R {
        self.reader.into_inner().into_inner()
    }

    fn rearm(&mut self) {
        self.reader.get_mut().set_limit(READ_BUDGET);
    }

    /// Read up to and including the next property.
    ///
    /// Returns `Ok(None)` once the document ends. After an error the reader
    /// must not be used further.
    pub async fn next_property(&mut self) -> ParseResult<Option<EventProperty>> {
        loop {
            match self.next_token().await? {
                Token::Open(name) => {
                    self.depth += 1;
                    if self.in_property {
                        self.rearm();
                        let value = self.read_value(&name).await?;
                        self.rearm();
                        self.depth -= 1;
                        return EventProperty::decode(name, value).map(Some);
                    }
                    if name == "property" {
                        self.in_property = true;
                    }
                }
                Token::Empty(name) => {
                    if self.in_property {
                        self.rearm();
                        return EventProperty::decode(name, String::new()).map(Some);
                    }
                }
                Token::Close(name) => {
                    self.depth = self.depth.saturating_sub(1);
                    if name == "property" {
                        self.in_property = false;
                    }
                }
                Token::Text(_) | Token::Skip => {}
                Token::Overflow => {
                    return Err(ParseError::PropertyTooLarge {
                        name: "propertyset".to_string(),
                        limit: MAX_PROPERTY_LEN,
                    })
                }
                Token::Eof => {
                    if self.depth > 0 {
                        return Err(ParseError::InvalidXmlStructure(
                            "unexpected end of notification body".to_string(),
                        ));
                    }
                    return Ok(None);
                }
            }
        }
    }

    async fn next_token(&mut self) -> ParseResult<Token> {
        self.buf.clear();
        let event = self.reader.read_event_into_async(&mut self.buf).await;
        // An exhausted budget looks like end of input to quick-xml
        if self.reader.get_ref().limit() == 0 {
            return Ok(Token::Overflow);
        }
        let token = match event? {
            Event::Start(e) => Token::Open(element_name(&e)),
            Event::Empty(e) => Token::Empty(element_name(&e)),
            Event::End(e) => Token::Close(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()),
            Event::Text(t) => Token::Text(t.unescape()?.into_owned()),
            Event::CData(c) => Token::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
            Event::Eof => Token::Eof,
            _ => Token::Skip,
        };
        Ok(token)
    }

    /// Accumulate the text content of property `name` up to its closing tag.
    async fn read_value(&mut self, name: &str) -> ParseResult<String> {
        let mut value = String::new();
        loop {
            match self.next_token().await? {
                Token::Overflow => {
                    return Err(ParseError::PropertyTooLarge {
                        name: name.to_string(),
                        limit: MAX_PROPERTY_LEN,
                    })
                }
                Token::Text(text) => {
                    if value.len() + text.len() > MAX_PROPERTY_LEN {
                        return Err(ParseError::PropertyTooLarge {
                            name: name.to_string(),
                            limit: MAX_PROPERTY_LEN,
                        });
                    }
                    value.push_str(&text);
                }
                Token::Close(closing) if closing == name => return Ok(value),
                Token::Close(closing) => {
                    return Err(ParseError::InvalidXmlStructure(format!(
                        "unexpected </{}> inside {}",
                        closing, name
                    )))
                }
                Token::Open(child) | Token::Empty(child) => {
                    return Err(ParseError::InvalidXmlStructure(format!(
                        "unexpected <{}> inside {}",
                        child, name
                    )))
                }
                Token::Eof => {
                    return Err(ParseError::InvalidXmlStructure(format!(
                        "unexpected end of body inside {}",
                        name
                    )))
                }
                Token::Skip => {}
            }
        }
    }
}
