//! # sonos-parser
//!
//! XML parsing for the GENA notifications Sonos players send to a control
//! point. A notification body is a `propertyset` whose properties carry
//! escaped inner documents; [`PropertySetReader`] walks the body
//! incrementally and yields each property once its inner document has been
//! decoded.
//!
//! ## Usage
//!
//! ### Streaming a notification body
//! ```rust,ignore
//! use sonos_parser::{EventProperty, PropertySetReader};
//!
//! let mut reader = PropertySetReader::new(body);
//! while let Some(property) = reader.next_property().await? {
//!     match property {
//!         EventProperty::ZoneGroupState(groups) => { /* topology */ }
//!         EventProperty::LastChange(properties) => { /* player state */ }
//!         EventProperty::ContainerUpdateIds(updates) => { /* queue / favorites */ }
//!         EventProperty::Other { .. } => {}
//!     }
//! }
//! ```
//!
//! ### Decoding a single inner document
//! ```rust
//! use sonos_parser::services::last_change::parse_last_change;
//!
//! let props = parse_last_change(
//!     r#"<Event><InstanceID val="0"><Volume channel="Master" val="20"/></InstanceID></Event>"#,
//! ).unwrap();
//! assert_eq!(props["Volume"].master(), Some("20"));
//! ```

pub mod common;
pub mod error;
pub mod property_set;
pub mod services;

pub use common::TrackMetadata;
pub use error::{ParseError, ParseResult};
pub use property_set::{EventProperty, PropertySetReader, MAX_PROPERTY_LEN};
pub use services::content_directory::{parse_container_update_ids, ContainerUpdates};
pub use services::last_change::{parse_last_change, PropertyMap, PropertyValue};
pub use services::zone_group_topology::{parse_zone_group_state, ZoneGroup, ZoneGroupMember};
