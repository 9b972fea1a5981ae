//! ZoneGroupTopology service parser module
//!
//! Groups, coordinators and members (including home-theater satellites) from
//! the `ZoneGroupState` property.
//!
//! ```rust
//! use sonos_parser::services::zone_group_topology::parse_zone_group_state;
//!
//! let xml = r#"<ZoneGroupState><ZoneGroups><ZoneGroup Coordinator="RINCON_A" ID="RINCON_A:1"><ZoneGroupMember UUID="RINCON_A" Location="http://10.0.0.2:1400/xml/device_description.xml" ZoneName="Kitchen"/></ZoneGroup></ZoneGroups></ZoneGroupState>"#;
//! let groups = parse_zone_group_state(xml).unwrap();
//! assert_eq!(groups[0].coordinator, "RINCON_A");
//! ```

pub mod parser;

pub use parser::{parse_zone_group_state, ZoneGroup, ZoneGroupMember};
