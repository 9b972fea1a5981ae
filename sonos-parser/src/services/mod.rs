//! Decoders for the property documents carried by each UPnP service
//!
//! - [`zone_group_topology`]: `ZoneGroupState`
//! - [`last_change`]: `LastChange` (AVTransport, RenderingControl)
//! - [`content_directory`]: `ContainerUpdateIDs`

pub mod content_directory;
pub mod last_change;
pub mod zone_group_topology;
