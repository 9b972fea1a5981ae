//! Utilities shared by the service parsers
//!
//! - [`xml_decode`]: namespace normalisation and serde entry point
//! - [`didl`]: DIDL-Lite track metadata

pub mod didl;
pub mod xml_decode;

pub use didl::TrackMetadata;
