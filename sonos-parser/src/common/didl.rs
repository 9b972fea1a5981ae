//! DIDL-Lite track metadata
//!
//! `CurrentTrackMetaData` in AVTransport last-change carries an escaped
//! DIDL-Lite document:
//! ```xml
//! <DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" ...>
//!   <item id="-1" parentID="-1">
//!     <dc:title>Song Title</dc:title>
//!     <dc:creator>Artist Name</dc:creator>
//!     <upnp:album>Album Name</upnp:album>
//!     <upnp:albumArtURI>/getaa?s=1&amp;u=...</upnp:albumArtURI>
//!     <res duration="0:03:58">uri</res>
//!   </item>
//! </DIDL-Lite>
//! ```

use serde::{Deserialize, Serialize};

use crate::common::xml_decode;
use crate::error::ParseResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct DidlLite {
    #[serde(rename = "item", default)]
    item: Option<DidlItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct DidlItem {
    #[serde(rename = "res", default)]
    res: Option<DidlResource>,
    #[serde(rename = "albumArtURI", default)]
    album_art_uri: Option<String>,
    #[serde(rename = "title", default)]
    title: Option<String>,
    #[serde(rename = "creator", default)]
    creator: Option<String>,
    #[serde(rename = "album", default)]
    album: Option<String>,
    #[serde(rename = "streamContent", default)]
    stream_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
struct DidlResource {
    #[serde(rename = "@duration", default)]
    duration: Option<String>,
}

/// Track information decoded from a DIDL-Lite item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Album art reference as sent by the player (often relative to the player base URL)
    pub album_art_uri: Option<String>,
    /// `H:MM:SS`
    pub duration: Option<String>,
}

impl TrackMetadata {
    /// Decode track metadata from a DIDL-Lite document.
    ///
    /// An empty string or a document without an `item` yields default metadata.
    pub fn from_didl(xml: &str) -> ParseResult<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let didl: DidlLite = xml_decode::parse(xml)?;
        let Some(item) = didl.item else {
            return Ok(Self::default());
        };

        // Radio streams put "Artist - Title" into streamContent and the station into title
        let (title, artist) = match (item.creator, item.stream_content.filter(|s| !s.is_empty())) {
            (None, Some(stream)) => match stream.split_once(" - ") {
                Some((artist, title)) => (Some(title.to_string()), Some(artist.to_string())),
                None => (Some(stream), None),
            },
            (creator, _) => (item.title, creator),
        };

        Ok(Self {
            title: non_empty(title),
            artist: non_empty(artist),
            album: non_empty(item.album),
            album_art_uri: non_empty(item.album_art_uri),
            duration: item.res.and_then(|r| non_empty(r.duration)),
        })
    }

    /// Album art as an absolute URL, resolving relative references against
    /// the player's base URL (`http://host:1400`).
    pub fn absolute_album_art(&self, base_url: &str) -> Option<String> {
        let art = self.album_art_uri.as_deref()?;
        if art.starts_with("http://") || art.starts_with("https://") {
            Some(art.to_string())
        } else {
            Some(format!("{}/{}", base_url.trim_end_matches('/'), art.trim_start_matches('/')))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
