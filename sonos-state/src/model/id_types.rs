//! Newtypes for the two kinds of key the household model uses: the RINCON
//! UUID of a player and the id of the zone group it belongs to.
//!
//! Both wrap a `String` and compare equal to plain strings, so lookups can be
//! written against values straight from the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string newtype whose constructor runs `$normalize` on its input,
/// plus `as_str`, `Display`, conversions from `&str`/`String` and `str`
/// comparisons.
macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident, $normalize:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                let normalize: fn(String) -> String = $normalize;
                Self(normalize(id.into()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_key!(
    /// RINCON UUID of a player, such as `RINCON_000E58A0123401400`.
    ///
    /// SSDP and GENA headers often carry it as `uuid:RINCON_...`; that prefix
    /// is dropped so both spellings name the same player.
    PlayerId,
    |raw| match raw.strip_prefix("uuid:") {
        Some(bare) => bare.to_string(),
        None => raw,
    }
);

string_key!(
    /// `ID` attribute of a ZoneGroup, the coordinator's UUID plus a
    /// generation counter (`RINCON_000E58A0123401400:57`). Changes whenever
    /// the group is re-formed.
    GroupId,
    |raw| raw
);
