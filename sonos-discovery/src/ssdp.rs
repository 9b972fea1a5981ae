//! SSDP message building and response parsing
//!
//! Pure functions only; the socket handling lives in the scanner.

use std::net::IpAddr;

use crate::DiscoveryResult;

/// SSDP multicast group and port.
pub const MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Service type every Sonos ZonePlayer answers to.
pub const ZONE_PLAYER_SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// Build the M-SEARCH datagram sent on every probe.
pub fn build_msearch() -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: 239.255.255.250:1900\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 1\r\n\
         ST: {}\r\n\
         \r\n",
        ZONE_PLAYER_SEARCH_TARGET
    )
}

/// Parse an SSDP response datagram into a discovery result.
///
/// Returns `None` for anything that is not a ZonePlayer answer carrying a
/// `LOCATION` header. Every valid response yields exactly one result; no
/// deduplication happens here.
pub fn parse_ssdp_response(response: &str, source: IpAddr) -> Option<DiscoveryResult> {
    if !response.contains(ZONE_PLAYER_SEARCH_TARGET) {
        return None;
    }

    let mut location = None;
    let mut household = None;

    for line in response.lines() {
        let line = line.trim();

        if let Some(value) = extract_header_value(line, "LOCATION:") {
            location = Some(value);
        } else if let Some(value) = extract_header_value(line, "X-RINCON-HOUSEHOLD:") {
            household = Some(value);
        }
    }

    let location = location.filter(|l| !l.is_empty())?;

    Some(DiscoveryResult {
        household: household.filter(|h| !h.is_empty()),
        location,
        ip: source,
    })
}

/// Value of `line` when it starts with `header` (ASCII case-insensitive).
///
/// Lines come from lossily decoded datagrams, so the split point may fall
/// inside a multibyte character; such lines simply do not match.
fn extract_header_value(line: &str, header: &str) -> Option<String> {
    line.get(..header.len())
        .filter(|name| name.eq_ignore_ascii_case(header))?;
    line.get(header.len()..)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> IpAddr {
        "192.168.1.100".parse().unwrap()
    }

    #[test]
    fn test_parse_ssdp_response_valid() {
        let response = "HTTP/1.1 200 OK\r\n\
            CACHE-CONTROL: max-age = 1800\r\n\
            EXT:\r\n\
            LOCATION: http://192.168.1.100:1400/xml/device_description.xml\r\n\
            SERVER: Linux UPnP/1.0 Sonos/70.3-35220 (ZPS9)\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            USN: uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            X-RINCON-HOUSEHOLD: Sonos_abcdefghijklmnop\r\n\
            X-RINCON-BOOTSEQ: 74\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response, source()).unwrap();

        assert_eq!(parsed.location, "http://192.168.1.100:1400/xml/device_description.xml");
        assert_eq!(parsed.household.as_deref(), Some("Sonos_abcdefghijklmnop"));
        assert_eq!(parsed.ip, source());
    }

    #[test]
    fn test_parse_ssdp_response_without_household() {
        let response = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://192.168.1.101:1400/xml/device_description.xml\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response, source()).unwrap();
        assert_eq!(parsed.household, None);
    }

    #[test]
    fn test_parse_ssdp_response_case_insensitive() {
        let response = "HTTP/1.1 200 OK\r\n\
            location: http://192.168.1.102:1400/xml/device_description.xml\r\n\
            st: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            x-rincon-household: Sonos_xyz\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response, source()).unwrap();
        assert_eq!(parsed.location, "http://192.168.1.102:1400/xml/device_description.xml");
        assert_eq!(parsed.household.as_deref(), Some("Sonos_xyz"));
    }

    #[test]
    fn test_parse_ssdp_response_wrong_service_type() {
        let response = "HTTP/1.1 200 OK\r\n\
            LOCATION: http://192.168.1.1:49152/rootDesc.xml\r\n\
            ST: urn:schemas-upnp-org:device:InternetGatewayDevice:1\r\n\
            \r\n";

        assert!(parse_ssdp_response(response, source()).is_none());
    }

    #[test]
    fn test_parse_ssdp_response_missing_location() {
        let response = "HTTP/1.1 200 OK\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            USN: uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            \r\n";

        assert!(parse_ssdp_response(response, source()).is_none());
    }

    #[test]
    fn test_parse_ssdp_response_truncated() {
        let response = "HTTP/1.1 200 OK\r\nST: urn:schemas-upnp-org:device:ZonePlayer:1\r\nLOCAT";
        assert!(parse_ssdp_response(response, source()).is_none());
    }

    #[test]
    fn test_parse_ssdp_response_empty() {
        assert!(parse_ssdp_response("", source()).is_none());
    }

    #[test]
    fn test_build_msearch_targets_zone_player() {
        let msg = build_msearch();
        assert!(msg.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(msg.contains("ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n"));
        assert!(msg.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_extract_header_value_case_insensitive() {
        assert_eq!(
            extract_header_value("location: http://example.com", "LOCATION:"),
            Some("http://example.com".to_string())
        );
        assert_eq!(
            extract_header_value("LoCaTiOn: http://example.com", "LOCATION:"),
            Some("http://example.com".to_string())
        );
    }

    #[test]
    fn test_extract_header_value_no_match() {
        assert_eq!(extract_header_value("OTHER: value", "LOCATION:"), None);
        assert_eq!(extract_header_value("LOCATIONS: value", "LOCATION:"), None);
        // Nothing after the colon
        assert_eq!(extract_header_value("LOCATION:", "LOCATION:"), None);
    }

    #[test]
    fn test_extract_header_value_multibyte_boundary() {
        // Byte 9 falls inside the euro sign
        assert_eq!(extract_header_value("LOCATION\u{20ac}: http://x", "LOCATION:"), None);
        assert_eq!(extract_header_value("\u{20ac}", "LOCATION:"), None);
        assert_eq!(extract_header_value("LOC\u{e9}", "LOCATION:"), None);
    }

    #[test]
    fn test_parse_ssdp_response_multibyte_header_discarded() {
        let response = "HTTP/1.1 200 OK\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            LOCATION\u{20ac}: http://x\r\n\
            \r\n";
        assert!(parse_ssdp_response(response, source()).is_none());
    }

    #[test]
    fn test_parse_ssdp_response_lossy_bytes_elsewhere() {
        let raw = b"HTTP/1.1 200 OK\r\n\
            SERVER: Linux \xff\xfe UPnP/1.0\r\n\
            \xe2\x82\r\n\
            LOCATION: http://192.168.1.100:1400/xml/device_description.xml\r\n\
            ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
            X-RINCON-HOUSEHOLD: Sonos_\xc3\xa9t\xc3\xa9\r\n\
            \r\n";
        let text = String::from_utf8_lossy(raw);

        let result = parse_ssdp_response(&text, source()).unwrap();
        assert_eq!(
            result.location,
            "http://192.168.1.100:1400/xml/device_description.xml"
        );
        assert_eq!(result.household.as_deref(), Some("Sonos_\u{e9}t\u{e9}"));
    }
}
