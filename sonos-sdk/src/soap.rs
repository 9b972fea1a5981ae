//! SOAP control actions
//!
//! Control commands go through the [`ActionInvoker`] seam: an action id of
//! the form `<service type>#<action>`, a control URL and the action
//! arguments in. The response arguments come out as a map. [`HttpActionInvoker`]
//! is the HTTP implementation.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// `RenderingControl#SetVolume`
pub const SET_VOLUME: &str = "urn:schemas-upnp-org:service:RenderingControl:1#SetVolume";

/// Control path of RenderingControl below a player's base URL
pub const RENDERING_CONTROL_PATH: &str = "/MediaRenderer/RenderingControl/Control";

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    #[error("Network/HTTP error: {0}")]
    Network(String),

    #[error("XML parsing error: {0}")]
    Parse(String),

    /// UPnP error code from a SOAP fault
    #[error("SOAP fault: error code {0}")]
    Fault(u16),

    #[error("Invalid action id: {0}")]
    InvalidAction(String),
}

/// Output arguments of an action, by name
pub type ActionResponse = BTreeMap<String, String>;

/// Issues SOAP actions against players.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(
        &self,
        control_url: &str,
        action_id: &str,
        params: &[(&str, String)],
    ) -> Result<ActionResponse, SoapError>;
}

/// Split `service#Action` into its parts.
pub fn split_action_id(action_id: &str) -> Result<(&str, &str), SoapError> {
    match action_id.split_once('#') {
        Some((service, action)) if !service.is_empty() && !action.is_empty() => Ok((service, action)),
        _ => Err(SoapError::InvalidAction(action_id.to_string())),
    }
}

/// Build the request envelope for an action.
pub fn build_envelope(service_type: &str, action: &str, params: &[(&str, String)]) -> String {
    let arguments: String = params
        .iter()
        .map(|(name, value)| format!("<{0}>{1}</{0}>", name, quick_xml::escape::escape(value)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_type}">{arguments}</u:{action}></s:Body></s:Envelope>"#
    )
}

/// Extract the output arguments of `<action>Response`, or the fault code.
pub fn parse_action_response(xml: &str, action: &str) -> Result<ActionResponse, SoapError> {
    let response_name = format!("{}Response", action);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut values = ActionResponse::new();
    let mut found = false;
    let mut fault = false;
    let mut fault_code = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| SoapError::Parse(e.to_string()))?
        {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                found |= name == response_name;
                fault |= name == "Fault";
                path.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == response_name {
                    found = true;
                } else if path.last() == Some(&response_name) {
                    values.insert(name, String::new());
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| SoapError::Parse(e.to_string()))?
                    .into_owned();
                let depth = path.len();
                if depth >= 2 && path[depth - 2] == response_name {
                    values.insert(path[depth - 1].clone(), text);
                } else if path.last().map(String::as_str) == Some("errorCode") {
                    fault_code = text.trim().parse::<u16>().ok();
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if fault {
        return Err(SoapError::Fault(fault_code.unwrap_or(500)));
    }
    if !found {
        return Err(SoapError::Parse(format!("Missing {} element", response_name)));
    }
    Ok(values)
}

/// [`ActionInvoker`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpActionInvoker {
    client: reqwest::Client,
}

impl HttpActionInvoker {
    pub fn new() -> Result<Self, SoapError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SoapError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ActionInvoker for HttpActionInvoker {
    async fn invoke(
        &self,
        control_url: &str,
        action_id: &str,
        params: &[(&str, String)],
    ) -> Result<ActionResponse, SoapError> {
        let (service_type, action) = split_action_id(action_id)?;
        let body = build_envelope(service_type, action, params);

        let response = self
            .client
            .post(control_url)
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .header("SOAPACTION", format!("\"{}\"", action_id))
            .body(body)
            .send()
            .await
            .map_err(|e| SoapError::Network(e.to_string()))?;

        // Faults arrive with status 500 and a SOAP body
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SoapError::Network(e.to_string()))?;

        match parse_action_response(&text, action) {
            Err(SoapError::Parse(_)) if !status.is_success() => Err(SoapError::Network(format!(
                "{} failed: HTTP {}",
                action,
                status.as_u16()
            ))),
            other => other,
        }
    }
}

/// Arguments of `RenderingControl#SetVolume` on the master channel.
pub fn set_volume_params(volume: u8) -> Vec<(&'static str, String)> {
    vec![
        ("InstanceID", "0".to_string()),
        ("Channel", "Master".to_string()),
        ("DesiredVolume", volume.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_envelope_escapes_arguments() {
        let body = build_envelope(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "SetAVTransportURI",
            &[("CurrentURI", "x-rincon:a&b<c>".to_string())],
        );
        assert!(body.contains(r#"<u:SetAVTransportURI xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">"#));
        assert!(body.contains("<CurrentURI>x-rincon:a&amp;b&lt;c&gt;</CurrentURI>"));
    }

    #[test]
    fn test_split_action_id() {
        assert_eq!(
            split_action_id(SET_VOLUME).unwrap(),
            ("urn:schemas-upnp-org:service:RenderingControl:1", "SetVolume")
        );
        assert!(split_action_id("SetVolume").is_err());
        assert!(split_action_id("urn:x#").is_err());
    }

    #[test]
    fn test_parse_response_arguments() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>27</CurrentVolume><Extra/></u:GetVolumeResponse></s:Body></s:Envelope>"#;
        let values = parse_action_response(xml, "GetVolume").unwrap();
        assert_eq!(values.get("CurrentVolume").map(String::as_str), Some("27"));
        assert_eq!(values.get("Extra").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_empty_response() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:SetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"></u:SetVolumeResponse></s:Body></s:Envelope>"#;
        assert!(parse_action_response(xml, "SetVolume").unwrap().is_empty());
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>402</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;
        assert!(matches!(
            parse_action_response(xml, "SetVolume"),
            Err(SoapError::Fault(402))
        ));
    }

    #[test]
    fn test_parse_missing_response() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>"#;
        assert!(matches!(
            parse_action_response(xml, "Play"),
            Err(SoapError::Parse(_))
        ));
    }
}
