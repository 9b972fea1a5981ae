//! Fakes for driving a SonosSystem end to end on loopback.

#![allow(dead_code)]

use async_trait::async_trait;
use sonos_discovery::{ProbeSocket, SocketBinder};
use sonos_sdk::{ActionInvoker, ActionResponse, Components, SoapError, SystemConfig};
use sonos_stream::{GenaRequest, GenaResponse, GenaTransport, SubscriptionError};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const SSDP_SOURCE: &str = "127.0.0.1:1900";

/// System configuration for tests: OS-assigned listener port, loopback
/// scanner interface, quick retries.
pub fn test_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.listener.start_port = 0;
    config.scanner.interfaces = Some(vec![Ipv4Addr::LOCALHOST]);
    config.retry_interval = Duration::from_millis(10);
    config
}

pub struct Fakes {
    pub network: FakeNetwork,
    pub transport: Arc<MockTransport>,
    pub invoker: Arc<MockInvoker>,
}

pub fn components(transport: MockTransport) -> (Components, Fakes) {
    let (binder, network) = fake_network();
    let transport = Arc::new(transport);
    let invoker = Arc::new(MockInvoker::default());
    let components = Components {
        transport: transport.clone(),
        invoker: invoker.clone(),
        binder,
    };
    (
        components,
        Fakes {
            network,
            transport,
            invoker,
        },
    )
}

// Discovery

type Inbound = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>;

pub struct FakeBinder {
    inbound: Inbound,
}

#[derive(Clone)]
pub struct FakeNetwork {
    inbound_tx: mpsc::UnboundedSender<Vec<u8>>,
}

pub fn fake_network() -> (Arc<FakeBinder>, FakeNetwork) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let binder = FakeBinder {
        inbound: Arc::new(tokio::sync::Mutex::new(inbound_rx)),
    };
    (Arc::new(binder), FakeNetwork { inbound_tx })
}

impl FakeNetwork {
    /// Answer the scanner's probe as a player would.
    pub fn answer(&self, location: &str, household: &str) {
        let response = format!(
            "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age = 1800\r\nLOCATION: {}\r\nST: urn:schemas-upnp-org:device:ZonePlayer:1\r\nX-RINCON-HOUSEHOLD: {}\r\n\r\n",
            location, household
        );
        let _ = self.inbound_tx.send(response.into_bytes());
    }
}

struct FakeSocket {
    inbound: Inbound,
}

#[async_trait]
impl ProbeSocket for FakeSocket {
    async fn send_to(&self, payload: &[u8], _target: SocketAddr) -> io::Result<usize> {
        Ok(payload.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut inbound = self.inbound.lock().await;
        match inbound.recv().await {
            Some(payload) => {
                let len = payload.len().min(buf.len());
                buf[..len].copy_from_slice(&payload[..len]);
                let from: SocketAddr = SSDP_SOURCE
                    .parse()
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                Ok((len, from))
            }
            None => std::future::pending().await,
        }
    }
}

impl SocketBinder for FakeBinder {
    fn bind(
        &self,
        _interface: Option<Ipv4Addr>,
        _multicast_ttl: u32,
    ) -> sonos_discovery::Result<Box<dyn ProbeSocket>> {
        Ok(Box::new(FakeSocket {
            inbound: Arc::clone(&self.inbound),
        }))
    }
}

// Subscriptions

/// Accepts every request except those to endpoints ending in `failing`.
#[derive(Default)]
pub struct MockTransport {
    failing: Option<&'static str>,
    requests: Mutex<Vec<GenaRequest>>,
}

impl MockTransport {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn failing_on(suffix: &'static str) -> Self {
        Self {
            failing: Some(suffix),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<GenaRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Endpoints of fresh SUBSCRIBE requests, in order.
    pub fn subscribed_endpoints(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                GenaRequest::Subscribe { endpoint, .. } => Some(endpoint),
                _ => None,
            })
            .collect()
    }

    pub fn unsubscribes(&self) -> Vec<GenaRequest> {
        self.requests()
            .into_iter()
            .filter(|r| matches!(r, GenaRequest::Unsubscribe { .. }))
            .collect()
    }
}

#[async_trait]
impl GenaTransport for MockTransport {
    async fn send(&self, request: GenaRequest) -> sonos_stream::Result<GenaResponse> {
        let failing = self
            .failing
            .map(|suffix| request.endpoint().ends_with(suffix))
            .unwrap_or(false);
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if failing {
            return Err(SubscriptionError::NetworkError("connection refused".to_string()));
        }
        Ok(GenaResponse {
            sid: Some(format!("uuid:RINCON_TEST_sub{:010}", count)),
            timeout_secs: Some(600),
        })
    }
}

// Control

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub control_url: String,
    pub action_id: String,
    pub params: Vec<(String, String)>,
}

impl Invocation {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
pub struct MockInvoker {
    calls: Mutex<Vec<Invocation>>,
}

impl MockInvoker {
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionInvoker for MockInvoker {
    async fn invoke(
        &self,
        control_url: &str,
        action_id: &str,
        params: &[(&str, String)],
    ) -> Result<ActionResponse, SoapError> {
        self.calls.lock().unwrap().push(Invocation {
            control_url: control_url.to_string(),
            action_id: action_id.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        Ok(ActionResponse::new())
    }
}

// Notifications

pub fn escape(xml: &str) -> String {
    xml.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn property_set(name: &str, value: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0"><e:property><{0}>{1}</{0}></e:property></e:propertyset>"#,
        name, value
    )
}

pub fn member(uuid: &str, room: &str, port: u16) -> String {
    format!(
        r#"<ZoneGroupMember UUID="{uuid}" Location="http://127.0.0.1:{port}/xml/device_description.xml" ZoneName="{room}"/>"#
    )
}

pub fn topology_body(coordinator: &str, members: &[String]) -> String {
    let inner = format!(
        r#"<ZoneGroupState><ZoneGroups><ZoneGroup Coordinator="{coordinator}" ID="{coordinator}:1">{}</ZoneGroup></ZoneGroups><VanishedDevices/></ZoneGroupState>"#,
        members.concat()
    );
    property_set("ZoneGroupState", &escape(&inner))
}

pub fn volume_body(volume: u8) -> String {
    let inner = format!(
        r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"><InstanceID val="0"><Volume channel="Master" val="{}"/></InstanceID></Event>"#,
        volume
    );
    property_set("LastChange", &escape(&inner))
}

pub fn sid(device: &str) -> String {
    format!("uuid:{}_sub0000000001", device)
}

/// Deliver a NOTIFY to the listener as `device` would.
pub async fn notify(port: u16, device: &str, body: String) -> reqwest::StatusCode {
    let method = reqwest::Method::from_bytes(b"NOTIFY").unwrap();
    reqwest::Client::new()
        .request(method, format!("http://127.0.0.1:{}/", port))
        .header("NT", "upnp:event")
        .header("NTS", "upnp:propchange")
        .header("SID", sid(device))
        .header("Content-Type", "text/xml")
        .body(body)
        .send()
        .await
        .expect("NOTIFY failed")
        .status()
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
