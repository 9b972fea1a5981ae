//! Test helpers for driving the scanner without a network

#![allow(dead_code)]

use async_trait::async_trait;
use sonos_discovery::{ProbeSocket, Result, SocketBinder};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Something the fake network observed, with the (virtual) time it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    Bind(Option<Ipv4Addr>),
    Send {
        interface: Option<Ipv4Addr>,
        target: SocketAddr,
    },
}

#[derive(Debug, Default)]
struct Shared {
    log: Mutex<Vec<(Instant, NetEvent)>>,
}

/// Binder handing out in-memory sockets.
///
/// All sockets share one inbound queue, fed through [`FakeNetwork::inject`].
pub struct FakeBinder {
    shared: Arc<Shared>,
    inbound: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<(Vec<u8>, SocketAddr)>>>,
}

/// Test-side view of the fake network.
#[derive(Clone)]
pub struct FakeNetwork {
    shared: Arc<Shared>,
    inbound_tx: mpsc::UnboundedSender<(Vec<u8>, SocketAddr)>,
}

pub fn fake_network() -> (Arc<FakeBinder>, FakeNetwork) {
    let shared = Arc::new(Shared::default());
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let binder = FakeBinder {
        shared: Arc::clone(&shared),
        inbound: Arc::new(tokio::sync::Mutex::new(inbound_rx)),
    };
    (Arc::new(binder), FakeNetwork { shared, inbound_tx })
}

impl FakeNetwork {
    /// Deliver a datagram to whichever socket is currently receiving.
    pub fn inject(&self, payload: &str, from: SocketAddr) {
        self.inject_bytes(payload.as_bytes(), from);
    }

    /// Like [`inject`](Self::inject), for payloads that are not valid UTF-8.
    pub fn inject_bytes(&self, payload: &[u8], from: SocketAddr) {
        self.inbound_tx
            .send((payload.to_vec(), from))
            .expect("scanner socket queue closed");
    }

    pub fn events(&self) -> Vec<(Instant, NetEvent)> {
        self.shared.log.lock().unwrap().clone()
    }

    pub fn binds(&self) -> Vec<(Instant, Option<Ipv4Addr>)> {
        self.events()
            .into_iter()
            .filter_map(|(at, e)| match e {
                NetEvent::Bind(iface) => Some((at, iface)),
                _ => None,
            })
            .collect()
    }

    pub fn sends(&self) -> Vec<(Instant, Option<Ipv4Addr>)> {
        self.events()
            .into_iter()
            .filter_map(|(at, e)| match e {
                NetEvent::Send { interface, .. } => Some((at, interface)),
                _ => None,
            })
            .collect()
    }
}

struct FakeSocket {
    interface: Option<Ipv4Addr>,
    shared: Arc<Shared>,
    inbound: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<(Vec<u8>, SocketAddr)>>>,
}

#[async_trait]
impl ProbeSocket for FakeSocket {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.shared.log.lock().unwrap().push((
            Instant::now(),
            NetEvent::Send {
                interface: self.interface,
                target,
            },
        ));
        Ok(payload.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut inbound = self.inbound.lock().await;
        match inbound.recv().await {
            Some((payload, from)) => {
                let len = payload.len().min(buf.len());
                buf[..len].copy_from_slice(&payload[..len]);
                Ok((len, from))
            }
            None => std::future::pending().await,
        }
    }
}

impl SocketBinder for FakeBinder {
    fn bind(&self, interface: Option<Ipv4Addr>, _multicast_ttl: u32) -> Result<Box<dyn ProbeSocket>> {
        self.shared
            .log
            .lock()
            .unwrap()
            .push((Instant::now(), NetEvent::Bind(interface)));
        Ok(Box::new(FakeSocket {
            interface,
            shared: Arc::clone(&self.shared),
            inbound: Arc::clone(&self.inbound),
        }))
    }
}

/// A ZonePlayer SSDP answer as the device would send it.
pub fn ssdp_response(ip: &str, household: Option<&str>) -> String {
    let household_line = household
        .map(|h| format!("X-RINCON-HOUSEHOLD: {}\r\n", h))
        .unwrap_or_default();
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age = 1800\r\n\
         EXT:\r\n\
         LOCATION: http://{}:1400/xml/device_description.xml\r\n\
         SERVER: Linux UPnP/1.0 Sonos/70.3-88200 (ZPS9)\r\n\
         ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
         USN: uuid:RINCON_000E58A0123401400::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
         X-RINCON-BOOTSEQ: 123\r\n\
         {}\r\n",
        ip, household_line
    )
}
