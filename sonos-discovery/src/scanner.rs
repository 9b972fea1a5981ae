//! Continuous SSDP scanner
//!
//! A background task probes the multicast group on a fixed cadence and
//! periodically moves its socket to the next local interface. Sending and
//! receiving go through the [`ProbeSocket`] / [`SocketBinder`] seam so the
//! timing behaviour can be driven without a network.

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

use crate::error::{DiscoveryError, Result};
use crate::interfaces::{local_ipv4_interfaces, InterfaceCursor};
use crate::ssdp::{build_msearch, parse_ssdp_response};
use crate::DiscoveryResult;

const SSDP_TARGET: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900));
const RECV_BUFFER_SIZE: usize = 2048;

/// Scanner timing and socket options.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Delay between two M-SEARCH probes (first probe is sent immediately)
    pub send_interval: Duration,
    /// Delay between two interface rebinds
    pub rebind_interval: Duration,
    /// Multicast TTL of outgoing probes
    pub multicast_ttl: u32,
    /// Interfaces to rotate through; `None` enumerates the host's interfaces
    pub interfaces: Option<Vec<Ipv4Addr>>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_secs(1),
            rebind_interval: Duration::from_secs(5),
            multicast_ttl: 2,
            interfaces: None,
        }
    }
}

/// A datagram socket the scanner probes through.
#[async_trait]
pub trait ProbeSocket: Send + Sync {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize>;
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

/// Creates probe sockets bound to a given interface.
pub trait SocketBinder: Send + Sync + 'static {
    /// Bind a fresh socket. `None` binds to the wildcard address.
    fn bind(&self, interface: Option<Ipv4Addr>, multicast_ttl: u32) -> Result<Box<dyn ProbeSocket>>;
}

#[async_trait]
impl ProbeSocket for UdpSocket {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, payload, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }
}

/// Binds real UDP sockets configured for SSDP multicast.
#[derive(Debug, Default, Clone, Copy)]
pub struct MulticastBinder;

impl SocketBinder for MulticastBinder {
    fn bind(&self, interface: Option<Ipv4Addr>, multicast_ttl: u32) -> Result<Box<dyn ProbeSocket>> {
        let network = |e: io::Error| DiscoveryError::NetworkError(e.to_string());

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(network)?;
        socket.set_broadcast(true).map_err(network)?;
        socket.set_multicast_ttl_v4(multicast_ttl).map_err(network)?;
        if let Some(ip) = interface {
            if let Err(e) = socket.set_multicast_if_v4(&ip) {
                tracing::debug!("Could not pin multicast interface {}: {}", ip, e);
            }
        }
        socket.set_nonblocking(true).map_err(network)?;

        let local = SocketAddr::new(IpAddr::V4(interface.unwrap_or(Ipv4Addr::UNSPECIFIED)), 0);
        socket.bind(&local.into()).map_err(network)?;

        let socket = UdpSocket::from_std(socket.into()).map_err(network)?;
        Ok(Box::new(socket))
    }
}

/// Handle to a running scan loop.
///
/// Dropping the handle stops the scan.
pub struct Scanner {
    task: Option<JoinHandle<()>>,
}

impl Scanner {
    /// Start scanning with real multicast sockets.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: ScannerConfig, results: mpsc::UnboundedSender<DiscoveryResult>) -> Self {
        Self::start_with_binder(config, Arc::new(MulticastBinder), results)
    }

    /// Start scanning through a custom socket binder.
    pub fn start_with_binder(
        config: ScannerConfig,
        binder: Arc<dyn SocketBinder>,
        results: mpsc::UnboundedSender<DiscoveryResult>,
    ) -> Self {
        let task = tokio::spawn(scan_loop(config, binder, results));
        Self { task: Some(task) }
    }

    /// Stop scanning and release the socket. Calling this twice is harmless.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("SSDP scanner stopped");
        }
    }

    /// Whether the scan loop is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn bind_next(
    binder: &dyn SocketBinder,
    cursor: &mut InterfaceCursor,
    ttl: u32,
) -> Option<Box<dyn ProbeSocket>> {
    let interface = cursor.advance();
    match binder.bind(interface, ttl) {
        Ok(socket) => {
            tracing::debug!("SSDP socket bound to {:?}", interface);
            Some(socket)
        }
        Err(e) => {
            tracing::warn!("Failed to bind SSDP socket on {:?}: {}", interface, e);
            None
        }
    }
}

async fn recv_on(
    socket: &Option<Box<dyn ProbeSocket>>,
    buf: &mut [u8],
) -> io::Result<(usize, SocketAddr)> {
    match socket {
        Some(socket) => socket.recv_from(buf).await,
        None => std::future::pending().await,
    }
}

async fn scan_loop(
    config: ScannerConfig,
    binder: Arc<dyn SocketBinder>,
    results: mpsc::UnboundedSender<DiscoveryResult>,
) {
    let interfaces = config.interfaces.clone().unwrap_or_else(local_ipv4_interfaces);
    let mut cursor = InterfaceCursor::new(interfaces);
    let mut socket = bind_next(binder.as_ref(), &mut cursor, config.multicast_ttl);

    let msearch = build_msearch();
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    let mut send_timer = interval(config.send_interval);
    send_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut rebind_timer = interval_at(Instant::now() + config.rebind_interval, config.rebind_interval);
    rebind_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("SSDP scanner started ({} interfaces)", cursor.len());

    loop {
        let rotate = cursor.len() > 1 || socket.is_none();

        tokio::select! {
            _ = send_timer.tick() => {
                if let Some(socket) = &socket {
                    if let Err(e) = socket.send_to(msearch.as_bytes(), SSDP_TARGET).await {
                        tracing::debug!("M-SEARCH send failed: {}", e);
                    }
                }
            }
            _ = rebind_timer.tick(), if rotate => {
                drop(socket.take());
                socket = bind_next(binder.as_ref(), &mut cursor, config.multicast_ttl);
            }
            received = recv_on(&socket, &mut buf) => {
                match received {
                    Ok((len, from)) => {
                        let text = String::from_utf8_lossy(&buf[..len]);
                        if let Some(found) = parse_ssdp_response(&text, from.ip()) {
                            tracing::trace!("SSDP response from {}: {}", from, found.location);
                            if results.send(found).is_err() {
                                tracing::debug!("Discovery receiver dropped, stopping scanner");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("SSDP receive failed, waiting for rebind: {}", e);
                        socket = None;
                    }
                }
            }
        }
    }
}
