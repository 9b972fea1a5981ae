//! Local interface enumeration and round-robin selection.

use local_ip_address::list_afinet_netifas;
use std::net::{IpAddr, Ipv4Addr};

/// All non-loopback IPv4 addresses of this host, in OS order.
pub fn local_ipv4_interfaces() -> Vec<Ipv4Addr> {
    let interfaces = match list_afinet_netifas() {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("Failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    let mut addrs: Vec<Ipv4Addr> = Vec::new();
    for (name, addr) in interfaces {
        if let IpAddr::V4(ipv4) = addr {
            if ipv4.is_loopback() || addrs.contains(&ipv4) {
                continue;
            }
            tracing::debug!("Discovery interface {} ({})", name, ipv4);
            addrs.push(ipv4);
        }
    }
    addrs
}

/// Cycles through a fixed set of interface addresses.
#[derive(Debug, Clone)]
pub(crate) struct InterfaceCursor {
    interfaces: Vec<Ipv4Addr>,
    next: usize,
}

impl InterfaceCursor {
    pub(crate) fn new(interfaces: Vec<Ipv4Addr>) -> Self {
        Self { interfaces, next: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Returns the next interface, wrapping around. `None` when the set is empty.
    pub(crate) fn advance(&mut self) -> Option<Ipv4Addr> {
        if self.interfaces.is_empty() {
            return None;
        }
        let ip = self.interfaces[self.next % self.interfaces.len()];
        self.next = (self.next + 1) % self.interfaces.len();
        Some(ip)
    }
}
