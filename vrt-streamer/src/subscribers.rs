// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Subscriber registry: the set of UDP endpoints currently receiving the
data and context streams.
*/

use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;

use log::warn;

use crate::stats::Stats;

/// Maximum number of simultaneously enrolled subscribers.
pub const MAX_SUBSCRIBERS: usize = 16;

/// Registry is at capacity and cannot accept a new subscriber.
#[derive(Debug, Eq, PartialEq)]
pub struct RegistryFull;

/// Tracks the endpoints enrolled to receive VRT datagrams. Enrollment
/// is idempotent: re-enrolling an address already present is a no-op,
/// not an error, so a subscriber that resends its enrollment request
/// (e.g. after a timeout on its end) never trips the capacity limit.
pub struct SubscriberRegistry {
    endpoints: Mutex<Vec<SocketAddr>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> SubscriberRegistry {
        SubscriberRegistry {
            endpoints: Mutex::new(Vec::with_capacity(MAX_SUBSCRIBERS)),
        }
    }

    /// Enrolls `addr`, unless it is already present or the registry is
    /// full.
    pub fn enroll(&self, addr: SocketAddr) -> Result<(), RegistryFull> {
        let mut endpoints = self.endpoints.lock().unwrap();
        if endpoints.contains(&addr) {
            return Ok(());
        }
        if endpoints.len() >= MAX_SUBSCRIBERS {
            return Err(RegistryFull);
        }
        endpoints.push(addr);
        Ok(())
    }

    /// Number of currently enrolled subscribers.
    pub fn len(&self) -> usize {
        self.endpoints.lock().unwrap().len()
    }

    /// True if no subscribers are enrolled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends `datagram` to every enrolled endpoint over `socket`. Holds
    /// the lock for the full broadcast so enrollment changes can't
    /// interleave with a half-sent fan-out; a send failure to one
    /// endpoint is logged, incremented in `stats`, and does not prevent
    /// delivery to the rest.
    pub fn broadcast(&self, socket: &UdpSocket, datagram: &[u8], stats: &Stats) {
        let endpoints = self.endpoints.lock().unwrap();
        for addr in endpoints.iter() {
            if let Err(e) = socket.send_to(datagram, addr) {
                warn!("send to subscriber {addr} failed: {e}");
                stats.record_send_failure();
            }
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        SubscriberRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn enrollment_is_idempotent() {
        let registry = SubscriberRegistry::new();
        assert!(registry.enroll(addr(5000)).is_ok());
        assert!(registry.enroll(addr(5000)).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn enrollment_is_capped() {
        let registry = SubscriberRegistry::new();
        for port in 0..MAX_SUBSCRIBERS as u16 {
            registry.enroll(addr(6000 + port)).unwrap();
        }
        assert_eq!(registry.len(), MAX_SUBSCRIBERS);
        assert_eq!(registry.enroll(addr(7000)), Err(RegistryFull));
        assert_eq!(registry.len(), MAX_SUBSCRIBERS);
    }

    #[test]
    fn distinct_addresses_all_enroll() {
        let registry = SubscriberRegistry::new();
        registry.enroll(addr(5001)).unwrap();
        registry.enroll(addr(5002)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn broadcast_delivers_to_every_subscriber() {
        let registry = SubscriberRegistry::new();
        let stats = Stats::new();
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        a.set_read_timeout(Some(std::time::Duration::from_millis(200)))
            .unwrap();
        b.set_read_timeout(Some(std::time::Duration::from_millis(200)))
            .unwrap();
        registry.enroll(a.local_addr().unwrap()).unwrap();
        registry.enroll(b.local_addr().unwrap()).unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        registry.broadcast(&sender, b"hello", &stats);

        let mut buf = [0u8; 16];
        assert_eq!(a.recv_from(&mut buf).unwrap().0, 5);
        assert_eq!(b.recv_from(&mut buf).unwrap().0, 5);
        assert_eq!(stats.snapshot().send_failures, 0);
    }
}
