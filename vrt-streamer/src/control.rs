// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Control task: listens for context packets on the reconfiguration port
and enrolls their senders as data/context subscribers.
*/

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use vrt::prelude::*;

use crate::config::ConfigStore;
use crate::stats::Stats;
use crate::subscribers::SubscriberRegistry;

/// Port the control task binds to, receiving reconfiguration requests.
pub const CONTROL_PORT: u16 = 4990;
/// Destination port every enrolled subscriber is assumed to listen on.
pub const SUBSCRIBER_PORT: u16 = 4991;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
const RECV_BUF_LEN: usize = 1500;

/// Runs the control loop until `stop` is set. `socket` must already be
/// bound to [`CONTROL_PORT`] with a receive timeout set by the caller
/// (kept as a parameter so tests can bind an ephemeral port instead).
pub fn run(
    socket: &UdpSocket,
    config: &ConfigStore,
    subscribers: &SubscriberRegistry,
    stats: &Stats,
    stop: &Arc<AtomicBool>,
) {
    socket
        .set_read_timeout(Some(RECV_TIMEOUT))
        .expect("control socket must support a read timeout");

    let mut buf = [0u8; RECV_BUF_LEN];
    while !stop.load(Ordering::Acquire) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if would_block(&e) => continue,
            Err(e) => {
                warn!("control socket receive error: {e}");
                continue;
            }
        };

        // Counted on receipt regardless of parse outcome: preserves
        // the reconfiguration-attempt semantics this streamer was
        // modeled on.
        stats.record_reconfiguration();

        match decode_context(&buf[..len]) {
            Ok(fields) => handle_context(fields, config),
            Err(e) => warn!("malformed context packet from {src}: {e}"),
        }

        enroll(src, subscribers, stats);
    }
    debug!("control task exiting");
}

fn handle_context(fields: ContextFields, config: &ConfigStore) {
    let freq_hz = fields.rf_ref_freq_hz.map(|hz| hz.round() as u64);
    let rate_hz = fields.sample_rate_hz.map(|hz| hz.round() as u32);
    let gain_db = fields.gain.map(|g| g.stage_1_gain_db());
    let (before, after) = config.apply(freq_hz, rate_hz, gain_db);
    if before == after {
        debug!("context request matched the current configuration, no change");
        return;
    }
    if before.center_freq_hz != after.center_freq_hz {
        info!(
            "frequency: {:.3} MHz -> {:.3} MHz",
            before.center_freq_hz as f64 / 1e6,
            after.center_freq_hz as f64 / 1e6
        );
    }
    if before.sample_rate_hz != after.sample_rate_hz {
        info!(
            "sample rate: {:.3} MSPS -> {:.3} MSPS",
            before.sample_rate_hz as f64 / 1e6,
            after.sample_rate_hz as f64 / 1e6
        );
    }
    if (before.gain_db - after.gain_db).abs() > f32::EPSILON {
        info!("gain: {:.1} dB -> {:.1} dB", before.gain_db, after.gain_db);
    }
}

fn enroll(src: SocketAddr, subscribers: &SubscriberRegistry, stats: &Stats) {
    let endpoint = SocketAddr::new(src.ip(), SUBSCRIBER_PORT);
    match subscribers.enroll(endpoint) {
        Ok(()) => info!("subscriber {endpoint} enrolled (total: {})", subscribers.len()),
        Err(_) => {
            warn!("subscriber table full, dropping enrollment from {endpoint}");
            stats.record_subscriber_table_full();
        }
    }
}

fn would_block(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadioParams;
    use approx::assert_relative_eq;

    #[test]
    fn handle_context_applies_only_present_fields() {
        let config = ConfigStore::new(RadioParams::default());
        let fields = ContextFields {
            bandwidth_hz: None,
            rf_ref_freq_hz: Some(100e6),
            gain: None,
            sample_rate_hz: None,
            state: None,
        };
        handle_context(fields, &config);
        assert_eq!(config.snapshot().center_freq_hz, 100_000_000);
        assert!(config.is_dirty());
    }

    #[test]
    fn handle_context_applies_a_gain_change_within_q8_7_quantization() {
        let config = ConfigStore::new(RadioParams::default());
        let fields = ContextFields {
            bandwidth_hz: None,
            rf_ref_freq_hz: None,
            gain: Some(Gain::from_db(12.5)),
            sample_rate_hz: None,
            state: None,
        };
        handle_context(fields, &config);
        assert_relative_eq!(config.snapshot().gain_db, 12.5, max_relative = 0.01);
    }

    #[test]
    fn enroll_derives_subscriber_port_from_source_address() {
        let subscribers = SubscriberRegistry::new();
        let stats = Stats::new();
        let src: SocketAddr = "10.0.0.2:55555".parse().unwrap();
        enroll(src, &subscribers, &stats);
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn enroll_past_capacity_counts_a_table_full() {
        let subscribers = SubscriberRegistry::new();
        let stats = Stats::new();
        for port in 0..crate::subscribers::MAX_SUBSCRIBERS as u16 {
            let src: SocketAddr = format!("10.0.0.{}:1", port + 1).parse().unwrap();
            enroll(src, &subscribers, &stats);
        }
        let overflow: SocketAddr = "10.0.1.1:1".parse().unwrap();
        enroll(overflow, &subscribers, &stats);
        assert_eq!(stats.snapshot().subscriber_table_full, 1);
    }
}
