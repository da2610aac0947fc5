// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Streaming task: captures IQ from the front end, packetizes it, and fans
it out to subscribers, reconfiguring the front end whenever the
configuration store goes dirty.
*/

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{error, warn};
use vrt::prelude::*;

use crate::config::{ConfigStore, RadioParams};
use crate::frontend::{FrontEnd, FrontEndError, DEFAULT_BUFFER_SIZE};
use crate::stats::Stats;
use crate::subscribers::SubscriberRegistry;

/// A context packet is re-emitted after this many data packets.
pub const CONTEXT_CADENCE: u32 = 100;
/// Interval at which the dirty flag is polled while running.
const DIRTY_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Back-off after a transient refill failure.
const REFILL_BACKOFF: Duration = Duration::from_millis(1);

/// Current host wall-clock time in microseconds since the Unix epoch,
/// used for the statistics record's last-observed sample time.
fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

/// The streaming task's three logical states.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum State {
    Running,
    Reconfiguring,
    Stopped,
}

/// Runs the capture/packetize/fan-out loop until `stop` is set or a
/// fatal condition forces [`State::Stopped`]. `socket` is the data
/// socket the streaming task exclusively owns.
pub fn run(
    socket: &UdpSocket,
    front_end: &mut dyn FrontEnd,
    config: &ConfigStore,
    subscribers: &SubscriberRegistry,
    stats: &Stats,
    samples_per_packet: usize,
    stop: &Arc<AtomicBool>,
) {
    let mut state = State::Running;
    let mut counter = 0u8;
    let mut packets_since_context = 0u32;
    let mut iq_buf = vec![0i16; 2 * DEFAULT_BUFFER_SIZE];
    let mut data_buf = vec![0u8; 20 + 4 * samples_per_packet + 4];
    let mut ctx_buf = vec![0u8; 64];
    let mut last_dirty_poll = Instant::now();
    let mut last_sample_instant: Option<Instant> = None;
    // The last configuration the front end actually confirmed, as
    // opposed to `config.snapshot()`, which may already hold a
    // requested-but-not-yet-applied (or rejected) value. Reconfigure
    // failures restore the front end to this, not to whatever the
    // config store currently holds.
    let mut last_applied: RadioParams = config.snapshot();

    while !stop.load(Ordering::Acquire) && state != State::Stopped {
        match state {
            State::Running => {
                if last_dirty_poll.elapsed() >= DIRTY_POLL_INTERVAL {
                    last_dirty_poll = Instant::now();
                    if config.is_dirty() {
                        state = State::Reconfiguring;
                        continue;
                    }
                }

                let loop_start = Instant::now();
                let n = match front_end.capture(&mut iq_buf) {
                    Ok(n) => n,
                    Err(e) => {
                        warn!("capture failed, backing off: {e}");
                        stats.record_refill_failure();
                        thread::sleep(REFILL_BACKOFF);
                        continue;
                    }
                };
                if n == 0 {
                    thread::sleep(REFILL_BACKOFF);
                    continue;
                }

                let sample_rate_hz = config.snapshot().sample_rate_hz.max(1);
                if let Some(prev) = last_sample_instant {
                    let actual_us = loop_start.duration_since(prev).as_micros() as u64;
                    let expected_us = (n as u64) * 1_000_000 / sample_rate_hz as u64;
                    let diff_us = actual_us as i64 - expected_us as i64;
                    stats.record_timing_jump(diff_us);
                }
                last_sample_instant = Some(loop_start);

                if packets_since_context >= CONTEXT_CADENCE {
                    emit_context(&mut ctx_buf, config, socket, subscribers, stats);
                    packets_since_context = 0;
                }

                emit_data_chunks(
                    &iq_buf[..2 * n],
                    n,
                    samples_per_packet,
                    &mut data_buf,
                    &mut counter,
                    socket,
                    subscribers,
                    stats,
                );
                packets_since_context += ((n + samples_per_packet - 1) / samples_per_packet) as u32;

                stats.record_loop_time(loop_start.elapsed().as_micros() as u64, now_micros());
            }
            State::Reconfiguring => {
                let requested = config.snapshot();
                match front_end.configure(&requested) {
                    Ok(()) => {
                        last_applied = requested;
                        emit_context(&mut ctx_buf, config, socket, subscribers, stats);
                        config.clear_dirty();
                        packets_since_context = 0;
                        state = State::Running;
                    }
                    Err(e) => {
                        error!("front end rejected reconfiguration, restoring previous state: {e}");
                        if let Err(restore_err) = restore_previous(front_end, &last_applied) {
                            error!("failed to restore previous configuration: {restore_err}");
                            state = State::Stopped;
                        } else {
                            // The request was rejected and the front end
                            // is back on `last_applied`; roll the config
                            // store back to it too, so readers (context
                            // encoding, the next dirty poll) stop seeing
                            // the rejected values, and clear dirty so this
                            // known-bad request isn't retried forever.
                            config.rollback_to(last_applied);
                            state = State::Running;
                        }
                    }
                }
            }
            State::Stopped => unreachable!(),
        }
    }

    if state == State::Stopped {
        error!("streaming task stopped after an unrecoverable front-end failure");
    }
}

fn restore_previous(
    front_end: &mut dyn FrontEnd,
    last_applied: &RadioParams,
) -> Result<(), FrontEndError> {
    front_end.configure(last_applied)
}

fn emit_context(
    ctx_buf: &mut [u8],
    config: &ConfigStore,
    socket: &UdpSocket,
    subscribers: &SubscriberRegistry,
    stats: &Stats,
) {
    let params = config.snapshot();
    let fields = ContextFields {
        bandwidth_hz: Some(params.bandwidth_hz as f64),
        rf_ref_freq_hz: Some(params.center_freq_hz as f64),
        gain: Some(Gain::from_db(params.gain_db)),
        sample_rate_hz: Some(params.sample_rate_hz as f64),
        state: Some(StateIndicators {
            calibrated_time: true,
            overrange: stats.take_overrange(),
            sample_loss: stats.take_sample_loss(),
        }),
    };
    match encode_context(ctx_buf, &fields) {
        Ok(len) => {
            subscribers.broadcast(socket, &ctx_buf[..len], stats);
            stats.record_context_packet(len);
        }
        Err(e) => error!("failed to encode context packet: {e}"),
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_data_chunks(
    iq: &[i16],
    n_samples: usize,
    samples_per_packet: usize,
    data_buf: &mut [u8],
    counter: &mut u8,
    socket: &UdpSocket,
    subscribers: &SubscriberRegistry,
    stats: &Stats,
) {
    if samples_per_packet == 0 {
        return;
    }
    let mut offset = 0;
    while offset < n_samples {
        let chunk = (n_samples - offset).min(samples_per_packet);
        let iq_chunk = &iq[2 * offset..2 * (offset + chunk)];
        match encode_data(data_buf, iq_chunk, chunk, counter) {
            Ok(len) => {
                subscribers.broadcast(socket, &data_buf[..len], stats);
                stats.record_data_packet(len);
            }
            Err(e) => error!("failed to encode data packet: {e}"),
        }
        offset += chunk;
    }
}
