// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Statistics and health monitoring: running counters the control and
streaming tasks update, and the point-in-time snapshot the supervisor
logs periodically.
*/

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// A capture-loop iteration is flagged as a timestamp jump once the
/// gap between the expected and actual inter-refill interval exceeds
/// this, in microseconds.
pub const TIMESTAMP_JUMP_THRESHOLD_US: u64 = 10_000;

/// Running counters updated by the control and streaming tasks.
/// Each field is an independent atomic; callers reading a
/// [`StatsSnapshot`] may observe counters from slightly different
/// instants, which is acceptable for a health/telemetry readout.
pub struct Stats {
    packets_sent: AtomicU64,
    bytes_sent: AtomicU64,
    contexts_sent: AtomicU64,
    reconfigurations: AtomicU64,
    refill_failures: AtomicU64,
    send_failures: AtomicU64,
    underflows: AtomicU64,
    overflows: AtomicU64,
    timestamp_jumps: AtomicU64,
    subscriber_table_full: AtomicU64,
    overrange: AtomicBool,
    sample_loss: AtomicBool,
    last_sample_time_us: AtomicI64,
    loop_time_min_us: AtomicU64,
    loop_time_max_us: AtomicU64,
    loop_time_sum_us: AtomicU64,
    loop_time_count: AtomicU64,
}

/// Point-in-time readout of [`Stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub contexts_sent: u64,
    pub reconfigurations: u64,
    pub refill_failures: u64,
    pub send_failures: u64,
    pub underflows: u64,
    pub overflows: u64,
    pub timestamp_jumps: u64,
    pub subscriber_table_full: u64,
    pub last_sample_time_us: i64,
    pub loop_time_min_us: Option<u64>,
    pub loop_time_max_us: Option<u64>,
    pub loop_time_avg_us: Option<u64>,
}

impl Stats {
    /// Creates a zeroed counter set.
    pub fn new() -> Stats {
        Stats {
            packets_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            contexts_sent: AtomicU64::new(0),
            reconfigurations: AtomicU64::new(0),
            refill_failures: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            underflows: AtomicU64::new(0),
            overflows: AtomicU64::new(0),
            timestamp_jumps: AtomicU64::new(0),
            subscriber_table_full: AtomicU64::new(0),
            overrange: AtomicBool::new(false),
            sample_loss: AtomicBool::new(false),
            last_sample_time_us: AtomicI64::new(0),
            loop_time_min_us: AtomicU64::new(u64::MAX),
            loop_time_max_us: AtomicU64::new(0),
            loop_time_sum_us: AtomicU64::new(0),
            loop_time_count: AtomicU64::new(0),
        }
    }

    /// Records one emitted data packet of `bytes` wire-length.
    pub fn record_data_packet(&self, bytes: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Records one emitted context packet of `bytes` wire-length.
    pub fn record_context_packet(&self, bytes: usize) {
        self.contexts_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_reconfiguration(&self) {
        self.reconfigurations.fetch_add(1, Ordering::Relaxed);
    }

    /// A capture-buffer refill failed transiently; the streaming task
    /// backs off and retries.
    pub fn record_refill_failure(&self) {
        self.refill_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A UDP send to one subscriber failed; the subscriber is kept.
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// The subscriber table was full when an enrollment was attempted.
    pub fn record_subscriber_table_full(&self) {
        self.subscriber_table_full.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one capture-loop iteration's wall time and the
    /// wall-clock sample timestamp (µs since the Unix epoch) observed
    /// for it.
    pub fn record_loop_time(&self, loop_us: u64, sample_time_us: u64) {
        self.loop_time_sum_us.fetch_add(loop_us, Ordering::Relaxed);
        self.loop_time_count.fetch_add(1, Ordering::Relaxed);
        self.loop_time_min_us.fetch_min(loop_us, Ordering::Relaxed);
        self.loop_time_max_us.fetch_max(loop_us, Ordering::Relaxed);
        self.last_sample_time_us
            .store(sample_time_us as i64, Ordering::Relaxed);
    }

    /// Compares the actual inter-refill wall-clock delta against the
    /// interval `num_samples_this_refill * 1e6 / sample_rate` expects.
    /// `diff_us` is `actual - expected`: positive means samples arrived
    /// late (an underflow risk upstream), negative means early (an
    /// overflow, not expected in normal operation but still counted).
    /// A jump is only flagged once `|diff_us|` exceeds
    /// [`TIMESTAMP_JUMP_THRESHOLD_US`].
    pub fn record_timing_jump(&self, diff_us: i64) {
        if diff_us.unsigned_abs() <= TIMESTAMP_JUMP_THRESHOLD_US {
            return;
        }
        self.timestamp_jumps.fetch_add(1, Ordering::Relaxed);
        if diff_us > 0 {
            self.underflows.fetch_add(1, Ordering::Relaxed);
            self.sample_loss.store(true, Ordering::Relaxed);
        } else {
            self.overflows.fetch_add(1, Ordering::Relaxed);
            self.overrange.store(true, Ordering::Relaxed);
        }
    }

    /// Reads and clears the overrange flag, for the context packet's
    /// state/event indicators: an overflow (samples arriving earlier
    /// than the sample rate predicts) since the last context packet
    /// was emitted.
    pub fn take_overrange(&self) -> bool {
        self.overrange.swap(false, Ordering::Relaxed)
    }

    /// Reads and clears the sample-loss flag, for the context packet's
    /// state/event indicators: an underflow (samples arriving later
    /// than the sample rate predicts, i.e. a discontinuity) since the
    /// last context packet was emitted.
    pub fn take_sample_loss(&self) -> bool {
        self.sample_loss.swap(false, Ordering::Relaxed)
    }

    /// Takes a consistent-enough snapshot of all counters for logging.
    pub fn snapshot(&self) -> StatsSnapshot {
        let count = self.loop_time_count.load(Ordering::Relaxed);
        let (min, max, avg) = if count == 0 {
            (None, None, None)
        } else {
            let sum = self.loop_time_sum_us.load(Ordering::Relaxed);
            (
                Some(self.loop_time_min_us.load(Ordering::Relaxed)),
                Some(self.loop_time_max_us.load(Ordering::Relaxed)),
                Some(sum / count),
            )
        };
        StatsSnapshot {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            contexts_sent: self.contexts_sent.load(Ordering::Relaxed),
            reconfigurations: self.reconfigurations.load(Ordering::Relaxed),
            refill_failures: self.refill_failures.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            underflows: self.underflows.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            timestamp_jumps: self.timestamp_jumps.load(Ordering::Relaxed),
            subscriber_table_full: self.subscriber_table_full.load(Ordering::Relaxed),
            last_sample_time_us: self.last_sample_time_us.load(Ordering::Relaxed),
            loop_time_min_us: min,
            loop_time_max_us: max,
            loop_time_avg_us: avg,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = Stats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.packets_sent, 0);
        assert_eq!(snap.bytes_sent, 0);
        assert_eq!(snap.loop_time_min_us, None);
    }

    #[test]
    fn data_packets_increment_independently_of_context() {
        let stats = Stats::new();
        stats.record_data_packet(100);
        stats.record_data_packet(100);
        stats.record_context_packet(40);
        let snap = stats.snapshot();
        assert_eq!(snap.packets_sent, 2);
        assert_eq!(snap.contexts_sent, 1);
        assert_eq!(snap.bytes_sent, 240);
    }

    #[test]
    fn loop_time_tracks_min_max_avg() {
        let stats = Stats::new();
        stats.record_loop_time(100, 0);
        stats.record_loop_time(300, 0);
        let snap = stats.snapshot();
        assert_eq!(snap.loop_time_min_us, Some(100));
        assert_eq!(snap.loop_time_max_us, Some(300));
        assert_eq!(snap.loop_time_avg_us, Some(200));
    }

    #[test]
    fn late_samples_count_as_underflows() {
        let stats = Stats::new();
        stats.record_timing_jump((TIMESTAMP_JUMP_THRESHOLD_US + 1) as i64);
        let snap = stats.snapshot();
        assert_eq!(snap.timestamp_jumps, 1);
        assert_eq!(snap.underflows, 1);
        assert_eq!(snap.overflows, 0);
    }

    #[test]
    fn early_samples_count_as_overflows() {
        let stats = Stats::new();
        stats.record_timing_jump(-((TIMESTAMP_JUMP_THRESHOLD_US + 1) as i64));
        let snap = stats.snapshot();
        assert_eq!(snap.timestamp_jumps, 1);
        assert_eq!(snap.overflows, 1);
        assert_eq!(snap.underflows, 0);
    }

    #[test]
    fn small_deltas_do_not_trip_a_jump() {
        let stats = Stats::new();
        stats.record_timing_jump(10);
        assert_eq!(stats.snapshot().timestamp_jumps, 0);
    }

    #[test]
    fn overrange_and_sample_loss_latch_and_clear_on_read() {
        let stats = Stats::new();
        stats.record_timing_jump(-((TIMESTAMP_JUMP_THRESHOLD_US + 1) as i64));
        stats.record_timing_jump((TIMESTAMP_JUMP_THRESHOLD_US + 1) as i64);
        assert!(stats.take_overrange());
        assert!(stats.take_sample_loss());
        // Cleared by the read above.
        assert!(!stats.take_overrange());
        assert!(!stats.take_sample_loss());
    }

    #[test]
    fn refill_and_send_failures_are_independent_counters() {
        let stats = Stats::new();
        stats.record_refill_failure();
        stats.record_send_failure();
        stats.record_send_failure();
        let snap = stats.snapshot();
        assert_eq!(snap.refill_failures, 1);
        assert_eq!(snap.send_failures, 2);
    }
}
