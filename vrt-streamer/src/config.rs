// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Radio configuration store: a guarded snapshot of the current tuning
parameters plus a dirty flag the control task raises and the streaming
task clears once the front end has acknowledged the new values.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Default center frequency: 2.4 GHz.
pub const DEFAULT_FREQ_HZ: u64 = 2_400_000_000;
/// Default sample rate: 30 MS/s.
pub const DEFAULT_RATE_HZ: u32 = 30_000_000;
/// Default gain.
pub const DEFAULT_GAIN_DB: f32 = 20.0;

/// RF bandwidth is always derived from the sample rate, never set
/// independently.
fn bandwidth_for_rate(sample_rate_hz: u32) -> u32 {
    (sample_rate_hz as f64 * 0.8) as u32
}

/// A consistent snapshot of the radio's tuning parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadioParams {
    /// Center frequency, Hz.
    pub center_freq_hz: u64,
    /// Sample rate, Hz.
    pub sample_rate_hz: u32,
    /// RF bandwidth, Hz — always `0.8 * sample_rate_hz`.
    pub bandwidth_hz: u32,
    /// Gain, dB.
    pub gain_db: f32,
}

impl RadioParams {
    /// Builds a new parameter set, deriving bandwidth from the sample
    /// rate.
    pub fn new(center_freq_hz: u64, sample_rate_hz: u32, gain_db: f32) -> RadioParams {
        RadioParams {
            center_freq_hz,
            sample_rate_hz,
            bandwidth_hz: bandwidth_for_rate(sample_rate_hz),
            gain_db,
        }
    }
}

impl Default for RadioParams {
    fn default() -> Self {
        RadioParams::new(DEFAULT_FREQ_HZ, DEFAULT_RATE_HZ, DEFAULT_GAIN_DB)
    }
}

/// Guarded radio configuration with a change flag. Readers either take
/// an atomic [`RadioParams`] snapshot (the codec, when building a
/// context packet) or poll [`ConfigStore::is_dirty`] (the streaming
/// task, between capture cycles). No reader blocks a writer beyond the
/// short critical section of a field comparison and assignment.
pub struct ConfigStore {
    params: Mutex<RadioParams>,
    dirty: AtomicBool,
}

impl ConfigStore {
    /// Creates a store seeded with `initial` and a clear dirty flag.
    pub fn new(initial: RadioParams) -> ConfigStore {
        ConfigStore {
            params: Mutex::new(initial),
            dirty: AtomicBool::new(false),
        }
    }

    /// Takes a torn-read-free snapshot of the current parameters.
    pub fn snapshot(&self) -> RadioParams {
        *self.params.lock().unwrap()
    }

    /// Returns true if a write has changed the configuration since the
    /// last [`ConfigStore::clear_dirty`].
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clears the dirty flag. Called by the streaming task once the
    /// front end has been reconfigured to match.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    /// Applies any `Some` fields that differ from the current values,
    /// deriving bandwidth from the sample rate when it changes.
    /// Returns the snapshot from before the call and the one after, so
    /// callers can log a per-field delta; `before == after` iff no
    /// field actually changed, in which case the dirty flag is left
    /// untouched.
    pub fn apply(
        &self,
        freq_hz: Option<u64>,
        rate_hz: Option<u32>,
        gain_db: Option<f32>,
    ) -> (RadioParams, RadioParams) {
        let mut changed = false;
        let before;
        let after;
        {
            let mut params = self.params.lock().unwrap();
            before = *params;
            if let Some(freq) = freq_hz {
                if freq != params.center_freq_hz {
                    params.center_freq_hz = freq;
                    changed = true;
                }
            }
            if let Some(rate) = rate_hz {
                if rate != params.sample_rate_hz {
                    params.sample_rate_hz = rate;
                    params.bandwidth_hz = bandwidth_for_rate(rate);
                    changed = true;
                }
            }
            if let Some(gain) = gain_db {
                if (gain - params.gain_db).abs() > f32::EPSILON {
                    params.gain_db = gain;
                    changed = true;
                }
            }
            after = *params;
        }
        if changed {
            self.dirty.store(true, Ordering::Release);
        }
        (before, after)
    }

    /// Overwrites the stored parameters with `params` and clears the
    /// dirty flag. Used by the streaming task to roll the store back to
    /// the last front-end-confirmed configuration after a reconfigure
    /// attempt is rejected and the front end has been restored to
    /// `params`: without this, subscribers would keep receiving context
    /// packets advertising the rejected values the front end never
    /// actually applied.
    pub fn rollback_to(&self, params: RadioParams) {
        *self.params.lock().unwrap() = params;
        self.dirty.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandwidth_is_derived_from_rate() {
        let params = RadioParams::new(2_400_000_000, 10_000_000, 10.0);
        assert_eq!(params.bandwidth_hz, 8_000_000);
    }

    #[test]
    fn apply_raises_dirty_only_on_real_change() {
        let store = ConfigStore::new(RadioParams::default());
        assert!(!store.is_dirty());
        let (before, after) = store.apply(Some(DEFAULT_FREQ_HZ), None, None);
        assert_eq!(before, after);
        assert!(!store.is_dirty());

        let (before, after) = store.apply(Some(915_000_000), None, None);
        assert_ne!(before, after);
        assert!(store.is_dirty());
        assert_eq!(store.snapshot().center_freq_hz, 915_000_000);
    }

    #[test]
    fn rate_change_recomputes_bandwidth() {
        let store = ConfigStore::new(RadioParams::default());
        store.apply(None, Some(20_000_000), None);
        assert_eq!(store.snapshot().bandwidth_hz, 16_000_000);
    }

    #[test]
    fn duplicate_application_does_not_re_dirty() {
        let store = ConfigStore::new(RadioParams::default());
        store.apply(Some(915_000_000), None, None);
        store.clear_dirty();
        let (before, after) = store.apply(Some(915_000_000), None, None);
        assert_eq!(before, after);
        assert!(!store.is_dirty());
    }

    #[test]
    fn rollback_to_restores_a_prior_value_and_clears_dirty() {
        let store = ConfigStore::new(RadioParams::default());
        let known_good = store.snapshot();
        store.apply(Some(915_000_000), None, None);
        assert!(store.is_dirty());

        store.rollback_to(known_good);
        assert_eq!(store.snapshot(), known_good);
        assert!(!store.is_dirty());
    }
}
