// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Radio front-end facade: the boundary between this streamer and whatever
RF hardware (or simulation) is actually producing baseband IQ.
*/

use thiserror::Error;

use crate::config::RadioParams;

/// Default capture buffer size, in IQ sample pairs.
pub const DEFAULT_BUFFER_SIZE: usize = 16384;

/// A fault reported by the radio front end.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum FrontEndError {
    /// The requested parameters could not be applied; the front end is
    /// expected to still be running with its previous configuration.
    #[error("front end rejected reconfiguration: {reason}")]
    ReconfigureRejected {
        /// Hardware- or simulation-supplied reason string.
        reason: String,
    },
    /// A capture call failed to produce samples.
    #[error("capture failed: {reason}")]
    CaptureFailed {
        /// Hardware- or simulation-supplied reason string.
        reason: String,
    },
}

/// The operations the streaming and control tasks need from a radio
/// front end. Implementations own the actual RF hardware (or a
/// simulation of it) and must be safe to drive from a single capture
/// thread; reconfiguration calls arrive from that same thread, never
/// concurrently with a capture in progress.
pub trait FrontEnd: Send {
    /// Applies `params`, returning an error (and leaving the front end
    /// at its previous configuration) if they cannot be applied.
    fn configure(&mut self, params: &RadioParams) -> Result<(), FrontEndError>;

    /// Captures up to `iq.len() / 2` IQ sample pairs into `iq`
    /// (interleaved I, Q, i16 each), returning the number of pairs
    /// actually captured.
    fn capture(&mut self, iq: &mut [i16]) -> Result<usize, FrontEndError>;
}

/// A deterministic front end that synthesizes a complex sinusoid
/// instead of touching real hardware. Used as the default backend and
/// in tests; the tone's frequency tracks whatever center frequency is
/// currently configured so a receiver can visibly confirm a retune.
pub struct SimulatedFrontEnd {
    params: RadioParams,
    phase: f64,
}

impl SimulatedFrontEnd {
    /// Creates a simulated front end starting at `params`.
    pub fn new(params: RadioParams) -> SimulatedFrontEnd {
        SimulatedFrontEnd { params, phase: 0.0 }
    }
}

impl FrontEnd for SimulatedFrontEnd {
    fn configure(&mut self, params: &RadioParams) -> Result<(), FrontEndError> {
        self.params = *params;
        Ok(())
    }

    fn capture(&mut self, iq: &mut [i16]) -> Result<usize, FrontEndError> {
        let n_pairs = iq.len() / 2;
        if n_pairs == 0 {
            return Ok(0);
        }
        // One tenth of the sample rate, folded into the tone so a
        // retune is audible/visible without depending on the absolute
        // center frequency value.
        let tone_hz = (self.params.sample_rate_hz as f64) / 10.0;
        let step = std::f64::consts::TAU * tone_hz / self.params.sample_rate_hz as f64;
        for pair in 0..n_pairs {
            let i = (self.phase.cos() * i16::MAX as f64 * 0.5) as i16;
            let q = (self.phase.sin() * i16::MAX as f64 * 0.5) as i16;
            iq[2 * pair] = i;
            iq[2 * pair + 1] = q;
            self.phase += step;
        }
        self.phase %= std::f64::consts::TAU;
        Ok(n_pairs)
    }
}
