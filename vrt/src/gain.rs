// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Data structures and methods related to the gain format
(ANSI/VITA-49.2-2017 section 9.5.3).

"In RF equipment such as tuners and receivers, the total gain
of the equipment is typically distributed to allow tradeoffs
between noise power and linearity. For such equipment, Stage 1
Gain conveys the front-end or RF gain, and Stage 2 Gain conveys
the back-end or IF gain. For equipment that does not require gain
distribution, Stage 1 Gain provides the gain of the device, and
Stage 2 Gain is set to zero."

This streamer never distributes gain across two stages, so only
Stage 1 is ever written; Stage 2 is always encoded as zero.
*/

use fixed::{types::extra::U7, FixedI16};
use std::fmt;

/// Gain value, wire-encoded as two signed Q8.7 halves (stage 1, stage 2).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Gain {
    stage_1_raw: i16,
}

impl Gain {
    /// Create a new `Gain` from a single stage-1 value in dB. Stage 2
    /// is implicitly zero, matching single-stage front ends.
    pub fn from_db(stage_1_gain_db: f32) -> Gain {
        Gain {
            stage_1_raw: FixedI16::<U7>::from_num(stage_1_gain_db).to_bits(),
        }
    }

    /// Stage 1 gain in dB.
    pub fn stage_1_gain_db(&self) -> f32 {
        FixedI16::<U7>::from_bits(self.stage_1_raw).to_num()
    }

    /// Raw Q8.7 bits for stage 1, as written to the wire.
    pub fn stage_1_raw(&self) -> i16 {
        self.stage_1_raw
    }

    /// Builds a `Gain` from the raw Q8.7 bits read off the wire. The
    /// stage-2 half is ignored: this streamer only ever reads back its
    /// own single-stage encoding.
    pub fn from_raw(stage_1_raw: i16) -> Gain {
        Gain { stage_1_raw }
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dB", self.stage_1_gain_db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trips_through_q8_7() {
        let g = Gain::from_db(25.25);
        assert_relative_eq!(g.stage_1_gain_db(), 25.25, max_relative = 0.01);
    }

    #[test]
    fn raw_round_trip() {
        let g = Gain::from_db(-3.0);
        let back = Gain::from_raw(g.stage_1_raw());
        assert_eq!(g, back);
    }
}
