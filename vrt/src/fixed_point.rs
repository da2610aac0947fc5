// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Q43.20 fixed-point conversions for the Hz-valued CIF fields (bandwidth,
RF reference frequency, sample rate; ANSI/VITA-49.2-2017 section 9.5.1).

A 64-bit intermediate is mandatory: the frequency range spans ~36 bits
after scaling by 2^20, which would overflow a 32-bit accumulator.
*/

use fixed::{types::extra::U20, FixedI64};

/// Converts a frequency in Hz to its Q43.20 wire representation.
pub fn hz_to_q43_20(hz: f64) -> i64 {
    FixedI64::<U20>::from_num(hz).to_bits()
}

/// Converts a Q43.20 wire value back to a frequency in Hz.
pub fn q43_20_to_hz(bits: i64) -> f64 {
    FixedI64::<U20>::from_bits(bits).to_num()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trips_6_ghz() {
        let hz = 6e9;
        let bits = hz_to_q43_20(hz);
        assert_relative_eq!(q43_20_to_hz(bits), hz, max_relative = 1e-9);
    }

    #[test]
    fn round_trips_low_end() {
        let hz = 70e6;
        let bits = hz_to_q43_20(hz);
        assert_relative_eq!(q43_20_to_hz(bits), hz, epsilon = 1.0);
    }
}
