// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Error types/enumerations for the `vrt` crate.
*/

use thiserror::Error;

/// Generic `vrt` crate error enumeration.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum VrtError {
    /// Given when `encode_data` is asked to emit zero samples.
    #[error("data packets must carry at least one IQ sample")]
    NoSamples,
    /// Given when the caller-provided destination buffer is too small
    /// to hold the encoded packet.
    #[error("destination buffer of {have} bytes is too small for a {need}-byte packet")]
    BufferTooSmall {
        /// Bytes available in the destination buffer.
        have: usize,
        /// Bytes required to encode the packet.
        need: usize,
    },
    /// Given when a context packet is shorter than the minimum header
    /// plus CIF length.
    #[error("context packet of {len} bytes is shorter than the 28-byte minimum")]
    PacketTooShort {
        /// Length of the packet actually given.
        len: usize,
    },
    /// Given when the CIF declares a bit outside the set this crate
    /// understands (bandwidth, RF reference frequency, gain, sample
    /// rate, state/event indicators).
    #[error("context packet sets unsupported CIF bit {bit}")]
    UnsupportedCifBit {
        /// The offending bit index (0-31).
        bit: u32,
    },
}
