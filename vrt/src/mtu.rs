// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Computes the number of IQ samples that fit in one VRT data packet for a
given link MTU.
*/

/// IPv4 + UDP header overhead, in bytes.
const IP_UDP_OVERHEAD: usize = 28;
/// VRT data packet header (20 bytes) + trailer (4 bytes) overhead.
const VRT_HEADER_TRAILER: usize = 24;
/// Bytes per IQ pair (2x int16).
const BYTES_PER_IQ_PAIR: usize = 4;

/// Standard Ethernet MTU.
pub const MTU_STANDARD: usize = 1500;
/// Jumbo frame MTU.
pub const MTU_JUMBO: usize = 9000;

/// Computes `samples_per_packet` for a given link MTU `m`, per
/// `floor((m - 28 - 24) / 4)` rounded down to the nearest even number.
///
/// The result is meant to be computed once at startup and held for the
/// process lifetime; the MTU does not change at runtime.
pub fn samples_per_packet(mtu: usize) -> usize {
    let raw = (mtu.saturating_sub(IP_UDP_OVERHEAD + VRT_HEADER_TRAILER)) / BYTES_PER_IQ_PAIR;
    raw & !1
}

/// Returns the UDP datagram size a data packet carrying
/// `samples_per_packet` IQ samples would occupy, for warning purposes
/// when it would exceed the link MTU (IP fragmentation is acceptable;
/// this is advisory only).
pub fn datagram_size(samples: usize) -> usize {
    IP_UDP_OVERHEAD + VRT_HEADER_TRAILER + samples * BYTES_PER_IQ_PAIR
}
