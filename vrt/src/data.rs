// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
IF Data packet encoding (ANSI/VITA-49.2-2017 section 5.1, packet type
0x1 "IF Data with Stream ID"). This is the hot path: every sample the
radio produces passes through [`encode_data`], so it writes directly
into a caller-supplied buffer rather than allocating.
*/

use crate::errors::VrtError;
use crate::header::{data_header_word, now_micros, timestamp_from_micros, STREAM_ID, TRAILER_VALID_DATA};
use crate::wire::{put_u16_be, put_u32_be, put_u64_be};

/// 20-byte header + 4-byte trailer; the payload in between is
/// `4 * n_samples` bytes (2x int16 per IQ pair), which is always a
/// multiple of 4, so a data packet never needs tail padding.
const HEADER_TRAILER_BYTES: usize = 24;

/// Encodes one IF Data packet from `n_samples` interleaved IQ pairs
/// into `dest`, returning the number of bytes written.
///
/// `iq` must hold at least `2 * n_samples` native-endianness `i16`
/// values (I, Q, I, Q, ...); only the first `2 * n_samples` are read.
/// `counter` is the mod-16 packet counter threaded across successive
/// data packets: it is read for this packet's header and then
/// incremented (wrapping 15 -> 0).
///
/// # Errors
/// Returns [`VrtError::NoSamples`] if `n_samples` is zero, or
/// [`VrtError::BufferTooSmall`] if `dest` cannot hold the encoded
/// packet.
pub fn encode_data(
    dest: &mut [u8],
    iq: &[i16],
    n_samples: usize,
    counter: &mut u8,
) -> Result<usize, VrtError> {
    if n_samples == 0 {
        return Err(VrtError::NoSamples);
    }
    let total_len = HEADER_TRAILER_BYTES + 4 * n_samples;
    if dest.len() < total_len {
        return Err(VrtError::BufferTooSmall {
            have: dest.len(),
            need: total_len,
        });
    }
    debug_assert!(iq.len() >= 2 * n_samples);

    let total_words = (total_len / 4) as u16;
    let (secs, frac_ps) = timestamp_from_micros(now_micros());

    put_u32_be(dest, 0, data_header_word(*counter, total_words));
    put_u32_be(dest, 4, STREAM_ID);
    put_u32_be(dest, 8, secs);
    put_u64_be(dest, 12, frac_ps);

    let payload = &mut dest[20..20 + 4 * n_samples];
    for (i, pair) in iq[..2 * n_samples].chunks_exact(2).enumerate() {
        put_u16_be(payload, i * 4, pair[0] as u16);
        put_u16_be(payload, i * 4 + 2, pair[1] as u16);
    }

    put_u32_be(dest, 20 + 4 * n_samples, TRAILER_VALID_DATA);

    *counter = (*counter + 1) % 16;
    Ok(total_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::packet_type;
    use crate::wire::{get_u32_be, get_u64_be};

    #[test]
    fn emits_exact_length_and_advances_counter() {
        let iq = [1i16, -1, 2, -2, 3, -3];
        let mut buf = [0u8; 64];
        let mut counter = 5u8;
        let len = encode_data(&mut buf, &iq, 3, &mut counter).unwrap();
        assert_eq!(len, 20 + 4 * 3 + 4);
        assert_eq!(counter, 6);
    }

    #[test]
    fn counter_wraps_at_16() {
        let iq = [0i16, 0];
        let mut buf = [0u8; 32];
        let mut counter = 15u8;
        encode_data(&mut buf, &iq, 1, &mut counter).unwrap();
        assert_eq!(counter, 0);
    }

    #[test]
    fn header_fields_are_well_formed() {
        let iq = [7i16, -7];
        let mut buf = [0u8; 32];
        let mut counter = 0u8;
        let len = encode_data(&mut buf, &iq, 1, &mut counter).unwrap();
        let header = get_u32_be(&buf, 0);
        assert_eq!(packet_type(header), 0x1);
        assert_eq!((header >> 26) & 1, 1, "trailer-present bit must be set");
        assert_eq!(get_u32_be(&buf, 4), STREAM_ID);
        assert_eq!(get_u32_be(&buf, len - 4), TRAILER_VALID_DATA);
    }

    #[test]
    fn byteswaps_each_sample_lane() {
        let iq = [0x1234i16, -1i16];
        let mut buf = [0u8; 32];
        let mut counter = 0u8;
        encode_data(&mut buf, &iq, 1, &mut counter).unwrap();
        assert_eq!(&buf[20..22], &0x1234u16.to_be_bytes());
        assert_eq!(&buf[22..24], &0xFFFFu16.to_be_bytes());
    }

    #[test]
    fn rejects_zero_samples() {
        let mut buf = [0u8; 32];
        let mut counter = 0u8;
        assert_eq!(
            encode_data(&mut buf, &[], 0, &mut counter),
            Err(VrtError::NoSamples)
        );
    }

    #[test]
    fn refuses_to_emit_into_a_too_small_buffer() {
        let iq = [0i16; 20];
        let mut buf = [0u8; 8];
        let mut counter = 0u8;
        let err = encode_data(&mut buf, &iq, 10, &mut counter).unwrap_err();
        assert!(matches!(err, VrtError::BufferTooSmall { .. }));
        assert_eq!(counter, 0, "a failed encode must not advance the counter");
    }

    #[test]
    fn packet_counter_sequence_has_no_skips() {
        let iq = [0i16, 0];
        let mut buf = [0u8; 32];
        let mut counter = 0u8;
        for expected in (0..32).map(|i| i % 16) {
            let header_counter_before = counter;
            assert_eq!(header_counter_before, expected);
            encode_data(&mut buf, &iq, 1, &mut counter).unwrap();
        }
    }

    #[test]
    fn timestamp_fraction_is_within_picosecond_range() {
        let iq = [0i16, 0];
        let mut buf = [0u8; 32];
        let mut counter = 0u8;
        encode_data(&mut buf, &iq, 1, &mut counter).unwrap();
        let frac_ps = get_u64_be(&buf, 12);
        assert!(frac_ps < 1_000_000_000_000, "fraction must be < 1 second of ps");
    }
}
