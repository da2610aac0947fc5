// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Context packet payload (ANSI/VITA-49.2-2017 section 9). Only the
Context Indicator Field (CIF0) bits this streamer actually uses are
understood: bandwidth, RF reference frequency, gain, sample rate, and
the state/event indicators word.

Fields are emitted and parsed in strictly descending CIF bit order —
29, 27, 23, 21, 19 — per the VITA-49 spec. Misordering encoder and
decoder against each other produces silent data corruption on the wire,
so the bit order is centralized in [`CIF_BIT_ORDER`] and walked
identically by both directions.
*/

use crate::errors::VrtError;
use crate::fixed_point::{hz_to_q43_20, q43_20_to_hz};
use crate::gain::Gain;
use crate::header::{context_header_word, now_micros, timestamp_from_micros, STREAM_ID};
use crate::wire::{get_u32_be, get_u64_be, put_u16_be, put_u32_be, put_u64_be};

const CIF_BANDWIDTH: u32 = 1 << 29;
const CIF_RF_REF_FREQ: u32 = 1 << 27;
const CIF_GAIN: u32 = 1 << 23;
const CIF_SAMPLE_RATE: u32 = 1 << 21;
const CIF_STATE: u32 = 1 << 19;

const KNOWN_CIF_MASK: u32 =
    CIF_BANDWIDTH | CIF_RF_REF_FREQ | CIF_GAIN | CIF_SAMPLE_RATE | CIF_STATE;

/// CIF bits in the descending order fields must be read/written, paired
/// with their wire width in bytes.
const CIF_BIT_ORDER: [(u32, usize); 5] = [
    (CIF_BANDWIDTH, 8),
    (CIF_RF_REF_FREQ, 8),
    (CIF_GAIN, 4),
    (CIF_SAMPLE_RATE, 8),
    (CIF_STATE, 4),
];

/// 20-byte header plus the 4-byte CIF word; fields begin immediately
/// after this, at byte 24, per spec.
const HEADER_AND_CIF_LEN: usize = 24;

/// Minimum length a context packet must pass before its CIF is even
/// read, matching the original decoder's `len < 28` guard. Kept as its
/// own constant rather than derived from [`HEADER_AND_CIF_LEN`]: it is
/// a length-validation threshold, not the field cursor's start offset.
const MIN_CONTEXT_LEN: usize = 28;

/// State/event indicator bits (CIF bit 19's field contents).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct StateIndicators {
    /// Bit 31: the radio's time base is calibrated.
    pub calibrated_time: bool,
    /// Bit 19: an over-range condition was detected.
    pub overrange: bool,
    /// Bit 18: samples were lost (discontinuity).
    pub sample_loss: bool,
}

impl StateIndicators {
    fn to_word(self) -> u32 {
        let mut word = 0u32;
        if self.calibrated_time {
            word |= 1 << 31;
        }
        if self.overrange {
            word |= 1 << 19;
        }
        if self.sample_loss {
            word |= 1 << 18;
        }
        word
    }

    fn from_word(word: u32) -> StateIndicators {
        StateIndicators {
            calibrated_time: word & (1 << 31) != 0,
            overrange: word & (1 << 19) != 0,
            sample_loss: word & (1 << 18) != 0,
        }
    }
}

/// The set of context fields this crate knows how to encode or decode.
/// Any field left `None` is simply absent from the wire packet; the
/// caller overlays whatever comes back onto its own configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContextFields {
    /// RF bandwidth, Hz.
    pub bandwidth_hz: Option<f64>,
    /// RF reference (center) frequency, Hz.
    pub rf_ref_freq_hz: Option<f64>,
    /// Receiver gain.
    pub gain: Option<Gain>,
    /// Sample rate, Hz.
    pub sample_rate_hz: Option<f64>,
    /// State/event indicator bits.
    pub state: Option<StateIndicators>,
}

/// Encodes a context packet into `dest`, returning the number of bytes
/// written. Only the fields set to `Some` in `fields` are emitted, in
/// descending CIF bit order.
///
/// # Errors
/// Returns [`VrtError::BufferTooSmall`] if `dest` cannot hold the
/// encoded packet.
pub fn encode_context(dest: &mut [u8], fields: &ContextFields) -> Result<usize, VrtError> {
    let mut cif = 0u32;
    if fields.bandwidth_hz.is_some() {
        cif |= CIF_BANDWIDTH;
    }
    if fields.rf_ref_freq_hz.is_some() {
        cif |= CIF_RF_REF_FREQ;
    }
    if fields.gain.is_some() {
        cif |= CIF_GAIN;
    }
    if fields.sample_rate_hz.is_some() {
        cif |= CIF_SAMPLE_RATE;
    }
    if fields.state.is_some() {
        cif |= CIF_STATE;
    }

    let payload_bytes: usize = CIF_BIT_ORDER
        .iter()
        .filter(|(bit, _)| cif & bit != 0)
        .map(|(_, width)| *width)
        .sum();
    let total_len = HEADER_AND_CIF_LEN + payload_bytes;
    if dest.len() < total_len {
        return Err(VrtError::BufferTooSmall {
            have: dest.len(),
            need: total_len,
        });
    }
    let total_words = (total_len / 4) as u16;

    let (secs, frac_ps) = timestamp_from_micros(now_micros());
    put_u32_be(dest, 0, context_header_word(total_words));
    put_u32_be(dest, 4, STREAM_ID);
    put_u32_be(dest, 8, secs);
    put_u64_be(dest, 12, frac_ps);
    put_u32_be(dest, 20, cif);

    let mut off = HEADER_AND_CIF_LEN;
    if let Some(bw) = fields.bandwidth_hz {
        put_u64_be(dest, off, hz_to_q43_20(bw) as u64);
        off += 8;
    }
    if let Some(freq) = fields.rf_ref_freq_hz {
        put_u64_be(dest, off, hz_to_q43_20(freq) as u64);
        off += 8;
    }
    if let Some(gain) = fields.gain {
        put_u16_be(dest, off, gain.stage_1_raw() as u16);
        put_u16_be(dest, off + 2, 0);
        off += 4;
    }
    if let Some(rate) = fields.sample_rate_hz {
        put_u64_be(dest, off, hz_to_q43_20(rate) as u64);
        off += 8;
    }
    if let Some(state) = fields.state {
        put_u32_be(dest, off, state.to_word());
        off += 4;
    }

    debug_assert_eq!(off, total_len);
    Ok(off)
}

/// Decodes a context packet's CIF-described fields from `src`.
///
/// # Errors
/// Returns [`VrtError::PacketTooShort`] if `src` is shorter than the
/// 28-byte header+CIF minimum, or shorter than the fields the CIF
/// declares. Returns [`VrtError::UnsupportedCifBit`] if the CIF sets a
/// bit outside the set this crate understands.
pub fn decode_context(src: &[u8]) -> Result<ContextFields, VrtError> {
    if src.len() < MIN_CONTEXT_LEN {
        return Err(VrtError::PacketTooShort { len: src.len() });
    }
    let cif = get_u32_be(src, 20);
    if cif & !KNOWN_CIF_MASK != 0 {
        let unknown = cif & !KNOWN_CIF_MASK;
        return Err(VrtError::UnsupportedCifBit {
            bit: 31 - unknown.leading_zeros(),
        });
    }

    let mut fields = ContextFields::default();
    let mut off = HEADER_AND_CIF_LEN;
    for (bit, width) in CIF_BIT_ORDER {
        if cif & bit == 0 {
            continue;
        }
        if src.len() < off + width {
            return Err(VrtError::PacketTooShort { len: src.len() });
        }
        match bit {
            CIF_BANDWIDTH => fields.bandwidth_hz = Some(q43_20_to_hz(get_u64_be(src, off) as i64)),
            CIF_RF_REF_FREQ => {
                fields.rf_ref_freq_hz = Some(q43_20_to_hz(get_u64_be(src, off) as i64))
            }
            CIF_GAIN => {
                let stage_1 = (get_u32_be(src, off) >> 16) as i16;
                fields.gain = Some(Gain::from_raw(stage_1));
            }
            CIF_SAMPLE_RATE => {
                fields.sample_rate_hz = Some(q43_20_to_hz(get_u64_be(src, off) as i64))
            }
            CIF_STATE => fields.state = Some(StateIndicators::from_word(get_u32_be(src, off))),
            _ => unreachable!("CIF_BIT_ORDER only lists known bits"),
        }
        off += width;
    }
    Ok(fields)
}
