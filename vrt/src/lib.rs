// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unstable_features, unused_import_braces, unreachable_pub)]
#![forbid(unsafe_code)]
/*!
`vrt` encodes and decodes the two VITA Radio Transport packet types this
streamer needs: IF Data with Stream ID, and Context. It does no I/O of
its own — callers hand it buffers and get lengths back.
*/

mod context;
mod data;
mod errors;
mod fixed_point;
mod gain;
mod header;
mod mtu;
mod wire;

pub use context::{decode_context, encode_context, ContextFields, StateIndicators};
pub use data::encode_data;
pub use errors::VrtError;
pub use fixed_point::{hz_to_q43_20, q43_20_to_hz};
pub use gain::Gain;
pub use header::STREAM_ID;
pub use mtu::{datagram_size, samples_per_packet, MTU_JUMBO, MTU_STANDARD};

/// Standard imports for the most commonly used items in the `vrt`
/// crate.
pub mod prelude {
    pub use crate::context::{decode_context, encode_context, ContextFields, StateIndicators};
    pub use crate::data::encode_data;
    pub use crate::errors::VrtError;
    pub use crate::gain::Gain;
    pub use crate::mtu::{datagram_size, samples_per_packet, MTU_JUMBO, MTU_STANDARD};
}
