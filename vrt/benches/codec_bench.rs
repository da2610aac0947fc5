// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use vrt::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    let iq = vec![0i16; 2 * 362];
    let mut buf = vec![0u8; 20 + 4 * 362 + 4];
    let mut counter = 0u8;
    c.bench_function("encode_data (362 samples)", |p| {
        p.iter(|| encode_data(black_box(&mut buf), black_box(&iq), 362, &mut counter).unwrap())
    });

    let fields = ContextFields {
        bandwidth_hz: Some(24e6),
        rf_ref_freq_hz: Some(2.4e9),
        gain: Some(Gain::from_db(20.0)),
        sample_rate_hz: Some(30e6),
        state: Some(StateIndicators {
            calibrated_time: true,
            overrange: false,
            sample_loss: false,
        }),
    };
    let mut ctx_buf = vec![0u8; 64];
    c.bench_function("encode_context", |p| {
        p.iter(|| encode_context(black_box(&mut ctx_buf), black_box(&fields)).unwrap())
    });

    let len = encode_context(&mut ctx_buf, &fields).unwrap();
    c.bench_function("decode_context", |p| {
        p.iter(|| decode_context(black_box(&ctx_buf[..len])).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
