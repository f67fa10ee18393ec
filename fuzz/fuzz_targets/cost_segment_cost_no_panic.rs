// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use pvqc_core::ReproMode;
use pvqc_costs::{CostL1Median, CostL2Mean, CostModel};

fn build_queries(query_bytes: &[u8], n: usize) -> Vec<(usize, usize)> {
    let mut queries = Vec::with_capacity(16);
    for chunk in query_bytes.chunks(2).take(16) {
        let start = usize::from(chunk[0]) % n;
        let width_seed = chunk.get(1).copied().unwrap_or(0);
        let span = 1 + (usize::from(width_seed) % (n - start));
        queries.push((start, start + span));
    }

    if queries.is_empty() {
        queries.push((0, n));
    }

    queries
}

fn exercise_model<C: CostModel>(model: C, values: &[f64], query_bytes: &[u8]) {
    let Ok(cache) = model.precompute(values) else {
        return;
    };

    for (start, end) in build_queries(query_bytes, values.len()) {
        let _ = model.segment_cost(&cache, start, end);
    }
}

fuzz_target!(|data: &[u8]| {
    let mut input = common::FuzzInput::new(data);

    let n = input.pick(1, 192);
    let repro_mode = if input.byte() & 1 == 0 {
        ReproMode::Balanced
    } else {
        ReproMode::Strict
    };
    let query_bytes: Vec<u8> = (0..input.pick(0, 64)).map(|_| input.byte()).collect();
    let values = input.samples(n);

    exercise_model(CostL2Mean::new(repro_mode), &values, &query_bytes);
    exercise_model(CostL1Median::new(repro_mode), &values, &query_bytes);
});
