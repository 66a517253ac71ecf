//! Criterion benchmarks for the normalizer hot path.
//!
//! Journals arrive as one JSON array per account; a few thousand entries is
//! the realistic upper end, so that is what we measure.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use tradelens_core::normalize_trades;

fn make_raw_batch(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "symbol": format!("SYM{}", i % 12),
                "pnl": (i as f64 * 0.7).sin() * 250.0,
                "entryPrice": 100.0 + (i % 40) as f64,
                "qty": (i % 9 + 1) as f64,
                "stopLoss": 95.0,
                "target": 120.0,
                "type": if i % 3 == 0 { "SELL" } else { "BUY" },
                "entryDate": format!("2024-{:02}-{:02}T09:{:02}:00Z", i % 12 + 1, i % 28 + 1, i % 60),
                "exitDate": format!("2024-{:02}-{:02}T15:15:00Z", i % 12 + 1, i % 28 + 1),
            })
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let batch = make_raw_batch(5_000);

    c.bench_function("normalize_5000_trades", |b| {
        b.iter(|| normalize_trades(black_box(&batch)))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
