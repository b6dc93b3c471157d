//! Criterion benchmarks for the pending-delivery ledger.
//!
//! Measures dispatch → resolve round trips and deadline expiry with a
//! realistic number of in-flight entries (a few held keys plus a burst of
//! pad presses).
//!
//! Run with:
//! ```bash
//! cargo bench --package keyrelay-core --bench ledger_bench
//! ```

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keyrelay_core::domain::ledger::DEFAULT_ACK_TIMEOUT;
use keyrelay_core::{AckPayload, Direction, InputId, PendingLedger, SequenceId};

const CODES: &[&str] = &["KeyW", "KeyA", "KeyS", "KeyD", "Space", "ArrowUp"];

fn ack(seq: SequenceId) -> AckPayload {
    AckPayload {
        ok: true,
        seq: Some(seq),
        ..AckPayload::default()
    }
}

fn bench_dispatch_then_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_round_trip");

    for in_flight in [1usize, 8, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(in_flight),
            &in_flight,
            |b, &in_flight| {
                let now = Instant::now();
                b.iter(|| {
                    let mut ledger = PendingLedger::new();
                    let seqs: Vec<SequenceId> = (0..in_flight)
                        .map(|i| {
                            ledger.dispatch(
                                Direction::Down,
                                InputId::from(CODES[i % CODES.len()]),
                                false,
                                DEFAULT_ACK_TIMEOUT,
                                now,
                                |payload| {
                                    black_box(payload);
                                },
                            )
                        })
                        .collect();
                    for seq in seqs {
                        black_box(ledger.resolve(ack(seq)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_expire(c: &mut Criterion) {
    c.bench_function("ledger_expire_64", |b| {
        let now = Instant::now();
        b.iter(|| {
            let mut ledger = PendingLedger::new();
            for i in 0..64u64 {
                ledger.dispatch(
                    Direction::Up,
                    InputId::from(CODES[(i as usize) % CODES.len()]),
                    false,
                    DEFAULT_ACK_TIMEOUT,
                    now + Duration::from_millis(i),
                    |_| {},
                );
            }
            black_box(ledger.next_deadline());
            black_box(ledger.expire(now + DEFAULT_ACK_TIMEOUT + Duration::from_millis(32)));
        });
    });
}

criterion_group!(benches, bench_dispatch_then_resolve, bench_expire);
criterion_main!(benches);
