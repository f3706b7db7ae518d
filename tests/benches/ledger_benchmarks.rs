//! # LiquidityMatrix Benchmarks
//!
//! | Component | Operation | Expected cost |
//! |-----------|-----------|---------------|
//! | lm-01 Checkpoints | point-in-time lookup | O(log n) |
//! | lm-02 Merkle | leaf update / proof | O(height) |
//! | lm-03 Ledger | local write incl. top-tree refresh | O(height) |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lm_01_checkpoints::Checkpoints;
use lm_02_merkle::{verify_proof, MerkleTree, DEFAULT_TREE_HEIGHT};
use lm_03_liquidity_matrix::{
    AppCallbacks, AppSettings, InMemoryEventSink, LiquidityMatrix, LocalLedgerApi, ManualClock,
    MatrixConfig,
};
use rand::Rng;
use std::sync::Arc;

fn random_hash(rng: &mut impl Rng) -> [u8; 32] {
    let mut hash = [0u8; 32];
    rng.fill(&mut hash);
    hash
}

// ============================================================================
// LM-01: Checkpoints
// ============================================================================

fn bench_checkpoint_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lm-01-checkpoints");

    for size in [100u64, 10_000, 100_000] {
        let mut history = Checkpoints::<i128>::new();
        for t in 1..=size {
            history.append(t as i128, t * 10).unwrap();
        }
        let mut rng = rand::thread_rng();
        let probes: Vec<u64> = (0..1_000).map(|_| rng.gen_range(0..size * 10)).collect();

        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_with_input(BenchmarkId::new("get", size), &probes, |b, probes| {
            b.iter(|| {
                for at in probes {
                    black_box(history.get(*at));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("floor", size), &probes, |b, probes| {
            b.iter(|| {
                for at in probes {
                    black_box(history.floor(*at));
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// LM-02: Merkle Tree
// ============================================================================

fn bench_merkle_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("lm-02-merkle");
    let mut rng = rand::thread_rng();

    let mut tree = MerkleTree::new(DEFAULT_TREE_HEIGHT).unwrap();
    let keys: Vec<[u8; 32]> = (0..1_000).map(|_| random_hash(&mut rng)).collect();
    for key in &keys {
        tree.update(*key, random_hash(&mut rng)).unwrap();
    }

    group.bench_function("update_existing_leaf", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(tree.update(keys[i], [i as u8; 32]).unwrap())
        })
    });

    let key = keys[keys.len() / 2];
    let (index, value) = (tree.index_of(&key).unwrap(), tree.value_of(&key).unwrap());
    let root = tree.root();

    group.bench_function("proof", |b| {
        b.iter(|| black_box(tree.proof(index).unwrap()))
    });

    let siblings = tree.proof(index).unwrap();
    group.bench_function("verify_proof", |b| {
        b.iter(|| black_box(verify_proof(&key, &value, index, &siblings, &root)))
    });

    group.finish();
}

// ============================================================================
// LM-03: Ledger Writes
// ============================================================================

fn bench_local_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lm-03-ledger");
    let app = [0xaa; 20];

    for batch in [1usize, 32, 256] {
        let clock = Arc::new(ManualClock::new(1));
        let matrix = LiquidityMatrix::new(
            MatrixConfig::default(),
            clock.clone(),
            Arc::new(InMemoryEventSink::new()),
        )
        .unwrap();
        matrix
            .register_app(app, AppSettings::default(), AppCallbacks::none())
            .unwrap();

        let accounts: Vec<[u8; 20]> = (0..batch).map(|i| [(i % 251) as u8 + 1; 20]).collect();

        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("update_liquidity", batch), &accounts, |b, accounts| {
            let mut amount = 0i128;
            b.iter(|| {
                amount += 1;
                clock.advance(1);
                for account in accounts {
                    black_box(matrix.update_liquidity(app, *account, amount).unwrap());
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_checkpoint_lookup,
    bench_merkle_tree,
    bench_local_writes
);
criterion_main!(benches);
