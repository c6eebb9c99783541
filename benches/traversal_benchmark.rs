use cdbg::engine::{Contig, TraversalEngine};
use cdbg::graph::Subgraph;
use cdbg::stopper::StoppingRuleKind;
use cdbg::store::MemoryStore;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// A pseudo-random haplotype; xorshift keeps the benchmark input
/// identical between runs.
fn haplotype(len: usize, mut state: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            b"ACGT"[(state % 4) as usize]
        })
        .collect()
}

fn build_store(k: usize, len: usize) -> (MemoryStore, Vec<u8>) {
    let hap = haplotype(len, 0x9e37_79b9_7f4a_7c15);
    let store = MemoryStore::builder(k, 1).add_sequence(0, &hap).build();
    (store, hap)
}

fn assemble(engine: &TraversalEngine<MemoryStore>, seed: &[u8]) -> Contig {
    engine.assemble(seed)
}

fn dfs(engine: &TraversalEngine<MemoryStore>, seed: &[u8]) -> Option<Subgraph> {
    engine.dfs(seed)
}

macro_rules! bench_engine {
    ($run:ident, $name:ident, $k:literal, $len:literal) => {
        fn $name(c: &mut Criterion) {
            let (store, hap) = build_store($k, $len);
            let engine = TraversalEngine::builder()
                .graph(&store)
                .traversal_colors(vec![0])
                .stopping_rule(StoppingRuleKind::Contig)
                .build();
            let seed = hap[$len / 2..$len / 2 + $k].to_vec();
            let input = format!("k{}_len{}", $k, $len);
            let id = BenchmarkId::new(stringify!($run), input);
            c.bench_with_input(id, &seed, |b, s| {
                b.iter(|| $run(&engine, s.as_slice()));
            });
        }
    };
}

bench_engine!(assemble, assemble_k31_10k, 31, 10_000);
bench_engine!(dfs, dfs_k31_10k, 31, 10_000);
bench_engine!(assemble, assemble_k63_100k, 63, 100_000);

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = assemble_k31_10k, dfs_k31_10k, assemble_k63_100k
);
criterion_main!(benches);
