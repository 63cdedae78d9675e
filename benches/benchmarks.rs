use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sga_rust::index::ReadIndex;
use sga_rust::overlap::block::Diagnostics;
use sga_rust::overlap::pileup::Pileup;
use sga_rust::overlap::search::Overlapper;

/// 从一条伪随机基因组切出首尾相接的模拟 reads。
fn make_reads(genome_len: usize, read_len: usize, step: usize) -> Vec<Vec<u8>> {
    let bases = [b'A', b'C', b'G', b'T'];
    let mut genome = Vec::with_capacity(genome_len);
    let mut x: u32 = 42;
    for _ in 0..genome_len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        genome.push(bases[(x >> 16) as usize % 4]);
    }
    let mut reads = Vec::new();
    let mut start = 0;
    while start + read_len <= genome_len {
        reads.push(genome[start..start + read_len].to_vec());
        start += step;
    }
    reads
}

fn bench_build_index(c: &mut Criterion) {
    let reads = make_reads(10_000, 100, 50);
    c.bench_function("build_read_index_200x100bp", |b| {
        b.iter(|| {
            black_box(ReadIndex::build(black_box(&reads), 128).unwrap());
        })
    });
}

fn bench_overlap_read(c: &mut Criterion) {
    let reads = make_reads(10_000, 100, 50);
    let idx = ReadIndex::build(&reads, 128).unwrap();
    let overlapper = Overlapper::new(&idx, 0.0);

    c.bench_function("overlap_read_exact_m45", |b| {
        b.iter(|| {
            let mut diag = Diagnostics::new();
            black_box(
                overlapper
                    .overlap_read(black_box(&reads[20]), 45, &mut diag)
                    .unwrap(),
            );
        })
    });
}

fn bench_pileup_consensus(c: &mut Criterion) {
    let mut pile = Pileup::new();
    for i in 0..60 {
        pile.add(if i % 7 == 0 { b'T' } else { b'A' });
    }

    c.bench_function("pileup_posterior_depth60", |b| {
        b.iter(|| {
            black_box(black_box(&pile).alpha_prob(0.01f64.ln()));
        })
    });
}

criterion_group!(benches, bench_build_index, bench_overlap_read, bench_pileup_consensus);
criterion_main!(benches);
