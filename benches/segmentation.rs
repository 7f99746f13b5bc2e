//! Benchmarks for source segmentation
//!
//! This benchmark measures:
//! - Chapter splitting on the default title pattern
//! - Greedy line packing at several target lengths

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use novel_datagen::source::{pack_to_target_length, split_by_title};

fn synthetic_novel(chapters: usize) -> String {
    let mut text = String::new();
    for i in 1..=chapters {
        text.push_str(&format!("第{}章 第{}夜\n", i, i));
        for j in 0..40 {
            text.push_str(&format!("李火旺看着眼前的丹炉，第{}次想起了病房里的白墙。\n", j));
        }
        text.push('\n');
    }
    text
}

fn bench_split_by_title(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_by_title");
    for chapters in [10usize, 100, 1000] {
        let text = synthetic_novel(chapters);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chapters), &text, |b, text| {
            b.iter(|| split_by_title(black_box(text), None))
        });
    }
    group.finish();
}

fn bench_pack_to_target_length(c: &mut Criterion) {
    let text = synthetic_novel(200);
    let mut group = c.benchmark_group("pack_to_target_length");
    group.throughput(Throughput::Bytes(text.len() as u64));
    for target in [500usize, 2000, 8000] {
        group.bench_with_input(BenchmarkId::from_parameter(target), &target, |b, &target| {
            b.iter(|| pack_to_target_length(black_box(&text), target))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_split_by_title, bench_pack_to_target_length);
criterion_main!(benches);
