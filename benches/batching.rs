//! Benchmarks for the upsert pipeline.
//!
//! Benchmark targets:
//! - Partition + reassemble overhead for 10k texts: <1ms
//! - In-memory upsert of 1k documents (hash embedder): <50ms
//! - In-memory top-5 query over 1k documents: <5ms

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use ragstore::config::VectorStorageConfig;
use ragstore::embedding::HashEmbedder;
use ragstore::models::{Document, DocumentBatch};
use ragstore::storage::traits::VectorStorage;
use ragstore::storage::vector::{InMemoryIndexClient, IndexedVectorStorage, partition, reassemble};

fn corpus(n: usize) -> DocumentBatch {
    (0..n)
        .map(|i| {
            (
                format!("chunk-{i:05}"),
                Document::with_content(format!(
                    "chunk {i} about storage engines, vectors and graph {}",
                    i % 17
                )),
            )
        })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_partition_reassemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching");
    let items: Vec<usize> = (0..10_000).collect();
    group.throughput(Throughput::Elements(items.len() as u64));

    for batch_size in [16, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("partition_reassemble", batch_size),
            &batch_size,
            |b, &size| {
                b.iter(|| {
                    let expected: Vec<usize> = partition(&items, size).map(<[usize]>::len).collect();
                    let outputs: Vec<Vec<usize>> =
                        partition(&items, size).map(<[usize]>::to_vec).collect();
                    black_box(reassemble(&expected, outputs).unwrap())
                });
            },
        );
    }

    group.finish();
}

fn bench_upsert(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("vector_upsert");
    group.sample_size(20);

    for batch_size in [10, 100] {
        group.bench_with_input(
            BenchmarkId::new("memory_1k", batch_size),
            &batch_size,
            |b, &size| {
                b.iter(|| {
                    rt.block_on(async {
                        let storage = IndexedVectorStorage::connect(
                            InMemoryIndexClient::new(),
                            HashEmbedder::new(),
                            VectorStorageConfig::new("bench").with_max_batch_size(size),
                        )
                        .await
                        .unwrap();
                        black_box(storage.upsert(corpus(1000)).await.unwrap())
                    })
                });
            },
        );
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let rt = runtime();
    let storage = rt.block_on(async {
        let storage = IndexedVectorStorage::connect(
            InMemoryIndexClient::new(),
            HashEmbedder::new(),
            VectorStorageConfig::new("bench"),
        )
        .await
        .unwrap();
        storage.upsert(corpus(1000)).await.unwrap();
        storage
    });

    c.bench_function("vector_query_top5_1k", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    storage
                        .query(black_box("graph storage engines"), 5)
                        .await
                        .unwrap(),
                )
            })
        });
    });
}

criterion_group!(benches, bench_partition_reassemble, bench_upsert, bench_query);
criterion_main!(benches);
