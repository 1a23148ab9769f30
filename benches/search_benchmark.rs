//! Performance benchmarks for docqa
//!
//! **Benchmarks Included:**
//! - `vector_search`: brute-force top-5 cosine search at 100, 1000 and 10000 windows
//! - `chunking`: recursive splitting of a long document
//! - `file_digest`: streaming BLAKE3 digest of a 4 MiB file
//! - `embedding_generation`: hashing embedder (384-dimensional)
//!
//! **Run benchmarks:**
//! ```bash
//! cargo bench                                    # Run all benchmarks
//! cargo bench -- vector_search                   # Vector search only
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docqa::embeddings::hashing_embedding;
use docqa::index::{Chunker, IndexedWindow, VectorIndex};
use docqa::scanner::file_digest;
use tempfile::TempDir;

const WORDS: &[&str] = &[
    "process", "thread", "deadlock", "semaphore", "paging", "segment", "kernel", "scheduler",
    "interrupt", "cache", "mutex", "frame", "buffer", "disk", "inode", "socket",
];

/// Deterministic pseudo-text for window `i`.
fn window_text(i: usize) -> String {
    (0..40)
        .map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_index(count: usize) -> VectorIndex {
    let windows = (0..count)
        .map(|i| {
            let text = window_text(i);
            IndexedWindow {
                source: format!("/docs/{}.pdf", i / 10),
                index: i % 10,
                embedding: hashing_embedding(&text),
                text,
            }
        })
        .collect();
    VectorIndex::new("hashing-384", windows).expect("uniform dimensions")
}

/// Benchmark top-K search over indexes of increasing size.
fn bench_vector_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_search");
    group.sample_size(10); // Minimum allowed by criterion
    group.measurement_time(std::time::Duration::from_secs(5));

    for count in &[100usize, 1000, 10000] {
        let index = build_index(*count);
        let query = hashing_embedding("how does the scheduler avoid deadlock");

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let hits = index.search(black_box(&query), 5).expect("search");
                black_box(hits.len())
            });
        });
    }

    group.finish();
}

/// Benchmark chunking a long document into 1000/200 windows.
fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    let document = (0..500)
        .map(window_text)
        .collect::<Vec<_>>()
        .join("\n\n");
    let chunker = Chunker::default_chunker();

    group.bench_function("recursive_split_500_paragraphs", |b| {
        b.iter(|| black_box(chunker.split_text(black_box(&document)).len()));
    });

    group.finish();
}

/// Benchmark hashing a file in fixed-size blocks.
fn bench_file_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_digest");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    let tmpdir = TempDir::new().expect("failed to create temp dir");
    let path = tmpdir.path().join("large.pdf");
    let bytes: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, bytes).expect("failed to write file");

    group.bench_function("blake3_4mib", |b| {
        b.iter(|| black_box(file_digest(black_box(&path)).expect("digest")));
    });

    group.finish();
}

/// Benchmark the offline embedder.
fn bench_embedding_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("embedding_generation");
    group.sample_size(10);
    group.measurement_time(std::time::Duration::from_secs(5));

    let text = window_text(3);
    group.bench_function("hashing_384_dim", |b| {
        b.iter(|| black_box(hashing_embedding(black_box(&text))));
    });

    group.finish();
}

// Define benchmark groups
criterion_group!(
    benches,
    bench_vector_search,
    bench_chunking,
    bench_file_digest,
    bench_embedding_generation
);
criterion_main!(benches);
