//! Benchmarks for zipguard-core extraction.
//!
//! Every entry costs at least one canonicalization, so the small-file and
//! nested-directory cases dominate; the large-file case measures the copy
//! loop.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use std::io::Cursor;
use tempfile::TempDir;
use zipguard_core::ExtractOptions;
use zipguard_core::NoopHooks;
use zipguard_core::ZipSource;
use zipguard_core::api::Extraction;
use zipguard_core::security::PathResolver;
use zipguard_core::test_utils::ZipTestBuilder;
use zipguard_core::types::ExtractionRoot;

/// Creates a ZIP archive with many small files.
fn create_many_small_files_zip(file_count: usize) -> Vec<u8> {
    (0..file_count)
        .fold(ZipTestBuilder::new(), |builder, i| {
            builder.add_file(&format!("file{i:04}.txt"), format!("content{i}").as_bytes())
        })
        .build()
}

/// Creates a ZIP archive with a single large file.
fn create_large_file_zip(size_bytes: usize) -> Vec<u8> {
    ZipTestBuilder::new()
        .add_file("large_file.bin", &vec![0xAB_u8; size_bytes])
        .build()
}

/// Creates a ZIP archive with a directory chain `depth` levels deep.
fn create_nested_dirs_zip(depth: usize, files_per_dir: usize) -> Vec<u8> {
    let mut builder = ZipTestBuilder::new();
    let mut prefix = String::new();
    for level in 0..depth {
        prefix.push_str(&format!("level{level}/"));
        builder = builder.add_directory(&prefix);
        for i in 0..files_per_dir {
            builder = builder.add_file(&format!("{prefix}file{i}.txt"), b"nested");
        }
    }
    builder.build()
}

fn extract(data: &[u8], dry_run: bool) {
    let temp = TempDir::new().unwrap();
    let mut source = ZipSource::new(Cursor::new(data.to_vec())).unwrap();
    let options = ExtractOptions::new(temp.path()).with_dry_run(dry_run);
    Extraction::new(options)
        .run_source(&mut source, &mut NoopHooks)
        .unwrap();
}

fn benchmark_plan(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let root = ExtractionRoot::open(temp.path()).unwrap();
    let resolver = PathResolver::new(&root);
    c.bench_function("plan_nested_name", |b| {
        b.iter(|| resolver.plan("a/b/./c/../d/file.txt").unwrap());
    });
}

fn benchmark_many_small_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_small_files");

    for file_count in [100, 1000] {
        let zip_data = create_many_small_files_zip(file_count);
        group.throughput(Throughput::Elements(file_count as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            &zip_data,
            |b, data| b.iter(|| extract(data, false)),
        );
    }

    group.finish();
}

fn benchmark_large_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_files");

    for size_mb in [1, 10] {
        let size_bytes = size_mb * 1024 * 1024;
        let zip_data = create_large_file_zip(size_bytes);
        group.throughput(Throughput::Bytes(size_bytes as u64));

        group.bench_with_input(
            BenchmarkId::new("size_mb", size_mb),
            &zip_data,
            |b, data| b.iter(|| extract(data, false)),
        );
    }

    group.finish();
}

fn benchmark_nested_directories(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_directories");

    for depth in [5, 10, 20] {
        let zip_data = create_nested_dirs_zip(depth, 2);
        group.throughput(Throughput::Elements(depth as u64 * 3));

        group.bench_with_input(BenchmarkId::from_parameter(depth), &zip_data, |b, data| {
            b.iter(|| extract(data, false));
        });
    }

    group.finish();
}

fn benchmark_dry_run(c: &mut Criterion) {
    let zip_data = create_many_small_files_zip(1000);
    c.bench_function("dry_run_1000_files", |b| b.iter(|| extract(&zip_data, true)));
}

criterion_group!(
    benches,
    benchmark_plan,
    benchmark_many_small_files,
    benchmark_large_files,
    benchmark_nested_directories,
    benchmark_dry_run
);
criterion_main!(benches);
