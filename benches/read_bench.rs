use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::tempdir;
use zip_core::config::{Config, Session};
use zip_core::dostime::DosDateTime;
use zip_core::entry::{Action, Entry, Method, Origin};
use zip_core::reader::Reader;
use zip_core::writer::write_archive;

fn generate_compressible_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut data = Vec::with_capacity(size);
    while data.len() < size {
        data.extend_from_slice(pattern);
    }
    data.truncate(size);
    data
}

fn single_entry(name: &str, data: Vec<u8>) -> Entry {
    Entry {
        name: name.to_string(),
        method: Method::Deflate,
        flags: 0,
        crc32: 0,
        comp_size: 0,
        uncomp_size: 0,
        mtime_dos: DosDateTime { time: 0, date: 0x21 },
        external_attrs: 0,
        extra: Vec::new(),
        comment: Vec::new(),
        lho_offset: 0,
        origin: Origin::FromMemory(data),
        action: Action::Add,
    }
}

fn create_test_archive(dir: &std::path::Path, data: &[u8]) -> std::path::PathBuf {
    let target = dir.join("bench.zip");
    let mut entries = vec![single_entry("test.bin", data.to_vec())];
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&target, None, &mut entries, &[], &config, &mut session).unwrap();
    target
}

fn bench_read_by_size(c: &mut Criterion) {
    let sizes = vec![100 * 1024, 1024 * 1024, 10 * 1024 * 1024];

    for size in sizes {
        let mut group = c.benchmark_group(format!("read_{}", format_size(size)));
        group.throughput(Throughput::Bytes(size as u64));

        let data = generate_compressible_data(size);
        let dir = tempdir().unwrap();
        let path = create_test_archive(dir.path(), &data);

        group.bench_with_input(BenchmarkId::new("deflate", size), &path, |b, path| {
            b.iter(|| {
                let mut reader = Reader::open(path).unwrap();
                let entries: Vec<_> = reader.entries.clone();
                for entry in entries {
                    black_box(reader.read_entry(&entry).unwrap());
                }
            });
        });
        group.finish();
    }
}

fn bench_read_many_entries(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_many_entries");
    let entry_count = 100;
    let entry_size = 10 * 1024;
    group.throughput(Throughput::Bytes((entry_count * entry_size) as u64));
    let data = generate_compressible_data(entry_size);

    let dir = tempdir().unwrap();
    let target = dir.path().join("many.zip");
    let mut entries: Vec<Entry> = (0..entry_count)
        .map(|i| single_entry(&format!("file_{}.txt", i), data.clone()))
        .collect();
    let config = Config::default();
    let mut session = Session::new();
    write_archive(&target, None, &mut entries, &[], &config, &mut session).unwrap();

    group.bench_function("deflate_100_entries", |b| {
        b.iter(|| {
            let mut reader = Reader::open(&target).unwrap();
            let entries: Vec<_> = reader.entries.clone();
            for entry in entries {
                black_box(reader.read_entry(&entry).unwrap());
            }
        });
    });
    group.finish();
}

fn bench_open_vs_full_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("open_vs_full_read");
    let size = 1024 * 1024;
    let data = generate_compressible_data(size);
    group.throughput(Throughput::Bytes(size as u64));

    let dir = tempdir().unwrap();
    let path = create_test_archive(dir.path(), &data);

    group.bench_function("open_only", |b| {
        b.iter(|| {
            black_box(Reader::open(&path).unwrap());
        });
    });

    group.bench_function("open_and_decompress", |b| {
        b.iter(|| {
            let mut reader = Reader::open(&path).unwrap();
            let entries: Vec<_> = reader.entries.clone();
            for entry in entries {
                black_box(reader.read_entry(&entry).unwrap());
            }
        });
    });
    group.finish();
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{}MB", bytes / (1024 * 1024))
    }
}

criterion_group!(
    benches,
    bench_read_by_size,
    bench_read_many_entries,
    bench_open_vs_full_read
);
criterion_main!(benches);
