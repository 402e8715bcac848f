use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tempfile::TempDir;
use tiercascade::{CascadeStore, Entry, FileStore, MemoryStore, Options, Store, StoreExt};

fn memory_over_file(dir: &TempDir) -> (Arc<MemoryStore>, Arc<FileStore>, CascadeStore) {
    let near = Arc::new(MemoryStore::new(Options::new(), 1000));
    let far = Arc::new(FileStore::open(dir.path(), Options::new()).unwrap());
    let cascade = CascadeStore::new(Options::new(), vec![near.clone(), far.clone()]);
    (near, far, cascade)
}

fn bench_tier0_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_read");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("read_1kb_tier0_hit", |b| {
        let dir = TempDir::new().unwrap();
        let (_, _, cascade) = memory_over_file(&dir);
        let entry = Entry::new(vec![b'x'; 1024]);

        for i in 0..100 {
            cascade.write(&format!("key:{}", i), &entry, &Options::new());
        }

        let opts = Options::new();
        let mut counter = 0;
        b.iter(|| {
            let key = format!("key:{}", counter % 100);
            black_box(cascade.read(&key, &opts));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_promotion(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_read");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("read_1kb_promote_from_file", |b| {
        let dir = TempDir::new().unwrap();
        let (near, far, cascade) = memory_over_file(&dir);
        let data = vec![b'x'; 1024];

        for i in 0..100 {
            far.write_value(&format!("key:{}", i), data.clone(), &Options::new())
                .unwrap();
        }

        let opts = Options::new();
        let mut counter = 0;
        b.iter(|| {
            let key = format!("key:{}", counter % 100);
            // Evict from tier 0 so every read promotes
            near.delete_entry(&key, &opts).unwrap();
            black_box(cascade.read(&key, &opts));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_write_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_write");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("write_1kb_memory_and_file", |b| {
        let dir = TempDir::new().unwrap();
        let (_, _, cascade) = memory_over_file(&dir);
        let entry = Entry::new(vec![b'x'; 1024]);
        let opts = Options::new();

        let mut counter = 0;
        b.iter(|| {
            let key = format!("key:{}", counter % 100);
            black_box(cascade.write(&key, &entry, &opts));
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tier0_hit, bench_promotion, bench_write_fan_out);
criterion_main!(benches);
