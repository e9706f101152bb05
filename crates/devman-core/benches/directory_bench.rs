//! Criterion benchmarks for the device directory and linked tool options.
//!
//! Device events re-sort the directory and every option edit fans out over
//! the link graph, so both run on each host notification.
//!
//! Run with:
//! ```bash
//! cargo bench --package devman-core --bench directory_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use devman_core::{
    Device, DeviceDirectory, DeviceKind, DeviceRecord, OptionValue, ToolOptions,
};

// ── Fixture builders ──────────────────────────────────────────────────────────

/// Directory with a core pointer plus `n` tablet devices, every other one
/// unplugged.
fn build_directory(n: usize) -> DeviceDirectory {
    let mut directory = DeviceDirectory::new();
    directory
        .insert(DeviceRecord::new(
            Device::new(0, "Virtual core pointer", DeviceKind::Mouse),
            ":0",
            true,
        ))
        .expect("unique name");

    for i in 0..n {
        let name = format!("tablet-{i:03}");
        directory
            .insert(DeviceRecord::new(
                Device::new(i as u64 + 1, name.clone(), DeviceKind::Pen),
                ":0",
                false,
            ))
            .expect("unique name");
        if i % 2 == 1 {
            directory.update(&name, DeviceRecord::unbind);
        }
    }
    directory
}

fn sized_options(size: i64) -> ToolOptions {
    ToolOptions::from_values([
        ("size", OptionValue::Int(size)),
        ("opacity", OptionValue::Float(1.0)),
        ("brush", OptionValue::Text("hardness-100".to_string())),
    ])
}

// ── Benchmarks: directory ─────────────────────────────────────────────────────

/// Benchmarks unplug + replug of one device, which re-sorts twice.
fn bench_directory_rebind(c: &mut Criterion) {
    let mut group = c.benchmark_group("directory_rebind");

    for &count in &[8usize, 64, 256] {
        let mut directory = build_directory(count);
        let name = format!("tablet-{:03}", count / 2);
        let device = Device::new(9999, name.clone(), DeviceKind::Pen);

        group.bench_with_input(BenchmarkId::new("devices", count), &name, |b, name| {
            b.iter(|| {
                directory.update(black_box(name), DeviceRecord::unbind);
                directory.update(black_box(name), |r| r.bind(device.clone(), ":0", false));
            })
        });
    }

    group.finish();
}

/// Benchmarks lookup of a live handle, the fallback path on device removal.
fn bench_find_by_device(c: &mut Criterion) {
    let directory = build_directory(256);
    let core = Device::new(0, "Virtual core pointer", DeviceKind::Mouse);
    let missing = Device::new(4242, "not-there", DeviceKind::Pen);
    let mut group = c.benchmark_group("find_by_device");

    group.bench_function("core_pointer", |b| {
        b.iter(|| directory.find_by_device(black_box(&core)))
    });

    group.bench_function("missing", |b| {
        b.iter(|| directory.find_by_device(black_box(&missing)))
    });

    group.finish();
}

// ── Benchmarks: tool options ──────────────────────────────────────────────────

/// Benchmarks one option edit propagating through a chain of `n` links.
fn bench_option_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("option_propagation");

    for &links in &[1usize, 4, 16] {
        let head = sized_options(1);
        let mut chain = vec![head.clone()];
        for _ in 0..links {
            let next = sized_options(1);
            if let Some(previous) = chain.last() {
                previous.connect(&next);
            }
            chain.push(next);
        }

        let mut size = 0;
        group.bench_with_input(BenchmarkId::new("links", links), &head, |b, head| {
            b.iter(|| {
                size += 1;
                head.set("size", OptionValue::Int(black_box(size)));
            })
        });
    }

    group.finish();
}

/// Benchmarks restoring a preset into a tool's options.
fn bench_sync_from(c: &mut Criterion) {
    let tool = sized_options(10);
    let preset = sized_options(3);

    c.bench_function("sync_from", |b| {
        b.iter(|| {
            tool.sync_from(black_box(&preset));
            tool.set("size", OptionValue::Int(10));
        })
    });
}

criterion_group!(
    benches,
    bench_directory_rebind,
    bench_find_by_device,
    bench_option_propagation,
    bench_sync_from,
);
criterion_main!(benches);
