use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use shipnet::core::buffer::SegmentedBuffer;
use shipnet::core::codec::{WireRead, WireWrite};
use shipnet::core::counter::SizeCounter;

const SEGMENT_CAPACITY: usize = 8 * 1024;

#[allow(clippy::unwrap_used)]
fn bench_var_int(c: &mut Criterion) {
    let mut group = c.benchmark_group("var_int");
    let values: Vec<u32> = (0..1024u32).map(|i| i.wrapping_mul(2_654_435_761)).collect();
    group.throughput(Throughput::Elements(values.len() as u64));

    group.bench_function("encode", |b| {
        b.iter_batched(
            || SegmentedBuffer::new(SEGMENT_CAPACITY),
            |mut buffer| {
                for &value in &values {
                    buffer.write_var_int(value);
                }
                buffer
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("decode", |b| {
        let mut encoded = SegmentedBuffer::new(SEGMENT_CAPACITY);
        for &value in &values {
            encoded.write_var_int(value);
        }
        b.iter_batched(
            || encoded.duplicate(),
            |mut buffer| {
                for _ in 0..values.len() {
                    black_box(buffer.read_var_int().unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("size_counter", |b| {
        b.iter(|| {
            let mut counter = SizeCounter::new();
            for &value in &values {
                counter.write_var_int(value);
            }
            black_box(counter.written())
        })
    });

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_byte_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_array");
    let payload_sizes = [64usize, 512, 4096, 65536, 1024 * 1024];

    for &size in &payload_sizes {
        let payload = vec![0xA5u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("write_{size}b"), |b| {
            b.iter_batched(
                || SegmentedBuffer::new(SEGMENT_CAPACITY),
                |mut buffer| {
                    buffer.write_byte_array(&payload);
                    buffer
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("read_{size}b"), |b| {
            let mut encoded = SegmentedBuffer::new(SEGMENT_CAPACITY);
            encoded.write_byte_array(&payload);
            b.iter_batched(
                || encoded.duplicate(),
                |mut buffer| black_box(buffer.read_byte_array().unwrap()),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_segment_adoption(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_segment");
    group.throughput(Throughput::Bytes(SEGMENT_CAPACITY as u64));

    group.bench_function("adopt", |b| {
        b.iter_batched(
            || vec![1u8; SEGMENT_CAPACITY].into_boxed_slice(),
            |segment| {
                let mut buffer = SegmentedBuffer::new(SEGMENT_CAPACITY);
                black_box(buffer.write_segment(segment));
                buffer
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("copy", |b| {
        b.iter_batched(
            || vec![1u8; SEGMENT_CAPACITY - 1].into_boxed_slice(),
            |segment| {
                let mut buffer = SegmentedBuffer::new(SEGMENT_CAPACITY);
                black_box(buffer.write_segment(segment));
                buffer
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_var_int, bench_byte_array, bench_segment_adoption);
criterion_main!(benches);
