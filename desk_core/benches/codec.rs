use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use desk_core::{DeskPosition, MoveCommand};

fn bench_codec(c: &mut Criterion) {
    let payload = DeskPosition::new(1778, -120).to_payload();

    c.bench_function("decode_position", |b| {
        b.iter(|| DeskPosition::decode(black_box(&payload)))
    });

    c.bench_function("encode_command", |b| {
        b.iter(|| black_box(MoveCommand::Up).frame())
    });

    c.bench_function("height_conversion", |b| {
        let pos = DeskPosition::new(1778, 0);
        b.iter(|| black_box(pos).height().as_inches())
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
