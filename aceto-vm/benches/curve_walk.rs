use aceto_vm::hilbert::{d2xy, xy2d};
use aceto_vm::io::MemoryIo;
use aceto_vm::Interpreter;
use criterion::{criterion_group, criterion_main, Criterion};

const SIDE: u32 = 256;

fn bench_d2xy(c: &mut Criterion) {
    c.bench_function("d2xy", |b| {
        b.iter(|| {
            for d in 0..(SIDE as u64 * SIDE as u64) {
                std::hint::black_box(d2xy(SIDE, d));
            }
        })
    });
}

fn bench_xy2d(c: &mut Criterion) {
    c.bench_function("xy2d", |b| {
        b.iter(|| {
            for y in 0..SIDE {
                for x in 0..SIDE {
                    std::hint::black_box(xy2d(SIDE, x, y));
                }
            }
        })
    });
}

fn bench_range_and_sum(c: &mut Criterion) {
    // `5z` pushes 5..1, `£` joins the whole stack into one string, `p` prints it.
    let source = "5z £p";
    c.bench_function("range_and_sum_run", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new(std::hint::black_box(source), Some(1), MemoryIo::default());
            std::hint::black_box(interp.run());
        })
    });
}

criterion_group!(benches, bench_d2xy, bench_xy2d, bench_range_and_sum);
criterion_main!(benches);
