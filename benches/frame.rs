//! Benchmarks for the CPU-side frame work: simulation step, raster
//! composition, and the field shading reference.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use lavalamp::raster::Compositor;
use lavalamp::{field, sim, Scene, Viewport};

fn bench_advance(c: &mut Criterion) {
    let vp = Viewport::new(1280.0, 720.0);
    let mut scene = Scene::generate_with(&mut StdRng::seed_from_u64(1), &vp);

    c.bench_function("sim_advance", |b| {
        b.iter(|| {
            sim::advance(black_box(&mut scene), black_box(&vp));
        })
    });
}

fn bench_raster_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster_compose");

    for (label, dark) in [("light", false), ("dark", true)] {
        let mut vp = Viewport::new(320.0, 180.0);
        vp.dark_mode = dark;
        let scene = Scene::generate_with(&mut StdRng::seed_from_u64(2), &vp);
        let mut compositor = Compositor::new(320, 180);

        group.bench_function(label, |b| {
            b.iter(|| {
                black_box(compositor.compose(black_box(&scene), black_box(&vp)));
            })
        });
    }

    group.finish();
}

fn bench_field_shade(c: &mut Criterion) {
    let vp = Viewport::new(160.0, 90.0);
    let scene = Scene::generate_with(&mut StdRng::seed_from_u64(3), &vp);
    let slots = field::pack_slots(&scene);

    c.bench_function("field_shade_160x90", |b| {
        b.iter(|| {
            let mut acc = glam::Vec3::ZERO;
            for y in 0..90 {
                for x in 0..160 {
                    let st = Vec2::new(x as f32, y as f32);
                    acc += field::shade(st, black_box(&slots), &vp);
                }
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_advance, bench_raster_compose, bench_field_shade);
criterion_main!(benches);
