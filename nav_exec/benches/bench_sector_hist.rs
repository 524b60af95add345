//! # Sector Histogram Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use nav_lib::{
    loc::Pose,
    nav::{ObstacleAvoidance, SectorHistNav, SectorHistParams},
};

fn sector_hist_benchmark(c: &mut Criterion) {
    // ---- Build a crowded scene ----

    let mut rng = StdRng::seed_from_u64(239);
    let obstacles: Vec<Point2<f64>> = (0..20)
        .map(|_| Point2::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)))
        .collect();

    let pose = Pose::new(0.0, 0.0, 0.3);
    let ball = Point2::new(3.0, 1.5);

    let mut nav = SectorHistNav::new(&SectorHistParams::default(), 0.14).unwrap();

    c.bench_function("SectorHistNav::plan_next_target", |b| {
        b.iter(|| nav.plan_next_target(&pose, &ball, &obstacles))
    });

    // Finer sectors and footprint sampling
    let mut fine_nav = SectorHistNav::new(
        &SectorHistParams {
            sector_width_deg: 1.0,
            footprint_samples_per_side: 20,
            ..SectorHistParams::default()
        },
        0.14,
    )
    .unwrap();

    c.bench_function("SectorHistNav::plan_next_target::fine", |b| {
        b.iter(|| fine_nav.plan_next_target(&pose, &ball, &obstacles))
    });
}

criterion_group!(benches, sector_hist_benchmark);
criterion_main!(benches);
