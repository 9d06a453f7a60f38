//! # Path Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use motion_lib::{
    geom::{Point, Pose, Velocity},
    odom::RobotState,
    path::Path,
    traj_ctrl::{self, HeadingController},
};
use util::archive::NullTelemetry;

use std::time::{Duration, Instant};

fn path_benchmark(c: &mut Criterion) {
    // ---- Build a long winding path ----

    let points: Vec<Point> = (0..500)
        .map(|i| {
            let y = i as f64 * 2.0;
            Point::new(10.0 * (y / 40.0).sin(), y)
        })
        .collect();

    let profile = vec![vec![0.0, 10.0], vec![100.0, 30.0], vec![900.0, 30.0]];

    let path = Path::new(&points, 10.0, 5.0, &profile).unwrap();

    // ---- Benchmarks ----

    c.bench_function("path locate", |b| {
        b.iter(|| {
            path.locate(
                black_box(0),
                black_box(&Point::new(3.0, 500.0)),
                black_box(4.0),
            )
        })
    });

    c.bench_function("path point at distance", |b| {
        b.iter(|| path.point_at_distance(black_box(750.0)))
    });

    c.bench_function("heading controller update", |b| {
        let mut ctrl = HeadingController::new(&path, traj_ctrl::Params::default()).unwrap();
        let state = RobotState {
            position: Pose::new(0.5, 1.0, 0.0),
            velocity: Velocity::new(0.0, 12.0),
            acceleration: 0.0,
            travel_radius: 200.0,
        };
        let t0 = Instant::now();
        let mut i = 0u32;

        b.iter(|| {
            i = i.wrapping_add(1);
            ctrl.update(
                black_box(&state),
                t0 + Duration::from_millis(20) * i,
                &mut NullTelemetry,
            )
        })
    });
}

criterion_group!(benches, path_benchmark);
criterion_main!(benches);
