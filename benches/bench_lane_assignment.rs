// benches/bench_lane_assignment.rs
use criterion::{
    black_box, AxisScale, Criterion, PlotConfiguration, criterion_group, criterion_main,
};
use crossing_arbiter::intersection_model::geometry::Rect;
use crossing_arbiter::intersection_model::layout::create_default_layout;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn random_boxes(count: usize) -> Vec<Rect> {
    let mut rng = SmallRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            Rect::new(
                rng.random_range(0..600),
                rng.random_range(0..600),
                rng.random_range(10..80),
                rng.random_range(10..80),
            )
        })
        .collect()
}

fn bench_lane_assignment(c: &mut Criterion) {
    let layout = create_default_layout();
    let mut group = c.benchmark_group("lane_assignment");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &count in [10, 100, 1000].iter() {
        let boxes = random_boxes(count);
        group.bench_function(format!("assign_lane_{}", count), |b| {
            b.iter(|| {
                for bounds in &boxes {
                    black_box(layout.assign_lane(black_box(bounds)));
                }
            });
        });
        group.bench_function(format!("intersects_stop_line_{}", count), |b| {
            b.iter(|| {
                for bounds in &boxes {
                    black_box(layout.intersects_stop_line(black_box(bounds)));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lane_assignment);
criterion_main!(benches);
