use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use plc_engine::{Graph, Point, Triangulation, TriangulationParameters};

fn rect(w: f64, h: f64) -> Vec<Point> {
    vec![Point::new(0.0, 0.0), Point::new(w, 0.0), Point::new(w, h), Point::new(0.0, h)]
}

fn triangulate_plain(w: f64, h: f64) {
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    tri.triangulate(&[rect(w, h)], &TriangulationParameters::default()).unwrap();
}

fn triangulate_refined(w: f64, h: f64, max_area: f64) {
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    let params = TriangulationParameters { min_b: 1.0, max_area, ..TriangulationParameters::default() };
    tri.triangulate(&[rect(w, h)], &params).unwrap();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("triangulate_plain_rectangle", |b| {
        b.iter_batched(|| (), |()| triangulate_plain(1000.0, 1000.0), BatchSize::SmallInput)
    });

    c.bench_function("refine_rectangle_coarse", |b| {
        b.iter_batched(|| (), |()| triangulate_refined(1000.0, 1000.0, 2000.0), BatchSize::SmallInput)
    });

    c.bench_function("refine_rectangle_fine", |b| {
        b.iter_batched(|| (), |()| triangulate_refined(1000.0, 1000.0, 200.0), BatchSize::SmallInput)
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
