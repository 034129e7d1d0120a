use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use plc_engine::{ConvexDecomposition, ConvexDecompositionParameters, Graph, Point};

fn comb(teeth: usize) -> Vec<Point> {
    // A rectilinear comb with a configurable number of reflex notches, to exercise the
    // concave-corner / essential-edge labeling passes at increasing size.
    let mut points = vec![Point::new(0.0, 0.0)];
    let tooth_w = 10.0;
    let gap_w = 10.0;
    let mut x = 0.0;
    for _ in 0..teeth {
        points.push(Point::new(x, 50.0));
        points.push(Point::new(x + tooth_w, 50.0));
        points.push(Point::new(x + tooth_w, 100.0));
        points.push(Point::new(x + tooth_w + gap_w, 100.0));
        x += tooth_w + gap_w;
    }
    points.push(Point::new(x, 0.0));
    points
}

fn decompose(contour: &[Point]) {
    let mut g = Graph::new();
    let mut cd = ConvexDecomposition::new(&mut g);
    cd.decompose(&[contour.to_vec()], &[], &ConvexDecompositionParameters::default()).unwrap();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let small = comb(5);
    let large = comb(40);

    c.bench_function("decompose_comb_5_teeth", |b| {
        b.iter_batched(|| small.clone(), |p| decompose(&p), BatchSize::SmallInput)
    });

    c.bench_function("decompose_comb_40_teeth", |b| {
        b.iter_batched(|| large.clone(), |p| decompose(&p), BatchSize::SmallInput)
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
