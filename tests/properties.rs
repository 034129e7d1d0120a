//! Property-based checks of the quantified invariants against randomly generated rectangles
//! and point sets.

use plc_engine::geometry::{signed_area2, side_of};
use plc_engine::{ConvexDecomposition, ConvexDecompositionParameters, Graph, Point, Triangulation, TriangulationParameters};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::try_init();
}

fn rect_contour(x0: f64, y0: f64, w: f64, h: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x0 + w, y0),
        Point::new(x0 + w, y0 + h),
        Point::new(x0, y0 + h),
    ]
}

proptest! {
    /// Invariant 1/3: every triangle produced from a plain rectangle is itself a triangle,
    /// and the areas of all triangles sum to the rectangle's area.
    #[test]
    fn triangulated_rectangle_area_matches_input(
        x0 in -1000.0f64..1000.0,
        y0 in -1000.0f64..1000.0,
        w in 1.0f64..500.0,
        h in 1.0f64..500.0,
    ) {
        init_logging();
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        let contour = rect_contour(x0, y0, w, h);
        tri.triangulate(&[contour], &TriangulationParameters::default()).unwrap();

        let mut total = 0.0;
        for t in g.triangles() {
            prop_assert!(g.polygon(t).is_triangle());
            let verts = g.polygon(t).vertices();
            let p = [g.position(verts[0]), g.position(verts[1]), g.position(verts[2])];
            total += signed_area2(p[0], p[1], p[2]).abs() * 0.5;
        }
        prop_assert!((total - w * h).abs() < 1e-6 * (w * h).max(1.0));
    }

    /// Invariant 4: after refinement, no live triangle's circumcircle strictly contains the
    /// opposite vertex across a non-segment edge.
    #[test]
    fn refined_rectangle_stays_delaunay_across_non_segment_edges(
        w in 10.0f64..200.0,
        h in 10.0f64..200.0,
        max_area in 5.0f64..50.0,
    ) {
        init_logging();
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        let contour = rect_contour(0.0, 0.0, w, h);
        let params = TriangulationParameters { min_b: 1.0, max_area, ..TriangulationParameters::default() };
        tri.triangulate(&[contour], &params).unwrap();

        for t1 in g.triangles() {
            for &e in g.polygon(t1).edges() {
                if g.edge(e).is_segment {
                    continue;
                }
                let Some(t2) = g.edge(e).other_polygon(t1) else { continue };
                let apex = g.polygon(t2).vertices().iter().copied().find(|&v| !g.edge(e).has_vertex(v));
                let Some(apex) = apex else { continue };
                let verts = g.polygon(t1).vertices();
                let p = [g.position(verts[0]), g.position(verts[1]), g.position(verts[2])];
                if let Ok((center, radius)) = plc_engine::geometry::circumcircle(p[0], p[1], p[2]) {
                    prop_assert!(plc_engine::geometry::in_circle(g.position(apex), center, radius) <= 0);
                }
            }
        }
    }

    /// Invariant 12: re-inserting a point at an existing vertex's exact position is a no-op.
    #[test]
    fn reinsertion_at_an_existing_vertex_is_idempotent(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
    ) {
        init_logging();
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        tri.init_box(plc_engine::Rect::new(-1000.0, -1000.0, 1000.0, 1000.0));
        let v = tri.insert_point(x, y).unwrap();
        let polygons_before = g.num_polygons();
        let v_again = tri.insert_point(x, y).unwrap();
        prop_assert_eq!(v, v_again);
        prop_assert_eq!(g.num_polygons(), polygons_before);
    }

    /// Invariant 7: every polygon produced by `decompose` on a convex rectangle is itself
    /// convex (trivially, since no coalescing can introduce a reflex corner where none existed).
    #[test]
    fn decomposed_rectangle_polygons_are_convex(
        w in 10.0f64..500.0,
        h in 10.0f64..500.0,
    ) {
        init_logging();
        let mut g = Graph::new();
        let contour = rect_contour(0.0, 0.0, w, h);
        let mut cd = ConvexDecomposition::new(&mut g);
        cd.decompose(&[contour], &[], &ConvexDecompositionParameters::default()).unwrap();

        for p in g.polygons().filter(|&p| !g.polygon(p).is_outside) {
            let verts = g.polygon(p).vertices();
            let n = verts.len();
            for i in 0..n {
                let a = g.position(verts[i]);
                let b = g.position(verts[(i + 1) % n]);
                let c = g.position(verts[(i + 2) % n]);
                prop_assert_eq!(side_of(a, b, c), 1);
            }
        }
    }
}

/// Invariant 1/3 again, phrased with an argument-injecting attribute instead of the `proptest!`
/// block macro: every vertex of a triangulated rectangle lies within the rectangle's bounding
/// box.
#[test_strategy::proptest]
fn triangulated_rectangle_vertices_stay_in_bounds(
    #[strategy(1.0f64..500.0)] w: f64,
    #[strategy(1.0f64..500.0)] h: f64,
) {
    init_logging();
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    tri.triangulate(&[rect_contour(0.0, 0.0, w, h)], &TriangulationParameters::default()).unwrap();

    for v in g.vertices() {
        let p = g.position(v);
        prop_assert!(p.x >= -1e-9 && p.x <= w + 1e-9);
        prop_assert!(p.y >= -1e-9 && p.y <= h + 1e-9);
    }
}
