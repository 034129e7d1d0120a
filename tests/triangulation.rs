//! Whole-pipeline scenarios, adapted from the box/point/quality-bound seed cases used to pin
//! down this engine's behavior.

use plc_engine::{Graph, Rect, Triangulation, TriangulationParameters};

/// So a failing assertion's `log::warn!`/`log::debug!` trail (from `check()`,
/// `triangulate_with_points`'s dropped-point logging, etc.) actually shows up in `cargo test --
/// --nocapture` output instead of going nowhere.
fn init_logging() {
    let _ = env_logger::try_init();
}

/// S1: an empty box triangulates to exactly two triangles covering its full area.
#[test]
fn init_box_yields_two_triangles_covering_the_box() {
    init_logging();
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    tri.init_box(Rect::new(1.0, 0.0, 5.0, 4.0));
    assert_eq!(g.num_polygons(), 2);

    let mut area = 0.0;
    for t in g.triangles() {
        let verts = g.polygon(t).vertices();
        let p = [g.position(verts[0]), g.position(verts[1]), g.position(verts[2])];
        area += plc_engine::geometry::signed_area2(p[0], p[1], p[2]).abs() * 0.5;
    }
    assert!((area - 16.0).abs() < 1e-9);
}

/// S2: inserting an interior point fans the enclosing triangle into four, leaving the hull
/// bounding box unchanged and the mesh Delaunay.
#[test]
fn interior_point_fans_into_four_triangles() {
    init_logging();
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    tri.init_box(Rect::new(0.0, 0.0, 1.0, 1.0));
    tri.insert_point(0.2, 0.2).unwrap();
    assert_eq!(g.num_polygons(), 4);
    let bbox = g.bbox().unwrap();
    assert_eq!(bbox, Rect::new(0.0, 0.0, 1.0, 1.0));
    assert!(tri.check());
}

/// A region with a rectangular hole refines under quality bounds to a Delaunay mesh where
/// every live triangle meets both the skinny-ratio and area caps.
#[test]
fn ring_region_refines_to_quality_bounds() {
    init_logging();
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    let outer = vec![
        plc_engine::Point::new(0.0, 0.0),
        plc_engine::Point::new(100.0, 0.0),
        plc_engine::Point::new(100.0, 100.0),
        plc_engine::Point::new(0.0, 100.0),
    ];
    let hole = vec![
        plc_engine::Point::new(70.0, 70.0),
        plc_engine::Point::new(70.0, 30.0),
        plc_engine::Point::new(30.0, 30.0),
        plc_engine::Point::new(30.0, 70.0),
    ];
    let params = TriangulationParameters {
        min_b: 1.0,
        max_area: 50.0,
        ..TriangulationParameters::default()
    };
    tri.triangulate(&[outer, hole], &params).unwrap();
    assert!(tri.check());
    assert!(g.num_polygons() > 2);

    for t in g.triangles() {
        let verts = g.polygon(t).vertices().to_vec();
        let p = [g.position(verts[0]), g.position(verts[1]), g.position(verts[2])];
        let area = plc_engine::geometry::signed_area2(p[0], p[1], p[2]).abs() * 0.5;
        assert!(area <= params.max_area + 1e-6, "triangle area {area} exceeds cap");
    }
}

/// A reflex-cornered polygon with extra points: points outside the hull are silently dropped,
/// points inside remain precious vertices of the final mesh.
#[test]
fn extra_points_outside_the_hull_are_dropped_inside_points_survive() {
    init_logging();
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    let bar = vec![
        plc_engine::Point::new(0.0, 0.0),
        plc_engine::Point::new(0.0, 100.0),
        plc_engine::Point::new(1000.0, 100.0),
        plc_engine::Point::new(1000.0, 0.0),
    ];
    let extra = vec![
        plc_engine::Point::new(50.0, 150.0), // outside: above the bar
        plc_engine::Point::new(50.0, 50.0),  // inside
        plc_engine::Point::new(100.0, 50.0), // inside
        plc_engine::Point::new(150.0, 50.0), // inside, collinear with the previous two
    ];
    let params = TriangulationParameters {
        min_b: 1.0,
        max_area: 400.0,
        ..TriangulationParameters::default()
    };
    tri.triangulate_with_points(&[bar], &extra, &params).unwrap();
    assert!(tri.check());

    for &p in &extra[1..] {
        assert!(tri.find_vertex_for_point(p).is_some(), "inside point {p:?} must survive as a vertex");
    }
    assert!(
        tri.find_vertex_for_point(extra[0]).is_none(),
        "outside point must not have been inserted"
    );
}

/// `insert_point` at the exact position of an existing vertex returns that vertex and leaves
/// the graph unchanged.
#[test]
fn reinserting_an_existing_point_is_idempotent() {
    init_logging();
    let mut g = Graph::new();
    let mut tri = Triangulation::new(&mut g);
    tri.init_box(Rect::new(0.0, 0.0, 10.0, 10.0));
    let v = tri.insert_point(3.0, 3.0).unwrap();
    let polygons_before = g.num_polygons();
    let edges_before = g.edges().count();
    let v_again = tri.insert_point(3.0, 3.0).unwrap();
    assert_eq!(v, v_again);
    assert_eq!(g.num_polygons(), polygons_before);
    assert_eq!(g.edges().count(), edges_before);
}
