//! Concave-corner detection (§4.4.2 step 2) and the optional perpendicular-cut Steiner
//! insertion (§4.4.2 step 3).

use crate::geometry::{self, Point};
use crate::graph::{EdgeId, VertexId};
use crate::triangulation::{walk, Triangulation};

pub struct ConcaveCorner {
    pub vertex: VertexId,
    pub incoming: EdgeId,
    pub outgoing: EdgeId,
}

/// The direction `(from, to)` along a segment edge such that the region interior lies to the
/// right of `from -> to`, matching the convention `constrain` used when it assigned
/// `is_outside`.
pub(super) fn contour_direction(tri: &Triangulation, e: EdgeId) -> (VertexId, VertexId) {
    let edge = tri.graph().edge(e);
    let right_is_interior = edge.right().map_or(false, |p| !tri.graph().polygon(p).is_outside);
    if right_is_interior {
        (edge.v1, edge.v2)
    } else {
        (edge.v2, edge.v1)
    }
}

/// Every vertex with exactly two incident segment edges is a boundary vertex; classifies it
/// concave (reflex, interior angle over a straight line) or convex by the sign of the turn
/// from incoming to outgoing.
pub fn collect_concave_corners(tri: &Triangulation) -> Vec<ConcaveCorner> {
    let mut corners = Vec::new();
    for v in tri.graph().vertices() {
        let segs: Vec<EdgeId> = tri
            .graph()
            .vertex(v)
            .incident_edges()
            .iter()
            .copied()
            .filter(|&e| tri.graph().edge(e).is_segment)
            .collect();
        if segs.len() != 2 {
            continue;
        }
        let (f0, t0) = contour_direction(tri, segs[0]);
        let (f1, t1) = contour_direction(tri, segs[1]);
        let (incoming, outgoing) = if t0 == v && f1 == v {
            (segs[0], segs[1])
        } else if t1 == v && f0 == v {
            (segs[1], segs[0])
        } else {
            continue; // inconsistent orientation (e.g. a degenerate two-segment dead end)
        };
        let prev = tri.graph().edge(incoming).other_endpoint(v).unwrap();
        let next = tri.graph().edge(outgoing).other_endpoint(v).unwrap();
        let a = tri.graph().position(prev);
        let b = tri.graph().position(v);
        let c = tri.graph().position(next);
        let turn = geometry::signed_area2(a, b, c);
        let eps = geometry::scaled_epsilon(a.x.abs() + a.y.abs(), c.x.abs() + c.y.abs());
        if turn > eps {
            corners.push(ConcaveCorner { vertex: v, incoming, outgoing });
        }
    }
    corners
}

/// For each corner and each bounding segment, casts a perpendicular ray into the region and
/// walks to the first segment it crosses, inserting a Steiner vertex there. Returns whether
/// anything was inserted (the caller re-collects corners if so).
pub fn insert_perpendicular_cuts(tri: &mut Triangulation, corners: &[ConcaveCorner], _split_edges: bool) -> bool {
    let scale = tri
        .graph()
        .bbox()
        .map(|r| (r.hi.x - r.lo.x).max(r.hi.y - r.lo.y))
        .unwrap_or(1.0)
        .max(1.0)
        * 4.0;

    let mut targets: Vec<Point> = Vec::new();
    for corner in corners {
        let v_pos = tri.graph().position(corner.vertex);
        let prev = tri.graph().position(tri.graph().edge(corner.incoming).other_endpoint(corner.vertex).unwrap());
        let next = tri.graph().position(tri.graph().edge(corner.outgoing).other_endpoint(corner.vertex).unwrap());
        let bisector = {
            let d_in = unit(v_pos.sub(prev));
            let d_out = unit(next.sub(v_pos));
            let b = unit(d_in.add(d_out).scale(-1.0));
            if b.dot(b) > geometry::EPSILON { b } else { d_in.perp() }
        };

        for &e in &[corner.incoming, corner.outgoing] {
            let dir = unit(tri.graph().position(tri.graph().edge(e).other_endpoint(corner.vertex).unwrap()).sub(v_pos));
            let perp_a = dir.perp();
            let perp_b = perp_a.scale(-1.0);
            let perp = if perp_a.dot(bisector) >= perp_b.dot(bisector) { perp_a } else { perp_b };
            let target = v_pos.add(perp.scale(scale));
            let edge = walk::find_closest_edge(tri, corner.vertex, target, true);
            let graph_edge = tri.graph().edge(edge).clone();
            if !graph_edge.is_segment {
                continue;
            }
            let p1 = tri.graph().position(graph_edge.v1);
            let p2 = tri.graph().position(graph_edge.v2);
            if let Some(ip) = geometry::intersection_point(v_pos, target, p1, p2) {
                targets.push(ip);
            }
        }
    }

    let mut deduped: Vec<Point> = Vec::new();
    for t in targets {
        if !deduped.iter().any(|&d| geometry::is_equal(d, t)) {
            deduped.push(t);
        }
    }

    let mut inserted_any = false;
    for p in deduped {
        if tri.find_vertex_for_point(p).is_some() {
            continue;
        }
        if tri.insert_point(p.x, p.y).is_ok() {
            inserted_any = true;
        }
    }
    inserted_any
}

fn unit(p: Point) -> Point {
    let n = p.norm();
    if n <= geometry::EPSILON {
        p
    } else {
        p.scale(1.0 / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::triangulation::Triangulation;

    fn l_shape(tri: &mut Triangulation) -> Vec<VertexId> {
        tri.init_box(crate::geometry::Rect::new(-10.0, -10.0, 10.0, 10.0));
        let contour = [
            (0.0, 0.0),
            (6.0, 0.0),
            (6.0, 3.0),
            (3.0, 3.0),
            (3.0, 6.0),
            (0.0, 6.0),
        ];
        let verts: Vec<VertexId> = contour.iter().map(|&(x, y)| tri.insert_point(x, y).unwrap()).collect();
        tri.constrain(&[verts.clone()]);
        verts
    }

    #[test]
    fn l_shape_has_exactly_one_concave_corner() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        l_shape(&mut tri);
        let corners = collect_concave_corners(&tri);
        assert_eq!(corners.len(), 1);
        let pos = tri.graph().position(corners[0].vertex);
        assert!(geometry::is_equal(pos, Point::new(3.0, 3.0)));
    }

    #[test]
    fn convex_square_has_no_concave_corners() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        tri.init_box(crate::geometry::Rect::new(-10.0, -10.0, 10.0, 10.0));
        let verts = vec![
            tri.insert_point(-5.0, -5.0).unwrap(),
            tri.insert_point(5.0, -5.0).unwrap(),
            tri.insert_point(5.0, 5.0).unwrap(),
            tri.insert_point(-5.0, 5.0).unwrap(),
        ];
        tri.constrain(&[verts]);
        assert!(collect_concave_corners(&tri).is_empty());
    }

    #[test]
    fn perpendicular_cut_inserts_a_point_for_the_l_shape_corner() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        l_shape(&mut tri);
        let corners = collect_concave_corners(&tri);
        let before = tri.graph().vertices().count();
        let inserted = insert_perpendicular_cuts(&mut tri, &corners, false);
        assert!(inserted);
        assert!(tri.graph().vertices().count() > before);
    }
}
