//! Point insertion (§4.3.3): classify a new point against the current mesh and dispatch to
//! the split-triangle, split-edge, or insert-outside case, then hand the fresh triangles to
//! the Delaunay fix-up pass.

use super::{fixup, Triangulation};
use crate::error::{PlcError, Result};
use crate::geometry::{self, Point};
use crate::graph::{EdgeId, PolygonId, VertexId};

enum Location {
    Vertex(VertexId),
    OnEdge(EdgeId),
    InTriangle(PolygonId),
    /// Outside the convex hull; carries the closest hull edge to fan out from.
    Outside(EdgeId),
}

pub fn insert_point(tri: &mut Triangulation, p: Point) -> Result<VertexId> {
    if tri.graph().num_polygons() == 0 && tri.graph().vertices().count() < 3 {
        return bootstrap(tri, p);
    }

    match locate(tri, p) {
        Location::Vertex(v) => Ok(v),
        Location::OnEdge(e) => Ok(split_edge(tri, e, p)),
        Location::InTriangle(t) => Ok(split_triangle(tri, t, p)),
        Location::Outside(hull_edge) => {
            if tri.is_constrained() {
                return Err(PlcError::OutsideConstrainedInsert);
            }
            Ok(insert_outside(tri, hull_edge, p))
        }
    }
}

fn bootstrap(tri: &mut Triangulation, p: Point) -> Result<VertexId> {
    let count = tri.graph().vertices().count();
    if count < 2 {
        return Ok(tri.graph_mut().create_vertex(p.x, p.y));
    }
    // Exactly two vertices exist; this is the third. Reject collinearity.
    let existing: Vec<VertexId> = tri.graph().vertices().collect();
    let a = tri.graph().position(existing[0]);
    let b = tri.graph().position(existing[1]);
    if geometry::side_of(a, b, p) == 0 {
        return Err(PlcError::CollinearDegenerate);
    }
    let v = tri.graph_mut().create_vertex(p.x, p.y);
    // Orient clockwise: side_of(a,b,v) == 1 means v is to the "right" under our convention,
    // which is what create_polygon's forward-traversal-to-right rule expects.
    let (v1, v2) = if geometry::side_of(a, b, p) == 1 {
        (existing[0], existing[1])
    } else {
        (existing[1], existing[0])
    };
    let e0 = tri.graph_mut().create_edge(v1, v2);
    let e1 = tri.graph_mut().create_edge(v2, v);
    let e2 = tri.graph_mut().create_edge(v, v1);
    tri.graph_mut().create_triangle(e0, e1, e2);
    Ok(v)
}

fn locate(tri: &mut Triangulation, p: Point) -> Location {
    if let Some(v) = tri.find_vertex_for_point(p) {
        return Location::Vertex(v);
    }
    for e in tri.graph().edges().collect::<Vec<_>>() {
        let edge = tri.graph().edge(e);
        let v1 = tri.graph().position(edge.v1);
        let v2 = tri.graph().position(edge.v2);
        if geometry::point_on(v1, v2, p) {
            return Location::OnEdge(e);
        }
    }
    for t in tri.graph().polygons().collect::<Vec<_>>() {
        if triangle_contains_strictly(tri, t, p) {
            return Location::InTriangle(t);
        }
    }
    // Not on any existing feature and inside no triangle: must be outside the hull. Find the
    // closest hull edge (one whose left or right polygon slot is empty).
    let hull_edge = tri
        .graph()
        .edges()
        .filter(|&e| {
            let edge = tri.graph().edge(e);
            edge.left().is_none() || edge.right().is_none()
        })
        .min_by(|&a, &b| {
            let da = edge_distance(tri, a, p);
            let db = edge_distance(tri, b, p);
            da.partial_cmp(&db).unwrap()
        })
        .expect("graph with polygons must have at least one hull edge");
    Location::Outside(hull_edge)
}

fn edge_distance(tri: &Triangulation, e: EdgeId, p: Point) -> f64 {
    let edge = tri.graph().edge(e);
    let v1 = tri.graph().position(edge.v1);
    let v2 = tri.graph().position(edge.v2);
    let d = v2.sub(v1);
    let len2 = d.dot(d);
    if len2 <= geometry::EPSILON {
        return p.dist(v1);
    }
    let t = (p.sub(v1).dot(d) / len2).clamp(0.0, 1.0);
    p.dist(v1.add(d.scale(t)))
}

fn triangle_contains_strictly(tri: &Triangulation, t: PolygonId, p: Point) -> bool {
    let polygon = tri.graph().polygon(t);
    if !polygon.is_triangle() {
        return false;
    }
    let verts = polygon.vertices();
    let positions: Vec<Point> = verts.iter().map(|&v| tri.graph().position(v)).collect();
    let n = positions.len();
    let mut sign = 0;
    for i in 0..n {
        let a = positions[i];
        let b = positions[(i + 1) % n];
        let s = geometry::side_of(a, b, p);
        if s == 0 {
            return false; // on boundary, handled elsewhere
        }
        if sign == 0 {
            sign = s;
        } else if sign != s {
            return false;
        }
    }
    // Clockwise-wound polygon: interior is to the right of each forward edge, i.e. side_of == 1.
    sign == 1
}

/// Splits triangle `t` at `p`, creating three new triangles fanning from `p`.
fn split_triangle(tri: &mut Triangulation, t: PolygonId, p: Point) -> VertexId {
    let (e0, e1, e2) = {
        let edges = tri.graph().polygon(t).edges().to_vec();
        (edges[0], edges[1], edges[2])
    };
    let verts = tri.graph().polygon(t).vertices().to_vec();
    let (v0, v1, v2) = (verts[0], verts[1], verts[2]);
    let is_outside = tri.graph().polygon(t).is_outside;

    let new_v = tri.graph_mut().create_vertex(p.x, p.y);
    tri.graph_mut().destroy_triangle(t);

    let e0p = tri.graph_mut().create_edge(v0, new_v);
    let e1p = tri.graph_mut().create_edge(v1, new_v);
    let e2p = tri.graph_mut().create_edge(v2, new_v);

    let t0 = tri.graph_mut().create_triangle(e0, e1p, e0p);
    let t1 = tri.graph_mut().create_triangle(e1, e2p, e1p);
    let t2 = tri.graph_mut().create_triangle(e2, e0p, e2p);
    for t in [t0, t1, t2] {
        tri.graph_mut().polygon_mut(t).is_outside = is_outside;
    }

    fixup::legalize(tri, &[e0, e1, e2, e0p, e1p, e2p]);
    new_v
}

/// Splits edge `s` at `p`, rebuilding the (one or two) adjacent triangles.
fn split_edge(tri: &mut Triangulation, s: EdgeId, p: Point) -> VertexId {
    let edge = tri.graph().edge(s).clone();
    let (va, vb) = (edge.v1, edge.v2);
    let is_segment = edge.is_segment;
    let left = edge.left;
    let right = edge.right;

    let new_v = tri.graph_mut().create_vertex(p.x, p.y);
    let s1 = tri.graph_mut().create_edge(va, new_v);
    let s2 = tri.graph_mut().create_edge(new_v, vb);
    tri.graph_mut().edge_mut(s1).is_segment = is_segment;
    tri.graph_mut().edge_mut(s2).is_segment = is_segment;

    let mut seed = vec![s1, s2];
    for side in [left, right] {
        if let Some(t) = side {
            let is_outside = tri.graph().polygon(t).is_outside;
            let other_edges: Vec<EdgeId> = tri
                .graph()
                .polygon(t)
                .edges()
                .iter()
                .copied()
                .filter(|&e| e != s)
                .collect();
            debug_assert_eq!(other_edges.len(), 2);
            // Identify the apex (vertex opposite `s`) and the two edges touching va/vb.
            let apex = tri
                .graph()
                .polygon(t)
                .vertices()
                .iter()
                .copied()
                .find(|&v| v != va && v != vb)
                .expect("triangle must have an apex opposite the split edge");
            let e_to_va = other_edges
                .iter()
                .copied()
                .find(|&e| tri.graph().edge(e).has_vertex(va))
                .unwrap();
            let e_to_vb = other_edges
                .iter()
                .copied()
                .find(|&e| tri.graph().edge(e).has_vertex(vb))
                .unwrap();
            let se = tri.graph_mut().create_edge(apex, new_v);
            let new_t1 = tri.graph_mut().create_triangle(se, e_to_va, s1);
            let new_t2 = tri.graph_mut().create_triangle(se, e_to_vb, s2);
            tri.graph_mut().polygon_mut(new_t1).is_outside = is_outside;
            tri.graph_mut().polygon_mut(new_t2).is_outside = is_outside;
            seed.push(se);
        }
    }
    for side in [left, right] {
        if let Some(t) = side {
            tri.graph_mut().destroy_triangle(t);
        }
    }
    tri.graph_mut().destroy_edge(s);

    fixup::legalize(tri, &seed);
    new_v
}

/// Inserts `p` outside the convex hull: connects it to the endpoints of the closest hull
/// edge, then fans out along the hull from each endpoint while the next hull vertex remains
/// on the inner side of the ray toward `p`.
fn insert_outside(tri: &mut Triangulation, hull_edge: EdgeId, p: Point) -> VertexId {
    let (va, vb) = {
        let e = tri.graph().edge(hull_edge);
        (e.v1, e.v2)
    };
    let new_v = tri.graph_mut().create_vertex(p.x, p.y);
    let ea = tri.graph_mut().create_edge(va, new_v);
    let eb = tri.graph_mut().create_edge(vb, new_v);
    tri.graph_mut().create_triangle(hull_edge, eb, ea);
    let mut seed = vec![hull_edge, ea, eb];

    for (mut apex, mut apex_edge, forward) in [(va, ea, true), (vb, eb, false)] {
        loop {
            let hull_step = next_hull_edge(tri, apex, hull_edge, forward);
            let Some((step_edge, next_vertex)) = hull_step else {
                break;
            };
            let next_pos = tri.graph().position(next_vertex);
            let apex_pos = tri.graph().position(apex);
            // Continue fanning while `next_vertex` is on the inner side of ray apex->p.
            if geometry::side_of(apex_pos, p, next_pos) != if forward { 1 } else { -1 } {
                break;
            }
            let new_edge = tri.graph_mut().create_edge(next_vertex, new_v);
            tri.graph_mut().create_triangle(step_edge, new_edge, apex_edge);
            seed.push(step_edge);
            seed.push(new_edge);
            apex = next_vertex;
            apex_edge = new_edge;
        }
    }

    fixup::legalize(tri, &seed);
    new_v
}


/// The next hull edge incident to `from`, walking the hull boundary in the given direction.
fn next_hull_edge(
    tri: &Triangulation,
    from: VertexId,
    exclude: EdgeId,
    forward: bool,
) -> Option<(EdgeId, VertexId)> {
    let candidates: Vec<EdgeId> = tri
        .graph()
        .vertex(from)
        .incident_edges()
        .iter()
        .copied()
        .filter(|&e| e != exclude && (tri.graph().edge(e).left().is_none() || tri.graph().edge(e).right().is_none()))
        .collect();
    let _ = forward;
    candidates.first().map(|&e| {
        let other = tri.graph().edge(e).other_endpoint(from).unwrap();
        (e, other)
    })
}
