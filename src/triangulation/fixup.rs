//! Delaunay legality fix-up (§4.3.5): the flip loop that restores the local Delaunay property
//! after an insertion, without ever touching a segment edge.

use super::Triangulation;
use crate::geometry;
use crate::graph::{EdgeId, PolygonId};
use std::collections::VecDeque;

/// Runs one fix-up pass seeded with `seed_edges`. Segments and frozen edges are never
/// enqueued or flipped.
pub fn legalize(tri: &mut Triangulation, seed_edges: &[EdgeId]) {
    let level = tri.graph_mut().next_level();
    let mut todo: VecDeque<EdgeId> = VecDeque::new();
    let mut queued = std::collections::HashSet::new();
    for &e in seed_edges {
        enqueue(tri, e, level, &mut todo, &mut queued);
    }

    while let Some(e) = todo.pop_front() {
        queued.remove(&e);
        if !tri.graph().edge_exists(e) {
            continue; // edge was removed by an earlier flip in this pass
        }
        let edge = tri.graph().edge(e).clone();
        if edge.is_segment || edge.frozen {
            continue;
        }
        let (t1, t2) = match (edge.left, edge.right) {
            (Some(a), Some(b)) => (a, b),
            _ => continue, // hull edge, nothing to flip against
        };
        if !is_illegal(tri, t1, t2, e) {
            continue;
        }
        if let Some(new_edges) = flip(tri, e, t1, t2) {
            for ne in new_edges {
                enqueue(tri, ne, level, &mut todo, &mut queued);
            }
        }
    }
}

fn enqueue(
    tri: &Triangulation,
    e: EdgeId,
    level: u64,
    todo: &mut VecDeque<EdgeId>,
    queued: &mut std::collections::HashSet<EdgeId>,
) {
    let edge = tri.graph().edge(e);
    if edge.is_segment || edge.frozen || edge.level >= level {
        return;
    }
    if queued.insert(e) {
        todo.push_back(e);
    }
}

/// True iff either triangle's circumcircle strictly contains the opposite vertex of the other.
fn is_illegal(tri: &Triangulation, t1: PolygonId, t2: PolygonId, shared: EdgeId) -> bool {
    let apex1 = opposite_vertex(tri, t1, shared);
    let apex2 = opposite_vertex(tri, t2, shared);
    let (apex1, apex2) = match (apex1, apex2) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    let verts1: Vec<_> = tri.graph().polygon(t1).vertices().to_vec();
    let verts2: Vec<_> = tri.graph().polygon(t2).vertices().to_vec();
    if verts1.len() != 3 || verts2.len() != 3 {
        return false;
    }
    let p1 = [
        tri.graph().position(verts1[0]),
        tri.graph().position(verts1[1]),
        tri.graph().position(verts1[2]),
    ];
    let p2 = [
        tri.graph().position(verts2[0]),
        tri.graph().position(verts2[1]),
        tri.graph().position(verts2[2]),
    ];
    let apex2_pos = tri.graph().position(apex2);
    let apex1_pos = tri.graph().position(apex1);

    let illegal_1 = match geometry::circumcircle(p1[0], p1[1], p1[2]) {
        Ok((c, r)) => geometry::in_circle(apex2_pos, c, r) > 0,
        Err(_) => true, // degenerate circumcircle: treat as illegal, matching the source
    };
    let illegal_2 = match geometry::circumcircle(p2[0], p2[1], p2[2]) {
        Ok((c, r)) => geometry::in_circle(apex1_pos, c, r) > 0,
        Err(_) => true,
    };
    illegal_1 || illegal_2
}

pub(crate) fn opposite_vertex(
    tri: &Triangulation,
    t: PolygonId,
    shared: EdgeId,
) -> Option<crate::graph::VertexId> {
    let polygon = tri.graph().polygon(t);
    let edge = tri.graph().edge(shared);
    polygon
        .vertices()
        .iter()
        .copied()
        .find(|&v| v != edge.v1 && v != edge.v2)
}

/// Flips the shared diagonal of the two triangles adjacent to `e`, returning the edges of the
/// two new triangles other than the new diagonal itself (candidates for re-enqueueing).
pub(crate) fn flip(tri: &mut Triangulation, e: EdgeId, t1: PolygonId, t2: PolygonId) -> Option<Vec<EdgeId>> {
    let edge = tri.graph().edge(e).clone();
    let u1 = opposite_vertex(tri, t1, e)?;
    let u2 = opposite_vertex(tri, t2, e)?;
    let is_outside = tri.graph().polygon(t1).is_outside;

    // Edges of t1/t2 other than `e`, identified by which endpoint of `e` they touch.
    let edge_touching = |tri: &Triangulation, t: PolygonId, v: crate::graph::VertexId| -> EdgeId {
        tri.graph()
            .polygon(t)
            .edges()
            .iter()
            .copied()
            .find(|&x| x != e && tri.graph().edge(x).has_vertex(v))
            .expect("triangle missing expected edge")
    };
    let e1_v1 = edge_touching(tri, t1, edge.v1);
    let e1_v2 = edge_touching(tri, t1, edge.v2);
    let e2_v1 = edge_touching(tri, t2, edge.v1);
    let e2_v2 = edge_touching(tri, t2, edge.v2);

    tri.graph_mut().destroy_triangle(t1);
    tri.graph_mut().destroy_triangle(t2);
    tri.graph_mut().destroy_edge(e);

    let new_diag = tri.graph_mut().create_edge(u1, u2);
    let t1_new = tri.graph_mut().create_triangle(new_diag, e1_v1, e2_v1);
    let t2_new = tri.graph_mut().create_triangle(new_diag, e1_v2, e2_v2);
    tri.graph_mut().polygon_mut(t1_new).is_outside = is_outside;
    tri.graph_mut().polygon_mut(t2_new).is_outside = is_outside;
    tri.graph_mut().record_flip();

    Some(vec![e1_v1, e2_v1, e1_v2, e2_v2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn legalize_restores_delaunay_property_after_insertion() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        tri.insert_point(0.0, 0.0).unwrap();
        tri.insert_point(10.0, 0.0).unwrap();
        tri.insert_point(10.0, 1.0).unwrap();
        tri.insert_point(0.0, 10.0).unwrap();
        assert!(tri.check());
        for t1 in tri.graph().triangles().collect::<Vec<_>>() {
            for &e in tri.graph().polygon(t1).edges() {
                let edge = tri.graph().edge(e).clone();
                let Some(t2) = edge.other_polygon(t1) else { continue };
                let apex = opposite_vertex(&tri, t2, e).unwrap();
                let verts: Vec<_> = tri.graph().polygon(t1).vertices().to_vec();
                let positions = [
                    tri.graph().position(verts[0]),
                    tri.graph().position(verts[1]),
                    tri.graph().position(verts[2]),
                ];
                let (center, radius) = crate::geometry::circumcircle(positions[0], positions[1], positions[2]).unwrap();
                assert!(crate::geometry::in_circle(tri.graph().position(apex), center, radius) <= 0);
            }
        }
    }

    #[test]
    fn legalize_never_touches_segment_or_frozen_edges() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        let v0 = tri.insert_point(0.0, 0.0).unwrap();
        let v1 = tri.insert_point(10.0, 0.0).unwrap();
        tri.insert_point(10.0, 1.0).unwrap();
        tri.insert_point(0.0, 10.0).unwrap();
        let e = tri.graph().find_edge(v0, v1).unwrap();
        tri.graph_mut().edge_mut(e).is_segment = true;
        legalize(&mut tri, &[e]);
        assert!(tri.graph().edge_exists(e));
    }
}
