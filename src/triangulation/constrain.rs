//! Constraint insertion (§4.3.6/§4.3.7) and `constrain` (§4.3.8): forcing polygon edges to
//! appear as segments, flooding `is_outside`, and cleaning up T-junctions.

use super::{fixup, insert};
use super::Triangulation;
use crate::geometry;
use crate::graph::{EdgeId, PolygonId, VertexId};
use std::collections::HashSet;

/// Ensures the vertex pair `(from, to)` is an edge of the graph (splitting/flipping/inserting
/// as needed), returning the chain of graph edges covering it in order, each tagged with the
/// local traversal direction matching `from -> to`.
pub fn ensure_edge(
    tri: &mut Triangulation,
    from: VertexId,
    to: VertexId,
) -> Vec<(EdgeId, VertexId, VertexId)> {
    if let Some(e) = tri.graph().find_edge(from, to) {
        tri.graph_mut().edge_mut(e).frozen = true;
        return vec![(e, from, to)];
    }

    let crossing = crossing_edges(tri, from, to);
    if crossing.is_empty() {
        // The walk failed to find a path (should not happen in a valid triangulation); fall
        // back to a direct edge rather than leaving the constraint unsatisfied.
        log::warn!("ensure_edge: no crossing edges found between existing, non-adjacent vertices");
        let e = tri.graph_mut().create_edge(from, to);
        tri.graph_mut().edge_mut(e).frozen = true;
        return vec![(e, from, to)];
    }

    if crossing.len() == 1 {
        let e = crossing[0];
        let edge = tri.graph().edge(e).clone();
        let from_pos = tri.graph().position(from);
        let to_pos = tri.graph().position(to);
        let v1 = tri.graph().position(edge.v1);
        let v2 = tri.graph().position(edge.v2);
        let touches = geometry::side_of(from_pos, to_pos, v1) == 0 || geometry::side_of(from_pos, to_pos, v2) == 0;
        if !touches {
            if let (Some(t1), Some(t2)) = (edge.left, edge.right) {
                if fixup::flip(tri, e, t1, t2).is_some() {
                    if let Some(new_e) = tri.graph().find_edge(from, to) {
                        tri.graph_mut().edge_mut(new_e).frozen = true;
                        return vec![(new_e, from, to)];
                    }
                }
            }
        }
    }

    // Pick the crossing edge whose intersection with from->to is closest to the segment
    // midpoint.
    let from_pos = tri.graph().position(from);
    let to_pos = tri.graph().position(to);
    let mid = from_pos.midpoint(to_pos);
    let mut best: Option<(EdgeId, crate::geometry::Point, f64)> = None;
    for &e in &crossing {
        let edge = tri.graph().edge(e);
        let v1 = tri.graph().position(edge.v1);
        let v2 = tri.graph().position(edge.v2);
        if let Some(ip) = geometry::intersection_point(from_pos, to_pos, v1, v2) {
            let d = ip.dist(mid);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((e, ip, d));
            }
        }
    }
    let Some((e, ip, _)) = best else {
        log::warn!("ensure_edge: crossing edges reported but none actually intersect");
        let e = tri.graph_mut().create_edge(from, to);
        tri.graph_mut().edge_mut(e).frozen = true;
        return vec![(e, from, to)];
    };

    let edge = tri.graph().edge(e).clone();
    let v1 = tri.graph().position(edge.v1);
    let v2 = tri.graph().position(edge.v2);
    let split = if geometry::side_of(from_pos, to_pos, v1) == 0 {
        edge.v1
    } else if geometry::side_of(from_pos, to_pos, v2) == 0 {
        edge.v2
    } else {
        insert::insert_point(tri, ip).expect("Steiner insertion on an interior point cannot fail")
    };

    let mut result = ensure_edge(tri, from, split);
    result.extend(ensure_edge(tri, split, to));
    result
}

/// Walks from `from`'s incident triangles, crossing edges that intersect the line
/// `from -> to`, until reaching a triangle containing `to`.
fn crossing_edges(tri: &Triangulation, from: VertexId, to: VertexId) -> Vec<EdgeId> {
    let from_pos = tri.graph().position(from);
    let to_pos = tri.graph().position(to);
    let mut result = Vec::new();

    let incident_triangles: HashSet<PolygonId> = tri
        .graph()
        .vertex(from)
        .incident_edges()
        .iter()
        .flat_map(|&e| tri.graph().edge(e).polygons().collect::<Vec<_>>())
        .collect();

    let mut start = None;
    for t in incident_triangles {
        let opp = tri
            .graph()
            .polygon(t)
            .edges()
            .iter()
            .copied()
            .find(|&e| !tri.graph().edge(e).has_vertex(from));
        if let Some(opp) = opp {
            let oe = tri.graph().edge(opp);
            let v1 = tri.graph().position(oe.v1);
            let v2 = tri.graph().position(oe.v2);
            if geometry::crosses_including(from_pos, to_pos, v1, v2) {
                start = Some((t, opp));
                break;
            }
        }
    }
    let Some((mut t, mut e)) = start else {
        return result;
    };

    loop {
        result.push(e);
        let edge = tri.graph().edge(e).clone();
        let Some(next_t) = edge.other_polygon(t) else {
            break;
        };
        if tri.graph().polygon(next_t).vertices().contains(&to) {
            break;
        }
        let next_edge = tri
            .graph()
            .polygon(next_t)
            .edges()
            .iter()
            .copied()
            .find(|&ee| {
                if ee == e {
                    return false;
                }
                let oe = tri.graph().edge(ee);
                let v1 = tri.graph().position(oe.v1);
                let v2 = tri.graph().position(oe.v2);
                geometry::crosses_including(from_pos, to_pos, v1, v2)
            });
        match next_edge {
            Some(ee) => {
                t = next_t;
                e = ee;
            }
            None => break,
        }
    }
    result
}

/// §4.3.8: forces every contour edge to exist as a segment, marks the side that falls outside
/// the region, floods that flag across non-segment edges, and cleans up resulting
/// T-junctions.
pub fn constrain(tri: &mut Triangulation, contours: &[Vec<VertexId>]) {
    let mut chains: Vec<Vec<(EdgeId, VertexId, VertexId)>> = Vec::with_capacity(contours.len());
    for contour in contours {
        let mut chain = Vec::new();
        let n = contour.len();
        for i in 0..n {
            if n < 2 {
                break;
            }
            let from = contour[i];
            let to = contour[(i + 1) % n];
            if from == to {
                continue;
            }
            chain.extend(ensure_edge(tri, from, to));
        }
        chains.push(chain);
    }

    for p in tri.graph().polygons().collect::<Vec<_>>() {
        tri.graph_mut().polygon_mut(p).is_outside = false;
    }
    for e in tri.graph().edges().collect::<Vec<_>>() {
        tri.graph_mut().edge_mut(e).is_segment = false;
    }

    let mut seed: Vec<PolygonId> = Vec::new();
    for chain in &chains {
        for &(e, local_from, local_to) in chain {
            tri.graph_mut().edge_mut(e).is_segment = true;
            let dir = tri.graph().position(local_to).sub(tri.graph().position(local_from));
            let edge = tri.graph().edge(e).clone();
            let edge_dir = tri.graph().position(edge.v2).sub(tri.graph().position(edge.v1));
            // Contour winds clockwise; the region interior sits to the right of the traversal
            // direction, so the outside triangle is the one on the left.
            let outside_side = if dir.dot(edge_dir) >= 0.0 { edge.left } else { edge.right };
            if let Some(p) = outside_side {
                if !tri.graph().polygon(p).is_outside {
                    tri.graph_mut().polygon_mut(p).is_outside = true;
                    seed.push(p);
                }
            }
        }
    }

    while !seed.is_empty() {
        let mut next_seed = Vec::new();
        for &t in &seed {
            if !tri.graph().is_live(t) {
                continue;
            }
            let edges = tri.graph().polygon(t).edges().to_vec();
            for e in edges {
                let edge = tri.graph().edge(e);
                if edge.is_segment {
                    continue;
                }
                if let Some(other) = edge.other_polygon(t) {
                    if !tri.graph().polygon(other).is_outside {
                        tri.graph_mut().polygon_mut(other).is_outside = true;
                        next_seed.push(other);
                    }
                }
            }
        }
        seed = next_seed;
    }

    join_edges(tri);
}

/// Merges a non-precious, degree-3 vertex sitting between two collinear segment edges (and a
/// single shared far edge) back into a single segment and a single triangle, removing the
/// resulting T-junction.
fn join_edges(tri: &mut Triangulation) {
    loop {
        let candidate = tri.graph().vertices().find_map(|v| {
            if tri.graph().is_precious(v) {
                return None;
            }
            let incident = tri.graph().vertex(v).incident_edges().to_vec();
            if incident.len() != 3 {
                return None;
            }
            let segs: Vec<EdgeId> = incident
                .iter()
                .copied()
                .filter(|&e| tri.graph().edge(e).is_segment)
                .collect();
            if segs.len() != 2 {
                return None;
            }
            let g = incident.iter().copied().find(|&e| !tri.graph().edge(e).is_segment)?;
            let a = tri.graph().edge(segs[0]).other_endpoint(v)?;
            let b = tri.graph().edge(segs[1]).other_endpoint(v)?;
            let pa = tri.graph().position(a);
            let pb = tri.graph().position(b);
            let pv = tri.graph().position(v);
            if geometry::side_of(pa, pb, pv) != 0 {
                return None;
            }
            let c = tri.graph().edge(g).other_endpoint(v)?;
            let t1 = find_triangle_with(tri, &[a, v, c])?;
            let t2 = find_triangle_with(tri, &[v, b, c])?;
            if t1 == t2 {
                return None;
            }
            Some((v, segs[0], segs[1], a, b, c, t1, t2))
        });

        let Some((v, e1, e2, a, b, c, t1, t2)) = candidate else {
            break;
        };
        let is_outside = tri.graph().polygon(t1).is_outside;
        let ac = tri.graph().find_edge(a, c).unwrap();
        let cb = tri.graph().find_edge(c, b).unwrap();
        let g = tri.graph().find_edge(v, c).unwrap();

        tri.graph_mut().destroy_triangle(t1);
        tri.graph_mut().destroy_triangle(t2);
        tri.graph_mut().destroy_edge(e1);
        tri.graph_mut().destroy_edge(e2);
        tri.graph_mut().destroy_edge(g);
        tri.graph_mut().destroy_vertex(v);

        let new_edge = tri.graph_mut().create_edge(a, b);
        tri.graph_mut().edge_mut(new_edge).is_segment = true;
        let t = tri.graph_mut().create_triangle(new_edge, cb, ac);
        tri.graph_mut().polygon_mut(t).is_outside = is_outside;
    }
}

fn find_triangle_with(tri: &Triangulation, verts: &[VertexId; 3]) -> Option<PolygonId> {
    tri.graph().polygons().find(|&t| {
        let poly = tri.graph().polygon(t);
        poly.is_triangle() && verts.iter().all(|v| poly.vertices().contains(v))
    })
}
