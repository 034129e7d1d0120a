//! The closest-edge "walk" (§4.3.4) and the line-of-vertices query it underpins.

use super::Triangulation;
use crate::geometry::{self, Point};
use crate::graph::{EdgeId, VertexId};

/// Finds the edge closest to `target`, walking from a seed vertex. `inside_only` restricts
/// the walk to edges that are segments or border an interior triangle, and that actually
/// cross the ray from the seed to the target -- used by refinement to stay on the line of
/// sight.
pub fn find_closest_edge(
    tri: &mut Triangulation,
    seed: VertexId,
    target: Point,
    inside_only: bool,
) -> EdgeId {
    let mut current = seed;
    let mut current_pos = tri.graph.position(current);
    loop {
        let incident: Vec<EdgeId> = tri.graph.vertex(current).incident_edges().to_vec();
        let mut best: Option<(EdgeId, f64, VertexId)> = None;
        for eid in incident {
            let edge = tri.graph.edge(eid);
            if inside_only && !edge_is_eligible_for_inside_walk(tri, eid, current_pos, target) {
                continue;
            }
            let other = edge.other_endpoint(current).unwrap();
            let other_pos = tri.graph.position(other);
            let dist = distance_point_to_segment(target, current_pos, other_pos);
            match best {
                None => best = Some((eid, dist, other)),
                Some((_, best_dist, _)) => {
                    if dist < best_dist - geometry::EPSILON {
                        best = Some((eid, dist, other));
                    } else if (dist - best_dist).abs() <= geometry::EPSILON {
                        // Tie-break: prefer the edge that bends further toward the target.
                        let (_, _, other_b) = best.unwrap();
                        let bend_a = bend_toward(target, current_pos, other_pos);
                        let bend_b = bend_toward(target, current_pos, tri.graph.position(other_b));
                        if bend_a > bend_b {
                            best = Some((eid, dist, other));
                        }
                    }
                }
            }
        }
        match best {
            None => {
                // No incident edge qualifies (can happen transiently at the hull under
                // inside_only); fall back to the overall closest incident edge.
                let incident = tri.graph.vertex(current).incident_edges().to_vec();
                return *incident
                    .iter()
                    .min_by(|&&a, &&b| {
                        let da = edge_point_distance(tri, a, target);
                        let db = edge_point_distance(tri, b, target);
                        da.partial_cmp(&db).unwrap()
                    })
                    .expect("vertex has no incident edges");
            }
            Some((eid, dist, other)) => {
                tri.graph_mut().record_hop();
                if dist >= distance_point_to_point(current_pos, target) {
                    return eid;
                }
                current = other;
                current_pos = tri.graph.position(current);
            }
        }
    }
}

fn distance_point_to_point(a: Point, b: Point) -> f64 {
    a.dist(b)
}

fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let d = b.sub(a);
    let len2 = d.dot(d);
    if len2 <= geometry::EPSILON {
        return p.dist(a);
    }
    let t = ((p.sub(a)).dot(d) / len2).clamp(0.0, 1.0);
    let proj = a.add(d.scale(t));
    p.dist(proj)
}

fn bend_toward(target: Point, common: Point, other: Point) -> f64 {
    let dir = other.sub(common);
    let len = dir.norm();
    if len <= geometry::EPSILON {
        return f64::NEG_INFINITY;
    }
    target.sub(common).dot(dir) / len
}

fn edge_point_distance(tri: &Triangulation, e: EdgeId, p: Point) -> f64 {
    let edge = tri.graph.edge(e);
    distance_point_to_segment(p, tri.graph.position(edge.v1), tri.graph.position(edge.v2))
}

fn edge_is_eligible_for_inside_walk(
    tri: &Triangulation,
    e: EdgeId,
    from: Point,
    target: Point,
) -> bool {
    let edge = tri.graph.edge(e);
    let has_interior_triangle = edge
        .polygons()
        .any(|p| tri.graph.polygon(p).is_triangle() && !tri.graph.polygon(p).is_outside);
    if !edge.is_segment && !has_interior_triangle {
        return false;
    }
    let v1 = tri.graph.position(edge.v1);
    let v2 = tri.graph.position(edge.v2);
    geometry::crosses_including(from, target, v1, v2)
}

/// §4.3.2: ordered vertices along the half-line from `p1` to `p2`, stopping once past `p2`.
/// `p1` must already be a vertex; if not, `p1`/`p2` are swapped and retried. Empty if neither
/// endpoint exists.
pub fn find_vertexes_along_line(tri: &Triangulation, p1: Point, p2: Point) -> Vec<VertexId> {
    let (start, end) = match (tri.find_vertex_for_point(p1), tri.find_vertex_for_point(p2)) {
        (Some(v), _) => (v, p2),
        (None, Some(v)) => (v, p1),
        (None, None) => return Vec::new(),
    };

    let mut result = vec![start];
    let start_pos = tri.graph.position(start);
    let dir = end.sub(start_pos);
    let dir_len = dir.norm();
    if dir_len <= geometry::EPSILON {
        return result;
    }
    let dir_unit = dir.scale(1.0 / dir_len);

    let mut current = start;
    loop {
        let current_pos = tri.graph.position(current);
        let incident = tri.graph.vertex(current).incident_edges().to_vec();
        let mut next = None;
        for eid in incident {
            let edge = tri.graph.edge(eid);
            let other = edge.other_endpoint(current).unwrap();
            let other_pos = tri.graph.position(other);
            let along = other_pos.sub(current_pos);
            let proj = along.dot(dir_unit);
            if proj <= geometry::EPSILON {
                continue;
            }
            let perp = along.sub(dir_unit.scale(proj)).norm();
            if perp <= geometry::scaled_epsilon(along.x, along.y) {
                next = Some((other, other_pos));
                break;
            }
        }
        match next {
            None => break,
            Some((v, pos)) => {
                result.push(v);
                let traveled = pos.sub(start_pos).dot(dir_unit);
                if traveled >= dir_len - geometry::EPSILON {
                    break;
                }
                current = v;
            }
        }
    }
    result
}
