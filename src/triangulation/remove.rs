//! Point removal (§4.3.9): the refinement loop's way of undoing a Steiner insertion that
//! turned out to sit too close to a segment it just helped split.

use super::fixup;
use super::Triangulation;
use crate::geometry;
use crate::graph::{EdgeId, PolygonId, VertexId};

/// Removes `v` if it is non-precious. Dispatches to the outside-vertex or inside-vertex case
/// depending on whether any incident triangle is flagged `is_outside`. Returns the triangles
/// freshly created by the removal, queued for the caller's fix-up pass.
pub fn remove_vertex(tri: &mut Triangulation, v: VertexId) -> Vec<PolygonId> {
    if tri.graph().is_precious(v) {
        return Vec::new();
    }
    let touches_outside = tri.graph().vertex(v).incident_edges().iter().any(|&e| {
        tri.graph()
            .edge(e)
            .polygons()
            .any(|p| tri.graph().polygon(p).is_outside)
    });
    if touches_outside {
        remove_outside_vertex(tri, v)
    } else {
        remove_inside_vertex(tri, v)
    }
}

/// `v` borders at least one outside triangle: unlink its whole polygon star and refill the
/// resulting pocket by walking the boundary and closing concave corners one triangle at a
/// time (§4.3.9's "fill concave corners").
fn remove_outside_vertex(tri: &mut Triangulation, v: VertexId) -> Vec<PolygonId> {
    let star: Vec<PolygonId> = tri
        .graph()
        .vertex(v)
        .incident_edges()
        .iter()
        .flat_map(|&e| tri.graph().edge(e).polygons().collect::<Vec<_>>())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    let is_outside_any = star.iter().any(|&p| tri.graph().polygon(p).is_outside);

    // Boundary loop of the pocket left behind once `v` and its star are removed: ordered
    // vertices around the hole, excluding `v` itself.
    let mut boundary: Vec<VertexId> = Vec::new();
    {
        let incident_edges = tri.graph().vertex(v).incident_edges().to_vec();
        let mut neighbours: Vec<VertexId> = incident_edges
            .iter()
            .map(|&e| tri.graph().edge(e).other_endpoint(v).unwrap())
            .collect();
        // Order neighbours by walking shared triangles, starting anywhere.
        if let Some(&first) = neighbours.first() {
            boundary.push(first);
            let mut current = first;
            let mut guard = neighbours.len() + 1;
            while boundary.len() < neighbours.len() && guard > 0 {
                guard -= 1;
                let next = neighbours.iter().copied().find(|&n| {
                    n != current
                        && !boundary.contains(&n)
                        && star.iter().any(|&t| {
                            let poly = tri.graph().polygon(t);
                            poly.vertices().contains(&current) && poly.vertices().contains(&n)
                        })
                });
                match next {
                    Some(n) => {
                        boundary.push(n);
                        current = n;
                    }
                    None => break,
                }
            }
        }
        neighbours.clear();
    }

    let edges_to_destroy: Vec<EdgeId> = tri
        .graph()
        .vertex(v)
        .incident_edges()
        .to_vec();
    for &t in &star {
        tri.graph_mut().destroy_triangle(t);
    }
    for &e in &edges_to_destroy {
        tri.graph_mut().destroy_edge(e);
    }
    tri.graph_mut().destroy_vertex(v);

    fill_concave_corners(tri, &boundary, is_outside_any)
}

/// Fan-triangulates the remaining boundary loop by repeatedly closing off whichever corner is
/// concave (detectable via the opposite-vertex side test), until two points remain.
fn fill_concave_corners(tri: &mut Triangulation, boundary: &[VertexId], is_outside: bool) -> Vec<PolygonId> {
    let mut ring = boundary.to_vec();
    let mut new_triangles = Vec::new();
    let mut guard = ring.len() * ring.len() + 4;
    while ring.len() > 2 && guard > 0 {
        guard -= 1;
        let n = ring.len();
        let mut closed_any = false;
        for i in 0..n {
            if ring.len() <= 2 {
                break;
            }
            let len = ring.len();
            let prev = ring[(i + len - 1) % len];
            let cur = ring[i % len];
            let next = ring[(i + 1) % len];
            let a = tri.graph().position(prev);
            let b = tri.graph().position(cur);
            let c = tri.graph().position(next);
            if geometry::side_of(a, b, c) == 1 {
                // `cur` is a reflex-free ("ear") corner relative to this boundary orientation;
                // close it with a new edge prev-next and a new triangle.
                let e_prev = tri
                    .graph()
                    .find_edge(prev, cur)
                    .unwrap_or_else(|| tri.graph_mut().create_edge(prev, cur));
                let e_next = tri
                    .graph()
                    .find_edge(cur, next)
                    .unwrap_or_else(|| tri.graph_mut().create_edge(cur, next));
                let e_new = tri.graph_mut().create_edge(prev, next);
                let t = tri.graph_mut().create_triangle(e_prev, e_next, e_new);
                tri.graph_mut().polygon_mut(t).is_outside = is_outside;
                new_triangles.push(t);
                let idx = ring.iter().position(|&x| x == cur).unwrap();
                ring.remove(idx);
                closed_any = true;
                break;
            }
        }
        if !closed_any {
            break;
        }
    }
    new_triangles
}

/// `v` is interior: flip incident edges away until it has exactly three incident edges, then
/// merge the remaining star into a single triangle.
fn remove_inside_vertex(tri: &mut Triangulation, v: VertexId) -> Vec<PolygonId> {
    let mut guard = 64;
    while tri.graph().vertex(v).degree() > 3 && guard > 0 {
        guard -= 1;
        if !flip_one_edge_away(tri, v) {
            break; // no legal flip found; give up gracefully rather than loop forever
        }
    }

    let incident = tri.graph().vertex(v).incident_edges().to_vec();
    if incident.len() != 3 {
        return Vec::new();
    }
    let triangles: Vec<PolygonId> = incident
        .iter()
        .flat_map(|&e| tri.graph().edge(e).polygons().collect::<Vec<_>>())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    let is_outside = triangles
        .first()
        .map(|&t| tri.graph().polygon(t).is_outside)
        .unwrap_or(false);
    let outer_vertices: Vec<VertexId> = incident
        .iter()
        .map(|&e| tri.graph().edge(e).other_endpoint(v).unwrap())
        .collect();
    if outer_vertices.len() != 3 {
        return Vec::new();
    }

    let new_edges: Vec<EdgeId> = (0..3)
        .map(|i| {
            let a = outer_vertices[i];
            let b = outer_vertices[(i + 1) % 3];
            tri.graph()
                .find_edge(a, b)
                .unwrap_or_else(|| tri.graph_mut().create_edge(a, b))
        })
        .collect();

    for t in triangles {
        tri.graph_mut().destroy_triangle(t);
    }
    for &e in &incident {
        tri.graph_mut().destroy_edge(e);
    }
    tri.graph_mut().destroy_vertex(v);

    let t = tri
        .graph_mut()
        .create_triangle(new_edges[0], new_edges[1], new_edges[2]);
    tri.graph_mut().polygon_mut(t).is_outside = is_outside;
    vec![t]
}

/// Finds one far edge (opposite `v` in one of its incident triangles) whose flip is legal --
/// a convex quad and not a segment -- and flips it, reducing `v`'s degree by one.
fn flip_one_edge_away(tri: &mut Triangulation, v: VertexId) -> bool {
    let incident = tri.graph().vertex(v).incident_edges().to_vec();
    let triangles: Vec<PolygonId> = incident
        .iter()
        .flat_map(|&e| tri.graph().edge(e).polygons().collect::<Vec<_>>())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect();
    for t in triangles {
        let far_edge = tri
            .graph()
            .polygon(t)
            .edges()
            .iter()
            .copied()
            .find(|&e| !tri.graph().edge(e).has_vertex(v));
        let Some(far_edge) = far_edge else { continue };
        let edge = tri.graph().edge(far_edge).clone();
        if edge.is_segment || edge.frozen {
            continue;
        }
        let (t1, t2) = match (edge.left, edge.right) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        if !can_flip(tri, t1, t2, far_edge) {
            continue;
        }
        if fixup::flip(tri, far_edge, t1, t2).is_some() {
            return true;
        }
    }
    false
}

/// A flip is geometrically legal iff the quadrilateral formed by the two triangles adjacent
/// to `e` is convex.
fn can_flip(tri: &Triangulation, t1: PolygonId, t2: PolygonId, e: EdgeId) -> bool {
    let edge = tri.graph().edge(e);
    let (v1, v2) = (edge.v1, edge.v2);
    let Some(u1) = fixup::opposite_vertex(tri, t1, e) else {
        return false;
    };
    let Some(u2) = fixup::opposite_vertex(tri, t2, e) else {
        return false;
    };
    let p1 = tri.graph().position(v1);
    let p2 = tri.graph().position(v2);
    let pu1 = tri.graph().position(u1);
    let pu2 = tri.graph().position(u2);
    geometry::side_of(p1, p2, pu1) != geometry::side_of(p1, p2, pu2)
        && geometry::side_of(pu1, pu2, p1) != geometry::side_of(pu1, pu2, p2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::triangulation::Triangulation;

    #[test]
    fn remove_interior_vertex_restores_a_single_triangle() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        tri.insert_point(0.0, 0.0).unwrap();
        tri.insert_point(10.0, 0.0).unwrap();
        tri.insert_point(10.0, 10.0).unwrap();
        tri.insert_point(0.0, 10.0).unwrap();
        let center = tri.insert_point(5.0, 5.0).unwrap();
        assert!(tri.check());
        let before = tri.graph().num_polygons();
        assert!(before >= 4);
        remove_vertex(&mut tri, center);
        assert!(tri.check());
        assert!(!tri.graph().vertices().any(|v| v == center));
    }

    #[test]
    fn remove_vertex_is_a_no_op_for_precious_vertices() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        tri.insert_point(0.0, 0.0).unwrap();
        tri.insert_point(10.0, 0.0).unwrap();
        tri.insert_point(10.0, 10.0).unwrap();
        tri.insert_point(0.0, 10.0).unwrap();
        let center = tri.insert_point(5.0, 5.0).unwrap();
        tri.graph_mut().set_precious(center, 0);
        let before = tri.graph().num_polygons();
        let created = remove_vertex(&mut tri, center);
        assert!(created.is_empty());
        assert_eq!(tri.graph().num_polygons(), before);
        assert!(tri.graph().vertices().any(|v| v == center));
    }
}
