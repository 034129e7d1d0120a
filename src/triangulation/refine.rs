//! Chew-style quality refinement (§4.3.10): iteratively finds an invalid triangle, computes
//! its circumcenter, and either inserts it directly, snaps it onto a nearby segment midpoint,
//! or splits the segment it's too close to and cleans up vertices the split circle engulfs.

use super::{fixup, remove, walk, Triangulation, TriangulationParameters};
use crate::geometry::{self, Point};
use crate::graph::{EdgeId, PolygonId, VertexId};

const SEGMENT_SNAP_FRACTION: f64 = 0.001;

pub fn refine(tri: &mut Triangulation, params: &TriangulationParameters) {
    if params.min_b <= geometry::EPSILON && params.max_area <= geometry::EPSILON && params.max_area_border <= geometry::EPSILON {
        return;
    }

    let mut candidates: Vec<PolygonId> = tri
        .graph()
        .triangles()
        .filter(|&t| !tri.graph().polygon(t).is_outside)
        .collect();
    let mut iterations = 0usize;

    while iterations < params.max_iterations {
        let invalid: Vec<PolygonId> = candidates
            .iter()
            .copied()
            .filter(|&t| tri.graph().is_live(t) && is_invalid(tri, t, params))
            .collect();
        if invalid.is_empty() {
            break;
        }

        let mut fresh = Vec::new();
        for t in invalid {
            if iterations >= params.max_iterations {
                break;
            }
            if !tri.graph().is_live(t) || !is_invalid(tri, t, params) {
                continue;
            }
            iterations += 1;
            fresh.extend(refine_one(tri, t, params));
        }
        candidates = fresh
            .into_iter()
            .filter(|&t| tri.graph().is_live(t) && !tri.graph().polygon(t).is_outside)
            .collect();
    }

    if iterations >= params.max_iterations {
        log::warn!("refine: stopped at max_iterations={} with invalid triangles remaining", params.max_iterations);
    }

    if params.mark_triangles {
        mark_triangles(tri, params);
    }
}

/// Handles one invalid triangle, returning the triangles freshly created that should be
/// re-examined next pass.
fn refine_one(tri: &mut Triangulation, t: PolygonId, params: &TriangulationParameters) -> Vec<PolygonId> {
    let verts = tri.graph().polygon(t).vertices().to_vec();
    if verts.len() != 3 {
        return Vec::new();
    }
    let positions = [
        tri.graph().position(verts[0]),
        tri.graph().position(verts[1]),
        tri.graph().position(verts[2]),
    ];
    let Ok((center, _radius)) = geometry::circumcircle(positions[0], positions[1], positions[2]) else {
        return Vec::new();
    };

    if contains_point_or_on_boundary(tri, t, center) {
        let snapped = snap_to_segment_midpoint(tri, t, center);
        return new_triangles_around_insert(tri, snapped);
    }

    let vstart = pick_vstart(tri, t, center);
    let closest = walk::find_closest_edge(tri, vstart, center, true);
    let edge = tri.graph().edge(closest).clone();

    let same_side = edge.polygons().any(|p| {
        if let Some(apex) = fixup::opposite_vertex(tri, p, closest) {
            let a = tri.graph().position(edge.v1);
            let b = tri.graph().position(edge.v2);
            geometry::side_of(a, b, tri.graph().position(apex)) == geometry::side_of(a, b, center)
        } else {
            false
        }
    });

    if !edge.is_segment || same_side {
        return new_triangles_around_insert(tri, center);
    }

    let half_len = tri.graph().edge_length(closest) * 0.5;
    if half_len < params.min_length {
        return Vec::new(); // splitting further would violate min_length; leave this triangle
    }

    let midpoint = tri.graph().position(edge.v1).midpoint(tri.graph().position(edge.v2));
    let victims = tri.graph().find_inside_circle(midpoint, half_len);
    let Ok(vnew) = tri.insert_point(midpoint.x, midpoint.y) else {
        return Vec::new();
    };
    let mut created = Vec::new();
    for victim in victims {
        if victim == vnew || tri.graph().is_precious(victim) {
            continue;
        }
        let touches_segment = tri
            .graph()
            .vertex(victim)
            .incident_edges()
            .iter()
            .any(|&e| tri.graph().edge(e).is_segment);
        if touches_segment {
            continue;
        }
        created.extend(remove::remove_vertex(tri, victim));
    }
    created.extend(new_triangles_around(tri, vnew));
    created
}

fn new_triangles_around_insert(tri: &mut Triangulation, p: Point) -> Vec<PolygonId> {
    match tri.insert_point(p.x, p.y) {
        Ok(v) => new_triangles_around(tri, v),
        Err(_) => Vec::new(),
    }
}

fn new_triangles_around(tri: &Triangulation, v: VertexId) -> Vec<PolygonId> {
    tri.graph()
        .vertex(v)
        .incident_edges()
        .iter()
        .flat_map(|&e| tri.graph().edge(e).polygons().collect::<Vec<_>>())
        .collect::<std::collections::HashSet<_>>()
        .into_iter()
        .collect()
}

/// If `center` lies within `SEGMENT_SNAP_FRACTION` of a segment edge's length from that edge's
/// midpoint, snaps to the midpoint instead -- avoids a near-duplicate vertex crowding the
/// segment.
fn snap_to_segment_midpoint(tri: &Triangulation, t: PolygonId, center: Point) -> Point {
    for &e in tri.graph().polygon(t).edges() {
        let edge = tri.graph().edge(e);
        if !edge.is_segment {
            continue;
        }
        let a = tri.graph().position(edge.v1);
        let b = tri.graph().position(edge.v2);
        let length = a.dist(b);
        let midpoint = a.midpoint(b);
        if center.dist(midpoint) <= SEGMENT_SNAP_FRACTION * length {
            return midpoint;
        }
    }
    center
}

fn contains_point_or_on_boundary(tri: &Triangulation, t: PolygonId, p: Point) -> bool {
    let verts = tri.graph().polygon(t).vertices();
    let n = verts.len();
    for i in 0..n {
        let a = tri.graph().position(verts[i]);
        let b = tri.graph().position(verts[(i + 1) % n]);
        if geometry::side_of(a, b, p) == -1 {
            return false;
        }
    }
    true
}

/// Finds the triangle vertex beyond whichever edge `center` falls outside of -- the seed for
/// the walk toward `center`.
fn pick_vstart(tri: &Triangulation, t: PolygonId, center: Point) -> VertexId {
    let verts = tri.graph().polygon(t).vertices().to_vec();
    let n = verts.len();
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let apex = verts[(i + 2) % n];
        let pa = tri.graph().position(a);
        let pb = tri.graph().position(b);
        let papex = tri.graph().position(apex);
        let s_apex = geometry::side_of(pa, pb, papex);
        let s_center = geometry::side_of(pa, pb, center);
        if s_apex != 0 && s_center != 0 && s_apex != s_center {
            return a;
        }
    }
    verts[0]
}

fn shortest_edge_length(tri: &Triangulation, t: PolygonId) -> f64 {
    tri.graph()
        .polygon(t)
        .edges()
        .iter()
        .map(|&e| tri.graph().edge_length(e))
        .fold(f64::INFINITY, f64::min)
}

fn triangle_area(positions: &[Point; 3]) -> f64 {
    geometry::signed_area2(positions[0], positions[1], positions[2]).abs() * 0.5
}

fn has_segment(tri: &Triangulation, t: PolygonId) -> bool {
    tri.graph().polygon(t).edges().iter().any(|&e| tri.graph().edge(e).is_segment)
}

/// Shortest-edge / circumradius ratio; `f64::INFINITY` if the triangle is degenerate.
fn skinny_ratio(tri: &Triangulation, t: PolygonId) -> f64 {
    let verts = tri.graph().polygon(t).vertices();
    if verts.len() != 3 {
        return f64::INFINITY;
    }
    let positions = [
        tri.graph().position(verts[0]),
        tri.graph().position(verts[1]),
        tri.graph().position(verts[2]),
    ];
    match geometry::circumcircle(positions[0], positions[1], positions[2]) {
        Ok((_, radius)) if radius > geometry::EPSILON => shortest_edge_length(tri, t) / radius,
        _ => f64::INFINITY,
    }
}

fn is_invalid(tri: &Triangulation, t: PolygonId, params: &TriangulationParameters) -> bool {
    if params.min_b > geometry::EPSILON {
        let b = skinny_ratio(tri, t);
        if b < params.min_b - (b + params.min_b) * geometry::EPSILON {
            return true;
        }
    }
    let area_cap = if has_segment(tri, t) && params.max_area_border > geometry::EPSILON {
        params.max_area_border
    } else {
        params.max_area
    };
    if area_cap > geometry::EPSILON {
        let verts = tri.graph().polygon(t).vertices();
        if verts.len() == 3 {
            let positions = [
                tri.graph().position(verts[0]),
                tri.graph().position(verts[1]),
                tri.graph().position(verts[2]),
            ];
            let area = triangle_area(&positions);
            if area > area_cap + (area + area_cap) * geometry::EPSILON {
                return true;
            }
        }
    }
    false
}

/// §11.2: overwrites each non-outside triangle's `id` with a bitfield: bit 0 skinny, bit 1
/// over the area cap, bit 2 non-Delaunay (its circumcircle strictly contains another vertex).
fn mark_triangles(tri: &mut Triangulation, params: &TriangulationParameters) {
    let triangles: Vec<PolygonId> = tri.graph().triangles().collect();
    for t in triangles {
        if tri.graph().polygon(t).is_outside {
            continue;
        }
        let verts = tri.graph().polygon(t).vertices().to_vec();
        if verts.len() != 3 {
            continue;
        }
        let positions = [
            tri.graph().position(verts[0]),
            tri.graph().position(verts[1]),
            tri.graph().position(verts[2]),
        ];
        let mut bits = 0u64;
        if params.min_b > geometry::EPSILON && skinny_ratio(tri, t) < params.min_b {
            bits |= 0b001;
        }
        let area_cap = if has_segment(tri, t) && params.max_area_border > geometry::EPSILON {
            params.max_area_border
        } else {
            params.max_area
        };
        if area_cap > geometry::EPSILON && triangle_area(&positions) > area_cap {
            bits |= 0b010;
        }
        if let Ok((center, radius)) = geometry::circumcircle(positions[0], positions[1], positions[2]) {
            let extra = tri
                .graph()
                .find_inside_circle(center, radius)
                .into_iter()
                .any(|v| !verts.contains(&v));
            if extra {
                bits |= 0b100;
            }
        }
        tri.graph_mut().polygon_mut(t).id = bits;
    }
}
