//! Essential-edge labeling (§4.4.2 step 4): Hertel-Mehlhorn's greedy, longest-edge-first
//! absorption of reflex-corner diagonals.

use super::concave::ConcaveCorner;
use crate::geometry::{self, Point};
use crate::graph::EdgeId;
use crate::triangulation::Triangulation;
use ordered_float::OrderedFloat;
use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

const ANGLE_EPSILON: f64 = 1e-9;

/// Returns the set of edges that must survive triangle coalescing to keep every resulting
/// polygon convex.
pub fn label_essential_edges(tri: &Triangulation, corners: &[ConcaveCorner], split_edges: bool) -> HashSet<EdgeId> {
    let threshold = if split_edges { PI + ANGLE_EPSILON } else { PI - ANGLE_EPSILON };
    let mut essential = HashSet::new();

    for corner in corners {
        let v = corner.vertex;
        let v_pos = tri.graph().position(v);
        let prev = tri.graph().position(tri.graph().edge(corner.incoming).other_endpoint(v).unwrap());
        let next = tri.graph().position(tri.graph().edge(corner.outgoing).other_endpoint(v).unwrap());

        let diagonals: Vec<EdgeId> = tri
            .graph()
            .vertex(v)
            .incident_edges()
            .iter()
            .copied()
            .filter(|&e| e != corner.incoming && e != corner.outgoing && !tri.graph().edge(e).is_segment)
            .collect();

        // Nothing to absorb: both bounding segments stay essential by construction (they are
        // never candidates here, only the diagonals are).
        if diagonals.is_empty() {
            continue;
        }

        let base = atan2_of(v_pos, prev);
        let last_angle = atan2_of(v_pos, next);
        let last_ccw = angle_from(base, last_angle);
        let use_ccw = last_ccw > PI;
        let key_of = |p: Point| -> f64 {
            let raw = angle_from(base, atan2_of(v_pos, p));
            if use_ccw { raw } else { TAU - raw }
        };

        // Fixed nodes: index 0 = incoming (key 0), last = outgoing (key ~ last span); diagonals
        // sorted by angular position between them.
        let mut nodes: Vec<(f64, Option<EdgeId>)> = diagonals
            .iter()
            .map(|&e| {
                let other = tri.graph().edge(e).other_endpoint(v).unwrap();
                (key_of(tri.graph().position(other)), Some(e))
            })
            .collect();
        nodes.sort_by_key(|n| OrderedFloat(n.0));
        nodes.insert(0, (0.0, None));
        nodes.push((key_of(next), None));

        // present[i] tracks whether node i is still in the fan (segments always present).
        let mut present = vec![true; nodes.len()];

        // Greedy absorption order: diagonals by decreasing edge length, ties by edge id.
        let mut order: Vec<usize> = (1..nodes.len() - 1).collect();
        order.sort_by_key(|&i| {
            let e = nodes[i].1.unwrap();
            (OrderedFloat(-tri.graph().edge_length(e)), e)
        });

        for i in order {
            let prev_idx = (0..i).rev().find(|&j| present[j]).unwrap();
            let next_idx = (i + 1..nodes.len()).find(|&j| present[j]).unwrap();
            let span = nodes[next_idx].0 - nodes[prev_idx].0;
            if span < threshold {
                present[i] = false; // absorbed: not essential
            }
        }

        for i in 1..nodes.len() - 1 {
            if present[i] {
                essential.insert(nodes[i].1.unwrap());
            }
        }
    }

    essential
}

fn atan2_of(origin: Point, p: Point) -> f64 {
    let d = p.sub(origin);
    d.y.atan2(d.x)
}

fn angle_from(base: f64, ang: f64) -> f64 {
    let mut d = ang - base;
    while d < 0.0 {
        d += TAU;
    }
    while d >= TAU {
        d -= TAU;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::concave::collect_concave_corners;
    use crate::graph::Graph;
    use crate::triangulation::Triangulation;

    #[test]
    fn l_shape_essential_edges_include_both_boundary_segments_of_the_corner() {
        let mut g = Graph::new();
        let mut tri = Triangulation::new(&mut g);
        tri.init_box(crate::geometry::Rect::new(-10.0, -10.0, 10.0, 10.0));
        let contour = [
            (0.0, 0.0),
            (6.0, 0.0),
            (6.0, 3.0),
            (3.0, 3.0),
            (3.0, 6.0),
            (0.0, 6.0),
        ];
        let verts: Vec<_> = contour.iter().map(|&(x, y)| tri.insert_point(x, y).unwrap()).collect();
        tri.constrain(&[verts]);
        let corners = collect_concave_corners(&tri);
        assert_eq!(corners.len(), 1);
        let essential = label_essential_edges(&tri, &corners, false);
        // At least one diagonal at the reflex corner must stay essential, or the two
        // half-triangles on either side of the concavity would coalesce into a non-convex piece.
        assert!(!essential.is_empty());
    }
}

