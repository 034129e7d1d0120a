//! Convex decomposition (§4.4) on top of a constrained refined triangulation: Hertel-Mehlhorn
//! triangle coalescing into a minimal-ish set of convex polygons.

mod concave;
mod essential;
mod params;

pub use params::ConvexDecompositionParameters;

use crate::error::Result;
use crate::geometry::Point;
use crate::graph::{EdgeId, Graph, PolygonId, VertexId};
use crate::triangulation::{Contour, Triangulation};
use std::collections::HashSet;

/// Convex decomposition engine, attached to a [`Graph`] the same way [`Triangulation`] is.
pub struct ConvexDecomposition<'g> {
    graph: &'g mut Graph,
}

impl<'g> ConvexDecomposition<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        ConvexDecomposition { graph }
    }

    /// Triangulates `contours` (plus optional extra points), then coalesces the result into
    /// convex polygons. `parameters.tri_param.remove_outside_triangles` is always treated as
    /// `false`, regardless of what's set on `parameters`.
    pub fn decompose(
        &mut self,
        contours: &[Contour],
        extra_points: &[Point],
        parameters: &ConvexDecompositionParameters,
    ) -> Result<()> {
        let mut tri_param = parameters.tri_param;
        tri_param.remove_outside_triangles = false;

        let mut tri = Triangulation::new(self.graph);
        tri.triangulate_with_points(contours, extra_points, &tri_param)?;

        let mut corners = concave::collect_concave_corners(&tri);
        if parameters.with_segments {
            let mut guard = 8; // perpendicular cuts can, in principle, create new reflex corners
            while guard > 0 {
                guard -= 1;
                if !concave::insert_perpendicular_cuts(&mut tri, &corners, parameters.split_edges) {
                    break;
                }
                corners = concave::collect_concave_corners(&tri);
            }
        }

        let essential = essential::label_essential_edges(&tri, &corners, parameters.split_edges);
        coalesce(&mut tri, &essential);
        Ok(())
    }
}

/// §4.4.2 steps 5-6: flood-fills connected non-essential, non-segment, non-outside-bordering
/// triangle runs into components, then replaces every triangle in the graph with one polygon
/// per component.
fn coalesce(tri: &mut Triangulation, essential: &HashSet<EdgeId>) {
    let mut visited: HashSet<PolygonId> = HashSet::new();
    let mut components: Vec<(Vec<PolygonId>, Vec<EdgeId>, HashSet<VertexId>)> = Vec::new();

    let all_triangles: Vec<PolygonId> = tri
        .graph()
        .triangles()
        .filter(|&t| !tri.graph().polygon(t).is_outside)
        .collect();

    for &start in &all_triangles {
        if visited.contains(&start) {
            continue;
        }
        visited.insert(start);
        let mut stack = vec![start];
        let mut comp_tris = Vec::new();
        let mut boundary = Vec::new();
        let mut internal_vertices: HashSet<VertexId> = HashSet::new();

        while let Some(t) = stack.pop() {
            comp_tris.push(t);
            for &v in tri.graph().polygon(t).vertices() {
                if tri.graph().is_precious(v) {
                    internal_vertices.insert(v);
                }
            }
            for &e in tri.graph().polygon(t).edges() {
                let edge = tri.graph().edge(e);
                let other = edge.other_polygon(t);
                let crosses_boundary = edge.is_segment
                    || essential.contains(&e)
                    || other.map_or(true, |o| tri.graph().polygon(o).is_outside);
                if crosses_boundary {
                    boundary.push(e);
                } else if let Some(o) = other {
                    if visited.insert(o) {
                        stack.push(o);
                    }
                }
            }
        }
        components.push((comp_tris, boundary, internal_vertices));
    }

    let outside_triangles: Vec<PolygonId> = tri
        .graph()
        .polygons()
        .filter(|&p| tri.graph().polygon(p).is_outside)
        .collect();
    for (comp_tris, _, _) in &components {
        for &t in comp_tris {
            tri.graph_mut().destroy_triangle(t);
        }
    }
    for t in outside_triangles {
        tri.graph_mut().destroy_triangle(t);
    }

    for (_, boundary, internal_vertices) in components {
        let Some(ordered) = order_boundary(tri, &boundary) else {
            log::warn!("convex decomposition: a component's boundary edges did not form a closed loop");
            continue;
        };
        let p = tri.graph_mut().create_polygon(&ordered);
        for v in internal_vertices {
            tri.graph_mut().add_internal_vertex(p, v);
        }
    }

    // Every triangle was torn down; the boundary edges were just re-threaded into the new
    // convex polygons above, but the dissolved interior diagonals (and the outside region's
    // edges/vertices) are left dangling. Drop them rather than leaking them in the arena.
    tri.graph_mut().prune_unreferenced();
}

/// Re-chains an unordered set of boundary edges into the single cyclic order `create_polygon`
/// requires, by walking shared endpoints.
fn order_boundary(tri: &Triangulation, edges: &[EdgeId]) -> Option<Vec<EdgeId>> {
    if edges.is_empty() {
        return None;
    }
    let mut remaining: Vec<EdgeId> = edges.to_vec();
    let first = remaining.remove(0);
    let first_edge = tri.graph().edge(first).clone();
    let start_vertex = first_edge.v1;
    let mut current_vertex = first_edge.v2;
    let mut ordered = vec![first];

    while !remaining.is_empty() {
        let idx = remaining.iter().position(|&e| tri.graph().edge(e).has_vertex(current_vertex))?;
        let e = remaining.remove(idx);
        current_vertex = tri.graph().edge(e).other_endpoint(current_vertex).unwrap();
        ordered.push(e);
    }

    if current_vertex != start_vertex {
        return None;
    }
    Some(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::Contour;

    fn square_contour() -> Contour {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn convex_square_decomposes_into_a_single_polygon() {
        let mut g = Graph::new();
        let mut cd = ConvexDecomposition::new(&mut g);
        cd.decompose(&[square_contour()], &[], &ConvexDecompositionParameters::default()).unwrap();
        let polygons: Vec<_> = g.polygons().filter(|&p| !g.polygon(p).is_outside).collect();
        assert_eq!(polygons.len(), 1);
        assert!(g.check());
    }

    #[test]
    fn l_shape_decomposes_into_at_least_two_convex_polygons() {
        let mut g = Graph::new();
        let mut cd = ConvexDecomposition::new(&mut g);
        let contour = vec![
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(6.0, 3.0),
            Point::new(3.0, 3.0),
            Point::new(3.0, 6.0),
            Point::new(0.0, 6.0),
        ];
        cd.decompose(&[contour], &[], &ConvexDecompositionParameters::default()).unwrap();
        let polygons: Vec<_> = g.polygons().filter(|&p| !g.polygon(p).is_outside).collect();
        assert!(polygons.len() >= 2);
        assert!(g.check());
        // Every resulting piece must itself be convex.
        for &p in &polygons {
            let verts = g.polygon(p).vertices();
            let n = verts.len();
            for i in 0..n {
                let a = g.position(verts[i]);
                let b = g.position(verts[(i + 1) % n]);
                let c = g.position(verts[(i + 2) % n]);
                assert_eq!(crate::geometry::side_of(a, b, c), 1);
            }
        }
    }
}
