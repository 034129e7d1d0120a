//! Constrained refined Delaunay triangulation on top of [`crate::graph::Graph`].

mod constrain;
mod fixup;
mod insert;
mod params;
mod refine;
mod remove;
pub(crate) mod walk;

pub use params::TriangulationParameters;

use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::graph::{EdgeId, Graph, VertexId};

/// A contour is a closed, clockwise-wound sequence of points (the hull, or a hole, of an
/// input polygon-with-holes).
pub type Contour = Vec<Point>;

/// Constrained refined Delaunay triangulation engine. Owns no data itself beyond bookkeeping;
/// all mesh state lives in the attached [`Graph`].
pub struct Triangulation<'g> {
    graph: &'g mut Graph,
    is_constrained: bool,
}

impl<'g> Triangulation<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Triangulation {
            graph,
            is_constrained: false,
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        self.graph
    }

    pub fn is_constrained(&self) -> bool {
        self.is_constrained
    }

    pub fn flips(&self) -> u64 {
        self.graph.flips()
    }

    pub fn hops(&self) -> u64 {
        self.graph.hops()
    }

    pub fn check(&self) -> bool {
        self.graph.check()
    }

    /// Seeds the graph with two triangles tiling an axis-aligned box.
    pub fn init_box(&mut self, rect: Rect) {
        self.graph.clear();
        self.is_constrained = false;
        let v0 = self.graph.create_vertex(rect.lo.x, rect.lo.y);
        let v1 = self.graph.create_vertex(rect.hi.x, rect.lo.y);
        let v2 = self.graph.create_vertex(rect.hi.x, rect.hi.y);
        let v3 = self.graph.create_vertex(rect.lo.x, rect.hi.y);
        let e0 = self.graph.create_edge(v0, v1);
        let e1 = self.graph.create_edge(v1, v2);
        let e2 = self.graph.create_edge(v2, v3);
        let e3 = self.graph.create_edge(v3, v0);
        let diag = self.graph.create_edge(v0, v2);
        self.graph.create_triangle(e0, e1, diag);
        self.graph.create_triangle(diag, e2, e3);
    }

    /// Inserts a new point, returning the (possibly pre-existing) vertex at that location.
    pub fn insert_point(&mut self, x: f64, y: f64) -> Result<VertexId> {
        insert::insert_point(self, Point::new(x, y))
    }

    pub fn find_vertex_for_point(&self, p: Point) -> Option<VertexId> {
        self.graph
            .vertices()
            .find(|&v| crate::geometry::is_equal(self.graph.position(v), p))
    }

    pub fn find_edge_for_points(&self, p1: Point, p2: Point) -> Option<EdgeId> {
        let v1 = self.find_vertex_for_point(p1)?;
        let v2 = self.find_vertex_for_point(p2)?;
        self.graph.find_edge(v1, v2)
    }

    /// Ordered vertices along the half-line from `p1` to `p2` (and beyond, stopping once past
    /// `p2`). `p1` must be an existing vertex; if not, `p1`/`p2` are swapped and retried.
    /// Returns empty if neither endpoint is an existing vertex.
    pub fn find_vertexes_along_line(&self, p1: Point, p2: Point) -> Vec<VertexId> {
        walk::find_vertexes_along_line(self, p1, p2)
    }

    /// Drops all polygons flagged `is_outside`, along with whatever edges and vertices were
    /// only ever touched by them -- so a point placed outside the hull is dropped from the
    /// graph entirely, not merely unlinked from its (now-removed) triangles.
    pub fn remove_outside_triangles(&mut self) {
        debug_assert!(self.is_constrained, "remove_outside_triangles requires a constrained graph");
        let outside: Vec<_> = self
            .graph
            .polygons()
            .filter(|&p| self.graph.polygon(p).is_outside)
            .collect();
        for p in outside {
            self.graph.remove_polygon(p);
        }
        self.graph.prune_unreferenced();
    }

    /// Forces a list of closed clockwise contours (each a vertex sequence in insertion order)
    /// to appear as edges, marks their edges as segments, floods `is_outside` from them, and
    /// joins collinear T-junction-free edge runs.
    pub fn constrain(&mut self, contours: &[Vec<VertexId>]) {
        constrain::constrain(self, contours);
        self.is_constrained = true;
    }

    /// Chew-style quality refinement: inserts Steiner points until every non-outside triangle
    /// satisfies the quality parameters, or `max_iterations` is reached.
    pub fn refine(&mut self, params: &TriangulationParameters) {
        refine::refine(self, params);
    }

    /// Converts a set of contours (hull followed by holes) plus optional extra points into a
    /// refined constrained Delaunay triangulation.
    pub fn triangulate(&mut self, contours: &[Contour], params: &TriangulationParameters) -> Result<()> {
        self.triangulate_with_points(contours, &[], params)
    }

    pub fn triangulate_with_points(
        &mut self,
        contours: &[Contour],
        extra_points: &[Point],
        params: &TriangulationParameters,
    ) -> Result<()> {
        self.graph.clear();
        self.is_constrained = false;

        let bbox = bbox_of_contours(contours).ok_or(crate::error::PlcError::InvalidContour)?;
        // Pad so every input point lies strictly inside the seed box, never on its boundary.
        let pad = (bbox.hi.x - bbox.lo.x).max(bbox.hi.y - bbox.lo.y).max(1.0);
        self.init_box(Rect::new(
            bbox.lo.x - pad,
            bbox.lo.y - pad,
            bbox.hi.x + pad,
            bbox.hi.y + pad,
        ));

        let mut vertex_contours: Vec<Vec<VertexId>> = Vec::with_capacity(contours.len());
        for contour in contours {
            let mut vs = Vec::with_capacity(contour.len());
            for &p in contour {
                vs.push(self.insert_point(p.x, p.y)?);
            }
            vertex_contours.push(vs);
        }

        for (i, &p) in extra_points.iter().enumerate() {
            if let Ok(v) = self.insert_point(p.x, p.y) {
                self.graph.set_precious(v, i as i64);
            } else {
                log::debug!("extra point {:?} fell outside the hull; dropped", p);
            }
        }

        self.constrain(&vertex_contours);
        self.refine(params);
        if params.remove_outside_triangles {
            self.remove_outside_triangles();
        }
        Ok(())
    }
}

fn bbox_of_contours(contours: &[Contour]) -> Option<Rect> {
    let mut result: Option<Rect> = None;
    for contour in contours {
        for &p in contour {
            result = Some(match result {
                None => Rect::new(p.x, p.y, p.x, p.y),
                Some(r) => r.union_point(p),
            });
        }
    }
    result
}
