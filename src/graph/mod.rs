//! The owning arena of Vertex/Edge/Polygon objects that every algorithm in this crate mutates
//! in place.

mod arena;

use crate::geometry::{self, Point, Rect};
use arena::{Arena, Id};

/// Stable handle to a [`Vertex`]. Survives arena insertions; a handle into a removed vertex
/// is detected (not silently aliased) by the backing generational arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(Id);

/// Stable handle to an [`Edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(Id);

/// Stable handle to a [`Polygon`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolygonId(Id);

/// A 2D point, plus incidence bookkeeping, owned by a [`Graph`].
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Point,
    pub(crate) edges: Vec<EdgeId>,
    pub precious: bool,
    pub(crate) ids: Vec<i64>,
}

impl Vertex {
    /// Edges currently incident to this vertex. Order is immaterial.
    pub fn incident_edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    pub fn external_ids(&self) -> &[i64] {
        &self.ids
    }
}

/// An undirected segment between two distinct vertices, with a conceptual v1->v2 direction
/// used only to tell its `left`/`right` polygons apart.
#[derive(Debug, Clone)]
pub struct Edge {
    pub v1: VertexId,
    pub v2: VertexId,
    pub(crate) left: Option<PolygonId>,
    pub(crate) right: Option<PolygonId>,
    pub is_segment: bool,
    pub(crate) level: u64,
    /// Edges produced by constraint insertion are frozen: the fix-up loop never re-examines
    /// them, regardless of how many further fix-up passes run. See the level-overflow design
    /// note: this is an explicit flag rather than a `level == usize::MAX` sentinel.
    pub(crate) frozen: bool,
    pub id: u64,
}

impl Edge {
    pub fn left(&self) -> Option<PolygonId> {
        self.left
    }

    pub fn right(&self) -> Option<PolygonId> {
        self.right
    }

    /// The polygon(s) touching this edge, at most two.
    pub fn polygons(&self) -> impl Iterator<Item = PolygonId> {
        self.left.into_iter().chain(self.right)
    }

    pub fn other_endpoint(&self, v: VertexId) -> Option<VertexId> {
        if self.v1 == v {
            Some(self.v2)
        } else if self.v2 == v {
            Some(self.v1)
        } else {
            None
        }
    }

    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.v1 == v || self.v2 == v
    }

    /// The polygon on the other side of `p`, or `None` if `p` is not one of this edge's
    /// polygons or the other side is empty (hull edge).
    pub fn other_polygon(&self, p: PolygonId) -> Option<PolygonId> {
        if self.left == Some(p) {
            self.right
        } else if self.right == Some(p) {
            self.left
        } else {
            None
        }
    }
}

/// An ordered, clockwise-wound loop of edges, owned by a [`Graph`].
#[derive(Debug, Clone)]
pub struct Polygon {
    pub(crate) edges: Vec<EdgeId>,
    pub(crate) vertices: Vec<VertexId>,
    pub(crate) internal_vertices: Vec<VertexId>,
    pub is_outside: bool,
    pub id: u64,
}

impl Polygon {
    /// Number of boundary edges (equivalently, boundary vertices).
    pub fn size(&self) -> usize {
        self.edges.len()
    }

    pub fn internal_vertex_count(&self) -> usize {
        self.internal_vertices.len()
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn internal_vertices(&self) -> &[VertexId] {
        &self.internal_vertices
    }

    pub fn is_triangle(&self) -> bool {
        self.edges.len() == 3
    }

    /// Vertex at position `n`, wrapping (including negative indices, matching the original
    /// engine's modulo convention).
    pub fn vertex(&self, n: isize) -> VertexId {
        let len = self.vertices.len() as isize;
        self.vertices[n.rem_euclid(len) as usize]
    }

    pub fn edge(&self, n: isize) -> EdgeId {
        let len = self.edges.len() as isize;
        self.edges[n.rem_euclid(len) as usize]
    }
}

struct Counters {
    next_edge_id: u64,
    next_polygon_id: u64,
    flips: u64,
    hops: u64,
    level: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Counters {
            next_edge_id: 0,
            next_polygon_id: 0,
            flips: 0,
            hops: 0,
            level: 0,
        }
    }
}

/// The owning arena of Vertex/Edge/Polygon objects on which the triangulation and convex
/// decomposition algorithms operate by local mutation.
#[derive(Default)]
pub struct Graph {
    vertices: Arena<Vertex>,
    edges: Arena<Edge>,
    polygons: Arena<Polygon>,
    polygon_order: Vec<PolygonId>,
    counters: Counters,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Vertex -------------------------------------------------------

    pub fn create_vertex(&mut self, x: f64, y: f64) -> VertexId {
        VertexId(self.vertices.insert(Vertex {
            position: Point::new(x, y),
            edges: Vec::new(),
            precious: false,
            ids: Vec::new(),
        }))
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        self.vertices.get(v.0).expect("stale VertexId")
    }

    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        self.vertices.get_mut(v.0).expect("stale VertexId")
    }

    pub fn position(&self, v: VertexId) -> Point {
        self.vertex(v).position
    }

    pub fn set_precious(&mut self, v: VertexId, id: i64) {
        let vertex = self.vertex_mut(v);
        vertex.precious = true;
        if !vertex.ids.contains(&id) {
            vertex.ids.push(id);
        }
    }

    pub fn is_precious(&self, v: VertexId) -> bool {
        self.vertex(v).precious
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().map(|(id, _)| VertexId(id))
    }

    fn remove_vertex(&mut self, v: VertexId) {
        self.vertices.remove(v.0);
    }

    // ---- Edge -----------------------------------------------------------

    /// Allocates an edge and links it into both endpoints' incidence lists.
    pub fn create_edge(&mut self, v1: VertexId, v2: VertexId) -> EdgeId {
        let id = self.counters.next_edge_id;
        self.counters.next_edge_id += 1;
        let edge_id = EdgeId(self.edges.insert(Edge {
            v1,
            v2,
            left: None,
            right: None,
            is_segment: false,
            level: 0,
            frozen: false,
            id,
        }));
        self.vertex_mut(v1).edges.push(edge_id);
        self.vertex_mut(v2).edges.push(edge_id);
        edge_id
    }

    pub fn edge(&self, e: EdgeId) -> &Edge {
        self.edges.get(e.0).expect("stale EdgeId")
    }

    pub fn edge_mut(&mut self, e: EdgeId) -> &mut Edge {
        self.edges.get_mut(e.0).expect("stale EdgeId")
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().map(|(id, _)| EdgeId(id))
    }

    pub fn edge_exists(&self, e: EdgeId) -> bool {
        self.edges.contains(e.0)
    }

    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let edge = self.edge(e);
        self.position(edge.v1).dist(self.position(edge.v2))
    }

    /// Unlinks an edge from both endpoints and drops it. The edge must not still be
    /// referenced by any polygon.
    fn remove_edge(&mut self, e: EdgeId) {
        let (v1, v2) = {
            let edge = self.edge(e);
            (edge.v1, edge.v2)
        };
        self.vertex_mut(v1).edges.retain(|&x| x != e);
        self.vertex_mut(v2).edges.retain(|&x| x != e);
        self.edges.remove(e.0);
    }

    /// Finds the existing edge between two vertices, if any.
    pub fn find_edge(&self, v1: VertexId, v2: VertexId) -> Option<EdgeId> {
        self.vertex(v1)
            .edges
            .iter()
            .copied()
            .find(|&e| self.edge(e).other_endpoint(v1) == Some(v2))
    }

    // ---- Polygon ----------------------------------------------------------

    /// Creates a 3-edge polygon from three edges, deriving vertex order and assigning
    /// left/right by traversal orientation.
    pub fn create_triangle(&mut self, e0: EdgeId, e1: EdgeId, e2: EdgeId) -> PolygonId {
        self.create_polygon(&[e0, e1, e2])
    }

    /// General n-gon constructor: edges must form a single closed, clockwise-wound loop.
    pub fn create_polygon(&mut self, edges: &[EdgeId]) -> PolygonId {
        assert!(edges.len() >= 3, "a polygon needs at least 3 edges");
        let mut vertices = Vec::with_capacity(edges.len());
        // Orient edges[0] arbitrarily as v1->v2 traversal; walk the chain to discover the
        // shared-vertex order, which also tells us each edge's traversal direction.
        let first = self.edge(edges[0]);
        let (mut prev_vertex, start_vertex) = (first.v1, first.v1);
        // Determine actual starting vertex by checking which endpoint is shared with the
        // last edge (closed loop) -- fall back to v1 if ambiguous (first call in a fresh
        // triangle construction, where callers pass consistent winding already).
        let last = self.edge(edges[edges.len() - 1]);
        if last.has_vertex(first.v2) && !last.has_vertex(first.v1) {
            prev_vertex = first.v2;
        }
        let mut traversal_forward = Vec::with_capacity(edges.len());
        let mut cur = prev_vertex;
        for &eid in edges {
            let edge = self.edge(eid);
            let next = edge
                .other_endpoint(cur)
                .expect("edge list does not form a closed loop");
            traversal_forward.push(cur == edge.v1);
            vertices.push(cur);
            cur = next;
        }
        debug_assert_eq!(cur, start_vertex, "edge loop did not close");

        let id = self.counters.next_polygon_id;
        self.counters.next_polygon_id += 1;
        let pid = PolygonId(self.polygons.insert(Polygon {
            edges: edges.to_vec(),
            vertices,
            internal_vertices: Vec::new(),
            is_outside: false,
            id,
        }));

        for (i, &eid) in edges.iter().enumerate() {
            let forward = traversal_forward[i];
            let edge = self.edge_mut(eid);
            if forward {
                edge.right = Some(pid);
            } else {
                edge.left = Some(pid);
            }
        }

        self.polygon_order.push(pid);
        pid
    }

    pub fn polygon(&self, p: PolygonId) -> &Polygon {
        self.polygons.get(p.0).expect("stale PolygonId")
    }

    pub fn polygon_mut(&mut self, p: PolygonId) -> &mut Polygon {
        self.polygons.get_mut(p.0).expect("stale PolygonId")
    }

    /// True iff `p` is still a live polygon in this graph -- the liveness check callers must
    /// perform before using a weak polygon reference retained across mutating operations.
    pub fn is_live(&self, p: PolygonId) -> bool {
        self.polygons.contains(p.0)
    }

    /// Unlinks `p` from its edges and removes it. Does not touch the edges themselves --
    /// a batch remover that tears down polygons without immediately reattaching their edges
    /// to a replacement is expected to follow up with [`Self::prune_unreferenced`] once it's
    /// done, rather than each individual `remove_polygon` call guessing whether an edge is
    /// about to be reused.
    pub fn remove_polygon(&mut self, p: PolygonId) {
        let edges = self.polygon(p).edges.clone();
        for eid in edges {
            let edge = self.edge_mut(eid);
            if edge.left == Some(p) {
                edge.left = None;
            }
            if edge.right == Some(p) {
                edge.right = None;
            }
        }
        self.polygons.remove(p.0);
        self.polygon_order.retain(|&x| x != p);
    }

    /// Destroys every edge with no remaining `left`/`right` polygon, and every vertex left
    /// with no remaining incident edge. Used after a batch polygon removal (e.g.
    /// [`crate::triangulation::Triangulation::remove_outside_triangles`]) to actually drop
    /// vertices/edges that were only ever touched by the removed polygons, rather than
    /// leaving them to survive in the arena forever.
    pub fn prune_unreferenced(&mut self) {
        let dangling: Vec<EdgeId> = self
            .edges()
            .filter(|&e| {
                let edge = self.edge(e);
                edge.left.is_none() && edge.right.is_none()
            })
            .collect();

        let mut touched = Vec::with_capacity(dangling.len() * 2);
        for e in dangling {
            let edge = self.edge(e);
            touched.push(edge.v1);
            touched.push(edge.v2);
            self.remove_edge(e);
        }

        for v in touched {
            if self.vertices.contains(v.0) && self.vertex(v).edges.is_empty() {
                self.remove_vertex(v);
            }
        }
    }

    pub fn add_internal_vertex(&mut self, p: PolygonId, v: VertexId) {
        self.polygon_mut(p).internal_vertices.push(v);
    }

    pub fn num_polygons(&self) -> usize {
        self.polygons.len()
    }

    pub fn polygons(&self) -> impl Iterator<Item = PolygonId> + '_ {
        self.polygon_order.iter().copied()
    }

    pub fn triangles(&self) -> impl Iterator<Item = PolygonId> + '_ {
        self.polygons().filter(move |&p| self.polygon(p).is_triangle())
    }

    // ---- Whole-graph operations --------------------------------------------

    /// Destroys all polygons, edges and vertices, and resets the id/stat counters.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.polygons.clear();
        self.polygon_order.clear();
        self.counters = Counters::default();
    }

    pub fn reset_counters(&mut self) {
        self.counters.flips = 0;
        self.counters.hops = 0;
    }

    pub fn flips(&self) -> u64 {
        self.counters.flips
    }

    pub fn hops(&self) -> u64 {
        self.counters.hops
    }

    pub(crate) fn record_flip(&mut self) {
        self.counters.flips += 1;
    }

    pub(crate) fn record_hop(&mut self) {
        self.counters.hops += 1;
    }

    pub(crate) fn next_level(&mut self) -> u64 {
        // Levels are a monotonic epoch counter scoped to one fix-up pass; frozen edges use an
        // explicit flag (see `Edge::frozen`) rather than relying on this counter ever reaching
        // a reserved maximum, so unbounded growth here is harmless.
        self.counters.level += 1;
        self.counters.level
    }

    /// Bounding box over all vertices that participate in at least one edge.
    pub fn bbox(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for (id, vertex) in self.vertices.iter() {
            if vertex.edges.is_empty() {
                continue;
            }
            let _ = id;
            result = Some(match result {
                None => Rect::new(
                    vertex.position.x,
                    vertex.position.y,
                    vertex.position.x,
                    vertex.position.y,
                ),
                Some(r) => r.union_point(vertex.position),
            });
        }
        result
    }

    /// Internal self-consistency diagnostic (§11.1): verifies edge<->polygon and
    /// edge<->vertex back-references. Logs the first inconsistency found and returns false,
    /// rather than panicking, so it can be used opportunistically in tests.
    pub fn check(&self) -> bool {
        for (eid, edge) in self.edges.iter() {
            let eid = EdgeId(eid);
            for &pid in edge.left.iter().chain(edge.right.iter()) {
                if !self.polygon(pid).edges.contains(&eid) {
                    log::warn!("check: edge {:?} claims polygon {:?} but polygon does not list it", eid, pid);
                    return false;
                }
            }
            if !self.vertex(edge.v1).edges.contains(&eid) || !self.vertex(edge.v2).edges.contains(&eid) {
                log::warn!("check: edge {:?} missing from an endpoint's incidence list", eid);
                return false;
            }
        }
        for (pid, polygon) in self.polygons.iter() {
            let pid = PolygonId(pid);
            if polygon.edges.len() != polygon.vertices.len() {
                log::warn!("check: polygon {:?} edge/vertex count mismatch", pid);
                return false;
            }
            for &eid in &polygon.edges {
                let edge = self.edge(eid);
                if edge.left != Some(pid) && edge.right != Some(pid) {
                    log::warn!("check: polygon {:?} lists edge {:?} that does not reference it back", pid, eid);
                    return false;
                }
            }
        }
        true
    }

    /// §11.3: O(n) brute-force scan for a vertex at exactly `p`. Too slow for hot paths;
    /// intended for tests and for the bounded-radius diametral-circle removal step of
    /// refinement.
    pub fn find_touching(&self, p: Point) -> Option<VertexId> {
        self.vertices
            .iter()
            .find(|(_, v)| geometry::is_equal(v.position, p))
            .map(|(id, _)| VertexId(id))
    }

    /// §11.3: O(n) brute-force scan for all vertices strictly inside the circle of the given
    /// center/radius.
    pub fn find_inside_circle(&self, center: Point, radius: f64) -> Vec<VertexId> {
        self.vertices
            .iter()
            .filter(|(_, v)| geometry::in_circle(v.position, center, radius) > 0)
            .map(|(id, _)| VertexId(id))
            .collect()
    }

    /// Removes a (non-vertex-referencing) edge and its two triangles' worth of bookkeeping in
    /// one step -- a small helper used throughout the flip/split/remove algorithms, which
    /// routinely destroy a handful of polygons and edges together.
    pub(crate) fn destroy_triangle(&mut self, p: PolygonId) {
        self.remove_polygon(p);
    }

    pub(crate) fn destroy_edge(&mut self, e: EdgeId) {
        self.remove_edge(e);
    }

    pub(crate) fn destroy_vertex(&mut self, v: VertexId) {
        self.remove_vertex(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Graph, [VertexId; 3], PolygonId) {
        let mut g = Graph::new();
        let v0 = g.create_vertex(0.0, 0.0);
        let v1 = g.create_vertex(2.0, 0.0);
        let v2 = g.create_vertex(0.0, 2.0);
        let e0 = g.create_edge(v0, v1);
        let e1 = g.create_edge(v1, v2);
        let e2 = g.create_edge(v2, v0);
        let t = g.create_triangle(e0, e1, e2);
        (g, [v0, v1, v2], t)
    }

    #[test]
    fn create_triangle_assigns_one_side_per_edge() {
        let (g, _, t) = single_triangle();
        assert!(g.check());
        assert!(g.polygon(t).is_triangle());
        for &e in g.polygon(t).edges() {
            assert_eq!(g.edge(e).polygons().collect::<Vec<_>>(), vec![t]);
        }
    }

    #[test]
    fn find_edge_is_symmetric() {
        let (g, [v0, v1, ..], _) = single_triangle();
        let e = g.find_edge(v0, v1).unwrap();
        assert_eq!(g.find_edge(v1, v0), Some(e));
    }

    #[test]
    fn remove_polygon_clears_edge_references_but_keeps_edges() {
        let (mut g, _, t) = single_triangle();
        let edges: Vec<EdgeId> = g.polygon(t).edges().to_vec();
        g.remove_polygon(t);
        assert!(!g.is_live(t));
        for e in edges {
            assert!(g.edge_exists(e));
            assert_eq!(g.edge(e).left(), None);
            assert_eq!(g.edge(e).right(), None);
        }
    }

    #[test]
    fn prune_unreferenced_drops_an_isolated_triangle_entirely() {
        let (mut g, verts, t) = single_triangle();
        let edges: Vec<EdgeId> = g.polygon(t).edges().to_vec();
        g.remove_polygon(t);
        g.prune_unreferenced();
        for e in edges {
            assert!(!g.edge_exists(e), "edge should have been pruned once both sides were empty");
        }
        for v in verts {
            assert!(!g.vertices().any(|x| x == v), "vertex should have been pruned once it had no incident edges");
        }
    }

    #[test]
    fn prune_unreferenced_keeps_edges_still_used_by_a_surviving_polygon() {
        let (mut g, [v0, v1, v2], t) = single_triangle();
        let v3 = g.create_vertex(2.0, 2.0);
        let shared = g.find_edge(v1, v2).unwrap();
        let e3 = g.create_edge(v1, v3);
        let e4 = g.create_edge(v3, v2);
        let t2 = g.create_triangle(shared, e4, e3);

        g.remove_polygon(t);
        g.prune_unreferenced();

        assert!(g.edge_exists(shared), "edge still used by the surviving triangle must not be pruned");
        assert!(g.vertices().any(|x| x == v1));
        assert!(g.vertices().any(|x| x == v2));
        assert!(!g.vertices().any(|x| x == v0), "v0 had no remaining incident edge and must be pruned");
        assert!(g.is_live(t2));
    }

    #[test]
    fn stale_vertex_id_is_detected_after_clear() {
        let (mut g, [v0, ..], _) = single_triangle();
        g.clear();
        assert_eq!(g.vertices().next(), None);
        // A stale handle from before clear() must not resolve into the now-empty arena.
        assert!(std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| g.vertex(v0))).is_err());
    }

    #[test]
    fn bbox_ignores_isolated_vertices() {
        let mut g = Graph::new();
        let _isolated = g.create_vertex(100.0, 100.0);
        let v0 = g.create_vertex(0.0, 0.0);
        let v1 = g.create_vertex(1.0, 0.0);
        g.create_edge(v0, v1);
        let bbox = g.bbox().unwrap();
        assert_eq!(bbox.lo, Point::new(0.0, 0.0));
        assert_eq!(bbox.hi, Point::new(1.0, 0.0));
    }

    #[test]
    fn find_inside_circle_matches_in_circle_predicate() {
        let mut g = Graph::new();
        let center_v = g.create_vertex(0.0, 0.0);
        let _outside = g.create_vertex(10.0, 10.0);
        let found = g.find_inside_circle(Point::new(0.0, 0.0), 1.0);
        assert_eq!(found, vec![center_v]);
    }
}
