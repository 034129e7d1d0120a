//! A planar linear complex engine: constrained, refined Delaunay triangulation and
//! Hertel-Mehlhorn convex decomposition over a shared [`graph::Graph`].
//!
//! The three stages share one mesh representation so a caller can triangulate, refine for
//! quality, and decompose into convex pieces without re-deriving adjacency between stages.

mod error;
pub mod geometry;
pub mod graph;
pub mod triangulation;
pub mod decomposition;

pub use error::{PlcError, Result};
pub use geometry::{Point, Rect};
pub use graph::{EdgeId, Graph, PolygonId, VertexId};
pub use triangulation::{Contour, Triangulation, TriangulationParameters};
pub use decomposition::{ConvexDecomposition, ConvexDecompositionParameters};
