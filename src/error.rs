use thiserror::Error;

/// Failure modes surfaced by the fallible public operations of [`crate::graph::Graph`],
/// [`crate::triangulation::Triangulation`] and [`crate::decomposition::ConvexDecomposition`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcError {
    /// A third vertex inserted into an otherwise-empty graph was collinear with the first two.
    #[error("third vertex is collinear with the first two; cannot form an initial triangle")]
    CollinearDegenerate,

    /// `insert_point` was asked to place a point outside the convex hull of a graph that has
    /// already been constrained (`constrain` has completed).
    #[error("cannot insert a point outside the hull of a constrained graph")]
    OutsideConstrainedInsert,

    /// A circumcircle was requested for a triangle with zero (or numerically indistinguishable
    /// from zero) area.
    #[error("triangle is degenerate; circumcircle is undefined")]
    DegenerateCircumcircle,

    /// Triangulation input produced a self-intersecting or otherwise invalid contour.
    #[error("input contour is self-intersecting or degenerate")]
    InvalidContour,

    /// A requested edge or vertex could not be located and the operation has no well-defined
    /// empty-result convention (used only where §4.3.2 requires a hard failure rather than an
    /// empty/`None` return).
    #[error("required graph element not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, PlcError>;
