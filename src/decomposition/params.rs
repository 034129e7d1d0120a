use crate::triangulation::TriangulationParameters;

/// Tuning knobs for [`super::ConvexDecomposition::decompose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvexDecompositionParameters {
    pub tri_param: TriangulationParameters,
    /// Cast perpendicular cuts from concave corners before essential-edge labeling (§4.4.2
    /// step 3).
    pub with_segments: bool,
    /// Relaxes the essential-edge convexity threshold from `pi - epsilon` to `pi + epsilon`,
    /// appropriate once perpendicular cuts have already introduced a Steiner vertex at the
    /// corner.
    pub split_edges: bool,
    pub base_verbosity: i32,
}

impl Default for ConvexDecompositionParameters {
    fn default() -> Self {
        ConvexDecompositionParameters {
            // `remove_outside_triangles` is forced false regardless of what the caller sets,
            // since decomposition needs the outside triangles' hull structure while it walks.
            tri_param: TriangulationParameters {
                remove_outside_triangles: false,
                ..TriangulationParameters::default()
            },
            with_segments: false,
            split_edges: false,
            base_verbosity: 30,
        }
    }
}
