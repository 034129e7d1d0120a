/// Tuning knobs for [`super::Triangulation::triangulate`] and [`super::Triangulation::refine`].
///
/// Defaults match the originating engine's defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangulationParameters {
    /// Minimum shortest-edge / circumradius ratio. `0.0` disables the skinny-triangle
    /// criterion.
    pub min_b: f64,
    /// Minimum edge length; segment splitting during refinement stops once the segment being
    /// split would fall below this.
    pub min_length: f64,
    /// Maximum triangle area. `0.0` disables the area criterion.
    pub max_area: f64,
    /// Maximum area for triangles that touch a segment. `0.0` means "use `max_area`".
    pub max_area_border: f64,
    /// Hard cap on refinement iterations.
    pub max_iterations: usize,
    /// Log-level floor for progress messages (informational only).
    pub base_verbosity: i32,
    /// If set, tag each triangle's `id` with the §11.2 diagnostic bitfield after refinement.
    pub mark_triangles: bool,
    /// Whether to drop `is_outside` polygons once triangulation/refinement completes.
    pub remove_outside_triangles: bool,
}

impl Default for TriangulationParameters {
    fn default() -> Self {
        TriangulationParameters {
            min_b: 1.0,
            min_length: 0.0,
            max_area: 0.0,
            max_area_border: 0.0,
            max_iterations: usize::MAX,
            base_verbosity: 30,
            mark_triangles: false,
            remove_outside_triangles: true,
        }
    }
}
