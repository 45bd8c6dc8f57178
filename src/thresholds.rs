//! Tolerances derived from a single nominal point spacing (Sec 4.1).
//!
//! Every other component reads its epsilons from here instead of hard-coding
//! magic constants, so that a TIN built over millimeter-scale survey data and
//! one built over kilometer-scale terrain both get predicates tuned to their
//! own precision.

/// Pre-computed tolerances for a [`crate::tin::Tin`] with a given nominal point spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub nominal_point_spacing: f64,
    pub vertex_tolerance: f64,
    pub vertex_tolerance_sq: f64,
    pub half_plane_threshold: f64,
    pub in_circle_threshold: f64,
    pub delaunay_threshold: f64,
    pub precision_threshold: f64,
}

impl Thresholds {
    /// # Errors
    /// None directly; callers are expected to have already rejected non-positive
    /// spacing (see `Error::InvalidInput` in [`crate::tin::Tin::new`]).
    pub fn new(nominal_point_spacing: f64) -> Thresholds {
        debug_assert!(nominal_point_spacing > 0.0);
        let s = nominal_point_spacing;
        let vertex_tolerance = s * 1e-9;
        Thresholds {
            nominal_point_spacing: s,
            vertex_tolerance,
            vertex_tolerance_sq: vertex_tolerance * vertex_tolerance,
            half_plane_threshold: s * s * 1e-11,
            in_circle_threshold: s.powi(4) * 1e-12,
            delaunay_threshold: s * s * 1e-13,
            precision_threshold: s * 1e-12,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scales_with_spacing() {
        let small = Thresholds::new(1e-3);
        let large = Thresholds::new(1e3);
        assert!(small.vertex_tolerance < large.vertex_tolerance);
        assert!(small.in_circle_threshold < large.in_circle_threshold);
    }

    #[test]
    fn unit_spacing_is_tiny() {
        let t = Thresholds::new(1.0);
        assert!(t.vertex_tolerance > 0.0 && t.vertex_tolerance < 1e-6);
    }
}
