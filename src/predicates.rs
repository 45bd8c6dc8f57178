//! Robust geometric predicates (Sec 4.2).
//!
//! `orientation` and `in_circle` are backed by [`geometry_predicates`], an
//! adaptive-precision (Shewchuk-style) port that already implements the
//! two-tier "fast double, escalate to an exact expansion when not provably
//! decisive" policy this spec calls for. `half_plane`, `direction`, and
//! `circumcircle` have no equivalent in that crate, so they are hand-rolled
//! here with the same policy: compute in `f64`, and when the magnitude falls
//! at or below the relevant [`crate::thresholds::Thresholds`] epsilon,
//! recompute with a compensated (two-sum / two-product) expansion before the
//! sign is trusted.

use crate::thresholds::Thresholds;

/// sign > 0 <=> counter-clockwise.
pub fn orientation(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    geometry_predicates::orient2d(a, b, c)
}

/// sign > 0 <=> `d` is strictly inside the circumcircle of (a, b, c), assuming
/// (a, b, c) is CCW.
pub fn in_circle(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> f64 {
    geometry_predicates::incircle(a, b, c, d)
}

/// Signed perpendicular distance of `x` from the line through `a`, `b`,
/// scaled by `|ab|`; sign > 0 <=> `x` is left of the directed edge `a -> b`.
pub fn half_plane(a: [f64; 2], b: [f64; 2], x: [f64; 2], t: &Thresholds) -> f64 {
    let fast = two_product_diff(b[0] - a[0], x[1] - a[1], b[1] - a[1], x[0] - a[0]);
    if fast.abs() > t.half_plane_threshold {
        return fast;
    }
    log::trace!("half_plane: fast path below threshold, falling back to compensated sum");
    compensated_cross(a, b, x)
}

/// Dot product of `(x - a)` along the direction `a -> b`, used to disambiguate
/// collinear cases (which side of a segment's endpoints a projected point
/// falls on).
pub fn direction(a: [f64; 2], b: [f64; 2], x: [f64; 2], t: &Thresholds) -> f64 {
    let ux = b[0] - a[0];
    let uy = b[1] - a[1];
    let vx = x[0] - a[0];
    let vy = x[1] - a[1];
    let fast = ux * vx + uy * vy;
    if fast.abs() > t.in_circle_threshold.sqrt() {
        return fast;
    }
    log::trace!("direction: fast path below threshold, falling back to compensated sum");
    let (p0, e0) = two_product(ux, vx);
    let (p1, e1) = two_product(uy, vy);
    p0 + p1 + e0 + e1
}

/// Circumcenter and circumradius of (a, b, c), or `None` if the triangle's
/// area is at or below the half-plane threshold (degenerate / collinear).
pub fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2], t: &Thresholds) -> Option<([f64; 2], f64)> {
    let ax = a[0];
    let ay = a[1];
    let bx = b[0] - ax;
    let by = b[1] - ay;
    let cx = c[0] - ax;
    let cy = c[1] - ay;
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() <= t.half_plane_threshold {
        return None;
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    let center = [ax + ux, ay + uy];
    let radius = (ux * ux + uy * uy).sqrt();
    Some((center, radius))
}

/// Knuth's two-sum: `a + b` exactly, as a (value, error) pair.
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let err = (a - (s - bb)) + (b - bb);
    (s, err)
}

/// Dekker's two-product: `a * b` exactly, as a (value, error) pair. Relies on
/// FMA-equivalent splitting; acceptable here because this path is only taken
/// once per near-degenerate predicate call, not in the hot loop.
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let err = a.mul_add(b, -p);
    (p, err)
}

/// `(ux * vy) - (uy * vx)`, the plain (uncompensated) fast path tried before
/// falling back to `compensated_cross`.
fn two_product_diff(ux: f64, vy: f64, uy: f64, vx: f64) -> f64 {
    ux * vy - uy * vx
}

fn compensated_cross(a: [f64; 2], b: [f64; 2], x: [f64; 2]) -> f64 {
    let ux = b[0] - a[0];
    let uy = b[1] - a[1];
    let vx = x[0] - a[0];
    let vy = x[1] - a[1];
    let (p0, e0) = two_product(ux, vy);
    let (p1, e1) = two_product(uy, vx);
    let (neg_p1, neg_e1) = (-p1, -e1);
    let (sum, err) = two_sum(p0, neg_p1);
    sum + err + e0 + neg_e1
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn orientation_ccw() {
        assert!(orientation([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]) > 0.0);
        assert!(orientation([0.0, 0.0], [0.0, 1.0], [1.0, 0.0]) < 0.0);
        assert_eq!(orientation([0.0, 0.0], [1.0, 0.0], [2.0, 0.0]), 0.0);
    }

    #[test]
    fn in_circle_basic() {
        // Unit-circle triangle, origin-centered point must read "inside".
        let a = [1.0, 0.0];
        let b = [-0.5, 0.866_025_403_784_438_6];
        let c = [-0.5, -0.866_025_403_784_438_6];
        assert!(in_circle(a, b, c, [0.0, 0.0]) > 0.0);
        assert!(in_circle(a, b, c, [10.0, 10.0]) < 0.0);
    }

    #[test]
    fn half_plane_sign() {
        let t = Thresholds::new(1.0);
        assert!(half_plane([0.0, 0.0], [1.0, 0.0], [0.5, 1.0], &t) > 0.0);
        assert!(half_plane([0.0, 0.0], [1.0, 0.0], [0.5, -1.0], &t) < 0.0);
        assert_eq!(half_plane([0.0, 0.0], [1.0, 0.0], [0.5, 0.0], &t), 0.0);
    }

    #[test]
    fn circumcircle_of_right_triangle() {
        let t = Thresholds::new(1.0);
        let (center, radius) = circumcircle([0.0, 0.0], [2.0, 0.0], [0.0, 2.0], &t).unwrap();
        assert!((center[0] - 1.0).abs() < 1e-9);
        assert!((center[1] - 1.0).abs() < 1e-9);
        assert!((radius - 2.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn circumcircle_degenerate_is_none() {
        let t = Thresholds::new(1.0);
        assert!(circumcircle([0.0, 0.0], [1.0, 0.0], [2.0, 0.0], &t).is_none());
    }
}
