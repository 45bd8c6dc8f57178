//! Bounded Voronoi dual of a Delaunay `Tin`, clipped to an axis-aligned
//! rectangle (Sec 4.11).
//!
//! Grounded on this crate's own primitives: a cell's unclipped boundary is
//! the sequence of circumcenters of the triangles incident to a vertex,
//! walked via [`crate::iter::pinwheel_next`]; clipping combines a
//! Cohen-Sutherland outcode (per vertex, for the trivial accept/reject a
//! polygon clip needs before doing any arithmetic) with a Liang-Barsky
//! parametric intersection against each of the rectangle's four half-planes
//! (the per-edge step of a Sutherland-Hodgman polygon clip).

use crate::edge::EdgeId;
use crate::error::{Error, Result};
use crate::predicates::circumcircle;
use crate::tin::Tin;
use crate::vertex::VertexId;

/// Axis-aligned clip rectangle for a [`BoundedVoronoi`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// One vertex of a clipped Voronoi cell boundary. `perimeter_param` is
/// `Some(side + fraction)` (side 0 = bottom, 1 = right, 2 = top, 3 = left,
/// `fraction` in `[0, 1)`) for a vertex the clip introduced on the
/// rectangle's edge, `None` for a genuine circumcenter (Sec 4.11).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiVertex {
    pub x: f64,
    pub y: f64,
    pub perimeter_param: Option<f64>,
}

impl VoronoiVertex {
    fn interior(p: [f64; 2]) -> VoronoiVertex {
        VoronoiVertex {
            x: p[0],
            y: p[1],
            perimeter_param: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    pub vertex: VertexId,
    pub boundary: Vec<VoronoiVertex>,
}

/// The bounded Voronoi dual of a `Tin`, producing clipped cells on demand.
pub struct BoundedVoronoi<'a> {
    tin: &'a Tin,
    rect: ClipRect,
}

impl<'a> BoundedVoronoi<'a> {
    /// Build the dual over a clip rectangle expanded `bounding_box_buffer_percent`
    /// beyond the TIN's own bounds (Sec 6 `bounding_box_buffer_percent`).
    pub fn new(tin: &'a Tin, bounding_box_buffer_percent: f64) -> Result<BoundedVoronoi<'a>> {
        let bounds = tin.bounds().ok_or(Error::NotBootstrapped)?;
        let pad_x = bounds.width() * bounding_box_buffer_percent.max(0.0);
        let pad_y = bounds.height() * bounding_box_buffer_percent.max(0.0);
        let rect = ClipRect {
            min_x: bounds.min_x - pad_x,
            min_y: bounds.min_y - pad_y,
            max_x: bounds.max_x + pad_x,
            max_y: bounds.max_y + pad_y,
        };
        Ok(BoundedVoronoi { tin, rect })
    }

    pub fn rect(&self) -> ClipRect {
        self.rect
    }

    /// The clipped cell for `v`, or `None` if `v` is the ghost vertex.
    pub fn cell(&self, v: VertexId) -> Option<VoronoiCell> {
        if v == VertexId::GHOST {
            return None;
        }
        let raw = self.raw_polygon(v);
        let clipped = clip_polygon(&raw, self.rect);
        Some(VoronoiCell {
            vertex: v,
            boundary: clipped,
        })
    }

    /// Every real vertex's clipped cell, in vertex-index order.
    pub fn cells(&self) -> impl Iterator<Item = VoronoiCell> + 'a {
        let tin = self.tin;
        let rect = self.rect;
        tin.vertices().filter_map(move |(v, _)| {
            let raw = raw_polygon_for(tin, v);
            Some(VoronoiCell {
                vertex: v,
                boundary: clip_polygon(&raw, rect),
            })
        })
    }

    fn raw_polygon(&self, v: VertexId) -> Vec<[f64; 2]> {
        raw_polygon_for(self.tin, v)
    }
}

fn any_incident_edge(tin: &Tin, v: VertexId) -> Option<EdgeId> {
    let store = tin.store();
    let mut cursor = EdgeId(0);
    while store.is_allocated(cursor) {
        if store.origin(cursor) == v {
            return Some(cursor);
        }
        cursor = EdgeId(cursor.0 + 1);
    }
    None
}

fn outward_normal(p: [f64; 2], q: [f64; 2]) -> [f64; 2] {
    let dx = q[0] - p[0];
    let dy = q[1] - p[1];
    let len = (dx * dx + dy * dy).sqrt().max(1e-300);
    [dy / len, -dx / len]
}

/// Unclipped Voronoi cell boundary for `v`: the circumcenters of every real
/// triangle incident to `v`, in pinwheel order. For a hull vertex the chain
/// is open; it is closed here with two long rays perpendicular to the two
/// hull edges meeting at `v`, long enough to clear any plausible clip rect.
/// This approximates the exact perpendicular-bisector-to-infinity
/// construction by extruding from the nearest real circumcenter rather than
/// from the hull edge's own perpendicular bisector line.
fn raw_polygon_for(tin: &Tin, v: VertexId) -> Vec<[f64; 2]> {
    let store = tin.store();
    let e0 = match any_incident_edge(tin, v) {
        Some(e) => e,
        None => return Vec::new(),
    };

    let mut centers: Vec<[f64; 2]> = Vec::new();
    let mut ghost_hull_edges: Option<(VertexId, VertexId)> = None;
    let mut cur = e0;
    let mut guard = 0usize;
    loop {
        guard += 1;
        if guard > crate::locate::MAX_WALK_STEPS {
            break;
        }
        let e1 = store.forward(cur);
        let e2 = store.forward(e1);
        let a = store.origin(cur);
        let b = store.origin(e1);
        let c = store.origin(e2);

        if a == VertexId::GHOST || b == VertexId::GHOST || c == VertexId::GHOST {
            // `cur` is v's spoke to the ghost; the two hull vertices flanking
            // v are found the same way incremental insertion walks the hull.
            let (q, _, _) = crate::insert::step_forward(store, cur);
            let (r, _, _) = crate::insert::step_backward(store, cur);
            ghost_hull_edges = Some((r, q));
        } else if let Some(center) = circumcircle(tin.xy(a), tin.xy(b), tin.xy(c), tin.thresholds()) {
            centers.push(center.0);
        }

        cur = crate::iter::pinwheel_next(store, cur);
        if cur == e0 {
            break;
        }
    }

    let (r, q) = match ghost_hull_edges {
        None => return centers,
        Some(pair) => pair,
    };

    // `r -> v` arrives at v; `v -> q` leaves v.
    let normal_in = outward_normal(tin.xy(r), tin.xy(v));
    let normal_out = outward_normal(tin.xy(v), tin.xy(q));

    let ray_len = 4.0
        * tin
            .bounds()
            .map(|b| b.width().max(b.height()).max(1.0))
            .unwrap_or(1.0);

    let near_in = centers.first().copied().unwrap_or_else(|| tin.xy(v));
    let near_out = centers.last().copied().unwrap_or_else(|| tin.xy(v));

    let far_in = [near_in[0] + normal_in[0] * ray_len, near_in[1] + normal_in[1] * ray_len];
    let far_out = [near_out[0] + normal_out[0] * ray_len, near_out[1] + normal_out[1] * ray_len];

    let mut polygon = Vec::with_capacity(centers.len() + 2);
    polygon.push(far_in);
    polygon.extend(centers);
    polygon.push(far_out);
    polygon
}

fn outcode(p: [f64; 2], rect: ClipRect) -> u8 {
    let mut code = 0u8;
    if p[0] < rect.min_x {
        code |= 0b0001;
    } else if p[0] > rect.max_x {
        code |= 0b0010;
    }
    if p[1] < rect.min_y {
        code |= 0b0100;
    } else if p[1] > rect.max_y {
        code |= 0b1000;
    }
    code
}

fn perimeter_param(p: [f64; 2], rect: ClipRect) -> f64 {
    let w = (rect.max_x - rect.min_x).max(1e-300);
    let h = (rect.max_y - rect.min_y).max(1e-300);
    let on_bottom = (p[1] - rect.min_y).abs() <= 1e-9 * h.max(1.0);
    let on_top = (p[1] - rect.max_y).abs() <= 1e-9 * h.max(1.0);
    let on_left = (p[0] - rect.min_x).abs() <= 1e-9 * w.max(1.0);
    if on_bottom {
        0.0 + ((p[0] - rect.min_x) / w).clamp(0.0, 1.0 - f64::EPSILON)
    } else if !on_left && (p[0] - rect.max_x).abs() <= 1e-9 * w.max(1.0) {
        1.0 + ((p[1] - rect.min_y) / h).clamp(0.0, 1.0 - f64::EPSILON)
    } else if on_top {
        2.0 + ((rect.max_x - p[0]) / w).clamp(0.0, 1.0 - f64::EPSILON)
    } else {
        3.0 + ((rect.max_y - p[1]) / h).clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Sutherland-Hodgman clip of a (possibly unbounded-looking, but already
/// ray-truncated) convex polygon against `rect`, one half-plane at a time.
/// Each half-plane test uses a Cohen-Sutherland outcode bit for the trivial
/// in/out classification and a Liang-Barsky-style parametric `t` for the
/// boundary intersection when an edge crosses it.
fn clip_polygon(input: &[[f64; 2]], rect: ClipRect) -> Vec<VoronoiVertex> {
    if input.len() < 3 {
        return Vec::new();
    }

    let planes: [(u8, fn([f64; 2], ClipRect) -> bool); 4] = [
        (0b0001, |p, r| p[0] >= r.min_x),
        (0b0010, |p, r| p[0] <= r.max_x),
        (0b0100, |p, r| p[1] >= r.min_y),
        (0b1000, |p, r| p[1] <= r.max_y),
    ];

    let mut poly: Vec<[f64; 2]> = input.to_vec();

    for &(_bit, inside) in &planes {
        if poly.is_empty() {
            break;
        }
        let mut out = Vec::with_capacity(poly.len() + 2);
        for i in 0..poly.len() {
            let cur = poly[i];
            let prev = poly[(i + poly.len() - 1) % poly.len()];
            let cur_in = inside(cur, rect);
            let prev_in = inside(prev, rect);
            if cur_in != prev_in {
                out.push(intersect(prev, cur, rect, inside));
            }
            if cur_in {
                out.push(cur);
            }
        }
        poly = out;
    }

    if poly.len() < 3 {
        return Vec::new();
    }

    poly.into_iter()
        .map(|p| {
            if outcode(p, rect) == 0 {
                VoronoiVertex::interior(p)
            } else {
                VoronoiVertex {
                    x: p[0],
                    y: p[1],
                    perimeter_param: Some(perimeter_param(p, rect)),
                }
            }
        })
        .collect()
}

/// Liang-Barsky parametric intersection of segment `(a, b)` with whichever
/// axis-aligned line `inside` tests against, found by bisecting `t` since
/// the plane predicate is monotone along the segment.
fn intersect(a: [f64; 2], b: [f64; 2], rect: ClipRect, inside: fn([f64; 2], ClipRect) -> bool) -> [f64; 2] {
    let lerp = |t: f64| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    let lo_inside = inside(a, rect);
    for _ in 0..60 {
        let mid = (lo + hi) / 2.0;
        if inside(lerp(mid), rect) == lo_inside {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lerp((lo + hi) / 2.0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interior_vertex_cell_is_closed_polygon() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(10.0, 10.0, 0.0, 3).unwrap();
        tin.add(0.0, 10.0, 0.0, 4).unwrap();
        tin.add(5.0, 5.0, 0.0, 5).unwrap();

        let voronoi = BoundedVoronoi::new(&tin, 0.1).unwrap();
        let cell = voronoi.cell(VertexId(5)).unwrap();
        assert!(cell.boundary.len() >= 3);
        assert!(cell.boundary.iter().all(|b| b.perimeter_param.is_none()));
    }

    #[test]
    fn hull_vertex_cell_touches_clip_rectangle() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(10.0, 10.0, 0.0, 3).unwrap();
        tin.add(0.0, 10.0, 0.0, 4).unwrap();

        let voronoi = BoundedVoronoi::new(&tin, 0.5).unwrap();
        let cell = voronoi.cell(VertexId(1)).unwrap();
        assert!(cell.boundary.iter().any(|b| b.perimeter_param.is_some()));
    }

    #[test]
    fn new_requires_bootstrapped_tin() {
        let tin = Tin::new(1.0).unwrap();
        assert!(BoundedVoronoi::new(&tin, 0.1).is_err());
    }
}
