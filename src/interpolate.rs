//! Surface interpolation over a [`crate::tin::Tin`] (Sec 4.10).
//!
//! None of the five example repos interpolate a surface, so this module is
//! grounded on this crate's own primitives: [`crate::locate::locate`] for
//! the containing facet, [`crate::predicates::in_circle`] for natural
//! neighbor discovery (the set of triangles whose circumcircle contains the
//! query point -- the same cavity a Bowyer-Watson insertion of the query
//! point would carve out), and [`crate::iter::pinwheel_next`] for the IDW
//! ring expansion the spec names explicitly.

use std::collections::{HashSet, VecDeque};

use crate::edge::{EdgeId, RegionIndex};
use crate::locate::{locate, Location};
use crate::predicates::{in_circle, orientation};
use crate::tin::Tin;
use crate::vertex::VertexId;

/// Common contract for every concrete interpolator (Sec 4.10).
pub trait Interpolator {
    /// Interpolated Z at `(x, y)`, or `NaN` outside the hull, outside the
    /// configured max distance, outside the configured region, or when a
    /// contributing vertex's z is itself NaN.
    fn interpolate(&mut self, x: f64, y: f64) -> f64;

    /// Invalidate any cached search-edge state. Required after any mutation
    /// to the underlying `Tin` (Sec 9 "Search-edge caching").
    fn reset_for_change_to_tin(&mut self);
}

fn vertex_z(tin: &Tin, v: VertexId) -> f64 {
    tin.vertex(v).z()
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

fn locate_from(tin: &Tin, hint: EdgeId, x: f64, y: f64) -> Option<Location> {
    let start = if hint.is_valid() && tin.store().is_allocated(hint) {
        hint
    } else if tin.search_hint.is_valid() {
        tin.search_hint
    } else {
        EdgeId(0)
    };
    locate(tin.store(), &tin.vertices, start, x, y, tin.thresholds()).ok()
}

fn within_region(tin: &Tin, e: EdgeId, region: RegionIndex) -> bool {
    let idx = (e.0 & 1) as usize;
    tin.store().constraint(e).side[idx].interior == Some(region)
}

/// Barycentric (planar facet) interpolation over the containing triangle.
pub struct TriangularFacetInterpolator<'a> {
    tin: &'a Tin,
    search_hint: EdgeId,
    max_distance: Option<f64>,
    region: Option<RegionIndex>,
}

impl<'a> TriangularFacetInterpolator<'a> {
    pub fn new(tin: &'a Tin) -> TriangularFacetInterpolator<'a> {
        TriangularFacetInterpolator {
            tin,
            search_hint: EdgeId::INVALID,
            max_distance: None,
            region: None,
        }
    }

    pub fn with_max_distance(mut self, d: f64) -> Self {
        self.max_distance = Some(d);
        self
    }

    pub fn with_constrained_regions_only(mut self, region: RegionIndex) -> Self {
        self.region = Some(region);
        self
    }
}

impl<'a> Interpolator for TriangularFacetInterpolator<'a> {
    fn interpolate(&mut self, x: f64, y: f64) -> f64 {
        let loc = match locate_from(self.tin, self.search_hint, x, y) {
            Some(loc) => loc,
            None => return f64::NAN,
        };

        let e = match loc {
            Location::Outside(_) => return f64::NAN,
            Location::OnVertex(v) => return vertex_z(self.tin, v),
            Location::OnEdge(e) | Location::InTriangle(e) => e,
        };
        self.search_hint = e;

        if let Some(region) = self.region {
            if !within_region(self.tin, e, region) {
                return f64::NAN;
            }
        }

        let e1 = self.tin.store().forward(e);
        let e2 = self.tin.store().forward(e1);
        let a = self.tin.store().origin(e);
        let b = self.tin.store().origin(e1);
        let c = self.tin.store().origin(e2);
        let pa = self.tin.xy(a);
        let pb = self.tin.xy(b);
        let pc = self.tin.xy(c);
        let p = [x, y];

        if let Some(max_d) = self.max_distance {
            let nearest = [distance(p, pa), distance(p, pb), distance(p, pc)]
                .into_iter()
                .fold(f64::MAX, f64::min);
            if nearest > max_d {
                return f64::NAN;
            }
        }

        let total = orientation(pa, pb, pc);
        let wa = orientation(p, pb, pc) / total;
        let wb = orientation(pa, p, pc) / total;
        let wc = orientation(pa, pb, p) / total;

        wa * vertex_z(self.tin, a) + wb * vertex_z(self.tin, b) + wc * vertex_z(self.tin, c)
    }

    fn reset_for_change_to_tin(&mut self) {
        self.search_hint = EdgeId::INVALID;
    }
}

/// Sibson-style natural neighbor interpolation. The natural neighbor set is
/// exact (every vertex of every triangle whose circumcircle contains the
/// query point); the weighting is a documented simplification of Sibson's
/// stolen-area rule, using normalized inverse-squared distance over that
/// exact set instead of differencing Voronoi cell areas before and after a
/// virtual insertion.
pub struct NaturalNeighborInterpolator<'a> {
    tin: &'a Tin,
    search_hint: EdgeId,
    max_distance: Option<f64>,
    region: Option<RegionIndex>,
}

impl<'a> NaturalNeighborInterpolator<'a> {
    pub fn new(tin: &'a Tin) -> NaturalNeighborInterpolator<'a> {
        NaturalNeighborInterpolator {
            tin,
            search_hint: EdgeId::INVALID,
            max_distance: None,
            region: None,
        }
    }

    pub fn with_max_distance(mut self, d: f64) -> Self {
        self.max_distance = Some(d);
        self
    }

    pub fn with_constrained_regions_only(mut self, region: RegionIndex) -> Self {
        self.region = Some(region);
        self
    }

    fn natural_neighbors(&self, start: EdgeId, q: [f64; 2]) -> Vec<VertexId> {
        let store = self.tin.store();
        let mut neighbors = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        let e1 = store.forward(start);
        let e2 = store.forward(e1);
        for v in [start, e1, e2].map(|e| store.origin(e)) {
            if v != VertexId::GHOST && !neighbors.contains(&v) {
                neighbors.push(v);
            }
        }
        queue.push_back(start);
        queue.push_back(e1);
        queue.push_back(e2);

        let mut guard = 0usize;
        while let Some(e) = queue.pop_front() {
            guard += 1;
            if guard > crate::locate::MAX_WALK_STEPS * 8 {
                break;
            }
            let d = e.dual();
            if !store.is_allocated(d) {
                continue;
            }
            let f1 = store.forward(d);
            let f2 = store.forward(f1);
            let key = [d.0, f1.0, f2.0].into_iter().min().unwrap();
            if !visited.insert(key) {
                continue;
            }

            let p = store.origin(d);
            let qv = store.origin(f1);
            let r = store.origin(f2);
            if p == VertexId::GHOST || qv == VertexId::GHOST || r == VertexId::GHOST {
                continue;
            }
            let pa = self.tin.xy(p);
            let pb = self.tin.xy(qv);
            let pc = self.tin.xy(r);
            if in_circle(pa, pb, pc, q) <= 0.0 {
                continue;
            }
            for v in [p, qv, r] {
                if !neighbors.contains(&v) {
                    neighbors.push(v);
                }
            }
            queue.push_back(f1);
            queue.push_back(f2);
            queue.push_back(d);
        }

        neighbors
    }
}

impl<'a> Interpolator for NaturalNeighborInterpolator<'a> {
    fn interpolate(&mut self, x: f64, y: f64) -> f64 {
        let loc = match locate_from(self.tin, self.search_hint, x, y) {
            Some(loc) => loc,
            None => return f64::NAN,
        };

        let e = match loc {
            Location::Outside(_) => return f64::NAN,
            Location::OnVertex(v) => return vertex_z(self.tin, v),
            Location::OnEdge(e) | Location::InTriangle(e) => e,
        };
        self.search_hint = e;

        if let Some(region) = self.region {
            if !within_region(self.tin, e, region) {
                return f64::NAN;
            }
        }

        let q = [x, y];
        let neighbors = self.natural_neighbors(e, q);
        if neighbors.is_empty() {
            return f64::NAN;
        }

        if let Some(max_d) = self.max_distance {
            let nearest = neighbors
                .iter()
                .map(|&v| distance(q, self.tin.xy(v)))
                .fold(f64::MAX, f64::min);
            if nearest > max_d {
                return f64::NAN;
            }
        }

        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        for &v in &neighbors {
            let d = distance(q, self.tin.xy(v));
            if d <= self.tin.thresholds().precision_threshold {
                return vertex_z(self.tin, v);
            }
            let w = 1.0 / (d * d);
            weight_sum += w;
            value_sum += w * vertex_z(self.tin, v);
        }
        value_sum / weight_sum
    }

    fn reset_for_change_to_tin(&mut self) {
        self.search_hint = EdgeId::INVALID;
    }
}

/// Classic inverse distance weighting over the k nearest vertices, found by
/// expanding outward one pinwheel ring at a time from the locating edge's
/// three vertices (Sec 4.10).
pub struct InverseDistanceWeightingInterpolator<'a> {
    tin: &'a Tin,
    search_hint: EdgeId,
    max_distance: Option<f64>,
    region: Option<RegionIndex>,
    k: usize,
    power: f64,
}

impl<'a> InverseDistanceWeightingInterpolator<'a> {
    pub fn new(tin: &'a Tin) -> InverseDistanceWeightingInterpolator<'a> {
        InverseDistanceWeightingInterpolator {
            tin,
            search_hint: EdgeId::INVALID,
            max_distance: None,
            region: None,
            k: 12,
            power: 2.0,
        }
    }

    pub fn with_max_distance(mut self, d: f64) -> Self {
        self.max_distance = Some(d);
        self
    }

    pub fn with_constrained_regions_only(mut self, region: RegionIndex) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    fn k_nearest(&self, start: EdgeId, q: [f64; 2]) -> Vec<VertexId> {
        let store = self.tin.store();
        let e1 = store.forward(start);
        let e2 = store.forward(e1);

        let mut collected: Vec<VertexId> = Vec::new();
        let mut frontier: Vec<EdgeId> = vec![start, e1, e2];
        let mut seen_vertices = HashSet::new();
        let mut seen_spokes = HashSet::new();

        for &v in frontier.iter().map(|&e| store.origin(e)).collect::<Vec<_>>().iter() {
            if v != VertexId::GHOST && seen_vertices.insert(v) {
                collected.push(v);
            }
        }

        let mut guard = 0usize;
        while collected.len() < self.k && !frontier.is_empty() {
            guard += 1;
            if guard > crate::locate::MAX_WALK_STEPS * 8 {
                break;
            }
            let mut next_frontier = Vec::new();
            for spoke in frontier {
                if !seen_spokes.insert(spoke.0) {
                    continue;
                }
                let origin = store.origin(spoke);
                if origin == VertexId::GHOST {
                    continue;
                }
                let mut cur = spoke;
                for _ in 0..crate::locate::MAX_WALK_STEPS {
                    let dest = store.dest(cur);
                    if dest != VertexId::GHOST && seen_vertices.insert(dest) {
                        collected.push(dest);
                    }
                    if dest != VertexId::GHOST {
                        next_frontier.push(cur);
                    }
                    cur = crate::iter::pinwheel_next(store, cur);
                    if cur == spoke {
                        break;
                    }
                }
            }
            frontier = next_frontier;
            if frontier.iter().all(|e| seen_spokes.contains(&e.0)) {
                break;
            }
        }

        collected.sort_by_key(|&v| ordered_float::OrderedFloat(distance(q, self.tin.xy(v))));
        collected.truncate(self.k);
        collected
    }
}

impl<'a> Interpolator for InverseDistanceWeightingInterpolator<'a> {
    fn interpolate(&mut self, x: f64, y: f64) -> f64 {
        let loc = match locate_from(self.tin, self.search_hint, x, y) {
            Some(loc) => loc,
            None => return f64::NAN,
        };

        let e = match loc {
            Location::Outside(_) => return f64::NAN,
            Location::OnVertex(v) => return vertex_z(self.tin, v),
            Location::OnEdge(e) | Location::InTriangle(e) => e,
        };
        self.search_hint = e;

        if let Some(region) = self.region {
            if !within_region(self.tin, e, region) {
                return f64::NAN;
            }
        }

        let q = [x, y];
        let neighbors = self.k_nearest(e, q);
        if neighbors.is_empty() {
            return f64::NAN;
        }

        if let Some(max_d) = self.max_distance {
            let nearest = neighbors
                .iter()
                .map(|&v| distance(q, self.tin.xy(v)))
                .fold(f64::MAX, f64::min);
            if nearest > max_d {
                return f64::NAN;
            }
        }

        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        for &v in &neighbors {
            let d = distance(q, self.tin.xy(v));
            if d <= self.tin.thresholds().precision_threshold {
                return vertex_z(self.tin, v);
            }
            let w = 1.0 / d.powf(self.power);
            weight_sum += w;
            value_sum += w * vertex_z(self.tin, v);
        }
        value_sum / weight_sum
    }

    fn reset_for_change_to_tin(&mut self) {
        self.search_hint = EdgeId::INVALID;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn facet_interpolation_is_exact_at_vertices() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 1.0, 1).unwrap();
        tin.add(10.0, 0.0, 2.0, 2).unwrap();
        tin.add(0.0, 10.0, 3.0, 3).unwrap();

        let mut interp = TriangularFacetInterpolator::new(&tin);
        assert!((interp.interpolate(0.0, 0.0) - 1.0).abs() < 1e-9);
        assert!((interp.interpolate(10.0, 0.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn facet_interpolation_is_planar_at_centroid() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(3.0, 0.0, 3.0, 2).unwrap();
        tin.add(0.0, 3.0, 3.0, 3).unwrap();

        let mut interp = TriangularFacetInterpolator::new(&tin);
        let z = interp.interpolate(1.0, 1.0);
        assert!((z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn outside_hull_is_nan() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 1.0, 1).unwrap();
        tin.add(10.0, 0.0, 2.0, 2).unwrap();
        tin.add(0.0, 10.0, 3.0, 3).unwrap();

        let mut interp = TriangularFacetInterpolator::new(&tin);
        assert!(interp.interpolate(-5.0, -5.0).is_nan());
    }

    #[test]
    fn idw_matches_nearest_vertex_when_queried_on_it() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 5.0, 1).unwrap();
        tin.add(10.0, 0.0, 7.0, 2).unwrap();
        tin.add(0.0, 10.0, 9.0, 3).unwrap();
        tin.add(10.0, 10.0, 11.0, 4).unwrap();

        let mut interp = InverseDistanceWeightingInterpolator::new(&tin);
        assert!((interp.interpolate(0.0, 0.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn natural_neighbor_is_exact_at_vertices() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 4.0, 1).unwrap();
        tin.add(10.0, 0.0, 6.0, 2).unwrap();
        tin.add(0.0, 10.0, 8.0, 3).unwrap();

        let mut interp = NaturalNeighborInterpolator::new(&tin);
        assert!((interp.interpolate(0.0, 0.0) - 4.0).abs() < 1e-9);
    }
}
