//! The top-level triangulation handle (Sec 6).
//!
//! Grounded on the teacher's `TriangularNetwork` in
//! `algorithms/triangulation/delaunay.rs`: a struct owning the edge arena and
//! the vertex table, exposing `insert`/`locate` plus iteration helpers. This
//! version adds the staging buffer, lock flag, constraint registry, and
//! search-edge cache the spec's richer lifecycle (Sec 4.1, 4.6, 4.8) calls
//! for.

use crate::edge::{EdgeId, LineIndex, RegionIndex};
use crate::error::{Error, Result};
use crate::store::EdgeStore;
use crate::thresholds::Thresholds;
use crate::vertex::{Vertex, VertexEntry, VertexId};

/// Axis-aligned bounds of every vertex added so far (Sec 4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn grow(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Metadata for one registered line (polyline) constraint (Sec 4.8).
#[derive(Debug, Clone)]
pub struct LineConstraint {
    pub index: LineIndex,
    pub vertices: Vec<VertexId>,
    pub closed: bool,
    /// One of this constraint's inserted edges, for later lookup (Sec 4.8
    /// Phase 6).
    pub first_edge: Option<EdgeId>,
}

/// Metadata for one registered region (polygon, possibly with holes)
/// constraint (Sec 4.8).
#[derive(Debug, Clone)]
pub struct RegionConstraint {
    pub index: RegionIndex,
    pub is_hole: bool,
    pub vertices: Vec<VertexId>,
    pub first_edge: Option<EdgeId>,
}

/// A constrained Delaunay triangulation built incrementally from scattered
/// 2.5-D points.
///
/// `Tin` is not `Sync`/`Send`-restricted but is not internally synchronized
/// either; callers needing concurrent access must add their own locking
/// around a shared `Tin`.
pub struct Tin {
    pub(crate) thresholds: Thresholds,
    pub(crate) store: EdgeStore,
    pub(crate) vertices: Vec<VertexEntry>,
    pub(crate) bounds: Option<Bounds>,
    /// Staged vertices awaiting bootstrap; drained once three non-collinear
    /// points above the area threshold are found (Sec 4.6).
    pub(crate) staged: Vec<(f64, f64, f64, u64)>,
    /// A recently-touched edge, reused as the next `locate` starting point
    /// so repeated nearby insertions stay cheap (Sec 4.5).
    pub(crate) search_hint: EdgeId,
    pub(crate) bootstrapped: bool,
    pub(crate) locked: bool,
    pub(crate) constraints_added: bool,
    pub(crate) lines: Vec<LineConstraint>,
    pub(crate) regions: Vec<RegionConstraint>,
}

impl Tin {
    /// Create an empty triangulation. `nominal_point_spacing` seeds every
    /// tolerance threshold (Sec 4.1) and should be a representative distance
    /// between neighboring input points.
    pub fn new(nominal_point_spacing: f64) -> Result<Tin> {
        if !(nominal_point_spacing > 0.0) {
            return Err(Error::InvalidInput(
                "nominal_point_spacing must be positive".into(),
            ));
        }
        Ok(Tin {
            thresholds: Thresholds::new(nominal_point_spacing),
            store: EdgeStore::new(),
            vertices: vec![VertexEntry::Ghost],
            bounds: None,
            staged: Vec::new(),
            search_hint: EdgeId::INVALID,
            bootstrapped: false,
            locked: false,
            constraints_added: false,
            lines: Vec::new(),
            regions: Vec::new(),
        })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Reserve capacity for `n` additional vertices and their expected edges
    /// (Sec 4.3).
    pub fn preallocate_for_vertices(&mut self, n: usize) {
        self.vertices.reserve(n);
        self.store.preallocate(self.vertices.len() + n);
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Prevent further mutation (`add`, `add_constraints`, ...) until
    /// [`Tin::unlock`] is called (Sec 4.9).
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Drop all topology and staged points, keeping tolerances. Equivalent to
    /// a fresh [`Tin::new`] at the same point spacing (Sec 4.9).
    pub fn clear(&mut self) {
        self.store = EdgeStore::new();
        self.vertices = vec![VertexEntry::Ghost];
        self.bounds = None;
        self.staged.clear();
        self.search_hint = EdgeId::INVALID;
        self.bootstrapped = false;
        self.locked = false;
        self.constraints_added = false;
        self.lines.clear();
        self.regions.clear();
    }

    /// Release everything, leaving the `Tin` in the same state as
    /// [`Tin::clear`]; present for API symmetry with the spec's lifecycle
    /// (Sec 4.9) and to give callers an explicit "I'm done" point.
    pub fn dispose(&mut self) {
        self.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() - 1
    }

    pub(crate) fn check_mutable(&self) -> Result<()> {
        if self.locked {
            return Err(Error::LockedForMutation);
        }
        Ok(())
    }

    pub(crate) fn xy(&self, v: VertexId) -> [f64; 2] {
        self.vertices[v.index()].xy()
    }

    pub(crate) fn grow_bounds(&mut self, x: f64, y: f64) {
        match &mut self.bounds {
            Some(b) => b.grow(x, y),
            None => {
                self.bounds = Some(Bounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                })
            }
        }
    }

    /// Add one point. Returns the [`VertexId`] it was stored at, which may
    /// be an existing id if `(x, y)` merged with a prior vertex (Sec 4.4).
    pub fn add(&mut self, x: f64, y: f64, z: f64, index: u64) -> Result<VertexId> {
        self.check_mutable()?;
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidInput(format!(
                "vertex {index} has non-finite coordinates"
            )));
        }
        self.grow_bounds(x, y);

        if !self.bootstrapped {
            self.staged.push((x, y, z, index));
            if self.staged.len() >= 3 {
                crate::bootstrap::try_bootstrap(self)?;
            }
            if !self.bootstrapped {
                // Still staging; report the slot the point will eventually
                // occupy once bootstrap succeeds.
                return Ok(VertexId(self.vertices.len() as u32 + self.staged.len() as u32 - 1));
            }
            return self.find_vertex_near(x, y, index);
        }

        crate::insert::insert_point(self, x, y, z, index)
    }

    pub fn add_all<I>(&mut self, points: I) -> Result<Vec<VertexId>>
    where
        I: IntoIterator<Item = (f64, f64, f64, u64)>,
    {
        points
            .into_iter()
            .map(|(x, y, z, index)| self.add(x, y, z, index))
            .collect()
    }

    /// Like [`Tin::add_all`], but first reorders the points along a
    /// Z-order (Morton) curve over their bounding box, so that spatially
    /// nearby points are inserted close together in time -- this keeps the
    /// `search_hint` walk short instead of degrading toward a linear scan on
    /// inputs arriving in an adversarial (e.g. row-major raster) order.
    pub fn add_sorted<I>(&mut self, points: I) -> Result<Vec<VertexId>>
    where
        I: IntoIterator<Item = (f64, f64, f64, u64)>,
    {
        let mut points: Vec<(f64, f64, f64, u64)> = points.into_iter().collect();
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for &(x, y, _, _) in &points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let span_x = (max_x - min_x).max(f64::EPSILON);
        let span_y = (max_y - min_y).max(f64::EPSILON);

        points.sort_by_key(|&(x, y, _, _)| {
            let qx = (((x - min_x) / span_x) * u32::MAX as f64) as u32;
            let qy = (((y - min_y) / span_y) * u32::MAX as f64) as u32;
            morton_interleave(qx, qy)
        });

        points
            .into_iter()
            .map(|(x, y, z, index)| self.add(x, y, z, index))
            .collect()
    }

    fn find_vertex_near(&self, x: f64, y: f64, index: u64) -> Result<VertexId> {
        for (i, entry) in self.vertices.iter().enumerate().skip(1) {
            if entry.contains_index(index) {
                return Ok(VertexId(i as u32));
            }
        }
        let _ = (x, y);
        Err(Error::invariant(
            "just-inserted vertex not found by caller index",
        ))
    }

    pub fn is_point_inside(&self, x: f64, y: f64) -> Result<bool> {
        if !self.bootstrapped {
            return Ok(false);
        }
        let loc = crate::locate::locate(&self.store, &self.vertices, self.search_hint, x, y, &self.thresholds)?;
        Ok(!matches!(loc, crate::locate::Location::Outside(_)))
    }

    pub fn vertex(&self, v: VertexId) -> &VertexEntry {
        &self.vertices[v.index()]
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexEntry)> {
        self.vertices
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, e)| (VertexId(i as u32), e))
    }

    pub(crate) fn store(&self) -> &EdgeStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut EdgeStore {
        &mut self.store
    }

    pub fn max_edge_allocation_index(&self) -> u32 {
        self.store.max_allocation_index()
    }

    /// Register polyline/polygon constraints and realize them as constrained
    /// edges (Sec 4.8). May be called at most once per `Tin` (Sec 5).
    pub fn add_constraints(
        &mut self,
        constraints: Vec<crate::constraints::ConstraintSpec>,
        restore_conformity: bool,
    ) -> Result<()> {
        crate::constraints::add_constraints(self, constraints, restore_conformity)
    }

    pub fn line_constraint(&self, index: LineIndex) -> Option<&LineConstraint> {
        self.lines.iter().find(|l| l.index == index)
    }

    pub fn region_constraint(&self, index: RegionIndex) -> Option<&RegionConstraint> {
        self.regions.iter().find(|r| r.index == index)
    }

    pub fn line_constraints(&self) -> &[LineConstraint] {
        &self.lines
    }

    pub fn region_constraints(&self) -> &[RegionConstraint] {
        &self.regions
    }

    pub fn is_constrained(&self, e: EdgeId) -> bool {
        self.store.constraint(e).constrained
    }

    /// The vertex `e` points away from (Sec 9 "origin vertex").
    pub fn edge_origin(&self, e: EdgeId) -> VertexId {
        self.store.origin(e)
    }

    /// The vertex `e` points at; `edge_origin(e.dual())`.
    pub fn edge_dest(&self, e: EdgeId) -> VertexId {
        self.store.dest(e)
    }

    /// The full constraint side-table entry for `e`'s undirected pair, for
    /// callers exporting the bit-exact layout via
    /// [`crate::edge::ConstraintState::to_packed_bits`] (Sec 6).
    pub fn edge_constraint(&self, e: EdgeId) -> &crate::edge::ConstraintState {
        self.store.constraint(e)
    }

    /// Lazy, non-restartable iterator over every triangle (ghost included)
    /// (Sec 4.9, Sec 6 `getTriangles`).
    pub fn triangles(&self) -> crate::iter::Triangles<'_> {
        crate::iter::Triangles::new(&self.store)
    }

    pub fn count_triangles(&self) -> crate::iter::TriangleCounts {
        crate::iter::count_triangles(&self.store)
    }

    /// Lazy, non-restartable iterator over the hull boundary (Sec 4.9, Sec 6
    /// `getPerimeter`).
    pub fn perimeter(&self) -> crate::iter::Perimeter<'_> {
        crate::iter::Perimeter::new(&self.store, self.search_hint)
    }

    /// Lazy, non-restartable iterator over every allocated directed edge
    /// (Sec 6 `edges()`).
    pub fn edges(&self) -> crate::iter::Edges<'_> {
        crate::iter::Edges::new(&self.store)
    }
}

/// Interleave the low 16 bits of `x` and `y` into a 32-bit Morton code
/// (even bits from `x`, odd bits from `y`).
fn morton_interleave(x: u32, y: u32) -> u32 {
    fn spread(mut v: u32) -> u32 {
        v &= 0x0000_ffff;
        v = (v | (v << 8)) & 0x00ff_00ff;
        v = (v | (v << 4)) & 0x0f0f_0f0f;
        v = (v | (v << 2)) & 0x3333_3333;
        v = (v | (v << 1)) & 0x5555_5555;
        v
    }
    spread(x >> 16) | (spread(y >> 16) << 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_rejects_non_positive_spacing() {
        assert!(Tin::new(0.0).is_err());
        assert!(Tin::new(-1.0).is_err());
    }

    #[test]
    fn bootstraps_after_three_non_collinear_points() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(4.0, 0.0, 0.0, 2).unwrap();
        assert!(!tin.is_bootstrapped());
        tin.add(0.0, 4.0, 0.0, 3).unwrap();
        assert!(tin.is_bootstrapped());
        assert_eq!(tin.vertex_count(), 3);
    }

    #[test]
    fn locked_tin_rejects_add() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.lock();
        assert_eq!(tin.add(0.0, 0.0, 0.0, 1), Err(Error::LockedForMutation));
    }
}
