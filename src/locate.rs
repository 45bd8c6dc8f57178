//! Lawson's stochastic point-location walk (Sec 4.5).
//!
//! Grounded on the teacher's `locate`/`locate_recursive` pair in
//! `algorithms/triangulation/delaunay.rs`, replacing its exact-orientation
//! generic scalar with [`crate::predicates::half_plane`] and its recursive
//! descent with an explicit loop bounded by a hard iteration cap, since this
//! crate has no "debug assert and keep going" fallback available at runtime.

use crate::edge::EdgeId;
use crate::error::{Error, Result};
use crate::predicates::half_plane;
use crate::thresholds::Thresholds;
use crate::vertex::{VertexEntry, VertexId};

/// Hard cap on walk steps before the walk is considered non-terminating
/// (Sec 4.5). A correctly triangulated, non-pathological input should never
/// approach this.
pub const MAX_WALK_STEPS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The query point coincides with this vertex.
    OnVertex(VertexId),
    /// The query point lies on the interior of this edge (neither endpoint).
    OnEdge(EdgeId),
    /// The query point is in the interior of the triangle to the left of this
    /// edge.
    InTriangle(EdgeId),
    /// The query point is outside the convex hull; `EdgeId` is the hull edge
    /// it is beyond.
    Outside(EdgeId),
}

/// A cheap, deterministic-per-query pseudo-random stream used only to break
/// ties in which of a triangle's two non-origin edges to cross first. Seeded
/// from the query coordinates so repeated locates of the same point walk
/// identically (Sec 4.5).
struct XorShift64(u64);

impl XorShift64 {
    fn seeded(x: f64, y: f64) -> XorShift64 {
        let seed = x.to_bits() ^ y.to_bits().rotate_left(32) ^ 0x9E3779B97F4A7C15;
        XorShift64(if seed == 0 { 0xD1B54A32D192ED03 } else { seed })
    }

    fn next_bool(&mut self) -> bool {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x & 1 == 0
    }
}

fn xy(vertices: &[VertexEntry], v: VertexId) -> [f64; 2] {
    vertices[v.index()].xy()
}

/// Walk from `start` toward `(qx, qy)`, returning the triangle, edge, or
/// vertex the point resolves to.
///
/// `start` must be a real (non-ghost-origin) edge belonging to a currently
/// allocated triangle; callers typically pass the triangulation's cached
/// search-edge hint.
pub fn locate(
    store: &crate::store::EdgeStore,
    vertices: &[VertexEntry],
    start: EdgeId,
    qx: f64,
    qy: f64,
    t: &Thresholds,
) -> Result<Location> {
    let mut e = start;
    let mut rng = XorShift64::seeded(qx, qy);
    let q = [qx, qy];

    for _ in 0..MAX_WALK_STEPS {
        let a_id = store.origin(e);
        let b_id = store.origin(store.forward(e));
        let c_id = store.origin(store.forward(store.forward(e)));

        if a_id == VertexId::GHOST || b_id == VertexId::GHOST || c_id == VertexId::GHOST {
            // We've walked onto a ghost triangle: the query is outside the hull.
            // The real edge of this ghost triangle is the hull edge it sits
            // beyond.
            return Ok(Location::Outside(hull_edge_of_ghost_triangle(store, e)));
        }

        let a = xy(vertices, a_id);
        let b = xy(vertices, b_id);
        let c = xy(vertices, c_id);

        if a == q {
            return Ok(Location::OnVertex(a_id));
        }
        if b == q {
            return Ok(Location::OnVertex(b_id));
        }
        if c == q {
            return Ok(Location::OnVertex(c_id));
        }

        let ab = half_plane(a, b, q, t);
        let bc = half_plane(b, c, q, t);
        let ca = half_plane(c, a, q, t);

        let outside_ab = ab < 0.0;
        let outside_bc = bc < 0.0;
        let outside_ca = ca < 0.0;

        if !outside_ab && !outside_bc && !outside_ca {
            if ab == 0.0 {
                return Ok(Location::OnEdge(e));
            }
            if bc == 0.0 {
                return Ok(Location::OnEdge(store.forward(e)));
            }
            if ca == 0.0 {
                return Ok(Location::OnEdge(store.forward(store.forward(e))));
            }
            return Ok(Location::InTriangle(e));
        }

        // Cross whichever violated edge we pick; when two are violated,
        // break the tie with the query-seeded stream so the walk doesn't
        // bias toward one winding direction on degenerate inputs.
        let e1 = store.forward(e);
        let e2 = store.forward(e1);
        e = match (outside_ab, outside_bc, outside_ca) {
            (true, false, false) => e.dual(),
            (false, true, false) => e1.dual(),
            (false, false, true) => e2.dual(),
            (true, true, false) => {
                if rng.next_bool() {
                    e.dual()
                } else {
                    e1.dual()
                }
            }
            (false, true, true) => {
                if rng.next_bool() {
                    e1.dual()
                } else {
                    e2.dual()
                }
            }
            (true, false, true) => {
                if rng.next_bool() {
                    e.dual()
                } else {
                    e2.dual()
                }
            }
            (true, true, true) => {
                return Err(Error::invariant_edge(
                    "locate: all three edges of a triangle report the query outside",
                    e,
                ));
            }
        };
    }

    Err(Error::invariant(format!(
        "locate did not terminate within {MAX_WALK_STEPS} steps"
    )))
}

/// Given an edge of a ghost triangle, return the one real (non-ghost-incident)
/// edge bounding it, i.e. the hull edge the query lies beyond.
fn hull_edge_of_ghost_triangle(store: &crate::store::EdgeStore, e: EdgeId) -> EdgeId {
    let e1 = store.forward(e);
    let e2 = store.forward(e1);
    for cand in [e, e1, e2] {
        let a = store.origin(cand);
        let b = store.origin(store.forward(cand));
        if a != VertexId::GHOST && b != VertexId::GHOST {
            return cand;
        }
    }
    e
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::EdgeStore;
    use crate::vertex::Vertex;

    fn unit_triangle() -> (EdgeStore, Vec<VertexEntry>, EdgeId) {
        let mut store = EdgeStore::new();
        let vertices = vec![
            VertexEntry::Ghost,
            VertexEntry::Single(Vertex::new(0.0, 0.0, 0.0, 1)),
            VertexEntry::Single(Vertex::new(4.0, 0.0, 0.0, 2)),
            VertexEntry::Single(Vertex::new(0.0, 4.0, 0.0, 3)),
        ];
        let e0 = store.allocate(VertexId(1), VertexId(2));
        let e1 = store.allocate(VertexId(2), VertexId(3));
        let e2 = store.allocate(VertexId(3), VertexId(1));
        store.set_forward(e0, e1);
        store.set_forward(e1, e2);
        store.set_forward(e2, e0);
        store.set_reverse(e0, e2);
        store.set_reverse(e1, e0);
        store.set_reverse(e2, e1);
        (store, vertices, e0)
    }

    #[test]
    fn locates_interior_point() {
        let (store, vertices, e0) = unit_triangle();
        let t = Thresholds::new(1.0);
        let loc = locate(&store, &vertices, e0, 1.0, 1.0, &t).unwrap();
        assert_eq!(loc, Location::InTriangle(e0));
    }

    #[test]
    fn locates_exact_vertex() {
        let (store, vertices, e0) = unit_triangle();
        let t = Thresholds::new(1.0);
        let loc = locate(&store, &vertices, e0, 0.0, 0.0, &t).unwrap();
        assert_eq!(loc, Location::OnVertex(VertexId(1)));
    }
}
