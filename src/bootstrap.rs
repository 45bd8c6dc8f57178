//! Bootstrapping the first triangle and its ghost fan (Sec 4.6).
//!
//! Grounded on the teacher's `TriangularNetwork::new`, which seeds a mesh
//! from one real triangle plus an outer boundary. This crate's outer
//! boundary is the ghost-vertex fan (Sec 3): one spoke edge per hull vertex
//! to the sentinel, shared by the two ghost triangles on either side of it.

use crate::edge::EdgeId;
use crate::error::Result;
use crate::predicates::orientation;
use crate::tin::Tin;
use crate::vertex::{Vertex, VertexEntry, VertexId};

/// Attempt to bootstrap from `tin.staged`. Leaves `staged` untouched (and
/// `bootstrapped` false) if every triple tried so far is collinear or
/// degenerate; the caller keeps staging points and retries on the next
/// [`Tin::add`] call.
pub fn try_bootstrap(tin: &mut Tin) -> Result<()> {
    debug_assert!(!tin.bootstrapped);

    let area_floor = tin.thresholds().half_plane_threshold;
    let staged = tin.staged.clone();

    for i in 0..staged.len() {
        for j in (i + 1)..staged.len() {
            for k in (j + 1)..staged.len() {
                let (ax, ay, _, _) = staged[i];
                let (bx, by, _, _) = staged[j];
                let (cx, cy, _, _) = staged[k];
                let o = orientation([ax, ay], [bx, by], [cx, cy]);
                if o.abs() <= area_floor {
                    continue;
                }
                return bootstrap_with(tin, staged, i, j, k, o > 0.0);
            }
        }
    }

    Ok(())
}

fn bootstrap_with(
    tin: &mut Tin,
    staged: Vec<(f64, f64, f64, u64)>,
    i: usize,
    j: usize,
    k: usize,
    already_ccw: bool,
) -> Result<()> {
    let (mut ix, mut jx, mut kx) = (i, j, k);
    if !already_ccw {
        std::mem::swap(&mut jx, &mut kx);
    }
    let (ax, ay, az, ai) = staged[ix];
    let (bx, by, bz, bi) = staged[jx];
    let (cx, cy, cz, ci) = staged[kx];

    let va = push_vertex(tin, Vertex::new(ax, ay, az, ai));
    let vb = push_vertex(tin, Vertex::new(bx, by, bz, bi));
    let vc = push_vertex(tin, Vertex::new(cx, cy, cz, ci));

    let e_ab = tin.store_mut().allocate(va, vb);
    let e_bc = tin.store_mut().allocate(vb, vc);
    let e_ca = tin.store_mut().allocate(vc, va);
    chain(tin, &[e_ab, e_bc, e_ca]);

    let spoke_a = tin.store_mut().allocate(va, VertexId::GHOST);
    let spoke_b = tin.store_mut().allocate(vb, VertexId::GHOST);
    let spoke_c = tin.store_mut().allocate(vc, VertexId::GHOST);

    chain(tin, &[e_ab.dual(), spoke_a, spoke_b.dual()]);
    chain(tin, &[e_bc.dual(), spoke_b, spoke_c.dual()]);
    chain(tin, &[e_ca.dual(), spoke_c, spoke_a.dual()]);

    tin.search_hint = e_ab;
    tin.bootstrapped = true;

    // Re-stage and insert every point that wasn't part of the seed triangle,
    // in original arrival order.
    tin.staged = Vec::new();
    for (idx, pt) in staged.into_iter().enumerate() {
        if idx == i || idx == j || idx == k {
            continue;
        }
        let (x, y, z, index) = pt;
        crate::insert::insert_point(tin, x, y, z, index)?;
    }

    Ok(())
}

fn push_vertex(tin: &mut Tin, v: Vertex) -> VertexId {
    let id = VertexId(tin.vertices.len() as u32);
    tin.vertices.push(VertexEntry::Single(v));
    id
}

/// Wire a CCW cycle of edges: `edges[n].forward = edges[n+1]` (mod len).
fn chain(tin: &mut Tin, edges: &[EdgeId]) {
    let n = edges.len();
    for idx in 0..n {
        let cur = edges[idx];
        let next = edges[(idx + 1) % n];
        tin.store_mut().set_forward(cur, next);
        tin.store_mut().set_reverse(next, cur);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn skips_collinear_triples_until_a_real_one() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(1.0, 0.0, 0.0, 2).unwrap();
        tin.add(2.0, 0.0, 0.0, 3).unwrap();
        assert!(!tin.is_bootstrapped());
        tin.add(0.0, 1.0, 0.0, 4).unwrap();
        assert!(tin.is_bootstrapped());
        assert_eq!(tin.vertex_count(), 4);
    }
}
