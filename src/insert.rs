//! Incremental point insertion: interior split, on-edge split, and hull
//! extension, each followed by Lawson flip propagation (Sec 4.6, 4.7).
//!
//! Grounded on the teacher's `insert`/`cut`/`cut_apply_inner`/`maybe_swap` in
//! `algorithms/triangulation/delaunay.rs`, replacing its exact-predicate
//! `maybe_swap` with [`crate::predicates::in_circle`] and its recursive
//! `Cut` enum with an explicit edge-stack legalization loop.

use crate::edge::EdgeId;
use crate::error::Result;
use crate::locate::{locate, Location};
use crate::predicates::{in_circle, orientation};
use crate::store::EdgeStore;
use crate::tin::Tin;
use crate::vertex::{Vertex, VertexEntry, VertexId};

pub fn insert_point(tin: &mut Tin, x: f64, y: f64, z: f64, index: u64) -> Result<VertexId> {
    let start = if tin.search_hint.is_valid() {
        tin.search_hint
    } else {
        EdgeId(0)
    };
    let loc = locate(&tin.store, &tin.vertices, start, x, y, &tin.thresholds)?;

    let result = match loc {
        Location::OnVertex(v) => {
            merge_into(tin, v, x, y, z, index);
            v
        }
        Location::OnEdge(e) => {
            if let Some(existing) = tolerance_merge_candidate(tin, e, x, y) {
                merge_into(tin, existing, x, y, z, index);
                existing
            } else {
                insert_on_edge(tin, e, x, y, z, index)?
            }
        }
        Location::InTriangle(e) => {
            if let Some(existing) = tolerance_merge_candidate_triangle(tin, e, x, y) {
                merge_into(tin, existing, x, y, z, index);
                existing
            } else {
                insert_in_triangle(tin, e, x, y, z, index)?
            }
        }
        Location::Outside(e) => insert_outside_hull(tin, e, x, y, z, index)?,
    };
    Ok(result)
}

fn tolerance_merge_candidate(tin: &Tin, e: EdgeId, x: f64, y: f64) -> Option<VertexId> {
    let a = tin.store.origin(e);
    let b = tin.store.dest(e);
    [a, b].into_iter().find(|&v| within_tolerance(tin, v, x, y))
}

fn tolerance_merge_candidate_triangle(tin: &Tin, e: EdgeId, x: f64, y: f64) -> Option<VertexId> {
    let a = tin.store.origin(e);
    let b = tin.store.dest(e);
    let c = tin.store.dest(tin.store.forward(e));
    [a, b, c].into_iter().find(|&v| within_tolerance(tin, v, x, y))
}

fn within_tolerance(tin: &Tin, v: VertexId, x: f64, y: f64) -> bool {
    if v == VertexId::GHOST {
        return false;
    }
    let [vx, vy] = tin.xy(v);
    let dx = vx - x;
    let dy = vy - y;
    dx * dx + dy * dy <= tin.thresholds.vertex_tolerance_sq
}

fn merge_into(tin: &mut Tin, v: VertexId, x: f64, y: f64, z: f64, index: u64) {
    let new_vertex = Vertex::new(x, y, z, index);
    log::trace!("merging vertex {index} into existing slot {v:?}");
    let slot = &mut tin.vertices[v.index()];
    match slot {
        VertexEntry::Single(existing) => {
            let group = crate::vertex::MergerGroup {
                x: existing.x,
                y: existing.y,
                members: vec![existing.clone(), new_vertex],
            };
            *slot = VertexEntry::Group(group);
        }
        VertexEntry::Group(group) => group.members.push(new_vertex),
        VertexEntry::Ghost => unreachable!("ghost vertex cannot be a merge target"),
    }
}

pub(crate) fn push_vertex(tin: &mut Tin, x: f64, y: f64, z: f64, index: u64) -> VertexId {
    let id = VertexId(tin.vertices.len() as u32);
    tin.vertices.push(VertexEntry::Single(Vertex::new(x, y, z, index)));
    id
}

/// Same as [`push_vertex`] but for a synthetic, constraint-member vertex
/// (Sec 4.8 Phase 4, conformity-restoration midpoint splits).
pub(crate) fn push_synthetic_vertex(tin: &mut Tin, x: f64, y: f64, z: f64, index: u64) -> VertexId {
    let id = VertexId(tin.vertices.len() as u32);
    tin.vertices.push(VertexEntry::Single(Vertex::synthetic(x, y, z, index)));
    id
}

/// Replace a quad face `e1 -> e2 -> e3 -> e4 -> e1` with a diagonal from
/// `dest(e1)` to `dest(e3)`, producing triangles `(e1, diag, e4)` and
/// `(e2, e3, dual(diag))`. Shared by on-edge insertion and constrained-edge
/// conformity splitting (Sec 4.8), both of which subdivide an edge via
/// [`EdgeStore::split`] and must re-triangulate the two faces it leaves as
/// quads.
pub(crate) fn triangulate_quad(store: &mut EdgeStore, e1: EdgeId, e2: EdgeId, e3: EdgeId, e4: EdgeId) -> EdgeId {
    let v = store.dest(e1);
    let c = store.dest(e3);
    let diag = store.allocate(v, c);

    store.set_forward(e1, diag);
    store.set_reverse(diag, e1);
    store.set_forward(diag, e4);
    store.set_reverse(e4, diag);

    store.set_forward(e2, e3);
    store.set_forward(e3, diag.dual());
    store.set_reverse(diag.dual(), e3);
    store.set_forward(diag.dual(), e2);
    store.set_reverse(e2, diag.dual());

    diag
}

fn insert_on_edge(tin: &mut Tin, e: EdgeId, x: f64, y: f64, z: f64, index: u64) -> Result<VertexId> {
    let e_next = tin.store.forward(e);
    let e_ca = tin.store.forward(e_next);
    let d = e.dual();
    let d_next = tin.store.forward(d);
    let d_prev = tin.store.forward(d_next);

    let v = push_vertex(tin, x, y, z, index);
    let p = tin.store_mut().split(e, v);

    let diag_left = triangulate_quad(tin.store_mut(), p, e, e_next, e_ca);
    let diag_right = triangulate_quad(tin.store_mut(), d, p.dual(), d_next, d_prev);

    tin.search_hint = e;
    legalize(tin, vec![e_next, e_ca, d_next, d_prev, diag_left, diag_right]);
    Ok(v)
}

fn insert_in_triangle(tin: &mut Tin, e: EdgeId, x: f64, y: f64, z: f64, index: u64) -> Result<VertexId> {
    let e1 = tin.store.forward(e);
    let e2 = tin.store.forward(e1);
    let a = tin.store.origin(e);
    let b = tin.store.origin(e1);
    let c = tin.store.origin(e2);

    let v = push_vertex(tin, x, y, z, index);

    let p_a = tin.store_mut().allocate(a, v);
    let p_b = tin.store_mut().allocate(b, v);
    let p_c = tin.store_mut().allocate(c, v);

    // Triangle (a, b, v)
    tin.store_mut().set_forward(e, p_b);
    tin.store_mut().set_reverse(p_b, e);
    tin.store_mut().set_forward(p_b, p_a.dual());
    tin.store_mut().set_reverse(p_a.dual(), p_b);
    tin.store_mut().set_forward(p_a.dual(), e);
    tin.store_mut().set_reverse(e, p_a.dual());

    // Triangle (b, c, v)
    tin.store_mut().set_forward(e1, p_c);
    tin.store_mut().set_reverse(p_c, e1);
    tin.store_mut().set_forward(p_c, p_b.dual());
    tin.store_mut().set_reverse(p_b.dual(), p_c);
    tin.store_mut().set_forward(p_b.dual(), e1);
    tin.store_mut().set_reverse(e1, p_b.dual());

    // Triangle (c, a, v)
    tin.store_mut().set_forward(e2, p_a);
    tin.store_mut().set_reverse(p_a, e2);
    tin.store_mut().set_forward(p_a, p_c.dual());
    tin.store_mut().set_reverse(p_c.dual(), p_a);
    tin.store_mut().set_forward(p_c.dual(), e2);
    tin.store_mut().set_reverse(e2, p_c.dual());

    tin.search_hint = e;
    legalize(tin, vec![e, e1, e2]);
    Ok(v)
}

/// `p -> ghost`, given a real hull edge `p -> q` (Sec 3 ghost fan layout).
pub(crate) fn spoke_of_origin(store: &EdgeStore, real_edge: EdgeId) -> EdgeId {
    store.forward(real_edge.dual())
}

/// `q -> ghost`, given a real hull edge `p -> q`.
pub(crate) fn spoke_of_dest(store: &EdgeStore, real_edge: EdgeId) -> EdgeId {
    store.reverse(real_edge.dual()).dual()
}

/// Given the spoke `p -> ghost`, the next hull vertex `q` going CCW (i.e. the
/// real edge is `p -> q`), its spoke, and the real edge itself.
pub(crate) fn step_forward(store: &EdgeStore, spoke_p: EdgeId) -> (VertexId, EdgeId, EdgeId) {
    let spoke_q = store.forward(spoke_p).dual();
    let q = store.origin(spoke_q);
    let e_pq = store.reverse(spoke_p).dual();
    (q, e_pq, spoke_q)
}

/// Given the spoke `p -> ghost`, the previous hull vertex `r` going CCW
/// (real edge `r -> p`), its spoke, and the real edge itself.
pub(crate) fn step_backward(store: &EdgeStore, spoke_p: EdgeId) -> (VertexId, EdgeId, EdgeId) {
    let spoke_r = store.reverse(spoke_p.dual());
    let r = store.origin(spoke_r);
    let e_rp = store.forward(spoke_p.dual()).dual();
    (r, e_rp, spoke_r)
}

/// Extend the hull to include a point outside it. Walks the hull fan in both
/// directions from the located edge to find every hull edge `(x, y)` is
/// beyond, fans `v` to each vertex along that chain, and reknits the two
/// ghost triangles at the ends plus `v`'s own spoke (Sec 4.7).
fn insert_outside_hull(tin: &mut Tin, hull_edge: EdgeId, x: f64, y: f64, z: f64, index: u64) -> Result<VertexId> {
    let mut verts = vec![tin.store.origin(hull_edge)];
    let mut edges = vec![hull_edge];

    // Walk forward (growing the chain past `dest(hull_edge)`).
    let mut cur = tin.store.dest(hull_edge);
    let mut spoke = spoke_of_dest(&tin.store, hull_edge);
    for _ in 0..crate::locate::MAX_WALK_STEPS {
        let (q, e_pq, spoke_q) = step_forward(&tin.store, spoke);
        if orientation(tin.xy(cur), tin.xy(q), [x, y]) <= 0.0 {
            break;
        }
        verts.push(cur);
        edges.push(e_pq);
        cur = q;
        spoke = spoke_q;
    }
    verts.push(cur);

    // Walk backward (growing the chain before `origin(hull_edge)`).
    let mut cur = tin.store.origin(hull_edge);
    let mut spoke = spoke_of_origin(&tin.store, hull_edge);
    for _ in 0..crate::locate::MAX_WALK_STEPS {
        let (r, e_rp, spoke_r) = step_backward(&tin.store, spoke);
        if orientation(tin.xy(r), tin.xy(cur), [x, y]) <= 0.0 {
            break;
        }
        verts.insert(0, r);
        edges.insert(0, e_rp);
        cur = r;
        spoke = spoke_r;
    }

    let k = edges.len();

    // Capture every spoke this edit will touch before any relinking, since
    // `spoke_of_*` reads the current forward/reverse pointers and the main
    // wiring loop below overwrites them.
    let first_spoke = spoke_of_origin(&tin.store, edges[0]);
    let last_spoke = spoke_of_dest(&tin.store, edges[k - 1]);
    let dead_spokes: Vec<EdgeId> = (1..k).map(|i| spoke_of_dest(&tin.store, edges[i - 1])).collect();

    let v = push_vertex(tin, x, y, z, index);
    let spokes_v: Vec<EdgeId> = verts.iter().map(|&p| tin.store_mut().allocate(p, v)).collect();

    for i in 0..k {
        let de = edges[i].dual();
        let si = spokes_v[i];
        let sj = spokes_v[i + 1].dual();
        tin.store_mut().set_forward(de, si);
        tin.store_mut().set_reverse(si, de);
        tin.store_mut().set_forward(si, sj);
        tin.store_mut().set_reverse(sj, si);
        tin.store_mut().set_forward(sj, de);
        tin.store_mut().set_reverse(de, sj);
    }

    let vg = tin.store_mut().allocate(v, VertexId::GHOST);

    // Ghost triangle (v, p0, ghost): v->p0 -> p0->ghost -> ghost->v -> v->p0.
    let s0_dual = spokes_v[0].dual();
    tin.store_mut().set_forward(s0_dual, first_spoke);
    tin.store_mut().set_reverse(first_spoke, s0_dual);
    tin.store_mut().set_forward(first_spoke, vg.dual());
    tin.store_mut().set_reverse(vg.dual(), first_spoke);
    tin.store_mut().set_forward(vg.dual(), s0_dual);
    tin.store_mut().set_reverse(s0_dual, vg.dual());

    // Ghost triangle (pk, v, ghost): pk->v -> v->ghost -> ghost->pk -> pk->v.
    let sk = spokes_v[k];
    tin.store_mut().set_forward(sk, vg);
    tin.store_mut().set_reverse(vg, sk);
    tin.store_mut().set_forward(vg, last_spoke);
    tin.store_mut().set_reverse(last_spoke, vg);
    tin.store_mut().set_forward(last_spoke, sk);
    tin.store_mut().set_reverse(sk, last_spoke);

    // Interior hull vertices no longer border the ghost fan; free their old
    // spokes. Deallocating highest-index-first means each swap-and-compact
    // only ever displaces a pair we've already finished wiring (one of our
    // own new spokes), never a not-yet-processed entry in this same list.
    let mut dead_spokes = dead_spokes;
    dead_spokes.sort_by_key(|e| std::cmp::Reverse(e.0));
    for dead_spoke in dead_spokes {
        tin.store_mut().deallocate(dead_spoke)?;
    }

    tin.search_hint = edges[0];
    let legalize_queue = edges.iter().map(|e| e.dual()).collect();
    legalize(tin, legalize_queue);
    Ok(v)
}

/// Lawson flip propagation: repeatedly test and flip edges whose opposite
/// vertices violate the in-circle criterion, seeded from `start` (Sec 4.7).
/// Edges bordering the ghost fan are never tested, since the in-circle
/// predicate has no meaning against the point at infinity; the hull itself
/// is only ever restructured by [`insert_outside_hull`].
pub(crate) fn legalize(tin: &mut Tin, start: Vec<EdgeId>) {
    let mut stack = start;
    let mut guard = 0usize;
    while let Some(e) = stack.pop() {
        guard += 1;
        if guard > 100_000 {
            log::warn!("legalize: flip stack exceeded safety guard, aborting propagation");
            break;
        }
        if !tin.store.is_allocated(e) {
            continue;
        }
        if tin.store.constraint(e).constrained {
            continue;
        }
        let d = e.dual();
        let a = tin.store.origin(e);
        let b = tin.store.dest(e);
        let c = tin.store.dest(tin.store.forward(e));
        let apex = tin.store.dest(tin.store.forward(d));
        if a == VertexId::GHOST || b == VertexId::GHOST || c == VertexId::GHOST || apex == VertexId::GHOST {
            continue;
        }

        let pa = tin.xy(a);
        let pb = tin.xy(b);
        let pc = tin.xy(c);
        let pd = tin.xy(apex);

        if in_circle(pa, pb, pc, pd) > tin.thresholds.in_circle_threshold {
            let e1 = tin.store.forward(e);
            let e2 = tin.store.forward(e1);
            let d1 = tin.store.forward(d);
            let d2 = tin.store.forward(d1);
            if tin.store_mut().flip(e).is_ok() {
                stack.push(e1);
                stack.push(e2);
                stack.push(d1);
                stack.push(d2);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn interior_insertion_keeps_triangle_count_consistent() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(0.0, 10.0, 0.0, 3).unwrap();
        assert!(tin.is_bootstrapped());
        tin.add(2.0, 2.0, 1.0, 4).unwrap();
        assert_eq!(tin.vertex_count(), 4);
    }

    #[test]
    fn duplicate_point_merges_instead_of_splitting() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(0.0, 10.0, 0.0, 3).unwrap();
        let v = tin.add(0.0, 0.0, 5.0, 4).unwrap();
        assert_eq!(v, VertexId(1));
        assert!(matches!(tin.vertex(v), VertexEntry::Group(_)));
    }

    #[test]
    fn hull_extension_grows_vertex_count() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(0.0, 10.0, 0.0, 3).unwrap();
        tin.add(20.0, 20.0, 0.0, 4).unwrap();
        assert_eq!(tin.vertex_count(), 4);
    }
}
