//! Paged pool of directed edge pairs with stable, compact indices (Sec 4.3).
//!
//! Grounded on `data/planar_graph.rs::PlanarGraph`: a flat, index-addressed
//! arena of half-edge records where `twin = index ^ 1`, generalized to pages
//! (fixed 1024-pair buckets, Sec 3 "Edge Page") and to a constraint-state side
//! table (Sec 9) alongside the topology.
//!
//! Deallocation keeps indices compact by swapping the highest-indexed pair
//! into the vacated slot and retargeting the two edges that pointed at it
//! (Sec 4.3): since allocation always grows at the current high-water mark,
//! this means the arena never develops holes and a separate freelist is
//! unnecessary -- the "smallest free even slot" ordering guarantee (Sec 5)
//! falls out for free.

use crate::edge::{ConstraintState, EdgeId, EdgeRec};
use crate::error::{Error, Result};
use crate::vertex::VertexId;

/// Number of edge *pairs* (not sides) held per page (Sec 3).
pub const PAGE_PAIRS: usize = 1024;

struct Page {
    recs: Vec<EdgeRec>,
}

const NIL_REC: EdgeRec = EdgeRec {
    origin: VertexId::GHOST,
    forward: EdgeId::INVALID,
    reverse: EdgeId::INVALID,
};

impl Page {
    fn new() -> Page {
        Page {
            recs: vec![NIL_REC; PAGE_PAIRS * 2],
        }
    }
}

/// The paged edge arena owned by a single [`crate::tin::Tin`].
pub struct EdgeStore {
    pages: Vec<Page>,
    constraints: Vec<ConstraintState>,
    next_free: u32,
}

impl EdgeStore {
    pub fn new() -> EdgeStore {
        EdgeStore {
            pages: Vec::new(),
            constraints: Vec::new(),
            next_free: 0,
        }
    }

    /// Size the pool for roughly `3.2 * n` edges, the empirically typical
    /// edge-per-vertex ratio of a Delaunay triangulation (Sec 4.3).
    pub fn preallocate(&mut self, n: usize) {
        let edges = (n as f64 * 3.2).ceil() as usize;
        let pairs_needed = edges.div_ceil(2);
        let pages_needed = pairs_needed.div_ceil(PAGE_PAIRS);
        while self.pages.len() < pages_needed {
            self.pages.push(Page::new());
        }
    }

    fn ensure_page_for(&mut self, pair_index: usize) {
        let page = pair_index / PAGE_PAIRS;
        while self.pages.len() <= page {
            self.pages.push(Page::new());
        }
        while self.constraints.len() <= pair_index {
            self.constraints.push(ConstraintState::default());
        }
    }

    fn rec(&self, id: EdgeId) -> &EdgeRec {
        let page = id.pair_index() / PAGE_PAIRS;
        let offset = (id.pair_index() % PAGE_PAIRS) * 2 + (id.0 as usize & 1);
        &self.pages[page].recs[offset]
    }

    fn rec_mut(&mut self, id: EdgeId) -> &mut EdgeRec {
        let page = id.pair_index() / PAGE_PAIRS;
        let offset = (id.pair_index() % PAGE_PAIRS) * 2 + (id.0 as usize & 1);
        &mut self.pages[page].recs[offset]
    }

    pub fn is_allocated(&self, id: EdgeId) -> bool {
        (id.0 as u32) < self.next_free
    }

    pub fn max_allocation_index(&self) -> u32 {
        self.next_free
    }

    pub fn origin(&self, id: EdgeId) -> VertexId {
        self.rec(id).origin
    }

    pub fn forward(&self, id: EdgeId) -> EdgeId {
        self.rec(id).forward
    }

    pub fn reverse(&self, id: EdgeId) -> EdgeId {
        self.rec(id).reverse
    }

    pub fn dest(&self, id: EdgeId) -> VertexId {
        self.origin(id.dual())
    }

    pub fn set_forward(&mut self, id: EdgeId, to: EdgeId) {
        self.rec_mut(id).forward = to;
    }

    pub fn set_reverse(&mut self, id: EdgeId, to: EdgeId) {
        self.rec_mut(id).reverse = to;
    }

    pub fn set_origin(&mut self, id: EdgeId, v: VertexId) {
        self.rec_mut(id).origin = v;
    }

    pub fn constraint(&self, id: EdgeId) -> &ConstraintState {
        &self.constraints[id.pair_index()]
    }

    pub fn constraint_mut(&mut self, id: EdgeId) -> &mut ConstraintState {
        self.ensure_page_for(id.pair_index());
        &mut self.constraints[id.pair_index()]
    }

    /// Allocate a fresh edge pair with `origin(e) = a`, `origin(dual(e)) = b`.
    /// The caller is responsible for wiring `forward`/`reverse`.
    pub fn allocate(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let base = self.next_free;
        self.next_free += 2;
        self.ensure_page_for((base / 2) as usize);
        let e = EdgeId(base);
        let d = e.dual();
        self.rec_mut(e).origin = a;
        self.rec_mut(d).origin = b;
        self.constraints[e.pair_index()] = ConstraintState::default();
        e
    }

    /// Retarget every reference to `from` (both sides) into `to`, by walking
    /// the four neighbor edges that point at it via forward/reverse.
    fn retarget(&mut self, from: EdgeId, to: EdgeId) {
        for side in [from, from.dual()] {
            let to_side = if side == from { to } else { to.dual() };
            let fwd = self.forward(side);
            let rev = self.reverse(side);
            if fwd.is_valid() && fwd != side {
                self.set_reverse(fwd, to_side);
            }
            if rev.is_valid() && rev != side {
                self.set_forward(rev, to_side);
            }
        }
    }

    /// Return both sides of `e`'s pair to the pool, maintaining a compact,
    /// hole-free index space (Sec 4.3).
    pub fn deallocate(&mut self, e: EdgeId) -> Result<()> {
        let base = EdgeId(e.0 & !1);
        if !self.is_allocated(base) {
            return Err(Error::invariant_edge("deallocate: edge not allocated", e));
        }
        let last_base = EdgeId(self.next_free - 2);
        if base != last_base {
            let moved = *self.rec(last_base);
            let moved_dual = *self.rec(last_base.dual());
            *self.rec_mut(base) = moved;
            *self.rec_mut(base.dual()) = moved_dual;
            let moved_constraint = self.constraints[last_base.pair_index()].clone();
            self.constraints[base.pair_index()] = moved_constraint;
            self.retarget(last_base, base);
        }
        self.next_free -= 2;
        Ok(())
    }

    /// Like [`EdgeStore::deallocate`], but remaps `*watch` if the swap-compact
    /// displaces the pair it names, so a caller holding on to another edge
    /// handle across a deallocation doesn't read it back stale (Sec 4.8
    /// tunneling, which frees many edges while tracking the next one to
    /// visit).
    pub fn deallocate_tracked(&mut self, e: EdgeId, watch: &mut EdgeId) -> Result<()> {
        let base = EdgeId(e.0 & !1);
        let last_base = EdgeId(self.next_free - 2);
        self.deallocate(e)?;
        if last_base != base && EdgeId(watch.0 & !1) == last_base {
            let side = watch.0 & 1;
            *watch = EdgeId(base.0 | side);
        }
        Ok(())
    }

    /// Split edge `e = (a, b)` at vertex `m`, returning the newly allocated
    /// edge `p = (a, m)` and leaving `e` as `(m, b)`. Preserves constraint
    /// state on both halves (Sec 4.3).
    pub fn split(&mut self, e: EdgeId, m: VertexId) -> EdgeId {
        let a = self.origin(e);
        let rev = self.reverse(e);
        let dual_fwd = self.forward(e.dual());

        let p = self.allocate(a, m);
        *self.constraint_mut(p) = self.constraint(e).clone();

        self.set_origin(e, m);

        // p: a -> m, reuse e's old predecessor on the left face.
        self.set_reverse(p, rev);
        self.set_forward(rev, p);
        self.set_forward(p, e);
        self.set_reverse(e, p);

        // dual(p): m -> a, spliced after dual(e) on the right face.
        self.set_forward(p.dual(), dual_fwd);
        self.set_reverse(dual_fwd, p.dual());
        self.set_reverse(p.dual(), e.dual());
        self.set_forward(e.dual(), p.dual());

        p
    }

    /// For the convex quadrilateral (a,b,c,d) with diagonal `e = (a,b)`,
    /// replace it in place with the diagonal `(c,d)`, preserving the two
    /// triangle cycles (Sec 4.3). `e` must not be constrained or
    /// ghost-incident; checked by the caller.
    pub fn flip(&mut self, e: EdgeId) -> Result<()> {
        let d = e.dual();
        let e_next = self.forward(e);
        let e_prev = self.reverse(e);
        let d_next = self.forward(d);
        let d_prev = self.reverse(d);

        let c = self.dest(e_next);
        let a2 = self.dest(d_next);

        self.set_origin(e, a2);
        self.set_origin(d, c);

        self.set_forward(e, e_prev);
        self.set_reverse(e, d_next);
        self.set_forward(d_next, e);
        self.set_reverse(e_prev, e);

        self.set_forward(d, d_prev);
        self.set_reverse(d, e_next);
        self.set_forward(e_next, d);
        self.set_reverse(d_prev, d);

        self.set_forward(e_prev, e_next);
        self.set_reverse(e_next, e_prev);
        self.set_forward(d_prev, d_next);
        self.set_reverse(d_next, d_prev);

        debug_assert_eq!(self.forward(self.reverse(e)), e);
        debug_assert_eq!(self.reverse(self.forward(e)), e);
        Ok(())
    }
}

impl Default for EdgeStore {
    fn default() -> EdgeStore {
        EdgeStore::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn wire_triangle(store: &mut EdgeStore, a: VertexId, b: VertexId, c: VertexId) -> [EdgeId; 3] {
        let e0 = store.allocate(a, b);
        let e1 = store.allocate(b, c);
        let e2 = store.allocate(c, a);
        store.set_forward(e0, e1);
        store.set_forward(e1, e2);
        store.set_forward(e2, e0);
        store.set_reverse(e0, e2);
        store.set_reverse(e1, e0);
        store.set_reverse(e2, e1);
        [e0, e1, e2]
    }

    #[test]
    fn allocate_assigns_monotonic_pairs() {
        let mut store = EdgeStore::new();
        let e0 = store.allocate(VertexId(1), VertexId(2));
        let e1 = store.allocate(VertexId(2), VertexId(3));
        assert_eq!(e0, EdgeId(0));
        assert_eq!(e1, EdgeId(2));
        assert_eq!(e0.dual(), EdgeId(1));
    }

    #[test]
    fn deallocate_keeps_indices_compact() {
        let mut store = EdgeStore::new();
        let [e0, e1, e2] = wire_triangle(&mut store, VertexId(1), VertexId(2), VertexId(3));
        let before = store.max_allocation_index();
        store.deallocate(e1).unwrap();
        assert_eq!(store.max_allocation_index(), before - 2);
        // e0 and e2's forward/reverse links were retargeted, not left dangling.
        assert_ne!(store.forward(e0), e1);
        assert_ne!(store.reverse(e2), e1);
    }

    #[test]
    fn split_preserves_triangle_cycle_prefix() {
        let mut store = EdgeStore::new();
        let [e0, _e1, _e2] = wire_triangle(&mut store, VertexId(1), VertexId(2), VertexId(3));
        let m = VertexId(9);
        let p = store.split(e0, m);
        assert_eq!(store.origin(p), VertexId(1));
        assert_eq!(store.origin(e0), m);
        assert_eq!(store.forward(p), e0);
        assert_eq!(store.reverse(e0), p);
    }
}
