//! Triangle, perimeter, and pinwheel traversal over the edge set (Sec 4.9).
//!
//! Grounded on the teacher's `TriangularNetwork::iter_triangles`, which walks
//! the edge arena and reports each face once by checking a canonical edge;
//! this version generalizes the canonical check to "lowest-indexed side of
//! the cycle" and adds the hull-chasing perimeter walk and the pinwheel
//! rotation the constraint processor needs (Sec 9 glossary: "Pinwheel").

use crate::edge::EdgeId;
use crate::store::EdgeStore;
use crate::vertex::VertexId;

/// One triangle (ghost or real) read off a face's three-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub edge: EdgeId,
    pub vertices: [VertexId; 3],
}

impl Triangle {
    pub fn is_ghost(&self) -> bool {
        self.vertices.iter().any(|&v| v == VertexId::GHOST)
    }
}

/// Lazy, non-restartable iterator over every face in the mesh, each reported
/// exactly once via its lowest-indexed side (Sec 4.9). Includes ghost
/// triangles; filter with [`Triangle::is_ghost`] to see only real faces.
pub struct Triangles<'a> {
    store: &'a EdgeStore,
    cursor: u32,
}

impl<'a> Triangles<'a> {
    pub(crate) fn new(store: &'a EdgeStore) -> Triangles<'a> {
        Triangles { store, cursor: 0 }
    }
}

impl<'a> Iterator for Triangles<'a> {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        while self.store.is_allocated(EdgeId(self.cursor)) {
            let e = EdgeId(self.cursor);
            self.cursor += 1;
            let e1 = self.store.forward(e);
            let e2 = self.store.forward(e1);
            if e.0 > e1.0 || e.0 > e2.0 {
                // Not the canonical side of this cycle; it was (or will be)
                // reported via e1 or e2 instead.
                continue;
            }
            return Some(Triangle {
                edge: e,
                vertices: [self.store.origin(e), self.store.origin(e1), self.store.origin(e2)],
            });
        }
        None
    }
}

/// Counts produced by [`crate::tin::Tin::count_triangles`] (Sec 6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleCounts {
    pub valid: usize,
    pub ghost: usize,
    pub constrained: usize,
}

pub(crate) fn count_triangles(store: &EdgeStore) -> TriangleCounts {
    let mut counts = TriangleCounts::default();
    for tri in Triangles::new(store) {
        if tri.is_ghost() {
            counts.ghost += 1;
        } else {
            counts.valid += 1;
            let sides = [tri.edge, store.forward(tri.edge), store.forward(store.forward(tri.edge))];
            if sides.iter().any(|&s| store.constraint(s).constrained) {
                counts.constrained += 1;
            }
        }
    }
    counts
}

/// True if `e`'s undirected pair is a hull edge: both endpoints real and the
/// triangle across its dual is a ghost triangle (Sec 3, invariant 4).
pub(crate) fn is_hull_edge(store: &EdgeStore, e: EdgeId) -> bool {
    if store.origin(e) == VertexId::GHOST || store.dest(e) == VertexId::GHOST {
        return false;
    }
    let d = e.dual();
    let apex = store.dest(store.forward(d));
    apex == VertexId::GHOST
}

/// Lazy, non-restartable iterator over the hull boundary, chaining
/// `forward . forward . dual . reverse` from a starting ghost edge until it
/// returns to the origin (Sec 4.9).
pub struct Perimeter<'a> {
    store: &'a EdgeStore,
    start: Option<EdgeId>,
    cur: EdgeId,
    done: bool,
}

impl<'a> Perimeter<'a> {
    pub(crate) fn new(store: &'a EdgeStore, search_hint: EdgeId) -> Perimeter<'a> {
        let start = find_hull_edge(store, search_hint);
        Perimeter {
            store,
            start,
            cur: start.unwrap_or(EdgeId::INVALID),
            done: start.is_none(),
        }
    }
}

impl<'a> Iterator for Perimeter<'a> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        if self.done {
            return None;
        }
        let emit = self.cur;
        let next = self.store.reverse(self.store.forward(self.cur).dual());
        if next == self.start.unwrap() {
            self.done = true;
        } else {
            self.cur = next;
        }
        Some(emit)
    }
}

/// Search outward from `hint` (spiraling through the edge pool if the hint
/// isn't hull-adjacent) for some hull edge to seed perimeter iteration.
fn find_hull_edge(store: &EdgeStore, hint: EdgeId) -> Option<EdgeId> {
    if hint.is_valid() && store.is_allocated(hint) {
        for cand in [hint, store.forward(hint), store.forward(store.forward(hint))] {
            if is_hull_edge(store, cand) {
                return Some(cand);
            }
        }
    }
    let mut cursor = EdgeId(0);
    while store.is_allocated(cursor) {
        if is_hull_edge(store, cursor) {
            return Some(cursor);
        }
        cursor = EdgeId(cursor.0 + 1);
    }
    None
}

/// Rotate one step around `e`'s origin vertex, toward the next edge incident
/// to it (Sec 9 glossary: "Pinwheel").
pub(crate) fn pinwheel_next(store: &EdgeStore, e: EdgeId) -> EdgeId {
    store.reverse(e).dual()
}

/// Lazy, non-restartable iterator over every allocated directed edge, both
/// sides of each pair (Sec 6 `edges()`).
pub struct Edges<'a> {
    store: &'a EdgeStore,
    cursor: u32,
}

impl<'a> Edges<'a> {
    pub(crate) fn new(store: &'a EdgeStore) -> Edges<'a> {
        Edges { store, cursor: 0 }
    }
}

impl<'a> Iterator for Edges<'a> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        if !self.store.is_allocated(EdgeId(self.cursor)) {
            return None;
        }
        let e = EdgeId(self.cursor);
        self.cursor += 1;
        Some(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tin::Tin;

    #[test]
    fn triangle_iterator_reports_each_face_once() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(4.0, 0.0, 0.0, 2).unwrap();
        tin.add(4.0, 4.0, 0.0, 3).unwrap();
        tin.add(0.0, 4.0, 0.0, 4).unwrap();

        let real: Vec<_> = Triangles::new(tin.store()).filter(|t| !t.is_ghost()).collect();
        assert_eq!(real.len(), 2);
        // Each real face's three vertices are pairwise distinct, well-formed.
        for tri in &real {
            assert_ne!(tri.vertices[0], tri.vertices[1]);
            assert_ne!(tri.vertices[1], tri.vertices[2]);
        }
    }

    #[test]
    fn perimeter_of_triangle_has_three_edges() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(4.0, 0.0, 0.0, 2).unwrap();
        tin.add(0.0, 4.0, 0.0, 3).unwrap();

        let perimeter: Vec<_> = Perimeter::new(tin.store(), tin.search_hint).collect();
        assert_eq!(perimeter.len(), 3);
    }

    #[test]
    fn perimeter_of_square_has_four_edges() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(4.0, 0.0, 0.0, 2).unwrap();
        tin.add(4.0, 4.0, 0.0, 3).unwrap();
        tin.add(0.0, 4.0, 0.0, 4).unwrap();

        let perimeter: Vec<_> = Perimeter::new(tin.store(), tin.search_hint).collect();
        assert_eq!(perimeter.len(), 4);
    }
}
