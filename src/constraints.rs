//! Constraint processor: vertex reconciliation, dense indexing, pinwheel
//! search / tunneling / cavity fill, optional conformity restoration, and
//! region flood-fill (Sec 4.8).
//!
//! The teacher repo has no constrained-triangulation pass to draw on, so this
//! module is grounded directly on the algorithms named in the spec
//! (pinwheel rotation via `dual . reverse`, Anglada-style corridor tunneling,
//! Devillers ear-clipping) expressed in this crate's half-edge idiom, reusing
//! [`crate::insert::triangulate_quad`] and [`crate::insert::legalize`] for
//! the parts that overlap with incremental insertion.

use std::collections::VecDeque;

use crate::edge::{EdgeId, LineIndex, RegionIndex, MAX_LINES, MAX_REGIONS};
use crate::error::{Error, Result};
use crate::predicates::{direction, orientation};
use crate::store::EdgeStore;
use crate::tin::{LineConstraint, RegionConstraint, Tin};
use crate::vertex::VertexId;

/// One vertex of a constraint, in the caller's original coordinate/index
/// space (Sec 3 "Constraint").
#[derive(Debug, Clone, Copy)]
pub struct ConstraintVertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Linear,
    Polygon { is_hole: bool },
}

/// One constraint as submitted to [`crate::tin::Tin::add_constraints`].
#[derive(Debug, Clone)]
pub struct ConstraintSpec {
    pub kind: ConstraintKind,
    pub vertices: Vec<ConstraintVertex>,
}

/// Entry point for Sec 4.8. Runs Phases 1-3 and 6 for every constraint in
/// order, then Phase 4 (conformity restoration) once across the whole batch,
/// and only then Phase 5 (region flood-fill) -- restoring conformity first
/// means the new diagonals it cuts into a region are still unlabeled
/// `ConstraintState::default()` when flood-fill runs, so it labels them too
/// instead of leaving them invisible to `constrained_regions_only` queries.
pub fn add_constraints(tin: &mut Tin, constraints: Vec<ConstraintSpec>, restore_conformity: bool) -> Result<()> {
    tin.check_mutable()?;
    if !tin.is_bootstrapped() {
        return Err(Error::NotBootstrapped);
    }
    if tin.constraints_added {
        return Err(Error::AlreadyConstrained);
    }

    let region_count = constraints
        .iter()
        .filter(|c| matches!(c.kind, ConstraintKind::Polygon { .. }))
        .count();
    let line_count = constraints.iter().filter(|c| c.kind == ConstraintKind::Linear).count();
    if region_count > MAX_REGIONS {
        return Err(Error::CapacityExceeded(format!(
            "{region_count} region constraints exceeds the {MAX_REGIONS} limit"
        )));
    }
    if line_count > MAX_LINES {
        return Err(Error::CapacityExceeded(format!(
            "{line_count} line constraints exceeds the {MAX_LINES} limit"
        )));
    }

    let mut next_region = 0u16;
    let mut next_line = 0u16;
    let mut pending_floods: Vec<(Vec<EdgeId>, RegionIndex)> = Vec::new();

    for spec in constraints {
        if let ConstraintKind::Polygon { .. } = spec.kind {
            if spec.vertices.len() < 3 {
                return Err(Error::InvalidInput(
                    "polygon constraint needs at least 3 vertices".into(),
                ));
            }
        }

        // Phase 1: vertex reconciliation. `Tin::add` merges coincident
        // points and returns the canonical id; collapse consecutive repeats.
        let mut remapped: Vec<VertexId> = Vec::with_capacity(spec.vertices.len());
        for v in &spec.vertices {
            let id = tin.add(v.x, v.y, v.z, v.index)?;
            if remapped.last() != Some(&id) {
                remapped.push(id);
            }
        }

        let closed = matches!(spec.kind, ConstraintKind::Polygon { .. });
        if closed && remapped.len() > 1 && remapped.first() == remapped.last() {
            remapped.pop();
        }
        if closed && remapped.len() < 3 {
            return Err(Error::InvalidInput(
                "polygon constraint degenerates to fewer than 3 distinct vertices after merging".into(),
            ));
        }

        // Phase 2: dense indexing.
        let line_index = if spec.kind == ConstraintKind::Linear {
            let idx = LineIndex(next_line);
            next_line += 1;
            Some(idx)
        } else {
            None
        };
        let region_index = if let ConstraintKind::Polygon { .. } = spec.kind {
            let idx = RegionIndex(next_region);
            next_region += 1;
            Some(idx)
        } else {
            None
        };

        // Phase 3: realize every segment.
        let n = remapped.len();
        let segment_count = if closed { n } else { n.saturating_sub(1) };
        let mut edges = Vec::with_capacity(segment_count);
        for i in 0..segment_count {
            let a = remapped[i];
            let b = remapped[(i + 1) % n];
            if a == b {
                continue;
            }
            edges.extend(realize_segment(tin, a, b, line_index)?);
        }

        // Phase 5 is deferred until after Phase 4 runs for the whole batch
        // (see module-level note on `add_constraints`); outer boundaries
        // only -- a hole's interior is simply never flooded, and its
        // now-constrained border stops the surrounding region's fill from
        // leaking in.
        if let ConstraintKind::Polygon { is_hole } = spec.kind {
            if !is_hole {
                if let Some(region) = region_index {
                    pending_floods.push((edges.clone(), region));
                }
            }
        }

        // Phase 6: linking.
        let first_edge = edges.first().copied();
        if let Some(line) = line_index {
            tin.lines.push(LineConstraint {
                index: line,
                vertices: remapped.clone(),
                closed,
                first_edge,
            });
        }
        if let ConstraintKind::Polygon { is_hole } = spec.kind {
            if let Some(region) = region_index {
                tin.regions.push(RegionConstraint {
                    index: region,
                    is_hole,
                    vertices: remapped,
                    first_edge,
                });
            }
        }
    }

    tin.constraints_added = true;

    // Phase 4: optional conformity restoration, before Phase 5 so any new
    // diagonals it cuts are still in scope for flood-fill below.
    if restore_conformity {
        run_conformity_restoration(tin, 10 * (tin.max_edge_allocation_index() as usize + 16))?;
    }

    // Phase 5: region flood-fill, now that the mesh inside each region is
    // in its final (possibly conformity-split) shape.
    for (edges, region) in pending_floods {
        flood_fill(tin, &edges, region);
    }

    Ok(())
}

enum NextStep {
    Direct(EdgeId),
    Collinear(VertexId, EdgeId),
    Straddle(EdgeId, EdgeId),
}

/// Find *some* edge with origin `v`; O(allocated edges), acceptable for
/// constraint processing, which runs once and not in the insertion hot path.
fn any_incident_edge(store: &EdgeStore, v: VertexId) -> Option<EdgeId> {
    let mut cursor = EdgeId(0);
    while store.is_allocated(cursor) {
        if store.origin(cursor) == v {
            return Some(cursor);
        }
        cursor = EdgeId(cursor.0 + 1);
    }
    None
}

/// Rotate the pinwheel at `current` looking for: an edge straight to
/// `target`; a collinear vertex strictly between `current` and `target`
/// (short-circuit); or the wedge that the ray `current -> target` enters,
/// whose far edge is the first one the segment crosses.
fn classify_segment(tin: &Tin, current: VertexId, target: VertexId) -> Result<NextStep> {
    let cxy = tin.xy(current);
    let txy = tin.xy(target);
    let len2 = {
        let dx = txy[0] - cxy[0];
        let dy = txy[1] - cxy[1];
        dx * dx + dy * dy
    };

    let e0 = any_incident_edge(tin.store(), current)
        .ok_or_else(|| Error::invariant_vertex("no incident edge for constraint vertex", current))?;
    let mut e = e0;
    let mut steps = 0usize;
    loop {
        steps += 1;
        if steps > crate::locate::MAX_WALK_STEPS {
            return Err(Error::invariant_vertex(
                "pinwheel search did not terminate while realizing a constraint segment",
                current,
            ));
        }

        let d = tin.store().dest(e);
        if d == target {
            return Ok(NextStep::Direct(e));
        }

        if d != VertexId::GHOST {
            let dxy = tin.xy(d);
            let o = orientation(cxy, txy, dxy);
            if o.abs() <= tin.thresholds().half_plane_threshold {
                let dot = direction(cxy, txy, dxy, tin.thresholds());
                if dot > 0.0 && dot < len2 {
                    return Ok(NextStep::Collinear(d, e));
                }
            }
        }

        let e_next = crate::iter::pinwheel_next(tin.store(), e);
        let d_next = tin.store().dest(e_next);
        if d != VertexId::GHOST && d_next != VertexId::GHOST {
            let o1 = orientation(cxy, txy, tin.xy(d));
            let o2 = orientation(cxy, txy, tin.xy(d_next));
            if o1 > 0.0 && o2 <= 0.0 {
                let straddle = tin.store().forward(e);
                return Ok(NextStep::Straddle(e, straddle));
            }
        }

        e = e_next;
        if e == e0 {
            return Err(Error::invariant_vertex(
                "pinwheel search exhausted without finding the constraint direction",
                current,
            ));
        }
    }
}

/// Realize one constraint segment (Sec 4.8 Phase 3), returning every edge
/// marked constrained along the way (more than one if collinear vertices
/// were folded in).
fn realize_segment(tin: &mut Tin, v0: VertexId, v1: VertexId, line: Option<LineIndex>) -> Result<Vec<EdgeId>> {
    let mut current = v0;
    let mut marked = Vec::new();
    loop {
        match classify_segment(tin, current, v1)? {
            NextStep::Direct(e) => {
                mark_constrained(tin, e, line);
                marked.push(e);
                return Ok(marked);
            }
            NextStep::Collinear(mid, e_to_mid) => {
                mark_constrained(tin, e_to_mid, line);
                marked.push(e_to_mid);
                current = mid;
            }
            NextStep::Straddle(e_i, straddle) => {
                let ce = tunnel_and_close(tin, current, v1, e_i, straddle, line)?;
                marked.push(ce);
                return Ok(marked);
            }
        }
    }
}

fn mark_constrained(tin: &mut Tin, e: EdgeId, line: Option<LineIndex>) {
    let state = tin.store_mut().constraint_mut(e);
    state.constrained = true;
    if let Some(l) = line {
        state.line = Some(l);
    }
    let idx = (e.0 & 1) as usize;
    state.side[idx].border = true;
    state.side[1 - idx].border = true;
}

/// Merge the two triangles adjacent to `e` into one quad face by splicing
/// around it, the inverse of [`crate::insert::triangulate_quad`]'s diagonal
/// split. Caller deallocates `e` afterward.
fn remove_diagonal(store: &mut EdgeStore, e: EdgeId) {
    let e1 = store.forward(e);
    let e2 = store.forward(e1);
    let d = e.dual();
    let d1 = store.forward(d);
    let d2 = store.forward(d1);

    store.set_forward(e2, d1);
    store.set_reverse(d1, e2);
    store.set_forward(d2, e1);
    store.set_reverse(e1, d2);
}

/// Carve the corridor a constraint segment crosses: repeatedly test the
/// far apex of the current straddled edge against the ray `v0 -> v1`,
/// absorb it into the growing cavity by removing that diagonal, and advance
/// until the apex is `v1` (Sec 4.8 "Tunneling"). Then splits the merged
/// cavity with the new constrained edge `(v0, v1)` and ear-clips both
/// resulting sub-polygons back into triangles (Sec 4.8 "Cavity closure").
/// Returns the new constrained edge.
fn tunnel_and_close(
    tin: &mut Tin,
    v0: VertexId,
    v1: VertexId,
    e_i: EdgeId,
    straddle: EdgeId,
    line: Option<LineIndex>,
) -> Result<EdgeId> {
    let v0xy = tin.xy(v0);
    let v1xy = tin.xy(v1);
    let mut cross = straddle;
    let mut steps = 0usize;

    loop {
        steps += 1;
        if steps > crate::locate::MAX_WALK_STEPS {
            return Err(Error::invariant_edge("tunneling did not terminate", cross));
        }

        let r = tin.store().dest(tin.store().forward(cross.dual()));
        if r == v1 {
            remove_diagonal(tin.store_mut(), cross);
            tin.store_mut().deallocate(cross)?;
            break;
        }

        let o = orientation(v0xy, v1xy, tin.xy(r));
        let mut next_cross = if o > 0.0 {
            // r joins the left chain: the new straddled edge runs r -> q.
            tin.store().forward(tin.store().forward(cross.dual()))
        } else {
            // r joins the right chain: the new straddled edge runs p -> r.
            tin.store().forward(cross.dual())
        };

        remove_diagonal(tin.store_mut(), cross);
        tin.store_mut().deallocate_tracked(cross, &mut next_cross)?;
        cross = next_cross;
    }

    // The whole corridor is now one merged polygon face, walkable from e_i
    // (still v0 -> d_i, untouched throughout) around to the edge arriving
    // back at v0. Split it in two along the new constrained edge (v0, v1).
    let boundary = collect_boundary(tin.store(), e_i)?;
    let e_in_v1 = *boundary
        .iter()
        .find(|&&e| tin.store().dest(e) == v1)
        .ok_or_else(|| Error::invariant_vertex("tunneled cavity is missing v1 on its boundary", v1))?;
    let e_in_v0 = *boundary
        .iter()
        .find(|&&e| tin.store().dest(e) == v0)
        .ok_or_else(|| Error::invariant_vertex("tunneled cavity is missing v0 on its boundary", v0))?;

    let after_v1 = tin.store().forward(e_in_v1);
    let ce = tin.store_mut().allocate(v0, v1);

    tin.store_mut().set_forward(e_in_v1, ce.dual());
    tin.store_mut().set_reverse(ce.dual(), e_in_v1);
    tin.store_mut().set_forward(ce.dual(), e_i);
    tin.store_mut().set_reverse(e_i, ce.dual());

    tin.store_mut().set_forward(ce, after_v1);
    tin.store_mut().set_reverse(after_v1, ce);
    tin.store_mut().set_forward(e_in_v0, ce);
    tin.store_mut().set_reverse(ce, e_in_v0);

    mark_constrained(tin, ce, line);

    let mut new_diagonals = triangulate_polygon_face(tin, e_i)?;
    new_diagonals.extend(triangulate_polygon_face(tin, ce)?);
    tin.search_hint = ce;
    crate::insert::legalize(tin, new_diagonals);

    Ok(ce)
}

fn collect_boundary(store: &EdgeStore, start: EdgeId) -> Result<Vec<EdgeId>> {
    let mut out = vec![start];
    let mut cur = store.forward(start);
    let mut steps = 0usize;
    while cur != start {
        steps += 1;
        if steps > crate::locate::MAX_WALK_STEPS {
            return Err(Error::invariant_edge("cavity boundary walk did not terminate", start));
        }
        out.push(cur);
        cur = store.forward(cur);
    }
    Ok(out)
}

/// Remove the ear at `e_cur`'s origin (the vertex where boundary edges
/// `e_prev -> e_cur` meet), replacing it with the diagonal `dest(e_cur) ->
/// origin(e_prev)`. Generalizes [`crate::insert::triangulate_quad`]'s single
/// split to an arbitrary polygon, one ear at a time.
fn clip_ear(store: &mut EdgeStore, e_prev: EdgeId, e_cur: EdgeId) -> EdgeId {
    let v_a = store.origin(e_prev);
    let v_c = store.dest(e_cur);
    let e_next = store.forward(e_cur);
    let e_before = store.reverse(e_prev);

    let diag = store.allocate(v_c, v_a);

    store.set_forward(e_prev, e_cur);
    store.set_reverse(e_cur, e_prev);
    store.set_forward(e_cur, diag);
    store.set_reverse(diag, e_cur);
    store.set_forward(diag, e_prev);
    store.set_reverse(e_prev, diag);

    store.set_forward(e_before, diag.dual());
    store.set_reverse(diag.dual(), e_before);
    store.set_forward(diag.dual(), e_next);
    store.set_reverse(e_next, diag.dual());

    diag
}

fn point_in_triangle(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    orientation(a, b, p) > 0.0 && orientation(b, c, p) > 0.0 && orientation(c, a, p) > 0.0
}

/// Devillers-style cavity fill (Sec 4.8): repeatedly clip the minimum-area
/// valid ear (no other cavity vertex strictly inside it) until the polygon
/// face starting at `start` is a triangle. Returns every new diagonal, for
/// the caller to hand to [`crate::insert::legalize`].
fn triangulate_polygon_face(tin: &mut Tin, start: EdgeId) -> Result<Vec<EdgeId>> {
    let mut new_diagonals = Vec::new();
    let mut cur = start;
    loop {
        let boundary = collect_boundary(tin.store(), cur)?;
        let n = boundary.len();
        if n <= 3 {
            return Ok(new_diagonals);
        }

        let verts: Vec<VertexId> = boundary.iter().map(|&e| tin.store().origin(e)).collect();
        let xy: Vec<[f64; 2]> = verts.iter().map(|&v| tin.xy(v)).collect();

        let mut best: Option<(usize, f64)> = None;
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            let area = orientation(xy[prev], xy[i], xy[next]);
            if area <= 0.0 {
                continue;
            }
            let mut valid = true;
            for (j, &q) in xy.iter().enumerate() {
                if j == prev || j == i || j == next {
                    continue;
                }
                if point_in_triangle(q, xy[prev], xy[i], xy[next]) {
                    valid = false;
                    break;
                }
            }
            if !valid {
                continue;
            }
            let better = match best {
                Some((_, best_area)) => area < best_area,
                None => true,
            };
            if better {
                best = Some((i, area));
            }
        }

        // A simple polygon always has at least one valid convex ear; fall
        // back to the smallest-area convex vertex if the validity scan
        // somehow rejected all of them (defensive; should not trigger).
        let ear_index = match best {
            Some((i, _)) => i,
            None => {
                log::warn!("triangulate_polygon_face: no strictly valid ear found, using first convex vertex");
                (0..n)
                    .find(|&i| {
                        let prev = (i + n - 1) % n;
                        let next = (i + 1) % n;
                        orientation(xy[prev], xy[i], xy[next]) > 0.0
                    })
                    .ok_or_else(|| Error::invariant("cavity polygon has no convex vertex to clip"))?
            }
        };

        let prev = (ear_index + n - 1) % n;
        let diag = clip_ear(tin.store_mut(), boundary[prev], boundary[ear_index]);
        new_diagonals.push(diag);
        cur = diag.dual();
    }
}

/// Sec 4.8 Phase 4: split every non-conforming constrained edge at its
/// midpoint, bounded by `max_iterations`.
fn run_conformity_restoration(tin: &mut Tin, max_iterations: usize) -> Result<()> {
    let mut iterations = 0usize;
    while let Some(e) = find_nonconforming_constrained_edge(tin) {
        iterations += 1;
        if iterations > max_iterations {
            log::warn!("run_conformity_restoration: exceeded max_iterations ({max_iterations}), stopping early");
            break;
        }
        split_constrained_edge(tin, e, iterations as u64)?;
    }
    Ok(())
}

fn find_nonconforming_constrained_edge(tin: &Tin) -> Option<EdgeId> {
    let mut cursor = EdgeId(0);
    let store = tin.store();
    while store.is_allocated(cursor) {
        let e = EdgeId(cursor.0 & !1);
        if store.constraint(e).constrained {
            let a = store.origin(e);
            let b = store.dest(e);
            let c = store.dest(store.forward(e));
            let d = store.dest(store.forward(e.dual()));
            if a != VertexId::GHOST && b != VertexId::GHOST && c != VertexId::GHOST && d != VertexId::GHOST {
                let violation = crate::predicates::in_circle(tin.xy(a), tin.xy(b), tin.xy(c), tin.xy(d));
                if violation > tin.thresholds().delaunay_threshold {
                    return Some(e);
                }
            }
        }
        cursor = EdgeId(cursor.0 + 2);
    }
    None
}

fn split_constrained_edge(tin: &mut Tin, e: EdgeId, synthetic_seq: u64) -> Result<()> {
    let a = tin.store().origin(e);
    let b = tin.store().dest(e);
    let [ax, ay] = tin.xy(a);
    let [bx, by] = tin.xy(b);
    let az = tin.vertex(a).z();
    let bz = tin.vertex(b).z();

    let e_next = tin.store().forward(e);
    let e_ca = tin.store().forward(e_next);
    let d = e.dual();
    let d_next = tin.store().forward(d);
    let d_prev = tin.store().forward(d_next);

    let index = u64::MAX - synthetic_seq;
    let v = crate::insert::push_synthetic_vertex(tin, (ax + bx) / 2.0, (ay + by) / 2.0, (az + bz) / 2.0, index);
    let p = tin.store_mut().split(e, v);

    let diag_left = crate::insert::triangulate_quad(tin.store_mut(), p, e, e_next, e_ca);
    let diag_right = crate::insert::triangulate_quad(tin.store_mut(), d, p.dual(), d_next, d_prev);

    tin.search_hint = e;
    crate::insert::legalize(tin, vec![e_next, e_ca, d_next, d_prev, diag_left, diag_right]);
    Ok(())
}

fn mark_face_interior_if_new(tin: &mut Tin, e: EdgeId, region: RegionIndex) -> bool {
    let idx = (e.0 & 1) as usize;
    if tin.store().constraint(e).side[idx].interior.is_some() {
        return false;
    }
    let e1 = tin.store().forward(e);
    let e2 = tin.store().forward(e1);
    for side_edge in [e, e1, e2] {
        let sidx = (side_edge.0 & 1) as usize;
        tin.store_mut().constraint_mut(side_edge).side[sidx].interior = Some(region);
    }
    true
}

/// Sec 4.8 Phase 5: BFS the region index outward from `border_edges` through
/// every non-border neighbor, stopping at constrained edges and the ghost
/// fan.
fn flood_fill(tin: &mut Tin, border_edges: &[EdgeId], region: RegionIndex) {
    let mut queue: VecDeque<EdgeId> = VecDeque::new();
    for &e in border_edges {
        if mark_face_interior_if_new(tin, e, region) {
            queue.push_back(e);
        }
    }

    while let Some(e) = queue.pop_front() {
        let e1 = tin.store().forward(e);
        let e2 = tin.store().forward(e1);
        for side_edge in [e, e1, e2] {
            if tin.store().constraint(side_edge).constrained {
                continue;
            }
            let neighbor = side_edge.dual();
            if tin.store().origin(neighbor) == VertexId::GHOST || tin.store().dest(neighbor) == VertexId::GHOST {
                continue;
            }
            let apex = tin.store().dest(tin.store().forward(neighbor));
            if apex == VertexId::GHOST {
                continue;
            }
            if mark_face_interior_if_new(tin, neighbor, region) {
                queue.push_back(neighbor);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tin::Tin;

    fn cv(x: f64, y: f64, index: u64) -> ConstraintVertex {
        ConstraintVertex { x, y, z: 0.0, index }
    }

    #[test]
    fn rejects_second_call() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(0.0, 10.0, 0.0, 3).unwrap();
        tin.add_constraints(vec![], false).unwrap();
        assert_eq!(tin.add_constraints(vec![], false), Err(Error::AlreadyConstrained));
    }

    #[test]
    fn linear_constraint_forces_non_delaunay_edge() {
        let mut tin = Tin::new(1.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(10.0, 0.0, 0.0, 2).unwrap();
        tin.add(5.0, 1.0, 0.0, 3).unwrap();
        tin.add(5.0, -1.0, 0.0, 4).unwrap();

        let spec = ConstraintSpec {
            kind: ConstraintKind::Linear,
            vertices: vec![cv(0.0, 0.0, 1), cv(10.0, 0.0, 2)],
        };
        tin.add_constraints(vec![spec], false).unwrap();

        let e = any_incident_edge(tin.store(), VertexId(1)).unwrap();
        let mut found = false;
        let mut cur = e;
        for _ in 0..6 {
            if tin.store().dest(cur) == VertexId(2) && tin.is_constrained(cur) {
                found = true;
                break;
            }
            cur = crate::iter::pinwheel_next(tin.store(), cur);
        }
        assert!(found, "expected (0,0)->(10,0) to be constrained");
    }

    #[test]
    fn polygon_with_hole_flood_fills_outer_only() {
        let mut tin = Tin::new(10.0).unwrap();
        tin.add(0.0, 0.0, 0.0, 1).unwrap();
        tin.add(1000.0, 0.0, 0.0, 2).unwrap();
        tin.add(1000.0, 1000.0, 0.0, 3).unwrap();
        tin.add(0.0, 1000.0, 0.0, 4).unwrap();
        tin.add(300.0, 300.0, 0.0, 5).unwrap();
        tin.add(700.0, 300.0, 0.0, 6).unwrap();
        tin.add(700.0, 700.0, 0.0, 7).unwrap();
        tin.add(300.0, 700.0, 0.0, 8).unwrap();

        let outer = ConstraintSpec {
            kind: ConstraintKind::Polygon { is_hole: false },
            vertices: vec![cv(0.0, 0.0, 1), cv(1000.0, 0.0, 2), cv(1000.0, 1000.0, 3), cv(0.0, 1000.0, 4)],
        };
        let hole = ConstraintSpec {
            kind: ConstraintKind::Polygon { is_hole: true },
            vertices: vec![cv(300.0, 300.0, 5), cv(300.0, 700.0, 8), cv(700.0, 700.0, 7), cv(700.0, 300.0, 6)],
        };
        tin.add_constraints(vec![outer, hole], false).unwrap();

        assert_eq!(tin.region_constraints().len(), 2);
        let outer_region = tin.region_constraints()[0].index;

        let mut any_outer_interior = false;
        for tri in tin.triangles() {
            if tri.is_ghost() {
                continue;
            }
            let cx = tri.vertices.iter().map(|v| tin.xy(*v)[0]).sum::<f64>() / 3.0;
            let cy = tri.vertices.iter().map(|v| tin.xy(*v)[1]).sum::<f64>() / 3.0;
            let inside_hole = (300.0..700.0).contains(&cx) && (300.0..700.0).contains(&cy);
            let idx = (tri.edge.0 & 1) as usize;
            let interior = tin.store().constraint(tri.edge).side[idx].interior;
            if !inside_hole && interior == Some(outer_region) {
                any_outer_interior = true;
            }
            if inside_hole {
                assert_ne!(interior, Some(outer_region));
            }
        }
        assert!(any_outer_interior);
    }
}
