//! Scenario and invariant tests drawn from the testable-properties catalog:
//! bootstrap, tie-breaking, duplicate merging, hull extension, linear
//! constraints forcing a non-Delaunay edge, and region flood-fill around a
//! hole.

use tin_kernel::constraints::{ConstraintKind, ConstraintSpec, ConstraintVertex};
use tin_kernel::{Error, Tin};

fn cv(x: f64, y: f64, index: u64) -> ConstraintVertex {
    ConstraintVertex { x, y, z: 0.0, index }
}

fn xy(tin: &Tin, v: tin_kernel::VertexId) -> [f64; 2] {
    tin.vertex(v).xy()
}

#[test]
fn three_non_collinear_points_bootstrap() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(1.0, 0.0, 0.0, 2).unwrap();
    tin.add(0.0, 1.0, 0.0, 3).unwrap();

    let counts = tin.count_triangles();
    assert_eq!(counts.valid, 1);
    assert_eq!(counts.ghost, 3);
    assert_eq!(tin.max_edge_allocation_index(), 6);

    let bounds = tin.bounds().unwrap();
    assert_eq!((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y), (0.0, 0.0, 1.0, 1.0));
}

#[test]
fn unit_square_splits_into_two_triangles() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(1.0, 0.0, 0.0, 2).unwrap();
    tin.add(1.0, 1.0, 0.0, 3).unwrap();
    tin.add(0.0, 1.0, 0.0, 4).unwrap();

    assert_eq!(tin.count_triangles().valid, 2);

    let mut saw_diagonal = false;
    for tri in tin.triangles() {
        if tri.is_ghost() {
            continue;
        }
        let pts: Vec<_> = tri.vertices.iter().map(|&v| xy(&tin, v)).collect();
        for (p, q) in [([0.0, 0.0], [1.0, 1.0]), ([1.0, 0.0], [0.0, 1.0])] {
            if pts.contains(&p) && pts.contains(&q) {
                saw_diagonal = true;
            }
        }
    }
    assert!(saw_diagonal, "expected one of the two tie-break diagonals to appear");
}

#[test]
fn duplicate_insertion_merges_into_one_vertex() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(0.0, 10.0, 0.0, 3).unwrap();

    let first = tin.add(5.0, 5.0, 1.0, 10).unwrap();
    let before = tin.vertex_count();
    let second = tin.add(5.0 + 1e-12, 5.0, 2.0, 99).unwrap();

    assert_eq!(tin.vertex_count(), before);
    assert_eq!(first, second);
}

#[test]
fn hull_extension_grows_triangle_and_perimeter_counts() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(1.0, 0.0, 0.0, 2).unwrap();
    tin.add(0.0, 1.0, 0.0, 3).unwrap();
    assert_eq!(tin.count_triangles().valid, 1);

    tin.add(2.0, 2.0, 0.0, 4).unwrap();
    assert_eq!(tin.count_triangles().valid, 2);
    assert_eq!(tin.perimeter().count(), 4);
}

#[test]
fn linear_constraint_forces_non_delaunay_edge() {
    let mut tin = Tin::new(1.0).unwrap();
    let v1 = tin.add(0.0, 0.0, 0.0, 1).unwrap();
    let v2 = tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(5.0, 1.0, 0.0, 3).unwrap();
    tin.add(5.0, -1.0, 0.0, 4).unwrap();

    let spec = ConstraintSpec {
        kind: ConstraintKind::Linear,
        vertices: vec![cv(0.0, 0.0, 1), cv(10.0, 0.0, 2)],
    };
    tin.add_constraints(vec![spec], false).unwrap();

    let (a, b) = (xy(&tin, v1), xy(&tin, v2));
    let found = tin.edges().any(|e| {
        tin.is_constrained(e)
            && ((xy(&tin, tin.edge_origin(e)) == a && xy(&tin, tin.edge_dest(e)) == b)
                || (xy(&tin, tin.edge_origin(e)) == b && xy(&tin, tin.edge_dest(e)) == a))
    });
    assert!(found, "expected the (0,0)-(10,0) segment to be constrained");
}

#[test]
fn polygon_with_hole_flood_fills_outer_region_only() {
    let mut tin = Tin::new(10.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(1000.0, 0.0, 0.0, 2).unwrap();
    tin.add(1000.0, 1000.0, 0.0, 3).unwrap();
    tin.add(0.0, 1000.0, 0.0, 4).unwrap();
    tin.add(300.0, 300.0, 0.0, 5).unwrap();
    tin.add(700.0, 300.0, 0.0, 6).unwrap();
    tin.add(700.0, 700.0, 0.0, 7).unwrap();
    tin.add(300.0, 700.0, 0.0, 8).unwrap();
    tin.add(100.0, 500.0, 0.0, 9).unwrap();
    tin.add(900.0, 500.0, 0.0, 10).unwrap();

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

    let mut any_marked_outside_hole = false;
    for e in tin.edges() {
        let origin = xy(&tin, tin.edge_origin(e));
        let dest = xy(&tin, tin.edge_dest(e));
        let inside_hole = (300.0..=700.0).contains(&origin[0])
            && (300.0..=700.0).contains(&origin[1])
            && (300.0..=700.0).contains(&dest[0])
            && (300.0..=700.0).contains(&dest[1]);
        let interior = tin.edge_constraint(e).side[(e.0 & 1) as usize].interior;
        if inside_hole {
            assert_ne!(interior, Some(outer_region));
            continue;
        }
        if interior == Some(outer_region) {
            any_marked_outside_hole = true;
        }
    }
    assert!(any_marked_outside_hole);
}

#[test]
fn round_trip_vertex_count_matches_distinct_points_added() {
    let mut tin = Tin::new(1.0).unwrap();
    let pts = [(0.0, 0.0), (5.0, 0.0), (10.0, 3.0), (3.0, 8.0), (7.0, 7.0)];
    for (i, &(x, y)) in pts.iter().enumerate() {
        tin.add(x, y, 0.0, i as u64 + 1).unwrap();
    }
    assert_eq!(tin.vertex_count(), pts.len());
}

#[test]
fn idempotent_reinsertion_preserves_triangle_count() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(10.0, 10.0, 0.0, 3).unwrap();
    tin.add(0.0, 10.0, 0.0, 4).unwrap();
    tin.add(5.0, 5.0, 0.0, 5).unwrap();

    let before = tin.count_triangles();
    tin.add(5.0, 5.0, 99.0, 5).unwrap();
    let after = tin.count_triangles();
    assert_eq!(before, after);
}

#[test]
fn edge_pointer_reciprocity_holds_for_every_allocated_edge() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(10.0, 10.0, 0.0, 3).unwrap();
    tin.add(0.0, 10.0, 0.0, 4).unwrap();
    tin.add(5.0, 5.0, 0.0, 5).unwrap();

    for e in tin.edges() {
        assert_eq!(e.dual().dual(), e);
        assert_eq!(e.dual().0 ^ 1, e.0);
    }
}

#[test]
fn perimeter_returns_to_start_in_exactly_hull_length_steps() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(10.0, 10.0, 0.0, 3).unwrap();
    tin.add(0.0, 10.0, 0.0, 4).unwrap();
    tin.add(5.0, 5.0, 0.0, 5).unwrap();

    let steps: Vec<_> = tin.perimeter().collect();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps.iter().collect::<std::collections::HashSet<_>>().len(), 4);
}

#[test]
fn constraint_set_matches_is_constrained_after_flood_fill() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(10.0, 10.0, 0.0, 3).unwrap();
    tin.add(0.0, 10.0, 0.0, 4).unwrap();

    let outer = ConstraintSpec {
        kind: ConstraintKind::Polygon { is_hole: false },
        vertices: vec![cv(0.0, 0.0, 1), cv(10.0, 0.0, 2), cv(10.0, 10.0, 3), cv(0.0, 10.0, 4)],
    };
    tin.add_constraints(vec![outer], false).unwrap();

    let constrained: Vec<_> = tin.edges().filter(|&e| tin.is_constrained(e)).collect();
    assert_eq!(constrained.len(), 8, "4 boundary segments, both directions each");
}

#[test]
fn second_add_constraints_call_is_rejected() {
    let mut tin = Tin::new(1.0).unwrap();
    tin.add(0.0, 0.0, 0.0, 1).unwrap();
    tin.add(10.0, 0.0, 0.0, 2).unwrap();
    tin.add(0.0, 10.0, 0.0, 3).unwrap();
    tin.add_constraints(vec![], false).unwrap();
    assert_eq!(tin.add_constraints(vec![], false), Err(Error::AlreadyConstrained));
}
