//! Vertex model: point + Z + caller index + flags, merger groups, and the
//! ghost (point-at-infinity) sentinel (Sec 3, Sec 9 "Ghost vertex as a
//! discriminated sum").
//!
//! Grounded on the teacher's index-wrapper pattern (`VertIdx`/`VertexId` in
//! `algorithms/triangulation/delaunay.rs` and `data/planar_graph.rs`), but the
//! slot contents are a discriminated union instead of a raw `Point`, so ghost
//! and merged vertices are matched explicitly rather than compared against a
//! sentinel value.

use std::fmt;

/// A stable handle to a vertex slot in a [`crate::tin::Tin`]. Slot 0 is always
/// the ghost vertex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == VertexId::GHOST {
            write!(f, "ghost")
        } else {
            write!(f, "v{}", self.0)
        }
    }
}

impl VertexId {
    pub const GHOST: VertexId = VertexId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Status bitfield carried by every real vertex (Sec 3).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct VertexFlags: u8 {
        const SYNTHETIC        = 0b001;
        const CONSTRAINT_MEMBER = 0b010;
        const MERGED            = 0b100;
    }
}

/// A single real input point: coordinates, elevation, caller index, and flags.
/// Immutable once inserted (Sec 3).
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub index: u64,
    pub flags: VertexFlags,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64, index: u64) -> Vertex {
        Vertex {
            x,
            y,
            z,
            index,
            flags: VertexFlags::empty(),
        }
    }

    pub fn synthetic(x: f64, y: f64, z: f64, index: u64) -> Vertex {
        Vertex {
            x,
            y,
            z,
            index,
            flags: VertexFlags::SYNTHETIC | VertexFlags::CONSTRAINT_MEMBER,
        }
    }

    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// A vertex representing two or more input vertices whose pairwise distance
/// is below [`crate::thresholds::Thresholds::vertex_tolerance`] (Sec 3, 4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct MergerGroup {
    pub x: f64,
    pub y: f64,
    pub members: Vec<Vertex>,
}

impl MergerGroup {
    /// The z reported for a merger group is the z of the first member inserted,
    /// matching "the caller retains the canonical instance" (Sec 3).
    pub fn z(&self) -> f64 {
        self.members[0].z
    }

    pub fn contains_index(&self, index: u64) -> bool {
        self.members.iter().any(|m| m.index == index)
    }
}

/// The contents of a vertex slot: a single real vertex, a coincident-point
/// merger group, or the ghost sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexEntry {
    Ghost,
    Single(Vertex),
    Group(MergerGroup),
}

impl VertexEntry {
    pub fn is_ghost(&self) -> bool {
        matches!(self, VertexEntry::Ghost)
    }

    /// Representative (x, y) for this slot; panics on the ghost, which has no
    /// coordinates -- callers must check `is_ghost()` first.
    pub fn xy(&self) -> [f64; 2] {
        match self {
            VertexEntry::Ghost => unreachable!("ghost vertex has no coordinates"),
            VertexEntry::Single(v) => v.xy(),
            VertexEntry::Group(g) => [g.x, g.y],
        }
    }

    pub fn z(&self) -> f64 {
        match self {
            VertexEntry::Ghost => f64::NAN,
            VertexEntry::Single(v) => v.z,
            VertexEntry::Group(g) => g.z(),
        }
    }

    pub fn flags(&self) -> VertexFlags {
        match self {
            VertexEntry::Ghost => VertexFlags::empty(),
            VertexEntry::Single(v) => v.flags,
            VertexEntry::Group(_) => VertexFlags::MERGED,
        }
    }

    /// True if `index` names one of the vertices folded into this slot.
    pub fn contains_index(&self, index: u64) -> bool {
        match self {
            VertexEntry::Ghost => false,
            VertexEntry::Single(v) => v.index == index,
            VertexEntry::Group(g) => g.contains_index(index),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ghost_is_slot_zero() {
        assert_eq!(VertexId::GHOST, VertexId(0));
        assert!(format!("{:?}", VertexId::GHOST).contains("ghost"));
    }

    #[test]
    fn merger_group_tracks_members() {
        let group = MergerGroup {
            x: 1.0,
            y: 2.0,
            members: vec![Vertex::new(1.0, 2.0, 3.0, 1), Vertex::new(1.0, 2.0, 9.0, 99)],
        };
        assert!(group.contains_index(99));
        assert!(!group.contains_index(7));
        assert_eq!(group.z(), 3.0);
    }
}
