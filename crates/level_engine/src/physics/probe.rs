//! Four-point collision probe
//!
//! Every tick each body samples the index at four points around its candidate
//! center: one probe radius below and above, and a sixth of the radius to
//! either side. The lateral offsets are short so they catch wall edges
//! without reaching across the whole sphere. All four probes run every tick.

use bitflags::bitflags;

use crate::events::ProbeDirection;
use crate::foundation::math::{AABB, Vec3};
use crate::spatial::{CellId, CellTag, Direction, NodeId, PointClass, SpatialIndex};

/// Radius used for collision regardless of a body's visual size
pub const PROBE_RADIUS: f32 = 1.0;

/// Horizontal offset of the lateral probes
pub const LATERAL_OFFSET: f32 = PROBE_RADIUS / 6.0;

bitflags! {
    /// Probes that found a cell on the last tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProbeFlags: u8 {
        /// Something overhead
        const UP = 1 << 0;
        /// Something underfoot
        const DOWN = 1 << 1;
        /// Something to the left
        const LEFT = 1 << 2;
        /// Something to the right
        const RIGHT = 1 << 3;
    }
}

/// A cell found by a probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHit {
    /// Leaf holding the cell
    pub node: NodeId,
    /// The cell holding the probe point
    pub cell: CellId,
    /// Its tag
    pub tag: CellTag,
    /// Its bounds
    pub bounds: AABB,
}

/// What a single probe point resolved to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeHit {
    /// Open space, inside or outside the level
    Open,
    /// A cell
    Cell(CellHit),
}

impl ProbeHit {
    /// Tag of the hit cell, `None` for open space
    pub fn tag(&self) -> Option<CellTag> {
        match self {
            Self::Open => None,
            Self::Cell(hit) => Some(hit.tag),
        }
    }

    /// The hit cell, if any
    pub fn cell(&self) -> Option<&CellHit> {
        match self {
            Self::Open => None,
            Self::Cell(hit) => Some(hit),
        }
    }

    /// True when the probe found a cell with `tag`
    pub fn is(&self, tag: CellTag) -> bool {
        self.tag() == Some(tag)
    }

    /// True for cells a body cannot pass through: everything but open space
    /// and ladders
    pub fn is_solid(&self) -> bool {
        matches!(self.tag(), Some(tag) if tag != CellTag::Ladder)
    }
}

/// Results of the four probes around one center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReport {
    /// Probe center
    pub center: Vec3,
    /// Below
    pub down: ProbeHit,
    /// Above
    pub up: ProbeHit,
    /// Left side
    pub left: ProbeHit,
    /// Right side
    pub right: ProbeHit,
}

impl ProbeReport {
    /// The lateral probe on `side`
    pub fn side(&self, side: Direction) -> ProbeHit {
        match side {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Probes that found a cell
    pub fn flags(&self) -> ProbeFlags {
        let mut flags = ProbeFlags::empty();
        flags.set(ProbeFlags::UP, self.up != ProbeHit::Open);
        flags.set(ProbeFlags::DOWN, self.down != ProbeHit::Open);
        flags.set(ProbeFlags::LEFT, self.left != ProbeHit::Open);
        flags.set(ProbeFlags::RIGHT, self.right != ProbeHit::Open);
        flags
    }
}

/// Classify a single point.
///
/// Only a cell whose own bounds hold the point counts as a hit. The rest of a
/// sparse leaf, an empty leaf left behind by a runtime removal, a pruned
/// octant and anything outside the level all read as open space.
pub fn classify(index: &SpatialIndex, point: Vec3) -> ProbeHit {
    match index.classify_point(point) {
        PointClass::Occupied(leaf, cell) => ProbeHit::Cell(CellHit {
            node: leaf.id(),
            cell: cell.id,
            tag: cell.tag,
            bounds: cell.bounds(),
        }),
        PointClass::Open | PointClass::Outside => ProbeHit::Open,
    }
}

/// Point sampled by the probe in `direction` around `center`
pub fn probe_point(center: Vec3, direction: ProbeDirection) -> Vec3 {
    let offset = match direction {
        ProbeDirection::Down => Vec3::new(0.0, -PROBE_RADIUS, 0.0),
        ProbeDirection::Up => Vec3::new(0.0, PROBE_RADIUS, 0.0),
        ProbeDirection::Left => Vec3::new(-LATERAL_OFFSET, 0.0, 0.0),
        ProbeDirection::Right => Vec3::new(LATERAL_OFFSET, 0.0, 0.0),
    };
    center + offset
}

/// Run all four probes around `center`
pub fn probe(index: &SpatialIndex, center: Vec3) -> ProbeReport {
    ProbeReport {
        center,
        down: classify(index, probe_point(center, ProbeDirection::Down)),
        up: classify(index, probe_point(center, ProbeDirection::Up)),
        left: classify(index, probe_point(center, ProbeDirection::Left)),
        right: classify(index, probe_point(center, ProbeDirection::Right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::NewCell;

    fn corridor() -> SpatialIndex {
        let mut index = SpatialIndex::new(Vec3::repeat(-0.5), 4.0);
        for x in 0..4 {
            index.insert(Vec3::new(x as f32, 0.0, 0.0), NewCell::tagged(CellTag::None)).unwrap();
        }
        index.insert(Vec3::new(2.0, 1.0, 0.0), NewCell::tagged(CellTag::Ladder)).unwrap();
        index.insert(Vec3::new(2.0, 2.0, 0.0), NewCell::tagged(CellTag::None)).unwrap();
        index
    }

    #[test]
    fn test_four_probes() {
        let index = corridor();
        let report = probe(&index, Vec3::new(1.6, 1.0, 0.0));

        assert!(report.down.is_solid());
        assert!(report.up.is(CellTag::None));
        assert_eq!(report.left, ProbeHit::Open);
        assert!(report.right.is(CellTag::Ladder));
        assert!(!report.right.is_solid());
        assert_eq!(
            report.flags(),
            ProbeFlags::DOWN | ProbeFlags::UP | ProbeFlags::RIGHT
        );
    }

    #[test]
    fn test_outside_reads_as_open() {
        let index = corridor();
        let report = probe(&index, Vec3::new(10.0, 10.0, 0.0));
        assert!(report.flags().is_empty());
    }

    #[test]
    fn test_vacated_leaf_reads_as_open() {
        let mut index = corridor();
        let ladder = index
            .query_point(Vec3::new(2.0, 1.0, 0.0))
            .and_then(|leaf| leaf.cell_at(Vec3::new(2.0, 1.0, 0.0)))
            .map(|cell| cell.id)
            .unwrap();
        index.remove(ladder);
        assert_eq!(classify(&index, Vec3::new(2.0, 1.0, 0.0)), ProbeHit::Open);
    }

    #[test]
    fn test_open_space_inside_sparse_leaf() {
        let mut index = SpatialIndex::new(Vec3::repeat(-0.5), 4.0);
        index.insert(Vec3::new(0.0, 0.0, 0.0), NewCell::tagged(CellTag::None)).unwrap();
        index.insert(Vec3::new(3.0, 3.0, 0.0), NewCell::tagged(CellTag::Ladder)).unwrap();

        // (1, 1) shares a 2-wide leaf with the block at the origin
        assert_eq!(classify(&index, Vec3::new(1.0, 1.0, 0.0)), ProbeHit::Open);
        assert_eq!(classify(&index, Vec3::new(2.0, 2.0, 0.0)), ProbeHit::Open);
        assert!(classify(&index, Vec3::new(0.2, 0.3, 0.0)).is_solid());
        assert!(classify(&index, Vec3::new(3.0, 3.0, 0.0)).is(CellTag::Ladder));

        let report = probe(&index, Vec3::new(1.0, 1.0, 0.0));
        assert!(report.flags().is_empty());
    }
}
