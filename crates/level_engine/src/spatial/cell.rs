//! Voxel cells stored in the spatial index
//!
//! A cell is one static piece of level geometry plus the semantic tag that the
//! collision probes and transition machines dispatch on.

use std::fmt;

use crate::foundation::math::{AABB, Vec3};

/// Identifier handed out by the index for every inserted cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Horizontal travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward -x
    Left,
    /// Toward +x
    Right,
}

impl Direction {
    /// Unit sign along x
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Direction of a signed x component, `None` for zero
    pub fn from_sign(value: f32) -> Option<Self> {
        if value > 0.0 {
            Some(Self::Right)
        } else if value < 0.0 {
            Some(Self::Left)
        } else {
            None
        }
    }
}

/// Semantic classification of a voxel
///
/// `None` is untagged solid geometry: floors, walls and props. It is a real
/// cell and blocks movement. Open space is the absence of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellTag {
    /// Plain solid geometry
    None,
    /// Lower staircase segment rising toward +x
    Staircase1Up,
    /// Lower staircase segment rising toward -x
    Staircase1Down,
    /// Upper staircase segment rising toward +x
    Staircase2Up,
    /// Upper staircase segment rising toward -x
    Staircase2Down,
    /// Climbable ladder rung
    Ladder,
    /// Door leading to another level
    Door,
}

impl CellTag {
    /// Derive a tag from a model name and its X rotation in degrees.
    ///
    /// Staircase models are oriented by their X rotation: 270° is the "Up"
    /// variant, anything else the "Down" variant.
    pub fn classify(model: &str, rotation_x: f32) -> Self {
        let up = (crate::foundation::math::utils::wrap_degrees(rotation_x) - 270.0).abs() < 0.5;
        if model.contains("Staircase2-1") {
            if up { Self::Staircase1Up } else { Self::Staircase1Down }
        } else if model.contains("Staircase2-2") {
            if up { Self::Staircase2Up } else { Self::Staircase2Down }
        } else if model.contains("Ladder") {
            Self::Ladder
        } else if model.contains("Door") {
            Self::Door
        } else {
            Self::None
        }
    }

    /// True for the four staircase variants
    pub fn is_staircase(self) -> bool {
        matches!(
            self,
            Self::Staircase1Up | Self::Staircase1Down | Self::Staircase2Up | Self::Staircase2Down
        )
    }

    /// Direction in which a staircase surface rises, `None` for other tags
    pub fn rises_toward(self) -> Option<Direction> {
        match self {
            Self::Staircase1Up | Self::Staircase2Up => Some(Direction::Right),
            Self::Staircase1Down | Self::Staircase2Down => Some(Direction::Left),
            Self::None | Self::Ladder | Self::Door => None,
        }
    }

    /// Height of a staircase surface above the cell bottom at its low edge,
    /// as a fraction of the cell height
    fn ramp_base(self) -> f32 {
        match self {
            Self::Staircase2Up | Self::Staircase2Down => 0.5,
            _ => 0.0,
        }
    }
}

/// A static piece of geometry stored in an index leaf
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelCell {
    /// Identifier assigned on insertion
    pub id: CellId,
    /// Semantic classification
    pub tag: CellTag,
    /// Model reference (opaque to the index)
    pub model: String,
    /// World-space center
    pub position: Vec3,
    /// Rotation in degrees around X, Y and Z
    pub rotation: Vec3,
    /// Integer scale along each axis, in cells
    pub scale: Vec3,
}

impl VoxelCell {
    /// World-space bounds of the cell
    pub fn bounds(&self) -> AABB {
        AABB::from_center_extents(self.position, self.scale * 0.5)
    }
}

/// Walkable surface of a staircase cell
///
/// Segment 1 rises from the bottom of its cell to the middle, segment 2 from the
/// middle to the top, so two adjacent segments climb exactly one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    /// Bounds of the staircase cell
    pub bounds: AABB,
    /// Staircase tag (one of the four variants)
    pub tag: CellTag,
}

impl Ramp {
    /// Build a ramp from a staircase cell, `None` for other tags
    pub fn new(bounds: AABB, tag: CellTag) -> Option<Self> {
        tag.is_staircase().then_some(Self { bounds, tag })
    }

    /// Surface height at world `x`, clamped to the ramp's edges
    pub fn surface_at(&self, x: f32) -> f32 {
        let width = self.bounds.max.x - self.bounds.min.x;
        let height = self.bounds.max.y - self.bounds.min.y;
        let along = match self.tag.rises_toward() {
            Some(Direction::Left) => self.bounds.max.x - x,
            _ => x - self.bounds.min.x,
        };
        let t = (along / width).clamp(0.0, 1.0);
        self.bounds.min.y + height * (self.tag.ramp_base() + 0.5 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tag_classification() {
        assert_eq!(CellTag::classify("Staircase2-1", 270.0), CellTag::Staircase1Up);
        assert_eq!(CellTag::classify("Staircase2-1", 90.0), CellTag::Staircase1Down);
        assert_eq!(CellTag::classify("StoneStaircase2-2", -90.0), CellTag::Staircase2Up);
        assert_eq!(CellTag::classify("Staircase2-2", 0.0), CellTag::Staircase2Down);
        assert_eq!(CellTag::classify("WoodLadder", 0.0), CellTag::Ladder);
        assert_eq!(CellTag::classify("IronDoor", 270.0), CellTag::Door);
        assert_eq!(CellTag::classify("Crate", 270.0), CellTag::None);
    }

    #[test]
    fn test_ramp_surface_heights() {
        let lower = Ramp::new(AABB::cube(Vec3::new(1.0, 1.0, 0.0), 0.5), CellTag::Staircase1Up).unwrap();
        let upper = Ramp::new(AABB::cube(Vec3::new(2.0, 1.0, 0.0), 0.5), CellTag::Staircase2Up).unwrap();

        assert_relative_eq!(lower.surface_at(0.5), 0.5);
        assert_relative_eq!(lower.surface_at(1.5), 1.0);
        assert_relative_eq!(upper.surface_at(1.5), 1.0);
        assert_relative_eq!(upper.surface_at(2.5), 1.5);
        // Clamped past either edge
        assert_relative_eq!(upper.surface_at(9.0), 1.5);
        assert_relative_eq!(lower.surface_at(-3.0), 0.5);
    }

    #[test]
    fn test_descending_ramp_mirrors() {
        let ramp = Ramp::new(AABB::cube(Vec3::new(1.0, 1.0, 0.0), 0.5), CellTag::Staircase1Down).unwrap();
        assert_relative_eq!(ramp.surface_at(1.5), 0.5);
        assert_relative_eq!(ramp.surface_at(0.5), 1.0);
        assert!(Ramp::new(ramp.bounds, CellTag::Ladder).is_none());
    }
}
