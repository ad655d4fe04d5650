//! Spatial partitioning data structures
//!
//! Provides the adaptive octree that stores a level's static cells and answers
//! the point, box and id queries used by the collision probes.

pub mod cell;
mod octree;

pub use cell::{CellId, CellTag, Direction, Ramp, VoxelCell};
pub use octree::{
    IndexError, IndexNode, NewCell, NodeId, PointClass, SpatialIndex, MAX_CELLS_PER_LEAF,
    MIN_NODE_SIZE,
};
