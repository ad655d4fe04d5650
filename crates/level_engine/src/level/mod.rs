//! Levels: parsed grids, their spatial index and their doors
//!
//! A [`Level`] is built all-or-nothing from a [`LevelGrid`]; any malformed input
//! surfaces as a [`LevelLoadError`] and no partial index is kept.

pub mod door;
pub mod grid;
pub mod registry;

use std::path::PathBuf;

use thiserror::Error;

use crate::spatial::{IndexError, SpatialIndex};

pub use door::{Door, Inventory};
pub use grid::{LevelGrid, ModelToken};
pub use registry::LevelRegistry;

/// Errors that abort a level load
#[derive(Error, Debug)]
pub enum LevelLoadError {
    /// The level file could not be read
    #[error("failed to read level file {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file ended before a required section
    #[error("missing {0} section")]
    MissingSection(&'static str),

    /// The header is not four positive dimensions plus a door count
    #[error("line {line}: header must be `depth, rows, cols, doorCount`")]
    InvalidHeader {
        /// 1-based line number
        line: usize,
    },

    /// The origin is not three numbers
    #[error("line {line}: origin must be three numbers")]
    InvalidOrigin {
        /// 1-based line number
        line: usize,
    },

    /// A door row has the wrong shape
    #[error("line {line}: door row must have 11 fields")]
    InvalidDoor {
        /// 1-based line number
        line: usize,
    },

    /// A door's bounds are inverted or lie outside the level
    #[error("line {line}: door bounds fall outside the level")]
    DoorOutOfRange {
        /// 1-based line number
        line: usize,
    },

    /// A grid row does not have the declared number of columns
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        /// 1-based line number
        line: usize,
        /// Declared column count
        expected: usize,
        /// Tokens found on the line
        found: usize,
    },

    /// The grid does not have `depth * rows` lines
    #[error("expected {expected} grid rows, found {found}")]
    RowCount {
        /// Declared `depth * rows`
        expected: usize,
        /// Grid lines found
        found: usize,
    },

    /// A token does not follow the model token grammar
    #[error("line {line}, column {column}: unrecognized model token `{token}`")]
    UnknownModel {
        /// 1-based line number
        line: usize,
        /// 1-based column
        column: usize,
        /// The offending token
        token: String,
    },

    /// A cell could not be placed in the index
    #[error("index construction failed: {0}")]
    Index(#[from] IndexError),
}

/// A fully built level
#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    index: SpatialIndex,
    doors: Vec<Door>,
}

impl Level {
    /// Build a level from a parsed grid
    pub fn build(name: impl Into<String>, grid: &LevelGrid) -> Result<Self, LevelLoadError> {
        Ok(Self {
            name: name.into(),
            index: SpatialIndex::from_grid(grid)?,
            doors: grid.doors().to_vec(),
        })
    }

    /// Parse level text and build it
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, LevelLoadError> {
        let grid = LevelGrid::parse(text)?;
        Self::build(name, &grid)
    }

    /// Level name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spatial index over the level's cells
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Mutable access for runtime geometry changes
    pub fn index_mut(&mut self) -> &mut SpatialIndex {
        &mut self.index
    }

    /// Door records
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::spatial::CellTag;

    const STAIRS: &str = "\
1, 4, 4, 0
0, 0, 0
Null Null Null Null
Null Null Null Null
Null Staircase2-1_111_X270 Staircase2-2_111_X270 Block_111
Block_111 Block_111 Block_111 Block_111
";

    fn leaf_population(level: &Level) -> Vec<(Vec<f32>, Vec<String>)> {
        level
            .index()
            .leaves()
            .iter()
            .map(|leaf| {
                let bounds = leaf.bounds();
                let corners = bounds.min.iter().chain(bounds.max.iter()).copied().collect();
                let models = leaf.cells().iter().map(|cell| cell.model.clone()).collect();
                (corners, models)
            })
            .collect()
    }

    #[test]
    fn test_build_places_cells() {
        let level = Level::parse("stairs", STAIRS).unwrap();
        let index = level.index();
        assert_eq!(index.cell_count(), 7);
        assert_eq!(index.root_bounds().min, Vec3::repeat(-0.5));
        assert_eq!(index.root().half_size(), 2.0);

        let step = index.query_point(Vec3::new(1.0, 1.0, 0.0)).unwrap();
        assert_eq!(step.cell_at(Vec3::new(1.0, 1.0, 0.0)).unwrap().tag, CellTag::Staircase1Up);
        assert!(index.query_point(Vec3::new(0.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn test_rebuild_is_structurally_identical() {
        let first = Level::parse("stairs", STAIRS).unwrap();
        let second = Level::parse("stairs", STAIRS).unwrap();
        assert_eq!(leaf_population(&first), leaf_population(&second));
    }

    #[test]
    fn test_no_empty_leaves_after_build() {
        let level = Level::parse("stairs", STAIRS).unwrap();
        assert!(level.index().leaves().iter().all(|leaf| !leaf.cells().is_empty()));
    }

    #[test]
    fn test_empty_grid_is_bare_root() {
        let level = Level::parse("void", "1, 2, 2, 0\n0,0,0\nNull Null\nNull Null\n").unwrap();
        let root = level.index().root();
        assert!(root.is_leaf());
        assert!(root.cells().is_empty());
        assert_eq!(level.index().node_count(), 1);
    }

    #[test]
    fn test_malformed_grid_builds_nothing() {
        let result = Level::parse("broken", "1, 1, 2, 0\n0,0,0\nBlock_111 Bogus\n");
        assert!(matches!(result, Err(LevelLoadError::UnknownModel { .. })));
    }
}
