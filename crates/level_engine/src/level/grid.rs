//! Level grid text format
//!
//! ```text
//! # comments and blank lines are ignored; fields split on commas or whitespace
//! depth, rows, cols, doorCount
//! originX, originY, originZ
//! minX,minY,minZ, maxX,maxY,maxZ, nextX,nextY,nextZ, nextLevel, requiredItem|null
//! token x cols          (depth * rows lines, layer by layer, top row first)
//! ```
//!
//! A token is either `Null` or `modelName_SSS[_Xddd|_Yddd|_Zddd]*`, where `SSS`
//! is the integer scale along X, Y and Z.

use std::str::FromStr;

use super::door::Door;
use super::LevelLoadError;
use crate::foundation::math::{AABB, Vec3};

/// A model reference parsed from a grid token
#[derive(Debug, Clone, PartialEq)]
pub struct ModelToken {
    /// Model name without the size and rotation suffixes
    pub model: String,
    /// Integer scale along each axis
    pub scale: Vec3,
    /// Rotation in degrees around X, Y and Z
    pub rotation: Vec3,
}

impl ModelToken {
    /// Parse a non-`Null` token, `None` if it does not follow the token grammar
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split('_');
        let mut name = Vec::new();
        let mut size_code = None;

        for part in parts.by_ref() {
            if part.len() == 3 && part.bytes().all(|b| b.is_ascii_digit()) {
                size_code = Some(part);
                break;
            }
            name.push(part);
        }

        let size_code = size_code?;
        if name.is_empty() || name.iter().any(|part| part.is_empty()) {
            return None;
        }
        let scale: Vec<f32> = size_code.bytes().map(|b| f32::from(b - b'0')).collect();
        if scale.iter().any(|&s| s == 0.0) {
            return None;
        }

        let mut rotation = Vec3::zeros();
        for part in parts {
            let degrees: f32 = part.get(1..).filter(|v| !v.is_empty())?.parse().ok()?;
            match part.get(..1)? {
                "X" => rotation.x = degrees,
                "Y" => rotation.y = degrees,
                "Z" => rotation.z = degrees,
                _ => return None,
            }
        }

        Some(Self {
            model: name.join("_"),
            scale: Vec3::new(scale[0], scale[1], scale[2]),
            rotation,
        })
    }
}

/// A parsed, validated level grid
#[derive(Debug, Clone, PartialEq)]
pub struct LevelGrid {
    depth: usize,
    rows: usize,
    cols: usize,
    origin: Vec3,
    doors: Vec<Door>,
    cells: Vec<Option<ModelToken>>,
}

impl LevelGrid {
    /// Parse a level file's text
    pub fn parse(text: &str) -> Result<Self, LevelLoadError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(number, line)| (number, fields(line)));

        let (header_line, header) = lines.next().ok_or(LevelLoadError::MissingSection("header"))?;
        let header = parse_all::<usize>(&header)
            .filter(|values| values.len() == 4 && values[..3].iter().all(|&v| v > 0))
            .ok_or(LevelLoadError::InvalidHeader { line: header_line })?;
        let (depth, rows, cols, door_count) = (header[0], header[1], header[2], header[3]);

        let (line, origin) = lines.next().ok_or(LevelLoadError::MissingSection("origin"))?;
        let origin = parse_all::<f32>(&origin)
            .filter(|values| values.len() == 3)
            .map(|values| Vec3::new(values[0], values[1], values[2]))
            .ok_or(LevelLoadError::InvalidOrigin { line })?;

        // Counts come straight from the file; nothing is sized from them
        // until the rows are actually there
        let expected_rows = depth
            .checked_mul(rows)
            .filter(|layer_rows| layer_rows.checked_mul(cols).is_some())
            .ok_or(LevelLoadError::InvalidHeader { line: header_line })?;

        let region = region_bounds(origin, depth, rows, cols);
        let mut doors = Vec::new();
        for _ in 0..door_count {
            let (line, row) = lines.next().ok_or(LevelLoadError::MissingSection("doors"))?;
            let door = parse_door(&row).ok_or(LevelLoadError::InvalidDoor { line })?;
            let ordered = door.bounds.min.iter().zip(door.bounds.max.iter()).all(|(lo, hi)| lo <= hi);
            if !ordered || !region.intersects(&door.bounds) {
                return Err(LevelLoadError::DoorOutOfRange { line });
            }
            doors.push(door);
        }

        let mut cells = Vec::new();
        let mut found_rows = 0;
        for (line, tokens) in lines {
            found_rows += 1;
            if found_rows > expected_rows {
                continue;
            }
            if tokens.len() != cols {
                return Err(LevelLoadError::ColumnCount {
                    line,
                    expected: cols,
                    found: tokens.len(),
                });
            }
            for (column, token) in tokens.into_iter().enumerate() {
                if token == "Null" {
                    cells.push(None);
                    continue;
                }
                let parsed = ModelToken::parse(token).ok_or_else(|| LevelLoadError::UnknownModel {
                    line,
                    column: column + 1,
                    token: token.to_string(),
                })?;
                cells.push(Some(parsed));
            }
        }
        if found_rows != expected_rows {
            return Err(LevelLoadError::RowCount {
                expected: expected_rows,
                found: found_rows,
            });
        }

        Ok(Self {
            depth,
            rows,
            cols,
            origin,
            doors,
            cells,
        })
    }

    /// Number of layers along Z
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of rows along Y
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns along X
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// World position of the cell at layer 0, bottom row, column 0
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Door records in file order
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    /// Region covered by the grid's cells
    pub fn bounds(&self) -> AABB {
        region_bounds(self.origin, self.depth, self.rows, self.cols)
    }

    /// Token at a grid coordinate; row 0 is the top row
    pub fn token(&self, layer: usize, row: usize, col: usize) -> Option<&ModelToken> {
        if layer >= self.depth || row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[(layer * self.rows + row) * self.cols + col].as_ref()
    }

    /// World position of a grid coordinate
    pub fn position_of(&self, layer: usize, row: usize, col: usize) -> Vec3 {
        self.origin + Vec3::new(col as f32, (self.rows - 1 - row) as f32, layer as f32)
    }

    /// Every non-`Null` token with its world position, in file order
    pub fn occupied(&self) -> impl Iterator<Item = (Vec3, &ModelToken)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            let token = cell.as_ref()?;
            let col = index % self.cols;
            let row = (index / self.cols) % self.rows;
            let layer = index / (self.cols * self.rows);
            Some((self.position_of(layer, row, col), token))
        })
    }
}

impl FromStr for LevelGrid {
    type Err = LevelLoadError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

fn fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .collect()
}

fn parse_all<T: FromStr>(fields: &[&str]) -> Option<Vec<T>> {
    fields.iter().map(|field| field.parse().ok()).collect()
}

fn parse_door(fields: &[&str]) -> Option<Door> {
    if fields.len() != 11 {
        return None;
    }
    let numbers = parse_all::<f32>(&fields[..9])?;
    let required_item = match fields[10] {
        item if item.eq_ignore_ascii_case("null") => None,
        item => Some(item.to_string()),
    };

    Some(Door {
        bounds: AABB::new(
            Vec3::new(numbers[0], numbers[1], numbers[2]),
            Vec3::new(numbers[3], numbers[4], numbers[5]),
        ),
        next_position: Vec3::new(numbers[6], numbers[7], numbers[8]),
        next_level: fields[9].to_string(),
        required_item,
    })
}

fn region_bounds(origin: Vec3, depth: usize, rows: usize, cols: usize) -> AABB {
    let half = Vec3::repeat(0.5);
    AABB::new(
        origin - half,
        origin + Vec3::new(cols as f32, rows as f32, depth as f32) - half,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# two layers, one door
2, 2, 3, 1
0, 0, 0
2.5,0.5,-0.5, 3.5,1.5,0.5, 1,1,0, Vault, CardKey

Null  Crate_111  Null
Block_111 Block_111 Staircase2-1_111_X270
Null Null Null
Block_211_Y90 Null OakLadder_111
";

    #[test]
    fn test_parse_sample() {
        let grid: LevelGrid = SAMPLE.parse().unwrap();
        assert_eq!((grid.depth(), grid.rows(), grid.cols()), (2, 2, 3));
        assert_eq!(grid.doors().len(), 1);
        assert_eq!(grid.doors()[0].required_item.as_deref(), Some("CardKey"));
        assert_eq!(grid.occupied().count(), 6);

        let stair = grid.token(0, 1, 2).unwrap();
        assert_eq!(stair.model, "Staircase2-1");
        assert_eq!(stair.rotation.x, 270.0);
        assert_eq!(grid.position_of(0, 1, 2), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(grid.position_of(1, 0, 1), Vec3::new(1.0, 1.0, 1.0));

        let wide = grid.token(1, 1, 0).unwrap();
        assert_eq!(wide.scale, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(wide.rotation.y, 90.0);
    }

    #[test]
    fn test_token_grammar() {
        assert!(ModelToken::parse("Stone_Wall_111").is_some());
        assert_eq!(ModelToken::parse("Stone_Wall_111").unwrap().model, "Stone_Wall");
        assert!(ModelToken::parse("Crate").is_none());
        assert!(ModelToken::parse("_111").is_none());
        assert!(ModelToken::parse("Crate_111_W90").is_none());
        assert!(ModelToken::parse("Crate_111_X").is_none());
        assert!(ModelToken::parse("Crate_101").is_none());
    }

    #[test]
    fn test_column_mismatch_is_fatal() {
        let text = "1, 2, 2, 0\n0,0,0\nNull Null\nBlock_111\n";
        let err = LevelGrid::parse(text).unwrap_err();
        assert!(matches!(
            err,
            LevelLoadError::ColumnCount { line: 4, expected: 2, found: 1 }
        ));
    }

    #[test]
    fn test_row_mismatch_is_fatal() {
        let text = "1, 3, 1, 0\n0,0,0\nNull\nNull\n";
        let err = LevelGrid::parse(text).unwrap_err();
        assert!(matches!(err, LevelLoadError::RowCount { expected: 3, found: 2 }));
    }

    #[test]
    fn test_unknown_model_is_fatal() {
        let text = "1, 1, 2, 0\n0,0,0\nNull Mystery\n";
        let err = LevelGrid::parse(text).unwrap_err();
        assert!(matches!(
            err,
            LevelLoadError::UnknownModel { line: 3, column: 2, ref token } if token == "Mystery"
        ));
    }

    #[test]
    fn test_door_outside_level_is_rejected() {
        let text = "1,1,1,1\n0,0,0\n10,10,10, 11,11,11, 0,0,0, Elsewhere, null\nNull\n";
        assert!(matches!(
            LevelGrid::parse(text),
            Err(LevelLoadError::DoorOutOfRange { line: 3 })
        ));

        let short = "1,1,1,1\n0,0,0\n0,0,0, 1,1,1, Elsewhere\nNull\n";
        assert!(matches!(LevelGrid::parse(short), Err(LevelLoadError::InvalidDoor { line: 3 })));
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let text = "4000000000, 4000000000, 4000000000, 0\n0,0,0\nNull\n";
        assert!(matches!(LevelGrid::parse(text), Err(LevelLoadError::InvalidHeader { line: 1 })));

        // A door count far beyond the file runs out of rows instead of allocating
        let text = "1, 1, 1, 99999999999999999\n0,0,0\n";
        assert!(matches!(LevelGrid::parse(text), Err(LevelLoadError::MissingSection("doors"))));
    }

    #[test]
    fn test_missing_sections() {
        assert!(matches!(LevelGrid::parse(""), Err(LevelLoadError::MissingSection("header"))));
        assert!(matches!(
            LevelGrid::parse("1,1,1,0\n"),
            Err(LevelLoadError::MissingSection("origin"))
        ));
        assert!(matches!(
            LevelGrid::parse("1,0,1,0\n0,0,0\n"),
            Err(LevelLoadError::InvalidHeader { line: 1 })
        ));
    }
}
