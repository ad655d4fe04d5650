//! Octree spatial partitioning structure
//!
//! Divides a level's static geometry into hierarchical cubic regions. A leaf
//! splits into 8 octants as soon as it holds more than [`MAX_CELLS_PER_LEAF`]
//! cells, until nodes reach [`MIN_NODE_SIZE`], so in the steady state every
//! occupied grid cell sits in its own leaf.
//!
//! Nodes live in a [`SlotMap`] arena. Parent links are plain [`NodeId`] keys,
//! which keeps the tree free of ownership cycles and makes detaching a pruned
//! leaf a constant-time operation on its parent.
//!
//! Octant selection and point queries share one rule: a node owns the
//! half-open box `[min, max)`, so a point on a face shared by two siblings
//! always belongs to the one on the positive side.

use std::collections::VecDeque;

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use super::cell::{CellId, CellTag, VoxelCell};
use crate::foundation::math::{Containment, AABB, Vec3};
use crate::level::grid::LevelGrid;

/// Maximum cells a leaf holds before it splits
pub const MAX_CELLS_PER_LEAF: usize = 1;

/// Edge length below which nodes never split
pub const MIN_NODE_SIZE: f32 = 1.0;

new_key_type! {
    /// Handle to a node in the index arena
    pub struct NodeId;
}

/// Errors raised by index mutation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// The position is not inside the root node
    #[error("position ({x}, {y}, {z}) lies outside the indexed region")]
    OutOfBounds {
        /// X coordinate
        x: f32,
        /// Y coordinate
        y: f32,
        /// Z coordinate
        z: f32,
    },
}

/// Description of a cell before the index assigns it an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewCell {
    /// Semantic tag
    pub tag: CellTag,
    /// Model reference
    pub model: String,
    /// Rotation in degrees around X, Y and Z
    pub rotation: Vec3,
    /// Integer scale along each axis
    pub scale: Vec3,
}

impl NewCell {
    /// Describe a cell from a model name, deriving its tag
    pub fn from_model(model: impl Into<String>, rotation: Vec3, scale: Vec3) -> Self {
        let model = model.into();
        Self {
            tag: CellTag::classify(&model, rotation.x),
            model,
            rotation,
            scale,
        }
    }

    /// Describe a unit cell with an explicit tag
    pub fn tagged(tag: CellTag) -> Self {
        Self {
            tag,
            model: format!("{tag:?}"),
            rotation: Vec3::zeros(),
            scale: Vec3::repeat(1.0),
        }
    }
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct IndexNode {
    id: NodeId,
    parent: Option<NodeId>,
    center: Vec3,
    half_size: f32,
    bounds: AABB,
    octant: u8,
    depth: u32,
    children: Vec<NodeId>,
    cells: Vec<VoxelCell>,
}

impl IndexNode {
    /// Arena key of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// World-space center
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half the edge length
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    /// World-space bounds
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Octant index within the parent (0 for the root)
    pub fn octant(&self) -> u8 {
        self.octant
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Child nodes; empty for leaves
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Cells stored in this node; always empty for interior nodes
    pub fn cells(&self) -> &[VoxelCell] {
        &self.cells
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The cell whose own bounds contain `point`.
    ///
    /// A sparse leaf can be much larger than the cell it holds, so the rest of
    /// its volume is open space. Leaves at minimum size may hold several
    /// overlapping cells; the earliest inserted one wins.
    pub fn cell_at(&self, point: Vec3) -> Option<&VoxelCell> {
        self.cells.iter().find(|cell| cell.bounds().owns_point(point))
    }

    fn needs_split(&self) -> bool {
        self.cells.len() > MAX_CELLS_PER_LEAF && self.half_size * 2.0 > MIN_NODE_SIZE
    }
}

/// Result of [`SpatialIndex::classify_point`]
#[derive(Debug, Clone, Copy)]
pub enum PointClass<'a> {
    /// The point lies outside the root bounds
    Outside,
    /// The point is inside the level but no cell occupies it
    Open,
    /// The point lies inside a cell
    Occupied(&'a IndexNode, &'a VoxelCell),
}

/// Get the octant index (0-7) for a position relative to a node center
///
/// Octant layout:
/// 0: -X, -Y, -Z    1: +X, -Y, -Z    2: -X, +Y, -Z    3: +X, +Y, -Z
/// 4: -X, -Y, +Z    5: +X, -Y, +Z    6: -X, +Y, +Z    7: +X, +Y, +Z
fn octant_of(center: Vec3, position: Vec3) -> u8 {
    let x_bit = u8::from(position.x >= center.x);
    let y_bit = u8::from(position.y >= center.y);
    let z_bit = u8::from(position.z >= center.z);
    (z_bit << 2) | (y_bit << 1) | x_bit
}

fn octant_center(center: Vec3, half_size: f32, octant: u8) -> Vec3 {
    let quarter = half_size * 0.5;
    let sign = |bit: u8| if octant & bit != 0 { 1.0 } else { -1.0 };
    Vec3::new(
        center.x + quarter * sign(1),
        center.y + quarter * sign(2),
        center.z + quarter * sign(4),
    )
}

/// Adaptive octree over a level's static cells
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: SlotMap<NodeId, IndexNode>,
    root: NodeId,
    next_cell_id: u32,
}

impl SpatialIndex {
    /// Create an empty index whose root cube starts at `min_corner`
    pub fn new(min_corner: Vec3, size: f32) -> Self {
        let half_size = size * 0.5;
        let center = min_corner + Vec3::repeat(half_size);
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(|id| IndexNode {
            id,
            parent: None,
            center,
            half_size,
            bounds: AABB::cube(center, half_size),
            octant: 0,
            depth: 0,
            children: Vec::new(),
            cells: Vec::new(),
        });

        Self {
            nodes,
            root,
            next_cell_id: 0,
        }
    }

    /// Edge length of a root able to hold `extent` cells along its longest
    /// axis: the smallest power of 4 not below `extent`, so repeated halving
    /// always lands on whole cells.
    pub fn root_size_for(extent: usize) -> f32 {
        let mut size: u32 = 1;
        while (size as usize) < extent {
            size *= 4;
        }
        size as f32
    }

    /// Build the index for a parsed level grid, then prune empty leaves
    pub fn from_grid(grid: &LevelGrid) -> Result<Self, IndexError> {
        let extent = grid.rows().max(grid.cols()).max(grid.depth());
        let size = Self::root_size_for(extent);
        let mut index = Self::new(grid.origin() - Vec3::repeat(0.5), size);

        for (position, token) in grid.occupied() {
            index.insert(
                position,
                NewCell::from_model(token.model.clone(), token.rotation, token.scale),
            )?;
        }
        let pruned = index.prune();

        log::debug!(
            "Built spatial index: {} cells in {} nodes ({} empty leaves pruned, root size {})",
            index.cell_count(),
            index.node_count(),
            pruned,
            size
        );
        Ok(index)
    }

    /// Root node
    pub fn root(&self) -> &IndexNode {
        &self.nodes[self.root]
    }

    /// Bounds of the indexed region
    pub fn root_bounds(&self) -> AABB {
        self.root().bounds
    }

    /// Look up a node by key
    pub fn node(&self, id: NodeId) -> Option<&IndexNode> {
        self.nodes.get(id)
    }

    /// Insert a cell at `position`, returning its new id
    pub fn insert(&mut self, position: Vec3, cell: NewCell) -> Result<CellId, IndexError> {
        if !self.root_bounds().owns_point(position) {
            return Err(IndexError::OutOfBounds {
                x: position.x,
                y: position.y,
                z: position.z,
            });
        }

        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        self.place(VoxelCell {
            id,
            tag: cell.tag,
            model: cell.model,
            position,
            rotation: cell.rotation,
            scale: cell.scale,
        });
        Ok(id)
    }

    /// Insert a model, deriving its tag from the model name and X rotation
    pub fn insert_model(
        &mut self,
        model: impl Into<String>,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    ) -> Result<CellId, IndexError> {
        self.insert(position, NewCell::from_model(model, rotation, scale))
    }

    fn place(&mut self, cell: VoxelCell) {
        let position = cell.position;
        let mut current = self.root;

        loop {
            let node = &self.nodes[current];
            if node.is_leaf() {
                break;
            }
            let octant = octant_of(node.center, position);
            current = match self.child_for_octant(current, octant) {
                Some(child) => child,
                None => self.attach_child(current, octant),
            };
        }

        let leaf = &mut self.nodes[current];
        leaf.cells.push(cell);
        if leaf.needs_split() {
            self.subdivide(current);
            self.prune_subtree(current);
        }
    }

    fn child_for_octant(&self, node: NodeId, octant: u8) -> Option<NodeId> {
        self.nodes[node]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].octant == octant)
    }

    fn attach_child(&mut self, parent: NodeId, octant: u8) -> NodeId {
        let (center, half_size, depth) = {
            let node = &self.nodes[parent];
            (node.center, node.half_size, node.depth)
        };
        let child_center = octant_center(center, half_size, octant);
        let child_half = half_size * 0.5;

        let child = self.nodes.insert_with_key(|id| IndexNode {
            id,
            parent: Some(parent),
            center: child_center,
            half_size: child_half,
            bounds: AABB::cube(child_center, child_half),
            octant,
            depth: depth + 1,
            children: Vec::new(),
            cells: Vec::new(),
        });
        self.nodes[parent].children.push(child);
        child
    }

    /// Subdivide a leaf into 8 children and redistribute its cells
    fn subdivide(&mut self, id: NodeId) {
        let center = self.nodes[id].center;
        let cells = std::mem::take(&mut self.nodes[id].cells);

        for octant in 0..8 {
            self.attach_child(id, octant);
        }

        for cell in cells {
            let octant = octant_of(center, cell.position);
            if let Some(child) = self.child_for_octant(id, octant) {
                self.nodes[child].cells.push(cell);
            }
        }

        let children = self.nodes[id].children.clone();
        for child in children {
            if self.nodes[child].needs_split() {
                self.subdivide(child);
            }
        }

        log::trace!(
            "Subdivided node at depth {} (half size {})",
            self.nodes[id].depth,
            self.nodes[id].half_size
        );
    }

    /// Detach every empty leaf, walking the tree in post-order.
    ///
    /// Returns the number of nodes removed. The root is never removed, so an
    /// entirely empty index is a single empty leaf.
    pub fn prune(&mut self) -> usize {
        self.prune_subtree(self.root)
    }

    fn prune_subtree(&mut self, id: NodeId) -> usize {
        let children = self.nodes[id].children.clone();
        let mut removed = 0;
        for child in children {
            removed += self.prune_subtree(child);
        }

        let node = &self.nodes[id];
        if node.is_leaf() && node.cells.is_empty() {
            if let Some(parent) = node.parent {
                self.nodes[parent].children.retain(|&child| child != id);
                self.nodes.remove(id);
                removed += 1;
            }
        }
        removed
    }

    /// Find the leaf owning `point`.
    ///
    /// `None` means either open space or a point outside the level; use
    /// [`Self::classify_point`] to tell the two apart.
    pub fn query_point(&self, point: Vec3) -> Option<&IndexNode> {
        let mut node = self.root();
        if !node.bounds.owns_point(point) {
            return None;
        }
        while !node.is_leaf() {
            node = node
                .children
                .iter()
                .map(|&child| &self.nodes[child])
                .find(|child| child.bounds.owns_point(point))?;
        }
        Some(node)
    }

    /// Find the first leaf (in octant order) whose bounds share volume with `bounds`
    pub fn query_box(&self, bounds: &AABB) -> Option<&IndexNode> {
        let mut node = self.root();
        if node.bounds.containment(bounds) == Containment::Disjoint {
            return None;
        }
        while !node.is_leaf() {
            node = node
                .children
                .iter()
                .map(|&child| &self.nodes[child])
                .find(|child| child.bounds.containment(bounds) != Containment::Disjoint)?;
        }
        Some(node)
    }

    /// Classify a point as outside the level, open space, or occupied
    pub fn classify_point(&self, point: Vec3) -> PointClass<'_> {
        if !self.root().bounds.owns_point(point) {
            return PointClass::Outside;
        }
        match self.query_point(point) {
            Some(leaf) => leaf
                .cell_at(point)
                .map_or(PointClass::Open, |cell| PointClass::Occupied(leaf, cell)),
            None => PointClass::Open,
        }
    }

    /// Find a cell by id with an exhaustive depth-first walk
    pub fn query_id(&self, id: CellId) -> Option<(&IndexNode, &VoxelCell)> {
        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            if let Some(cell) = node.cells.iter().find(|cell| cell.id == id) {
                return Some((node, cell));
            }
            // Reverse so children are visited in octant order
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Detach a cell from its leaf. Siblings are not merged back.
    pub fn remove(&mut self, id: CellId) -> Option<VoxelCell> {
        let node_id = self.query_id(id).map(|(node, _)| node.id)?;
        let cells = &mut self.nodes[node_id].cells;
        let index = cells.iter().position(|cell| cell.id == id)?;
        Some(cells.remove(index))
    }

    /// Move every node and cell by `delta`, leaving leaf membership unchanged
    pub fn translate(&mut self, delta: Vec3) {
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            let node = &mut self.nodes[id];
            node.center += delta;
            node.bounds = node.bounds.translated(delta);
            for cell in &mut node.cells {
                cell.position += delta;
            }
            queue.extend(node.children.iter().copied());
        }
    }

    /// All leaves in depth-first octant order
    pub fn leaves(&self) -> Vec<&IndexNode> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                leaves.push(node);
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        leaves
    }

    /// Count cells across all leaves
    pub fn cell_count(&self) -> usize {
        self.nodes.values().map(|node| node.cells.len()).sum()
    }

    /// Count live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn index_16() -> SpatialIndex {
        SpatialIndex::new(Vec3::repeat(-0.5), 16.0)
    }

    fn solid() -> NewCell {
        NewCell::tagged(CellTag::None)
    }

    #[test]
    fn test_root_size_is_power_of_four() {
        assert_eq!(SpatialIndex::root_size_for(0), 1.0);
        assert_eq!(SpatialIndex::root_size_for(1), 1.0);
        assert_eq!(SpatialIndex::root_size_for(4), 4.0);
        assert_eq!(SpatialIndex::root_size_for(5), 16.0);
        assert_eq!(SpatialIndex::root_size_for(17), 64.0);
    }

    #[test]
    fn test_point_query_finds_containing_leaf() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut index = index_16();
        let mut inserted = Vec::new();

        for _ in 0..200 {
            let position = Vec3::new(
                rng.gen_range(0..16) as f32,
                rng.gen_range(0..16) as f32,
                rng.gen_range(0..16) as f32,
            );
            let id = index.insert(position, solid()).unwrap();
            inserted.push((id, position));
        }

        for (id, position) in inserted {
            let leaf = index.query_point(position).expect("inserted position must resolve");
            assert!(leaf.bounds().owns_point(position));
            assert!(leaf.cells().iter().any(|cell| cell.id == id));
        }
    }

    #[test]
    fn test_leaf_occupancy_threshold() {
        let mut index = index_16();
        for x in 0..6 {
            index.insert(Vec3::new(x as f32, 2.0, 3.0), solid()).unwrap();
        }
        // Two cells sharing a minimum-size cell may coexist
        index.insert(Vec3::new(9.0, 9.0, 9.0), solid()).unwrap();
        index.insert(Vec3::new(9.2, 9.1, 9.0), solid()).unwrap();

        let mut crowded = 0;
        for leaf in index.leaves() {
            if leaf.half_size() * 2.0 > MIN_NODE_SIZE {
                assert!(leaf.cells().len() <= MAX_CELLS_PER_LEAF);
            } else if leaf.cells().len() > 1 {
                crowded += 1;
            }
        }
        assert_eq!(crowded, 1);
        assert_eq!(index.cell_count(), 8);
    }

    #[test]
    fn test_insert_then_query_id() {
        let mut index = index_16();
        index.insert(Vec3::new(1.0, 1.0, 0.0), solid()).unwrap();
        let id = index
            .insert_model("OakLadder_111", Vec3::new(4.0, 2.0, 0.0), Vec3::zeros(), Vec3::repeat(1.0))
            .unwrap();

        let (leaf, cell) = index.query_id(id).unwrap();
        assert_eq!(cell.model, "OakLadder_111");
        assert_eq!(cell.tag, CellTag::Ladder);
        assert!(leaf.bounds().owns_point(cell.position));
    }

    #[test]
    fn test_insert_outside_root_is_rejected() {
        let mut index = index_16();
        let result = index.insert(Vec3::new(15.5, 0.0, 0.0), solid());
        assert!(matches!(result, Err(IndexError::OutOfBounds { .. })));
        assert_eq!(index.cell_count(), 0);
    }

    #[test]
    fn test_remove_detaches_without_merging() {
        let mut index = index_16();
        let a = index.insert(Vec3::new(0.0, 0.0, 0.0), solid()).unwrap();
        let b = index.insert(Vec3::new(1.0, 0.0, 0.0), solid()).unwrap();
        let nodes_before = index.node_count();

        let removed = index.remove(a).unwrap();
        assert_eq!(removed.id, a);
        assert!(index.query_id(a).is_none());
        assert!(index.query_id(b).is_some());
        assert_eq!(index.node_count(), nodes_before);

        // The vacated leaf stays behind, empty
        let leaf = index.query_point(Vec3::zeros()).unwrap();
        assert!(leaf.cells().is_empty());
        assert!(matches!(index.classify_point(Vec3::zeros()), PointClass::Open));
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut index = index_16();
        index.insert(Vec3::new(3.0, 3.0, 3.0), solid()).unwrap();
        assert!(index.remove(CellId(99)).is_none());
        assert_eq!(index.cell_count(), 1);
    }

    #[test]
    fn test_pruning_removes_empty_octants() {
        let mut index = index_16();
        index.insert(Vec3::new(0.0, 0.0, 0.0), solid()).unwrap();
        index.insert(Vec3::new(15.0, 15.0, 15.0), solid()).unwrap();

        // Root split once; the six empty octants were pruned
        assert_eq!(index.root().children().len(), 2);
        assert!(index.leaves().iter().all(|leaf| !leaf.cells().is_empty()));
        assert!(index.query_point(Vec3::new(15.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_insert_regrows_pruned_octant() {
        let mut index = index_16();
        index.insert(Vec3::new(0.0, 0.0, 0.0), solid()).unwrap();
        index.insert(Vec3::new(15.0, 15.0, 15.0), solid()).unwrap();

        let id = index.insert(Vec3::new(15.0, 0.0, 0.0), solid()).unwrap();
        let leaf = index.query_point(Vec3::new(15.0, 0.0, 0.0)).unwrap();
        assert_eq!(leaf.cells()[0].id, id);
        assert_eq!(index.root().children().len(), 3);
        assert_eq!(index.node(leaf.id()).unwrap().parent(), Some(index.root().id()));
    }

    #[test]
    fn test_box_query() {
        let mut index = index_16();
        index.insert(Vec3::new(2.0, 2.0, 2.0), solid()).unwrap();
        index.insert(Vec3::new(12.0, 12.0, 12.0), solid()).unwrap();

        let probe = AABB::cube(Vec3::new(12.2, 12.0, 11.9), 0.25);
        let leaf = index.query_box(&probe).unwrap();
        assert_eq!(leaf.cells()[0].position, Vec3::new(12.0, 12.0, 12.0));

        let outside = AABB::cube(Vec3::new(40.0, 0.0, 0.0), 1.0);
        assert!(index.query_box(&outside).is_none());
    }

    #[test]
    fn test_translate_preserves_structure() {
        let mut index = index_16();
        let a = index.insert(Vec3::new(1.0, 2.0, 3.0), solid()).unwrap();
        index.insert(Vec3::new(7.0, 2.0, 3.0), solid()).unwrap();
        let before: Vec<_> = index
            .leaves()
            .iter()
            .map(|leaf| (leaf.id(), leaf.cells().iter().map(|c| c.id).collect::<Vec<_>>()))
            .collect();

        let delta = Vec3::new(10.0, -4.0, 0.5);
        index.translate(delta);

        let after: Vec<_> = index
            .leaves()
            .iter()
            .map(|leaf| (leaf.id(), leaf.cells().iter().map(|c| c.id).collect::<Vec<_>>()))
            .collect();
        assert_eq!(before, after);

        let moved = Vec3::new(11.0, -2.0, 3.5);
        let (leaf, cell) = index.query_id(a).unwrap();
        assert_eq!(cell.position, moved);
        assert!(leaf.bounds().owns_point(moved));
        assert_eq!(index.query_point(moved).unwrap().id(), leaf.id());
        assert_eq!(index.root_bounds().min, Vec3::repeat(-0.5) + delta);
    }

    #[test]
    fn test_outside_and_open_space_share_none() {
        let mut index = index_16();
        index.insert(Vec3::new(0.0, 0.0, 0.0), solid()).unwrap();
        index.insert(Vec3::new(15.0, 15.0, 15.0), solid()).unwrap();

        let outside = Vec3::new(-3.0, 0.0, 0.0);
        let open = Vec3::new(8.0, 0.0, 0.0);

        // query_point keeps the shared contract
        assert!(index.query_point(outside).is_none());
        assert!(index.query_point(open).is_none());

        // classify_point tells them apart
        assert!(matches!(index.classify_point(outside), PointClass::Outside));
        assert!(matches!(index.classify_point(open), PointClass::Open));
        assert!(matches!(index.classify_point(Vec3::zeros()), PointClass::Occupied(..)));
    }

    #[test]
    fn test_sparse_leaf_is_open_outside_its_cell() {
        let mut index = index_16();
        let corner = index.insert(Vec3::new(0.0, 0.0, 0.0), solid()).unwrap();
        index.insert(Vec3::new(15.0, 15.0, 15.0), solid()).unwrap();

        // Both points land in the same 8-wide leaf
        let beside = Vec3::new(1.0, 1.0, 0.0);
        let leaf = index.query_point(beside).unwrap();
        assert_eq!(leaf.half_size(), 4.0);
        assert!(leaf.cell_at(beside).is_none());
        assert!(matches!(index.classify_point(beside), PointClass::Open));

        match index.classify_point(Vec3::new(0.4, -0.5, 0.2)) {
            PointClass::Occupied(_, cell) => assert_eq!(cell.id, corner),
            other => panic!("expected the corner cell, got {other:?}"),
        }
    }
}
