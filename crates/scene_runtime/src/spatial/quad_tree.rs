//! Quad tree spatial partitioning structure
//!
//! Divides 2D space into hierarchical regions for fast overlap queries.
//! A node subdivides into 4 quadrants once it holds more items than the
//! configured threshold. Items are stored in the deepest node whose bounds
//! fully contain them; items straddling a split line stay in the parent.
//! Items outside the root bounds are kept at the root.
//!
//! The tree is rebuilt every draw pass, so node storage is pooled: `clear`
//! resets the pool without releasing node or item allocations.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::foundation::math::Vec2;
use crate::spatial::BoundingArea;

/// Deepest subdivision a quad tree will ever create
pub const MAX_QUAD_TREE_DEPTH: u32 = 16;

/// Configuration for quad tree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// World-space area covered by the root node
    pub bounds: BoundingArea,

    /// Maximum items per node before subdivision
    pub max_items_per_node: usize,

    /// Maximum subdivision depth, at most [`MAX_QUAD_TREE_DEPTH`]
    pub max_depth: u32,

    /// Minimum node width/height (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingArea::from_center_extents(Vec2::zeros(), Vec2::new(1024.0, 1024.0)),
            max_items_per_node: 8,
            max_depth: 6,
            min_node_size: 1.0,
        }
    }
}

impl QuadTreeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.bounds.size();
        if self.bounds.is_empty() || size.x <= 0.0 || size.y <= 0.0 {
            return Err(ConfigError::Invalid("quad tree bounds must have a positive area".to_string()));
        }

        if self.max_items_per_node == 0 {
            return Err(ConfigError::Invalid("max_items_per_node must be at least 1".to_string()));
        }

        if self.max_depth > MAX_QUAD_TREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be at most {MAX_QUAD_TREE_DEPTH}, got {}",
                self.max_depth
            )));
        }

        if !(self.min_node_size.is_finite() && self.min_node_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_node_size must be positive, got {}",
                self.min_node_size
            )));
        }

        Ok(())
    }
}

/// Single node in the pooled quad tree
#[derive(Debug, Clone)]
struct QuadNode<T> {
    bounds: BoundingArea,
    depth: u32,
    items: Vec<(T, BoundingArea)>,
    /// Index of the first of 4 consecutive child nodes
    children: Option<usize>,
}

impl<T> QuadNode<T> {
    fn new(bounds: BoundingArea, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn reset(&mut self, bounds: BoundingArea, depth: u32) {
        self.bounds = bounds;
        self.depth = depth;
        self.items.clear();
        self.children = None;
    }
}

/// Quad tree over items with bounding areas
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    config: QuadTreeConfig,

    /// Node pool; `nodes[0]` is the root and only `nodes[..active]` are live
    nodes: Vec<QuadNode<T>>,
    active: usize,

    len: usize,
}

impl<T: Copy> QuadTree<T> {
    /// Create an empty quad tree
    pub fn new(config: QuadTreeConfig) -> Self {
        let root = QuadNode::new(config.bounds, 0);
        Self {
            config,
            nodes: vec![root],
            active: 1,
            len: 0,
        }
    }

    /// Configuration the tree was built with
    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Remove every item, keeping node storage for reuse
    pub fn clear(&mut self) {
        for node in &mut self.nodes[1..self.active] {
            node.items.clear();
            node.children = None;
        }

        let bounds = self.config.bounds;
        self.nodes[0].reset(bounds, 0);
        self.active = 1;
        self.len = 0;
    }

    /// Insert an item by its bounding area
    pub fn insert(&mut self, item: T, bounds: BoundingArea) {
        self.len += 1;

        let mut index = 0;
        while let Some(first_child) = self.nodes[index].children {
            match self.quadrant_containing(first_child, &bounds) {
                Some(child) => index = child,
                None => break,
            }
        }

        self.nodes[index].items.push((item, bounds));

        if self.nodes[index].children.is_none() && self.should_split(index) {
            self.split(index);
        }
    }

    /// Every item whose bounding area may overlap `area`
    ///
    /// Conservative: may return items that do not overlap, never misses one
    /// that does.
    pub fn retrieve_potential_collisions(&self, area: &BoundingArea) -> Vec<T> {
        let mut results = Vec::new();
        self.retrieve_into(area, &mut results);
        results
    }

    /// Like [`QuadTree::retrieve_potential_collisions`], appending into a
    /// caller-owned buffer
    pub fn retrieve_into(&self, area: &BoundingArea, results: &mut Vec<T>) {
        // The root is always visited: it also holds out-of-bounds items
        let mut stack = vec![0];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            results.extend(node.items.iter().map(|(item, _)| *item));

            if let Some(first_child) = node.children {
                for child in first_child..first_child + 4 {
                    if self.nodes[child].bounds.overlaps(area) {
                        stack.push(child);
                    }
                }
            }
        }
    }

    /// Number of items inserted since the last clear
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no items
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, the root included
    pub fn node_count(&self) -> usize {
        self.active
    }

    /// Deepest live node depth (0 when only the root exists)
    pub fn depth(&self) -> u32 {
        self.nodes[..self.active]
            .iter()
            .map(|node| node.depth)
            .max()
            .unwrap_or(0)
    }

    fn quadrant_containing(&self, first_child: usize, bounds: &BoundingArea) -> Option<usize> {
        (first_child..first_child + 4).find(|&child| self.nodes[child].bounds.contains(bounds))
    }

    fn should_split(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        let half_size = node.bounds.size() * 0.5;

        node.items.len() > self.config.max_items_per_node
            && node.depth < self.config.max_depth.min(MAX_QUAD_TREE_DEPTH)
            && half_size.x >= self.config.min_node_size
            && half_size.y >= self.config.min_node_size
    }

    /// Subdivide a leaf and push down every item that fits a quadrant
    fn split(&mut self, index: usize) {
        let bounds = self.nodes[index].bounds;
        let depth = self.nodes[index].depth + 1;
        let center = bounds.center();

        // Quadrant layout:
        // 0: -X, -Y    1: +X, -Y
        // 2: -X, +Y    3: +X, +Y
        let quadrants = [
            BoundingArea::new(bounds.min, center),
            BoundingArea::new(Vec2::new(center.x, bounds.min.y), Vec2::new(bounds.max.x, center.y)),
            BoundingArea::new(Vec2::new(bounds.min.x, center.y), Vec2::new(center.x, bounds.max.y)),
            BoundingArea::new(center, bounds.max),
        ];

        let first_child = self.allocate_children(quadrants, depth);
        self.nodes[index].children = Some(first_child);

        let mut items = std::mem::take(&mut self.nodes[index].items);
        for (item, item_bounds) in items.drain(..) {
            let target = self.quadrant_containing(first_child, &item_bounds).unwrap_or(index);
            self.nodes[target].items.push((item, item_bounds));
        }

        // Hand the emptied buffer back if nothing stayed behind
        if self.nodes[index].items.is_empty() {
            self.nodes[index].items = items;
        }

        for child in first_child..first_child + 4 {
            if self.should_split(child) {
                self.split(child);
            }
        }
    }

    fn allocate_children(&mut self, quadrants: [BoundingArea; 4], depth: u32) -> usize {
        let first_child = self.active;

        for (offset, bounds) in quadrants.into_iter().enumerate() {
            let slot = first_child + offset;
            if slot < self.nodes.len() {
                self.nodes[slot].reset(bounds, depth);
            } else {
                self.nodes.push(QuadNode::new(bounds, depth));
            }
        }

        self.active += 4;
        first_child
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> QuadTreeConfig {
        QuadTreeConfig {
            bounds: BoundingArea::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0)),
            max_items_per_node: 4,
            max_depth: 4,
            min_node_size: 1.0,
        }
    }

    fn square(x: f32, y: f32, half: f32) -> BoundingArea {
        BoundingArea::from_center_extents(Vec2::new(x, y), Vec2::new(half, half))
    }

    /// Deterministic pseudo-random sequence in [0, 1)
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 40) as f32) / ((1u64 << 24) as f32)
        }
    }

    #[test]
    fn test_validate_rejects_unbounded_subdivision() {
        assert!(QuadTreeConfig::default().validate().is_ok());

        for min_node_size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = QuadTreeConfig {
                min_node_size,
                ..small_config()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }

        let config = QuadTreeConfig {
            max_depth: MAX_QUAD_TREE_DEPTH + 1,
            ..small_config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_coincident_items_stop_at_depth_cap() {
        let config = QuadTreeConfig {
            max_items_per_node: 1,
            max_depth: u32::MAX,
            min_node_size: 0.0,
            ..small_config()
        };
        let mut tree = QuadTree::new(config);
        for id in 0..4u32 {
            tree.insert(id, square(10.0, 10.0, 0.0));
        }

        assert_eq!(tree.depth(), MAX_QUAD_TREE_DEPTH);
        assert_eq!(tree.retrieve_potential_collisions(&square(10.0, 10.0, 0.5)).len(), 4);
    }

    #[test]
    fn test_basic_insertion() {
        let mut tree = QuadTree::new(small_config());
        tree.insert(1u32, square(0.0, 0.0, 1.0));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_subdivides_past_threshold() {
        let mut tree = QuadTree::new(small_config());
        for i in 0..5u32 {
            tree.insert(i, square(50.0 + i as f32, 50.0, 1.0));
        }

        assert_eq!(tree.len(), 5);
        assert!(tree.node_count() > 1);
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn test_straddling_items_stay_in_parent() {
        let mut tree = QuadTree::new(small_config());
        for i in 0..8u32 {
            // Centered on the origin: straddles every split line
            tree.insert(i, square(0.0, 0.0, 1.0 + i as f32));
        }

        assert_eq!(tree.nodes[0].items.len(), 8);
    }

    #[test]
    fn test_query_skips_far_quadrants() {
        let mut tree = QuadTree::new(small_config());
        for i in 0..6u32 {
            tree.insert(i, square(-50.0, -50.0 + i as f32, 1.0));
        }
        tree.insert(100, square(60.0, 60.0, 1.0));

        let near = tree.retrieve_potential_collisions(&square(60.0, 60.0, 5.0));
        assert!(near.contains(&100));
        assert!(near.iter().all(|item| *item == 100));
    }

    #[test]
    fn test_out_of_bounds_items_are_always_candidates() {
        let mut tree = QuadTree::new(small_config());
        tree.insert(7u32, square(500.0, 500.0, 1.0));

        let found = tree.retrieve_potential_collisions(&square(500.0, 500.0, 2.0));
        assert_eq!(found, vec![7]);
    }

    #[test]
    fn test_clear_reuses_node_storage() {
        let mut tree = QuadTree::new(small_config());
        for i in 0..40u32 {
            tree.insert(i, square(-90.0 + 4.0 * i as f32, 10.0, 0.5));
        }
        let pooled = tree.nodes.len();
        assert!(pooled > 1);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.nodes.len(), pooled);
        assert!(tree.retrieve_potential_collisions(&square(0.0, 0.0, 100.0)).is_empty());

        for i in 0..40u32 {
            tree.insert(i, square(-90.0 + 4.0 * i as f32, 10.0, 0.5));
        }
        assert_eq!(tree.nodes.len(), pooled);
        assert_eq!(tree.len(), 40);
    }

    #[test]
    fn test_no_false_negatives() {
        let mut rng = Lcg(42);
        let mut tree = QuadTree::new(small_config());
        let mut items = Vec::new();

        for id in 0..300u32 {
            let area = square(
                rng.next() * 240.0 - 120.0,
                rng.next() * 240.0 - 120.0,
                rng.next() * 10.0,
            );
            tree.insert(id, area);
            items.push((id, area));
        }

        for _ in 0..50 {
            let query = square(rng.next() * 200.0 - 100.0, rng.next() * 200.0 - 100.0, rng.next() * 40.0);
            let candidates = tree.retrieve_potential_collisions(&query);

            for (id, area) in &items {
                if area.overlaps(&query) {
                    assert!(candidates.contains(id), "item {id} overlaps the query but was not returned");
                }
            }
        }
    }
}
