//! Axis-aligned bounding areas

use serde::{Deserialize, Serialize};

use crate::foundation::math::{transform_point, Mat3, Vec2, Vector2};

/// Axis-aligned bounding box in world units
///
/// An area whose `min` exceeds its `max` on either axis is empty: it
/// contains nothing and overlaps nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingArea {
    /// Minimum corner of the bounding box
    pub min: Vec2,
    /// Maximum corner of the bounding box
    pub max: Vec2,
}

impl Default for BoundingArea {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingArea {
    /// The empty area, identity for [`BoundingArea::combine`]
    pub const EMPTY: Self = Self {
        min: Vector2::new(f32::INFINITY, f32::INFINITY),
        max: Vector2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Create an area from min and max points
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create an area centered at a point with given half extents
    pub fn from_center_extents(center: Vec2, extents: Vec2) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest area containing every point (empty for no points)
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        points.into_iter().fold(Self::EMPTY, |area, point| Self {
            min: area.min.inf(&point),
            max: area.max.sup(&point),
        })
    }

    /// Whether the area contains nothing
    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }

    /// Get the center of the area
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the area
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Full width and height
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if this area contains a point (edges inclusive)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check if this area fully contains another, non-empty area
    pub fn contains(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() &&
        other.min.x >= self.min.x && other.max.x <= self.max.x &&
        other.min.y >= self.min.y && other.max.y <= self.max.y
    }

    /// Check if this area overlaps another (touching edges count)
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() &&
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Smallest area containing both
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Axis-aligned hull of this area after applying an affine matrix
    #[must_use]
    pub fn transform(&self, matrix: &Mat3) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }

        let corners = [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ];
        Self::from_points(corners.iter().map(|corner| transform_point(matrix, *corner)))
    }
}
