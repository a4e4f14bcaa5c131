//! Math utilities and types
//!
//! Provides the 2D math types used by the transform hierarchy and culling.
//! Matrices are affine 3x3 in column-vector convention: a point is transformed
//! as `m * [x, y, 1]`, so a child's world matrix is `parent_world * local`.

pub use nalgebra::{Matrix3, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3x3 affine matrix type
pub type Mat3 = Matrix3<f32>;

/// Full turn in radians
pub const TAU: f32 = std::f32::consts::TAU;

/// Wrap an angle in radians into `[0, 2π)`
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }

    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Apply an affine matrix to a point
pub fn transform_point(matrix: &Mat3, point: Vec2) -> Vec2 {
    Vec2::new(
        matrix.m11 * point.x + matrix.m12 * point.y + matrix.m13,
        matrix.m21 * point.x + matrix.m22 * point.y + matrix.m23,
    )
}

/// Position, scale and rotation of a spatial object
///
/// Immutable once constructed: every change produces a new value. The
/// rotation is always normalized to `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    position: Vec2,
    scale: Vec2,
    rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    /// Transform that leaves points unchanged
    pub const IDENTITY: Self = Self {
        position: Vector2::new(0.0, 0.0),
        scale: Vector2::new(1.0, 1.0),
        rotation: 0.0,
    };

    /// Create a transform, normalizing the rotation
    pub fn new(position: Vec2, scale: Vec2, rotation: f32) -> Self {
        Self {
            position,
            scale,
            rotation: normalize_angle(rotation),
        }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Position component
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Scale component
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Rotation in radians, within `[0, 2π)`
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Copy with a different position
    #[must_use]
    pub fn with_position(self, position: Vec2) -> Self {
        Self { position, ..self }
    }

    /// Copy with a different scale
    #[must_use]
    pub fn with_scale(self, scale: Vec2) -> Self {
        Self { scale, ..self }
    }

    /// Copy with a different rotation
    #[must_use]
    pub fn with_rotation(self, rotation: f32) -> Self {
        Self::new(self.position, self.scale, rotation)
    }

    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat3 {
        let (sin, cos) = self.rotation.sin_cos();
        Mat3::new(
            cos * self.scale.x, -sin * self.scale.y, self.position.x,
            sin * self.scale.x, cos * self.scale.y, self.position.y,
            0.0, 0.0, 1.0,
        )
    }

    /// Decompose an affine matrix into position, scale and rotation
    ///
    /// Shear cannot be represented and is dropped. A reflection is carried
    /// by a negative Y scale.
    pub fn from_matrix(matrix: &Mat3) -> Self {
        let position = Vec2::new(matrix.m13, matrix.m23);

        let scale_x = matrix.m11.hypot(matrix.m21);
        let determinant = matrix.m11 * matrix.m22 - matrix.m12 * matrix.m21;

        let (rotation, scale_y) = if scale_x > f32::EPSILON {
            (matrix.m21.atan2(matrix.m11), determinant / scale_x)
        } else {
            // Degenerate X axis: fall back to the Y column for the rotation
            let scale_y = matrix.m12.hypot(matrix.m22);
            ((-matrix.m12).atan2(matrix.m22), scale_y)
        };

        Self::new(position, Vec2::new(scale_x, scale_y), rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_angle_wraps_into_range() {
        assert_relative_eq!(normalize_angle(-FRAC_PI_2), 3.0 * FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(TAU + 1.0), 1.0, epsilon = 1e-5);
        assert_eq!(normalize_angle(TAU), 0.0);
        assert_eq!(normalize_angle(f32::NAN), 0.0);

        let tiny = normalize_angle(-f32::EPSILON * 0.1);
        assert!((0.0..TAU).contains(&tiny));
    }

    #[test]
    fn test_transform_normalizes_rotation() {
        let transform = Transform2D::new(Vec2::zeros(), Vec2::new(1.0, 1.0), -PI);
        assert_relative_eq!(transform.rotation(), PI, epsilon = 1e-5);
    }

    #[test]
    fn test_matrix_applies_scale_then_rotation_then_translation() {
        let transform = Transform2D::new(Vec2::new(10.0, 0.0), Vec2::new(2.0, 2.0), FRAC_PI_2);
        let point = transform_point(&transform.to_matrix(), Vec2::new(1.0, 0.0));

        // (1,0) scaled to (2,0), rotated to (0,2), translated to (10,2)
        assert_relative_eq!(point, Vec2::new(10.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_decompose_recovers_components() {
        let original = Transform2D::new(Vec2::new(3.0, -4.0), Vec2::new(2.0, 0.5), 1.25);
        let decomposed = Transform2D::from_matrix(&original.to_matrix());

        assert_relative_eq!(decomposed.position(), original.position(), epsilon = 1e-5);
        assert_relative_eq!(decomposed.scale(), original.scale(), epsilon = 1e-5);
        assert_relative_eq!(decomposed.rotation(), original.rotation(), epsilon = 1e-5);
    }

    #[test]
    fn test_decompose_keeps_reflection_in_y_scale() {
        let mirrored = Transform2D::new(Vec2::zeros(), Vec2::new(1.0, -1.0), 0.0);
        let decomposed = Transform2D::from_matrix(&mirrored.to_matrix());

        assert_relative_eq!(decomposed.scale(), Vec2::new(1.0, -1.0), epsilon = 1e-5);
        assert_relative_eq!(decomposed.rotation(), 0.0, epsilon = 1e-5);
    }
}
