//! Instance transformation utilities

use crate::point::Vector3d;
use nalgebra::Matrix4;

/// A per-instance transformation stored as a homogeneous 4x4 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub matrix: Matrix4<f64>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: &Vector3d) -> Self {
        Self {
            matrix: Matrix4::new_translation(translation),
        }
    }

    /// Get the translation component
    pub fn translation_part(&self) -> Vector3d {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Column-major single precision matrix, the layout GPUs consume
    pub fn to_cols_f32(&self) -> [[f32; 4]; 4] {
        self.matrix.cast::<f32>().into()
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3d;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_roundtrip() {
        let t = Transform3D::translation(&Vector3d::new(1.0, 2.0, 3.0));
        assert_eq!(t.translation_part(), Vector3d::new(1.0, 2.0, 3.0));

        let moved = t.matrix.transform_point(&Point3d::origin());
        assert_relative_eq!(moved, Point3d::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Transform3D::default(), Transform3D::identity());
        assert_eq!(Transform3D::default().translation_part(), Vector3d::zeros());
    }

    #[test]
    fn test_translation_has_no_rotation_or_scale() {
        let t = Transform3D::translation(&Vector3d::new(-4.0, 0.5, 9.0));
        let linear = t.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        assert_eq!(linear, nalgebra::Matrix3::identity());
    }

    #[test]
    fn test_to_cols_f32_is_column_major() {
        let t = Transform3D::translation(&Vector3d::new(1.0, 2.0, 3.0));
        let cols = t.to_cols_f32();
        assert_eq!(cols[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(cols[0], [1.0, 0.0, 0.0, 0.0]);
    }
}
