//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Whether all three coordinates of `point` are finite
pub fn is_finite_point(point: &Point3d) -> bool {
    point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
}
