//! Core data structures and traits for livecloud
//! 
//! This crate provides the fundamental types of the streamed point cloud
//! pipeline: points, point sets, instance transforms, the error type, and
//! the traits a rendering backend implements to receive instance updates.

pub mod point;
pub mod point_set;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_set::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
