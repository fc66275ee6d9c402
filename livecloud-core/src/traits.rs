//! Core traits for livecloud

use crate::{point::*, point_set::*};

/// A renderable collection of individually positioned copies of one shape.
///
/// The collection's size is fixed at creation; a different number of points
/// requires a new collection from [`SceneGraph::create_instances`].
pub trait InstanceCollection {
    /// Number of instances in the collection
    fn count(&self) -> usize;

    /// Overwrite the transform of instance `index` with a pure translation
    fn set_transform_at(&mut self, index: usize, translation: &Vector3d);

    /// Flag the transform buffer for upload on the next rendered frame
    fn mark_dirty(&mut self);

    /// Release geometry, material and transform storage
    fn dispose(&mut self);
}

/// The render graph instance collections are registered in
pub trait SceneGraph {
    type Instances: InstanceCollection;

    /// Allocate a detached collection of `count` spheres of `radius`.
    /// Every transform starts as the identity.
    fn create_instances(&mut self, radius: f64, count: usize) -> Self::Instances;

    /// Register a collection so it is drawn
    fn add(&mut self, instances: &Self::Instances);

    /// Deregister a collection
    fn remove(&mut self, instances: &Self::Instances);
}

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3d, Point3d);

    /// Get the center point of the object
    fn center(&self) -> Point3d {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl Drawable for PointSet {
    fn bounding_box(&self) -> (Point3d, Point3d) {
        let mut finite = self.iter().filter(|p| is_finite_point(p));
        let Some(first) = finite.next() else {
            return (Point3d::origin(), Point3d::origin());
        };

        let mut min = *first;
        let mut max = *first;

        for p in finite {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        (min, max)
    }
}
