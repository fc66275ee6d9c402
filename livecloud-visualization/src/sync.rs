//! Instance synchronization
//!
//! Reconciles the current instance collection with a freshly decoded point
//! set. Equal cardinality rewrites transforms in place; any other count
//! builds a replacement collection and swaps it into the scene graph.

use livecloud_core::{Error, InstanceCollection, PointSet, Result, SceneGraph};

/// Which path an apply took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Transforms rewritten in place
    Updated { count: usize },
    /// Collection replaced because the point count changed
    Recreated { previous: usize, count: usize },
}

impl SyncOutcome {
    /// Instance count after the apply
    pub fn count(&self) -> usize {
        match *self {
            SyncOutcome::Updated { count } | SyncOutcome::Recreated { count, .. } => count,
        }
    }
}

/// Counters of applied updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub updates: u64,
    pub recreations: u64,
    pub disposals: u64,
}

/// Owns the current instance collection and applies point sets to it
pub struct InstanceSynchronizer<S: SceneGraph> {
    current: S::Instances,
    radius: f64,
    validate_coordinates: bool,
    stats: SyncStats,
}

impl<S: SceneGraph> InstanceSynchronizer<S> {
    /// Register an empty collection of spheres of `radius` in `scene`
    pub fn new(scene: &mut S, radius: f64) -> Self {
        let current = scene.create_instances(radius, 0);
        scene.add(&current);

        Self {
            current,
            radius,
            validate_coordinates: true,
            stats: SyncStats::default(),
        }
    }

    /// Reject point sets with NaN or infinite coordinates (on by default)
    pub fn with_validation(mut self, validate_coordinates: bool) -> Self {
        self.validate_coordinates = validate_coordinates;
        self
    }

    /// Radius of every sphere this synchronizer allocates
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The collection currently registered in the scene
    pub fn current(&self) -> &S::Instances {
        &self.current
    }

    /// Mutable access for the renderer, which clears the dirty flag on upload
    pub fn current_mut(&mut self) -> &mut S::Instances {
        &mut self.current
    }

    /// Counters of applied updates so far
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Apply `points` to the current collection.
    ///
    /// On error nothing has been modified.
    pub fn apply(&mut self, scene: &mut S, points: &PointSet) -> Result<SyncOutcome> {
        if self.validate_coordinates {
            if let Some((index, point)) = points.first_non_finite() {
                return Err(Error::InvalidCoordinate {
                    index,
                    x: point.x,
                    y: point.y,
                    z: point.z,
                });
            }
        }

        let previous = self.current.count();
        if points.len() == previous {
            write_translations(&mut self.current, points);
            self.current.mark_dirty();
            self.stats.updates += 1;
            return Ok(SyncOutcome::Updated { count: previous });
        }

        let mut replacement = scene.create_instances(self.radius, points.len());
        write_translations(&mut replacement, points);

        scene.remove(&self.current);
        let mut retired = std::mem::replace(&mut self.current, replacement);
        retired.dispose();
        scene.add(&self.current);

        self.stats.recreations += 1;
        self.stats.disposals += 1;
        log::debug!("Recreated instances: {} -> {}", previous, points.len());

        Ok(SyncOutcome::Recreated {
            previous,
            count: points.len(),
        })
    }

    /// Remove the current collection from `scene` and dispose it
    pub fn release(mut self, scene: &mut S) -> SyncStats {
        scene.remove(&self.current);
        self.current.dispose();
        self.stats.disposals += 1;
        self.stats
    }
}

fn write_translations<I: InstanceCollection>(instances: &mut I, points: &PointSet) {
    for (index, point) in points.iter().enumerate() {
        instances.set_transform_at(index, &point.coords);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{InstancedSpheres, Scene, SphereStyle};
    use livecloud_core::Vector3d;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct MockState {
        translations: Vec<Vector3d>,
        dirty_marks: usize,
        disposals: usize,
    }

    struct MockInstances {
        id: usize,
        state: Rc<RefCell<MockState>>,
    }

    impl InstanceCollection for MockInstances {
        fn count(&self) -> usize {
            self.state.borrow().translations.len()
        }

        fn set_transform_at(&mut self, index: usize, translation: &Vector3d) {
            self.state.borrow_mut().translations[index] = *translation;
        }

        fn mark_dirty(&mut self) {
            self.state.borrow_mut().dirty_marks += 1;
        }

        fn dispose(&mut self) {
            self.state.borrow_mut().disposals += 1;
        }
    }

    #[derive(Default)]
    struct MockScene {
        created: Vec<Rc<RefCell<MockState>>>,
        members: Vec<usize>,
    }

    impl SceneGraph for MockScene {
        type Instances = MockInstances;

        fn create_instances(&mut self, _radius: f64, count: usize) -> MockInstances {
            let state = Rc::new(RefCell::new(MockState {
                translations: vec![Vector3d::zeros(); count],
                ..Default::default()
            }));
            self.created.push(state.clone());
            MockInstances {
                id: self.created.len() - 1,
                state,
            }
        }

        fn add(&mut self, instances: &MockInstances) {
            self.members.push(instances.id);
        }

        fn remove(&mut self, instances: &MockInstances) {
            self.members.retain(|id| *id != instances.id);
        }
    }

    fn points(triples: Vec<[f64; 3]>) -> PointSet {
        PointSet::from(triples)
    }

    fn translation_at(instances: &InstancedSpheres, index: usize) -> Vector3d {
        instances.transform_at(index).unwrap().translation_part()
    }

    #[test]
    fn test_starts_with_registered_empty_collection() {
        let mut scene = MockScene::default();
        let sync = InstanceSynchronizer::new(&mut scene, 0.1);

        assert_eq!(sync.current().count(), 0);
        assert_eq!(scene.members, vec![0]);
    }

    #[test]
    fn test_apply_to_empty_collection() {
        let mut scene = Scene::new(SphereStyle::default());
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1);

        let update = points(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let outcome = sync.apply(&mut scene, &update).unwrap();
        assert_eq!(outcome, SyncOutcome::Recreated { previous: 0, count: 2 });

        let current = sync.current();
        assert_eq!(current.count(), 2);
        assert_eq!(translation_at(current, 0), Vector3d::new(1.0, 2.0, 3.0));
        assert_eq!(translation_at(current, 1), Vector3d::new(4.0, 5.0, 6.0));
        assert!(scene.contains(current.id()));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_same_cardinality_updates_in_place() {
        let mut scene = MockScene::default();
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1);
        sync.apply(&mut scene, &points(vec![[0.0; 3], [0.0; 3], [0.0; 3]])).unwrap();
        let allocations = scene.created.len();

        let update = points(vec![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]);
        let outcome = sync.apply(&mut scene, &update).unwrap();

        assert_eq!(outcome, SyncOutcome::Updated { count: 3 });
        assert_eq!(scene.created.len(), allocations);

        let state = sync.current().state.borrow();
        assert_eq!(state.dirty_marks, 1);
        for (index, point) in update.iter().enumerate() {
            assert_eq!(state.translations[index], point.coords);
        }
    }

    #[test]
    fn test_cardinality_change_disposes_old_exactly_once() {
        let mut scene = MockScene::default();
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1);
        sync.apply(&mut scene, &points(vec![[1.0; 3], [2.0; 3]])).unwrap();
        let old = scene.created[1].clone();

        let outcome = sync.apply(&mut scene, &points(vec![[1.0; 3], [2.0; 3], [3.0; 3]])).unwrap();
        assert_eq!(outcome, SyncOutcome::Recreated { previous: 2, count: 3 });
        assert_eq!(sync.current().count(), 3);
        assert_eq!(old.borrow().disposals, 1);
        assert_eq!(scene.members, vec![2]);

        // Further in-place updates never touch the retired collection
        sync.apply(&mut scene, &points(vec![[0.0; 3], [0.0; 3], [0.0; 3]])).unwrap();
        assert_eq!(old.borrow().disposals, 1);
        assert_eq!(sync.stats(), SyncStats { updates: 1, recreations: 2, disposals: 2 });
    }

    #[test]
    fn test_empty_point_set() {
        let mut scene = Scene::default();
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1);

        let outcome = sync.apply(&mut scene, &PointSet::new()).unwrap();
        assert_eq!(outcome, SyncOutcome::Updated { count: 0 });

        sync.apply(&mut scene, &points(vec![[1.0; 3]])).unwrap();
        let outcome = sync.apply(&mut scene, &PointSet::new()).unwrap();
        assert_eq!(outcome, SyncOutcome::Recreated { previous: 1, count: 0 });
        assert_eq!(sync.current().count(), 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_invalid_coordinate_leaves_collection_untouched() {
        let mut scene = Scene::default();
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1);
        sync.apply(&mut scene, &points(vec![[1.0, 2.0, 3.0]])).unwrap();
        let id = sync.current().id();
        let version = sync.current().version();

        let result = sync.apply(&mut scene, &points(vec![[f64::NAN, 0.0, 0.0]]));
        assert!(matches!(result, Err(Error::InvalidCoordinate { index: 0, .. })));

        let result = sync.apply(&mut scene, &points(vec![[0.0; 3], [0.0, f64::INFINITY, 0.0]]));
        assert!(matches!(result, Err(Error::InvalidCoordinate { index: 1, .. })));

        assert_eq!(sync.current().id(), id);
        assert_eq!(sync.current().version(), version);
        assert_eq!(translation_at(sync.current(), 0), Vector3d::new(1.0, 2.0, 3.0));
        assert_eq!(scene.stats().allocations, 2);
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let mut scene = Scene::default();
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1).with_validation(false);

        let outcome = sync.apply(&mut scene, &points(vec![[f64::NAN, 0.0, 0.0]])).unwrap();
        assert_eq!(outcome.count(), 1);
    }

    #[test]
    fn test_release_removes_and_disposes() {
        let mut scene = MockScene::default();
        let mut sync = InstanceSynchronizer::new(&mut scene, 0.1);
        sync.apply(&mut scene, &points(vec![[1.0; 3]])).unwrap();
        let current = scene.created[1].clone();

        let stats = sync.release(&mut scene);
        assert!(scene.members.is_empty());
        assert_eq!(current.borrow().disposals, 1);
        assert_eq!(stats.disposals, 2);
    }
}
