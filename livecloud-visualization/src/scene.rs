//! Scene graph and instanced sphere storage
//!
//! [`Scene`] is the in-memory render graph: it allocates [`InstancedSpheres`]
//! and tracks which collections are registered for drawing. Each collection
//! keeps one transform per instance plus a dirty flag the renderer clears
//! when it uploads the transform buffer.

use bytemuck::{Pod, Zeroable};
use livecloud_core::{InstanceCollection, SceneGraph, Transform3D, Vector3d};
use serde::{Deserialize, Serialize};

/// Template shared by every sphere of a collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereStyle {
    pub radius: f64,
    pub width_segments: u32,
    pub height_segments: u32,
    /// 0xRRGGBB
    pub color: u32,
}

impl Default for SphereStyle {
    fn default() -> Self {
        Self {
            radius: 0.1,
            width_segments: 16,
            height_segments: 16,
            color: 0xffff00,
        }
    }
}

/// UV sphere geometry description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereGeometry {
    pub radius: f64,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl SphereGeometry {
    /// Number of vertices of the tessellated sphere
    pub fn vertex_count(&self) -> usize {
        (self.width_segments as usize + 1) * (self.height_segments as usize + 1)
    }
}

/// Phong material with a single diffuse color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub color: [f32; 3],
}

impl PhongMaterial {
    /// Material from a 0xRRGGBB color
    pub fn from_hex(color: u32) -> Self {
        let channel = |shift: u32| ((color >> shift) & 0xff) as f32 / 255.0;
        Self {
            color: [channel(16), channel(8), channel(0)],
        }
    }
}

/// Per-instance data as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
}

impl From<&Transform3D> for InstanceRaw {
    fn from(transform: &Transform3D) -> Self {
        Self {
            model: transform.to_cols_f32(),
        }
    }
}

/// Identifies a collection within its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstancesId(u64);

/// A fixed-size collection of spheres sharing geometry and material
#[derive(Debug)]
pub struct InstancedSpheres {
    id: InstancesId,
    geometry: Option<SphereGeometry>,
    material: Option<PhongMaterial>,
    transforms: Vec<Transform3D>,
    dirty: bool,
    version: u64,
}

impl InstancedSpheres {
    fn new(
        id: InstancesId,
        geometry: SphereGeometry,
        material: PhongMaterial,
        count: usize,
    ) -> Self {
        Self {
            id,
            geometry: Some(geometry),
            material: Some(material),
            transforms: vec![Transform3D::identity(); count],
            // A fresh buffer has never been uploaded
            dirty: true,
            version: 0,
        }
    }

    pub fn id(&self) -> InstancesId {
        self.id
    }

    /// Sphere geometry, `None` once disposed
    pub fn geometry(&self) -> Option<&SphereGeometry> {
        self.geometry.as_ref()
    }

    /// Sphere material, `None` once disposed
    pub fn material(&self) -> Option<&PhongMaterial> {
        self.material.as_ref()
    }

    pub fn transforms(&self) -> &[Transform3D] {
        &self.transforms
    }

    pub fn transform_at(&self, index: usize) -> Option<&Transform3D> {
        self.transforms.get(index)
    }

    /// Whether the transform buffer changed since the last upload
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of times the buffer was marked dirty after creation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_disposed(&self) -> bool {
        self.geometry.is_none()
    }

    /// Take the transform buffer for upload if it is dirty, clearing the flag
    pub fn take_upload(&mut self) -> Option<Vec<InstanceRaw>> {
        if !self.dirty || self.is_disposed() {
            return None;
        }
        self.dirty = false;
        Some(self.transforms.iter().map(InstanceRaw::from).collect())
    }
}

impl InstanceCollection for InstancedSpheres {
    fn count(&self) -> usize {
        self.transforms.len()
    }

    fn set_transform_at(&mut self, index: usize, translation: &Vector3d) {
        self.transforms[index] = Transform3D::translation(translation);
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.version += 1;
    }

    fn dispose(&mut self) {
        if self.geometry.take().is_none() {
            log::warn!("Instances {:?} disposed twice", self.id);
            return;
        }
        self.material = None;
        self.transforms = Vec::new();
        self.dirty = false;
    }
}

/// Allocation and membership counters of a scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub allocations: u64,
    pub additions: u64,
    pub removals: u64,
}

/// In-memory render graph of instanced sphere collections
#[derive(Debug, Default)]
pub struct Scene {
    style: SphereStyle,
    members: Vec<InstancesId>,
    next_id: u64,
    stats: SceneStats,
}

impl Scene {
    /// Create an empty scene whose collections use `style`
    pub fn new(style: SphereStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    /// Template for spheres allocated by this scene
    pub fn style(&self) -> &SphereStyle {
        &self.style
    }

    /// Whether the collection is registered for drawing
    pub fn contains(&self, id: InstancesId) -> bool {
        self.members.contains(&id)
    }

    /// Registered collections, in registration order
    pub fn members(&self) -> &[InstancesId] {
        &self.members
    }

    /// Number of registered collections
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if no collection is registered
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }
}

impl SceneGraph for Scene {
    type Instances = InstancedSpheres;

    fn create_instances(&mut self, radius: f64, count: usize) -> InstancedSpheres {
        let id = InstancesId(self.next_id);
        self.next_id += 1;
        self.stats.allocations += 1;

        let geometry = SphereGeometry {
            radius,
            width_segments: self.style.width_segments,
            height_segments: self.style.height_segments,
        };
        InstancedSpheres::new(id, geometry, PhongMaterial::from_hex(self.style.color), count)
    }

    fn add(&mut self, instances: &InstancedSpheres) {
        if self.contains(instances.id()) {
            log::warn!("Instances {:?} already in scene", instances.id());
            return;
        }
        self.members.push(instances.id());
        self.stats.additions += 1;
    }

    fn remove(&mut self, instances: &InstancedSpheres) {
        match self.members.iter().position(|id| *id == instances.id()) {
            Some(position) => {
                self.members.remove(position);
                self.stats.removals += 1;
            }
            None => log::warn!("Instances {:?} not in scene", instances.id()),
        }
    }
}
