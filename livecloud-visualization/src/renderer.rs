//! Rendering backends

use crate::scene::{InstanceRaw, InstancedSpheres, Scene};
use livecloud_core::{InstanceCollection, Result};

/// Draws the current instances of a scene once per frame
pub trait Renderer {
    /// Render one frame, uploading the instance transforms if they are dirty
    fn render(&mut self, scene: &Scene, instances: &mut InstancedSpheres) -> Result<()>;
}

/// Renderer without a surface; records what a GPU backend would receive
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
    uploads: u64,
    uploaded_bytes: u64,
    drawn_instances: usize,
    last_upload: Vec<InstanceRaw>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rendered frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of instance buffer uploads
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Total size of all uploads in bytes
    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes
    }

    /// Instances drawn in the last frame
    pub fn drawn_instances(&self) -> usize {
        self.drawn_instances
    }

    /// Contents of the most recent upload
    pub fn last_upload(&self) -> &[InstanceRaw] {
        &self.last_upload
    }

    /// Most recent upload as raw bytes
    pub fn last_upload_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.last_upload)
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &Scene, instances: &mut InstancedSpheres) -> Result<()> {
        self.frames += 1;

        if !scene.contains(instances.id()) {
            self.drawn_instances = 0;
            return Ok(());
        }

        if let Some(upload) = instances.take_upload() {
            self.uploads += 1;
            self.uploaded_bytes += std::mem::size_of_val(upload.as_slice()) as u64;
            self.last_upload = upload;
        }
        self.drawn_instances = instances.count();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecloud_core::{SceneGraph, Vector3d};

    #[test]
    fn test_uploads_only_dirty_buffers() {
        let mut scene = Scene::default();
        let mut spheres = scene.create_instances(0.1, 2);
        scene.add(&spheres);
        let mut renderer = HeadlessRenderer::new();

        renderer.render(&scene, &mut spheres).unwrap();
        renderer.render(&scene, &mut spheres).unwrap();
        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.uploads(), 1);
        assert_eq!(renderer.drawn_instances(), 2);

        spheres.set_transform_at(0, &Vector3d::new(1.0, 2.0, 3.0));
        spheres.mark_dirty();
        renderer.render(&scene, &mut spheres).unwrap();

        assert_eq!(renderer.uploads(), 2);
        assert_eq!(renderer.uploaded_bytes(), 2 * 2 * 64);
        assert_eq!(renderer.last_upload()[0].model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(renderer.last_upload_bytes().len(), 128);
    }

    #[test]
    fn test_skips_instances_outside_scene() {
        let mut scene = Scene::default();
        let mut spheres = scene.create_instances(0.1, 5);
        let mut renderer = HeadlessRenderer::new();

        renderer.render(&scene, &mut spheres).unwrap();
        assert_eq!(renderer.uploads(), 0);
        assert_eq!(renderer.drawn_instances(), 0);
        assert!(spheres.is_dirty());
    }
}
