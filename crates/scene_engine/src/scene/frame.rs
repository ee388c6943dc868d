//! Per-frame scene preparation: animate, flatten, bound and cull

use log::trace;

use crate::foundation::math::Mat4;
use crate::scene::culling::{cull_meshes, InstanceData};
use crate::scene::frustum::Frustum;
use crate::scene::scene_tree::SceneTree;
use crate::scene::traversal::{CameraInstance, EnvironmentInstance, LightInstance, MeshInstance};

/// Everything the renderer needs from the scene for one frame
#[derive(Debug, Clone, Default)]
pub struct PreparedFrame {
    /// Mesh instances that survived culling, in traversal order
    pub visible_meshes: Vec<MeshInstance>,
    /// Number of mesh instances before culling
    pub total_meshes: usize,
    /// Placed lights
    pub lights: Vec<LightInstance>,
    /// Placed cameras
    pub cameras: Vec<CameraInstance>,
    /// Placed environment probes
    pub environments: Vec<EnvironmentInstance>,
}

impl PreparedFrame {
    /// GPU records for the visible meshes
    pub fn instance_data(&self) -> Vec<InstanceData> {
        self.visible_meshes.iter().map(InstanceData::new).collect()
    }
}

impl SceneTree {
    /// Run one frame of scene work at animation time `time`
    ///
    /// Drivers are applied first, then the hierarchy is flattened, world
    /// bounds are brought up to date, and mesh instances are culled against
    /// the frustum of `view_projection`.
    pub fn prepare_frame(&mut self, time: f32, view_projection: &Mat4) -> PreparedFrame {
        self.update_animation(time);
        let output = self.traverse();
        self.update_aabbs();

        let frustum = Frustum::from_view_projection(view_projection);
        let visible_meshes = cull_meshes(self.document(), &output.meshes, &frustum);
        trace!("Prepared frame: {}/{} meshes visible", visible_meshes.len(), output.meshes.len());

        PreparedFrame {
            total_meshes: output.meshes.len(),
            visible_meshes,
            lights: output.lights,
            cameras: output.cameras,
            environments: output.environments,
        }
    }
}
