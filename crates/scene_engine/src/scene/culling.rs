//! Frustum culling of mesh instances and their GPU representation

use crate::foundation::math::to_cols_array;
use crate::scene::document::SceneDocument;
use crate::scene::frustum::Frustum;
use crate::scene::traversal::MeshInstance;

/// Per-instance data uploaded to the instance storage buffer
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceData {
    /// Model transformation matrix (4×4 column-major)
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix (4×4 column-major)
    pub normal: [[f32; 4]; 4],
    /// Index of the mesh record
    pub mesh_index: u32,
    /// Index of the material, 0 when the mesh has none
    pub material_index: u32,
    /// Padding to a 16-byte multiple
    pub _padding: [u32; 2],
}

unsafe impl bytemuck::Pod for InstanceData {}
unsafe impl bytemuck::Zeroable for InstanceData {}

impl InstanceData {
    /// Byte size of one instance record
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Pack a mesh instance
    pub fn new(instance: &MeshInstance) -> Self {
        Self {
            model: to_cols_array(&instance.world),
            normal: to_cols_array(&instance.normal),
            mesh_index: instance.mesh.index() as u32,
            material_index: instance.material_index(),
            _padding: [0; 2],
        }
    }
}

impl From<&MeshInstance> for InstanceData {
    fn from(instance: &MeshInstance) -> Self {
        Self::new(instance)
    }
}

/// Keep the mesh instances whose world-space bounds intersect the frustum
///
/// Bounds are the mesh's local box with all eight corners moved by the
/// instance's world matrix.
pub fn cull_meshes(document: &SceneDocument, meshes: &[MeshInstance], frustum: &Frustum) -> Vec<MeshInstance> {
    meshes
        .iter()
        .filter(|instance| {
            let world_box = document.mesh(instance.mesh).local_aabb.transformed(&instance.world);
            frustum.intersects_aabb(&world_box)
        })
        .cloned()
        .collect()
}
