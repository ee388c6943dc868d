//! Depth-first flattening of the scene hierarchy into per-kind instance lists

use crate::foundation::math::{normal_matrix, Mat4};
use crate::scene::document::{CameraId, EnvironmentId, LightId, MaterialId, MeshId, NodeId, NodeKind};
use crate::scene::scene_tree::SceneTree;

/// A mesh placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    /// Node that placed the mesh
    pub node: NodeId,
    /// Referenced mesh
    pub mesh: MeshId,
    /// The mesh's material, if any
    pub material: Option<MaterialId>,
    /// World transform
    pub world: Mat4,
    /// Inverse-transpose of the world transform
    pub normal: Mat4,
}

impl MeshInstance {
    /// Material index for shaders; meshes without a material use 0
    pub fn material_index(&self) -> u32 {
        self.material.map_or(0, |m| m.index() as u32)
    }
}

/// A light placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct LightInstance {
    /// Node that placed the light
    pub node: NodeId,
    /// Referenced light
    pub light: LightId,
    /// World transform
    pub world: Mat4,
}

/// A camera placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInstance {
    /// Node that placed the camera
    pub node: NodeId,
    /// Referenced camera
    pub camera: CameraId,
    /// World transform
    pub world: Mat4,
}

/// An environment probe placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentInstance {
    /// Node that placed the environment
    pub node: NodeId,
    /// Referenced environment
    pub environment: EnvironmentId,
    /// World transform
    pub world: Mat4,
}

/// Flat instance lists, in depth-first order with children in listed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalOutput {
    /// Mesh instances
    pub meshes: Vec<MeshInstance>,
    /// Light instances
    pub lights: Vec<LightInstance>,
    /// Camera instances
    pub cameras: Vec<CameraInstance>,
    /// Environment instances
    pub environments: Vec<EnvironmentInstance>,
}

impl SceneTree {
    /// Walk the scene from its roots and collect every placed object
    ///
    /// Nodes not reachable from a root are skipped.
    pub fn traverse(&mut self) -> TraversalOutput {
        let mut output = TraversalOutput::default();
        for i in 0..self.document().scene.roots.len() {
            let root = self.document().scene.roots[i];
            self.visit(root, &mut output);
        }
        output
    }

    fn visit(&mut self, node: NodeId, output: &mut TraversalOutput) {
        let world = self.world_transform(node);

        match self.document().node(node).kind {
            NodeKind::Group => {}
            NodeKind::Mesh(mesh) => output.meshes.push(MeshInstance {
                node,
                mesh,
                material: self.document().mesh(mesh).material,
                world,
                normal: normal_matrix(&world),
            }),
            NodeKind::Light(light) => output.lights.push(LightInstance { node, light, world }),
            NodeKind::Camera(camera) => output.cameras.push(CameraInstance { node, camera, world }),
            NodeKind::Environment(environment) => {
                output.environments.push(EnvironmentInstance { node, environment, world })
            }
        }

        for i in 0..self.document().node(node).children.len() {
            let child = self.document().node(node).children[i];
            self.visit(child, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat3, Point3, Vec3};
    use crate::scene::bounds::Aabb;
    use crate::scene::document::{DocumentBuilder, MeshDesc, NodeDesc, Perspective};
    use approx::assert_relative_eq;

    fn build_tree() -> SceneTree {
        let doc = DocumentBuilder::new("traversal")
            .material("plastic")
            .mesh(MeshDesc::new("a", 0, 3, Aabb::empty()).with_material("plastic"))
            .mesh(MeshDesc::new("b", 3, 3, Aabb::empty()))
            .light("sun")
            .camera("main", Perspective { aspect: 1.0, vfov: 1.0, near: 0.1, far: Some(10.0) })
            .environment("sky")
            .node(NodeDesc::new("root").with_children(["m1", "group", "cam"]))
            .node(NodeDesc::new("m1").with_mesh("a").with_translation(Vec3::new(1.0, 0.0, 0.0)))
            .node(NodeDesc::new("group").with_scale(Vec3::new(2.0, 2.0, 2.0)).with_children(["m2", "light", "env"]))
            .node(NodeDesc::new("m2").with_mesh("b").with_translation(Vec3::new(0.0, 1.0, 0.0)))
            .node(NodeDesc::new("light").with_light("sun"))
            .node(NodeDesc::new("env").with_environment("sky"))
            .node(NodeDesc::new("cam").with_camera("main"))
            .node(NodeDesc::new("orphan").with_mesh("a"))
            .root("root")
            .build()
            .unwrap();
        SceneTree::new(doc)
    }

    #[test]
    fn test_each_kind_lands_in_its_list() {
        let mut tree = build_tree();
        let output = tree.traverse();

        assert_eq!(output.meshes.len(), 2);
        assert_eq!(output.lights.len(), 1);
        assert_eq!(output.cameras.len(), 1);
        assert_eq!(output.environments.len(), 1);
    }

    #[test]
    fn test_order_follows_child_lists() {
        let mut tree = build_tree();
        let output = tree.traverse();

        let names: Vec<&str> = output
            .meshes
            .iter()
            .map(|m| tree.document().node(m.node).name.as_str())
            .collect();
        assert_eq!(names, vec!["m1", "m2"]);
    }

    #[test]
    fn test_world_transforms_accumulate() {
        let mut tree = build_tree();
        let output = tree.traverse();

        let m2 = &output.meshes[1];
        let origin = m2.world.transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(0.0, 2.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(
            m2.normal.fixed_view::<3, 3>(0, 0).into_owned(),
            Mat3::from_diagonal_element(0.5),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_material_index() {
        let mut tree = build_tree();
        let output = tree.traverse();
        assert_eq!(output.meshes[0].material, Some(MaterialId(0)));
        assert_eq!(output.meshes[1].material, None);
        assert_eq!(output.meshes[1].material_index(), 0);
    }
}
