//! Scene document: the immutable node/driver/mesh tables the scene tree runs on
//!
//! Every cross reference inside a [`SceneDocument`] is a typed index into one
//! of its flat tables. Names only exist at construction time: a
//! [`DocumentBuilder`] resolves them once and rejects malformed input, so the
//! scene tree can trust the guarantees below without re-checking them.
//!
//! - node, mesh, material, light, camera and environment names are unique
//!   within their category
//! - every reference resolves
//! - each node has at most one parent and the hierarchy is acyclic
//! - driver keyframe times are non-decreasing and
//!   `values.len() == times.len() * channel.arity()`

use std::collections::HashMap;

use thiserror::Error;

use crate::foundation::math::{LocalTransform, Quat, Vec3};
use crate::scene::bounds::Aabb;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position in the owning table
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

define_id!(
    /// Index of a node in [`SceneDocument::nodes`]
    NodeId
);
define_id!(
    /// Index of a mesh in [`SceneDocument::meshes`]
    MeshId
);
define_id!(
    /// Index of a material in [`SceneDocument::materials`]
    MaterialId
);
define_id!(
    /// Index of a light in [`SceneDocument::lights`]
    LightId
);
define_id!(
    /// Index of a camera in [`SceneDocument::cameras`]
    CameraId
);
define_id!(
    /// Index of an environment in [`SceneDocument::environments`]
    EnvironmentId
);

/// Errors raised while building a scene document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Two objects of the same category share a name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// Object category
        kind: &'static str,
        /// The repeated name
        name: String,
    },

    /// A reference names an object that does not exist
    #[error("{owner} references unknown {kind} '{name}'")]
    UnknownReference {
        /// Category of the missing object
        kind: &'static str,
        /// The unresolved name
        name: String,
        /// Object holding the reference
        owner: String,
    },

    /// A node is listed as the child of more than one parent
    #[error("node '{node}' has more than one parent")]
    MultipleParents {
        /// Offending node
        node: String,
    },

    /// A scene root is also some node's child
    #[error("scene root '{node}' is also listed as a child")]
    RootHasParent {
        /// Offending node
        node: String,
    },

    /// The parent chain of a node loops back on itself
    #[error("node hierarchy contains a cycle through '{node}'")]
    Cycle {
        /// A node on the cycle
        node: String,
    },

    /// A driver's value buffer does not match its key count
    #[error("driver '{driver}' has {values} values for {keys} keys of arity {arity}")]
    ArityMismatch {
        /// Driver name
        driver: String,
        /// Number of floats supplied
        values: usize,
        /// Number of keyframes
        keys: usize,
        /// Floats per keyframe for the channel
        arity: usize,
    },

    /// Keyframe times decrease somewhere
    #[error("driver '{driver}' keyframe times decrease at key {index}")]
    NonMonotonicTimes {
        /// Driver name
        driver: String,
        /// First key whose time is smaller than its predecessor
        index: usize,
    },

    /// A keyframe time is NaN or infinite
    #[error("driver '{driver}' keyframe {index} has a non-finite time")]
    NonFiniteTime {
        /// Driver name
        driver: String,
        /// Offending key
        index: usize,
    },

    /// The scene lists no roots
    #[error("scene '{0}' has no root nodes")]
    EmptyScene(String),
}

/// Result type for document construction
pub type SceneResult<T> = Result<T, SceneError>;

/// The single semantic role a node plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Pure transform grouping node
    #[default]
    Group,
    /// Instances a mesh
    Mesh(MeshId),
    /// Places a light
    Light(LightId),
    /// Places a camera
    Camera(CameraId),
    /// Places an environment probe
    Environment(EnvironmentId),
}

/// Scene graph node
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique node name
    pub name: String,
    /// Local translation/rotation/scale relative to the parent
    pub local: LocalTransform,
    /// Children in traversal order
    pub children: Vec<NodeId>,
    /// Referenced object
    pub kind: NodeKind,
}

/// Animated property of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Local translation, 3 floats per key
    Translation,
    /// Local rotation as an `(x, y, z, w)` quaternion, 4 floats per key
    Rotation,
    /// Local scale, 3 floats per key
    Scale,
}

impl Channel {
    /// Floats per keyframe
    pub fn arity(self) -> usize {
        match self {
            Channel::Translation | Channel::Scale => 3,
            Channel::Rotation => 4,
        }
    }
}

/// Keyframe interpolation mode
///
/// Rotation channels always slerp. Translation and scale channels only
/// interpolate in `Linear` mode; every other mode holds the left keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Hold the previous keyframe
    Step,
    /// Linear interpolation
    #[default]
    Linear,
    /// Spherical interpolation
    Slerp,
}

/// Keyframed animation of one node channel
#[derive(Debug, Clone)]
pub struct Driver {
    /// Driver name
    pub name: String,
    /// Animated node
    pub node: NodeId,
    /// Animated property
    pub channel: Channel,
    /// Non-decreasing keyframe times in seconds
    pub times: Vec<f32>,
    /// Flat keyframe values, `channel.arity()` floats per key
    pub values: Vec<f32>,
    /// Interpolation mode
    pub interpolation: Interpolation,
}

/// Mesh record as exposed by the loader
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Unique mesh name
    pub name: String,
    /// First vertex in the shared vertex buffer
    pub first_vertex: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// Material, if any
    pub material: Option<MaterialId>,
    /// Bounds in mesh-local space
    pub local_aabb: Aabb,
}

/// Material record
#[derive(Debug, Clone)]
pub struct Material {
    /// Unique material name
    pub name: String,
}

/// Light record
#[derive(Debug, Clone)]
pub struct Light {
    /// Unique light name
    pub name: String,
}

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Width over height
    pub aspect: f32,
    /// Vertical field of view in radians
    pub vfov: f32,
    /// Near clipping distance
    pub near: f32,
    /// Far clipping distance, unbounded when absent
    pub far: Option<f32>,
}

/// Camera record
#[derive(Debug, Clone)]
pub struct CameraDesc {
    /// Unique camera name
    pub name: String,
    /// Projection parameters
    pub perspective: Perspective,
}

/// Environment probe record
#[derive(Debug, Clone)]
pub struct Environment {
    /// Unique environment name
    pub name: String,
}

/// Traversal entry points
#[derive(Debug, Clone)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Root nodes in traversal order
    pub roots: Vec<NodeId>,
}

/// Validated, index-linked scene description
#[derive(Debug, Clone)]
pub struct SceneDocument {
    /// Node table
    pub nodes: Vec<Node>,
    /// Animation drivers
    pub drivers: Vec<Driver>,
    /// Mesh table
    pub meshes: Vec<Mesh>,
    /// Material table
    pub materials: Vec<Material>,
    /// Light table
    pub lights: Vec<Light>,
    /// Camera table
    pub cameras: Vec<CameraDesc>,
    /// Environment table
    pub environments: Vec<Environment>,
    /// The scene's root set
    pub scene: Scene,
    node_names: HashMap<String, NodeId>,
    mesh_names: HashMap<String, MeshId>,
    camera_names: HashMap<String, CameraId>,
}

impl SceneDocument {
    /// Resolve a node name
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_names.get(name).copied()
    }

    /// Resolve a mesh name
    pub fn mesh_by_name(&self, name: &str) -> Option<MeshId> {
        self.mesh_names.get(name).copied()
    }

    /// Resolve a camera name
    pub fn camera_by_name(&self, name: &str) -> Option<CameraId> {
        self.camera_names.get(name).copied()
    }

    /// Node record
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Mesh record
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    /// Camera record
    pub fn camera(&self, id: CameraId) -> &CameraDesc {
        &self.cameras[id.0]
    }

    /// Latest keyframe time across all drivers, or zero without animation
    pub fn animation_duration(&self) -> f32 {
        self.drivers
            .iter()
            .filter_map(|driver| driver.times.last().copied())
            .fold(0.0, f32::max)
    }
}

/// What a [`NodeDesc`] refers to, by name
#[derive(Debug, Clone, Default)]
enum NodeRef {
    #[default]
    None,
    Mesh(String),
    Light(String),
    Camera(String),
    Environment(String),
}

/// Name-based node description consumed by [`DocumentBuilder`]
#[derive(Debug, Clone)]
pub struct NodeDesc {
    name: String,
    local: LocalTransform,
    children: Vec<String>,
    reference: NodeRef,
}

impl NodeDesc {
    /// Create an identity grouping node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: LocalTransform::identity(),
            children: Vec::new(),
            reference: NodeRef::None,
        }
    }

    /// Set the full local transform
    pub fn with_transform(mut self, local: LocalTransform) -> Self {
        self.local = local;
        self
    }

    /// Set the local translation
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.local.translation = translation;
        self
    }

    /// Set the local rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.local.rotation = rotation;
        self
    }

    /// Set the local scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.local.scale = scale;
        self
    }

    /// Append children by name
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Make this a mesh node
    pub fn with_mesh(mut self, mesh: impl Into<String>) -> Self {
        self.reference = NodeRef::Mesh(mesh.into());
        self
    }

    /// Make this a light node
    pub fn with_light(mut self, light: impl Into<String>) -> Self {
        self.reference = NodeRef::Light(light.into());
        self
    }

    /// Make this a camera node
    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.reference = NodeRef::Camera(camera.into());
        self
    }

    /// Make this an environment node
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.reference = NodeRef::Environment(environment.into());
        self
    }
}

/// Name-based mesh description consumed by [`DocumentBuilder`]
#[derive(Debug, Clone)]
pub struct MeshDesc {
    name: String,
    first_vertex: u32,
    vertex_count: u32,
    material: Option<String>,
    local_aabb: Aabb,
}

impl MeshDesc {
    /// Describe a mesh occupying `vertex_count` vertices from `first_vertex`
    pub fn new(name: impl Into<String>, first_vertex: u32, vertex_count: u32, local_aabb: Aabb) -> Self {
        Self {
            name: name.into(),
            first_vertex,
            vertex_count,
            material: None,
            local_aabb,
        }
    }

    /// Assign a material by name
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

/// Name-based driver description consumed by [`DocumentBuilder`]
#[derive(Debug, Clone)]
pub struct DriverDesc {
    name: String,
    node: String,
    channel: Channel,
    times: Vec<f32>,
    values: Vec<f32>,
    interpolation: Interpolation,
}

impl DriverDesc {
    /// Describe a linear driver
    pub fn new(
        name: impl Into<String>,
        node: impl Into<String>,
        channel: Channel,
        times: Vec<f32>,
        values: Vec<f32>,
    ) -> Self {
        Self {
            name: name.into(),
            node: node.into(),
            channel,
            times,
            values,
            interpolation: Interpolation::Linear,
        }
    }

    /// Override the interpolation mode
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

/// Builds a [`SceneDocument`] from name-linked descriptions
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    scene_name: String,
    roots: Vec<String>,
    nodes: Vec<NodeDesc>,
    meshes: Vec<MeshDesc>,
    materials: Vec<String>,
    lights: Vec<String>,
    cameras: Vec<(String, Perspective)>,
    environments: Vec<String>,
    drivers: Vec<DriverDesc>,
}

impl DocumentBuilder {
    /// Start a document for the named scene
    pub fn new(scene_name: impl Into<String>) -> Self {
        Self {
            scene_name: scene_name.into(),
            ..Default::default()
        }
    }

    /// Add a scene root by node name
    pub fn root(mut self, node: impl Into<String>) -> Self {
        self.roots.push(node.into());
        self
    }

    /// Add a node
    pub fn node(mut self, node: NodeDesc) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a mesh
    pub fn mesh(mut self, mesh: MeshDesc) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Add a material
    pub fn material(mut self, name: impl Into<String>) -> Self {
        self.materials.push(name.into());
        self
    }

    /// Add a light
    pub fn light(mut self, name: impl Into<String>) -> Self {
        self.lights.push(name.into());
        self
    }

    /// Add a camera
    pub fn camera(mut self, name: impl Into<String>, perspective: Perspective) -> Self {
        self.cameras.push((name.into(), perspective));
        self
    }

    /// Add an environment probe
    pub fn environment(mut self, name: impl Into<String>) -> Self {
        self.environments.push(name.into());
        self
    }

    /// Add an animation driver
    pub fn driver(mut self, driver: DriverDesc) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Resolve all names and validate the document
    pub fn build(self) -> SceneResult<SceneDocument> {
        let node_names = index_names("node", self.nodes.iter().map(|n| n.name.as_str()), NodeId)?;
        let mesh_names = index_names("mesh", self.meshes.iter().map(|m| m.name.as_str()), MeshId)?;
        let material_names = index_names("material", self.materials.iter().map(String::as_str), MaterialId)?;
        let light_names = index_names("light", self.lights.iter().map(String::as_str), LightId)?;
        let camera_names = index_names("camera", self.cameras.iter().map(|(n, _)| n.as_str()), CameraId)?;
        let environment_names = index_names("environment", self.environments.iter().map(String::as_str), EnvironmentId)?;

        let meshes = self
            .meshes
            .into_iter()
            .map(|desc| {
                let material = desc
                    .material
                    .as_deref()
                    .map(|name| resolve(&material_names, "material", name, &desc.name))
                    .transpose()?;
                Ok(Mesh {
                    name: desc.name,
                    first_vertex: desc.first_vertex,
                    vertex_count: desc.vertex_count,
                    material,
                    local_aabb: desc.local_aabb,
                })
            })
            .collect::<SceneResult<Vec<_>>>()?;

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for desc in self.nodes {
            let kind = match &desc.reference {
                NodeRef::None => NodeKind::Group,
                NodeRef::Mesh(name) => NodeKind::Mesh(resolve(&mesh_names, "mesh", name, &desc.name)?),
                NodeRef::Light(name) => NodeKind::Light(resolve(&light_names, "light", name, &desc.name)?),
                NodeRef::Camera(name) => NodeKind::Camera(resolve(&camera_names, "camera", name, &desc.name)?),
                NodeRef::Environment(name) => {
                    NodeKind::Environment(resolve(&environment_names, "environment", name, &desc.name)?)
                }
            };
            let children = desc
                .children
                .iter()
                .map(|child| resolve(&node_names, "node", child, &desc.name))
                .collect::<SceneResult<Vec<_>>>()?;
            nodes.push(Node {
                name: desc.name,
                local: desc.local,
                children,
                kind,
            });
        }

        let roots = self
            .roots
            .iter()
            .map(|root| resolve(&node_names, "node", root, &self.scene_name))
            .collect::<SceneResult<Vec<_>>>()?;
        if roots.is_empty() {
            return Err(SceneError::EmptyScene(self.scene_name));
        }

        validate_hierarchy(&nodes, &roots)?;

        let drivers = self
            .drivers
            .into_iter()
            .map(|desc| {
                let node = resolve(&node_names, "node", &desc.node, &desc.name)?;
                validate_keys(&desc)?;
                Ok(Driver {
                    name: desc.name,
                    node,
                    channel: desc.channel,
                    times: desc.times,
                    values: desc.values,
                    interpolation: desc.interpolation,
                })
            })
            .collect::<SceneResult<Vec<_>>>()?;

        Ok(SceneDocument {
            nodes,
            drivers,
            meshes,
            materials: self.materials.into_iter().map(|name| Material { name }).collect(),
            lights: self.lights.into_iter().map(|name| Light { name }).collect(),
            cameras: self
                .cameras
                .into_iter()
                .map(|(name, perspective)| CameraDesc { name, perspective })
                .collect(),
            environments: self.environments.into_iter().map(|name| Environment { name }).collect(),
            scene: Scene {
                name: self.scene_name,
                roots,
            },
            node_names,
            mesh_names,
            camera_names,
        })
    }
}

fn index_names<'a, Id>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
    make_id: impl Fn(usize) -> Id,
) -> SceneResult<HashMap<String, Id>> {
    let mut map = HashMap::new();
    for (index, name) in names.enumerate() {
        if map.insert(name.to_string(), make_id(index)).is_some() {
            return Err(SceneError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(map)
}

fn resolve<Id: Copy>(map: &HashMap<String, Id>, kind: &'static str, name: &str, owner: &str) -> SceneResult<Id> {
    map.get(name).copied().ok_or_else(|| SceneError::UnknownReference {
        kind,
        name: name.to_string(),
        owner: owner.to_string(),
    })
}

fn validate_hierarchy(nodes: &[Node], roots: &[NodeId]) -> SceneResult<()> {
    let mut parents: Vec<Option<NodeId>> = vec![None; nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        for child in &node.children {
            if parents[child.0].replace(NodeId(index)).is_some() {
                return Err(SceneError::MultipleParents {
                    node: nodes[child.0].name.clone(),
                });
            }
        }
    }

    if let Some(root) = roots.iter().find(|root| parents[root.0].is_some()) {
        return Err(SceneError::RootHasParent {
            node: nodes[root.0].name.clone(),
        });
    }

    // With single parents, a chain longer than the node count must revisit a node.
    for start in 0..nodes.len() {
        let mut current = parents[start];
        let mut steps = 0;
        while let Some(parent) = current {
            steps += 1;
            if steps > nodes.len() {
                return Err(SceneError::Cycle {
                    node: nodes[start].name.clone(),
                });
            }
            current = parents[parent.0];
        }
    }

    Ok(())
}

fn validate_keys(desc: &DriverDesc) -> SceneResult<()> {
    let arity = desc.channel.arity();
    if desc.values.len() != desc.times.len() * arity {
        return Err(SceneError::ArityMismatch {
            driver: desc.name.clone(),
            values: desc.values.len(),
            keys: desc.times.len(),
            arity,
        });
    }

    if let Some(index) = desc.times.iter().position(|t| !t.is_finite()) {
        return Err(SceneError::NonFiniteTime {
            driver: desc.name.clone(),
            index,
        });
    }

    if let Some(index) = desc.times.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(SceneError::NonMonotonicTimes {
            driver: desc.name.clone(),
            index: index + 1,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_build_resolves_references() {
        let doc = DocumentBuilder::new("main")
            .material("steel")
            .mesh(MeshDesc::new("cube", 0, 36, unit_box()).with_material("steel"))
            .node(NodeDesc::new("root").with_children(["child"]))
            .node(NodeDesc::new("child").with_mesh("cube"))
            .root("root")
            .build()
            .unwrap();

        let root = doc.node_by_name("root").unwrap();
        let child = doc.node_by_name("child").unwrap();
        assert_eq!(doc.node(root).children, vec![child]);
        assert_eq!(doc.node(child).kind, NodeKind::Mesh(MeshId(0)));
        assert_eq!(doc.mesh(MeshId(0)).material, Some(MaterialId(0)));
        assert_eq!(doc.scene.roots, vec![root]);
    }

    #[test]
    fn test_duplicate_node_name_rejected() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a"))
            .node(NodeDesc::new("a"))
            .root("a")
            .build();
        assert!(matches!(result, Err(SceneError::DuplicateName { kind: "node", .. })));
    }

    #[test]
    fn test_dangling_child_rejected() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a").with_children(["missing"]))
            .root("a")
            .build();
        assert!(matches!(result, Err(SceneError::UnknownReference { kind: "node", .. })));
    }

    #[test]
    fn test_dangling_mesh_rejected() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a").with_mesh("nope"))
            .root("a")
            .build();
        assert!(matches!(result, Err(SceneError::UnknownReference { kind: "mesh", .. })));
    }

    #[test]
    fn test_shared_child_rejected() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a").with_children(["c"]))
            .node(NodeDesc::new("b").with_children(["c"]))
            .node(NodeDesc::new("c"))
            .root("a")
            .root("b")
            .build();
        assert!(matches!(result, Err(SceneError::MultipleParents { .. })));
    }

    #[test]
    fn test_cycle_rejected() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("root"))
            .node(NodeDesc::new("a").with_children(["b"]))
            .node(NodeDesc::new("b").with_children(["a"]))
            .root("root")
            .build();
        assert!(matches!(result, Err(SceneError::Cycle { .. })));
    }

    #[test]
    fn test_root_with_parent_rejected() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a").with_children(["b"]))
            .node(NodeDesc::new("b"))
            .root("a")
            .root("b")
            .build();
        assert!(matches!(result, Err(SceneError::RootHasParent { .. })));
    }

    #[test]
    fn test_empty_scene_rejected() {
        let result = DocumentBuilder::new("main").node(NodeDesc::new("a")).build();
        assert_eq!(result.unwrap_err(), SceneError::EmptyScene("main".to_string()));
    }

    #[test]
    fn test_driver_arity_checked() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a"))
            .root("a")
            .driver(DriverDesc::new("spin", "a", Channel::Rotation, vec![0.0, 1.0], vec![0.0; 6]))
            .build();
        assert!(matches!(result, Err(SceneError::ArityMismatch { arity: 4, keys: 2, values: 6, .. })));
    }

    #[test]
    fn test_driver_times_must_not_decrease() {
        let result = DocumentBuilder::new("main")
            .node(NodeDesc::new("a"))
            .root("a")
            .driver(DriverDesc::new("move", "a", Channel::Translation, vec![0.0, 2.0, 1.0], vec![0.0; 9]))
            .build();
        assert!(matches!(result, Err(SceneError::NonMonotonicTimes { index: 2, .. })));
    }

    #[test]
    fn test_non_finite_key_time_rejected() {
        for bad in [f32::NAN, f32::INFINITY] {
            let result = DocumentBuilder::new("main")
                .node(NodeDesc::new("a"))
                .root("a")
                .driver(DriverDesc::new("move", "a", Channel::Translation, vec![bad, 1.0], vec![0.0; 6]))
                .build();
            assert!(matches!(result, Err(SceneError::NonFiniteTime { index: 0, .. })));
        }
    }

    #[test]
    fn test_animation_duration() {
        let doc = DocumentBuilder::new("main")
            .node(NodeDesc::new("a"))
            .root("a")
            .driver(DriverDesc::new("t", "a", Channel::Translation, vec![0.0, 2.5], vec![0.0; 6]))
            .driver(DriverDesc::new("s", "a", Channel::Scale, vec![0.0, 1.0], vec![1.0; 6]))
            .build()
            .unwrap();
        assert_eq!(doc.animation_duration(), 2.5);
    }
}
