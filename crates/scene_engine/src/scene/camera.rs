//! # Cameras
//!
//! Perspective cameras for rendering and culling, and the rig that selects
//! which one is active.
//!
//! ## Conventions
//! - Right-handed, Y-up view space; cameras look down their local -Z axis
//! - Projection uses zero-to-one depth and flips Y for Vulkan clip space
//! - Field of view is vertical and stored in radians

use log::{info, trace, warn};

use crate::core::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::scene::document::SceneDocument;
use crate::scene::frustum::Frustum;
use crate::scene::traversal::CameraInstance;

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Unit viewing direction in world space
    pub forward: Vec3,

    /// Up vector for camera orientation
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `forward` - Viewing direction (normalized internally)
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Width over height of the viewport
    /// * `near` - Near clipping distance (must be > 0)
    /// * `far` - Far clipping distance (must be > near)
    pub fn perspective(position: Vec3, forward: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            forward: forward.normalize(),
            up: Vec3::y(),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Camera described by configuration
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            up: config.up().normalize(),
            ..Self::perspective(config.position(), config.forward(), config.fov_degrees, aspect, config.near, config.far)
        }
    }

    /// Camera placed by a scene node
    ///
    /// Position and orientation come from the node's world matrix; the
    /// projection comes from the referenced camera record. A camera without a
    /// far plane uses `fallback_far`.
    pub fn from_instance(document: &SceneDocument, instance: &CameraInstance, fallback_far: f32) -> Self {
        let desc = document.camera(instance.camera);
        let world = &instance.world;

        let position = world.column(3).xyz();
        let forward = (world * Vec4::new(0.0, 0.0, -1.0, 0.0)).xyz();
        let up = (world * Vec4::new(0.0, 1.0, 0.0, 0.0)).xyz();

        Self {
            position,
            forward: forward.normalize(),
            up: up.normalize(),
            fov: desc.perspective.vfov,
            aspect: desc.perspective.aspect,
            near: desc.perspective.near,
            far: desc.perspective.far.unwrap_or(fallback_far),
        }
    }

    /// Update the aspect ratio after a viewport change
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            trace!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// World-to-view matrix
    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.forward, self.up)
    }

    /// View-to-clip matrix
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_vulkan(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined `projection * view`
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Culling volume of this camera
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }
}

/// A camera with the name it is selected by
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCamera {
    /// Camera record name, or `"default"` for the configured fallback
    pub name: String,
    /// The camera itself
    pub camera: Camera,
}

/// Set of available cameras and the active selection
///
/// Built from the cameras a traversal found. A document without cameras gets
/// the configured default camera so there is always an active one. Document
/// cameras use their own aspect ratio until the first
/// [`set_aspect_ratio`](Self::set_aspect_ratio); from then on the viewport
/// aspect applies to every camera, including ones rebuilt by
/// [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct CameraRig {
    cameras: Vec<NamedCamera>,
    active: usize,
    config: CameraConfig,
    default_aspect: f32,
    viewport_aspect: Option<f32>,
}

impl CameraRig {
    /// Name of the configured fallback camera
    pub const DEFAULT_CAMERA: &'static str = "default";

    /// Build a rig from traversal output
    pub fn new(document: &SceneDocument, instances: &[CameraInstance], config: CameraConfig, aspect: f32) -> Self {
        let mut rig = Self {
            cameras: Vec::new(),
            active: 0,
            config,
            default_aspect: aspect,
            viewport_aspect: None,
        };
        rig.rebuild(document, instances);
        info!("Camera rig created with {} camera(s)", rig.cameras.len());
        rig
    }

    /// Refresh camera poses from a new traversal, keeping the active selection by name
    pub fn update(&mut self, document: &SceneDocument, instances: &[CameraInstance]) {
        let active_name = self.active_name().to_string();
        self.rebuild(document, instances);
        self.active = self
            .cameras
            .iter()
            .position(|c| c.name == active_name)
            .unwrap_or(0);
    }

    fn rebuild(&mut self, document: &SceneDocument, instances: &[CameraInstance]) {
        self.cameras = instances
            .iter()
            .map(|instance| {
                let mut camera = Camera::from_instance(document, instance, self.config.far);
                if let Some(aspect) = self.viewport_aspect {
                    camera.set_aspect_ratio(aspect);
                }
                NamedCamera {
                    name: document.camera(instance.camera).name.clone(),
                    camera,
                }
            })
            .collect();

        if self.cameras.is_empty() {
            let aspect = self.viewport_aspect.unwrap_or(self.default_aspect);
            self.cameras.push(NamedCamera {
                name: Self::DEFAULT_CAMERA.to_string(),
                camera: Camera::from_config(&self.config, aspect),
            });
        }
    }

    /// Currently active camera
    pub fn active(&self) -> &Camera {
        &self.cameras[self.active].camera
    }

    /// Name of the active camera
    pub fn active_name(&self) -> &str {
        &self.cameras[self.active].name
    }

    /// Index of the active camera
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// All cameras in traversal order
    pub fn cameras(&self) -> &[NamedCamera] {
        &self.cameras
    }

    /// Make the next camera active, wrapping around
    pub fn cycle(&mut self) -> &Camera {
        self.active = (self.active + 1) % self.cameras.len();
        trace!("Active camera -> '{}'", self.active_name());
        self.active()
    }

    /// Activate a camera by name; unknown names leave the selection unchanged
    pub fn select(&mut self, name: &str) -> bool {
        match self.cameras.iter().position(|c| c.name == name) {
            Some(index) => {
                self.active = index;
                true
            }
            None => {
                warn!("Camera '{}' not found; keeping '{}'", name, self.active_name());
                false
            }
        }
    }

    /// Apply a new viewport aspect ratio to every camera
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.viewport_aspect = Some(aspect);
        for named in &mut self.cameras {
            named.camera.set_aspect_ratio(aspect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, LocalTransform, Point3, Quat};
    use crate::scene::document::{DocumentBuilder, NodeDesc, Perspective};
    use crate::scene::scene_tree::SceneTree;
    use approx::assert_relative_eq;

    fn two_camera_tree() -> SceneTree {
        let perspective = Perspective { aspect: 1.5, vfov: 1.0, near: 0.1, far: None };
        let doc = DocumentBuilder::new("cams")
            .camera("left", perspective)
            .camera("right", perspective)
            .node(NodeDesc::new("root").with_children(["l", "r"]))
            .node(
                NodeDesc::new("l")
                    .with_camera("left")
                    .with_transform(LocalTransform::new(
                        Vec3::new(1.0, 2.0, 3.0),
                        Quat::from_axis_angle(&Vec3::y_axis(), PI / 2.0),
                        Vec3::new(1.0, 1.0, 1.0),
                    )),
            )
            .node(NodeDesc::new("r").with_camera("right"))
            .root("root")
            .build()
            .unwrap();
        SceneTree::new(doc)
    }

    fn rig_for(tree: &mut SceneTree) -> CameraRig {
        let output = tree.traverse();
        CameraRig::new(tree.document(), &output.cameras, CameraConfig::default(), 1.0)
    }

    #[test]
    fn test_default_camera_projects_origin_to_center() {
        let camera = Camera::from_config(&CameraConfig::default(), 16.0 / 9.0);
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.xyz() / clip.w;

        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_projection_flips_y() {
        let camera = Camera::from_config(&CameraConfig::default(), 1.0);
        let clip = camera.view_projection() * Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!(clip.y / clip.w < 0.0);
    }

    #[test]
    fn test_camera_from_node_world_matrix() {
        let mut tree = two_camera_tree();
        let rig = rig_for(&mut tree);
        let camera = &rig.cameras()[0].camera;

        assert_relative_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-6);
        assert_relative_eq!(camera.forward, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(camera.up, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_eq!(camera.far, CameraConfig::default().far);
        assert_eq!(camera.aspect, 1.5);

        // Looking down -X, a point further along -X lands in the middle of the view
        let clip = camera.view_projection() * Point3::new(-5.0, 2.0, 3.0).to_homogeneous();
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rig_falls_back_to_default_camera() {
        let doc = DocumentBuilder::new("empty").node(NodeDesc::new("root")).root("root").build().unwrap();
        let mut tree = SceneTree::new(doc);
        let rig = rig_for(&mut tree);

        assert_eq!(rig.cameras().len(), 1);
        assert_eq!(rig.active_name(), CameraRig::DEFAULT_CAMERA);
        assert_relative_eq!(rig.active().position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_cycle_and_select() {
        let mut tree = two_camera_tree();
        let mut rig = rig_for(&mut tree);

        assert_eq!(rig.active_name(), "left");
        rig.cycle();
        assert_eq!(rig.active_name(), "right");
        rig.cycle();
        assert_eq!(rig.active_name(), "left");

        assert!(rig.select("right"));
        assert!(!rig.select("missing"));
        assert_eq!(rig.active_name(), "right");
    }

    #[test]
    fn test_update_keeps_selection() {
        let mut tree = two_camera_tree();
        let mut rig = rig_for(&mut tree);
        rig.select("right");

        let r = tree.document().node_by_name("r").unwrap();
        tree.set_local_transform(r, LocalTransform::from_translation(Vec3::new(0.0, 0.0, 9.0)));
        let output = tree.traverse();
        rig.update(tree.document(), &output.cameras);

        assert_eq!(rig.active_name(), "right");
        assert_relative_eq!(rig.active().position, Vec3::new(0.0, 0.0, 9.0), epsilon = 1e-6);
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut tree = two_camera_tree();
        let mut rig = rig_for(&mut tree);
        assert!(rig.cameras().iter().all(|c| c.camera.aspect == 1.5));

        rig.set_aspect_ratio(2.0);
        assert!(rig.cameras().iter().all(|c| c.camera.aspect == 2.0));

        // The viewport aspect survives the per-frame rebuild
        let output = tree.traverse();
        rig.update(tree.document(), &output.cameras);
        assert!(rig.cameras().iter().all(|c| c.camera.aspect == 2.0));
        assert_eq!(rig.active().aspect, 2.0);
    }

    #[test]
    fn test_default_camera_keeps_viewport_aspect() {
        let doc = DocumentBuilder::new("empty").node(NodeDesc::new("root")).root("root").build().unwrap();
        let mut tree = SceneTree::new(doc);
        let mut rig = rig_for(&mut tree);
        assert_eq!(rig.active().aspect, 1.0);

        rig.set_aspect_ratio(0.5);
        let output = tree.traverse();
        rig.update(tree.document(), &output.cameras);
        assert_eq!(rig.active().aspect, 0.5);
    }
}
