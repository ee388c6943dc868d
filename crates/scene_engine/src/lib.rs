//! # Scene Engine
//!
//! Renderer core for animated, hierarchical 3D scenes on Vulkan.
//!
//! ## Features
//!
//! - **Scene tree**: arena-indexed node hierarchy with cached world transforms
//!   and bounds, invalidated downward on change
//! - **Animation**: keyframed translation/rotation/scale drivers sampled per frame
//! - **Culling**: frustum extraction from the camera and conservative AABB tests
//! - **Resource workspaces**: per-frame-in-flight host/device buffer pairs and
//!   descriptor sets, with an enforced upload protocol
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let document = DocumentBuilder::new("demo")
//!         .root("root")
//!         .node(NodeDesc::new("root").with_children(["cube"]))
//!         .node(NodeDesc::new("cube").with_translation(Vec3::new(1.0, 0.0, 0.0)).with_mesh("cube"))
//!         .mesh(MeshDesc::new("cube", 0, 36, Aabb::new(Vec3::repeat(-1.0), Vec3::repeat(1.0))))
//!         .build()?;
//!
//!     let mut tree = SceneTree::new(document);
//!     let camera = Camera::from_config(&CameraConfig::default(), 16.0 / 9.0);
//!     let frame = tree.prepare_frame(0.0, &camera.view_projection());
//!     let instances: Vec<InstanceData> = frame.instance_data();
//!     println!("{} of {} meshes visible", instances.len(), frame.total_meshes);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, CameraConfig, EngineConfig, RendererConfig},
        foundation::{
            math::{LocalTransform, Mat4, Quat, Vec3},
            time::AnimationClock,
        },
        render::{
            FrameRing, GpuDevice, PipelineDeclaration, BlockSlot, GlobalBufferDesc, VulkanDevice, WorkspaceManager,
        },
        scene::{
            Aabb, Camera, CameraRig, DocumentBuilder, InstanceData, MeshDesc, NodeDesc, SceneDocument, SceneTree,
        },
    };
}
