//! Scene tree core
//!
//! Maintains a hierarchical, animatable scene with cached world transforms
//! and bounds, flattens it into per-frame instance lists and culls them
//! against the active camera.
//!
//! ## Per-frame data flow
//!
//! ```text
//! drivers ──► local TRS ──► (dirty subtree) ──► traverse ──► world bounds
//!                                                   │
//!                         camera frustum ──► cull ◄─┘ ──► InstanceData
//! ```

mod animation;
mod bounds;
mod camera;
mod culling;
mod document;
mod frame;
mod frustum;
mod scene_tree;
mod traversal;

pub use animation::{sample, ChannelValue};
pub use bounds::Aabb;
pub use camera::{Camera, CameraRig, NamedCamera};
pub use culling::{cull_meshes, InstanceData};
pub use document::{
    CameraDesc, CameraId, Channel, DocumentBuilder, Driver, DriverDesc, Environment, EnvironmentId,
    Interpolation, Light, LightId, Material, MaterialId, Mesh, MeshDesc, MeshId, Node, NodeDesc, NodeId,
    NodeKind, Perspective, Scene, SceneDocument, SceneError, SceneResult,
};
pub use frame::PreparedFrame;
pub use frustum::{Frustum, Plane};
pub use scene_tree::{DirtyFlags, SceneTree};
pub use traversal::{CameraInstance, EnvironmentInstance, LightInstance, MeshInstance, TraversalOutput};
