//! # Unified Configuration System
//!
//! Configuration for the workspace manager, frame pacing, the fallback camera
//! and engine-wide logging. Every structure is serializable and can be loaded
//! from TOML or RON through the [`Config`] trait.

use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec3;

pub use crate::config::{Config, ConfigError};

/// Allocation granularity used when a workspace buffer has to grow
pub const DEFAULT_UPLOAD_BLOCK_SIZE: u64 = 4096;

/// # Renderer Configuration
///
/// Frame-in-flight depth and buffer growth policy for the workspace manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Number of workspaces (frames that may be in flight at once)
    pub frames_in_flight: usize,
    /// Block size that buffer growth rounds up to, in bytes
    pub upload_block_size: u64,
    /// Fence wait timeout in nanoseconds when acquiring a workspace (unbounded when unset)
    pub fence_timeout_ns: Option<u64>,
    /// Additional descriptor sets reserved per workspace beyond the declared slots
    pub descriptor_pool_headroom: u32,
}

impl RendererConfig {
    /// Create a configuration with the default settings
    pub fn new() -> Self {
        Self {
            frames_in_flight: 2,
            upload_block_size: DEFAULT_UPLOAD_BLOCK_SIZE,
            fence_timeout_ns: None,
            descriptor_pool_headroom: 0,
        }
    }

    /// Set the number of frames in flight
    pub fn with_frames_in_flight(mut self, frames: usize) -> Self {
        self.frames_in_flight = frames;
        self
    }

    /// Set the growth block size
    pub fn with_upload_block_size(mut self, bytes: u64) -> Self {
        self.upload_block_size = bytes;
        self
    }

    /// Set the fence wait timeout
    pub fn with_fence_timeout_ns(mut self, timeout: u64) -> Self {
        self.fence_timeout_ns = Some(timeout);
        self
    }

    /// Fence timeout in the form `vkWaitForFences` expects
    pub fn fence_timeout(&self) -> u64 {
        self.fence_timeout_ns.unwrap_or(u64::MAX)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_in_flight == 0 {
            return Err(ConfigError::Invalid("frames_in_flight must be at least 1".to_string()));
        }

        if self.frames_in_flight > 8 {
            return Err(ConfigError::Invalid("frames_in_flight should not exceed 8".to_string()));
        }

        if self.upload_block_size == 0 {
            return Err(ConfigError::Invalid("upload_block_size must be non-zero".to_string()));
        }

        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Camera Configuration
///
/// Camera used when a scene document does not define any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World-space position
    pub position: [f32; 3],
    /// Viewing direction
    pub forward: [f32; 3],
    /// Up vector
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping distance
    pub near: f32,
    /// Far clipping distance
    pub far: f32,
}

impl CameraConfig {
    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Forward direction as a vector
    pub fn forward(&self) -> Vec3 {
        Vec3::from(self.forward)
    }

    /// Up direction as a vector
    pub fn up(&self) -> Vec3 {
        Vec3::from(self.up)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip range must satisfy 0 < near < far (near = {}, far = {})",
                self.near, self.far
            )));
        }

        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!("camera fov {} out of range", self.fov_degrees)));
        }

        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            forward: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// # Engine Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Workspace and frame pacing configuration
    pub renderer: RendererConfig,
    /// Fallback camera
    pub camera: CameraConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate()?;
        self.camera.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
impl Config for RendererConfig {}
