//! # Core Engine Module
//!
//! Shared configuration types for the scene and workspace subsystems.

pub mod config;

pub use config::{
    ApplicationConfig,
    CameraConfig,
    EngineConfig,
    RendererConfig,
    Config,
    ConfigError,
};
