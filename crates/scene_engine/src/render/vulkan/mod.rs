//! Vulkan backend
//!
//! Thin `ash` wrappers behind [`VulkanDevice`], the production
//! [`GpuDevice`](crate::render::GpuDevice) implementation.

/// Buffer creation and host writes
pub mod buffer;
/// Command pool and recording helpers
pub mod commands;
/// Descriptor layouts, pools and writes
pub mod descriptor_set;
/// Fences, submission and barriers
pub mod sync;

mod device;
mod error;

pub use descriptor_set::DescriptorSetLayoutBuilder;
pub use device::VulkanDevice;
pub use error::{VulkanError, VulkanResult};
pub use sync::MemoryBarrierBuilder;
