//! Vulkan error types

use ash::vk;
use thiserror::Error;

/// Vulkan operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Device or host memory allocation failed
    #[error("Out of memory: {requested} bytes")]
    OutOfMemory {
        /// Number of bytes that were requested
        requested: u64,
    },

    /// No suitable memory type found for allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// The descriptor pool has no room for another set
    #[error("Descriptor pool exhausted")]
    DescriptorPoolExhausted,

    /// A fence did not signal within the configured timeout
    #[error("Fence wait timed out after {timeout_ns} ns")]
    FenceTimeout {
        /// Timeout that elapsed
        timeout_ns: u64,
    },
}

impl VulkanError {
    /// Classify a failed memory or buffer allocation
    pub fn from_allocation(result: vk::Result, requested: u64) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
                VulkanError::OutOfMemory { requested }
            }
            other => VulkanError::Api(other),
        }
    }

    /// Classify a failed descriptor set allocation
    pub fn from_descriptor_allocation(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL => {
                VulkanError::DescriptorPoolExhausted
            }
            other => VulkanError::Api(other),
        }
    }

    /// Classify a failed fence wait
    pub fn from_fence_wait(result: vk::Result, timeout_ns: u64) -> Self {
        match result {
            vk::Result::TIMEOUT => VulkanError::FenceTimeout { timeout_ns },
            other => VulkanError::Api(other),
        }
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
