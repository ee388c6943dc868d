//! Fences, queue submission and memory barriers
//!
//! Fences pace the CPU against the GPU: a workspace may only be recorded
//! again once the fence of its previous submission has signaled.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Create a fence, optionally already signaled
pub fn create_fence(device: &Device, signaled: bool) -> VulkanResult<vk::Fence> {
    let flags = if signaled {
        vk::FenceCreateFlags::SIGNALED
    } else {
        vk::FenceCreateFlags::empty()
    };

    let create_info = vk::FenceCreateInfo::builder().flags(flags);

    unsafe {
        device.create_fence(&create_info, None)
            .map_err(VulkanError::Api)
    }
}

/// Wait for a fence
pub fn wait_fence(device: &Device, fence: vk::Fence, timeout: u64) -> VulkanResult<()> {
    unsafe {
        device.wait_for_fences(&[fence], true, timeout)
            .map_err(|e| VulkanError::from_fence_wait(e, timeout))
    }
}

/// Reset a fence
pub fn reset_fence(device: &Device, fence: vk::Fence) -> VulkanResult<()> {
    unsafe {
        device.reset_fences(&[fence])
            .map_err(VulkanError::Api)
    }
}

/// Destroy a fence
pub fn destroy_fence(device: &Device, fence: vk::Fence) {
    unsafe {
        device.destroy_fence(fence, None);
    }
}

/// Submit one command buffer without semaphores; `fence` signals on completion
pub fn submit(device: &Device, queue: vk::Queue, command_buffer: vk::CommandBuffer, fence: vk::Fence) -> VulkanResult<()> {
    let command_buffers = [command_buffer];
    let submit_info = vk::SubmitInfo::builder()
        .command_buffers(&command_buffers)
        .build();

    unsafe {
        device.queue_submit(queue, &[submit_info], fence)
            .map_err(VulkanError::Api)
    }
}

/// Memory barrier builder for common synchronization patterns
pub struct MemoryBarrierBuilder;

impl MemoryBarrierBuilder {
    /// Stage the upload barrier waits on
    pub const UPLOAD_SRC_STAGE: vk::PipelineStageFlags = vk::PipelineStageFlags::TRANSFER;

    /// Stages the upload barrier blocks until the copies are visible
    pub const UPLOAD_DST_STAGE: vk::PipelineStageFlags = vk::PipelineStageFlags::from_raw(
        vk::PipelineStageFlags::VERTEX_INPUT.as_raw()
            | vk::PipelineStageFlags::VERTEX_SHADER.as_raw()
            | vk::PipelineStageFlags::FRAGMENT_SHADER.as_raw()
            | vk::PipelineStageFlags::COMPUTE_SHADER.as_raw(),
    );

    /// Transfer write → vertex attribute, uniform and shader storage reads
    ///
    /// Recorded once after all staging copies of a frame and before any draw
    /// that reads the device buffers.
    pub fn buffer_transfer_to_shader_read() -> vk::MemoryBarrier {
        vk::MemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(
                vk::AccessFlags::VERTEX_ATTRIBUTE_READ
                    | vk::AccessFlags::UNIFORM_READ
                    | vk::AccessFlags::SHADER_READ,
            )
            .build()
    }
}
