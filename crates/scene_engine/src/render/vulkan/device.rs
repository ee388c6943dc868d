//! [`GpuDevice`] on top of `ash`
//!
//! Instance, device and queue creation stay with the windowing layer; this
//! wrapper borrows their handles and owns only a command pool.

use ash::{vk, Device, Instance};
use log::info;

use crate::render::device::{GpuBuffer, GpuDevice, MemoryLocation};
use crate::render::vulkan::commands::{self, CommandPool};
use crate::render::vulkan::{buffer, descriptor_set, sync, VulkanError, VulkanResult};

/// Vulkan implementation of [`GpuDevice`]
pub struct VulkanDevice {
    command_pool: CommandPool,
    device: Device,
    queue: vk::Queue,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
}

impl VulkanDevice {
    /// Wrap externally created handles
    ///
    /// # Arguments
    /// * `instance` - Instance the physical device belongs to
    /// * `physical_device` - Used once to query memory types
    /// * `device` - Logical device; must outlive this wrapper
    /// * `queue` - Queue all submissions go to
    /// * `queue_family_index` - Family of `queue`, used for the command pool
    pub fn new(
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        device: Device,
        queue: vk::Queue,
        queue_family_index: u32,
    ) -> VulkanResult<Self> {
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(physical_device) };
        let command_pool = CommandPool::new(device.clone(), queue_family_index)?;

        info!(
            "Vulkan device ready: {} memory types, queue family {}",
            memory_properties.memory_type_count, queue_family_index
        );

        Ok(Self {
            command_pool,
            device,
            queue,
            memory_properties,
        })
    }

    /// The wrapped logical device, for recording draw commands
    pub fn raw(&self) -> &Device {
        &self.device
    }
}

impl GpuDevice for VulkanDevice {
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> VulkanResult<GpuBuffer> {
        buffer::create_buffer(&self.device, &self.memory_properties, size, usage, location)
    }

    fn destroy_buffer(&self, gpu_buffer: &GpuBuffer) {
        buffer::destroy_buffer(&self.device, gpu_buffer);
    }

    fn write_buffer(&self, gpu_buffer: &GpuBuffer, offset: vk::DeviceSize, data: &[u8]) -> VulkanResult<()> {
        buffer::write_buffer(&self.device, gpu_buffer, offset, data)
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> VulkanResult<vk::DescriptorPool> {
        descriptor_set::create_pool(&self.device, max_sets, pool_sizes)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        unsafe {
            self.device.destroy_descriptor_pool(pool, None);
        }
    }

    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VulkanResult<vk::DescriptorSet> {
        descriptor_set::allocate_set(&self.device, pool, layout)
    }

    fn free_descriptor_set(&self, pool: vk::DescriptorPool, set: vk::DescriptorSet) -> VulkanResult<()> {
        descriptor_set::free_set(&self.device, pool, set)
    }

    fn write_buffer_descriptor(
        &self,
        set: vk::DescriptorSet,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        buffer: vk::Buffer,
        range: vk::DeviceSize,
    ) {
        descriptor_set::write_buffer(&self.device, set, binding, descriptor_type, buffer, range);
    }

    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        self.command_pool.allocate_command_buffers(count)
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        self.command_pool.free_command_buffers(command_buffers);
    }

    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        commands::reset(&self.device, command_buffer)
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        commands::begin(&self.device, command_buffer)
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        commands::end(&self.device, command_buffer)
    }

    fn cmd_copy_buffer(&self, command_buffer: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) {
        commands::copy_buffer(&self.device, command_buffer, src, dst, size);
    }

    fn cmd_memory_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barrier: vk::MemoryBarrier,
    ) {
        commands::memory_barrier(&self.device, command_buffer, src_stage, dst_stage, barrier);
    }

    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence> {
        sync::create_fence(&self.device, signaled)
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        sync::destroy_fence(&self.device, fence);
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VulkanResult<()> {
        sync::wait_fence(&self.device, fence, timeout_ns)
    }

    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()> {
        sync::reset_fence(&self.device, fence)
    }

    fn submit(&self, command_buffer: vk::CommandBuffer, fence: vk::Fence) -> VulkanResult<()> {
        sync::submit(&self.device, self.queue, command_buffer, fence)
    }

    fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle() }.map_err(VulkanError::Api)
    }
}
