//! GPU device seam
//!
//! The workspace manager and frame ring only talk to the GPU through
//! [`GpuDevice`]. [`VulkanDevice`](crate::render::vulkan::VulkanDevice) is the
//! real implementation; tests use a recording mock.

use ash::vk;

use crate::render::vulkan::VulkanResult;

/// Where a buffer's memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    /// Host-visible, host-coherent memory the CPU writes through a mapping
    HostVisible,
    /// Device-local memory only the GPU reads and writes
    DeviceLocal,
}

impl MemoryLocation {
    /// Required memory property flags
    pub fn property_flags(self) -> vk::MemoryPropertyFlags {
        match self {
            MemoryLocation::HostVisible => {
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT
            }
            MemoryLocation::DeviceLocal => vk::MemoryPropertyFlags::DEVICE_LOCAL,
        }
    }
}

/// A buffer together with its bound memory
///
/// The default value is the null buffer of size zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpuBuffer {
    /// Buffer handle
    pub buffer: vk::Buffer,
    /// Backing memory
    pub memory: vk::DeviceMemory,
    /// Size in bytes
    pub size: vk::DeviceSize,
}

impl GpuBuffer {
    /// Whether this is the null buffer
    pub fn is_null(&self) -> bool {
        self.buffer == vk::Buffer::null()
    }
}

/// The GPU operations the scene core needs
///
/// All methods take `&self`; implementations are handle tables, not owners of
/// per-call state. Recording methods (`cmd_*`) require the command buffer to
/// be between `begin_command_buffer` and `end_command_buffer`.
pub trait GpuDevice {
    /// Create a buffer of `size` bytes and bind fresh memory to it
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> VulkanResult<GpuBuffer>;

    /// Destroy a buffer and free its memory
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    /// Copy bytes into a host-visible buffer at `offset`
    fn write_buffer(&self, buffer: &GpuBuffer, offset: vk::DeviceSize, data: &[u8]) -> VulkanResult<()>;

    /// Create a descriptor pool that allows freeing individual sets
    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> VulkanResult<vk::DescriptorPool>;

    /// Destroy a descriptor pool and every set allocated from it
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

    /// Allocate one descriptor set with the given layout
    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VulkanResult<vk::DescriptorSet>;

    /// Return a descriptor set to its pool
    fn free_descriptor_set(&self, pool: vk::DescriptorPool, set: vk::DescriptorSet) -> VulkanResult<()>;

    /// Point a buffer binding of a descriptor set at `buffer[0..range]`
    fn write_buffer_descriptor(
        &self,
        set: vk::DescriptorSet,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        buffer: vk::Buffer,
        range: vk::DeviceSize,
    );

    /// Allocate primary command buffers
    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>>;

    /// Free command buffers
    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]);

    /// Reset a command buffer to the initial state
    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Begin one-time-submit recording
    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Finish recording
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    /// Record a copy of the first `size` bytes of `src` into `dst`
    fn cmd_copy_buffer(&self, command_buffer: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize);

    /// Record a global memory barrier
    fn cmd_memory_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barrier: vk::MemoryBarrier,
    );

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence>;

    /// Destroy a fence
    fn destroy_fence(&self, fence: vk::Fence);

    /// Block until the fence signals or `timeout_ns` elapses
    fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VulkanResult<()>;

    /// Return a fence to the unsignaled state
    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()>;

    /// Submit a recorded command buffer; `fence` signals when it completes
    fn submit(&self, command_buffer: vk::CommandBuffer, fence: vk::Fence) -> VulkanResult<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> VulkanResult<()>;
}
