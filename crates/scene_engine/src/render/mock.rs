//! Recording [`GpuDevice`] for tests
//!
//! Hands out fabricated handles, tracks which objects are alive and records
//! every call in order. Fences signal on submit unless submissions are held,
//! which simulates a GPU that is still busy.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use ash::vk::{self, Handle};

use crate::render::device::{GpuBuffer, GpuDevice, MemoryLocation};
use crate::render::vulkan::{VulkanError, VulkanResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateBuffer { buffer: vk::Buffer, size: vk::DeviceSize, location: MemoryLocation },
    DestroyBuffer(vk::Buffer),
    WriteBuffer { buffer: vk::Buffer, offset: vk::DeviceSize, len: usize },
    CreatePool { max_sets: u32 },
    DestroyPool,
    AllocateSet(vk::DescriptorSet),
    FreeSet(vk::DescriptorSet),
    WriteDescriptor { set: vk::DescriptorSet, binding: u32, buffer: vk::Buffer, range: vk::DeviceSize },
    AllocateCommandBuffers(u32),
    FreeCommandBuffers(usize),
    ResetCommandBuffer(vk::CommandBuffer),
    BeginCommandBuffer(vk::CommandBuffer),
    EndCommandBuffer(vk::CommandBuffer),
    CopyBuffer { src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize },
    Barrier { src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags },
    CreateFence(vk::Fence),
    DestroyFence(vk::Fence),
    WaitFence(vk::Fence),
    ResetFence(vk::Fence),
    Submit { command_buffer: vk::CommandBuffer, fence: vk::Fence },
    WaitIdle,
}

#[derive(Default)]
struct MockState {
    next_handle: u64,
    calls: Vec<Call>,
    buffers: HashMap<vk::Buffer, (vk::DeviceSize, MemoryLocation)>,
    contents: HashMap<vk::Buffer, Vec<u8>>,
    sets: HashSet<vk::DescriptorSet>,
    descriptor_targets: HashMap<vk::DescriptorSet, (u32, vk::Buffer, vk::DeviceSize)>,
    max_sets: u32,
    pool_alive: bool,
    live_command_buffers: usize,
    fences: HashMap<vk::Fence, bool>,
    hold_submissions: bool,
    fail_allocations: bool,
}

impl MockState {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

#[derive(Default)]
pub(crate) struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub(crate) fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    pub(crate) fn live_buffers(&self) -> usize {
        self.with(|s| s.buffers.len())
    }

    pub(crate) fn live_sets(&self) -> usize {
        self.with(|s| s.sets.len())
    }

    pub(crate) fn live_fences(&self) -> usize {
        self.with(|s| s.fences.len())
    }

    pub(crate) fn live_command_buffers(&self) -> usize {
        self.with(|s| s.live_command_buffers)
    }

    pub(crate) fn pool_alive(&self) -> bool {
        self.with(|s| s.pool_alive)
    }

    pub(crate) fn is_buffer_alive(&self, buffer: vk::Buffer) -> bool {
        self.with(|s| s.buffers.contains_key(&buffer))
    }

    pub(crate) fn buffer_contents(&self, buffer: vk::Buffer) -> Vec<u8> {
        self.with(|s| s.contents.get(&buffer).cloned().unwrap_or_default())
    }

    /// `(binding, buffer, range)` last written into a set
    pub(crate) fn descriptor_target(&self, set: vk::DescriptorSet) -> Option<(u32, vk::Buffer, vk::DeviceSize)> {
        self.with(|s| s.descriptor_targets.get(&set).copied())
    }

    pub(crate) fn is_fence_signaled(&self, fence: vk::Fence) -> bool {
        self.with(|s| s.fences.get(&fence).copied().unwrap_or(false))
    }

    /// Keep fences of later submissions unsignaled
    pub(crate) fn hold_submissions(&self, hold: bool) {
        self.with(|s| s.hold_submissions = hold);
    }

    /// Make every following buffer creation fail with out-of-memory
    pub(crate) fn fail_allocations(&self, fail: bool) {
        self.with(|s| s.fail_allocations = fail);
    }
}

impl GpuDevice for MockDevice {
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        _usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> VulkanResult<GpuBuffer> {
        self.with(|s| {
            if s.fail_allocations {
                return Err(VulkanError::OutOfMemory { requested: size });
            }
            let buffer = vk::Buffer::from_raw(s.handle());
            let memory = vk::DeviceMemory::from_raw(s.handle());
            s.buffers.insert(buffer, (size, location));
            s.calls.push(Call::CreateBuffer { buffer, size, location });
            Ok(GpuBuffer { buffer, memory, size })
        })
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        self.with(|s| {
            assert!(s.buffers.remove(&buffer.buffer).is_some(), "destroying dead buffer {:?}", buffer.buffer);
            s.contents.remove(&buffer.buffer);
            s.calls.push(Call::DestroyBuffer(buffer.buffer));
        });
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: vk::DeviceSize, data: &[u8]) -> VulkanResult<()> {
        self.with(|s| {
            let (size, location) = *s.buffers.get(&buffer.buffer).expect("write into dead buffer");
            assert_eq!(location, MemoryLocation::HostVisible, "write into device-local buffer");
            assert!(offset + data.len() as u64 <= size, "write past end of buffer");
            let contents = s.contents.entry(buffer.buffer).or_insert_with(|| vec![0; size as usize]);
            contents[offset as usize..offset as usize + data.len()].copy_from_slice(data);
            s.calls.push(Call::WriteBuffer {
                buffer: buffer.buffer,
                offset,
                len: data.len(),
            });
            Ok(())
        })
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        _pool_sizes: &[vk::DescriptorPoolSize],
    ) -> VulkanResult<vk::DescriptorPool> {
        self.with(|s| {
            s.max_sets = max_sets;
            s.pool_alive = true;
            s.calls.push(Call::CreatePool { max_sets });
            Ok(vk::DescriptorPool::from_raw(s.handle()))
        })
    }

    fn destroy_descriptor_pool(&self, _pool: vk::DescriptorPool) {
        self.with(|s| {
            s.pool_alive = false;
            s.sets.clear();
            s.calls.push(Call::DestroyPool);
        });
    }

    fn allocate_descriptor_set(
        &self,
        _pool: vk::DescriptorPool,
        _layout: vk::DescriptorSetLayout,
    ) -> VulkanResult<vk::DescriptorSet> {
        self.with(|s| {
            if s.sets.len() as u32 >= s.max_sets {
                return Err(VulkanError::DescriptorPoolExhausted);
            }
            let set = vk::DescriptorSet::from_raw(s.handle());
            s.sets.insert(set);
            s.calls.push(Call::AllocateSet(set));
            Ok(set)
        })
    }

    fn free_descriptor_set(&self, _pool: vk::DescriptorPool, set: vk::DescriptorSet) -> VulkanResult<()> {
        self.with(|s| {
            assert!(s.sets.remove(&set), "freeing dead descriptor set {:?}", set);
            s.descriptor_targets.remove(&set);
            s.calls.push(Call::FreeSet(set));
            Ok(())
        })
    }

    fn write_buffer_descriptor(
        &self,
        set: vk::DescriptorSet,
        binding: u32,
        _descriptor_type: vk::DescriptorType,
        buffer: vk::Buffer,
        range: vk::DeviceSize,
    ) {
        self.with(|s| {
            assert!(s.sets.contains(&set), "writing dead descriptor set");
            assert!(s.buffers.contains_key(&buffer), "descriptor points at dead buffer");
            s.descriptor_targets.insert(set, (binding, buffer, range));
            s.calls.push(Call::WriteDescriptor { set, binding, buffer, range });
        });
    }

    fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        self.with(|s| {
            s.live_command_buffers += count as usize;
            s.calls.push(Call::AllocateCommandBuffers(count));
            Ok((0..count).map(|_| vk::CommandBuffer::from_raw(s.handle())).collect())
        })
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        self.with(|s| {
            s.live_command_buffers -= command_buffers.len();
            s.calls.push(Call::FreeCommandBuffers(command_buffers.len()));
        });
    }

    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.with(|s| s.calls.push(Call::ResetCommandBuffer(command_buffer)));
        Ok(())
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.with(|s| s.calls.push(Call::BeginCommandBuffer(command_buffer)));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.with(|s| s.calls.push(Call::EndCommandBuffer(command_buffer)));
        Ok(())
    }

    fn cmd_copy_buffer(&self, _command_buffer: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) {
        self.with(|s| {
            let (src_size, _) = *s.buffers.get(&src).expect("copy from dead buffer");
            let (dst_size, _) = *s.buffers.get(&dst).expect("copy into dead buffer");
            assert!(size <= src_size && size <= dst_size, "copy past end of buffer");
            s.calls.push(Call::CopyBuffer { src, dst, size });
        });
    }

    fn cmd_memory_barrier(
        &self,
        _command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        _barrier: vk::MemoryBarrier,
    ) {
        self.with(|s| s.calls.push(Call::Barrier { src_stage, dst_stage }));
    }

    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence> {
        self.with(|s| {
            let fence = vk::Fence::from_raw(s.handle());
            s.fences.insert(fence, signaled);
            s.calls.push(Call::CreateFence(fence));
            Ok(fence)
        })
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        self.with(|s| {
            assert!(s.fences.remove(&fence).is_some(), "destroying dead fence");
            s.calls.push(Call::DestroyFence(fence));
        });
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VulkanResult<()> {
        self.with(|s| {
            s.calls.push(Call::WaitFence(fence));
            if s.fences.get(&fence).copied().unwrap_or(false) {
                Ok(())
            } else {
                Err(VulkanError::FenceTimeout { timeout_ns })
            }
        })
    }

    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()> {
        self.with(|s| {
            s.fences.insert(fence, false);
            s.calls.push(Call::ResetFence(fence));
            Ok(())
        })
    }

    fn submit(&self, command_buffer: vk::CommandBuffer, fence: vk::Fence) -> VulkanResult<()> {
        self.with(|s| {
            let signaled = !s.hold_submissions;
            s.fences.insert(fence, signaled);
            s.calls.push(Call::Submit { command_buffer, fence });
            Ok(())
        })
    }

    fn wait_idle(&self) -> VulkanResult<()> {
        self.with(|s| {
            s.calls.push(Call::WaitIdle);
            // Everything submitted has completed
            for signaled in s.fences.values_mut() {
                *signaled = true;
            }
            Ok(())
        })
    }
}
