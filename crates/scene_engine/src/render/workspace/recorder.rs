//! Per-frame upload protocol
//!
//! A [`FrameRecorder`] borrows one workspace for the duration of a frame and
//! only allows the protocol order:
//!
//! 1. [`WorkspaceManager::begin_frame`] resets and begins the command buffer
//! 2. [`upload`](FrameRecorder::upload) / [`upload_global`](FrameRecorder::upload_global)
//!    write host buffers and record host to device copies
//! 3. [`finish_uploads`](FrameRecorder::finish_uploads) records one barrier
//! 4. draws are recorded against [`command_buffer`](FrameRecorder::command_buffer)
//! 5. [`end`](FrameRecorder::end) closes the command buffer for submission
//!
//! Calls out of order panic.

use std::sync::Arc;

use ash::vk;
use bytemuck::Pod;
use log::trace;

use crate::render::device::GpuDevice;
use crate::render::vulkan::{MemoryBarrierBuilder, VulkanResult};
use crate::render::workspace::declaration::{BlockSlotId, GlobalId, PipelineId};
use crate::render::workspace::manager::{SlotBinding, WorkspaceManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uploading,
    Drawing,
}

/// Recording session for one workspace
pub struct FrameRecorder<'a, D: GpuDevice> {
    manager: &'a mut WorkspaceManager<D>,
    workspace: usize,
    command_buffer: vk::CommandBuffer,
    phase: Phase,
    uploaded: Vec<(PipelineId, BlockSlotId)>,
    uploaded_globals: Vec<GlobalId>,
    uploaded_bytes: u64,
}

impl<D: GpuDevice> WorkspaceManager<D> {
    /// Reset and begin the workspace's command buffer
    ///
    /// The caller must already hold the workspace exclusively, i.e. its
    /// previous submission has completed.
    pub fn begin_frame(&mut self, workspace: usize) -> VulkanResult<FrameRecorder<'_, D>> {
        let command_buffer = self.command_buffer(workspace);
        self.device().reset_command_buffer(command_buffer)?;
        self.device().begin_command_buffer(command_buffer)?;

        Ok(FrameRecorder {
            manager: self,
            workspace,
            command_buffer,
            phase: Phase::Uploading,
            uploaded: Vec::new(),
            uploaded_globals: Vec::new(),
            uploaded_bytes: 0,
        })
    }
}

impl<'a, D: GpuDevice> FrameRecorder<'a, D> {
    /// Workspace being recorded
    pub fn workspace(&self) -> usize {
        self.workspace
    }

    /// Device for recording draw commands
    pub fn device(&self) -> &Arc<D> {
        self.manager.device()
    }

    /// Write `data` into a slot and record its host to device copy
    ///
    /// Grows the slot first when it is too small. Empty data is a no-op.
    /// Each slot may be uploaded at most once per frame.
    pub fn upload(&mut self, pipeline: PipelineId, slot: BlockSlotId, data: &[u8]) -> VulkanResult<()> {
        assert!(self.phase == Phase::Uploading, "upload: called after finish_uploads");
        assert!(
            self.manager.slot_binding(self.workspace, pipeline, slot) == SlotBinding::Owned,
            "upload: slot {} of pipeline {} is bound to a global buffer, use upload_global",
            slot.index(),
            pipeline.index()
        );
        assert!(
            !self.uploaded.contains(&(pipeline, slot)),
            "upload: slot {} of pipeline {} already uploaded this frame",
            slot.index(),
            pipeline.index()
        );
        if data.is_empty() {
            return Ok(());
        }

        let size = data.len() as vk::DeviceSize;
        self.manager.ensure_capacity(self.workspace, pipeline, slot, size)?;
        let pair = *self.manager.buffer_pair(self.workspace, pipeline, slot);

        let device = self.manager.device();
        device.write_buffer(&pair.host, 0, data)?;
        device.cmd_copy_buffer(self.command_buffer, pair.host.buffer, pair.device.buffer, size);

        self.uploaded.push((pipeline, slot));
        self.uploaded_bytes += size;
        trace!(
            "Workspace {} upload {} bytes to slot {} of pipeline {} (capacity {})",
            self.workspace,
            size,
            slot.index(),
            pipeline.index(),
            pair.capacity()
        );
        Ok(())
    }

    /// [`upload`](Self::upload) for a slice of GPU-layout structs
    pub fn upload_slice<T: Pod>(&mut self, pipeline: PipelineId, slot: BlockSlotId, items: &[T]) -> VulkanResult<()> {
        self.upload(pipeline, slot, bytemuck::cast_slice(items))
    }

    /// Write `data` into a global buffer and record its copy
    ///
    /// Global buffers never grow; `data` must fit the declared size.
    pub fn upload_global(&mut self, global: GlobalId, data: &[u8]) -> VulkanResult<()> {
        assert!(self.phase == Phase::Uploading, "upload_global: called after finish_uploads");
        let desc = self.manager.global_desc(global);
        let size = data.len() as vk::DeviceSize;
        assert!(
            size <= desc.size,
            "upload_global: {} bytes do not fit global '{}' of {} bytes",
            size,
            desc.name,
            desc.size
        );
        assert!(
            !self.uploaded_globals.contains(&global),
            "upload_global: global '{}' already uploaded this frame",
            desc.name
        );
        if data.is_empty() {
            return Ok(());
        }

        let pair = *self.manager.global_pair(self.workspace, global);
        let device = self.manager.device();
        device.write_buffer(&pair.host, 0, data)?;
        device.cmd_copy_buffer(self.command_buffer, pair.host.buffer, pair.device.buffer, size);

        self.uploaded_globals.push(global);
        self.uploaded_bytes += size;
        trace!("Workspace {} upload {} bytes to global {}", self.workspace, size, global.index());
        Ok(())
    }

    /// Record the barrier that makes every copy visible to shader reads
    ///
    /// Nothing is recorded when no copy happened this frame.
    pub fn finish_uploads(&mut self) {
        assert!(self.phase == Phase::Uploading, "finish_uploads: called twice");
        let copies = self.uploaded.len() + self.uploaded_globals.len();
        if copies > 0 {
            self.manager.device().cmd_memory_barrier(
                self.command_buffer,
                MemoryBarrierBuilder::UPLOAD_SRC_STAGE,
                MemoryBarrierBuilder::UPLOAD_DST_STAGE,
                MemoryBarrierBuilder::buffer_transfer_to_shader_read(),
            );
        }
        self.phase = Phase::Drawing;
        trace!(
            "Workspace {}: {} copies, {} bytes uploaded",
            self.workspace,
            copies,
            self.uploaded_bytes
        );
    }

    /// Command buffer to record draws into
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        assert!(self.phase == Phase::Drawing, "command_buffer: draws recorded before finish_uploads");
        self.command_buffer
    }

    /// Descriptor set to bind for a slot
    pub fn descriptor_set(&self, pipeline: PipelineId, slot: BlockSlotId) -> vk::DescriptorSet {
        assert!(self.phase == Phase::Drawing, "descriptor_set: requested before finish_uploads");
        self.manager.descriptor_set(self.workspace, pipeline, slot)
    }

    /// End recording and hand back the command buffer for submission
    pub fn end(self) -> VulkanResult<vk::CommandBuffer> {
        assert!(self.phase == Phase::Drawing, "end: called before finish_uploads");
        self.manager.device().end_command_buffer(self.command_buffer)?;
        Ok(self.command_buffer)
    }
}
