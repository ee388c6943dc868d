//! Per-frame-in-flight buffer pairs and their descriptor sets
//!
//! A workspace holds everything one in-flight frame writes: a command buffer,
//! one [`BufferPair`] per declared block slot of every pipeline, and one pair
//! per global buffer. The manager owns all of it; pipelines only own the
//! descriptor set layouts.
//!
//! The manager never waits on fences. Callers hand it a workspace index only
//! after the previous submission from that workspace has completed (see
//! [`FrameRing`](crate::render::FrameRing)).

use std::sync::Arc;

use ash::vk;
use log::{debug, info, warn};

use crate::core::config::RendererConfig;
use crate::render::device::{GpuBuffer, GpuDevice, MemoryLocation};
use crate::render::vulkan::VulkanResult;
use crate::render::workspace::declaration::{
    BlockKind, BlockSlot, BlockSlotId, GlobalBufferDesc, GlobalId, PipelineDeclaration, PipelineId, TextureSlot,
};
use crate::render::workspace::growth::{grown_capacity, needs_growth};

/// Host staging buffer, device buffer and the descriptor set bound to the latter
///
/// `host.size == device.size` always holds. All three are null for a slot
/// that has not been allocated or was updated to zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferPair {
    /// Host-visible staging buffer
    pub host: GpuBuffer,
    /// Device-local buffer shaders read
    pub device: GpuBuffer,
    /// Set whose slot binding points at `device`; null for global pairs
    pub descriptor_set: vk::DescriptorSet,
}

impl BufferPair {
    /// Allocated bytes
    pub fn capacity(&self) -> vk::DeviceSize {
        self.host.size
    }
}

/// What a block slot's descriptor set points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotBinding {
    /// The slot's own buffer pair
    #[default]
    Owned,
    /// A global buffer of the same workspace
    Global(GlobalId),
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    pair: BufferPair,
    binding: SlotBinding,
}

#[derive(Debug)]
struct Workspace {
    command_buffer: vk::CommandBuffer,
    slots: Vec<Vec<SlotState>>,
    globals: Vec<BufferPair>,
}

/// Descriptor pool capacity for a set of declarations
///
/// Returns `(max_sets, pool_sizes)`. Every block slot needs one set per
/// workspace; `headroom` adds that many extra sets per workspace.
pub fn descriptor_pool_sizes(
    declarations: &[PipelineDeclaration],
    workspaces: u32,
    headroom: u32,
) -> (u32, Vec<vk::DescriptorPoolSize>) {
    let count = |kind: BlockKind| -> u32 {
        declarations
            .iter()
            .flat_map(|d| d.block_slots.iter())
            .filter(|slot| slot.kind == kind)
            .count() as u32
    };

    let mut total = 0;
    let mut pool_sizes = Vec::new();
    for kind in [BlockKind::Uniform, BlockKind::Storage] {
        let slots = count(kind);
        total += slots;
        if slots > 0 {
            pool_sizes.push(vk::DescriptorPoolSize {
                ty: kind.descriptor_type(),
                descriptor_count: (slots + headroom) * workspaces,
            });
        }
    }

    let max_sets = ((total + headroom) * workspaces).max(1);
    (max_sets, pool_sizes)
}

/// Owner of every workspace's buffers, descriptor sets and command buffer
pub struct WorkspaceManager<D: GpuDevice> {
    device: Arc<D>,
    declarations: Vec<PipelineDeclaration>,
    global_descs: Vec<GlobalBufferDesc>,
    workspaces: Vec<Workspace>,
    descriptor_pool: vk::DescriptorPool,
    block_size: vk::DeviceSize,
}

impl<D: GpuDevice> WorkspaceManager<D> {
    /// Create `config.frames_in_flight` workspaces for the given pipelines
    ///
    /// Block slots start unallocated. Global buffers are allocated at their
    /// fixed size in every workspace.
    pub fn new(
        device: Arc<D>,
        declarations: Vec<PipelineDeclaration>,
        global_descs: Vec<GlobalBufferDesc>,
        config: &RendererConfig,
    ) -> VulkanResult<Self> {
        let count = config.frames_in_flight;
        assert!(count > 0, "WorkspaceManager::new: at least one workspace is required");
        assert!(config.upload_block_size > 0, "WorkspaceManager::new: block size must be non-zero");
        for global in &global_descs {
            assert!(global.size > 0, "WorkspaceManager::new: global buffer '{}' has zero size", global.name);
        }

        let (max_sets, pool_sizes) =
            descriptor_pool_sizes(&declarations, count as u32, config.descriptor_pool_headroom);
        let descriptor_pool = device.create_descriptor_pool(max_sets, &pool_sizes)?;

        let mut manager = Self {
            device,
            declarations,
            global_descs,
            workspaces: Vec::with_capacity(count),
            descriptor_pool,
            block_size: config.upload_block_size,
        };

        // From here on, Drop releases whatever has been created if a step fails
        let command_buffers = manager.device.allocate_command_buffers(count as u32)?;
        for command_buffer in command_buffers {
            let slots = manager
                .declarations
                .iter()
                .map(|d| vec![SlotState::default(); d.block_slots.len()])
                .collect();
            manager.workspaces.push(Workspace {
                command_buffer,
                slots,
                globals: Vec::with_capacity(manager.global_descs.len()),
            });
            let index = manager.workspaces.len() - 1;

            for g in 0..manager.global_descs.len() {
                let desc = &manager.global_descs[g];
                let (host, device_buffer) = manager.create_pair(desc.kind, desc.size)?;
                manager.workspaces[index].globals.push(BufferPair {
                    host,
                    device: device_buffer,
                    descriptor_set: vk::DescriptorSet::null(),
                });
            }
        }

        info!(
            "Created workspace manager: {} workspaces, {} pipelines, {} globals, pool of {} sets",
            count,
            manager.declarations.len(),
            manager.global_descs.len(),
            max_sets
        );
        Ok(manager)
    }

    /// The device all resources live on
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Number of workspaces
    pub fn num_workspaces(&self) -> usize {
        self.workspaces.len()
    }

    /// Growth block size
    pub fn block_size(&self) -> vk::DeviceSize {
        self.block_size
    }

    /// Resolve a pipeline by name
    pub fn pipeline_id(&self, name: &str) -> Option<PipelineId> {
        self.declarations.iter().position(|d| d.name == name).map(PipelineId)
    }

    /// Resolve a block slot of a pipeline by name
    pub fn block_slot_id(&self, pipeline: PipelineId, name: &str) -> Option<BlockSlotId> {
        self.declaration(pipeline)
            .block_slots
            .iter()
            .position(|slot| slot.name == name)
            .map(BlockSlotId)
    }

    /// Resolve a global buffer by name
    pub fn global_id(&self, name: &str) -> Option<GlobalId> {
        self.global_descs.iter().position(|g| g.name == name).map(GlobalId)
    }

    /// Declaration a pipeline was registered with
    pub fn declaration(&self, pipeline: PipelineId) -> &PipelineDeclaration {
        assert!(
            pipeline.0 < self.declarations.len(),
            "pipeline index {} out of range ({} pipelines)",
            pipeline.0,
            self.declarations.len()
        );
        &self.declarations[pipeline.0]
    }

    /// Texture slots of a pipeline
    pub fn texture_slots(&self, pipeline: PipelineId) -> &[TextureSlot] {
        &self.declaration(pipeline).texture_slots
    }

    /// Command buffer of a workspace
    pub fn command_buffer(&self, workspace: usize) -> vk::CommandBuffer {
        self.workspace(workspace).command_buffer
    }

    /// Buffer pair of a block slot
    pub fn buffer_pair(&self, workspace: usize, pipeline: PipelineId, slot: BlockSlotId) -> &BufferPair {
        &self.slot(workspace, pipeline, slot).pair
    }

    /// What a block slot's descriptor set points at
    pub fn slot_binding(&self, workspace: usize, pipeline: PipelineId, slot: BlockSlotId) -> SlotBinding {
        self.slot(workspace, pipeline, slot).binding
    }

    /// Descriptor set of a block slot, null while unallocated
    pub fn descriptor_set(&self, workspace: usize, pipeline: PipelineId, slot: BlockSlotId) -> vk::DescriptorSet {
        self.slot(workspace, pipeline, slot).pair.descriptor_set
    }

    /// Buffer pair of a global buffer
    pub fn global_pair(&self, workspace: usize, global: GlobalId) -> &BufferPair {
        let ws = self.workspace(workspace);
        assert!(
            global.0 < ws.globals.len(),
            "global index {} out of range ({} globals)",
            global.0,
            ws.globals.len()
        );
        &ws.globals[global.0]
    }

    /// Reallocate a slot's buffer pair to exactly `size` bytes and rebind its descriptor
    ///
    /// The previous buffers and descriptor set are released first. A zero
    /// size leaves the slot empty.
    pub fn update_descriptor(
        &mut self,
        workspace: usize,
        pipeline: PipelineId,
        slot: BlockSlotId,
        size: vk::DeviceSize,
    ) -> VulkanResult<()> {
        let decl = self.block_slot(pipeline, slot).clone();
        let old = std::mem::take(self.slot_mut(workspace, pipeline, slot));
        self.release_slot(&old);

        if size > 0 {
            let (host, device_buffer) = self.create_pair(decl.kind, size)?;
            let descriptor_set = match self.device.allocate_descriptor_set(self.descriptor_pool, decl.layout) {
                Ok(set) => set,
                Err(e) => {
                    self.device.destroy_buffer(&host);
                    self.device.destroy_buffer(&device_buffer);
                    return Err(e);
                }
            };
            self.device.write_buffer_descriptor(
                descriptor_set,
                decl.binding,
                decl.kind.descriptor_type(),
                device_buffer.buffer,
                size,
            );

            *self.slot_mut(workspace, pipeline, slot) = SlotState {
                pair: BufferPair {
                    host,
                    device: device_buffer,
                    descriptor_set,
                },
                binding: SlotBinding::Owned,
            };
        }

        debug!(
            "Workspace {} '{}'/'{}': {} -> {} bytes",
            workspace,
            self.declarations[pipeline.0].name,
            decl.name,
            old.pair.capacity(),
            size
        );
        Ok(())
    }

    /// [`update_descriptor`](Self::update_descriptor) in every workspace
    pub fn update_all_descriptors(
        &mut self,
        pipeline: PipelineId,
        slot: BlockSlotId,
        size: vk::DeviceSize,
    ) -> VulkanResult<()> {
        for workspace in 0..self.workspaces.len() {
            self.update_descriptor(workspace, pipeline, slot, size)?;
        }
        Ok(())
    }

    /// Grow a slot so it holds at least `required` bytes
    ///
    /// Grows to the next whole block past `required` when the slot is
    /// unallocated or too small, and never shrinks. Returns whether the slot
    /// was reallocated.
    pub fn ensure_capacity(
        &mut self,
        workspace: usize,
        pipeline: PipelineId,
        slot: BlockSlotId,
        required: vk::DeviceSize,
    ) -> VulkanResult<bool> {
        let state = self.slot(workspace, pipeline, slot);
        assert!(
            state.binding == SlotBinding::Owned,
            "ensure_capacity: slot {} of pipeline {} is bound to a global buffer",
            slot.0,
            pipeline.0
        );
        if !needs_growth(state.pair.capacity(), required) {
            return Ok(false);
        }
        let capacity = grown_capacity(required, self.block_size);
        self.update_descriptor(workspace, pipeline, slot, capacity)?;
        Ok(true)
    }

    /// Point a slot's descriptor at a global buffer instead of its own pair
    pub fn bind_global(
        &mut self,
        workspace: usize,
        pipeline: PipelineId,
        slot: BlockSlotId,
        global: GlobalId,
    ) -> VulkanResult<()> {
        let decl = self.block_slot(pipeline, slot).clone();
        let global_pair = *self.global_pair(workspace, global);
        let global_desc = &self.global_descs[global.0];
        assert_eq!(
            decl.kind, global_desc.kind,
            "bind_global: slot '{}' and global '{}' differ in descriptor kind",
            decl.name, global_desc.name
        );

        let old = std::mem::take(self.slot_mut(workspace, pipeline, slot));
        self.release_slot(&old);

        let descriptor_set = self.device.allocate_descriptor_set(self.descriptor_pool, decl.layout)?;
        self.device.write_buffer_descriptor(
            descriptor_set,
            decl.binding,
            decl.kind.descriptor_type(),
            global_pair.device.buffer,
            global_pair.device.size,
        );

        *self.slot_mut(workspace, pipeline, slot) = SlotState {
            pair: BufferPair {
                descriptor_set,
                ..BufferPair::default()
            },
            binding: SlotBinding::Global(global),
        };
        debug!(
            "Workspace {} '{}'/'{}' bound to global '{}'",
            workspace, self.declarations[pipeline.0].name, decl.name, self.global_descs[global.0].name
        );
        Ok(())
    }

    /// [`bind_global`](Self::bind_global) in every workspace
    pub fn bind_global_all(&mut self, pipeline: PipelineId, slot: BlockSlotId, global: GlobalId) -> VulkanResult<()> {
        for workspace in 0..self.workspaces.len() {
            self.bind_global(workspace, pipeline, slot, global)?;
        }
        Ok(())
    }

    fn create_pair(&self, kind: BlockKind, size: vk::DeviceSize) -> VulkanResult<(GpuBuffer, GpuBuffer)> {
        let host = self.device.create_buffer(size, kind.host_usage(), MemoryLocation::HostVisible)?;
        let device_buffer = match self.device.create_buffer(size, kind.device_usage(), MemoryLocation::DeviceLocal) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.device.destroy_buffer(&host);
                return Err(e);
            }
        };
        assert_eq!(host.size, device_buffer.size, "buffer pair allocated with asymmetric sizes");
        Ok((host, device_buffer))
    }

    fn release_slot(&self, state: &SlotState) {
        self.release_pair(&state.pair);
    }

    fn release_pair(&self, pair: &BufferPair) {
        if pair.descriptor_set != vk::DescriptorSet::null() {
            if let Err(e) = self.device.free_descriptor_set(self.descriptor_pool, pair.descriptor_set) {
                warn!("Failed to free descriptor set: {}", e);
            }
        }
        if !pair.host.is_null() {
            self.device.destroy_buffer(&pair.host);
        }
        if !pair.device.is_null() {
            self.device.destroy_buffer(&pair.device);
        }
    }

    fn workspace(&self, workspace: usize) -> &Workspace {
        assert!(
            workspace < self.workspaces.len(),
            "workspace index {} out of range ({} workspaces)",
            workspace,
            self.workspaces.len()
        );
        &self.workspaces[workspace]
    }

    fn block_slot(&self, pipeline: PipelineId, slot: BlockSlotId) -> &BlockSlot {
        let decl = self.declaration(pipeline);
        assert!(
            slot.0 < decl.block_slots.len(),
            "slot index {} out of range for pipeline '{}' ({} slots)",
            slot.0,
            decl.name,
            decl.block_slots.len()
        );
        &decl.block_slots[slot.0]
    }

    pub(crate) fn global_desc(&self, global: GlobalId) -> &GlobalBufferDesc {
        assert!(
            global.0 < self.global_descs.len(),
            "global index {} out of range ({} globals)",
            global.0,
            self.global_descs.len()
        );
        &self.global_descs[global.0]
    }

    fn slot(&self, workspace: usize, pipeline: PipelineId, slot: BlockSlotId) -> &SlotState {
        self.block_slot(pipeline, slot);
        &self.workspace(workspace).slots[pipeline.0][slot.0]
    }

    fn slot_mut(&mut self, workspace: usize, pipeline: PipelineId, slot: BlockSlotId) -> &mut SlotState {
        self.block_slot(pipeline, slot);
        self.workspace(workspace);
        &mut self.workspaces[workspace].slots[pipeline.0][slot.0]
    }
}

impl<D: GpuDevice> Drop for WorkspaceManager<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("wait_idle failed while destroying workspaces: {}", e);
        }

        let workspaces = std::mem::take(&mut self.workspaces);
        let command_buffers: Vec<vk::CommandBuffer> = workspaces.iter().map(|ws| ws.command_buffer).collect();
        for ws in &workspaces {
            for state in ws.slots.iter().flatten() {
                // Sets go away with the pool
                self.release_pair(&BufferPair {
                    descriptor_set: vk::DescriptorSet::null(),
                    ..state.pair
                });
            }
            for pair in &ws.globals {
                self.release_pair(pair);
            }
        }

        self.device.free_command_buffers(&command_buffers);
        self.device.destroy_descriptor_pool(self.descriptor_pool);
        info!("Destroyed workspace manager ({} workspaces)", workspaces.len());
    }
}
