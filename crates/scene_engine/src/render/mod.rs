//! # Rendering resources
//!
//! GPU-side half of the scene core: the per-frame-in-flight resource
//! workspaces pipelines draw from, the fence ring that paces them, and the
//! Vulkan backend behind the [`GpuDevice`] seam.
//!
//! ## Frame loop
//!
//! ```text
//! let ws = ring.acquire()?;                      // blocks on the workspace fence
//! let mut frame = workspaces.begin_frame(ws)?;   // reset + begin
//! frame.upload_slice(pipeline, instances, &data)?;
//! frame.finish_uploads();                        // single barrier
//! // record draws with frame.command_buffer() / frame.descriptor_set(..)
//! let cmd = frame.end()?;
//! ring.submit(ws, cmd)?;
//! ```

pub mod device;
pub mod frame_ring;
pub mod vulkan;
pub mod workspace;

#[cfg(test)]
pub(crate) mod mock;

pub use device::{GpuBuffer, GpuDevice, MemoryLocation};
pub use frame_ring::FrameRing;
pub use vulkan::{VulkanDevice, VulkanError, VulkanResult};
pub use workspace::{
    BlockKind, BlockSlot, BlockSlotId, BufferPair, FrameRecorder, GlobalBufferDesc, GlobalId, PipelineDeclaration,
    PipelineId, SlotBinding, TextureSlot, WorkspaceManager,
};
