//! Resource workspaces
//!
//! Pipelines declare their buffer-backed descriptor slots once; the
//! [`WorkspaceManager`] then owns a host/device buffer pair and a descriptor
//! set per slot in each of `frames_in_flight` workspaces, and a
//! [`FrameRecorder`] walks one workspace through the per-frame upload protocol.

mod declaration;
mod growth;
mod manager;
mod recorder;

pub use declaration::{
    BlockKind, BlockSlot, BlockSlotId, GlobalBufferDesc, GlobalId, PipelineDeclaration, PipelineId, TextureSlot,
};
pub use growth::{grown_capacity, needs_growth};
pub use manager::{descriptor_pool_sizes, BufferPair, SlotBinding, WorkspaceManager};
pub use recorder::FrameRecorder;
