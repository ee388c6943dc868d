//! Pipeline slot declarations and the typed ids they resolve to

use ash::vk;

/// Descriptor kind of a buffer-backed block slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Uniform buffer
    Uniform,
    /// Storage buffer
    Storage,
}

impl BlockKind {
    /// Descriptor type written for this kind
    pub fn descriptor_type(self) -> vk::DescriptorType {
        match self {
            BlockKind::Uniform => vk::DescriptorType::UNIFORM_BUFFER,
            BlockKind::Storage => vk::DescriptorType::STORAGE_BUFFER,
        }
    }

    /// Usage of the device-local half of a buffer pair
    pub fn device_usage(self) -> vk::BufferUsageFlags {
        let usage = match self {
            BlockKind::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BlockKind::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
        };
        usage | vk::BufferUsageFlags::TRANSFER_DST
    }

    /// Usage of the host-visible staging half of a buffer pair
    pub fn host_usage(self) -> vk::BufferUsageFlags {
        vk::BufferUsageFlags::TRANSFER_SRC
    }
}

/// A buffer-backed descriptor slot declared by a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSlot {
    /// Name the slot is resolved by
    pub name: String,
    /// Uniform or storage
    pub kind: BlockKind,
    /// Layout of the set this slot is allocated with; owned by the pipeline
    pub layout: vk::DescriptorSetLayout,
    /// Binding number written inside that set
    pub binding: u32,
}

impl BlockSlot {
    /// Declare a uniform buffer slot
    pub fn uniform(name: impl Into<String>, layout: vk::DescriptorSetLayout, binding: u32) -> Self {
        Self {
            name: name.into(),
            kind: BlockKind::Uniform,
            layout,
            binding,
        }
    }

    /// Declare a storage buffer slot
    pub fn storage(name: impl Into<String>, layout: vk::DescriptorSetLayout, binding: u32) -> Self {
        Self {
            name: name.into(),
            kind: BlockKind::Storage,
            layout,
            binding,
        }
    }
}

/// A texture slot declared by a pipeline
///
/// The manager never allocates for texture slots; it keeps them so pipeline
/// owners can look their layouts up next to the block slots.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    /// Semantic tag such as `"albedo"` or `"environment"`
    pub tag: String,
    /// Layout the pipeline allocates texture sets with
    pub layout: vk::DescriptorSetLayout,
}

/// Everything a pipeline tells the workspace manager about itself
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDeclaration {
    /// Pipeline name
    pub name: String,
    /// Ordered block slots
    pub block_slots: Vec<BlockSlot>,
    /// Ordered texture slots
    pub texture_slots: Vec<TextureSlot>,
}

impl PipelineDeclaration {
    /// Declare a pipeline without slots
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block_slots: Vec::new(),
            texture_slots: Vec::new(),
        }
    }

    /// Append a block slot
    pub fn with_block(mut self, slot: BlockSlot) -> Self {
        self.block_slots.push(slot);
        self
    }

    /// Append a texture slot
    pub fn with_texture(mut self, tag: impl Into<String>, layout: vk::DescriptorSetLayout) -> Self {
        self.texture_slots.push(TextureSlot {
            tag: tag.into(),
            layout,
        });
        self
    }
}

/// A named buffer pair shared by every pipeline in a workspace
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBufferDesc {
    /// Name the buffer is resolved by
    pub name: String,
    /// Uniform or storage
    pub kind: BlockKind,
    /// Fixed size in bytes
    pub size: vk::DeviceSize,
}

impl GlobalBufferDesc {
    /// Describe a global buffer
    pub fn new(name: impl Into<String>, kind: BlockKind, size: vk::DeviceSize) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }
}

/// Registered pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub(crate) usize);

/// Block slot of a pipeline, by declaration position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSlotId(pub(crate) usize);

/// Global buffer, by declaration position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(pub(crate) usize);

macro_rules! impl_index {
    ($($id:ident),*) => {$(
        impl $id {
            /// Raw index
            pub fn index(self) -> usize {
                self.0
            }

            /// Id for a raw index; out-of-range ids panic when used
            pub fn from_index(index: usize) -> Self {
                Self(index)
            }
        }
    )*};
}

impl_index!(PipelineId, BlockSlotId, GlobalId);
