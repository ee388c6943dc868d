//! Descriptor set layouts, pools and buffer descriptor writes

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};
use crate::render::workspace::BlockKind;

/// Builder for the descriptor set layouts pipeline owners declare slots with
#[derive(Debug, Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Create an empty layout builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a buffer-backed block binding
    pub fn add_block(mut self, binding: u32, kind: BlockKind, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(kind.descriptor_type())
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Add a combined image sampler binding
    pub fn add_combined_image_sampler(mut self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Bindings collected so far
    pub fn bindings(&self) -> &[vk::DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Create the layout; the caller owns and destroys it
    pub fn build(self, device: &Device) -> VulkanResult<vk::DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        unsafe { device.create_descriptor_set_layout(&layout_info, None) }.map_err(VulkanError::Api)
    }
}

/// Create a pool whose sets can be freed individually
pub fn create_pool(
    device: &Device,
    max_sets: u32,
    pool_sizes: &[vk::DescriptorPoolSize],
) -> VulkanResult<vk::DescriptorPool> {
    let pool_info = vk::DescriptorPoolCreateInfo::builder()
        .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
        .max_sets(max_sets)
        .pool_sizes(pool_sizes);

    unsafe { device.create_descriptor_pool(&pool_info, None) }.map_err(VulkanError::Api)
}

/// Allocate a single set
pub fn allocate_set(
    device: &Device,
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
) -> VulkanResult<vk::DescriptorSet> {
    let layouts = [layout];
    let alloc_info = vk::DescriptorSetAllocateInfo::builder()
        .descriptor_pool(pool)
        .set_layouts(&layouts);

    let sets = unsafe { device.allocate_descriptor_sets(&alloc_info) }
        .map_err(VulkanError::from_descriptor_allocation)?;
    sets.into_iter().next().ok_or(VulkanError::DescriptorPoolExhausted)
}

/// Return a set to its pool
pub fn free_set(device: &Device, pool: vk::DescriptorPool, set: vk::DescriptorSet) -> VulkanResult<()> {
    unsafe { device.free_descriptor_sets(pool, &[set]) }.map_err(VulkanError::Api)
}

/// Point one buffer binding at `buffer[0..range]`
pub fn write_buffer(
    device: &Device,
    set: vk::DescriptorSet,
    binding: u32,
    descriptor_type: vk::DescriptorType,
    buffer: vk::Buffer,
    range: vk::DeviceSize,
) {
    let buffer_info = [vk::DescriptorBufferInfo::builder()
        .buffer(buffer)
        .offset(0)
        .range(range)
        .build()];

    let write = vk::WriteDescriptorSet::builder()
        .dst_set(set)
        .dst_binding(binding)
        .dst_array_element(0)
        .descriptor_type(descriptor_type)
        .buffer_info(&buffer_info)
        .build();

    unsafe {
        device.update_descriptor_sets(&[write], &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_builder_collects_bindings() {
        let builder = DescriptorSetLayoutBuilder::new()
            .add_block(0, BlockKind::Uniform, vk::ShaderStageFlags::VERTEX)
            .add_block(1, BlockKind::Storage, vk::ShaderStageFlags::VERTEX)
            .add_combined_image_sampler(2, vk::ShaderStageFlags::FRAGMENT);

        let bindings = builder.bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::STORAGE_BUFFER);
        assert_eq!(bindings[2].binding, 2);
    }
}
