//! Buffer creation, destruction and host writes
//!
//! Memory is allocated per buffer with an explicit memory-type search; host
//! writes go through map, copy, unmap.

use ash::{vk, Device};

use crate::render::device::{GpuBuffer, MemoryLocation};
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Create a buffer with dedicated memory in `location`
pub fn create_buffer(
    device: &Device,
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    location: MemoryLocation,
) -> VulkanResult<GpuBuffer> {
    let buffer_info = vk::BufferCreateInfo::builder()
        .size(size)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    let buffer = unsafe {
        device.create_buffer(&buffer_info, None)
            .map_err(|e| VulkanError::from_allocation(e, size))?
    };

    let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

    let memory_type_index = match find_memory_type(
        memory_properties,
        mem_requirements.memory_type_bits,
        location.property_flags(),
    ) {
        Ok(index) => index,
        Err(e) => {
            unsafe { device.destroy_buffer(buffer, None) };
            return Err(e);
        }
    };

    let alloc_info = vk::MemoryAllocateInfo::builder()
        .allocation_size(mem_requirements.size)
        .memory_type_index(memory_type_index);

    let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
        Ok(memory) => memory,
        Err(e) => {
            unsafe { device.destroy_buffer(buffer, None) };
            return Err(VulkanError::from_allocation(e, mem_requirements.size));
        }
    };

    if let Err(e) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
        unsafe {
            device.destroy_buffer(buffer, None);
            device.free_memory(memory, None);
        }
        return Err(VulkanError::Api(e));
    }

    Ok(GpuBuffer { buffer, memory, size })
}

/// Destroy a buffer and free its memory; the null buffer is ignored
pub fn destroy_buffer(device: &Device, buffer: &GpuBuffer) {
    if buffer.is_null() {
        return;
    }
    unsafe {
        device.destroy_buffer(buffer.buffer, None);
        device.free_memory(buffer.memory, None);
    }
}

/// Copy bytes into a host-visible buffer
pub fn write_buffer(device: &Device, buffer: &GpuBuffer, offset: vk::DeviceSize, data: &[u8]) -> VulkanResult<()> {
    if data.is_empty() {
        return Ok(());
    }

    let data_ptr = unsafe {
        device.map_memory(
            buffer.memory,
            offset,
            data.len() as vk::DeviceSize,
            vk::MemoryMapFlags::empty(),
        ).map_err(VulkanError::Api)?
    };

    unsafe {
        std::ptr::copy_nonoverlapping(data.as_ptr(), data_ptr.cast::<u8>(), data.len());
        device.unmap_memory(buffer.memory);
    }
    Ok(())
}

/// Find a memory type allowed by `type_filter` that has every flag in `properties`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            (type_filter & (1 << i)) != 0
                && memory_properties.memory_types[i as usize].property_flags.contains(properties)
        })
        .ok_or(VulkanError::NoSuitableMemoryType)
}
