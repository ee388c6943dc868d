//! Round-robin workspace pacing
//!
//! Each workspace has a completion fence. [`FrameRing::acquire`] blocks on
//! the fence of the next workspace in turn, which bounds how many frames the
//! CPU runs ahead of the GPU to the number of workspaces.

use std::sync::Arc;

use ash::vk;
use log::{debug, info, warn};

use crate::core::config::RendererConfig;
use crate::render::device::GpuDevice;
use crate::render::vulkan::{VulkanError, VulkanResult};

/// Completion fences for a ring of workspaces
pub struct FrameRing<D: GpuDevice> {
    device: Arc<D>,
    fences: Vec<vk::Fence>,
    next: usize,
    timeout_ns: u64,
}

impl<D: GpuDevice> FrameRing<D> {
    /// One signaled fence per `config.frames_in_flight`
    pub fn new(device: Arc<D>, config: &RendererConfig) -> VulkanResult<Self> {
        assert!(config.frames_in_flight > 0, "FrameRing::new: at least one workspace is required");

        let mut ring = Self {
            device,
            fences: Vec::with_capacity(config.frames_in_flight),
            next: 0,
            timeout_ns: config.fence_timeout(),
        };
        for _ in 0..config.frames_in_flight {
            let fence = ring.device.create_fence(true)?;
            ring.fences.push(fence);
        }

        info!("Created frame ring with {} fences", ring.fences.len());
        Ok(ring)
    }

    /// Number of workspaces in the ring
    pub fn len(&self) -> usize {
        self.fences.len()
    }

    /// Always false; a ring has at least one workspace
    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    /// Workspace the next [`acquire`](Self::acquire) returns
    pub fn peek(&self) -> usize {
        self.next
    }

    /// Completion fence of a workspace
    pub fn fence(&self, workspace: usize) -> vk::Fence {
        assert!(
            workspace < self.fences.len(),
            "fence: workspace index {} out of range ({} workspaces)",
            workspace,
            self.fences.len()
        );
        self.fences[workspace]
    }

    /// Wait until the next workspace is free, reset its fence and return its index
    ///
    /// The returned workspace must be submitted through [`submit`](Self::submit)
    /// before it comes around again, or the next wait on it never completes.
    pub fn acquire(&mut self) -> VulkanResult<usize> {
        let workspace = self.next;
        let fence = self.fences[workspace];

        if let Err(e) = self.device.wait_for_fence(fence, self.timeout_ns) {
            if let VulkanError::FenceTimeout { timeout_ns } = e {
                warn!("Workspace {} still busy after {} ns", workspace, timeout_ns);
            }
            return Err(e);
        }
        self.device.reset_fence(fence)?;

        self.next = (workspace + 1) % self.fences.len();
        debug!("Acquired workspace {}", workspace);
        Ok(workspace)
    }

    /// Submit a workspace's recorded command buffer; its fence signals on completion
    pub fn submit(&self, workspace: usize, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        let fence = self.fence(workspace);
        self.device.submit(command_buffer, fence)
    }
}

impl<D: GpuDevice> Drop for FrameRing<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("wait_idle failed while destroying frame ring: {}", e);
        }
        for fence in self.fences.drain(..) {
            self.device.destroy_fence(fence);
        }
        info!("Destroyed frame ring");
    }
}
