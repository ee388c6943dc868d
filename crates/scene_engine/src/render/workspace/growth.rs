//! Capacity growth policy for workspace buffers

/// Whether a slot of `capacity` bytes must be reallocated to hold `required` bytes
///
/// An unallocated slot always grows, even for a zero-byte request.
pub fn needs_growth(capacity: u64, required: u64) -> bool {
    capacity == 0 || capacity < required
}

/// Capacity to allocate for `required` bytes: the next whole block past it
///
/// Always strictly greater than `required`, so a request that lands exactly on
/// a block boundary still leaves a block of headroom.
pub fn grown_capacity(required: u64, block_size: u64) -> u64 {
    assert!(block_size > 0, "grown_capacity: block size must be non-zero");
    (required / block_size + 1) * block_size
}
