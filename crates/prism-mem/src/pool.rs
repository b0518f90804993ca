//! Frame-buffer slot pool over a platform DMA allocator.

use alloc::vec::Vec;
use core::ptr::NonNull;

use prism_core::{BusAddr, Error, Result};

// =============================================================================
// ALLOCATOR CONTRACT
// =============================================================================

/// One coherent DMA mapping
///
/// `cpu` is the kernel-visible pointer, `bus` the address the engine
/// sees. They address the same `len` bytes.
#[derive(Debug, Clone, Copy)]
pub struct DmaRegion {
    /// CPU-side pointer to the mapping
    pub cpu: NonNull<u8>,
    /// Device-side address of the mapping
    pub bus: BusAddr,
    /// Mapping length in bytes
    pub len: usize,
}

/// Platform source of coherent DMA memory
///
/// Implementations hand out physically contiguous, cache-coherent
/// mappings. Every region returned by [`alloc_coherent`] is eventually
/// handed back through [`free_coherent`] exactly once.
///
/// [`alloc_coherent`]: DmaAllocator::alloc_coherent
/// [`free_coherent`]: DmaAllocator::free_coherent
pub trait DmaAllocator {
    /// Allocate a coherent region of `len` bytes, or `None` if exhausted
    fn alloc_coherent(&mut self, len: usize) -> Option<DmaRegion>;

    /// Return a region previously obtained from this allocator
    fn free_coherent(&mut self, region: DmaRegion);
}

// =============================================================================
// BUFFER POOL
// =============================================================================

/// One frame buffer held by the pool
#[derive(Debug)]
pub struct BufferSlot {
    region: DmaRegion,
}

impl BufferSlot {
    /// Bus address the engine is programmed with
    pub fn bus_addr(&self) -> BusAddr {
        self.region.bus
    }

    /// Slot length in bytes
    pub fn len(&self) -> usize {
        self.region.len
    }

    /// True if the slot is zero length
    pub fn is_empty(&self) -> bool {
        self.region.len == 0
    }

    /// CPU-side pointer to the slot
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.region.cpu
    }

    /// View the slot contents
    ///
    /// # Safety
    ///
    /// The caller must ensure the engine is not writing the slot while
    /// the slice is alive.
    pub unsafe fn as_slice(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.region.cpu.as_ptr(), self.region.len) }
    }
}

/// Fixed set of same-sized frame buffers
///
/// Construction is all-or-nothing: if any slot fails to allocate, slots
/// already obtained are returned to the allocator and the whole
/// allocation fails.
#[derive(Debug)]
pub struct BufferPool {
    slots: Vec<BufferSlot>,
    slot_len: usize,
}

impl BufferPool {
    /// Allocate `slot_count` coherent buffers of `slot_len` bytes each
    pub fn allocate<A: DmaAllocator>(
        allocator: &mut A,
        slot_count: usize,
        slot_len: usize,
    ) -> Result<Self> {
        if slot_count == 0 || slot_len == 0 {
            return Err(Error::InvalidParameter);
        }

        let mut slots = Vec::with_capacity(slot_count);
        for index in 0..slot_count {
            match allocator.alloc_coherent(slot_len) {
                Some(region) => slots.push(BufferSlot { region }),
                None => {
                    log::warn!(
                        "dma pool: slot {} of {} failed, rolling back",
                        index,
                        slot_count
                    );
                    for slot in slots.drain(..) {
                        allocator.free_coherent(slot.region);
                    }
                    return Err(Error::AllocationFailed);
                }
            }
        }

        log::debug!(
            "dma pool: {} slots of {} bytes at {}",
            slot_count,
            slot_len,
            slots[0].bus_addr()
        );
        Ok(Self { slots, slot_len })
    }

    /// Number of slots in the pool
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Length of every slot in bytes
    pub fn slot_len(&self) -> usize {
        self.slot_len
    }

    /// Slot `index`, or [`Error::SlotOutOfRange`]
    pub fn slot(&self, index: usize) -> Result<&BufferSlot> {
        self.slots.get(index).ok_or(Error::SlotOutOfRange)
    }

    /// Bus address of slot `index`
    pub fn bus_addr(&self, index: usize) -> Result<BusAddr> {
        Ok(self.slot(index)?.bus_addr())
    }

    /// Return every slot to the allocator, consuming the pool
    pub fn release<A: DmaAllocator>(mut self, allocator: &mut A) {
        for slot in self.slots.drain(..) {
            allocator.free_coherent(slot.region);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
