//! # PRISM DMA Memory
//!
//! Coherent frame-buffer allocation for the PRISM video DMA engine.
//!
//! The engine streams frames into physically contiguous, cache-coherent
//! buffers whose bus addresses are programmed into its frame-buffer
//! registers. This crate owns the slot bookkeeping: a [`BufferPool`] of
//! fixed-size regions obtained through a platform [`DmaAllocator`], with
//! all-or-nothing setup and teardown.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

mod pool;

pub use pool::{BufferPool, BufferSlot, DmaAllocator, DmaRegion};

/// Default number of frame-buffer slots the pool carries
pub const DEFAULT_SLOT_COUNT: usize = 32;

/// Default length of one slot in bytes (five 1 MiB pages)
pub const DEFAULT_SLOT_LEN: usize = 0x0010_0000 * 5;
