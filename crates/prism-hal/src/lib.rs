//! # PRISM HAL
//!
//! Hardware access layer for the streaming video DMA engine.
//!
//! The engine exposes a single small memory-mapped register window
//! (two per-direction register banks plus a pair of shared registers).
//! This crate owns everything that touches that window:
//!
//! - the [`RegisterIo`] contract: bounds-checked, alignment-checked
//!   32-bit accesses, every call a fresh hardware access
//! - the [`MmioWindow`] volatile backend for real hardware
//! - the bit-exact register map ([`regs`]) shared by the protocol code
//!   and the diagnostic decoder
//! - a simulated backend ([`sim`]) backed by plain memory, used by unit
//!   tests and for bring-up on machines without the fabric

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

pub mod regs;
pub mod window;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

// Re-exports for convenience
pub use window::{MmioWindow, RegisterIo};
