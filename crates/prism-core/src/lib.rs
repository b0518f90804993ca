//! # PRISM Core
//!
//! Foundational types and error handling for the video DMA driver stack.
//!
//! This crate carries no hardware knowledge. It defines the vocabulary
//! (bus addresses, transfer directions, frame geometry) and the unified
//! error type that every other PRISM crate speaks.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use types::{BusAddr, Direction, FrameGeometry};
