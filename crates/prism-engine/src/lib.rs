//! # PRISM Engine
//!
//! Driving logic for the PRISM streaming video DMA engine: the
//! per-channel register protocol, the [`Controller`] that owns the
//! engine's lifecycle, and a byte-addressed read facade over the
//! register block.
//!
//! The engine moves video frames between a stream port and a ring of
//! coherent frame buffers in both directions at once. Both directions
//! are started and reset together; the hardware genlocks them against
//! each other, so a half-started engine is not a useful state.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

mod channel;
mod controller;
mod facade;

pub use channel::{ChannelRegs, ChannelState};
pub use controller::{Controller, ControllerConfig, HealthReport};
pub use facade::RegionReader;
