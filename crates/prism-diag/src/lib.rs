//! # PRISM Diagnostics
//!
//! Human-readable decoding of the video engine's registers.
//!
//! The decoders render into any [`core::fmt::Write`] sink so they work
//! from interrupt-free contexts and from procfs-style readers alike.
//! Output is semicolon-delimited `name` or `name:value` items, one
//! register per line in a [`dump`].

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

mod decode;

pub use decode::{
    classify, decode, decode_class, decode_control, decode_irq_mask, decode_status,
    decode_version, dump, report, BitField, RegisterClass, RegisterEntry, REGISTER_TABLE,
};
