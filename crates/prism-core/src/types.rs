//! # PRISM Core Types
//!
//! Fundamental type definitions used across the driver stack.
//!
//! These types provide:
//! - Strong typing for device-visible (bus) addresses
//! - The two transfer directions of the engine
//! - Validated frame geometry

use core::fmt;

use crate::error::{Error, Result};

// =============================================================================
// BUS ADDRESS
// =============================================================================

/// Device-visible bus address
///
/// This is the address the DMA engine reads from its frame-buffer address
/// registers. The registers are 32 bits wide, so the type is too. It is
/// NOT a CPU pointer and cannot be dereferenced.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct BusAddr(u32);

impl BusAddr {
    /// Create a new bus address
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Create a null bus address
    #[inline]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if null
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check alignment
    #[inline]
    pub const fn is_aligned(self, alignment: u32) -> bool {
        self.0 & (alignment - 1) == 0
    }
}

impl fmt::Debug for BusAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusAddr(0x{:08x})", self.0)
    }
}

impl fmt::Display for BusAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

// =============================================================================
// TRANSFER DIRECTION
// =============================================================================

/// Transfer direction of one engine channel
///
/// The engine carries one channel per direction; each has its own
/// control/status/geometry register bank at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Memory to stream: frames leave system memory toward the fabric
    Outbound,
    /// Stream to memory: frames arrive from the fabric into system memory
    Inbound,
}

impl Direction {
    /// Both directions, outbound first (register-map order)
    pub const ALL: [Direction; 2] = [Direction::Outbound, Direction::Inbound];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}

// =============================================================================
// FRAME GEOMETRY
// =============================================================================

/// Geometry of one frame transfer
///
/// All quantities are what the hardware registers expect: `hsize_bytes`
/// and `stride_bytes` in bytes, `vsize_lines` in lines. Writing the
/// vertical size is the hardware trigger, so geometry is validated once
/// up front rather than per register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Active line width in bytes
    pub hsize_bytes: u32,
    /// Frame height in lines
    pub vsize_lines: u32,
    /// Line-to-line stride in bytes (>= hsize_bytes)
    pub stride_bytes: u32,
}

impl FrameGeometry {
    /// Create a packed geometry (stride == hsize)
    #[inline]
    pub const fn packed(hsize_bytes: u32, vsize_lines: u32) -> Self {
        Self {
            hsize_bytes,
            vsize_lines,
            stride_bytes: hsize_bytes,
        }
    }

    /// Bytes occupied by one frame at this geometry
    #[inline]
    pub const fn frame_bytes(&self) -> usize {
        self.stride_bytes as usize * self.vsize_lines as usize
    }

    /// Validate the geometry against hardware constraints
    pub fn validate(&self) -> Result<()> {
        if self.hsize_bytes == 0 || self.vsize_lines == 0 {
            return Err(Error::InvalidParameter);
        }
        if self.stride_bytes < self.hsize_bytes {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for FrameGeometry {
    /// 1920x1080 at 4 bytes per pixel, packed: the capture pipeline's
    /// native mode.
    fn default() -> Self {
        Self::packed(1920 * 4, 1080)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_addr_alignment() {
        assert!(BusAddr::new(0x1000).is_aligned(4));
        assert!(!BusAddr::new(0x1002).is_aligned(4));
        assert!(BusAddr::null().is_null());
    }

    #[test]
    fn test_geometry_validation() {
        assert!(FrameGeometry::default().validate().is_ok());
        assert_eq!(
            FrameGeometry::packed(0, 1080).validate(),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            FrameGeometry::packed(1920, 0).validate(),
            Err(Error::InvalidParameter)
        );

        let narrow_stride = FrameGeometry {
            hsize_bytes: 4096,
            vsize_lines: 32,
            stride_bytes: 2048,
        };
        assert_eq!(narrow_stride.validate(), Err(Error::InvalidParameter));
    }

    #[test]
    fn test_frame_bytes() {
        let geo = FrameGeometry::default();
        assert_eq!(geo.frame_bytes(), 1920 * 4 * 1080);
    }
}
