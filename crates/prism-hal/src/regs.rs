//! # Video DMA Register Map
//!
//! Bit-exact register definitions for the streaming video DMA engine.
//!
//! ## Memory Map
//!
//! ```text
//! +--------+----------------------------------+
//! | Offset | Register                         |
//! +--------+----------------------------------+
//! | 0x00   | outbound control                 |
//! | 0x04   | outbound status                  |
//! | 0x14   | outbound buffer-index select     |
//! | 0x28   | park pointer (shared)            |
//! | 0x2c   | version (shared, read-only)      |
//! | 0x30   | inbound control                  |
//! | 0x34   | inbound status                   |
//! | 0x3c   | inbound interrupt mask           |
//! | 0x44   | inbound buffer-index select      |
//! | 0x50   | outbound vsize (write triggers)  |
//! | 0x54   | outbound hsize                   |
//! | 0x58   | outbound frame-delay / stride    |
//! | 0x5c.. | outbound frame buffer 0..3       |
//! | 0xa0   | inbound vsize (write triggers)   |
//! | 0xa4   | inbound hsize                    |
//! | 0xa8   | inbound frame-delay / stride     |
//! | 0xac.. | inbound frame buffer 0..3        |
//! +--------+----------------------------------+
//! ```
//!
//! Several controls share a register word; the bit positions below must
//! match the hardware generation exactly or unrelated fields are
//! silently corrupted.

use bitflags::bitflags;
use static_assertions::const_assert;
use static_assertions::const_assert_eq;

// =============================================================================
// REGISTER OFFSETS
// =============================================================================

/// Outbound (memory-to-stream) register offsets
pub mod outbound {
    /// Channel control
    pub const CONTROL: u32 = 0x00;
    /// Channel status
    pub const STATUS: u32 = 0x04;
    /// Buffer-index select
    pub const INDEX_SELECT: u32 = 0x14;
    /// Vertical size in lines; writing it triggers the transfer
    pub const VSIZE: u32 = 0x50;
    /// Horizontal size in bytes
    pub const HSIZE: u32 = 0x54;
    /// Frame delay and line stride in bytes
    pub const FRAME_DELAY_STRIDE: u32 = 0x58;
    /// First of four consecutive frame-buffer address registers
    pub const FRAME_BUFFER_0: u32 = 0x5c;
}

/// Inbound (stream-to-memory) register offsets
pub mod inbound {
    /// Channel control
    pub const CONTROL: u32 = 0x30;
    /// Channel status
    pub const STATUS: u32 = 0x34;
    /// Interrupt mask (inbound channel only)
    pub const IRQ_MASK: u32 = 0x3c;
    /// Buffer-index select
    pub const INDEX_SELECT: u32 = 0x44;
    /// Vertical size in lines; writing it triggers the transfer
    pub const VSIZE: u32 = 0xa0;
    /// Horizontal size in bytes
    pub const HSIZE: u32 = 0xa4;
    /// Frame delay and line stride in bytes
    pub const FRAME_DELAY_STRIDE: u32 = 0xa8;
    /// First of four consecutive frame-buffer address registers
    pub const FRAME_BUFFER_0: u32 = 0xac;
}

/// Park pointer, shared by both channels
pub const PARK_PTR: u32 = 0x28;
/// Hardware version, shared, read-only
pub const VERSION: u32 = 0x2c;

/// Frame-buffer address registers per channel
pub const FRAME_BUFFER_COUNT: usize = 4;

/// One past the last defined register byte
pub const REGISTER_SPAN: u32 = inbound::FRAME_BUFFER_0 + (FRAME_BUFFER_COUNT as u32) * 4;

const_assert!(REGISTER_SPAN % 4 == 0);
const_assert_eq!(REGISTER_SPAN, 0xbc);

// =============================================================================
// CHANNEL BANK
// =============================================================================

/// Register bank of one channel direction
///
/// The two banks are identical in layout except for the interrupt-mask
/// register, which only the inbound channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBank {
    /// Control register offset
    pub control: u32,
    /// Status register offset
    pub status: u32,
    /// Interrupt mask offset, if the channel has one
    pub irq_mask: Option<u32>,
    /// Buffer-index select offset
    pub index_select: u32,
    /// Vertical-size offset (the transfer trigger)
    pub vsize: u32,
    /// Horizontal-size offset
    pub hsize: u32,
    /// Frame-delay/stride offset
    pub frame_delay_stride: u32,
    /// First frame-buffer address register offset
    pub frame_buffer_0: u32,
}

impl ChannelBank {
    /// Outbound bank
    pub const OUTBOUND: Self = Self {
        control: outbound::CONTROL,
        status: outbound::STATUS,
        irq_mask: None,
        index_select: outbound::INDEX_SELECT,
        vsize: outbound::VSIZE,
        hsize: outbound::HSIZE,
        frame_delay_stride: outbound::FRAME_DELAY_STRIDE,
        frame_buffer_0: outbound::FRAME_BUFFER_0,
    };

    /// Inbound bank
    pub const INBOUND: Self = Self {
        control: inbound::CONTROL,
        status: inbound::STATUS,
        irq_mask: Some(inbound::IRQ_MASK),
        index_select: inbound::INDEX_SELECT,
        vsize: inbound::VSIZE,
        hsize: inbound::HSIZE,
        frame_delay_stride: inbound::FRAME_DELAY_STRIDE,
        frame_buffer_0: inbound::FRAME_BUFFER_0,
    };

    /// Offset of frame-buffer address register `index`
    ///
    /// `index` must be below [`FRAME_BUFFER_COUNT`].
    #[inline]
    pub const fn frame_buffer(&self, index: usize) -> u32 {
        self.frame_buffer_0 + (index as u32) * 4
    }
}

// =============================================================================
// CONTROL WORD
// =============================================================================

bitflags! {
    /// Single-bit fields of the channel control word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u32 {
        /// Run/stop (1 = run)
        const RUN = 1 << 0;
        /// Cycle the active buffer index automatically each frame
        const CIRCULAR_PARK = 1 << 1;
        /// Channel soft reset; self-clears when the reset completes
        const RESET = 1 << 2;
        /// Genlock synchronization enable
        const GENLOCK_ENABLE = 1 << 3;
        /// Frame-count enable
        const FRAME_COUNT_ENABLE = 1 << 4;
        /// Internal genlock source
        const GENLOCK_SOURCE = 1 << 7;
        /// Frame-complete interrupt enable
        const FRAME_IRQ_EN = 1 << 12;
        /// Delay-count interrupt enable
        const DELAY_IRQ_EN = 1 << 13;
        /// Error interrupt enable
        const ERROR_IRQ_EN = 1 << 14;
        /// Repeat-on-error
        const REPEAT = 1 << 15;
    }
}

/// Control word multi-bit fields
pub mod control_field {
    /// Write-pointer number, bits [11:8]
    pub const WRITE_POINTER_LSB: u8 = 8;
    /// Write-pointer width
    pub const WRITE_POINTER_WIDTH: u8 = 4;
    /// Interrupt frame count, bits [23:16]
    pub const IRQ_FRAME_COUNT_LSB: u8 = 16;
    /// Interrupt frame count width
    pub const IRQ_FRAME_COUNT_WIDTH: u8 = 8;
    /// Interrupt delay count, bits [31:24]
    pub const IRQ_DELAY_COUNT_LSB: u8 = 24;
    /// Interrupt delay count width
    pub const IRQ_DELAY_COUNT_WIDTH: u8 = 8;
}

// =============================================================================
// STATUS WORD
// =============================================================================

bitflags! {
    /// Single-bit fields of the channel status word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u32 {
        /// Channel halted (clear = running)
        const HALTED = 1 << 0;
        /// Internal engine error
        const INTERNAL_ERROR = 1 << 4;
        /// Bus slave error
        const SLAVE_ERROR = 1 << 5;
        /// Address decode error
        const DECODE_ERROR = 1 << 6;
        /// Start-of-frame arrived early
        const SOF_EARLY_ERROR = 1 << 7;
        /// End-of-line arrived early
        const EOL_EARLY_ERROR = 1 << 8;
        /// Start-of-frame arrived late
        const SOF_LATE_ERROR = 1 << 11;
        /// Frame-complete interrupt pending
        const FRAME_IRQ = 1 << 12;
        /// Delay-count interrupt pending
        const DELAY_IRQ = 1 << 13;
        /// Error interrupt pending
        const ERROR_IRQ = 1 << 14;
        /// End-of-line arrived late
        const EOL_LATE_ERROR = 1 << 15;
    }
}

impl StatusFlags {
    /// All unrecoverable error bits
    pub fn any_error(self) -> bool {
        self.intersects(
            Self::INTERNAL_ERROR
                | Self::SLAVE_ERROR
                | Self::DECODE_ERROR
                | Self::SOF_EARLY_ERROR
                | Self::EOL_EARLY_ERROR
                | Self::SOF_LATE_ERROR
                | Self::EOL_LATE_ERROR,
        )
    }

    /// The three interrupt-pending bits, acknowledged by writing them back
    pub fn irq_bits(self) -> Self {
        self & (Self::FRAME_IRQ | Self::DELAY_IRQ | Self::ERROR_IRQ)
    }
}

/// Status word multi-bit fields
pub mod status_field {
    /// Completed-frame count, bits [23:16]
    pub const FRAME_COUNT_LSB: u8 = 16;
    /// Completed-frame count width
    pub const FRAME_COUNT_WIDTH: u8 = 8;
    /// Delay count, bits [31:24]
    pub const DELAY_COUNT_LSB: u8 = 24;
    /// Delay count width
    pub const DELAY_COUNT_WIDTH: u8 = 8;
}

// =============================================================================
// INTERRUPT MASK
// =============================================================================

bitflags! {
    /// Inbound interrupt-mask register bits
    ///
    /// A set bit masks the corresponding frame-timing error interrupt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqMaskFlags: u32 {
        /// Start-of-frame early error
        const SOF_EARLY = 1 << 0;
        /// End-of-line early error
        const EOL_EARLY = 1 << 1;
        /// Start-of-frame late error
        const SOF_LATE = 1 << 2;
        /// End-of-line late error
        const EOL_LATE = 1 << 3;
    }
}

/// Value written to the mask register so no interrupt source is masked
pub const IRQ_UNMASK_ALL: u32 = IrqMaskFlags::all().bits();

const_assert_eq!(IRQ_UNMASK_ALL, 0x0f);

// =============================================================================
// VERSION WORD
// =============================================================================

/// Version register fields
pub mod version_field {
    /// Major version, bits [31:28]
    pub const MAJOR_LSB: u8 = 28;
    /// Major version width
    pub const MAJOR_WIDTH: u8 = 4;
    /// Minor version, bits [27:20]
    pub const MINOR_LSB: u8 = 20;
    /// Minor version width
    pub const MINOR_WIDTH: u8 = 8;
    /// Revision, bits [19:16]
    pub const REVISION_LSB: u8 = 16;
    /// Revision width
    pub const REVISION_WIDTH: u8 = 4;
    /// Patch level, bits [15:0]
    pub const PATCH_LSB: u8 = 0;
    /// Patch level width
    pub const PATCH_WIDTH: u8 = 16;
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// Extract a multi-bit field from a register value
#[inline]
pub const fn extract_field(value: u32, lsb: u8, width: u8) -> u32 {
    let mask = if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };
    (value >> lsb) & mask
}

/// Insert a multi-bit field into a register value
#[inline]
pub const fn insert_field(value: u32, field: u32, lsb: u8, width: u8) -> u32 {
    let mask = if width >= 32 {
        u32::MAX
    } else {
        ((1u32 << width) - 1) << lsb
    };
    (value & !mask) | ((field << lsb) & mask)
}

// =============================================================================
// TESTS
// =============================================================================
