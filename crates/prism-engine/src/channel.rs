//! Per-channel register protocol.

use prism_core::BusAddr;
use prism_hal::regs::{ChannelBank, ControlFlags, StatusFlags};
use prism_hal::window::RegisterIo;

// =============================================================================
// CHANNEL STATE
// =============================================================================

/// Lifecycle state of one channel direction
///
/// Both channels move through reset and configuration together, but a
/// running channel can halt on its own, so the state is tracked per
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not yet started, or fully reset
    Idle,
    /// A soft reset was requested and has not been observed to clear
    ResettingBusy,
    /// Registers are being programmed
    Configuring,
    /// Running the circular buffer ring
    Running,
    /// The hardware halted the channel; reset to recover
    Halted,
}

// =============================================================================
// CHANNEL REGISTERS
// =============================================================================

/// One channel's view of the register window
///
/// A thin binding of a register bank to a window; every method is a
/// single register access except [`running`](Self::running).
pub struct ChannelRegs<'a, W: RegisterIo + ?Sized> {
    window: &'a W,
    bank: ChannelBank,
}

impl<W: RegisterIo + ?Sized> Clone for ChannelRegs<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: RegisterIo + ?Sized> Copy for ChannelRegs<'_, W> {}

impl<'a, W: RegisterIo + ?Sized> ChannelRegs<'a, W> {
    /// Bind `bank` within `window`
    pub fn new(window: &'a W, bank: ChannelBank) -> Self {
        Self { window, bank }
    }

    /// Raw control word
    pub fn control(&self) -> u32 {
        self.window.read32(self.bank.control)
    }

    /// Status word flags
    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.window.read32(self.bank.status))
    }

    /// Overwrite the control word
    pub fn write_control(&self, value: u32) {
        self.window.write32(self.bank.control, value);
    }

    /// Begin a channel soft reset
    ///
    /// The reset bit self-clears once the channel has quiesced; poll
    /// [`reset_busy`](Self::reset_busy) for completion.
    pub fn request_reset(&self) {
        self.window.write32(self.bank.control, ControlFlags::RESET.bits());
    }

    /// True while a requested reset is still in flight
    pub fn reset_busy(&self) -> bool {
        self.control() & ControlFlags::RESET.bits() != 0
    }

    /// Clear the status word
    pub fn clear_status(&self) {
        self.window.write32(self.bank.status, 0);
    }

    /// Acknowledge pending interrupt bits by writing them back
    pub fn ack_irqs(&self, bits: StatusFlags) {
        self.window.write32(self.bank.status, bits.bits());
    }

    /// Unmask the frame-timing error interrupts, if this channel masks any
    pub fn unmask_irqs(&self) {
        if let Some(offset) = self.bank.irq_mask {
            self.window.write32(offset, prism_hal::regs::IRQ_UNMASK_ALL);
        }
    }

    /// Select which frame-buffer register bank index writes address
    pub fn select_index(&self, index: u32) {
        self.window.write32(self.bank.index_select, index);
    }

    /// Program frame-buffer address register `slot`
    pub fn write_frame_buffer(&self, slot: usize, addr: BusAddr) {
        self.window.write32(self.bank.frame_buffer(slot), addr.raw());
    }

    /// Program frame delay and line stride
    pub fn write_frame_delay_stride(&self, frame_delay: u8, stride_bytes: u32) {
        let word = ((frame_delay as u32) << 24) | (stride_bytes & 0x00ff_ffff);
        self.window.write32(self.bank.frame_delay_stride, word);
    }

    /// Program the horizontal size in bytes
    pub fn write_hsize(&self, hsize_bytes: u32) {
        self.window.write32(self.bank.hsize, hsize_bytes);
    }

    /// Program the vertical size in lines
    ///
    /// This write arms the transfer; it must come after every other
    /// geometry register.
    pub fn write_vsize(&self, vsize_lines: u32) {
        self.window.write32(self.bank.vsize, vsize_lines);
    }

    /// True once the channel has left the halted state under a run request
    pub fn running(&self) -> bool {
        self.control() & ControlFlags::RUN.bits() != 0
            && !self.status().contains(StatusFlags::HALTED)
    }
}

// =============================================================================
// TESTS
// =============================================================================
