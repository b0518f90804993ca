//! # Simulated Register Window
//!
//! In-memory stand-in for the engine's register block, with just enough
//! behavior to exercise the driving code: channel resets self-clear,
//! run/stop toggles the halted bit, and status writes follow the
//! write-one-to-clear convention. Every write is journaled in order so a
//! test can assert on the exact programming sequence.

use alloc::vec::Vec;

use spin::Mutex;

use crate::regs::{self, ChannelBank, ControlFlags, StatusFlags};
use crate::window::RegisterIo;

// =============================================================================
// SIMULATED WINDOW
// =============================================================================

struct SimState {
    file: Vec<u32>,
    journal: Vec<(u32, u32)>,
}

/// Behavioral model of the register block
pub struct SimWindow {
    state: Mutex<SimState>,
    stuck_reset: bool,
}

impl SimWindow {
    /// New window with both channels halted and everything else zero
    pub fn new() -> Self {
        let mut file = alloc::vec![0u32; (regs::REGISTER_SPAN / 4) as usize];
        file[(regs::outbound::STATUS / 4) as usize] = StatusFlags::HALTED.bits();
        file[(regs::inbound::STATUS / 4) as usize] = StatusFlags::HALTED.bits();
        Self {
            state: Mutex::new(SimState {
                file,
                journal: Vec::new(),
            }),
            stuck_reset: false,
        }
    }

    /// Fault injection: channel resets never self-clear
    pub fn with_stuck_reset(mut self) -> Self {
        self.stuck_reset = true;
        self
    }

    /// Seed a register without journaling, e.g. the version word
    pub fn preload(&self, offset: u32, value: u32) {
        self.state.lock().file[(offset / 4) as usize] = value;
    }

    /// Set bits in a status register, as the hardware would on an event
    pub fn raise_status(&self, bank: ChannelBank, bits: StatusFlags) {
        let mut st = self.state.lock();
        st.file[(bank.status / 4) as usize] |= bits.bits();
    }

    /// Every write so far, in issue order
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.state.lock().journal.clone()
    }

    /// Forget the journal, keeping register contents
    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    fn control_write(st: &mut SimState, bank: ChannelBank, value: u32, stuck_reset: bool) {
        let mut stored = value;
        if ControlFlags::from_bits_truncate(value).contains(ControlFlags::RESET) {
            if !stuck_reset {
                stored &= !ControlFlags::RESET.bits();
            }
            // Reset leaves the channel halted with a clean status.
            st.file[(bank.status / 4) as usize] = StatusFlags::HALTED.bits();
        }
        let status = &mut st.file[(bank.status / 4) as usize];
        if ControlFlags::from_bits_truncate(value).contains(ControlFlags::RUN) {
            *status &= !StatusFlags::HALTED.bits();
        } else {
            *status |= StatusFlags::HALTED.bits();
        }
        st.file[(bank.control / 4) as usize] = stored;
    }
}

impl Default for SimWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterIo for SimWindow {
    fn len(&self) -> u32 {
        regs::REGISTER_SPAN
    }

    fn read32(&self, offset: u32) -> u32 {
        assert!(offset % 4 == 0 && offset < regs::REGISTER_SPAN);
        self.state.lock().file[(offset / 4) as usize]
    }

    fn write32(&self, offset: u32, value: u32) {
        assert!(offset % 4 == 0 && offset < regs::REGISTER_SPAN);
        let mut st = self.state.lock();
        st.journal.push((offset, value));
        match offset {
            regs::outbound::CONTROL => {
                Self::control_write(&mut st, ChannelBank::OUTBOUND, value, self.stuck_reset);
            }
            regs::inbound::CONTROL => {
                Self::control_write(&mut st, ChannelBank::INBOUND, value, self.stuck_reset);
            }
            regs::outbound::STATUS | regs::inbound::STATUS => {
                // Write-one-to-clear
                st.file[(offset / 4) as usize] &= !value;
            }
            regs::VERSION => {
                // Read-only
            }
            _ => {
                st.file[(offset / 4) as usize] = value;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
