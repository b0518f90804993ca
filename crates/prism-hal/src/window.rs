//! # Register Window
//!
//! Access contract for the engine's register block plus a volatile MMIO
//! implementation of it.
//!
//! All accesses are 32-bit and 4-byte aligned. The contract takes `&self`
//! so a read-only consumer can observe the registers while another holder
//! drives the engine.

// =============================================================================
// ACCESS CONTRACT
// =============================================================================

/// 32-bit register access contract
pub trait RegisterIo {
    /// Window length in bytes
    fn len(&self) -> u32;

    /// True if the window covers no registers
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the 32-bit register at `offset`
    ///
    /// `offset` must be 4-byte aligned and inside the window.
    fn read32(&self, offset: u32) -> u32;

    /// Write the 32-bit register at `offset`
    ///
    /// `offset` must be 4-byte aligned and inside the window.
    fn write32(&self, offset: u32, value: u32);

    /// Poll `offset` until `(value & mask) == want`, at most `max_iters` reads
    ///
    /// Returns true if the condition was observed. Every iteration is a
    /// fresh read; the loop never sleeps and never spins unbounded.
    fn poll32(&self, offset: u32, mask: u32, want: u32, max_iters: u32) -> bool {
        for _ in 0..max_iters {
            if (self.read32(offset) & mask) == want {
                return true;
            }
            core::hint::spin_loop();
        }
        false
    }
}

// =============================================================================
// MMIO WINDOW
// =============================================================================

/// Volatile window over a memory-mapped register block
pub struct MmioWindow {
    base: *mut u32,
    len: u32,
}

// The pointer targets device registers, not shared heap memory.
unsafe impl Send for MmioWindow {}
unsafe impl Sync for MmioWindow {}

impl MmioWindow {
    /// Create a window over `len` bytes of registers at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the virtual address of a device register block at
    /// least `len` bytes long, 4-byte aligned, and mapped uncached for
    /// the lifetime of the window.
    pub unsafe fn new(base: usize, len: u32) -> Self {
        assert!(base % 4 == 0, "register window base 0x{:x} unaligned", base);
        assert!(len % 4 == 0, "register window length 0x{:x} unaligned", len);
        Self {
            base: base as *mut u32,
            len,
        }
    }

    #[inline]
    fn slot(&self, offset: u32) -> *mut u32 {
        assert!(offset % 4 == 0, "register offset 0x{:x} unaligned", offset);
        assert!(offset < self.len, "register offset 0x{:x} out of window", offset);
        // In-bounds by the assert above; the window owns [base, base+len).
        unsafe { self.base.add((offset / 4) as usize) }
    }
}

impl RegisterIo for MmioWindow {
    fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    fn read32(&self, offset: u32) -> u32 {
        unsafe { self.slot(offset).read_volatile() }
    }

    #[inline]
    fn write32(&self, offset: u32, value: u32) {
        unsafe { self.slot(offset).write_volatile(value) }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmio_round_trip() {
        let mut backing = [0u32; 8];
        let win = unsafe { MmioWindow::new(backing.as_mut_ptr() as usize, 32) };
        win.write32(0x00, 0xdead_beef);
        win.write32(0x1c, 0x0000_00ff);
        assert_eq!(win.read32(0x00), 0xdead_beef);
        assert_eq!(win.read32(0x1c), 0x0000_00ff);
        assert_eq!(win.len(), 32);
        assert!(!win.is_empty());
    }

    #[test]
    #[should_panic(expected = "out of window")]
    fn test_mmio_rejects_out_of_bounds() {
        let mut backing = [0u32; 2];
        let win = unsafe { MmioWindow::new(backing.as_mut_ptr() as usize, 8) };
        win.read32(0x08);
    }

    #[test]
    #[should_panic(expected = "unaligned")]
    fn test_mmio_rejects_unaligned_offset() {
        let mut backing = [0u32; 2];
        let win = unsafe { MmioWindow::new(backing.as_mut_ptr() as usize, 8) };
        win.read32(0x02);
    }

    #[test]
    fn test_poll_bounded() {
        let mut backing = [0u32; 1];
        let win = unsafe { MmioWindow::new(backing.as_mut_ptr() as usize, 4) };

        // Condition already true: first read satisfies it.
        assert!(win.poll32(0x00, 0x4, 0x0, 1));

        // Condition never true: the loop must give up after max_iters.
        win.write32(0x00, 0x4);
        assert!(!win.poll32(0x00, 0x4, 0x0, 100));
    }
}
