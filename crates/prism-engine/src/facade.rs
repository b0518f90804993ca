//! Device-file style read facade over the register block.

use prism_hal::window::RegisterIo;
use prism_core::Result;

use crate::controller::Controller;

/// Sequential byte reader over the register window
///
/// Mirrors a character-device read cursor: bytes come from offset 0
/// upward in register little-endian order, and reads past the end
/// return zero bytes rather than an error. Writes report zero bytes
/// written and mapping requests succeed without creating a mapping.
///
/// Each underlying register read holds the controller's configuration
/// lock for just that one access, so a reader never blocks a start or
/// reset for longer than a single register read.
pub struct RegionReader<'a, W: RegisterIo> {
    controller: &'a Controller<W>,
    pos: u32,
}

impl<'a, W: RegisterIo> RegionReader<'a, W> {
    /// New reader positioned at offset 0
    pub fn new(controller: &'a Controller<W>) -> Self {
        Self { controller, pos: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Copy bytes into `buf`, advancing the cursor
    ///
    /// Returns the number of bytes copied; 0 means end of region.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let end = self.controller.region_len();
        let mut copied = 0;
        while copied < buf.len() && self.pos < end {
            let word_offset = self.pos & !3;
            let word = self.controller.locked_read32(word_offset).to_le_bytes();
            let skip = (self.pos - word_offset) as usize;
            let take = (4 - skip).min(buf.len() - copied);
            buf[copied..copied + take].copy_from_slice(&word[skip..skip + take]);
            copied += take;
            self.pos += take as u32;
        }
        copied
    }

    /// Accept a write without performing it
    ///
    /// The register block takes no writes through this surface; the
    /// call succeeds with zero bytes written so nothing is silently
    /// half-applied.
    pub fn write(&mut self, _data: &[u8]) -> usize {
        0
    }

    /// Accept a mapping request without creating one
    pub fn map(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use core::ptr::NonNull;

    use prism_core::BusAddr;
    use prism_hal::regs;
    use prism_hal::sim::SimWindow;
    use prism_mem::{BufferPool, DmaAllocator, DmaRegion};

    use crate::controller::ControllerConfig;

    use super::*;

    struct FakeAllocator;

    impl DmaAllocator for FakeAllocator {
        fn alloc_coherent(&mut self, len: usize) -> Option<DmaRegion> {
            Some(DmaRegion {
                cpu: NonNull::dangling(),
                bus: BusAddr::new(0x2000_0000),
                len,
            })
        }

        fn free_coherent(&mut self, _region: DmaRegion) {}
    }

    fn make_controller(window: SimWindow) -> Controller<SimWindow> {
        let pool = BufferPool::allocate(&mut FakeAllocator, 4, 0x1000).unwrap();
        let config = ControllerConfig {
            geometry: prism_core::FrameGeometry::packed(64, 32),
            ..ControllerConfig::default()
        };
        Controller::new(window, pool, config).unwrap()
    }

    #[test]
    fn test_read_yields_register_bytes() {
        let win = SimWindow::new();
        win.preload(regs::VERSION, 0x6501_0042);
        let ctrl = make_controller(win);

        let mut reader = RegionReader::new(&ctrl);
        let mut buf = [0u8; 0x30];
        assert_eq!(reader.read(&mut buf), 0x30);
        // Version word at 0x2c, little endian
        assert_eq!(&buf[0x2c..0x30], &[0x42, 0x00, 0x01, 0x65]);
        assert_eq!(reader.position(), 0x30);
    }

    #[test]
    fn test_read_handles_unaligned_cursor() {
        let win = SimWindow::new();
        win.preload(regs::VERSION, 0x6501_0042);
        let ctrl = make_controller(win);

        let mut reader = RegionReader::new(&ctrl);
        let mut skip = [0u8; 0x2d];
        assert_eq!(reader.read(&mut skip), 0x2d);
        let mut tail = [0u8; 2];
        assert_eq!(reader.read(&mut tail), 2);
        assert_eq!(tail, [0x00, 0x01]);
    }

    #[test]
    fn test_read_past_end_is_eof() {
        let ctrl = make_controller(SimWindow::new());
        let mut reader = RegionReader::new(&ctrl);
        let mut buf = [0u8; 512];
        assert_eq!(reader.read(&mut buf), regs::REGISTER_SPAN as usize);
        assert_eq!(reader.read(&mut buf), 0);
    }

    #[test]
    fn test_write_and_map_are_accepted_noops() {
        let ctrl = make_controller(SimWindow::new());
        let mut reader = RegionReader::new(&ctrl);
        assert_eq!(reader.write(&[1, 2, 3]), 0);
        assert!(reader.map().is_ok());
        // Nothing reached the registers
        assert!(ctrl.window().writes().is_empty());
    }
}
