//! Engine controller: lifecycle, interrupt bookkeeping, diagnostics.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use spin::Mutex;

use prism_core::{Direction, Error, FrameGeometry, Result};
use prism_hal::regs::{
    self, control_field, insert_field, ChannelBank, ControlFlags, StatusFlags,
};
use prism_hal::window::RegisterIo;
use prism_mem::BufferPool;

use crate::channel::{ChannelRegs, ChannelState};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Controller tunables
///
/// The defaults reproduce the shipped FPGA configuration: 1920x1080 at
/// four bytes per pixel, an interrupt every third frame, and a poll
/// bound of 1000 iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Transfer geometry, programmed into both directions
    pub geometry: FrameGeometry,
    /// Frames between frame-complete interrupts
    pub frame_irq_count: u8,
    /// Frames of delay between the genlocked channels
    pub frame_delay: u8,
    /// Upper bound on busy-wait polls for reset and start
    pub poll_iterations: u32,
    /// Log every poll iteration while waiting for the engine to start
    pub debug_poll: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::default(),
            frame_irq_count: 3,
            frame_delay: 0,
            poll_iterations: 1000,
            debug_poll: false,
        }
    }
}

impl ControllerConfig {
    /// Reject configurations the hardware cannot express
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.frame_irq_count == 0 || self.poll_iterations == 0 {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

// =============================================================================
// HEALTH REPORT
// =============================================================================

/// Snapshot of both status words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    /// Outbound channel status
    pub outbound: StatusFlags,
    /// Inbound channel status
    pub inbound: StatusFlags,
}

impl HealthReport {
    /// True if either direction reports an unrecoverable error bit
    pub fn any_error(&self) -> bool {
        self.outbound.any_error() || self.inbound.any_error()
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

struct Inner {
    config: ControllerConfig,
    // Indexed by Direction: outbound, inbound
    state: [ChannelState; 2],
}

/// Owner of the engine: register window, frame-buffer pool, lifecycle
///
/// The configuration lock is held across [`start`](Self::start) and
/// [`reset`](Self::reset). [`handle_interrupt`](Self::handle_interrupt)
/// and [`diagnose`](Self::diagnose) never take it, so the interrupt
/// path and observers cannot stall behind a slow start.
pub struct Controller<W: RegisterIo> {
    window: W,
    pool: BufferPool,
    inner: Mutex<Inner>,
    irq_events: AtomicU64,
}

const fn dir_index(direction: Direction) -> usize {
    match direction {
        Direction::Outbound => 0,
        Direction::Inbound => 1,
    }
}

impl<W: RegisterIo> Controller<W> {
    /// Take ownership of `window` and `pool` under `config`
    ///
    /// The pool must carry at least [`regs::FRAME_BUFFER_COUNT`] slots
    /// and the window must span the whole register block.
    pub fn new(window: W, pool: BufferPool, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        if window.len() < regs::REGISTER_SPAN {
            return Err(Error::InvalidParameter);
        }
        if pool.slot_count() < regs::FRAME_BUFFER_COUNT {
            return Err(Error::InvalidParameter);
        }
        if pool.slot_len() < config.geometry.frame_bytes() {
            // The shipped configuration runs this way; the ring wraps
            // inside a frame, which downstream consumers tolerate.
            log::warn!(
                "slot length {} below frame size {}",
                pool.slot_len(),
                config.geometry.frame_bytes()
            );
        }
        Ok(Self {
            window,
            pool,
            inner: Mutex::new(Inner {
                config,
                state: [ChannelState::Idle; 2],
            }),
            irq_events: AtomicU64::new(0),
        })
    }

    fn outbound(&self) -> ChannelRegs<'_, W> {
        ChannelRegs::new(&self.window, ChannelBank::OUTBOUND)
    }

    fn inbound(&self) -> ChannelRegs<'_, W> {
        ChannelRegs::new(&self.window, ChannelBank::INBOUND)
    }

    fn run_word(frame_irq_count: u8) -> u32 {
        let flags = ControlFlags::GENLOCK_SOURCE
            | ControlFlags::GENLOCK_ENABLE
            | ControlFlags::CIRCULAR_PARK
            | ControlFlags::RUN;
        insert_field(
            flags.bits(),
            frame_irq_count as u32,
            control_field::IRQ_FRAME_COUNT_LSB,
            control_field::IRQ_FRAME_COUNT_WIDTH,
        )
    }

    /// Reset both channels and wait for the resets to clear
    ///
    /// The channels are genlocked against each other, so resets always
    /// go to both. Holds the lock across the sequence.
    fn reset_both(&self, inner: &mut Inner) -> Result<()> {
        let out = self.outbound();
        let inb = self.inbound();
        inner.state = [ChannelState::ResettingBusy; 2];
        out.request_reset();
        inb.request_reset();
        let bound = inner.config.poll_iterations;
        let reset = ControlFlags::RESET.bits();
        let cleared = self.window.poll32(ChannelBank::OUTBOUND.control, reset, 0, bound)
            && self.window.poll32(ChannelBank::INBOUND.control, reset, 0, bound);
        if !cleared {
            log::warn!("reset did not clear within {} polls", bound);
            return Err(Error::ResetTimeout);
        }
        Ok(())
    }

    /// Bring both channels from reset to running
    ///
    /// Safe to call on a running engine: the sequence begins with a
    /// coupled reset, so a repeated start is a clean restart. The vsize
    /// writes come last because they arm the transfer. A timeout leaves
    /// the channel states where the failure found them; a subsequent
    /// [`reset`](Self::reset) recovers.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let config = inner.config;
        let geometry = config.geometry;

        self.reset_both(&mut inner)?;
        inner.state = [ChannelState::Configuring; 2];

        let out = self.outbound();
        let inb = self.inbound();

        inb.clear_status();
        out.clear_status();
        inb.unmask_irqs();

        out.select_index(0);
        inb.select_index(0);
        for slot in 0..regs::FRAME_BUFFER_COUNT {
            let addr = self.pool.bus_addr(slot)?;
            out.write_frame_buffer(slot, addr);
            inb.write_frame_buffer(slot, addr);
        }
        self.window.write32(regs::PARK_PTR, 0);

        inb.write_frame_delay_stride(config.frame_delay, geometry.stride_bytes);
        out.write_frame_delay_stride(config.frame_delay, geometry.stride_bytes);
        inb.write_hsize(geometry.hsize_bytes);
        out.write_hsize(geometry.hsize_bytes);
        // Arms the transfer; nothing may be programmed after this
        // except the run request itself.
        inb.write_vsize(geometry.vsize_lines);
        out.write_vsize(geometry.vsize_lines);

        let word = Self::run_word(config.frame_irq_count);
        inb.write_control(word);
        out.write_control(word);

        let mut started = false;
        for iteration in 0..config.poll_iterations {
            if out.running() && inb.running() {
                started = true;
                break;
            }
            if config.debug_poll {
                log::debug!(
                    "start: waiting, inbound cr={:#010x} sr={:?}, poll {}",
                    inb.control(),
                    inb.status(),
                    iteration
                );
            }
            core::hint::spin_loop();
        }
        if !started {
            log::warn!("engine did not start within {} polls", config.poll_iterations);
            return Err(Error::StartTimeout);
        }

        inner.state = [ChannelState::Running; 2];
        log::info!(
            "engine running: {}x{} lines, stride {}",
            geometry.hsize_bytes,
            geometry.vsize_lines,
            geometry.stride_bytes
        );
        Ok(())
    }

    /// Reset both channels back to idle
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        self.reset_both(&mut inner)?;
        inner.state = [ChannelState::Idle; 2];
        log::info!("engine reset");
        Ok(())
    }

    /// Acknowledge pending interrupts and count the event
    ///
    /// Reads both status words, writes the pending interrupt bits back
    /// to clear them, and returns their union. Never takes the
    /// configuration lock.
    pub fn handle_interrupt(&self) -> StatusFlags {
        self.irq_events.fetch_add(1, Ordering::Relaxed);
        let mut acked = StatusFlags::empty();
        for channel in [self.outbound(), self.inbound()] {
            let pending = channel.status().irq_bits();
            if !pending.is_empty() {
                channel.ack_irqs(pending);
                acked |= pending;
            }
        }
        acked
    }

    /// Interrupt events observed so far
    pub fn interrupt_count(&self) -> u64 {
        self.irq_events.load(Ordering::Relaxed)
    }

    /// Read both status words and reconcile the channel states
    ///
    /// A running channel observed halted, or carrying an unrecoverable
    /// error bit, is marked [`ChannelState::Halted`]. Report-only; no
    /// recovery is attempted.
    pub fn poll_health(&self) -> HealthReport {
        let mut inner = self.inner.lock();
        let mut statuses = [StatusFlags::empty(); 2];
        for direction in Direction::ALL {
            let index = dir_index(direction);
            let bank = match direction {
                Direction::Outbound => ChannelBank::OUTBOUND,
                Direction::Inbound => ChannelBank::INBOUND,
            };
            let status = ChannelRegs::new(&self.window, bank).status();
            statuses[index] = status;
            if inner.state[index] == ChannelState::Running
                && (status.contains(StatusFlags::HALTED) || status.any_error())
            {
                log::warn!("{} channel unhealthy, status {:?}", direction, status);
                inner.state[index] = ChannelState::Halted;
            }
        }
        HealthReport {
            outbound: statuses[dir_index(Direction::Outbound)],
            inbound: statuses[dir_index(Direction::Inbound)],
        }
    }

    /// Lifecycle state of one direction
    pub fn channel_state(&self, direction: Direction) -> ChannelState {
        self.inner.lock().state[dir_index(direction)]
    }

    /// Raw hardware version word
    pub fn version(&self) -> u32 {
        self.window.read32(regs::VERSION)
    }

    /// Render the full diagnostic report into `out`
    ///
    /// Read-only and lock-free; safe to call from an observer at any
    /// point in the lifecycle. Output order is fixed, so two calls over
    /// unchanged registers compare equal.
    pub fn diagnose(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let mut addrs = alloc::vec::Vec::with_capacity(self.pool.slot_count());
        for index in 0..self.pool.slot_count() {
            // In range by construction.
            if let Ok(addr) = self.pool.bus_addr(index) {
                addrs.push(addr);
            }
        }
        prism_diag::report(&self.window, &addrs, out)
    }

    /// Window length in bytes, the extent a region reader can cover
    pub fn region_len(&self) -> u32 {
        self.window.len()
    }

    /// Borrow the underlying register window
    pub fn window(&self) -> &W {
        &self.window
    }

    /// Read one register while holding the configuration lock
    pub(crate) fn locked_read32(&self, offset: u32) -> u32 {
        let _guard = self.inner.lock();
        self.window.read32(offset)
    }

    /// Give the window and pool back, dropping the controller
    pub fn into_parts(self) -> (W, BufferPool) {
        (self.window, self.pool)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use core::ptr::NonNull;

    use prism_core::BusAddr;
    use prism_hal::sim::SimWindow;
    use prism_mem::{DmaAllocator, DmaRegion};

    use super::*;

    const SLOT_LEN: usize = 0x1000;

    struct FakeAllocator {
        next_bus: u32,
    }

    impl FakeAllocator {
        fn new() -> Self {
            Self { next_bus: 0x1000_0000 }
        }
    }

    impl DmaAllocator for FakeAllocator {
        fn alloc_coherent(&mut self, len: usize) -> Option<DmaRegion> {
            let bus = BusAddr::new(self.next_bus);
            self.next_bus += len as u32;
            Some(DmaRegion { cpu: NonNull::dangling(), bus, len })
        }

        fn free_coherent(&mut self, _region: DmaRegion) {}
    }

    fn small_geometry() -> FrameGeometry {
        FrameGeometry::packed(64, 32)
    }

    fn make_controller(window: SimWindow) -> Controller<SimWindow> {
        let mut alloc = FakeAllocator::new();
        let pool = BufferPool::allocate(&mut alloc, 4, SLOT_LEN).unwrap();
        let config = ControllerConfig {
            geometry: small_geometry(),
            ..ControllerConfig::default()
        };
        Controller::new(window, pool, config).unwrap()
    }

    #[test]
    fn test_start_programs_documented_sequence() {
        let ctrl = make_controller(SimWindow::new());
        ctrl.start().unwrap();

        let fb = |i: u32| 0x1000_0000 + i * SLOT_LEN as u32;
        let run = (3 << 16) | 0x80 | 0x08 | 0x02 | 0x01;
        let expected: Vec<(u32, u32)> = alloc::vec![
            (0x00, 0x04), // outbound reset
            (0x30, 0x04), // inbound reset
            (0x34, 0),    // status clears
            (0x04, 0),
            (0x3c, 0x0f), // unmask
            (0x14, 0),    // index selects
            (0x44, 0),
            (0x5c, fb(0)),
            (0xac, fb(0)),
            (0x60, fb(1)),
            (0xb0, fb(1)),
            (0x64, fb(2)),
            (0xb4, fb(2)),
            (0x68, fb(3)),
            (0xb8, fb(3)),
            (0x28, 0),  // park pointer
            (0xa8, 64), // stride
            (0x58, 64),
            (0xa4, 64), // hsize
            (0x54, 64),
            (0xa0, 32), // vsize, the trigger
            (0x50, 32),
            (0x30, run),
            (0x00, run),
        ];
        let (window, _pool) = ctrl.into_parts();
        assert_eq!(window.writes(), expected);
    }

    #[test]
    fn test_start_twice_is_clean_restart() {
        let ctrl = make_controller(SimWindow::new());
        ctrl.start().unwrap();
        assert_eq!(ctrl.channel_state(Direction::Outbound), ChannelState::Running);
        assert_eq!(ctrl.channel_state(Direction::Inbound), ChannelState::Running);

        // The second start re-runs the whole sequence, reset first
        ctrl.window().clear_journal();
        ctrl.start().unwrap();
        let writes = ctrl.window().writes();
        assert_eq!(&writes[..2], &[(0x00, 0x04), (0x30, 0x04)]);
        assert_eq!(writes.last().map(|w| w.0), Some(0x00));
        assert_eq!(ctrl.channel_state(Direction::Inbound), ChannelState::Running);
        assert_eq!(ctrl.channel_state(Direction::Outbound), ChannelState::Running);
    }

    #[test]
    fn test_stuck_reset_times_out() {
        let ctrl = make_controller(SimWindow::new().with_stuck_reset());
        assert_eq!(ctrl.start().unwrap_err(), Error::ResetTimeout);
        assert_eq!(
            ctrl.channel_state(Direction::Outbound),
            ChannelState::ResettingBusy
        );
        assert_eq!(ctrl.reset().unwrap_err(), Error::ResetTimeout);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let ctrl = make_controller(SimWindow::new());
        ctrl.start().unwrap();
        ctrl.reset().unwrap();
        assert_eq!(ctrl.channel_state(Direction::Outbound), ChannelState::Idle);
        assert_eq!(ctrl.channel_state(Direction::Inbound), ChannelState::Idle);
        // The run request was replaced by the reset write
        assert_eq!(ctrl.locked_read32(0x00) & 0x01, 0);
    }

    #[test]
    fn test_new_rejects_short_pool() {
        let mut alloc = FakeAllocator::new();
        let pool = BufferPool::allocate(&mut alloc, 3, SLOT_LEN).unwrap();
        let config = ControllerConfig {
            geometry: small_geometry(),
            ..ControllerConfig::default()
        };
        assert!(matches!(
            Controller::new(SimWindow::new(), pool, config),
            Err(Error::InvalidParameter)
        ));
    }

    #[test]
    fn test_interrupt_ack_and_count() {
        let win = SimWindow::new();
        win.raise_status(ChannelBank::INBOUND, StatusFlags::FRAME_IRQ);
        let ctrl = make_controller(win);

        let acked = ctrl.handle_interrupt();
        assert_eq!(acked, StatusFlags::FRAME_IRQ);
        assert_eq!(ctrl.interrupt_count(), 1);

        // Ack cleared the bit, so a second event acks nothing
        assert_eq!(ctrl.handle_interrupt(), StatusFlags::empty());
        assert_eq!(ctrl.interrupt_count(), 2);
    }

    #[test]
    fn test_poll_health_marks_halted_channel() {
        let ctrl = make_controller(SimWindow::new());
        ctrl.start().unwrap();

        // The engine halts the inbound channel on its own
        ctrl.window().raise_status(ChannelBank::INBOUND, StatusFlags::HALTED);

        let report = ctrl.poll_health();
        assert!(report.inbound.contains(StatusFlags::HALTED));
        assert!(!report.any_error());
        assert_eq!(ctrl.channel_state(Direction::Inbound), ChannelState::Halted);
        assert_eq!(ctrl.channel_state(Direction::Outbound), ChannelState::Running);

        // Error bits demote a running channel too
        ctrl.window()
            .raise_status(ChannelBank::OUTBOUND, StatusFlags::DECODE_ERROR);
        let report = ctrl.poll_health();
        assert!(report.any_error());
        assert_eq!(ctrl.channel_state(Direction::Outbound), ChannelState::Halted);
    }

    #[test]
    fn test_diagnose_is_stable() {
        use alloc::string::String;

        let win = SimWindow::new();
        win.preload(regs::VERSION, 0x6501_0042);
        let ctrl = make_controller(win);
        ctrl.start().unwrap();

        let mut first = String::new();
        ctrl.diagnose(&mut first).unwrap();
        let mut second = String::new();
        ctrl.diagnose(&mut second).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("PRISM version: 6.50.1-66\n"));
        assert_eq!(ctrl.version(), 0x6501_0042);
    }
}
