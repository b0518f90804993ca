//! Register value decoders and the diagnostic report.

use alloc::string::String;
use core::fmt;

use prism_core::BusAddr;
use prism_hal::regs::{
    self, control_field, extract_field, status_field, version_field, ControlFlags, StatusFlags,
};
use prism_hal::window::RegisterIo;

// =============================================================================
// REGISTER CLASSES
// =============================================================================

/// Decoder selection for a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// Channel control word
    Control,
    /// Channel status word
    Status,
    /// Frame-timing interrupt mask
    IrqMask,
    /// Hardware version word
    Version,
    /// No field structure known, rendered as raw hex
    Raw,
}

/// Classify an offset by which decoder applies to it
pub fn classify(offset: u32) -> RegisterClass {
    match offset {
        regs::outbound::CONTROL | regs::inbound::CONTROL => RegisterClass::Control,
        regs::outbound::STATUS | regs::inbound::STATUS => RegisterClass::Status,
        regs::inbound::IRQ_MASK => RegisterClass::IrqMask,
        regs::VERSION => RegisterClass::Version,
        _ => RegisterClass::Raw,
    }
}

// =============================================================================
// FLAG NAME TABLES
// =============================================================================

// Split around the write-pointer field, which the dump prints between
// the IRQ-enable flags and genlock-source
const CONTROL_FLAGS_ABOVE_WP: &[(ControlFlags, &str)] = &[
    (ControlFlags::REPEAT, "repeat"),
    (ControlFlags::ERROR_IRQ_EN, "err-irq-en"),
    (ControlFlags::DELAY_IRQ_EN, "delay-irq-en"),
    (ControlFlags::FRAME_IRQ_EN, "frame-irq-en"),
];

const CONTROL_FLAGS_BELOW_WP: &[(ControlFlags, &str)] = &[
    (ControlFlags::GENLOCK_SOURCE, "genlock-source"),
    (ControlFlags::FRAME_COUNT_ENABLE, "frame-count-en"),
    (ControlFlags::GENLOCK_ENABLE, "genlock"),
    (ControlFlags::RESET, "reset"),
    (ControlFlags::CIRCULAR_PARK, "circular-park"),
];

const STATUS_FLAG_NAMES: &[(StatusFlags, &str)] = &[
    (StatusFlags::INTERNAL_ERROR, "internal-error"),
    (StatusFlags::SLAVE_ERROR, "slave-error"),
    (StatusFlags::DECODE_ERROR, "decode-error"),
    (StatusFlags::SOF_EARLY_ERROR, "start-of-frame-early-error"),
    (StatusFlags::EOL_EARLY_ERROR, "end-of-line-early-error"),
    (StatusFlags::SOF_LATE_ERROR, "start-of-frame-late-error"),
    (StatusFlags::FRAME_IRQ, "frame-count-interrupt"),
    (StatusFlags::DELAY_IRQ, "delay-count-interrupt"),
    (StatusFlags::ERROR_IRQ, "error-interrupt"),
    (StatusFlags::EOL_LATE_ERROR, "end-of-line-late-error"),
];

/// One multi-bit field of a table-driven register decode
pub struct BitField {
    /// Least significant bit position
    pub lsb: u8,
    /// Field width in bits
    pub width: u8,
    /// Display name
    pub name: &'static str,
}

const IRQ_MASK_FIELDS: &[BitField] = &[
    BitField { lsb: 3, width: 1, name: "eol-late-err" },
    BitField { lsb: 2, width: 1, name: "sof-late-err" },
    BitField { lsb: 1, width: 1, name: "eol-early-err" },
    BitField { lsb: 0, width: 1, name: "sof-early-err" },
];

// =============================================================================
// DECODERS
// =============================================================================

/// Decode a control word into `out`
///
/// Counts first, then the set flags with the multi-bit write pointer in
/// its bit-order position, ending with `run` or `stop` from the run bit.
pub fn decode_control(value: u32, out: &mut dyn fmt::Write) -> fmt::Result {
    write!(
        out,
        "irq-delay-count:{};",
        extract_field(value, control_field::IRQ_DELAY_COUNT_LSB, control_field::IRQ_DELAY_COUNT_WIDTH)
    )?;
    write!(
        out,
        "irq-frame-count:{};",
        extract_field(value, control_field::IRQ_FRAME_COUNT_LSB, control_field::IRQ_FRAME_COUNT_WIDTH)
    )?;
    let flags = ControlFlags::from_bits_truncate(value);
    for (flag, name) in CONTROL_FLAGS_ABOVE_WP {
        if flags.contains(*flag) {
            write!(out, "{};", name)?;
        }
    }
    write!(
        out,
        "write-pointer:{};",
        extract_field(value, control_field::WRITE_POINTER_LSB, control_field::WRITE_POINTER_WIDTH)
    )?;
    for (flag, name) in CONTROL_FLAGS_BELOW_WP {
        if flags.contains(*flag) {
            write!(out, "{};", name)?;
        }
    }
    let running = flags.contains(ControlFlags::RUN);
    write!(out, "{}", if running { "run" } else { "stop" })
}

/// Decode a status word into `out`
///
/// Set flags first, then the frame and delay counters, ending with
/// `halted` or `running`.
pub fn decode_status(value: u32, out: &mut dyn fmt::Write) -> fmt::Result {
    let flags = StatusFlags::from_bits_truncate(value);
    for (flag, name) in STATUS_FLAG_NAMES {
        if flags.contains(*flag) {
            write!(out, "{};", name)?;
        }
    }
    write!(
        out,
        "frame-count:{};",
        extract_field(value, status_field::FRAME_COUNT_LSB, status_field::FRAME_COUNT_WIDTH)
    )?;
    write!(
        out,
        "delay-count:{};",
        extract_field(value, status_field::DELAY_COUNT_LSB, status_field::DELAY_COUNT_WIDTH)
    )?;
    let halted = flags.contains(StatusFlags::HALTED);
    write!(out, "{}", if halted { "halted" } else { "running" })
}

/// Decode the interrupt-mask word into `out`, one `name=value,` per field
pub fn decode_irq_mask(value: u32, out: &mut dyn fmt::Write) -> fmt::Result {
    for field in IRQ_MASK_FIELDS {
        write!(
            out,
            "{}={:x},",
            field.name,
            extract_field(value, field.lsb, field.width)
        )?;
    }
    Ok(())
}

/// Render the version word as `major.minor.revision-patch`
pub fn decode_version(value: u32, out: &mut dyn fmt::Write) -> fmt::Result {
    write!(
        out,
        "{}.{:02x}.{}-{}",
        extract_field(value, version_field::MAJOR_LSB, version_field::MAJOR_WIDTH),
        extract_field(value, version_field::MINOR_LSB, version_field::MINOR_WIDTH),
        extract_field(value, version_field::REVISION_LSB, version_field::REVISION_WIDTH),
        extract_field(value, version_field::PATCH_LSB, version_field::PATCH_WIDTH),
    )
}

/// Decode `value` with the decoder for `class` into `out`
pub fn decode_class(class: RegisterClass, value: u32, out: &mut dyn fmt::Write) -> fmt::Result {
    match class {
        RegisterClass::Control => decode_control(value, out),
        RegisterClass::Status => decode_status(value, out),
        RegisterClass::IrqMask => decode_irq_mask(value, out),
        RegisterClass::Version => decode_version(value, out),
        RegisterClass::Raw => write!(out, "raw:0x{:08x}", value),
    }
}

/// Decode `value` for the register named `name`
///
/// Names are the [`REGISTER_TABLE`] display names; an unknown name
/// decodes to the raw hex value, never an error.
pub fn decode(name: &str, value: u32) -> String {
    let class = REGISTER_TABLE
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| classify(entry.offset))
        .unwrap_or(RegisterClass::Raw);
    let mut out = String::new();
    // String formatting is infallible.
    let _ = decode_class(class, value, &mut out);
    out
}

// =============================================================================
// DUMP TABLE
// =============================================================================

/// One row of the diagnostic dump
#[derive(Debug, Clone, Copy)]
pub struct RegisterEntry {
    /// Byte offset in the register block
    pub offset: u32,
    /// Display name
    pub name: &'static str,
}

/// Registers a diagnostic dump walks, in fixed order
pub const REGISTER_TABLE: &[RegisterEntry] = &[
    RegisterEntry { offset: regs::outbound::CONTROL, name: "OUT_CONTROL" },
    RegisterEntry { offset: regs::outbound::STATUS, name: "OUT_STATUS" },
    RegisterEntry { offset: regs::outbound::INDEX_SELECT, name: "OUT_INDEX" },
    RegisterEntry { offset: regs::PARK_PTR, name: "PARK_PTR" },
    RegisterEntry { offset: regs::VERSION, name: "VERSION" },
    RegisterEntry { offset: regs::inbound::CONTROL, name: "IN_CONTROL" },
    RegisterEntry { offset: regs::inbound::STATUS, name: "IN_STATUS" },
    RegisterEntry { offset: regs::inbound::IRQ_MASK, name: "IN_IRQ_MASK" },
    RegisterEntry { offset: regs::inbound::INDEX_SELECT, name: "IN_INDEX" },
    RegisterEntry { offset: regs::outbound::VSIZE, name: "OUT_VSIZE" },
    RegisterEntry { offset: regs::outbound::HSIZE, name: "OUT_HSIZE" },
    RegisterEntry { offset: regs::outbound::FRAME_DELAY_STRIDE, name: "OUT_FRMDLY_STRIDE" },
    RegisterEntry { offset: regs::inbound::VSIZE, name: "IN_VSIZE" },
    RegisterEntry { offset: regs::inbound::HSIZE, name: "IN_HSIZE" },
    RegisterEntry { offset: regs::inbound::FRAME_DELAY_STRIDE, name: "IN_FRMDLY_STRIDE" },
];

/// Dump every table register from `window` into `out`
///
/// Line format is `0xOOOO\tHHHH'LLLL\tNAME\t<decode>`. The walk order
/// is the table's and never varies between calls, so two dumps of the
/// same hardware state compare equal line for line.
pub fn dump<W: RegisterIo + ?Sized>(window: &W, out: &mut dyn fmt::Write) -> fmt::Result {
    for entry in REGISTER_TABLE {
        let value = window.read32(entry.offset);
        write!(
            out,
            "0x{:04x}\t{:04x}'{:04x}\t{}\t",
            entry.offset,
            value >> 16,
            value & 0xffff,
            entry.name
        )?;
        decode_class(classify(entry.offset), value, out)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Full diagnostic report
///
/// Version header, the register dump, the programmed frame-buffer
/// addresses of both directions, then every pool slot bus address,
/// eight per line.
pub fn report<W: RegisterIo + ?Sized>(
    window: &W,
    slot_addrs: &[BusAddr],
    out: &mut dyn fmt::Write,
) -> fmt::Result {
    write!(out, "PRISM version: ")?;
    decode_version(window.read32(regs::VERSION), out)?;
    writeln!(out)?;

    dump(window, out)?;

    for (bank, name) in [
        (regs::ChannelBank::OUTBOUND, "OUT_FRAME_BUFFERS"),
        (regs::ChannelBank::INBOUND, "IN_FRAME_BUFFERS"),
    ] {
        write!(out, "0x{:04x}\t{}\t", bank.frame_buffer_0, name)?;
        for slot in 0..regs::FRAME_BUFFER_COUNT {
            write!(out, "0x{:08x} ", window.read32(bank.frame_buffer(slot)))?;
        }
        writeln!(out)?;
    }

    for (index, addr) in slot_addrs.iter().enumerate() {
        write!(out, "0x{:08x} ", addr.raw())?;
        if index % 8 == 7 {
            writeln!(out)?;
        }
    }
    if !slot_addrs.is_empty() && slot_addrs.len() % 8 != 0 {
        writeln!(out)?;
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_decode_run_and_stop() {
        // frame-irq-count 3, genlock-source, genlock, circular-park, run
        let word = (3 << 16) | 0x80 | 0x08 | 0x02 | 0x01;
        let mut out = String::new();
        decode_control(word, &mut out).unwrap();
        assert_eq!(
            out,
            "irq-delay-count:0;irq-frame-count:3;write-pointer:0;genlock-source;genlock;circular-park;run"
        );

        let mut out = String::new();
        decode_control(word & !1, &mut out).unwrap();
        assert!(out.ends_with("stop"));
    }

    #[test]
    fn test_control_decode_write_pointer_placement() {
        // The write pointer sits between the IRQ-enable flags and
        // genlock-source, as the hardware orders the bits
        let word = (1 << 12) | (2 << 8) | (1 << 7);
        let mut out = String::new();
        decode_control(word, &mut out).unwrap();
        assert_eq!(
            out,
            "irq-delay-count:0;irq-frame-count:0;frame-irq-en;write-pointer:2;genlock-source;stop"
        );
    }

    #[test]
    fn test_status_decode_terminal_state() {
        let mut out = String::new();
        decode_status(StatusFlags::HALTED.bits(), &mut out).unwrap();
        assert_eq!(out, "frame-count:0;delay-count:0;halted");

        let word = StatusFlags::FRAME_IRQ.bits() | (5 << 16);
        let mut out = String::new();
        decode_status(word, &mut out).unwrap();
        assert_eq!(out, "frame-count-interrupt;frame-count:5;delay-count:0;running");
    }

    #[test]
    fn test_status_decode_errors() {
        let word = (StatusFlags::SLAVE_ERROR | StatusFlags::EOL_LATE_ERROR).bits();
        let mut out = String::new();
        decode_status(word, &mut out).unwrap();
        assert!(out.starts_with("slave-error;end-of-line-late-error;"));
    }

    #[test]
    fn test_irq_mask_decode() {
        let mut out = String::new();
        decode_irq_mask(0x05, &mut out).unwrap();
        assert_eq!(out, "eol-late-err=0,sof-late-err=1,eol-early-err=0,sof-early-err=1,");
    }

    #[test]
    fn test_version_decode() {
        let mut out = String::new();
        decode_version(0x6501_0042, &mut out).unwrap();
        assert_eq!(out, "6.50.1-66");
    }

    #[test]
    fn test_decode_by_name() {
        assert_eq!(
            decode("IN_STATUS", StatusFlags::HALTED.bits()),
            "frame-count:0;delay-count:0;halted"
        );
        // Unknown names fall back to raw hex
        assert_eq!(decode("NO_SUCH_REGISTER", 1080), "raw:0x00000438");
        assert_eq!(decode("OUT_VSIZE", 1080), "raw:0x00000438");
    }

    #[test]
    fn test_dump_is_order_stable() {
        use prism_hal::sim::SimWindow;

        let win = SimWindow::new();
        win.preload(regs::VERSION, 0x6501_0042);

        let mut first = String::new();
        dump(&win, &mut first).unwrap();
        let mut second = String::new();
        dump(&win, &mut second).unwrap();
        assert_eq!(first, second);

        let mut lines = first.lines();
        assert_eq!(
            lines.next().unwrap(),
            "0x0000\t0000'0000\tOUT_CONTROL\tirq-delay-count:0;irq-frame-count:0;write-pointer:0;stop"
        );
        assert_eq!(
            lines.next().unwrap(),
            "0x0004\t0000'0001\tOUT_STATUS\tframe-count:0;delay-count:0;halted"
        );
        assert_eq!(first.lines().count(), REGISTER_TABLE.len());
    }

    #[test]
    fn test_report_layout() {
        use prism_hal::sim::SimWindow;

        let win = SimWindow::new();
        win.preload(regs::VERSION, 0x6501_0042);
        let slots: alloc::vec::Vec<BusAddr> =
            (0..10).map(|i| BusAddr::new(0x1000_0000 + i * 0x0050_0000)).collect();

        let mut out = String::new();
        report(&win, &slots, &mut out).unwrap();

        let lines: alloc::vec::Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "PRISM version: 6.50.1-66");
        // version header + table + two frame-buffer rows + two slot rows
        assert_eq!(lines.len(), 1 + REGISTER_TABLE.len() + 2 + 2);
        assert!(lines[1 + REGISTER_TABLE.len()].starts_with("0x005c\tOUT_FRAME_BUFFERS\t"));
        // 10 slots render as a line of 8 and a line of 2
        let first_slots = lines[lines.len() - 2];
        assert_eq!(first_slots.split_whitespace().count(), 8);
        assert_eq!(lines[lines.len() - 1].split_whitespace().count(), 2);
    }
}
