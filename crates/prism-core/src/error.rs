//! # PRISM Error Handling
//!
//! Unified error type for the video DMA driver stack.
//!
//! Error handling in PRISM follows these principles:
//! - Every fallible operation returns `Result` with a specific error kind
//! - No panics in production code paths; register-window contract
//!   violations (misaligned or out-of-range offsets) are caller
//!   programming errors and fail fast at the access site instead
//! - Errors are `no_std` compatible and `Copy`

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// PRISM Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// PRISM unified error type
///
/// Covers the error conditions of the whole driver stack. Timeout errors
/// leave the controller in whatever state it last attempted to reach; the
/// caller recovers with an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A parameter failed validation (zero geometry, empty pool, ...)
    InvalidParameter,
    /// Buffer pool index outside the allocated slot range
    SlotOutOfRange,
    /// The platform DMA allocator could not satisfy a request
    AllocationFailed,
    /// Reset bit did not clear within the bounded poll budget
    ResetTimeout,
    /// Run/halted handshake did not complete within the bounded poll budget
    StartTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::SlotOutOfRange => write!(f, "buffer slot index out of range"),
            Self::AllocationFailed => write!(f, "DMA allocation failed"),
            Self::ResetTimeout => write!(f, "engine reset timed out"),
            Self::StartTimeout => write!(f, "engine start timed out"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_are_distinct() {
        // Two timeouts are reported differently so an operator can tell
        // which phase of the handshake gave up.
        let mut buf = [0u8; 64];
        let reset = fmt_to_slice(Error::ResetTimeout, &mut buf);
        assert!(reset.contains("reset"));
        let mut buf = [0u8; 64];
        let start = fmt_to_slice(Error::StartTimeout, &mut buf);
        assert!(start.contains("start"));
    }

    fn fmt_to_slice(err: Error, buf: &mut [u8]) -> &str {
        use core::fmt::Write;

        struct Sink<'a> {
            buf: &'a mut [u8],
            len: usize,
        }
        impl fmt::Write for Sink<'_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                let bytes = s.as_bytes();
                self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
                self.len += bytes.len();
                Ok(())
            }
        }

        let mut sink = Sink { buf, len: 0 };
        write!(sink, "{}", err).unwrap();
        let len = sink.len;
        core::str::from_utf8(&buf[..len]).unwrap()
    }
}
