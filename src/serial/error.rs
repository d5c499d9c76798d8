// src/serial/error.rs

//! Error types for UART configuration and transfers

use core::fmt;

/// UART driver errors
///
/// Every error is reported synchronously to the immediate caller; the
/// drivers never retry or log on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    /// A baud rate of zero was requested
    InvalidBaudRate,
    /// The clock is too slow for the requested rate (divisor would be 0)
    ZeroDivisor { clock_hz: u32, baud: u32 },
    /// The divisor does not fit the 16-bit divisor field
    DivisorOverflow { divisor: u32 },
    /// The peripheral cannot produce the requested line format
    UnsupportedFormat,
    /// Register window base address is null or wraps the address space
    InvalidAddress,
    /// Register window base address is not aligned to the register width
    MisalignedAddress,
    /// Presence probe did not see a responding peripheral
    NotPresent,
    /// A bounded wait gave up before the status bit was set
    Timeout { iterations: u32 },
    /// The received byte was flagged by the line status register
    Line(LineError),
}

/// Receive-side conditions reported by a 16550 line status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// A byte arrived while the receive buffer was full
    Overrun,
    /// Parity bit mismatch
    Parity,
    /// Missing stop bit
    Framing,
    /// Line held low for longer than a full character time
    Break,
}

impl LineError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineError::Overrun => "receiver overrun",
            LineError::Parity => "parity error",
            LineError::Framing => "framing error",
            LineError::Break => "break condition",
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UartError::InvalidBaudRate => write!(f, "UART baud rate must be non-zero"),
            UartError::ZeroDivisor { clock_hz, baud } => write!(
                f,
                "UART clock of {} Hz cannot produce {} baud (divisor would be 0)",
                clock_hz, baud
            ),
            UartError::DivisorOverflow { divisor } => {
                write!(f, "UART divisor {} does not fit in 16 bits", divisor)
            }
            UartError::UnsupportedFormat => {
                write!(f, "UART line format not supported by this peripheral")
            }
            UartError::InvalidAddress => write!(f, "UART register window address is invalid"),
            UartError::MisalignedAddress => {
                write!(f, "UART register window address is misaligned")
            }
            UartError::NotPresent => write!(f, "UART hardware not present"),
            UartError::Timeout { iterations } => {
                write!(f, "UART status poll timed out after {} iterations", iterations)
            }
            UartError::Line(e) => write!(f, "UART line error: {}", e),
        }
    }
}

impl core::error::Error for UartError {}

impl From<LineError> for UartError {
    fn from(err: LineError) -> Self {
        UartError::Line(err)
    }
}

/// A multi-byte write that stopped early
///
/// `written` bytes were accepted by the transmitter before `error` occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteError {
    pub written: usize,
    pub error: UartError,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} bytes)", self.error, self.written)
    }
}

impl core::error::Error for WriteError {}

impl From<WriteError> for UartError {
    fn from(err: WriteError) -> Self {
        err.error
    }
}
