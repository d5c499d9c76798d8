// src/serial/mod.rs

//! UART drivers for bare-metal RISC-V
//!
//! Two peripheral variants share one byte-stream interface, [`Uart`]:
//! - [`Ns16550`]: 16550-compatible, byte-wide registers, DLAB-gated divisor
//! - [`SiFive`]: SiFive FU540/FU740, 32-bit registers, status in data words
//!
//! Drivers are generic over a [`UartHardware`] backend ([`Mmio`] on real
//! hardware) and a [`WaitStrategy`] for status polls ([`Spin`] by default).
//!
//! The board's console UART is also exposed as a global behind a
//! `spin::Mutex`, written through [`uart_print!`](crate::uart_print) and
//! [`uart_println!`](crate::uart_println).
//!
//! # Locking
//!
//! Nothing that runs under the console lock may print or log: the lock is
//! not reentrant. The drivers never log for this reason.

pub mod backend;
mod config;
pub mod constants;
pub mod divisor;
mod error;
#[cfg(test)]
mod mock;
pub mod ns16550;
pub mod sifive;
pub mod timeout;

pub use backend::{Mmio, RegisterMap, UartHardware};
pub use config::{LineFormat, Parity, StopBits, UartConfig, WordLength};
pub use divisor::{checked_divisor, checked_oversampled_divisor, BaudRate};
pub use error::{LineError, UartError, WriteError};
pub use ns16550::Ns16550;
pub use sifive::SiFive;
pub use timeout::{Bounded, Spin, TimeoutConfig, WaitStrategy, Yielding};

use crate::board::{self, ConsoleKind, PortConfig};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

/// Blocking byte-stream interface shared by both UART variants
pub trait Uart {
    /// Transmitter can accept another byte
    fn tx_ready(&mut self) -> bool;

    /// A received byte is waiting
    fn rx_ready(&mut self) -> bool;

    /// Wait for transmit space, then hand `byte` to the transmitter
    ///
    /// Returning means the hardware accepted the byte, not that it has left
    /// the wire.
    fn put_byte(&mut self, byte: u8) -> Result<(), UartError>;

    /// Wait for a received byte and return it
    fn get_byte(&mut self) -> Result<u8, UartError>;

    /// Wait until queued output has drained as far as the hardware reports
    fn flush(&mut self) -> Result<(), UartError>;

    /// Send `bytes` in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// [`WriteError`] carries how many bytes were accepted before the
    /// failing one.
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        for (written, &byte) in bytes.iter().enumerate() {
            self.put_byte(byte)
                .map_err(|error| WriteError { written, error })?;
        }
        Ok(bytes.len())
    }

    /// Send the UTF-8 bytes of `s`
    fn put_str(&mut self, s: &str) -> Result<usize, WriteError> {
        self.put_bytes(s.as_bytes())
    }
}

/// The board's console UART
#[derive(Debug)]
pub enum Console {
    Ns16550(Ns16550<Mmio<u8>>),
    SiFive(SiFive<Mmio<u32>>),
}

impl Console {
    /// Build the driver for one of the board's ports
    ///
    /// # Safety
    ///
    /// `port.base_address` must be the register window of a UART of kind
    /// `kind`, mapped as device memory and not accessed through any other
    /// handle for the lifetime of the returned value.
    pub unsafe fn new(kind: ConsoleKind, port: PortConfig) -> Result<Self, UartError> {
        Ok(match kind {
            ConsoleKind::Ns16550 => {
                // SAFETY: forwarded from the caller.
                let window = unsafe { Mmio::new::<ns16550::Register>(port.base_address)? };
                Console::Ns16550(Ns16550::new(window, port.clock_hz))
            }
            ConsoleKind::SiFive => {
                // SAFETY: forwarded from the caller.
                let window = unsafe { Mmio::new::<sifive::Register>(port.base_address)? };
                Console::SiFive(SiFive::new(window, port.clock_hz))
            }
        })
    }

    pub fn init(&mut self, config: &UartConfig) -> Result<(), UartError> {
        match self {
            Console::Ns16550(uart) => uart.init(config),
            Console::SiFive(uart) => uart.init(config),
        }
    }

    pub fn kind(&self) -> ConsoleKind {
        match self {
            Console::Ns16550(_) => ConsoleKind::Ns16550,
            Console::SiFive(_) => ConsoleKind::SiFive,
        }
    }
}

impl Uart for Console {
    fn tx_ready(&mut self) -> bool {
        match self {
            Console::Ns16550(uart) => uart.tx_ready(),
            Console::SiFive(uart) => uart.tx_ready(),
        }
    }

    fn rx_ready(&mut self) -> bool {
        match self {
            Console::Ns16550(uart) => uart.rx_ready(),
            Console::SiFive(uart) => uart.rx_ready(),
        }
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), UartError> {
        match self {
            Console::Ns16550(uart) => uart.put_byte(byte),
            Console::SiFive(uart) => uart.put_byte(byte),
        }
    }

    fn get_byte(&mut self) -> Result<u8, UartError> {
        match self {
            Console::Ns16550(uart) => uart.get_byte(),
            Console::SiFive(uart) => uart.get_byte(),
        }
    }

    fn flush(&mut self) -> Result<(), UartError> {
        match self {
            Console::Ns16550(uart) => uart.flush(),
            Console::SiFive(uart) => uart.flush(),
        }
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}

static CONSOLE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Global console, `None` until [`init`] succeeds
static CONSOLE: Mutex<Option<Console>> = Mutex::new(None);

/// Initialize the board console at the configured baud rate, 8N1
///
/// Safe to call again: the register sequence is simply re-run.
///
/// # Errors
///
/// Address and divisor errors from the board description.
pub fn init() -> Result<(), UartError> {
    init_with_config(&UartConfig::new(BaudRate::from(board::BAUD_RATE)))
}

/// Initialize the board console with an explicit line configuration
pub fn init_with_config(config: &UartConfig) -> Result<(), UartError> {
    let port = board::console_port();
    let kind = install(&mut CONSOLE.lock(), config, || {
        // SAFETY: the board description names the console's register
        // window, and this mutex is its only owner.
        unsafe { Console::new(board::CONSOLE, port) }
    })?;

    CONSOLE_INITIALIZED.store(true, Ordering::Release);
    log::info!(
        "{:?} console at {:#x}, {} Hz clock, {} baud",
        kind,
        port.base_address,
        port.clock_hz,
        config.baud.hz()
    );
    Ok(())
}

/// Build the console on first use, then run its init sequence
///
/// A console already in `slot` is reused, so repeated calls only re-run the
/// register sequence.
fn install<F>(
    slot: &mut Option<Console>,
    config: &UartConfig,
    build: F,
) -> Result<ConsoleKind, UartError>
where
    F: FnOnce() -> Result<Console, UartError>,
{
    let console = match slot.take() {
        Some(console) => console,
        None => build()?,
    };
    let console = slot.insert(console);
    console.init(config)?;
    Ok(console.kind())
}

/// Check if the console has been initialized
#[inline]
pub fn is_initialized() -> bool {
    CONSOLE_INITIALIZED.load(Ordering::Acquire)
}

/// Run `f` with exclusive access to the console
///
/// Returns `None` before [`init`]. `f` must not print or log.
pub fn with_console<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Console) -> R,
{
    CONSOLE.lock().as_mut().map(f)
}

#[doc(hidden)]
pub fn print_impl(args: fmt::Arguments) {
    use core::fmt::Write;
    if !is_initialized() {
        return;
    }
    // A failed console write has nowhere to be reported.
    let _ = with_console(|console| console.write_fmt(args));
}

/// Prints to the console UART.
#[macro_export]
macro_rules! uart_print {
    ($($arg:tt)*) => {
        $crate::serial::print_impl(format_args!($($arg)*))
    };
}

/// Prints to the console UART, appending a newline.
#[macro_export]
macro_rules! uart_println {
    () => ($crate::uart_print!("\n"));
    ($fmt:expr) => ($crate::uart_print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::uart_print!(
        concat!($fmt, "\n"), $($arg)*));
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::MockHardware;

    #[derive(Debug, Default)]
    struct Failing {
        accepted: usize,
        limit: usize,
    }

    impl Uart for Failing {
        fn tx_ready(&mut self) -> bool {
            self.accepted < self.limit
        }

        fn rx_ready(&mut self) -> bool {
            false
        }

        fn put_byte(&mut self, _byte: u8) -> Result<(), UartError> {
            if self.accepted == self.limit {
                return Err(UartError::Timeout { iterations: 1 });
            }
            self.accepted += 1;
            Ok(())
        }

        fn get_byte(&mut self) -> Result<u8, UartError> {
            Err(UartError::Timeout { iterations: 1 })
        }

        fn flush(&mut self) -> Result<(), UartError> {
            Ok(())
        }
    }

    #[test]
    fn test_put_bytes_counts_written() {
        let mut uart = Failing { accepted: 0, limit: 16 };
        assert_eq!(uart.put_bytes(b"abc"), Ok(3));
        assert_eq!(uart.put_str(""), Ok(0));
    }

    #[test]
    fn test_put_bytes_stops_at_first_failure() {
        let mut uart = Failing { accepted: 0, limit: 2 };
        assert_eq!(
            uart.put_str("hello"),
            Err(WriteError {
                written: 2,
                error: UartError::Timeout { iterations: 1 }
            })
        );
        assert_eq!(uart.accepted, 2);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut lines = MockHardware::<u8>::new();
        lines.set(constants::ns16550_offset::LINE_STATUS, 0x60);
        let mut ns = Ns16550::new(lines, 1_843_200);
        let mut sifive = SiFive::new(MockHardware::<u32>::new(), 100_000_000);
        let uarts: [&mut dyn Uart; 2] = [&mut ns, &mut sifive];
        for uart in uarts {
            uart.put_str("hi").unwrap();
        }
        assert_eq!(ns.hardware().writes().len(), 2);
        assert_eq!(sifive.hardware().writes().len(), 2);
    }

    const NS16550_LSR: usize = constants::ns16550_offset::LINE_STATUS;

    /// Host memory standing in for a 16550 register window
    fn ns16550_window(regs: &mut [u8; 8]) -> PortConfig {
        regs[NS16550_LSR] = 0x60;
        PortConfig {
            base_address: regs.as_mut_ptr() as usize,
            clock_hz: 1_843_200,
        }
    }

    fn snapshot(port: PortConfig) -> [u8; 8] {
        unsafe { core::ptr::read_volatile(port.base_address as *const [u8; 8]) }
    }

    #[test]
    fn test_install_builds_once_and_reinit_is_idempotent() {
        let mut regs = [0u8; 8];
        let port = ns16550_window(&mut regs);
        let config = UartConfig::default();
        let mut slot = None;
        let mut builds = 0;

        let kind = install(&mut slot, &config, || {
            builds += 1;
            unsafe { Console::new(ConsoleKind::Ns16550, port) }
        });
        assert_eq!(kind, Ok(ConsoleKind::Ns16550));
        let first = snapshot(port);
        assert_eq!(first[constants::ns16550_offset::LINE_CONTROL], 0x03);
        assert_eq!(first[constants::ns16550_offset::INTERRUPT_ENABLE], 0x00);

        let kind = install(&mut slot, &config, || {
            builds += 1;
            unsafe { Console::new(ConsoleKind::Ns16550, port) }
        });
        assert_eq!(kind, Ok(ConsoleKind::Ns16550));
        assert_eq!(builds, 1);
        assert_eq!(snapshot(port), first);
    }

    #[test]
    fn test_install_keeps_slot_empty_on_bad_address() {
        let mut slot = None;
        let port = PortConfig {
            base_address: 0,
            clock_hz: 1_843_200,
        };
        let result = install(&mut slot, &UartConfig::default(), || unsafe {
            Console::new(ConsoleKind::SiFive, port)
        });
        assert_eq!(result, Err(UartError::InvalidAddress));
        assert!(slot.is_none());
    }

    #[test]
    fn test_console_dispatches_to_driver() {
        use core::fmt::Write;
        let mut regs = [0u8; 8];
        let port = ns16550_window(&mut regs);
        let mut console = unsafe { Console::new(ConsoleKind::Ns16550, port) }.unwrap();
        console.init(&UartConfig::default()).unwrap();

        assert_eq!(console.kind(), ConsoleKind::Ns16550);
        assert!(console.tx_ready());
        assert_eq!(console.put_str("ok"), Ok(2));
        assert_eq!(snapshot(port)[constants::ns16550_offset::DATA], b'k');
        write!(console, "!").unwrap();
        assert_eq!(snapshot(port)[constants::ns16550_offset::DATA], b'!');
        assert_eq!(console.flush(), Ok(()));
    }

    #[test]
    fn test_console_rejects_null_window() {
        let port = PortConfig {
            base_address: 0,
            clock_hz: 1_843_200,
        };
        let console = unsafe { Console::new(ConsoleKind::Ns16550, port) };
        assert_eq!(console.err(), Some(UartError::InvalidAddress));
    }

    #[test]
    fn test_print_before_init_is_dropped() {
        assert!(!is_initialized());
        crate::uart_println!("dropped {}", 1);
        assert!(with_console(|_| ()).is_none());
    }
}
