// src/serial/ns16550.rs

//! 16550-compatible UART driver
//!
//! Byte-wide registers; the divisor latches share offsets 0 and 1 with
//! RBR/THR and IER and are selected by LCR.DLAB. Latch registers are only
//! reachable through a `DivisorLatch` guard, which sets DLAB when created
//! and clears it when dropped, so a divisor write can never land on THR or
//! IER and a data write can never land on a latch.

use super::backend::{RegisterMap, UartHardware};
use super::config::UartConfig;
use super::constants::{
    ns16550_offset, FifoControl, LineStatus, IER_ALL_DISABLED, LCR_DIVISOR_LATCH_ACCESS,
    SCRATCH_TEST_PATTERNS,
};
use super::divisor::checked_oversampled_divisor;
use super::error::{LineError, UartError};
use super::timeout::{Spin, WaitStrategy};
use super::Uart;
use core::fmt;

/// Baud generator ticks per bit
pub const OVERSAMPLING: u32 = 16;

/// Registers addressable while DLAB is clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// RBR on read, THR on write
    Data,
    InterruptEnable,
    /// IIR on read, FCR on write
    FifoControl,
    LineControl,
    ModemControl,
    LineStatus,
    ModemStatus,
    Scratch,
}

impl RegisterMap for Register {
    type Word = u8;
    const WINDOW_SIZE: usize = ns16550_offset::WINDOW_SIZE;

    fn offset(self) -> usize {
        match self {
            Register::Data => ns16550_offset::DATA,
            Register::InterruptEnable => ns16550_offset::INTERRUPT_ENABLE,
            Register::FifoControl => ns16550_offset::FIFO_CONTROL,
            Register::LineControl => ns16550_offset::LINE_CONTROL,
            Register::ModemControl => ns16550_offset::MODEM_CONTROL,
            Register::LineStatus => ns16550_offset::LINE_STATUS,
            Register::ModemStatus => ns16550_offset::MODEM_STATUS,
            Register::Scratch => ns16550_offset::SCRATCH,
        }
    }
}

/// Registers addressable only while DLAB is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchRegister {
    /// DLL
    Low,
    /// DLM
    High,
}

impl RegisterMap for LatchRegister {
    type Word = u8;
    const WINDOW_SIZE: usize = ns16550_offset::WINDOW_SIZE;

    fn offset(self) -> usize {
        match self {
            LatchRegister::Low => ns16550_offset::DIVISOR_LATCH_LOW,
            LatchRegister::High => ns16550_offset::DIVISOR_LATCH_HIGH,
        }
    }
}

/// Divisor-latch access mode
///
/// Exists only while LCR.DLAB is set. Dropping it writes the saved line
/// control value back with DLAB clear.
struct DivisorLatch<'a, H: UartHardware<u8>> {
    hw: &'a mut H,
    restore: u8,
}

impl<'a, H: UartHardware<u8>> DivisorLatch<'a, H> {
    fn open(hw: &'a mut H, line_control: u8) -> Self {
        let restore = line_control & !LCR_DIVISOR_LATCH_ACCESS;
        hw.write(Register::LineControl, restore | LCR_DIVISOR_LATCH_ACCESS);
        Self { hw, restore }
    }

    /// Program DLL then DLM
    fn write_divisor(&mut self, divisor: u16) {
        let [low, high] = divisor.to_le_bytes();
        self.hw.write(LatchRegister::Low, low);
        self.hw.write(LatchRegister::High, high);
    }

    fn read_divisor(&mut self) -> u16 {
        let low = self.hw.read(LatchRegister::Low);
        let high = self.hw.read(LatchRegister::High);
        u16::from_le_bytes([low, high])
    }
}

impl<H: UartHardware<u8>> Drop for DivisorLatch<'_, H> {
    fn drop(&mut self) {
        self.hw.write(Register::LineControl, self.restore);
    }
}

impl<H: UartHardware<u8>> fmt::Debug for DivisorLatch<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DivisorLatch")
            .field("restore", &self.restore)
            .finish_non_exhaustive()
    }
}

/// 16550 driver over a register backend `H`, waiting with strategy `S`
#[derive(Debug)]
pub struct Ns16550<H, S = Spin> {
    hw: H,
    wait: S,
    clock_hz: u32,
}

impl<H: UartHardware<u8>> Ns16550<H, Spin> {
    /// Wrap a register window whose baud generator is fed `clock_hz`.
    pub const fn new(hw: H, clock_hz: u32) -> Self {
        Self {
            hw,
            wait: Spin,
            clock_hz,
        }
    }
}

impl<H: UartHardware<u8>, S: WaitStrategy> Ns16550<H, S> {
    /// Replace the polling strategy
    pub fn with_wait<T: WaitStrategy>(self, wait: T) -> Ns16550<H, T> {
        Ns16550 {
            hw: self.hw,
            wait,
            clock_hz: self.clock_hz,
        }
    }

    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn into_hardware(self) -> H {
        self.hw
    }

    /// Bring the peripheral to a known operational state
    ///
    /// Write order: LCR=DLAB, DLL, DLM, LCR=0 (DLAB clear), IER off,
    /// LCR=format, FCR=enable+reset both FIFOs. DLAB is written before
    /// anything at offsets 0/1, so a latch left open by earlier code cannot
    /// swallow the IER write. Interrupts stay disabled. Re-running with the
    /// same config reproduces the same register state.
    ///
    /// # Errors
    ///
    /// Divisor errors are reported before any register is touched.
    pub fn init(&mut self, config: &UartConfig) -> Result<(), UartError> {
        let divisor = checked_oversampled_divisor(self.clock_hz, config.baud.hz(), OVERSAMPLING)?;

        DivisorLatch::open(&mut self.hw, 0).write_divisor(divisor);
        self.hw.write(Register::InterruptEnable, IER_ALL_DISABLED);
        self.hw.write(Register::LineControl, config.format.lcr_bits());
        self.hw.write(
            Register::FifoControl,
            (FifoControl::ENABLE | FifoControl::RECEIVE_RESET | FifoControl::TRANSMIT_RESET)
                .bits(),
        );
        Ok(())
    }

    /// Initialize at the compiled-in default (115200 8N1)
    pub fn init_default(&mut self) -> Result<(), UartError> {
        self.init(&UartConfig::default())
    }

    /// Enter divisor-latch mode, keeping the current line format
    ///
    /// Not public: a guard leaked with `mem::forget` would leave DLAB set
    /// and route the next data write into DLL.
    fn divisor_latch(&mut self) -> DivisorLatch<'_, H> {
        let line_control = self.hw.read(Register::LineControl);
        DivisorLatch::open(&mut self.hw, line_control)
    }

    /// Program a raw divisor without touching the line format
    pub fn set_divisor(&mut self, divisor: u16) {
        self.divisor_latch().write_divisor(divisor);
    }

    /// Change the line rate without touching the line format
    pub fn set_baud(&mut self, baud: u32) -> Result<(), UartError> {
        let divisor = checked_oversampled_divisor(self.clock_hz, baud, OVERSAMPLING)?;
        self.set_divisor(divisor);
        Ok(())
    }

    /// Read back the programmed divisor
    pub fn divisor(&mut self) -> u16 {
        self.divisor_latch().read_divisor()
    }

    /// Snapshot of the Line Status Register
    ///
    /// On real hardware reading LSR clears its error bits.
    pub fn line_status(&mut self) -> LineStatus {
        LineStatus::from_bits_retain(self.hw.read(Register::LineStatus))
    }

    /// Check that a 16550 answers at this window
    ///
    /// Each scratch pattern must read back unchanged, and LSR must not float
    /// to 0xFF. The scratch register is left at 0xFF afterwards.
    pub fn probe(&mut self) -> Result<(), UartError> {
        for pattern in SCRATCH_TEST_PATTERNS {
            self.hw.write(Register::Scratch, pattern);
            if self.hw.read(Register::Scratch) != pattern {
                return Err(UartError::NotPresent);
            }
        }

        if self.hw.read(Register::LineStatus) == 0xFF {
            return Err(UartError::NotPresent);
        }

        Ok(())
    }

    fn wait_for(&mut self, flag: LineStatus) -> Result<LineStatus, UartError> {
        let hw = &mut self.hw;
        let mut status = LineStatus::empty();
        self.wait.wait_until(|| {
            status = LineStatus::from_bits_retain(hw.read(Register::LineStatus));
            status.contains(flag)
        })?;
        Ok(status)
    }
}

/// Map LSR error bits to the most severe condition
fn classify(status: LineStatus) -> Result<(), LineError> {
    if status.contains(LineStatus::BREAK_INTERRUPT) {
        Err(LineError::Break)
    } else if status.contains(LineStatus::FRAMING_ERROR) {
        Err(LineError::Framing)
    } else if status.contains(LineStatus::PARITY_ERROR) {
        Err(LineError::Parity)
    } else if status.contains(LineStatus::OVERRUN_ERROR) {
        Err(LineError::Overrun)
    } else {
        Ok(())
    }
}

impl<H: UartHardware<u8>, S: WaitStrategy> Uart for Ns16550<H, S> {
    fn tx_ready(&mut self) -> bool {
        self.line_status().contains(LineStatus::THR_EMPTY)
    }

    fn rx_ready(&mut self) -> bool {
        self.line_status().contains(LineStatus::DATA_READY)
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), UartError> {
        self.wait_for(LineStatus::THR_EMPTY)?;
        self.hw.write(Register::Data, byte);
        Ok(())
    }

    /// Receive one byte
    ///
    /// The byte is always consumed from RBR; if the status snapshot that
    /// reported it flags break, framing, parity or overrun, the error is
    /// returned instead of the byte.
    fn get_byte(&mut self) -> Result<u8, UartError> {
        let status = self.wait_for(LineStatus::DATA_READY)?;
        let byte = self.hw.read(Register::Data);
        classify(status)?;
        Ok(byte)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        self.wait_for(LineStatus::TRANSMITTER_EMPTY).map(|_| ())
    }
}

impl<H: UartHardware<u8>, S: WaitStrategy> fmt::Write for Ns16550<H, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}
