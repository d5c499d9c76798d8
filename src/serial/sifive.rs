// src/serial/sifive.rs

//! SiFive UART driver (FU540/FU740 and QEMU `sifive_u`)
//!
//! Every register is 32 bits wide. Status lives in the data registers
//! themselves: bit 31 of `txdata` reads 1 while the transmit FIFO is full,
//! bit 31 of `rxdata` reads 1 while the receive FIFO is empty. Reading
//! `rxdata` pops the FIFO, so it is read exactly once per received byte.

use super::backend::{RegisterMap, UartHardware};
use super::config::{LineFormat, Parity, StopBits, UartConfig, WordLength};
use super::constants::{
    sifive_offset, SIFIVE_DATA_MASK, SIFIVE_IE_ALL_DISABLED, SIFIVE_IP_RXWM, SIFIVE_NSTOP,
    SIFIVE_RXDATA_EMPTY, SIFIVE_RXEN, SIFIVE_TXDATA_FULL, SIFIVE_TXEN,
};
use super::divisor::checked_divisor;
use super::error::UartError;
use super::timeout::{Spin, WaitStrategy};
use super::Uart;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    TxData,
    RxData,
    TxControl,
    RxControl,
    InterruptEnable,
    InterruptPending,
    Divisor,
}

impl RegisterMap for Register {
    type Word = u32;
    const WINDOW_SIZE: usize = sifive_offset::WINDOW_SIZE;

    fn offset(self) -> usize {
        match self {
            Register::TxData => sifive_offset::TX_DATA,
            Register::RxData => sifive_offset::RX_DATA,
            Register::TxControl => sifive_offset::TX_CONTROL,
            Register::RxControl => sifive_offset::RX_CONTROL,
            Register::InterruptEnable => sifive_offset::INTERRUPT_ENABLE,
            Register::InterruptPending => sifive_offset::INTERRUPT_PENDING,
            Register::Divisor => sifive_offset::DIVISOR,
        }
    }
}

/// SiFive driver over a register backend `H`, waiting with strategy `S`
#[derive(Debug)]
pub struct SiFive<H, S = Spin> {
    hw: H,
    wait: S,
    clock_hz: u32,
}

impl<H: UartHardware<u32>> SiFive<H, Spin> {
    /// Wrap a register window clocked from the `tlclk` at `clock_hz`.
    pub const fn new(hw: H, clock_hz: u32) -> Self {
        Self {
            hw,
            wait: Spin,
            clock_hz,
        }
    }
}

impl<H: UartHardware<u32>, S: WaitStrategy> SiFive<H, S> {
    pub fn with_wait<T: WaitStrategy>(self, wait: T) -> SiFive<H, T> {
        SiFive {
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

    /// Program divisor, enable both directions, mask interrupts
    ///
    /// The peripheral always frames 8 data bits without parity; only the
    /// stop-bit count is configurable.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for any other word length or parity, and the
    /// divisor errors. Nothing is written on error.
    pub fn init(&mut self, config: &UartConfig) -> Result<(), UartError> {
        let tx_control = Self::tx_control(&config.format)?;
        let divisor = checked_divisor(self.clock_hz, config.baud.hz())?;

        self.hw.write(Register::Divisor, u32::from(divisor));
        self.hw.write(Register::TxControl, tx_control);
        self.hw.write(Register::RxControl, SIFIVE_RXEN);
        self.hw.write(Register::InterruptEnable, SIFIVE_IE_ALL_DISABLED);
        Ok(())
    }

    pub fn init_default(&mut self) -> Result<(), UartError> {
        self.init(&UartConfig::default())
    }

    fn tx_control(format: &LineFormat) -> Result<u32, UartError> {
        if format.word_length != WordLength::Eight || format.parity != Parity::None {
            return Err(UartError::UnsupportedFormat);
        }
        Ok(match format.stop_bits {
            StopBits::One => SIFIVE_TXEN,
            StopBits::Two => SIFIVE_TXEN | SIFIVE_NSTOP,
        })
    }

    pub fn set_divisor(&mut self, divisor: u16) {
        self.hw.write(Register::Divisor, u32::from(divisor));
    }

    pub fn set_baud(&mut self, baud: u32) -> Result<(), UartError> {
        let divisor = checked_divisor(self.clock_hz, baud)?;
        self.set_divisor(divisor);
        Ok(())
    }

    /// Read back the programmed divisor
    pub fn divisor(&mut self) -> u16 {
        (self.hw.read(Register::Divisor) & 0xFFFF) as u16
    }

    /// Raw `ip` register
    pub fn interrupt_pending(&mut self) -> u32 {
        self.hw.read(Register::InterruptPending)
    }
}

impl<H: UartHardware<u32>, S: WaitStrategy> Uart for SiFive<H, S> {
    fn tx_ready(&mut self) -> bool {
        self.hw.read(Register::TxData) & SIFIVE_TXDATA_FULL == 0
    }

    /// Receive watermark pending
    ///
    /// Uses `ip.rxwm` so that asking does not consume a byte. With the
    /// watermark left at 0 this is set whenever the FIFO holds data.
    fn rx_ready(&mut self) -> bool {
        self.hw.read(Register::InterruptPending) & SIFIVE_IP_RXWM != 0
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), UartError> {
        let hw = &mut self.hw;
        self.wait
            .wait_until(|| hw.read(Register::TxData) & SIFIVE_TXDATA_FULL == 0)?;
        self.hw.write(Register::TxData, u32::from(byte));
        Ok(())
    }

    fn get_byte(&mut self) -> Result<u8, UartError> {
        let hw = &mut self.hw;
        let mut word = 0;
        self.wait.wait_until(|| {
            word = hw.read(Register::RxData);
            word & SIFIVE_RXDATA_EMPTY == 0
        })?;
        Ok((word & SIFIVE_DATA_MASK) as u8)
    }

    /// Wait until the transmit FIFO accepts data again
    ///
    /// The peripheral exposes no shifter-idle flag, so the last bytes may
    /// still be on the wire when this returns.
    fn flush(&mut self) -> Result<(), UartError> {
        let hw = &mut self.hw;
        self.wait
            .wait_until(|| hw.read(Register::TxData) & SIFIVE_TXDATA_FULL == 0)
    }
}

impl<H: UartHardware<u32>, S: WaitStrategy> fmt::Write for SiFive<H, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}
