// src/serial/constants.rs

//! Register offsets and bit definitions for both UART variants

use bitflags::bitflags;

/// 16550 register offsets from the window base (byte-wide registers)
///
/// Offsets 0 and 1 alias: with LCR.DLAB clear they address RBR/THR and IER,
/// with DLAB set they address the divisor latches DLL and DLM.
pub mod ns16550_offset {
    pub const DATA: usize = 0;
    pub const INTERRUPT_ENABLE: usize = 1;
    pub const FIFO_CONTROL: usize = 2;
    pub const LINE_CONTROL: usize = 3;
    pub const MODEM_CONTROL: usize = 4;
    pub const LINE_STATUS: usize = 5;
    pub const MODEM_STATUS: usize = 6;
    pub const SCRATCH: usize = 7;

    pub const DIVISOR_LATCH_LOW: usize = 0;
    pub const DIVISOR_LATCH_HIGH: usize = 1;

    pub const WINDOW_SIZE: usize = 8;
}

/// SiFive register offsets from the window base (32-bit registers)
pub mod sifive_offset {
    pub const TX_DATA: usize = 0x00;
    pub const RX_DATA: usize = 0x04;
    pub const TX_CONTROL: usize = 0x08;
    pub const RX_CONTROL: usize = 0x0C;
    pub const INTERRUPT_ENABLE: usize = 0x10;
    pub const INTERRUPT_PENDING: usize = 0x14;
    pub const DIVISOR: usize = 0x18;

    pub const WINDOW_SIZE: usize = 0x1C;
}

bitflags! {
    /// 16550 Line Status Register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineStatus: u8 {
        /// Data Ready
        const DATA_READY = 0x01;
        const OVERRUN_ERROR = 0x02;
        const PARITY_ERROR = 0x04;
        const FRAMING_ERROR = 0x08;
        const BREAK_INTERRUPT = 0x10;
        /// Transmit Holding Register Empty
        const THR_EMPTY = 0x20;
        /// Transmitter Empty (holding and shift registers both idle)
        const TRANSMITTER_EMPTY = 0x40;
        const FIFO_ERROR = 0x80;
    }
}

bitflags! {
    /// 16550 FIFO Control Register (write-only)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FifoControl: u8 {
        const ENABLE = 0x01;
        const RECEIVE_RESET = 0x02;
        const TRANSMIT_RESET = 0x04;
    }
}

/// 16550 Line Control Register bits
pub const LCR_WORD_LENGTH_MASK: u8 = 0x03;
pub const LCR_TWO_STOP_BITS: u8 = 0x04;
pub const LCR_PARITY_ENABLE: u8 = 0x08;
pub const LCR_EVEN_PARITY: u8 = 0x10;
pub const LCR_STICKY_PARITY: u8 = 0x20;
pub const LCR_DIVISOR_LATCH_ACCESS: u8 = 0x80;

/// Interrupt Enable Register value with every source masked
pub const IER_ALL_DISABLED: u8 = 0x00;

/// Scratch register patterns used by the presence probe
pub const SCRATCH_TEST_PATTERNS: [u8; 4] = [0x00, 0x55, 0xAA, 0xFF];

/// SiFive `txdata` / `rxdata` flag bits
pub const SIFIVE_TXDATA_FULL: u32 = 1 << 31;
pub const SIFIVE_RXDATA_EMPTY: u32 = 1 << 31;
pub const SIFIVE_DATA_MASK: u32 = 0xFF;

/// SiFive `txctrl` / `rxctrl` bits
pub const SIFIVE_TXEN: u32 = 0x1;
pub const SIFIVE_NSTOP: u32 = 0x2;
pub const SIFIVE_RXEN: u32 = 0x1;

/// SiFive `ie` / `ip` watermark bits
pub const SIFIVE_IP_TXWM: u32 = 0x1;
pub const SIFIVE_IP_RXWM: u32 = 0x2;
pub const SIFIVE_IE_ALL_DISABLED: u32 = 0x0;

/// Width of the divisor field on both peripherals
pub const MAX_DIVISOR: u32 = 0xFFFF;
