// src/board.rs

//! Platform description generated from `board.json`
//!
//! `build.rs` validates the board file (or the file named by
//! `RV_UART_BOARD`) and emits the constants included below.

/// Which UART variant drives the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleKind {
    Ns16550,
    SiFive,
}

/// Register window and input clock of one UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub base_address: usize,
    pub clock_hz: u32,
}

include!(concat!(env!("OUT_DIR"), "/board.rs"));

/// The port selected by [`CONSOLE`]
pub const fn console_port() -> PortConfig {
    match CONSOLE {
        ConsoleKind::Ns16550 => NS16550,
        ConsoleKind::SiFive => SIFIVE,
    }
}
