// src/lib.rs
//! rv_uart - UART drivers for bare-metal RISC-V
//!
//! SiFive and 16550-compatible peripherals behind one blocking byte-stream
//! interface, plus a board console with print macros and a `log` backend.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(missing_debug_implementations)]

pub mod board;
pub mod logging;
pub mod serial;

pub use serial::{Uart, UartConfig, UartError};
