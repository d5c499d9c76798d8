// src/logging.rs

//! `log` backend that prints records on the console UART

use log::{set_logger, set_max_level, LevelFilter, Metadata, Record, SetLoggerError};

/// Writes `[LEVEL] message` lines through `uart_println!`
struct UartLogger;

impl log::Log for UartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn flush(&self) {}

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::uart_println!("[{}] {}", record.level(), record.args());
        }
    }
}

static LOGGER: UartLogger = UartLogger;

/// Install the UART logger
///
/// The level filter is fixed at compile time by `RV_UART_LOG_LEVEL`
/// (`Off`, `Error`, `Warn`, `Info`, `Debug`, `Trace`), default `Info`.
/// Records emitted before [`crate::serial::init`] are dropped.
///
/// # Errors
///
/// Fails if another logger is already installed.
pub fn init() -> Result<(), SetLoggerError> {
    set_logger(&LOGGER)?;
    set_max_level(parse_level(option_env!("RV_UART_LOG_LEVEL")));
    Ok(())
}

/// Map a level name to a filter, case-insensitively
pub fn parse_level(name: Option<&str>) -> LevelFilter {
    let Some(name) = name else {
        return LevelFilter::Info;
    };
    [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ]
    .into_iter()
    .find(|level| level.as_str().eq_ignore_ascii_case(name))
    .unwrap_or(LevelFilter::Info)
}
