// build.rs

//! Build script for rv_uart
//!
//! This script runs at build time to:
//! - Load the platform description (`board.json`, or `$RV_UART_BOARD`)
//! - Validate base addresses and baud divisors before any code is built
//! - Generate `$OUT_DIR/board.rs` with the platform constants

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// 16550 baud generators sample each bit 16 times.
const NS16550_OVERSAMPLING: u64 = 16;
/// Both peripherals implement a 16-bit divisor field.
const MAX_DIVISOR: u64 = 0xFFFF;

#[derive(Debug, Deserialize)]
struct BoardSpec {
    console: ConsoleVariant,
    baud_rate: u32,
    ns16550: PortSpec,
    sifive: PortSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ConsoleVariant {
    Ns16550,
    Sifive,
}

#[derive(Debug, Deserialize)]
struct PortSpec {
    #[serde(deserialize_with = "deserialize_address")]
    base_address: u64,
    clock_hz: u32,
}

fn deserialize_address<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AddressRaw {
        Integer(u64),
        Text(String),
    }

    match AddressRaw::deserialize(deserializer)? {
        AddressRaw::Integer(value) => Ok(value),
        AddressRaw::Text(text) => {
            let cleaned = text.trim().replace('_', "");
            let parsed = match cleaned
                .strip_prefix("0x")
                .or_else(|| cleaned.strip_prefix("0X"))
            {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => cleaned.parse::<u64>(),
            };
            parsed.map_err(|_| {
                de::Error::custom(format!(
                    "base_address must be an integer or hex string, received '{text}'"
                ))
            })
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RV_UART_BOARD");
    println!("cargo:rerun-if-env-changed=RV_UART_LOG_LEVEL");

    let board_path = board_path();
    println!("cargo:rerun-if-changed={}", board_path.display());

    let board = load_board(&board_path);
    validate_board(&board);
    write_board_constants(&board);
}

/// Resolve the board description, honouring the `RV_UART_BOARD` override.
fn board_path() -> PathBuf {
    if let Ok(path) = env::var("RV_UART_BOARD") {
        return PathBuf::from(path);
    }
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    Path::new(&manifest_dir).join("board.json")
}

fn load_board(path: &Path) -> BoardSpec {
    assert!(
        path.exists(),
        "Board description not found: {}",
        path.display()
    );

    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read board description: {e}"));

    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Board description is not valid JSON: {e}"))
}

/// Reject boards that would program an invalid divisor.
fn validate_board(board: &BoardSpec) {
    assert!(board.baud_rate > 0, "Board 'baud_rate' must be non-zero");

    validate_port("ns16550", &board.ns16550, board.baud_rate, NS16550_OVERSAMPLING, 1);
    validate_port("sifive", &board.sifive, board.baud_rate, 1, 4);
}

fn validate_port(name: &str, port: &PortSpec, baud_rate: u32, oversampling: u64, align: u64) {
    assert!(
        port.base_address != 0,
        "Board '{name}.base_address' must not be zero"
    );
    assert!(
        port.base_address % align == 0,
        "Board '{name}.base_address' {:#x} is not {align}-byte aligned",
        port.base_address
    );
    assert!(port.clock_hz > 0, "Board '{name}.clock_hz' must be non-zero");

    let divisor = u64::from(port.clock_hz) / (u64::from(baud_rate) * oversampling);
    assert!(
        divisor >= 1,
        "Board '{name}': clock {} Hz cannot produce {baud_rate} baud (divisor would be 0)",
        port.clock_hz
    );
    assert!(
        divisor <= MAX_DIVISOR,
        "Board '{name}': divisor {divisor} for {baud_rate} baud exceeds 16 bits"
    );
}

fn write_board_constants(board: &BoardSpec) {
    let console = match board.console {
        ConsoleVariant::Ns16550 => "ConsoleKind::Ns16550",
        ConsoleVariant::Sifive => "ConsoleKind::SiFive",
    };

    let mut out = String::new();
    let _ = writeln!(out, "// Generated by build.rs; do not edit.");
    let _ = writeln!(out, "pub const CONSOLE: ConsoleKind = {console};");
    let _ = writeln!(out, "pub const BAUD_RATE: u32 = {};", board.baud_rate);
    let _ = writeln!(
        out,
        "pub const NS16550: PortConfig = PortConfig {{ base_address: {:#x}, clock_hz: {} }};",
        board.ns16550.base_address, board.ns16550.clock_hz
    );
    let _ = writeln!(
        out,
        "pub const SIFIVE: PortConfig = PortConfig {{ base_address: {:#x}, clock_hz: {} }};",
        board.sifive.base_address, board.sifive.clock_hz
    );

    let out_dir = env::var("OUT_DIR").unwrap_or_else(|_| panic!("OUT_DIR is not set"));
    let dest = Path::new(&out_dir).join("board.rs");
    fs::write(&dest, out)
        .unwrap_or_else(|e| panic!("Failed to write {}: {e}", dest.display()));
}
