// src/serial/divisor.rs

//! Baud-rate divisor calculation
//!
//! `divisor = clock_hz / baud`, truncating. Rounding is never applied: a
//! 100 MHz clock at 115200 baud programs 868, not 869.

use super::constants::MAX_DIVISOR;
use super::error::UartError;

/// Commonly used line rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B115200,
    B57600,
    B38400,
    B19200,
    B9600,
    /// Any other rate in bits per second
    Custom(u32),
}

impl BaudRate {
    /// The named rates, fastest first
    pub const COMMON: [BaudRate; 5] = [
        BaudRate::B115200,
        BaudRate::B57600,
        BaudRate::B38400,
        BaudRate::B19200,
        BaudRate::B9600,
    ];

    /// Rate in bits per second
    pub const fn hz(self) -> u32 {
        match self {
            BaudRate::B115200 => 115_200,
            BaudRate::B57600 => 57_600,
            BaudRate::B38400 => 38_400,
            BaudRate::B19200 => 19_200,
            BaudRate::B9600 => 9_600,
            BaudRate::Custom(hz) => hz,
        }
    }
}

impl From<u32> for BaudRate {
    fn from(hz: u32) -> Self {
        match hz {
            115_200 => BaudRate::B115200,
            57_600 => BaudRate::B57600,
            38_400 => BaudRate::B38400,
            19_200 => BaudRate::B19200,
            9_600 => BaudRate::B9600,
            other => BaudRate::Custom(other),
        }
    }
}

/// Unchecked divisor for constant contexts
///
/// The caller guarantees `baud > 0` and `clock_hz >= baud`; a zero `baud`
/// fails const evaluation.
pub const fn divisor(clock_hz: u32, baud: u32) -> u32 {
    clock_hz / baud
}

/// Divisor for a peripheral whose baud generator runs at `oversampling`
/// ticks per bit (16 on a 16550, 1 on SiFive).
pub const fn oversampled_divisor(clock_hz: u32, baud: u32, oversampling: u32) -> u32 {
    (clock_hz as u64 / (baud as u64 * oversampling as u64)) as u32
}

/// Validated divisor, ready to be programmed
///
/// # Errors
///
/// - `UartError::InvalidBaudRate` if `baud` is zero
/// - `UartError::ZeroDivisor` if the clock is slower than the line rate
/// - `UartError::DivisorOverflow` if the result exceeds the 16-bit field
pub fn checked_divisor(clock_hz: u32, baud: u32) -> Result<u16, UartError> {
    checked_oversampled_divisor(clock_hz, baud, 1)
}

/// Validated variant of [`oversampled_divisor`]
pub fn checked_oversampled_divisor(
    clock_hz: u32,
    baud: u32,
    oversampling: u32,
) -> Result<u16, UartError> {
    if baud == 0 || oversampling == 0 {
        return Err(UartError::InvalidBaudRate);
    }

    let divisor = oversampled_divisor(clock_hz, baud, oversampling);
    if divisor == 0 {
        return Err(UartError::ZeroDivisor { clock_hz, baud });
    }
    if divisor > MAX_DIVISOR {
        return Err(UartError::DivisorOverflow { divisor });
    }

    Ok(divisor as u16)
}

/// Platform preset tables
///
/// These hold for the named reference clocks only; boards with other
/// clocks should compute divisors from the measured frequency instead.
pub mod presets {
    use super::{oversampled_divisor, BaudRate};

    /// SiFive reference platform core clock
    pub const SIFIVE_CLOCK_HZ: u32 = 100_000_000;
    /// Classic 16550 crystal
    pub const NS16550_CLOCK_HZ: u32 = 1_843_200;

    pub const SIFIVE_100MHZ: [(BaudRate, u32); 5] = table(SIFIVE_CLOCK_HZ, 1);
    pub const NS16550_1_8432MHZ: [(BaudRate, u32); 5] = table(NS16550_CLOCK_HZ, 16);

    const fn table(clock_hz: u32, oversampling: u32) -> [(BaudRate, u32); 5] {
        let mut out = [(BaudRate::B115200, 0); 5];
        let mut i = 0;
        while i < BaudRate::COMMON.len() {
            let rate = BaudRate::COMMON[i];
            out[i] = (rate, oversampled_divisor(clock_hz, rate.hz(), oversampling));
            i += 1;
        }
        out
    }

    /// Find the preset divisor for `rate`
    pub fn lookup(table: &[(BaudRate, u32)], rate: BaudRate) -> Option<u32> {
        table
            .iter()
            .find(|(candidate, _)| *candidate == rate)
            .map(|&(_, divisor)| divisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncating_division() {
        assert_eq!(divisor(100_000_000, 115_200), 868);
        assert_eq!(divisor(1_843_200, 115_200), 16);
        assert_eq!(divisor(115_200, 115_200), 1);
    }

    #[test]
    fn test_divisor_is_floor_and_positive() {
        let clocks = [115_200u32, 1_843_200, 3_686_400, 50_000_000, 100_000_000];
        for clock in clocks {
            for rate in BaudRate::COMMON {
                let baud = rate.hz();
                let d = divisor(clock, baud);
                assert!(d >= 1);
                assert!(d * baud <= clock);
                assert!((d + 1) as u64 * baud as u64 > clock as u64);
            }
        }
    }

    #[test]
    fn test_checked_divisor_rejects_zero_baud() {
        assert_eq!(checked_divisor(100_000_000, 0), Err(UartError::InvalidBaudRate));
    }

    #[test]
    fn test_checked_divisor_rejects_slow_clock() {
        assert_eq!(
            checked_divisor(9_600, 115_200),
            Err(UartError::ZeroDivisor {
                clock_hz: 9_600,
                baud: 115_200
            })
        );
        assert_eq!(
            checked_oversampled_divisor(1_000_000, 115_200, 16),
            Err(UartError::ZeroDivisor {
                clock_hz: 1_000_000,
                baud: 115_200
            })
        );
    }

    #[test]
    fn test_checked_divisor_rejects_overflow() {
        assert_eq!(
            checked_divisor(100_000_000, 300),
            Err(UartError::DivisorOverflow { divisor: 333_333 })
        );
    }

    #[test]
    fn test_oversampled_divisor_matches_legacy_table() {
        assert_eq!(checked_oversampled_divisor(1_843_200, 115_200, 16), Ok(1));
        assert_eq!(checked_oversampled_divisor(1_843_200, 9_600, 16), Ok(12));
    }

    #[test]
    fn test_sifive_presets() {
        let expected = [868, 1736, 2604, 5208, 10416];
        for (i, (_, d)) in presets::SIFIVE_100MHZ.iter().enumerate() {
            assert_eq!(*d, expected[i]);
        }
    }

    #[test]
    fn test_ns16550_presets() {
        let divisors: [u32; 5] = presets::NS16550_1_8432MHZ.map(|(_, d)| d);
        assert_eq!(divisors, [1, 2, 3, 6, 12]);
        assert_eq!(
            presets::lookup(&presets::NS16550_1_8432MHZ, BaudRate::B38400),
            Some(3)
        );
        assert_eq!(
            presets::lookup(&presets::NS16550_1_8432MHZ, BaudRate::Custom(300)),
            None
        );
    }

    #[test]
    fn test_baud_rate_from_hz() {
        assert_eq!(BaudRate::from(57_600), BaudRate::B57600);
        assert_eq!(BaudRate::from(250_000), BaudRate::Custom(250_000));
        assert_eq!(BaudRate::from(250_000).hz(), 250_000);
    }
}
