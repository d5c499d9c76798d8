// src/serial/config.rs

//! Line configuration shared by both drivers

use super::constants::{
    LCR_EVEN_PARITY, LCR_PARITY_ENABLE, LCR_STICKY_PARITY, LCR_TWO_STOP_BITS,
};
use super::divisor::BaudRate;

/// Data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordLength {
    Five,
    Six,
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    /// Two stop bits (1.5 with five-bit words on a 16550)
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
    /// Parity bit always 1
    Mark,
    /// Parity bit always 0
    Space,
}

/// Character framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    pub word_length: WordLength,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl LineFormat {
    /// 8 data bits, no parity, 1 stop bit
    pub const EIGHT_N_ONE: Self = Self {
        word_length: WordLength::Eight,
        stop_bits: StopBits::One,
        parity: Parity::None,
    };

    /// Line Control Register encoding, DLAB clear
    pub const fn lcr_bits(&self) -> u8 {
        let word = match self.word_length {
            WordLength::Five => 0x00,
            WordLength::Six => 0x01,
            WordLength::Seven => 0x02,
            WordLength::Eight => 0x03,
        };
        let stop = match self.stop_bits {
            StopBits::One => 0,
            StopBits::Two => LCR_TWO_STOP_BITS,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Odd => LCR_PARITY_ENABLE,
            Parity::Even => LCR_PARITY_ENABLE | LCR_EVEN_PARITY,
            Parity::Mark => LCR_PARITY_ENABLE | LCR_STICKY_PARITY,
            Parity::Space => LCR_PARITY_ENABLE | LCR_EVEN_PARITY | LCR_STICKY_PARITY,
        };
        word | stop | parity
    }
}

impl Default for LineFormat {
    fn default() -> Self {
        Self::EIGHT_N_ONE
    }
}

/// Parameters for an initialization sequence
///
/// The clock frequency belongs to the platform and is held by the driver;
/// this only carries what the caller chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub baud: BaudRate,
    pub format: LineFormat,
}

impl UartConfig {
    /// Compiled-in default line rate
    pub const DEFAULT_BAUD: BaudRate = BaudRate::B115200;

    pub const fn new(baud: BaudRate) -> Self {
        Self {
            baud,
            format: LineFormat::EIGHT_N_ONE,
        }
    }

    pub const fn with_format(self, format: LineFormat) -> Self {
        Self {
            baud: self.baud,
            format,
        }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BAUD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_n_one_encoding() {
        assert_eq!(LineFormat::EIGHT_N_ONE.lcr_bits(), 0x03);
        assert_eq!(LineFormat::default(), LineFormat::EIGHT_N_ONE);
    }

    #[test]
    fn test_format_encodings() {
        let seven_e_two = LineFormat {
            word_length: WordLength::Seven,
            stop_bits: StopBits::Two,
            parity: Parity::Even,
        };
        assert_eq!(seven_e_two.lcr_bits(), 0x02 | 0x04 | 0x18);

        let five_space = LineFormat {
            word_length: WordLength::Five,
            stop_bits: StopBits::One,
            parity: Parity::Space,
        };
        assert_eq!(five_space.lcr_bits(), 0x38);
    }

    #[test]
    fn test_encoding_never_sets_dlab() {
        let lengths = [WordLength::Five, WordLength::Six, WordLength::Seven, WordLength::Eight];
        let parities = [Parity::None, Parity::Odd, Parity::Even, Parity::Mark, Parity::Space];
        for word_length in lengths {
            for parity in parities {
                for stop_bits in [StopBits::One, StopBits::Two] {
                    let format = LineFormat { word_length, stop_bits, parity };
                    assert_eq!(format.lcr_bits() & 0x80, 0);
                }
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = UartConfig::default();
        assert_eq!(config.baud, BaudRate::B115200);
        assert_eq!(config.format, LineFormat::EIGHT_N_ONE);
    }
}
