//! Pin, mode, level and pull types
//!
//! The register arithmetic for a pin lives on `Pin`: which function-select
//! word and field it owns, and which bank and bit it occupies in the
//! SET/CLR/LEV/PUDCLK register pairs.

use std::fmt;
use std::str::FromStr;

use crate::error::{GpioError, Result};
use crate::regs::gpio_reg;

/// Number of GPIO lines on the BCM283x/BCM2711 GPIO block
pub const PIN_COUNT: u8 = 54;

/// Pins per function-select register
const PINS_PER_FSEL: u8 = 10;

/// Width of one function-select field
const FSEL_FIELD_BITS: u32 = 3;

/// Mask of one function-select field
pub(crate) const FSEL_FIELD_MASK: u32 = 0b111;

/// Pins per 32-bit bank
const PINS_PER_BANK: u8 = 32;

// ============================================================================
// PIN NUMBER
// ============================================================================

/// A validated BCM GPIO number (0-53)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pin(u8);

/// One of the two 32-bit register banks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// Pins 0-31
    Bank0,
    /// Pins 32-53
    Bank1,
}

impl Bank {
    /// Index into the banked register arrays in `gpio_reg`
    pub fn index(self) -> usize {
        match self {
            Bank::Bank0 => 0,
            Bank::Bank1 => 1,
        }
    }
}

impl Pin {
    /// Validate a pin number
    pub fn new(number: u32) -> Result<Self> {
        if number < u32::from(PIN_COUNT) {
            Ok(Pin(number as u8))
        } else {
            Err(GpioError::invalid("pin number", number.to_string()))
        }
    }

    /// Iterate over every pin of the GPIO block
    pub fn all() -> impl Iterator<Item = Pin> {
        (0..PIN_COUNT).map(Pin)
    }

    /// The BCM GPIO number
    pub fn number(self) -> u8 {
        self.0
    }

    /// Byte offset of the function-select register holding this pin
    pub fn fsel_offset(self) -> usize {
        gpio_reg::GPFSEL0 + usize::from(self.0 / PINS_PER_FSEL) * 4
    }

    /// Bit position of this pin's 3-bit field inside its function-select register
    pub fn fsel_shift(self) -> u32 {
        u32::from(self.0 % PINS_PER_FSEL) * FSEL_FIELD_BITS
    }

    /// Register bank this pin belongs to
    pub fn bank(self) -> Bank {
        if self.0 < PINS_PER_BANK {
            Bank::Bank0
        } else {
            Bank::Bank1
        }
    }

    /// Bit position of this pin within its bank
    pub fn bank_bit(self) -> u32 {
        u32::from(self.0 % PINS_PER_BANK)
    }

    /// Single-bit mask for this pin within its bank
    pub fn bank_mask(self) -> u32 {
        1 << self.bank_bit()
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Pin {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self> {
        let number: u32 = s
            .trim()
            .parse()
            .map_err(|_| GpioError::invalid("pin number", s))?;
        Pin::new(number).map_err(|_| GpioError::invalid("pin number", s))
    }
}

// ============================================================================
// PIN MODE
// ============================================================================

/// Pin function, encoded as the hardware's 3-bit function-select code.
///
/// The alternate-function codes are not sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PinMode {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

impl PinMode {
    /// Every mode, in the order they are usually listed
    pub const ALL: [PinMode; 8] = [
        PinMode::Input,
        PinMode::Output,
        PinMode::Alt0,
        PinMode::Alt1,
        PinMode::Alt2,
        PinMode::Alt3,
        PinMode::Alt4,
        PinMode::Alt5,
    ];

    /// 3-bit function-select code
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Decode a function-select field; only the low 3 bits are looked at
    pub fn from_bits(bits: u32) -> Self {
        match bits & FSEL_FIELD_MASK {
            0b000 => PinMode::Input,
            0b001 => PinMode::Output,
            0b100 => PinMode::Alt0,
            0b101 => PinMode::Alt1,
            0b110 => PinMode::Alt2,
            0b111 => PinMode::Alt3,
            0b011 => PinMode::Alt4,
            _ => PinMode::Alt5,
        }
    }

    /// Upper-case display name
    pub fn name(self) -> &'static str {
        match self {
            PinMode::Input => "INPUT",
            PinMode::Output => "OUTPUT",
            PinMode::Alt0 => "ALT0",
            PinMode::Alt1 => "ALT1",
            PinMode::Alt2 => "ALT2",
            PinMode::Alt3 => "ALT3",
            PinMode::Alt4 => "ALT4",
            PinMode::Alt5 => "ALT5",
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PinMode {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self> {
        let mode = match s.trim().to_lowercase().as_str() {
            "i" | "in" | "input" => PinMode::Input,
            "o" | "out" | "output" => PinMode::Output,
            "0" | "alt0" => PinMode::Alt0,
            "1" | "alt1" => PinMode::Alt1,
            "2" | "alt2" => PinMode::Alt2,
            "3" | "alt3" => PinMode::Alt3,
            "4" | "alt4" => PinMode::Alt4,
            "5" | "alt5" => PinMode::Alt5,
            _ => return Err(GpioError::invalid("pin mode", s)),
        };
        Ok(mode)
    }
}

// ============================================================================
// LEVEL AND PULL
// ============================================================================

/// Logical level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("0"),
            Level::High => f.write_str("1"),
        }
    }
}

/// Internal pull resistor state, encoded as the 2-bit GPPUD code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PullMode {
    Off = 0b00,
    PullDown = 0b01,
    PullUp = 0b10,
}

impl PullMode {
    /// 2-bit pull-control code
    pub fn bits(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for PullMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullMode::Off => f.write_str("OFF"),
            PullMode::PullDown => f.write_str("PULL_DOWN"),
            PullMode::PullUp => f.write_str("PULL_UP"),
        }
    }
}

impl FromStr for PullMode {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self> {
        let pull = match s.trim().to_lowercase().as_str() {
            "off" | "none" => PullMode::Off,
            "down" | "pd" | "pull-down" | "pulldown" => PullMode::PullDown,
            "up" | "pu" | "pull-up" | "pullup" => PullMode::PullUp,
            _ => return Err(GpioError::invalid("pull mode", s)),
        };
        Ok(pull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(n: u32) -> Pin {
        Pin::new(n).unwrap()
    }

    #[test]
    fn test_pin_range() {
        assert!(Pin::new(0).is_ok());
        assert!(Pin::new(53).is_ok());
        assert!(matches!(
            Pin::new(54),
            Err(GpioError::InvalidInput { kind: "pin number", .. })
        ));
        assert_eq!(Pin::all().count(), 54);
    }

    #[test]
    fn test_fsel_location() {
        assert_eq!(pin(0).fsel_offset(), gpio_reg::GPFSEL0);
        assert_eq!(pin(0).fsel_shift(), 0);
        assert_eq!(pin(9).fsel_offset(), gpio_reg::GPFSEL0);
        assert_eq!(pin(9).fsel_shift(), 27);
        assert_eq!(pin(10).fsel_offset(), gpio_reg::GPFSEL1);
        assert_eq!(pin(10).fsel_shift(), 0);
        assert_eq!(pin(27).fsel_offset(), gpio_reg::GPFSEL2);
        assert_eq!(pin(27).fsel_shift(), 21);
        assert_eq!(pin(53).fsel_offset(), gpio_reg::GPFSEL5);
        assert_eq!(pin(53).fsel_shift(), 9);
    }

    #[test]
    fn test_bank_boundary() {
        assert_eq!(pin(31).bank(), Bank::Bank0);
        assert_eq!(pin(31).bank_bit(), 31);
        assert_eq!(pin(32).bank(), Bank::Bank1);
        assert_eq!(pin(32).bank_bit(), 0);
        assert_eq!(pin(53).bank_mask(), 1 << 21);
    }

    #[test]
    fn test_pin_from_str() {
        assert_eq!(" 17 ".parse::<Pin>().unwrap(), pin(17));
        assert!("abc".parse::<Pin>().is_err());
        assert!("-1".parse::<Pin>().is_err());
        let err = "60".parse::<Pin>().unwrap_err();
        assert_eq!(err.to_string(), "invalid pin number: '60'");
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(PinMode::Input.bits(), 0b000);
        assert_eq!(PinMode::Output.bits(), 0b001);
        assert_eq!(PinMode::Alt0.bits(), 0b100);
        assert_eq!(PinMode::Alt1.bits(), 0b101);
        assert_eq!(PinMode::Alt2.bits(), 0b110);
        assert_eq!(PinMode::Alt3.bits(), 0b111);
        assert_eq!(PinMode::Alt4.bits(), 0b011);
        assert_eq!(PinMode::Alt5.bits(), 0b010);
    }

    #[test]
    fn test_mode_from_bits_covers_every_code() {
        for mode in PinMode::ALL {
            assert_eq!(PinMode::from_bits(mode.bits()), mode);
        }
        let mut codes: Vec<u32> = PinMode::ALL.iter().map(|m| m.bits()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 8);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("INPUT".parse::<PinMode>().unwrap(), PinMode::Input);
        assert_eq!(" out\n".parse::<PinMode>().unwrap(), PinMode::Output);
        assert_eq!("i".parse::<PinMode>().unwrap(), PinMode::Input);
        assert_eq!("Alt4".parse::<PinMode>().unwrap(), PinMode::Alt4);
        assert_eq!("5".parse::<PinMode>().unwrap(), PinMode::Alt5);
        assert!("alt6".parse::<PinMode>().is_err());
        assert!("".parse::<PinMode>().is_err());
    }

    #[test]
    fn test_pull_from_str() {
        assert_eq!("UP".parse::<PullMode>().unwrap(), PullMode::PullUp);
        assert_eq!("pd".parse::<PullMode>().unwrap(), PullMode::PullDown);
        assert_eq!("none".parse::<PullMode>().unwrap(), PullMode::Off);
        assert!("sideways".parse::<PullMode>().is_err());
        assert_eq!(PullMode::PullUp.bits(), 0b10);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::High.to_string(), "1");
        assert_eq!(Level::Low.to_string(), "0");
    }
}
