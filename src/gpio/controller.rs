//! GPIO pin controller
//!
//! Turns pin-level requests into masked register writes against any
//! `RegisterView`: the live mapping on hardware, `MemoryRegisters` in tests.

use log::debug;
use std::thread;
use std::time::Duration;

use super::types::{Level, Pin, PinMode, PullMode, FSEL_FIELD_MASK};
use crate::regs::{gpio_reg, RegisterView};

/// Default hold time between pull-protocol steps
pub const DEFAULT_PULL_DELAY: Duration = Duration::from_micros(10);

/// Pin-level operations over a GPIO register window.
///
/// Not synchronized: callers sharing one controller across threads must
/// serialize access themselves.
#[derive(Debug)]
pub struct PinController<R> {
    regs: R,
    pull_delay: Duration,
}

impl<R: RegisterView> PinController<R> {
    /// Wrap a register view
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            pull_delay: DEFAULT_PULL_DELAY,
        }
    }

    /// Set the hold time used between pull-protocol steps
    pub fn with_pull_delay(mut self, delay: Duration) -> Self {
        self.pull_delay = delay;
        self
    }

    /// Hold time used between pull-protocol steps
    pub fn pull_delay(&self) -> Duration {
        self.pull_delay
    }

    /// The underlying register view
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Give back the underlying register view
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Select the function of `pin`, leaving every other pin's field untouched
    pub fn set_mode(&mut self, pin: Pin, mode: PinMode) {
        let shift = pin.fsel_shift();
        debug!("GPIO{} -> {}", pin, mode);
        self.regs.modify(pin.fsel_offset(), |value| {
            (value & !(FSEL_FIELD_MASK << shift)) | (mode.bits() << shift)
        });
    }

    /// Read back the function currently selected for `pin`
    pub fn mode(&self, pin: Pin) -> PinMode {
        let value = self.regs.read(pin.fsel_offset());
        PinMode::from_bits(value >> pin.fsel_shift())
    }

    /// Drive `pin` to `level` through the bank's SET or CLR register
    pub fn write_level(&mut self, pin: Pin, level: Level) {
        let bank = pin.bank().index();
        let offset = match level {
            Level::High => gpio_reg::GPSET[bank],
            Level::Low => gpio_reg::GPCLR[bank],
        };
        debug!("GPIO{} <- {}", pin, level);
        // write-1 semantics: zero bits are ignored by the hardware
        self.regs.write(offset, pin.bank_mask());
    }

    /// Drive `pin` high
    pub fn set_high(&mut self, pin: Pin) {
        self.write_level(pin, Level::High);
    }

    /// Drive `pin` low
    pub fn set_low(&mut self, pin: Pin) {
        self.write_level(pin, Level::Low);
    }

    /// Sample the current level of `pin`
    pub fn read_level(&self, pin: Pin) -> Level {
        let value = self.regs.read(gpio_reg::GPLEV[pin.bank().index()]);
        Level::from(value & pin.bank_mask() != 0)
    }

    /// Configure the pull resistor of `pin`.
    ///
    /// Blocks for two pull delays. The steps cannot be reordered: the code
    /// must be latched before the clock pulse and released after it.
    ///
    /// Uses GPPUD/GPPUDCLK, which exist on BCM2835..BCM2837 only. On a
    /// BCM2711 those offsets are reserved and the write has no effect.
    pub fn set_pull(&mut self, pin: Pin, pull: PullMode) {
        debug!("GPIO{} pull {}", pin, pull);
        let mut clocks = [0; 2];
        clocks[pin.bank().index()] = pin.bank_mask();
        self.pull_sequence(pull, clocks);
    }

    /// Turn off the pull resistors of every pin
    pub fn reset_pulls(&mut self) {
        debug!("Clearing pull configuration of all pins");
        self.pull_sequence(PullMode::Off, [u32::MAX, u32::MAX]);
    }

    /// Return every pin to INPUT and clear both output banks.
    ///
    /// Pull configuration is left alone; see `reset_pulls`.
    pub fn reset(&mut self) {
        debug!("Resetting GPIO function select and outputs");
        for offset in gpio_reg::GPFSEL {
            self.regs.write(offset, 0);
        }
        for offset in gpio_reg::GPCLR {
            self.regs.write(offset, u32::MAX);
        }
    }

    fn pull_sequence(&mut self, pull: PullMode, clocks: [u32; 2]) {
        self.regs.write(gpio_reg::GPPUD, pull.bits());
        thread::sleep(self.pull_delay);

        for (bank, &mask) in clocks.iter().enumerate() {
            if mask != 0 {
                self.regs.write(gpio_reg::GPPUDCLK[bank], mask);
            }
        }
        thread::sleep(self.pull_delay);

        self.regs.write(gpio_reg::GPPUD, 0);
        for (bank, &mask) in clocks.iter().enumerate() {
            if mask != 0 {
                self.regs.write(gpio_reg::GPPUDCLK[bank], 0);
            }
        }
    }
}
