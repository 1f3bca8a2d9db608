//! GPIO register access
//!
//! This module provides:
//! - The BCM283x/BCM2711 GPIO register offset table
//! - `RegisterView`, the 32-bit read/write contract all pin logic goes through
//! - An in-memory register store for tests and dry runs

pub mod memory;

pub use memory::{MemoryRegisters, RegisterWrite};

use crate::error::{GpioError, Result};

// ============================================================================
// REGISTER MAP
// ============================================================================

/// Size of the mapped register window (one page)
pub const PAGE_SIZE: usize = 4 * 1024;

/// Number of 32-bit words in the mapped window
pub const PAGE_WORDS: usize = PAGE_SIZE / 4;

/// GPIO register offsets, in bytes from the GPIO block base
pub mod gpio_reg {
    pub const GPFSEL0: usize = 0x00; // Function Select 0 (pins 0-9)
    pub const GPFSEL1: usize = 0x04; // Function Select 1 (pins 10-19)
    pub const GPFSEL2: usize = 0x08; // Function Select 2 (pins 20-29)
    pub const GPFSEL3: usize = 0x0C; // Function Select 3 (pins 30-39)
    pub const GPFSEL4: usize = 0x10; // Function Select 4 (pins 40-49)
    pub const GPFSEL5: usize = 0x14; // Function Select 5 (pins 50-53)
    pub const GPSET0: usize = 0x1C; // Pin Output Set 0
    pub const GPSET1: usize = 0x20; // Pin Output Set 1
    pub const GPCLR0: usize = 0x28; // Pin Output Clear 0
    pub const GPCLR1: usize = 0x2C; // Pin Output Clear 1
    pub const GPLEV0: usize = 0x34; // Pin Level 0
    pub const GPLEV1: usize = 0x38; // Pin Level 1
    pub const GPPUD: usize = 0x94; // Pull-up/down Enable
    pub const GPPUDCLK0: usize = 0x98; // Pull-up/down Enable Clock 0
    pub const GPPUDCLK1: usize = 0x9C; // Pull-up/down Enable Clock 1

    /// All function-select registers, in pin order
    pub const GPFSEL: [usize; 6] = [GPFSEL0, GPFSEL1, GPFSEL2, GPFSEL3, GPFSEL4, GPFSEL5];
    /// Output set registers, indexed by bank
    pub const GPSET: [usize; 2] = [GPSET0, GPSET1];
    /// Output clear registers, indexed by bank
    pub const GPCLR: [usize; 2] = [GPCLR0, GPCLR1];
    /// Level registers, indexed by bank
    pub const GPLEV: [usize; 2] = [GPLEV0, GPLEV1];
    /// Pull clock-enable registers, indexed by bank
    pub const GPPUDCLK: [usize; 2] = [GPPUDCLK0, GPPUDCLK1];
}

/// Validate a byte offset and convert it to a word index into the page.
///
/// Offsets come from the pin arithmetic, never from user input, so a
/// failure here is a bug in the caller.
pub fn word_index(offset: usize) -> Result<usize> {
    if offset % 4 != 0 || offset >= PAGE_SIZE {
        return Err(GpioError::AlignmentOrRange { offset });
    }
    Ok(offset / 4)
}

/// Like `word_index`, but a bad offset is fatal.
#[inline]
#[track_caller]
pub(crate) fn checked_word_index(offset: usize) -> usize {
    match word_index(offset) {
        Ok(index) => index,
        Err(err) => panic!("{err}"),
    }
}

// ============================================================================
// REGISTER VIEW
// ============================================================================

/// Aligned 32-bit access to a GPIO register window.
///
/// Implementations must perform every access directly (volatile, in program
/// order) and must panic on an offset rejected by [`word_index`].
pub trait RegisterView {
    /// Read the 32-bit register at `offset` bytes from the base
    fn read(&self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset` bytes from the base
    fn write(&mut self, offset: usize, value: u32);

    /// Read a register, transform the value, and write it back.
    ///
    /// Not atomic with respect to any other writer of the same page.
    fn modify<F>(&mut self, offset: usize, update: F)
    where
        F: FnOnce(u32) -> u32,
        Self: Sized,
    {
        let value = self.read(offset);
        self.write(offset, update(value));
    }
}

impl<R: RegisterView + ?Sized> RegisterView for &mut R {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }
}
