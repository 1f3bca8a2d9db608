//! In-memory GPIO register store
//!
//! Stands in for the mapped peripheral page in tests and dry runs. Writes to
//! the SET and CLEAR registers are folded into the bank's LEVEL word, so a
//! pin driven high reads back high. Every write is journaled in order.

use std::fmt;

use super::{checked_word_index, gpio_reg, RegisterView, PAGE_WORDS};

/// One register write issued through a `MemoryRegisters`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Byte offset of the register
    pub offset: usize,
    /// Value written
    pub value: u32,
}

impl fmt::Display for RegisterWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#04x}] <- {:#010x}", self.offset, self.value)
    }
}

/// Simulated register page backed by a vector of words
#[derive(Debug, Clone)]
pub struct MemoryRegisters {
    words: Vec<u32>,
    journal: Vec<RegisterWrite>,
}

impl Default for MemoryRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegisters {
    /// Create a page with every register zeroed
    pub fn new() -> Self {
        Self {
            words: vec![0; PAGE_WORDS],
            journal: Vec::new(),
        }
    }

    /// Peek at a register without going through the journal
    pub fn word(&self, offset: usize) -> u32 {
        self.words[checked_word_index(offset)]
    }

    /// Preload a register, e.g. to simulate a pin driven by external hardware
    pub fn set_word(&mut self, offset: usize, value: u32) {
        let index = checked_word_index(offset);
        self.words[index] = value;
    }

    /// Writes issued so far, oldest first
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.journal
    }

    /// Drain the write journal
    pub fn take_writes(&mut self) -> Vec<RegisterWrite> {
        std::mem::take(&mut self.journal)
    }
}

impl RegisterView for MemoryRegisters {
    fn read(&self, offset: usize) -> u32 {
        self.word(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        let index = checked_word_index(offset);
        self.journal.push(RegisterWrite { offset, value });

        if let Some(bank) = gpio_reg::GPSET.iter().position(|&o| o == offset) {
            self.words[gpio_reg::GPLEV[bank] / 4] |= value;
        } else if let Some(bank) = gpio_reg::GPCLR.iter().position(|&o| o == offset) {
            self.words[gpio_reg::GPLEV[bank] / 4] &= !value;
        } else {
            self.words[index] = value;
        }
    }
}
