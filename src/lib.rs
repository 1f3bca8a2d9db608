//! # Raspberry Pi GPIO from user space
//!
//! Maps the BCM283x/BCM2711 GPIO register block through `/dev/mem` (or
//! `/dev/gpiomem`) and drives pins by writing those registers directly.
//!
//! ## Layers
//!
//! - [`mem::PeripheralMapping`] owns the mapped page and releases it exactly once
//! - [`regs::RegisterView`] is the aligned 32-bit access contract; the live
//!   mapping and the in-memory [`regs::MemoryRegisters`] both implement it
//! - [`gpio::PinController`] encodes mode, level and pull operations into
//!   masked register writes
//!
//! ## Usage
//!
//! ```no_run
//! use rpi_gpio::{Level, PeripheralMapping, Pin, PinController, PinMode};
//!
//! # fn main() -> rpi_gpio::Result<()> {
//! let mut mapping = PeripheralMapping::open(0xFE20_0000)?;
//! let mut gpio = PinController::new(mapping.registers()?);
//!
//! let led = Pin::new(17)?;
//! gpio.set_mode(led, PinMode::Output);
//! gpio.write_level(led, Level::High);
//! assert_eq!(gpio.read_level(led), Level::High);
//! # Ok(())
//! # }
//! ```
//!
//! Nothing here is synchronized. One mapping and one controller per process
//! is assumed; callers sharing a controller across threads must lock around it.

pub mod boards;
pub mod config;
pub mod error;
pub mod gpio;
pub mod mem;
pub mod regs;

pub use error::{GpioError, Result};
pub use gpio::{Level, Pin, PinController, PinMode, PullMode};
pub use mem::PeripheralMapping;
pub use regs::{MemoryRegisters, RegisterView};
