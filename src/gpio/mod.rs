//! GPIO pin control
//!
//! Pin types and the controller that encodes pin operations into the
//! function-select, set/clear, level and pull registers.

pub mod controller;
pub mod types;

pub use controller::{PinController, DEFAULT_PULL_DELAY};
pub use types::{Bank, Level, Pin, PinMode, PullMode, PIN_COUNT};
