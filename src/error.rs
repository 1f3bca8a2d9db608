//! Error types for GPIO register access
//!
//! One closed set of error kinds covers the whole library. Only
//! `Acquisition` and `InvalidInput` are expected at runtime; the other two
//! indicate a caller or address-computation bug.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the mapping and the register layer
#[derive(Debug, Error)]
pub enum GpioError {
    /// The device-memory node could not be opened or mapped
    #[error("failed to {action} {}: {source}", device.display())]
    Acquisition {
        /// What was being attempted ("open" or "map")
        action: &'static str,
        /// Device node path
        device: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A register operation was attempted without an active mapping
    #[error("GPIO peripheral is not connected")]
    NotConnected,

    /// A pin number, mode or pull name supplied by a user was rejected
    #[error("invalid {kind}: '{value}'")]
    InvalidInput {
        /// Which kind of value was rejected ("pin number", "pin mode", ...)
        kind: &'static str,
        /// The offending text
        value: String,
    },

    /// A register offset fell outside the mapped page or was not 4-byte aligned
    #[error("register offset {offset:#x} is misaligned or outside the mapped page")]
    AlignmentOrRange {
        /// Byte offset from the mapping base
        offset: usize,
    },
}

impl GpioError {
    /// Build an `InvalidInput` error
    pub fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        GpioError::InvalidInput {
            kind,
            value: value.into(),
        }
    }

    /// Underlying OS error code, if this error came from a failed syscall
    pub fn os_error(&self) -> Option<i32> {
        match self {
            GpioError::Acquisition { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, GpioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_error_code() {
        let err = GpioError::Acquisition {
            action: "open",
            device: PathBuf::from("/dev/mem"),
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(err.os_error(), Some(libc::EACCES));
        assert_eq!(GpioError::NotConnected.os_error(), None);
    }

    #[test]
    fn test_messages() {
        let err = GpioError::invalid("pin number", "99");
        assert_eq!(err.to_string(), "invalid pin number: '99'");

        let err = GpioError::AlignmentOrRange { offset: 0x1001 };
        assert!(err.to_string().contains("0x1001"));
    }
}
