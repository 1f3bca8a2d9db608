//! Physical memory mapping
//!
//! This module provides functionality for:
//! - Opening a device-memory node (`/dev/mem`, `/dev/gpiomem`)
//! - Mapping one page of peripheral registers into the process
//! - Handing out a `RegisterView` over the live mapping

pub mod mapping;

pub use mapping::{MappedRegisters, PeripheralMapping};

/// Full physical memory device; needs root
pub const DEV_MEM: &str = "/dev/mem";

/// GPIO-only device exposed by the Raspberry Pi kernel; the GPIO block sits at offset 0
pub const DEV_GPIOMEM: &str = "/dev/gpiomem";

/// Whether `device` is a gpiomem-style node that ignores the physical base
pub fn is_gpiomem(device: &std::path::Path) -> bool {
    device
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("gpiomem"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_is_gpiomem() {
        assert!(is_gpiomem(Path::new(DEV_GPIOMEM)));
        assert!(is_gpiomem(Path::new("/dev/gpiomem0")));
        assert!(!is_gpiomem(Path::new(DEV_MEM)));
        assert!(!is_gpiomem(Path::new("/")));
    }
}
