//! Board profiles
//!
//! Maps Raspberry Pi boards to the physical base address of their
//! peripheral window. The GPIO block always sits at a fixed offset from it.

pub mod profile;

pub use profile::{gpio_block_address, BoardProfile, GPIO_OFFSET};

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;

/// Device-tree node holding the board model string
pub const MODEL_PATH: &str = "/proc/device-tree/model";

/// Profile used when nothing else is known (original Pi, BCM2835)
pub const DEFAULT_BOARD: &str = "rpi1";

/// Raspberry Pi 1 / Zero (BCM2835)
pub static RPI1_PROFILE: Lazy<BoardProfile> = Lazy::new(|| BoardProfile {
    id: "rpi1".to_string(),
    name: "Raspberry Pi 1 / Zero".to_string(),
    soc: "BCM2835".to_string(),
    peripheral_base: 0x2000_0000,
    legacy_pulls: true,
});

/// Raspberry Pi 2 / 3 (BCM2836, BCM2837)
pub static RPI3_PROFILE: Lazy<BoardProfile> = Lazy::new(|| BoardProfile {
    id: "rpi3".to_string(),
    name: "Raspberry Pi 2 / 3".to_string(),
    soc: "BCM2836/BCM2837".to_string(),
    peripheral_base: 0x3F00_0000,
    legacy_pulls: true,
});

/// Raspberry Pi 4 (BCM2711, low-peripheral mode)
pub static RPI4_PROFILE: Lazy<BoardProfile> = Lazy::new(|| BoardProfile {
    id: "rpi4".to_string(),
    name: "Raspberry Pi 4".to_string(),
    soc: "BCM2711".to_string(),
    peripheral_base: 0xFE00_0000,
    // pulls moved to GPIO_PUP_PDN_CNTRL_REG0..3; GPPUD/GPPUDCLK are reserved
    legacy_pulls: false,
});

/// Registry of built-in board profiles
pub static BOARD_PROFILES: Lazy<HashMap<&'static str, &'static BoardProfile>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("rpi1", &*RPI1_PROFILE);
    m.insert("rpi-zero", &*RPI1_PROFILE);
    m.insert("bcm2835", &*RPI1_PROFILE);
    m.insert("rpi2", &*RPI3_PROFILE);
    m.insert("rpi3", &*RPI3_PROFILE);
    m.insert("bcm2836", &*RPI3_PROFILE);
    m.insert("bcm2837", &*RPI3_PROFILE);
    m.insert("rpi4", &*RPI4_PROFILE);
    m.insert("bcm2711", &*RPI4_PROFILE);
    m
});

/// Get a board profile by name
pub fn get_board(name: &str) -> Option<&'static BoardProfile> {
    BOARD_PROFILES.get(name.trim().to_lowercase().as_str()).copied()
}

/// Primary board names (deduplicated)
pub fn board_names() -> Vec<&'static str> {
    vec!["rpi1", "rpi3", "rpi4"]
}

/// Pick a profile from a device-tree model string
pub fn board_for_model(model: &str) -> Option<&'static BoardProfile> {
    let model = model.trim_end_matches('\0').to_lowercase();
    if !model.contains("raspberry pi") {
        return None;
    }

    let id = if model.contains("raspberry pi 4")
        || model.contains("compute module 4")
        || model.contains("raspberry pi 400")
    {
        "rpi4"
    } else if model.contains("raspberry pi 3")
        || model.contains("raspberry pi 2")
        || model.contains("compute module 3")
        || model.contains("zero 2")
    {
        "rpi3"
    } else {
        "rpi1"
    };
    get_board(id)
}

/// Detect the running board from the device tree
pub fn detect_board() -> Option<&'static BoardProfile> {
    let model = fs::read_to_string(MODEL_PATH).ok()?;
    log::debug!("Device-tree model: {}", model.trim_end_matches('\0'));
    board_for_model(&model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_board_aliases() {
        assert_eq!(get_board("RPI4").unwrap().id, "rpi4");
        assert_eq!(get_board("bcm2837").unwrap().id, "rpi3");
        assert_eq!(get_board("rpi-zero").unwrap().id, "rpi1");
        assert!(get_board("esp32").is_none());
    }

    #[test]
    fn test_board_names_resolve() {
        for name in board_names() {
            assert!(get_board(name).is_some(), "{name}");
        }
        assert!(get_board(DEFAULT_BOARD).is_some());
    }

    #[test]
    fn test_board_for_model() {
        let cases = [
            ("Raspberry Pi 4 Model B Rev 1.4\0", "rpi4"),
            ("Raspberry Pi 400 Rev 1.0", "rpi4"),
            ("Raspberry Pi Compute Module 4 Rev 1.0", "rpi4"),
            ("Raspberry Pi 3 Model B Plus Rev 1.3", "rpi3"),
            ("Raspberry Pi 2 Model B Rev 1.1", "rpi3"),
            ("Raspberry Pi Zero 2 W Rev 1.0", "rpi3"),
            ("Raspberry Pi Zero W Rev 1.1", "rpi1"),
            ("Raspberry Pi Model B Rev 2", "rpi1"),
        ];
        for (model, id) in cases {
            assert_eq!(board_for_model(model).unwrap().id, id, "{model}");
        }
        assert!(board_for_model("Banana Pi BPI-R4").is_none());
    }

    #[test]
    fn test_legacy_pulls_by_soc() {
        assert!(get_board("rpi1").unwrap().legacy_pulls);
        assert!(get_board("rpi3").unwrap().legacy_pulls);
        assert!(!get_board("bcm2711").unwrap().legacy_pulls);
    }
}
