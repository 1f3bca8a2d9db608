//! Connection configuration
//!
//! Settings come from an optional TOML file and from command-line flags.
//! `resolve` turns them into the device node, GPIO base address and pull
//! timing used to open the mapping.
//!
//! ```toml
//! board = "rpi4"
//! peripheral_base = 0xFE000000   # overrides the board's base
//! device = "/dev/mem"
//! pull_delay_us = 10
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::boards::{
    board_names, detect_board, get_board, gpio_block_address, BoardProfile, DEFAULT_BOARD,
};
use crate::gpio::DEFAULT_PULL_DELAY;
use crate::mem::{is_gpiomem, DEV_MEM};

/// User-facing settings; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Board profile name (see `boards`)
    pub board: Option<String>,
    /// Physical peripheral base, overriding the board profile
    pub peripheral_base: Option<u32>,
    /// Device-memory node
    pub device: Option<PathBuf>,
    /// Hold time between pull-protocol steps, in microseconds
    pub pull_delay_us: Option<u64>,
}

/// Fully resolved connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Board profile in effect
    pub board: &'static BoardProfile,
    /// Device-memory node to open
    pub device: PathBuf,
    /// Offset to map within the device
    pub gpio_base: u32,
    /// Hold time between pull-protocol steps
    pub pull_delay: Duration,
}

impl Settings {
    /// Parse settings from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("In config file: {}", path.display()))
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            board: overrides.board.or(self.board),
            peripheral_base: overrides.peripheral_base.or(self.peripheral_base),
            device: overrides.device.or(self.device),
            pull_delay_us: overrides.pull_delay_us.or(self.pull_delay_us),
        }
    }

    /// Resolve against the running board
    pub fn resolve(&self) -> Result<Target> {
        self.resolve_with(detect_board)
    }

    /// Resolve, using `detect` when no board is named
    pub fn resolve_with<F>(&self, detect: F) -> Result<Target>
    where
        F: FnOnce() -> Option<&'static BoardProfile>,
    {
        let board = match &self.board {
            Some(name) => match get_board(name) {
                Some(board) => board,
                None => bail!(
                    "Unknown board profile: {}. Known boards: {}",
                    name,
                    board_names().join(", ")
                ),
            },
            None => match detect().or_else(|| get_board(DEFAULT_BOARD)) {
                Some(board) => board,
                None => bail!("No default board profile"),
            },
        };

        let device = self.device.clone().unwrap_or_else(|| PathBuf::from(DEV_MEM));

        let gpio_base = if is_gpiomem(&device) {
            0
        } else {
            let block = match self.peripheral_base {
                Some(base) => gpio_block_address(base),
                None => board.gpio_base(),
            };
            match block {
                Some(base) => base,
                None => bail!(
                    "Peripheral base {:#010x} is out of range",
                    self.peripheral_base.unwrap_or(board.peripheral_base)
                ),
            }
        };

        let pull_delay = self
            .pull_delay_us
            .map(Duration::from_micros)
            .unwrap_or(DEFAULT_PULL_DELAY);

        Ok(Target {
            board,
            device,
            gpio_base,
            pull_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_board() -> Option<&'static BoardProfile> {
        None
    }

    #[test]
    fn test_parse_full() {
        let settings = Settings::parse(
            r#"
            board = "rpi3"
            peripheral_base = 0x3F000000
            device = "/dev/mem"
            pull_delay_us = 150
            "#,
        )
        .unwrap();
        assert_eq!(settings.board.as_deref(), Some("rpi3"));
        assert_eq!(settings.peripheral_base, Some(0x3F00_0000));
        assert_eq!(settings.pull_delay_us, Some(150));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(Settings::parse("baud_rate = 115200").is_err());
    }

    #[test]
    fn test_defaults_to_rpi1() {
        let target = Settings::default().resolve_with(no_board).unwrap();
        assert_eq!(target.board.id, "rpi1");
        assert_eq!(target.device, PathBuf::from(DEV_MEM));
        assert_eq!(target.gpio_base, 0x2020_0000);
        assert_eq!(target.pull_delay, DEFAULT_PULL_DELAY);
    }

    #[test]
    fn test_detected_board_used() {
        let target = Settings::default()
            .resolve_with(|| get_board("rpi4"))
            .unwrap();
        assert_eq!(target.gpio_base, 0xFE20_0000);
    }

    #[test]
    fn test_named_board_beats_detection() {
        let settings = Settings {
            board: Some("rpi3".to_string()),
            ..Default::default()
        };
        let target = settings.resolve_with(|| get_board("rpi4")).unwrap();
        assert_eq!(target.board.id, "rpi3");
        assert_eq!(target.gpio_base, 0x3F20_0000);
    }

    #[test]
    fn test_unknown_board() {
        let settings = Settings {
            board: Some("stm32".to_string()),
            ..Default::default()
        };
        let err = settings.resolve_with(no_board).unwrap_err();
        assert!(err.to_string().contains("Unknown board profile: stm32"));
    }

    #[test]
    fn test_gpiomem_maps_at_zero() {
        let settings = Settings {
            board: Some("rpi4".to_string()),
            device: Some(PathBuf::from("/dev/gpiomem")),
            ..Default::default()
        };
        assert_eq!(settings.resolve_with(no_board).unwrap().gpio_base, 0);
    }

    #[test]
    fn test_base_overflow() {
        let settings = Settings {
            peripheral_base: Some(0xFFF0_0000),
            ..Default::default()
        };
        assert!(settings.resolve_with(no_board).is_err());
    }

    #[test]
    fn test_merge_precedence() {
        let file = Settings {
            board: Some("rpi3".to_string()),
            pull_delay_us: Some(50),
            ..Default::default()
        };
        let flags = Settings {
            board: Some("rpi4".to_string()),
            ..Default::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.board.as_deref(), Some("rpi4"));
        assert_eq!(merged.pull_delay_us, Some(50));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "board = \"rpi4\"").unwrap();
        writeln!(file, "pull_delay_us = 5").unwrap();
        let settings = Settings::load(file.path()).unwrap();
        let target = settings.resolve_with(no_board).unwrap();
        assert_eq!(target.gpio_base, 0xFE20_0000);
        assert_eq!(target.pull_delay, Duration::from_micros(5));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Settings::load(Path::new("/nonexistent/gpio.toml")).is_err());
    }
}
