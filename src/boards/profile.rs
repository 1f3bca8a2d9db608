//! Board profile definition

/// Offset of the GPIO block from the peripheral base
pub const GPIO_OFFSET: u32 = 0x20_0000;

/// Physical address of the GPIO block for a peripheral base, if it fits in 32 bits
pub fn gpio_block_address(peripheral_base: u32) -> Option<u32> {
    peripheral_base.checked_add(GPIO_OFFSET)
}

/// Peripheral layout of one board family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    /// Short identifier (e.g., "rpi4")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// SoC part number(s)
    pub soc: String,
    /// Physical base address of the peripheral window
    pub peripheral_base: u32,
    /// Pull resistors are driven through GPPUD/GPPUDCLK
    pub legacy_pulls: bool,
}

impl BoardProfile {
    /// Physical address of the GPIO register block
    pub fn gpio_base(&self) -> Option<u32> {
        gpio_block_address(self.peripheral_base)
    }
}
