//! Driver configuration and its validation

use crate::engine::EngineConfig;
use crate::error::StartError;
use crate::line::PinBank;
use crate::store::{CHANNELS_PER_CHIP, Window};

/// Longest supported chip chain
pub const MAX_CHIPS: u8 = 40;

/// Pins, chain length and placement of one driver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Shift clock (SCLK)
    pub sclk: u8,
    /// Serial data in (SIN)
    pub sin: u8,
    /// Latch (XLAT)
    pub xlat: u8,
    /// Grayscale PWM clock (GSCLK), handed to the reference clock
    pub gsclk: u8,
    /// Blank (BLANK), handed to the reference clock
    pub blank: u8,
    /// Mode select (VPRG)
    pub vprg: u8,
    /// Number of daisy-chained chips
    pub chip_count: u8,
    /// Position of channel 0 inside the pending grayscale cells
    pub base_offset: usize,
    pub engine: EngineConfig,
}

impl DriverConfig {
    pub const fn new(
        sclk: u8,
        sin: u8,
        xlat: u8,
        gsclk: u8,
        blank: u8,
        vprg: u8,
        chip_count: u8,
    ) -> Self {
        Self {
            sclk,
            sin,
            xlat,
            gsclk,
            blank,
            vprg,
            chip_count,
            base_offset: 0,
            engine: EngineConfig::DEFAULT,
        }
    }

    #[must_use]
    pub const fn with_base_offset(mut self, base_offset: usize) -> Self {
        self.base_offset = base_offset;
        self
    }

    #[must_use]
    pub const fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Channels in the chain
    pub const fn total_channels(&self) -> usize {
        self.chip_count as usize * CHANNELS_PER_CHIP
    }

    /// All six pins in wiring order
    pub const fn pins(&self) -> [u8; 6] {
        [self.sclk, self.sin, self.xlat, self.gsclk, self.blank, self.vprg]
    }

    /// Check the configuration against the platform and the channel capacity
    pub fn validate<P: PinBank>(&self, capacity: usize) -> Result<Window, StartError> {
        if let Some(&pin) = self.pins().iter().find(|&&pin| pin >= P::PIN_COUNT) {
            return Err(StartError::InvalidPin(pin));
        }
        if self.chip_count == 0 || self.chip_count > MAX_CHIPS {
            return Err(StartError::InvalidChipCount(self.chip_count));
        }
        let total = self.total_channels();
        if total > capacity {
            return Err(StartError::CapacityExceeded {
                channels: total,
                capacity,
            });
        }
        if self.base_offset > total {
            return Err(StartError::InvalidBaseOffset(self.base_offset));
        }

        Ok(Window {
            total,
            base_offset: self.base_offset,
        })
    }
}
