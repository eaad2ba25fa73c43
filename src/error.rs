use core::fmt;

/// Reasons [`crate::start`] can refuse to bring a driver up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// A pin index is outside the platform's pin range
    InvalidPin(u8),
    /// Chip count is outside `1..=MAX_CHIPS`
    InvalidChipCount(u8),
    /// `chip_count * 16` does not fit the driver's channel capacity
    CapacityExceeded { channels: usize, capacity: usize },
    /// Base offset is past the end of the chain
    InvalidBaseOffset(usize),
    /// This driver state has already been started once
    AlreadyStarted,
    /// No execution unit was available to run the engine or the clock
    NoExecutionUnit,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "pin {} is out of range", pin),
            Self::InvalidChipCount(count) => write!(f, "invalid chip count {}", count),
            Self::CapacityExceeded { channels, capacity } => write!(
                f,
                "{} channels exceed the driver capacity of {}",
                channels, capacity
            ),
            Self::InvalidBaseOffset(offset) => write!(f, "base offset {} is out of range", offset),
            Self::AlreadyStarted => f.write_str("driver already started"),
            Self::NoExecutionUnit => f.write_str("no execution unit available"),
        }
    }
}

impl core::error::Error for StartError {}
