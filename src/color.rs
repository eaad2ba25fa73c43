//! Color helpers
//!
//! The chips take 12-bit grayscale values; most color sources hand out 8-bit
//! components.

use smart_leds::{RGB, RGB8};

/// 12-bit RGB triplet
pub type Rgb12 = RGB<u16>;

/// Scale an 8-bit component to the full 12-bit range.
///
/// Replicates the high nibble into the low bits so 0 maps to 0 and 255 maps
/// to 4095.
pub const fn expand_component(value: u8) -> u16 {
    let value = value as u16;
    value << 4 | value >> 4
}

/// Scale an 8-bit color to 12 bits per component
pub fn expand_to_12bit(color: RGB8) -> Rgb12 {
    RGB::new(
        expand_component(color.r),
        expand_component(color.g),
        expand_component(color.b),
    )
}
