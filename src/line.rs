//! Digital line abstraction
//!
//! The serializer bit-bangs six single-bit lines. Everything it needs from the
//! hardware is "drive this line high" and "drive this line low", so the
//! protocol engine is generic over [`DigitalLine`] and can run against a
//! recording fake on the host.

use embedded_hal::digital::OutputPin;

/// A single push-pull output line
pub trait DigitalLine {
    /// Drive the line high
    fn set_high(&mut self);

    /// Drive the line low
    fn set_low(&mut self);

    /// Drive the line to the given level (`true` is high)
    fn set_level(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Emit one high-then-low pulse
    fn pulse(&mut self) {
        self.set_high();
        self.set_low();
    }
}

/// Adapter for any `embedded-hal` output pin.
///
/// GPIO writes on supported targets are infallible in practice and the
/// TLC5940 protocol has no feedback path, so pin errors are discarded.
#[derive(Debug)]
pub struct HalLine<P>(pub P);

impl<P: OutputPin> DigitalLine for HalLine<P> {
    fn set_high(&mut self) {
        let _ = self.0.set_high();
    }

    fn set_low(&mut self) {
        let _ = self.0.set_low();
    }
}

impl<P> HalLine<P> {
    /// Release the wrapped pin
    pub fn into_inner(self) -> P {
        self.0
    }
}

/// Platform pin namespace
///
/// Bootstrap validates pin indices against [`PinBank::PIN_COUNT`] and then
/// claims each pin through [`PinBank::output`].
pub trait PinBank {
    /// Line type handed out for a claimed pin
    type Line: DigitalLine + Send;

    /// Number of addressable pins; valid indices are `0..PIN_COUNT`
    const PIN_COUNT: u8;

    /// Configure `pin` as an output driven low and return its line
    fn output(&mut self, pin: u8) -> Self::Line;
}
