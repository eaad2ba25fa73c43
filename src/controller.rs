//! Producer-side handle
//!
//! Every mutator only touches the pending buffers and the update flags, so a
//! [`Controller`] can be copied freely and used from any number of contexts
//! while the serial engine runs. Writes never block and never fail loudly:
//! out-of-range input is ignored and reported as `false`.

use smart_leds::RGB8;

use crate::color::{Rgb12, expand_to_12bit};
use crate::driver::Tlc5940;
use crate::scheduler::FrameKind;
use crate::store::MAX_GRAYSCALE;

/// Channels per RGB LED
pub const CHANNELS_PER_LED: usize = 3;

/// Copyable producer handle for one chip chain
#[derive(Clone, Copy)]
pub struct Controller<'a, const N: usize> {
    tlc: &'a Tlc5940<'a, N>,
}

impl<'a, const N: usize> Controller<'a, N> {
    pub const fn new(tlc: &'a Tlc5940<'a, N>) -> Self {
        Self { tlc }
    }

    /// Channels in the chain (zero until the driver is started)
    pub fn total_channels(&self) -> usize {
        self.tlc.store().total_channels()
    }

    /// RGB LEDs the chain can address
    pub fn led_count(&self) -> usize {
        self.total_channels() / CHANNELS_PER_LED
    }

    /// Set the pending grayscale value of one channel.
    ///
    /// Takes effect on the next [`Controller::request_update`].
    pub fn set_channel(&self, channel: usize, value: u16) -> bool {
        self.tlc.store().set_grayscale(channel, value)
    }

    /// Set every pending grayscale value
    pub fn set_all_channels(&self, value: u16) -> bool {
        self.tlc.store().fill_grayscale(value)
    }

    /// Set the three channels of RGB LED `led` (red, green, blue, in that
    /// order).
    ///
    /// All four inputs are checked before anything is written.
    pub fn set_led(&self, led: usize, red: u16, green: u16, blue: u16) -> bool {
        if led >= self.led_count() || [red, green, blue].iter().any(|&v| v > MAX_GRAYSCALE) {
            return false;
        }
        let base = led * CHANNELS_PER_LED;
        let store = self.tlc.store();
        // The backing cells may end inside the LED when a base offset is set.
        if store.grayscale(base + CHANNELS_PER_LED - 1).is_none() {
            return false;
        }
        store.set_grayscale(base, red);
        store.set_grayscale(base + 1, green);
        store.set_grayscale(base + 2, blue);
        true
    }

    /// [`Controller::set_led`] taking a 12-bit color
    pub fn set_rgb(&self, led: usize, color: Rgb12) -> bool {
        self.set_led(led, color.r, color.g, color.b)
    }

    /// Write 8-bit colors to consecutive LEDs starting at LED 0, then
    /// request an update.
    ///
    /// Colors past the end of the chain are ignored. Returns how many LEDs
    /// were written.
    pub fn write_rgb8(&self, colors: &[RGB8]) -> usize {
        let mut written = 0;
        for (led, color) in colors.iter().enumerate().take(self.led_count()) {
            if self.set_rgb(led, expand_to_12bit(*color)) {
                written += 1;
            }
        }
        self.request_update();
        written
    }

    /// Ask the engine to send the pending grayscale values.
    ///
    /// Requests made before the engine gets to them collapse into one frame.
    pub fn request_update(&self) {
        self.tlc.flags().raise(FrameKind::Grayscale);
    }

    /// Set the dot correction of one channel and schedule a dot-correction
    /// frame
    pub fn set_dot_correction(&self, channel: usize, value: u8) -> bool {
        let accepted = self.tlc.store().set_dot_correction(channel, value);
        if accepted {
            self.tlc.flags().raise(FrameKind::DotCorrection);
        }
        accepted
    }

    /// Set every dot-correction value and schedule a dot-correction frame
    pub fn set_all_dot_correction(&self, value: u8) -> bool {
        let accepted = self.tlc.store().fill_dot_correction(value);
        if accepted {
            self.tlc.flags().raise(FrameKind::DotCorrection);
        }
        accepted
    }

    /// Pending grayscale value of `channel`
    pub fn channel(&self, channel: usize) -> Option<u16> {
        self.tlc.store().grayscale(channel)
    }

    /// Pending dot-correction value of `channel`
    pub fn dot_correction(&self, channel: usize) -> Option<u8> {
        self.tlc.store().dot_correction(channel)
    }
}
