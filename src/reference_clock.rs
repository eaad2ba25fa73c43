//! Reference clock unit
//!
//! The grayscale PWM inside the chips is driven by GSCLK and reset by BLANK.
//! That generator runs on its own, independent of the serializer: bootstrap
//! hands it the two lines once and never talks to it again. In particular
//! stopping a [`crate::Driver`] does not stop the reference clock.

use embassy_time::{Duration, block_for};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::error::StartError;
use crate::executor::Executor;
use crate::line::DigitalLine;

/// GSCLK pulses per PWM cycle (one per grayscale step)
pub const GSCLK_PULSES_PER_CYCLE: u16 = 4096;

/// Generator driving GSCLK and BLANK
pub trait ReferenceClock<L> {
    /// Take ownership of the two lines and start generating.
    ///
    /// Called exactly once, during bootstrap.
    fn start(self, gs_clock: L, blank: L) -> Result<(), StartError>;
}

/// One bit-banged grayscale PWM cycle generator
#[derive(Debug)]
pub struct GrayscaleClock<L> {
    gs_clock: L,
    blank: L,
    half_period: Duration,
}

impl<L: DigitalLine> GrayscaleClock<L> {
    pub fn new(gs_clock: L, blank: L, half_period: Duration) -> Self {
        Self {
            gs_clock,
            blank,
            half_period,
        }
    }

    /// Pulse BLANK to restart the chips' grayscale counters, then clock
    /// through all 4096 grayscale steps.
    pub fn run_cycle(&mut self) {
        self.blank.pulse();
        for _ in 0..GSCLK_PULSES_PER_CYCLE {
            self.gs_clock.set_high();
            self.wait();
            self.gs_clock.set_low();
            self.wait();
        }
    }

    fn wait(&self) {
        if self.half_period.as_ticks() != 0 {
            block_for(self.half_period);
        }
    }
}

/// Reference clock that bit-bangs [`GrayscaleClock`] cycles forever on an
/// execution unit of its own
#[derive(Debug, Clone, Copy)]
pub struct SoftReferenceClock<'e, E> {
    executor: &'e E,
    half_period: Duration,
}

impl<'e, E> SoftReferenceClock<'e, E> {
    pub const fn new(executor: &'e E) -> Self {
        Self {
            executor,
            half_period: Duration::from_ticks(0),
        }
    }

    /// Hold GSCLK high and low for `half_period` each
    #[must_use]
    pub const fn with_half_period(mut self, half_period: Duration) -> Self {
        self.half_period = half_period;
        self
    }
}

impl<'a, E, L> ReferenceClock<L> for SoftReferenceClock<'_, E>
where
    E: Executor<'a>,
    L: DigitalLine + Send + 'a,
{
    fn start(self, gs_clock: L, blank: L) -> Result<(), StartError> {
        let mut clock = GrayscaleClock::new(gs_clock, blank, self.half_period);
        // The unit handle is dropped: nothing ever joins the reference clock.
        let _unit = self
            .executor
            .launch(move || {
                loop {
                    clock.run_cycle();
                }
            })
            .ok_or(StartError::NoExecutionUnit)?;

        #[cfg(feature = "esp32-log")]
        println!("[tlc5940] reference clock started");

        Ok(())
    }
}
