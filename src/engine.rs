//! Serial protocol engine
//!
//! Owns the active (on-screen) buffers and the four serializer lines. One
//! [`SerialEngine::service`] call is one pass of the engine loop:
//!
//! 1. grayscale, if requested: clear the request, snapshot, shift 12 bits per
//!    channel, latch, then pay the post dot-correction clock if owed
//! 2. dot correction, if requested: clear the request, snapshot, raise VPRG,
//!    shift 6 bits per channel, latch, lower VPRG, mark the clock as owed
//!
//! Channels go out highest index first and each value most significant bit
//! first, so channel 0 ends up next to the latch in the chip's shift register.

use embassy_time::{Duration, block_for};
use heapless::Vec;

use crate::driver::Tlc5940;
use crate::line::DigitalLine;
use crate::scheduler::FrameKind;

/// Bits per grayscale value
pub const GRAYSCALE_BITS: u8 = 12;

/// Bits per dot-correction value
pub const DOT_CORRECTION_BITS: u8 = 6;

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long the engine waits between polls of the update flags when
    /// there is nothing to send. Zero means spin.
    pub idle_backoff: Duration,
}

impl EngineConfig {
    pub const DEFAULT: Self = Self {
        idle_backoff: Duration::from_micros(100),
    };
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Lines driven by the serializer
#[derive(Debug)]
pub struct SerialLines<L> {
    /// Shift clock (SCLK)
    pub sclk: L,
    /// Serial data in (SIN)
    pub sin: L,
    /// Latch (XLAT)
    pub xlat: L,
    /// Mode select (VPRG), high while dot correction is shifted
    pub vprg: L,
}

/// "Last frame was dot correction" latch.
///
/// After a dot-correction frame the chip's shift counter is one clock off;
/// the next grayscale frame has to emit one extra SCLK pulse after its latch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeQuirk {
    #[default]
    Settled,
    ExtraClockOwed,
}

/// What one engine pass transmitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Serviced {
    pub grayscale: bool,
    pub dot_correction: bool,
}

impl Serviced {
    pub const fn any(self) -> bool {
        self.grayscale || self.dot_correction
    }
}

/// Serializer for one chip chain
pub struct SerialEngine<'a, L: DigitalLine, const N: usize> {
    tlc: &'a Tlc5940<'a, N>,
    lines: SerialLines<L>,
    config: EngineConfig,

    grayscale: Vec<u16, N>,
    dot_correction: Vec<u8, N>,
    quirk: ModeQuirk,
}

impl<'a, L: DigitalLine, const N: usize> SerialEngine<'a, L, N> {
    /// Create an engine over the published window of `tlc`.
    ///
    /// Lines are expected to already be driven low.
    pub fn new(tlc: &'a Tlc5940<'a, N>, lines: SerialLines<L>, config: EngineConfig) -> Self {
        let total = tlc.store().total_channels().min(N);
        let mut grayscale = Vec::new();
        let mut dot_correction = Vec::new();
        // Cannot fail: total is clamped to the capacity.
        let _ = grayscale.resize(total, 0);
        let _ = dot_correction.resize(total, 0);

        Self {
            tlc,
            lines,
            config,
            grayscale,
            dot_correction,
            quirk: ModeQuirk::Settled,
        }
    }

    /// Current state of the post dot-correction latch
    pub fn quirk(&self) -> ModeQuirk {
        self.quirk
    }

    /// Grayscale values of the last transmitted frame
    pub fn active_grayscale(&self) -> &[u16] {
        &self.grayscale
    }

    /// Dot-correction values of the last transmitted frame
    pub fn active_dot_correction(&self) -> &[u8] {
        &self.dot_correction
    }

    /// Run one pass of the engine loop. Grayscale is serviced first.
    pub fn service(&mut self) -> Serviced {
        let tlc = self.tlc;
        let flags = tlc.flags();
        let mut serviced = Serviced::default();

        if flags.take(FrameKind::Grayscale) {
            self.send_grayscale();
            serviced.grayscale = true;
        }
        if flags.take(FrameKind::DotCorrection) {
            self.send_dot_correction();
            serviced.dot_correction = true;
        }

        serviced
    }

    /// Service requests until the owning driver asks to stop.
    ///
    /// The stop request is only checked between passes; a frame that has
    /// started always completes.
    pub fn run(mut self) -> SerialLines<L> {
        while !self.tlc.stop_requested() {
            if !self.service().any() {
                self.idle();
            }
        }
        self.lines
    }

    fn idle(&self) {
        if self.config.idle_backoff.as_ticks() == 0 {
            core::hint::spin_loop();
        } else {
            block_for(self.config.idle_backoff);
        }
    }

    fn send_grayscale(&mut self) {
        self.tlc.store().snapshot_grayscale(&mut self.grayscale);

        for &value in self.grayscale.iter().rev() {
            shift_out(&mut self.lines, value, GRAYSCALE_BITS);
        }
        self.lines.xlat.pulse();

        if self.quirk == ModeQuirk::ExtraClockOwed {
            self.lines.sclk.pulse();
            self.quirk = ModeQuirk::Settled;
        }

        self.tlc.counters().frame_sent(FrameKind::Grayscale);
    }

    fn send_dot_correction(&mut self) {
        self.tlc
            .store()
            .snapshot_dot_correction(&mut self.dot_correction);

        self.lines.vprg.set_high();
        for &value in self.dot_correction.iter().rev() {
            shift_out(&mut self.lines, u16::from(value), DOT_CORRECTION_BITS);
        }
        self.lines.xlat.pulse();
        self.lines.vprg.set_low();

        self.quirk = ModeQuirk::ExtraClockOwed;
        self.tlc.counters().frame_sent(FrameKind::DotCorrection);
    }
}

/// Shift the low `bits` bits of `value` out, most significant first
fn shift_out<L: DigitalLine>(lines: &mut SerialLines<L>, value: u16, bits: u8) {
    for bit in (0..bits).rev() {
        lines.sin.set_level((value >> bit) & 1 == 1);
        lines.sclk.pulse();
    }
}
