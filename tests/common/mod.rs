//! Recording fakes shared by the integration tests.
//!
//! Every line pushes `(pin, level)` onto one shared trace. [`decode`] turns a
//! trace back into the frames the chips would have seen.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use myrtio_tlc5940::{
    DigitalLine, DriverConfig, EngineConfig, ExecutionUnit, Executor, PinBank, ReferenceClock,
    StartError,
};

pub(crate) const SCLK: u8 = 0;
pub(crate) const SIN: u8 = 1;
pub(crate) const XLAT: u8 = 2;
pub(crate) const GSCLK: u8 = 3;
pub(crate) const BLANK: u8 = 4;
pub(crate) const VPRG: u8 = 5;

pub(crate) const PIN_COUNT: u8 = 32;

pub(crate) type Trace = Arc<Mutex<Vec<(u8, bool)>>>;

pub(crate) fn config(chip_count: u8) -> DriverConfig {
    DriverConfig::new(SCLK, SIN, XLAT, GSCLK, BLANK, VPRG, chip_count).with_engine(EngineConfig {
        idle_backoff: myrtio_tlc5940::Duration::from_ticks(0),
    })
}

#[derive(Debug)]
pub(crate) struct RecordingLine {
    pub(crate) pin: u8,
    trace: Trace,
}

impl DigitalLine for RecordingLine {
    fn set_high(&mut self) {
        self.trace.lock().unwrap().push((self.pin, true));
    }

    fn set_low(&mut self) {
        self.trace.lock().unwrap().push((self.pin, false));
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingPins {
    pub(crate) trace: Trace,
    pub(crate) claimed: Vec<u8>,
}

impl RecordingPins {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<(u8, bool)> {
        self.trace.lock().unwrap().clone()
    }

    pub(crate) fn frames(&self) -> Vec<Frame> {
        decode(&self.events())
    }

    pub(crate) fn clear(&self) {
        self.trace.lock().unwrap().clear();
    }
}

impl PinBank for RecordingPins {
    type Line = RecordingLine;
    const PIN_COUNT: u8 = PIN_COUNT;

    fn output(&mut self, pin: u8) -> RecordingLine {
        self.claimed.push(pin);
        let mut line = RecordingLine {
            pin,
            trace: Arc::clone(&self.trace),
        };
        line.set_low();
        line
    }
}

/// Reference clock that only remembers how it was started
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingClock {
    pub(crate) starts: Arc<AtomicUsize>,
    pub(crate) pins: Arc<Mutex<Vec<u8>>>,
}

impl RecordingClock {
    pub(crate) fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl ReferenceClock<RecordingLine> for RecordingClock {
    fn start(self, gs_clock: RecordingLine, blank: RecordingLine) -> Result<(), StartError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.pins.lock().unwrap().extend([gs_clock.pin, blank.pin]);
        Ok(())
    }
}

/// Executor backed by `std::thread::scope`
pub(crate) struct ScopedUnits<'scope, 'env>(pub(crate) &'scope Scope<'scope, 'env>);

pub(crate) struct ScopedUnit<'scope>(ScopedJoinHandle<'scope, ()>);

impl<'scope> Executor<'scope> for ScopedUnits<'scope, '_> {
    type Unit = ScopedUnit<'scope>;

    fn launch<F>(&self, job: F) -> Option<Self::Unit>
    where
        F: FnOnce() + Send + 'scope,
    {
        Some(ScopedUnit(self.0.spawn(job)))
    }
}

impl ExecutionUnit for ScopedUnit<'_> {
    fn join(self) {
        self.0.join().unwrap();
    }
}

/// Executor that never has a unit to spare
pub(crate) struct NoUnits;

pub(crate) enum NeverUnit {}

impl ExecutionUnit for NeverUnit {
    fn join(self) {
        match self {}
    }
}

impl<'a> Executor<'a> for NoUnits {
    type Unit = NeverUnit;

    fn launch<F>(&self, _job: F) -> Option<Self::Unit>
    where
        F: FnOnce() + Send + 'a,
    {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Grayscale,
    DotCorrection,
}

/// One latched frame as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) mode: Mode,
    /// Data bits in the order they were clocked
    pub(crate) bits: Vec<bool>,
    /// SCLK pulses after the latch with no data written before them
    pub(crate) extra_clocks: usize,
}

impl Frame {
    /// Values in the order they were shifted (highest channel first)
    pub(crate) fn shifted_values(&self, width: usize) -> Vec<u16> {
        assert_eq!(self.bits.len() % width, 0, "partial value in frame");
        self.bits
            .chunks(width)
            .map(|chunk| chunk.iter().fold(0u16, |acc, &bit| acc << 1 | u16::from(bit)))
            .collect()
    }

    /// Values indexed by channel
    pub(crate) fn channels(&self, width: usize) -> Vec<u16> {
        let mut values = self.shifted_values(width);
        values.reverse();
        values
    }
}

/// Rebuild frames from a line trace.
///
/// A data bit is an SCLK rising edge preceded by a SIN write; an SCLK rising
/// edge without one is an extra clock belonging to the previous frame.
pub(crate) fn decode(events: &[(u8, bool)]) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut bits = Vec::new();
    let mut sin = false;
    let mut vprg = false;
    let mut data_pending = false;

    for &(pin, level) in events {
        match (pin, level) {
            (SIN, level) => {
                sin = level;
                data_pending = true;
            }
            (VPRG, level) => vprg = level,
            (SCLK, true) => {
                if data_pending {
                    bits.push(sin);
                    data_pending = false;
                } else if let Some(frame) = frames.last_mut() {
                    frame.extra_clocks += 1;
                }
            }
            (XLAT, true) => frames.push(Frame {
                mode: if vprg {
                    Mode::DotCorrection
                } else {
                    Mode::Grayscale
                },
                bits: std::mem::take(&mut bits),
                extra_clocks: 0,
            }),
            _ => {}
        }
    }

    assert!(bits.is_empty(), "bits clocked without a latch");
    frames
}

/// Poll `condition` until it holds or a few seconds pass
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for the engine");
        std::thread::yield_now();
    }
}
