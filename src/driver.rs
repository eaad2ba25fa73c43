//! Driver state and bootstrap
//!
//! [`Tlc5940`] is everything the producers and the serial engine share for
//! one chip chain. It is `const`-constructible so it can live in a `static`,
//! and it is only ever accessed through shared references: the data path is
//! lock-free, and the run state is guarded by a short critical section.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use critical_section::Mutex;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::config::DriverConfig;
use crate::controller::Controller;
use crate::engine::{SerialEngine, SerialLines};
use crate::error::StartError;
use crate::executor::{ExecutionUnit, Executor};
use crate::line::{DigitalLine, PinBank};
use crate::reference_clock::ReferenceClock;
use crate::scheduler::{FrameKind, UpdateFlags};
use crate::store::ChannelStore;

/// Lifecycle of a driver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, never started
    Idle,
    /// Engine launched
    Running,
    /// Engine torn down (or start failed after claiming the instance)
    Stopped,
}

/// Number of frames the engine has sent, per kind
#[derive(Debug, Default)]
pub struct FrameCounters {
    grayscale: AtomicU32,
    dot_correction: AtomicU32,
}

impl FrameCounters {
    pub const fn new() -> Self {
        Self {
            grayscale: AtomicU32::new(0),
            dot_correction: AtomicU32::new(0),
        }
    }

    fn counter(&self, kind: FrameKind) -> &AtomicU32 {
        match kind {
            FrameKind::Grayscale => &self.grayscale,
            FrameKind::DotCorrection => &self.dot_correction,
        }
    }

    /// Only the engine writes, so a plain load/store pair is enough.
    pub(crate) fn frame_sent(&self, kind: FrameKind) {
        let counter = self.counter(kind);
        let sent = counter.load(Ordering::Relaxed);
        counter.store(sent.wrapping_add(1), Ordering::Release);
    }

    /// Frames of `kind` fully shifted out and latched
    pub fn sent(&self, kind: FrameKind) -> u32 {
        self.counter(kind).load(Ordering::Acquire)
    }
}

/// Shared state of one TLC5940 chip chain with room for `N` channels
pub struct Tlc5940<'a, const N: usize> {
    store: ChannelStore<'a, N>,
    flags: UpdateFlags,
    counters: FrameCounters,
    stop: AtomicBool,
    run_state: Mutex<Cell<RunState>>,
}

impl<'a, const N: usize> Tlc5940<'a, N> {
    /// Driver state owning all of its buffers
    pub const fn new() -> Self {
        Self::with_store(ChannelStore::new())
    }

    /// Driver state whose pending grayscale values live in `cells`, shared
    /// with other owners; see [`crate::SharedGrayscale`]
    pub const fn with_shared_grayscale(cells: &'a [AtomicU16]) -> Self {
        Self::with_store(ChannelStore::with_shared_grayscale(cells))
    }

    const fn with_store(store: ChannelStore<'a, N>) -> Self {
        Self {
            store,
            flags: UpdateFlags::new(),
            counters: FrameCounters::new(),
            stop: AtomicBool::new(false),
            run_state: Mutex::new(Cell::new(RunState::Idle)),
        }
    }

    pub fn store(&self) -> &ChannelStore<'a, N> {
        &self.store
    }

    pub fn flags(&self) -> &UpdateFlags {
        &self.flags
    }

    pub fn counters(&self) -> &FrameCounters {
        &self.counters
    }

    /// Producer handle for this chain
    pub fn controller(&self) -> Controller<'_, N> {
        Controller::new(self)
    }

    pub fn run_state(&self) -> RunState {
        critical_section::with(|cs| self.run_state.borrow(cs).get())
    }

    /// Ask a running [`SerialEngine::run`] loop to return after its current
    /// pass
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Move `Idle -> Running`; any other state means this instance was
    /// already started once.
    fn claim(&self) -> Result<(), StartError> {
        critical_section::with(|cs| {
            let state = self.run_state.borrow(cs);
            if state.get() != RunState::Idle {
                return Err(StartError::AlreadyStarted);
            }
            state.set(RunState::Running);
            Ok(())
        })
    }

    fn set_run_state(&self, run_state: RunState) {
        critical_section::with(|cs| self.run_state.borrow(cs).set(run_state));
    }
}

impl<const N: usize> Default for Tlc5940<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a started driver
///
/// Dropping the handle stops the serial engine.
pub struct Driver<'a, U: ExecutionUnit, const N: usize> {
    tlc: &'a Tlc5940<'a, N>,
    unit: Option<U>,
}

impl<'a, U: ExecutionUnit, const N: usize> Driver<'a, U, N> {
    /// Producer handle for this chain
    pub fn controller(&self) -> Controller<'a, N> {
        Controller::new(self.tlc)
    }

    pub fn is_running(&self) -> bool {
        self.unit.is_some()
    }

    /// Tear down the serial engine's execution unit.
    ///
    /// A frame in flight is finished first. Calling this again is a no-op.
    /// The reference clock is not stopped.
    pub fn stop(&mut self) {
        let Some(unit) = self.unit.take() else {
            return;
        };
        self.tlc.request_stop();
        self.tlc.set_run_state(RunState::Stopped);
        // Re-raises a panic from the engine.
        unit.join();

        #[cfg(feature = "esp32-log")]
        println!("[tlc5940] serial engine stopped");
    }
}

impl<U: ExecutionUnit, const N: usize> Drop for Driver<'_, U, N> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Serial engine and reference clock lines of a bound chip chain
pub struct Bound<'a, L: DigitalLine, const N: usize> {
    pub engine: SerialEngine<'a, L, N>,
    pub gs_clock: L,
    pub blank: L,
}

/// Validate `config`, claim `tlc` and the six pins (outputs driven low), and
/// build the serial engine without launching anything.
///
/// For platforms that run the engine on an execution unit of their own
/// choosing; [`start`] does the launching for you.
pub fn bind<'a, const N: usize, P>(
    tlc: &'a Tlc5940<'a, N>,
    config: &DriverConfig,
    pins: &mut P,
) -> Result<Bound<'a, P::Line, N>, StartError>
where
    P: PinBank,
{
    let window = config.validate::<P>(N)?;
    tlc.claim()?;
    tlc.store().set_window(window);

    let lines = SerialLines {
        sclk: pins.output(config.sclk),
        sin: pins.output(config.sin),
        xlat: pins.output(config.xlat),
        vprg: pins.output(config.vprg),
    };

    Ok(Bound {
        engine: SerialEngine::new(tlc, lines, config.engine),
        gs_clock: pins.output(config.gsclk),
        blank: pins.output(config.blank),
    })
}

/// Bring up a driver for the chip chain described by `config`.
///
/// Binds the chain, starts `clock` with GSCLK and BLANK, and launches the
/// serial engine on an execution unit from `executor`.
pub fn start<'a, const N: usize, P, C, E>(
    tlc: &'a Tlc5940<'a, N>,
    config: &DriverConfig,
    pins: &mut P,
    clock: C,
    executor: &E,
) -> Result<Driver<'a, E::Unit, N>, StartError>
where
    P: PinBank,
    P::Line: 'a,
    C: ReferenceClock<P::Line>,
    E: Executor<'a>,
{
    let Bound {
        engine,
        gs_clock,
        blank,
    } = bind(tlc, config, pins)?;

    if let Err(err) = clock.start(gs_clock, blank) {
        tlc.set_run_state(RunState::Stopped);
        return Err(err);
    }

    let Some(unit) = executor.launch(move || {
        engine.run();
    }) else {
        tlc.set_run_state(RunState::Stopped);
        return Err(StartError::NoExecutionUnit);
    };

    #[cfg(feature = "esp32-log")]
    println!(
        "[tlc5940] started: {} chips at offset {}",
        config.chip_count, config.base_offset
    );

    Ok(Driver {
        tlc,
        unit: Some(unit),
    })
}
