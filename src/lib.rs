#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod color;
pub mod config;
pub mod controller;
pub mod driver;
pub mod engine;
pub mod error;
pub mod executor;
pub mod line;
pub mod reference_clock;
pub mod scheduler;
pub mod store;

pub use color::{Rgb12, expand_to_12bit};
pub use config::{DriverConfig, MAX_CHIPS};
pub use controller::Controller;
pub use driver::{Bound, Driver, FrameCounters, RunState, Tlc5940, bind, start};
pub use engine::{EngineConfig, ModeQuirk, SerialEngine, SerialLines, Serviced};
pub use error::StartError;
pub use executor::{ExecutionUnit, Executor};
#[cfg(any(test, feature = "std"))]
pub use executor::{ScopedExecutor, ThreadExecutor};
pub use line::{DigitalLine, HalLine, PinBank};
pub use reference_clock::{GrayscaleClock, ReferenceClock, SoftReferenceClock};
pub use scheduler::{FrameKind, UpdateFlags};
pub use store::{
    CHANNELS_PER_CHIP, ChannelStore, MAX_DOT_CORRECTION, MAX_GRAYSCALE, SharedGrayscale, Window,
    shared_grayscale,
};

pub use embassy_time::Duration;
pub use smart_leds::RGB8;
