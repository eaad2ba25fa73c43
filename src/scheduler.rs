//! Update scheduler
//!
//! A two-bit lock-free flag register. Producers only ever OR bits in; the
//! serial engine only ever clears the bit of the frame kind it is about to
//! send.

use core::sync::atomic::{AtomicU8, Ordering};

/// Kind of frame the engine can transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// 12-bit brightness values
    Grayscale = UpdateFlags::GRAYSCALE,
    /// 6-bit current trim values
    DotCorrection = UpdateFlags::DOT_CORRECTION,
}

impl FrameKind {
    /// Bit used for this kind in [`UpdateFlags`]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

/// Pending-update bitset shared between producers and the engine
#[derive(Debug, Default)]
pub struct UpdateFlags {
    bits: AtomicU8,
}

impl UpdateFlags {
    pub const GRAYSCALE: u8 = 0b01;
    pub const DOT_CORRECTION: u8 = 0b10;

    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Request a transmission of `kind`.
    ///
    /// Raising an already raised bit is a no-op: several requests made before
    /// the engine services them collapse into one frame.
    pub fn raise(&self, kind: FrameKind) {
        self.bits.fetch_or(kind.bit(), Ordering::Release);
    }

    /// Clear the bit for `kind` and report whether it was set.
    ///
    /// The engine calls this before copying the pending buffer, so a request
    /// raised during the copy survives for the next iteration.
    pub fn take(&self, kind: FrameKind) -> bool {
        self.bits.fetch_and(!kind.bit(), Ordering::AcqRel) & kind.bit() != 0
    }

    /// Snapshot of the raw bits
    pub fn pending(&self) -> u8 {
        self.bits.load(Ordering::Acquire)
    }

    /// Check whether `kind` is currently requested
    pub fn is_pending(&self, kind: FrameKind) -> bool {
        self.pending() & kind.bit() != 0
    }
}
