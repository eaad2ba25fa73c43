//! Channel store (pending side of the double buffers)
//!
//! Producers write individual channel values here at any time. The serial
//! engine takes a full snapshot into its own active buffers right before a
//! frame goes out. There is deliberately no lock between the two: a snapshot
//! taken while a producer is writing may mix old and new values across
//! channels, but every single cell is always a whole value.

use core::sync::atomic::{AtomicU8, AtomicU16, AtomicUsize, Ordering};

/// Outputs per TLC5940 chip
pub const CHANNELS_PER_CHIP: usize = 16;

/// Largest grayscale value (12 bits)
pub const MAX_GRAYSCALE: u16 = 4095;

/// Largest dot-correction value (6 bits)
pub const MAX_DOT_CORRECTION: u8 = 63;

/// Externally owned grayscale backing store.
///
/// Several driver instances (or a driver and other code) can address
/// disjoint windows of one of these through their base offsets.
pub type SharedGrayscale<const N: usize> = [AtomicU16; N];

/// Create a zeroed [`SharedGrayscale`], usable in a `static`
pub const fn shared_grayscale<const N: usize>() -> SharedGrayscale<N> {
    [const { AtomicU16::new(0) }; N]
}

/// The slice of channels this driver instance addresses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// Number of channels in the chip chain (`chip_count * 16`)
    pub total: usize,
    /// Index of channel 0 inside the backing grayscale cells
    pub base_offset: usize,
}

impl Window {
    /// Part of `cells` covered by the window, clipped to the backing extent
    fn clip<T>(self, cells: &[T]) -> &[T] {
        let start = self.base_offset.min(cells.len());
        let end = self.base_offset.saturating_add(self.total).min(cells.len());
        &cells[start..end]
    }
}

#[derive(Debug)]
enum GrayscaleCells<'a, const N: usize> {
    Owned([AtomicU16; N]),
    Shared(&'a [AtomicU16]),
}

impl<const N: usize> GrayscaleCells<'_, N> {
    fn as_slice(&self) -> &[AtomicU16] {
        match self {
            Self::Owned(cells) => cells,
            Self::Shared(cells) => cells,
        }
    }
}

/// Pending grayscale and dot-correction buffers of one chip chain
///
/// `N` is the capacity in channels. Until a window is published every write
/// is rejected.
#[derive(Debug)]
pub struct ChannelStore<'a, const N: usize> {
    grayscale: GrayscaleCells<'a, N>,
    dot_correction: [AtomicU8; N],
    total: AtomicUsize,
    base_offset: AtomicUsize,
}

impl<'a, const N: usize> ChannelStore<'a, N> {
    /// Store owning its grayscale cells
    pub const fn new() -> Self {
        Self::with_cells(GrayscaleCells::Owned(shared_grayscale()))
    }

    /// Store whose pending grayscale cells live in `cells`
    pub const fn with_shared_grayscale(cells: &'a [AtomicU16]) -> Self {
        Self::with_cells(GrayscaleCells::Shared(cells))
    }

    const fn with_cells(grayscale: GrayscaleCells<'a, N>) -> Self {
        Self {
            grayscale,
            dot_correction: [const { AtomicU8::new(0) }; N],
            total: AtomicUsize::new(0),
            base_offset: AtomicUsize::new(0),
        }
    }

    /// Publish the channel window. Called once by bootstrap.
    pub(crate) fn set_window(&self, window: Window) {
        self.base_offset
            .store(window.base_offset, Ordering::Relaxed);
        self.total.store(window.total, Ordering::Release);
    }

    /// Currently published window
    pub fn window(&self) -> Window {
        let total = self.total.load(Ordering::Acquire);
        Window {
            total,
            base_offset: self.base_offset.load(Ordering::Relaxed),
        }
    }

    /// Number of channels in the chain, zero before start
    pub fn total_channels(&self) -> usize {
        self.window().total
    }

    fn grayscale_window(&self) -> &[AtomicU16] {
        self.window().clip(self.grayscale.as_slice())
    }

    /// Dot-correction cells are always owned, so the base offset does not
    /// apply to them.
    fn dot_correction_window(&self) -> &[AtomicU8] {
        let window = Window {
            total: self.total_channels(),
            base_offset: 0,
        };
        window.clip(&self.dot_correction)
    }

    /// Write one pending grayscale value.
    ///
    /// Returns `false` (and changes nothing) if the channel is outside the
    /// window or `value` exceeds [`MAX_GRAYSCALE`].
    pub fn set_grayscale(&self, channel: usize, value: u16) -> bool {
        if value > MAX_GRAYSCALE {
            return false;
        }
        let Some(cell) = self.grayscale_window().get(channel) else {
            return false;
        };
        cell.store(value, Ordering::Relaxed);
        true
    }

    /// Fill every pending grayscale value of the window.
    ///
    /// Returns `false` if `value` is out of range or the window is empty.
    pub fn fill_grayscale(&self, value: u16) -> bool {
        if value > MAX_GRAYSCALE {
            return false;
        }
        let cells = self.grayscale_window();
        for cell in cells {
            cell.store(value, Ordering::Relaxed);
        }
        !cells.is_empty()
    }

    /// Write one pending dot-correction value
    pub fn set_dot_correction(&self, channel: usize, value: u8) -> bool {
        if value > MAX_DOT_CORRECTION {
            return false;
        }
        let Some(cell) = self.dot_correction_window().get(channel) else {
            return false;
        };
        cell.store(value, Ordering::Relaxed);
        true
    }

    /// Fill every pending dot-correction value of the window
    pub fn fill_dot_correction(&self, value: u8) -> bool {
        if value > MAX_DOT_CORRECTION {
            return false;
        }
        let cells = self.dot_correction_window();
        for cell in cells {
            cell.store(value, Ordering::Relaxed);
        }
        !cells.is_empty()
    }

    /// Pending grayscale value of `channel`
    pub fn grayscale(&self, channel: usize) -> Option<u16> {
        self.grayscale_window()
            .get(channel)
            .map(|cell| cell.load(Ordering::Relaxed))
    }

    /// Pending dot-correction value of `channel`
    pub fn dot_correction(&self, channel: usize) -> Option<u8> {
        self.dot_correction_window()
            .get(channel)
            .map(|cell| cell.load(Ordering::Relaxed))
    }

    /// Copy the pending grayscale window into `active`.
    ///
    /// Channels the backing cells do not reach are sent as zero.
    pub fn snapshot_grayscale(&self, active: &mut [u16]) {
        let cells = self.grayscale_window();
        for (i, slot) in active.iter_mut().enumerate() {
            *slot = cells.get(i).map_or(0, |cell| cell.load(Ordering::Relaxed));
        }
    }

    /// Copy the pending dot-correction window into `active`
    pub fn snapshot_dot_correction(&self, active: &mut [u8]) {
        let cells = self.dot_correction_window();
        for (i, slot) in active.iter_mut().enumerate() {
            *slot = cells.get(i).map_or(0, |cell| cell.load(Ordering::Relaxed));
        }
    }
}

impl<const N: usize> Default for ChannelStore<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
