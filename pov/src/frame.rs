//! Double-buffered frames as seen by the blade.
//!
//! The main loop fills the inactive [`DisplayBuffer`] from a [`WorkBuffer`]
//! and flips a single flag; the slice interrupt only ever reads through that
//! flag.  Cells are atomics, so the hand-over needs no locking: the flag is
//! stored with `Release` after the last cell and loaded with `Acquire` before
//! the first one.
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::raster::WorkBuffer;
use crate::tiers::TierSet;
use crate::{HEIGHT, SLICES, WIDTH};

/// Angular offset, in slices, of each tier's LEDs relative to the hall
/// sensor reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplacementTable {
    offsets: [usize; HEIGHT],
}

impl DisplacementTable {
    /// All tiers mounted in line with the reference.
    pub const ALIGNED: Self = Self {
        offsets: [0; HEIGHT],
    };

    /// Build a table from signed offsets; they are reduced modulo `SLICES`.
    pub fn new(offsets: [i32; HEIGHT]) -> Self {
        let mut table = Self::ALIGNED;
        for (slot, offset) in table.offsets.iter_mut().zip(offsets) {
            *slot = offset.rem_euclid(SLICES as i32) as usize;
        }
        table
    }

    /// Stagger of the tiers on the built blade.
    ///
    /// The eight LED columns sit on arms spread in eighths of a turn, each
    /// trimmed by a few slices after measuring the assembled rotor.
    pub fn blade_stagger() -> Self {
        const S: i32 = SLICES as i32;
        Self::new([
            0,
            4 * S / 8,
            7 * S / 8 - 5,
            3 * S / 8 - 8,
            6 * S / 8 - 6,
            2 * S / 8 - 7,
            5 * S / 8 - 7,
            S / 8 - 8,
        ])
    }

    #[inline]
    pub fn offset(&self, tier: usize) -> usize {
        self.offsets[tier]
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const DARK_CELL: AtomicU8 = AtomicU8::new(0);
#[allow(clippy::declare_interior_mutable_const)]
const DARK_SLICE: [AtomicU8; WIDTH] = [DARK_CELL; WIDTH];

/// One frame in bus order, indexed by `[slice][radius]`.
pub struct DisplayBuffer {
    cells: [[AtomicU8; WIDTH]; SLICES],
}

impl DisplayBuffer {
    pub const fn new() -> Self {
        Self {
            cells: [DARK_SLICE; SLICES],
        }
    }

    #[inline]
    pub fn cell(&self, slice: usize, radius: usize) -> TierSet {
        TierSet::from_bits(self.cells[slice][radius].load(Ordering::Relaxed))
    }

    /// Copy out all radius cells of one slice.
    pub fn slice(&self, slice: usize) -> [TierSet; WIDTH] {
        let row = &self.cells[slice];
        core::array::from_fn(|radius| TierSet::from_bits(row[radius].load(Ordering::Relaxed)))
    }

    #[inline]
    fn store(&self, slice: usize, radius: usize, tiers: TierSet) {
        self.cells[slice][radius].store(tiers.bits(), Ordering::Relaxed);
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The pair of display buffers and the flag selecting the active one.
pub struct FrameBuffers {
    buffers: [DisplayBuffer; 2],
    /// `false` while buffer 0 is active.
    second_active: AtomicBool,
}

impl FrameBuffers {
    pub const fn new() -> Self {
        Self {
            buffers: [DisplayBuffer::new(), DisplayBuffer::new()],
            second_active: AtomicBool::new(false),
        }
    }

    /// Split into the single writer and the reader side.
    pub fn split(&mut self) -> (Publisher<'_>, Scanner<'_>) {
        let frames = &*self;
        (
            Publisher {
                frames,
                displacements: None,
            },
            Scanner { frames },
        )
    }

    #[inline]
    fn active_index(&self) -> usize {
        self.second_active.load(Ordering::Acquire) as usize
    }
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer side of [`FrameBuffers`], owned by the main loop.
pub struct Publisher<'a> {
    frames: &'a FrameBuffers,
    displacements: Option<DisplacementTable>,
}

impl<'a> Publisher<'a> {
    /// Use `table` instead of the built blade's stagger.
    pub fn with_displacements(mut self, table: DisplacementTable) -> Self {
        self.displacements = Some(table);
        self
    }

    /// Stagger applied on publish; computed on first use.
    pub fn displacements(&mut self) -> &DisplacementTable {
        self.displacements
            .get_or_insert_with(DisplacementTable::blade_stagger)
    }

    /// Copy `work` into the inactive buffer, shifting every tier by its
    /// displacement, then clear `work` and make the new frame active.
    pub fn publish(&mut self, work: &mut WorkBuffer) {
        let table = *self.displacements();
        let target = 1 - self.frames.active_index();
        let buffer = &self.frames.buffers[target];
        let rows = work.rows();

        for slice in 0..SLICES {
            for radius in 0..WIDTH {
                let mut cell = TierSet::EMPTY;
                for tier in 0..HEIGHT {
                    let source = (slice + table.offset(tier)) % SLICES;
                    if rows[source][radius].contains(tier) {
                        cell.insert(tier);
                    }
                }
                buffer.store(slice, radius, cell);
            }
        }

        work.clear();
        self.frames
            .second_active
            .store(target == 1, Ordering::Release);
    }
}

/// Reader side of [`FrameBuffers`], used from the slice interrupt.
#[derive(Clone, Copy)]
pub struct Scanner<'a> {
    frames: &'a FrameBuffers,
}

impl<'a> Scanner<'a> {
    /// Index (0 or 1) of the buffer currently shown.
    pub fn active_index(&self) -> usize {
        self.frames.active_index()
    }

    pub fn active(&self) -> &'a DisplayBuffer {
        &self.frames.buffers[self.frames.active_index()]
    }

    /// Radius cells of `slice` in the active frame.
    pub fn slice(&self, slice: usize) -> [TierSet; WIDTH] {
        self.active().slice(slice)
    }
}
