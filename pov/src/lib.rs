//! Rendering core of the spinning-blade volumetric display.
//!
//! Shapes are drawn in cylindrical coordinates into a [`WorkBuffer`], published
//! into one of two display buffers with the per-tier stagger of the blade
//! applied, and shifted out slice by slice in step with the rotation measured
//! by the hall sensor.
//!
//! A [`Display`] owns all of that state.  Splitting it yields the [`Canvas`]
//! for the main loop and the [`Scanout`] for the interrupt handlers.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod frame;
pub mod math;
pub mod raster;
pub mod rotation;
pub mod scan;
pub mod tiers;

#[cfg(test)]
mod testing;

pub use frame::{DisplacementTable, DisplayBuffer, FrameBuffers, Publisher, Scanner};
pub use raster::{HeightFunction, RasterError, Rasterizer, WorkBuffer};
pub use rotation::{
    RotationState, RotationSync, SliceTimer, Stopwatch, SyncError, SyncPhase, TimerMode,
};
pub use scan::{LedBus, PixelPusher};
pub use tiers::TierSet;

/// Angular positions per revolution.
pub const SLICES: usize = 128;
/// LEDs per tier along the blade, i.e. the number of radius cells.
pub const WIDTH: usize = 16;
/// Stacked LED tiers.
pub const HEIGHT: usize = 8;
/// First radius served by the outer shift register bank.
pub const LOW_BANK: usize = 8;

const _: () = assert!(LOW_BANK <= WIDTH);

/// All display state: work buffer, both display buffers and rotation timing.
pub struct Display {
    work: WorkBuffer,
    frames: FrameBuffers,
    sync: RotationSync,
}

impl Display {
    pub const fn new() -> Self {
        Self {
            work: WorkBuffer::new(),
            frames: FrameBuffers::new(),
            sync: RotationSync::new(),
        }
    }

    /// Hand out the drawing half and the scanning half.
    pub fn split<B, W, T>(
        &mut self,
        pusher: PixelPusher<B>,
        stopwatch: W,
        timer: T,
    ) -> (Canvas<'_>, Scanout<'_, B, W, T>)
    where
        B: LedBus,
        W: Stopwatch,
        T: SliceTimer,
    {
        let (publisher, scanner) = self.frames.split();
        (
            Canvas {
                work: &mut self.work,
                publisher,
            },
            Scanout {
                sync: &mut self.sync,
                scanner,
                pusher,
                stopwatch,
                timer,
            },
        )
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

/// Main loop side: draw, then publish once per frame.
pub struct Canvas<'a> {
    work: &'a mut WorkBuffer,
    publisher: Publisher<'a>,
}

impl<'a> Canvas<'a> {
    pub fn with_displacements(self, table: DisplacementTable) -> Self {
        let Canvas { work, publisher } = self;
        Canvas {
            work,
            publisher: publisher.with_displacements(table),
        }
    }

    pub fn rasterizer<'h>(&mut self) -> Rasterizer<'_, 'h> {
        Rasterizer::new(&mut *self.work)
    }

    pub fn work(&self) -> &WorkBuffer {
        &*self.work
    }

    /// Make everything drawn since the last call visible.
    pub fn publish(&mut self) {
        self.publisher.publish(self.work);
    }
}

/// Interrupt side: hall edges and slice ticks.
pub struct Scanout<'a, B, W, T> {
    sync: &'a mut RotationSync,
    scanner: Scanner<'a>,
    pusher: PixelPusher<B>,
    stopwatch: W,
    timer: T,
}

impl<'a, B, W, T> Scanout<'a, B, W, T>
where
    B: LedBus,
    W: Stopwatch,
    T: SliceTimer,
{
    pub fn on_hall_edge(&mut self) -> Result<Option<RotationState>, SyncError<T::Error>> {
        self.sync.on_edge(&mut self.stopwatch, &mut self.timer)
    }

    /// Push the slice under the cursor.  Does nothing until a revolution was
    /// measured.
    pub fn on_slice_tick(&mut self) -> Result<(), B::Error> {
        if self.sync.state().slice_us == 0 {
            return Ok(());
        }
        self.pusher.fire(self.sync.state_mut(), &self.scanner)
    }

    /// See [`RotationSync::check_stall`].
    pub fn check_stall(&mut self, limit_us: u32) -> Result<bool, T::Error> {
        self.sync
            .check_stall(&mut self.stopwatch, &mut self.timer, limit_us)
    }

    pub fn rotation(&self) -> RotationState {
        self.sync.state()
    }

    pub fn phase(&self) -> SyncPhase {
        self.sync.phase()
    }

    pub fn scanner(&self) -> Scanner<'a> {
        self.scanner
    }

    pub fn bus(&self) -> &B {
        self.pusher.bus()
    }

    pub fn stopwatch_mut(&mut self) -> &mut W {
        &mut self.stopwatch
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}
