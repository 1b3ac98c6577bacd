//! Pushing slices onto the blade's LED bus.
use crate::frame::Scanner;
use crate::rotation::RotationState;
use crate::tiers::TierSet;
use crate::{LOW_BANK, WIDTH};

/// Parallel LED bus: one data line per tier, a shared clock and a latch.
pub trait LedBus {
    type Error;

    /// Put `cell` on the data lines and pulse the clock once.
    fn shift(&mut self, cell: TierSet) -> Result<(), Self::Error>;

    /// Pulse the latch, moving everything shifted so far to the LEDs.
    fn latch(&mut self) -> Result<(), Self::Error>;
}

pub struct PixelPusher<B> {
    bus: B,
}

impl<B: LedBus> PixelPusher<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Shift out one slice and latch it.
    ///
    /// The shift register chain is wired outer bank first: radii
    /// `LOW_BANK..WIDTH` go out in ascending order, then `LOW_BANK - 1` down
    /// to `0`.
    pub fn push_slice(&mut self, cells: &[TierSet; WIDTH]) -> Result<(), B::Error> {
        for cell in &cells[LOW_BANK..] {
            self.bus.shift(*cell)?;
        }
        for cell in cells[..LOW_BANK].iter().rev() {
            self.bus.shift(*cell)?;
        }
        self.bus.latch()
    }

    /// Show the slice under the cursor and move the cursor on.
    pub fn fire(
        &mut self,
        state: &mut RotationState,
        frames: &Scanner<'_>,
    ) -> Result<(), B::Error> {
        let cells = frames.slice(state.cursor);
        self.push_slice(&cells)?;
        state.advance();
        Ok(())
    }
}
