//! Stand-ins for the blade hardware in host tests.
use std::vec::Vec;

use crate::rotation::{SliceTimer, Stopwatch, TimerMode};
use crate::scan::LedBus;
use crate::tiers::TierSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Shift(u8),
    Latch,
}

#[derive(Debug, Default)]
pub struct RecordingBus {
    pub events: Vec<BusEvent>,
    /// Fail every operation once this many events were recorded.
    pub fail_after: Option<usize>,
}

impl RecordingBus {
    fn record(&mut self, event: BusEvent) -> Result<(), ()> {
        if self.fail_after.map_or(false, |n| self.events.len() >= n) {
            return Err(());
        }
        self.events.push(event);
        Ok(())
    }
}

impl LedBus for RecordingBus {
    type Error = ();

    fn shift(&mut self, cell: TierSet) -> Result<(), ()> {
        self.record(BusEvent::Shift(cell.bits()))
    }

    fn latch(&mut self) -> Result<(), ()> {
        self.record(BusEvent::Latch)
    }
}

/// Stopwatch reading a manually set clock.
#[derive(Debug, Default)]
pub struct FakeStopwatch {
    now: u32,
    started: u32,
    pub restarts: usize,
}

impl FakeStopwatch {
    pub fn set(&mut self, now_us: u32) {
        self.now = now_us;
    }
}

impl Stopwatch for FakeStopwatch {
    fn restart(&mut self) {
        self.started = self.now;
        self.restarts += 1;
    }

    fn elapsed_us(&mut self) -> u32 {
        self.now.wrapping_sub(self.started)
    }
}

#[derive(Debug, Default)]
pub struct FakeTimer {
    pub armed: Vec<(u32, TimerMode)>,
    pub cancelled: usize,
    pub fail: bool,
}

impl SliceTimer for FakeTimer {
    type Error = ();

    fn arm(&mut self, period_us: u32, mode: TimerMode) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.armed.push((period_us, mode));
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), ()> {
        self.cancelled += 1;
        Ok(())
    }
}
