//! Rotation tracking from the hall sensor.
use crate::SLICES;

/// Free-running elapsed-time counter.
pub trait Stopwatch {
    /// Start counting from zero.
    fn restart(&mut self);

    /// Microseconds since the last [`restart`](Stopwatch::restart).
    fn elapsed_us(&mut self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    OneShot,
    Periodic,
}

/// Timer driving the slice interrupt.
pub trait SliceTimer {
    type Error;

    /// (Re)start the timer to fire after `period_us`, replacing any running
    /// schedule.
    fn arm(&mut self, period_us: u32, mode: TimerMode) -> Result<(), Self::Error>;

    fn cancel(&mut self) -> Result<(), Self::Error>;
}

/// Measured rotation timing and the slice currently being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationState {
    /// Duration of the last full revolution.
    pub rotation_us: u32,
    pub slice_us: u32,
    /// Next slice to push.
    pub cursor: usize,
}

impl RotationState {
    pub const fn new() -> Self {
        Self {
            rotation_us: 0,
            slice_us: 0,
            cursor: 0,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % SLICES;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No edge seen yet.
    Uncalibrated,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError<E> {
    /// The revolution was shorter than one microsecond per slice; the
    /// previous timing is kept.
    PeriodTooShort { rotation_us: u32 },
    Timer(E),
}

/// Hall sensor edge handler.
///
/// Every revolution re-measures the period, snaps the cursor back to slice 0
/// and re-arms the slice timer, so timing errors never outlive one turn.
pub struct RotationSync {
    phase: SyncPhase,
    state: RotationState,
}

impl RotationSync {
    pub const fn new() -> Self {
        Self {
            phase: SyncPhase::Uncalibrated,
            state: RotationState::new(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut RotationState {
        &mut self.state
    }

    /// Handle a falling edge of the hall sensor.
    ///
    /// Returns the new timing once a full revolution has been measured.
    pub fn on_edge<W, T>(
        &mut self,
        stopwatch: &mut W,
        timer: &mut T,
    ) -> Result<Option<RotationState>, SyncError<T::Error>>
    where
        W: Stopwatch,
        T: SliceTimer,
    {
        match self.phase {
            SyncPhase::Uncalibrated => {
                stopwatch.restart();
                self.phase = SyncPhase::Running;
                Ok(None)
            }
            SyncPhase::Running => {
                let rotation_us = stopwatch.elapsed_us();
                stopwatch.restart();

                let slice_us = rotation_us / SLICES as u32;
                if slice_us == 0 {
                    return Err(SyncError::PeriodTooShort { rotation_us });
                }

                self.state = RotationState {
                    rotation_us,
                    slice_us,
                    cursor: 0,
                };
                timer
                    .arm(slice_us, TimerMode::Periodic)
                    .map_err(SyncError::Timer)?;
                Ok(Some(self.state))
            }
        }
    }

    /// Stop the slice timer if no edge arrived for `limit_us`.
    ///
    /// A stalled rotor would otherwise keep one slice lit.  Returns `true` if
    /// the display was stopped; the next edge starts calibrating again.
    pub fn check_stall<W, T>(
        &mut self,
        stopwatch: &mut W,
        timer: &mut T,
        limit_us: u32,
    ) -> Result<bool, T::Error>
    where
        W: Stopwatch,
        T: SliceTimer,
    {
        if self.phase == SyncPhase::Uncalibrated || stopwatch.elapsed_us() <= limit_us {
            return Ok(false);
        }
        timer.cancel()?;
        self.phase = SyncPhase::Uncalibrated;
        self.state = RotationState::new();
        Ok(true)
    }
}

impl Default for RotationSync {
    fn default() -> Self {
        Self::new()
    }
}
