use cortex_m::peripheral::DWT;
use stm32f3xx_hal::gpio::{gpiob, gpiod, Output, PushPull};
use stm32f3xx_hal::prelude::*;
use stm32f3xx_hal::time::duration::Microseconds;
use stm32f3xx_hal::{pac, timer};

use pov::{SliceTimer, Stopwatch, TimerMode};

pub type DataPin = gpiod::PDx<Output<PushPull>>;
pub type ClockPin = gpiob::PB13<Output<PushPull>>;
pub type LatchPin = gpiob::PB12<Output<PushPull>>;

pub type Bus = blade_bus::BladeBus<DataPin, ClockPin, LatchPin>;
pub type Scanout = pov::Scanout<'static, Bus, CycleStopwatch, PushTimer>;

/// Stopwatch on the DWT cycle counter.
///
/// The counter wraps after 2^32 cycles (about 89 s at 48 MHz), far beyond any
/// revolution the blade makes.
pub struct CycleStopwatch {
    start: u32,
    cycles_per_us: u32,
}

impl CycleStopwatch {
    /// The cycle counter must already be enabled.
    pub fn new(sysclk_hz: u32) -> Self {
        Self {
            start: DWT::cycle_count(),
            cycles_per_us: sysclk_hz / 1_000_000,
        }
    }
}

impl Stopwatch for CycleStopwatch {
    fn restart(&mut self) {
        self.start = DWT::cycle_count();
    }

    fn elapsed_us(&mut self) -> u32 {
        DWT::cycle_count().wrapping_sub(self.start) / self.cycles_per_us
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Period is zero or longer than [`PushTimer::MAX_PERIOD_US`]
    PeriodOutOfRange(u32),
}

/// TIM3 update interrupt as the slice timer.
pub struct PushTimer {
    timer: timer::Timer<pac::TIM3>,
    mode: TimerMode,
}

impl PushTimer {
    /// A slice longer than this means the blade is barely turning.
    pub const MAX_PERIOD_US: u32 = 1_000_000;

    pub fn new(mut timer: timer::Timer<pac::TIM3>) -> Self {
        timer.enable_interrupt(timer::Event::Update);
        Self {
            timer,
            mode: TimerMode::Periodic,
        }
    }

    pub fn interrupt(&self) -> pac::Interrupt {
        self.timer.interrupt()
    }

    /// Clear the pending update.  Must be called from the interrupt handler.
    pub fn acknowledge(&mut self) {
        self.timer.clear_event(timer::Event::Update);
        if self.mode == TimerMode::OneShot {
            self.timer.stop();
        }
    }
}

impl SliceTimer for PushTimer {
    type Error = TimerError;

    fn arm(&mut self, period_us: u32, mode: TimerMode) -> Result<(), TimerError> {
        if period_us == 0 || period_us > Self::MAX_PERIOD_US {
            return Err(TimerError::PeriodOutOfRange(period_us));
        }
        self.mode = mode;
        self.timer.start(Microseconds(period_us));
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), TimerError> {
        self.timer.stop();
        self.timer.clear_event(timer::Event::Update);
        Ok(())
    }
}
