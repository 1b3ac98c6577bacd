use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::interrupt::Mutex;
use rtt_target::rprintln;

use crate::blade;

/// Frame ticks between two reports.
const REPORT_TICKS: u32 = 20 * crate::FRAME_RATE_HZ;

/// Event counts from the interrupt handlers and the animation task.
pub struct Counters {
    pub revolutions: AtomicU32,
    /// Hall edges too close together to be a revolution.
    pub sync_errors: AtomicU32,
    pub rejected_writes: AtomicU32,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            revolutions: AtomicU32::new(0),
            sync_errors: AtomicU32::new(0),
            rejected_writes: AtomicU32::new(0),
        }
    }
}

/// Watches for a stalled blade on every frame tick and periodically reports
/// rotation timing and error counts.
pub async fn telemetry_task(
    blade: &Mutex<RefCell<Option<blade::Scanout>>>,
    frame_ticks: &AtomicU32,
    counters: &Counters,
) {
    let mut last_tick = frame_ticks.load(Ordering::Relaxed);
    let mut since_report = 0;
    loop {
        let tick = frame_ticks.load(Ordering::Relaxed);
        if tick == last_tick {
            cassette::yield_now().await;
            continue;
        }
        last_tick = tick;

        let (stalled, rotation) = cortex_m::interrupt::free(|cs| {
            match blade.borrow(cs).borrow_mut().as_mut() {
                Some(scanout) => (
                    scanout.check_stall(crate::STALL_LIMIT_US).unwrap(),
                    Some(scanout.rotation()),
                ),
                None => (false, None),
            }
        });
        if stalled {
            rprintln!("Blade stalled, waiting for rotation.");
        }

        since_report += 1;
        if since_report == REPORT_TICKS {
            since_report = 0;
            if let Some(rotation) = rotation {
                rprintln!(
                    "Rotation: {} us ({} us/slice), {} revolutions, {} sync errors, {} rejected writes",
                    rotation.rotation_us,
                    rotation.slice_us,
                    counters.revolutions.load(Ordering::Relaxed),
                    counters.sync_errors.load(Ordering::Relaxed),
                    counters.rejected_writes.swap(0, Ordering::Relaxed),
                );
            }
        }

        cassette::yield_now().await;
    }
}
