#![no_std]
#![no_main]

use panic_rtt_target as _;
use rtt_target::rprintln;

use stm32f3xx_hal::{self as hal, interrupt, pac, prelude::*};

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::NVIC;

mod animation;
mod blade;
mod telemetry;

/// Frames rendered per second.
pub const FRAME_RATE_HZ: u32 = 10;

/// Without a hall edge for this long the blade is considered stopped.
pub const STALL_LIMIT_US: u32 = 500_000;

/// Everything the slice and hall interrupts touch.
static BLADE: Mutex<RefCell<Option<blade::Scanout>>> = Mutex::new(RefCell::new(None));

/// Hall sensor input, kept around to clear its EXTI line.
static HALL: Mutex<RefCell<Option<hal::gpio::gpioa::PA1<hal::gpio::Input>>>> =
    Mutex::new(RefCell::new(None));

/// Set by SysTick once per frame, taken by the animation task.
static FRAME_DUE: AtomicBool = AtomicBool::new(false);

static FRAME_TICKS: AtomicU32 = AtomicU32::new(0);

static COUNTERS: telemetry::Counters = telemetry::Counters::new();

trait ResultWarn {
    fn err_warn(self, msg: &str);
}

impl<T, E: core::fmt::Debug> ResultWarn for Result<T, E> {
    fn err_warn(self, msg: &str) {
        match self {
            Ok(_) => (),
            Err(e) => {
                rprintln!("Error: {} ({:?})", msg, e);
            }
        }
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_target::rtt_init_print!();

    let mut dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    /*
     * Clocks
     * ======
     */

    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();
    let mut syscfg = dp.SYSCFG.constrain(&mut rcc.apb2);

    let clocks = rcc
        .cfgr
        .use_hse(8u32.MHz())
        .sysclk(48u32.MHz())
        .pclk1(24u32.MHz())
        .freeze(&mut flash.acr);

    // Rotation timing runs off the cycle counter.
    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();

    rprintln!("Shapedriver");
    rprintln!("");

    /*
     * GPIO blocks
     * ===========
     */

    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let mut gpiob = dp.GPIOB.split(&mut rcc.ahb);
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);

    /*
     * Blade shift registers
     * =====================
     */

    let data_pins = [
        gpiod
            .pd0
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd1
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd2
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd3
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd4
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd5
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd6
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
        gpiod
            .pd7
            .into_push_pull_output(&mut gpiod.moder, &mut gpiod.otyper)
            .downgrade(),
    ];
    let clock_pin = gpiob
        .pb13
        .into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper);
    let latch_pin = gpiob
        .pb12
        .into_push_pull_output(&mut gpiob.moder, &mut gpiob.otyper);

    let mut bus = blade_bus::BladeBus::new(data_pins, clock_pin, latch_pin);
    bus.reset().err_warn("Failed resetting blade bus");
    // Whatever the registers held at power-up stays lit until the first slice.
    bus.blank(pov::WIDTH).unwrap();

    rprintln!("Blade bus initialized.");

    /*
     * Display state and slice timer
     * =============================
     */

    let display = cortex_m::singleton!(: pov::Display = pov::Display::new()).unwrap();

    let tim3 = hal::timer::Timer::new(dp.TIM3, clocks, &mut rcc.apb1);
    let push_timer = blade::PushTimer::new(tim3);
    let timer_interrupt = push_timer.interrupt();

    let (canvas, scanout) = display.split(
        pov::PixelPusher::new(bus),
        blade::CycleStopwatch::new(clocks.sysclk().0),
        push_timer,
    );

    cortex_m::interrupt::free(|cs| {
        BLADE.borrow(cs).replace(Some(scanout));
    });

    rprintln!("Display initialized.");

    /*
     * Hall sensor
     * ===========
     */

    let mut hall = gpioa
        .pa1
        .into_pull_up_input(&mut gpioa.moder, &mut gpioa.pupdr);
    syscfg.select_exti_interrupt_source(&hall);
    hall.trigger_on_edge(&mut dp.EXTI, hal::gpio::Edge::Falling);
    hall.enable_interrupt(&mut dp.EXTI);
    let hall_interrupt = hall.interrupt();

    cortex_m::interrupt::free(|cs| {
        HALL.borrow(cs).replace(Some(hall));
    });

    // SAFETY: Both handlers only touch state behind the mutexes above.
    unsafe {
        NVIC::unmask(timer_interrupt);
        NVIC::unmask(hall_interrupt);
    }

    rprintln!("Hall sensor initialized.");

    /*
     * Frame tick
     * ==========
     */

    let mut syst = cp.SYST;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(clocks.sysclk().0 / FRAME_RATE_HZ - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();

    rprintln!("Ready.");
    rprintln!("");

    let animation_task =
        animation::animation_task(canvas, &FRAME_DUE, &COUNTERS.rejected_writes);
    futures_util::pin_mut!(animation_task);

    let telemetry_task = telemetry::telemetry_task(&BLADE, &FRAME_TICKS, &COUNTERS);
    futures_util::pin_mut!(telemetry_task);

    let all_tasks = async {
        futures_util::join!(animation_task, telemetry_task);
    };
    futures_util::pin_mut!(all_tasks);

    let c = cassette::Cassette::new(all_tasks);
    c.block_on();
    unreachable!();
}

#[interrupt]
fn EXTI1() {
    cortex_m::interrupt::free(|cs| {
        if let Some(hall) = HALL.borrow(cs).borrow_mut().as_mut() {
            hall.clear_interrupt();
        }

        if let Some(blade) = BLADE.borrow(cs).borrow_mut().as_mut() {
            match blade.on_hall_edge() {
                Ok(Some(_)) => {
                    COUNTERS.revolutions.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => (),
                Err(pov::SyncError::PeriodTooShort { .. }) => {
                    COUNTERS.sync_errors.fetch_add(1, Ordering::Relaxed);
                }
                Err(pov::SyncError::Timer(e)) => panic!("Failed arming slice timer: {:?}", e),
            }
        }
    });
}

#[interrupt]
fn TIM3() {
    cortex_m::interrupt::free(|cs| {
        if let Some(blade) = BLADE.borrow(cs).borrow_mut().as_mut() {
            blade.timer_mut().acknowledge();
            blade.on_slice_tick().unwrap();
        }
    });
}

#[cortex_m_rt::exception]
fn SysTick() {
    FRAME_TICKS.fetch_add(1, Ordering::Relaxed);
    FRAME_DUE.store(true, Ordering::Release);
}

#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    panic!("Hard Fault: {:#?}", ef);
}
