#![no_std]
#![no_main]

use panic_rtt_target as _;
use rtt_target::rprintln;

use pov::{PixelPusher, TierSet, HEIGHT, WIDTH};
use stm32f3xx_hal::{pac, prelude::*};

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_target::rtt_init_print!();

    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();

    let clocks = rcc
        .cfgr
        .use_hse(8u32.MHz())
        .sysclk(48u32.MHz())
        .pclk1(24u32.MHz())
        .freeze(&mut flash.acr);

    let mut delay = stm32f3xx_hal::delay::Delay::new(cp.SYST, clocks);

    let mut gpiob = dp.GPIOB.split(&mut rcc.ahb);
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);

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
    bus.reset().unwrap();
    let mut pusher = PixelPusher::new(bus);

    // One LED at a time, tier by tier from the hub outwards.
    loop {
        for tier in 0..HEIGHT {
            for radius in 0..WIDTH {
                rprintln!("tier {} radius {:2}", tier, radius);

                let mut cells = [TierSet::EMPTY; WIDTH];
                cells[radius] = TierSet::single(tier);
                pusher.push_slice(&cells).unwrap();

                delay.delay_ms(150u16);
            }
        }
    }
}

#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    panic!("Hard Fault: {:#?}", ef);
}
