#![no_std]
#![no_main]

use panic_rtt_target as _;
use rtt_target::rprintln;

use cortex_m::peripheral::DWT;
use stm32f3xx_hal::{pac, prelude::*};

#[cortex_m_rt::entry]
fn main() -> ! {
    rtt_target::rtt_init_print!();

    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();

    let clocks = rcc
        .cfgr
        .use_hse(8u32.MHz())
        .sysclk(48u32.MHz())
        .pclk1(24u32.MHz())
        .freeze(&mut flash.acr);

    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();
    let cycles_per_us = clocks.sysclk().0 / 1_000_000;

    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let hall = gpioa
        .pa1
        .into_pull_up_input(&mut gpioa.moder, &mut gpioa.pupdr);

    rprintln!("Waiting for the blade to turn...");

    let mut was_low = hall.is_low().unwrap();
    let mut last_edge: Option<u32> = None;
    loop {
        let low = hall.is_low().unwrap();
        if low && !was_low {
            let now = DWT::cycle_count();
            if let Some(last) = last_edge {
                let period_us = now.wrapping_sub(last) / cycles_per_us;
                rprintln!(
                    "{:7} us per revolution, {:5} us per slice",
                    period_us,
                    period_us / pov::SLICES as u32
                );
            }
            last_edge = Some(now);
        }
        was_low = low;
    }
}

#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    panic!("Hard Fault: {:#?}", ef);
}
