use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rtt_target::rprintln;

use pov::{math, Canvas, HeightFunction, RasterError, WIDTH};

/// Frames each mode stays on before switching to the next.
pub const MODE_FRAMES: u32 = 15 * crate::FRAME_RATE_HZ;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Concentric rings riding a travelling wave.
    Ripple,
    /// Two nested wire cubes.
    Cube,
    /// Filled disc growing to the rim.
    GrowingDisc,
    /// Parallel lines riding a travelling wave.
    WaveLines,
}

impl Mode {
    fn next(self) -> Self {
        match self {
            Mode::Ripple => Mode::Cube,
            Mode::Cube => Mode::GrowingDisc,
            Mode::GrowingDisc => Mode::WaveLines,
            Mode::WaveLines => Mode::Ripple,
        }
    }

    fn wave_frequency(self) -> f32 {
        match self {
            Mode::WaveLines => 2.0,
            _ => 4.0,
        }
    }
}

/// Outer cube edge length 20 spanning all tiers, inner one edge length 10.
const CUBE_EDGES: [[f32; 6]; 24] = [
    [10.0, 10.0, 0.0, 10.0, -10.0, 0.0],
    [10.0, -10.0, 0.0, -10.0, -10.0, 0.0],
    [-10.0, -10.0, 0.0, -10.0, 10.0, 0.0],
    [-10.0, 10.0, 0.0, 10.0, 10.0, 0.0],
    [10.0, 10.0, 7.0, 10.0, -10.0, 7.0],
    [10.0, -10.0, 7.0, -10.0, -10.0, 7.0],
    [-10.0, -10.0, 7.0, -10.0, 10.0, 7.0],
    [-10.0, 10.0, 7.0, 10.0, 10.0, 7.0],
    [10.0, 10.0, 0.0, 10.0, 10.0, 7.0],
    [10.0, -10.0, 0.0, 10.0, -10.0, 7.0],
    [-10.0, -10.0, 0.0, -10.0, -10.0, 7.0],
    [-10.0, 10.0, 0.0, -10.0, 10.0, 7.0],
    [5.0, 5.0, 2.0, 5.0, -5.0, 2.0],
    [5.0, -5.0, 2.0, -5.0, -5.0, 2.0],
    [-5.0, -5.0, 2.0, -5.0, 5.0, 2.0],
    [-5.0, 5.0, 2.0, 5.0, 5.0, 2.0],
    [5.0, 5.0, 5.0, 5.0, -5.0, 5.0],
    [5.0, -5.0, 5.0, -5.0, -5.0, 5.0],
    [-5.0, -5.0, 5.0, -5.0, 5.0, 5.0],
    [-5.0, 5.0, 5.0, 5.0, 5.0, 5.0],
    [5.0, 5.0, 2.0, 5.0, 5.0, 5.0],
    [5.0, -5.0, 2.0, 5.0, -5.0, 5.0],
    [-5.0, -5.0, 2.0, -5.0, -5.0, 5.0],
    [-5.0, 5.0, 2.0, -5.0, 5.0, 5.0],
];

/// Tier of a sine wave over the primitive, centered in the stack.
fn wave_height(d: f32, phase: f32, frequency: f32) -> i32 {
    let h = 3.5 * math::sin(math::TAU * (d + phase) * frequency) + 3.5;
    math::rint(h) as i32
}

fn rejected(result: Result<(), RasterError>) -> u32 {
    match result {
        Ok(()) => 0,
        Err(RasterError::OutOfRange { rejected: n }) => n as u32,
    }
}

pub struct Animation {
    mode: Mode,
    frame: u32,
    phase: f32,
    disc_radius: f32,
}

impl Animation {
    pub fn new() -> Self {
        Self {
            mode: Mode::Ripple,
            frame: 0,
            phase: 0.0,
            disc_radius: 1.0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Draw the next frame of the current mode; returns the number of cell
    /// writes that fell outside the display.
    pub fn render(&mut self, canvas: &mut Canvas<'_>) -> u32 {
        let (phase, frequency) = (self.phase, self.mode.wave_frequency());
        let wave = move |d: f32| wave_height(d, phase, frequency);

        let mut raster = canvas.rasterizer();
        let mut dropped = 0;
        match self.mode {
            Mode::Ripple => {
                raster.set_height_function(HeightFunction::Provided(&wave));
                for r in 3..WIDTH {
                    dropped += rejected(raster.draw_circle(0.0, 0.0, r as f32, 4.0, false));
                }
            }
            Mode::Cube => {
                for [x1, y1, z1, x2, y2, z2] in CUBE_EDGES {
                    dropped += rejected(raster.draw_line(x1, y1, z1, x2, y2, z2));
                }
            }
            Mode::GrowingDisc => {
                dropped += rejected(raster.draw_circle(0.0, 0.0, self.disc_radius, 4.0, true));
                self.disc_radius += 1.0;
                if self.disc_radius >= WIDTH as f32 {
                    self.disc_radius = 0.0;
                }
            }
            Mode::WaveLines => {
                raster.set_height_function(HeightFunction::Provided(&wave));
                for x in (-16..16).step_by(2) {
                    let x = x as f32;
                    dropped += rejected(raster.draw_line(x, 16.0, 0.0, x, -16.0, 0.0));
                }
            }
        }

        self.phase += 0.1;
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }

        self.frame += 1;
        if self.frame == MODE_FRAMES {
            self.frame = 0;
            self.mode = self.mode.next();
            self.phase = 0.0;
        }
        dropped
    }
}

pub async fn animation_task(
    mut canvas: Canvas<'static>,
    frame_due: &AtomicBool,
    rejected_writes: &AtomicU32,
) {
    let mut animation = Animation::new();
    let mut mode = animation.mode();
    loop {
        if !frame_due.swap(false, Ordering::Acquire) {
            cassette::yield_now().await;
            continue;
        }

        let dropped = animation.render(&mut canvas);
        canvas.publish();
        rejected_writes.fetch_add(dropped, Ordering::Relaxed);

        if animation.mode() != mode {
            mode = animation.mode();
            rprintln!("Mode: {:?}", mode);
        }

        cassette::yield_now().await;
    }
}
