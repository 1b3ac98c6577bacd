//! Float helpers for the polar rasterizer.
//!
//! All trigonometry goes through `micromath` so host tests exercise the same
//! approximations the firmware runs with.

use micromath::F32Ext;

use crate::SLICES;

pub const TAU: f32 = core::f32::consts::TAU;

#[inline]
pub fn sin(x: f32) -> f32 {
    F32Ext::sin(x)
}

#[inline]
pub fn cos(x: f32) -> f32 {
    F32Ext::cos(x)
}

#[inline]
pub fn tan(x: f32) -> f32 {
    F32Ext::tan(x)
}

/// `atan2`, defined as `0.0` at the origin.
#[inline]
pub fn atan2(y: f32, x: f32) -> f32 {
    if x == 0.0 && y == 0.0 {
        0.0
    } else {
        F32Ext::atan2(y, x)
    }
}

#[inline]
pub fn abs(x: f32) -> f32 {
    F32Ext::abs(x)
}

#[inline]
pub fn sqrt(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else {
        F32Ext::sqrt(x)
    }
}

/// Round to the nearest integer, ties to even.
pub fn rint(x: f32) -> f32 {
    let floor = F32Ext::floor(x);
    let diff = x - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    }
}

/// Round `x` to an integer index, or `None` if it is not finite.
#[inline]
pub fn round_index(x: f32) -> Option<i32> {
    if x.is_finite() {
        Some(rint(x) as i32)
    } else {
        None
    }
}

/// Angle of the start of slice `i`, in radians.
#[inline]
pub fn slice_angle(i: usize) -> f32 {
    TAU * i as f32 / SLICES as f32
}

/// Fold an angle from `atan2` into `[0, 2π)`.
#[inline]
pub fn normalize_angle(p: f32) -> f32 {
    let p = if p < 0.0 { p + TAU } else { p };
    if p >= TAU {
        p - TAU
    } else {
        p
    }
}

/// Slice containing angle `p` (which must already be normalized).
#[inline]
pub fn slice_of(p: f32) -> usize {
    (p * SLICES as f32 / TAU) as usize % SLICES
}

/// Slice closest to angle `p` (which must already be normalized).
#[inline]
pub fn nearest_slice(p: f32) -> usize {
    rint(p * SLICES as f32 / TAU) as usize % SLICES
}

/// Move one slice from `current` towards `target`, along the shorter way
/// around the circle.
///
/// When both ways are equally long the direct (non-wrapping) way is taken.
pub fn step_toward(current: usize, target: usize) -> usize {
    debug_assert!(current < SLICES && target < SLICES);
    let forward = if current > target {
        current - target > SLICES / 2
    } else {
        target - current <= SLICES / 2
    };

    if forward {
        (current + 1) % SLICES
    } else {
        (current + SLICES - 1) % SLICES
    }
}
