//! Polar rasterizer.
//!
//! Shapes are given in blade coordinates: `x`/`y` in radius units around the
//! rotation axis and `z` in height tiers.  Every primitive is quantized into
//! the (slice, radius) grid of a [`WorkBuffer`] and ORed in, so all primitives
//! of one frame accumulate.
use crate::math;
use crate::tiers::TierSet;
use crate::{HEIGHT, SLICES, WIDTH};

/// Accumulation buffer for one frame, indexed by `[slice][radius]`.
#[derive(Clone)]
pub struct WorkBuffer {
    cells: [[TierSet; WIDTH]; SLICES],
}

impl WorkBuffer {
    pub const fn new() -> Self {
        Self {
            cells: [[TierSet::EMPTY; WIDTH]; SLICES],
        }
    }

    #[inline]
    pub fn cell(&self, slice: usize, radius: usize) -> TierSet {
        self.cells[slice][radius]
    }

    /// OR `tiers` into a cell.
    #[inline]
    pub fn merge(&mut self, slice: usize, radius: usize, tiers: TierSet) {
        self.cells[slice][radius] |= tiers;
    }

    pub(crate) fn rows(&self) -> &[[TierSet; WIDTH]; SLICES] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells = [[TierSet::EMPTY; WIDTH]; SLICES];
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.is_empty())
    }
}

impl Default for WorkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Where primitives take their height from.
///
/// The callback receives the normalized position along the primitive (`0.0`
/// at its start) and returns the tier to light there.
#[derive(Clone, Copy, Default)]
pub enum HeightFunction<'h> {
    /// Use the heights passed to the draw call.
    #[default]
    None,
    Provided(&'h dyn Fn(f32) -> i32),
}

impl HeightFunction<'_> {
    #[inline]
    pub fn is_provided(&self) -> bool {
        matches!(self, HeightFunction::Provided(_))
    }
}

impl core::fmt::Debug for HeightFunction<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HeightFunction::None => f.write_str("None"),
            HeightFunction::Provided(_) => f.write_str("Provided(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    /// Cells of the primitive fell outside the display volume and were
    /// dropped.  All other cells were drawn.
    OutOfRange { rejected: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Degeneracy class of a line, deciding which polar formula draws it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Both endpoints share `x` and `y`; only the height changes.
    Depth,
    /// On the `x` axis, through the origin.
    OriginHorizontal,
    /// On the `y` axis, through the origin.
    OriginVertical,
    /// Parallel to one of the axes, off the origin.
    AxisAligned(Axis),
    Sloped,
}

impl LineKind {
    pub fn classify(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        if x1 == x2 && y1 == y2 {
            LineKind::Depth
        } else if y1 == 0.0 && y2 == 0.0 {
            LineKind::OriginHorizontal
        } else if x1 == 0.0 && x2 == 0.0 {
            LineKind::OriginVertical
        } else if y1 == y2 {
            LineKind::AxisAligned(Axis::Horizontal)
        } else if x1 == x2 {
            LineKind::AxisAligned(Axis::Vertical)
        } else {
            LineKind::Sloped
        }
    }
}

/// Drawing primitives over a borrowed [`WorkBuffer`].
pub struct Rasterizer<'w, 'h> {
    work: &'w mut WorkBuffer,
    height: HeightFunction<'h>,
    rejected: usize,
}

impl<'w, 'h> Rasterizer<'w, 'h> {
    pub fn new(work: &'w mut WorkBuffer) -> Self {
        Self {
            work,
            height: HeightFunction::None,
            rejected: 0,
        }
    }

    /// Select the height source for the following draw calls.
    ///
    /// It stays in effect until replaced; pass [`HeightFunction::None`] to go
    /// back to explicit heights.
    pub fn set_height_function(&mut self, height: HeightFunction<'h>) {
        self.height = height;
    }

    pub fn height_function(&self) -> HeightFunction<'h> {
        self.height
    }

    pub fn work(&self) -> &WorkBuffer {
        &*self.work
    }

    pub fn clear(&mut self) {
        self.work.clear();
    }

    /// Draw a circle of radius `r` at height `h`.
    ///
    /// Centered on the origin this is a ring of constant radius.  Anywhere
    /// else the circle is the one centered on `(x, y)` that passes through
    /// the origin (`r = 2x cos p + 2y sin p`), so `r` only decides how many
    /// rings a filled circle stacks.  With `fill`, rings of radius `1` up to
    /// `r` are drawn.
    pub fn draw_circle(
        &mut self,
        x: f32,
        y: f32,
        r: f32,
        h: f32,
        fill: bool,
    ) -> Result<(), RasterError> {
        self.rejected = 0;
        self.circle_or_disc(x, y, r, h, fill);
        self.finish()
    }

    /// Draw a sphere of radius `r` around `(x, y, z)` as a stack of circles,
    /// one per tier.
    ///
    /// The height function is ignored (but kept) while the point is drawn.
    pub fn draw_point(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        r: f32,
        fill: bool,
    ) -> Result<(), RasterError> {
        self.rejected = 0;
        let saved = core::mem::take(&mut self.height);

        let lowest = clamp_tier(math::rint(z - r));
        let highest = clamp_tier(math::rint(z + r));
        for tier in lowest..=highest {
            let dz = tier as f32 - z;
            let radius = math::sqrt(r * r - dz * dz);
            self.circle_or_disc(x, y, radius, tier as f32, fill);
        }

        self.height = saved;
        self.finish()
    }

    pub fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        z1: f32,
        x2: f32,
        y2: f32,
        z2: f32,
    ) -> Result<(), RasterError> {
        self.rejected = 0;
        match LineKind::classify(x1, y1, x2, y2) {
            LineKind::Depth => self.depth_line(x1, y1, z1, z2),
            LineKind::OriginHorizontal => self.origin_line(x1, x2, z1, z2, 0),
            LineKind::OriginVertical => self.origin_line(y1, y2, z1, z2, SLICES / 4),
            LineKind::AxisAligned(Axis::Horizontal) => {
                self.axis_line(x1, x2, y1, z1, z2, Axis::Horizontal)
            }
            LineKind::AxisAligned(Axis::Vertical) => {
                self.axis_line(y1, y2, x1, z1, z2, Axis::Vertical)
            }
            LineKind::Sloped => self.sloped_line(x1, y1, z1, x2, y2, z2),
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<(), RasterError> {
        match core::mem::replace(&mut self.rejected, 0) {
            0 => Ok(()),
            rejected => Err(RasterError::OutOfRange { rejected }),
        }
    }

    /// Tier for `position` along the current primitive, `fallback` if no
    /// height function is set.
    #[inline]
    fn tier_at(&self, position: f32, fallback: f32) -> f32 {
        match self.height {
            HeightFunction::None => fallback,
            HeightFunction::Provided(f) => f(position) as f32,
        }
    }

    /// Light one cell, or count it as rejected if it is outside the volume.
    fn plot(&mut self, slice: usize, radius: f32, tier: f32) {
        debug_assert!(slice < SLICES);
        match (math::round_index(radius), math::round_index(tier)) {
            (Some(r), Some(h))
                if (0..WIDTH as i32).contains(&r) && (0..HEIGHT as i32).contains(&h) =>
            {
                self.work.cells[slice][r as usize].insert(h as usize);
            }
            _ => self.rejected += 1,
        }
    }

    fn circle_or_disc(&mut self, x: f32, y: f32, r: f32, h: f32, fill: bool) {
        if !fill {
            self.circle(x, y, r, h);
            return;
        }

        let outer = match math::round_index(r) {
            Some(outer) => outer.min(WIDTH as i32),
            None => {
                self.rejected += 1;
                return;
            }
        };
        for radius in 1..=outer {
            self.circle(x, y, radius as f32, h);
        }
    }

    fn circle(&mut self, x: f32, y: f32, r: f32, h: f32) {
        if x == 0.0 && y == 0.0 {
            for i in 0..SLICES {
                let tier = self.tier_at(i as f32 / SLICES as f32, h);
                self.plot(i, r, tier);
            }
            return;
        }

        // Half a turn covers the whole circle; negative radii land on the
        // opposite slice.
        for i in 0..SLICES / 2 {
            let p = math::slice_angle(i);
            let rho = 2.0 * x * math::cos(p) + 2.0 * y * math::sin(p);
            let tier = self.tier_at(2.0 * i as f32 / SLICES as f32, h);

            if rho >= 0.0 {
                self.plot(i, rho, tier);
            } else {
                self.plot((i + SLICES / 2) % SLICES, -rho, tier);
            }
        }
    }

    /// Vertical line at a single (slice, radius) position.
    fn depth_line(&mut self, x: f32, y: f32, z1: f32, z2: f32) {
        let radius = math::sqrt(x * x + y * y);
        let slice = math::nearest_slice(math::normalize_angle(math::atan2(y, x)));

        let (from, to) = match (math::round_index(z1), math::round_index(z2)) {
            (Some(from), Some(to)) => (clamp_sweep(from), clamp_sweep(to)),
            _ => {
                self.rejected += 1;
                return;
            }
        };

        let mut tier = from;
        loop {
            self.plot(slice, radius, tier as f32);
            if tier == to {
                break;
            }
            tier += if from < to { 1 } else { -1 };
        }
    }

    /// Line through the origin, given by signed radii `r1..r2` along the
    /// direction of slice `positive`.  The negative half lies on the opposite
    /// slice.
    fn origin_line(&mut self, r1: f32, r2: f32, z1: f32, z2: f32, positive: usize) {
        let negative = (positive + SLICES / 2) % SLICES;
        let span = r2 - r1;
        let m = (z2 - z1) / span;

        let start = clamp_radius(r1 as i32);
        let end = clamp_radius(r2 as i32);
        let mut i = start;
        loop {
            let along = i as f32 - r1;
            let tier = self.tier_at(along / span, z1 + m * along);

            // Radius 0 belongs to the positive half.
            if i >= 0 {
                self.plot(positive, i as f32, tier);
            } else {
                self.plot(negative, -i as f32, tier);
            }

            if i == end {
                break;
            }
            i += if start > end { -1 } else { 1 };
        }
    }

    /// Line parallel to an axis at distance `b` from it, spanning `a1..a2`
    /// along the axis.
    fn axis_line(&mut self, a1: f32, a2: f32, b: f32, z1: f32, z2: f32, axis: Axis) {
        let (p1, p2) = match axis {
            Axis::Horizontal => (math::atan2(b, a1), math::atan2(b, a2)),
            Axis::Vertical => (math::atan2(a1, b), math::atan2(a2, b)),
        };
        let first = math::slice_of(math::normalize_angle(p1));
        let last = math::slice_of(math::normalize_angle(p2));

        let span = a2 - a1;
        let m = (z2 - z1) / span;

        let mut i = first;
        loop {
            let p = math::slice_angle(i);
            // `r` is the polar radius, `d` the position along the axis.
            let (r, d) = match axis {
                Axis::Horizontal => (b / math::sin(p), b / math::tan(p)),
                Axis::Vertical => (b / math::cos(p), b * math::tan(p)),
            };
            let tier = self.tier_at((d - a1) / span, z1 + m * (d - a1));
            self.plot(i, r, tier);

            if i == last {
                break;
            }
            i = math::step_toward(i, last);
        }
    }

    fn sloped_line(&mut self, x1: f32, y1: f32, z1: f32, x2: f32, y2: f32, z2: f32) {
        // y = m_x * x + b  =>  r = b / (sin p - m_x cos p)
        // x = m_y * y + c  =>  r = c / (cos p - m_y sin p)
        let m_x = (y2 - y1) / (x2 - x1);
        let m_y = (x2 - x1) / (y2 - y1);
        let length = math::sqrt((x2 - x1) * (x2 - x1) + (y2 - y1) * (y2 - y1));
        let dz = (z2 - z1) / length;

        let (axis, m, b) = if math::abs(m_y) > math::abs(m_x) {
            (Axis::Horizontal, m_x, y1 - m_x * x1)
        } else {
            (Axis::Vertical, m_y, x1 - m_y * y1)
        };
        if math::abs(b) < ORIGIN_TOLERANCE {
            // The polar equation collapses to r = 0 through the origin.
            self.slanted_origin_line(x1, y1, z1, x2, y2, z2);
            return;
        }

        let first = math::slice_of(math::normalize_angle(math::atan2(y1, x1)));
        let last = math::slice_of(math::normalize_angle(math::atan2(y2, x2)));

        let mut i = first;
        loop {
            let p = math::slice_angle(i);
            let (sin, cos) = (math::sin(p), math::cos(p));
            let r = match axis {
                Axis::Horizontal => b / (sin - m * cos),
                Axis::Vertical => b / (cos - m * sin),
            };

            let (px, py) = (r * cos, r * sin);
            let along = math::sqrt((x1 - px) * (x1 - px) + (y1 - py) * (y1 - py));
            let tier = self.tier_at(along / length, z1 + dz * along);
            self.plot(i, r, tier);

            if i == last {
                break;
            }
            i = math::step_toward(i, last);
        }
    }

    /// Sloped line through the origin, drawn like the axis lines on the slice
    /// nearest to its direction and the opposite one.
    fn slanted_origin_line(&mut self, x1: f32, y1: f32, z1: f32, x2: f32, y2: f32, z2: f32) {
        let length = math::sqrt((x2 - x1) * (x2 - x1) + (y2 - y1) * (y2 - y1));
        let (ux, uy) = ((x2 - x1) / length, (y2 - y1) / length);
        let positive = math::nearest_slice(math::normalize_angle(math::atan2(uy, ux)));
        self.origin_line(x1 * ux + y1 * uy, x2 * ux + y2 * uy, z1, z2, positive);
    }
}

fn clamp_tier(h: f32) -> usize {
    h.max(0.0).min((HEIGHT - 1) as f32) as usize
}

/// Offsets from the origin below this are treated as passing through it.
const ORIGIN_TOLERANCE: f32 = 1e-3;

/// Limit a tier sweep to one step past either end of the volume.
fn clamp_sweep(h: i32) -> i32 {
    h.clamp(-1, HEIGHT as i32)
}

/// Limit a radius sweep to one step past the edge of the volume.
fn clamp_radius(r: i32) -> i32 {
    r.clamp(-(WIDTH as i32), WIDTH as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    /// All lit cells as `(slice, radius, tier)`.
    fn lit(work: &WorkBuffer) -> Vec<(usize, usize, usize)> {
        let mut cells = Vec::new();
        for s in 0..SLICES {
            for r in 0..WIDTH {
                for h in work.cell(s, r).iter() {
                    cells.push((s, r, h));
                }
            }
        }
        cells
    }

    #[test]
    fn origin_circle_sets_one_bit_per_slice() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_circle(0.0, 0.0, 5.0, 3.0, false)
            .unwrap();

        let cells = lit(&work);
        assert_eq!(cells.len(), SLICES);
        for (i, &(s, r, h)) in cells.iter().enumerate() {
            assert_eq!((s, r, h), (i, 5, 3));
        }
    }

    #[test]
    fn origin_circle_rounds_radius_and_height() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_circle(0.0, 0.0, 6.6, 1.2, false)
            .unwrap();

        for s in 0..SLICES {
            assert_eq!(work.cell(s, 7), TierSet::single(1));
        }
        assert_eq!(lit(&work).len(), SLICES);
    }

    #[test]
    fn circles_accumulate() {
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.draw_circle(0.0, 0.0, 4.0, 1.0, false).unwrap();
        raster.draw_circle(0.0, 0.0, 4.0, 6.0, false).unwrap();

        for s in 0..SLICES {
            assert_eq!(work.cell(s, 4).bits(), 0b0100_0010);
        }
    }

    #[test]
    fn origin_circle_samples_height_function_per_slice() {
        let step = |d: f32| if d < 0.5 { 1 } else { 6 };
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.set_height_function(HeightFunction::Provided(&step));
        raster.draw_circle(0.0, 0.0, 2.0, 4.0, false).unwrap();

        for s in 0..SLICES {
            let expected = if s < SLICES / 2 { 1 } else { 6 };
            assert_eq!(work.cell(s, 2), TierSet::single(expected), "slice {}", s);
        }
    }

    #[test]
    fn filled_circle_stacks_rings() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_circle(0.0, 0.0, 3.0, 2.0, true)
            .unwrap();

        for s in 0..SLICES {
            assert!(work.cell(s, 0).is_empty());
            for r in 1..=3 {
                assert_eq!(work.cell(s, r), TierSet::single(2));
            }
            assert!(work.cell(s, 4).is_empty());
        }
    }

    #[test]
    fn off_origin_circle_passes_through_origin() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_circle(4.0, 0.0, 4.0, 5.0, false)
            .unwrap();

        // Diameter along the x axis, widest at slice 0.
        assert!(work.cell(0, 8).contains(5));
        // 45° either side: 8 cos(π/4) ~ 5.66.
        assert!(work.cell(SLICES / 8, 6).contains(5));
        assert!(work.cell(SLICES - SLICES / 8, 6).contains(5));

        // Nothing on the far side of the y axis.
        for s in SLICES / 4 + 2..3 * SLICES / 4 - 1 {
            for r in 0..WIDTH {
                assert!(work.cell(s, r).is_empty(), "slice {} radius {}", s, r);
            }
        }
        for (_, r, h) in lit(&work) {
            assert_eq!(h, 5);
            assert!(r <= 8);
        }
    }

    #[test]
    fn oversized_circle_is_rejected_without_writes() {
        let mut work = WorkBuffer::new();
        let result = Rasterizer::new(&mut work).draw_circle(0.0, 0.0, WIDTH as f32, 2.0, false);
        assert_eq!(
            result,
            Err(RasterError::OutOfRange { rejected: SLICES })
        );
        assert!(work.is_empty());
    }

    #[test]
    fn out_of_range_height_is_rejected() {
        let mut work = WorkBuffer::new();
        let result = Rasterizer::new(&mut work).draw_circle(0.0, 0.0, 3.0, HEIGHT as f32, false);
        assert_eq!(
            result,
            Err(RasterError::OutOfRange { rejected: SLICES })
        );

        let result = Rasterizer::new(&mut work).draw_circle(0.0, 0.0, 3.0, -1.0, false);
        assert!(result.is_err());
        assert!(work.is_empty());
    }

    #[test]
    fn point_stacks_circles_per_tier() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_point(0.0, 0.0, 3.0, 2.0, false)
            .unwrap();

        for s in 0..SLICES {
            // Poles of the sphere collapse onto the axis.
            assert_eq!(work.cell(s, 0).bits(), 0b0010_0010);
            // sqrt(3) and 2 both round to radius 2.
            assert_eq!(work.cell(s, 2).bits(), 0b0001_1100);
            assert!(work.cell(s, 1).is_empty());
        }
    }

    #[test]
    fn point_clamps_tier_range() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_point(0.0, 0.0, 0.0, 2.0, false)
            .unwrap();

        for (_, _, h) in lit(&work) {
            assert!(h <= 2);
        }
        assert!(work.cell(0, 2).contains(0));
        assert!(work.cell(0, 0).contains(2));
    }

    #[test]
    fn point_ignores_and_restores_height_function() {
        let top = |_: f32| (HEIGHT - 1) as i32;
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.set_height_function(HeightFunction::Provided(&top));
        raster.draw_point(0.0, 0.0, 2.0, 0.0, false).unwrap();
        assert!(raster.height_function().is_provided());

        for s in 0..SLICES {
            assert_eq!(work.cell(s, 0), TierSet::single(2));
        }
    }

    #[test]
    fn line_kinds_are_exclusive() {
        assert_eq!(LineKind::classify(0.0, 0.0, 0.0, 0.0), LineKind::Depth);
        assert_eq!(LineKind::classify(3.0, 2.0, 3.0, 2.0), LineKind::Depth);
        assert_eq!(LineKind::classify(3.0, 0.0, -5.0, 0.0), LineKind::OriginHorizontal);
        assert_eq!(LineKind::classify(0.0, 2.0, 0.0, -7.0), LineKind::OriginVertical);
        assert_eq!(
            LineKind::classify(1.0, 5.0, 9.0, 5.0),
            LineKind::AxisAligned(Axis::Horizontal)
        );
        assert_eq!(
            LineKind::classify(4.0, 1.0, 4.0, 9.0),
            LineKind::AxisAligned(Axis::Vertical)
        );
        assert_eq!(LineKind::classify(1.0, 2.0, 5.0, 7.0), LineKind::Sloped);
        // Slanted lines through the origin are drawn by the sloped case.
        assert_eq!(LineKind::classify(0.0, 0.0, 3.0, 3.0), LineKind::Sloped);
        assert_eq!(LineKind::classify(-3.0, -3.0, 3.0, 3.0), LineKind::Sloped);
    }

    #[test]
    fn depth_line_sweeps_tiers_in_one_cell() {
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.draw_line(5.0, 0.0, 1.0, 5.0, 0.0, 4.0).unwrap();
        raster.draw_line(0.0, 0.0, 6.0, 0.0, 0.0, 5.0).unwrap();

        assert_eq!(work.cell(0, 5).bits(), 0b0001_1110);
        assert_eq!(work.cell(0, 0).bits(), 0b0110_0000);
        assert_eq!(lit(&work).len(), 6);
    }

    #[test]
    fn depth_line_reports_tiers_above_the_volume() {
        let mut work = WorkBuffer::new();
        let result = Rasterizer::new(&mut work).draw_line(3.0, 0.0, 5.0, 3.0, 0.0, 40.0);
        assert_eq!(result, Err(RasterError::OutOfRange { rejected: 1 }));
        assert_eq!(work.cell(0, 3).bits(), 0b1110_0000);
    }

    #[test]
    fn horizontal_origin_line_splits_across_opposite_slices() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(-3.0, 0.0, 0.0, 3.0, 0.0, 6.0)
            .unwrap();

        for r in 0..=3 {
            assert_eq!(work.cell(0, r), TierSet::single(r + 3));
        }
        for r in 1..=3 {
            assert_eq!(work.cell(SLICES / 2, r), TierSet::single(3 - r));
        }
        assert_eq!(lit(&work).len(), 7);
    }

    #[test]
    fn vertical_origin_line_uses_quarter_slices() {
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.draw_line(0.0, 0.0, 2.0, 0.0, 4.0, 2.0).unwrap();
        raster.draw_line(0.0, -1.0, 7.0, 0.0, -3.0, 7.0).unwrap();

        for r in 0..=4 {
            assert_eq!(work.cell(SLICES / 4, r), TierSet::single(2));
        }
        for r in 1..=3 {
            assert_eq!(work.cell(3 * SLICES / 4, r), TierSet::single(7));
        }
        assert_eq!(lit(&work).len(), 8);
    }

    #[test]
    fn origin_line_samples_height_function_from_start() {
        let seen = core::cell::RefCell::new(Vec::new());
        let record = |d: f32| {
            seen.borrow_mut().push(d);
            0
        };
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.set_height_function(HeightFunction::Provided(&record));
        raster.draw_line(-2.0, 0.0, 0.0, 2.0, 0.0, 0.0).unwrap();

        assert_eq!(*seen.borrow(), [0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn slanted_line_from_the_origin_is_drawn_radially() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(0.0, 0.0, 0.0, 6.0, 2.0, 6.0)
            .unwrap();

        let cells = lit(&work);
        assert_eq!(cells.len(), 7);
        let slice = cells[0].0;
        // atan2(2, 6) is about 6.55 slices.
        assert!((6..=7).contains(&slice), "slice {}", slice);
        for (r, &cell) in cells.iter().enumerate() {
            assert_eq!(cell, (slice, r, r));
        }
    }

    #[test]
    fn slanted_line_through_the_origin_splits_across_opposite_slices() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(-3.0, -3.0, 1.0, 3.0, 3.0, 1.0)
            .unwrap();

        for r in 0..=4 {
            assert_eq!(work.cell(SLICES / 8, r), TierSet::single(1));
        }
        for r in 1..=4 {
            assert_eq!(work.cell(5 * SLICES / 8, r), TierSet::single(1));
        }
        assert_eq!(lit(&work).len(), 9);
    }

    #[test]
    fn axis_line_height_position_is_signed_along_the_axis() {
        let axis = core::cell::RefCell::new(Vec::new());
        let record_axis = |d: f32| {
            axis.borrow_mut().push(d);
            0
        };
        let sloped = core::cell::RefCell::new(Vec::new());
        let record_sloped = |d: f32| {
            sloped.borrow_mut().push(d);
            0
        };

        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.set_height_function(HeightFunction::Provided(&record_axis));
        raster.draw_line(4.0, 5.0, 0.0, -4.0, 5.0, 0.0).unwrap();
        raster.set_height_function(HeightFunction::Provided(&record_sloped));
        raster.draw_line(4.0, 5.0, 0.0, -4.0, 6.0, 0.0).unwrap();

        // The first slice is truncated to just outside (4, 5), which lies
        // before the start along the axis.
        let axis = axis.borrow();
        assert!(axis[0] < 0.0 && axis[0] > -0.05, "{:?}", axis);
        assert!(math::abs(axis[axis.len() - 1] - 1.0) < 0.05, "{:?}", axis);
        assert!(axis.windows(2).all(|w| w[0] < w[1]), "{:?}", axis);

        // Distance from the start point is never negative.
        assert!(sloped.borrow().iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn horizontal_line_walks_the_upper_half() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(-5.0, 5.0, 3.0, 5.0, 5.0, 3.0)
            .unwrap();

        // Straight above the origin the line is 5 away.
        assert_eq!(work.cell(SLICES / 4, 5), TierSet::single(3));
        for (s, r, h) in lit(&work) {
            assert!((SLICES / 8 - 1..=3 * SLICES / 8).contains(&s), "slice {}", s);
            assert!((5..=8).contains(&r), "radius {}", r);
            assert_eq!(h, 3);
        }
    }

    #[test]
    fn horizontal_line_interpolates_along_axis() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(-5.0, 5.0, 0.0, 5.0, 5.0, 6.0)
            .unwrap();

        // Midpoint of the line sits straight above the origin.
        assert_eq!(work.cell(SLICES / 4, 5), TierSet::single(3));
    }

    #[test]
    fn vertical_line_wraps_across_slice_zero() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(4.0, -4.0, 1.0, 4.0, 4.0, 1.0)
            .unwrap();

        assert_eq!(work.cell(0, 4), TierSet::single(1));
        for (s, r, _) in lit(&work) {
            assert!(s <= SLICES / 8 + 1 || s >= SLICES - SLICES / 8 - 1, "slice {}", s);
            assert!((4..=6).contains(&r), "radius {}", r);
        }
    }

    #[test]
    fn axis_line_beyond_the_rim_is_reported() {
        let mut work = WorkBuffer::new();
        let result = Rasterizer::new(&mut work).draw_line(-20.0, 3.0, 0.0, 20.0, 3.0, 0.0);
        assert!(matches!(result, Err(RasterError::OutOfRange { .. })));
        // The part inside the volume is still drawn.
        assert_eq!(work.cell(SLICES / 4, 3), TierSet::single(0));
    }

    #[test]
    fn sloped_line_follows_polar_equation() {
        let mut work = WorkBuffer::new();
        Rasterizer::new(&mut work)
            .draw_line(2.0, 6.0, 0.0, 6.0, 2.0, 4.0)
            .unwrap();

        // (4, 4) is the closest point to the origin: radius 5.66, halfway up.
        assert_eq!(work.cell(SLICES / 8, 6), TierSet::single(2));
        for (s, r, _) in lit(&work) {
            // Endpoints sit at ~18.4° and ~71.6°.
            assert!((5..=26).contains(&s), "slice {}", s);
            assert!((5..=7).contains(&r), "radius {}", r);
        }
    }

    #[test]
    fn sloped_line_samples_height_function_by_distance() {
        let top_half = |d: f32| if d > 0.5 { 7 } else { 0 };
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.set_height_function(HeightFunction::Provided(&top_half));
        raster.draw_line(1.0, 7.0, 0.0, 7.0, 1.0, 0.0).unwrap();

        // Near the first endpoint (~81.9°) the line is low, near the second
        // (~8.1°) it is high.
        let near_start = work.cell(28, 7).bits() | work.cell(27, 7).bits();
        let near_end = work.cell(4, 7).bits() | work.cell(3, 7).bits();
        assert_eq!(near_start, 0b0000_0001);
        assert_eq!(near_end, 0b1000_0000);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut work = WorkBuffer::new();
        let mut raster = Rasterizer::new(&mut work);
        raster.draw_circle(0.0, 0.0, 5.0, 3.0, true).unwrap();
        assert!(!raster.work().is_empty());
        raster.clear();
        assert!(raster.work().is_empty());
    }
}
