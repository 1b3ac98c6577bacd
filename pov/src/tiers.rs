use crate::HEIGHT;

/// Set of lit height tiers in one (slice, radius) cell.
///
/// Bit `h` corresponds to tier `h`, counted from the bottom of the blade.  The
/// packed byte is exactly what the data lines of the LED bus expect.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TierSet(u8);

// Every tier needs its own bit (and its own data line).
const _: () = assert!(HEIGHT <= TierSet::CAPACITY);

impl TierSet {
    /// Number of tiers the underlying storage can hold.
    pub const CAPACITY: usize = u8::BITS as usize;

    pub const EMPTY: Self = Self(0);

    /// All `HEIGHT` tiers lit.
    pub const FULL: Self = Self((((1u16) << HEIGHT) - 1) as u8);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::FULL.0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// A set containing only `tier`.
    ///
    /// Panics if `tier >= HEIGHT`.
    #[inline]
    pub fn single(tier: usize) -> Self {
        assert!(tier < HEIGHT, "tier {} out of range", tier);
        Self(1 << tier)
    }

    #[inline]
    pub fn contains(self, tier: usize) -> bool {
        tier < HEIGHT && self.0 & (1 << tier) != 0
    }

    #[inline]
    pub fn insert(&mut self, tier: usize) {
        *self |= Self::single(tier);
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the lit tiers, lowest first.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..HEIGHT).filter(move |&h| self.contains(h))
    }
}

impl core::ops::BitOr for TierSet {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TierSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
