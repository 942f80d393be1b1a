//! Growth parameters for [`Slice`](crate::Slice) and sub-region sizing.

use crate::error::ArenaError;

/// Divisor applied to the available space by
/// [`Region::push_subregion`](crate::Region::push_subregion).
///
/// The default tail is half of what the parent has left.
pub const SUBREGION_DIVISOR: usize = 2;

/// How a [`Slice`](crate::Slice) sizes a relocated block when it cannot
/// extend in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Relocation {
    /// `cap + increment` elements.
    Fixed,
    /// `max(cap + increment, cap * 3 / 2)` elements.
    #[default]
    OneAndHalf,
}

/// Growth configuration for [`Slice`](crate::Slice).
///
/// Validated by [`Slice::with_config`](crate::Slice::with_config); all
/// values are immutable once a slice is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceConfig {
    /// Capacity, in elements, of the first block.
    ///
    /// Default: 32. Independent of the element size. Must be non-zero.
    pub initial: usize,

    /// Elements added per in-place extension, and the floor for a
    /// relocation.
    ///
    /// Default: 32. Must be non-zero.
    pub increment: usize,

    /// Sizing rule used when the block is not at the region tip.
    pub relocation: Relocation,
}

impl SliceConfig {
    /// Default first-block capacity.
    pub const DEFAULT_INITIAL: usize = 32;

    /// Default growth increment.
    pub const DEFAULT_INCREMENT: usize = 32;

    /// The default configuration.
    pub const DEFAULT: Self = Self {
        initial: Self::DEFAULT_INITIAL,
        increment: Self::DEFAULT_INCREMENT,
        relocation: Relocation::OneAndHalf,
    };

    /// Create a config with the given initial capacity and increment.
    pub const fn new(initial: usize, increment: usize, relocation: Relocation) -> Self {
        Self {
            initial,
            increment,
            relocation,
        }
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.initial == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "initial capacity must be > 0".into(),
            });
        }
        if self.increment == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "increment must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Capacity of the block a relocation moves `cap` elements into.
    pub fn next_capacity(&self, cap: usize) -> usize {
        let fixed = cap.saturating_add(self.increment);
        match self.relocation {
            Relocation::Fixed => fixed,
            Relocation::OneAndHalf => fixed.max(cap.saturating_add(cap / 2)),
        }
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
