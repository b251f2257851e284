//! Limits for configuration values.
//!
//! Numeric settings such as the number of queries in flight come with a
//! default and a range of acceptable values. A [`DefMinMax`] keeps all
//! three together so setters can quietly clamp whatever they are given.

use std::ops::RangeInclusive;

//------------ DefMinMax -----------------------------------------------------

/// A default value plus the inclusive range a setting must fall into.
#[derive(Clone, Debug)]
pub struct DefMinMax<T> {
    /// Used when nothing was configured.
    default: T,

    /// The acceptable values.
    range: RangeInclusive<T>,
}

impl<T: Copy + Ord> DefMinMax<T> {
    /// Creates the limits for a setting.
    ///
    /// `min` must not be larger than `max`.
    pub const fn new(default: T, min: T, max: T) -> Self {
        DefMinMax {
            default,
            range: RangeInclusive::new(min, max),
        }
    }

    /// Returns the default value.
    pub fn default(&self) -> T {
        self.default
    }

    /// Returns the smallest acceptable value.
    pub fn min(&self) -> T {
        *self.range.start()
    }

    /// Returns the largest acceptable value.
    pub fn max(&self) -> T {
        *self.range.end()
    }

    /// Returns `value` moved into the acceptable range.
    pub fn limit(&self, value: T) -> T {
        value.clamp(self.min(), self.max())
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn limit_clamps() {
        let lim = DefMinMax::new(500usize, 1, 0xA000);
        assert_eq!(lim.default(), 500);
        assert_eq!((lim.min(), lim.max()), (1, 0xA000));
        assert_eq!(lim.limit(0), 1);
        assert_eq!(lim.limit(100_000), 0xA000);
        assert_eq!(lim.limit(42), 42);

        let lim = DefMinMax::new(
            Duration::from_secs(5),
            Duration::from_millis(1),
            Duration::from_secs(60),
        );
        assert_eq!(lim.limit(Duration::ZERO), Duration::from_millis(1));
    }
}
