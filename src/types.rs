//! Type-safe wrapper for decision levels.
//!
//! Every internal node tests the difference `x_i - x_j` of one clock pair with
//! `i > j`. The pairs are laid out in a fixed total order, which is the order
//! in which the apply algorithm descends:
//!
//! ```text
//! level:  0      1      2      3      4      5      ...
//! pair:   (1,0)  (2,0)  (2,1)  (3,0)  (3,1)  (3,2)  ...
//! ```
//!
//! Adding a clock only appends levels, so nodes built before `add_clocks`
//! keep their meaning.
use std::fmt;

/// A level in the decision order, i.e. a clock pair `(i, j)` with `i > j`.
///
/// # Invariants
///
/// - Level `0` is the topmost level (closest to root), the pair `(1, 0)`
/// - [`Level::TERMINAL`] is below every pair and is used for terminal nodes
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(u32);

impl Level {
    /// Pseudo-level of the terminal nodes.
    pub const TERMINAL: Level = Level(u32::MAX);

    /// Creates the level testing `x_i - x_j`.
    ///
    /// # Panics
    ///
    /// Panics if `i <= j`. Pairs are always stored with the larger clock first.
    pub fn new(i: usize, j: usize) -> Self {
        assert!(i > j, "Clock pair ({}, {}) must have i > j", i, j);
        Level((i * (i - 1) / 2 + j) as u32)
    }

    /// Number of levels needed for `clocks` clocks (the reference clock included).
    pub fn count(clocks: usize) -> usize {
        clocks * clocks.saturating_sub(1) / 2
    }

    /// Returns the raw level index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    /// Returns the clock pair `(i, j)` tested at this level.
    pub fn pair(self) -> (usize, usize) {
        assert!(!self.is_terminal(), "Terminal level has no clock pair");
        let l = self.index();
        let mut i = 1;
        while i * (i + 1) / 2 <= l {
            i += 1;
        }
        (i, l - i * (i - 1) / 2)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "T")
        } else {
            let (i, j) = self.pair();
            write!(f, "x{}-x{}", i, j)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert_eq!(Level::new(1, 0).index(), 0);
        assert_eq!(Level::new(2, 0).index(), 1);
        assert_eq!(Level::new(2, 1).index(), 2);
        assert_eq!(Level::new(3, 0).index(), 3);
        assert_eq!(Level::new(3, 2).index(), 5);
        assert!(Level::new(3, 2) < Level::TERMINAL);
    }

    #[test]
    fn test_level_pair_roundtrip() {
        for i in 1..12 {
            for j in 0..i {
                assert_eq!(Level::new(i, j).pair(), (i, j));
            }
        }
    }

    #[test]
    fn test_level_count() {
        assert_eq!(Level::count(0), 0);
        assert_eq!(Level::count(1), 0);
        assert_eq!(Level::count(2), 1);
        assert_eq!(Level::count(4), 6);
    }

    #[test]
    #[should_panic(expected = "must have i > j")]
    fn test_level_wrong_order() {
        Level::new(1, 2);
    }
}
