//! Bounds on clock differences.
//!
//! A [`Bound`] is a signed integer magnitude together with a strictness flag,
//! packed into a single `i32` as `(value << 1) | weak`:
//!
//! ```text
//! (3, <)  ->  6
//! (3, ≤)  ->  7
//! (-2, <) -> -4
//! ```
//!
//! With this encoding the natural integer order is the restrictiveness order:
//! `(c, <) < (c, ≤) < (c + 1, <)`, so `min` of two bounds is their conjunction.
//!
//! The same type is used for upper bounds (`x_i - x_j ⊲ b`) and lower bounds
//! (`b ⊲ x_i - x_j`); which one is meant is always clear from the call site.

use std::fmt::{Display, Formatter};

/// Largest magnitude representable by a finite bound.
pub const MAX_VALUE: i32 = (i32::MAX >> 1) - 1;

/// Strictness of a bound.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Strictness {
    /// `<`
    Strict,
    /// `≤`
    Weak,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bound(i32);

impl Bound {
    /// No constraint at all: `< ∞`.
    pub const INFINITY: Bound = Bound((i32::MAX >> 1) << 1);
    /// `≤ 0`
    pub const LE_ZERO: Bound = Bound(1);
    /// `< 0`
    pub const LS_ZERO: Bound = Bound(0);

    pub fn new(value: i32, strictness: Strictness) -> Self {
        assert!(
            (-MAX_VALUE..=MAX_VALUE).contains(&value),
            "Bound value {} is out of range",
            value
        );
        match strictness {
            Strictness::Strict => Bound(value << 1),
            Strictness::Weak => Bound((value << 1) | 1),
        }
    }

    /// `< value`
    pub fn strict(value: i32) -> Self {
        Self::new(value, Strictness::Strict)
    }

    /// `≤ value`
    pub fn weak(value: i32) -> Self {
        Self::new(value, Strictness::Weak)
    }

    /// Create a bound from its packed representation.
    pub const fn from_raw(raw: i32) -> Self {
        Bound(raw)
    }

    /// Return the packed representation.
    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn value(self) -> i32 {
        self.0 >> 1
    }

    pub const fn is_strict(self) -> bool {
        self.0 & 1 == 0
    }

    pub const fn is_weak(self) -> bool {
        !self.is_strict()
    }

    pub fn strictness(self) -> Strictness {
        if self.is_strict() {
            Strictness::Strict
        } else {
            Strictness::Weak
        }
    }

    pub fn is_infinity(self) -> bool {
        self == Self::INFINITY
    }

    /// Sum of two bounds, as used by the shortest-path closure.
    ///
    /// Infinity is absorbing, and the sum is strict if either operand is.
    /// Sums beyond [`MAX_VALUE`] saturate: upwards to infinity, downwards to
    /// `< -MAX_VALUE`.
    pub fn add(self, other: Bound) -> Bound {
        if self.is_infinity() || other.is_infinity() {
            return Self::INFINITY;
        }
        let raw = (self.0 as i64 + other.0 as i64) - ((self.0 | other.0) & 1) as i64;
        let lowest = Self::strict(-MAX_VALUE).0 as i64;
        Bound(raw.clamp(lowest, Self::INFINITY.0 as i64) as i32)
    }

    /// Boundary of the complementary half-line.
    ///
    /// The complement of `v ⊲ b` is `b ⊲' v` with the opposite strictness, and
    /// vice versa: `(c, ≤) <-> (c, <)`.
    pub fn complement(self) -> Bound {
        assert!(!self.is_infinity(), "Infinity has no complement");
        Bound(self.0 ^ 1)
    }

    /// The same constraint seen on the opposite difference.
    ///
    /// `x_i - x_j ⊲ c` is `-c ⊲ x_j - x_i`, hence `(c, s) -> (-c, s)`.
    pub fn mirrored(self) -> Bound {
        assert!(!self.is_infinity(), "Infinity cannot be mirrored");
        Bound::new(-self.value(), self.strictness())
    }

    /// Check whether the difference value `v` satisfies `v ⊲ self`.
    pub fn admits(self, v: i32) -> bool {
        if self.is_infinity() {
            return true;
        }
        if self.is_strict() {
            v < self.value()
        } else {
            v <= self.value()
        }
    }
}

impl Display for Strictness {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Strictness::Strict => write!(f, "<"),
            Strictness::Weak => write!(f, "≤"),
        }
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_infinity() {
            write!(f, "<∞")
        } else {
            write!(f, "{}{}", self.strictness(), self.value())
        }
    }
}
