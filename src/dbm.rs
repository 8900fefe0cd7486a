//! Difference-bound matrices.
//!
//! A [`Dbm`] of dimension `n` describes a zone over the clocks `x_0..x_{n-1}`,
//! where `x_0` is the reference clock fixed at zero. Entry `(i, j)` is an
//! upper bound on `x_i - x_j`. A matrix is *closed* when every entry is the
//! tightest bound implied by the others, which makes the representation of a
//! non-empty zone unique.

use std::fmt::{Display, Formatter};
use std::ops::Index;

use rand::Rng;

use crate::bound::Bound;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Dbm {
    dim: usize,
    bounds: Vec<Bound>,
}

impl Dbm {
    /// The unconstrained zone: only the diagonal is bounded, clocks may be negative.
    pub fn universe(dim: usize) -> Self {
        let mut dbm = Dbm {
            dim,
            bounds: vec![Bound::INFINITY; dim * dim],
        };
        for i in 0..dim {
            dbm.set(i, i, Bound::LE_ZERO);
        }
        dbm
    }

    /// All clocks non-negative, otherwise unconstrained.
    pub fn init(dim: usize) -> Self {
        let mut dbm = Self::universe(dim);
        for k in 1..dim {
            dbm.set(0, k, Bound::LE_ZERO);
        }
        dbm
    }

    /// The single point where every clock is zero.
    pub fn zero(dim: usize) -> Self {
        Dbm {
            dim,
            bounds: vec![Bound::LE_ZERO; dim * dim],
        }
    }

    /// Generate a random closed valid zone.
    ///
    /// The zone contains a random integer point with coordinates in
    /// `0..range`, so it is never empty. Each difference is bounded with
    /// probability one half, by its value at the point plus a random slack.
    pub fn generate<R: Rng + ?Sized>(dim: usize, rng: &mut R, range: i32) -> Self {
        assert!(range > 0, "Range must be positive, got {}", range);

        let mut point = vec![0; dim];
        for p in point.iter_mut().skip(1) {
            *p = rng.random_range(0..range);
        }

        let mut dbm = Self::universe(dim);
        for i in 0..dim {
            for j in 0..dim {
                if i == j || !rng.random_bool(0.5) {
                    continue;
                }
                let slack = rng.random_range(0..range);
                let value = point[i] - point[j] + slack;
                let bound = if slack > 0 { Bound::strict(value) } else { Bound::weak(value) };
                dbm.set(i, j, bound);
            }
        }
        for k in 1..dim {
            if dbm.get(0, k) > Bound::LE_ZERO {
                dbm.set(0, k, Bound::LE_ZERO);
            }
        }

        let consistent = dbm.close();
        assert!(consistent, "Generated zone lost its witness point");
        dbm
    }

    /// Number of clocks, the reference clock included.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, i: usize, j: usize) -> Bound {
        self.bounds[i * self.dim + j]
    }

    pub fn set(&mut self, i: usize, j: usize, bound: Bound) {
        assert!(i < self.dim && j < self.dim, "Clock pair ({}, {}) out of range for dimension {}", i, j, self.dim);
        self.bounds[i * self.dim + j] = bound;
    }

    /// Close the matrix (Floyd–Warshall).
    ///
    /// Returns `false` if the zone is empty, in which case the entries are
    /// meaningless.
    pub fn close(&mut self) -> bool {
        let n = self.dim;
        for k in 0..n {
            for i in 0..n {
                let ik = self.get(i, k);
                if ik.is_infinity() {
                    continue;
                }
                for j in 0..n {
                    let kj = self.get(k, j);
                    if kj.is_infinity() {
                        continue;
                    }
                    let ikj = ik.add(kj);
                    if ikj < self.get(i, j) {
                        self.set(i, j, ikj);
                    }
                }
            }
            if !self.is_consistent() {
                return false;
            }
        }
        self.is_consistent()
    }

    /// Check that no diagonal entry is negative.
    ///
    /// Only meaningful on closed matrices.
    pub fn is_consistent(&self) -> bool {
        (0..self.dim).all(|i| self.get(i, i) >= Bound::LE_ZERO)
    }

    /// Check that every entry is the tightest bound implied by the others.
    pub fn is_closed(&self) -> bool {
        let mut closed = self.clone();
        closed.close() && closed == *self
    }

    /// A consistent zone where every clock is non-negative.
    pub fn is_valid(&self) -> bool {
        self.is_consistent() && (1..self.dim).all(|k| self.get(0, k) <= Bound::LE_ZERO)
    }

    /// Add `x_i - x_j ⊲ bound` to a closed matrix, keeping it closed.
    ///
    /// Returns `false` (leaving the matrix untouched) if the result is empty.
    pub fn constrain(&mut self, i: usize, j: usize, bound: Bound) -> bool {
        if bound >= self.get(i, j) {
            return true;
        }
        if self.get(j, i).add(bound) < Bound::LE_ZERO {
            return false;
        }

        self.set(i, j, bound);
        let n = self.dim;
        for a in 0..n {
            let ai = self.get(a, i);
            if ai.is_infinity() {
                continue;
            }
            let aij = ai.add(bound);
            for c in 0..n {
                let jc = self.get(j, c);
                if jc.is_infinity() {
                    continue;
                }
                let ac = aij.add(jc);
                if ac < self.get(a, c) {
                    self.set(a, c, ac);
                }
            }
        }
        true
    }

    /// Intersect with another zone of the same dimension.
    ///
    /// Returns `false` if the intersection is empty.
    pub fn intersect(&mut self, other: &Dbm) -> bool {
        assert_eq!(self.dim, other.dim, "Dimension mismatch");
        for (a, &b) in self.bounds.iter_mut().zip(other.bounds.iter()) {
            if b < *a {
                *a = b;
            }
        }
        self.close()
    }

    /// Embed into or project onto `dim` clocks.
    ///
    /// Extra clocks are unconstrained, dropped clocks are forgotten. A closed
    /// matrix stays closed.
    pub fn resized(&self, dim: usize) -> Dbm {
        let mut dbm = Dbm::universe(dim);
        let n = self.dim.min(dim);
        for i in 0..n {
            for j in 0..n {
                dbm.set(i, j, self.get(i, j));
            }
        }
        dbm
    }

    /// Check whether the integer valuation `point` (with `point[0] == 0`) lies in the zone.
    pub fn contains_point(&self, point: &[i32]) -> bool {
        assert_eq!(point.len(), self.dim, "Dimension mismatch");
        (0..self.dim).all(|i| (0..self.dim).all(|j| self.get(i, j).admits(point[i] - point[j])))
    }
}

impl Index<(usize, usize)> for Dbm {
    type Output = Bound;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.bounds[i * self.dim + j]
    }
}

impl Display for Dbm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.dim {
            for j in 0..self.dim {
                if j > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
