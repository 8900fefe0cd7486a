//! Conversion between diagrams and difference-bound matrices.

use log::debug;

use crate::bound::Bound;
use crate::cache::Op;
use crate::dbm::Dbm;
use crate::manager::{restrict, CddManager};
use crate::node::Segment;
use crate::reference::Ref;
use crate::types::Level;

/// Move a bound to the opposite difference.
///
/// `x_j - x_i ⊲ b` holds exactly for the values `v` of `x_i - x_j` with
/// `not(v ⊲ flip(b))`. The map is an involution.
fn flip(b: Bound) -> Bound {
    b.mirrored().complement()
}

impl CddManager {
    /// The node `x_i - x_j` in `(below, upper)` leading to `next`, for `i > j`.
    ///
    /// Values `v ⊲ below` and values outside `v ⊲ upper` lead to `FALSE`.
    fn range_node(&self, level: Level, below: Option<Bound>, upper: Bound, next: Ref) -> Ref {
        let mut segments = Vec::with_capacity(3);
        if let Some(b) = below {
            if b >= upper {
                return Ref::FALSE;
            }
            segments.push(Segment::new(b, Ref::FALSE));
        }
        if upper.is_infinity() {
            segments.push(Segment::new(Bound::INFINITY, next));
        } else {
            segments.push(Segment::new(upper, next));
            segments.push(Segment::new(Bound::INFINITY, Ref::FALSE));
        }
        self.mk_node(level, segments)
    }

    /// Constraint `not(x_i - x_j ⊲ below)` and `x_i - x_j ⊲ upper`, on any pair of distinct clocks.
    fn range(&self, i: usize, j: usize, below: Option<Bound>, upper: Bound) -> Ref {
        assert_ne!(i, j, "Cannot constrain clock {} against itself", i);
        self.check_clock(i);
        self.check_clock(j);

        if i > j {
            self.range_node(Level::new(i, j), below, upper, Ref::TRUE)
        } else {
            let below_mirrored = (!upper.is_infinity()).then(|| flip(upper));
            let upper_mirrored = below.map_or(Bound::INFINITY, flip);
            self.range_node(Level::new(j, i), below_mirrored, upper_mirrored, Ref::TRUE)
        }
    }

    /// `lower ⊲ x_i - x_j ⊲ upper`.
    ///
    /// `upper` may be [`Bound::INFINITY`], `lower` must be finite.
    pub fn interval(&self, i: usize, j: usize, lower: Bound, upper: Bound) -> Ref {
        self.range(i, j, Some(lower.complement()), upper)
    }

    /// `bound ⊲ x_i - x_j`.
    pub fn lower(&self, i: usize, j: usize, bound: Bound) -> Ref {
        self.range(i, j, Some(bound.complement()), Bound::INFINITY)
    }

    /// `x_i - x_j ⊲ bound`.
    pub fn upper(&self, i: usize, j: usize, bound: Bound) -> Ref {
        self.range(i, j, None, bound)
    }

    /// The diagram denoting exactly the zone of `m`.
    ///
    /// An inconsistent matrix gives [`Ref::FALSE`].
    pub fn from_matrix(&self, m: &Dbm) -> Ref {
        assert!(
            m.dim() <= self.clocks(),
            "Matrix over {} clocks, only {} clocks are active",
            m.dim(),
            self.clocks()
        );

        let mut zone = m.clone();
        if !zone.close() {
            return Ref::FALSE;
        }

        // Bottom-up in reverse level order.
        let mut next = Ref::TRUE;
        for i in (1..zone.dim()).rev() {
            for j in (0..i).rev() {
                let lower = zone.get(j, i);
                let below = (!lower.is_infinity()).then(|| flip(lower));
                next = self.range_node(Level::new(i, j), below, zone.get(i, j), next);
            }
        }
        debug!("from_matrix -> {}", next);
        next
    }

    /// Check whether the zone of `m` lies entirely inside the diagram.
    ///
    /// Clocks beyond the dimension of `m` are unconstrained.
    pub fn contains(&self, r: Ref, m: &Dbm) -> bool {
        assert!(
            m.dim() <= self.clocks(),
            "Matrix over {} clocks, only {} clocks are active",
            m.dim(),
            self.clocks()
        );

        let mut zone = m.resized(self.clocks());
        if !zone.close() {
            return true;
        }
        self.contains_rec(r, &zone)
    }

    fn contains_rec(&self, r: Ref, zone: &Dbm) -> bool {
        if r.is_terminal() {
            return r.is_true();
        }

        let node = self.node(r);
        let (i, j) = node.level.pair();
        let res = node.intervals().all(|(below, s)| {
            let mut sub = zone.clone();
            !restrict(&mut sub, i, j, below, s.bound) || self.contains_rec(s.child, &sub)
        });
        res
    }

    /// Closed zone (over all active clocks) of the first feasible path to `TRUE`.
    ///
    /// Paths are searched depth-first in segment order.
    pub fn find_zone(&self, r: Ref) -> Option<Dbm> {
        self.find_zone_rec(r, &Dbm::universe(self.clocks()))
    }

    fn find_zone_rec(&self, r: Ref, zone: &Dbm) -> Option<Dbm> {
        if r.is_terminal() {
            return r.is_true().then(|| zone.clone());
        }

        let node = self.node(r);
        let (i, j) = node.level.pair();
        let res = node.intervals().find_map(|(below, s)| {
            let mut sub = zone.clone();
            if restrict(&mut sub, i, j, below, s.bound) {
                self.find_zone_rec(s.child, &sub)
            } else {
                None
            }
        });
        res
    }

    /// All non-reference clocks are non-negative.
    fn non_negative(&self) -> Ref {
        let mut next = Ref::TRUE;
        for i in (1..self.clocks()).rev() {
            next = self.range_node(Level::new(i, 0), Some(Bound::LS_ZERO), Bound::INFINITY, next);
        }
        next
    }

    /// Restrict the diagram to valuations where every clock is non-negative.
    ///
    /// The result is not reduced.
    pub fn remove_negative(&self, r: Ref) -> Ref {
        debug!("remove_negative({})", r);
        let mark = self.protection_mark();
        let non_negative = self.non_negative();
        self.protect(non_negative);
        let res = self.apply(Op::And, r, non_negative);
        self.unprotect_to(mark);
        res
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::bound::MAX_VALUE;

    fn manager(clocks: usize) -> CddManager {
        let manager = CddManager::new(clocks);
        manager.add_clocks(clocks);
        manager
    }

    #[test]
    fn test_interval_shape() {
        let manager = manager(2);
        let r = manager.interval(1, 0, Bound::strict(-4), Bound::strict(-2));
        let node = manager.node(r);
        assert_eq!(node.level, Level::new(1, 0));
        assert_eq!(
            node.segments.as_ref(),
            &[
                Segment::new(Bound::weak(-4), Ref::FALSE),
                Segment::new(Bound::strict(-2), Ref::TRUE),
                Segment::new(Bound::INFINITY, Ref::FALSE),
            ]
        );
    }

    #[test]
    fn test_interval_mirrored() {
        let manager = manager(3);
        // 1 <= x1 - x2 < 4  <=>  -4 < x2 - x1 <= -1
        let a = manager.interval(1, 2, Bound::weak(1), Bound::strict(4));
        let b = manager.interval(2, 1, Bound::strict(-4), Bound::weak(-1));
        assert_eq!(a, b);
        assert_eq!(manager.lower(0, 1, Bound::weak(-3)), manager.upper(1, 0, Bound::weak(3)));
        assert_eq!(manager.upper(0, 1, Bound::strict(0)), manager.lower(1, 0, Bound::strict(0)));
    }

    #[test]
    fn test_empty_interval() {
        let manager = manager(2);
        assert_eq!(manager.interval(1, 0, Bound::strict(3), Bound::weak(3)), Ref::FALSE);
        assert_ne!(manager.interval(1, 0, Bound::weak(3), Bound::weak(3)), Ref::FALSE);
        assert_eq!(manager.interval(1, 0, Bound::strict(3), Bound::weak(2)), Ref::FALSE);
        assert_ne!(manager.interval(1, 0, Bound::weak(3), Bound::weak(4)), Ref::FALSE);
    }

    #[test]
    #[should_panic(expected = "against itself")]
    fn test_interval_same_clock() {
        let manager = manager(2);
        manager.interval(1, 1, Bound::weak(0), Bound::weak(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_interval_unknown_clock() {
        let manager = manager(2);
        manager.upper(2, 0, Bound::weak(1));
    }

    #[test]
    fn test_from_matrix() {
        let manager = manager(3);
        let mut m = Dbm::init(3);
        m.set(1, 0, Bound::weak(5));
        m.set(2, 1, Bound::strict(2));
        let r = manager.from_matrix(&m);
        assert!(manager.contains(r, &m));

        let mut outside = m.clone();
        outside.set(1, 0, Bound::weak(6));
        assert!(!manager.contains(r, &outside));

        let mut inside = m.clone();
        inside.set(2, 0, Bound::weak(1));
        assert!(manager.contains(r, &inside));
    }

    #[test]
    fn test_from_matrix_extreme_bounds() {
        // x1 >= MAX and x2 - x1 >= MAX: closing sums past the representable range.
        let manager = manager(3);
        let mut m = Dbm::init(3);
        m.set(0, 1, Bound::weak(-MAX_VALUE));
        m.set(1, 2, Bound::weak(-MAX_VALUE));
        let r = manager.from_matrix(&m);
        assert_ne!(r, Ref::FALSE);
        assert!(manager.contains(r, &m));
        assert!(manager.find_zone(r).is_some());
    }

    #[test]
    fn test_from_inconsistent_matrix() {
        let manager = manager(2);
        let mut m = Dbm::init(2);
        m.set(1, 0, Bound::strict(0));
        assert_eq!(manager.from_matrix(&m), Ref::FALSE);
        assert!(manager.contains(Ref::FALSE, &m));
    }

    #[test]
    fn test_find_zone() {
        let manager = manager(3);
        let mut m = Dbm::init(3);
        m.set(1, 0, Bound::weak(5));
        m.set(2, 1, Bound::strict(2));
        assert!(m.close());
        let r = manager.from_matrix(&m);
        assert_eq!(manager.find_zone(r), Some(m));
        assert_eq!(manager.find_zone(Ref::FALSE), None);
        assert_eq!(manager.find_zone(Ref::TRUE), Some(Dbm::universe(3)));
    }

    #[test]
    fn test_smaller_matrix() {
        let manager = manager(3);
        let mut m = Dbm::init(2);
        m.set(1, 0, Bound::weak(5));
        let r = manager.from_matrix(&m);
        assert_eq!(manager.level(r), Level::new(1, 0));
        assert!(manager.contains(r, &m));
        assert!(manager.contains(r, &m.resized(3)));
    }

    #[test]
    fn test_remove_negative() {
        let manager = manager(3);

        let r = manager.interval(1, 0, Bound::strict(-4), Bound::strict(-2));
        assert_eq!(manager.remove_negative(r), Ref::FALSE);

        let lower = manager.lower(1, 0, Bound::strict(-4));
        let a = manager.remove_negative(lower);
        let b = manager.remove_negative(Ref::TRUE);
        assert_eq!(a, b);
        assert_ne!(a, lower);
        assert!(manager.contains(a, &Dbm::init(3)));
        assert!(!manager.contains(a, &Dbm::universe(3)));
    }
}
