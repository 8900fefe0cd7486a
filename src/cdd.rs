//! Reference-counted diagram handles.
//!
//! A [`Cdd`] pins its node for as long as it lives: cloning retains, dropping
//! releases, and garbage collection keeps every node reachable from a live
//! handle. Handles borrow their [`CddManager`], so none can outlive it.

use std::fmt::{Debug, Display, Formatter};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use crate::bound::Bound;
use crate::cache::Op;
use crate::dbm::Dbm;
use crate::manager::CddManager;
use crate::reference::Ref;

pub struct Cdd<'m> {
    manager: &'m CddManager,
    node: Ref,
}

impl<'m> Cdd<'m> {
    /// Wrap a node into a handle, taking one reference on it.
    pub fn new(manager: &'m CddManager, node: Ref) -> Self {
        manager.retain(node);
        Self { manager, node }
    }

    /// The universal set.
    pub fn universe(manager: &'m CddManager) -> Self {
        Self::new(manager, Ref::TRUE)
    }

    /// The empty set.
    pub fn empty(manager: &'m CddManager) -> Self {
        Self::new(manager, Ref::FALSE)
    }

    /// The zone of `m`.
    pub fn from_matrix(manager: &'m CddManager, m: &Dbm) -> Self {
        Self::new(manager, manager.from_matrix(m))
    }

    /// `lower ⊲ x_i - x_j ⊲ upper`.
    pub fn interval(manager: &'m CddManager, i: usize, j: usize, lower: Bound, upper: Bound) -> Self {
        Self::new(manager, manager.interval(i, j, lower, upper))
    }

    /// `bound ⊲ x_i - x_j`.
    pub fn lower(manager: &'m CddManager, i: usize, j: usize, bound: Bound) -> Self {
        Self::new(manager, manager.lower(i, j, bound))
    }

    /// `x_i - x_j ⊲ bound`.
    pub fn upper(manager: &'m CddManager, i: usize, j: usize, bound: Bound) -> Self {
        Self::new(manager, manager.upper(i, j, bound))
    }

    pub fn manager(&self) -> &'m CddManager {
        self.manager
    }

    pub fn node(&self) -> Ref {
        self.node
    }

    pub fn is_true(&self) -> bool {
        self.node.is_true()
    }

    pub fn is_false(&self) -> bool {
        self.node.is_false()
    }

    fn check_manager(&self, other: &Cdd<'_>) {
        assert!(
            std::ptr::eq(self.manager, other.manager),
            "Diagrams belong to different managers"
        );
    }

    pub fn apply(&self, op: Op, other: &Cdd<'m>) -> Cdd<'m> {
        self.check_manager(other);
        Cdd::new(self.manager, self.manager.apply(op, self.node, other.node))
    }

    /// Apply followed by reduction.
    pub fn apply_reduce(&self, op: Op, other: &Cdd<'m>) -> Cdd<'m> {
        self.apply(op, other).reduce()
    }

    pub fn intersection(&self, other: &Cdd<'m>) -> Cdd<'m> {
        self.apply(Op::And, other)
    }

    pub fn union(&self, other: &Cdd<'m>) -> Cdd<'m> {
        self.apply(Op::Or, other)
    }

    pub fn symmetric_difference(&self, other: &Cdd<'m>) -> Cdd<'m> {
        self.apply(Op::Xor, other)
    }

    pub fn complement(&self) -> Cdd<'m> {
        Cdd::new(self.manager, self.manager.negate(self.node))
    }

    pub fn reduce(&self) -> Cdd<'m> {
        Cdd::new(self.manager, self.manager.reduce(self.node))
    }

    pub fn bf_reduce(&self) -> Cdd<'m> {
        Cdd::new(self.manager, self.manager.bf_reduce(self.node))
    }

    pub fn remove_negative(&self) -> Cdd<'m> {
        Cdd::new(self.manager, self.manager.remove_negative(self.node))
    }

    /// Check whether the zone of `m` lies entirely inside the diagram.
    pub fn contains(&self, m: &Dbm) -> bool {
        self.manager.contains(self.node, m)
    }

    /// Pick one zone of the diagram.
    ///
    /// Returns the zone projected onto the first `dim` clocks, and the
    /// diagram with the zone removed. Returns `None` for the empty diagram.
    ///
    /// # Panics
    ///
    /// Panics if `dim` exceeds the number of active clocks, or if the zone
    /// admits negative clock values; use [`Cdd::remove_negative`] first on
    /// diagrams built from raw intervals.
    pub fn extract(&self, dim: usize) -> Option<(Dbm, Cdd<'m>)> {
        assert!(
            dim <= self.manager.clocks(),
            "Cannot extract a zone over {} clocks, only {} clocks are active",
            dim,
            self.manager.clocks()
        );
        let zone = self.manager.find_zone(self.node)?;
        let projected = zone.resized(dim);
        assert!(projected.is_valid(), "Extracted zone is not valid:\n{}", projected);
        let taken = Cdd::from_matrix(self.manager, &zone);
        let rest = self.intersection(&taken.complement());
        Some((projected, rest))
    }

    /// Same node, i.e. the same diagram. Equal sets may have different diagrams.
    pub fn structurally_equal(&self, other: &Cdd<'_>) -> bool {
        std::ptr::eq(self.manager, other.manager) && self.node == other.node
    }

    /// Same denoted set.
    pub fn equivalent(&self, other: &Cdd<'m>) -> bool {
        self.symmetric_difference(other).reduce().is_false()
    }

    pub fn size(&self) -> usize {
        self.manager.size(self.node)
    }

    pub fn to_bracket_string(&self) -> String {
        self.manager.to_bracket_string(self.node)
    }
}

impl Clone for Cdd<'_> {
    fn clone(&self) -> Self {
        Cdd::new(self.manager, self.node)
    }
}

impl Drop for Cdd<'_> {
    fn drop(&mut self) {
        self.manager.release(self.node);
    }
}

impl PartialEq for Cdd<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(other)
    }
}

impl Eq for Cdd<'_> {}

impl Debug for Cdd<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cdd({})", self.node)
    }
}

impl Display for Cdd<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_bracket_string())
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl<'m> $trait<&Cdd<'m>> for &Cdd<'m> {
            type Output = Cdd<'m>;

            fn $method(self, rhs: &Cdd<'m>) -> Cdd<'m> {
                self.apply($op, rhs)
            }
        }

        impl<'m> $trait<Cdd<'m>> for Cdd<'m> {
            type Output = Cdd<'m>;

            fn $method(self, rhs: Cdd<'m>) -> Cdd<'m> {
                self.apply($op, &rhs)
            }
        }

        impl<'m> $assign_trait<&Cdd<'m>> for Cdd<'m> {
            fn $assign_method(&mut self, rhs: &Cdd<'m>) {
                *self = self.apply($op, rhs);
            }
        }

        impl<'m> $assign_trait<Cdd<'m>> for Cdd<'m> {
            fn $assign_method(&mut self, rhs: Cdd<'m>) {
                *self = self.apply($op, &rhs);
            }
        }
    };
}

impl_binary_op!(BitAnd, bitand, BitAndAssign, bitand_assign, Op::And);
impl_binary_op!(BitOr, bitor, BitOrAssign, bitor_assign, Op::Or);
impl_binary_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, Op::Xor);

impl<'m> Not for &Cdd<'m> {
    type Output = Cdd<'m>;

    fn not(self) -> Cdd<'m> {
        self.complement()
    }
}

impl<'m> Not for Cdd<'m> {
    type Output = Cdd<'m>;

    fn not(self) -> Cdd<'m> {
        self.complement()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn manager(clocks: usize) -> CddManager {
        let manager = CddManager::new(clocks);
        manager.add_clocks(clocks);
        manager
    }

    #[test]
    fn test_reference_counting() {
        let manager = manager(2);
        let a = Cdd::interval(&manager, 1, 0, Bound::weak(1), Bound::weak(2));
        assert_eq!(manager.refs(a.node()), 1);
        let b = a.clone();
        assert_eq!(manager.refs(a.node()), 2);
        drop(b);
        assert_eq!(manager.refs(a.node()), 1);
        let node = a.node();
        drop(a);
        assert_eq!(manager.refs(node), 0);
        assert_eq!(manager.collect_garbage(), 1);
    }

    #[test]
    fn test_handles_survive_gc() {
        let manager = manager(3);
        let a = Cdd::upper(&manager, 1, 0, Bound::weak(3));
        let b = Cdd::lower(&manager, 2, 1, Bound::strict(0));
        let c = &a | &b;
        let before = c.to_bracket_string();
        manager.collect_garbage();
        assert_eq!(c.to_bracket_string(), before);
        assert_eq!(&a | &b, c);
    }

    #[test]
    fn test_operators() {
        let manager = manager(3);
        let a = Cdd::interval(&manager, 1, 0, Bound::weak(1), Bound::weak(4));
        let b = Cdd::interval(&manager, 2, 0, Bound::weak(2), Bound::weak(6));
        let t = Cdd::universe(&manager);
        let f = Cdd::empty(&manager);

        assert_eq!(&a & &t, a);
        assert_eq!(&a | &f, a);
        assert_eq!(&a ^ &a, f);
        assert_eq!(!&t, f);
        assert_eq!(!!a.clone(), a);
        assert_eq!(a.clone() & b.clone(), b.intersection(&a));
        assert_eq!(a.clone() | b.clone(), b.union(&a));
        assert_eq!(&a ^ &b, b.symmetric_difference(&a));
        assert_eq!(!(&a & &b), &!&a | &!&b);

        let mut c = a.clone();
        c &= &b;
        assert_eq!(c, &a & &b);
        c |= b.clone();
        assert!(c.equivalent(&b));
        c ^= &b;
        assert!(c.reduce().is_false());
    }

    #[test]
    fn test_apply_reduce() {
        let manager = manager(3);
        let a = Cdd::upper(&manager, 1, 0, Bound::weak(2));
        let b = Cdd::lower(&manager, 2, 0, Bound::weak(5));
        let c = Cdd::upper(&manager, 2, 1, Bound::weak(1));
        let ab = a.apply_reduce(Op::And, &b);
        assert_eq!(ab, ab.reduce());
        assert!(ab.apply_reduce(Op::And, &c).is_false());
    }

    #[test]
    fn test_extract() {
        let manager = manager(3);
        let mut m = Dbm::init(3);
        m.set(1, 0, Bound::weak(5));
        m.set(2, 1, Bound::strict(2));
        assert!(m.close());

        let d = Cdd::from_matrix(&manager, &m);
        assert!(d.contains(&m));
        let (zone, rest) = d.extract(3).unwrap();
        assert_eq!(zone, m);
        assert!(rest.reduce().is_false());
        assert!(Cdd::empty(&manager).extract(3).is_none());
    }

    #[test]
    fn test_extract_enumerates_union() {
        let manager = manager(2);
        let a = Cdd::interval(&manager, 1, 0, Bound::weak(0), Bound::weak(1));
        let b = Cdd::interval(&manager, 1, 0, Bound::weak(5), Bound::weak(6));
        let mut d = (&a | &b).reduce();
        let mut zones = Vec::new();
        while let Some((zone, rest)) = d.extract(2) {
            zones.push(zone);
            d = rest.reduce();
        }
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0][(1, 0)], Bound::weak(1));
        assert_eq!(zones[1][(1, 0)], Bound::weak(6));
    }

    #[test]
    #[should_panic(expected = "not valid")]
    fn test_extract_negative() {
        let manager = manager(2);
        let d = Cdd::interval(&manager, 1, 0, Bound::strict(-4), Bound::strict(-2));
        d.extract(2);
    }

    #[test]
    #[should_panic(expected = "only 2 clocks are active")]
    fn test_extract_too_many_clocks() {
        let manager = manager(2);
        let d = Cdd::interval(&manager, 1, 0, Bound::weak(1), Bound::weak(2));
        d.extract(3);
    }

    #[test]
    fn test_display() {
        let manager = manager(2);
        assert_eq!(Cdd::universe(&manager).to_string(), "T");
        let d = Cdd::upper(&manager, 1, 0, Bound::weak(3));
        assert_eq!(d.to_string(), format!("{}:(x1-x0, ≤3 T, <∞ F)", d.node()));
    }
}
