use std::cmp::min;

use log::debug;

use crate::bound::Bound;
use crate::cache::{Op, OpKey};
use crate::manager::CddManager;
use crate::node::{Node, Segment};
use crate::reference::Ref;
use crate::types::Level;

impl CddManager {
    fn apply_terminal(op: Op, a: Ref, b: Ref) -> Option<Ref> {
        if a.is_terminal() && b.is_terminal() {
            return Some(Ref::from_bool(op.eval(a.is_true(), b.is_true())));
        }
        match op {
            Op::And => {
                if a.is_false() || b.is_false() {
                    Some(Ref::FALSE)
                } else if a.is_true() || a == b {
                    Some(b)
                } else if b.is_true() {
                    Some(a)
                } else {
                    None
                }
            }
            Op::Or => {
                if a.is_true() || b.is_true() {
                    Some(Ref::TRUE)
                } else if a.is_false() || a == b {
                    Some(b)
                } else if b.is_false() {
                    Some(a)
                } else {
                    None
                }
            }
            // No shortcut for TRUE: XOR against TRUE walks the whole diagram.
            Op::Xor => {
                if a == b {
                    Some(Ref::FALSE)
                } else if a.is_false() {
                    Some(b)
                } else if b.is_false() {
                    Some(a)
                } else {
                    None
                }
            }
        }
    }

    /// Segments of `node` seen at `level`: a node below `level` does not test
    /// the pair, so it is one unbounded segment.
    fn segments_at(r: Ref, node: &Node, level: Level) -> Vec<Segment> {
        if node.level == level {
            node.segments.to_vec()
        } else {
            vec![Segment::new(Bound::INFINITY, r)]
        }
    }

    /// Combine two diagrams with a Boolean operator.
    ///
    /// The result is locally canonical (hash-consed, merged) but not reduced:
    /// it may contain infeasible paths, see [`CddManager::reduce`].
    pub fn apply(&self, op: Op, a: Ref, b: Ref) -> Ref {
        debug!("apply({:?}, {}, {})", op, a, b);

        if let Some(res) = Self::apply_terminal(op, a, b) {
            return res;
        }

        // All operators are commutative.
        let (a, b) = if a <= b { (a, b) } else { (b, a) };

        let key = OpKey::Apply(op, a, b);
        if let Some(res) = self.cache().get(&key) {
            debug!("cache: apply({:?}, {}, {}) -> {}", op, a, b, res);
            return res;
        }

        let na = self.node(a);
        let nb = self.node(b);
        let level = min(na.level, nb.level);
        let sa = Self::segments_at(a, &na, level);
        let sb = Self::segments_at(b, &nb, level);

        let mark = self.protection_mark();
        let mut segments = Vec::with_capacity(sa.len() + sb.len());
        let (mut i, mut j) = (0, 0);
        loop {
            let (x, y) = (sa[i], sb[j]);
            let bound = min(x.bound, y.bound);
            let child = self.apply(op, x.child, y.child);
            self.protect(child);
            segments.push(Segment::new(bound, child));
            if bound.is_infinity() {
                break;
            }
            if x.bound == bound {
                i += 1;
            }
            if y.bound == bound {
                j += 1;
            }
        }
        let res = self.mk_node(level, segments);
        self.unprotect_to(mark);

        debug!("computed: apply({:?}, {}, {}) -> {}", op, a, b, res);
        self.cache.borrow_mut().insert(key, res);
        res
    }

    /// Complement of a diagram: the same structure with the terminals swapped.
    pub fn negate(&self, r: Ref) -> Ref {
        debug!("negate({})", r);

        if r.is_terminal() {
            return Ref::from_bool(r.is_false());
        }

        let key = OpKey::Not(r);
        if let Some(res) = self.cache().get(&key) {
            debug!("cache: negate({}) -> {}", r, res);
            return res;
        }

        let node = self.node(r);
        let mark = self.protection_mark();
        let mut segments = Vec::with_capacity(node.segments.len());
        for s in node.segments.iter() {
            let child = self.negate(s.child);
            self.protect(child);
            segments.push(Segment::new(s.bound, child));
        }
        let res = self.mk_node(node.level, segments);
        self.unprotect_to(mark);

        debug!("computed: negate({}) -> {}", r, res);
        self.cache.borrow_mut().insert(key, res);
        res
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn setup() -> (CddManager, Ref, Ref) {
        let manager = CddManager::new(3);
        manager.add_clocks(3);
        // 1 <= x1 <= 5
        let a = manager.interval(1, 0, Bound::weak(1), Bound::weak(5));
        // 2 < x2 - x1
        let b = manager.lower(2, 1, Bound::strict(2));
        (manager, a, b)
    }

    #[test]
    fn test_terminal_cases() {
        let (manager, a, _) = setup();
        assert_eq!(manager.apply(Op::And, a, Ref::TRUE), a);
        assert_eq!(manager.apply(Op::And, Ref::FALSE, a), Ref::FALSE);
        assert_eq!(manager.apply(Op::Or, a, Ref::TRUE), Ref::TRUE);
        assert_eq!(manager.apply(Op::Or, Ref::FALSE, a), a);
        assert_eq!(manager.apply(Op::Xor, a, a), Ref::FALSE);
        assert_eq!(manager.apply(Op::Xor, a, Ref::FALSE), a);
        assert_eq!(manager.apply(Op::Or, Ref::TRUE, Ref::FALSE), Ref::TRUE);
    }

    #[test]
    fn test_same_level() {
        let manager = CddManager::new(2);
        manager.add_clocks(2);
        let a = manager.upper(1, 0, Bound::weak(5));
        let b = manager.lower(1, 0, Bound::weak(1));
        let c = manager.apply(Op::And, a, b);
        assert_eq!(c, manager.interval(1, 0, Bound::weak(1), Bound::weak(5)));
        assert_eq!(manager.apply(Op::Or, a, b), Ref::TRUE);
    }

    #[test]
    fn test_commutative() {
        let (manager, a, b) = setup();
        for op in [Op::And, Op::Or, Op::Xor] {
            assert_eq!(manager.apply(op, a, b), manager.apply(op, b, a));
        }
    }

    #[test]
    fn test_negate_matches_xor() {
        let (manager, a, b) = setup();
        let c = manager.apply(Op::Or, a, b);
        manager.protect(c);
        assert_eq!(manager.negate(c), manager.apply(Op::Xor, c, Ref::TRUE));
        assert_eq!(manager.negate(manager.negate(c)), c);
        assert_eq!(manager.negate(Ref::TRUE), Ref::FALSE);
    }

    #[test]
    fn test_de_morgan() {
        let (manager, a, b) = setup();
        let and = manager.apply(Op::And, a, b);
        manager.protect(and);
        let not_a = manager.negate(a);
        manager.protect(not_a);
        let not_b = manager.negate(b);
        manager.protect(not_b);
        let or = manager.apply(Op::Or, not_a, not_b);
        assert_eq!(manager.negate(and), or);
    }

    #[test]
    fn test_cache_hit() {
        let (manager, a, b) = setup();
        let c = manager.apply(Op::And, a, b);
        let hits = manager.cache().hits();
        assert_eq!(manager.apply(Op::And, b, a), c);
        assert_eq!(manager.cache().hits(), hits + 1);
    }
}
