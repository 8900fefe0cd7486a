//! Context-dependent reduction.
//!
//! Apply only merges equal neighbours, so its results may contain paths whose
//! constraints cannot hold together. Reduction walks the diagram with the
//! closed zone of the path so far and replaces every infeasible segment by
//! its nearest feasible neighbour. Because the projection of a zone onto a
//! difference is an interval, the infeasible segments of a node form a prefix
//! and a suffix of its partition, and the merge in [`CddManager::mk_node`]
//! then removes them together with any test that became redundant.
//!
//! The result is [`Ref::FALSE`] exactly for the empty set, and every path to
//! [`Ref::TRUE`] is feasible. It is not canonical for the denoted set: a test
//! implied only by constraints further down the order survives. Two diagrams
//! denote the same set iff their XOR reduces to [`Ref::FALSE`].

use std::collections::HashMap;

use log::debug;

use crate::bound::Bound;
use crate::dbm::Dbm;
use crate::manager::{restrict, CddManager};
use crate::node::{Node, Segment};
use crate::reference::Ref;

/// Rebuild the segments of `node` from the reduced children of its feasible
/// segments. Infeasible (`None`) segments take the child of the nearest
/// feasible one: the first for the leading run, the previous for the rest.
fn absorb_dead(node: &Node, children: &[Option<Ref>]) -> Option<Vec<Segment>> {
    let mut prev = children.iter().flatten().next().copied()?;
    let segments = node
        .segments
        .iter()
        .zip(children)
        .map(|(s, c)| {
            if let Some(c) = c {
                prev = *c;
            }
            Segment::new(s.bound, prev)
        })
        .collect();
    Some(segments)
}

impl CddManager {
    /// Reduce a diagram: remove infeasible paths and redundant tests.
    pub fn reduce(&self, r: Ref) -> Ref {
        debug!("reduce({})", r);
        let mark = self.protection_mark();
        let mut memo = HashMap::new();
        let res = self.reduce_rec(r, &Dbm::universe(self.clocks()), &mut memo);
        self.unprotect_to(mark);
        debug!("computed: reduce({}) -> {} ({} contexts)", r, res, memo.len());
        res
    }

    fn reduce_rec(&self, r: Ref, zone: &Dbm, memo: &mut HashMap<(Ref, Dbm), Ref>) -> Ref {
        if r.is_terminal() {
            return r;
        }

        let key = (r, zone.clone());
        if let Some(&res) = memo.get(&key) {
            return res;
        }

        let node = self.node(r);
        let (i, j) = node.level.pair();
        let mut children = Vec::with_capacity(node.segments.len());
        for (below, s) in node.intervals() {
            let mut sub = zone.clone();
            if restrict(&mut sub, i, j, below, s.bound) {
                let child = self.reduce_rec(s.child, &sub, memo);
                self.protect(child);
                children.push(Some(child));
            } else {
                children.push(None);
            }
        }

        let res = match absorb_dead(&node, &children) {
            Some(segments) => self.mk_node(node.level, segments),
            None => Ref::FALSE,
        };
        self.protect(res);
        memo.insert(key, res);
        res
    }

    /// Brute-force reduction, used as an oracle for [`CddManager::reduce`].
    ///
    /// Keeps the raw constraints of the path and closes a fresh matrix from
    /// scratch for every segment, without memoization. The result must be
    /// pointer-equal to the result of `reduce`.
    pub fn bf_reduce(&self, r: Ref) -> Ref {
        debug!("bf_reduce({})", r);
        let mark = self.protection_mark();
        let res = self.bf_reduce_rec(r, &mut Vec::new());
        self.unprotect_to(mark);
        res
    }

    fn bf_reduce_rec(&self, r: Ref, path: &mut Vec<(usize, usize, Bound)>) -> Ref {
        if r.is_terminal() {
            return r;
        }

        let node = self.node(r);
        let (i, j) = node.level.pair();
        let mut children = Vec::with_capacity(node.segments.len());
        for (below, s) in node.intervals() {
            let len = path.len();
            if let Some(b) = below {
                path.push((j, i, b.complement().mirrored()));
            }
            if !s.bound.is_infinity() {
                path.push((i, j, s.bound));
            }

            let mut zone = Dbm::universe(self.clocks());
            for &(a, c, b) in path.iter() {
                if b < zone.get(a, c) {
                    zone.set(a, c, b);
                }
            }
            if zone.close() {
                let child = self.bf_reduce_rec(s.child, path);
                self.protect(child);
                children.push(Some(child));
            } else {
                children.push(None);
            }

            path.truncate(len);
        }

        match absorb_dead(&node, &children) {
            Some(segments) => self.mk_node(node.level, segments),
            None => Ref::FALSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::cache::Op;

    fn manager(clocks: usize) -> CddManager {
        let manager = CddManager::new(clocks);
        manager.add_clocks(clocks);
        manager
    }

    #[test]
    fn test_reduce_terminals() {
        let manager = manager(2);
        assert_eq!(manager.reduce(Ref::TRUE), Ref::TRUE);
        assert_eq!(manager.reduce(Ref::FALSE), Ref::FALSE);
    }

    #[test]
    fn test_reduce_empty_conjunction() {
        // x1 <= 2 and x2 >= 5 and x2 - x1 <= 1 is empty
        let manager = manager(3);
        let a = manager.upper(1, 0, Bound::weak(2));
        let b = manager.lower(2, 0, Bound::weak(5));
        let c = manager.upper(2, 1, Bound::weak(1));
        let ab = manager.apply(Op::And, a, b);
        manager.protect(ab);
        let abc = manager.apply(Op::And, ab, c);
        assert_ne!(abc, Ref::FALSE);
        assert_eq!(manager.reduce(abc), Ref::FALSE);
        assert_eq!(manager.bf_reduce(abc), Ref::FALSE);
    }

    #[test]
    fn test_reduce_drops_implied_test() {
        // 0 <= x1 <= 2 and 0 <= x2 <= 3 imply x2 - x1 <= 3
        let manager = manager(3);
        let a = manager.interval(1, 0, Bound::weak(0), Bound::weak(2));
        let b = manager.interval(2, 0, Bound::weak(0), Bound::weak(3));
        let ab = manager.apply(Op::And, a, b);
        manager.protect(ab);
        let c = manager.upper(2, 1, Bound::weak(5));
        let abc = manager.apply(Op::And, ab, c);
        manager.protect(abc);
        assert_ne!(abc, ab);
        assert_eq!(manager.reduce(abc), ab);
        assert_eq!(manager.bf_reduce(abc), ab);
    }

    #[test]
    fn test_reduce_idempotent() {
        let manager = manager(3);
        let a = manager.interval(1, 0, Bound::weak(1), Bound::weak(4));
        let b = manager.interval(2, 1, Bound::strict(-3), Bound::weak(2));
        let c = manager.lower(2, 0, Bound::weak(3));
        let ab = manager.apply(Op::Or, a, b);
        manager.protect(ab);
        let abc = manager.apply(Op::And, ab, c);
        manager.protect(abc);
        let reduced = manager.reduce(abc);
        manager.protect(reduced);
        assert_eq!(manager.reduce(reduced), reduced);
        assert_eq!(manager.bf_reduce(abc), reduced);
    }

    #[test]
    fn test_absorb_dead() {
        use crate::types::Level;
        let node = Node {
            level: Level::new(1, 0),
            segments: Box::new([
                Segment::new(Bound::strict(0), Ref::FALSE),
                Segment::new(Bound::weak(3), Ref::TRUE),
                Segment::new(Bound::weak(5), Ref::FALSE),
                Segment::new(Bound::INFINITY, Ref::TRUE),
            ]),
        };
        let segments = absorb_dead(&node, &[None, Some(Ref::TRUE), Some(Ref::FALSE), None]).unwrap();
        let children: Vec<Ref> = segments.iter().map(|s| s.child).collect();
        assert_eq!(children, vec![Ref::TRUE, Ref::TRUE, Ref::FALSE, Ref::FALSE]);
        assert_eq!(absorb_dead(&node, &[None, None, None, None]), None);
    }
}
