use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;

use crate::manager::CddManager;
use crate::reference::Ref;

impl CddManager {
    /// Indices of all nodes reachable from `nodes`, terminals included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<Ref> {
        let mut visited = HashSet::new();
        let mut stack = Vec::from_iter(nodes);

        while let Some(node) = stack.pop() {
            if visited.insert(node) && !node.is_terminal() {
                stack.extend(self.node(node).children());
            }
        }

        visited
    }

    /// Number of distinct nodes in the diagram, terminals included.
    pub fn size(&self, node: Ref) -> usize {
        self.descendants([node]).len()
    }

    /// Number of edges (segments) in the diagram.
    pub fn edge_count(&self, node: Ref) -> usize {
        self.descendants([node])
            .into_iter()
            .filter(|r| !r.is_terminal())
            .map(|r| self.node(r).segments.len())
            .sum()
    }

    /// Number of paths from `node` to `TRUE`.
    ///
    /// Every zone enumerated by repeated extraction from a reduced diagram
    /// follows a different path, so this bounds the number of zones.
    pub fn path_count(&self, node: Ref) -> BigUint {
        let mut cache = HashMap::new();
        self._path_count(node, &mut cache)
    }

    fn _path_count(&self, node: Ref, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if node.is_false() {
            return BigUint::ZERO;
        } else if node.is_true() {
            return BigUint::from(1u32);
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let count: BigUint = self
            .node(node)
            .children()
            .map(|child| self._path_count(child, cache))
            .sum();

        cache.insert(node, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::Bound;
    use crate::cache::Op;

    #[test]
    fn test_counts_of_terminals() {
        let manager = CddManager::new(2);
        assert_eq!(manager.size(Ref::TRUE), 1);
        assert_eq!(manager.edge_count(Ref::FALSE), 0);
        assert_eq!(manager.path_count(Ref::TRUE), BigUint::from(1u32));
        assert_eq!(manager.path_count(Ref::FALSE), BigUint::ZERO);
    }

    #[test]
    fn test_counts_of_interval() {
        let manager = CddManager::new(2);
        manager.add_clocks(2);
        let r = manager.interval(1, 0, Bound::weak(1), Bound::weak(3));
        assert_eq!(manager.size(r), 3);
        assert_eq!(manager.edge_count(r), 3);
        assert_eq!(manager.path_count(r), BigUint::from(1u32));
    }

    #[test]
    fn test_path_count_shared() {
        let manager = CddManager::new(3);
        manager.add_clocks(3);
        // Two disjoint ranges of x1, each followed by the same test on x2.
        let a = manager.interval(1, 0, Bound::weak(0), Bound::weak(1));
        let b = manager.interval(1, 0, Bound::weak(5), Bound::weak(6));
        let ab = manager.apply(Op::Or, a, b);
        manager.protect(ab);
        let c = manager.upper(2, 0, Bound::weak(2));
        let r = manager.apply(Op::And, ab, c);
        // x1 node: 5 segments, two of them lead to the shared x2 node.
        assert_eq!(manager.size(r), 4);
        assert_eq!(manager.edge_count(r), 5 + 2);
        assert_eq!(manager.path_count(r), BigUint::from(2u32));
    }
}
