//! Direct-mapped operation cache.
//!
//! Each key hashes to exactly one slot and collisions overwrite the previous
//! entry. The full key is stored and compared, so a hit is always exact.

use std::cell::Cell;

use crate::reference::Ref;
use crate::utils::{pairing2, pairing3, MyHash};

/// Binary Boolean operators of the apply engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    And,
    Or,
    Xor,
}

impl Op {
    /// Truth table of the operator.
    pub const fn eval(self, a: bool, b: bool) -> bool {
        match self {
            Op::And => a && b,
            Op::Or => a || b,
            Op::Xor => a ^ b,
        }
    }

    const fn tag(self) -> u64 {
        match self {
            Op::And => 0,
            Op::Or => 1,
            Op::Xor => 2,
        }
    }
}

/// Key of a memoized operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OpKey {
    Apply(Op, Ref, Ref),
    Not(Ref),
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match *self {
            OpKey::Apply(op, a, b) => pairing3(op.tag(), a.raw() as u64, b.raw() as u64),
            OpKey::Not(a) => pairing2(3, a.raw() as u64),
        }
    }
}

struct Entry<K, V> {
    key: K,
    value: V,
}

pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        let bitmask = (size - 1) as u64;

        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Get the number of slots.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Reset the cache.
    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }
}

impl<K, V> Cache<K, V>
where
    K: MyHash + Eq,
    V: Copy,
{
    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<V> {
        let index = self.index(key.hash());
        match &self.data[index] {
            Some(entry) if entry.key == *key => {
                self.hits.set(self.hits.get() + 1);
                Some(entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.index(key.hash());
        self.data[index] = Some(Entry { key, value });
    }
}
