use std::cell::{Cell, RefCell};
use std::fmt::Debug;

use log::{debug, info};

use crate::bound::Bound;
use crate::cache::{Cache, OpKey};
use crate::dbm::Dbm;
use crate::node::{Node, Segment};
use crate::reference::Ref;
use crate::table::Table;
use crate::types::Level;

type Storage = Table<Node>;

/// Sizing of a [`CddManager`].
///
/// All sizes are given as powers of two.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CddConfig {
    /// Upper limit for [`CddManager::add_clocks`], the reference clock included.
    pub max_clocks: usize,
    /// Initial node table size is `2^storage_bits`.
    pub storage_bits: usize,
    /// The node table never grows past `2^max_storage_bits`.
    pub max_storage_bits: usize,
    /// Operation cache size is `2^cache_bits`.
    pub cache_bits: usize,
}

impl Default for CddConfig {
    fn default() -> Self {
        Self {
            max_clocks: 16,
            storage_bits: 12,
            max_storage_bits: 24,
            cache_bits: 14,
        }
    }
}

/// The engine context: node table, operation cache and clock count.
///
/// Every [`Ref`] is an index into this manager's table. A `Ref` is only
/// guaranteed to survive the next node-creating operation if it is reachable
/// from a [`Cdd`][crate::cdd::Cdd] handle (or from the protection stack while
/// an operation runs).
pub struct CddManager {
    pub(crate) storage: RefCell<Storage>,
    pub(crate) cache: RefCell<Cache<OpKey, Ref>>,
    protected: RefCell<Vec<Ref>>,
    clocks: Cell<usize>,
    config: CddConfig,
}

impl CddManager {
    /// Create a manager for up to `max_clocks` clocks with default table sizes.
    pub fn new(max_clocks: usize) -> Self {
        Self::with_config(CddConfig {
            max_clocks,
            ..CddConfig::default()
        })
    }

    pub fn with_config(config: CddConfig) -> Self {
        assert!(config.cache_bits <= 31, "Cache bits should be in the range 0..=31");
        // Sentinel and both terminals must fit.
        assert!(config.storage_bits >= 2, "Storage bits should be at least 2");

        let mut storage = Storage::new(config.storage_bits, config.max_storage_bits);

        // Allocate the terminal nodes:
        let f = storage.add(Node::default());
        let t = storage.add(Node::default());
        assert_eq!(f, Ref::FALSE.index());
        assert_eq!(t, Ref::TRUE.index());
        storage.pin(f);
        storage.pin(t);

        info!(
            "Initialized CDD manager: max_clocks = {}, capacity = {}, cache = {}",
            config.max_clocks,
            storage.capacity(),
            1usize << config.cache_bits
        );

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            protected: RefCell::new(Vec::new()),
            clocks: Cell::new(0),
            config,
        }
    }

    /// Tear the manager down.
    ///
    /// Handles borrow the manager, so none can be alive at this point.
    pub fn finalize(self) {
        info!("Finalizing CDD manager: {:?}", self);
    }
}

impl Default for CddManager {
    fn default() -> Self {
        Self::with_config(CddConfig::default())
    }
}

impl Debug for CddManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("CddManager")
            .field("clocks", &self.clocks.get())
            .field("max_clocks", &self.max_clocks())
            .field("capacity", &storage.capacity())
            .field("max_capacity", &storage.max_capacity())
            .field("size", &storage.size())
            .field("real_size", &storage.real_size())
            .finish()
    }
}

impl CddManager {
    pub fn config(&self) -> &CddConfig {
        &self.config
    }

    pub fn cache(&self) -> std::cell::Ref<'_, Cache<OpKey, Ref>> {
        self.cache.borrow()
    }

    /// Number of active clocks, the reference clock included.
    pub fn clocks(&self) -> usize {
        self.clocks.get()
    }

    pub fn max_clocks(&self) -> usize {
        self.config.max_clocks
    }

    /// Declare `n` more clocks. Existing diagrams keep their meaning.
    pub fn add_clocks(&self, n: usize) {
        let clocks = self.clocks.get() + n;
        assert!(
            clocks <= self.config.max_clocks,
            "Cannot have {} clocks, the maximum is {}",
            clocks,
            self.config.max_clocks
        );
        debug!("add_clocks({}) -> {}", n, clocks);
        self.clocks.set(clocks);
    }

    pub(crate) fn check_clock(&self, i: usize) {
        assert!(
            i < self.clocks(),
            "Clock {} out of range, only {} clocks are active",
            i,
            self.clocks()
        );
    }

    /// Number of live nodes, terminals included.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    pub fn capacity(&self) -> usize {
        self.storage.borrow().capacity()
    }

    /// A copy of the node behind `r`.
    ///
    /// Algorithms work on copies so no table borrow is held across recursion.
    pub fn node(&self, r: Ref) -> Node {
        self.storage.borrow().value(r.index()).clone()
    }

    pub fn level(&self, r: Ref) -> Level {
        self.storage.borrow().value(r.index()).level
    }

    pub(crate) fn retain(&self, r: Ref) {
        if !r.is_terminal() {
            self.storage.borrow_mut().retain(r.index());
        }
    }

    pub(crate) fn release(&self, r: Ref) {
        if !r.is_terminal() {
            self.storage.borrow_mut().release(r.index());
        }
    }

    /// Number of external references to `r`. Terminals are not counted.
    pub fn refs(&self, r: Ref) -> u32 {
        if r.is_terminal() {
            0
        } else {
            self.storage.borrow().refs(r.index())
        }
    }

    /// Keep `r` alive until the protection stack is unwound past it.
    pub(crate) fn protect(&self, r: Ref) {
        self.protected.borrow_mut().push(r);
    }

    pub(crate) fn protection_mark(&self) -> usize {
        self.protected.borrow().len()
    }

    pub(crate) fn unprotect_to(&self, mark: usize) {
        self.protected.borrow_mut().truncate(mark);
    }

    /// Get or create the canonical node `(level, segments)`.
    ///
    /// Adjacent segments leading to the same child are merged, and a node left
    /// with a single segment is replaced by its child.
    pub fn mk_node(&self, level: Level, segments: Vec<Segment>) -> Ref {
        debug!(
            "mk(level = {}, segments = [{}])",
            level,
            segments.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
        );

        assert!(!level.is_terminal(), "Cannot make a node at the terminal level");
        assert!(
            segments.last().is_some_and(|s| s.bound.is_infinity()),
            "Last segment must be unbounded"
        );
        debug_assert!(
            segments.windows(2).all(|w| w[0].bound < w[1].bound),
            "Segment bounds must be strictly increasing"
        );
        debug_assert!(
            segments.iter().all(|s| level < self.level(s.child)),
            "Children must lie below level {}",
            level
        );

        let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
        for s in segments {
            match merged.last_mut() {
                Some(last) if last.child == s.child => last.bound = s.bound,
                _ => merged.push(s),
            }
        }

        if merged.len() == 1 {
            debug!("mk: single segment, returning {}", merged[0].child);
            return merged[0].child;
        }

        let node = Node {
            level,
            segments: merged.into_boxed_slice(),
        };

        if let Some(index) = self.storage.borrow().find(&node) {
            return Ref::new(index as u32);
        }

        if self.storage.borrow().is_full() {
            self.make_room(&node);
        }

        let index = self.storage.borrow_mut().insert(node);
        Ref::new(index as u32)
    }

    /// Free or add space for one more node, keeping the children of `pending` alive.
    fn make_room(&self, pending: &Node) {
        let mark = self.protection_mark();
        for child in pending.children() {
            self.protect(child);
        }
        self.collect_garbage();
        self.unprotect_to(mark);

        let (live, capacity, max_capacity) = {
            let storage = self.storage.borrow();
            (storage.real_size(), storage.capacity(), storage.max_capacity())
        };
        if 4 * live >= 3 * capacity || self.storage.borrow().is_full() {
            let grown = self.storage.borrow_mut().grow();
            if grown {
                info!("Grew node table from {} to {}", capacity, self.capacity());
            }
        }

        if self.storage.borrow().is_full() {
            panic!("Node table is full: {} live nodes at maximum capacity {}", live, max_capacity);
        }
    }

    /// Indices of all nodes reachable from the given roots, terminals included.
    fn mark(&self, roots: impl IntoIterator<Item = Ref>) -> Vec<bool> {
        let storage = self.storage.borrow();
        let mut alive = vec![false; storage.capacity()];
        alive[Ref::FALSE.index()] = true;
        alive[Ref::TRUE.index()] = true;

        let mut stack: Vec<Ref> = roots.into_iter().collect();
        while let Some(r) = stack.pop() {
            let i = r.index();
            if alive[i] {
                continue;
            }
            alive[i] = true;
            stack.extend(storage.value(i).children());
        }
        alive
    }

    /// Reclaim every node not reachable from a handle or the protection stack.
    ///
    /// Live nodes never move. The operation cache is cleared, so no cached
    /// result can name a reclaimed node. Returns the number of freed nodes.
    pub fn collect_garbage(&self) -> usize {
        debug!("Collecting garbage...");

        let roots: Vec<Ref> = {
            let storage = self.storage.borrow();
            let referenced = storage
                .occupied()
                .filter(|&i| storage.refs(i) > 0)
                .map(|i| Ref::new(i as u32));
            referenced.chain(self.protected.borrow().iter().copied()).collect()
        };
        let alive = self.mark(roots);

        let freed = self.storage.borrow_mut().sweep(|i| alive[i]);
        self.cache.borrow_mut().clear();

        info!("Garbage collection: freed {} nodes, {} alive", freed, self.num_nodes());
        freed
    }

    /// Render a diagram as a nested bracket string, for debugging.
    pub fn to_bracket_string(&self, r: Ref) -> String {
        if r.is_terminal() {
            return r.to_string();
        }

        let node = self.node(r);
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|s| format!("{} {}", s.bound, self.to_bracket_string(s.child)))
            .collect();
        format!("{}:({}, {})", r, node.level, segments.join(", "))
    }
}

/// Add `not(v ⊲ below)` and `v ⊲ upper` for `v = x_i - x_j` to a closed zone.
///
/// Returns `false` if the zone becomes empty.
pub(crate) fn restrict(zone: &mut Dbm, i: usize, j: usize, below: Option<Bound>, upper: Bound) -> bool {
    if let Some(b) = below {
        if !zone.constrain(j, i, b.complement().mirrored()) {
            return false;
        }
    }
    upper.is_infinity() || zone.constrain(i, j, upper)
}
