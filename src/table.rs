use std::ops::Index;

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
    occupied: bool,
    /// Permanent cells are never bucketed and never swept.
    pinned: bool,
    /// Number of external references (handles) to this cell.
    refs: u32,
}

impl<T> Entry<T> {
    /// Create a new cell with the given value.
    pub fn new(value: T) -> Self {
        Self {
            value,
            next: 0,
            occupied: false,
            pinned: false,
            refs: 0,
        }
    }
}

impl<T> Default for Entry<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Hash-consing table with reference counts and a free list.
///
/// Cells are addressed by stable indices: growing the table never moves a
/// value to another index, and freed indices are only reused for new values.
/// Index `0` is a sentinel marking the end of a bucket chain.
pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Freed cells available for reuse.
    free: Vec<usize>,
    /// Index of the last cell ever allocated.
    last_index: usize,
    /// Number of occupied cells.
    real_size: usize,
    /// Upper limit for [`Table::grow`].
    max_capacity: usize,
}

fn buckets_for(capacity: usize) -> usize {
    capacity.next_power_of_two().clamp(1, 1 << 20)
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table of size `2^bits`, allowed to grow up to `2^max_bits`.
    pub fn new(bits: usize, max_bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");
        assert!(max_bits <= 31, "Storage bits should be in the range 0..=31");
        assert!(bits <= max_bits, "Initial storage bits exceed the maximum");

        let capacity = 1 << bits;
        let mut data: Vec<Entry<T>> = Vec::with_capacity(capacity);
        data.resize_with(capacity, Entry::default);
        data[0].occupied = true; // Set 0th cell as occupied (sentry).

        let buckets_size = buckets_for(capacity);
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            free: Vec::new(),
            last_index: 0,
            real_size: 0,
            max_capacity: 1 << max_bits,
        }
    }

    /// Double the capacity, bounded by the maximum.
    ///
    /// Returns `false` if the table is already at its maximum capacity.
    pub fn grow(&mut self) -> bool
    where
        T: MyHash,
    {
        let capacity = self.capacity();
        if capacity >= self.max_capacity {
            return false;
        }
        let new_capacity = (capacity * 2).min(self.max_capacity);
        self.data.resize_with(new_capacity, Entry::default);
        self.rebuild_buckets();
        true
    }

    /// Drop the value at the given index.
    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        assert!(self.data[index].occupied, "Index {} is not occupied", index);

        let entry = &mut self.data[index];
        entry.occupied = false;
        entry.pinned = false;
        entry.refs = 0;
        entry.next = 0;
        entry.value = T::default();
        self.free.push(index);
        self.real_size -= 1;
    }
}

impl<T> Table<T> {
    /// Get the capacity of the table.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Get the maximum capacity the table may grow to.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }
    /// Get the index of the last allocated cell.
    pub fn size(&self) -> usize {
        self.last_index
    }
    /// Get the number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }
    /// Check whether an allocation would fail.
    pub fn is_full(&self) -> bool {
        self.free.is_empty() && self.last_index + 1 >= self.capacity()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    /// Check if the cell at the given index is occupied.
    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].occupied
    }
    /// Get the index of the next cell.
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }

    /// Get the number of external references to the cell.
    pub fn refs(&self, index: usize) -> u32 {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].refs
    }
    /// Add an external reference to the cell.
    pub fn retain(&mut self, index: usize) {
        assert!(self.is_occupied(index), "Retaining a free cell {}", index);
        self.data[index].refs += 1;
    }
    /// Remove an external reference from the cell.
    ///
    /// The cell stays occupied when the count drops to zero; it is only
    /// reclaimed by [`Table::sweep`].
    pub fn release(&mut self, index: usize) {
        assert!(self.is_occupied(index), "Releasing a free cell {}", index);
        let entry = &mut self.data[index];
        assert!(entry.refs > 0, "Releasing an unreferenced cell {}", index);
        entry.refs -= 1;
    }

    /// Iterate over the indices of all occupied cells.
    pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.last_index).filter(|&i| self.data[i].occupied)
    }

    /// Allocate a new cell in the table and return its index.
    pub(crate) fn alloc(&mut self) -> usize {
        let index = self.free.pop().unwrap_or_else(|| {
            self.last_index += 1;
            self.last_index
        });

        if index >= self.capacity() {
            panic!("Storage is full");
        }

        self.data[index].occupied = true;
        self.real_size += 1;

        index
    }

    /// Add a new value to the table (outside of any bucket) and return its index.
    pub fn add(&mut self, value: T) -> usize {
        let index = self.alloc();

        self.data[index].value = value;
        self.data[index].next = 0;
        self.data[index].refs = 0;

        index
    }
}

impl<T> Table<T>
where
    T: MyHash,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Find the index of a value equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize>
    where
        T: Eq,
    {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != 0 {
            if value == self.value(index) {
                return Some(index);
            }
            index = self.next(index);
        }
        None
    }

    /// Insert a value known to be absent and return its index.
    pub fn insert(&mut self, value: T) -> usize {
        let bucket_index = self.bucket_index(&value);
        let index = self.add(value);
        self.data[index].next = self.buckets[bucket_index];
        self.buckets[bucket_index] = index;
        index
    }

    /// Put a value into the table and return its index, reusing an equal value if present.
    pub fn put(&mut self, value: T) -> usize
    where
        T: Eq,
    {
        match self.find(&value) {
            Some(index) => index,
            None => self.insert(value),
        }
    }

    /// Rehash every bucketed cell into a bucket array sized for the current capacity.
    fn rebuild_buckets(&mut self) {
        let buckets_size = buckets_for(self.capacity());
        let mut buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;
        for index in 1..=self.last_index {
            let entry = &self.data[index];
            if !entry.occupied || entry.pinned {
                continue;
            }
            let b = (entry.value.hash() & bitmask) as usize;
            self.data[index].next = buckets[b];
            buckets[b] = index;
        }
        self.buckets = buckets;
        self.bitmask = bitmask;
    }

    /// Reclaim every occupied cell for which `alive` returns `false`.
    ///
    /// Returns the number of reclaimed cells.
    pub fn sweep(&mut self, alive: impl Fn(usize) -> bool) -> usize
    where
        T: Default,
    {
        let dead: Vec<usize> = self
            .occupied()
            .filter(|&i| !self.data[i].pinned && !alive(i))
            .collect();
        for &index in &dead {
            self.drop(index);
        }
        self.rebuild_buckets();
        dead.len()
    }
}

impl<T> Table<T> {
    /// Mark a cell as permanent: it is never bucketed and never swept.
    pub fn pin(&mut self, index: usize) {
        assert!(self.is_occupied(index), "Pinning a free cell {}", index);
        self.data[index].pinned = true;
    }

    /// Check whether a cell is pinned.
    pub fn is_pinned(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].pinned
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
