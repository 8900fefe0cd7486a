use std::fmt::{Display, Formatter};

use crate::bound::Bound;
use crate::reference::Ref;
use crate::types::Level;
use crate::utils::{hash_words, pairing2, MyHash};

/// One piece of a node's partition of `x_i - x_j`.
///
/// A segment covers the values `v` with `v ⊲ bound` that are not covered by
/// the previous segment.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Segment {
    pub bound: Bound,
    pub child: Ref,
}

impl Segment {
    pub const fn new(bound: Bound, child: Ref) -> Self {
        Self { bound, child }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.bound, self.child)
    }
}

/// A decision node: the clock pair tested and the ordered partition of its difference.
///
/// The last segment is always bounded by [`Bound::INFINITY`], so the segments
/// cover every value with no gaps and no overlaps.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Node {
    pub level: Level,
    pub segments: Box<[Segment]>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            level: Level::TERMINAL,
            segments: Box::new([]),
        }
    }
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        self.level.is_terminal()
    }

    /// Iterate over the children in segment order.
    pub fn children(&self) -> impl Iterator<Item = Ref> + '_ {
        self.segments.iter().map(|s| s.child)
    }

    /// Iterate over `(below, segment)`, where `below` is the bound of the
    /// previous segment, i.e. the boundary this segment's values lie above.
    pub fn intervals(&self) -> impl Iterator<Item = (Option<Bound>, Segment)> + '_ {
        let belows = std::iter::once(None).chain(self.segments.iter().map(|s| Some(s.bound)));
        belows.zip(self.segments.iter().copied())
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        let words = self
            .segments
            .iter()
            .map(|s| pairing2(s.bound.raw() as u32 as u64, s.child.raw() as u64));
        hash_words(std::iter::once(self.level.index() as u64).chain(words))
    }
}
