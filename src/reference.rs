use std::fmt::{Display, Formatter};

/// Index of a node in the manager's node table.
///
/// Index `0` is the table's sentinel, `1` and `2` are the two terminals.
/// A `Ref` carries no reference count: only [`Cdd`][crate::cdd::Cdd] handles
/// keep nodes alive across garbage collection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(u32);

impl Ref {
    /// The empty set.
    pub const FALSE: Ref = Ref(1);
    /// The universal set.
    pub const TRUE: Ref = Ref(2);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// Return the index of the reference.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_true(self) -> bool {
        self.0 == Self::TRUE.0
    }

    pub const fn is_false(self) -> bool {
        self.0 == Self::FALSE.0
    }

    pub const fn is_terminal(self) -> bool {
        self.is_true() || self.is_false()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_true() {
            write!(f, "T")
        } else if self.is_false() {
            write!(f, "F")
        } else {
            write!(f, "@{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        assert!(Ref::TRUE.is_true());
        assert!(Ref::FALSE.is_false());
        assert!(Ref::TRUE.is_terminal());
        assert!(!Ref::new(3).is_terminal());
        assert_eq!(Ref::from_bool(true), Ref::TRUE);
        assert_eq!(Ref::from_bool(false), Ref::FALSE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Ref::TRUE.to_string(), "T");
        assert_eq!(Ref::FALSE.to_string(), "F");
        assert_eq!(Ref::new(42).to_string(), "@42");
    }
}
