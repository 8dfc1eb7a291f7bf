//! Identifiers for definitions.

use std::fmt;

/// Index of a [`Definition`](super::Definition) in the symbol table arena.
///
/// Ids are assigned sequentially as declarations are discovered and are
/// never reused; definitions are not removed once created.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DefId(u32);

impl DefId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefId({})", self.0)
    }
}

impl From<u32> for DefId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}
