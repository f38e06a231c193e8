//! Core newtypes for type-safe index operations.
//!
//! Item ids and node ids are both small integers; keeping them apart in the
//! type system stops a node offset from being returned as a search hit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Positional identifier of a corpus item.
///
/// The id is the insertion index of the vector in the source sequence, in
/// `[0, N)`. Mapping ids back to content is the caller's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ItemId(pub u32);

impl ItemId {
    /// Create a new ItemId.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Get the id as a row index into the vector table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl From<u32> for ItemId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ItemId> for u32 {
    #[inline]
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Index of a node inside one tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Get the id as an arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id() {
        let id = ItemId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "ItemId(42)");

        let id2: ItemId = 100u32.into();
        assert_eq!(u32::from(id2), 100);
    }

    #[test]
    fn test_ordering() {
        assert!(ItemId::new(1) < ItemId::new(2));
        assert_eq!(NodeId::ROOT.index(), 0);
    }
}
