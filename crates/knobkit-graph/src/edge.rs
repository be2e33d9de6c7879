//! Graph edge types.
//!
//! An `Edge` carries a node's output block into another node's input, where
//! all incoming blocks are summed.

use core::fmt;

use crate::node::NodeId;

/// Unique identifier for a connection in a render context.
///
/// Edge IDs are assigned sequentially and never reused within a context, so
/// a stale ID can always be told apart from a live one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}
