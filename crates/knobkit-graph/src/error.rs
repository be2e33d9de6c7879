//! Error types for render-graph operations.

use thiserror::Error;

use crate::edge::EdgeId;
use crate::node::NodeId;

/// Errors that can occur while editing the render graph or its segments.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// The specified node was not found in the context.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The specified edge was not found, or was already disconnected.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// Adding this edge would create a cycle.
    #[error("adding this edge would create a cycle")]
    CycleDetected,

    /// A node has an invalid connection (e.g., an edge into a constant source).
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// A duplicate edge already exists between these nodes.
    #[error("edge from {0} to {1} already exists")]
    DuplicateEdge(NodeId, NodeId),

    /// The node is not of the kind the operation needs.
    #[error("node {node} is not a {expected}")]
    WrongKind {
        /// The node that was addressed.
        node: NodeId,
        /// What the operation expected, e.g. `"constant source"`.
        expected: &'static str,
    },

    /// A source was started twice, or stopped before starting.
    #[error("invalid source state for {node}: {reason}")]
    InvalidSourceState {
        /// The source node.
        node: NodeId,
        /// What went wrong.
        reason: &'static str,
    },

    /// A kernel parameter descriptor has an unordered or NaN range, or a
    /// default outside it.
    #[error("kernel '{kernel}' parameter '{param}' has an invalid range")]
    InvalidParameterRange {
        /// Kernel registration name.
        kernel: &'static str,
        /// Offending parameter name.
        param: &'static str,
    },

    /// A kernel declares more parameters than a block snapshot holds.
    #[error("kernel '{kernel}' declares {count} parameters, at most {max} are supported")]
    TooManyParameters {
        /// Kernel registration name.
        kernel: &'static str,
        /// Declared parameter count.
        count: usize,
        /// Snapshot capacity.
        max: usize,
    },

    /// A segment was used after `dispose()`.
    #[error("segment '{0}' has already been disposed")]
    Disposed(&'static str),

    /// A segment was configured with a range it cannot scale across.
    #[error("invalid segment configuration: {0}")]
    Config(#[from] knobkit_core::Error),
}
