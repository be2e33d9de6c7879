//! Graph node types.
//!
//! Each node in a render context has a [`NodeId`] and a [`NodeKind`] that
//! decides what it does with the sum of its inputs. The `NodeData` struct
//! bundles the kind with bookkeeping: adjacency lists and the node's
//! pre-allocated output block.

use core::fmt;
use std::sync::Arc;

use knobkit_core::{BlockParam, BlockParams, Kernel, KernelParamDescriptor, ParamBank};

use crate::edge::EdgeId;
use crate::tap::AnalyserTap;

/// Unique identifier for a node in a render context.
///
/// Node IDs are assigned sequentially and never reused within a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Lifecycle of a constant-offset source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Created, silent until started.
    Idle,
    /// Producing its offset.
    Running,
    /// Stopped for good; cannot be restarted.
    Stopped,
}

/// Lifecycle of a hosted kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    /// Processing every block.
    Active,
    /// Returned [`Flow::Retire`](knobkit_core::Flow::Retire); silent.
    Retired,
    /// Failed or panicked; disabled and silent.
    Faulted,
}

/// Descriptor for the gain multiplier of a gain node.
pub(crate) const GAIN_DESCRIPTOR: KernelParamDescriptor = KernelParamDescriptor::block("gain", 1.0);

/// Descriptor for the offset of a constant source.
pub(crate) const OFFSET_DESCRIPTOR: KernelParamDescriptor =
    KernelParamDescriptor::block("offset", 1.0);

/// A kernel plus the state the host keeps for it.
pub(crate) struct KernelSlot {
    pub kernel: Box<dyn Kernel>,
    pub params: Arc<ParamBank>,
    pub snapshot: BlockParams,
    pub state: KernelState,
}

/// The role of a node in a render context.
pub(crate) enum NodeKind {
    /// Reads one channel of the host input.
    Input { channel: usize },
    /// Final mono output. Exactly one per context.
    Destination,
    /// Emits a block-rate offset while running. Takes no inputs.
    ConstantSource {
        offset: Arc<BlockParam>,
        state: SourceState,
    },
    /// Multiplies the summed input by a block-rate gain.
    Gain { gain: Arc<BlockParam> },
    /// Runs a per-sample kernel.
    Kernel(KernelSlot),
    /// Passes the input through and copies it into an analysis tap.
    Analyser(Arc<AnalyserTap>),
}

impl NodeKind {
    /// Short human-readable kind name, for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Destination => "destination",
            Self::ConstantSource { .. } => "constant source",
            Self::Gain { .. } => "gain",
            Self::Kernel(_) => "kernel",
            Self::Analyser(_) => "analyser",
        }
    }

    /// Whether edges may point into this node.
    pub fn accepts_input(&self) -> bool {
        !matches!(self, Self::Input { .. } | Self::ConstantSource { .. })
    }
}

/// Internal bookkeeping for a node in the graph.
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Edges arriving at this node.
    pub incoming: Vec<EdgeId>,
    /// Edges leaving this node.
    pub outgoing: Vec<EdgeId>,
    /// Pre-allocated output block, rewritten every render.
    pub output: Vec<f32>,
}

impl NodeData {
    /// Creates a node with a silent output block of `block_size` samples.
    pub fn new(kind: NodeKind, block_size: usize) -> Self {
        Self {
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            output: vec![0.0; block_size],
        }
    }
}
