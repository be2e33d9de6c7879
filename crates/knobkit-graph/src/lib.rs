//! Knobkit Graph - render context, range-adaptation segments and kernel host
//!
//! This crate runs the audio-rate half of knobkit. Widgets describe the
//! signal path as a directed acyclic graph of primitive nodes; the render
//! thread walks it one fixed-size block at a time.
//!
//! # Node Kinds
//!
//! | Kind | Inputs | Renders |
//! |------|--------|---------|
//! | input | none | one channel of the host input |
//! | constant source | none | a block-rate offset while started |
//! | gain | summed | the sum times a block-rate gain |
//! | kernel | summed | a [`Kernel`](knobkit_core::Kernel), fault-isolated |
//! | analyser | summed | the sum, copied into an [`AnalyserTap`] |
//! | destination | summed | the context output |
//!
//! # Components
//!
//! - [`RenderContext`] - graph mutation API and allocation-free block renderer
//! - [`SignalScaler`] / [`SignalToRatio`] - owned sub-graphs remapping a signal range
//! - [`shared_context()`] - lazily created process-wide context with an init-once guard
//! - [`request_source()`] - asynchronous input acquisition returning a [`PendingSource`]
//! - [`RenderEvent`] - kernel faults, retirements and probe readings sent from the render thread
//!
//! # Timing Domains
//!
//! Graph construction and disposal happen in the control domain. The render
//! domain only reads block-rate parameters, which are stored in atomics and
//! picked up at the next block boundary. The render thread never blocks,
//! never logs and never allocates outside a kernel panic.
//!
//! # Example
//!
//! ```rust
//! use knobkit_core::DbToGain;
//! use knobkit_graph::{ContextConfig, RenderContext};
//!
//! let mut ctx = RenderContext::new(ContextConfig { block_size: 4, ..Default::default() });
//! let input = ctx.add_input(0);
//! let gain = ctx.add_kernel(Box::new(DbToGain::new())).unwrap();
//! ctx.connect(input, gain.node()).unwrap();
//! ctx.connect(gain.node(), ctx.destination()).unwrap();
//!
//! let db = [0.0, -20.0, -100.0, 20.0];
//! let mut out = [0.0; 4];
//! ctx.render_block(&[&db[..]], &mut out);
//! assert!((out[1] - 0.1).abs() < 1e-6);
//! assert_eq!(out[2], 0.0);
//! ```

pub mod context;
pub mod edge;
pub mod error;
pub mod event;
pub mod node;
pub mod shared;
pub mod source;
pub mod tap;
pub mod transform;

pub use context::{ContextConfig, KernelHandle, RenderContext};
pub use edge::EdgeId;
pub use error::GraphError;
pub use event::{ChannelProbe, RenderEvent};
pub use node::{KernelState, NodeId, SourceState};
pub use shared::{
    SharedContext, release_shared_context, render_shared, shared_context, try_shared_context,
};
pub use source::{AcquireError, AcquiredSource, PendingSource, SourceProvider, request_source};
pub use tap::AnalyserTap;
pub use transform::{SignalScaler, SignalToRatio};
