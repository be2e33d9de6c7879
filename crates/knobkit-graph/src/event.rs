//! Notifications from the render domain to the control domain.
//!
//! The render thread never logs and never blocks. It reports through a bounded
//! crossbeam channel with `try_send`; when the channel is full the event is
//! dropped. The control domain drains the channel with
//! [`RenderContext::drain_events()`](crate::RenderContext::drain_events),
//! which also logs each event.

use crossbeam_channel::{Sender, TrySendError};
use knobkit_core::{KernelFault, ProbeSink};

use crate::node::NodeId;

/// Something the render thread wants the control domain to know.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A kernel failed and was disabled; its output is silent from now on.
    KernelFaulted {
        /// The kernel's node.
        node: NodeId,
        /// Kernel registration name.
        kernel: &'static str,
        /// The reported fault, or `None` if the kernel panicked.
        fault: Option<KernelFault>,
    },
    /// A kernel asked to be retired.
    KernelRetired {
        /// The kernel's node.
        node: NodeId,
        /// Kernel registration name.
        kernel: &'static str,
    },
    /// A diagnostic observation from a [`Logger`](knobkit_core::Logger) kernel.
    Probe {
        /// Label given to the logger.
        label: &'static str,
        /// First sample of the block.
        value: f32,
    },
}

/// A [`ProbeSink`] that forwards observations into a context's event channel.
///
/// Obtained from [`RenderContext::probe()`](crate::RenderContext::probe).
#[derive(Debug, Clone)]
pub struct ChannelProbe {
    tx: Sender<RenderEvent>,
    dropped: u64,
}

impl ChannelProbe {
    pub(crate) fn new(tx: Sender<RenderEvent>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Observations dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ProbeSink for ChannelProbe {
    fn observe(&mut self, label: &'static str, value: f32) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(RenderEvent::Probe { label, value }) {
            self.dropped += 1;
        }
    }
}
