//! Diagnostic pass-through kernel.

use super::{Flow, Kernel, KernelFault};
use crate::param::{BlockParams, KernelParamDescriptor};

/// Receives one observation per block from a [`Logger`].
///
/// Called on the render thread: implementations must not block or allocate,
/// and may drop observations when they cannot keep up.
pub trait ProbeSink: Send {
    /// Records a representative sample for the block.
    fn observe(&mut self, label: &'static str, value: f32);
}

/// Copies input to output and reports the first sample of every block.
///
/// Blocks with no samples are passed through without an observation.
#[derive(Debug)]
pub struct Logger<S: ProbeSink> {
    label: &'static str,
    sink: S,
}

impl<S: ProbeSink> Logger<S> {
    /// Creates a logger that tags observations with `label`.
    pub fn new(label: &'static str, sink: S) -> Self {
        Self { label, sink }
    }

    /// The observation label.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<S: ProbeSink> Kernel for Logger<S> {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn parameter_descriptors(&self) -> &'static [KernelParamDescriptor] {
        &[]
    }

    fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        _params: &BlockParams,
    ) -> Result<Flow, KernelFault> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        if let Some(&first) = input.first() {
            self.sink.observe(self.label, first);
        }
        Ok(Flow::Continue)
    }
}
