//! Decibel-to-gain kernel.

use libm::powf;

use super::{Flow, Kernel, KernelFault, param};
use crate::param::{BlockParams, KernelParamDescriptor};

const MIN_THRESHOLD: usize = 0;

static DESCRIPTORS: [KernelParamDescriptor; 1] =
    [KernelParamDescriptor::block("min_threshold", -80.0)];

/// Converts a signal carrying decibel values into linear gain.
///
/// Samples below `min_threshold` (default -80 dB) become `0`. Results that
/// overflow `f32` are also written as `0`, so no infinity leaves the kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct DbToGain;

impl DbToGain {
    /// Creates the kernel.
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for DbToGain {
    fn name(&self) -> &'static str {
        "db-to-gain"
    }

    fn parameter_descriptors(&self) -> &'static [KernelParamDescriptor] {
        &DESCRIPTORS
    }

    fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        params: &BlockParams,
    ) -> Result<Flow, KernelFault> {
        let threshold = param(params, MIN_THRESHOLD)?;

        for (out, &db) in output.iter_mut().zip(input) {
            *out = if db < threshold {
                0.0
            } else {
                let gain = powf(10.0, db / 20.0);
                if gain.is_finite() { gain } else { 0.0 }
            };
        }
        Ok(Flow::Continue)
    }
}
