//! Affine range remap, per sample.

use super::{Flow, Kernel, KernelFault, param};
use crate::param::{BlockParams, KernelParamDescriptor};

const INPUT_MIN: usize = 0;
const INPUT_MAX: usize = 1;
const OUTPUT_MIN: usize = 2;
const OUTPUT_MAX: usize = 3;

static DESCRIPTORS: [KernelParamDescriptor; 4] = [
    KernelParamDescriptor::block("input_min", 0.0),
    KernelParamDescriptor::block("input_max", 1.0),
    KernelParamDescriptor::block("output_min", 0.0),
    KernelParamDescriptor::block("output_max", 1.0),
];

/// Applies [`scale_value`](crate::scale_value) to every sample, with the four
/// range bounds as block-rate parameters.
///
/// Faults if `input_min == input_max` for a block.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scale;

impl Scale {
    /// Creates the kernel.
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for Scale {
    fn name(&self) -> &'static str {
        "scale"
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
        let in_min = param(params, INPUT_MIN)?;
        let in_max = param(params, INPUT_MAX)?;
        let out_min = param(params, OUTPUT_MIN)?;
        let out_max = param(params, OUTPUT_MAX)?;

        let in_range = in_max - in_min;
        if in_range == 0.0 || !in_range.is_finite() {
            return Err(KernelFault::InvalidParameter {
                name: "input_max",
                value: in_max,
            });
        }
        let factor = (out_max - out_min) / in_range;

        for (out, &x) in output.iter_mut().zip(input) {
            *out = out_min + factor * (x - in_min);
        }
        Ok(Flow::Continue)
    }
}
