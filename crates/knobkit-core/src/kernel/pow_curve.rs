//! Power-curve kernel: maps the signal along `base^x` between `min` and `max`.

use libm::{logf, powf};

use super::{Flow, Kernel, KernelFault, param};
use crate::param::{BlockParams, KernelParamDescriptor};

const MIN: usize = 0;
const MAX: usize = 1;
const BASE: usize = 2;

static DESCRIPTORS: [KernelParamDescriptor; 3] = [
    KernelParamDescriptor::block("min", 1.0),
    KernelParamDescriptor::block("max", 100.0),
    KernelParamDescriptor::block("base", 2.0),
];

/// Clamps each sample into `[min, max]` and maps it along an exponential
/// curve with base `base`, the per-sample counterpart of
/// [`CurveShape::Pow2`](crate::CurveShape::Pow2).
///
/// Works best with `min >= 1`. Faults when `min <= 0`, `max <= min`, or the
/// base is not a positive number other than `1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PowCurve;

impl PowCurve {
    /// Creates the kernel.
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for PowCurve {
    fn name(&self) -> &'static str {
        "pow-curve"
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
        let min = param(params, MIN)?;
        let max = param(params, MAX)?;
        let base = param(params, BASE)?;

        if !(min > 0.0) || !min.is_finite() {
            return Err(KernelFault::InvalidParameter {
                name: "min",
                value: min,
            });
        }
        if !(max > min) || !max.is_finite() {
            return Err(KernelFault::InvalidParameter {
                name: "max",
                value: max,
            });
        }
        if !(base > 0.0) || base == 1.0 || !base.is_finite() {
            return Err(KernelFault::InvalidParameter {
                name: "base",
                value: base,
            });
        }

        let ln_base = logf(base);
        let log_min = logf(min) / ln_base;
        let log_range = logf(max) / ln_base - log_min;
        let range = max - min;

        for (out, &x) in output.iter_mut().zip(input) {
            let t = (x.clamp(min, max) - min) / range;
            *out = powf(base, t * log_range + log_min);
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[f32], params: &[f32]) -> Result<[f32; 4], KernelFault> {
        let mut out = [0.0; 4];
        PowCurve::new().process(input, &mut out, &BlockParams::from_values(params))?;
        Ok(out)
    }

    #[test]
    fn maps_and_clamps() {
        let out = run(&[1.0, 50.5, 100.0, 500.0], &[1.0, 100.0, 2.0]).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-4);
        assert!((out[1] - 10.0).abs() < 1e-3, "midpoint {}", out[1]);
        assert!((out[2] - 100.0).abs() < 1e-3);
        assert!((out[3] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn below_min_clamps_to_min() {
        let out = run(&[-3.0, 0.0, 0.5, 1.0], &[1.0, 100.0, 2.0]).unwrap();
        for v in out {
            assert!((v - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn result_is_independent_of_base() {
        let a = run(&[25.0; 4], &[1.0, 100.0, 2.0]).unwrap();
        let b = run(&[25.0; 4], &[1.0, 100.0, 10.0]).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-3);
    }

    #[test]
    fn invalid_parameters_fault() {
        assert_eq!(
            run(&[0.0; 4], &[0.0, 100.0, 2.0]),
            Err(KernelFault::InvalidParameter {
                name: "min",
                value: 0.0
            })
        );
        assert!(run(&[0.0; 4], &[10.0, 5.0, 2.0]).is_err());
        assert!(run(&[0.0; 4], &[1.0, 100.0, 1.0]).is_err());
        assert_eq!(
            run(&[0.0; 4], &[1.0, 100.0]),
            Err(KernelFault::MissingParameter { index: 2 })
        );
    }
}
