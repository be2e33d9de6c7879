//! Wave-shaper kernel driven by a sampled transfer curve.
//!
//! A [`TransferCurve`] samples a transfer function at `length` evenly spaced
//! points across `[-1, 1]`. Lookup clamps the input to `[-1, 1]` and linearly
//! interpolates between neighbouring points, so the shaped signal is only
//! defined for inputs inside that interval.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use libm::{floorf, pow};

use super::{Flow, Kernel, KernelFault};
use crate::error::Error;
use crate::math::scale_value;
use crate::param::{BlockParams, KernelParamDescriptor};

/// Table length used by the named constructors.
pub const DEFAULT_CURVE_LENGTH: usize = 1024;

/// A transfer function sampled over `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferCurve {
    table: Vec<f32>,
}

impl TransferCurve {
    /// Samples `transfer(x, i)` at `x_i = 2i/(length-1) - 1`.
    ///
    /// With `normalize`, the table is rescaled so its first point maps to `-1`
    /// and its last point to `1`.
    ///
    /// # Errors
    ///
    /// - [`Error::DegenerateRange`] if `length < 2`, or when normalizing a
    ///   table whose first and last points are equal
    /// - [`Error::Overflow`] if the function yields a non-finite value
    pub fn from_fn(
        length: usize,
        transfer: impl Fn(f64, usize) -> f64,
        normalize: bool,
    ) -> Result<Self, Error> {
        if length < 2 {
            return Err(Error::DegenerateRange {
                min: 0.0,
                max: length as f64,
            });
        }

        let last = (length - 1) as f64;
        let mut points = Vec::with_capacity(length);
        for i in 0..length {
            let x = i as f64 / last * 2.0 - 1.0;
            let y = transfer(x, i);
            if !y.is_finite() {
                return Err(Error::Overflow);
            }
            points.push(y);
        }

        if normalize {
            let (first, end) = (points[0], points[length - 1]);
            for y in &mut points {
                *y = scale_value(*y, first, end, -1.0, 1.0)?;
            }
        }

        Ok(Self {
            table: points.into_iter().map(|y| y as f32).collect(),
        })
    }

    /// Signed power curve: `sign(x)·|x|^exponent`.
    pub fn exp_scaler(exponent: f64) -> Result<Self, Error> {
        Self::from_fn(
            DEFAULT_CURVE_LENGTH,
            |x, _| {
                if x >= 0.0 {
                    pow(x, exponent)
                } else {
                    -pow(-x, exponent)
                }
            },
            false,
        )
    }

    /// `x + amount`.
    pub fn addition(amount: f64) -> Result<Self, Error> {
        Self::from_fn(DEFAULT_CURVE_LENGTH, |x, _| x + amount, false)
    }

    /// `x - amount`.
    pub fn subtraction(amount: f64) -> Result<Self, Error> {
        Self::from_fn(DEFAULT_CURVE_LENGTH, |x, _| x - amount, false)
    }

    /// `x · amount`.
    pub fn multiplication(amount: f64) -> Result<Self, Error> {
        Self::from_fn(DEFAULT_CURVE_LENGTH, |x, _| x * amount, false)
    }

    /// Number of table points.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always `false`; a curve holds at least two points.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The sampled points.
    pub fn points(&self) -> &[f32] {
        &self.table
    }

    /// Evaluates the curve at `x`. NaN reads the centre of the curve.
    #[inline]
    pub fn lookup(&self, x: f32) -> f32 {
        let x = if x.is_nan() { 0.0 } else { x };
        let last = self.table.len() - 1;
        let pos = (last as f32) * 0.5 * (x + 1.0);
        if pos <= 0.0 {
            return self.table[0];
        }
        if pos >= last as f32 {
            return self.table[last];
        }
        let k = floorf(pos) as usize;
        let frac = pos - k as f32;
        let a = self.table[k];
        let b = self.table[(k + 1).min(last)];
        a + (b - a) * frac
    }
}

/// Shapes the signal through a [`TransferCurve`]. Declares no parameters.
#[derive(Debug, Clone)]
pub struct WaveShaper {
    curve: TransferCurve,
}

impl WaveShaper {
    /// Creates a shaper over `curve`.
    pub fn new(curve: TransferCurve) -> Self {
        Self { curve }
    }

    /// The transfer curve.
    pub fn curve(&self) -> &TransferCurve {
        &self.curve
    }
}

impl Kernel for WaveShaper {
    fn name(&self) -> &'static str {
        "wave-shaper"
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
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.curve.lookup(x);
        }
        Ok(Flow::Continue)
    }
}
