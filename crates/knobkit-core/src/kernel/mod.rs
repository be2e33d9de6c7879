//! Per-sample processing kernels for the render domain.
//!
//! A [`Kernel`] processes one mono render block at a time. Its parameters are
//! declared up front through [`Kernel::parameter_descriptors()`] and arrive in
//! [`process()`](Kernel::process) as a [`BlockParams`] snapshot taken at the
//! block boundary.
//!
//! # Real-time Contract
//!
//! `process` runs on the render thread: no allocation, no locks, no I/O.
//! A kernel reports failure by returning a [`KernelFault`]; the host then
//! disables it and outputs silence in its place. Returning [`Flow::Retire`]
//! removes the kernel from future blocks without counting as a failure.
//!
//! # Kernels
//!
//! | Kernel | Parameters | Output |
//! |--------|------------|--------|
//! | [`PowCurve`] | `min`, `max`, `base` | input clamped to `[min, max]`, mapped along `base^x` |
//! | [`DbToGain`] | `min_threshold` | `0` below the threshold, else `10^(x/20)` |
//! | [`Scale`] | `input_min`, `input_max`, `output_min`, `output_max` | affine remap |
//! | [`Logger`] | none | pass-through, first sample sent to a [`ProbeSink`] |
//! | [`WaveShaper`] | none | table lookup through a [`TransferCurve`] |

use core::fmt;

use crate::param::{BlockParams, KernelParamDescriptor};

mod db_to_gain;
mod logger;
mod pow_curve;
mod scale;
mod shaper;

pub use db_to_gain::DbToGain;
pub use logger::{Logger, ProbeSink};
pub use pow_curve::PowCurve;
pub use scale::Scale;
pub use shaper::{DEFAULT_CURVE_LENGTH, TransferCurve, WaveShaper};

/// Whether the host should keep calling a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Call again next block.
    Continue,
    /// Retire the kernel; its output is silent from now on.
    Retire,
}

/// A failure inside [`Kernel::process`]. Never allocates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelFault {
    /// The snapshot lacks a declared parameter.
    MissingParameter {
        /// Index into the descriptor list.
        index: usize,
    },
    /// A parameter value makes the kernel's math undefined.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// Any other failure, with a static reason.
    Failed(&'static str),
}

impl fmt::Display for KernelFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParameter { index } => write!(f, "parameter #{index} missing"),
            Self::InvalidParameter { name, value } => {
                write!(f, "parameter '{name}' has invalid value {value}")
            }
            Self::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelFault {}

/// A real-time processing unit invoked once per render block.
pub trait Kernel: Send {
    /// Registration name, e.g. `"pow-curve"`.
    fn name(&self) -> &'static str;

    /// Parameters the host must provide, in snapshot order.
    fn parameter_descriptors(&self) -> &'static [KernelParamDescriptor];

    /// Processes one block.
    ///
    /// `input` and `output` have the same length. `params` holds one value per
    /// descriptor, in declaration order.
    fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        params: &BlockParams,
    ) -> Result<Flow, KernelFault>;
}

/// Reads parameter `index` from a snapshot.
#[inline]
pub(crate) fn param(params: &BlockParams, index: usize) -> Result<f32, KernelFault> {
    params
        .get(index)
        .ok_or(KernelFault::MissingParameter { index })
}
