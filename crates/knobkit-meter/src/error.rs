//! Error types for meter configuration and binding.

use knobkit_graph::GraphError;
use thiserror::Error;

/// Errors raised while configuring or binding a [`Meter`](crate::Meter).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeterError {
    /// FFT size is not a power of two in the supported range.
    #[error("FFT size {size} must be a power of two in [{min}, {max}]")]
    InvalidFftSize {
        /// The rejected size.
        size: usize,
        /// Smallest supported size.
        min: usize,
        /// Largest supported size.
        max: usize,
    },

    /// Smoothing constant outside `[0, 1)`.
    #[error("smoothing {0} must be in [0, 1)")]
    InvalidSmoothing(f32),

    /// Wiring the analysis tap into the render context failed.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}
