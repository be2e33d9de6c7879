//! Knobkit Core - the numeric engine behind knobs, faders and meters
//!
//! This crate holds everything a widget needs that does not touch the render
//! graph: curve mapping between control positions and parameter values, the
//! math those curves are built on, and the per-sample kernels that run inside
//! the render callback.
//!
//! # Core Abstractions
//!
//! ## Curves
//!
//! - [`CurvedRange`] - immutable `[min, max]` range with a [`CurveShape`]
//! - [`CurvedRange::curved_value`] / [`CurvedRange::linear_value`] - exact inverses
//!
//! ## Block-Rate Parameters
//!
//! - [`ParamBank`] - lock-free parameter set written by the control domain
//! - [`BlockParams`] - per-block snapshot handed to kernels
//! - [`KernelParamDescriptor`] - name, default, range and [`ParamRate`]
//!
//! ## Kernels
//!
//! - [`Kernel`] - object-safe trait invoked once per render block
//! - [`PowCurve`], [`DbToGain`], [`Scale`], [`Logger`], [`WaveShaper`]
//!
//! ## Utilities
//!
//! - Math functions: [`scale_value`], [`db_to_gain`], [`gain_to_db`],
//!   [`solve_quadratic`], [`log_base_n`], [`pow_base_n`], [`fit_to_bounds`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature to use the crate on embedded targets:
//!
//! ```toml
//! [dependencies]
//! knobkit-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use knobkit_core::{CurvedRange, scale_value};
//!
//! // A knob position in [0, 1] drives a frequency on a log curve.
//! let knob = 0.5;
//! let cutoff = CurvedRange::log(20.0, 20_000.0, 5.0)?;
//! let linear = scale_value(knob, 0.0, 1.0, cutoff.min(), cutoff.max())?;
//! let hz = cutoff.curved_value(linear)?;
//! assert!(hz > 20.0 && hz < 10_010.0);
//! # Ok::<(), knobkit_core::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod curve;
pub mod error;
pub mod kernel;
pub mod math;
pub mod param;

pub use curve::{CurveShape, CurvedRange};
pub use error::{Error, ErrorKind};
pub use kernel::{
    DEFAULT_CURVE_LENGTH, DbToGain, Flow, Kernel, KernelFault, Logger, PowCurve, ProbeSink, Scale,
    TransferCurve, WaveShaper,
};
pub use math::{
    QuadraticRoot, QuadraticSolution, db_to_gain, fit_to_bounds, gain_to_db, is_power_of_two,
    log_base_n, pow_base_n, round_to, scale_value, solve_quadratic,
};
pub use param::{
    BlockParam, BlockParams, KernelParamDescriptor, MAX_KERNEL_PARAMS, ParamBank, ParamRate,
};
