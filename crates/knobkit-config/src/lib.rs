//! Knobkit Config - TOML configuration for widget signal paths
//!
//! A [`KnobkitConfig`] names the curves, scaler segments, kernels and meters
//! a widget set uses, plus the render context settings. Entries are looked up
//! by name and turned into live objects:
//!
//! | Section | Lookup | Produces |
//! |---------|--------|----------|
//! | `[render]` | [`KnobkitConfig::render()`] | [`ContextConfig`](knobkit_graph::ContextConfig) |
//! | `[curves.*]` | [`KnobkitConfig::curve()`] | [`CurvedRange`](knobkit_core::CurvedRange) |
//! | `[scalers.*]` | [`KnobkitConfig::scaler()`] | [`SignalScaler`](knobkit_graph::SignalScaler) |
//! | `[kernels.*]` | [`KnobkitConfig::build_kernel()`] | [`KernelSetup`] |
//! | `[meters.*]` | [`KnobkitConfig::meter()`] | [`MeterSettings`](knobkit_meter::MeterSettings) |
//!
//! # Example
//!
//! ```rust
//! use knobkit_config::KnobkitConfig;
//!
//! let config = KnobkitConfig::from_toml_str(r#"
//!     [curves.cutoff]
//!     kind = "log"
//!     min = 20.0
//!     max = 20000.0
//!     curve_amount = 4.0
//! "#).unwrap();
//! config.validate().unwrap();
//!
//! let cutoff = config.curve("cutoff").unwrap();
//! let linear = cutoff.linear_value(1000.0).unwrap();
//! assert!((cutoff.curved_value(linear).unwrap() - 1000.0).abs() < 1e-6);
//! ```

pub mod document;
pub mod error;
pub mod validation;

pub use document::{
    CurveConfig, CurveKind, KernelConfig, KernelSetup, KnobkitConfig, MAX_BLOCK_SIZE, MeterConfig,
    RenderSection, ScalerConfig, ShaperKind,
};
pub use error::ConfigError;
pub use validation::{ValidationError, ValidationResult};
