//! Knobkit Meter - level and spectrum metering for render contexts
//!
//! A [`Meter`] taps a node of a [`RenderContext`](knobkit_graph::RenderContext)
//! and turns the most recent analysis window into the readings meter and
//! scope widgets draw:
//!
//! | Reading | Method | Length |
//! |---------|--------|--------|
//! | raw samples | [`Meter::sample_time_domain()`] | `fft_size` |
//! | smoothed spectrum, dB | [`Meter::sample_frequency_domain()`] | `fft_size / 2` |
//! | peak level, dB | [`Meter::peak_db()`] | scalar |
//! | RMS level, dB | [`Meter::rms_db()`] | scalar |
//!
//! The free functions [`peak_db()`] and [`rms_db()`] work on any buffer.
//! [`RefreshLoop`] drives the polling at display rate.
//!
//! # Example
//!
//! ```rust
//! use knobkit_graph::{ContextConfig, RenderContext};
//! use knobkit_meter::{Meter, MeterSettings};
//!
//! let mut ctx = RenderContext::new(ContextConfig::default());
//! let source = ctx.add_constant_source(0.5);
//! ctx.start_source(source).unwrap();
//!
//! let mut meter = Meter::new(MeterSettings::with_fft_size(128)).unwrap();
//! assert!(meter.peak_db().is_none());
//!
//! meter.bind(&mut ctx, source).unwrap();
//! let mut out = vec![0.0; ctx.block_size()];
//! ctx.render_block(&[], &mut out);
//!
//! let peak = meter.peak_db().unwrap();
//! assert!((peak + 6.02).abs() < 0.01);
//! ```

pub mod error;
pub mod level;
pub mod meter;
pub mod refresh;
pub mod settings;
pub mod spectrum;

pub use error::MeterError;
pub use level::{peak, peak_db, rms, rms_db};
pub use meter::Meter;
pub use refresh::{DEFAULT_FRAME_INTERVAL, RefreshLoop, StopHandle};
pub use settings::{
    DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING, MAX_FFT_SIZE, MIN_FFT_SIZE, MeterSettings,
};
pub use spectrum::blackman_window;
