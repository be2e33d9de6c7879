//! The metering state machine.
//!
//! ```text
//!            bind(source)                 bind(other)
//! Unbound ───────────────> Bound(source) ─────────────> Bound(other)
//!    ^                          │
//!    └──────── unbind() ────────┘
//! ```
//!
//! Binding inserts an analyser node fed by the source and allocates the
//! snapshot buffers. Sampling copies the latest analysis window into those
//! buffers and returns a borrowed view, so a display loop polls without
//! allocating. While unbound every sampling and level method returns `None`.

use std::sync::Arc;

use knobkit_graph::{AnalyserTap, EdgeId, GraphError, NodeId, RenderContext};

use crate::error::MeterError;
use crate::level;
use crate::settings::MeterSettings;
use crate::spectrum::Spectrum;

/// Resources held while a meter is bound.
#[derive(Debug)]
struct Binding {
    source: NodeId,
    analyser: NodeId,
    edge: EdgeId,
    tap: Arc<AnalyserTap>,
    time: Vec<f32>,
    frame: Vec<f32>,
    frequency: Vec<f32>,
    spectrum: Spectrum,
}

/// Level and spectrum meter attached to at most one source node.
#[derive(Debug)]
pub struct Meter {
    settings: MeterSettings,
    binding: Option<Binding>,
}

impl Meter {
    /// Creates an unbound meter.
    ///
    /// # Errors
    ///
    /// Returns the [`MeterSettings::validate()`] error for bad settings.
    pub fn new(settings: MeterSettings) -> Result<Self, MeterError> {
        settings.validate()?;
        Ok(Self {
            settings,
            binding: None,
        })
    }

    /// The meter's settings.
    pub fn settings(&self) -> &MeterSettings {
        &self.settings
    }

    /// Number of values a frequency snapshot holds.
    pub fn frequency_bin_count(&self) -> usize {
        self.settings.frequency_bin_count()
    }

    /// Whether a source is attached.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The attached source, if any.
    pub fn source(&self) -> Option<NodeId> {
        self.binding.as_ref().map(|b| b.source)
    }

    /// Attaches the meter to `source`, replacing any previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`MeterError::Graph`] if `source` cannot feed an analyser. The
    /// meter is then unbound.
    pub fn bind(&mut self, ctx: &mut RenderContext, source: NodeId) -> Result<(), MeterError> {
        self.unbind(ctx);

        let fft_size = self.settings.fft_size;
        let tap = Arc::new(AnalyserTap::new(fft_size));
        let analyser = ctx.add_analyser(Arc::clone(&tap));
        let edge = match ctx.connect(source, analyser) {
            Ok(edge) => edge,
            Err(e) => {
                if let Err(cleanup) = ctx.remove_node(analyser) {
                    tracing::warn!("meter: failed to remove analyser {analyser}: {cleanup}");
                }
                return Err(e.into());
            }
        };

        self.binding = Some(Binding {
            source,
            analyser,
            edge,
            tap,
            time: vec![0.0; fft_size],
            frame: vec![0.0; fft_size],
            frequency: vec![0.0; fft_size / 2],
            spectrum: Spectrum::new(fft_size, self.settings.smoothing),
        });
        tracing::debug!("meter bound to {source} (fft size {fft_size})");
        Ok(())
    }

    /// Detaches the meter and releases its buffers. Returns `false` if it
    /// was not bound.
    pub fn unbind(&mut self, ctx: &mut RenderContext) -> bool {
        let Some(binding) = self.binding.take() else {
            return false;
        };
        // Removing the source elsewhere already severed the edge.
        match ctx.disconnect(binding.edge) {
            Ok(()) | Err(GraphError::EdgeNotFound(_)) => {}
            Err(e) => tracing::warn!("meter: disconnect failed: {e}"),
        }
        if let Err(e) = ctx.remove_node(binding.analyser) {
            tracing::warn!("meter: failed to remove analyser {}: {e}", binding.analyser);
        }
        tracing::debug!("meter unbound from {}", binding.source);
        true
    }

    /// Copies the latest `fft_size` samples and returns them, oldest first.
    ///
    /// The view is overwritten by the next sampling call.
    pub fn sample_time_domain(&mut self) -> Option<&[f32]> {
        let binding = self.binding.as_mut()?;
        binding.tap.copy_latest(&mut binding.time);
        Some(&binding.time)
    }

    /// Analyses the latest window and returns `fft_size / 2` smoothed bin
    /// levels in dB.
    ///
    /// The view is overwritten by the next sampling call.
    pub fn sample_frequency_domain(&mut self) -> Option<&[f32]> {
        let binding = self.binding.as_mut()?;
        binding.tap.copy_latest(&mut binding.frame);
        binding
            .spectrum
            .analyse(&binding.frame, &mut binding.frequency);
        Some(&binding.frequency)
    }

    /// Peak level of the latest time-domain window, in dB.
    pub fn peak_db(&mut self) -> Option<f32> {
        self.sample_time_domain().map(level::peak_db)
    }

    /// RMS level of the latest time-domain window, in dB.
    pub fn rms_db(&mut self) -> Option<f32> {
        self.sample_time_domain().map(level::rms_db)
    }
}
