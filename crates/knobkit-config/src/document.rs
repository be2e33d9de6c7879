//! The knobkit configuration document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use knobkit_core::{
    CurvedRange, DbToGain, Kernel, KernelParamDescriptor, PowCurve, Scale, TransferCurve,
    WaveShaper,
};
use knobkit_graph::{ContextConfig, KernelHandle, NodeId, RenderContext, SignalScaler};
use knobkit_meter::{DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING, MeterSettings};

use crate::error::ConfigError;
use crate::validation::{ValidationError, ValidationResult};

/// Largest accepted render block.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Widget signal-path configuration.
///
/// Named entries live in one table per kind; widgets look them up by name.
///
/// # TOML Format
///
/// ```toml
/// [render]
/// sample_rate = 48000
/// block_size = 128
///
/// [curves.cutoff]
/// kind = "log"
/// min = 20.0
/// max = 20000.0
/// curve_amount = 4.0
///
/// [scalers.lfo_to_cutoff]
/// input_min = -1.0
/// input_max = 1.0
/// output_min = 200.0
/// output_max = 2000.0
///
/// [kernels.level]
/// kind = "db_to_gain"
/// [kernels.level.params]
/// min_threshold = -80.0
///
/// [meters.master]
/// fft_size = 2048
/// smoothing = 0.8
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KnobkitConfig {
    /// Render context settings.
    #[serde(default)]
    pub render: RenderSection,

    /// Curved ranges by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub curves: BTreeMap<String, CurveConfig>,

    /// Signal scaler segments by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scalers: BTreeMap<String, ScalerConfig>,

    /// Per-sample kernels by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kernels: BTreeMap<String, KernelConfig>,

    /// Meters by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meters: BTreeMap<String, MeterConfig>,
}

/// `[render]`: render context settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RenderSection {
    /// Sample rate in Hz (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Samples per render block (defaults to 128).
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Capacity of the render-event channel (defaults to 256).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_block_size() -> usize {
    128
}

fn default_event_capacity() -> usize {
    256
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Curve family of a `[curves.*]` entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Identity mapping.
    Linear,
    /// Exponential curve; needs `curve_amount`.
    Log,
    /// Inverse of `log`; needs `curve_amount`.
    InverseLog,
    /// Quadratic Bezier.
    QuadBezier,
    /// Base-2 power curve.
    Pow2,
}

/// `[curves.<name>]`: a curved range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurveConfig {
    /// Curve family.
    pub kind: CurveKind,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Shape parameter for `log` and `inverse_log`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve_amount: Option<f64>,
}

impl CurveConfig {
    /// Builds the curve; `name` is used in errors.
    pub fn build(&self, name: &str) -> Result<CurvedRange, ConfigError> {
        let amount = || {
            self.curve_amount.ok_or_else(|| ConfigError::MissingField {
                section: "curves",
                name: name.to_string(),
                field: "curve_amount",
            })
        };
        let built = match self.kind {
            CurveKind::Linear => CurvedRange::linear(self.min, self.max),
            CurveKind::Log => CurvedRange::log(self.min, self.max, amount()?),
            CurveKind::InverseLog => CurvedRange::inverse_log(self.min, self.max, amount()?),
            CurveKind::QuadBezier => CurvedRange::quad_bezier(self.min, self.max),
            CurveKind::Pow2 => CurvedRange::pow2(self.min, self.max),
        };
        built.map_err(|source| ConfigError::Build {
            section: "curves",
            name: name.to_string(),
            source,
        })
    }
}

/// `[scalers.<name>]`: a signal scaler segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScalerConfig {
    /// Lower bound of the incoming signal.
    pub input_min: f32,
    /// Upper bound of the incoming signal.
    pub input_max: f32,
    /// Lower bound of the output (defaults to 0).
    #[serde(default)]
    pub output_min: f32,
    /// Upper bound of the output (defaults to 1).
    #[serde(default = "default_output_max")]
    pub output_max: f32,
}

fn default_output_max() -> f32 {
    1.0
}

impl ScalerConfig {
    fn check(&self) -> Result<(), &'static str> {
        let finite = [self.input_min, self.input_max, self.output_min, self.output_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            Err("bounds must be finite")
        } else if self.input_min == self.input_max {
            Err("input_min and input_max must differ")
        } else {
            Ok(())
        }
    }
}

/// Wave-shaper transfer function of a `wave_shaper` kernel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShaperKind {
    /// `sign(x)·|x|^amount`
    Exp,
    /// `x + amount`
    Add,
    /// `x - amount`
    Sub,
    /// `x · amount`
    Mul,
}

impl ShaperKind {
    fn curve(self, amount: f64) -> Result<TransferCurve, knobkit_core::Error> {
        match self {
            ShaperKind::Exp => TransferCurve::exp_scaler(amount),
            ShaperKind::Add => TransferCurve::addition(amount),
            ShaperKind::Sub => TransferCurve::subtraction(amount),
            ShaperKind::Mul => TransferCurve::multiplication(amount),
        }
    }
}

/// `[kernels.<name>]`: a per-sample kernel and its initial parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelConfig {
    /// Power curve with `min`, `max` and `base` parameters.
    PowCurve {
        /// Initial parameter values by name.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, f32>,
    },
    /// dB to linear gain with a `min_threshold` parameter.
    DbToGain {
        /// Initial parameter values by name.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, f32>,
    },
    /// Affine remap with `input_min`, `input_max`, `output_min`, `output_max`.
    Scale {
        /// Initial parameter values by name.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, f32>,
    },
    /// Table-driven wave shaper.
    WaveShaper {
        /// Transfer function.
        shaper: ShaperKind,
        /// Transfer function constant.
        amount: f64,
    },
}

impl KernelConfig {
    fn params(&self) -> Option<&BTreeMap<String, f32>> {
        match self {
            KernelConfig::PowCurve { params }
            | KernelConfig::DbToGain { params }
            | KernelConfig::Scale { params } => Some(params),
            KernelConfig::WaveShaper { .. } => None,
        }
    }

    fn instantiate(&self, name: &str) -> Result<Box<dyn Kernel>, ConfigError> {
        Ok(match self {
            KernelConfig::PowCurve { .. } => Box::new(PowCurve::new()),
            KernelConfig::DbToGain { .. } => Box::new(DbToGain::new()),
            KernelConfig::Scale { .. } => Box::new(Scale::new()),
            KernelConfig::WaveShaper { shaper, amount } => {
                let curve = shaper.curve(*amount).map_err(|source| ConfigError::Build {
                    section: "kernels",
                    name: name.to_string(),
                    source,
                })?;
                Box::new(WaveShaper::new(curve))
            }
        })
    }

    /// Checks parameter names and ranges against the kernel's descriptors.
    fn check_params(
        name: &str,
        descriptors: &[KernelParamDescriptor],
        params: &BTreeMap<String, f32>,
        errors: &mut Vec<ValidationError>,
    ) {
        for (param, &value) in params {
            match descriptors.iter().find(|d| d.name == param.as_str()) {
                None => errors.push(ValidationError::UnknownParameter {
                    kernel: name.to_string(),
                    param: param.clone(),
                }),
                Some(d) if !(d.min..=d.max).contains(&value) => {
                    errors.push(ValidationError::OutOfRange {
                        param: format!("kernels.{name}.{param}"),
                        value: f64::from(value),
                        min: f64::from(d.min),
                        max: f64::from(d.max),
                    });
                }
                Some(_) => {}
            }
        }
    }
}

/// A configured kernel ready to be registered with a render context.
pub struct KernelSetup {
    /// Entry name.
    pub name: String,
    /// The kernel instance.
    pub kernel: Box<dyn Kernel>,
    /// Initial parameter values, applied by [`install()`](Self::install).
    pub params: Vec<(String, f32)>,
}

impl std::fmt::Debug for KernelSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelSetup")
            .field("name", &self.name)
            .field("kernel", &self.kernel.name())
            .field("params", &self.params)
            .finish()
    }
}

impl KernelSetup {
    /// Registers the kernel with `ctx` and writes its initial parameters.
    pub fn install(self, ctx: &mut RenderContext) -> Result<KernelHandle, ConfigError> {
        let handle = ctx.add_kernel(self.kernel)?;
        for (param, value) in &self.params {
            if !handle.set(param, *value) {
                tracing::warn!("kernel '{}' has no parameter '{param}'", self.name);
            }
        }
        tracing::debug!("kernel '{}' installed at {}", self.name, handle.node());
        Ok(handle)
    }
}

/// `[meters.<name>]`: analysis settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeterConfig {
    /// FFT size (defaults to 2048).
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Spectral smoothing (defaults to 0.8).
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

fn default_fft_size() -> usize {
    DEFAULT_FFT_SIZE
}

fn default_smoothing() -> f32 {
    DEFAULT_SMOOTHING
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
        }
    }
}

impl MeterConfig {
    /// The entry as meter settings.
    pub fn settings(&self) -> MeterSettings {
        MeterSettings {
            fft_size: self.fft_size,
            smoothing: self.smoothing,
        }
    }
}

impl KnobkitConfig {
    /// Parses a configuration from a TOML string without validating it.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        tracing::debug!(
            "loaded {}: {} curves, {} scalers, {} kernels, {} meters",
            path.display(),
            config.curves.len(),
            config.scalers.len(),
            config.kernels.len(),
            config.meters.len()
        );
        Ok(config)
    }

    /// Saves the configuration, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!("saved {}", path.display());
        Ok(())
    }

    /// Checks every entry, reporting all problems together.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        let render = &self.render;
        if render.sample_rate == 0 {
            errors.push(ValidationError::OutOfRange {
                param: "render.sample_rate".to_string(),
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        if !(1..=MAX_BLOCK_SIZE).contains(&render.block_size) {
            errors.push(ValidationError::OutOfRange {
                param: "render.block_size".to_string(),
                value: render.block_size as f64,
                min: 1.0,
                max: MAX_BLOCK_SIZE as f64,
            });
        }

        for (name, curve) in &self.curves {
            if let Err(e) = curve.build(name) {
                errors.push(ValidationError::invalid_entry("curves", name, e));
            }
        }

        for (name, scaler) in &self.scalers {
            if let Err(reason) = scaler.check() {
                errors.push(ValidationError::invalid_entry("scalers", name, reason));
            }
        }

        for (name, kernel) in &self.kernels {
            match kernel.instantiate(name) {
                Ok(instance) => {
                    if let Some(params) = kernel.params() {
                        KernelConfig::check_params(
                            name,
                            instance.parameter_descriptors(),
                            params,
                            &mut errors,
                        );
                    }
                }
                Err(e) => errors.push(ValidationError::invalid_entry("kernels", name, e)),
            }
        }

        for (name, meter) in &self.meters {
            if let Err(e) = meter.settings().validate() {
                errors.push(ValidationError::invalid_entry("meters", name, e));
            }
        }

        ValidationError::collect(errors)
    }

    /// Render context settings.
    pub fn render(&self) -> ContextConfig {
        ContextConfig {
            sample_rate: self.render.sample_rate as f32,
            block_size: self.render.block_size,
            event_capacity: self.render.event_capacity,
        }
    }

    /// Builds the named curve.
    pub fn curve(&self, name: &str) -> Result<CurvedRange, ConfigError> {
        self.curves
            .get(name)
            .ok_or_else(|| ConfigError::unknown_entry("curves", name))?
            .build(name)
    }

    /// Builds the named scaler segment in `ctx`, optionally feeding `tap`.
    pub fn scaler(
        &self,
        name: &str,
        ctx: &mut RenderContext,
        tap: Option<NodeId>,
    ) -> Result<SignalScaler, ConfigError> {
        let s = self
            .scalers
            .get(name)
            .ok_or_else(|| ConfigError::unknown_entry("scalers", name))?;
        Ok(SignalScaler::new(
            ctx,
            s.input_min,
            s.input_max,
            s.output_min,
            s.output_max,
            tap,
        )?)
    }

    /// Instantiates the named kernel with its configured parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownEntry`] for a missing entry, [`ConfigError::Build`]
    /// for a shaper that cannot be tabulated, or [`ConfigError::Validation`]
    /// for unknown or out-of-range parameters.
    pub fn build_kernel(&self, name: &str) -> Result<KernelSetup, ConfigError> {
        let config = self
            .kernels
            .get(name)
            .ok_or_else(|| ConfigError::unknown_entry("kernels", name))?;
        let kernel = config.instantiate(name)?;

        let mut params = Vec::new();
        if let Some(values) = config.params() {
            let mut errors = Vec::new();
            KernelConfig::check_params(name, kernel.parameter_descriptors(), values, &mut errors);
            ValidationError::collect(errors)?;
            params.extend(values.iter().map(|(k, &v)| (k.clone(), v)));
        }

        Ok(KernelSetup {
            name: name.to_string(),
            kernel,
            params,
        })
    }

    /// Settings of the named meter.
    pub fn meter(&self, name: &str) -> Result<MeterSettings, ConfigError> {
        let settings = self
            .meters
            .get(name)
            .ok_or_else(|| ConfigError::unknown_entry("meters", name))?
            .settings();
        settings.validate()?;
        Ok(settings)
    }
}
