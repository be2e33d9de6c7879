//! Analysis window settings.

use knobkit_core::is_power_of_two;

use crate::error::MeterError;

/// Smallest supported FFT size.
pub const MIN_FFT_SIZE: usize = 32;
/// Largest supported FFT size.
pub const MAX_FFT_SIZE: usize = 32768;
/// Default FFT size.
pub const DEFAULT_FFT_SIZE: usize = 2048;
/// Default spectral smoothing constant.
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// Window length and spectral smoothing of a [`Meter`](crate::Meter).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSettings {
    /// Samples per analysis window; a power of two in
    /// [`MIN_FFT_SIZE`]`..=`[`MAX_FFT_SIZE`].
    pub fft_size: usize,
    /// Weight of the previous spectrum when averaging, in `[0, 1)`.
    pub smoothing: f32,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

impl MeterSettings {
    /// Settings with the given FFT size and default smoothing.
    pub fn with_fft_size(fft_size: usize) -> Self {
        Self {
            fft_size,
            ..Self::default()
        }
    }

    /// Checks both fields.
    pub fn validate(&self) -> Result<(), MeterError> {
        if !is_power_of_two(self.fft_size)
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(MeterError::InvalidFftSize {
                size: self.fft_size,
                min: MIN_FFT_SIZE,
                max: MAX_FFT_SIZE,
            });
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(MeterError::InvalidSmoothing(self.smoothing));
        }
        Ok(())
    }

    /// Number of frequency bins, `fft_size / 2`.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = MeterSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.frequency_bin_count(), 1024);
    }

    #[test]
    fn fft_size_bounds() {
        assert!(MeterSettings::with_fft_size(32).validate().is_ok());
        assert!(MeterSettings::with_fft_size(32768).validate().is_ok());
        for size in [0, 16, 100, 65536] {
            assert!(matches!(
                MeterSettings::with_fft_size(size).validate(),
                Err(MeterError::InvalidFftSize { .. })
            ));
        }
    }

    #[test]
    fn smoothing_bounds() {
        for smoothing in [-0.1, 1.0, f32::NAN] {
            let settings = MeterSettings {
                smoothing,
                ..MeterSettings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(MeterError::InvalidSmoothing(_))
            ));
        }
        let settings = MeterSettings {
            smoothing: 0.0,
            ..MeterSettings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
