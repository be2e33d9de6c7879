//! Invertible curve mapping between a linear control value and a curved value.
//!
//! A [`CurvedRange`] binds a closed range `[min, max]` to a [`CurveShape`].
//! Both directions accept values inside the range only, and both map the
//! range onto itself: `min` and `max` are fixed points of every shape.
//!
//! | Shape | Forward (`linear → curved`) | Parameter |
//! |-------|------------------------------|-----------|
//! | [`CurveShape::Linear`] | identity | none |
//! | [`CurveShape::Log`] | exponential bend, steeper toward `max` for `k > 0` | `curve_amount` |
//! | [`CurveShape::InverseLog`] | the inverse of `Log` with the same `k` | `curve_amount` |
//! | [`CurveShape::QuadBezier`] | quadratic Bezier `(0,0) → (range,0) → (range,range)` | none |
//! | [`CurveShape::Pow2`] | `2^(t·logRange + logMin)` | none |
//!
//! # Example
//!
//! ```rust
//! use knobkit_core::CurvedRange;
//!
//! let cutoff = CurvedRange::log(20.0, 20_000.0, 4.0)?;
//! let curved = cutoff.curved_value(10_010.0)?;
//! let linear = cutoff.linear_value(curved)?;
//! assert!((linear - 10_010.0).abs() < 1e-6);
//!
//! assert!(cutoff.curved_value(30_000.0).is_err());
//! # Ok::<(), knobkit_core::Error>(())
//! ```

use libm::{exp, expm1, fabs, fmax, log, log1p, log2, pow};

use crate::error::Error;
use crate::math::{fit_to_bounds, solve_quadratic};

/// The shape of a [`CurvedRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveShape {
    /// Identity mapping.
    Linear,
    /// Exponential curve with bend `curve_amount`.
    Log {
        /// Curve bend `k`; never zero.
        curve_amount: f64,
    },
    /// Exact inverse of [`CurveShape::Log`] with the same bend.
    InverseLog {
        /// Curve bend `k`; never zero.
        curve_amount: f64,
    },
    /// Quadratic Bezier with implicit control points.
    QuadBezier,
    /// Base-two power curve.
    Pow2,
}

/// An immutable range with a curve shape, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvedRange {
    min: f64,
    max: f64,
    shape: CurveShape,
}

impl CurvedRange {
    /// Creates a curved range.
    ///
    /// # Errors
    ///
    /// - [`Error::DegenerateRange`] unless `min < max` and both are finite
    /// - [`Error::ZeroCurveAmount`] for a log-family shape with `k == 0` or a
    ///   subnormal `k`
    /// - [`Error::DegenerateRange`] for a log-family shape with non-finite `k`
    /// - [`Error::NonPositiveLog`] for [`CurveShape::Pow2`] with `min <= 0`
    pub fn new(min: f64, max: f64, shape: CurveShape) -> Result<Self, Error> {
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(Error::DegenerateRange { min, max });
        }
        match shape {
            CurveShape::Log { curve_amount } | CurveShape::InverseLog { curve_amount } => {
                if !curve_amount.is_finite() {
                    return Err(Error::DegenerateRange { min, max });
                }
                if !curve_amount.is_normal() {
                    return Err(Error::ZeroCurveAmount);
                }
            }
            CurveShape::Pow2 => {
                if min <= 0.0 {
                    return Err(Error::NonPositiveLog { value: min });
                }
            }
            CurveShape::Linear | CurveShape::QuadBezier => {}
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(min, max, ?shape, "curved range created");

        Ok(Self { min, max, shape })
    }

    /// Identity curve over `[min, max]`.
    pub fn linear(min: f64, max: f64) -> Result<Self, Error> {
        Self::new(min, max, CurveShape::Linear)
    }

    /// Log curve over `[min, max]` with bend `curve_amount`.
    pub fn log(min: f64, max: f64, curve_amount: f64) -> Result<Self, Error> {
        Self::new(min, max, CurveShape::Log { curve_amount })
    }

    /// Inverse-log curve over `[min, max]` with bend `curve_amount`.
    pub fn inverse_log(min: f64, max: f64, curve_amount: f64) -> Result<Self, Error> {
        Self::new(min, max, CurveShape::InverseLog { curve_amount })
    }

    /// Quadratic Bezier curve over `[min, max]`.
    pub fn quad_bezier(min: f64, max: f64) -> Result<Self, Error> {
        Self::new(min, max, CurveShape::QuadBezier)
    }

    /// Base-two power curve over `[min, max]`.
    pub fn pow2(min: f64, max: f64) -> Result<Self, Error> {
        Self::new(min, max, CurveShape::Pow2)
    }

    /// Lower bound.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// `max - min`.
    #[inline]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// The curve shape.
    #[inline]
    pub fn shape(&self) -> CurveShape {
        self.shape
    }

    /// Returns `true` if `value` lies in `[min, max]`. NaN is never contained.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Maps a linear control value onto the curve.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] if `linear` is outside `[min, max]`.
    pub fn curved_value(&self, linear: f64) -> Result<f64, Error> {
        self.check_domain(linear)?;
        let curved = match self.shape {
            CurveShape::Linear => linear,
            CurveShape::Log { curve_amount } => self.log_forward(linear, curve_amount),
            CurveShape::InverseLog { curve_amount } => self.log_inverse(linear, curve_amount),
            CurveShape::QuadBezier => self.bezier_forward(linear),
            CurveShape::Pow2 => self.pow2_forward(linear),
        };
        self.finish(curved)
    }

    /// Maps a curved value back to the linear control value.
    ///
    /// # Errors
    ///
    /// - [`Error::Domain`] if `curved` is outside `[min, max]`
    /// - [`Error::ComplexRoot`] if the Bezier inverse has no real root
    pub fn linear_value(&self, curved: f64) -> Result<f64, Error> {
        self.check_domain(curved)?;
        let linear = match self.shape {
            CurveShape::Linear => curved,
            CurveShape::Log { curve_amount } => self.log_inverse(curved, curve_amount),
            CurveShape::InverseLog { curve_amount } => self.log_forward(curved, curve_amount),
            CurveShape::QuadBezier => self.bezier_inverse(curved)?,
            CurveShape::Pow2 => self.pow2_inverse(curved)?,
        };
        self.finish(linear)
    }

    fn check_domain(&self, value: f64) -> Result<(), Error> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(Error::Domain {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Rejects non-finite results and absorbs rounding past the bounds.
    fn finish(&self, value: f64) -> Result<f64, Error> {
        if value.is_finite() {
            Ok(fit_to_bounds(value, self.min, self.max))
        } else {
            Err(Error::Overflow)
        }
    }

    // y = (e^((t - 1)k) - 1) / (e^(-k) - 1) · (min - max) + max
    //
    // Rearranged so no term overflows and the side the curve hugs keeps its
    // precision: measured up from `min` for k > 0, down from `max` for k < 0.
    fn log_forward(&self, x: f64, k: f64) -> f64 {
        let t = (x - self.min) / self.range();
        if k > 0.0 {
            let rise = exp((t - 1.0) * k) * expm1(-t * k) / expm1(-k);
            self.min + rise * self.range()
        } else {
            let m = -k;
            let drop = exp(t * k) * expm1((t - 1.0) * m) / expm1(-m);
            self.max - drop * self.range()
        }
    }

    // t = ln((1 - r) + r·e^(-k)) / k + 1, with r = (max - y) / range
    fn log_inverse(&self, y: f64, k: f64) -> f64 {
        let below = (self.max - y) / self.range();
        let above = (y - self.min) / self.range();
        let ln_inner = if fabs(k) < 1.0 {
            log1p(below * expm1(-k))
        } else {
            log_sum_exp(log(above), log(below) - k)
        };
        (ln_inner / k + 1.0) * self.range() + self.min
    }

    // Control points in range-relative coordinates.
    fn bezier_points(&self) -> (f64, f64, f64) {
        (0.0, 0.0, self.range())
    }

    fn bezier_forward(&self, value: f64) -> f64 {
        let (y0, y1, y2) = self.bezier_points();
        let t = (value - self.min) / self.range();
        let a = y0 - 2.0 * y1 + y2;
        let b = 2.0 * (y1 - y0);
        a * t * t + b * t + y0 + self.min
    }

    fn bezier_inverse(&self, value: f64) -> Result<f64, Error> {
        let (y0, y1, y2) = self.bezier_points();
        let target = value - self.min;
        let a = y0 - 2.0 * y1 + y2;
        let b = 2.0 * (y1 - y0);
        let c = y0 - target;

        let (first, second) = solve_quadratic(a, b, c)?.real_roots()?;
        let t = if first >= 0.0 { first } else { second };
        Ok(t * self.range() + self.min)
    }

    fn pow2_logs(&self) -> (f64, f64) {
        let log_min = log2(self.min);
        let log_max = log2(self.max);
        (log_min, log_max - log_min)
    }

    fn pow2_forward(&self, value: f64) -> f64 {
        let (log_min, log_range) = self.pow2_logs();
        let t = (value - self.min) / self.range();
        pow(2.0, t * log_range + log_min)
    }

    fn pow2_inverse(&self, value: f64) -> Result<f64, Error> {
        let (log_min, log_range) = self.pow2_logs();
        Ok((log2(value) - log_min) / log_range * self.range() + self.min)
    }
}

/// `ln(e^a + e^b)` without overflow; either side may be `-inf`.
fn log_sum_exp(a: f64, b: f64) -> f64 {
    let hi = fmax(a, b);
    if hi == f64::NEG_INFINITY {
        return hi;
    }
    hi + log1p(exp(-fabs(a - b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} != {b} (tol {tol})");
    }

    fn all_shapes(min: f64, max: f64) -> [CurvedRange; 6] {
        [
            CurvedRange::linear(min, max).unwrap(),
            CurvedRange::log(min, max, 3.0).unwrap(),
            CurvedRange::log(min, max, -2.0).unwrap(),
            CurvedRange::inverse_log(min, max, 5.0).unwrap(),
            CurvedRange::quad_bezier(min, max).unwrap(),
            CurvedRange::pow2(min, max).unwrap(),
        ]
    }

    #[test]
    fn construction_rejects_bad_ranges() {
        assert!(matches!(
            CurvedRange::linear(1.0, 1.0),
            Err(Error::DegenerateRange { .. })
        ));
        assert!(matches!(
            CurvedRange::linear(2.0, 1.0),
            Err(Error::DegenerateRange { .. })
        ));
        assert!(CurvedRange::linear(f64::NAN, 1.0).is_err());
        assert!(CurvedRange::linear(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn zero_curve_amount_is_rejected() {
        assert_eq!(CurvedRange::log(0.0, 1.0, 0.0), Err(Error::ZeroCurveAmount));
        assert_eq!(
            CurvedRange::inverse_log(0.0, 1.0, 0.0),
            Err(Error::ZeroCurveAmount)
        );
    }

    #[test]
    fn pow2_needs_positive_min() {
        assert_eq!(
            CurvedRange::pow2(-10.0, 0.0),
            Err(Error::NonPositiveLog { value: -10.0 })
        );
        assert_eq!(
            CurvedRange::pow2(0.0, 8.0),
            Err(Error::NonPositiveLog { value: 0.0 })
        );
        assert_eq!(
            CurvedRange::pow2(-1.0, 8.0).unwrap_err().kind(),
            crate::ErrorKind::Configuration
        );
    }

    #[test]
    fn endpoints_are_fixed_points() {
        for curve in all_shapes(20.0, 20_000.0) {
            assert_close(curve.curved_value(20.0).unwrap(), 20.0, 1e-9);
            assert_close(curve.curved_value(20_000.0).unwrap(), 20_000.0, 1e-6);
            assert_close(curve.linear_value(20.0).unwrap(), 20.0, 1e-9);
            assert_close(curve.linear_value(20_000.0).unwrap(), 20_000.0, 1e-6);
        }
    }

    #[test]
    fn out_of_range_is_a_domain_error() {
        for curve in all_shapes(1.0, 10.0) {
            assert_eq!(
                curve.curved_value(10.5),
                Err(Error::Domain {
                    value: 10.5,
                    min: 1.0,
                    max: 10.0
                })
            );
            assert!(matches!(
                curve.linear_value(0.5),
                Err(Error::Domain { .. })
            ));
            assert!(curve.curved_value(f64::NAN).is_err());
        }
    }

    #[test]
    fn round_trip_every_shape() {
        for curve in all_shapes(1.0, 1000.0) {
            for i in 0..=100 {
                let v = 1.0 + 999.0 * f64::from(i) / 100.0;
                let back = curve.linear_value(curve.curved_value(v).unwrap()).unwrap();
                assert_close(back, v, 1e-7);
            }
        }
    }

    #[test]
    fn log_bends_toward_min_for_positive_amount() {
        let curve = CurvedRange::log(0.0, 1.0, 4.0).unwrap();
        let mid = curve.curved_value(0.5).unwrap();
        assert!(mid < 0.5, "log curve midpoint {mid} should sit below linear");
    }

    #[test]
    fn inverse_log_swaps_directions() {
        let log = CurvedRange::log(0.0, 10.0, 2.5).unwrap();
        let inv = CurvedRange::inverse_log(0.0, 10.0, 2.5).unwrap();
        for v in [0.5, 2.0, 7.5] {
            assert_close(inv.curved_value(v).unwrap(), log.linear_value(v).unwrap(), 1e-12);
            assert_close(inv.linear_value(v).unwrap(), log.curved_value(v).unwrap(), 1e-12);
        }
    }

    #[test]
    fn bezier_forward_is_quadratic() {
        let curve = CurvedRange::quad_bezier(0.0, 4.0).unwrap();
        // t = 0.5 → range · t² = 1
        assert_close(curve.curved_value(2.0).unwrap(), 1.0, 1e-12);
        assert_close(curve.linear_value(1.0).unwrap(), 2.0, 1e-12);
    }

    #[test]
    fn pow2_midpoint_is_geometric_mean() {
        let curve = CurvedRange::pow2(1.0, 16.0).unwrap();
        assert_close(curve.curved_value(8.5).unwrap(), 4.0, 1e-9);
        assert_close(curve.linear_value(4.0).unwrap(), 8.5, 1e-9);
    }

    #[test]
    fn pow2_accepts_smallest_positive_min() {
        let tiny = f64::from_bits(1);
        let curve = CurvedRange::pow2(tiny, 8.0).unwrap();
        assert_eq!(curve.curved_value(tiny).unwrap(), tiny);
        assert_close(curve.curved_value(8.0).unwrap(), 8.0, 1e-9);
        assert_close(curve.linear_value(1.0).unwrap(), 8.0 * 1074.0 / 1077.0, 1e-9);
    }

    #[test]
    fn tiny_curve_amount_is_nearly_linear() {
        for k in [1e-17, -1e-17, 1e-12, -3e-9] {
            let curve = CurvedRange::log(0.0, 1.0, k).unwrap();
            assert_close(curve.curved_value(0.5).unwrap(), 0.5, 1e-9);
            assert_close(curve.curved_value(1.0).unwrap(), 1.0, 1e-12);
            assert_close(curve.linear_value(0.5).unwrap(), 0.5, 1e-9);
        }
    }

    #[test]
    fn subnormal_curve_amount_is_rejected() {
        let k = f64::from_bits(1);
        assert_eq!(CurvedRange::log(0.0, 1.0, k), Err(Error::ZeroCurveAmount));
        assert_eq!(
            CurvedRange::inverse_log(0.0, 1.0, -k),
            Err(Error::ZeroCurveAmount)
        );
    }

    #[test]
    fn steep_curve_amount_keeps_endpoints() {
        for k in [-800.0, -700.0, 700.0, 800.0, 1e300, -1e300] {
            for curve in [
                CurvedRange::log(0.0, 1.0, k).unwrap(),
                CurvedRange::inverse_log(0.0, 1.0, k).unwrap(),
            ] {
                assert_eq!(curve.curved_value(0.0), Ok(0.0), "k = {k}");
                assert_eq!(curve.curved_value(1.0), Ok(1.0), "k = {k}");
                assert_eq!(curve.linear_value(0.0), Ok(0.0), "k = {k}");
                assert_eq!(curve.linear_value(1.0), Ok(1.0), "k = {k}");
                assert!(curve.curved_value(0.5).is_ok(), "k = {k}");
                assert!(curve.linear_value(0.5).is_ok(), "k = {k}");
            }
        }
    }

    #[test]
    fn steep_log_round_trips_near_min() {
        // With min = 0 the steep side keeps full relative precision.
        let curve = CurvedRange::log(0.0, 1.0, 700.0).unwrap();
        for v in [0.0, 0.1, 0.5, 0.9, 1.0] {
            let back = curve.linear_value(curve.curved_value(v).unwrap()).unwrap();
            assert_close(back, v, 1e-9);
        }
    }

    #[test]
    fn negative_amount_matches_closed_form() {
        // (e^0.5 - 1) / (e - 1) · (0 - 1) + 1
        let curve = CurvedRange::log(0.0, 1.0, -1.0).unwrap();
        let expected = 1.0 - (0.5f64.exp() - 1.0) / (1f64.exp() - 1.0);
        assert_close(curve.curved_value(0.5).unwrap(), expected, 1e-12);
    }
}
