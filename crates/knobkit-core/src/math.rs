//! Numeric primitives shared by curves, kernels and meters.
//!
//! Stateless, allocation-free and usable under `no_std`. Curve math runs in
//! `f64` so that forward/inverse round trips stay within a few ULPs; the
//! per-sample kernels keep their own `f32` arithmetic.
//!
//! # Level Conversions
//!
//! - [`db_to_gain`] / [`gain_to_db`] - decibels and linear gain
//!
//! # Range Mapping
//!
//! - [`scale_value`] - affine remap between two ranges
//! - [`fit_to_bounds`] - clamp
//!
//! # Logarithms and Powers
//!
//! - [`log_base_n`] / [`pow_base_n`] - arbitrary-base log and power
//!
//! # Equations
//!
//! - [`solve_quadratic`] - both roots of `ax² + bx + c = 0`, complex or real
//!
//! # Display Helpers
//!
//! - [`round_to`] - round to a number of decimal places
//! - [`is_power_of_two`] - analyser window validation

use libm::{log, log10, pow, round, sqrt};

use crate::error::Error;

/// Logarithm of `x` in base `n`.
///
/// # Arguments
/// * `n` - Base, must be positive and not `1`
/// * `x` - Argument, must be positive
///
/// # Example
/// ```rust
/// use knobkit_core::log_base_n;
///
/// assert!((log_base_n(2.0, 8.0).unwrap() - 3.0).abs() < 1e-12);
/// assert!(log_base_n(2.0, 0.0).is_err());
/// ```
pub fn log_base_n(n: f64, x: f64) -> Result<f64, Error> {
    if !(x > 0.0) {
        return Err(Error::NonPositiveLog { value: x });
    }
    if !(n > 0.0) || n == 1.0 || !n.is_finite() {
        return Err(Error::InvalidBase { base: n });
    }
    Ok(log(x) / log(n))
}

/// `n` raised to the power `x`.
///
/// Fails with [`Error::Overflow`] when the result is infinite or NaN.
///
/// # Example
/// ```rust
/// use knobkit_core::pow_base_n;
///
/// assert_eq!(pow_base_n(2.0, 10.0).unwrap(), 1024.0);
/// assert!(pow_base_n(10.0, 400.0).is_err());
/// ```
pub fn pow_base_n(n: f64, x: f64) -> Result<f64, Error> {
    let result = pow(n, x);
    if result.is_finite() {
        Ok(result)
    } else {
        Err(Error::Overflow)
    }
}

/// Maps `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// The endpoints map exactly: `in_min → out_min`, `in_max → out_max`. When
/// both ranges are equal the value is returned untouched. Values outside the
/// input range extrapolate linearly.
///
/// # Errors
/// [`Error::DegenerateRange`] if `in_min == in_max` or either input bound is
/// not finite.
///
/// # Example
/// ```rust
/// use knobkit_core::scale_value;
///
/// assert_eq!(scale_value(5.0, 0.0, 10.0, -1.0, 1.0).unwrap(), 0.0);
/// assert!(scale_value(5.0, 1.0, 1.0, 0.0, 1.0).is_err());
/// ```
pub fn scale_value(
    value: f64,
    in_min: f64,
    in_max: f64,
    out_min: f64,
    out_max: f64,
) -> Result<f64, Error> {
    let in_range = in_max - in_min;
    if in_range == 0.0 || !in_range.is_finite() {
        return Err(Error::DegenerateRange {
            min: in_min,
            max: in_max,
        });
    }
    if in_min == out_min && in_max == out_max {
        return Ok(value);
    }
    let t = (value - in_min) / in_range;
    // Two-sided lerp keeps both endpoints exact.
    Ok(out_min * (1.0 - t) + out_max * t)
}

/// Converts decibels to linear gain: `10^(db/20)`.
///
/// # Example
/// ```rust
/// use knobkit_core::db_to_gain;
///
/// assert_eq!(db_to_gain(0.0), 1.0);
/// assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-12);
/// ```
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    pow(10.0, db / 20.0)
}

/// Converts linear gain to decibels: `20·log10(gain)`.
///
/// A gain of `0` (or below) yields `f64::NEG_INFINITY`. Kernels treat that
/// as silence; UI code should floor it before display.
///
/// # Example
/// ```rust
/// use knobkit_core::gain_to_db;
///
/// assert_eq!(gain_to_db(1.0), 0.0);
/// assert_eq!(gain_to_db(0.0), f64::NEG_INFINITY);
/// ```
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    if gain <= 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * log10(gain)
}

/// Clamps `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics; with `min > max` the result is `min`.
#[inline]
pub fn fit_to_bounds(value: f64, min: f64, max: f64) -> f64 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Rounds `value` to `places` decimal places.
///
/// # Example
/// ```rust
/// use knobkit_core::round_to;
///
/// assert_eq!(round_to(3.14159, 2), 3.14);
/// ```
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = pow(10.0, f64::from(places));
    round(value * factor) / factor
}

/// Returns `true` if `n` is a non-zero power of two.
#[inline]
pub fn is_power_of_two(n: usize) -> bool {
    n.is_power_of_two()
}

/// One root of a quadratic, as a complex number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticRoot {
    /// Real part.
    pub re: f64,
    /// Imaginary part, `0.0` for a real root.
    pub im: f64,
}

impl QuadraticRoot {
    /// Returns `true` if the imaginary part is exactly zero.
    #[inline]
    pub fn is_real(&self) -> bool {
        self.im == 0.0
    }
}

/// Both roots of `ax² + bx + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticSolution {
    /// Root taken with `+√disc`.
    pub first: QuadraticRoot,
    /// Root taken with `-√disc`.
    pub second: QuadraticRoot,
}

impl QuadraticSolution {
    /// Returns `true` when both roots are real.
    pub fn is_real(&self) -> bool {
        self.first.is_real() && self.second.is_real()
    }

    /// Both real parts, or [`Error::ComplexRoot`] if either root is complex.
    pub fn real_roots(&self) -> Result<(f64, f64), Error> {
        if self.is_real() {
            Ok((self.first.re, self.second.re))
        } else {
            Err(Error::ComplexRoot)
        }
    }
}

/// Solves `ax² + bx + c = 0` with the discriminant method.
///
/// - discriminant `> 0`: two distinct real roots
/// - discriminant `== 0`: the repeated root, reported twice
/// - discriminant `< 0`: a complex-conjugate pair with non-zero imaginary parts
///
/// With `a == 0` the equation is linear and its single root is reported twice.
///
/// # Errors
/// [`Error::DegenerateEquation`] if both `a` and `b` are zero.
///
/// # Example
/// ```rust
/// use knobkit_core::solve_quadratic;
///
/// let roots = solve_quadratic(1.0, 0.0, -4.0).unwrap();
/// assert_eq!(roots.real_roots().unwrap(), (2.0, -2.0));
///
/// let complex = solve_quadratic(1.0, 2.0, 5.0).unwrap();
/// assert!(!complex.is_real());
/// ```
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Result<QuadraticSolution, Error> {
    if a == 0.0 {
        if b == 0.0 {
            return Err(Error::DegenerateEquation);
        }
        let root = QuadraticRoot { re: -c / b, im: 0.0 };
        return Ok(QuadraticSolution {
            first: root,
            second: root,
        });
    }

    let discriminant = b * b - 4.0 * a * c;
    let two_a = 2.0 * a;

    if discriminant > 0.0 {
        let sqrt_disc = sqrt(discriminant);
        Ok(QuadraticSolution {
            first: QuadraticRoot {
                re: (-b + sqrt_disc) / two_a,
                im: 0.0,
            },
            second: QuadraticRoot {
                re: (-b - sqrt_disc) / two_a,
                im: 0.0,
            },
        })
    } else if discriminant == 0.0 {
        let root = QuadraticRoot {
            re: -b / two_a,
            im: 0.0,
        };
        Ok(QuadraticSolution {
            first: root,
            second: root,
        })
    } else {
        let re = -b / two_a;
        let im = sqrt(-discriminant) / two_a;
        Ok(QuadraticSolution {
            first: QuadraticRoot { re, im },
            second: QuadraticRoot { re, im: -im },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_base_n_rejects_bad_arguments() {
        assert_eq!(
            log_base_n(10.0, -1.0),
            Err(Error::NonPositiveLog { value: -1.0 })
        );
        assert_eq!(log_base_n(1.0, 5.0), Err(Error::InvalidBase { base: 1.0 }));
        assert_eq!(log_base_n(0.0, 5.0), Err(Error::InvalidBase { base: 0.0 }));
        assert!(log_base_n(f64::NAN, 5.0).is_err());
    }

    #[test]
    fn log_and_pow_are_inverse() {
        let y = pow_base_n(3.0, 2.5).unwrap();
        assert!((log_base_n(3.0, y).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn pow_overflow_is_an_error() {
        assert_eq!(pow_base_n(10.0, 400.0), Err(Error::Overflow));
        assert_eq!(pow_base_n(-8.0, 0.5), Err(Error::Overflow));
    }

    #[test]
    fn scale_value_endpoints_are_exact() {
        assert_eq!(scale_value(0.1, 0.1, 0.7, 0.3, 0.9).unwrap(), 0.3);
        assert_eq!(scale_value(0.7, 0.1, 0.7, 0.3, 0.9).unwrap(), 0.9);
        assert_eq!(scale_value(5.0, 0.0, 10.0, -1.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn scale_value_inverted_output() {
        assert_eq!(scale_value(2.5, 0.0, 10.0, 1.0, 0.0).unwrap(), 0.75);
    }

    #[test]
    fn scale_value_degenerate_range() {
        assert_eq!(
            scale_value(1.0, 2.0, 2.0, 0.0, 1.0),
            Err(Error::DegenerateRange { min: 2.0, max: 2.0 })
        );
        assert!(scale_value(1.0, 0.0, f64::INFINITY, 0.0, 1.0).is_err());
    }

    #[test]
    fn gain_db_conversions() {
        assert_eq!(gain_to_db(0.0), f64::NEG_INFINITY);
        assert_eq!(gain_to_db(-0.5), f64::NEG_INFINITY);
        assert!((gain_to_db(0.5) + 6.0206).abs() < 1e-4);
        assert!((db_to_gain(gain_to_db(0.25)) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn quadratic_two_real_roots() {
        let s = solve_quadratic(1.0, 0.0, -4.0).unwrap();
        assert_eq!(s.first, QuadraticRoot { re: 2.0, im: 0.0 });
        assert_eq!(s.second, QuadraticRoot { re: -2.0, im: 0.0 });
    }

    #[test]
    fn quadratic_repeated_root() {
        let s = solve_quadratic(1.0, -4.0, 4.0).unwrap();
        assert_eq!(s.first, s.second);
        assert_eq!(s.first.re, 2.0);
        assert!(s.is_real());
    }

    #[test]
    fn quadratic_complex_pair() {
        let s = solve_quadratic(1.0, 2.0, 5.0).unwrap();
        assert_eq!(s.first, QuadraticRoot { re: -1.0, im: 2.0 });
        assert_eq!(s.second, QuadraticRoot { re: -1.0, im: -2.0 });
        assert_eq!(s.real_roots(), Err(Error::ComplexRoot));
    }

    #[test]
    fn quadratic_linear_fallback() {
        let s = solve_quadratic(0.0, 2.0, -6.0).unwrap();
        assert_eq!(s.real_roots().unwrap(), (3.0, 3.0));
        assert_eq!(
            solve_quadratic(0.0, 0.0, 1.0),
            Err(Error::DegenerateEquation)
        );
    }

    #[test]
    fn fit_to_bounds_clamps() {
        assert_eq!(fit_to_bounds(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(fit_to_bounds(2.0, 0.0, 1.0), 1.0);
        assert_eq!(fit_to_bounds(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn rounding_and_powers_of_two() {
        assert_eq!(round_to(2.71828, 3), 2.718);
        assert_eq!(round_to(-1.25, 0), -1.0);
        assert!(is_power_of_two(2048));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(1000));
    }
}
