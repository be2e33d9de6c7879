//! Error types for the math kernel and curve engine.
//!
//! Every failure is reported synchronously to the immediate caller. The
//! variants fall into three groups, exposed through [`Error::kind()`]:
//!
//! | Kind | Variants | Meaning |
//! |------|----------|---------|
//! | [`ErrorKind::Domain`] | [`Error::Domain`] | caller passed a value outside `[min, max]` |
//! | [`ErrorKind::Configuration`] | [`Error::DegenerateRange`], [`Error::ComplexRoot`], [`Error::NonPositiveLog`], [`Error::InvalidBase`], [`Error::ZeroCurveAmount`], [`Error::DegenerateEquation`] | the curve or transform can never produce a finite answer |
//! | [`ErrorKind::Numeric`] | [`Error::Overflow`] | a single evaluation left the representable range |

use core::fmt;

/// Errors raised by curve construction, curve evaluation and the math kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// A value fell outside the closed range `[min, max]`.
    Domain {
        /// The rejected value.
        value: f64,
        /// Lower bound of the accepted range.
        min: f64,
        /// Upper bound of the accepted range.
        max: f64,
    },
    /// A range is empty, inverted or not finite, so nothing can be scaled across it.
    DegenerateRange {
        /// Lower bound as given.
        min: f64,
        /// Upper bound as given.
        max: f64,
    },
    /// A quadratic only has complex roots where a real root was required.
    ComplexRoot,
    /// A logarithm was requested for a value `<= 0`.
    NonPositiveLog {
        /// The rejected argument.
        value: f64,
    },
    /// A logarithm or power base that is not positive, or equals `1`.
    InvalidBase {
        /// The rejected base.
        base: f64,
    },
    /// `curve_amount == 0` for a log-family curve.
    ZeroCurveAmount,
    /// Both the quadratic and the linear coefficient are zero.
    DegenerateEquation,
    /// The result is not representable as a finite `f64`.
    Overflow,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input outside the accepted range; a caller contract violation.
    Domain,
    /// Degenerate construction, fatal to the instance.
    Configuration,
    /// A single evaluation overflowed.
    Numeric,
}

impl Error {
    /// Returns the taxonomy group this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain { .. } => ErrorKind::Domain,
            Self::DegenerateRange { .. }
            | Self::ComplexRoot
            | Self::NonPositiveLog { .. }
            | Self::InvalidBase { .. }
            | Self::ZeroCurveAmount
            | Self::DegenerateEquation => ErrorKind::Configuration,
            Self::Overflow => ErrorKind::Numeric,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain { value, min, max } => {
                write!(f, "value {value} is outside the range [{min}, {max}]")
            }
            Self::DegenerateRange { min, max } => {
                write!(f, "range [{min}, {max}] is empty or not finite")
            }
            Self::ComplexRoot => write!(f, "quadratic has no real root"),
            Self::NonPositiveLog { value } => {
                write!(f, "logarithm of non-positive value {value}")
            }
            Self::InvalidBase { base } => write!(f, "invalid logarithm base {base}"),
            Self::ZeroCurveAmount => write!(f, "curve amount must be non-zero"),
            Self::DegenerateEquation => write!(f, "equation has no quadratic or linear term"),
            Self::Overflow => write!(f, "result is not representable as a finite number"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
