//! Curve configuration and derived coefficients.
//!
//! An [`AxisConfig`] is the validated, per-axis description of a response
//! curve. [`derive`] turns it into an [`AxisCurve`]: the config plus the
//! closed-form [`DerivedCoefficients`] that keep the piecewise sensitivity
//! function continuous at the offset speed `N` and the target speed `M`.
//! An `AxisCurve` can only be built through [`derive`], so a config and its
//! coefficients always belong together.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Curve family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurveFamily {
    /// Quadratic ease from `K` to `L` between `N` and `M`.
    #[default]
    Natural,
    /// Straight line from `(N, K)` to `(M, L)`.
    Linear,
    /// Normalized power law from `(N, K)` to `(M, L)`.
    Power,
    /// Logistic curve centred on `(N, K)`, saturating smoothly.
    Sigmoid,
}

impl CurveFamily {
    pub const ALL: [CurveFamily; 4] = [
        CurveFamily::Natural,
        CurveFamily::Linear,
        CurveFamily::Power,
        CurveFamily::Sigmoid,
    ];

    /// Gain mode a family starts with when it is selected.
    pub fn default_gain(self) -> bool {
        matches!(self, CurveFamily::Natural | CurveFamily::Linear)
    }

    /// Whether the limit flag changes this family's shape.
    pub fn uses_limit(self) -> bool {
        matches!(self, CurveFamily::Linear | CurveFamily::Power)
    }

    /// Whether the exponent changes this family's shape.
    pub fn uses_exponent(self) -> bool {
        matches!(self, CurveFamily::Power)
    }

    /// Parse a family name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "natural" => Some(CurveFamily::Natural),
            "linear" => Some(CurveFamily::Linear),
            "power" => Some(CurveFamily::Power),
            "sigmoid" => Some(CurveFamily::Sigmoid),
            _ => None,
        }
    }
}

impl std::fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CurveFamily::Natural => "natural",
            CurveFamily::Linear => "linear",
            CurveFamily::Power => "power",
            CurveFamily::Sigmoid => "sigmoid",
        };
        f.write_str(name)
    }
}

/// Family-specific knobs. Each variant carries only what its family reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveShape {
    Natural,
    Linear { limit: bool },
    Power { exponent: f64, limit: bool },
    Sigmoid,
}

impl CurveShape {
    pub fn family(&self) -> CurveFamily {
        match self {
            CurveShape::Natural => CurveFamily::Natural,
            CurveShape::Linear { .. } => CurveFamily::Linear,
            CurveShape::Power { .. } => CurveFamily::Power,
            CurveShape::Sigmoid => CurveFamily::Sigmoid,
        }
    }
}

/// Validated-on-derive configuration for one axis.
///
/// Mirror mode is resolved before this point: a mirrored axis arrives here
/// with `base == 1 / target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConfig {
    /// Base sensitivity `K`, used at and below the offset speed.
    pub base: f64,
    /// Target sensitivity `L`, reached at the target speed.
    pub target: f64,
    /// Offset speed `N`.
    pub offset: f64,
    /// Target speed `M`.
    pub target_speed: f64,
    pub shape: CurveShape,
    /// Area-normalized ("gain") semantics.
    pub gain: bool,
}

/// Coefficients derived from an [`AxisConfig`], one variant per family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedCoefficients {
    Natural {
        /// `a = (K − L) / (N − M)²`
        quadratic: f64,
        /// Integration constant of the gain-mode antiderivative.
        gain_constant: f64,
    },
    Linear {
        slope: f64,
        intercept: f64,
        limit: bool,
    },
    Power {
        /// `L − K`
        amplitude: f64,
        /// `M − N`
        range: f64,
        exponent: f64,
        limit: bool,
    },
    Sigmoid {
        steepness: f64,
        /// Lower asymptote `K4`.
        floor: f64,
    },
}

/// Rejected curve configuration. The previously active curve stays in use.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("target speed equals offset speed ({speed}); the curve interval is empty")]
    DegenerateInterval { speed: f64 },

    #[error("target speed {target_speed} is below offset speed {offset}")]
    InvertedInterval { offset: f64, target_speed: f64 },

    #[error("offset speed must not be negative (got {0})")]
    NegativeOffset(f64),

    #[error("{field} must be greater than 0 (got {value})")]
    NonPositiveSensitivity { field: &'static str, value: f64 },

    #[error("mirror mode needs a target sensitivity above 0 (got {0})")]
    MirrorNeedsPositiveTarget(f64),

    #[error("power exponent must be greater than 0 (got {0})")]
    NonPositiveExponent(f64),

    #[error("sigmoid curve drops to {0} at rest; lower the target or raise the base")]
    NonPositiveSigmoidFloor(f64),
}

/// A config together with its coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCurve {
    config: AxisConfig,
    coeffs: DerivedCoefficients,
}

impl AxisCurve {
    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    pub fn coefficients(&self) -> &DerivedCoefficients {
        &self.coeffs
    }

    pub fn family(&self) -> CurveFamily {
        self.config.shape.family()
    }
}

/// Resolve mirror mode: a mirrored axis uses `K = 1 / L`.
pub fn mirrored_base(target: f64) -> Result<f64, CurveError> {
    if target.is_nan() || target <= 0.0 {
        return Err(CurveError::MirrorNeedsPositiveTarget(target));
    }
    Ok(1.0 / target)
}

/// Validate a config and compute its coefficients.
pub fn derive(config: AxisConfig) -> Result<AxisCurve, CurveError> {
    let AxisConfig {
        base: k,
        target: l,
        offset: n,
        target_speed: m,
        ..
    } = config;

    for (field, value) in [
        ("base sensitivity", k),
        ("target sensitivity", l),
        ("offset speed", n),
        ("target speed", m),
    ] {
        if !value.is_finite() {
            return Err(CurveError::NotFinite { field });
        }
    }
    if k <= 0.0 {
        return Err(CurveError::NonPositiveSensitivity {
            field: "base sensitivity",
            value: k,
        });
    }
    if l <= 0.0 {
        return Err(CurveError::NonPositiveSensitivity {
            field: "target sensitivity",
            value: l,
        });
    }
    if n < 0.0 {
        return Err(CurveError::NegativeOffset(n));
    }
    if m == n {
        return Err(CurveError::DegenerateInterval { speed: m });
    }
    if m < n {
        return Err(CurveError::InvertedInterval {
            offset: n,
            target_speed: m,
        });
    }

    let coeffs = match config.shape {
        CurveShape::Natural => {
            let quadratic = (k - l) / (n - m).powi(2);
            let gain_constant = (k - l) * n - quadratic / 3.0 * (n - m).powi(3);
            DerivedCoefficients::Natural {
                quadratic,
                gain_constant,
            }
        }
        CurveShape::Linear { limit } => {
            let slope = (l - k) / (m - n);
            DerivedCoefficients::Linear {
                slope,
                intercept: k - slope * n,
                limit,
            }
        }
        CurveShape::Power { exponent, limit } => {
            if !exponent.is_finite() {
                return Err(CurveError::NotFinite { field: "exponent" });
            }
            if exponent <= 0.0 {
                return Err(CurveError::NonPositiveExponent(exponent));
            }
            DerivedCoefficients::Power {
                amplitude: l - k,
                range: m - n,
                exponent,
                limit,
            }
        }
        CurveShape::Sigmoid => {
            let floor = 2.0 * k - l;
            let steepness = 2.0 / (m - n);
            let at_rest = floor + (l - floor) / (1.0 + (steepness * n).exp());
            if at_rest.is_nan() || at_rest <= 0.0 {
                return Err(CurveError::NonPositiveSigmoidFloor(at_rest));
            }
            DerivedCoefficients::Sigmoid { steepness, floor }
        }
    };

    Ok(AxisCurve { config, coeffs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(shape: CurveShape) -> AxisConfig {
        AxisConfig {
            base: 1.0,
            target: 2.0,
            offset: 0.0,
            target_speed: 4.0,
            shape,
            gain: false,
        }
    }

    #[test]
    fn test_natural_coefficients() {
        let curve = derive(config(CurveShape::Natural)).unwrap();
        match curve.coefficients() {
            DerivedCoefficients::Natural {
                quadratic,
                gain_constant,
            } => {
                assert!((quadratic + 1.0 / 16.0).abs() < 1e-12);
                // (K - L) * N - a/3 * (N - M)^3 with N = 0
                assert!((gain_constant - (-1.0 / 16.0 / 3.0 * 64.0)).abs() < 1e-12);
            }
            other => panic!("unexpected coefficients: {other:?}"),
        }
    }

    #[test]
    fn test_linear_coefficients() {
        let mut cfg = config(CurveShape::Linear { limit: true });
        cfg.offset = 2.0;
        cfg.target_speed = 6.0;
        let curve = derive(cfg).unwrap();
        assert_eq!(
            *curve.coefficients(),
            DerivedCoefficients::Linear {
                slope: 0.25,
                intercept: 0.5,
                limit: true
            }
        );
    }

    #[test]
    fn test_sigmoid_midpoint_on_base() {
        let curve = derive(config(CurveShape::Sigmoid)).unwrap();
        match curve.coefficients() {
            DerivedCoefficients::Sigmoid { steepness, floor } => {
                assert!((steepness - 0.5).abs() < 1e-12);
                assert!(floor.abs() < 1e-12);
            }
            other => panic!("unexpected coefficients: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_degenerate_interval() {
        let mut cfg = config(CurveShape::Natural);
        cfg.target_speed = 0.0;
        assert_eq!(
            derive(cfg),
            Err(CurveError::DegenerateInterval { speed: 0.0 })
        );
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let mut cfg = config(CurveShape::Linear { limit: false });
        cfg.offset = 5.0;
        assert!(matches!(
            derive(cfg),
            Err(CurveError::InvertedInterval { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_sensitivity() {
        let mut cfg = config(CurveShape::Natural);
        cfg.base = 0.0;
        assert!(matches!(
            derive(cfg),
            Err(CurveError::NonPositiveSensitivity { .. })
        ));

        let mut cfg = config(CurveShape::Natural);
        cfg.target = -1.0;
        assert!(matches!(
            derive(cfg),
            Err(CurveError::NonPositiveSensitivity { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_exponent_and_nan() {
        let cfg = config(CurveShape::Power {
            exponent: 0.0,
            limit: true,
        });
        assert_eq!(derive(cfg), Err(CurveError::NonPositiveExponent(0.0)));

        let mut cfg = config(CurveShape::Natural);
        cfg.offset = f64::NAN;
        assert!(matches!(derive(cfg), Err(CurveError::NotFinite { .. })));
    }

    #[test]
    fn test_sigmoid_must_stay_positive_at_rest() {
        let mut cfg = config(CurveShape::Sigmoid);
        cfg.target = 5.0;
        cfg.offset = 10.0;
        cfg.target_speed = 12.0;
        assert!(matches!(
            derive(cfg),
            Err(CurveError::NonPositiveSigmoidFloor(_))
        ));
    }

    #[test]
    fn test_mirrored_base() {
        assert_eq!(mirrored_base(2.0), Ok(0.5));
        assert_eq!(
            mirrored_base(0.0),
            Err(CurveError::MirrorNeedsPositiveTarget(0.0))
        );
    }

    #[test]
    fn test_family_defaults() {
        assert!(CurveFamily::Natural.default_gain());
        assert!(CurveFamily::Linear.default_gain());
        assert!(!CurveFamily::Power.default_gain());
        assert!(!CurveFamily::Sigmoid.default_gain());
        assert!(CurveFamily::Power.uses_exponent());
        assert!(!CurveFamily::Natural.uses_limit());
        assert_eq!(CurveFamily::parse("Sigmoid"), Some(CurveFamily::Sigmoid));
        assert_eq!(CurveFamily::parse("cubic"), None);
    }
}
