//! Definite integrals and jolt of the sensitivity curve.
//!
//! Natural, Linear and Power integrate in closed form. Sigmoid has no
//! elementary antiderivative and falls back to a fixed-step trapezoid rule,
//! which is also available for any family as a diagnostic cross-check.

use crate::curve::model::{AxisCurve, DerivedCoefficients};
use crate::curve::sensitivity::logistic;

/// Subintervals used by gain-mode quadrature.
pub const GAIN_QUADRATURE_STEPS: usize = 100;

/// Trapezoidal rule over `[lo, hi]` with `steps` equal subintervals.
pub fn trapezoid<F>(f: F, lo: f64, hi: f64, steps: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    if steps == 0 || hi == lo {
        return 0.0;
    }
    let h = (hi - lo) / steps as f64;
    let mut sum = 0.5 * (f(lo) + f(hi));
    for i in 1..steps {
        sum += f(lo + i as f64 * h);
    }
    sum * h
}

impl AxisCurve {
    /// `∫₀^speed s(u) du` of the point-wise curve.
    pub fn integral(&self, speed: f64) -> f64 {
        if speed <= 0.0 || speed.is_nan() {
            return 0.0;
        }
        let cfg = self.config();
        let (k, l, n, m) = (cfg.base, cfg.target, cfg.offset, cfg.target_speed);
        let v = speed;

        if v <= n {
            if let DerivedCoefficients::Sigmoid { .. } = self.coefficients() {
                return self.numeric_integral(v, GAIN_QUADRATURE_STEPS);
            }
            return k * v;
        }

        match *self.coefficients() {
            DerivedCoefficients::Natural {
                quadratic,
                gain_constant,
            } => {
                if v <= m {
                    gain_constant + l * v + quadratic / 3.0 * (v - m).powi(3)
                } else {
                    gain_constant + l * v
                }
            }
            DerivedCoefficients::Linear { slope, limit, .. } => {
                let ramp = |u: f64| k * u + slope / 2.0 * (u - n).powi(2);
                if v <= m || !limit {
                    ramp(v)
                } else {
                    ramp(m) + l * (v - m)
                }
            }
            DerivedCoefficients::Power {
                amplitude,
                range,
                exponent,
                limit,
            } => {
                let ramp = |u: f64| {
                    k * u
                        + amplitude / (exponent + 1.0)
                            * ((u - n) / range).powf(exponent + 1.0)
                            * range
                };
                if v <= m || !limit {
                    ramp(v)
                } else {
                    ramp(m) + l * (v - m)
                }
            }
            DerivedCoefficients::Sigmoid { .. } => {
                self.numeric_integral(v, GAIN_QUADRATURE_STEPS)
            }
        }
    }

    /// Trapezoid approximation of [`AxisCurve::integral`] for any family.
    pub fn numeric_integral(&self, speed: f64, steps: usize) -> f64 {
        if speed <= 0.0 || speed.is_nan() {
            return 0.0;
        }
        trapezoid(|u| self.point_sensitivity(u), 0.0, speed, steps)
    }

    /// Derivative of the applied multiplier with respect to speed.
    ///
    /// Point-wise mode differentiates the active segment analytically. Gain
    /// mode applies the quotient rule to `H(v) = G(v) / v` with `G' = s`.
    pub fn jolt(&self, speed: f64) -> f64 {
        let cfg = self.config();
        let v = speed;

        if cfg.gain {
            if v <= 0.0 || v.is_nan() {
                return 0.0;
            }
            return (self.point_sensitivity(v) * v - self.integral(v)) / (v * v);
        }

        let (l, n, m) = (cfg.target, cfg.offset, cfg.target_speed);
        if let DerivedCoefficients::Sigmoid { steepness, floor } = *self.coefficients() {
            let sigma = logistic(steepness * (v - n));
            return (l - floor) * steepness * sigma * (1.0 - sigma);
        }
        if v <= n {
            return 0.0;
        }

        match *self.coefficients() {
            DerivedCoefficients::Natural { quadratic, .. } => {
                if v <= m {
                    2.0 * quadratic * (v - m)
                } else {
                    0.0
                }
            }
            DerivedCoefficients::Linear { slope, limit, .. } => {
                if v <= m || !limit {
                    slope
                } else {
                    0.0
                }
            }
            DerivedCoefficients::Power {
                amplitude,
                range,
                exponent,
                limit,
            } => {
                if v <= m || !limit {
                    amplitude * exponent * ((v - n) / range).powf(exponent - 1.0) / range
                } else {
                    0.0
                }
            }
            DerivedCoefficients::Sigmoid { .. } => 0.0,
        }
    }
}

/// Free-function form of [`AxisCurve::integral`].
pub fn integral(curve: &AxisCurve, speed: f64) -> f64 {
    curve.integral(speed)
}

/// Free-function form of [`AxisCurve::jolt`].
pub fn jolt(curve: &AxisCurve, speed: f64) -> f64 {
    curve.jolt(speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::model::{derive, AxisConfig, CurveShape};

    fn curve(shape: CurveShape, gain: bool) -> AxisCurve {
        derive(AxisConfig {
            base: 1.0,
            target: 2.0,
            offset: 1.0,
            target_speed: 5.0,
            shape,
            gain,
        })
        .unwrap()
    }

    #[test]
    fn test_trapezoid_exact_for_lines() {
        let area = trapezoid(|x| 2.0 * x + 1.0, 0.0, 3.0, 7);
        assert!((area - 12.0).abs() < 1e-12);
        assert_eq!(trapezoid(|x| x, 1.0, 1.0, 10), 0.0);
        assert_eq!(trapezoid(|x| x, 0.0, 1.0, 0), 0.0);
    }

    #[test]
    fn test_natural_integral_by_hand() {
        let c = curve(CurveShape::Natural, false);
        // K*N = 1 over [0, 1]
        assert!((c.integral(1.0) - 1.0).abs() < 1e-12);
        // plus ∫_1^5 (-(u-5)^2/16 + 2) du = 8 - 64/48
        let expected = 1.0 + 8.0 - 64.0 / 48.0;
        assert!((c.integral(5.0) - expected).abs() < 1e-12);
        assert!((c.integral(7.0) - (expected + 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_linear_limited_tail() {
        let c = curve(CurveShape::Linear { limit: true }, false);
        // 1 + (1 + 2) / 2 * 4 = 7 at M, then slope L
        assert!((c.integral(5.0) - 7.0).abs() < 1e-12);
        assert!((c.integral(6.0) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_integral_is_numeric() {
        let c = curve(CurveShape::Sigmoid, false);
        let v = 3.0;
        assert_eq!(c.integral(v), c.numeric_integral(v, GAIN_QUADRATURE_STEPS));
    }

    #[test]
    fn test_point_jolt_segments() {
        let natural = curve(CurveShape::Natural, false);
        assert_eq!(natural.jolt(0.5), 0.0);
        // 2a(v - M) = 2 * (-1/16) * (3 - 5)
        assert!((natural.jolt(3.0) - 0.25).abs() < 1e-12);
        assert_eq!(natural.jolt(6.0), 0.0);

        let linear = curve(CurveShape::Linear { limit: false }, false);
        assert!((linear.jolt(20.0) - 0.25).abs() < 1e-12);

        let power = curve(
            CurveShape::Power {
                exponent: 2.0,
                limit: true,
            },
            false,
        );
        // 1 * 2 * (2/4) / 4
        assert!((power.jolt(3.0) - 0.25).abs() < 1e-12);
        assert_eq!(power.jolt(9.0), 0.0);
    }

    #[test]
    fn test_sigmoid_jolt_peaks_at_offset() {
        let c = curve(CurveShape::Sigmoid, false);
        let at_offset = c.jolt(1.0);
        // tangent at N equals the chord slope (L - K) / (M - N)
        assert!((at_offset - 0.25).abs() < 1e-12);
        assert!(c.jolt(4.0) < at_offset);
    }

    #[test]
    fn test_gain_jolt_matches_finite_difference() {
        let c = curve(CurveShape::Natural, true);
        let h = 1e-5;
        for v in [0.5, 2.0, 3.5, 8.0] {
            let numeric = (c.evaluate(v + h) - c.evaluate(v - h)) / (2.0 * h);
            assert!((c.jolt(v) - numeric).abs() < 1e-6, "v={v}");
        }
        assert_eq!(c.jolt(0.0), 0.0);
    }
}
