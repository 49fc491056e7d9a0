//! Sensitivity evaluation.
//!
//! `point_sensitivity` is the instantaneous curve `s(v)`. `evaluate` is the
//! multiplier the accumulator applies: `s(v)` in point-wise mode, or the
//! average `(∫₀^v s(u) du) / v` in gain mode.

use crate::curve::integrator::{trapezoid, GAIN_QUADRATURE_STEPS};
use crate::curve::model::{AxisCurve, DerivedCoefficients};

/// Standard logistic function.
pub(crate) fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl AxisCurve {
    /// Instantaneous sensitivity at `speed`.
    ///
    /// Unlike [`AxisCurve::evaluate`] this has no zero-speed special case:
    /// at rest it returns the curve's resting value (`K` for the piecewise
    /// families).
    pub fn point_sensitivity(&self, speed: f64) -> f64 {
        let cfg = self.config();
        let (k, l, n, m) = (cfg.base, cfg.target, cfg.offset, cfg.target_speed);
        let v = speed;

        match *self.coefficients() {
            DerivedCoefficients::Natural { quadratic, .. } => {
                if v <= n {
                    k
                } else if v <= m {
                    quadratic * (v - m).powi(2) + l
                } else {
                    l
                }
            }
            DerivedCoefficients::Linear {
                slope,
                intercept,
                limit,
            } => {
                if v <= n {
                    k
                } else if v <= m || !limit {
                    intercept + slope * v
                } else {
                    l
                }
            }
            DerivedCoefficients::Power {
                amplitude,
                range,
                exponent,
                limit,
            } => {
                if v <= n {
                    k
                } else if v <= m || !limit {
                    k + amplitude * ((v - n) / range).powf(exponent)
                } else {
                    l
                }
            }
            DerivedCoefficients::Sigmoid { steepness, floor } => {
                floor + (l - floor) * logistic(steepness * (v - n))
            }
        }
    }

    /// Multiplier applied to raw motion at `speed`.
    ///
    /// Returns 0 for `speed <= 0` in both modes.
    pub fn evaluate(&self, speed: f64) -> f64 {
        if speed <= 0.0 || speed.is_nan() {
            return 0.0;
        }
        if !self.config().gain {
            return self.point_sensitivity(speed);
        }
        match self.coefficients() {
            DerivedCoefficients::Sigmoid { .. } => {
                trapezoid(|u| self.point_sensitivity(u), 0.0, speed, GAIN_QUADRATURE_STEPS) / speed
            }
            _ => self.integral(speed) / speed,
        }
    }

    /// Output speed produced by an input `speed`.
    pub fn output_speed(&self, speed: f64) -> f64 {
        self.evaluate(speed) * speed
    }
}

/// Free-function form of [`AxisCurve::evaluate`].
pub fn evaluate(curve: &AxisCurve, speed: f64) -> f64 {
    curve.evaluate(speed)
}

#[cfg(test)]
mod tests {
    use crate::curve::model::{derive, AxisConfig, AxisCurve, CurveShape};

    fn curve(shape: CurveShape, gain: bool) -> AxisCurve {
        derive(AxisConfig {
            base: 1.0,
            target: 2.0,
            offset: 0.0,
            target_speed: 4.0,
            shape,
            gain,
        })
        .unwrap()
    }

    const SHAPES: [CurveShape; 6] = [
        CurveShape::Natural,
        CurveShape::Linear { limit: true },
        CurveShape::Linear { limit: false },
        CurveShape::Power {
            exponent: 0.5,
            limit: true,
        },
        CurveShape::Power {
            exponent: 2.0,
            limit: false,
        },
        CurveShape::Sigmoid,
    ];

    #[test]
    fn test_natural_scenario() {
        let c = curve(CurveShape::Natural, false);
        assert!((c.point_sensitivity(0.0) - 1.0).abs() < 1e-12);
        assert!((c.evaluate(4.0) - 2.0).abs() < 1e-12);
        assert!((c.evaluate(2.0) - 1.75).abs() < 1e-12);
        assert!((c.evaluate(10.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_speed_is_zero_everywhere() {
        for shape in SHAPES {
            for gain in [false, true] {
                let c = curve(shape, gain);
                assert_eq!(c.evaluate(0.0), 0.0, "{shape:?} gain={gain}");
                assert_eq!(c.evaluate(-3.0), 0.0, "{shape:?} gain={gain}");
            }
        }
    }

    #[test]
    fn test_linear_limit() {
        let limited = curve(CurveShape::Linear { limit: true }, false);
        let open = curve(CurveShape::Linear { limit: false }, false);
        assert!((limited.evaluate(2.0) - 1.5).abs() < 1e-12);
        assert!((limited.evaluate(8.0) - 2.0).abs() < 1e-12);
        assert!((open.evaluate(8.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_curve() {
        let c = curve(
            CurveShape::Power {
                exponent: 2.0,
                limit: true,
            },
            false,
        );
        // 1 + 1 * (2/4)^2
        assert!((c.evaluate(2.0) - 1.25).abs() < 1e-12);
        assert!((c.evaluate(100.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_passes_through_base_at_offset() {
        let mut cfg = *curve(CurveShape::Sigmoid, false).config();
        cfg.offset = 3.0;
        cfg.target_speed = 9.0;
        let c = derive(cfg).unwrap();
        assert!((c.evaluate(3.0) - 1.0).abs() < 1e-12);
        assert!(c.evaluate(9.0) < 2.0);
        assert!(c.evaluate(1000.0) > 1.999);
        // limit flag has no effect
        assert!(c.evaluate(2.0) < 1.0);
    }

    #[test]
    fn test_gain_mode_is_running_average() {
        let point = curve(CurveShape::Linear { limit: true }, false);
        let gain = curve(CurveShape::Linear { limit: true }, true);
        // average of 1 + v/4 over [0, 4] is 1.5
        assert!((gain.evaluate(4.0) - 1.5).abs() < 1e-12);
        assert!(gain.evaluate(4.0) < point.evaluate(4.0));
        // past the limit the average keeps climbing towards L
        assert!(gain.evaluate(40.0) > 1.9);
        assert!(gain.evaluate(40.0) < 2.0);
    }

    #[test]
    fn test_gain_sigmoid_uses_same_curve() {
        let point = curve(CurveShape::Sigmoid, false);
        let gain = curve(CurveShape::Sigmoid, true);
        // at tiny speeds the average equals the instantaneous value
        assert!((gain.evaluate(1e-6) - point.evaluate(1e-6)).abs() < 1e-6);
    }

    #[test]
    fn test_output_speed_in_gain_mode_matches_integral() {
        let c = curve(CurveShape::Natural, true);
        for v in [0.5, 2.0, 4.0, 9.0] {
            assert!((c.output_speed(v) - c.integral(v)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_continuity_at_offset() {
        for shape in SHAPES {
            let mut cfg = *curve(shape, false).config();
            cfg.offset = 2.0;
            cfg.target_speed = 6.0;
            let c = derive(cfg).unwrap();
            let below = c.evaluate(2.0 - 1e-12);
            let above = c.evaluate(2.0 + 1e-12);
            assert!((below - 1.0).abs() < 1e-5, "{shape:?}: {below}");
            assert!((above - 1.0).abs() < 1e-5, "{shape:?}: {above}");
        }
    }
}
