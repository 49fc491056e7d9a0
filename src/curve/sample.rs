//! Diagnostic curve sampling.
//!
//! Produces the sensitivity, jolt and output-velocity series for an axis
//! curve over a speed range, ready to be charted or written as CSV.

use crate::curve::model::AxisCurve;
use serde::Serialize;

/// Default number of steps across the sampled range.
pub const DEFAULT_SAMPLE_STEPS: usize = 1000;

/// How far past the target speed the default range reaches.
const RANGE_FACTOR: f64 = 4.0;

/// Which quantity a series plots against input speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesKind {
    Sensitivity,
    Jolt,
    Velocity,
}

impl SeriesKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sensitivity" => Some(SeriesKind::Sensitivity),
            "jolt" => Some(SeriesKind::Jolt),
            "velocity" => Some(SeriesKind::Velocity),
            _ => None,
        }
    }
}

/// One sampled `(speed, value)` series.
#[derive(Debug, Clone, Serialize)]
pub struct CurveSeries {
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
}

/// Speed range shared by both axes' charts: four times the larger target speed.
pub fn sample_range(x: &AxisCurve, y: &AxisCurve) -> f64 {
    RANGE_FACTOR * x.config().target_speed.max(y.config().target_speed)
}

/// Sample `kind` for `curve` at `steps + 1` evenly spaced speeds in `[0, max_speed]`.
pub fn sample(curve: &AxisCurve, kind: SeriesKind, max_speed: f64, steps: usize) -> CurveSeries {
    let steps = steps.max(1);
    let step = max_speed / steps as f64;
    let points = (0..=steps)
        .map(|i| {
            let v = i as f64 * step;
            let value = match kind {
                SeriesKind::Sensitivity => curve.evaluate(v),
                SeriesKind::Jolt => curve.jolt(v),
                SeriesKind::Velocity => curve.output_speed(v),
            };
            (v, value)
        })
        .collect();
    CurveSeries { kind, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::model::{derive, AxisConfig, CurveShape};

    fn natural(target_speed: f64) -> AxisCurve {
        derive(AxisConfig {
            base: 1.0,
            target: 2.0,
            offset: 0.0,
            target_speed,
            shape: CurveShape::Natural,
            gain: false,
        })
        .unwrap()
    }

    #[test]
    fn test_range_uses_larger_target_speed() {
        assert_eq!(sample_range(&natural(4.0), &natural(10.0)), 40.0);
    }

    #[test]
    fn test_sample_shape() {
        let c = natural(4.0);
        let series = sample(&c, SeriesKind::Sensitivity, 16.0, 1000);
        assert_eq!(series.points.len(), 1001);
        assert_eq!(series.points[0], (0.0, 0.0));
        let (v, s) = series.points[1000];
        assert!((v - 16.0).abs() < 1e-9);
        assert!((s - 2.0).abs() < 1e-12);
        let peak = series.points.iter().map(|&(_, s)| s).fold(0.0, f64::max);
        assert!((peak - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_series() {
        let c = natural(4.0);
        let series = sample(&c, SeriesKind::Velocity, 8.0, 4);
        // above M the output speed is L * v
        assert!((series.points[4].1 - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(SeriesKind::parse("Jolt"), Some(SeriesKind::Jolt));
        assert_eq!(SeriesKind::parse("accel"), None);
    }
}
