//! Fixed-window motion accumulation and quantization.
//!
//! Raw deltas are summed per axis until the shared window has been open for
//! at least [`WINDOW`]. The window's sum and elapsed time give a speed, the
//! curve gives a multiplier, and the scaled motion is rounded to whole
//! counts. The rounding remainder is carried into the next window, so the
//! emitted stream never drifts from the scaled stream by more than one count.
//!
//! Rounding is half away from zero (`f64::round`) on both axes.

use crate::core::profile::{Axis, EngineProfile};
use crate::curve::{evaluate, AxisCurve};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Accumulation window.
pub const WINDOW: Duration = Duration::from_millis(1);

/// Per-axis pending sum and rounding remainder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisAccumulator {
    pending: i32,
    remainder: f64,
}

impl AxisAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw delta to the pending sum.
    pub fn push(&mut self, delta: i32) {
        self.pending = self.pending.saturating_add(delta);
    }

    pub fn pending(&self) -> i32 {
        self.pending
    }

    /// Sub-count remainder carried into the next flush. Always `|r| < 1`.
    pub fn remainder(&self) -> f64 {
        self.remainder
    }

    /// Scale `raw` by `multiplier`, add the carried remainder and round.
    ///
    /// A zero multiplier emits 0 and clears the remainder so stale fractions
    /// never leak into a later active region. A non-finite result is treated
    /// the same way.
    pub fn quantize(&mut self, raw: i32, multiplier: f64) -> i32 {
        if multiplier == 0.0 {
            self.remainder = 0.0;
            return 0;
        }
        let scaled = f64::from(raw) * multiplier + self.remainder;
        if !scaled.is_finite() || scaled.abs() > f64::from(i32::MAX) {
            tracing::warn!(raw, multiplier, "Scaled motion out of range, dropping window");
            self.remainder = 0.0;
            return 0;
        }
        let rounded = scaled.round();
        self.remainder = scaled - rounded;
        rounded as i32
    }

    /// Quantize the pending sum and clear it.
    fn drain(&mut self, multiplier: f64) -> i32 {
        let out = self.quantize(self.pending, multiplier);
        self.pending = 0;
        out
    }
}

/// Result of flushing one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowFlush {
    pub raw: (i32, i32),
    pub adjusted: (i32, i32),
    /// Speed in units per second, per axis.
    pub speed: (f64, f64),
    pub multiplier: (f64, f64),
    pub elapsed: Duration,
}

/// Two-axis accumulator driven by a shared window timer.
#[derive(Debug, Clone)]
pub struct MotionAccumulator {
    x: AxisAccumulator,
    y: AxisAccumulator,
    window_start: Instant,
    window: Duration,
}

impl MotionAccumulator {
    /// Create an accumulator whose first window opens at `now`.
    pub fn new(now: Instant) -> Self {
        Self::with_window(WINDOW, now)
    }

    pub fn with_window(window: Duration, now: Instant) -> Self {
        Self {
            x: AxisAccumulator::new(),
            y: AxisAccumulator::new(),
            window_start: now,
            window,
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisAccumulator {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Whether the window has been open for at least the window length.
    pub fn window_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window
    }

    /// Record a raw event and flush if the window has expired.
    ///
    /// `profile` is only called when a flush actually happens, so the
    /// snapshot is taken at flush time.
    pub fn push<F>(&mut self, dx: i32, dy: i32, now: Instant, profile: F) -> Option<WindowFlush>
    where
        F: FnOnce() -> std::sync::Arc<EngineProfile>,
    {
        self.x.push(dx);
        self.y.push(dy);
        if self.window_expired(now) {
            self.flush(now, &profile())
        } else {
            None
        }
    }

    /// Convert the pending motion of both axes using one profile snapshot.
    ///
    /// Returns `None` without touching any state when the clock has not
    /// advanced or neither axis has pending motion. Otherwise both axes are
    /// drained and the window restarts at `now`. An axis with nothing pending
    /// emits 0 and keeps its remainder.
    pub fn flush(&mut self, now: Instant, profile: &EngineProfile) -> Option<WindowFlush> {
        let elapsed = now.saturating_duration_since(self.window_start);
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        if self.x.pending == 0 && self.y.pending == 0 {
            return None;
        }

        let raw = (self.x.pending, self.y.pending);
        let (sx, mx, ax) = flush_axis(&mut self.x, &profile.x, secs, profile.counts_per_unit);
        let (sy, my, ay) = flush_axis(&mut self.y, &profile.y, secs, profile.counts_per_unit);
        self.window_start = now;

        let flush = WindowFlush {
            raw,
            adjusted: (ax, ay),
            speed: (sx, sy),
            multiplier: (mx, my),
            elapsed,
        };
        tracing::trace!(?flush, "Window flushed");
        Some(flush)
    }
}

/// Returns `(speed, multiplier, output)` for one axis.
fn flush_axis(
    acc: &mut AxisAccumulator,
    curve: &AxisCurve,
    secs: f64,
    counts_per_unit: f64,
) -> (f64, f64, i32) {
    if acc.pending == 0 {
        return (0.0, 0.0, 0);
    }
    let speed = f64::from(acc.pending).abs() / secs / counts_per_unit;
    let multiplier = evaluate(curve, speed);
    (speed, multiplier, acc.drain(multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use std::sync::Arc;

    fn profile() -> EngineProfile {
        EngineProfile::from_preset(&Preset::default()).unwrap()
    }

    #[test]
    fn test_quantize_carries_remainder() {
        let mut acc = AxisAccumulator::new();
        acc.remainder = 0.3;
        assert_eq!(acc.quantize(100, 1.5), 150);
        assert!((acc.remainder() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_quantize_ties_round_away_from_zero() {
        let mut acc = AxisAccumulator::new();
        assert_eq!(acc.quantize(5, 0.5), 3);
        assert_eq!(acc.remainder(), -0.5);

        let mut acc = AxisAccumulator::new();
        assert_eq!(acc.quantize(-5, 0.5), -3);
        assert_eq!(acc.remainder(), 0.5);
    }

    #[test]
    fn test_zero_multiplier_clears_remainder() {
        let mut acc = AxisAccumulator::new();
        acc.remainder = 0.7;
        assert_eq!(acc.quantize(12, 0.0), 0);
        assert_eq!(acc.remainder(), 0.0);
    }

    #[test]
    fn test_non_finite_scaled_value_is_dropped() {
        let mut acc = AxisAccumulator::new();
        acc.remainder = 0.4;
        assert_eq!(acc.quantize(3, f64::INFINITY), 0);
        assert_eq!(acc.remainder(), 0.0);
    }

    #[test]
    fn test_no_flush_inside_window() {
        let t0 = Instant::now();
        let mut acc = MotionAccumulator::new(t0);
        let flush = acc.push(3, -2, t0 + Duration::from_micros(500), || Arc::new(profile()));
        assert!(flush.is_none());
        assert_eq!(acc.axis(Axis::X).pending(), 3);
        assert_eq!(acc.axis(Axis::Y).pending(), -2);
    }

    #[test]
    fn test_flush_after_window() {
        let t0 = Instant::now();
        let mut acc = MotionAccumulator::new(t0);
        acc.push(2, 0, t0 + Duration::from_micros(400), || Arc::new(profile()));
        let flush = acc
            .push(2, 0, t0 + Duration::from_millis(1), || Arc::new(profile()))
            .unwrap();
        // 4 counts in 1 ms = 4000 units/s, far above M = 4: gain average ~ L
        assert_eq!(flush.raw, (4, 0));
        assert!((flush.speed.0 - 4000.0).abs() < 1e-6);
        assert!(flush.multiplier.0 > 1.99);
        assert_eq!(flush.adjusted, (8, 0));
        assert_eq!(flush.multiplier.1, 0.0);
        assert_eq!(acc.axis(Axis::X).pending(), 0);
    }

    #[test]
    fn test_zero_elapsed_keeps_pending() {
        let t0 = Instant::now();
        let mut acc = MotionAccumulator::with_window(Duration::ZERO, t0);
        assert!(acc.push(7, 1, t0, || Arc::new(profile())).is_none());
        assert_eq!(acc.axis(Axis::X).pending(), 7);

        let flush = acc
            .push(1, 0, t0 + Duration::from_millis(2), || Arc::new(profile()))
            .unwrap();
        assert_eq!(flush.raw, (8, 1));
    }

    #[test]
    fn test_idle_axis_keeps_remainder() {
        let t0 = Instant::now();
        let mut acc = MotionAccumulator::new(t0);
        acc.y.remainder = 0.25;
        let flush = acc.flush_with(5, 0, t0 + Duration::from_millis(1), &profile());
        assert_eq!(flush.unwrap().adjusted.1, 0);
        assert_eq!(acc.axis(Axis::Y).remainder(), 0.25);
    }

    #[test]
    fn test_empty_window_does_not_restart_timer() {
        let t0 = Instant::now();
        let mut acc = MotionAccumulator::new(t0);
        assert!(acc.flush(t0 + Duration::from_millis(5), &profile()).is_none());
        assert_eq!(acc.window_start, t0);
    }

    #[test]
    fn test_scale_converts_counts_to_units() {
        let mut preset = Preset::default();
        preset.counts_per_turn = 720.0;
        let profile = EngineProfile::from_preset(&preset).unwrap();
        let t0 = Instant::now();
        let mut acc = MotionAccumulator::new(t0);
        let flush = acc.flush_with(4, 0, t0 + Duration::from_secs(1), &profile).unwrap();
        // 4 counts/s at 2 counts per unit
        assert!((flush.speed.0 - 2.0).abs() < 1e-12);
    }

    impl MotionAccumulator {
        fn flush_with(
            &mut self,
            dx: i32,
            dy: i32,
            now: Instant,
            profile: &EngineProfile,
        ) -> Option<WindowFlush> {
            self.x.push(dx);
            self.y.push(dy);
            self.flush(now, profile)
        }
    }
}
