//! Motion engine: accumulation, conversion and injection for one stream.

use crate::collector::inject::MotionInjector;
use crate::collector::types::{RawMotionEvent, SYNTHETIC_ORIGIN};
use crate::core::accumulator::{MotionAccumulator, WindowFlush, WINDOW};
use crate::core::profile::ProfileHandle;
use crate::diagnostics::SharedMotionStats;
use std::time::{Duration, Instant};

/// Engine timing options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Minimum time a window stays open before it is flushed.
    pub window: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { window: WINDOW }
    }
}

/// Converts a stream of raw motion events into adjusted, injected motion.
///
/// Owned by exactly one capture thread. The profile handle and stats are
/// shared with the control side.
pub struct MotionEngine {
    accumulator: MotionAccumulator,
    profile: ProfileHandle,
    injector: Box<dyn MotionInjector>,
    stats: SharedMotionStats,
    accepting: bool,
}

impl MotionEngine {
    pub fn new(
        profile: ProfileHandle,
        injector: Box<dyn MotionInjector>,
        stats: SharedMotionStats,
    ) -> Self {
        Self::with_options(profile, injector, stats, EngineOptions::default())
    }

    pub fn with_options(
        profile: ProfileHandle,
        injector: Box<dyn MotionInjector>,
        stats: SharedMotionStats,
        options: EngineOptions,
    ) -> Self {
        Self {
            accumulator: MotionAccumulator::with_window(options.window, Instant::now()),
            profile,
            injector,
            stats,
            accepting: true,
        }
    }

    pub fn stats(&self) -> &SharedMotionStats {
        &self.stats
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Handle one raw event at the current time.
    pub fn handle(&mut self, event: RawMotionEvent) -> Option<WindowFlush> {
        self.handle_at(event, Instant::now())
    }

    /// Handle one raw event observed at `now`.
    ///
    /// Returns the flush if this event closed a window. Echoes of our own
    /// injections are counted and dropped. A window that rounds to `(0, 0)`
    /// is recorded but nothing is injected.
    pub fn handle_at(&mut self, event: RawMotionEvent, now: Instant) -> Option<WindowFlush> {
        if !self.accepting {
            return None;
        }
        if event.is_synthetic() {
            self.stats.record_echo_filtered();
            return None;
        }
        self.stats.record_raw_event();

        let profile = &self.profile;
        let flush = self
            .accumulator
            .push(event.dx, event.dy, now, || profile.load())?;
        self.stats.record_flush(&flush);

        let (dx, dy) = flush.adjusted;
        if dx != 0 || dy != 0 {
            if let Err(e) = self.injector.inject(dx, dy, SYNTHETIC_ORIGIN) {
                tracing::warn!(dx, dy, "Failed to inject adjusted motion: {e}");
                self.stats.record_injection_failure();
            }
        }
        Some(flush)
    }

    /// Stop accepting events. Pending motion is discarded with the engine.
    pub fn shutdown(&mut self) {
        if self.accepting {
            tracing::debug!(
                pending_x = self.accumulator.axis(crate::core::Axis::X).pending(),
                pending_y = self.accumulator.axis(crate::core::Axis::Y).pending(),
                "Motion engine shutting down"
            );
        }
        self.accepting = false;
    }
}
