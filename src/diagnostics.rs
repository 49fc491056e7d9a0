//! Live motion diagnostics.
//!
//! The capture thread records every window it flushes here; the display
//! thread polls [`MotionStats::snapshot`] on its own timer. Each axis keeps
//! its last raw and adjusted values packed into a single `AtomicU64` so a
//! reader never sees the raw count of one flush paired with the adjusted
//! count of another.

use crate::core::accumulator::WindowFlush;
use crate::core::profile::Axis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Interval at which the display polls the last-move values.
pub const DISPLAY_INTERVAL: Duration = Duration::from_millis(42);

fn pack(raw: i32, adjusted: i32) -> u64 {
    (u64::from(raw as u32) << 32) | u64::from(adjusted as u32)
}

fn unpack(word: u64) -> (i32, i32) {
    ((word >> 32) as u32 as i32, word as u32 as i32)
}

/// Session counters and last-move values for the motion engine.
#[derive(Debug)]
pub struct MotionStats {
    last_x: AtomicU64,
    last_y: AtomicU64,
    raw_events: AtomicU64,
    flushes: AtomicU64,
    echoes_filtered: AtomicU64,
    decode_failures: AtomicU64,
    injection_failures: AtomicU64,
    session_start: DateTime<Utc>,
}

impl MotionStats {
    pub fn new() -> Self {
        Self {
            last_x: AtomicU64::new(0),
            last_y: AtomicU64::new(0),
            raw_events: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            echoes_filtered: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            injection_failures: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_raw_event(&self) {
        self.raw_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_echo_filtered(&self) {
        self.echoes_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_injection_failure(&self) {
        self.injection_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish the raw and adjusted values of a flushed window.
    pub fn record_flush(&self, flush: &WindowFlush) {
        self.last_x
            .store(pack(flush.raw.0, flush.adjusted.0), Ordering::Relaxed);
        self.last_y
            .store(pack(flush.raw.1, flush.adjusted.1), Ordering::Relaxed);
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Last `(raw, adjusted)` pair for one axis.
    pub fn last_move(&self, axis: Axis) -> (i32, i32) {
        let word = match axis {
            Axis::X => &self.last_x,
            Axis::Y => &self.last_y,
        };
        unpack(word.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let (raw_x, adjusted_x) = self.last_move(Axis::X);
        let (raw_y, adjusted_y) = self.last_move(Axis::Y);
        StatsSnapshot {
            last_raw: (raw_x, raw_y),
            last_adjusted: (adjusted_x, adjusted_y),
            raw_events: self.raw_events.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            echoes_filtered: self.echoes_filtered.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            injection_failures: self.injection_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// The two display lines shown while the engine runs.
    pub fn display_lines(&self) -> (String, String) {
        let s = self.snapshot();
        (
            format!("Last Raw Move: {}, {}", s.last_raw.0, s.last_raw.1),
            format!(
                "Last Adjusted Move: {}, {}",
                s.last_adjusted.0, s.last_adjusted.1
            ),
        )
    }

    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Raw motion events: {}\n\
             - Windows flushed: {}\n\
             - Echoes filtered: {}\n\
             - Undecodable input messages: {}\n\
             - Failed injections: {}\n\
             - Session duration: {} seconds",
            s.raw_events,
            s.flushes,
            s.echoes_filtered,
            s.decode_failures,
            s.injection_failures,
            s.session_duration_secs
        )
    }
}

impl Default for MotionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`MotionStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub last_raw: (i32, i32),
    pub last_adjusted: (i32, i32),
    pub raw_events: u64,
    pub flushes: u64,
    pub echoes_filtered: u64,
    pub decode_failures: u64,
    pub injection_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

pub type SharedMotionStats = Arc<MotionStats>;
