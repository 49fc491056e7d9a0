//! Motion injection seam.
//!
//! The engine hands its quantized output to a [`MotionInjector`]. The
//! Windows collector provides one backed by `SendInput`; the in-process
//! injectors here are used by the channel collector and by tests.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// The OS refused or only partially accepted an injected event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    #[error("injection rejected: {0}")]
    Rejected(String),
    #[error("injector is closed")]
    Closed,
}

/// Sink for relative motion emitted by the engine.
pub trait MotionInjector: Send {
    /// Emit one relative move tagged with `origin`.
    fn inject(&mut self, dx: i32, dy: i32, origin: u64) -> Result<(), InjectionError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInjector;

impl MotionInjector for NullInjector {
    fn inject(&mut self, _dx: i32, _dy: i32, _origin: u64) -> Result<(), InjectionError> {
        Ok(())
    }
}

/// A move captured by [`RecordingInjector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedMove {
    pub dx: i32,
    pub dy: i32,
    pub origin: u64,
}

/// Keeps every injected move in a shared list.
#[derive(Debug, Default, Clone)]
pub struct RecordingInjector {
    moves: Arc<Mutex<Vec<InjectedMove>>>,
    fail: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An injector that rejects every move.
    pub fn failing() -> Self {
        Self {
            moves: Arc::default(),
            fail: true,
        }
    }

    pub fn moves(&self) -> Vec<InjectedMove> {
        self.moves.lock().clone()
    }

    /// Sum of all injected moves.
    pub fn total(&self) -> (i64, i64) {
        self.moves.lock().iter().fold((0, 0), |(x, y), m| {
            (x + i64::from(m.dx), y + i64::from(m.dy))
        })
    }
}

impl MotionInjector for RecordingInjector {
    fn inject(&mut self, dx: i32, dy: i32, origin: u64) -> Result<(), InjectionError> {
        if self.fail {
            return Err(InjectionError::Rejected("recording injector set to fail".into()));
        }
        self.moves.lock().push(InjectedMove { dx, dy, origin });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_injector_shares_moves() {
        let recorder = RecordingInjector::new();
        let mut sink = recorder.clone();
        sink.inject(3, -1, 7).unwrap();
        sink.inject(-1, 2, 7).unwrap();
        assert_eq!(recorder.moves().len(), 2);
        assert_eq!(recorder.total(), (2, 1));
    }

    #[test]
    fn test_failing_injector() {
        let mut sink = RecordingInjector::failing();
        assert!(sink.inject(1, 1, 0).is_err());
        assert!(sink.moves().is_empty());
    }
}
