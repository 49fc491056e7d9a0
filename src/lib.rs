//! GyroGravity - velocity-dependent pointer sensitivity.
//!
//! This library rescales relative pointer motion by a multiplier that
//! depends on how fast the device is moving. Motion is summed over short
//! fixed windows, converted through a per-axis response curve and rounded
//! back to whole counts with the rounding remainder carried forward, so the
//! emitted stream never drifts from the ideal scaled stream.
//!
//! # Guarantees
//!
//! - **No drift**: the sum of emitted counts stays within one count of the
//!   sum of scaled counts, per axis, for any stream
//! - **Consistent profiles**: a flush always reads both axis curves and
//!   the counts-per-turn scale from one committed preset
//! - **No feedback**: injected motion is tagged and never re-enters the
//!   accumulator
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          GyroGravity                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Collector  │──▶│ Accumulator │──▶│  Injector   │         │
//! │  │ (raw input) │   │ (1 ms bins) │   │ (SendInput) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │                 ▲                 │                │
//! │         ▼                 │                 ▼                │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │    Echo     │   │   Profile   │   │ Diagnostics │         │
//! │  │   filter    │   │  (curves)   │   │ (last move) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gyrogravity::config::Preset;
//! use gyrogravity::curve::evaluate;
//! use gyrogravity::EngineProfile;
//!
//! let profile = EngineProfile::from_preset(&Preset::default()).unwrap();
//!
//! // Multiplier at 2 units/s on the X axis
//! let multiplier = evaluate(&profile.x, 2.0);
//! assert!(multiplier > 1.0 && multiplier < 2.0);
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod curve;
pub mod diagnostics;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorError, MotionInjector, RawMotionEvent, SYNTHETIC_ORIGIN};
pub use config::{AxisSettings, PersistenceError, Preset};
pub use core::{
    Axis, EngineOptions, EngineProfile, MotionAccumulator, MotionEngine, ProfileError,
    ProfileHandle, WindowFlush,
};
pub use curve::{AxisCurve, CurveError, CurveFamily};
pub use diagnostics::{MotionStats, SharedMotionStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
