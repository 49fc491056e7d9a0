//! Core functionality for the GyroGravity engine.
//!
//! This module contains:
//! - The published, swappable curve profile
//! - Fixed-window accumulation and quantization
//! - The motion engine that ties capture, conversion and injection together

pub mod accumulator;
pub mod engine;
pub mod profile;

// Re-export commonly used types
pub use accumulator::{AxisAccumulator, MotionAccumulator, WindowFlush, WINDOW};
pub use engine::{EngineOptions, MotionEngine};
pub use profile::{Axis, EngineProfile, ProfileError, ProfileHandle};
