//! Response curve math.
//!
//! This module contains:
//! - Curve configuration, validation and coefficient derivation
//! - Point-wise and gain-mode sensitivity evaluation
//! - Closed-form and numerical integrals, and jolt
//! - Diagnostic curve sampling

pub mod integrator;
pub mod model;
pub mod sample;
pub mod sensitivity;

// Re-export commonly used types
pub use integrator::{integral, jolt, trapezoid, GAIN_QUADRATURE_STEPS};
pub use model::{
    derive, mirrored_base, AxisConfig, AxisCurve, CurveError, CurveFamily, CurveShape,
    DerivedCoefficients,
};
pub use sample::{sample, sample_range, CurveSeries, SeriesKind, DEFAULT_SAMPLE_STEPS};
pub use sensitivity::evaluate;
