//! Published curve profile.
//!
//! The capture thread reads curves while the control thread edits them. An
//! [`EngineProfile`] is immutable once built; [`ProfileHandle`] publishes a
//! new one by swapping an `Arc`, so a reader holding a snapshot always sees
//! one consistent pair of axis curves and scale.

use crate::config::Preset;
use crate::curve::{AxisCurve, CurveError};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Motion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// A preset that failed to build; names the axis at fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("{axis} axis: {source}")]
    Curve {
        axis: Axis,
        #[source]
        source: CurveError,
    },
    #[error("counts per full turn must be a positive number (got {0})")]
    InvalidScale(f64),
}

/// Everything a flush needs, built and validated as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineProfile {
    pub x: AxisCurve,
    pub y: AxisCurve,
    /// Raw counts per unit of speed.
    pub counts_per_unit: f64,
}

impl EngineProfile {
    /// Build from a preset after applying its sync directives.
    pub fn from_preset(preset: &Preset) -> Result<Self, ProfileError> {
        let (x, y) = preset.effective_axes();
        let counts_per_unit = preset.counts_per_unit();
        if !counts_per_unit.is_finite() || counts_per_unit <= 0.0 {
            return Err(ProfileError::InvalidScale(preset.counts_per_turn));
        }
        let x = x.to_curve().map_err(|source| ProfileError::Curve {
            axis: Axis::X,
            source,
        })?;
        let y = y.to_curve().map_err(|source| ProfileError::Curve {
            axis: Axis::Y,
            source,
        })?;
        Ok(Self {
            x,
            y,
            counts_per_unit,
        })
    }

    pub fn curve(&self, axis: Axis) -> &AxisCurve {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

/// Shared, swappable handle to the active [`EngineProfile`].
///
/// Readers hold the lock only long enough to clone the `Arc`.
#[derive(Debug, Clone)]
pub struct ProfileHandle {
    current: Arc<RwLock<Arc<EngineProfile>>>,
}

impl ProfileHandle {
    pub fn new(profile: EngineProfile) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(profile))),
        }
    }

    /// Take a snapshot of the active profile.
    pub fn load(&self) -> Arc<EngineProfile> {
        self.current.read().clone()
    }

    /// Build a profile from `preset` and publish it.
    ///
    /// On error nothing is published and the previous profile stays active.
    pub fn commit(&self, preset: &Preset) -> Result<Arc<EngineProfile>, ProfileError> {
        match EngineProfile::from_preset(preset) {
            Ok(profile) => {
                let profile = Arc::new(profile);
                *self.current.write() = profile.clone();
                tracing::info!(
                    x = %profile.x.family(),
                    y = %profile.y.family(),
                    counts_per_unit = profile.counts_per_unit,
                    "Profile committed"
                );
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!("Profile rejected, keeping previous curves: {e}");
                Err(e)
            }
        }
    }
}
