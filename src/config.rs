//! Preset configuration for GyroGravity.
//!
//! A [`Preset`] is the persisted record: two [`AxisSettings`] blocks, the two
//! sync directives and the counts-per-full-turn scale. Loading is lenient:
//! a missing or invalid field falls back to its default instead of failing
//! the whole file. Legacy presets with PascalCase keys and numeric curve
//! types load as well.

use crate::curve::{
    derive, mirrored_base, AxisConfig, AxisCurve, CurveError, CurveFamily, CurveShape,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Counts per full turn when nothing else is configured (1 count per unit).
pub const DEFAULT_COUNTS_PER_TURN: f64 = 360.0;

/// Units in one full turn.
pub const UNITS_PER_TURN: f64 = 360.0;

/// Editable settings for one axis, as stored in a preset.
///
/// This is the flat, UI-facing record: the exponent and limit flag are kept
/// even when the selected family ignores them, so switching families does
/// not lose them. [`AxisSettings::to_config`] narrows it to an [`AxisConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSettings {
    pub curve_type: CurveFamily,
    /// K
    pub base_sensitivity: f64,
    /// L
    pub target_sensitivity: f64,
    /// N
    pub offset: f64,
    /// M
    pub target_speed: f64,
    pub exponent: f64,
    pub enable_limit: bool,
    pub mirror_sense: bool,
    pub use_gain: bool,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            curve_type: CurveFamily::Natural,
            base_sensitivity: 1.0,
            target_sensitivity: 2.0,
            offset: 0.0,
            target_speed: 4.0,
            exponent: 0.05,
            enable_limit: true,
            mirror_sense: false,
            use_gain: true,
        }
    }
}

impl AxisSettings {
    /// Select a curve family, resetting gain mode to that family's default.
    pub fn select_family(&mut self, family: CurveFamily) {
        self.curve_type = family;
        self.use_gain = family.default_gain();
    }

    /// Suggested range for the target sensitivity: `L` to `L²`.
    pub fn recommended_limit_range(&self) -> (f64, f64) {
        let l = self.target_sensitivity;
        (l, l * l)
    }

    /// Narrow to the validated curve configuration, resolving mirror mode.
    pub fn to_config(&self) -> Result<AxisConfig, CurveError> {
        let base = if self.mirror_sense {
            mirrored_base(self.target_sensitivity)?
        } else {
            self.base_sensitivity
        };
        let shape = match self.curve_type {
            CurveFamily::Natural => CurveShape::Natural,
            CurveFamily::Linear => CurveShape::Linear {
                limit: self.enable_limit,
            },
            CurveFamily::Power => CurveShape::Power {
                exponent: self.exponent,
                limit: self.enable_limit,
            },
            CurveFamily::Sigmoid => CurveShape::Sigmoid,
        };
        Ok(AxisConfig {
            base,
            target: self.target_sensitivity,
            offset: self.offset,
            target_speed: self.target_speed,
            shape,
            gain: self.use_gain,
        })
    }

    /// Build the curve for these settings.
    pub fn to_curve(&self) -> Result<AxisCurve, CurveError> {
        derive(self.to_config()?)
    }

    fn from_value(value: &Value) -> Self {
        let d = Self::default();
        let fields = Fields::new(value);
        Self {
            curve_type: fields.family(&["curve_type", "CurveType"], d.curve_type),
            base_sensitivity: fields.positive(
                &["base_sensitivity", "BaseSensitivity"],
                d.base_sensitivity,
            ),
            target_sensitivity: fields.positive(
                &["target_sensitivity", "TargetSensitivity"],
                d.target_sensitivity,
            ),
            offset: fields.non_negative(&["offset", "Offset"], d.offset),
            target_speed: fields.non_negative(
                &["target_speed", "TargetCounts", "target_counts"],
                d.target_speed,
            ),
            exponent: fields.positive(&["exponent", "Exponent"], d.exponent),
            enable_limit: fields.flag(&["enable_limit", "EnableLimit"], d.enable_limit),
            mirror_sense: fields.flag(&["mirror_sense", "MirrorSense"], d.mirror_sense),
            use_gain: fields.flag(&["use_gain", "UseGain"], d.use_gain),
        }
    }
}

impl<'de> Deserialize<'de> for AxisSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// A complete two-axis preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub x_settings: AxisSettings,
    pub y_settings: AxisSettings,
    /// Copy X's curve family onto Y on commit.
    pub sync_curves: bool,
    /// Copy every other X setting onto Y on commit.
    pub sync_settings: bool,
    /// Raw counts that make one full turn (360 units).
    pub counts_per_turn: f64,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            x_settings: AxisSettings::default(),
            y_settings: AxisSettings::default(),
            sync_curves: true,
            sync_settings: true,
            counts_per_turn: DEFAULT_COUNTS_PER_TURN,
        }
    }
}

impl Preset {
    /// The settings each axis actually runs with after the sync directives.
    ///
    /// Propagation is one-shot from X to Y; Y's own values are discarded for
    /// whatever a directive covers.
    pub fn effective_axes(&self) -> (AxisSettings, AxisSettings) {
        let x = self.x_settings.clone();
        let mut y = self.y_settings.clone();
        if self.sync_curves {
            y.curve_type = x.curve_type;
        }
        if self.sync_settings {
            y = AxisSettings {
                curve_type: y.curve_type,
                ..x.clone()
            };
        }
        (x, y)
    }

    /// Raw counts per unit of speed.
    pub fn counts_per_unit(&self) -> f64 {
        self.counts_per_turn / UNITS_PER_TURN
    }

    /// Parse a preset. Only malformed JSON is an error; bad fields fall back.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let value: Value = serde_json::from_str(json).map_err(PersistenceError::Parse)?;
        Ok(Self::from_value(&value))
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(PersistenceError::Serialize)
    }

    /// Load a preset file.
    pub fn load_from(path: &Path) -> Result<Self, PersistenceError> {
        let content = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Write a preset file, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = self.to_json()?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Load the last applied settings, or the defaults if none were saved.
    pub fn load_last() -> Self {
        Self::load_or_default(&Self::last_settings_path())
    }

    /// Load `path`, falling back to the defaults if it is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(preset) => preset,
            Err(e) => {
                tracing::warn!("Could not load settings, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Remember these settings for the next start.
    pub fn save_last(&self) -> Result<(), PersistenceError> {
        self.save_to(&Self::last_settings_path())
    }

    /// Path of the last-settings file.
    pub fn last_settings_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gyrogravity")
            .join("last_settings.json")
    }

    fn from_value(value: &Value) -> Self {
        let d = Self::default();
        let fields = Fields::new(value);
        let axis = |keys: &[&str]| {
            fields
                .get(keys)
                .filter(|v| v.is_object())
                .map(AxisSettings::from_value)
                .unwrap_or_default()
        };
        Self {
            x_settings: axis(&["x_settings", "XSettings"]),
            y_settings: axis(&["y_settings", "YSettings"]),
            sync_curves: fields.flag(&["sync_curves", "SyncCurves"], d.sync_curves),
            sync_settings: fields.flag(&["sync_settings", "SyncSettings"], d.sync_settings),
            counts_per_turn: fields.positive(
                &["counts_per_turn", "CountsFor360"],
                d.counts_per_turn,
            ),
        }
    }
}

impl<'de> Deserialize<'de> for Preset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Lenient field access over a JSON object.
struct Fields<'a> {
    value: &'a Value,
}

impl<'a> Fields<'a> {
    fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|k| self.value.get(*k))
    }

    fn number(&self, keys: &[&str], default: f64, valid: impl Fn(f64) -> bool) -> f64 {
        match self.get(keys) {
            None => default,
            Some(raw) => match raw.as_f64().filter(|v| v.is_finite() && valid(*v)) {
                Some(v) => v,
                None => {
                    tracing::warn!(field = keys[0], value = %raw, default, "Invalid preset value, using default");
                    default
                }
            },
        }
    }

    fn positive(&self, keys: &[&str], default: f64) -> f64 {
        self.number(keys, default, |v| v > 0.0)
    }

    fn non_negative(&self, keys: &[&str], default: f64) -> f64 {
        self.number(keys, default, |v| v >= 0.0)
    }

    fn flag(&self, keys: &[&str], default: bool) -> bool {
        match self.get(keys) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(raw) => {
                tracing::warn!(field = keys[0], value = %raw, default, "Invalid preset flag, using default");
                default
            }
        }
    }

    fn family(&self, keys: &[&str], default: CurveFamily) -> CurveFamily {
        let parsed = match self.get(keys) {
            None => return default,
            Some(Value::String(name)) => CurveFamily::parse(name),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|i| CurveFamily::ALL.get(i as usize).copied()),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| {
            tracing::warn!(field = keys[0], %default, "Unknown curve type, using default");
            default
        })
    }
}

/// Preset load/save errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}
