//! Integration tests for preset persistence and profile building

use gyrogravity::config::{AxisSettings, Preset};
use gyrogravity::curve::{evaluate, CurveFamily};
use gyrogravity::{Axis, EngineProfile, ProfileError};

const SPEEDS: [f64; 7] = [0.0, 0.25, 1.0, 3.9, 4.0, 17.0, 400.0];

fn custom_preset() -> Preset {
    let mut preset = Preset::default();
    preset.sync_settings = false;
    preset.sync_curves = false;
    preset.counts_per_turn = 1600.0;
    preset.x_settings = AxisSettings {
        curve_type: CurveFamily::Power,
        base_sensitivity: 0.8,
        target_sensitivity: 2.4,
        offset: 1.5,
        target_speed: 9.0,
        exponent: 1.7,
        enable_limit: false,
        mirror_sense: false,
        use_gain: true,
    };
    preset.y_settings.select_family(CurveFamily::Sigmoid);
    preset
}

#[test]
fn test_saved_preset_evaluates_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets").join("custom.json");

    let preset = custom_preset();
    preset.save_to(&path).unwrap();
    let loaded = Preset::load_from(&path).unwrap();
    assert_eq!(loaded, preset);

    let before = EngineProfile::from_preset(&preset).unwrap();
    let after = EngineProfile::from_preset(&loaded).unwrap();
    for axis in [Axis::X, Axis::Y] {
        for v in SPEEDS {
            assert_eq!(
                evaluate(before.curve(axis), v),
                evaluate(after.curve(axis), v)
            );
        }
    }
    assert_eq!(before.counts_per_unit, after.counts_per_unit);
}

#[test]
fn test_legacy_preset_keys() {
    let json = r#"{
        "XSettings": {
            "CurveType": 1,
            "BaseSensitivity": 1.2,
            "TargetSensitivity": 2.2,
            "Offset": 0.5,
            "TargetCounts": 6,
            "Exponent": 2,
            "EnableLimit": true,
            "MirrorSense": false,
            "UseGain": false
        },
        "YSettings": {},
        "SyncCurves": true,
        "SyncSettings": true,
        "CountsFor360": 720
    }"#;
    let preset = Preset::from_json(json).unwrap();
    assert_eq!(preset.x_settings.curve_type, CurveFamily::Linear);
    assert_eq!(preset.x_settings.target_speed, 6.0);
    assert!(!preset.x_settings.use_gain);
    assert_eq!(preset.counts_per_unit(), 2.0);

    let profile = EngineProfile::from_preset(&preset).unwrap();
    // sync copies X onto Y
    assert_eq!(profile.x, profile.y);
    assert!((evaluate(&profile.y, 6.0) - 2.2).abs() < 1e-12);
}

#[test]
fn test_bad_fields_fall_back_to_defaults() {
    let json = r#"{
        "x_settings": { "curve_type": "spline", "target_speed": -3, "use_gain": "yes" },
        "counts_per_turn": 0
    }"#;
    let preset = Preset::from_json(json).unwrap();
    let defaults = AxisSettings::default();
    assert_eq!(preset.x_settings, defaults);
    assert_eq!(preset.counts_per_turn, 360.0);
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(Preset::from_json("{ not json").is_err());
}

#[test]
fn test_invalid_axis_is_named() {
    let mut preset = custom_preset();
    preset.y_settings.offset = 5.0;
    preset.y_settings.target_speed = 2.0;
    match EngineProfile::from_preset(&preset) {
        Err(ProfileError::Curve { axis, .. }) => assert_eq!(axis, Axis::Y),
        other => panic!("expected a Y axis error, got {other:?}"),
    }
}

#[test]
fn test_mirror_uses_reciprocal_target() {
    let mut preset = Preset::default();
    preset.x_settings.select_family(CurveFamily::Linear);
    preset.x_settings.use_gain = false;
    preset.x_settings.mirror_sense = true;
    preset.x_settings.target_sensitivity = 4.0;
    let profile = EngineProfile::from_preset(&preset).unwrap();
    assert_eq!(profile.x.config().base, 0.25);
    assert_eq!(evaluate(&profile.x, 0.1), 0.25 + (4.0 - 0.25) / 4.0 * 0.1);
}
