use plotmerge_gcode::{InkModeKind, MemorySink, MemorySource, PaperPolicy};
use plotmerge_settings::{JobKind, Settings, SettingsError};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut settings = Settings::default();
    settings.plotter.pen_down_z = 5.5;
    settings.gcode.drawing.stroke_interval = Some(3);
    settings.save_to_file(&path).unwrap();

    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut settings = Settings::default();
    settings.macros.require_paper_macro = true;
    settings.gcode.writing.ink_mode = InkModeKind::Off;
    settings.save_to_file(&path).unwrap();

    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.paper_policy(), PaperPolicy::Required);
}

#[test]
fn test_partial_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[plotter]\npen_down_z = 6\n\n[gcode.writing]\nink_mode = \"stroke\"\n",
    )
    .unwrap();

    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded.plotter.pen_down_z, 6.0);
    assert_eq!(loaded.gcode.writing.ink_mode, InkModeKind::Stroke);
    assert_eq!(loaded.gcode.writing.stroke_interval, Some(40));
    assert_eq!(loaded.macros.paper_macro.len(), 3);
}

#[test]
fn test_ensure_file_keeps_existing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    Settings::ensure_file(&path).unwrap();
    assert!(path.exists());
    assert_eq!(Settings::load_from_file(&path).unwrap(), Settings::default());

    fs::write(&path, r#"{"plotter": {"pen_up_z": 1.5}}"#).unwrap();
    Settings::ensure_file(&path).unwrap();
    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded.plotter.pen_up_z, 1.5);
}

#[test]
fn test_update_file_merges() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let updated = Settings::update_file(
        &path,
        json!({"positions": {"ink": {"x": 42.0}}, "gcode": {"marker": {"token": ";INK"}}}),
    )
    .unwrap();
    assert_eq!(updated.positions.ink.x, 42.0);
    assert_eq!(updated.positions.ink.y, -10.0);

    let reloaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(reloaded.gcode.marker.token, ";INK");
    assert_eq!(reloaded.positions.ink.x, 42.0);
}

#[test]
fn test_invalid_json_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();
    let err = Settings::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::JsonError(_)));
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    let err = Settings::load_from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SettingsError::LoadError(_)));
}

#[test]
fn test_build_post_config_runs() {
    let mut settings = Settings::default();
    settings.gcode.writing.ink_mode = InkModeKind::Off;
    settings.gcode.drawing.stroke_interval = Some(1);

    let config = settings
        .build_post_config(
            Box::new(MemorySource::new("w", ["G1 F500", "G1 Z8", "G0 Z0"])),
            Box::new(MemorySource::new("d", ["G1 F500", "G1 Z8", "G0 Z0"])),
        )
        .unwrap();
    assert_eq!(config.writing.name(), JobKind::Writing.name());
    assert_eq!(config.macro_context.get("safe_z"), Some(1.0));

    let mut sink = MemorySink::new();
    let result = plotmerge_gcode::post_process(config, &mut sink).unwrap();
    assert_eq!(result.writing_ink(), 0);
    assert_eq!(result.drawing_ink(), 1);
    assert_eq!(result.paper_changes, 1);
    assert!(sink.is_written());
}

#[test]
fn test_build_post_config_rejects_bad_mode() {
    let mut settings = Settings::default();
    settings.gcode.drawing.stroke_interval = None;
    let err = settings
        .build_post_config(
            Box::new(MemorySource::new("w", ["G1 F500"])),
            Box::new(MemorySource::new("d", ["G1 F500"])),
        )
        .unwrap_err();
    assert!(err.is_config_error());
}
