use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct Settings {
    pub tick_interval_ms: u64,
    pub finish_hold_ms: u64,
    pub alert_enabled: bool,
    pub alert_sound: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            finish_hold_ms: 3_000,
            alert_enabled: true,
            alert_sound: None,
        }
    }
}

/// Missing file means defaults; an unreadable or malformed file is an error.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read settings file {}", path.display()))?;
    parse_settings_text(&content)
}

pub fn parse_settings_text(content: &str) -> Result<Settings> {
    let raw = serde_json::from_str::<SettingsFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported settings version {}; expected version 1",
            raw.version
        );
    }
    if raw.tick_interval_ms == 0 {
        bail!("tick_interval_ms must be greater than zero");
    }

    Ok(Settings {
        tick_interval_ms: raw.tick_interval_ms,
        finish_hold_ms: raw.finish_hold_ms,
        alert_enabled: raw.alert_enabled,
        alert_sound: raw.alert_sound.map(PathBuf::from),
    })
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let payload = json!({
        "version": 1,
        "tick_interval_ms": settings.tick_interval_ms,
        "finish_hold_ms": settings.finish_hold_ms,
        "alert_enabled": settings.alert_enabled,
        "alert_sound": settings.alert_sound.as_ref().map(|p| p.display().to_string()),
    });
    let text = serde_json::to_string_pretty(&payload)?;
    fs::write(path, format!("{text}\n"))
        .with_context(|| format!("unable to write settings file {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    version: u32,
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default = "default_finish_hold_ms")]
    finish_hold_ms: u64,
    #[serde(default = "default_alert_enabled")]
    alert_enabled: bool,
    #[serde(default)]
    alert_sound: Option<String>,
}

fn default_tick_interval_ms() -> u64 {
    10
}

fn default_finish_hold_ms() -> u64 {
    3_000
}

fn default_alert_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_settings() {
        let json = r#"
{
  "version": 1,
  "tick_interval_ms": 20,
  "finish_hold_ms": 1500,
  "alert_enabled": false,
  "alert_sound": "chime.wav"
}
"#;
        let settings = parse_settings_text(json).expect("valid settings");
        assert_eq!(settings.tick_interval_ms, 20);
        assert_eq!(settings.finish_hold_ms, 1_500);
        assert!(!settings.alert_enabled);
        assert_eq!(settings.alert_sound, Some(PathBuf::from("chime.wav")));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings = parse_settings_text(r#"{ "version": 1 }"#).expect("valid settings");
        assert_eq!(settings.tick_interval_ms, 10);
        assert_eq!(settings.finish_hold_ms, 3_000);
        assert!(settings.alert_enabled);
        assert!(settings.alert_sound.is_none());
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = parse_settings_text(r#"{ "version": 2 }"#).expect_err("version 2 should fail");
        assert!(err.to_string().contains("unsupported settings version"));
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let json = r#"{ "version": 1, "tick_interval_ms": 0 }"#;
        let err = parse_settings_text(json).expect_err("zero interval should fail");
        assert!(err.to_string().contains("tick_interval_ms"));
    }

    #[test]
    fn rejects_malformed_json_with_location() {
        let err = parse_settings_text("{ not-valid-json ").expect_err("should fail");
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings =
            load_settings(&dir.path().join("absent.json")).expect("defaults for missing file");
        assert_eq!(settings.tick_interval_ms, 10);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let settings = Settings {
            tick_interval_ms: 25,
            finish_hold_ms: 2_000,
            alert_enabled: false,
            alert_sound: Some(PathBuf::from("bell.ogg")),
        };
        save_settings(&path, &settings).expect("save");
        let loaded = load_settings(&path).expect("load");
        assert_eq!(loaded.tick_interval_ms, 25);
        assert_eq!(loaded.finish_hold_ms, 2_000);
        assert!(!loaded.alert_enabled);
        assert_eq!(loaded.alert_sound, Some(PathBuf::from("bell.ogg")));
    }
}
