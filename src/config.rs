use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use dirs::home_dir;
use itertools::{Either, Itertools as _};
use log::{error, warn};
use serde_json::Value;

use crate::playback::{PlaybackAction, PlaybackMode, TimeUnit};

const CONFIG_FILE: &str = "playback.json";
const DEFAULT_TIME_FORMAT: &str = "%A, %B %d, %Y %-I:%M:%S %p";
const DEFAULT_ACTIONS: [&str; 7] = [
  "settings",
  "slider",
  "reset",
  "play",
  "fastforward",
  "next",
  "loop",
];

/// Start and end of the time span to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfiguredRange {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
  pub playback_mode: PlaybackMode,
  /// Adds view bound handles a tenth of the range outside of it.
  pub dynamic_range_padding: bool,
  /// strftime pattern for the displayed time.
  pub time_format: String,
  /// Seed for the trailing window, in `unit`s.
  pub initial_trailing_interval: Option<f64>,
  #[serde(rename = "loop")]
  pub looping: bool,
  pub step: i32,
  pub unit: TimeUnit,
  /// Ticks per second.
  pub frame_rate: f64,
  pub range: Option<ConfiguredRange>,
  pub initial_time: Option<DateTime<Utc>>,
  /// Action names. Kept as raw values so bad entries can be skipped one by one.
  pub playback_actions: Vec<Value>,
}

impl Default for PlaybackConfig {
  fn default() -> Self {
    Self {
      playback_mode: PlaybackMode::default(),
      dynamic_range_padding: true,
      time_format: DEFAULT_TIME_FORMAT.to_string(),
      initial_trailing_interval: None,
      looping: false,
      step: 1,
      unit: TimeUnit::default(),
      frame_rate: 1.0,
      range: None,
      initial_time: None,
      playback_actions: DEFAULT_ACTIONS
        .iter()
        .map(|a| Value::String((*a).to_string()))
        .collect(),
    }
  }
}

impl PlaybackConfig {
  /// Reads the config file if there is one and applies environment overrides.
  #[must_use]
  pub fn load() -> Self {
    let mut config = Self::config_dir()
      .map(|dir| dir.join(CONFIG_FILE))
      .filter(|path| path.exists())
      .and_then(|path| {
        Self::from_path(&path)
          .inspect_err(|e| error!("Failed to read config file: {e:#}"))
          .ok()
      })
      .unwrap_or_default();
    config.apply_env();
    config
  }

  pub fn from_path(path: &Path) -> anyhow::Result<Self> {
    let content =
      std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
      serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Self::from_json(value))
  }

  /// Builds a config from a JSON object one entry at a time. Entries that
  /// fail to parse are logged and keep their default.
  #[must_use]
  pub fn from_json(value: Value) -> Self {
    let mut config = Self::default();
    let entries = match value {
      Value::Object(entries) => entries,
      other => {
        error!("Playback config must be a JSON object, got {other}");
        return config;
      }
    };
    for (key, entry) in entries {
      if let Err(e) = config.apply_entry(&key, entry) {
        error!("Skipping config entry {key}: {e}");
      }
    }
    config
  }

  fn apply_entry(&mut self, key: &str, entry: Value) -> serde_json::Result<()> {
    match key {
      "playback_mode" => self.playback_mode = serde_json::from_value(entry)?,
      "dynamic_range_padding" => self.dynamic_range_padding = serde_json::from_value(entry)?,
      "time_format" => self.time_format = serde_json::from_value(entry)?,
      "initial_trailing_interval" => {
        self.initial_trailing_interval = serde_json::from_value(entry)?;
      }
      "loop" => self.looping = serde_json::from_value(entry)?,
      "step" => self.step = serde_json::from_value(entry)?,
      "unit" => self.unit = serde_json::from_value(entry)?,
      "frame_rate" => self.frame_rate = serde_json::from_value(entry)?,
      "range" => self.range = serde_json::from_value(entry)?,
      "initial_time" => self.initial_time = serde_json::from_value(entry)?,
      "playback_actions" => self.playback_actions = serde_json::from_value(entry)?,
      _ => warn!("Unknown config entry {key}"),
    }
    Ok(())
  }

  fn config_dir() -> Option<PathBuf> {
    std::env::var("MAPPLAY_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("mapplay")))
  }

  fn apply_env(&mut self) {
    if let Ok(mode) = std::env::var("MAPPLAY_PLAYBACK_MODE") {
      match mode.parse() {
        Ok(mode) => self.playback_mode = mode,
        Err(e) => warn!("{e}, keeping {}", self.playback_mode),
      }
    }
  }

  /// Parses the configured actions. Unknown or malformed entries are logged and skipped.
  #[must_use]
  pub fn actions(&self) -> Vec<PlaybackAction> {
    let (actions, rejected): (Vec<_>, Vec<_>) =
      self
        .playback_actions
        .iter()
        .partition_map(|entry| match entry.as_str().map(str::parse::<PlaybackAction>) {
          Some(Ok(action)) => Either::Left(action),
          Some(Err(e)) => Either::Right(e),
          None => Either::Right(format!(
            "playback action must be a string, got {entry}"
          )),
        });
    for e in rejected {
      error!("{e}");
    }
    actions.into_iter().unique().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn defaults() {
    let config = PlaybackConfig::default();
    assert_eq!(config.playback_mode, PlaybackMode::Track);
    assert!(config.dynamic_range_padding);
    assert_eq!(
      config.actions(),
      vec![
        PlaybackAction::Settings,
        PlaybackAction::Slider,
        PlaybackAction::Reset,
        PlaybackAction::Play,
        PlaybackAction::FastForward,
        PlaybackAction::Next,
        PlaybackAction::Loop,
      ]
    );
  }

  #[test]
  fn bad_actions_are_skipped() {
    let config = PlaybackConfig {
      playback_actions: vec![
        json!("play"),
        json!("rewind"),
        json!({"xtype": "button"}),
        json!(3),
        json!("end"),
        json!("play"),
      ],
      ..PlaybackConfig::default()
    };
    assert_eq!(
      config.actions(),
      vec![PlaybackAction::Play, PlaybackAction::End]
    );
  }

  #[test]
  fn parses_partial_json() {
    let config = PlaybackConfig::from_json(json!({
      "playback_mode": "decay",
      "loop": true,
      "unit": "days",
      "step": -2,
      "initial_trailing_interval": 3.5,
      "range": {"start": "2020-01-01T00:00:00Z", "end": "2020-02-01T00:00:00Z"}
    }));
    assert_eq!(config.playback_mode, PlaybackMode::Decay);
    assert!(config.looping);
    assert_eq!(config.unit, TimeUnit::Days);
    assert_eq!(config.step, -2);
    assert_eq!(config.initial_trailing_interval, Some(3.5));
    assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
    assert!(config.range.is_some());
  }

  #[test]
  fn bad_entries_keep_their_default() {
    let config = PlaybackConfig::from_json(json!({
      "playback_mode": "rewind",
      "loop": true,
      "step": 5,
      "unit": 3,
      "frame_rate": "fast",
      "range": {"start": "yesterday"},
      "colour": "red"
    }));
    assert_eq!(config.playback_mode, PlaybackMode::Track);
    assert!(config.looping);
    assert_eq!(config.step, 5);
    assert_eq!(config.unit, TimeUnit::Minutes);
    assert!((config.frame_rate - 1.0).abs() < f64::EPSILON);
    assert_eq!(config.range, None);
  }

  #[test]
  fn non_object_config_is_default() {
    assert_eq!(
      PlaybackConfig::from_json(json!(["decay"])),
      PlaybackConfig::default()
    );
  }

  #[test]
  fn from_path_skips_bad_entries() {
    let dir = std::env::temp_dir().join(format!("mapplay-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, r#"{"playback_mode": "rewind", "loop": true, "step": 5}"#).unwrap();
    let config = PlaybackConfig::from_path(&path).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
    assert_eq!(config.playback_mode, PlaybackMode::Track);
    assert!(config.looping);
    assert_eq!(config.step, 5);
  }

  #[test]
  fn from_missing_path_fails() {
    assert!(PlaybackConfig::from_path(Path::new("/nonexistent/playback.json")).is_err());
  }
}
