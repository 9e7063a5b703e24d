use super::slider::HandleRole;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// How the visible time window follows the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
  /// Only the current instant is shown.
  #[default]
  Track,
  /// Everything from the range start up to the current instant.
  Cumulative,
  /// A trailing window of fixed width behind the current instant.
  Ranged,
  /// Like ranged, with content fading out over the window.
  Decay,
}

impl PlaybackMode {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      PlaybackMode::Track => "track",
      PlaybackMode::Cumulative => "cumulative",
      PlaybackMode::Ranged => "ranged",
      PlaybackMode::Decay => "decay",
    }
  }

  #[must_use]
  pub fn all() -> &'static [PlaybackMode] {
    &[
      PlaybackMode::Track,
      PlaybackMode::Cumulative,
      PlaybackMode::Ranged,
      PlaybackMode::Decay,
    ]
  }
}

impl Display for PlaybackMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for PlaybackMode {
  type Err = String;
  fn from_str(input: &str) -> Result<PlaybackMode, Self::Err> {
    PlaybackMode::all()
      .iter()
      .find(|mode| mode.name().eq_ignore_ascii_case(input.trim()))
      .copied()
      .ok_or_else(|| format!("Unknown playback mode: {input}"))
  }
}

/// How a rendering agent turns the published window into a time filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RangeMode {
  Cumulative,
  /// Trailing window, `interval` in clock units.
  Range { interval: Option<f64> },
}

/// Options handed to the per layer type agents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentOptions {
  pub wms: Option<RangeMode>,
  pub vector: Option<RangeMode>,
}

/// Everything that depends on the playback mode, resolved once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeStrategy {
  mode: PlaybackMode,
  dynamic_padding: bool,
}

impl ModeStrategy {
  #[must_use]
  pub fn resolve(mode: PlaybackMode, dynamic_padding: bool) -> Self {
    Self {
      mode,
      dynamic_padding,
    }
  }

  #[must_use]
  pub fn mode(&self) -> PlaybackMode {
    self.mode
  }

  /// Ticks move a trailing boundary along with the cursor.
  #[must_use]
  pub fn has_trailing_window(&self) -> bool {
    matches!(self.mode, PlaybackMode::Ranged | PlaybackMode::Decay)
  }

  /// Slider roles to create besides the cursor, in display order.
  #[must_use]
  pub fn optional_roles(&self) -> Vec<HandleRole> {
    let mut roles = Vec::new();
    if self.dynamic_padding {
      roles.extend([HandleRole::ViewMin, HandleRole::ViewMax]);
    }
    if self.has_trailing_window() {
      roles.push(HandleRole::Tail);
    }
    roles
  }

  #[must_use]
  pub fn agent_options(&self, trailing_interval: Option<f64>) -> AgentOptions {
    let range_mode = match self.mode {
      PlaybackMode::Track => None,
      PlaybackMode::Cumulative => Some(RangeMode::Cumulative),
      PlaybackMode::Ranged | PlaybackMode::Decay => Some(RangeMode::Range {
        interval: trailing_interval,
      }),
    };
    AgentOptions {
      wms: range_mode,
      vector: range_mode,
    }
  }
}
