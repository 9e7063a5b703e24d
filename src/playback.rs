use chrono::{DateTime, Utc};
use log::warn;
use std::fmt::Write as _;
use thiserror::Error;

/// Logical time, range and playback parameters.
pub mod clock;
/// Wires user actions and host signals to the clock and the slider.
pub mod controller;
/// Human scaled labels for durations.
pub mod interval_format;
/// Mode dependent configuration.
pub mod mode;
/// Async driver for the controller.
pub mod runner;
/// Role tagged slider handles.
pub mod slider;
/// Clock to slider and slider to clock updates.
pub mod sync;
/// Calendar aware unit arithmetic.
pub mod units;

pub use clock::{Clock, TickEvent, TimeRange};
pub use controller::{
  DisplayFactory, PlaybackAction, PlaybackController, PlaybackState, TimeDisplay, TimeWindow,
};
pub use mode::{AgentOptions, ModeStrategy, PlaybackMode, RangeMode};
pub use runner::PlaybackCommand;
pub use slider::{HandleRole, SliderHandle, SliderModel};
pub use units::TimeUnit;

/// Problems in a playback setup. Raised while configuring, never while playing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
  #[error("No time range configured.")]
  MissingRange,
  #[error("Time range {start} - {end} is empty or inverted.")]
  DegenerateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  },
  #[error("Step must not be zero.")]
  ZeroStep,
  #[error("Frame rate {0} is not a positive number.")]
  InvalidFrameRate(f64),
  #[error("Trailing interval {0} is not finite.")]
  NonFiniteInterval(f64),
  #[error("A step of {step} {unit} from {from} is not representable.")]
  StepOverflow {
    from: DateTime<Utc>,
    step: i32,
    unit: TimeUnit,
  },
  #[error("Padded slider bounds are not representable.")]
  PaddingOverflow,
}

/// Formats `time` with a strftime pattern, falling back to RFC 3339 if the
/// pattern is invalid.
#[must_use]
pub fn format_time(time: DateTime<Utc>, format: &str) -> String {
  let mut text = String::new();
  if write!(text, "{}", time.format(format)).is_err() {
    warn!("Invalid time format {format:?}");
    return time.to_rfc3339();
  }
  text
}
