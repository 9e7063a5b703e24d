use super::clock::Clock;
use super::interval_format::smart_interval_format;
use super::mode::ModeStrategy;
use super::{PlaybackError, format_time, units};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What a slider handle stands for. Handles are always looked up by role,
/// their position in the list changes with the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleRole {
  /// The clock's current time.
  Cursor,
  /// Lower view bound, only with dynamic padding.
  ViewMin,
  /// Upper view bound, only with dynamic padding.
  ViewMax,
  /// Trailing edge of the visible window in ranged and decay modes.
  Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderHandle {
  pub role: HandleRole,
  pub value: DateTime<Utc>,
}

/// Handles of the time slider together with its bounds and snapping increment.
#[derive(Debug, Clone)]
pub struct SliderModel {
  handles: Vec<SliderHandle>,
  min_bound: DateTime<Utc>,
  max_bound: DateTime<Utc>,
  /// One clock step at the range start, in ms.
  increment_millis: i64,
}

impl SliderModel {
  pub fn new(clock: &Clock, strategy: &ModeStrategy) -> Result<Self, PlaybackError> {
    let range = clock.range();
    let mut slider = Self {
      handles: Vec::new(),
      min_bound: range.start,
      max_bound: range.end,
      increment_millis: 0,
    };
    slider.configure(clock, strategy)?;
    Ok(slider)
  }

  /// Rebuilds the handle set from the clock and the resolved mode.
  pub fn configure(&mut self, clock: &Clock, strategy: &ModeStrategy) -> Result<(), PlaybackError> {
    let range = clock.range();
    let increment = units::step_millis(range.start, clock.step(), clock.unit())
      .map(i64::abs)
      .filter(|millis| *millis > 0)
      .ok_or(PlaybackError::StepOverflow {
        from: range.start,
        step: clock.step(),
        unit: clock.unit(),
      })?;

    let pad = Duration::milliseconds(range.duration_millis() / 10);
    // A rebuilt tail keeps the width it had, a new one starts at the range start.
    let tail = self
      .value(HandleRole::Cursor)
      .zip(self.value(HandleRole::Tail))
      .and_then(|(cursor, tail)| {
        clock
          .current_time()
          .checked_sub_signed(cursor.signed_duration_since(tail))
      })
      .unwrap_or(range.start);
    let mut handles = vec![SliderHandle {
      role: HandleRole::Cursor,
      value: clock.current_time(),
    }];
    let (mut min_bound, mut max_bound) = (range.start, range.end);

    for role in strategy.optional_roles() {
      let value = match role {
        HandleRole::ViewMin => {
          min_bound = range
            .start
            .checked_sub_signed(pad)
            .ok_or(PlaybackError::PaddingOverflow)?;
          min_bound
        }
        HandleRole::ViewMax => {
          max_bound = range
            .end
            .checked_add_signed(pad)
            .ok_or(PlaybackError::PaddingOverflow)?;
          max_bound
        }
        HandleRole::Tail => tail,
        HandleRole::Cursor => range.start,
      };
      handles.push(SliderHandle { role, value });
    }

    self.handles = handles;
    self.min_bound = min_bound;
    self.max_bound = max_bound;
    self.increment_millis = increment;
    Ok(())
  }

  #[must_use]
  pub fn handles(&self) -> &[SliderHandle] {
    &self.handles
  }

  #[must_use]
  pub fn has(&self, role: HandleRole) -> bool {
    self.handles.iter().any(|h| h.role == role)
  }

  #[must_use]
  pub fn value(&self, role: HandleRole) -> Option<DateTime<Utc>> {
    self.handles.iter().find(|h| h.role == role).map(|h| h.value)
  }

  #[must_use]
  pub fn min_bound(&self) -> DateTime<Utc> {
    self.min_bound
  }

  #[must_use]
  pub fn max_bound(&self) -> DateTime<Utc> {
    self.max_bound
  }

  #[must_use]
  pub fn increment_millis(&self) -> i64 {
    self.increment_millis
  }

  /// Places the handle with `role`, kept within the slider bounds. The tail
  /// is unconstrained so the window keeps its width near the range start.
  /// Returns false if there is no such handle.
  pub fn set_value(&mut self, role: HandleRole, value: DateTime<Utc>) -> bool {
    let (min, max) = (self.min_bound, self.max_bound);
    match self.handles.iter_mut().find(|h| h.role == role) {
      Some(handle) => {
        handle.value = if role == HandleRole::Tail {
          value
        } else {
          value.clamp(min, max)
        };
        true
      }
      None => false,
    }
  }

  /// Moves the handle with `role` by `delta_millis`.
  pub fn shift(&mut self, role: HandleRole, delta_millis: i64) -> bool {
    let Some(value) = self
      .value(role)
      .and_then(|v| v.checked_add_signed(Duration::milliseconds(delta_millis)))
    else {
      return false;
    };
    self.set_value(role, value)
  }

  /// Tooltip text for a handle. The tail shows the window width instead of an instant.
  #[must_use]
  pub fn tooltip(&self, role: HandleRole, time_format: &str) -> Option<String> {
    let value = self.value(role)?;
    if role == HandleRole::Tail {
      let cursor = self.value(HandleRole::Cursor)?;
      let width = cursor.signed_duration_since(value).num_milliseconds();
      Some(smart_interval_format(width).to_string())
    } else {
      Some(format_time(value, time_format))
    }
  }
}
