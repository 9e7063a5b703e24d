use super::PlaybackError;
use super::units::{self, TimeUnit};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Closed interval of instants the clock may move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl TimeRange {
  /// A range must span some time, otherwise nothing can be played.
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PlaybackError> {
    if start >= end {
      return Err(PlaybackError::DegenerateRange { start, end });
    }
    Ok(Self { start, end })
  }

  #[must_use]
  pub fn contains(&self, time: DateTime<Utc>) -> bool {
    self.start <= time && time <= self.end
  }

  #[must_use]
  pub fn clamp(&self, time: DateTime<Utc>) -> DateTime<Utc> {
    time.clamp(self.start, self.end)
  }

  #[must_use]
  pub fn duration_millis(&self) -> i64 {
    self.end.signed_duration_since(self.start).num_milliseconds()
  }
}

/// Emitted for every clock advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
  pub previous: DateTime<Utc>,
  pub current: DateTime<Utc>,
  /// The advance ran past a bound and restarted at the opposite one.
  pub wrapped: bool,
  /// The advance hit a bound without looping and playback stopped.
  pub stopped: bool,
}

impl TickEvent {
  #[must_use]
  pub fn delta_millis(&self) -> i64 {
    self.current.signed_duration_since(self.previous).num_milliseconds()
  }
}

fn period_of(frame_rate: f64) -> Option<std::time::Duration> {
  std::time::Duration::try_from_secs_f64(1.0 / frame_rate)
    .ok()
    .filter(|period| !period.is_zero())
}

/// Logical playback time and the parameters that move it.
#[derive(Debug, Clone)]
pub struct Clock {
  current_time: DateTime<Utc>,
  range: TimeRange,
  /// The range as first configured. Narrowing never leaves it.
  initial_range: TimeRange,
  step: i32,
  unit: TimeUnit,
  base_frame_rate: f64,
  frame_rate: f64,
  looping: bool,
  playing: bool,
  /// Width of the trailing window in `unit`s, only for windowed modes.
  trailing_interval: Option<f64>,
}

impl Clock {
  pub fn new(
    range: TimeRange,
    step: i32,
    unit: TimeUnit,
    frame_rate: f64,
  ) -> Result<Self, PlaybackError> {
    if step == 0 {
      return Err(PlaybackError::ZeroStep);
    }
    // Both the normal and the doubled rate need a non-zero, representable period.
    if !frame_rate.is_finite()
      || frame_rate <= 0.0
      || period_of(frame_rate).is_none()
      || period_of(frame_rate * 2.0).is_none()
    {
      return Err(PlaybackError::InvalidFrameRate(frame_rate));
    }
    if units::step_millis(range.start, step, unit).is_none() {
      return Err(PlaybackError::StepOverflow {
        from: range.start,
        step,
        unit,
      });
    }
    Ok(Self {
      current_time: range.start,
      range,
      initial_range: range,
      step,
      unit,
      base_frame_rate: frame_rate,
      frame_rate,
      looping: false,
      playing: false,
      trailing_interval: None,
    })
  }

  #[must_use]
  pub fn with_loop(mut self, looping: bool) -> Self {
    self.looping = looping;
    self
  }

  pub fn with_trailing_interval(mut self, interval: f64) -> Result<Self, PlaybackError> {
    if !interval.is_finite() {
      return Err(PlaybackError::NonFiniteInterval(interval));
    }
    self.trailing_interval = Some(interval);
    Ok(self)
  }

  #[must_use]
  pub fn current_time(&self) -> DateTime<Utc> {
    self.current_time
  }

  #[must_use]
  pub fn range(&self) -> TimeRange {
    self.range
  }

  #[must_use]
  pub fn initial_range(&self) -> TimeRange {
    self.initial_range
  }

  #[must_use]
  pub fn step(&self) -> i32 {
    self.step
  }

  #[must_use]
  pub fn unit(&self) -> TimeUnit {
    self.unit
  }

  #[must_use]
  pub fn frame_rate(&self) -> f64 {
    self.frame_rate
  }

  #[must_use]
  pub fn is_double_speed(&self) -> bool {
    self.frame_rate > self.base_frame_rate
  }

  #[must_use]
  pub fn is_looping(&self) -> bool {
    self.looping
  }

  #[must_use]
  pub fn is_playing(&self) -> bool {
    self.playing
  }

  #[must_use]
  pub fn trailing_interval(&self) -> Option<f64> {
    self.trailing_interval
  }

  /// Time between two ticks.
  #[must_use]
  pub fn tick_period(&self) -> std::time::Duration {
    period_of(self.frame_rate).unwrap_or(std::time::Duration::MAX)
  }

  /// Returns whether playback was started by this call.
  pub fn play(&mut self) -> bool {
    let started = !self.playing;
    self.playing = true;
    started
  }

  /// Returns whether playback was stopped by this call.
  pub fn stop(&mut self) -> bool {
    let stopped = self.playing;
    self.playing = false;
    stopped
  }

  pub fn reset(&mut self) {
    self.current_time = self.range.start;
  }

  /// Seeks to the bound the clock is moving towards.
  pub fn jump_to_end(&mut self) {
    self.current_time = if self.step < 0 {
      self.range.start
    } else {
      self.range.end
    };
  }

  /// Advances by one step, wrapping or stopping at the bounds.
  pub fn tick(&mut self) -> TickEvent {
    let previous = self.current_time;
    let forward = self.step > 0;
    let bound = if forward {
      self.range.end
    } else {
      self.range.start
    };

    let next = units::advance(previous, self.step, self.unit);
    let overshoots = next.is_none_or(|next| if forward { next > bound } else { next < bound });

    let mut wrapped = false;
    let mut stopped = false;
    if overshoots && self.looping {
      self.current_time = if forward {
        self.range.start
      } else {
        self.range.end
      };
      wrapped = true;
      debug!("Clock wrapped to {}", self.current_time);
    } else if let Some(next) = next.filter(|_| !overshoots) {
      self.current_time = next;
      if next == bound && !self.looping {
        stopped = self.stop();
      }
    } else {
      self.current_time = bound;
      stopped = self.stop();
    }
    if stopped {
      debug!("Clock reached {bound} and stopped");
    }

    TickEvent {
      previous,
      current: self.current_time,
      wrapped,
      stopped,
    }
  }

  /// Moves `count` steps without wrapping, stopping at the bound.
  pub fn increment_steps(&mut self, count: i32) {
    let Some(step) = self.step.checked_mul(count) else {
      return;
    };
    let next = units::advance(self.current_time, step, self.unit).unwrap_or(if step < 0 {
      self.range.start
    } else {
      self.range.end
    });
    self.current_time = self.range.clamp(next);
  }

  /// Seeks to `time`, kept inside the current range.
  pub fn set_time(&mut self, time: DateTime<Utc>) {
    self.current_time = self.range.clamp(time);
  }

  /// Narrows or widens the start. Returns false if `time` left the initial range.
  pub fn set_start(&mut self, time: DateTime<Utc>) -> bool {
    if !self.initial_range.contains(time) || time >= self.range.end {
      return false;
    }
    self.range.start = time;
    self.current_time = self.range.clamp(self.current_time);
    true
  }

  /// Narrows or widens the end. Returns false if `time` left the initial range.
  pub fn set_end(&mut self, time: DateTime<Utc>) -> bool {
    if !self.initial_range.contains(time) || time <= self.range.start {
      return false;
    }
    self.range.end = time;
    self.current_time = self.range.clamp(self.current_time);
    true
  }

  pub fn set_trailing_interval(&mut self, interval: f64) {
    if interval.is_finite() {
      self.trailing_interval = Some(interval);
    } else {
      warn!("Ignoring non-finite trailing interval {interval}");
    }
  }

  pub fn toggle_loop(&mut self) -> bool {
    self.looping = !self.looping;
    self.looping
  }

  /// Switches between the configured frame rate and twice that rate.
  pub fn toggle_double_speed(&mut self) -> bool {
    self.frame_rate = if self.is_double_speed() {
      self.base_frame_rate
    } else {
      self.base_frame_rate * 2.0
    };
    self.is_double_speed()
  }
}
