//! The two one-way paths between the clock and the slider.
//!
//! Ticks only write to the slider, completed drags only write to the clock.
//! Neither path calls the other, so an update can never bounce back.

use super::clock::{Clock, TickEvent};
use super::slider::{HandleRole, SliderModel};
use super::units;
use chrono::{DateTime, Utc};
use log::debug;

/// What a completed drag changed on the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
  /// The clock now shows this instant.
  Seek(DateTime<Utc>),
  RangeStart(DateTime<Utc>),
  RangeEnd(DateTime<Utc>),
  /// New trailing interval in clock units.
  TrailingInterval(f64),
  /// The drag left the configured range and was dropped.
  Rejected,
  /// No handle with that role exists in the current configuration.
  Unknown,
}

/// Clock to slider. Moves the cursor, and the tail if present, by the offset
/// between the clock and the cursor so the window width is preserved.
/// Returns the instant to show.
pub fn apply_tick(event: &TickEvent, slider: &mut SliderModel) -> DateTime<Utc> {
  let offset = slider.value(HandleRole::Cursor).map_or_else(
    || event.delta_millis(),
    |cursor| event.current.signed_duration_since(cursor).num_milliseconds(),
  );
  shift_window(slider, offset);
  event.current
}

fn shift_window(slider: &mut SliderModel, offset: i64) {
  slider.shift(HandleRole::Cursor, offset);
  if slider.has(HandleRole::Tail) {
    slider.shift(HandleRole::Tail, offset);
  }
}

/// Slider to clock, dispatched on the role of the dragged handle.
pub fn apply_drag(
  role: HandleRole,
  value: DateTime<Utc>,
  clock: &mut Clock,
  slider: &mut SliderModel,
) -> DragOutcome {
  if !slider.has(role) {
    return DragOutcome::Unknown;
  }

  let outcome = match role {
    HandleRole::Cursor => {
      clock.set_time(value);
      DragOutcome::Seek(clock.current_time())
    }
    HandleRole::ViewMin => {
      if value >= clock.initial_range().start && clock.set_start(value) {
        DragOutcome::RangeStart(value)
      } else {
        DragOutcome::Rejected
      }
    }
    HandleRole::ViewMax => {
      if value <= clock.initial_range().end && clock.set_end(value) {
        DragOutcome::RangeEnd(value)
      } else {
        DragOutcome::Rejected
      }
    }
    HandleRole::Tail => {
      slider.set_value(role, value);
      match slider.value(HandleRole::Cursor).zip(slider.value(role)) {
        Some((cursor, tail)) => {
          let delta = cursor.signed_duration_since(tail).num_milliseconds();
          let interval = units::millis_to_unit(delta, clock.unit());
          clock.set_trailing_interval(interval);
          DragOutcome::TrailingInterval(interval)
        }
        None => DragOutcome::Unknown,
      }
    }
  };

  match outcome {
    DragOutcome::Rejected => debug!("Ignoring drag of {role:?} to {value} outside the range"),
    DragOutcome::Seek(time) => {
      slider.set_value(role, time);
    }
    DragOutcome::RangeStart(_) | DragOutcome::RangeEnd(_) => {
      slider.set_value(role, value);
      // Narrowing may have pulled the clock inside the new bounds.
      if let Some(cursor) = slider.value(HandleRole::Cursor) {
        let offset = clock
          .current_time()
          .signed_duration_since(cursor)
          .num_milliseconds();
        shift_window(slider, offset);
      }
    }
    DragOutcome::TrailingInterval(_) | DragOutcome::Unknown => {}
  }
  outcome
}
