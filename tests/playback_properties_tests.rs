use assert_approx_eq::assert_approx_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mapplay::config::{ConfiguredRange, PlaybackConfig};
use mapplay::playback::interval_format::smart_interval_format;
use mapplay::playback::sync::DragOutcome;
use mapplay::playback::{
  HandleRole, PlaybackAction, PlaybackController, PlaybackMode, PlaybackState, TimeUnit,
};
use rstest::rstest;

fn start() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2012, 5, 1, 0, 0, 0).unwrap()
}

fn end() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2012, 5, 3, 0, 0, 0).unwrap()
}

fn controller(mode: PlaybackMode, step: i32, looping: bool) -> PlaybackController {
  let config = PlaybackConfig {
    playback_mode: mode,
    range: Some(ConfiguredRange {
      start: start(),
      end: end(),
    }),
    step,
    unit: TimeUnit::Hours,
    looping,
    ..PlaybackConfig::default()
  };
  let mut controller = PlaybackController::new(&config).unwrap();
  controller.on_host_ready().unwrap();
  controller
}

#[rstest]
#[case(5)]
#[case(-7)]
fn ticks_move_towards_the_bound(#[case] step: i32) {
  let mut controller = controller(PlaybackMode::Track, step, false);
  if step < 0 {
    controller.on_drag_complete(HandleRole::Cursor, end());
  }
  controller.handle(PlaybackAction::Play);

  let mut last = controller.clock().current_time();
  while let Some(event) = controller.on_tick() {
    if step > 0 {
      assert!(event.current > last);
    } else {
      assert!(event.current < last);
    }
    assert!(event.current >= start() && event.current <= end());
    last = event.current;
  }
  assert_eq!(controller.state(), PlaybackState::Stopped);
  assert_eq!(last, if step > 0 { end() } else { start() });
}

#[test]
fn loop_wraps_exactly_to_start() {
  let mut controller = controller(PlaybackMode::Track, 1, true);
  controller.play();
  controller.on_drag_complete(HandleRole::Cursor, end());
  let event = controller.on_tick().unwrap();
  assert_eq!(event.current, start());
  assert_eq!(controller.slider().value(HandleRole::Cursor), Some(start()));
  assert_eq!(controller.state(), PlaybackState::Playing);
}

#[test]
fn loop_toggle_takes_effect_while_playing() {
  let mut controller = controller(PlaybackMode::Track, 1, false);
  controller.play();
  controller.handle(PlaybackAction::Loop);
  assert!(controller.clock().is_looping());
  controller.on_drag_complete(HandleRole::Cursor, end());
  assert_eq!(controller.on_tick().unwrap().current, start());
}

#[test]
fn cursor_drag_round_trip() {
  let mut controller = controller(PlaybackMode::Cumulative, 1, false);
  let target = start() + Duration::milliseconds(123_456_789);
  assert_eq!(
    controller.on_drag_complete(HandleRole::Cursor, target),
    DragOutcome::Seek(target)
  );
  assert_eq!(controller.clock().current_time(), target);
}

#[test]
fn tail_drag_converts_to_clock_units() {
  let mut controller = controller(PlaybackMode::Ranged, 1, false);
  let cursor = controller.slider().value(HandleRole::Cursor).unwrap();
  controller.on_drag_complete(HandleRole::Tail, cursor - Duration::milliseconds(7_200_000));
  assert_approx_eq!(controller.clock().trailing_interval().unwrap(), 2.0);
}

#[test]
fn formatter_examples() {
  let seconds = smart_interval_format(5_000);
  assert_eq!(seconds.unit, TimeUnit::Seconds);
  assert_approx_eq!(seconds.magnitude, 5.0);

  let minutes = smart_interval_format(90_000);
  assert_eq!(minutes.unit, TimeUnit::Minutes);
  assert_approx_eq!(minutes.magnitude, 1.5);

  let days = smart_interval_format(90_000_000);
  assert_eq!(days.unit, TimeUnit::Days);
  assert_approx_eq!(days.magnitude, 1.0);
}

#[test]
fn view_min_drag_below_range_is_ignored() {
  let mut controller = controller(PlaybackMode::Track, 1, false);
  let outcome = controller.on_drag_complete(HandleRole::ViewMin, start() - Duration::hours(1));
  assert_eq!(outcome, DragOutcome::Rejected);
  assert_eq!(controller.clock().range().start, start());
}

#[test]
fn jump_to_end_while_stopped() {
  let mut controller = controller(PlaybackMode::Track, 1, false);
  controller.handle(PlaybackAction::End);
  assert_eq!(controller.clock().current_time(), end());
  assert_eq!(controller.state(), PlaybackState::Stopped);
}

#[test]
fn stop_twice_equals_stop_once() {
  let mut controller = controller(PlaybackMode::Decay, 1, false);
  controller.play();
  controller.on_tick();
  controller.stop();
  let once = (
    controller.state(),
    controller.clock().current_time(),
    controller.slider().handles().to_vec(),
  );
  controller.handle(PlaybackAction::Pause);
  let twice = (
    controller.state(),
    controller.clock().current_time(),
    controller.slider().handles().to_vec(),
  );
  assert_eq!(once, twice);
}

#[test]
fn decay_window_width_survives_ticks() {
  let mut config = PlaybackConfig {
    playback_mode: PlaybackMode::Decay,
    range: Some(ConfiguredRange {
      start: start(),
      end: end(),
    }),
    unit: TimeUnit::Hours,
    initial_trailing_interval: Some(4.0),
    ..PlaybackConfig::default()
  };
  config.dynamic_range_padding = false;
  let mut controller = PlaybackController::new(&config).unwrap();
  controller.on_host_ready().unwrap();
  controller.play();
  for _ in 0..10 {
    controller.on_tick();
    let cursor = controller.slider().value(HandleRole::Cursor).unwrap();
    let tail = controller.slider().value(HandleRole::Tail).unwrap();
    assert_eq!(cursor - tail, Duration::hours(4));
  }
  let window = controller.time_window();
  assert_eq!(window.end - window.start, Duration::hours(4));
}

fn windowed(mode: PlaybackMode, trailing: f64, looping: bool) -> PlaybackController {
  let config = PlaybackConfig {
    playback_mode: mode,
    range: Some(ConfiguredRange {
      start: start(),
      end: end(),
    }),
    unit: TimeUnit::Hours,
    initial_trailing_interval: Some(trailing),
    looping,
    ..PlaybackConfig::default()
  };
  let mut controller = PlaybackController::new(&config).unwrap();
  controller.on_host_ready().unwrap();
  controller
}

fn window_width(controller: &PlaybackController) -> Duration {
  let cursor = controller.slider().value(HandleRole::Cursor).unwrap();
  let tail = controller.slider().value(HandleRole::Tail).unwrap();
  cursor - tail
}

#[rstest]
#[case(PlaybackMode::Ranged)]
#[case(PlaybackMode::Decay)]
fn window_width_survives_loop_wrap(#[case] mode: PlaybackMode) {
  let mut controller = windowed(mode, 2.0, true);
  controller.play();
  let mut wrapped = false;
  for _ in 0..60 {
    let event = controller.on_tick().unwrap();
    wrapped |= event.wrapped;
    assert_eq!(window_width(&controller), Duration::hours(2));
  }
  assert!(wrapped);
  assert_eq!(
    controller.tooltip(HandleRole::Tail).as_deref(),
    Some("2 Hours")
  );
  assert_approx_eq!(controller.clock().trailing_interval().unwrap(), 2.0);
}

#[test]
fn window_width_survives_reset() {
  let mut controller = windowed(PlaybackMode::Decay, 2.0, false);
  controller.handle(PlaybackAction::Next);
  controller.handle(PlaybackAction::Next);
  controller.handle(PlaybackAction::Reset);
  assert_eq!(controller.clock().current_time(), start());
  assert_eq!(window_width(&controller), Duration::hours(2));
  controller.handle(PlaybackAction::Next);
  assert_eq!(window_width(&controller), Duration::hours(2));
  assert_eq!(
    controller.tooltip(HandleRole::Tail).as_deref(),
    Some("2 Hours")
  );
}

#[test]
fn window_width_survives_slider_rebuild() {
  let mut controller = windowed(PlaybackMode::Decay, 3.0, false);
  controller.play();
  for _ in 0..5 {
    controller.on_tick();
  }
  let cursor = controller.clock().current_time();

  controller.set_dynamic_padding(false).unwrap();
  assert!(!controller.slider().has(HandleRole::ViewMin));
  assert_eq!(window_width(&controller), Duration::hours(3));

  controller.set_dynamic_padding(true).unwrap();
  controller.on_host_ready().unwrap();
  assert!(controller.slider().has(HandleRole::ViewMax));
  assert_eq!(controller.clock().current_time(), cursor);
  assert_eq!(window_width(&controller), Duration::hours(3));
}

#[test]
fn narrowing_past_the_cursor_moves_the_window() {
  let mut controller = windowed(PlaybackMode::Ranged, 2.0, false);
  let new_start = start() + Duration::hours(10);
  assert_eq!(
    controller.on_drag_complete(HandleRole::ViewMin, new_start),
    DragOutcome::RangeStart(new_start)
  );
  assert_eq!(controller.clock().current_time(), new_start);
  assert_eq!(
    controller.slider().value(HandleRole::Cursor),
    Some(new_start)
  );
  assert_eq!(window_width(&controller), Duration::hours(2));
}
