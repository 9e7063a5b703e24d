use super::clock::{Clock, TickEvent, TimeRange};
use super::mode::{AgentOptions, ModeStrategy, PlaybackMode};
use super::slider::{HandleRole, SliderModel};
use super::sync::{self, DragOutcome};
use super::{PlaybackError, format_time, units};
use crate::config::PlaybackConfig;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Receives the formatted current time whenever the cursor changes.
pub trait TimeDisplay: Send {
  fn update(&mut self, text: &str);
}

/// Creates the display the first time it is needed.
pub type DisplayFactory = Box<dyn FnMut() -> Box<dyn TimeDisplay> + Send>;

/// User facing controls of the playback bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackAction {
  Settings,
  Slider,
  Reset,
  Play,
  Pause,
  FastForward,
  Next,
  End,
  Loop,
}

impl PlaybackAction {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      PlaybackAction::Settings => "settings",
      PlaybackAction::Slider => "slider",
      PlaybackAction::Reset => "reset",
      PlaybackAction::Play => "play",
      PlaybackAction::Pause => "pause",
      PlaybackAction::FastForward => "fastforward",
      PlaybackAction::Next => "next",
      PlaybackAction::End => "end",
      PlaybackAction::Loop => "loop",
    }
  }

  #[must_use]
  pub fn all() -> &'static [PlaybackAction] {
    &[
      PlaybackAction::Settings,
      PlaybackAction::Slider,
      PlaybackAction::Reset,
      PlaybackAction::Play,
      PlaybackAction::Pause,
      PlaybackAction::FastForward,
      PlaybackAction::Next,
      PlaybackAction::End,
      PlaybackAction::Loop,
    ]
  }
}

impl Display for PlaybackAction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for PlaybackAction {
  type Err = String;
  fn from_str(input: &str) -> Result<PlaybackAction, Self::Err> {
    PlaybackAction::all()
      .iter()
      .find(|action| action.name() == input)
      .copied()
      .ok_or_else(|| format!("Unknown playback action: {input}"))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
  Stopped,
  Playing,
}

/// Time span rendering agents should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

/// Owns the clock and the slider and wires user actions to them.
pub struct PlaybackController {
  clock: Clock,
  slider: SliderModel,
  strategy: ModeStrategy,
  actions: Vec<PlaybackAction>,
  time_format: String,
  initial_trailing_interval: Option<f64>,
  ready: bool,
  display: Option<Box<dyn TimeDisplay>>,
  display_factory: Option<DisplayFactory>,
}

impl PlaybackController {
  pub fn new(config: &PlaybackConfig) -> Result<Self, PlaybackError> {
    let range = config.range.ok_or(PlaybackError::MissingRange)?;
    let range = TimeRange::new(range.start, range.end)?;
    let strategy = ModeStrategy::resolve(config.playback_mode, config.dynamic_range_padding);

    let mut clock =
      Clock::new(range, config.step, config.unit, config.frame_rate)?.with_loop(config.looping);
    if strategy.has_trailing_window() {
      clock = clock.with_trailing_interval(config.initial_trailing_interval.unwrap_or(0.0))?;
    }
    if let Some(initial) = config.initial_time {
      clock.set_time(initial);
    }

    let slider = SliderModel::new(&clock, &strategy)?;
    debug!(
      "Playback controller for {} over {} - {}",
      strategy.mode(),
      range.start,
      range.end
    );

    Ok(Self {
      clock,
      slider,
      strategy,
      actions: config.actions(),
      time_format: config.time_format.clone(),
      initial_trailing_interval: config.initial_trailing_interval,
      ready: false,
      display: None,
      display_factory: None,
    })
  }

  #[must_use]
  pub fn with_display(mut self, factory: DisplayFactory) -> Self {
    self.display_factory = Some(factory);
    self
  }

  #[must_use]
  pub fn clock(&self) -> &Clock {
    &self.clock
  }

  #[must_use]
  pub fn slider(&self) -> &SliderModel {
    &self.slider
  }

  #[must_use]
  pub fn mode(&self) -> PlaybackMode {
    self.strategy.mode()
  }

  #[must_use]
  pub fn actions(&self) -> &[PlaybackAction] {
    &self.actions
  }

  #[must_use]
  pub fn state(&self) -> PlaybackState {
    if self.clock.is_playing() {
      PlaybackState::Playing
    } else {
      PlaybackState::Stopped
    }
  }

  /// Whether the control for `action` is present and can be used right now.
  #[must_use]
  pub fn is_enabled(&self, action: PlaybackAction) -> bool {
    self.actions.contains(&action)
      && (action != PlaybackAction::FastForward || self.clock.is_playing())
  }

  /// The host finished loading. The first call also moves the cursor ahead
  /// of the trailing window in ranged and decay modes and builds a fresh
  /// slider, later calls only reconfigure it.
  pub fn on_host_ready(&mut self) -> Result<(), PlaybackError> {
    if self.ready {
      return self.slider.configure(&self.clock, &self.strategy);
    }
    if self.strategy.has_trailing_window() {
      let steps = self
        .initial_trailing_interval
        .map_or(0.0, f64::round)
        .clamp(f64::from(i32::MIN), f64::from(i32::MAX));
      #[allow(clippy::cast_possible_truncation)]
      let steps = steps as i32;
      self.clock.increment_steps(steps);
    }
    self.slider = SliderModel::new(&self.clock, &self.strategy)?;
    self.ready = true;
    Ok(())
  }

  /// Switches the padding handles on or off and rebuilds the slider.
  pub fn set_dynamic_padding(&mut self, enabled: bool) -> Result<(), PlaybackError> {
    self.strategy = ModeStrategy::resolve(self.strategy.mode(), enabled);
    self.slider.configure(&self.clock, &self.strategy)
  }

  pub fn handle(&mut self, action: PlaybackAction) {
    match action {
      PlaybackAction::Play => self.toggle_play(),
      PlaybackAction::Pause => self.stop(),
      PlaybackAction::Reset => self.reset(),
      PlaybackAction::Next => self.next(),
      PlaybackAction::End => self.jump_to_end(),
      PlaybackAction::Loop => {
        self.toggle_loop();
      }
      PlaybackAction::FastForward => {
        self.toggle_double_speed();
      }
      PlaybackAction::Settings | PlaybackAction::Slider => {
        debug!("Action {action} has no effect on the clock");
      }
    }
  }

  pub fn play(&mut self) {
    if self.clock.play() {
      debug!("Playback started at {}", self.clock.current_time());
      self.open_display();
    }
  }

  pub fn stop(&mut self) {
    if self.clock.stop() {
      debug!("Playback stopped at {}", self.clock.current_time());
    }
  }

  pub fn toggle_play(&mut self) {
    match self.state() {
      PlaybackState::Stopped => self.play(),
      PlaybackState::Playing => self.stop(),
    }
  }

  pub fn reset(&mut self) {
    let previous = self.clock.current_time();
    self.clock.reset();
    self.publish_seek(previous);
  }

  pub fn jump_to_end(&mut self) {
    let previous = self.clock.current_time();
    self.clock.jump_to_end();
    self.publish_seek(previous);
  }

  /// Advances a single frame regardless of the playback state.
  pub fn next(&mut self) {
    let event = self.clock.tick();
    self.publish(&event);
  }

  /// Returns the new loop flag.
  pub fn toggle_loop(&mut self) -> bool {
    self.clock.toggle_loop()
  }

  /// Only available while playing. Returns whether double speed is active.
  pub fn toggle_double_speed(&mut self) -> bool {
    if !self.clock.is_playing() {
      debug!("Ignoring double speed toggle while stopped");
      return self.clock.is_double_speed();
    }
    let doubled = self.clock.toggle_double_speed();
    info!("Playback frame rate now {}", self.clock.frame_rate());
    doubled
  }

  /// Timer callback. Does nothing once playback has stopped.
  pub fn on_tick(&mut self) -> Option<TickEvent> {
    if !self.clock.is_playing() {
      return None;
    }
    let event = self.clock.tick();
    self.publish(&event);
    Some(event)
  }

  /// A drag on the slider finished with the handle at `value`.
  pub fn on_drag_complete(&mut self, role: HandleRole, value: DateTime<Utc>) -> DragOutcome {
    let previous = self.clock.current_time();
    let outcome = sync::apply_drag(role, value, &mut self.clock, &mut self.slider);
    match outcome {
      DragOutcome::Seek(time) => {
        self.open_display();
        self.show(time);
      }
      DragOutcome::RangeStart(_) | DragOutcome::RangeEnd(_)
        if self.clock.current_time() != previous =>
      {
        self.show(self.clock.current_time());
      }
      _ => {}
    }
    outcome
  }

  #[must_use]
  pub fn tooltip(&self, role: HandleRole) -> Option<String> {
    self.slider.tooltip(role, &self.time_format)
  }

  #[must_use]
  pub fn current_time_text(&self) -> String {
    format_time(self.clock.current_time(), &self.time_format)
  }

  #[must_use]
  pub fn agent_options(&self) -> AgentOptions {
    self.strategy.agent_options(self.clock.trailing_interval())
  }

  /// The window agents draw for the current instant.
  #[must_use]
  pub fn time_window(&self) -> TimeWindow {
    let now = self.clock.current_time();
    let range = self.clock.range();
    let start = match self.strategy.mode() {
      PlaybackMode::Track => now,
      PlaybackMode::Cumulative => range.start,
      PlaybackMode::Ranged | PlaybackMode::Decay => self
        .clock
        .trailing_interval()
        .and_then(|interval| units::unit_to_millis(interval, self.clock.unit()))
        .and_then(|millis| now.checked_sub_signed(Duration::milliseconds(millis)))
        .map_or(now, |start| start.clamp(range.start, now)),
    };
    TimeWindow { start, end: now }
  }

  fn publish_seek(&mut self, previous: DateTime<Utc>) {
    let event = TickEvent {
      previous,
      current: self.clock.current_time(),
      wrapped: false,
      stopped: false,
    };
    self.publish(&event);
  }

  fn publish(&mut self, event: &TickEvent) {
    let shown = sync::apply_tick(event, &mut self.slider);
    self.show(shown);
  }

  fn open_display(&mut self) {
    if self.display.is_none()
      && let Some(factory) = self.display_factory.as_mut()
    {
      self.display = Some(factory());
    }
  }

  fn show(&mut self, time: DateTime<Utc>) {
    if let Some(display) = self.display.as_mut() {
      display.update(&format_time(time, &self.time_format));
    }
  }
}
