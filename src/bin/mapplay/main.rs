use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Parser as CliParser;
use log::info;
use mapplay::config::{ConfiguredRange, PlaybackConfig};
use mapplay::playback::{
  PlaybackAction, PlaybackCommand, PlaybackController, PlaybackMode, TimeDisplay, TimeUnit, runner,
};
use tokio::sync::mpsc;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Config file to start from. Defaults to ~/.config/mapplay/playback.json.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Playback mode. Values: track, cumulative, ranged, decay.
  #[arg(short, long)]
  mode: Option<PlaybackMode>,

  /// Start of the range (RFC 3339).
  #[arg(long)]
  start: Option<DateTime<Utc>>,

  /// End of the range (RFC 3339).
  #[arg(long)]
  end: Option<DateTime<Utc>>,

  /// Units to advance per tick, negative plays backwards.
  #[arg(long, allow_hyphen_values = true)]
  step: Option<i32>,

  /// Values: seconds, minutes, hours, days, months, years.
  #[arg(short, long)]
  unit: Option<TimeUnit>,

  /// Ticks per second.
  #[arg(short, long)]
  frame_rate: Option<f64>,

  /// Restart at the other end instead of stopping.
  #[arg(short, long = "loop")]
  looping: bool,

  /// Disable the view bound handles.
  #[arg(long)]
  no_padding: bool,

  /// Width of the trailing window for ranged and decay, in units.
  #[arg(short, long)]
  trailing: Option<f64>,

  /// How long to play, in seconds of wall time.
  #[arg(short, long, default_value_t = 10.0)]
  duration_secs: f64,
}

impl Args {
  fn into_config(self) -> Result<PlaybackConfig> {
    let mut config = match &self.config {
      Some(path) => PlaybackConfig::from_path(path)?,
      None => PlaybackConfig::load(),
    };
    if let Some(mode) = self.mode {
      config.playback_mode = mode;
    }
    if let (Some(start), Some(end)) = (self.start, self.end) {
      config.range = Some(ConfiguredRange { start, end });
    }
    if let Some(step) = self.step {
      config.step = step;
    }
    if let Some(unit) = self.unit {
      config.unit = unit;
    }
    if let Some(frame_rate) = self.frame_rate {
      config.frame_rate = frame_rate;
    }
    if let Some(trailing) = self.trailing {
      config.initial_trailing_interval = Some(trailing);
    }
    config.looping |= self.looping;
    config.dynamic_range_padding &= !self.no_padding;
    Ok(config)
  }
}

/// Prints every time the cursor moves.
struct LogDisplay;

impl TimeDisplay for LogDisplay {
  fn update(&mut self, text: &str) {
    println!("{text}");
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();
  let duration = Duration::try_from_secs_f64(args.duration_secs).context("invalid duration")?;
  let config = args.into_config()?;

  let controller = PlaybackController::new(&config)
    .context("invalid playback setup")?
    .with_display(Box::new(|| Box::new(LogDisplay) as Box<dyn TimeDisplay>));

  let (sender, receiver) = mpsc::unbounded_channel();
  let task = tokio::spawn(runner::run(controller, receiver));

  sender.send(PlaybackCommand::HostReady)?;
  sender.send(PlaybackCommand::Action(PlaybackAction::Play))?;
  tokio::time::sleep(duration).await;
  sender.send(PlaybackCommand::Shutdown)?;

  let controller = task.await?;
  let window = controller.time_window();
  info!(
    "Stopped in {:?} at {}, window {} - {}",
    controller.state(),
    controller.current_time_text(),
    window.start,
    window.end
  );
  Ok(())
}
