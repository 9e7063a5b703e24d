//! Drives a [`PlaybackController`] from a single task.
//!
//! Timer ticks and user commands are handled one at a time by the same task,
//! so a command always completes before the next tick is looked at.

use super::controller::{PlaybackAction, PlaybackController};
use super::slider::HandleRole;
use chrono::{DateTime, Utc};
use log::{debug, error};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};

/// Input for the playback task.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
  Action(PlaybackAction),
  DragComplete {
    role: HandleRole,
    value: DateTime<Utc>,
  },
  HostReady,
  DynamicPadding(bool),
  Shutdown,
}

/// Runs until [`PlaybackCommand::Shutdown`] arrives or all senders are gone,
/// then hands the controller back.
pub async fn run(
  mut controller: PlaybackController,
  mut commands: UnboundedReceiver<PlaybackCommand>,
) -> PlaybackController {
  let mut deadline: Option<(Instant, std::time::Duration)> = None;

  loop {
    // Stopping drops the schedule, a new frame rate restarts it.
    deadline = match (controller.clock().is_playing(), deadline) {
      (false, _) => None,
      (true, Some((at, period))) if period == controller.clock().tick_period() => Some((at, period)),
      (true, _) => {
        let period = controller.clock().tick_period();
        Some((Instant::now() + period, period))
      }
    };

    tokio::select! {
      biased;
      command = commands.recv() => match command {
        None | Some(PlaybackCommand::Shutdown) => break,
        Some(command) => handle_command(&mut controller, command),
      },
      () = sleep_until(deadline.map_or_else(Instant::now, |(at, _)| at)), if deadline.is_some() => {
        controller.on_tick();
        deadline = deadline.map(|(at, period)| (at + period, period));
      }
    }
  }

  debug!("Playback task finished at {}", controller.clock().current_time());
  controller
}

fn handle_command(controller: &mut PlaybackController, command: PlaybackCommand) {
  match command {
    PlaybackCommand::Action(action) => controller.handle(action),
    PlaybackCommand::DragComplete { role, value } => {
      controller.on_drag_complete(role, value);
    }
    PlaybackCommand::HostReady => {
      if let Err(e) = controller.on_host_ready() {
        error!("Failed to configure slider: {e}");
      }
    }
    PlaybackCommand::DynamicPadding(enabled) => {
      if let Err(e) = controller.set_dynamic_padding(enabled) {
        error!("Failed to reconfigure slider: {e}");
      }
    }
    PlaybackCommand::Shutdown => {}
  }
}
