/// Playback settings and how they are loaded.
pub mod config;
/// Vector feature store bound to the selected layer.
pub mod feature_manager;
/// Time playback engine.
pub mod playback;

pub use config::PlaybackConfig;
pub use playback::{PlaybackController, PlaybackError};
