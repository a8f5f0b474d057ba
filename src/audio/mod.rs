pub mod player;

use std::time::Duration;

use crate::error::AudioError;

pub use player::AudioPlayer;

/// Instructions sent to the playback backend.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// `generation` tags every event the backend emits for this track.
    Load {
        url: String,
        autoplay: bool,
        looping: bool,
        generation: u64,
    },
    Play,
    Pause,
    Seek(Duration),
    SetLooping(bool),
    SetVolume(f32),
    Stop,
}

/// Signals emitted by the playback backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Started,
    Paused,
    MetadataLoaded { duration: Option<Duration> },
    TimeUpdate(Duration),
    Ended,
    Failed(String),
}

/// A [`MediaEvent`] tagged with the generation of the `Load` it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpdate {
    pub generation: u64,
    pub event: MediaEvent,
}

/// Anything that can play a track on our behalf.
pub trait MediaBackend {
    fn dispatch(&self, command: AudioCommand) -> Result<(), AudioError>;
}
