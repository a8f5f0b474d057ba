use std::time::Duration;

use crate::api::Episode;
use crate::audio::{AudioCommand, MediaBackend, MediaEvent, MediaUpdate};
use crate::error::AudioError;

use super::PlayerState;

/// Glue between [`PlayerState`] and a [`MediaBackend`].
///
/// `sync` pushes state changes out to the backend, `handle_event` folds the
/// backend's events back into the state. Progress lives here, not in the
/// state, because it only mirrors the backend's playback position.
#[derive(Debug, Clone)]
pub struct PlayerView {
    loaded: Option<Episode>,
    mirrored_playing: bool,
    mirrored_looping: bool,
    progress: u64,
    track_length: u64,
    last_error: Option<String>,
    skip_interval: u64,
    volume: f32,
    generation: u64,
}

impl PlayerView {
    pub fn new(skip_interval: u64) -> Self {
        Self {
            loaded: None,
            mirrored_playing: false,
            mirrored_looping: false,
            progress: 0,
            track_length: 0,
            last_error: None,
            skip_interval,
            volume: 1.0,
            generation: 0,
        }
    }

    /// Volume the backend was started with.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Seconds elapsed in the loaded track.
    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn track_length(&self) -> u64 {
        self.track_length
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn skip_interval(&self) -> u64 {
        self.skip_interval
    }

    /// Tag of the most recent `Load` or `Stop`. Events from older tracks are dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32, backend: &dyn MediaBackend) -> Result<(), AudioError> {
        self.volume = volume.clamp(0.0, 1.0);
        backend.dispatch(AudioCommand::SetVolume(self.volume))
    }

    /// Brings the backend in line with `state`. Only differences since the
    /// previous call are dispatched.
    pub fn sync(&mut self, state: &PlayerState, backend: &dyn MediaBackend) -> Result<(), AudioError> {
        let changed = match (state.current_episode(), self.loaded.as_ref()) {
            (Some(current), Some(loaded)) => !current.same_track(loaded),
            (None, None) => false,
            _ => true,
        };

        if changed {
            if let Some(current) = state.current_episode().cloned() {
                log::info!("Loading episode: {}", current.title);
                self.progress = 0;
                self.track_length = current.duration;
                self.last_error = None;
                self.mirrored_playing = state.is_playing();
                self.mirrored_looping = state.is_looping();
                self.generation += 1;
                backend.dispatch(AudioCommand::Load {
                    url: current.url.clone(),
                    autoplay: state.is_playing(),
                    looping: state.is_looping(),
                    generation: self.generation,
                })?;
                self.loaded = Some(current);
                return Ok(());
            }

            self.loaded = None;
            self.progress = 0;
            self.track_length = 0;
            self.generation += 1;
            backend.dispatch(AudioCommand::Stop)?;
        }

        if self.loaded.is_none() {
            self.mirrored_playing = state.is_playing();
            self.mirrored_looping = state.is_looping();
            return Ok(());
        }

        if state.is_playing() != self.mirrored_playing {
            self.mirrored_playing = state.is_playing();
            let command = if state.is_playing() {
                AudioCommand::Play
            } else {
                AudioCommand::Pause
            };
            backend.dispatch(command)?;
        }

        if state.is_looping() != self.mirrored_looping {
            self.mirrored_looping = state.is_looping();
            backend.dispatch(AudioCommand::SetLooping(state.is_looping()))?;
        }

        Ok(())
    }

    /// Applies an update from the backend unless it belongs to a track that
    /// has since been replaced. Returns whether it was applied.
    pub fn handle_update(&mut self, state: &mut PlayerState, update: MediaUpdate) -> bool {
        if update.generation != self.generation {
            log::debug!(
                "Dropping {:?} from generation {} (current {})",
                update.event,
                update.generation,
                self.generation
            );
            return false;
        }
        self.handle_event(state, update.event);
        true
    }

    /// Applies one backend event to the state.
    pub fn handle_event(&mut self, state: &mut PlayerState, event: MediaEvent) {
        match event {
            MediaEvent::Started => {
                self.mirrored_playing = true;
                state.set_playing_state(true);
            }
            MediaEvent::Paused => {
                self.mirrored_playing = false;
                state.set_playing_state(false);
            }
            MediaEvent::MetadataLoaded { duration } => {
                self.progress = 0;
                if let Some(duration) = duration {
                    self.track_length = duration.as_secs();
                }
            }
            MediaEvent::TimeUpdate(position) => {
                self.progress = position.as_secs();
            }
            MediaEvent::Ended => {
                if state.has_next() {
                    // Shuffle may pick the same episode again, which still has to reload
                    self.loaded = None;
                    state.play_next();
                } else {
                    state.clear_player_state();
                }
            }
            MediaEvent::Failed(message) => {
                self.mirrored_playing = false;
                state.set_playing_state(false);
                self.last_error = Some(message);
            }
        }
    }

    /// Moves the playhead to `seconds`, clamped to the track length.
    pub fn seek(&mut self, seconds: u64, backend: &dyn MediaBackend) -> Result<(), AudioError> {
        if self.loaded.is_none() {
            return Ok(());
        }
        let target = if self.track_length > 0 {
            seconds.min(self.track_length)
        } else {
            seconds
        };
        backend.dispatch(AudioCommand::Seek(Duration::from_secs(target)))?;
        self.progress = target;
        Ok(())
    }

    pub fn skip_forward(&mut self, backend: &dyn MediaBackend) -> Result<(), AudioError> {
        self.seek(self.progress.saturating_add(self.skip_interval), backend)
    }

    pub fn skip_backward(&mut self, backend: &dyn MediaBackend) -> Result<(), AudioError> {
        self.seek(self.progress.saturating_sub(self.skip_interval), backend)
    }

    /// Jumps to a fraction of the track, e.g. `0.5` for the middle.
    pub fn seek_to_fraction(&mut self, fraction: f64, backend: &dyn MediaBackend) -> Result<(), AudioError> {
        let target = (self.track_length as f64 * fraction.clamp(0.0, 1.0)) as u64;
        self.seek(target, backend)
    }

    /// Progress as a ratio for gauges.
    pub fn progress_ratio(&self) -> f64 {
        if self.track_length == 0 {
            return 0.0;
        }
        (self.progress as f64 / self.track_length as f64).clamp(0.0, 1.0)
    }
}

impl Default for PlayerView {
    fn default() -> Self {
        Self::new(15)
    }
}
