use bytes::Bytes;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::mixer::Mixer;
use rodio::stream::{OutputStream, OutputStreamBuilder};
use rodio::{Decoder, Sink, Source};
use std::{
    io::Cursor,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use super::{AudioCommand, MediaBackend, MediaEvent, MediaUpdate};
use crate::error::AudioError;

const TICK: Duration = Duration::from_millis(250);

/// Handle to the audio task. Cloning shares the same task and output stream.
#[derive(Clone)]
pub struct AudioPlayer {
    command_sender: mpsc::UnboundedSender<AudioCommand>,
    _output_stream: Arc<OutputStream>,
}

impl AudioPlayer {
    /// Opens the named output device (or the default) and spawns the audio
    /// task. Must be called from within a tokio runtime.
    pub fn new_with_device(
        device_name: Option<&str>,
        volume: f32,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MediaUpdate>), AudioError> {
        let output_stream = match device_name {
            Some(name) => Self::create_stream_for_device(name)?,
            None => OutputStreamBuilder::open_default_stream()?,
        };

        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        let task = AudioTask::new(output_stream.mixer().clone(), event_sender, volume);
        tokio::spawn(task.run(command_receiver));

        Ok((
            Self {
                command_sender,
                _output_stream: Arc::new(output_stream),
            },
            event_receiver,
        ))
    }

    fn create_stream_for_device(device_name: &str) -> Result<OutputStream, AudioError> {
        if device_name == "default" {
            return Ok(OutputStreamBuilder::open_default_stream()?);
        }

        let host = rodio::cpal::default_host();
        for device in host.output_devices()? {
            if let Ok(name) = device.name() {
                if name == device_name {
                    log::info!("Using audio device: {}", name);
                    return Ok(OutputStreamBuilder::from_device(device)?.open_stream()?);
                }
            }
        }

        log::warn!("Audio device '{}' not found, falling back to default", device_name);
        Ok(OutputStreamBuilder::open_default_stream()?)
    }
}

impl MediaBackend for AudioPlayer {
    fn dispatch(&self, command: AudioCommand) -> Result<(), AudioError> {
        self.command_sender
            .send(command)
            .map_err(|_| AudioError::BackendGone)
    }
}

struct LoadedTrack {
    url: String,
    bytes: Bytes,
    sink: Sink,
    finished: bool,
}

struct AudioTask {
    mixer: Mixer,
    events: mpsc::UnboundedSender<MediaUpdate>,
    track: Option<LoadedTrack>,
    generation: u64,
    looping: bool,
    volume: f32,
    last_time_update: Instant,
}

impl AudioTask {
    fn new(mixer: Mixer, events: mpsc::UnboundedSender<MediaUpdate>, volume: f32) -> Self {
        Self {
            mixer,
            events,
            track: None,
            generation: 0,
            looping: false,
            volume: volume.clamp(0.0, 1.0),
            last_time_update: Instant::now(),
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<AudioCommand>) {
        loop {
            // Wake up regularly so time updates and end-of-track are noticed
            match tokio::time::timeout(TICK, commands.recv()).await {
                Ok(Some(command)) => self.handle(command).await,
                Ok(None) => break,
                Err(_timeout) => {}
            }
            self.tick();
        }

        if let Some(track) = self.track.take() {
            track.sink.stop();
        }
        log::debug!("Audio task finished");
    }

    async fn handle(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::Load {
                url,
                autoplay,
                looping,
                generation,
            } => {
                self.generation = generation;
                self.looping = looping;
                if let Some(old) = self.track.take() {
                    old.sink.stop();
                }

                match self.load(&url, autoplay).await {
                    Ok(track) => self.track = Some(track),
                    Err(e) => {
                        log::error!("{}", e);
                        self.emit(MediaEvent::Failed(e.to_string()));
                    }
                }
            }

            AudioCommand::Play => {
                let Some(track) = self.track.as_mut() else {
                    return;
                };
                // Playing a finished track starts it over
                if track.finished || track.sink.empty() {
                    if let Err(e) = rearm(track) {
                        log::error!("{}", e);
                        self.emit(MediaEvent::Failed(e.to_string()));
                        return;
                    }
                }
                track.sink.play();
                self.emit(MediaEvent::Started);
            }

            AudioCommand::Pause => {
                if let Some(track) = self.track.as_ref() {
                    track.sink.pause();
                    self.emit(MediaEvent::Paused);
                }
            }

            AudioCommand::Seek(position) => {
                let Some(track) = self.track.as_mut() else {
                    return;
                };
                if track.finished || track.sink.empty() {
                    if let Err(e) = rearm(track) {
                        log::error!("{}", e);
                        return;
                    }
                }
                match track.sink.try_seek(position) {
                    Ok(_) => log::debug!("Seeked to position: {:?}", position),
                    Err(e) => log::warn!("Failed to seek in audio: {:?}", e),
                }
                let position = track.sink.get_pos();
                self.emit(MediaEvent::TimeUpdate(position));
            }

            AudioCommand::SetLooping(looping) => {
                self.looping = looping;
            }

            AudioCommand::SetVolume(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
                if let Some(track) = self.track.as_ref() {
                    track.sink.set_volume(self.volume);
                }
            }

            AudioCommand::Stop => {
                if let Some(track) = self.track.take() {
                    log::debug!("Stopping {}", track.url);
                    track.sink.stop();
                }
            }
        }
    }

    async fn load(&mut self, url: &str, autoplay: bool) -> Result<LoadedTrack, AudioError> {
        log::debug!("Loading audio from URL: {}", url);
        let bytes = fetch_audio(url).await?;
        log::info!("Downloaded {} bytes ({} MB) from {}", bytes.len(), bytes.len() / 1024 / 1024, url);
        self.start_track(url, bytes, autoplay)
    }

    /// Decodes downloaded audio into a fresh sink on the mixer.
    fn start_track(&mut self, url: &str, bytes: Bytes, autoplay: bool) -> Result<LoadedTrack, AudioError> {
        let decoder = decode(url, bytes.clone())?;
        let duration = decoder.total_duration();

        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(self.volume);
        if !autoplay {
            sink.pause();
        }
        sink.append(decoder);

        self.emit(MediaEvent::MetadataLoaded { duration });
        if autoplay {
            self.emit(MediaEvent::Started);
        }
        self.last_time_update = Instant::now();

        Ok(LoadedTrack {
            url: url.to_string(),
            bytes,
            sink,
            finished: false,
        })
    }

    fn tick(&mut self) {
        let Some(track) = self.track.as_mut() else {
            return;
        };
        if track.finished {
            return;
        }

        if track.sink.empty() {
            if self.looping {
                log::debug!("Looping {}", track.url);
                if let Err(e) = rearm(track) {
                    log::error!("{}", e);
                    track.finished = true;
                    self.emit(MediaEvent::Failed(e.to_string()));
                }
            } else {
                log::info!("Finished {}", track.url);
                track.finished = true;
                self.emit(MediaEvent::Ended);
            }
            return;
        }

        if !track.sink.is_paused() && self.last_time_update.elapsed() >= TICK {
            let position = track.sink.get_pos();
            self.last_time_update = Instant::now();
            self.emit(MediaEvent::TimeUpdate(position));
        }
    }

    fn emit(&self, event: MediaEvent) {
        let update = MediaUpdate {
            generation: self.generation,
            event,
        };
        if self.events.send(update).is_err() {
            log::debug!("Media event dropped, nobody is listening");
        }
    }
}

/// Re-queues the cached audio so a finished track can play again.
fn rearm(track: &mut LoadedTrack) -> Result<(), AudioError> {
    let decoder = decode(&track.url, track.bytes.clone())?;
    track.sink.append(decoder);
    track.finished = false;
    Ok(())
}

async fn fetch_audio(url: &str) -> Result<Bytes, AudioError> {
    let fetch_failed = |source| AudioError::FetchFailed {
        url: url.to_string(),
        source,
    };

    let response = reqwest::get(url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(fetch_failed)?;

    response.bytes().await.map_err(fetch_failed)
}

fn decode(url: &str, bytes: Bytes) -> Result<Decoder<Cursor<Bytes>>, AudioError> {
    Decoder::new(Cursor::new(bytes)).map_err(|source| AudioError::DecodeFailed {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::mixer::MixerSource;

    const RATE: u32 = 8000;

    /// 16-bit mono PCM wav of `samples` frames of a quiet square wave.
    fn tone(samples: usize) -> Bytes {
        let data_len = (samples * 2) as u32;
        let mut wav = Vec::with_capacity(44 + data_len as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&RATE.to_le_bytes());
        wav.extend_from_slice(&(RATE * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..samples {
            let sample: i16 = if (i / 20) % 2 == 0 { 1000 } else { -1000 };
            wav.extend_from_slice(&sample.to_le_bytes());
        }
        Bytes::from(wav)
    }

    fn task(looping: bool) -> (AudioTask, MixerSource, mpsc::UnboundedReceiver<MediaUpdate>) {
        let (mixer, output) = rodio::mixer::mixer(1, RATE);
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut task = AudioTask::new(mixer, sender, 1.0);
        task.looping = looping;
        task.generation = 7;
        let track = task.start_track("memory://tone.wav", tone(800), true).unwrap();
        task.track = Some(track);
        (task, output, receiver)
    }

    /// Pulls samples the way an output device would. The sink pads with
    /// silence forever, so this is bounded well past the end of the tone.
    fn play_out(output: &mut MixerSource) {
        output.by_ref().take(RATE as usize * 2).for_each(drop);
    }

    fn events(receiver: &mut mpsc::UnboundedReceiver<MediaUpdate>) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        while let Ok(update) = receiver.try_recv() {
            assert_eq!(update.generation, 7);
            events.push(update.event);
        }
        events
    }

    fn is_ended(event: &MediaEvent) -> bool {
        matches!(event, MediaEvent::Ended)
    }

    #[test]
    fn start_track_reports_metadata_and_start() {
        let (_task, _output, mut receiver) = task(false);

        let events = events(&mut receiver);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], MediaEvent::MetadataLoaded { .. }));
        assert_eq!(events[1], MediaEvent::Started);
    }

    #[test]
    fn finished_track_ends_once() {
        let (mut task, mut output, mut receiver) = task(false);
        events(&mut receiver);

        play_out(&mut output);
        task.tick();
        task.tick();

        assert_eq!(events(&mut receiver), vec![MediaEvent::Ended]);
        assert!(task.track.as_ref().is_some_and(|track| track.finished));
    }

    #[test]
    fn looping_track_restarts_without_ending() {
        let (mut task, mut output, mut receiver) = task(true);
        events(&mut receiver);

        for _ in 0..3 {
            play_out(&mut output);
            task.tick();

            let track = task.track.as_ref().unwrap();
            assert!(!track.finished);
            assert!(!track.sink.empty());
        }
        assert!(!events(&mut receiver).iter().any(is_ended));
    }

    #[tokio::test]
    async fn play_after_the_end_starts_over() {
        let (mut task, mut output, mut receiver) = task(false);
        play_out(&mut output);
        task.tick();
        assert!(events(&mut receiver).iter().any(is_ended));

        task.handle(AudioCommand::Play).await;
        assert_eq!(events(&mut receiver), vec![MediaEvent::Started]);
        let track = task.track.as_ref().unwrap();
        assert!(!track.finished);
        assert!(!track.sink.empty());

        play_out(&mut output);
        task.tick();
        assert_eq!(events(&mut receiver), vec![MediaEvent::Ended]);
    }

    #[tokio::test]
    async fn stop_drops_the_track() {
        let (mut task, _output, _receiver) = task(false);
        task.handle(AudioCommand::Stop).await;
        assert!(task.track.is_none());

        task.tick();
        task.handle(AudioCommand::Play).await;
        assert!(task.track.is_none());
    }
}
