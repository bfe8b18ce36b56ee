//! Audio backend implementation using rodio.
//!
//! `AudioOutput` owns the rodio output stream and must stay alive while
//! music plays. The `RodioBackend` it hands out only holds the stream
//! handle, so it can be moved into tokio tasks.

use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::debug;

use super::embedded::embedded_track_wav;
use super::error::SoundError;
use super::source::TrackAsset;
use super::{AudioBackend, PlayerHandle};

/// The default audio output device.
pub struct AudioOutput {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
}

impl AudioOutput {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn try_default() -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }

    /// Returns a backend that plays on this output.
    #[must_use]
    pub fn backend(&self) -> RodioBackend {
        RodioBackend {
            stream_handle: self.stream_handle.clone(),
        }
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput").finish_non_exhaustive()
    }
}

/// Loads tracks into rodio sinks.
#[derive(Clone)]
pub struct RodioBackend {
    stream_handle: OutputStreamHandle,
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend").finish_non_exhaustive()
    }
}

impl AudioBackend for RodioBackend {
    type Handle = RodioPlayer;

    fn load(
        &self,
        asset: &TrackAsset,
    ) -> impl std::future::Future<Output = Result<RodioPlayer, SoundError>> + Send {
        let stream_handle = self.stream_handle.clone();
        let asset = asset.clone();

        async move {
            // File reads and header probing stay off the runtime threads.
            let data = tokio::task::spawn_blocking(move || read_asset(&asset))
                .await
                .map_err(|e| SoundError::LoadFailed(e.to_string()))??;

            RodioPlayer::new(&stream_handle, data)
        }
    }
}

/// Reads an asset and checks that rodio can decode it.
fn read_asset(asset: &TrackAsset) -> Result<Arc<[u8]>, SoundError> {
    let bytes = match asset {
        TrackAsset::File { path, .. } => std::fs::read(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?,
        TrackAsset::Embedded { name } => embedded_track_wav(name)
            .ok_or_else(|| SoundError::FileNotFound(format!("embedded loop '{}'", name)))?,
    };
    let data: Arc<[u8]> = bytes.into();

    Decoder::new(Cursor::new(Arc::clone(&data)))
        .map_err(|e| SoundError::DecodeError(format!("{}: {}", asset.name(), e)))?;

    debug!("Loaded {} ({} bytes)", asset.name(), data.len());
    Ok(data)
}

/// One loaded track, backed by its own paused sink.
pub struct RodioPlayer {
    sink: Sink,
    data: Arc<[u8]>,
    looping: bool,
}

impl RodioPlayer {
    fn new(stream_handle: &OutputStreamHandle, data: Arc<[u8]>) -> Result<Self, SoundError> {
        let sink =
            Sink::try_new(stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.pause();

        Ok(Self {
            sink,
            data,
            looping: false,
        })
    }

    /// Queues a fresh decoder when the sink has run dry.
    fn ensure_queued(&self) -> Result<(), SoundError> {
        if !self.sink.empty() {
            return Ok(());
        }

        let cursor = Cursor::new(Arc::clone(&self.data));
        if self.looping {
            let decoder = Decoder::new_looped(cursor)
                .map_err(|e| SoundError::PlaybackError(e.to_string()))?;
            self.sink.append(decoder);
        } else {
            let decoder =
                Decoder::new(cursor).map_err(|e| SoundError::PlaybackError(e.to_string()))?;
            self.sink.append(decoder);
        }
        Ok(())
    }
}

impl PlayerHandle for RodioPlayer {
    fn play(&mut self) -> Result<(), SoundError> {
        self.ensure_queued()?;
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SoundError> {
        self.sink.pause();
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn release(self) -> Result<(), SoundError> {
        self.sink.stop();
        Ok(())
    }
}

impl std::fmt::Debug for RodioPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioPlayer")
            .field("looping", &self.looping)
            .field("paused", &self.sink.is_paused())
            .field("volume", &self.sink.volume())
            .finish_non_exhaustive()
    }
}
