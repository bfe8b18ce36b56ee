//! Platform audio layer for background music.
//!
//! This module provides the primitives the music session drives:
//!
//! - Track assets and the fixed track catalog
//! - Embedded fallback loops
//! - A rodio-backed player for real output
//! - A scriptable mock backend for tests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   AudioSession   │ ← owns at most one handle
//! └────────┬─────────┘
//!          │ load(asset)
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   AudioBackend   │────▶│  RodioBackend    │
//! │                  │     ├──────────────────┤
//! │                  │────▶│ MockAudioBackend │
//! └────────┬─────────┘     └──────────────────┘
//!          │ Handle
//!          ▼
//! ┌──────────────────┐
//! │   PlayerHandle   │ play / pause / volume / loop / release
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use bgmusic::sound::{AudioBackend, AudioOutput, PlayerHandle, TrackCatalog};
//! use bgmusic::types::TrackId;
//!
//! # async fn example() -> Result<(), bgmusic::sound::SoundError> {
//! let output = AudioOutput::try_default()?;
//! let backend = output.backend();
//! let catalog = TrackCatalog::builtin();
//!
//! let mut player = backend.load(catalog.get(TrackId::Home)).await?;
//! player.set_volume(0.08);
//! player.set_looping(true);
//! player.play()?;
//! # Ok(())
//! # }
//! ```

mod embedded;
mod error;
mod mock;
mod player;
mod source;

use std::future::Future;

pub use embedded::{embedded_track_names, embedded_track_wav, EMBEDDED_SAMPLE_RATE};
pub use error::SoundError;
pub use mock::{MockAudioBackend, MockPlayerHandle, MockPlayerState};
pub use player::{AudioOutput, RodioBackend, RodioPlayer};
pub use source::{TrackAsset, TrackCatalog};

/// Loads tracks into playable handles.
///
/// Loading is asynchronous; the session spawns the returned future and
/// decides what to do with the handle when it completes.
pub trait AudioBackend: Send + Sync + 'static {
    /// The player type this backend produces.
    type Handle: PlayerHandle;

    /// Loads `asset` into a new, paused player.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be read or decoded, or if no
    /// player can be created.
    fn load(
        &self,
        asset: &TrackAsset,
    ) -> impl Future<Output = Result<Self::Handle, SoundError>> + Send;
}

/// One live platform player.
///
/// Controls are synchronous and cheap; they are called while the session
/// holds its state lock.
pub trait PlayerHandle: Send + 'static {
    /// Starts or continues playback.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to play.
    fn play(&mut self) -> Result<(), SoundError>;

    /// Suspends playback, keeping the position.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to pause.
    fn pause(&mut self) -> Result<(), SoundError>;

    /// Sets the output volume (0.0-1.0).
    fn set_volume(&mut self, volume: f32);

    /// Sets whether the track repeats indefinitely.
    fn set_looping(&mut self, looping: bool);

    /// Returns true if the platform reports audio is being produced.
    fn is_playing(&self) -> bool;

    /// Stops playback and frees the player.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform reports a failure; the handle is
    /// consumed either way.
    fn release(self) -> Result<(), SoundError>;
}
