//! Background Music Session Library
//!
//! This library provides the background music used by the kids learning
//! app's screens. It includes:
//! - A single self-healing music session with track switching,
//!   pause/resume, mute and mute observers
//! - A platform audio layer with a rodio backend and a mock for tests
//! - Session configuration with validation
//! - CLI command parsing and display utilities for the demo player

pub mod cli;
pub mod config;
pub mod session;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{AppLifecycle, PlayIntent, SessionStatus, TrackId};

// Re-export config types
pub use config::{ConfigError, SessionConfig};

// Re-export session types
pub use session::{AudioSession, MuteListener, MuteSubscription};

// Re-export sound types
pub use sound::{
    AudioBackend, AudioOutput, MockAudioBackend, PlayerHandle, RodioBackend, SoundError,
    TrackAsset, TrackCatalog,
};
