//! Core data types for the background music session.
//!
//! This module defines the data structures used for:
//! - Logical track identifiers
//! - The caller-declared playback intent
//! - The observable session status
//! - Application lifecycle signals

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// TrackId
// ============================================================================

/// Logical identifier of a background music loop.
///
/// The set is closed; adding a track is a catalog change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackId {
    /// Music for the home screen and the learning screens
    #[default]
    Home,
    /// Music for the mini-game screens
    Game,
}

impl TrackId {
    /// Every known track, in catalog order.
    pub const ALL: [TrackId; 2] = [TrackId::Home, TrackId::Game];

    /// Returns the string representation of the track.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackId::Home => "home",
            TrackId::Game => "game",
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when parsing an unknown track name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("不明なトラックです: '{0}' (home または game を指定してください)")]
pub struct UnknownTrack(pub String);

impl FromStr for TrackId {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(TrackId::Home),
            "game" => Ok(TrackId::Game),
            _ => Err(UnknownTrack(s.to_string())),
        }
    }
}

// ============================================================================
// PlayIntent
// ============================================================================

/// What the caller wants the music to be doing.
///
/// This is independent of what the platform reports; a stalled player
/// keeps the `Playing` intent until the health check heals it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayIntent {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlayIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayIntent::Stopped => "stopped",
            PlayIntent::Playing => "playing",
            PlayIntent::Paused => "paused",
        }
    }
}

// ============================================================================
// SessionStatus
// ============================================================================

/// Observable state of the session, derived from intent and handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No handle, nothing requested
    Stopped,
    /// Intent is playing but no handle is live yet (load or retry pending)
    Loading,
    /// Handle live and looping
    Playing,
    /// Intent paused; the handle is kept when one exists
    Paused,
}

impl SessionStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Stopped => "stopped",
            SessionStatus::Loading => "loading",
            SessionStatus::Playing => "playing",
            SessionStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AppLifecycle
// ============================================================================

/// Application foreground/background transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppLifecycle {
    /// The app became visible and active again
    Foreground,
    /// The app moved to the background
    Background,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_default_is_home() {
        assert_eq!(TrackId::default(), TrackId::Home);
    }

    #[test]
    fn test_track_id_parse() {
        assert_eq!("home".parse::<TrackId>().unwrap(), TrackId::Home);
        assert_eq!("GAME".parse::<TrackId>().unwrap(), TrackId::Game);
        assert_eq!(" game ".parse::<TrackId>().unwrap(), TrackId::Game);

        let err = "menu".parse::<TrackId>().unwrap_err();
        assert_eq!(err, UnknownTrack("menu".to_string()));
        assert!(err.to_string().contains("menu"));
    }

    #[test]
    fn test_track_id_display_matches_serde() {
        for track in TrackId::ALL {
            let json = serde_json::to_string(&track).unwrap();
            assert_eq!(json, format!("\"{}\"", track));
        }
    }

    #[test]
    fn test_play_intent_default() {
        assert_eq!(PlayIntent::default(), PlayIntent::Stopped);
        assert_eq!(PlayIntent::Paused.as_str(), "paused");
    }

    #[test]
    fn test_session_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::Loading).unwrap();
        assert_eq!(json, "\"loading\"");
        assert_eq!(SessionStatus::Playing.to_string(), "playing");
    }

    #[test]
    fn test_app_lifecycle_deserialize() {
        let event: AppLifecycle = serde_json::from_str("\"background\"").unwrap();
        assert_eq!(event, AppLifecycle::Background);
    }
}
