//! Session configuration.
//!
//! The configuration is an optional JSON file (`~/.bgmusic/config.json` by
//! default). Every field has a default, so a partial file or no file at
//! all is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default music volume. Kept low so narration stays audible over music.
pub const DEFAULT_VOLUME: f32 = 0.08;

/// Delay before retrying a failed load or play.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Interval of the stall-detecting health check.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 5000;

const CONFIG_DIR_NAME: &str = ".bgmusic";
const CONFIG_FILE_NAME: &str = "config.json";

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_health_check_interval_ms() -> u64 {
    DEFAULT_HEALTH_CHECK_INTERVAL_MS
}

fn default_home_track() -> String {
    "home_loop.mp3".to_string()
}

fn default_game_track() -> String {
    "game_loop.mp3".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("設定ファイルを読み込めません: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("設定ファイルの形式が不正です: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("設定値が不正です: {0}")]
    Invalid(String),
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Configuration for the background music session.
///
/// # Example
///
/// ```
/// use bgmusic::config::SessionConfig;
///
/// let config = SessionConfig::default();
/// assert_eq!(config.default_volume, 0.08);
/// assert_eq!(config.retry_delay().as_millis(), 2000);
/// assert_eq!(config.health_check_interval().as_millis(), 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Initial non-muted music volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// Fixed delay before retrying a failed load or play, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Period of the stall check while playing, in milliseconds
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,

    /// Directory holding the music files. When absent the built-in tones
    /// are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,

    /// File name of the home track inside `assets_dir`
    #[serde(default = "default_home_track")]
    pub home_track: String,

    /// File name of the game track inside `assets_dir`
    #[serde(default = "default_game_track")]
    pub game_track: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            retry_delay_ms: default_retry_delay_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            assets_dir: None,
            home_track: default_home_track(),
            game_track: default_game_track(),
        }
    }
}

impl SessionConfig {
    /// Sets the initial volume.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.default_volume = volume;
        self
    }

    /// Sets the assets directory.
    #[must_use]
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    /// Returns the retry delay as a `Duration`.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Returns the health check interval as a `Duration`.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_volume.is_finite() || !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ConfigError::Invalid(
                "音量は0.0-1.0の範囲で指定してください".to_string(),
            ));
        }
        if !(100..=60_000).contains(&self.retry_delay_ms) {
            return Err(ConfigError::Invalid(
                "リトライ間隔は100-60000ミリ秒の範囲で指定してください".to_string(),
            ));
        }
        if !(500..=60_000).contains(&self.health_check_interval_ms) {
            return Err(ConfigError::Invalid(
                "ヘルスチェック間隔は500-60000ミリ秒の範囲で指定してください".to_string(),
            ));
        }
        if self.home_track.trim().is_empty() || self.game_track.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "トラックのファイル名が空です".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded session config");
        Ok(config)
    }

    /// Loads the configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing file at the default location
    /// yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but is invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(default_path) if default_path.exists() => Self::load(&default_path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Returns the default configuration file path (`~/.bgmusic/config.json`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.default_volume, DEFAULT_VOLUME);
        assert_eq!(config.retry_delay_ms, 2000);
        assert_eq!(config.health_check_interval_ms, 5000);
        assert!(config.assets_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"default_volume": 0.2}"#).unwrap();
        assert_eq!(config.default_volume, 0.2);
        assert_eq!(config.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert_eq!(config.home_track, "home_loop.mp3");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = SessionConfig::default().with_volume(1.5);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SessionConfig::default().with_volume(f32::NAN);
        assert!(config.validate().is_err());

        let config = SessionConfig {
            retry_delay_ms: 10,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            health_check_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            game_track: "  ".to_string(),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"assets_dir": "/opt/kids/music", "retry_delay_ms": 500}}"#
        )
        .unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.assets_dir, Some(PathBuf::from("/opt/kids/music")));
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = SessionConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = SessionConfig::load_or_default(Some(Path::new("/nonexistent/bgmusic.json")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("bgmusic.json"));
    }

    #[test]
    fn test_default_config_path_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(".bgmusic/config.json"));
        }
    }
}
