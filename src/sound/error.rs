//! Sound system error types.
//!
//! Background music is decorative, so none of these errors ever reach the
//! screens. The session logs them and retries; they exist so backends can
//! describe what went wrong.

use thiserror::Error;

/// Errors that can occur in the audio backend.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// Music file was not found at the specified path.
    #[error("音楽ファイルが見つかりません: {0}")]
    FileNotFound(String),

    /// Failed to decode the audio data.
    #[error("音楽ファイルのデコードに失敗しました: {0}")]
    DecodeError(String),

    /// Failed to create the audio output stream or sink.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),

    /// The load request did not produce a player.
    #[error("音楽の読み込みに失敗しました: {0}")]
    LoadFailed(String),

    /// The platform refused to start or continue playback.
    #[error("音楽の再生に失敗しました: {0}")]
    PlaybackError(String),

    /// Stopping or unloading a player failed.
    #[error("プレイヤーの解放に失敗しました: {0}")]
    ReleaseFailed(String),
}

impl SoundError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "オーディオデバイスを接続してください",
            Self::FileNotFound(_) => "音楽ファイルの配置 (assets_dir) を確認してください",
            Self::DecodeError(_) => "音楽ファイルが破損している可能性があります",
            Self::StreamError(_) => "オーディオ設定を確認してください",
            Self::LoadFailed(_) => "しばらくすると自動的に再試行されます",
            Self::PlaybackError(_) => "しばらくすると自動的に再試行されます",
            Self::ReleaseFailed(_) => "対応は不要です",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SoundError::DeviceNotAvailable("no device".to_string());
        assert!(err.to_string().contains("no device"));
        assert!(err.to_string().contains("オーディオデバイスが利用できません"));

        let err = SoundError::FileNotFound("/music/home_loop.mp3".to_string());
        assert!(err.to_string().contains("/music/home_loop.mp3"));

        let err = SoundError::LoadFailed("task panicked".to_string());
        assert!(err.to_string().contains("task panicked"));

        let err = SoundError::ReleaseFailed("already stopped".to_string());
        assert!(err.to_string().contains("already stopped"));
    }

    #[test]
    fn test_suggestion() {
        let err = SoundError::FileNotFound("x".into());
        assert!(err.suggestion().contains("assets_dir"));

        let err = SoundError::PlaybackError("x".into());
        assert!(err.suggestion().contains("再試行"));
    }
}
