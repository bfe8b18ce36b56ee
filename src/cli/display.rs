//! Display utilities for the bgmusic CLI.
//!
//! This module provides formatted output for:
//! - The track catalog
//! - Session status and changes
//! - Error messages

use crate::config::SessionConfig;
use crate::sound::{TrackAsset, TrackCatalog};
use crate::types::{SessionStatus, TrackId};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the track catalog.
    pub fn show_tracks(catalog: &TrackCatalog) {
        println!("トラック一覧");
        println!("─────────────────────────────");
        for (track, asset) in catalog.iter() {
            println!("{}", Self::format_track_line(track, asset));
        }
    }

    /// Shows the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn show_config(config: &SessionConfig) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty(config)?);
        Ok(())
    }

    /// Shows the startup banner of the play command.
    pub fn show_play_started(track: TrackId, volume: f32, muted: bool) {
        println!("> BGMを再生します: {}", track);
        println!("  音量: {}{}", Self::format_volume(volume), if muted { " (ミュート)" } else { "" });
        println!("  help でコマンド一覧、quit で終了します");
    }

    /// Shows the result of a track switch.
    pub fn show_track_selected(track: TrackId, playing: bool) {
        if playing {
            println!("> トラックを切り替えました: {}", track);
        } else {
            println!("* 次に再生するトラック: {}", track);
        }
    }

    /// Shows a volume change.
    pub fn show_volume(volume: f32) {
        println!("  音量: {}", Self::format_volume(volume));
    }

    /// Shows a mute change reported by the session.
    pub fn show_mute_changed(muted: bool) {
        if muted {
            println!("x ミュートしました");
        } else {
            println!("♪ ミュートを解除しました");
        }
    }

    /// Shows the current session status.
    pub fn show_status(status: SessionStatus, track: TrackId, volume: f32, muted: bool) {
        println!("BGM ステータス");
        println!("─────────────────────────────");
        println!("状態: {}", Self::status_label(status));
        println!("トラック: {}", track);
        println!("音量: {}", Self::format_volume(volume));
        println!("ミュート: {}", if muted { "オン" } else { "オフ" });
    }

    /// Shows the interactive commands.
    pub fn show_console_help() {
        println!("コマンド:");
        println!("  home | game        トラックを切り替え");
        println!("  play | stop        再生 / 停止");
        println!("  pause | resume     一時停止 / 再開");
        println!("  mute | unmute | m  ミュート操作");
        println!("  volume <0.0-1.0>   音量を設定");
        println!("  bg | fg            バックグラウンド / フォアグラウンド移行");
        println!("  status             状態を表示");
        println!("  quit               終了");
    }

    /// Shows a message when playback ends.
    pub fn show_stopped() {
        println!("[] BGMを停止しました");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn status_label(status: SessionStatus) -> &'static str {
        match status {
            SessionStatus::Stopped => "停止中",
            SessionStatus::Loading => "読み込み中",
            SessionStatus::Playing => "再生中",
            SessionStatus::Paused => "一時停止中",
        }
    }

    fn format_volume(volume: f32) -> String {
        format!("{:.0}%", volume * 100.0)
    }

    fn format_track_line(track: TrackId, asset: &TrackAsset) -> String {
        match asset {
            TrackAsset::File { path, .. } => format!("{:<6} {}", track, path.display()),
            TrackAsset::Embedded { name } => format!("{:<6} (内蔵ループ: {})", track, name),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
