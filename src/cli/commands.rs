//! Command definitions for the bgmusic CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::TrackId;

// ============================================================================
// CLI Structure
// ============================================================================

/// bgmusic - background music player for the kids learning app
#[derive(Parser, Debug)]
#[command(
    name = "bgmusic",
    version,
    about = "子ども向け学習アプリのBGMセッションを操作するCLI",
    long_about = "ホーム画面とミニゲーム画面のBGMをループ再生します。\n\
                  再生中は標準入力からトラック切り替え・一時停止・ミュートを操作できます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (default: ~/.bgmusic/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Play background music and control it interactively
    Play(PlayArgs),

    /// List the track catalog
    Tracks,

    /// Print the effective configuration as JSON
    Config,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Play Command Arguments
// ============================================================================

/// Arguments for the play command
#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    /// Track to start with (home or game)
    #[arg(default_value = "home")]
    pub track: TrackId,

    /// Music volume (0.0-1.0), overrides the configuration
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,

    /// Start muted
    #[arg(short, long)]
    pub muted: bool,

    /// Directory holding the music files, overrides the configuration
    #[arg(short, long)]
    pub assets_dir: Option<PathBuf>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a volume between 0.0 and 1.0.
pub(crate) fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("音量は数値で指定してください: '{}'", s))?;
    if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
        return Err("音量は0.0-1.0の範囲で指定してください".to_string());
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["bgmusic"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.config.is_none());
        }

        #[test]
        fn test_parse_verbose_flag() {
            let cli = Cli::parse_from(["bgmusic", "-v", "tracks"]);
            assert!(cli.verbose);
            assert!(matches!(cli.command, Some(Commands::Tracks)));
        }

        #[test]
        fn test_parse_config_path() {
            let cli = Cli::parse_from(["bgmusic", "config", "--config", "/tmp/bgm.json"]);
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/bgm.json")));
            assert!(matches!(cli.command, Some(Commands::Config)));
        }

        #[test]
        fn test_parse_completions() {
            let cli = Cli::parse_from(["bgmusic", "completions", "zsh"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Completions {
                    shell: clap_complete::Shell::Zsh
                })
            ));
        }
    }

    mod play_args_tests {
        use super::*;

        #[test]
        fn test_play_defaults() {
            let cli = Cli::parse_from(["bgmusic", "play"]);
            match cli.command {
                Some(Commands::Play(args)) => {
                    assert_eq!(args.track, TrackId::Home);
                    assert!(args.volume.is_none());
                    assert!(!args.muted);
                    assert!(args.assets_dir.is_none());
                }
                _ => panic!("Expected Play command"),
            }
        }

        #[test]
        fn test_play_with_options() {
            let cli = Cli::parse_from([
                "bgmusic",
                "play",
                "game",
                "--volume",
                "0.3",
                "--muted",
                "--assets-dir",
                "/opt/music",
            ]);
            match cli.command {
                Some(Commands::Play(args)) => {
                    assert_eq!(args.track, TrackId::Game);
                    assert_eq!(args.volume, Some(0.3));
                    assert!(args.muted);
                    assert_eq!(args.assets_dir, Some(PathBuf::from("/opt/music")));
                }
                _ => panic!("Expected Play command"),
            }
        }

        #[test]
        fn test_play_unknown_track() {
            let result = Cli::try_parse_from(["bgmusic", "play", "menu"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_play_volume_out_of_range() {
            let result = Cli::try_parse_from(["bgmusic", "play", "--volume", "1.5"]);
            assert!(result.is_err());
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_parse_volume() {
            assert_eq!(parse_volume("0"), Ok(0.0));
            assert_eq!(parse_volume(" 0.08 "), Ok(0.08));
            assert_eq!(parse_volume("1.0"), Ok(1.0));
            assert!(parse_volume("-0.1").is_err());
            assert!(parse_volume("NaN").is_err());
            assert!(parse_volume("loud").unwrap_err().contains("loud"));
        }
    }
}
