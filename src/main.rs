//! bgmusic - background music for the kids learning app
//!
//! Plays the home or game loop through the same session the app's screens
//! use, and lets you drive it from the terminal:
//! - switch tracks, pause/resume, mute and change the volume
//! - simulate the app moving to the background and back

use std::ops::ControlFlow;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};

use bgmusic::cli::{apply_command, Cli, Commands, ConsoleCommand, Display, PlayArgs};
use bgmusic::{AudioOutput, AudioSession, SessionConfig, TrackCatalog};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let config = SessionConfig::load_or_default(cli.config.as_deref())
        .context("設定の読み込みに失敗しました")?;

    match cli.command {
        Some(Commands::Play(args)) => play(config, args).await?,
        Some(Commands::Tracks) => {
            Display::show_tracks(&TrackCatalog::from_config(&config));
        }
        Some(Commands::Config) => {
            Display::show_config(&config)?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Plays music until the user quits or presses Ctrl-C.
async fn play(mut config: SessionConfig, args: PlayArgs) -> Result<()> {
    if let Some(volume) = args.volume {
        config.default_volume = volume;
    }
    if let Some(dir) = args.assets_dir {
        config.assets_dir = Some(dir);
    }
    config.validate()?;

    // The output stream must outlive the session.
    let output = AudioOutput::try_default()
        .map_err(|e| anyhow!("オーディオ出力を開けません: {} ({})", e, e.suggestion()))?;
    let session = AudioSession::new(output.backend(), &config);

    let subscription = session.subscribe_mute(Display::show_mute_changed);
    session.set_muted(args.muted);
    session.start(args.track);
    Display::show_play_started(args.track, session.volume(), session.is_muted());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("標準入力の読み込みに失敗しました")? else {
                    // stdin closed: keep playing until Ctrl-C
                    tokio::signal::ctrl_c().await?;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(command) => {
                        if let ControlFlow::Break(()) = apply_command(&session, command) {
                            break;
                        }
                    }
                    Err(message) => Display::show_error(&message),
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    subscription.unsubscribe();
    session.shutdown();
    Display::show_stopped();
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["bgmusic"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_tracks() {
        let cli = Cli::parse_from(["bgmusic", "tracks"]);
        assert!(matches!(cli.command, Some(Commands::Tracks)));
    }

    #[test]
    fn test_cli_parse_play() {
        let cli = Cli::parse_from(["bgmusic", "play", "game"]);
        assert!(matches!(cli.command, Some(Commands::Play(_))));
    }

    #[test]
    fn test_cli_command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn test_play_rejects_invalid_config_before_opening_audio() {
        let config = SessionConfig {
            retry_delay_ms: 1,
            ..SessionConfig::default()
        };
        let result = play(config, PlayArgs::default()).await;
        assert!(result.is_err());
    }
}
