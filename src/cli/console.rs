//! Interactive control of a playing session.
//!
//! While `bgmusic play` runs, each line on stdin is one command. This is
//! the same set of calls the app's screens make: switch tracks on focus,
//! pause/resume on background/foreground, toggle mute from the UI.

use std::ops::ControlFlow;
use std::str::FromStr;

use crate::session::AudioSession;
use crate::sound::AudioBackend;
use crate::types::{AppLifecycle, TrackId};

use super::commands::parse_volume;
use super::display::Display;

/// One line of console input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    /// Switch to a track (`home`, `game`)
    Track(TrackId),
    /// Make sure music is audible (`play`)
    Play,
    /// `stop`
    Stop,
    /// `pause`
    Pause,
    /// `resume`
    Resume,
    /// `mute`
    Mute,
    /// `unmute`
    Unmute,
    /// `m` / `toggle`
    ToggleMute,
    /// `volume <0.0-1.0>`
    Volume(f32),
    /// `bg` / `fg`: simulate the app moving to the background/foreground
    Lifecycle(AppLifecycle),
    /// `status`
    Status,
    /// `help`
    Help,
    /// `quit` / `exit`
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Err("コマンドを入力してください (help で一覧)".to_string());
        };
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("引数が多すぎます: '{}'", line.trim()));
        }

        let command = match (word.to_ascii_lowercase().as_str(), arg) {
            ("home", None) => Self::Track(TrackId::Home),
            ("game", None) => Self::Track(TrackId::Game),
            ("play" | "start", None) => Self::Play,
            ("stop", None) => Self::Stop,
            ("pause", None) => Self::Pause,
            ("resume", None) => Self::Resume,
            ("mute", None) => Self::Mute,
            ("unmute", None) => Self::Unmute,
            ("m" | "toggle", None) => Self::ToggleMute,
            ("volume" | "vol", Some(value)) => Self::Volume(parse_volume(value)?),
            ("volume" | "vol", None) => {
                return Err("音量を指定してください (例: volume 0.3)".to_string())
            }
            ("bg" | "background", None) => Self::Lifecycle(AppLifecycle::Background),
            ("fg" | "foreground", None) => Self::Lifecycle(AppLifecycle::Foreground),
            ("status", None) => Self::Status,
            ("help" | "?", None) => Self::Help,
            ("quit" | "exit" | "q", None) => Self::Quit,
            _ => return Err(format!("不明なコマンドです: '{}'", line.trim())),
        };
        Ok(command)
    }
}

/// Applies a console command to the session.
///
/// Returns `ControlFlow::Break` when the user asked to quit.
pub fn apply_command<B: AudioBackend>(
    session: &AudioSession<B>,
    command: ConsoleCommand,
) -> ControlFlow<()> {
    match command {
        ConsoleCommand::Track(track) => {
            session.switch_to(track);
            Display::show_track_selected(track, session.is_playing());
        }
        ConsoleCommand::Play => session.ensure_playing(),
        ConsoleCommand::Stop => session.stop(),
        ConsoleCommand::Pause => session.pause(),
        ConsoleCommand::Resume => session.resume(),
        ConsoleCommand::Mute => session.set_muted(true),
        ConsoleCommand::Unmute => session.set_muted(false),
        ConsoleCommand::ToggleMute => {
            session.toggle_mute();
        }
        ConsoleCommand::Volume(volume) => {
            session.set_volume(volume);
            Display::show_volume(session.volume());
        }
        ConsoleCommand::Lifecycle(event) => session.handle_lifecycle(event),
        ConsoleCommand::Status => Display::show_status(
            session.status(),
            session.current_track(),
            session.volume(),
            session.is_muted(),
        ),
        ConsoleCommand::Help => Display::show_console_help(),
        ConsoleCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}
