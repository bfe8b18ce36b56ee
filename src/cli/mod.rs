//! CLI module for bgmusic.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `console`: Interactive commands while music plays
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod console;
pub mod display;

pub use commands::{Cli, Commands, PlayArgs};
pub use console::{apply_command, ConsoleCommand};
pub use display::Display;
