//! Command line and environment configuration.
//!
//! The editor plugins call the binary with bare positional arguments, so the
//! operating mode is chosen by argument count rather than by subcommand.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::FalseyValueParser;
use clap::Parser;

use crate::dispatch::EditorFlavor;
use crate::error::{SyncError, SyncResult};
use crate::forward::ForwardOptions;
use crate::handshake::{SourcePosition, SyncRequest};

#[derive(Parser, Debug)]
#[command(name = "sved")]
#[command(
    about = "Synchronize Vim/Neovim and Evince through SyncTeX over the session bus",
    version
)]
#[command(after_help = "Modes:
  sved <document.pdf> <line> <column> <source.tex>   forward sync, then exit
  sved <0|1>                                         reverse sync listener (0 = vim, 1 = neovim)")]
pub struct Cli {
    /// Positional arguments, see Modes below
    #[arg(value_name = "ARGS", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Fail a forward sync if the viewer is not ready after this many milliseconds
    #[arg(long, env = "SVED_TIMEOUT_MS", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Write a debug trace to sved_<pid>.log
    #[arg(long, env = "SVED_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Directory for the debug trace
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,
}

/// What this process does, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Forward(SyncRequest),
    Listen(EditorFlavor),
}

#[derive(Debug, Clone)]
pub struct LogOptions {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Cli {
    pub fn mode(&self) -> SyncResult<Mode> {
        parse_mode(&self.args)
    }

    pub fn forward_options(&self) -> ForwardOptions {
        ForwardOptions {
            timeout: self.timeout_ms.map(Duration::from_millis),
            ..ForwardOptions::default()
        }
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            enabled: self.debug,
            dir: self.log_dir.clone(),
        }
    }
}

fn parse_number(name: &str, value: &str) -> SyncResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncError::Arguments(format!("{} must be an integer, got {:?}", name, value)))
}

pub fn parse_mode(args: &[String]) -> SyncResult<Mode> {
    match args {
        [document, line, column, source] => {
            let position = SourcePosition::new(
                parse_number("line", line)?,
                parse_number("column", column)?,
            );
            Ok(Mode::Forward(SyncRequest::new(
                document.as_str(),
                source.as_str(),
                position,
            )))
        }
        [flavor] => Ok(Mode::Listen(flavor.parse()?)),
        other => Err(SyncError::Arguments(format!(
            "expected 4 arguments (forward sync) or 1 argument (listener), got {}: {}",
            other.len(),
            other.join(" ")
        ))),
    }
}
