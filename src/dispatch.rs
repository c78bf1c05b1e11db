//! Command Dispatch channel towards the editor.
//!
//! Vim runs the listener as a job with a JSON channel on stdout; Neovim runs
//! it as an rpc job and is driven through msgpack-rpc on the same pipes.

use std::io::Write;
use std::str::FromStr;

use async_trait::async_trait;
use nvim_rs::compat::tokio::Compat;
use nvim_rs::create::tokio as create;
use nvim_rs::rpc::handler::Dummy;
use nvim_rs::Neovim;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::command::REDRAW;
use crate::error::{SyncError, SyncResult};

/// Which editor hosts the listener, chosen by the `<0|1>` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFlavor {
    Vim,
    Neovim,
}

impl FromStr for EditorFlavor {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(EditorFlavor::Vim),
            "1" => Ok(EditorFlavor::Neovim),
            other => Err(SyncError::Arguments(format!(
                "editor flavor must be 0 (vim) or 1 (neovim), got {:?}",
                other
            ))),
        }
    }
}

/// Something that can execute editor commands.
#[async_trait]
pub trait CommandSink: Send {
    async fn execute(&mut self, command: &str) -> SyncResult<()>;
}

/// One message of Vim's JSON channel protocol: `["ex", "<command>"]`.
#[derive(Debug, Serialize)]
struct ExCommand<'a>(&'static str, &'a str);

impl<'a> ExCommand<'a> {
    fn new(command: &'a str) -> Self {
        ExCommand("ex", command)
    }
}

/// Newline-delimited JSON commands written to a byte stream.
pub struct JsonChannel<W> {
    out: W,
}

impl JsonChannel<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, command: &str) -> SyncResult<()> {
        let line = serde_json::to_string(&ExCommand::new(command))
            .map_err(|e| SyncError::Editor(e.to_string()))?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> CommandSink for JsonChannel<W> {
    async fn execute(&mut self, command: &str) -> SyncResult<()> {
        self.write_line(command)?;
        self.write_line(REDRAW)?;
        self.out.flush()?;
        Ok(())
    }
}

/// nvim-rs attaches to the parent through the stdio fds opened as files.
type NvimWriter = Compat<tokio::fs::File>;

/// Commands sent to the parent Neovim through `nvim_command`.
pub struct NeovimChannel {
    nvim: Neovim<NvimWriter>,
    io: JoinHandle<()>,
}

impl NeovimChannel {
    /// Attach to the Neovim instance that spawned this process.
    pub async fn attach() -> SyncResult<Self> {
        tracing::debug!("attaching to neovim through stdio");
        let (nvim, io) = create::new_parent(Dummy::<NvimWriter>::new())
            .await
            .map_err(|e| SyncError::Editor(e.to_string()))?;
        let io = tokio::spawn(async move {
            match io.await {
                Ok(Err(e)) => tracing::warn!("neovim rpc loop ended: {:?}", e),
                Err(e) => tracing::warn!("neovim rpc task failed: {}", e),
                Ok(Ok(())) => tracing::debug!("neovim closed the rpc channel"),
            }
        });
        Ok(Self { nvim, io })
    }
}

impl Drop for NeovimChannel {
    fn drop(&mut self) {
        self.io.abort();
    }
}

#[async_trait]
impl CommandSink for NeovimChannel {
    async fn execute(&mut self, command: &str) -> SyncResult<()> {
        self.nvim
            .command(command)
            .await
            .map_err(|e| SyncError::Editor(e.to_string()))
    }
}

/// Build the sink for `flavor`. Called once at startup.
pub async fn connect(flavor: EditorFlavor) -> SyncResult<Box<dyn CommandSink>> {
    let sink: Box<dyn CommandSink> = match flavor {
        EditorFlavor::Vim => Box::new(JsonChannel::stdout()) as Box<dyn CommandSink>,
        EditorFlavor::Neovim => Box::new(NeovimChannel::attach().await?) as Box<dyn CommandSink>,
    };
    Ok(sink)
}

#[async_trait]
impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    async fn execute(&mut self, command: &str) -> SyncResult<()> {
        (**self).execute(command).await
    }
}
