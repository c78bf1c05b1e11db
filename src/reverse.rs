//! Reverse sync: turn viewer SyncSource notifications into editor commands.

use futures::StreamExt;

use crate::bus::{Notification, NotificationStream, Signal, SyncSource, ViewerBus};
use crate::command;
use crate::dispatch::CommandSink;
use crate::error::SyncResult;
use crate::uri;

/// Editor command for a SyncSource notification, `None` for anything that
/// is not a local file.
pub fn command_for(event: &SyncSource) -> Option<String> {
    let Some(path) = uri::local_path(&event.input_file) else {
        tracing::debug!("'file://' not found in {}", event.input_file);
        return None;
    };
    let (line, _column) = event.source_link;
    Some(command::navigate_command(&path, line))
}

pub struct SourceListener<S> {
    sink: S,
}

impl<S: CommandSink> SourceListener<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Handle one notification. Returns whether a command was dispatched.
    pub async fn on_sync_source(&mut self, event: &SyncSource) -> SyncResult<bool> {
        tracing::debug!(
            "sync source received: {} {:?}",
            event.input_file,
            event.source_link
        );
        let Some(cmd) = command_for(event) else {
            return Ok(false);
        };
        tracing::debug!("executing {}", cmd);
        self.sink.execute(&cmd).await?;
        Ok(true)
    }

    /// Consume notifications until the stream ends.
    pub async fn listen(&mut self, mut notifications: NotificationStream) {
        while let Some(notification) = notifications.next().await {
            let Notification::SyncSource(event) = notification else {
                continue;
            };
            if let Err(e) = self.on_sync_source(&event).await {
                tracing::warn!("could not forward {} to the editor: {}", event.input_file, e);
            }
        }
        tracing::debug!("SyncSource subscription closed");
    }

    /// Subscribe on `bus` and handle notifications for the life of the process.
    pub async fn run(&mut self, bus: &dyn ViewerBus) -> SyncResult<()> {
        let notifications = bus.subscribe(Signal::SyncSource).await?;
        self.listen(notifications).await;
        Ok(())
    }
}
