//! Wiring of the two operating modes onto one event loop.

use std::sync::Arc;

use crate::bus::SessionBus;
use crate::config::{Cli, Mode};
use crate::dispatch::{self, EditorFlavor};
use crate::error::SyncResult;
use crate::event_loop::{EventLoop, LoopHandle};
use crate::forward::{self, ForwardOptions, ForwardSync};
use crate::handshake::SyncRequest;
use crate::reverse::SourceListener;

/// Run the mode selected by `cli` and return the process exit code.
///
/// Argument errors are returned before any bus connection is made.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let mode = cli.mode()?;
    let event_loop = EventLoop::new()?;
    let handle = event_loop.handle();

    let code = match mode {
        Mode::Forward(request) => {
            let options = cli.forward_options();
            event_loop.run(forward_sync(handle, request, options))
        }
        Mode::Listen(flavor) => event_loop.run(listen(handle, flavor)),
    };
    Ok(code)
}

async fn forward_sync(handle: LoopHandle, request: SyncRequest, options: ForwardOptions) {
    let bus = match SessionBus::connect().await {
        Ok(bus) => bus,
        Err(e) => return forward::report_failure(&handle, &e),
    };
    let sync = ForwardSync::new(Arc::new(bus), handle.clone(), options);
    if let Err(e) = sync.run(request).await {
        forward::report_failure(&handle, &e);
    }
}

async fn listen(handle: LoopHandle, flavor: EditorFlavor) {
    let result = serve_listener(flavor).await;
    listener_finished(&handle, result);
}

/// The listener only stops the process on a startup failure. A closed
/// subscription leaves the loop running until the editor kills the job.
fn listener_finished(handle: &LoopHandle, result: SyncResult<()>) {
    match result {
        Ok(()) => tracing::warn!("SyncSource subscription closed, idling until killed"),
        Err(e) => {
            tracing::error!("listener failed: {}", e);
            eprintln!("sved: {}", e);
            handle.quit(1);
        }
    }
}

async fn serve_listener(flavor: EditorFlavor) -> SyncResult<()> {
    let bus = SessionBus::connect().await?;
    let sink = dispatch::connect(flavor).await?;
    SourceListener::new(sink).run(&bus).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::SyncError;

    #[test]
    fn test_closed_subscription_keeps_loop_running() {
        let event_loop = EventLoop::new().unwrap();
        let handle = event_loop.handle();
        let code = event_loop.run(async move {
            listener_finished(&handle, Ok(()));
            handle.quit_after(Duration::from_millis(30), 7);
        });
        assert_eq!(code, 7);
    }

    #[test]
    fn test_listener_startup_failure_exits_one() {
        let event_loop = EventLoop::new().unwrap();
        let handle = event_loop.handle();
        let code = event_loop.run(async move {
            listener_finished(&handle, Err(SyncError::Bus("no session bus".into())));
        });
        assert_eq!(code, 1);
    }
}
