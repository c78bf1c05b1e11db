//! Forward sync: move a viewer window to a source position.
//!
//! Two resolution paths race: the daemon's FindDocument reply and a
//! DocumentLoaded notification from a viewer that is still starting up.
//! Whichever names a viewer first is used; the loser is ignored by
//! [`PendingSync`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::time::Instant;

use crate::bus::{Notification, Signal, ViewerBus, WindowHandle};
use crate::error::{SyncError, SyncResult};
use crate::event_loop::{LoopHandle, QUIT_GRACE};
use crate::handshake::{PendingSync, Step, SyncRequest};

/// Ask the daemon to start a viewer when none has the document open.
const OPEN_IF_MISSING: bool = true;

#[derive(Debug, Clone)]
pub struct ForwardOptions {
    /// Give up after this long. `None` waits for the viewer indefinitely.
    pub timeout: Option<Duration>,
    /// Delay between success and loop shutdown.
    pub grace: Duration,
}

impl Default for ForwardOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            grace: QUIT_GRACE,
        }
    }
}

enum Reply {
    Lookup(SyncResult<String>),
    Windows(SyncResult<Vec<WindowHandle>>),
    Navigated(SyncResult<()>),
}

pub struct ForwardSync {
    bus: Arc<dyn ViewerBus>,
    handle: LoopHandle,
    options: ForwardOptions,
}

impl ForwardSync {
    pub fn new(bus: Arc<dyn ViewerBus>, handle: LoopHandle, options: ForwardOptions) -> Self {
        Self {
            bus,
            handle,
            options,
        }
    }

    /// Run the handshake for `request`.
    ///
    /// On success the loop is asked to quit with 0 after the grace delay.
    /// Errors are returned to the caller, which reports them and exits.
    /// If the viewer never shows a window this future never completes.
    pub async fn run(&self, request: SyncRequest) -> SyncResult<()> {
        tracing::debug!("forward syncing {:?}", request);
        let mut sync = PendingSync::new(request);

        // Subscribe before the lookup so a load racing the reply is not lost.
        let mut loaded = self.bus.subscribe(Signal::DocumentLoaded).await?;
        let mut inflight: FuturesUnordered<BoxFuture<'static, Reply>> = FuturesUnordered::new();
        let deadline = self.options.timeout.map(|after| (Instant::now() + after, after));

        let mut step = sync.start();
        loop {
            match step {
                Step::Wait => {}
                Step::Done => {
                    self.handle.quit_after(self.options.grace, 0);
                    return Ok(());
                }
                Step::Fail(err) => return Err(err),
                request => inflight.push(self.issue(request)),
            }

            step = tokio::select! {
                Some(reply) = inflight.next(), if !inflight.is_empty() => match reply {
                    Reply::Lookup(reply) => sync.on_lookup_reply(reply),
                    Reply::Windows(reply) => sync.on_window_list(reply),
                    Reply::Navigated(reply) => sync.on_navigated(reply),
                },
                Some(notification) = loaded.next() => match notification {
                    Notification::DocumentLoaded(ev) => {
                        sync.on_document_loaded(&ev.uri, ev.sender.as_deref())
                    }
                    Notification::SyncSource(_) => Step::Wait,
                },
                after = expired(deadline) => sync.on_timeout(after),
            };
        }
    }

    fn issue(&self, step: Step) -> BoxFuture<'static, Reply> {
        let bus = Arc::clone(&self.bus);
        match step {
            Step::FindDocument { uri } => async move {
                Reply::Lookup(bus.find_document(&uri, OPEN_IF_MISSING).await)
            }
            .boxed(),
            Step::ListWindows { viewer } => async move {
                tracing::debug!("requesting window list of {}", viewer);
                Reply::Windows(bus.window_list(&viewer).await)
            }
            .boxed(),
            Step::Navigate {
                viewer,
                window,
                source_path,
                position,
                reserved,
            } => async move {
                tracing::debug!("calling SyncView {} {:?} on {}", source_path, position, window);
                Reply::Navigated(
                    bus.sync_view(&viewer, &window, &source_path, position, reserved)
                        .await,
                )
            }
            .boxed(),
            Step::Wait | Step::Done | Step::Fail(_) => futures::future::pending().boxed(),
        }
    }
}

async fn expired(deadline: Option<(Instant, Duration)>) -> Duration {
    match deadline {
        Some((at, after)) => {
            tokio::time::sleep_until(at).await;
            after
        }
        None => futures::future::pending().await,
    }
}

/// Report a failed forward sync the way the editor plugin expects: one line
/// on stdout, exit status 1.
pub fn report_failure(handle: &LoopHandle, err: &SyncError) {
    tracing::debug!("forward sync failed: {}", err);
    println!("{}", err.operator_message());
    handle.quit(1);
}

