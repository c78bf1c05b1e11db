//! Explicitly owned event loop.
//!
//! A single-threaded tokio runtime delivers every bus reply and notification.
//! Components receive a [`LoopHandle`] to schedule work or request shutdown;
//! the runtime is torn down when [`EventLoop::run`] returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Delay between a successful sync and loop shutdown, so trailing bus
/// traffic can still be flushed.
pub const QUIT_GRACE: Duration = Duration::from_millis(100);

pub struct EventLoop {
    runtime: Runtime,
    handle: LoopHandle,
    exit: watch::Receiver<Option<i32>>,
}

/// Cloneable access to a running [`EventLoop`].
#[derive(Clone)]
pub struct LoopHandle {
    runtime: Handle,
    exit: Arc<watch::Sender<Option<i32>>>,
}

impl EventLoop {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let (tx, rx) = watch::channel(None);
        let handle = LoopHandle {
            runtime: runtime.handle().clone(),
            exit: Arc::new(tx),
        };
        Ok(Self {
            runtime,
            handle,
            exit: rx,
        })
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Drive `main` and keep the loop alive until a quit is requested.
    ///
    /// Returning from `main` does not stop the loop. Returns the exit code
    /// passed to [`LoopHandle::quit`].
    pub fn run<F>(self, main: F) -> i32
    where
        F: Future<Output = ()>,
    {
        let EventLoop {
            runtime,
            handle,
            mut exit,
        } = self;

        let code = runtime.block_on(async move {
            tokio::pin!(main);
            let mut main_done = false;
            loop {
                tokio::select! {
                    _ = &mut main, if !main_done => {
                        main_done = true;
                        tracing::debug!("main task finished, waiting for quit");
                    }
                    requested = exit.wait_for(|code| code.is_some()) => {
                        // the sender lives in `handle`, so the channel cannot close here
                        break requested.ok().and_then(|code| *code).unwrap_or(1);
                    }
                }
            }
        });
        drop(handle);
        tracing::debug!("exited main loop with {}", code);
        code
    }
}

impl LoopHandle {
    /// Stop the loop with `code`. The first request wins.
    pub fn quit(&self, code: i32) {
        self.exit.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(code);
                true
            } else {
                false
            }
        });
    }

    /// Stop the loop with `code` once `delay` has elapsed.
    pub fn quit_after(&self, delay: Duration, code: i32) -> JoinHandle<()> {
        let this = self.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            this.quit(code);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_from_main_returns_code() {
        let event_loop = EventLoop::new().unwrap();
        let handle = event_loop.handle();
        let code = event_loop.run(async move {
            handle.quit(3);
        });
        assert_eq!(code, 3);
    }

    #[test]
    fn test_loop_outlives_main_until_delayed_quit() {
        let event_loop = EventLoop::new().unwrap();
        let handle = event_loop.handle();
        let code = event_loop.run(async move {
            handle.quit_after(Duration::from_millis(20), 0);
        });
        assert_eq!(code, 0);
    }

    #[test]
    fn test_first_quit_wins() {
        let event_loop = EventLoop::new().unwrap();
        let handle = event_loop.handle();
        handle.quit(1);
        handle.quit(0);
        assert_eq!(event_loop.run(async {}), 1);
    }
}
