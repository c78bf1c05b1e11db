#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sved::bus::{DocumentLoaded, Notification, NotificationStream, Signal, SyncSource};
use sved::{
    forward, CommandSink, EventLoop, ForwardOptions, ForwardSync, Stage, SyncError, SyncRequest,
    SyncResult, ViewerBus, ViewerHandle, WindowHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindDocument { uri: String, open_if_missing: bool },
    GetWindowList { viewer: String },
    SyncView {
        viewer: String,
        window: String,
        source_file: String,
        position: (i32, i32),
        reserved: u32,
    },
}

#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Error(String),
}

/// Scripted viewer: fixed replies, notifications released after a delay.
pub struct FakeViewer {
    pub lookup: Reply<String>,
    pub windows: Reply<Vec<String>>,
    pub window_delay: Duration,
    pub loads: Vec<(Duration, DocumentLoaded)>,
    pub sources: Vec<SyncSource>,
    calls: Mutex<Vec<Call>>,
}

impl FakeViewer {
    pub fn new(lookup: Reply<String>, windows: Reply<Vec<String>>) -> Self {
        Self {
            lookup,
            windows,
            window_delay: Duration::ZERO,
            loads: Vec::new(),
            sources: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_load(mut self, after: Duration, uri: &str, sender: &str) -> Self {
        self.loads.push((
            after,
            DocumentLoaded {
                uri: uri.to_string(),
                sender: Some(sender.to_string()),
            },
        ));
        self
    }

    pub fn with_window_delay(mut self, delay: Duration) -> Self {
        self.window_delay = delay;
        self
    }

    pub fn with_source(mut self, input_file: &str, line: i32, column: i32) -> Self {
        self.sources.push(SyncSource {
            input_file: input_file.to_string(),
            source_link: (line, column),
            timestamp: 123,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ViewerBus for FakeViewer {
    async fn find_document(&self, uri: &str, open_if_missing: bool) -> SyncResult<String> {
        self.record(Call::FindDocument {
            uri: uri.to_string(),
            open_if_missing,
        });
        match &self.lookup {
            Reply::Ok(name) => Ok(name.clone()),
            Reply::Error(msg) => Err(SyncError::lookup(Stage::FindDocument, msg.clone())),
        }
    }

    async fn window_list(&self, viewer: &ViewerHandle) -> SyncResult<Vec<WindowHandle>> {
        self.record(Call::GetWindowList {
            viewer: viewer.to_string(),
        });
        tokio::time::sleep(self.window_delay).await;
        match &self.windows {
            Reply::Ok(paths) => Ok(paths.iter().map(|p| WindowHandle::new(p.as_str())).collect()),
            Reply::Error(msg) => Err(SyncError::lookup(Stage::GetWindowList, msg.clone())),
        }
    }

    async fn sync_view(
        &self,
        viewer: &ViewerHandle,
        window: &WindowHandle,
        source_file: &str,
        position: (i32, i32),
        reserved: u32,
    ) -> SyncResult<()> {
        self.record(Call::SyncView {
            viewer: viewer.to_string(),
            window: window.to_string(),
            source_file: source_file.to_string(),
            position,
            reserved,
        });
        Ok(())
    }

    async fn subscribe(&self, signal: Signal) -> SyncResult<NotificationStream> {
        match signal {
            Signal::DocumentLoaded => {
                let loads = self.loads.clone();
                let timed = stream::iter(loads).then(|(after, ev)| async move {
                    tokio::time::sleep(after).await;
                    Notification::DocumentLoaded(ev)
                });
                // a live subscription never ends on its own
                Ok(timed.chain(stream::pending()).boxed())
            }
            Signal::SyncSource => {
                let sources = self.sources.clone();
                Ok(stream::iter(sources.into_iter().map(Notification::SyncSource)).boxed())
            }
        }
    }
}

/// Sink that keeps every command it is asked to execute.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub commands: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn execute(&mut self, command: &str) -> SyncResult<()> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }
}

pub fn quick_options(timeout: Option<Duration>) -> ForwardOptions {
    ForwardOptions {
        timeout,
        grace: Duration::from_millis(10),
    }
}

/// Run one forward sync on a fresh event loop and return the exit code.
pub fn run_forward(viewer: Arc<FakeViewer>, request: SyncRequest, options: ForwardOptions) -> i32 {
    let event_loop = EventLoop::new().expect("event loop");
    let handle = event_loop.handle();
    event_loop.run(async move {
        let sync = ForwardSync::new(viewer, handle.clone(), options);
        if let Err(e) = sync.run(request).await {
            forward::report_failure(&handle, &e);
        }
    })
}
