//! Forward-sync handshake as a plain state machine.
//!
//! Every bus reply or notification is fed in as an event and answered with
//! the next [`Step`]. Nothing here performs I/O, so the driver in
//! [`crate::forward`] decides how requests are issued and awaited.

use std::time::Duration;

use crate::bus::{ViewerHandle, WindowHandle};
use crate::error::SyncError;
use crate::uri;

/// SyncView's trailing argument. Evince reads it as a timestamp;
/// the sync always sends 0.
pub const RESERVED_ARG: u32 = 0;

/// Position in the source file, as passed by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: i32,
    pub column: i32,
}

impl SourcePosition {
    pub fn new(line: i32, column: i32) -> Self {
        Self { line, column }
    }

    pub fn as_tuple(self) -> (i32, i32) {
        (self.line, self.column)
    }
}

/// Immutable input of one forward sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub document_path: String,
    pub source_path: String,
    pub position: SourcePosition,
}

impl SyncRequest {
    pub fn new(
        document_path: impl Into<String>,
        source_path: impl Into<String>,
        position: SourcePosition,
    ) -> Self {
        Self {
            document_path: document_path.into(),
            source_path: source_path.into(),
            position,
        }
    }

    pub fn document_uri(&self) -> String {
        uri::document_uri(&self.document_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    AwaitingDocument,
    AwaitingWindowList,
    Navigating,
    Dispatched,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Dispatched | Phase::Failed)
    }
}

/// What the driver must do next.
#[derive(Debug)]
pub enum Step {
    FindDocument { uri: String },
    ListWindows { viewer: ViewerHandle },
    Navigate {
        viewer: ViewerHandle,
        window: WindowHandle,
        source_path: String,
        position: (i32, i32),
        reserved: u32,
    },
    Wait,
    Done,
    Fail(SyncError),
}

/// The single in-flight forward sync of this process.
#[derive(Debug)]
pub struct PendingSync {
    request: SyncRequest,
    uri: String,
    viewer: Option<ViewerHandle>,
    phase: Phase,
}

impl PendingSync {
    pub fn new(request: SyncRequest) -> Self {
        let uri = request.document_uri();
        Self {
            request,
            uri,
            viewer: None,
            phase: Phase::Init,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn viewer(&self) -> Option<&ViewerHandle> {
        self.viewer.as_ref()
    }

    pub fn start(&mut self) -> Step {
        if self.phase != Phase::Init {
            return Step::Wait;
        }
        self.phase = Phase::AwaitingDocument;
        Step::FindDocument {
            uri: self.uri.clone(),
        }
    }

    /// Reply to FindDocument.
    pub fn on_lookup_reply(&mut self, reply: Result<String, SyncError>) -> Step {
        match reply {
            Ok(name) => {
                tracing::debug!("find document reply: {:?}", name);
                self.resolve(name)
            }
            Err(e) => {
                tracing::debug!("find document error: {}", e);
                self.fail(e)
            }
        }
    }

    /// A viewer window finished loading a document.
    pub fn on_document_loaded(&mut self, uri: &str, sender: Option<&str>) -> Step {
        tracing::debug!("document loaded: {}, {:?}", uri, sender);
        if uri != self.uri {
            tracing::debug!("loaded document does not match target {}", self.uri);
            return Step::Wait;
        }
        match sender {
            Some(sender) => self.resolve(sender.to_string()),
            None => Step::Wait,
        }
    }

    fn resolve(&mut self, name: String) -> Step {
        if self.phase != Phase::AwaitingDocument {
            return Step::Wait;
        }
        let Some(viewer) = ViewerHandle::new(name) else {
            return Step::Wait;
        };
        self.viewer = Some(viewer.clone());
        self.phase = Phase::AwaitingWindowList;
        Step::ListWindows { viewer }
    }

    /// Reply to GetWindowList.
    pub fn on_window_list(&mut self, reply: Result<Vec<WindowHandle>, SyncError>) -> Step {
        if self.phase != Phase::AwaitingWindowList {
            return Step::Wait;
        }
        let windows = match reply {
            Ok(windows) => windows,
            Err(e) => {
                tracing::debug!("window list error: {}", e);
                return self.fail(e);
            }
        };
        tracing::debug!("window list reply: {:?}", windows);

        // Only the first window is driven; documents open in several windows
        // are not disambiguated.
        let Some(window) = windows.into_iter().next() else {
            tracing::debug!("empty window list");
            return Step::Wait;
        };
        let Some(viewer) = self.viewer.clone() else {
            return Step::Wait;
        };

        self.phase = Phase::Navigating;
        Step::Navigate {
            viewer,
            window,
            source_path: self.request.source_path.clone(),
            position: self.request.position.as_tuple(),
            reserved: RESERVED_ARG,
        }
    }

    /// Reply to SyncView.
    pub fn on_navigated(&mut self, reply: Result<(), SyncError>) -> Step {
        if self.phase != Phase::Navigating {
            return Step::Wait;
        }
        match reply {
            Ok(()) => {
                tracing::debug!("SyncView done");
                self.phase = Phase::Dispatched;
                Step::Done
            }
            Err(e) => self.fail(e),
        }
    }

    /// The configured deadline expired.
    pub fn on_timeout(&mut self, after: Duration) -> Step {
        if self.phase.is_terminal() {
            return Step::Wait;
        }
        self.fail(SyncError::Timeout(after))
    }

    fn fail(&mut self, err: SyncError) -> Step {
        if self.phase.is_terminal() {
            return Step::Wait;
        }
        self.phase = Phase::Failed;
        Step::Fail(err)
    }
}
