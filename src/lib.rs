//! # sved - SyncTeX bridge between Vim/Neovim and Evince
//!
//! Two short-lived roles share one binary:
//!
//! - **Forward sync** (editor to viewer): find the Evince instance showing a
//!   PDF, or wait for it to finish loading, then ask its first window to
//!   highlight a source position.
//! - **Reverse sync** (viewer to editor): listen for Evince `SyncSource`
//!   notifications and turn them into editor navigation commands.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sved::{EventLoop, ForwardOptions, ForwardSync, SessionBus, SourcePosition, SyncRequest};
//!
//! let event_loop = EventLoop::new()?;
//! let handle = event_loop.handle();
//! let code = event_loop.run(async move {
//!     let bus = SessionBus::connect().await.expect("session bus");
//!     let sync = ForwardSync::new(Arc::new(bus), handle.clone(), ForwardOptions::default());
//!     let request = SyncRequest::new("/tmp/doc.pdf", "/tmp/doc.tex", SourcePosition::new(12, 0));
//!     if let Err(e) = sync.run(request).await {
//!         sved::forward::report_failure(&handle, &e);
//!     }
//! });
//! std::process::exit(code);
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod app;
pub mod bus;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod forward;
pub mod handshake;
pub mod logging;
pub mod reverse;
pub mod uri;

// Re-export main types for library consumers
pub use bus::{SessionBus, ViewerBus, ViewerHandle, WindowHandle};
pub use dispatch::{CommandSink, EditorFlavor, JsonChannel, NeovimChannel};
pub use error::{Stage, SyncError, SyncResult};
pub use event_loop::{EventLoop, LoopHandle};
pub use forward::{ForwardOptions, ForwardSync};
pub use handshake::{PendingSync, Phase, SourcePosition, SyncRequest};
pub use reverse::SourceListener;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
