//! Viewer side of the session bus.
//!
//! [`ViewerBus`] is the seam between the sync logic and D-Bus: the real
//! [`SessionBus`] talks to Evince through zbus, tests plug in fakes.

use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use zbus::message::Type as MessageType;
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedObjectPath;
use zbus::{Connection, MatchRule, Message, MessageStream};

use crate::error::{Stage, SyncError, SyncResult};

pub const WINDOW_INTERFACE: &str = "org.gnome.evince.Window";

#[zbus::proxy(
    interface = "org.gnome.evince.Daemon",
    default_service = "org.gnome.evince.Daemon",
    default_path = "/org/gnome/evince/Daemon",
    gen_blocking = false
)]
trait Daemon {
    fn find_document(&self, uri: &str, spawn: bool) -> zbus::Result<String>;
}

#[zbus::proxy(
    interface = "org.gnome.evince.Application",
    default_path = "/org/gnome/evince/Evince",
    gen_blocking = false
)]
trait Application {
    fn get_window_list(&self) -> zbus::Result<Vec<OwnedObjectPath>>;
}

#[zbus::proxy(interface = "org.gnome.evince.Window", gen_blocking = false)]
trait Window {
    fn sync_view(
        &self,
        source_file: &str,
        source_point: &(i32, i32),
        timestamp: u32,
    ) -> zbus::Result<()>;
}

/// Bus name of one running viewer process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewerHandle(String);

impl ViewerHandle {
    /// `None` for the empty name the daemon returns when nothing is found.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object path of one document window inside a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notifications emitted by viewer windows, keyed by member name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    SyncSource,
    DocumentLoaded,
}

impl Signal {
    pub fn member(self) -> &'static str {
        match self {
            Signal::SyncSource => "SyncSource",
            Signal::DocumentLoaded => "DocumentLoaded",
        }
    }
}

/// Reverse-sync request: the user picked a spot in the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSource {
    pub input_file: String,
    pub source_link: (i32, i32),
    pub timestamp: u32,
}

/// A viewer window finished loading `uri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLoaded {
    pub uri: String,
    pub sender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SyncSource(SyncSource),
    DocumentLoaded(DocumentLoaded),
}

pub type NotificationStream = BoxStream<'static, Notification>;

#[async_trait]
pub trait ViewerBus: Send + Sync {
    /// Ask the daemon which viewer has `uri` open. An empty answer means
    /// "not (yet) found".
    async fn find_document(&self, uri: &str, open_if_missing: bool) -> SyncResult<String>;

    async fn window_list(&self, viewer: &ViewerHandle) -> SyncResult<Vec<WindowHandle>>;

    async fn sync_view(
        &self,
        viewer: &ViewerHandle,
        window: &WindowHandle,
        source_file: &str,
        position: (i32, i32),
        reserved: u32,
    ) -> SyncResult<()>;

    /// Subscribe to one notification for as long as the stream is alive.
    async fn subscribe(&self, signal: Signal) -> SyncResult<NotificationStream>;
}

impl From<zbus::Error> for SyncError {
    fn from(err: zbus::Error) -> Self {
        SyncError::Bus(err.to_string())
    }
}

fn reply_error(stage: Stage, err: zbus::Error) -> SyncError {
    match err {
        zbus::Error::MethodError(name, detail, _) => {
            SyncError::lookup(stage, detail.unwrap_or_else(|| name.to_string()))
        }
        other => SyncError::lookup(stage, other.to_string()),
    }
}

/// [`ViewerBus`] over the user's D-Bus session bus.
#[derive(Clone)]
pub struct SessionBus {
    conn: Connection,
}

impl SessionBus {
    pub async fn connect() -> SyncResult<Self> {
        tracing::debug!("connecting to the session bus");
        let conn = Connection::session().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ViewerBus for SessionBus {
    async fn find_document(&self, uri: &str, open_if_missing: bool) -> SyncResult<String> {
        tracing::debug!("calling FindDocument on {}", uri);
        let daemon = DaemonProxy::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        daemon
            .find_document(uri, open_if_missing)
            .await
            .map_err(|e| reply_error(Stage::FindDocument, e))
    }

    async fn window_list(&self, viewer: &ViewerHandle) -> SyncResult<Vec<WindowHandle>> {
        let app = ApplicationProxy::builder(&self.conn)
            .destination(viewer.as_str())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let paths = app
            .get_window_list()
            .await
            .map_err(|e| reply_error(Stage::GetWindowList, e))?;
        Ok(paths
            .into_iter()
            .map(|p| WindowHandle::new(p.as_str()))
            .collect())
    }

    async fn sync_view(
        &self,
        viewer: &ViewerHandle,
        window: &WindowHandle,
        source_file: &str,
        position: (i32, i32),
        reserved: u32,
    ) -> SyncResult<()> {
        let window = WindowProxy::builder(&self.conn)
            .destination(viewer.as_str())?
            .path(window.as_str())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        window
            .sync_view(source_file, &position, reserved)
            .await
            .map_err(|e| reply_error(Stage::SyncView, e))
    }

    async fn subscribe(&self, signal: Signal) -> SyncResult<NotificationStream> {
        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(WINDOW_INTERFACE)?
            .member(signal.member())?
            .build();
        let stream = MessageStream::for_match_rule(rule, &self.conn, None).await?;
        tracing::debug!("subscribed to {}.{}", WINDOW_INTERFACE, signal.member());

        Ok(stream
            .filter_map(move |msg| {
                future::ready(match msg {
                    Ok(msg) => decode(signal, &msg),
                    Err(e) => {
                        tracing::warn!("dropping unreadable {} message: {}", signal.member(), e);
                        None
                    }
                })
            })
            .boxed())
    }
}

fn decode(signal: Signal, msg: &Message) -> Option<Notification> {
    let body = msg.body();
    let decoded = match signal {
        Signal::SyncSource => body
            .deserialize::<(String, (i32, i32), u32)>()
            .map(|(input_file, source_link, timestamp)| {
                Notification::SyncSource(SyncSource {
                    input_file,
                    source_link,
                    timestamp,
                })
            }),
        Signal::DocumentLoaded => body.deserialize::<String>().map(|uri| {
            let sender = msg.header().sender().map(|s| s.to_string());
            Notification::DocumentLoaded(DocumentLoaded { uri, sender })
        }),
    };

    match decoded {
        Ok(notification) => Some(notification),
        Err(e) => {
            tracing::debug!("malformed {} payload: {}", signal.member(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_viewer_name_is_not_a_handle() {
        assert!(ViewerHandle::new("").is_none());
        assert_eq!(ViewerHandle::new(":1.42").unwrap().as_str(), ":1.42");
    }

    #[test]
    fn test_signal_members() {
        assert_eq!(Signal::SyncSource.member(), "SyncSource");
        assert_eq!(Signal::DocumentLoaded.member(), "DocumentLoaded");
    }

    #[test]
    fn test_method_error_keeps_peer_description() {
        let err = reply_error(Stage::FindDocument, zbus::Error::Failure("boom".into()));
        match err {
            SyncError::Lookup { stage, message } => {
                assert_eq!(stage, Stage::FindDocument);
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
