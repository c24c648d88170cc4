//! Capability interfaces over the vendor player script
//!
//! The vendor script registers a player factory in the hosting environment
//! at some point after page load. The controller only ever talks to these
//! traits, so tests can report availability deterministically instead of
//! racing a real script load.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::errors::PlayerResult;

/// Events emitted by a live player object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Playing,
    Error(String),
}

/// Everything the vendor factory needs to construct a player
#[derive(Debug, Clone)]
pub struct PlayerSetupConfig {
    /// Identifier of the render target the player attaches to
    pub target_id: String,
    pub partner_id: i64,
    pub ui_conf_id: i64,
    /// Session token scoping what the player may load
    pub ks: String,
    pub autoplay: bool,
}

/// The vendor player factory as seen by the controller
pub trait PlayerFactory: Send + Sync {
    /// Whether the vendor script has registered itself yet
    fn is_available(&self) -> bool;

    /// Construct a player bound to the render target
    ///
    /// `events` receives playing/error notifications for the lifetime of
    /// the returned handle.
    fn setup(
        &self,
        config: &PlayerSetupConfig,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> PlayerResult<Box<dyn PlayerHandle>>;
}

/// One live player object bound to one render target
///
/// Owned exclusively by the controller; destroyed before a replacement is
/// created and when the controller is torn down.
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    async fn load_media(&mut self, entry_id: &str) -> PlayerResult<()>;

    fn destroy(&mut self) -> PlayerResult<()>;
}

/// Handle to the surface a player attaches to
///
/// Whoever owns the render surface signals attachment explicitly through
/// the paired [`AttachmentSignal`]; the controller waits for that signal
/// instead of sleeping for an arbitrary settle delay.
pub struct RenderTarget {
    id: String,
    attached: watch::Receiver<bool>,
}

/// Sender half owned by the render surface's owner
pub struct AttachmentSignal {
    tx: watch::Sender<bool>,
}

impl RenderTarget {
    pub fn new(id: impl Into<String>) -> (Self, AttachmentSignal) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                id: id.into(),
                attached: rx,
            },
            AttachmentSignal { tx },
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolve once the surface is attached; immediate if it already is
    ///
    /// If the signal owner went away without ever attaching, the surface
    /// can never become ready and this future stays pending.
    pub async fn wait_attached(&mut self) {
        if self.attached.wait_for(|attached| *attached).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl AttachmentSignal {
    /// Mark the render surface as attached and ready for a player
    pub fn attached(&self) {
        let _ = self.tx.send(true);
    }
}
