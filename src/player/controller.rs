//! Player lifecycle controller
//!
//! Actor-style controller owning at most one live player handle. A command
//! channel carries entry-id changes and retries; state is published through
//! a watch channel. Re-entry always tears the previous handle down before a
//! new one is constructed, and a command arriving while an initialization is
//! in flight discards that initialization's outcome.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::TokenSupplier;
use super::factory::{PlayerEvent, PlayerFactory, PlayerHandle, PlayerSetupConfig, RenderTarget};
use crate::config::PlayerConfig;
use crate::errors::PlayerError;
use crate::models::EntryId;

/// Observable controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    /// Polling for the vendor script, bounded by the configured timeout
    AwaitingScript,
    /// Requesting a session token for the current entry id
    AwaitingToken,
    /// Player constructed and media loaded
    Ready,
    Failed(PlayerError),
}

enum Command {
    SetEntryId(Option<EntryId>),
    Retry,
}

/// Everything a controller needs; `spawn` starts the actor task
pub struct PlayerControllerBuilder {
    pub config: PlayerConfig,
    pub factory: Arc<dyn PlayerFactory>,
    pub tokens: Arc<dyn TokenSupplier>,
    pub target: RenderTarget,
    pub entry_id: Option<EntryId>,
    pub events: mpsc::UnboundedSender<PlayerEvent>,
}

impl PlayerControllerBuilder {
    pub fn spawn(self) -> PlayerController {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlayerState::Idle);
        let shutdown = CancellationToken::new();

        let task = ControllerTask {
            config: self.config,
            factory: self.factory,
            tokens: self.tokens,
            target: self.target,
            entry_id: self.entry_id,
            events: self.events,
            handle: None,
            state_tx,
        };
        let join = tokio::spawn(task.run(cmd_rx, shutdown.clone()));

        PlayerController {
            cmd_tx,
            state_rx,
            shutdown,
            task: Some(join),
        }
    }
}

/// Public face of the controller actor
pub struct PlayerController {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<PlayerState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PlayerController {
    /// Switch to a different entry id (or back to the configured default)
    ///
    /// Triggers a re-initialization; any initialization already in flight
    /// is abandoned and its outcome discarded.
    pub fn set_entry_id(&self, entry_id: Option<EntryId>) {
        let _ = self.cmd_tx.send(Command::SetEntryId(entry_id));
    }

    /// Explicit user retry after a failure
    pub fn retry(&self) {
        let _ = self.cmd_tx.send(Command::Retry);
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PlayerState {
        self.state_rx.borrow().clone()
    }

    /// Watch channel for state transitions
    pub fn state_changes(&self) -> watch::Receiver<PlayerState> {
        self.state_rx.clone()
    }

    /// Tear down the live player (best-effort) and stop the actor
    pub async fn dispose(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        // dispose() awaits teardown; dropping at least stops the actor
        self.shutdown.cancel();
    }
}

struct ControllerTask {
    config: PlayerConfig,
    factory: Arc<dyn PlayerFactory>,
    tokens: Arc<dyn TokenSupplier>,
    target: RenderTarget,
    entry_id: Option<EntryId>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    handle: Option<Box<dyn PlayerHandle>>,
    state_tx: watch::Sender<PlayerState>,
}

enum Wake {
    Command(Option<Command>),
    InitDone,
    Shutdown,
}

impl ControllerTask {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>, shutdown: CancellationToken) {
        // the mount itself kicks off the first initialization
        let mut pending_init = true;

        loop {
            let wake = if pending_init {
                pending_init = false;
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => Wake::Shutdown,
                    cmd = cmd_rx.recv() => Wake::Command(cmd),
                    _ = self.initialize() => Wake::InitDone,
                }
            } else {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => Wake::Shutdown,
                    cmd = cmd_rx.recv() => Wake::Command(cmd),
                }
            };

            match wake {
                Wake::Command(Some(cmd)) => {
                    self.apply(cmd);
                    pending_init = true;
                }
                // all senders gone or disposal requested
                Wake::Command(None) | Wake::Shutdown => break,
                Wake::InitDone => {}
            }
        }

        self.teardown();
        self.set_state(PlayerState::Idle);
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::SetEntryId(entry_id) => {
                debug!(entry_id = ?entry_id, "entry id changed, reinitializing player");
                self.entry_id = entry_id;
            }
            Command::Retry => {
                debug!("explicit retry requested");
            }
        }
    }

    /// One initialization cycle
    ///
    /// Ordering guarantee: the previous handle is destroyed before anything
    /// else happens, so no two live handles ever coexist. Handle ownership
    /// is updated immediately after construction so that an abandoned cycle
    /// still gets its player torn down on the next pass.
    async fn initialize(&mut self) {
        self.teardown();

        if !self.factory.is_available() {
            self.set_state(PlayerState::AwaitingScript);
            if !self.await_script().await {
                let waited_ms = self.config.script_timeout.as_millis() as u64;
                warn!(waited_ms, "player script never became available");
                self.set_state(PlayerState::Failed(PlayerError::ScriptUnavailable {
                    waited_ms,
                }));
                return;
            }
        }

        // explicit readiness signal from the render surface owner
        self.target.wait_attached().await;

        self.set_state(PlayerState::AwaitingToken);
        let token = match self.tokens.fetch_token(self.entry_id.as_ref()).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "failed to obtain session token");
                self.set_state(PlayerState::Failed(PlayerError::auth(
                    "failed to authenticate with the video service",
                )));
                return;
            }
        };

        let setup = PlayerSetupConfig {
            target_id: self.target.id().to_string(),
            partner_id: self.config.partner_id,
            ui_conf_id: self.config.ui_conf_id,
            ks: token.into_inner(),
            autoplay: self.config.autoplay,
        };
        match self.factory.setup(&setup, self.events.clone()) {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => {
                error!(error = %e, "player construction failed");
                self.set_state(PlayerState::Failed(PlayerError::init(
                    "failed to initialize video player",
                )));
                return;
            }
        }

        let entry = self.effective_entry();
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        match handle.load_media(&entry).await {
            Ok(()) => {
                debug!(entry = %entry, "player ready");
                self.set_state(PlayerState::Ready);
            }
            Err(e) => {
                error!(error = %e, entry = %entry, "media load failed");
                self.set_state(PlayerState::Failed(PlayerError::init(
                    "failed to load the requested media",
                )));
            }
        }
    }

    /// Poll for the vendor script; true once available, false on timeout
    async fn await_script(&self) -> bool {
        let deadline = tokio::time::Instant::now() + self.config.script_timeout;
        loop {
            if self.factory.is_available() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.config.script_poll_interval).await;
        }
    }

    fn effective_entry(&self) -> String {
        self.entry_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| self.config.default_entry_id.clone())
    }

    /// Best-effort destruction of the live handle; errors are logged only
    fn teardown(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            debug!("destroying player instance");
            if let Err(e) = handle.destroy() {
                warn!(error = %e, "error during player teardown");
            }
        }
    }

    fn set_state(&self, state: PlayerState) {
        let _ = self.state_tx.send(state);
    }
}
