use std::sync::mpsc::Sender;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::events::CoreEvent;
use crate::gateway::{ConnectionStatus, MessagingGateway};
use crate::models::{now_ms, PairingSession, PairingState};
use crate::pairing::StatusPoller;
use crate::timer::PollTimer;

/// Owns the device-pairing state machine for one messaging account.
///
/// The operator requests a connection, the controller shows a pairing
/// code and rotates it until the device scans it, and the status poller
/// drives the remaining transitions. The handle is cheap to clone; timer
/// tasks hold clones of it.
///
/// Transition sources are strictly: operator intents (`request_connection`,
/// `cancel`), the rotation timer, and statuses fed in by `StatusPoller`.
/// A transient poll error changes nothing; only an explicit terminal
/// status or a cancel ends an attempt.
#[derive(Clone)]
pub struct PairingController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    gateway: Arc<dyn MessagingGateway>,
    config: CoreConfig,
    events: Sender<CoreEvent>,
    session: Mutex<PairingSession>,
    rotation: Mutex<PollTimer>,
    status: Mutex<StatusPoller>,
}

impl PairingController {
    pub fn new(
        account_id: impl Into<String>,
        gateway: Arc<dyn MessagingGateway>,
        config: CoreConfig,
        events: Sender<CoreEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                gateway,
                config,
                events,
                session: Mutex::new(PairingSession::idle(account_id)),
                rotation: Mutex::new(PollTimer::new()),
                status: Mutex::new(StatusPoller::new()),
            }),
        }
    }

    /// Operator intent: start a pairing attempt. A request while one is
    /// already in progress is a no-op, so a double click cannot create two
    /// pairing sessions.
    pub async fn request_connection(&self) -> Result<(), CoreError> {
        {
            let mut session = self.inner.session.lock();
            if matches!(
                session.state,
                PairingState::AwaitingScan | PairingState::DeviceConnecting
            ) {
                debug!(
                    "pairing already in progress for {}, ignoring request",
                    session.account_id
                );
                return Ok(());
            }
            session.state = PairingState::AwaitingScan;
            session.user_initiated = true;
            session.pairing_code = None;
            session.code_issued_at = None;
        }

        let account_id = self.account_id();
        match self.inner.gateway.request_pairing_code(&account_id).await {
            Ok(issued) => {
                {
                    let mut session = self.inner.session.lock();
                    // Cancelled while the request was in flight.
                    if session.state != PairingState::AwaitingScan {
                        return Ok(());
                    }
                    session.pairing_code = Some(issued.code);
                    session.code_issued_at = Some(now_ms());
                }
                info!("pairing code issued for {account_id}, awaiting scan");
                self.start_rotation();
                self.inner.status.lock().start(self.clone());
                Ok(())
            }
            Err(err) => {
                let reason = format!("{err:#}");
                {
                    let mut session = self.inner.session.lock();
                    session.state = PairingState::Idle;
                    session.user_initiated = false;
                }
                warn!("pairing code request for {account_id} failed: {reason}");
                let _ = self.inner.events.send(CoreEvent::PairingFailed {
                    account_id,
                    reason: reason.clone(),
                });
                Err(CoreError::Pairing { reason })
            }
        }
    }

    /// Operator intent: abandon the attempt. Stops all timers first, then
    /// asks the collaborator to release the pending session so the stale
    /// code can never be scanned into a silent success.
    pub async fn cancel(&self) -> Result<(), CoreError> {
        {
            let mut session = self.inner.session.lock();
            if !matches!(
                session.state,
                PairingState::AwaitingScan | PairingState::DeviceConnecting
            ) {
                return Ok(());
            }
            session.state = PairingState::Cancelled;
            session.pairing_code = None;
            session.code_issued_at = None;
            session.user_initiated = false;
        }
        self.inner.rotation.lock().stop();
        self.inner.status.lock().stop();

        let account_id = self.account_id();
        if let Err(err) = self.inner.gateway.cancel_pairing(&account_id).await {
            // The local attempt still ends; the collaborator expires the
            // orphaned session on its own TTL.
            warn!("cancel_pairing for {account_id} failed: {err:#}");
        }
        info!("pairing attempt for {account_id} cancelled");

        let mut session = self.inner.session.lock();
        if session.state == PairingState::Cancelled {
            session.state = PairingState::Idle;
        }
        Ok(())
    }

    /// One-shot status refresh for screens that mount against a possibly
    /// already-connected account. Applies silently: `user_initiated` stays
    /// false, so no success signal is ever shown for a mere refresh.
    pub async fn refresh_status(&self) {
        let account_id = self.account_id();
        match self.inner.gateway.get_connection_status(&account_id).await {
            Ok(status) => self.apply_status(status),
            Err(err) => debug!("status refresh for {account_id} failed: {err:#}"),
        }
    }

    /// Apply a collaborator status to the state machine. Fed by
    /// `StatusPoller` and by `refresh_status`; idempotent per status.
    pub fn apply_status(&self, status: ConnectionStatus) {
        let mut session = self.inner.session.lock();
        match (session.state, status) {
            (PairingState::AwaitingScan, ConnectionStatus::QrReady { code }) => {
                // Rotation owns the displayed code; the poll only seeds it
                // when the initial request has not landed yet.
                if session.pairing_code.is_none() {
                    session.pairing_code = Some(code);
                    session.code_issued_at = Some(now_ms());
                }
            }
            (PairingState::AwaitingScan, ConnectionStatus::Connecting) => {
                info!(
                    "device acknowledged pairing code for {}, establishing session",
                    session.account_id
                );
                session.state = PairingState::DeviceConnecting;
                drop(session);
                // The code can no longer be re-scanned; stop rotating it.
                self.inner.rotation.lock().stop();
            }
            (
                PairingState::AwaitingScan | PairingState::DeviceConnecting,
                ConnectionStatus::Connected,
            ) => {
                session.state = PairingState::Connected;
                let was_user_initiated = session.user_initiated;
                session.user_initiated = false;
                if !was_user_initiated {
                    session.pairing_code = None;
                    session.code_issued_at = None;
                }
                let account_id = session.account_id.clone();
                drop(session);
                self.inner.rotation.lock().stop();
                self.inner.status.lock().stop();
                info!("account {account_id} connected");
                if was_user_initiated {
                    let _ = self
                        .inner
                        .events
                        .send(CoreEvent::PairingSucceeded {
                            account_id,
                        });
                    // Leave the success state visible briefly, then return
                    // to the neutral connected display.
                    let controller = self.clone();
                    let delay = self.inner.config.success_display;
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let mut session = controller.inner.session.lock();
                        if session.state == PairingState::Connected {
                            session.pairing_code = None;
                            session.code_issued_at = None;
                        }
                    });
                }
            }
            (
                PairingState::AwaitingScan | PairingState::DeviceConnecting,
                ConnectionStatus::Disconnected,
            ) => {
                drop(session);
                self.fail_pairing("collaborator reported the session disconnected");
            }
            (PairingState::Idle, ConnectionStatus::Connected) => {
                // Refresh of an already-connected account outside any
                // pairing attempt; silent by definition.
                session.state = PairingState::Connected;
                session.user_initiated = false;
            }
            (state, status) => {
                debug!("ignoring status {status:?} in state {state:?}");
            }
        }
    }

    /// Terminal failure fed by `StatusPoller` after repeated poll errors.
    pub(crate) fn handle_status_polling_exhausted(&self) {
        self.fail_pairing("status polling failed repeatedly");
    }

    fn fail_pairing(&self, reason: &str) {
        self.inner.rotation.lock().stop();
        self.inner.status.lock().stop();
        let (was_user_initiated, account_id) = {
            let mut session = self.inner.session.lock();
            if !matches!(
                session.state,
                PairingState::AwaitingScan | PairingState::DeviceConnecting
            ) {
                return;
            }
            // Failed is a pass-through state; the session settles on Idle
            // so a new attempt can start immediately.
            session.state = PairingState::Idle;
            session.pairing_code = None;
            session.code_issued_at = None;
            let was_user_initiated = session.user_initiated;
            session.user_initiated = false;
            (was_user_initiated, session.account_id.clone())
        };
        warn!("pairing attempt for {account_id} failed: {reason}");
        if was_user_initiated {
            let _ = self.inner.events.send(CoreEvent::PairingFailed {
                account_id,
                reason: reason.to_string(),
            });
        }
    }

    /// Stop all owned timers and reset to `Idle`. Called when the
    /// connection screen unmounts; nothing may keep polling afterwards.
    pub fn detach(&self) {
        self.inner.rotation.lock().stop();
        self.inner.status.lock().stop();
        let mut session = self.inner.session.lock();
        let account_id = session.account_id.clone();
        *session = PairingSession::idle(account_id);
    }

    fn start_rotation(&self) {
        let controller = self.clone();
        let interval = self.inner.config.code_rotation;
        self.inner.rotation.lock().restart(interval, move || {
            let controller = controller.clone();
            async move { controller.rotate_code().await }
        });
    }

    /// One rotation tick: fetch a fresh code and swap it in, unless the
    /// collaborator returned the one already displayed.
    async fn rotate_code(&self) {
        let account_id = {
            let session = self.inner.session.lock();
            if session.state != PairingState::AwaitingScan {
                return;
            }
            session.account_id.clone()
        };
        match self.inner.gateway.request_pairing_code(&account_id).await {
            Ok(issued) => {
                let mut session = self.inner.session.lock();
                if session.state != PairingState::AwaitingScan {
                    return;
                }
                if session.pairing_code.as_deref() != Some(issued.code.as_str()) {
                    session.pairing_code = Some(issued.code);
                    session.code_issued_at = Some(now_ms());
                }
            }
            Err(err) => {
                debug!("pairing code rotation for {account_id} failed, retrying next cycle: {err:#}");
            }
        }
    }

    /// Snapshot of the current session for rendering.
    pub fn session(&self) -> PairingSession {
        self.inner.session.lock().clone()
    }

    pub fn account_id(&self) -> String {
        self.inner.session.lock().account_id.clone()
    }

    pub(crate) fn gateway(&self) -> Arc<dyn MessagingGateway> {
        self.inner.gateway.clone()
    }

    pub(crate) fn config(&self) -> &CoreConfig {
        &self.inner.config
    }
}
