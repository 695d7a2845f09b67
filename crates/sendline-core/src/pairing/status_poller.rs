use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::gateway::ConnectionStatus;
use crate::pairing::PairingController;
use crate::timer::PollTimer;

/// Polls the collaborator's status endpoint on a fixed interval while a
/// pairing attempt is in progress and feeds each result into the
/// controller.
///
/// Applying a status is idempotent: an unchanged report is dropped before
/// it reaches the controller. A single failed poll is swallowed and
/// retried; only `max_status_failures` consecutive failures end the
/// attempt. The controller stops this poller exactly when it reaches
/// `Connected` or `Idle`.
pub struct StatusPoller {
    timer: PollTimer,
    failures: Arc<AtomicU32>,
    last: Arc<Mutex<Option<ConnectionStatus>>>,
}

impl StatusPoller {
    pub fn new() -> Self {
        Self {
            timer: PollTimer::new(),
            failures: Arc::new(AtomicU32::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn start(&mut self, controller: PairingController) {
        self.failures.store(0, Ordering::SeqCst);
        *self.last.lock() = None;

        let interval = controller.config().status_poll_interval;
        let max_failures = controller.config().max_status_failures;
        let failures = self.failures.clone();
        let last = self.last.clone();

        self.timer.restart(interval, move || {
            let controller = controller.clone();
            let failures = failures.clone();
            let last = last.clone();
            async move {
                let account_id = controller.account_id();
                match controller
                    .gateway()
                    .get_connection_status(&account_id)
                    .await
                {
                    Ok(status) => {
                        failures.store(0, Ordering::SeqCst);
                        {
                            let mut last = last.lock();
                            if last.as_ref() == Some(&status) {
                                return;
                            }
                            *last = Some(status.clone());
                        }
                        controller.apply_status(status);
                    }
                    Err(err) => {
                        let observed = failures.fetch_add(1, Ordering::SeqCst) + 1;
                        if observed >= max_failures {
                            warn!(
                                "status poll for {account_id} failed {observed} times, \
                                 ending the pairing attempt: {err:#}"
                            );
                            controller.handle_status_polling_exhausted();
                        } else {
                            debug!(
                                "status poll for {account_id} failed \
                                 ({observed}/{max_failures}), retrying: {err:#}"
                            );
                        }
                    }
                }
            }
        });
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new()
    }
}
