//! Polling state machine
//!
//! One recurring task per session. The task sleeps for the cadence of the
//! current status (or a backoff delay after a retryable failure), asks the
//! proxy for an upgrade, and folds the answer into the session. It exits on
//! `confirmed`, on cancel, or on reset, and parks without a timer when
//! retries are exhausted until a manual check succeeds.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::dto::{StampResponse, UpgradeResponse};

use super::api::ProxyApi;
use super::config::PollConfig;
use super::error::ClientError;
use super::session::TimestampSession;
use super::status::SessionStatus;

/// Delay before the next scheduled poll, `None` when nothing is scheduled
///
/// Retryable errors back off until `max_error_attempts` retries have failed;
/// non-retryable errors are never rescheduled.
#[must_use]
pub fn next_delay(session: &TimestampSession, config: &PollConfig) -> Option<Duration> {
    match session.status {
        SessionStatus::Error => {
            let retryable = session
                .last_error
                .as_ref()
                .is_some_and(ClientError::is_retryable);
            let has_work = session.is_stamped() || session.root_hex.is_some();
            if retryable && has_work && session.consecutive_errors <= config.max_error_attempts {
                Some(config.backoff.delay(session.consecutive_errors))
            } else {
                None
            }
        }
        status => status.cadence(&config.cadence),
    }
}

struct Shared {
    session: Mutex<TimestampSession>,
    status_tx: watch::Sender<SessionStatus>,
    epoch_tx: watch::Sender<u64>,
    paused_tx: watch::Sender<bool>,
    resume: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimestampSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum Request {
    Stamp(String),
    Upgrade(Vec<u8>),
}

enum Outcome {
    Stamped(StampResponse),
    Upgraded(UpgradeResponse),
}

/// Drives a [`TimestampSession`] through its lifecycle
#[derive(Clone)]
pub struct PollingMachine {
    api: Arc<dyn ProxyApi>,
    config: PollConfig,
    shared: Arc<Shared>,
}

impl PollingMachine {
    pub fn new(api: Arc<dyn ProxyApi>, config: PollConfig) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        let (epoch_tx, _) = watch::channel(0);
        let (paused_tx, _) = watch::channel(false);
        Self {
            api,
            config,
            shared: Arc::new(Shared {
                session: Mutex::new(TimestampSession::new()),
                status_tx,
                epoch_tx,
                paused_tx,
                resume: Notify::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Snapshot of the session
    #[must_use]
    pub fn session(&self) -> TimestampSession {
        self.shared.lock().clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.shared.lock().status
    }

    #[must_use]
    pub fn status_message(&self) -> String {
        self.shared.lock().status_message(self.config.environment)
    }

    /// Receive every status change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status_tx.subscribe()
    }

    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        next_delay(&self.shared.lock(), &self.config)
    }

    /// The loop is parked waiting for a manual check
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.shared.paused_tx.borrow()
    }

    /// Wait until the session is confirmed or the loop parks
    ///
    /// Returns the status at that point. Resolves immediately if either
    /// already holds.
    pub async fn settled(&self) -> SessionStatus {
        let mut statuses = self.subscribe();
        let mut paused = self.shared.paused_tx.subscribe();
        loop {
            let status = *statuses.borrow_and_update();
            if status.is_terminal() || *paused.borrow_and_update() {
                return status;
            }
            tokio::select! {
                changed = statuses.changed() => {
                    if changed.is_err() {
                        return self.status();
                    }
                }
                changed = paused.changed() => {
                    if changed.is_err() {
                        return self.status();
                    }
                }
            }
        }
    }

    /// Submit a Merkle root through the proxy: `idle → stamping → stamped`
    ///
    /// # Errors
    ///
    /// `InvalidState` if the session already holds a proof; otherwise the
    /// proxy failure, which also moves the session to `error`.
    pub async fn stamp(&self, merkle_root_hex: &str) -> Result<SessionStatus, ClientError> {
        {
            let mut session = self.shared.lock();
            if session.is_stamped() {
                return Err(ClientError::InvalidState(
                    "session already stamped, reset it first".into(),
                ));
            }
            session.begin_stamp(merkle_root_hex);
            self.publish(&session);
        }
        self.poll_once().await
    }

    /// One out-of-band poll; the scheduled cadence is left alone
    ///
    /// A success while the loop is parked resumes it.
    pub async fn check_now(&self) -> Result<SessionStatus, ClientError> {
        let was_parked = {
            let session = self.shared.lock();
            session.status == SessionStatus::Error && next_delay(&session, &self.config).is_none()
        };

        let status = self.poll_once().await?;
        if was_parked {
            tracing::info!(status = %status, "Manual check succeeded, resuming polling");
            self.shared.resume.notify_one();
        }
        Ok(status)
    }

    /// Cancel any running loop and return to `idle`
    pub fn reset(&self) {
        let mut session = self.shared.lock();
        session.reset();
        self.shared.epoch_tx.send_replace(session.epoch);
        self.shared.paused_tx.send_replace(false);
        self.publish(&session);
        tracing::debug!(epoch = session.epoch, "Session reset");
    }

    /// Spawn the poll loop
    pub fn start(&self) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let epoch_rx = self.shared.epoch_tx.subscribe();
        let machine = self.clone();

        let task = tokio::spawn(async move {
            machine.run(shutdown_rx, epoch_rx).await;
        });

        PollHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(&self, mut shutdown: broadcast::Receiver<()>, mut epoch_rx: watch::Receiver<u64>) {
        loop {
            let (delay, status) = {
                let session = self.shared.lock();
                (next_delay(&session, &self.config), session.status)
            };

            match delay {
                Some(delay) => {
                    tracing::debug!(status = %status, delay_secs = delay.as_secs(), "Next poll scheduled");
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        _ = shutdown.recv() => break,
                        _ = epoch_rx.changed() => break,
                    }
                }
                None if status == SessionStatus::Error => {
                    tracing::warn!("Polling paused until a manual check succeeds");
                    self.shared.paused_tx.send_replace(true);
                    tokio::select! {
                        () = self.shared.resume.notified() => {
                            self.shared.paused_tx.send_replace(false);
                            continue;
                        }
                        _ = shutdown.recv() => break,
                        _ = epoch_rx.changed() => break,
                    }
                }
                None => {
                    tracing::info!(status = %status, "Polling finished");
                    break;
                }
            }

            tokio::select! {
                result = self.poll_once() => {
                    if let Err(e) = result {
                        tracing::debug!(error = %e, "Scheduled poll failed");
                    }
                }
                _ = shutdown.recv() => break,
                _ = epoch_rx.changed() => break,
            }
        }
    }

    async fn poll_once(&self) -> Result<SessionStatus, ClientError> {
        let (epoch, request) = {
            let session = self.shared.lock();
            let request = if session.is_stamped() {
                Request::Upgrade(session.ots_proof.clone())
            } else if let Some(root) = &session.root_hex {
                Request::Stamp(root.clone())
            } else {
                return Err(ClientError::InvalidState("no Merkle root to timestamp".into()));
            };
            (session.epoch, request)
        };

        let outcome = match request {
            Request::Stamp(root) => self.api.stamp(&root).await.map(Outcome::Stamped),
            Request::Upgrade(proof) => self.api.upgrade(&proof).await.map(Outcome::Upgraded),
        };

        let mut session = self.shared.lock();
        if session.epoch != epoch {
            return Err(ClientError::InvalidState("session was reset".into()));
        }

        let previous = session.status;
        let now = Instant::now();
        let result = match outcome {
            Ok(Outcome::Stamped(stamped)) => {
                session.apply_stamp(stamped, now);
                Ok(session.status)
            }
            Ok(Outcome::Upgraded(upgraded)) => {
                session.apply_upgrade(upgraded, now, &self.config);
                Ok(session.status)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retryable = e.is_retryable(),
                    attempt = session.consecutive_errors + 1,
                    "Proxy request failed"
                );
                session.record_error(e.clone());
                Err(e)
            }
        };

        if previous != session.status {
            tracing::info!(from = %previous, to = %session.status, "Status changed");
        }
        self.publish(&session);
        result
    }

    fn publish(&self, session: &TimestampSession) {
        self.shared.status_tx.send_replace(session.status);
    }
}

/// Handle to a running poll loop; dropping it stops the loop
pub struct PollHandle {
    shutdown: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop the loop and its pending timer
    pub fn cancel(&self) {
        let _ = self.shutdown.send(());
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the loop to exit
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "Poll loop panicked");
                }
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
