//! Subscription supervision and the latest-snapshot cell.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::backoff::Backoff;
use super::decode::decode_update;
use super::transport::{ClusterTransport, MessageStream, RawMessage};
use super::{ConnectionStatus, DecodeError, SubscriptionParams, TransportError, CLUSTER_UPDATE_EVENT};
use crate::error::VizError;
use crate::models::ClusterUpdate;
use crate::quality::Ladders;

/// Tunables for a [`StreamClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// SSE event name carrying snapshots. Unnamed events are accepted too.
    pub event_name: String,
    /// Quiet period after which the channel is reported silent. Zero
    /// disables the silence check.
    pub silence_timeout: Duration,
    /// Reconnect after transport errors.
    pub reconnect: bool,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Consecutive failed attempts before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Ladders for deriving tiers the producer left out.
    pub ladders: Ladders,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            event_name: CLUSTER_UPDATE_EVENT.to_string(),
            silence_timeout: Duration::from_secs(30),
            reconnect: true,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            max_attempts: None,
            ladders: Ladders::default(),
        }
    }
}

/// Identifies one opened subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    generation: u64,
    params: SubscriptionParams,
}

impl SubscriptionHandle {
    pub fn params(&self) -> &SubscriptionParams {
        &self.params
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Point-in-time view of the client for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamState {
    pub status: ConnectionStatus,
    pub params: Option<SubscriptionParams>,
    /// The last message failed to decode; the snapshot shown is older.
    pub stale: bool,
    pub last_error: Option<String>,
    pub accepted: u64,
    pub rejected: u64,
    pub out_of_order: u64,
}

impl StreamState {
    /// Connectivity indicator: live and the last message was usable.
    pub fn connected(&self) -> bool {
        self.status.is_connected() && !self.stale
    }
}

struct Shared {
    generation: u64,
    latest: Option<Arc<ClusterUpdate>>,
    latest_generation: u64,
    state: StreamState,
}

struct ActiveTask {
    handle: SubscriptionHandle,
    join: JoinHandle<()>,
}

/// Holds at most one live subscription and the newest accepted snapshot.
pub struct StreamClient {
    transport: Arc<dyn ClusterTransport>,
    options: ClientOptions,
    shared: Arc<Mutex<Shared>>,
    revision: Arc<watch::Sender<u64>>,
    active: tokio::sync::Mutex<Option<ActiveTask>>,
}

impl StreamClient {
    pub fn new(transport: Arc<dyn ClusterTransport>, options: ClientOptions) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            transport,
            options,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                latest: None,
                latest_generation: 0,
                state: StreamState {
                    status: ConnectionStatus::Idle,
                    params: None,
                    stale: false,
                    last_error: None,
                    accepted: 0,
                    rejected: 0,
                    out_of_order: 0,
                },
            })),
            revision: Arc::new(revision),
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Open a subscription, replacing any other.
    ///
    /// Re-opening with the parameters of a running subscription returns its
    /// handle untouched. Otherwise the running task is torn down and awaited
    /// before the new channel connects. The held snapshot survives unless the
    /// source id changes.
    pub async fn open(&self, params: SubscriptionParams) -> Result<SubscriptionHandle, VizError> {
        params.validate()?;

        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if current.handle.params == params && !current.join.is_finished() {
                return Ok(current.handle.clone());
            }
        }
        if let Some(previous) = active.take() {
            stop_task(previous).await;
        }

        let generation = {
            let mut shared = self.shared.lock();
            shared.generation += 1;
            let source_changed = shared
                .state
                .params
                .as_ref()
                .map_or(true, |p| p.source_id != params.source_id);
            if source_changed {
                shared.latest = None;
            }
            shared.state.status = ConnectionStatus::Connecting;
            shared.state.params = Some(params.clone());
            shared.state.stale = false;
            shared.state.last_error = None;
            shared.generation
        };
        self.bump();

        let handle = SubscriptionHandle {
            generation,
            params: params.clone(),
        };
        let task = SubscriptionTask {
            generation,
            params,
            transport: Arc::clone(&self.transport),
            options: self.options.clone(),
            shared: Arc::clone(&self.shared),
            revision: Arc::clone(&self.revision),
        };
        log::info!("Opening subscription #{} for {}", generation, handle.params);
        let join = tokio::spawn(task.run());
        *active = Some(ActiveTask {
            handle: handle.clone(),
            join,
        });
        Ok(handle)
    }

    /// Tear down `handle` if it is still the active subscription.
    ///
    /// Returns once the channel is dropped. Closing a stale or already closed
    /// handle does nothing.
    pub async fn close(&self, handle: &SubscriptionHandle) {
        let mut active = self.active.lock().await;
        if active.as_ref().map(|a| &a.handle) != Some(handle) {
            return;
        }
        if let Some(task) = active.take() {
            self.mark_closed();
            stop_task(task).await;
        }
    }

    /// Tear down whatever is active.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        if let Some(task) = active.take() {
            self.mark_closed();
            stop_task(task).await;
        }
    }

    /// Newest accepted snapshot.
    pub fn latest(&self) -> Option<Arc<ClusterUpdate>> {
        self.shared.lock().latest.clone()
    }

    pub fn state(&self) -> StreamState {
        self.shared.lock().state.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.lock().state.status
    }

    /// Fires whenever the snapshot or status changes.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current change counter.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn mark_closed(&self) {
        {
            let mut shared = self.shared.lock();
            shared.generation += 1;
            shared.state.status = ConnectionStatus::Closed;
        }
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Some(task) = self.active.get_mut().take() {
            self.shared.lock().generation += 1;
            task.join.abort();
        }
    }
}

async fn stop_task(task: ActiveTask) {
    task.join.abort();
    // Cancellation drops the task's channel; wait for it.
    let _ = task.join.await;
    log::debug!("Subscription #{} stopped", task.handle.generation);
}

// =============================================================================
// Subscription task
// =============================================================================

struct SubscriptionTask {
    generation: u64,
    params: SubscriptionParams,
    transport: Arc<dyn ClusterTransport>,
    options: ClientOptions,
    shared: Arc<Mutex<Shared>>,
    revision: Arc<watch::Sender<u64>>,
}

impl SubscriptionTask {
    async fn run(self) {
        let mut backoff = Backoff::new(
            self.options.backoff_base,
            self.options.backoff_max,
            self.options.max_attempts,
        );

        loop {
            self.update(|state| state.status = ConnectionStatus::Connecting);
            let error = match self.transport.connect(&self.params).await {
                Ok(stream) => self.pump(stream, &mut backoff).await,
                Err(e) => e,
            };

            log::warn!("Subscription #{} for {} lost: {}", self.generation, self.params, error);
            self.update(|state| {
                state.status = ConnectionStatus::Disconnected;
                state.last_error = Some(error.to_string());
            });

            if !self.options.reconnect {
                break;
            }
            match backoff.next_delay() {
                Some(delay) => {
                    log::info!(
                        "Reconnecting subscription #{} in {:?} (attempt {})",
                        self.generation,
                        delay,
                        backoff.failures()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    log::warn!(
                        "Giving up on subscription #{} after {} attempts",
                        self.generation,
                        backoff.failures()
                    );
                    break;
                }
            }
        }
    }

    /// Read until the channel fails, returning why it ended.
    async fn pump(&self, mut stream: MessageStream, backoff: &mut Backoff) -> TransportError {
        loop {
            let next = if self.options.silence_timeout.is_zero() {
                Ok(stream.next().await)
            } else {
                tokio::time::timeout(self.options.silence_timeout, stream.next()).await
            };
            match next {
                Err(_) => {
                    let went_silent = self.update_if(|state| {
                        let live = matches!(state.status, ConnectionStatus::Live | ConnectionStatus::Connecting);
                        if live {
                            state.status = ConnectionStatus::Silent;
                        }
                        live
                    });
                    if went_silent {
                        log::warn!(
                            "Subscription #{} silent for {:?}",
                            self.generation,
                            self.options.silence_timeout
                        );
                    }
                }
                Ok(None) => return TransportError::Closed,
                Ok(Some(Err(e))) => return e,
                Ok(Some(Ok(message))) => {
                    if self.handle_message(message) {
                        backoff.reset();
                    }
                }
            }
        }
    }

    /// Decode and offer one frame. Returns true when it was a snapshot frame
    /// that decoded.
    fn handle_message(&self, message: RawMessage) -> bool {
        let is_snapshot = match message.event.as_deref() {
            None | Some("message") => true,
            Some(name) => name == self.options.event_name,
        };
        if !is_snapshot {
            log::debug!("Ignoring '{:?}' frame on subscription #{}", message.event, self.generation);
            return false;
        }

        match decode_update(&message.data, &self.options.ladders).and_then(|u| self.check_source(u)) {
            Ok(update) => {
                self.accept(update);
                true
            }
            Err(e) => {
                log::warn!("Discarding message on subscription #{}: {}", self.generation, e);
                self.update(|state| {
                    state.stale = true;
                    state.rejected += 1;
                    state.last_error = Some(e.to_string());
                });
                false
            }
        }
    }

    /// Snapshots naming no device belong to this subscription; ones naming
    /// another device are rejected.
    fn check_source(&self, mut update: ClusterUpdate) -> Result<ClusterUpdate, DecodeError> {
        if update.source_id.is_empty() {
            update.source_id = self.params.source_id.clone();
        } else if update.source_id != self.params.source_id {
            return Err(DecodeError::Invalid(format!(
                "snapshot for source '{}' on subscription to '{}'",
                update.source_id, self.params.source_id
            )));
        }
        Ok(update)
    }

    fn accept(&self, update: ClusterUpdate) {
        {
            let mut shared = self.shared.lock();
            if shared.generation != self.generation {
                return;
            }
            if shared.latest_generation == self.generation {
                if let Some(current) = shared.latest.as_ref() {
                    if !update.supersedes(current) {
                        log::debug!(
                            "Dropping out-of-order snapshot {} (ts {}) behind {} (ts {})",
                            update.update_id,
                            update.timestamp,
                            current.update_id,
                            current.timestamp
                        );
                        shared.state.out_of_order += 1;
                        return;
                    }
                }
            }
            if !update.is_consistent() {
                log::warn!(
                    "Snapshot {} zone counts sum to {} but total is {}; mismatched zones {:?}",
                    update.update_id,
                    update.zone_point_sum(),
                    update.total_points,
                    update.count_mismatches()
                );
            }
            log::debug!(
                "Accepted snapshot {} with {} zones, {} points",
                update.update_id,
                update.zones.len(),
                update.total_points
            );
            shared.latest = Some(Arc::new(update));
            shared.latest_generation = self.generation;
            shared.state.status = ConnectionStatus::Live;
            shared.state.stale = false;
            shared.state.last_error = None;
            shared.state.accepted += 1;
        }
        self.revision.send_modify(|r| *r += 1);
    }

    /// Apply `f` to the state if this task is still current, then notify.
    fn update(&self, f: impl FnOnce(&mut StreamState)) {
        self.update_if(|state| {
            f(state);
            true
        });
    }

    /// Like [`Self::update`], but notifies only when `f` reports a change.
    fn update_if(&self, f: impl FnOnce(&mut StreamState) -> bool) -> bool {
        let changed = {
            let mut shared = self.shared.lock();
            if shared.generation != self.generation {
                return false;
            }
            f(&mut shared.state)
        };
        if changed {
            self.revision.send_modify(|r| *r += 1);
        }
        changed
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
