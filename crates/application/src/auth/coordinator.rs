//! Single-flight refresh coordination.
//!
//! A request that receives 401 is *admitted* here. Exactly one admitted
//! request starts a refresh cycle; every other request that arrives while the
//! cycle is running is queued as a [`PendingRequest`] and resumed in FIFO
//! order when the cycle ends.
//!
//! All state transitions, and the token store writes that must be atomic
//! with them, happen while holding the coordinator lock.

use std::collections::VecDeque;

use practicum_domain::{ApiRequest, ApiResponse, Credentials};
use tokio::sync::{Mutex, oneshot};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::ports::{TokenStore, TokenStoreError};

/// Receives the final outcome of a queued request.
pub type PendingReceiver = oneshot::Receiver<ApiResult<ApiResponse>>;

/// A caller suspended until the current refresh cycle resolves.
#[derive(Debug)]
pub struct PendingRequest {
    /// The original request, resent verbatim on success.
    pub request: ApiRequest,
    /// Correlation id of the original call.
    pub request_id: Uuid,
    /// Delivers the retried response or the failure.
    pub responder: oneshot::Sender<ApiResult<ApiResponse>>,
}

/// Outcome of admitting a 401 into the coordinator.
#[derive(Debug)]
pub enum Admission {
    /// The caller must run a refresh cycle. Its own request is already at the
    /// head of the queue.
    Refresh {
        /// Identifies the cycle when it completes.
        cycle: u64,
        /// Session epoch when the cycle started.
        epoch: u64,
        /// Refresh token to present.
        refresh_token: String,
        /// Outcome of the caller's own request.
        receiver: PendingReceiver,
    },
    /// A cycle is running; the request was queued.
    Queued(PendingReceiver),
    /// A newer access token than the one the request used is stored already.
    RetryWith(String),
    /// No refresh token is available.
    NoRefreshToken,
}

/// Queue drained at the end of a successful cycle.
#[derive(Debug)]
pub struct DrainedQueue {
    /// Token to retry with; `None` if the session ended meanwhile.
    pub access_token: Option<String>,
    /// Queued requests in arrival order.
    pub pending: Vec<PendingRequest>,
}

#[derive(Debug, Default)]
struct RefreshState {
    cycle: Option<u64>,
    next_cycle: u64,
    epoch: u64,
    queue: VecDeque<PendingRequest>,
}

impl RefreshState {
    fn enqueue(&mut self, request: &ApiRequest, request_id: Uuid) -> PendingReceiver {
        let (responder, receiver) = oneshot::channel();
        self.queue.push_back(PendingRequest {
            request: request.clone(),
            request_id,
            responder,
        });
        receiver
    }

    fn drain(&mut self) -> Vec<PendingRequest> {
        self.cycle = None;
        self.queue.drain(..).collect()
    }
}

/// Owns the refresh state machine (`IDLE` / `REFRESHING`) and its queue.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a refresh cycle is running.
    pub async fn is_refreshing(&self) -> bool {
        self.state.lock().await.cycle.is_some()
    }

    /// Number of requests waiting on the current cycle.
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Admits a request that received 401 after being sent with `sent_with`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub async fn admit(
        &self,
        request: &ApiRequest,
        request_id: Uuid,
        sent_with: Option<&str>,
        store: &dyn TokenStore,
    ) -> Result<Admission, TokenStoreError> {
        let mut state = self.state.lock().await;

        if state.cycle.is_some() {
            return Ok(Admission::Queued(state.enqueue(request, request_id)));
        }

        let stored = store.load().await?;

        // The 401 belongs to a token that has been replaced since.
        if let Some(current) = stored.as_ref().map(Credentials::access_token)
            && Some(current) != sent_with
        {
            return Ok(Admission::RetryWith(current.to_string()));
        }

        let Some(refresh_token) = stored
            .as_ref()
            .and_then(Credentials::usable_refresh_token)
            .map(str::to_string)
        else {
            return Ok(Admission::NoRefreshToken);
        };

        let cycle = state.next_cycle;
        state.next_cycle += 1;
        state.cycle = Some(cycle);
        let receiver = state.enqueue(request, request_id);

        Ok(Admission::Refresh {
            cycle,
            epoch: state.epoch,
            refresh_token,
            receiver,
        })
    }

    /// Ends `cycle` successfully and drains the queue.
    ///
    /// `fresh` is stored unless a login replaced the session while the
    /// refresh was in flight, in which case the queue resumes with the newer
    /// stored token. Returns `None` if the cycle was aborted by a logout.
    ///
    /// # Errors
    ///
    /// Returns an error if the new credentials cannot be stored; the cycle is
    /// left running so the caller can fail it.
    pub async fn finish_success(
        &self,
        cycle: u64,
        epoch: u64,
        fresh: &Credentials,
        store: &dyn TokenStore,
    ) -> Result<Option<DrainedQueue>, TokenStoreError> {
        let mut state = self.state.lock().await;

        if state.cycle != Some(cycle) {
            return Ok(None);
        }

        let access_token = if state.epoch == epoch {
            store.save(fresh).await?;
            Some(fresh.access_token().to_string())
        } else {
            store
                .load()
                .await?
                .map(|credentials| credentials.access_token().to_string())
        };

        Ok(Some(DrainedQueue {
            access_token,
            pending: state.drain(),
        }))
    }

    /// Ends `cycle` as failed: clears the store and drains the queue.
    ///
    /// Returns `None` if the cycle was already aborted by a logout.
    pub async fn finish_failure(
        &self,
        cycle: u64,
        store: &dyn TokenStore,
    ) -> Option<(Vec<PendingRequest>, Result<(), TokenStoreError>)> {
        let mut state = self.state.lock().await;

        if state.cycle != Some(cycle) {
            return None;
        }

        let cleared = store.clear().await;
        state.epoch += 1;
        Some((state.drain(), cleared))
    }

    /// Starts a new session: stores `credentials` and invalidates any refresh
    /// result still in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials cannot be stored.
    pub async fn begin_session(
        &self,
        credentials: &Credentials,
        store: &dyn TokenStore,
    ) -> Result<(), TokenStoreError> {
        let mut state = self.state.lock().await;
        store.save(credentials).await?;
        state.epoch += 1;
        Ok(())
    }

    /// Ends the session: clears the store, aborts any running cycle and
    /// drains its queue.
    ///
    /// The queue is drained and the state reset even if clearing the store
    /// fails; the store result is returned alongside.
    pub async fn end_session(
        &self,
        store: &dyn TokenStore,
    ) -> (Vec<PendingRequest>, Result<(), TokenStoreError>) {
        let mut state = self.state.lock().await;
        let cleared = store.clear().await;
        state.epoch += 1;
        (state.drain(), cleared)
    }
}
