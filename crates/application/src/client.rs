//! Authenticated API client.
//!
//! [`AuthenticatedHttpClient`] attaches the stored access token to every
//! call and recovers once from an expired token: the first caller to see a
//! 401 runs a refresh cycle, concurrent callers queue behind it, and every
//! one of them is retried exactly once with the new token.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use practicum_domain::response::parse_body;
use practicum_domain::{
    ApiRequest, ApiResponse, ClientSettings, Credentials, HttpMethod, LoginRequest,
    LoginResponse, RefreshRequest, RefreshResponse, RequestOptions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    Admission, LogoutReason, PendingReceiver, PendingRequest, RefreshCoordinator, SessionState,
};
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::ports::{HttpTransport, OutboundRequest, TokenStore, TransportError, TransportResponse};

/// Login endpoint, relative to the base URL.
pub const LOGIN_PATH: &str = "/auth/login";

/// Token refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Result of a single attempt that reached the server.
enum Attempt {
    Done(ApiResponse),
    Unauthorized,
}

/// HTTP client for the practicum API with transparent token refresh.
///
/// Cloning is cheap; all clones share the same token store, refresh
/// coordinator and session signal.
///
/// # Example
///
/// ```ignore
/// let client = AuthenticatedHttpClient::new(
///     ReqwestTransport::new()?,
///     Arc::new(FileTokenStore::default_location()?),
///     ClientSettings::default(),
/// )?;
///
/// client.login("a@b.com", "secret").await?;
/// let projects = client.get("/projects").await?;
/// ```
pub struct AuthenticatedHttpClient<T> {
    inner: Arc<ClientInner<T>>,
}

impl<T> Clone for AuthenticatedHttpClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<T> {
    transport: T,
    store: Arc<dyn TokenStore>,
    settings: ClientSettings,
    coordinator: RefreshCoordinator,
    session: watch::Sender<SessionState>,
}

impl<T: HttpTransport + 'static> AuthenticatedHttpClient<T> {
    /// Creates a client over `transport`, persisting tokens in `store`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the settings are invalid.
    pub fn new(
        transport: T,
        store: Arc<dyn TokenStore>,
        settings: ClientSettings,
    ) -> ApiResult<Self> {
        settings.validate()?;
        let (session, _) = watch::channel(SessionState::default());

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                store,
                settings,
                coordinator: RefreshCoordinator::new(),
                session,
            }),
        })
    }

    /// Returns the settings this client was built with.
    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    /// Returns the current session state.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.inner.session.borrow().clone()
    }

    /// Subscribes to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    /// Returns true while a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.borrow().is_signed_in()
    }

    /// Number of requests queued behind a running token refresh.
    pub async fn pending_requests(&self) -> usize {
        self.inner.coordinator.pending_len().await
    }

    /// Marks the session as signed in if the store already holds
    /// credentials from a previous run.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub async fn restore_session(&self) -> ApiResult<bool> {
        let restored = self.inner.store.load().await?.is_some();
        if restored {
            self.inner
                .session
                .send_replace(SessionState::SignedIn { user: None });
            debug!("restored session from token store");
        }
        Ok(restored)
    }

    /// Issues a request against the API.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::execute`].
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        options: Option<RequestOptions>,
    ) -> ApiResult<ApiResponse> {
        let mut request = ApiRequest::new(method, path).with_options(options.unwrap_or_default());
        request.body = body;
        self.execute(request).await
    }

    /// Executes a request descriptor.
    ///
    /// # Errors
    ///
    /// - `ApiError::Transport` on network failure or timeout
    /// - `ApiError::Http` for any non-2xx status other than a recoverable 401
    /// - `ApiError::Auth` if the session could not be recovered
    #[instrument(
        name = "api_request",
        skip(self, request),
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.inner.execute(request).await
    }

    /// Executes a request and deserializes the response body.
    ///
    /// # Errors
    ///
    /// As [`AuthenticatedHttpClient::execute`], plus `ApiError::Json` if the
    /// body does not match `R`.
    pub async fn request_json<R: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<R> {
        self.execute(request)
            .await?
            .json()
            .map_err(|e| ApiError::Json(e.to_string()))
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::execute`].
    pub async fn get(&self, path: &str) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::get(path)).await
    }

    /// `GET path`, deserializing the body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::request_json`].
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> ApiResult<R> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::execute`].
    pub async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> ApiResult<ApiResponse> {
        self.with_body(HttpMethod::Post, path, body).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::execute`].
    pub async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> ApiResult<ApiResponse> {
        self.with_body(HttpMethod::Put, path, body).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::execute`].
    pub async fn patch<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiResponse> {
        self.with_body(HttpMethod::Patch, path, body).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedHttpClient::execute`].
    pub async fn delete(&self, path: &str) -> ApiResult<ApiResponse> {
        self.execute(ApiRequest::new(HttpMethod::Delete, path)).await
    }

    async fn with_body<B: Serialize + Sync>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> ApiResult<ApiResponse> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Json(e.to_string()))?;
        self.execute(ApiRequest::new(method, path).with_body(body))
            .await
    }

    /// Signs in and stores the issued credentials.
    ///
    /// Requests already in flight keep the token they were sent with.
    ///
    /// # Errors
    ///
    /// - `ApiError::Http` if the auth service rejects the credentials
    /// - `ApiError::Transport` on network failure or timeout
    /// - `ApiError::Json` if the response body is malformed
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Credentials> {
        self.inner.login(email, password).await
    }

    /// Ends the session: clears the stored tokens, rejects requests waiting
    /// on a refresh and publishes `SessionState::Ended`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store could not be cleared; the session
    /// is ended regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ApiResult<()> {
        self.inner
            .end_session(LogoutReason::UserRequested)
            .await
            .map_err(ApiError::from)
    }
}

impl<T: HttpTransport + 'static> ClientInner<T> {
    async fn execute(self: &Arc<Self>, request: ApiRequest) -> ApiResult<ApiResponse> {
        request.validate()?;
        let request_id = Uuid::now_v7();
        let token = self
            .store
            .load()
            .await?
            .map(|credentials| credentials.access_token().to_string());

        match self.attempt(&request, request_id, token.as_deref()).await? {
            Attempt::Done(response) => Ok(response),
            Attempt::Unauthorized => {
                debug!(%request_id, "received 401, recovering session");
                self.recover(&request, request_id, token.as_deref()).await
            }
        }
    }

    async fn recover(
        self: &Arc<Self>,
        request: &ApiRequest,
        request_id: Uuid,
        sent_with: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let admission = self
            .coordinator
            .admit(request, request_id, sent_with, &*self.store)
            .await?;

        match admission {
            Admission::RetryWith(token) => {
                debug!(%request_id, "token was refreshed meanwhile, retrying");
                self.retry(request, request_id, &token).await
            }
            Admission::NoRefreshToken => {
                self.force_logout(LogoutReason::MissingRefreshToken).await;
                Err(AuthFailure::MissingRefreshToken.into())
            }
            Admission::Queued(receiver) => {
                debug!(%request_id, "queued behind running token refresh");
                Self::outcome(receiver).await
            }
            Admission::Refresh {
                cycle,
                epoch,
                refresh_token,
                receiver,
            } => {
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    inner.run_refresh_cycle(cycle, epoch, refresh_token).await;
                });
                Self::outcome(receiver).await
            }
        }
    }

    async fn outcome(receiver: PendingReceiver) -> ApiResult<ApiResponse> {
        receiver
            .await
            .unwrap_or_else(|_| Err(AuthFailure::SessionEnded.into()))
    }

    async fn run_refresh_cycle(self: &Arc<Self>, cycle: u64, epoch: u64, refresh_token: String) {
        info!(cycle, "refreshing access token");

        let fresh = match self.call_refresh(&refresh_token).await {
            Ok(credentials) => credentials,
            Err(message) => return self.fail_cycle(cycle, message).await,
        };

        let drained = match self
            .coordinator
            .finish_success(cycle, epoch, &fresh, &*self.store)
            .await
        {
            Ok(Some(drained)) => drained,
            Ok(None) => {
                debug!(cycle, "refresh cycle was aborted by logout, discarding tokens");
                return;
            }
            Err(e) => {
                return self
                    .fail_cycle(cycle, format!("could not store refreshed tokens: {e}"))
                    .await;
            }
        };

        info!(cycle, resumed = drained.pending.len(), "access token refreshed");

        let Some(token) = drained.access_token else {
            for pending in drained.pending {
                let _ = pending
                    .responder
                    .send(Err(AuthFailure::SessionEnded.into()));
            }
            return;
        };

        // Retries are first polled in queue order, so they reach the
        // transport in FIFO order.
        let retries: Vec<_> = drained
            .pending
            .into_iter()
            .map(|pending| self.resume(pending, &token))
            .collect();
        join_all(retries).await;
    }

    async fn resume(&self, pending: PendingRequest, token: &str) {
        let PendingRequest {
            request,
            request_id,
            responder,
        } = pending;

        let result = self.retry(&request, request_id, token).await;
        if responder.send(result).is_err() {
            debug!(%request_id, "caller dropped before its retry completed");
        }
    }

    async fn fail_cycle(&self, cycle: u64, message: String) {
        let Some((pending, cleared)) = self
            .coordinator
            .finish_failure(cycle, &*self.store)
            .await
        else {
            debug!(cycle, "refresh cycle was aborted by logout");
            return;
        };

        warn!(cycle, error = %message, rejected = pending.len(), "token refresh failed");
        if let Err(e) = cleared {
            warn!(error = %e, "failed to clear token store");
        }
        self.publish_logout(LogoutReason::RefreshFailed);

        for pending in pending {
            let _ = pending.responder.send(Err(AuthFailure::RefreshFailed {
                message: message.clone(),
            }
            .into()));
        }
    }

    async fn call_refresh(&self, refresh_token: &str) -> Result<Credentials, String> {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: refresh_token.to_string(),
        })
        .map_err(|e| e.to_string())?;
        let request = ApiRequest::post(REFRESH_PATH, body);
        let outbound = self
            .outbound(&request, Uuid::now_v7(), None)
            .map_err(|e| e.to_string())?;

        let response = self.dispatch(&outbound).await.map_err(|e| e.to_string())?;
        if !is_success(response.status) {
            return Err(format!("refresh endpoint returned HTTP {}", response.status));
        }

        let refreshed: RefreshResponse = serde_json::from_slice(&response.body)
            .map_err(|e| format!("invalid refresh response: {e}"))?;
        if refreshed.access_token.trim().is_empty() {
            return Err("refresh response carried an empty access token".to_string());
        }

        Ok(refreshed.into_credentials(refresh_token))
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<Credentials> {
        let body = serde_json::to_value(LoginRequest::new(email, password))
            .map_err(|e| ApiError::Json(e.to_string()))?;
        let request = ApiRequest::post(LOGIN_PATH, body);
        let outbound = self.outbound(&request, Uuid::now_v7(), None)?;

        let response = self.dispatch(&outbound).await?;
        if !is_success(response.status) {
            return Err(ApiError::Http {
                status: response.status,
                body: parse_body(&response.body),
            });
        }

        let login: LoginResponse =
            serde_json::from_slice(&response.body).map_err(|e| ApiError::Json(e.to_string()))?;
        let (credentials, user) = login.into_parts();

        self.coordinator
            .begin_session(&credentials, &*self.store)
            .await?;
        self.session.send_replace(SessionState::SignedIn { user });
        info!("signed in");

        Ok(credentials)
    }

    async fn retry(
        &self,
        request: &ApiRequest,
        request_id: Uuid,
        token: &str,
    ) -> ApiResult<ApiResponse> {
        match self.attempt(request, request_id, Some(token)).await? {
            Attempt::Done(response) => Ok(response),
            Attempt::Unauthorized => {
                warn!(%request_id, "request rejected again after token refresh");
                self.force_logout(LogoutReason::RejectedAfterRefresh).await;
                Err(AuthFailure::RejectedAfterRefresh.into())
            }
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        request_id: Uuid,
        token: Option<&str>,
    ) -> ApiResult<Attempt> {
        let outbound = self.outbound(request, request_id, token)?;
        let started = Instant::now();
        let response = self.dispatch(&outbound).await?;

        debug!(
            %request_id,
            method = %request.method,
            path = %request.path,
            status = response.status,
            authenticated = token.is_some(),
            "attempt finished"
        );

        match response.status {
            status if is_success(status) => Ok(Attempt::Done(ApiResponse::from_raw(
                status,
                response.headers,
                &response.body,
                started.elapsed(),
            ))),
            401 => Ok(Attempt::Unauthorized),
            status => Err(ApiError::Http {
                status,
                body: parse_body(&response.body),
            }),
        }
    }

    fn outbound(
        &self,
        request: &ApiRequest,
        request_id: Uuid,
        token: Option<&str>,
    ) -> ApiResult<OutboundRequest> {
        Ok(OutboundRequest {
            request_id,
            method: request.method,
            url: request.url(&self.settings.base_url)?,
            headers: request.headers_with_bearer(token),
            query: request.options.query.clone(),
            body: request.body.clone(),
            timeout: self.settings.timeout(),
        })
    }

    async fn dispatch(
        &self,
        request: &OutboundRequest,
    ) -> Result<TransportResponse, TransportError> {
        match tokio::time::timeout(request.timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    async fn end_session(
        &self,
        reason: LogoutReason,
    ) -> Result<(), crate::ports::TokenStoreError> {
        let (pending, cleared) = self.coordinator.end_session(&*self.store).await;
        self.publish_logout(reason);

        for pending in pending {
            let _ = pending
                .responder
                .send(Err(AuthFailure::SessionEnded.into()));
        }
        cleared
    }

    async fn force_logout(&self, reason: LogoutReason) {
        if let Err(e) = self.end_session(reason).await {
            warn!(error = %e, ?reason, "failed to clear token store during logout");
        }
    }

    fn publish_logout(&self, reason: LogoutReason) {
        let changed = self.session.send_if_modified(|state| {
            if matches!(state, SessionState::Ended { .. }) {
                return false;
            }
            *state = SessionState::Ended { reason };
            true
        });

        if changed && reason.is_forced() {
            warn!(?reason, "session ended");
        } else if changed {
            info!("signed out");
        }
    }
}

const fn is_success(status: u16) -> bool {
    matches!(status, 200..=299)
}
