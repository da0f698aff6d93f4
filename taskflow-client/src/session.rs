//! Session state manager.
//!
//! [`SessionManager`] is the single owner of the in-memory session and the
//! only writer to the persisted [`SessionStore`]. Every token mutation is
//! written to the store first and committed to memory afterwards.
//!
//! OBSERVERS
//! =========
//! Views and the route guard register listeners with [`SessionManager::subscribe`].
//! Listeners run synchronously on the thread that changed the session, with no
//! internal lock held, so they may call back into the manager's accessors.

use std::{
    fmt,
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use http::{HeaderValue, header::CONTENT_TYPE};
use shared::{
    config::ClientConfig,
    models::{ErrorResponse, LoginRequest, RegisterRequest, TokenResponse, UserProfile},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    guard::Route,
    http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport},
    store::{ACCESS_TOKEN_KEY, FileStore, REFRESH_TOKEN_KEY, SessionStore},
};

/// Credential exchange endpoint.
pub const LOGIN_PATH: &str = "/auth/login";
/// Account creation endpoint.
pub const REGISTER_PATH: &str = "/auth/register";

/// What listeners and views get to see of the session. Tokens stay private.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// An access token is present.
    pub is_authenticated: bool,
    /// A login is in flight.
    pub is_loading: bool,
    /// Profile placeholder; the manager never fills it in itself.
    pub user: Option<UserProfile>,
}

/// Published to listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tokens, loading flag, or user changed.
    Changed(SessionSnapshot),
    /// The session asks the UI to move to `route`.
    Navigate(Route),
}

/// Handle returned by [`SessionManager::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    // In-flight logins; the loading flag is derived from it.
    loading: usize,
    user: Option<UserProfile>,
}

impl SessionState {
    fn is_authenticated(&self) -> bool {
        self.access_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_authenticated: self.is_authenticated(),
            is_loading: self.loading > 0,
            user: self.user.clone(),
        }
    }
}

/// Authoritative session for one client process.
pub struct SessionManager {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url)
            .field("session", &self.snapshot())
            .field("listeners", &self.read_listeners().len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager talking to `base_url` through `transport`, persisting into `store`.
    ///
    /// The session starts empty; call [`initialize`](Self::initialize) to load persisted tokens.
    pub fn new(
        base_url: &Url,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            transport,
            store,
            state: RwLock::new(SessionState::default()),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Build the production wiring: a `reqwest` transport and a file store at
    /// `config.session_path`.
    ///
    /// # Errors
    /// Returns [`ClientError::Network`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let transport =
            ReqwestTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(
            &config.api_url,
            Arc::new(transport),
            Arc::new(FileStore::new(config.session_path.clone())),
        ))
    }

    /// Backend base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through untouched.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.transport.as_ref()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_listeners(&self) -> RwLockReadGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load persisted tokens into memory. No network. Safe to call repeatedly.
    ///
    /// # Errors
    /// Returns [`ClientError::Storage`] if the store cannot be read; memory is left as it was.
    pub fn initialize(&self) -> ClientResult<()> {
        let access = self.store.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty());
        let refresh = self.store.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty());
        {
            let mut state = self.write_state();
            state.access_token = access;
            state.refresh_token = refresh;
        }
        debug!(
            authenticated = self.is_authenticated(),
            "session hydrated from store"
        );
        self.publish_state();
        Ok(())
    }

    /// Drop every listener. Persisted tokens stay where they are.
    pub fn teardown(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("session torn down");
    }

    /// Register `listener` for every future [`SessionEvent`].
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn publish(&self, event: &SessionEvent) {
        let listeners: Vec<Listener> = self
            .read_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn publish_state(&self) {
        let snapshot = self.snapshot();
        self.publish(&SessionEvent::Changed(snapshot));
    }

    pub(crate) fn navigate(&self, route: Route) {
        debug!(route = route.path(), "session requested navigation");
        self.publish(&SessionEvent::Navigate(route));
    }

    /// Current view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.read_state().snapshot()
    }

    /// `true` when a non-empty access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated()
    }

    /// `true` while at least one login is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read_state().loading > 0
    }

    /// The current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read_state().access_token.clone()
    }

    /// The current refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read_state().refresh_token.clone()
    }

    /// The cached user profile, if a collaborator provided one.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.read_state().user.clone()
    }

    /// Set or clear the cached user profile.
    pub fn set_user(&self, user: Option<UserProfile>) {
        self.write_state().user = user;
        self.publish_state();
    }

    /// Write each provided non-empty token to the store, then to memory.
    ///
    /// `None` or empty leaves that token untouched; nothing is ever cleared here.
    pub(crate) fn save_tokens(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> ClientResult<()> {
        let access = access.filter(|token| !token.is_empty());
        let refresh = refresh.filter(|token| !token.is_empty());
        if access.is_none() && refresh.is_none() {
            return Ok(());
        }

        if let Some(token) = access {
            self.store.set(ACCESS_TOKEN_KEY, token)?;
        }
        if let Some(token) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, token)?;
        }

        {
            let mut state = self.write_state();
            if let Some(token) = access {
                state.access_token = Some(token.to_string());
            }
            if let Some(token) = refresh {
                state.refresh_token = Some(token.to_string());
            }
        }
        self.publish_state();
        Ok(())
    }

    /// Exchange credentials for tokens.
    ///
    /// On success the tokens are persisted and a navigation to the dashboard is
    /// published. On failure the previous session is left exactly as it was.
    ///
    /// # Errors
    /// * [`ClientError::Credentials`] with the server's `detail` on a non-2xx answer.
    /// * [`ClientError::Network`] when the backend could not be reached.
    /// * [`ClientError::MalformedResponse`] when a 2xx body holds no usable token.
    /// * [`ClientError::Storage`] when the tokens could not be persisted.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let _loading = LoadingGuard::acquire(self);

        let request = ApiRequest::post(self.api_url(LOGIN_PATH))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .map_err(ClientError::Encode)?;

        debug!(%email, "submitting credentials");
        let response = self.transport.send(request).await.map_err(|err| {
            warn!(error = %err, "login request did not complete");
            ClientError::from(err)
        })?;

        if !response.is_success() {
            let message = error_message(&response, "Login failed");
            info!(status = %response.status, "login rejected");
            return Err(ClientError::Credentials(message));
        }

        let tokens: TokenResponse = response
            .json()
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))?;
        if tokens.access_token.is_empty() {
            return Err(ClientError::MalformedResponse(
                "login response did not include an access token".to_string(),
            ));
        }

        self.save_tokens(Some(&tokens.access_token), tokens.refresh_token.as_deref())?;
        info!(
            refresh_token = tokens.refresh_token.is_some(),
            "login succeeded"
        );
        self.navigate(Route::Dashboard);
        Ok(())
    }

    /// Create an account. The session is not touched; log in afterwards.
    ///
    /// # Errors
    /// Same classification as [`login`](Self::login).
    pub async fn register(&self, email: &str, password: &str) -> ClientResult<UserProfile> {
        let request = ApiRequest::post(self.api_url(REGISTER_PATH))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .map_err(ClientError::Encode)?;

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Credentials(error_message(
                &response,
                "Registration failed",
            )));
        }

        let user: UserProfile = response
            .json()
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))?;
        info!(user_id = user.id, "account registered");
        Ok(user)
    }

    /// Forget both tokens and the cached user, then ask for the login view.
    ///
    /// Never fails: a store that cannot be cleared is logged and memory is cleared anyway.
    pub fn logout(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!(error = %err, key, "failed to clear persisted token");
            }
        }
        {
            let mut state = self.write_state();
            state.access_token = None;
            state.refresh_token = None;
            state.user = None;
        }
        info!("logged out");
        self.publish_state();
        self.navigate(Route::Login);
    }
}

/// Holds the loading flag up for as long as it lives.
struct LoadingGuard<'a> {
    session: &'a SessionManager,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(session: &'a SessionManager) -> Self {
        session.write_state().loading += 1;
        session.publish_state();
        Self { session }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.session.write_state();
            state.loading = state.loading.saturating_sub(1);
        }
        self.session.publish_state();
    }
}

/// The server's `detail` message, if the body carries one.
pub(crate) fn server_detail(response: &ApiResponse) -> Option<String> {
    response
        .json::<ErrorResponse>()
        .ok()
        .and_then(|body| body.message())
}

/// The server's `detail`, or `"<fallback> (<status>)"` when there is none.
pub(crate) fn error_message(response: &ApiResponse, fallback: &str) -> String {
    server_detail(response).unwrap_or_else(|| format!("{fallback} ({})", response.status))
}
