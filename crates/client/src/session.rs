//! Session store: authentication state machine and token lifecycle.
//!
//! ```text
//! checking ──on_start──► authenticated | not-authenticated
//! not-authenticated ──sign_in / sign_up ok──► authenticated
//! any ──log_out──► not-authenticated
//! ```
//!
//! All state changes go through [`reduce`], a pure function over
//! [`SessionAction`]. [`SessionStore`] performs the I/O, then dispatches the
//! resulting action. Whenever a branch obtains a token it is written to
//! storage before the authenticated state is published, so anything reading
//! storage after observing `authenticated` sees the matching token.
//!
//! Observers subscribe with [`SessionStore::subscribe`] and receive every new
//! snapshot through a `tokio::sync::watch` channel.

use std::sync::Arc;

use cafe_catalog_core::{SessionStatus, User};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{AuthResponse, CafeApi, Credentials, Registration};
use crate::error::ApiError;
use crate::storage::{KeyValueStore, StorageError, TOKEN_KEY};

/// Shown when a sign-in fails without a usable server message.
pub const SIGN_IN_FALLBACK_ERROR: &str = "Información incorrecta";

/// Shown when a sign-up fails without a usable server message.
pub const SIGN_UP_FALLBACK_ERROR: &str = "Revise la información";

/// Receiver yielding a new snapshot on every session update.
pub type SessionWatcher = watch::Receiver<SessionState>;

/// Snapshot of the session.
///
/// `status == Authenticated` implies `token.is_some()`;
/// `status == NotAuthenticated` implies `token.is_none()`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Authentication status.
    pub status: SessionStatus,
    /// Current token.
    pub token: Option<SecretString>,
    /// Authenticated user.
    pub user: Option<User>,
    /// Last sign-in/sign-up failure; empty when there is none.
    pub error_message: String,
}

impl SessionState {
    /// Whether an error message is pending.
    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}

/// State transitions.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// A token was obtained (validation, sign-in or sign-up).
    Authenticated {
        /// The token now held.
        token: SecretString,
        /// The user it belongs to.
        user: User,
    },
    /// No valid token is held.
    NotAuthenticated,
    /// The user logged out.
    LogOut,
    /// A sign-in or sign-up failed.
    AddError(String),
    /// The pending error was acknowledged.
    RemoveError,
}

/// Apply `action` to `state`.
#[must_use]
pub fn reduce(state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::Authenticated { token, user } => SessionState {
            status: SessionStatus::Authenticated,
            token: Some(token),
            user: Some(user),
            error_message: String::new(),
        },
        SessionAction::NotAuthenticated | SessionAction::LogOut => SessionState {
            status: SessionStatus::NotAuthenticated,
            token: None,
            user: None,
            ..state
        },
        // Failures leave status, token and user as they were.
        SessionAction::AddError(message) => SessionState {
            error_message: message,
            ..state
        },
        SessionAction::RemoveError => SessionState {
            error_message: String::new(),
            ..state
        },
    }
}

/// Which authentication request failed; picks the message fallback.
#[derive(Debug, Clone, Copy)]
enum AuthFlow {
    SignIn,
    SignUp,
}

impl AuthFlow {
    const fn fallback(self) -> &'static str {
        match self {
            Self::SignIn => SIGN_IN_FALLBACK_ERROR,
            Self::SignUp => SIGN_UP_FALLBACK_ERROR,
        }
    }

    /// Message shown for a failed request.
    ///
    /// Sign-in failures report a single `msg`; sign-up failures report
    /// field validation errors. Each flow prefers its own shape and falls
    /// back to the other before using the generic text. Transport and
    /// malformed-response failures always get the generic text.
    fn message_for(self, err: &ApiError) -> String {
        let body = match err {
            ApiError::Status {
                body: Some(body), ..
            } => body,
            _ => return self.fallback().to_string(),
        };

        let preferred = match self {
            Self::SignIn => body.top_message().or_else(|| body.first_error()),
            Self::SignUp => body.first_error().or_else(|| body.top_message()),
        };
        preferred.map_or_else(|| self.fallback().to_string(), str::to_string)
    }
}

/// Owner of the session state.
///
/// Mutating operations take `&mut self`: one writer at a time.
pub struct SessionStore {
    api: CafeApi,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store in the `checking` state, sharing the client's token storage.
    #[must_use]
    pub fn new(api: CafeApi) -> Self {
        let storage = api.storage();
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            storage,
            state,
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status
    }

    /// Current error message (empty when none).
    #[must_use]
    pub fn error_message(&self) -> String {
        self.state.borrow().error_message.clone()
    }

    /// Subscribe to snapshots.
    #[must_use]
    pub fn subscribe(&self) -> SessionWatcher {
        self.state.subscribe()
    }

    /// Client used for authentication requests.
    #[must_use]
    pub const fn api(&self) -> &CafeApi {
        &self.api
    }

    fn dispatch(&self, action: SessionAction) {
        debug!(?action, "Session action");
        self.state
            .send_modify(|state| *state = reduce(std::mem::take(state), action));
    }

    /// Resolve the initial status from the persisted token.
    ///
    /// A failed validation leaves the persisted token in place; only the
    /// in-memory session becomes unauthenticated.
    #[instrument(skip(self))]
    pub async fn on_start(&mut self) -> SessionStatus {
        let stored = match self.storage.get_item(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read persisted token");
                None
            }
        };

        if stored.is_none() {
            debug!("No persisted token");
            self.dispatch(SessionAction::NotAuthenticated);
            return self.status();
        }

        match self.api.validate_token().await {
            Ok(response) => match self.persist_and_authenticate(response).await {
                Ok(()) => info!("Session restored"),
                Err(e) => {
                    error!(error = %e, "Could not persist rotated token");
                    self.dispatch(SessionAction::NotAuthenticated);
                }
            },
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                self.dispatch(SessionAction::NotAuthenticated);
            }
        }

        self.status()
    }

    /// Sign in with email and password.
    ///
    /// On failure the status is unchanged and `error_message` is set.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&mut self, credentials: &Credentials) {
        let result = self.api.login(credentials).await;
        self.complete(AuthFlow::SignIn, result).await;
    }

    /// Register a new account and sign in with it.
    ///
    /// On failure the status is unchanged and `error_message` is set.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn sign_up(&mut self, registration: &Registration) {
        let result = self.api.register(registration).await;
        self.complete(AuthFlow::SignUp, result).await;
    }

    /// Forget the session.
    ///
    /// The session is always unauthenticated afterwards.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the persisted token could not be removed.
    #[instrument(skip(self))]
    pub async fn log_out(&mut self) -> Result<(), StorageError> {
        let removed = self.storage.remove_item(TOKEN_KEY).await;
        if let Err(ref e) = removed {
            error!(error = %e, "Could not remove persisted token");
        }
        self.dispatch(SessionAction::LogOut);
        info!("Logged out");
        removed
    }

    /// Clear the pending error message. No-op when there is none.
    pub fn remove_error(&mut self) {
        self.state.send_if_modified(|state| {
            if state.error_message.is_empty() {
                return false;
            }
            state.error_message.clear();
            true
        });
    }

    async fn complete(&self, flow: AuthFlow, result: Result<AuthResponse, ApiError>) {
        let outcome = match result {
            Ok(response) => self.persist_and_authenticate(response).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => info!("Authenticated"),
            Err(e) => {
                warn!(error = %e, ?flow, "Authentication failed");
                self.dispatch(SessionAction::AddError(flow.message_for(&e)));
            }
        }
    }

    async fn persist_and_authenticate(&self, response: AuthResponse) -> Result<(), ApiError> {
        let token = SecretString::from(response.token);
        self.storage
            .set_item(TOKEN_KEY, token.expose_secret())
            .await?;
        self.dispatch(SessionAction::Authenticated {
            token,
            user: response.usuario,
        });
        Ok(())
    }
}
