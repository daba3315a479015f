//! Session state for the client. One [`SessionManager`] owns the credential
//! slot and the in-memory principal; everything else observes it through a
//! read-only `watch` receiver. The manager hydrates the session once at startup
//! from the credential store and subscribes to the gateway's authorization
//! failures so any 401 tears the session down, whichever call saw it.

use crate::{
    app_lib::{AppError, HttpGateway},
    features::auth::{client, store::CredentialStore, types::Principal},
};
use secrecy::SecretString;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Weak,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Where the session stands. `Authenticated` is the only state holding a
/// principal, so "authenticated" and "principal present" cannot disagree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated(Principal),
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// True while the outcome is not known yet, including before bootstrap.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading | Self::Uninitialized)
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Read-only view of the session handed to consumers.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub has_credential: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.state.principal()
    }
}

/// Shared between the manager and the gateway's unauthorized listener.
struct SessionCore {
    gateway: Arc<HttpGateway>,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
    // Bumped on every teardown and every new login so a status check started
    // earlier can neither resurrect nor clobber the current session.
    epoch: AtomicU64,
}

impl SessionCore {
    fn set_state(&self, state: SessionState) {
        debug!(?state, "session state transition");
        self.state.send_replace(state);
    }

    /// Clears credential, store and principal. Safe to repeat.
    fn teardown(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.gateway.set_credential(None);
        if let Err(err) = self.store.clear() {
            warn!("failed to clear persisted credential: {err}");
        }
        self.set_state(SessionState::Unauthenticated);
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn attach(&self, credential: SecretString) {
        self.gateway.set_credential(Some(credential));
    }
}

/// Owns the session and drives its transitions.
pub struct SessionManager {
    core: Arc<SessionCore>,
    bootstrapped: AtomicBool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.core.state.borrow())
            .field("has_credential", &self.core.gateway.has_credential())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager in `Uninitialized` and subscribes it to the gateway's
    /// authorization failures.
    #[must_use]
    pub fn new(gateway: Arc<HttpGateway>, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        let core = Arc::new(SessionCore {
            gateway: Arc::clone(&gateway),
            store,
            state,
            epoch: AtomicU64::new(0),
        });

        let listener: Weak<SessionCore> = Arc::downgrade(&core);
        gateway.on_unauthorized(move |event| {
            if let Some(core) = listener.upgrade() {
                info!(path = %event.path, "authorization failure, ending session");
                core.teardown();
            }
        });

        Self {
            core,
            bootstrapped: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<HttpGateway> {
        &self.core.gateway
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.core.state.borrow().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            has_credential: self.core.gateway.has_credential(),
        }
    }

    /// Receiver notified on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.core.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.core.state.borrow().is_authenticated()
    }

    /// Restores a persisted credential and checks it against the backend. Runs
    /// once; later calls return the current state untouched. A rejected or
    /// unreadable credential ends quietly in `Unauthenticated`, with no retry.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            debug!("bootstrap already ran");
            return self.state();
        }

        let stored = match self.core.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!("failed to read persisted credential: {err}");
                None
            }
        };

        let Some(credential) = stored else {
            debug!("no persisted credential");
            self.core.set_state(SessionState::Unauthenticated);
            return self.state();
        };

        self.core.attach(credential);
        if let Err(err) = self.refresh().await {
            info!("restored session is stale: {err}");
        }
        self.state()
    }

    /// Promotes a credential issued by an ALLOWED (or accepted second-factor)
    /// decision into a session.
    ///
    /// If the status check fails for a reason other than authorization, the
    /// credential stays persisted and attached and the state is
    /// `Unauthenticated`, so a later [`refresh`](Self::refresh) can complete it.
    ///
    /// # Errors
    /// Returns the status check failure.
    #[instrument(skip(self, credential))]
    pub async fn finalize_login(&self, credential: SecretString) -> Result<Principal, AppError> {
        if let Err(err) = self.core.store.save(&credential) {
            warn!("failed to persist credential, continuing in memory: {err}");
        }
        self.core.attach(credential);
        // A new credential starts a new session; earlier refreshes are stale.
        let epoch = self.core.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.core.set_state(SessionState::Loading);

        match client::user_status(&self.core.gateway).await {
            Ok(principal) => self.apply_principal(principal, epoch),
            Err(err) => {
                warn!("status check after login failed: {err}");
                if self.core.is_current(epoch) {
                    self.core.set_state(SessionState::Unauthenticated);
                }
                Err(err)
            }
        }
    }

    /// Re-reads the principal from the backend and replaces it wholesale. Any
    /// failure clears credential and principal and is returned to the caller.
    ///
    /// # Errors
    /// `AppError::SessionStale` when no credential is attached, otherwise the
    /// status check failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Principal, AppError> {
        if !self.core.gateway.has_credential() {
            self.core.teardown();
            return Err(AppError::SessionStale(
                "No credential is available.".to_string(),
            ));
        }

        self.core.set_state(SessionState::Loading);
        let epoch = self.core.epoch.load(Ordering::SeqCst);

        match client::user_status(&self.core.gateway).await {
            Ok(principal) => self.apply_principal(principal, epoch),
            Err(err) => {
                warn!("status refresh failed: {err}");
                if self.core.is_current(epoch) {
                    self.core.teardown();
                }
                Err(err)
            }
        }
    }

    /// Ends the session locally no matter what the server says.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.core.gateway.has_credential() {
            if let Err(err) = client::logout(&self.core.gateway).await {
                warn!("logout request failed, clearing local session anyway: {err}");
            }
        }
        self.core.teardown();
        info!("logged out");
    }

    fn apply_principal(&self, principal: Principal, epoch: u64) -> Result<Principal, AppError> {
        if !self.core.is_current(epoch) {
            // The session changed while the request was in flight; leave it be.
            debug!("discarding stale status result");
            return Err(AppError::SessionStale(
                "Session ended while refreshing.".to_string(),
            ));
        }

        info!(role = %principal.role, risk_level = %principal.risk_level, "session authenticated");
        self.core
            .set_state(SessionState::Authenticated(principal.clone()));
        Ok(principal)
    }
}
