//! Client-side routes and the navigator that applies gates to them.
//!
//! Route state is presentation only. Real access control lives on the API; the
//! gates just keep users off views that would fail anyway.

pub mod login;

pub use login::{LoginOutcome, LoginPage};

use crate::features::auth::{
    guards::{Gate, GateOutcome},
    state::{SessionManager, SessionState},
    types::Role,
};
use std::{
    fmt,
    sync::{Arc, Weak},
};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    UserStatus,
    Admin,
}

impl Route {
    /// Default authenticated landing page.
    pub const LANDING: Route = Route::UserStatus;

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::UserStatus => "/user-status",
            Self::Admin => "/admin",
        }
    }

    /// Maps a path to a route. Unknown paths resolve to the login page.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Root,
            "/login" => Self::Login,
            "/user-status" => Self::UserStatus,
            "/admin" => Self::Admin,
            _ => Self::Login,
        }
    }

    /// Gate guarding this route, if any.
    #[must_use]
    pub fn gate(self) -> Option<Gate> {
        match self {
            Self::Root | Self::Login => None,
            Self::UserStatus => Some(Gate::RequireAuthenticated),
            Self::Admin => Some(Gate::RequireRole(Role::Admin)),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of resolving a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Session still resolving; render a neutral placeholder for the route.
    Waiting(Route),
    Showing(Route),
}

impl View {
    #[must_use]
    pub fn route(self) -> Route {
        match self {
            Self::Waiting(route) | Self::Showing(route) => route,
        }
    }
}

/// Follows redirects until a route is allowed or the session is still resolving.
#[must_use]
pub fn resolve(route: Route, state: &SessionState) -> View {
    let mut target = route;
    // Gates redirect at most twice (role demotion, then login), so this terminates.
    for _ in 0..4 {
        if target == Route::Root {
            target = Route::Login;
            continue;
        }
        match target.gate().map(|gate| gate.evaluate(state)) {
            None | Some(GateOutcome::Allow) => return View::Showing(target),
            Some(GateOutcome::Wait) => return View::Waiting(target),
            Some(GateOutcome::Redirect(next)) => target = next,
        }
    }
    View::Showing(Route::Login)
}

/// Tracks the current route and reacts to forced logouts.
pub struct Navigator {
    session: Arc<SessionManager>,
    current: Arc<watch::Sender<Route>>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

impl Navigator {
    /// Starts on the login page and subscribes to the gateway's authorization
    /// failures, moving to `/login` unless already there.
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        let (sender, _) = watch::channel(Route::Login);
        let current = Arc::new(sender);

        let listener: Weak<watch::Sender<Route>> = Arc::downgrade(&current);
        session.gateway().on_unauthorized(move |_| {
            if let Some(current) = listener.upgrade() {
                current.send_if_modified(|route| {
                    if *route == Route::Login {
                        false
                    } else {
                        info!(from = %route, "session ended, returning to login");
                        *route = Route::Login;
                        true
                    }
                });
            }
        });

        Self { session, current }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }

    /// Navigates to a path, applying gates against the current session.
    pub fn open(&self, path: &str) -> View {
        self.go(Route::parse(path))
    }

    /// Navigates to `route`. A waiting view leaves the current route unchanged.
    pub fn go(&self, route: Route) -> View {
        let view = resolve(route, &self.session.state());
        debug!(requested = %route, ?view, "navigation");
        if let View::Showing(target) = view {
            self.current.send_replace(target);
        }
        view
    }
}
