//! Navigation gates. These are pure functions of session state; they decide
//! what the client shows, not what the server allows.

use crate::{
    features::auth::{state::SessionState, types::Role},
    routes::Route,
};

/// Capability a route requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Any authenticated principal.
    RequireAuthenticated,
    /// An authenticated principal holding `Role`.
    RequireRole(Role),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    /// Session is still resolving; show a neutral placeholder.
    Wait,
    Allow,
    Redirect(Route),
}

impl Gate {
    /// Not logged in goes to the login page. Logged in but lacking the role
    /// goes to the default landing page instead.
    #[must_use]
    pub fn evaluate(self, state: &SessionState) -> GateOutcome {
        let principal = match state {
            SessionState::Uninitialized | SessionState::Loading => return GateOutcome::Wait,
            SessionState::Unauthenticated => return GateOutcome::Redirect(Route::Login),
            SessionState::Authenticated(principal) => principal,
        };

        match self {
            Self::RequireAuthenticated => GateOutcome::Allow,
            Self::RequireRole(role) if principal.has_role(role) => GateOutcome::Allow,
            Self::RequireRole(_) => GateOutcome::Redirect(Route::LANDING),
        }
    }
}
