//! Interpretation of the server's login verdict.
//!
//! A submit yields exactly one of three decisions. Only ALLOWED hands out a
//! credential that may become a session. SECOND_FACTOR_REQUIRED hands out a
//! pending credential wrapped in [`PendingSecondFactor`]: it is single use,
//! expires after a fixed window and is invalidated by any newer submit on the
//! same handler. DENIED never carries a credential. Transport problems are
//! errors, never decisions.

use crate::{
    app_lib::{AppError, HttpGateway},
    features::auth::{
        client,
        types::{DecisionKind, LoginRequest, LoginResponse, PrincipalSummary},
    },
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock,
    },
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

/// Verdict on a login attempt.
pub enum LoginDecision {
    Allowed {
        credential: SecretString,
        principal: PrincipalSummary,
    },
    SecondFactorRequired(PendingSecondFactor),
    Denied {
        reason: String,
        principal: PrincipalSummary,
    },
}

impl fmt::Debug for LoginDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed { principal, .. } => f
                .debug_struct("Allowed")
                .field("principal", principal)
                .finish_non_exhaustive(),
            Self::SecondFactorRequired(pending) => {
                f.debug_tuple("SecondFactorRequired").field(pending).finish()
            }
            Self::Denied { reason, principal } => f
                .debug_struct("Denied")
                .field("reason", reason)
                .field("principal", principal)
                .finish(),
        }
    }
}

impl LoginDecision {
    #[must_use]
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Allowed { .. } => DecisionKind::Allow,
            Self::SecondFactorRequired(_) => DecisionKind::RequireMfa,
            Self::Denied { .. } => DecisionKind::Blocked,
        }
    }

    #[must_use]
    pub fn principal(&self) -> &PrincipalSummary {
        match self {
            Self::Allowed { principal, .. } | Self::Denied { principal, .. } => principal,
            Self::SecondFactorRequired(pending) => pending.principal(),
        }
    }
}

/// A credential held back until the user accepts the continuation step. It is
/// not a session credential; [`LoginDecisionHandler::accept_second_factor`]
/// consumes it and only then releases the token.
pub struct PendingSecondFactor {
    credential: SecretString,
    principal: PrincipalSummary,
    generation: u64,
    issued_at: Instant,
    ttl: Duration,
}

impl fmt::Debug for PendingSecondFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSecondFactor")
            .field("principal", &self.principal)
            .field("generation", &self.generation)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl PendingSecondFactor {
    #[must_use]
    pub fn principal(&self) -> &PrincipalSummary {
        &self.principal
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= self.ttl
    }

    /// Time left before the continuation can no longer be accepted.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.issued_at.elapsed())
    }
}

/// Submits credentials and turns the response into a [`LoginDecision`].
#[derive(Debug)]
pub struct LoginDecisionHandler {
    gateway: Arc<HttpGateway>,
    second_factor_ttl: Duration,
    generation: AtomicU64,
}

impl LoginDecisionHandler {
    #[must_use]
    pub fn new(gateway: Arc<HttpGateway>, second_factor_ttl: Duration) -> Self {
        Self {
            gateway,
            second_factor_ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Sends `identifier` and `secret` to the login endpoint.
    ///
    /// # Errors
    /// `AppError::Validation` for empty or malformed input (no request is sent),
    /// transport errors, or `AppError::Parse`/`AppError::Http` when the response
    /// is not a usable decision. A refusal is `Ok(LoginDecision::Denied)`.
    #[instrument(skip(self, secret))]
    pub async fn submit(
        &self,
        identifier: &str,
        secret: &SecretString,
    ) -> Result<LoginDecision, AppError> {
        let identifier = identifier.trim();
        validate_credentials(identifier, secret)?;

        // Any new attempt invalidates a pending continuation from an older one.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let request = LoginRequest {
            email: identifier.to_string(),
            password: secret.clone(),
        };
        let raw = client::login(&self.gateway, &request).await?;

        let response: LoginResponse = match serde_json::from_str(&raw.body) {
            Ok(response) => response,
            Err(err) if raw.status.is_success() => {
                return Err(AppError::Parse(format!("Failed to decode login response: {err}")));
            }
            Err(_) => {
                return Err(AppError::Http {
                    status: raw.status.as_u16(),
                    message: crate::app_lib::errors::sanitize_body(&raw.body),
                });
            }
        };

        self.decide(response, generation)
    }

    /// Releases the pending credential if the continuation is still valid.
    ///
    /// # Errors
    /// `AppError::Validation` when the window has elapsed or a newer login
    /// attempt superseded this one.
    pub fn accept_second_factor(&self, pending: PendingSecondFactor) -> Result<SecretString, AppError> {
        if pending.generation != self.generation.load(Ordering::SeqCst) {
            warn!("second-factor continuation superseded by a newer login attempt");
            return Err(AppError::Validation(
                "This sign-in attempt is no longer valid. Please sign in again.".to_string(),
            ));
        }
        if pending.is_expired() {
            warn!("second-factor continuation expired");
            return Err(AppError::Validation(
                "The verification step expired. Please sign in again.".to_string(),
            ));
        }

        info!("second-factor continuation accepted");
        Ok(pending.credential)
    }

    fn decide(&self, response: LoginResponse, generation: u64) -> Result<LoginDecision, AppError> {
        let principal = PrincipalSummary::from(&response);
        debug!(decision = ?response.decision, risk_level = ?response.risk_level, "login decision received");

        match response.decision {
            DecisionKind::Allow => {
                let credential = response.token.ok_or_else(missing_token)?;
                info!("login allowed");
                Ok(LoginDecision::Allowed {
                    credential,
                    principal,
                })
            }
            DecisionKind::RequireMfa => {
                let credential = response.token.ok_or_else(missing_token)?;
                info!("login requires a second factor");
                Ok(LoginDecision::SecondFactorRequired(PendingSecondFactor {
                    credential,
                    principal,
                    generation,
                    issued_at: Instant::now(),
                    ttl: self.second_factor_ttl,
                }))
            }
            DecisionKind::Blocked => {
                let reason = response
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| "Login denied.".to_string());
                info!(account_locked = principal.account_locked, "login denied");
                Ok(LoginDecision::Denied { reason, principal })
            }
        }
    }
}

fn missing_token() -> AppError {
    AppError::Parse("Unexpected login response. Please try again.".to_string())
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

/// Checks the identifier looks like an email address.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(email))
}

fn validate_credentials(identifier: &str, secret: &SecretString) -> Result<(), AppError> {
    if identifier.is_empty() || secret.expose_secret().trim().is_empty() {
        return Err(AppError::Validation(
            "Email and password are required.".to_string(),
        ));
    }
    if !valid_email(identifier) {
        return Err(AppError::Validation(
            "Enter a valid email address.".to_string(),
        ));
    }
    Ok(())
}
