//! Login flow controller. Holds page-local state (the pending second-factor
//! continuation and the last message shown) and drives the session on success.

use crate::{
    app_lib::AppError,
    features::auth::{
        decision::{LoginDecision, LoginDecisionHandler, PendingSecondFactor},
        types::{Principal, PrincipalSummary},
    },
    routes::{Navigator, Route},
};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

/// What the page shows after a submit or continuation.
#[derive(Clone, Debug, PartialEq)]
pub enum LoginOutcome {
    Authenticated(Principal),
    /// A continuation is held; call [`LoginPage::continue_second_factor`].
    SecondFactorRequired(PrincipalSummary),
    Denied(String),
}

pub struct LoginPage {
    handler: LoginDecisionHandler,
    navigator: Arc<Navigator>,
    pending: Option<PendingSecondFactor>,
    error: Option<String>,
}

impl std::fmt::Debug for LoginPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPage")
            .field("pending", &self.pending)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl LoginPage {
    #[must_use]
    pub fn new(handler: LoginDecisionHandler, navigator: Arc<Navigator>) -> Self {
        Self {
            handler,
            navigator,
            pending: None,
            error: None,
        }
    }

    /// Message to show under the form, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingSecondFactor> {
        self.pending.as_ref()
    }

    /// Submits the form. A new submit discards any held continuation.
    ///
    /// # Errors
    /// Validation, transport and session errors. Their user message is also
    /// kept in [`error`](Self::error).
    pub async fn submit(
        &mut self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AppError> {
        self.error = None;
        self.pending = None;

        let decision = self
            .handler
            .submit(email, password)
            .await
            .map_err(|err| self.fail(err))?;

        match decision {
            LoginDecision::Allowed { credential, .. } => self.finalize(credential).await,
            LoginDecision::SecondFactorRequired(pending) => {
                let summary = pending.principal().clone();
                self.pending = Some(pending);
                Ok(LoginOutcome::SecondFactorRequired(summary))
            }
            LoginDecision::Denied { reason, .. } => {
                self.error = Some(reason.clone());
                Ok(LoginOutcome::Denied(reason))
            }
        }
    }

    /// Accepts the held continuation and promotes its credential to a session.
    ///
    /// # Errors
    /// `AppError::Validation` when nothing is pending or the continuation is no
    /// longer valid, otherwise session errors.
    pub async fn continue_second_factor(&mut self) -> Result<LoginOutcome, AppError> {
        let Some(pending) = self.pending.take() else {
            return Err(self.fail(AppError::Validation(
                "There is no verification step in progress.".to_string(),
            )));
        };

        let credential = self
            .handler
            .accept_second_factor(pending)
            .map_err(|err| self.fail(err))?;
        self.finalize(credential).await
    }

    /// Drops the held continuation without using it.
    pub fn cancel_second_factor(&mut self) {
        if self.pending.take().is_some() {
            info!("second-factor continuation cancelled");
        }
    }

    async fn finalize(&mut self, credential: SecretString) -> Result<LoginOutcome, AppError> {
        let principal = self
            .navigator
            .session()
            .finalize_login(credential)
            .await
            .map_err(|err| self.fail(err))?;
        self.navigator.go(Route::LANDING);
        Ok(LoginOutcome::Authenticated(principal))
    }

    fn fail(&mut self, err: AppError) -> AppError {
        warn!("login step failed: {err}");
        self.error = Some(err.user_message());
        err
    }
}
