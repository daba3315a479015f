//! Client wrappers for the auth endpoints. These helpers centralize paths and
//! pick the right logical client, keeping route code free of credential handling.

use crate::{
    app_lib::{AppError, HttpGateway, RawResponse},
    features::auth::types::{LoginRequest, Principal},
};
use serde::{Deserialize, Serialize};

pub const LOGIN_PATH: &str = "/auth/login";
pub const USER_STATUS_PATH: &str = "/auth/user-status";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// One entry of a user's trust score history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskHistoryEntry {
    pub id: String,
    pub score: f64,
    pub level: crate::features::auth::types::RiskLevel,
    pub calculated_at: String,
}

/// Submits credentials. Goes out without a bearer credential and is not
/// intercepted: refusals come back as 401/403 with a decision body.
pub async fn login(gateway: &HttpGateway, request: &LoginRequest) -> Result<RawResponse, AppError> {
    gateway.post_json_public(LOGIN_PATH, request).await
}

/// Fetches the authenticated principal using the bearer credential.
pub async fn user_status(gateway: &HttpGateway) -> Result<Principal, AppError> {
    gateway.get_json(USER_STATUS_PATH).await
}

/// Tells the server the session is over.
pub async fn logout(gateway: &HttpGateway) -> Result<(), AppError> {
    gateway.post_empty(LOGOUT_PATH).await
}

/// Fetches the trust score history for a user after basic input validation.
pub async fn risk_history(
    gateway: &HttpGateway,
    user_id: &str,
) -> Result<Vec<RiskHistoryEntry>, AppError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("User id is required.".to_string()));
    }

    gateway.get_json(&format!("/risk-history/{trimmed}")).await
}
