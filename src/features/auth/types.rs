//! Request and response types for the auth endpoints plus the principal model.
//! Login requests carry the user's password and login responses carry the bearer
//! credential, so neither type implements `Debug` with its secret exposed.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Closed set of roles issued by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Risk classification, ordered `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        })
    }
}

/// Score thresholds owned by the backend and echoed here for display and
/// consistency checks. Scores below `high_below` are HIGH risk, below
/// `medium_below` MEDIUM, anything else LOW.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskThresholds {
    pub high_below: f64,
    pub medium_below: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_below: 40.0,
            medium_below: 70.0,
        }
    }
}

impl RiskThresholds {
    #[must_use]
    pub fn classify(&self, trust_score: f64) -> RiskLevel {
        if trust_score < self.high_below {
            RiskLevel::High
        } else if trust_score < self.medium_below {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Server-side discriminator of a login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Allow,
    RequireMfa,
    Blocked,
}

/// Body of the `/auth/login` response, success or refusal alike.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub decision: DecisionKind,
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub token: Option<SecretString>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub trust_score: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mfa_required: bool,
    #[serde(default)]
    pub account_locked: bool,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("decision", &self.decision)
            .field("has_token", &self.token.is_some())
            .field("email", &self.email)
            .field("role", &self.role)
            .field("risk_level", &self.risk_level)
            .field("trust_score", &self.trust_score)
            .field("message", &self.message)
            .field("account_locked", &self.account_locked)
            .finish_non_exhaustive()
    }
}

/// Backend timestamps arrive either as formatted text or as epoch seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Text(String),
    EpochSeconds(f64),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::EpochSeconds(value) => write!(f, "{value:.0}"),
        }
    }
}

/// Snapshot returned by `GET /auth/user-status`. Replaced wholesale on every
/// successful refresh, never patched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub trust_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub account_locked: bool,
    #[serde(default)]
    pub failed_login_attempts: u32,
    #[serde(default)]
    pub last_login_at: Option<Timestamp>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Principal {
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Whether the server-supplied level agrees with the echoed thresholds.
    #[must_use]
    pub fn risk_matches(&self, thresholds: &RiskThresholds) -> bool {
        thresholds.classify(self.trust_score) == self.risk_level
    }
}

/// What a login decision tells us about the user before a session exists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrincipalSummary {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub risk_level: Option<RiskLevel>,
    pub trust_score: Option<f64>,
    pub account_locked: bool,
}

impl From<&LoginResponse> for PrincipalSummary {
    fn from(response: &LoginResponse) -> Self {
        Self {
            email: response.email.clone(),
            role: response.role,
            risk_level: response.risk_level,
            trust_score: response.trust_score,
            account_locked: response.account_locked,
        }
    }
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(SecretString::from))
}
