//! Auth feature: credential persistence, login decisions, the session state
//! machine and navigation gates. This module touches security boundaries and
//! must avoid logging secrets or token material.
//!
//! Flow Overview: `LoginDecisionHandler::submit` posts the identifier and secret
//! and maps the server verdict to a `LoginDecision`. An allowed decision (or an
//! accepted second-factor continuation) hands the credential to
//! `SessionManager::finalize_login`, which persists it and fetches the
//! principal. Any 401 seen by the user client tears the session down.

pub mod client;
pub mod decision;
pub mod guards;
pub mod state;
pub mod store;
pub mod types;

pub use decision::{LoginDecision, LoginDecisionHandler, PendingSecondFactor};
pub use guards::{Gate, GateOutcome};
pub use state::{SessionManager, SessionSnapshot, SessionState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use types::{Principal, PrincipalSummary, RiskLevel, RiskThresholds, Role};
