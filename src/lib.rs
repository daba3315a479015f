//! # Zerotrust (risk-adaptive login client)
//!
//! `zerotrust` is the client side of a risk-adaptive zero-trust login system.
//! The backend scores every login attempt and answers with one of three
//! decisions: allow, require a second factor, or block. This crate turns those
//! decisions into a local session and keeps it honest afterwards.
//!
//! ## Session Model
//!
//! - **Single credential:** at most one bearer credential is live per client,
//!   persisted in a per-origin credential store and restored at startup.
//! - **Explicit state:** the session is `Uninitialized`, `Loading`,
//!   `Authenticated(principal)` or `Unauthenticated`. Consumers get a read-only
//!   `watch` receiver, never a mutable handle.
//! - **Forced logout:** any 401 seen by the user client tears the session down
//!   and returns navigation to `/login`, whichever call triggered it.
//!
//! ## Trust Boundaries
//!
//! The user client carries the bearer credential. The admin client carries a
//! fixed, configured credential pair and only talks to metrics and model
//! management endpoints; its failures never touch the user session.
//!
//! ## Gates
//!
//! Routes are gated client-side for presentation only. A user lacking a role is
//! sent to the landing page rather than back to login ("demote, don't deny").

pub mod app;
pub mod app_lib;
pub mod cli;
pub mod features;
pub mod routes;

pub use app::App;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
