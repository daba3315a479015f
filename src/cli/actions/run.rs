use crate::cli::actions::{admin, login, open, session, watch, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Status(globals) => session::status(&globals).await,
        Action::Logout(globals) => session::logout(&globals).await,
        Action::Open(args) => open::execute(args).await,
        Action::Admin(args) => admin::execute(args).await,
        Action::Watch(args) => watch::execute(args).await,
    }
}
