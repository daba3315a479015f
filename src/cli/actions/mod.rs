pub mod admin;
pub mod login;
pub mod open;
pub mod session;
pub mod watch;

// Internal "interpreter" for `Action`.
mod run;

use crate::{app_lib::AppError, cli::globals::GlobalArgs, App};

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Status(GlobalArgs),
    Logout(GlobalArgs),
    Open(open::Args),
    Admin(admin::Args),
    Watch(watch::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Builds the client and restores any persisted session.
async fn restore(globals: &GlobalArgs) -> anyhow::Result<App> {
    let app = App::new(globals.config()).map_err(user_error)?;
    app.session.bootstrap().await;
    Ok(app)
}

/// Short message for the terminal, without internal detail.
fn user_error(err: AppError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
