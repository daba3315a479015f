use crate::{
    app_lib::AppError,
    cli::{
        actions::{restore, session::print_principal, user_error},
        globals::GlobalArgs,
    },
    routes::LoginOutcome,
};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub accept_mfa: bool,
}

/// Submits the login and, when asked to, accepts a second-factor continuation.
/// # Errors
/// Returns an error for denied logins and transport or validation failures.
pub async fn execute(args: Args) -> Result<()> {
    let app = restore(&args.globals).await?;
    let mut page = app.login_page();

    let outcome = page
        .submit(&args.email, &args.password)
        .await
        .map_err(user_error)?;

    let outcome = match outcome {
        LoginOutcome::SecondFactorRequired(summary) if args.accept_mfa => {
            println!(
                "Second factor required (risk: {}), continuing.",
                summary
                    .risk_level
                    .map_or_else(|| "unknown".to_string(), |level| level.to_string())
            );
            page.continue_second_factor().await.map_err(user_error)?
        }
        other => other,
    };

    match outcome {
        LoginOutcome::Authenticated(principal) => {
            println!("Signed in.");
            print_principal(&principal);
            Ok(())
        }
        LoginOutcome::SecondFactorRequired(summary) => {
            page.cancel_second_factor();
            println!(
                "Additional verification required for {}. Run again with --accept-mfa to continue.",
                summary.email.as_deref().unwrap_or(&args.email)
            );
            Ok(())
        }
        LoginOutcome::Denied(reason) => Err(user_error(AppError::Denied(reason))),
    }
}
