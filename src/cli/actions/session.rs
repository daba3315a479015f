use crate::{
    cli::{actions::restore, globals::GlobalArgs},
    features::auth::{state::SessionState, types::Principal},
};
use anyhow::Result;

pub fn print_principal(principal: &Principal) {
    println!("  email:           {}", principal.email);
    println!("  role:            {}", principal.role);
    println!(
        "  trust score:     {:.1} ({})",
        principal.trust_score, principal.risk_level
    );
    println!("  mfa enabled:     {}", principal.mfa_enabled);
    println!("  account locked:  {}", principal.account_locked);
    println!("  failed attempts: {}", principal.failed_login_attempts);
    if let Some(last_login) = &principal.last_login_at {
        println!("  last login:      {last_login}");
    }
}

/// Prints the restored session.
/// # Errors
/// Returns an error if the client cannot be configured.
pub async fn status(globals: &GlobalArgs) -> Result<()> {
    let app = restore(globals).await?;
    match app.session.state() {
        SessionState::Authenticated(principal) => {
            println!("Signed in.");
            print_principal(&principal);
        }
        _ => println!("Not signed in."),
    }
    Ok(())
}

/// Ends the session locally, telling the server when possible.
/// # Errors
/// Returns an error if the client cannot be configured.
pub async fn logout(globals: &GlobalArgs) -> Result<()> {
    let app = restore(globals).await?;
    app.session.logout().await;
    println!("Signed out.");
    Ok(())
}
