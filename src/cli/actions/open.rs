use crate::{
    cli::{actions::restore, globals::GlobalArgs},
    routes::{Route, View},
};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub path: String,
}

/// Resolves a route path against the restored session and prints where it lands.
/// # Errors
/// Returns an error if the client cannot be configured.
pub async fn execute(args: Args) -> Result<()> {
    let app = restore(&args.globals).await?;
    let requested = Route::parse(&args.path);

    match app.navigator.go(requested) {
        View::Showing(route) if route == requested => println!("{route}"),
        View::Showing(route) => println!("{requested} -> {route}"),
        View::Waiting(route) => println!("{route} (waiting for session)"),
    }
    Ok(())
}
