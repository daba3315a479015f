use crate::{
    app_lib::ClientConfig,
    cli::{actions::user_error, globals::GlobalArgs},
    App,
};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dashboard,
    Health,
    ModelInfo,
    Train { samples: u32 },
    Evaluate { samples: u32 },
    Confusion { samples: u32 },
    Unlock { user_id: String },
    Users,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to render response")?;
    println!("{json}");
    Ok(())
}

/// Runs one admin call with the configured privileged credentials.
/// # Errors
/// Returns an error if the admin credentials are missing or the call fails.
pub async fn execute(args: Args) -> Result<()> {
    let config: ClientConfig = args.globals.config();
    let admin = App::new(config).map_err(user_error)?.admin();
    debug!(command = ?args.command, "admin command");

    match args.command {
        Command::Dashboard => print_json(&admin.dashboard_stats().await.map_err(user_error)?),
        Command::Health => print_json(&admin.system_health().await.map_err(user_error)?),
        Command::ModelInfo => print_json(&admin.model_info().await.map_err(user_error)?),
        Command::Train { samples } => {
            print_json(&admin.train_model(samples).await.map_err(user_error)?)
        }
        Command::Evaluate { samples } => {
            print_json(&admin.evaluate_model(samples).await.map_err(user_error)?)
        }
        Command::Confusion { samples } => {
            print_json(&admin.confusion_metrics(samples).await.map_err(user_error)?)
        }
        Command::Unlock { user_id } => {
            let result = admin.unlock_user(&user_id).await.map_err(user_error)?;
            println!("{} ({})", result.message, result.email);
            Ok(())
        }
        Command::Users => print_json(&admin.list_users().await.map_err(user_error)?),
    }
}
