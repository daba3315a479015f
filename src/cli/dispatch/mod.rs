use crate::cli::{
    actions::{admin, login, open, watch, Action},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::time::Duration;

fn samples(matches: &clap::ArgMatches) -> u32 {
    matches.get_one::<u32>("samples").copied().unwrap_or(500)
}

fn admin_command(matches: &clap::ArgMatches) -> Result<admin::Command> {
    let command = match matches.subcommand() {
        Some(("dashboard", _)) => admin::Command::Dashboard,
        Some(("health", _)) => admin::Command::Health,
        Some(("model-info", _)) => admin::Command::ModelInfo,
        Some(("train", sub)) => admin::Command::Train {
            samples: sub.get_one::<u32>("samples").copied().unwrap_or(1000),
        },
        Some(("evaluate", sub)) => admin::Command::Evaluate {
            samples: samples(sub),
        },
        Some(("confusion", sub)) => admin::Command::Confusion {
            samples: samples(sub),
        },
        Some(("unlock", sub)) => admin::Command::Unlock {
            user_id: sub
                .get_one::<String>("user-id")
                .cloned()
                .context("missing required argument: <user-id>")?,
        },
        Some(("users", _)) => admin::Command::Users,
        _ => return Err(anyhow!("unknown admin command")),
    };
    Ok(command)
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::from_matches(matches);

    match matches.subcommand() {
        Some(("login", sub)) => Ok(Action::Login(login::Args {
            globals,
            email: sub
                .get_one::<String>("email")
                .cloned()
                .context("missing required argument: --email")?,
            password: sub
                .get_one::<String>("password")
                .map(|password| SecretString::from(password.clone()))
                .context("missing required argument: --password")?,
            accept_mfa: sub.get_flag("accept-mfa"),
        })),
        Some(("status", _)) => Ok(Action::Status(globals)),
        Some(("logout", _)) => Ok(Action::Logout(globals)),
        Some(("open", sub)) => Ok(Action::Open(open::Args {
            globals,
            path: sub
                .get_one::<String>("path")
                .cloned()
                .context("missing required argument: <path>")?,
        })),
        Some(("admin", sub)) => Ok(Action::Admin(admin::Args {
            globals,
            command: admin_command(sub)?,
        })),
        Some(("watch", sub)) => Ok(Action::Watch(watch::Args {
            globals,
            interval: sub
                .get_one::<u64>("interval")
                .map(|seconds| Duration::from_secs(*seconds)),
            count: sub.get_one::<u64>("count").copied(),
        })),
        _ => Err(anyhow!("unknown command")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler_login() {
        let matches = commands::new().get_matches_from(vec![
            "zerotrust",
            "login",
            "-e",
            "user1@company.com",
            "-p",
            "Password123!",
        ]);
        let Action::Login(args) = handler(&matches).unwrap() else {
            panic!("expected login action");
        };
        assert_eq!(args.email, "user1@company.com");
        assert_eq!(args.password.expose_secret(), "Password123!");
        assert!(!args.accept_mfa);
    }

    #[test]
    fn test_handler_admin_unlock() {
        let matches = commands::new().get_matches_from(vec![
            "zerotrust",
            "admin",
            "unlock",
            "6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11",
        ]);
        let Action::Admin(args) = handler(&matches).unwrap() else {
            panic!("expected admin action");
        };
        assert_eq!(
            args.command,
            admin::Command::Unlock {
                user_id: "6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11".to_string()
            }
        );
    }

    #[test]
    fn test_handler_watch_interval() {
        temp_env::with_var("ZEROTRUST_POLL_INTERVAL", None::<String>, || {
            let matches =
                commands::new().get_matches_from(vec!["zerotrust", "watch", "-i", "3", "-c", "2"]);
            let Action::Watch(args) = handler(&matches).unwrap() else {
                panic!("expected watch action");
            };
            assert_eq!(args.interval, Some(Duration::from_secs(3)));
            assert_eq!(args.count, Some(2));
        });
    }

    #[test]
    fn test_handler_watch_without_interval_defers_to_config() {
        temp_env::with_var("ZEROTRUST_POLL_INTERVAL", None::<String>, || {
            let matches = commands::new().get_matches_from(vec!["zerotrust", "watch"]);
            let Action::Watch(args) = handler(&matches).unwrap() else {
                panic!("expected watch action");
            };
            assert_eq!(args.interval, None);
            assert_eq!(args.count, None);
        });
    }

    #[test]
    fn test_handler_open_keeps_globals() {
        let matches = commands::new().get_matches_from(vec![
            "zerotrust",
            "open",
            "/admin",
            "--api-url",
            "http://localhost:9090/api",
        ]);
        let Action::Open(args) = handler(&matches).unwrap() else {
            panic!("expected open action");
        };
        assert_eq!(args.path, "/admin");
        assert_eq!(
            args.globals.api_base_url.as_deref(),
            Some("http://localhost:9090/api")
        );
    }
}
