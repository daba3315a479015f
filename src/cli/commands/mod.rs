use crate::cli::telemetry::LogFormat;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn samples_arg(default: &'static str) -> Arg {
    Arg::new("samples")
        .short('n')
        .long("samples")
        .help("Number of synthetic samples")
        .default_value(default)
        .value_parser(clap::value_parser!(u32).range(1..))
}

fn admin_command() -> Command {
    Command::new("admin")
        .about("Metrics and model management with the admin credentials")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("dashboard").about("Risk distribution and user statistics"))
        .subcommand(Command::new("health").about("Backend memory and runtime health"))
        .subcommand(Command::new("model-info").about("Risk model artifact details"))
        .subcommand(
            Command::new("train")
                .about("Retrain the risk model")
                .arg(samples_arg("1000")),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Evaluate the risk model")
                .arg(samples_arg("500")),
        )
        .subcommand(
            Command::new("confusion")
                .about("Confusion matrix for the block threshold")
                .arg(samples_arg("500")),
        )
        .subcommand(
            Command::new("unlock")
                .about("Unlock a user account")
                .arg(Arg::new("user-id").help("User id").required(true)),
        )
        .subcommand(Command::new("users").about("List users with trust scores"))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    Command::new("zerotrust")
        .about("Risk-adaptive zero-trust login client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("API base URL, example: http://localhost:8080/api")
                .env("ZEROTRUST_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new("store-dir")
                .long("store-dir")
                .help("Directory holding the persisted credential")
                .env("ZEROTRUST_STORE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("admin-username")
                .long("admin-username")
                .help("Username for the admin endpoints")
                .env("ZEROTRUST_ADMIN_USERNAME")
                .global(true),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .help("Password for the admin endpoints")
                .env("ZEROTRUST_ADMIN_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in seconds")
                .env("ZEROTRUST_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .help("Log output format: pretty or json")
                .env("ZEROTRUST_LOG_FORMAT")
                .global(true)
                .value_parser(|value: &str| value.parse::<LogFormat>()),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ZEROTRUST_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and start a session")
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("Account email")
                        .env("ZEROTRUST_EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Account password")
                        .env("ZEROTRUST_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("accept-mfa")
                        .long("accept-mfa")
                        .help("Continue automatically when a second factor is required")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(Command::new("logout").about("End the session"))
        .subcommand(
            Command::new("open")
                .about("Resolve a route against the current session")
                .arg(Arg::new("path").help("Route path, example: /admin").required(true)),
        )
        .subcommand(admin_command())
        .subcommand(
            Command::new("watch")
                .about("Poll dashboard metrics")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .help("Seconds between polls (default: 10)")
                        .env("ZEROTRUST_POLL_INTERVAL")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("count")
                        .short('c')
                        .long("count")
                        .help("Stop after this many results")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
}
