use crate::{
    app_lib::ClientConfig,
    cli::{actions::user_error, globals::GlobalArgs},
    features::admin::{spawn_poll, types::DashboardStats},
    App,
};
use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    /// Overrides the configured poll interval when set.
    pub interval: Option<Duration>,
    pub count: Option<u64>,
}

fn summary(stats: &DashboardStats) -> String {
    format!(
        "users={} high={} medium={} low={} avg_trust={:.1} calculations={}",
        stats.stats.total_users,
        stats.distribution.high,
        stats.distribution.medium,
        stats.distribution.low,
        stats.stats.average_trust_score,
        stats.stats.total_score_calculations,
    )
}

/// The configured interval, replaced by `requested` when the user passed one.
fn with_requested_interval(config: ClientConfig, requested: Option<Duration>) -> ClientConfig {
    match requested {
        Some(interval) => config.with_poll_interval(interval),
        None => config,
    }
}

/// Polls dashboard metrics until interrupted or `count` results arrived.
/// Failed ticks are reported and polling continues.
/// # Errors
/// Returns an error if the client cannot be configured.
pub async fn execute(args: Args) -> Result<()> {
    let config = with_requested_interval(args.globals.config(), args.interval);
    let interval = config.poll_interval;
    let admin = App::new(config).map_err(user_error)?.admin();

    let (handle, mut results) = spawn_poll(interval, move || {
        let admin = admin.clone();
        async move { admin.dashboard_stats().await }
    });
    info!(?interval, "watching dashboard metrics");

    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = results.recv() => match result {
                Some(Ok(stats)) => println!("{}", summary(&stats)),
                Some(Err(err)) => {
                    warn!("dashboard poll failed: {err}");
                    eprintln!("poll failed: {}", err.user_message());
                }
                None => break,
            },
        }

        seen += 1;
        if args.count.is_some_and(|count| seen >= count) {
            break;
        }
    }

    handle.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_lib::config::DEFAULT_POLL_SECONDS;

    #[test]
    fn poll_interval_comes_from_config_unless_requested() {
        let config = ClientConfig::new("http://localhost:8080/api");
        assert_eq!(
            with_requested_interval(config.clone(), None).poll_interval,
            Duration::from_secs(DEFAULT_POLL_SECONDS)
        );

        let tuned = config.with_poll_interval(Duration::from_secs(30));
        assert_eq!(
            with_requested_interval(tuned.clone(), None).poll_interval,
            Duration::from_secs(30)
        );
        assert_eq!(
            with_requested_interval(tuned, Some(Duration::from_secs(2))).poll_interval,
            Duration::from_secs(2)
        );
    }
}
