//! Fixed-interval polling for read-only dashboard endpoints.
//!
//! Every tick spawns its own fetch, so a failed or slow tick never cancels the
//! next one. Stopping the handle ends the ticker; fetches already in flight run
//! to completion and their results are dropped.

use crate::app_lib::AppError;
use std::{future::Future, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

const RESULT_BUFFER: usize = 16;
/// Shortest period accepted; `interval` panics on zero.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owner of a running poll. Dropping it stops the poll.
#[derive(Debug)]
pub struct PollHandle {
    stopped: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops future ticks and discards results still in flight.
    pub fn stop(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stopped.send_replace(true);
    }
}

/// Starts polling `fetch` every `period`, with the first tick immediately.
/// Results arrive on the returned receiver in completion order. A period
/// below [`MIN_PERIOD`] is raised to it.
pub fn spawn_poll<T, F, Fut>(
    period: Duration,
    fetch: F,
) -> (PollHandle, mpsc::Receiver<Result<T, AppError>>)
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
{
    let period = period.max(MIN_PERIOD);
    let (stopped, mut stop_rx) = watch::channel(false);
    let (tx, rx) = mpsc::channel(RESULT_BUFFER);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }
            if *stop_rx.borrow() || tx.is_closed() {
                break;
            }

            let pending = fetch();
            let tx = tx.clone();
            let tick_stop = stop_rx.clone();
            tokio::spawn(async move {
                let result = pending.await;
                if let Err(err) = &result {
                    debug!("poll tick failed: {err}");
                }
                if !*tick_stop.borrow() {
                    let _ = tx.send(result).await;
                }
            });
        }
        debug!("poll stopped");
    });

    (PollHandle { stopped, task }, rx)
}
