//! Administrative feature: metrics, model management and account unlocks over
//! the privileged admin client, plus the dashboard poller.

pub mod client;
pub mod poll;
pub mod types;

pub use client::AdminClient;
pub use poll::{spawn_poll, PollHandle};
