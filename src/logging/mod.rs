//! Console logging: the tracing subscriber and the [`Logger`] façade.

mod logger;
mod subscriber;

pub use logger::{DirEntry, DirStatus, Logger};
pub use subscriber::{init_subscriber, level_for};
