//! Throughput and ETA estimation for long-running, byte-oriented tasks.

pub mod config;
pub mod logging;

pub mod clock;
pub mod estimator;
pub mod stream;

pub use estimator::{Progress, ProgressOptions, Status};
