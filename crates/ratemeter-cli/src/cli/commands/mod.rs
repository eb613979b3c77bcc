//! CLI command handlers, one file per command.

mod cat;
mod completions;
mod config;

pub use cat::{run_cat, CatArgs};
pub use completions::run_completions;
pub use config::run_config;
