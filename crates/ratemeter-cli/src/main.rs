use ratemeter_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // The status line owns the terminal; fall back to stderr only if the log
    // file cannot be opened.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("ratemeter error: {:#}", err);
        std::process::exit(1);
    }
}
