//! Byte-counting stream adaptors that feed a [`Progress`] and redraw the
//! status line on a terminal sink.
//!
//! Each wrapped read or write is capped at a chunk limit (1 MiB by default) so
//! that large buffers still produce visible intermediate progress.

mod reader;
mod writer;

pub use reader::ProgressReader;
pub use writer::ProgressWriter;

use std::io::{self, IsTerminal, Write};

use crate::estimator::{Progress, Status};

/// Largest single read/write delegated to the wrapped stream.
pub const CHUNK_LIMIT: usize = 1 << 20;

/// Move to column 0.
const CR: &str = "\r";
/// Clear from cursor to end of line.
const CLEAR_LINE: &str = "\x1b[K";

/// Stderr when it is attached to a terminal; `None` for files and pipes, so
/// redirected output is never cluttered with status lines.
pub fn stderr_if_terminal() -> Option<io::Stderr> {
    let stderr = io::stderr();
    stderr.is_terminal().then_some(stderr)
}

/// Count `n` units and redraw the status line if a bucket boundary passed.
fn record<W: Write>(progress: &mut Progress, output: Option<&mut W>, n: usize) {
    let changed = progress.update(n as u64);
    if let (true, Some(out)) = (changed, output) {
        draw(out, &progress.status());
    }
}

/// Best effort: a failing sink must not fail the transfer.
fn draw<W: Write>(out: &mut W, status: &Status) {
    let res = write!(out, "{CR}{status}{CLEAR_LINE}").and_then(|()| out.flush());
    if let Err(err) = res {
        tracing::trace!(%err, "status line not written");
    }
}
