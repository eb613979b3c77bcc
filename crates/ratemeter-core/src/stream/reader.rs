use std::io::{self, Read, Write};

use super::{record, stderr_if_terminal, CHUNK_LIMIT};
use crate::estimator::{Progress, ProgressOptions, Status};

/// Reader that counts bytes read from `inner` and redraws the status line on
/// `output` whenever a new time bucket begins.
///
/// Errors from `inner` are returned unchanged and nothing is drawn for them.
pub struct ProgressReader<R, W> {
    inner: R,
    output: Option<W>,
    progress: Progress,
    limit: usize,
}

impl<R: Read, W: Write> ProgressReader<R, W> {
    /// Wrap `inner`, drawing on `output` if given. `total` is the expected
    /// number of bytes, `None` if unknown.
    pub fn new(output: Option<W>, inner: R, total: Option<u64>, options: ProgressOptions) -> Self {
        Self {
            inner,
            output,
            progress: Progress::with_options(total, options),
            limit: CHUNK_LIMIT,
        }
    }

    /// Cap each delegated read at `limit` bytes (at least one).
    #[must_use]
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

impl<R: Read> ProgressReader<R, io::Stderr> {
    /// Wrap `inner`, drawing on stderr only when stderr is a terminal.
    pub fn stderr(inner: R, total: Option<u64>, options: ProgressOptions) -> Self {
        Self::new(stderr_if_terminal(), inner, total, options)
    }
}

impl<R, W> ProgressReader<R, W> {
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn status(&self) -> Status {
        self.progress.status()
    }

    /// True if a sink is attached.
    pub fn is_displaying(&self) -> bool {
        self.output.is_some()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read, W: Write> Read for ProgressReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.limit);
        let n = self.inner.read(&mut buf[..len])?;
        record(&mut self.progress, self.output.as_mut(), n);
        Ok(n)
    }
}
