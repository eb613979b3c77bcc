use std::io::{self, Write};

use super::{record, stderr_if_terminal, CHUNK_LIMIT};
use crate::estimator::{Progress, ProgressOptions, Status};

/// Writer that counts bytes accepted by `inner` and redraws the status line
/// on `output` whenever a new time bucket begins.
///
/// Only successful writes are counted and drawn; errors from `inner` are
/// returned unchanged.
pub struct ProgressWriter<Wr, W> {
    inner: Wr,
    output: Option<W>,
    progress: Progress,
    limit: usize,
}

impl<Wr: Write, W: Write> ProgressWriter<Wr, W> {
    /// Wrap `inner`, drawing on `output` if given. `total` is the expected
    /// number of bytes, `None` if unknown.
    pub fn new(output: Option<W>, inner: Wr, total: Option<u64>, options: ProgressOptions) -> Self {
        Self {
            inner,
            output,
            progress: Progress::with_options(total, options),
            limit: CHUNK_LIMIT,
        }
    }

    /// Cap each delegated write at `limit` bytes (at least one).
    #[must_use]
    pub fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

impl<Wr: Write> ProgressWriter<Wr, io::Stderr> {
    /// Wrap `inner`, drawing on stderr only when stderr is a terminal.
    pub fn stderr(inner: Wr, total: Option<u64>, options: ProgressOptions) -> Self {
        Self::new(stderr_if_terminal(), inner, total, options)
    }
}

impl<Wr, W> ProgressWriter<Wr, W> {
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn status(&self) -> Status {
        self.progress.status()
    }

    pub fn is_displaying(&self) -> bool {
        self.output.is_some()
    }

    pub fn get_ref(&self) -> &Wr {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut Wr {
        &mut self.inner
    }

    pub fn into_inner(self) -> Wr {
        self.inner
    }
}

impl<Wr: Write, W: Write> Write for ProgressWriter<Wr, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len().min(self.limit);
        let n = self.inner.write(&buf[..len])?;
        record(&mut self.progress, self.output.as_mut(), n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    /// Sink that accepts everything and moves the clock 100 ms per write.
    struct Ticking {
        data: Vec<u8>,
        clock: ManualClock,
    }

    impl Write for Ticking {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            self.clock.advance(Duration::from_millis(100));
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_all_is_split_into_chunks() {
        let clock = ManualClock::new();
        let inner = Ticking {
            data: Vec::new(),
            clock: clock.clone(),
        };
        let mut out = Vec::new();
        let mut w = ProgressWriter::new(
            Some(&mut out),
            inner,
            Some(4096),
            ProgressOptions::default().with_clock(clock.clone()),
        )
        .with_chunk_limit(512);
        w.write_all(&[3u8; 4096]).unwrap();
        w.flush().unwrap();

        assert_eq!(w.progress().done(), 4096);
        // eight chunks, one clock tick each
        assert_eq!(clock.elapsed(), Duration::from_millis(800));
        assert_eq!(w.get_ref().data.len(), 4096);
        drop(w);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\r').count(), 8);
        assert!(text.contains("B/s"));
    }

    #[test]
    fn successful_writes_draw_status() {
        let clock = ManualClock::new();
        let mut out = Vec::new();
        let mut w = ProgressWriter::new(
            Some(&mut out),
            Vec::new(),
            None,
            ProgressOptions::default().with_clock(clock.clone()),
        );
        w.write_all(b"hello").unwrap();
        clock.advance(Duration::from_millis(100));
        w.write_all(b"world").unwrap();
        assert_eq!(w.status().done, 5);
        assert_eq!(w.get_ref().as_slice(), b"helloworld");
        drop(w);
        assert_eq!(out, b"\r50 B/s\x1b[K");
    }

    #[test]
    fn failed_writes_are_not_counted() {
        let mut out = Vec::new();
        let mut w = ProgressWriter::new(Some(&mut out), Full, Some(10), ProgressOptions::default());
        let err = w.write(b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(w.progress().done(), 0);
        drop(w);
        assert!(out.is_empty());
    }
}
