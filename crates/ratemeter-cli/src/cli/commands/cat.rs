//! `ratemeter cat` – copy a file or stdin while drawing throughput and ETA.

use anyhow::{Context, Result};
use ratemeter_core::config::{MeterConfig, ProgressMode};
use ratemeter_core::stream::{stderr_if_terminal, ProgressReader, CHUNK_LIMIT};
use ratemeter_core::ProgressOptions;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

/// Resolved arguments of `ratemeter cat`.
#[derive(Debug, Clone)]
pub struct CatArgs {
    pub input: String,
    pub output: Option<String>,
    pub size: Option<u64>,
    pub window_ms: Option<u64>,
    pub progress: ProgressMode,
}

pub fn run_cat(cfg: &MeterConfig, args: &CatArgs) -> Result<()> {
    let (input, input_len) = open_input(&args.input)?;
    let total = args.size.or(input_len);

    let mut options = ProgressOptions::from_config(cfg);
    if let Some(ms) = args.window_ms {
        options = options.with_window(Duration::from_millis(ms));
    }
    let limit = cfg.chunk_limit_bytes.unwrap_or(CHUNK_LIMIT);

    let mut sink = match args.progress {
        ProgressMode::Auto => stderr_if_terminal(),
        ProgressMode::Always => Some(io::stderr()),
        ProgressMode::Never => None,
    };

    let copied = match &args.output {
        Some(path) if path != "-" => {
            let file = File::create(path).with_context(|| format!("cannot create {path}"))?;
            let mut out = BufWriter::new(file);
            let n = copy_with_progress(input, &mut out, sink.as_mut(), total, options, limit)?;
            out.flush().with_context(|| format!("cannot write {path}"))?;
            n
        }
        _ => {
            let mut out = io::stdout().lock();
            copy_with_progress(input, &mut out, sink.as_mut(), total, options, limit)?
        }
    };

    tracing::info!(
        input = %args.input,
        bytes = copied,
        total = ?total,
        "copy finished"
    );
    Ok(())
}

/// Open `input` (`-` is stdin) and report its length when it is a regular file.
fn open_input(input: &str) -> Result<(Box<dyn Read>, Option<u64>)> {
    if input == "-" {
        return Ok((Box::new(io::stdin().lock()), None));
    }
    let path = Path::new(input);
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let meta = file
        .metadata()
        .with_context(|| format!("cannot stat {}", path.display()))?;
    let len = meta.is_file().then(|| meta.len());
    Ok((Box::new(file), len))
}

/// Copy `input` to `output` through a [`ProgressReader`]. When a status sink
/// is attached the status line is terminated with a newline afterwards.
fn copy_with_progress<R: Read, O: Write, W: Write>(
    input: R,
    output: &mut O,
    mut sink: Option<W>,
    total: Option<u64>,
    options: ProgressOptions,
    limit: usize,
) -> Result<u64> {
    let mut reader =
        ProgressReader::new(sink.as_mut(), input, total, options).with_chunk_limit(limit);
    let copied = io::copy(&mut reader, output).context("copy failed")?;
    let status = reader.status();
    drop(reader);
    tracing::debug!(copied, %status, "last status");

    if let Some(out) = sink.as_mut() {
        if let Err(err) = writeln!(out).and_then(|()| out.flush()) {
            tracing::trace!(%err, "status line not terminated");
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratemeter_core::clock::ManualClock;
    use std::fs;

    fn args(input: &Path, output: &Path) -> CatArgs {
        CatArgs {
            input: input.display().to_string(),
            output: Some(output.display().to_string()),
            size: None,
            window_ms: None,
            progress: ProgressMode::Never,
        }
    }

    #[test]
    fn cat_copies_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.bin");
        let dst = dir.path().join("out.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &data).unwrap();

        let cfg = MeterConfig {
            chunk_limit_bytes: Some(4096),
            ..MeterConfig::default()
        };
        run_cat(&cfg, &args(&src, &dst)).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn cat_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing");
        let dst = dir.path().join("out");
        let err = run_cat(&MeterConfig::default(), &args(&src, &dst)).unwrap_err();
        assert!(format!("{err:#}").contains("cannot open"));
    }

    #[test]
    fn open_input_reports_file_length() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0u8; 1234]).unwrap();
        let (_, len) = open_input(&f.path().display().to_string()).unwrap();
        assert_eq!(len, Some(1234));
    }

    #[test]
    fn status_line_ends_with_newline() {
        let clock = ManualClock::new();
        let mut out = Vec::new();
        let mut status = Vec::new();
        let n = copy_with_progress(
            &b"hello"[..],
            &mut out,
            Some(&mut status),
            Some(5),
            ProgressOptions::default().with_clock(clock),
            CHUNK_LIMIT,
        )
        .unwrap();
        assert_eq!(n, 5);
        assert_eq!(out, b"hello");
        // the clock never moved, so only the terminating newline is written
        assert_eq!(status, b"\n");
    }

    #[test]
    fn broken_sink_does_not_fail_the_copy() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut out = Vec::new();
        let n = copy_with_progress(
            &b"data"[..],
            &mut out,
            Some(Closed),
            Some(4),
            ProgressOptions::default().with_clock(ManualClock::new()),
            CHUNK_LIMIT,
        )
        .unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, b"data");
    }

    #[test]
    fn no_sink_writes_nothing_extra() {
        let mut out = Vec::new();
        let n = copy_with_progress(
            &b"abc"[..],
            &mut out,
            None::<Vec<u8>>,
            None,
            ProgressOptions::default(),
            2,
        )
        .unwrap();
        assert_eq!(n, 3);
        assert_eq!(out, b"abc");
    }
}
