//! `ratemeter config` – show where the config lives and what is in effect.

use anyhow::Result;
use ratemeter_core::config::{self, MeterConfig};
use ratemeter_core::stream::CHUNK_LIMIT;
use ratemeter_core::Progress;
use ratemeter_core::ProgressOptions;

pub fn run_config(cfg: &MeterConfig) -> Result<()> {
    let path = config::config_path()?;
    let window = Progress::with_options(None, ProgressOptions::from_config(cfg)).window();
    println!("config file:  {}", path.display());
    println!("window:       {:?} (configured {} ms)", window, cfg.window_ms);
    println!("progress:     {:?}", cfg.progress);
    println!(
        "chunk limit:  {} bytes",
        cfg.chunk_limit_bytes.unwrap_or(CHUNK_LIMIT)
    );
    Ok(())
}
