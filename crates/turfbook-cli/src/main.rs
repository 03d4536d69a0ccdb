//! `turfbook` — command-line access to a canvassing snapshot.
//!
//! # Usage
//!
//! ```text
//! turfbook init
//! turfbook route --all
//! turfbook note voter 12 "left lit" --disposition attempted
//! turfbook --config ~/hd25/turfbook.toml export-geojson --out doors.geojson
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::Command;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "turfbook", version, about = "Canvassing turf store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "turfbook.toml")]
  config: PathBuf,

  /// Snapshot file; overrides `snapshot_path` from the config.
  #[arg(long, value_name = "FILE")]
  snapshot: Option<PathBuf>,

  /// Commit without rotating a backup of the previous snapshot.
  #[arg(long)]
  no_backup: bool,

  #[command(subcommand)]
  command: Command,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(snapshot) = cli.snapshot {
    settings.snapshot_path = snapshot;
  }
  if cli.no_backup {
    settings.backup = false;
  }

  commands::run(cli.command, &settings)
}
