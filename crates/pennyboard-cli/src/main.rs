//! pennyboard binary.
//!
//! Opens the SQLite budget store named in `pennyboard.toml` (or the path
//! given with `--config`) and imports or inspects budget periods. Results are
//! printed to stdout as JSON; logs go to stderr.
//!
//! ```text
//! pennyboard import march.json
//! pennyboard --user alice periods
//! pennyboard show 2025-03
//! ```

mod settings;

use std::{
  io::Read as _,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pennyboard_core::store::BudgetStore;
use pennyboard_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser)]
#[command(author, version, about = "Pennyboard budget importer")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pennyboard.toml")]
  config: PathBuf,

  /// User id to act as; defaults to `default_user` from the config.
  #[arg(short, long, global = true)]
  user: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Import a budget JSON document. Use `-` to read from stdin.
  Import { file: PathBuf },
  /// List the user's periods.
  Periods,
  /// Print everything stored for one period.
  Show {
    /// The period's id as it appears in the imported document.
    external_id: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing. Stdout is reserved for command output.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let user_id = cli.user.unwrap_or_else(|| settings.default_user.clone());

  if let Some(parent) = settings.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  tracing::debug!(store = ?settings.store_path, user_id = %user_id, "store opened");

  match cli.command {
    Command::Import { file } => {
      let json = read_document(&file)?;
      let summary = pennyboard_import::import_budget(&store, &user_id, &json)
        .await
        .with_context(|| format!("failed to import {file:?}"))?;
      print_json(&summary)
    }
    Command::Periods => {
      let periods = store
        .list_periods(&user_id)
        .await
        .context("failed to list periods")?;
      print_json(&periods)
    }
    Command::Show { external_id } => {
      let period = store
        .find_period(&user_id, &external_id)
        .await
        .context("failed to look up period")?
        .with_context(|| format!("no period {external_id:?} for user {user_id:?}"))?;
      let contents = store
        .load_period_contents(period.period_id)
        .await
        .context("failed to load period")?
        .with_context(|| format!("period {external_id:?} disappeared"))?;
      print_json(&contents)
    }
  }
}

/// Read the whole document from `path`, or from stdin when `path` is `-`.
fn read_document(path: &Path) -> anyhow::Result<String> {
  if path.as_os_str() == "-" {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .context("failed to read stdin")?;
    return Ok(buf);
  }
  std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
