//! Runtime configuration, read from `pennyboard.toml` and `PENNYBOARD_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

const DEFAULT_STORE_PATH: &str = "~/.local/share/pennyboard/pennyboard.db";
const DEFAULT_USER: &str = "local";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path:   PathBuf,
  /// User id imports are scoped to when `--user` is not given.
  pub default_user: String,
}

impl Settings {
  /// Layer defaults, the optional config file at `path`, and the
  /// environment, in that order.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", DEFAULT_STORE_PATH)?
      .set_default("default_user", DEFAULT_USER)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PENNYBOARD"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
