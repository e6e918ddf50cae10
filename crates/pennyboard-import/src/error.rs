//! Error type for `pennyboard-import`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
  /// The document is not valid JSON. Raised before anything is written.
  #[error("malformed budget document: {0}")]
  MalformedJson(#[from] serde_json::Error),

  /// The backing store failed; the current period has been rolled back.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ImportError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
