//! Budget import reconciliation for Pennyboard.
//!
//! Reads the JSON budget documents exported by the budgeting front end and
//! reconciles them into rows of any [`BudgetStore`]. Cross references in the
//! document are human-readable ids; they are resolved to surrogate keys while
//! importing.
//!
//! # Policies
//!
//! - **Periods are replaced.** Importing a period whose `(user, id)` already
//!   exists deletes the old period and everything it owns first.
//! - **Income sources are created once.** An income source whose
//!   `(user, id)` already exists is left exactly as it is.
//! - **References never fail an import.** An item reference that does not
//!   match an item created earlier in the same period import keeps its raw
//!   text and gets no resolved id.
//!
//! # Quick start
//!
//! ```rust,ignore
//! let summary = pennyboard_import::import_budget(&store, "user-1", &json).await?;
//! for period in &summary.periods {
//!   println!("{} -> {}", period.external_id, period.period_id);
//! }
//! ```

pub mod dates;
pub mod document;
mod error;
mod pipeline;
mod resolve;
mod summary;

pub use document::{PeriodDocument, normalize};
pub use error::{ImportError, Result};
use pennyboard_core::store::BudgetStore;
pub use resolve::ItemIdMap;
pub use summary::{ImportSummary, PeriodSummary};
use tracing::Instrument as _;
use uuid::Uuid;

/// Parse `json` and import every period it describes for `user_id`.
///
/// A syntax error in `json` fails before anything is written. A document
/// describing no periods is a successful, empty import.
pub async fn import_budget<S: BudgetStore>(
  store: &S,
  user_id: &str,
  json: &str,
) -> Result<ImportSummary> {
  let periods = normalize(json)?;
  import_periods(store, user_id, periods).await
}

/// Import already-normalized periods for `user_id`, in order.
///
/// Each period is committed on its own. The first failing period is rolled
/// back and aborts the call; periods before it stay committed.
pub async fn import_periods<S: BudgetStore>(
  store: &S,
  user_id: &str,
  periods: Vec<PeriodDocument>,
) -> Result<ImportSummary> {
  let import_id = Uuid::new_v4();
  let span = tracing::info_span!("import", %import_id, user_id);

  async move {
    let mut summary = ImportSummary {
      import_id,
      periods: Vec::with_capacity(periods.len()),
    };

    if periods.is_empty() {
      tracing::info!("document describes no periods; nothing to import");
      return Ok(summary);
    }

    for doc in &periods {
      summary
        .periods
        .push(pipeline::import_period(store, user_id, doc).await?);
    }

    tracing::info!(periods = summary.periods.len(), "import complete");
    Ok(summary)
  }
  .instrument(span)
  .await
}

#[cfg(test)]
mod tests;
