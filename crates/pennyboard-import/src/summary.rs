//! What an import did, per period.

use serde::Serialize;
use uuid::Uuid;

/// The outcome of one [`crate::import_budget`] call.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
  /// Random id for this call; also recorded on the `import` tracing span.
  pub import_id: Uuid,
  /// One entry per imported period, in document order.
  pub periods:   Vec<PeriodSummary>,
}

impl ImportSummary {
  /// `true` when the document described no periods and nothing was written.
  pub fn is_empty(&self) -> bool { self.periods.is_empty() }
}

/// Row counts for a single imported period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
  pub external_id:             String,
  pub period_id:               i64,
  /// A period with the same external id existed and was deleted first.
  pub replaced:                bool,
  pub income_sources_created:  usize,
  /// Income sources that already existed and were left untouched.
  pub income_sources_existing: usize,
  pub expected_income:         usize,
  pub watch_items:             usize,
  pub cycles:                  usize,
  pub items:                   usize,
  pub transactions:            usize,
  pub splits:                  usize,
  pub transfers:               usize,
  /// Item references (transaction links, split links, transfer endpoints)
  /// that did not match any item created earlier in this import.
  pub unresolved_refs:         usize,
}
