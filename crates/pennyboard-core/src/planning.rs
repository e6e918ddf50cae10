//! The planning side of a period: the watch list, paycheck cycles, and the
//! budget items allotted out of each cycle.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Watch list ──────────────────────────────────────────────────────────────

/// An upcoming expense the user wants to keep an eye on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchItem {
  pub watch_item_id: i64,
  pub period_id:     i64,
  pub description:   String,
  pub amount:        Decimal,
  /// `None` when the due date is not yet known or could not be read.
  pub due_date:      Option<NaiveDate>,
  pub image:         Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWatchItem {
  pub period_id:   i64,
  pub description: String,
  pub amount:      Decimal,
  pub due_date:    Option<NaiveDate>,
  pub image:       Option<String>,
}

// ─── Cycles ──────────────────────────────────────────────────────────────────

/// One paycheck cycle within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
  pub cycle_id:     i64,
  pub period_id:    i64,
  pub cycle_number: i64,
  pub label:        String,
}

#[derive(Debug, Clone)]
pub struct NewCycle {
  pub period_id:    i64,
  pub cycle_number: i64,
  pub label:        String,
}

// ─── Budget items ────────────────────────────────────────────────────────────

/// A budget line item within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:        i64,
  pub cycle_id:       i64,
  /// Id used by ledger entries and transfers in the source document to refer
  /// to this item.
  pub external_id:    Option<String>,
  pub name:           String,
  pub planned_amount: Decimal,
  pub carried_over:   Decimal,
  pub image:          Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
  pub cycle_id:       i64,
  pub external_id:    Option<String>,
  pub name:           String,
  pub planned_amount: Decimal,
  pub carried_over:   Decimal,
  pub image:          Option<String>,
}
