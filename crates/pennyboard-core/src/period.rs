//! Period — the budgeting window that owns every imported row.
//!
//! A period is identified to the outside world by `(user_id, external_id)`.
//! Reimporting the same pair replaces the period wholesale; see
//! [`crate::store::BudgetStore::delete_period`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  income::ExpectedIncome,
  ledger::{Split, Transaction, Transfer},
  planning::{Cycle, Item, WatchItem},
};

/// A persisted budgeting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
  pub period_id:       i64,
  pub user_id:         String,
  /// The human-readable id carried by the source document.
  pub external_id:     String,
  pub display_name:    String,
  pub start_date:      NaiveDate,
  pub initial_balance: Decimal,
}

/// Input to [`crate::store::BudgetStore::create_period`].
#[derive(Debug, Clone)]
pub struct NewPeriod {
  pub user_id:         String,
  pub external_id:     String,
  pub display_name:    String,
  pub start_date:      NaiveDate,
  pub initial_balance: Decimal,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A cycle together with the items that belong to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleWithItems {
  pub cycle: Cycle,
  pub items: Vec<Item>,
}

/// A transaction together with its splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithSplits {
  pub transaction: Transaction,
  pub splits:      Vec<Split>,
}

/// Everything owned by a period, in insertion order. Never stored, always
/// assembled on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodContents {
  pub period:          Period,
  pub expected_income: Vec<ExpectedIncome>,
  pub watch_list:      Vec<WatchItem>,
  pub cycles:          Vec<CycleWithItems>,
  pub ledger:          Vec<TransactionWithSplits>,
  pub transfers:       Vec<Transfer>,
}

impl PeriodContents {
  /// Iterate over every item in every cycle.
  pub fn items(&self) -> impl Iterator<Item = &Item> {
    self.cycles.iter().flat_map(|c| c.items.iter())
  }

  /// Iterate over every split in every transaction.
  pub fn splits(&self) -> impl Iterator<Item = &Split> {
    self.ledger.iter().flat_map(|t| t.splits.iter())
  }
}
