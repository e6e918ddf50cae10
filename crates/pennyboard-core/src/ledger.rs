//! The ledger side of a period: transactions, their splits, and transfers
//! between budget items.
//!
//! Every reference to a budget item is stored twice: the raw string from the
//! source document, and the item's surrogate id when the reference could be
//! resolved during import. An unresolved reference keeps its raw text and a
//! `None` id.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Transactions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub transaction_id:  i64,
  pub period_id:       i64,
  pub external_id:     Option<String>,
  pub date:            NaiveDate,
  pub description:     String,
  pub amount:          Decimal,
  /// Free-text kind as supplied by the source (e.g. "expense", "income").
  pub kind:            String,
  pub source_ref:      Option<String>,
  pub linked_item_ref: Option<String>,
  pub linked_item_id:  Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
  pub period_id:       i64,
  pub external_id:     Option<String>,
  pub date:            NaiveDate,
  pub description:     String,
  pub amount:          Decimal,
  pub kind:            String,
  pub source_ref:      Option<String>,
  pub linked_item_ref: Option<String>,
  pub linked_item_id:  Option<i64>,
}

// ─── Splits ──────────────────────────────────────────────────────────────────

/// A portion of a transaction attributed to a (possibly different) item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
  pub split_id:        i64,
  pub transaction_id:  i64,
  pub linked_item_ref: Option<String>,
  pub linked_item_id:  Option<i64>,
  pub amount:          Decimal,
  pub note:            Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSplit {
  pub transaction_id:  i64,
  pub linked_item_ref: Option<String>,
  pub linked_item_id:  Option<i64>,
  pub amount:          Decimal,
  pub note:            Option<String>,
}

// ─── Transfers ───────────────────────────────────────────────────────────────

/// Money moved from one budget item to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
  pub transfer_id:  i64,
  pub period_id:    i64,
  pub external_id:  Option<String>,
  pub date:         NaiveDate,
  pub amount:       Decimal,
  pub note:         Option<String>,
  pub from_ref:     Option<String>,
  pub from_item_id: Option<i64>,
  pub to_ref:       Option<String>,
  pub to_item_id:   Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
  pub period_id:    i64,
  pub external_id:  Option<String>,
  pub date:         NaiveDate,
  pub amount:       Decimal,
  pub note:         Option<String>,
  pub from_ref:     Option<String>,
  pub from_item_id: Option<i64>,
  pub to_ref:       Option<String>,
  pub to_item_id:   Option<i64>,
}
