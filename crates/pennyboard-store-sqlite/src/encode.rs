//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`. Money is stored as decimal text
//! so no precision is lost to floating point.

use std::str::FromStr as _;

use chrono::NaiveDate;
use pennyboard_core::{
  Decimal,
  income::ExpectedIncome,
  ledger::{Split, Transaction, Transfer},
  period::Period,
  planning::{Item, WatchItem},
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> {
  Decimal::from_str(s).map_err(|e| Error::DecimalParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `periods` row.
pub struct RawPeriod {
  pub period_id:       i64,
  pub user_id:         String,
  pub external_id:     String,
  pub display_name:    String,
  pub start_date:      String,
  pub initial_balance: String,
}

/// Column list matching [`RawPeriod::from_row`].
pub const PERIOD_COLUMNS: &str =
  "period_id, user_id, external_id, display_name, start_date, initial_balance";

impl RawPeriod {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      period_id:       row.get(0)?,
      user_id:         row.get(1)?,
      external_id:     row.get(2)?,
      display_name:    row.get(3)?,
      start_date:      row.get(4)?,
      initial_balance: row.get(5)?,
    })
  }

  pub fn into_period(self) -> Result<Period> {
    Ok(Period {
      period_id:       self.period_id,
      user_id:         self.user_id,
      external_id:     self.external_id,
      display_name:    self.display_name,
      start_date:      decode_date(&self.start_date)?,
      initial_balance: decode_decimal(&self.initial_balance)?,
    })
  }
}

/// Raw values read directly from an `expected_income` row.
pub struct RawExpectedIncome {
  pub expected_income_id: i64,
  pub period_id:          i64,
  pub source_ref:         Option<String>,
  pub amount:             String,
  pub date:               String,
}

impl RawExpectedIncome {
  pub fn into_expected_income(self) -> Result<ExpectedIncome> {
    Ok(ExpectedIncome {
      expected_income_id: self.expected_income_id,
      period_id:          self.period_id,
      source_ref:         self.source_ref,
      amount:             decode_decimal(&self.amount)?,
      date:               decode_date(&self.date)?,
    })
  }
}

/// Raw values read directly from a `watch_items` row.
pub struct RawWatchItem {
  pub watch_item_id: i64,
  pub period_id:     i64,
  pub description:   String,
  pub amount:        String,
  pub due_date:      Option<String>,
  pub image:         Option<String>,
}

impl RawWatchItem {
  pub fn into_watch_item(self) -> Result<WatchItem> {
    Ok(WatchItem {
      watch_item_id: self.watch_item_id,
      period_id:     self.period_id,
      description:   self.description,
      amount:        decode_decimal(&self.amount)?,
      due_date:      self.due_date.as_deref().map(decode_date).transpose()?,
      image:         self.image,
    })
  }
}

/// Raw values read directly from an `items` row.
pub struct RawItem {
  pub item_id:        i64,
  pub cycle_id:       i64,
  pub external_id:    Option<String>,
  pub name:           String,
  pub planned_amount: String,
  pub carried_over:   String,
  pub image:          Option<String>,
}

impl RawItem {
  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:        self.item_id,
      cycle_id:       self.cycle_id,
      external_id:    self.external_id,
      name:           self.name,
      planned_amount: decode_decimal(&self.planned_amount)?,
      carried_over:   decode_decimal(&self.carried_over)?,
      image:          self.image,
    })
  }
}

/// Raw values read directly from a `transactions` row.
pub struct RawTransaction {
  pub transaction_id:  i64,
  pub period_id:       i64,
  pub external_id:     Option<String>,
  pub date:            String,
  pub description:     String,
  pub amount:          String,
  pub kind:            String,
  pub source_ref:      Option<String>,
  pub linked_item_ref: Option<String>,
  pub linked_item_id:  Option<i64>,
}

impl RawTransaction {
  pub fn into_transaction(self) -> Result<Transaction> {
    Ok(Transaction {
      transaction_id:  self.transaction_id,
      period_id:       self.period_id,
      external_id:     self.external_id,
      date:            decode_date(&self.date)?,
      description:     self.description,
      amount:          decode_decimal(&self.amount)?,
      kind:            self.kind,
      source_ref:      self.source_ref,
      linked_item_ref: self.linked_item_ref,
      linked_item_id:  self.linked_item_id,
    })
  }
}

/// Raw values read directly from a `splits` row.
pub struct RawSplit {
  pub split_id:        i64,
  pub transaction_id:  i64,
  pub linked_item_ref: Option<String>,
  pub linked_item_id:  Option<i64>,
  pub amount:          String,
  pub note:            Option<String>,
}

impl RawSplit {
  pub fn into_split(self) -> Result<Split> {
    Ok(Split {
      split_id:        self.split_id,
      transaction_id:  self.transaction_id,
      linked_item_ref: self.linked_item_ref,
      linked_item_id:  self.linked_item_id,
      amount:          decode_decimal(&self.amount)?,
      note:            self.note,
    })
  }
}

/// Raw values read directly from a `transfers` row.
pub struct RawTransfer {
  pub transfer_id:  i64,
  pub period_id:    i64,
  pub external_id:  Option<String>,
  pub date:         String,
  pub amount:       String,
  pub note:         Option<String>,
  pub from_ref:     Option<String>,
  pub from_item_id: Option<i64>,
  pub to_ref:       Option<String>,
  pub to_item_id:   Option<i64>,
}

impl RawTransfer {
  pub fn into_transfer(self) -> Result<Transfer> {
    Ok(Transfer {
      transfer_id:  self.transfer_id,
      period_id:    self.period_id,
      external_id:  self.external_id,
      date:         decode_date(&self.date)?,
      amount:       decode_decimal(&self.amount)?,
      note:         self.note,
      from_ref:     self.from_ref,
      from_item_id: self.from_item_id,
      to_ref:       self.to_ref,
      to_item_id:   self.to_item_id,
    })
  }
}
