//! Budget document normalizer.
//!
//! Maps the loosely-structured JSON produced by the budgeting front end into
//! fixed-shape [`PeriodDocument`] values, once, at the boundary. Everything
//! downstream works on these structs and never touches `serde_json::Value`.
//!
//! Two root shapes are accepted:
//!
//! ```text
//! { "periods": [ <Period>, ... ] }      wrapper
//! { "id": "...", ... }                  a single flat period
//! ```
//!
//! Property names match case-insensitively. Scalars are coerced tolerantly:
//! a value of the wrong type reads as absent rather than failing the import.

use std::str::FromStr as _;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::Result;

// ─── Canonical shape ─────────────────────────────────────────────────────────

/// One budgeting period as described by the source document.
///
/// Dates are kept as raw text: the fallback for an unreadable date depends
/// on the period start, which is only settled during import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodDocument {
  pub external_id:     String,
  pub display_name:    Option<String>,
  pub start_date:      Option<String>,
  pub initial_balance: Option<Decimal>,
  pub income_sources:  Vec<IncomeSourceEntry>,
  pub expected_income: Vec<ExpectedIncomeEntry>,
  pub watch_list:      Vec<WatchEntry>,
  pub cycles:          Vec<CycleEntry>,
  pub ledger:          Vec<LedgerEntry>,
  pub transfers:       Vec<TransferEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeSourceEntry {
  pub external_id: Option<String>,
  pub name:        Option<String>,
  /// `image`, falling back to the legacy `imgUrl`.
  pub image:       Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedIncomeEntry {
  pub source_id: Option<String>,
  pub amount:    Option<Decimal>,
  pub date:      Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchEntry {
  pub description: Option<String>,
  pub amount:      Option<Decimal>,
  pub due_date:    Option<String>,
  pub image:       Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleEntry {
  pub cycle_number: Option<i64>,
  pub label:        Option<String>,
  pub items:        Vec<ItemEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemEntry {
  pub external_id:    Option<String>,
  pub name:           Option<String>,
  pub planned_amount: Option<Decimal>,
  pub carried_over:   Option<Decimal>,
  pub image:          Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerEntry {
  pub external_id:    Option<String>,
  pub date:           Option<String>,
  pub description:    Option<String>,
  pub amount:         Option<Decimal>,
  pub kind:           Option<String>,
  pub source_id:      Option<String>,
  pub linked_item_id: Option<String>,
  pub splits:         Vec<SplitEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitEntry {
  pub linked_item_id: Option<String>,
  pub amount:         Option<Decimal>,
  pub note:           Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferEntry {
  pub external_id: Option<String>,
  pub date:        Option<String>,
  pub amount:      Option<Decimal>,
  pub note:        Option<String>,
  /// `fromBudgetId`, falling back to the legacy `fromId`.
  pub from:        Option<String>,
  /// `toBudgetId`, falling back to the legacy `toId`.
  pub to:          Option<String>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Parse `json` and return every period it describes.
///
/// Only a top-level JSON syntax error is an error. A document matching
/// neither root shape yields an empty list.
pub fn normalize(json: &str) -> Result<Vec<PeriodDocument>> {
  let root: Value = serde_json::from_str(json)?;
  let Some(root) = root.as_object().map(Fields) else {
    return Ok(Vec::new());
  };

  let wrapped = root.objects("periods");
  if !wrapped.is_empty() {
    return Ok(wrapped.into_iter().map(read_period).collect());
  }

  let single = read_period(root);
  if single.external_id.is_empty() {
    return Ok(Vec::new());
  }
  Ok(vec![single])
}

fn read_period(f: Fields<'_>) -> PeriodDocument {
  PeriodDocument {
    external_id:     f.string("id").unwrap_or_default(),
    display_name:    f.string("displayName"),
    start_date:      f.string("startDate"),
    initial_balance: f.amount("initialBankBalance"),
    income_sources:  f
      .objects("incomeSources")
      .into_iter()
      .map(|s| IncomeSourceEntry {
        external_id: s.string("id"),
        name:        s.string("name"),
        image:       s.first_string(&["image", "imgUrl"]),
      })
      .collect(),
    expected_income: f
      .objects("expectedIncome")
      .into_iter()
      .map(|e| ExpectedIncomeEntry {
        source_id: e.string("sourceId"),
        amount:    e.amount("amount"),
        date:      e.string("date"),
      })
      .collect(),
    watch_list:      f
      .objects("watchList")
      .into_iter()
      .map(|w| WatchEntry {
        description: w.string("description"),
        amount:      w.amount("amount"),
        due_date:    w.string("dueDate"),
        image:       w.string("image"),
      })
      .collect(),
    cycles:          f.objects("paycheckCycles").into_iter().map(read_cycle).collect(),
    ledger:          f.objects("ledger").into_iter().map(read_ledger_entry).collect(),
    transfers:       f
      .objects("transfers")
      .into_iter()
      .map(|t| TransferEntry {
        external_id: t.string("id"),
        date:        t.string("date"),
        amount:      t.amount("amount"),
        note:        t.string("note"),
        from:        t.first_string(&["fromBudgetId", "fromId"]),
        to:          t.first_string(&["toBudgetId", "toId"]),
      })
      .collect(),
  }
}

fn read_cycle(c: Fields<'_>) -> CycleEntry {
  CycleEntry {
    cycle_number: c.integer("cycleId"),
    label:        c.string("label"),
    items:        c
      .objects("budgetItems")
      .into_iter()
      .map(|i| ItemEntry {
        external_id:    i.string("id"),
        name:           i.string("name"),
        planned_amount: i.amount("plannedAmount"),
        carried_over:   i.amount("carriedOver"),
        image:          i.string("image"),
      })
      .collect(),
  }
}

fn read_ledger_entry(t: Fields<'_>) -> LedgerEntry {
  LedgerEntry {
    external_id:    t.string("id"),
    date:           t.string("date"),
    description:    t.string("description"),
    amount:         t.amount("amount"),
    kind:           t.string("type"),
    source_id:      t.string("sourceId"),
    linked_item_id: t.string("linkedBudgetItemId"),
    splits:         t
      .objects("splits")
      .into_iter()
      .map(|s| SplitEntry {
        linked_item_id: s.string("linkedBudgetItemId"),
        amount:         s.amount("amount"),
        note:           s.string("note"),
      })
      .collect(),
  }
}

// ─── Tolerant field access ───────────────────────────────────────────────────

/// A JSON object viewed through case-insensitive, type-tolerant accessors.
#[derive(Clone, Copy)]
struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
  /// Exact-case match first, then the first ASCII case-insensitive match.
  fn get(&self, key: &str) -> Option<&'a Value> {
    self.0.get(key).or_else(|| {
      self
        .0
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
    })
  }

  /// Text value of `key`. Numbers and booleans are rendered as text; empty
  /// strings read as absent.
  fn string(&self, key: &str) -> Option<String> {
    let s = match self.get(key)? {
      Value::String(s) => s.clone(),
      Value::Number(n) => n.to_string(),
      Value::Bool(b) => b.to_string(),
      _ => return None,
    };
    (!s.trim().is_empty()).then_some(s)
  }

  /// The first of `keys` holding a non-empty string.
  fn first_string(&self, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| self.string(k))
  }

  fn amount(&self, key: &str) -> Option<Decimal> {
    match self.get(key)? {
      Value::Number(n) => parse_decimal(&n.to_string()),
      Value::String(s) => parse_decimal(s),
      _ => None,
    }
  }

  fn integer(&self, key: &str) -> Option<i64> {
    match self.get(key)? {
      Value::Number(n) => n.as_i64().or_else(|| {
        n.as_f64()
          .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
          .map(|f| f as i64)
      }),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  /// Object elements of the array at `key`. Anything else reads as empty.
  fn objects(&self, key: &str) -> Vec<Fields<'a>> {
    match self.get(key) {
      Some(Value::Array(items)) => {
        items.iter().filter_map(Value::as_object).map(Fields).collect()
      }
      _ => Vec::new(),
    }
  }
}

/// Parse a money amount, tolerating whitespace, a leading `$`, thousands
/// separators, and scientific notation.
fn parse_decimal(raw: &str) -> Option<Decimal> {
  let trimmed = raw.trim();
  let (negative, unsigned) = match trimmed.strip_prefix('-') {
    Some(rest) => (true, rest.trim_start()),
    None => (false, trimmed),
  };
  let cleaned: String = unsigned
    .strip_prefix('$')
    .unwrap_or(unsigned)
    .chars()
    .filter(|c| *c != ',')
    .collect();
  if cleaned.is_empty() {
    return None;
  }

  let value = Decimal::from_str(&cleaned)
    .or_else(|_| Decimal::from_scientific(&cleaned))
    .ok()?;
  Some(if negative { -value } else { value })
}
