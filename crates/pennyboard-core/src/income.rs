//! Income sources and the expected-income schedule.
//!
//! Income sources are global to a user rather than owned by a period, so
//! they survive period reimports. Expected-income rows are period-scoped and
//! carry the source's external id as raw text; nothing resolves it to an
//! [`IncomeSource::income_source_id`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named source of income, deduplicated by `(user_id, external_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSource {
  pub income_source_id: i64,
  pub user_id:          String,
  pub external_id:      String,
  pub name:             String,
  pub image:            Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIncomeSource {
  pub user_id:     String,
  pub external_id: String,
  pub name:        String,
  pub image:       Option<String>,
}

/// A paycheck or other deposit the user expects during a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedIncome {
  pub expected_income_id: i64,
  pub period_id:          i64,
  /// External id of the income source, stored exactly as received.
  pub source_ref:         Option<String>,
  pub amount:             Decimal,
  pub date:               NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewExpectedIncome {
  pub period_id:  i64,
  pub source_ref: Option<String>,
  pub amount:     Decimal,
  pub date:       NaiveDate,
}
