//! End-to-end import tests against an in-memory `SqliteStore`.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use pennyboard_core::{
  Decimal,
  income::{ExpectedIncome, IncomeSource, NewExpectedIncome, NewIncomeSource},
  ledger::{NewSplit, NewTransaction, NewTransfer, Split, Transaction, Transfer},
  period::{NewPeriod, Period, PeriodContents},
  planning::{Cycle, Item, NewCycle, NewItem, NewWatchItem, WatchItem},
  store::BudgetStore,
};
use pennyboard_store_sqlite::SqliteStore;
use serde_json::{Value, json};

use crate::{ImportError, import_budget};

const USER: &str = "user-1";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(s: &str) -> Decimal { s.parse().unwrap() }

/// A period exercising every section of the document.
fn march() -> Value {
  json!({
    "id": "2025-03",
    "displayName": "March",
    "startDate": "2025-03-01",
    "initialBankBalance": 1520.75,
    "incomeSources": [
      { "id": "S1", "name": "Employer", "image": "employer.png" }
    ],
    "expectedIncome": [
      { "sourceId": "S1", "amount": 2100, "date": "2025-03-15" },
      { "sourceId": "S9", "amount": "950.00", "date": "whenever" }
    ],
    "watchList": [
      { "description": "Car registration", "amount": 89.5, "dueDate": "TBD" },
      { "description": "Dentist", "amount": 40, "dueDate": "not-a-date" },
      { "description": "Insurance", "amount": 120, "dueDate": "2025-03-20", "image": "shield.png" }
    ],
    "paycheckCycles": [
      { "cycleId": 1, "label": "First", "budgetItems": [
        { "id": "I1", "name": "Groceries", "plannedAmount": 400, "carriedOver": 12.25 },
        { "id": "I2", "name": "Gas", "plannedAmount": 120 }
      ]},
      { "cycleId": 2, "label": "Second", "budgetItems": [
        { "id": "I3", "name": "Rent", "plannedAmount": 1200 }
      ]}
    ],
    "ledger": [
      { "id": "T1", "date": "2025-03-03", "description": "Market", "amount": 54.2,
        "type": "expense", "linkedBudgetItemId": "I1",
        "splits": [
          { "linkedBudgetItemId": "I2", "amount": 20, "note": "fuel" },
          { "linkedBudgetItemId": "I404" }
        ] },
      { "id": "T2", "date": "garbage", "description": "Mystery", "amount": 5,
        "type": "expense", "linkedBudgetItemId": "NOPE" }
    ],
    "transfers": [
      { "id": "X1", "date": "2025-03-05", "amount": 25, "fromBudgetId": "I1", "toBudgetId": "I3" },
      { "id": "X2", "amount": 10, "fromId": "I2", "toId": "I99", "note": "legacy" }
    ]
  })
}

async fn contents_of(s: &SqliteStore, external_id: &str) -> PeriodContents {
  let period = s
    .find_period(USER, external_id)
    .await
    .unwrap()
    .expect("period exists");
  s.load_period_contents(period.period_id).await.unwrap().unwrap()
}

fn item_id(contents: &PeriodContents, external_id: &str) -> i64 {
  contents
    .items()
    .find(|i| i.external_id.as_deref() == Some(external_id))
    .map(|i| i.item_id)
    .expect("item exists")
}

/// Serialise `contents` with every numeric `*_id` replaced by a marker, so
/// two imports can be compared independently of the surrogate keys they got.
fn without_surrogate_ids(contents: &PeriodContents) -> Value {
  fn scrub(v: &mut Value) {
    match v {
      Value::Object(map) => {
        for (k, v) in map.iter_mut() {
          if k.ends_with("_id") && v.is_number() {
            *v = Value::String("#".into());
          } else {
            scrub(v);
          }
        }
      }
      Value::Array(items) => items.iter_mut().for_each(scrub),
      _ => {}
    }
  }

  let mut v = serde_json::to_value(contents).unwrap();
  scrub(&mut v);
  v
}

// ─── Basic import ────────────────────────────────────────────────────────────

#[tokio::test]
async fn imports_every_section() {
  let s = store().await;

  let summary = import_budget(&s, USER, &march().to_string()).await.unwrap();
  assert_eq!(summary.periods.len(), 1);
  let ps = &summary.periods[0];
  assert_eq!(ps.external_id, "2025-03");
  assert!(!ps.replaced);
  assert_eq!(ps.income_sources_created, 1);
  assert_eq!(ps.expected_income, 2);
  assert_eq!(ps.watch_items, 3);
  assert_eq!(ps.cycles, 2);
  assert_eq!(ps.items, 3);
  assert_eq!(ps.transactions, 2);
  assert_eq!(ps.splits, 2);
  assert_eq!(ps.transfers, 2);
  assert_eq!(ps.unresolved_refs, 3);

  let c = contents_of(&s, "2025-03").await;
  assert_eq!(c.period.period_id, ps.period_id);
  assert_eq!(c.period.display_name, "March");
  assert_eq!(c.period.start_date, date(2025, 3, 1));
  assert_eq!(c.period.initial_balance, dec("1520.75"));

  let labels: Vec<_> = c.cycles.iter().map(|c| c.cycle.label.as_str()).collect();
  assert_eq!(labels, ["First", "Second"]);
  assert_eq!(c.cycles[0].items[0].carried_over, dec("12.25"));
  assert_eq!(c.cycles[0].items[1].carried_over, Decimal::ZERO);
}

#[tokio::test]
async fn expected_income_keeps_raw_source_and_falls_back_to_start() {
  let s = store().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();

  let c = contents_of(&s, "2025-03").await;
  assert_eq!(c.expected_income[0].source_ref.as_deref(), Some("S1"));
  assert_eq!(c.expected_income[0].date, date(2025, 3, 15));
  // S9 is not a known income source; it is stored as-is.
  assert_eq!(c.expected_income[1].source_ref.as_deref(), Some("S9"));
  assert_eq!(c.expected_income[1].amount, dec("950"));
  assert_eq!(c.expected_income[1].date, date(2025, 3, 1));
}

#[tokio::test]
async fn tbd_and_unparseable_due_dates_are_both_null() {
  let s = store().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();

  let c = contents_of(&s, "2025-03").await;
  let due: Vec<_> = c.watch_list.iter().map(|w| w.due_date).collect();
  assert_eq!(due, [None, None, Some(date(2025, 3, 20))]);
  assert_eq!(c.watch_list[2].image.as_deref(), Some("shield.png"));
}

#[tokio::test]
async fn missing_start_date_falls_back_to_today() {
  let s = store().await;
  let doc = json!({ "id": "P", "startDate": "someday", "ledger": [{ "id": "T" }] });

  import_budget(&s, USER, &doc.to_string()).await.unwrap();

  let c = contents_of(&s, "P").await;
  let today = Utc::now().date_naive();
  // Tolerate a midnight rollover between import and assertion.
  assert!(c.period.start_date == today || c.period.start_date.succ_opt() == Some(today));
  assert_eq!(c.period.display_name, "P");
  assert_eq!(c.period.initial_balance, Decimal::ZERO);
  assert_eq!(c.ledger[0].transaction.date, c.period.start_date);
}

// ─── Reference resolution ────────────────────────────────────────────────────

#[tokio::test]
async fn transaction_link_resolves_to_item_created_in_same_import() {
  let s = store().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();

  let c = contents_of(&s, "2025-03").await;
  let t1 = &c.ledger[0];
  assert_eq!(t1.transaction.linked_item_ref.as_deref(), Some("I1"));
  assert_eq!(t1.transaction.linked_item_id, Some(item_id(&c, "I1")));

  assert_eq!(t1.splits[0].linked_item_id, Some(item_id(&c, "I2")));
  assert_eq!(t1.splits[0].amount, dec("20"));
  assert_eq!(t1.splits[0].note.as_deref(), Some("fuel"));
}

#[tokio::test]
async fn unknown_item_reference_is_kept_raw_and_unresolved() {
  let s = store().await;
  let summary = import_budget(&s, USER, &march().to_string()).await.unwrap();
  assert_eq!(summary.periods.len(), 1);

  let c = contents_of(&s, "2025-03").await;
  let t2 = &c.ledger[1].transaction;
  assert_eq!(t2.linked_item_ref.as_deref(), Some("NOPE"));
  assert_eq!(t2.linked_item_id, None);
  assert_eq!(t2.date, date(2025, 3, 1));

  let orphan_split = &c.ledger[0].splits[1];
  assert_eq!(orphan_split.linked_item_ref.as_deref(), Some("I404"));
  assert_eq!(orphan_split.linked_item_id, None);
  assert_eq!(orphan_split.amount, Decimal::ZERO);
}

#[tokio::test]
async fn transfer_legacy_keys_resolve_like_budget_id_keys() {
  let s = store().await;
  let doc = json!({
    "id": "P",
    "paycheckCycles": [{ "cycleId": 1, "budgetItems": [{ "id": "I2" }, { "id": "I5" }] }],
    "transfers": [
      { "fromBudgetId": "I2", "toBudgetId": "I5", "amount": 1 },
      { "fromId": "I2", "toId": "I5", "amount": 1 },
      { "fromBudgetId": "I5", "fromId": "I2", "amount": 1 }
    ]
  });

  import_budget(&s, USER, &doc.to_string()).await.unwrap();

  let c = contents_of(&s, "P").await;
  let (i2, i5) = (item_id(&c, "I2"), item_id(&c, "I5"));
  let [modern, legacy, both] = &c.transfers[..] else {
    panic!("expected three transfers");
  };

  assert_eq!(modern.from_item_id, Some(i2));
  assert_eq!(legacy.from_item_id, Some(i2));
  assert_eq!(legacy.from_ref.as_deref(), Some("I2"));
  assert_eq!(modern.to_item_id, legacy.to_item_id);
  assert_eq!(legacy.to_item_id, Some(i5));

  // The budget-id key wins for both the raw reference and the lookup.
  assert_eq!(both.from_ref.as_deref(), Some("I5"));
  assert_eq!(both.from_item_id, Some(i5));
  assert_eq!(both.to_ref, None);
  assert_eq!(both.to_item_id, None);
}

#[tokio::test]
async fn transfers_resolve_and_fall_back_to_period_start() {
  let s = store().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();

  let c = contents_of(&s, "2025-03").await;
  let x1 = &c.transfers[0];
  assert_eq!(x1.from_item_id, Some(item_id(&c, "I1")));
  assert_eq!(x1.to_item_id, Some(item_id(&c, "I3")));
  assert_eq!(x1.date, date(2025, 3, 5));

  let x2 = &c.transfers[1];
  assert_eq!(x2.from_item_id, Some(item_id(&c, "I2")));
  assert_eq!(x2.to_ref.as_deref(), Some("I99"));
  assert_eq!(x2.to_item_id, None);
  assert_eq!(x2.date, date(2025, 3, 1));
  assert_eq!(x2.note.as_deref(), Some("legacy"));
}

#[tokio::test]
async fn duplicate_item_ids_resolve_to_the_later_item() {
  let s = store().await;
  let doc = json!({
    "id": "P",
    "paycheckCycles": [
      { "cycleId": 1, "budgetItems": [{ "id": "DUP", "name": "first" }] },
      { "cycleId": 2, "budgetItems": [{ "id": "DUP", "name": "second" }] }
    ],
    "ledger": [{ "id": "T", "linkedBudgetItemId": "DUP" }]
  });

  import_budget(&s, USER, &doc.to_string()).await.unwrap();

  let c = contents_of(&s, "P").await;
  let second = &c.cycles[1].items[0];
  assert_eq!(second.name, "second");
  assert_eq!(c.ledger[0].transaction.linked_item_id, Some(second.item_id));
}

#[tokio::test]
async fn item_map_does_not_cross_periods() {
  let s = store().await;
  let doc = json!({
    "periods": [
      { "id": "A", "paycheckCycles": [{ "budgetItems": [{ "id": "I1" }] }] },
      { "id": "B", "ledger": [{ "id": "T", "linkedBudgetItemId": "I1" }] }
    ]
  });

  let summary = import_budget(&s, USER, &doc.to_string()).await.unwrap();
  assert_eq!(summary.periods.len(), 2);
  assert_eq!(summary.periods[1].unresolved_refs, 1);

  let b = contents_of(&s, "B").await;
  assert_eq!(b.ledger[0].transaction.linked_item_id, None);
}

// ─── Reimport ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reimporting_identical_document_is_idempotent() {
  let s = store().await;
  let json = march().to_string();

  import_budget(&s, USER, &json).await.unwrap();
  let first = contents_of(&s, "2025-03").await;

  let summary = import_budget(&s, USER, &json).await.unwrap();
  assert!(summary.periods[0].replaced);
  assert_eq!(summary.periods[0].income_sources_existing, 1);
  let second = contents_of(&s, "2025-03").await;

  assert_eq!(s.list_periods(USER).await.unwrap().len(), 1);
  assert_eq!(s.list_income_sources(USER).await.unwrap().len(), 1);
  assert_eq!(without_surrogate_ids(&first), without_surrogate_ids(&second));

  // Resolved ids point at the new items, not the deleted ones.
  assert_eq!(
    second.ledger[0].transaction.linked_item_id,
    Some(item_id(&second, "I1"))
  );
}

#[tokio::test]
async fn reimport_replaces_cycles_and_keeps_income_sources() {
  let s = store().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();
  let old = contents_of(&s, "2025-03").await;
  let sources_before = s.list_income_sources(USER).await.unwrap();

  let revised = json!({
    "id": "2025-03",
    "displayName": "March (revised)",
    "paycheckCycles": [
      { "cycleId": 7, "label": "Only", "budgetItems": [{ "id": "N1", "name": "New" }] }
    ]
  });
  import_budget(&s, USER, &revised.to_string()).await.unwrap();

  assert!(s.get_period(old.period.period_id).await.unwrap().is_none());

  let new = contents_of(&s, "2025-03").await;
  assert_eq!(new.period.display_name, "March (revised)");
  assert_eq!(new.cycles.len(), 1);
  assert_eq!(new.cycles[0].cycle.cycle_number, 7);
  assert_eq!(new.cycles[0].items[0].external_id.as_deref(), Some("N1"));
  assert!(new.ledger.is_empty());
  assert!(new.transfers.is_empty());
  assert!(new.watch_list.is_empty());
  assert!(new.expected_income.is_empty());

  assert_eq!(s.list_income_sources(USER).await.unwrap(), sources_before);
}

#[tokio::test]
async fn income_source_first_write_wins() {
  let s = store().await;
  let first = json!({
    "id": "P1",
    "incomeSources": [{ "id": "S1", "name": "Acme Payroll", "imgUrl": "acme.png" }]
  });
  let second = json!({
    "id": "P2",
    "incomeSources": [{ "id": "S1", "name": "Renamed", "image": "other.png" }]
  });

  import_budget(&s, USER, &first.to_string()).await.unwrap();
  let summary = import_budget(&s, USER, &second.to_string()).await.unwrap();
  assert_eq!(summary.periods[0].income_sources_created, 0);
  assert_eq!(summary.periods[0].income_sources_existing, 1);

  let source = s.find_income_source(USER, "S1").await.unwrap().unwrap();
  assert_eq!(source.name, "Acme Payroll");
  assert_eq!(source.image.as_deref(), Some("acme.png"));
}

#[tokio::test]
async fn income_sources_are_scoped_per_user_and_need_an_id() {
  let s = store().await;
  let doc = json!({
    "id": "P",
    "incomeSources": [
      { "id": "S1", "name": "Mine" },
      { "name": "No id" },
      { "id": "S1", "name": "Same payload duplicate" }
    ]
  });

  let summary = import_budget(&s, USER, &doc.to_string()).await.unwrap();
  assert_eq!(summary.periods[0].income_sources_created, 1);
  assert_eq!(summary.periods[0].income_sources_existing, 1);

  import_budget(&s, "user-2", &doc.to_string()).await.unwrap();

  let mine = s.list_income_sources(USER).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].name, "Mine");
  assert_eq!(s.list_income_sources("user-2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_external_id_for_different_users_is_independent() {
  let s = store().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();
  import_budget(&s, "user-2", &march().to_string()).await.unwrap();

  let summary = import_budget(&s, USER, &march().to_string()).await.unwrap();
  assert!(summary.periods[0].replaced);

  assert_eq!(s.list_periods(USER).await.unwrap().len(), 1);
  assert_eq!(s.list_periods("user-2").await.unwrap().len(), 1);
}

// ─── No-op and malformed documents ───────────────────────────────────────────

#[tokio::test]
async fn documents_without_periods_are_successful_no_ops() {
  let s = store().await;

  for doc in [r#"{ "periods": [] }"#, r#"{ "displayName": "no id" }"#, "[]"] {
    let summary = import_budget(&s, USER, doc).await.unwrap();
    assert!(summary.is_empty(), "{doc}");
  }

  assert!(s.list_periods(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_writes_nothing() {
  let s = store().await;

  let err = import_budget(&s, USER, r#"{ "periods": [ { "id": "A" } "#)
    .await
    .unwrap_err();
  assert!(matches!(err, ImportError::MalformedJson(_)));
  assert!(s.list_periods(USER).await.unwrap().is_empty());
}

// ─── Store failures ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error(transparent)]
  Sqlite(#[from] pennyboard_store_sqlite::Error),
  #[error("injected transfer failure")]
  Injected,
}

/// Delegates to a `SqliteStore` but fails every transfer insert while
/// `fail_transfers` is set.
struct FlakyStore {
  inner:          SqliteStore,
  fail_transfers: AtomicBool,
}

impl FlakyStore {
  async fn new() -> Self {
    Self { inner: store().await, fail_transfers: AtomicBool::new(false) }
  }
}

impl BudgetStore for FlakyStore {
  type Error = FlakyError;

  async fn begin(&self) -> Result<(), FlakyError> { Ok(self.inner.begin().await?) }

  async fn commit(&self) -> Result<(), FlakyError> { Ok(self.inner.commit().await?) }

  async fn rollback(&self) -> Result<(), FlakyError> {
    Ok(self.inner.rollback().await?)
  }

  async fn create_period(&self, input: NewPeriod) -> Result<Period, FlakyError> {
    Ok(self.inner.create_period(input).await?)
  }

  async fn get_period(&self, period_id: i64) -> Result<Option<Period>, FlakyError> {
    Ok(self.inner.get_period(period_id).await?)
  }

  async fn find_period(
    &self,
    user_id: &str,
    external_id: &str,
  ) -> Result<Option<Period>, FlakyError> {
    Ok(self.inner.find_period(user_id, external_id).await?)
  }

  async fn list_periods(&self, user_id: &str) -> Result<Vec<Period>, FlakyError> {
    Ok(self.inner.list_periods(user_id).await?)
  }

  async fn delete_period(&self, period_id: i64) -> Result<bool, FlakyError> {
    Ok(self.inner.delete_period(period_id).await?)
  }

  async fn create_income_source(
    &self,
    input: NewIncomeSource,
  ) -> Result<IncomeSource, FlakyError> {
    Ok(self.inner.create_income_source(input).await?)
  }

  async fn find_income_source(
    &self,
    user_id: &str,
    external_id: &str,
  ) -> Result<Option<IncomeSource>, FlakyError> {
    Ok(self.inner.find_income_source(user_id, external_id).await?)
  }

  async fn list_income_sources(
    &self,
    user_id: &str,
  ) -> Result<Vec<IncomeSource>, FlakyError> {
    Ok(self.inner.list_income_sources(user_id).await?)
  }

  async fn create_expected_income(
    &self,
    input: NewExpectedIncome,
  ) -> Result<ExpectedIncome, FlakyError> {
    Ok(self.inner.create_expected_income(input).await?)
  }

  async fn create_watch_item(&self, input: NewWatchItem) -> Result<WatchItem, FlakyError> {
    Ok(self.inner.create_watch_item(input).await?)
  }

  async fn create_cycle(&self, input: NewCycle) -> Result<Cycle, FlakyError> {
    Ok(self.inner.create_cycle(input).await?)
  }

  async fn create_item(&self, input: NewItem) -> Result<Item, FlakyError> {
    Ok(self.inner.create_item(input).await?)
  }

  async fn create_transaction(
    &self,
    input: NewTransaction,
  ) -> Result<Transaction, FlakyError> {
    Ok(self.inner.create_transaction(input).await?)
  }

  async fn create_split(&self, input: NewSplit) -> Result<Split, FlakyError> {
    Ok(self.inner.create_split(input).await?)
  }

  async fn create_transfer(&self, input: NewTransfer) -> Result<Transfer, FlakyError> {
    if self.fail_transfers.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected);
    }
    Ok(self.inner.create_transfer(input).await?)
  }

  async fn load_period_contents(
    &self,
    period_id: i64,
  ) -> Result<Option<PeriodContents>, FlakyError> {
    Ok(self.inner.load_period_contents(period_id).await?)
  }
}

#[tokio::test]
async fn failed_reimport_rolls_back_and_keeps_previous_version() {
  let s = FlakyStore::new().await;
  import_budget(&s, USER, &march().to_string()).await.unwrap();
  let before = contents_of(&s.inner, "2025-03").await;

  s.fail_transfers.store(true, Ordering::SeqCst);
  let mut revised = march();
  revised["displayName"] = json!("Should not stick");
  revised["incomeSources"] = json!([{ "id": "S2", "name": "Side gig" }]);

  let err = import_budget(&s, USER, &revised.to_string()).await.unwrap_err();
  assert!(matches!(err, ImportError::Store(_)));

  let after = contents_of(&s.inner, "2025-03").await;
  assert_eq!(after.period, before.period);
  assert_eq!(without_surrogate_ids(&after), without_surrogate_ids(&before));
  assert_eq!(after.ledger[0].transaction, before.ledger[0].transaction);

  // The income source created before the failure is rolled back too.
  assert!(s.inner.find_income_source(USER, "S2").await.unwrap().is_none());
}

#[tokio::test]
async fn failure_aborts_remaining_periods_but_keeps_earlier_ones() {
  let s = FlakyStore::new().await;
  s.fail_transfers.store(true, Ordering::SeqCst);

  let doc = json!({
    "periods": [
      { "id": "A", "ledger": [{ "id": "T1" }] },
      { "id": "B", "transfers": [{ "id": "X1", "amount": 1 }] },
      { "id": "C" }
    ]
  });

  let err = import_budget(&s, USER, &doc.to_string()).await.unwrap_err();
  assert!(matches!(err, ImportError::Store(_)));

  let ids: Vec<_> = s
    .inner
    .list_periods(USER)
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.external_id)
    .collect();
  assert_eq!(ids, ["A"]);
}
