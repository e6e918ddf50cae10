//! The `BudgetStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `pennyboard-store-sqlite`). The import engine depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  income::{ExpectedIncome, IncomeSource, NewExpectedIncome, NewIncomeSource},
  ledger::{NewSplit, NewTransaction, NewTransfer, Split, Transaction, Transfer},
  period::{NewPeriod, Period, PeriodContents},
  planning::{Cycle, Item, NewCycle, NewItem, NewWatchItem, WatchItem},
};

/// Abstraction over a Pennyboard budget store backend.
///
/// Every `create_*` method persists the row immediately and returns it with
/// its surrogate id assigned, so children can reference a parent created a
/// moment earlier, even inside an open transaction.
///
/// Deleting a period must cascade to everything it owns: expected income,
/// watch items, cycles and their items, transactions and their splits, and
/// transfers. Income sources are not owned by a period.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait BudgetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Transactions ──────────────────────────────────────────────────────

  /// Open a transaction. Writes until [`Self::commit`] or [`Self::rollback`]
  /// belong to it.
  fn begin(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Discard every write since [`Self::begin`].
  fn rollback(&self)
  -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Periods ───────────────────────────────────────────────────────────

  fn create_period(
    &self,
    input: NewPeriod,
  ) -> impl Future<Output = Result<Period, Self::Error>> + Send + '_;

  /// Retrieve a period by surrogate id. Returns `None` if not found.
  fn get_period(
    &self,
    period_id: i64,
  ) -> impl Future<Output = Result<Option<Period>, Self::Error>> + Send + '_;

  /// Look a period up by its unique key.
  fn find_period<'a>(
    &'a self,
    user_id: &'a str,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Period>, Self::Error>> + Send + 'a;

  /// List a user's periods, most recent start date first.
  fn list_periods<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Period>, Self::Error>> + Send + 'a;

  /// Delete a period and, by cascade, everything it owns. Returns `false` if
  /// no such period existed.
  fn delete_period(
    &self,
    period_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Income sources ────────────────────────────────────────────────────

  fn create_income_source(
    &self,
    input: NewIncomeSource,
  ) -> impl Future<Output = Result<IncomeSource, Self::Error>> + Send + '_;

  /// Look an income source up by its unique key.
  fn find_income_source<'a>(
    &'a self,
    user_id: &'a str,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<IncomeSource>, Self::Error>> + Send + 'a;

  fn list_income_sources<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<IncomeSource>, Self::Error>> + Send + 'a;

  // ── Period-owned rows ─────────────────────────────────────────────────

  fn create_expected_income(
    &self,
    input: NewExpectedIncome,
  ) -> impl Future<Output = Result<ExpectedIncome, Self::Error>> + Send + '_;

  fn create_watch_item(
    &self,
    input: NewWatchItem,
  ) -> impl Future<Output = Result<WatchItem, Self::Error>> + Send + '_;

  fn create_cycle(
    &self,
    input: NewCycle,
  ) -> impl Future<Output = Result<Cycle, Self::Error>> + Send + '_;

  fn create_item(
    &self,
    input: NewItem,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  fn create_transaction(
    &self,
    input: NewTransaction,
  ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send + '_;

  fn create_split(
    &self,
    input: NewSplit,
  ) -> impl Future<Output = Result<Split, Self::Error>> + Send + '_;

  fn create_transfer(
    &self,
    input: NewTransfer,
  ) -> impl Future<Output = Result<Transfer, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Assemble a [`PeriodContents`] — the period and every row it owns.
  /// Returns `None` if the period does not exist.
  fn load_period_contents(
    &self,
    period_id: i64,
  ) -> impl Future<Output = Result<Option<PeriodContents>, Self::Error>> + Send + '_;
}
