//! [`SqliteStore`] — the SQLite implementation of [`BudgetStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use pennyboard_core::{
  income::{ExpectedIncome, IncomeSource, NewExpectedIncome, NewIncomeSource},
  ledger::{NewSplit, NewTransaction, NewTransfer, Split, Transaction, Transfer},
  period::{CycleWithItems, NewPeriod, Period, PeriodContents, TransactionWithSplits},
  planning::{Cycle, Item, NewCycle, NewItem, NewWatchItem, WatchItem},
  store::BudgetStore,
};

use crate::{
  Result,
  encode::{
    PERIOD_COLUMNS, RawExpectedIncome, RawItem, RawPeriod, RawSplit,
    RawTransaction, RawTransfer, RawWatchItem, encode_date, encode_decimal,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Pennyboard budget store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All clones
/// share one connection, and therefore one open transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single `INSERT` and return the new row's id.
  async fn insert(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(sql, rusqlite::params_from_iter(params))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }
}

fn text(s: impl Into<String>) -> rusqlite::types::Value {
  rusqlite::types::Value::Text(s.into())
}

fn opt_text(s: Option<String>) -> rusqlite::types::Value {
  s.map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Text)
}

fn int(i: i64) -> rusqlite::types::Value { rusqlite::types::Value::Integer(i) }

fn opt_int(i: Option<i64>) -> rusqlite::types::Value {
  i.map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Integer)
}

// ─── BudgetStore impl ────────────────────────────────────────────────────────

impl BudgetStore for SqliteStore {
  type Error = crate::Error;

  // ── Transactions ──────────────────────────────────────────────────────────

  async fn begin(&self) -> Result<()> { self.execute_batch("BEGIN").await }

  async fn commit(&self) -> Result<()> { self.execute_batch("COMMIT").await }

  async fn rollback(&self) -> Result<()> {
    self.execute_batch("ROLLBACK").await
  }

  // ── Periods ───────────────────────────────────────────────────────────────

  async fn create_period(&self, input: NewPeriod) -> Result<Period> {
    let period_id = self
      .insert(
        "INSERT INTO periods (
           user_id, external_id, display_name, start_date, initial_balance
         ) VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          text(input.user_id.clone()),
          text(input.external_id.clone()),
          text(input.display_name.clone()),
          text(encode_date(input.start_date)),
          text(encode_decimal(input.initial_balance)),
        ],
      )
      .await?;

    Ok(Period {
      period_id,
      user_id: input.user_id,
      external_id: input.external_id,
      display_name: input.display_name,
      start_date: input.start_date,
      initial_balance: input.initial_balance,
    })
  }

  async fn get_period(&self, period_id: i64) -> Result<Option<Period>> {
    let raw: Option<RawPeriod> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERIOD_COLUMNS} FROM periods WHERE period_id = ?1"),
            rusqlite::params![period_id],
            RawPeriod::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPeriod::into_period).transpose()
  }

  async fn find_period(
    &self,
    user_id: &str,
    external_id: &str,
  ) -> Result<Option<Period>> {
    let user_id     = user_id.to_owned();
    let external_id = external_id.to_owned();

    let raw: Option<RawPeriod> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PERIOD_COLUMNS} FROM periods
               WHERE user_id = ?1 AND external_id = ?2"
            ),
            rusqlite::params![user_id, external_id],
            RawPeriod::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPeriod::into_period).transpose()
  }

  async fn list_periods(&self, user_id: &str) -> Result<Vec<Period>> {
    let user_id = user_id.to_owned();

    let raws: Vec<RawPeriod> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERIOD_COLUMNS} FROM periods
           WHERE user_id = ?1
           ORDER BY start_date DESC, period_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawPeriod::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPeriod::into_period).collect()
  }

  async fn delete_period(&self, period_id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM periods WHERE period_id = ?1",
          rusqlite::params![period_id],
        )?)
      })
      .await?;

    tracing::debug!(period_id, deleted, "deleted period");
    Ok(deleted > 0)
  }

  // ── Income sources ────────────────────────────────────────────────────────

  async fn create_income_source(
    &self,
    input: NewIncomeSource,
  ) -> Result<IncomeSource> {
    let income_source_id = self
      .insert(
        "INSERT INTO income_sources (user_id, external_id, name, image)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          text(input.user_id.clone()),
          text(input.external_id.clone()),
          text(input.name.clone()),
          opt_text(input.image.clone()),
        ],
      )
      .await?;

    Ok(IncomeSource {
      income_source_id,
      user_id: input.user_id,
      external_id: input.external_id,
      name: input.name,
      image: input.image,
    })
  }

  async fn find_income_source(
    &self,
    user_id: &str,
    external_id: &str,
  ) -> Result<Option<IncomeSource>> {
    let user_id     = user_id.to_owned();
    let external_id = external_id.to_owned();

    let source = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT income_source_id, user_id, external_id, name, image
             FROM income_sources
             WHERE user_id = ?1 AND external_id = ?2",
            rusqlite::params![user_id, external_id],
            income_source_from_row,
          )
          .optional()?)
      })
      .await?;

    Ok(source)
  }

  async fn list_income_sources(&self, user_id: &str) -> Result<Vec<IncomeSource>> {
    let user_id = user_id.to_owned();

    let sources = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT income_source_id, user_id, external_id, name, image
           FROM income_sources
           WHERE user_id = ?1
           ORDER BY income_source_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], income_source_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(sources)
  }

  // ── Period-owned rows ─────────────────────────────────────────────────────

  async fn create_expected_income(
    &self,
    input: NewExpectedIncome,
  ) -> Result<ExpectedIncome> {
    let expected_income_id = self
      .insert(
        "INSERT INTO expected_income (period_id, source_ref, amount, date)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          int(input.period_id),
          opt_text(input.source_ref.clone()),
          text(encode_decimal(input.amount)),
          text(encode_date(input.date)),
        ],
      )
      .await?;

    Ok(ExpectedIncome {
      expected_income_id,
      period_id: input.period_id,
      source_ref: input.source_ref,
      amount: input.amount,
      date: input.date,
    })
  }

  async fn create_watch_item(&self, input: NewWatchItem) -> Result<WatchItem> {
    let watch_item_id = self
      .insert(
        "INSERT INTO watch_items (period_id, description, amount, due_date, image)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          int(input.period_id),
          text(input.description.clone()),
          text(encode_decimal(input.amount)),
          opt_text(input.due_date.map(encode_date)),
          opt_text(input.image.clone()),
        ],
      )
      .await?;

    Ok(WatchItem {
      watch_item_id,
      period_id: input.period_id,
      description: input.description,
      amount: input.amount,
      due_date: input.due_date,
      image: input.image,
    })
  }

  async fn create_cycle(&self, input: NewCycle) -> Result<Cycle> {
    let cycle_id = self
      .insert(
        "INSERT INTO cycles (period_id, cycle_number, label) VALUES (?1, ?2, ?3)",
        vec![
          int(input.period_id),
          int(input.cycle_number),
          text(input.label.clone()),
        ],
      )
      .await?;

    Ok(Cycle {
      cycle_id,
      period_id: input.period_id,
      cycle_number: input.cycle_number,
      label: input.label,
    })
  }

  async fn create_item(&self, input: NewItem) -> Result<Item> {
    let item_id = self
      .insert(
        "INSERT INTO items (
           cycle_id, external_id, name, planned_amount, carried_over, image
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        vec![
          int(input.cycle_id),
          opt_text(input.external_id.clone()),
          text(input.name.clone()),
          text(encode_decimal(input.planned_amount)),
          text(encode_decimal(input.carried_over)),
          opt_text(input.image.clone()),
        ],
      )
      .await?;

    Ok(Item {
      item_id,
      cycle_id: input.cycle_id,
      external_id: input.external_id,
      name: input.name,
      planned_amount: input.planned_amount,
      carried_over: input.carried_over,
      image: input.image,
    })
  }

  async fn create_transaction(&self, input: NewTransaction) -> Result<Transaction> {
    let transaction_id = self
      .insert(
        "INSERT INTO transactions (
           period_id, external_id, date, description, amount, kind,
           source_ref, linked_item_ref, linked_item_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        vec![
          int(input.period_id),
          opt_text(input.external_id.clone()),
          text(encode_date(input.date)),
          text(input.description.clone()),
          text(encode_decimal(input.amount)),
          text(input.kind.clone()),
          opt_text(input.source_ref.clone()),
          opt_text(input.linked_item_ref.clone()),
          opt_int(input.linked_item_id),
        ],
      )
      .await?;

    Ok(Transaction {
      transaction_id,
      period_id: input.period_id,
      external_id: input.external_id,
      date: input.date,
      description: input.description,
      amount: input.amount,
      kind: input.kind,
      source_ref: input.source_ref,
      linked_item_ref: input.linked_item_ref,
      linked_item_id: input.linked_item_id,
    })
  }

  async fn create_split(&self, input: NewSplit) -> Result<Split> {
    let split_id = self
      .insert(
        "INSERT INTO splits (
           transaction_id, linked_item_ref, linked_item_id, amount, note
         ) VALUES (?1, ?2, ?3, ?4, ?5)",
        vec![
          int(input.transaction_id),
          opt_text(input.linked_item_ref.clone()),
          opt_int(input.linked_item_id),
          text(encode_decimal(input.amount)),
          opt_text(input.note.clone()),
        ],
      )
      .await?;

    Ok(Split {
      split_id,
      transaction_id: input.transaction_id,
      linked_item_ref: input.linked_item_ref,
      linked_item_id: input.linked_item_id,
      amount: input.amount,
      note: input.note,
    })
  }

  async fn create_transfer(&self, input: NewTransfer) -> Result<Transfer> {
    let transfer_id = self
      .insert(
        "INSERT INTO transfers (
           period_id, external_id, date, amount, note,
           from_ref, from_item_id, to_ref, to_item_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        vec![
          int(input.period_id),
          opt_text(input.external_id.clone()),
          text(encode_date(input.date)),
          text(encode_decimal(input.amount)),
          opt_text(input.note.clone()),
          opt_text(input.from_ref.clone()),
          opt_int(input.from_item_id),
          opt_text(input.to_ref.clone()),
          opt_int(input.to_item_id),
        ],
      )
      .await?;

    Ok(Transfer {
      transfer_id,
      period_id: input.period_id,
      external_id: input.external_id,
      date: input.date,
      amount: input.amount,
      note: input.note,
      from_ref: input.from_ref,
      from_item_id: input.from_item_id,
      to_ref: input.to_ref,
      to_item_id: input.to_item_id,
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn load_period_contents(
    &self,
    period_id: i64,
  ) -> Result<Option<PeriodContents>> {
    let Some(period) = self.get_period(period_id).await? else {
      return Ok(None);
    };

    let raw = self
      .conn
      .call(move |conn| Ok(read_period_rows(conn, period_id)?))
      .await?;

    let expected_income = raw
      .expected_income
      .into_iter()
      .map(RawExpectedIncome::into_expected_income)
      .collect::<Result<Vec<_>>>()?;
    let watch_list = raw
      .watch_list
      .into_iter()
      .map(RawWatchItem::into_watch_item)
      .collect::<Result<Vec<_>>>()?;

    let mut items = raw
      .items
      .into_iter()
      .map(RawItem::into_item)
      .collect::<Result<Vec<_>>>()?;
    let cycles = raw
      .cycles
      .into_iter()
      .map(|cycle| {
        let (own, rest): (Vec<Item>, Vec<Item>) = std::mem::take(&mut items)
          .into_iter()
          .partition(|i| i.cycle_id == cycle.cycle_id);
        items = rest;
        CycleWithItems { cycle, items: own }
      })
      .collect();

    let mut splits = raw
      .splits
      .into_iter()
      .map(RawSplit::into_split)
      .collect::<Result<Vec<_>>>()?;
    let ledger = raw
      .transactions
      .into_iter()
      .map(|raw_txn| -> Result<TransactionWithSplits> {
        let transaction = raw_txn.into_transaction()?;
        let (own, rest): (Vec<Split>, Vec<Split>) = std::mem::take(&mut splits)
          .into_iter()
          .partition(|s| s.transaction_id == transaction.transaction_id);
        splits = rest;
        Ok(TransactionWithSplits { transaction, splits: own })
      })
      .collect::<Result<Vec<_>>>()?;

    let transfers = raw
      .transfers
      .into_iter()
      .map(RawTransfer::into_transfer)
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(PeriodContents {
      period,
      expected_income,
      watch_list,
      cycles,
      ledger,
      transfers,
    }))
  }
}

// ─── Row readers ─────────────────────────────────────────────────────────────

fn income_source_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IncomeSource> {
  Ok(IncomeSource {
    income_source_id: row.get(0)?,
    user_id:          row.get(1)?,
    external_id:      row.get(2)?,
    name:             row.get(3)?,
    image:            row.get(4)?,
  })
}

/// Every row owned by one period, still in column form.
struct RawPeriodRows {
  expected_income: Vec<RawExpectedIncome>,
  watch_list:      Vec<RawWatchItem>,
  cycles:          Vec<Cycle>,
  items:           Vec<RawItem>,
  transactions:    Vec<RawTransaction>,
  splits:          Vec<RawSplit>,
  transfers:       Vec<RawTransfer>,
}

fn read_period_rows(
  conn: &rusqlite::Connection,
  period_id: i64,
) -> rusqlite::Result<RawPeriodRows> {
  let expected_income = conn
    .prepare(
      "SELECT expected_income_id, period_id, source_ref, amount, date
       FROM expected_income WHERE period_id = ?1 ORDER BY expected_income_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(RawExpectedIncome {
        expected_income_id: row.get(0)?,
        period_id:          row.get(1)?,
        source_ref:         row.get(2)?,
        amount:             row.get(3)?,
        date:               row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let watch_list = conn
    .prepare(
      "SELECT watch_item_id, period_id, description, amount, due_date, image
       FROM watch_items WHERE period_id = ?1 ORDER BY watch_item_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(RawWatchItem {
        watch_item_id: row.get(0)?,
        period_id:     row.get(1)?,
        description:   row.get(2)?,
        amount:        row.get(3)?,
        due_date:      row.get(4)?,
        image:         row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let cycles = conn
    .prepare(
      "SELECT cycle_id, period_id, cycle_number, label
       FROM cycles WHERE period_id = ?1 ORDER BY cycle_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(Cycle {
        cycle_id:     row.get(0)?,
        period_id:    row.get(1)?,
        cycle_number: row.get(2)?,
        label:        row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let items = conn
    .prepare(
      "SELECT i.item_id, i.cycle_id, i.external_id, i.name,
              i.planned_amount, i.carried_over, i.image
       FROM items i
       JOIN cycles c ON c.cycle_id = i.cycle_id
       WHERE c.period_id = ?1
       ORDER BY i.item_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(RawItem {
        item_id:        row.get(0)?,
        cycle_id:       row.get(1)?,
        external_id:    row.get(2)?,
        name:           row.get(3)?,
        planned_amount: row.get(4)?,
        carried_over:   row.get(5)?,
        image:          row.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let transactions = conn
    .prepare(
      "SELECT transaction_id, period_id, external_id, date, description,
              amount, kind, source_ref, linked_item_ref, linked_item_id
       FROM transactions WHERE period_id = ?1 ORDER BY transaction_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(RawTransaction {
        transaction_id:  row.get(0)?,
        period_id:       row.get(1)?,
        external_id:     row.get(2)?,
        date:            row.get(3)?,
        description:     row.get(4)?,
        amount:          row.get(5)?,
        kind:            row.get(6)?,
        source_ref:      row.get(7)?,
        linked_item_ref: row.get(8)?,
        linked_item_id:  row.get(9)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let splits = conn
    .prepare(
      "SELECT s.split_id, s.transaction_id, s.linked_item_ref,
              s.linked_item_id, s.amount, s.note
       FROM splits s
       JOIN transactions t ON t.transaction_id = s.transaction_id
       WHERE t.period_id = ?1
       ORDER BY s.split_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(RawSplit {
        split_id:        row.get(0)?,
        transaction_id:  row.get(1)?,
        linked_item_ref: row.get(2)?,
        linked_item_id:  row.get(3)?,
        amount:          row.get(4)?,
        note:            row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let transfers = conn
    .prepare(
      "SELECT transfer_id, period_id, external_id, date, amount, note,
              from_ref, from_item_id, to_ref, to_item_id
       FROM transfers WHERE period_id = ?1 ORDER BY transfer_id",
    )?
    .query_map(rusqlite::params![period_id], |row| {
      Ok(RawTransfer {
        transfer_id:  row.get(0)?,
        period_id:    row.get(1)?,
        external_id:  row.get(2)?,
        date:         row.get(3)?,
        amount:       row.get(4)?,
        note:         row.get(5)?,
        from_ref:     row.get(6)?,
        from_item_id: row.get(7)?,
        to_ref:       row.get(8)?,
        to_item_id:   row.get(9)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(RawPeriodRows {
    expected_income,
    watch_list,
    cycles,
    items,
    transactions,
    splits,
    transfers,
  })
}
