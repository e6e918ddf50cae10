//! The per-period import pipeline.
//!
//! Stages run in a fixed order, each consuming the [`ItemIdMap`] state left
//! by the one before:
//!
//! ```text
//! reconcile period ─ income sources ─ expected income ─ watch list
//!   ─ cycles/items (fills map) ─ ledger/splits (reads map) ─ transfers (reads map)
//! ```
//!
//! A whole period runs inside one store transaction. Row ids are still
//! assigned as each row is created, so children always see their parent's id.

use chrono::{NaiveDate, Utc};
use pennyboard_core::{
  income::{NewExpectedIncome, NewIncomeSource},
  ledger::{NewSplit, NewTransaction, NewTransfer},
  period::{NewPeriod, Period},
  planning::{NewCycle, NewItem, NewWatchItem},
  store::BudgetStore,
};
use rust_decimal::Decimal;
use tracing::Instrument as _;

use crate::{
  dates::{parse_date, parse_due_date},
  document::PeriodDocument,
  error::{ImportError, Result},
  resolve::ItemIdMap,
  summary::PeriodSummary,
};

/// Import one period inside its own transaction, rolling back on failure.
pub(crate) async fn import_period<S: BudgetStore>(
  store: &S,
  user_id: &str,
  doc: &PeriodDocument,
) -> Result<PeriodSummary> {
  let span = tracing::info_span!("period", external_id = %doc.external_id);

  async move {
    store.begin().await.map_err(ImportError::store)?;

    let outcome = match PeriodImport::new(store, user_id).run(doc).await {
      Ok(summary) => store
        .commit()
        .await
        .map(|()| summary)
        .map_err(ImportError::store),
      Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
      tracing::error!(error = %e, "period import failed; rolling back");
      if let Err(rollback_err) = store.rollback().await {
        tracing::error!(error = %rollback_err, "rollback failed");
      }
    }

    outcome
  }
  .instrument(span)
  .await
}

// ─── Stages ──────────────────────────────────────────────────────────────────

struct PeriodImport<'a, S> {
  store:   &'a S,
  user_id: &'a str,
  items:   ItemIdMap,
  summary: PeriodSummary,
}

impl<'a, S: BudgetStore> PeriodImport<'a, S> {
  fn new(store: &'a S, user_id: &'a str) -> Self {
    Self { store, user_id, items: ItemIdMap::new(), summary: PeriodSummary::default() }
  }

  async fn run(mut self, doc: &PeriodDocument) -> Result<PeriodSummary> {
    let period = self.reconcile(doc).await?;
    self.income_sources(doc).await?;
    self.expected_income(doc, &period).await?;
    self.watch_list(doc, &period).await?;
    self.cycles_and_items(doc, &period).await?;
    self.ledger(doc, &period).await?;
    self.transfers(doc, &period).await?;

    tracing::info!(
      period_id = period.period_id,
      replaced = self.summary.replaced,
      unresolved_refs = self.summary.unresolved_refs,
      "period imported"
    );
    Ok(self.summary)
  }

  /// Delete any period with the same key, then create the replacement.
  async fn reconcile(&mut self, doc: &PeriodDocument) -> Result<Period> {
    let existing = self
      .store
      .find_period(self.user_id, &doc.external_id)
      .await
      .map_err(ImportError::store)?;

    if let Some(old) = existing {
      self
        .store
        .delete_period(old.period_id)
        .await
        .map_err(ImportError::store)?;
      self.summary.replaced = true;
      tracing::info!(old_period_id = old.period_id, "replacing existing period");
    }

    let start_date = doc
      .start_date
      .as_deref()
      .and_then(parse_date)
      .unwrap_or_else(|| Utc::now().date_naive());

    let period = self
      .store
      .create_period(NewPeriod {
        user_id: self.user_id.to_owned(),
        external_id: doc.external_id.clone(),
        display_name: doc
          .display_name
          .clone()
          .unwrap_or_else(|| doc.external_id.clone()),
        start_date,
        initial_balance: doc.initial_balance.unwrap_or_default(),
      })
      .await
      .map_err(ImportError::store)?;

    self.summary.external_id = period.external_id.clone();
    self.summary.period_id = period.period_id;
    Ok(period)
  }

  /// Create income sources that do not exist yet. Existing ones are never
  /// updated, even if the document disagrees with them.
  async fn income_sources(&mut self, doc: &PeriodDocument) -> Result<()> {
    for entry in &doc.income_sources {
      let Some(external_id) = entry.external_id.as_deref() else {
        tracing::warn!(name = ?entry.name, "skipping income source without an id");
        continue;
      };

      let existing = self
        .store
        .find_income_source(self.user_id, external_id)
        .await
        .map_err(ImportError::store)?;
      if existing.is_some() {
        self.summary.income_sources_existing += 1;
        continue;
      }

      self
        .store
        .create_income_source(NewIncomeSource {
          user_id:     self.user_id.to_owned(),
          external_id: external_id.to_owned(),
          name:        entry.name.clone().unwrap_or_default(),
          image:       entry.image.clone(),
        })
        .await
        .map_err(ImportError::store)?;
      self.summary.income_sources_created += 1;
    }

    tracing::debug!(
      created = self.summary.income_sources_created,
      existing = self.summary.income_sources_existing,
      "income sources"
    );
    Ok(())
  }

  async fn expected_income(
    &mut self,
    doc: &PeriodDocument,
    period: &Period,
  ) -> Result<()> {
    for entry in &doc.expected_income {
      self
        .store
        .create_expected_income(NewExpectedIncome {
          period_id:  period.period_id,
          source_ref: entry.source_id.clone(),
          amount:     entry.amount.unwrap_or_default(),
          date:       date_or(entry.date.as_deref(), period.start_date),
        })
        .await
        .map_err(ImportError::store)?;
      self.summary.expected_income += 1;
    }
    Ok(())
  }

  async fn watch_list(&mut self, doc: &PeriodDocument, period: &Period) -> Result<()> {
    for entry in &doc.watch_list {
      self
        .store
        .create_watch_item(NewWatchItem {
          period_id:   period.period_id,
          description: entry.description.clone().unwrap_or_default(),
          amount:      entry.amount.unwrap_or_default(),
          due_date:    parse_due_date(entry.due_date.as_deref()),
          image:       entry.image.clone(),
        })
        .await
        .map_err(ImportError::store)?;
      self.summary.watch_items += 1;
    }
    Ok(())
  }

  /// Create cycles and their items in document order, recording each item's
  /// external id in the map.
  async fn cycles_and_items(
    &mut self,
    doc: &PeriodDocument,
    period: &Period,
  ) -> Result<()> {
    for entry in &doc.cycles {
      let cycle = self
        .store
        .create_cycle(NewCycle {
          period_id:    period.period_id,
          cycle_number: entry.cycle_number.unwrap_or_default(),
          label:        entry.label.clone().unwrap_or_default(),
        })
        .await
        .map_err(ImportError::store)?;
      self.summary.cycles += 1;

      for item_entry in &entry.items {
        let item = self
          .store
          .create_item(NewItem {
            cycle_id:       cycle.cycle_id,
            external_id:    item_entry.external_id.clone(),
            name:           item_entry.name.clone().unwrap_or_default(),
            planned_amount: item_entry.planned_amount.unwrap_or_default(),
            carried_over:   item_entry.carried_over.unwrap_or_default(),
            image:          item_entry.image.clone(),
          })
          .await
          .map_err(ImportError::store)?;
        self.summary.items += 1;

        if let Some(external_id) = item.external_id.as_deref()
          && let Some(previous) = self.items.record(external_id, item.item_id)
        {
          tracing::warn!(
            external_id,
            previous,
            item_id = item.item_id,
            "duplicate item id; later item wins"
          );
        }
      }
    }

    tracing::debug!(
      cycles = self.summary.cycles,
      items = self.summary.items,
      mapped = self.items.len(),
      "cycles and items"
    );
    Ok(())
  }

  async fn ledger(&mut self, doc: &PeriodDocument, period: &Period) -> Result<()> {
    for entry in &doc.ledger {
      let linked_item_id = self.resolve("transaction", entry.linked_item_id.as_deref());

      let transaction = self
        .store
        .create_transaction(NewTransaction {
          period_id: period.period_id,
          external_id: entry.external_id.clone(),
          date: date_or(entry.date.as_deref(), period.start_date),
          description: entry.description.clone().unwrap_or_default(),
          amount: entry.amount.unwrap_or_default(),
          kind: entry.kind.clone().unwrap_or_default(),
          source_ref: entry.source_id.clone(),
          linked_item_ref: entry.linked_item_id.clone(),
          linked_item_id,
        })
        .await
        .map_err(ImportError::store)?;
      self.summary.transactions += 1;

      for split in &entry.splits {
        let linked_item_id = self.resolve("split", split.linked_item_id.as_deref());

        self
          .store
          .create_split(NewSplit {
            transaction_id:  transaction.transaction_id,
            linked_item_ref: split.linked_item_id.clone(),
            linked_item_id,
            amount:          split.amount.unwrap_or(Decimal::ZERO),
            note:            split.note.clone(),
          })
          .await
          .map_err(ImportError::store)?;
        self.summary.splits += 1;
      }
    }

    tracing::debug!(
      transactions = self.summary.transactions,
      splits = self.summary.splits,
      "ledger"
    );
    Ok(())
  }

  async fn transfers(&mut self, doc: &PeriodDocument, period: &Period) -> Result<()> {
    for entry in &doc.transfers {
      let from_item_id = self.resolve("transfer source", entry.from.as_deref());
      let to_item_id = self.resolve("transfer destination", entry.to.as_deref());

      self
        .store
        .create_transfer(NewTransfer {
          period_id: period.period_id,
          external_id: entry.external_id.clone(),
          date: date_or(entry.date.as_deref(), period.start_date),
          amount: entry.amount.unwrap_or_default(),
          note: entry.note.clone(),
          from_ref: entry.from.clone(),
          from_item_id,
          to_ref: entry.to.clone(),
          to_item_id,
        })
        .await
        .map_err(ImportError::store)?;
      self.summary.transfers += 1;
    }
    Ok(())
  }

  /// Look `reference` up in the item map. A miss is counted and logged but
  /// is not an error.
  fn resolve(&mut self, what: &'static str, reference: Option<&str>) -> Option<i64> {
    let reference = reference?;
    let resolved = self.items.resolve(reference);
    if resolved.is_none() {
      self.summary.unresolved_refs += 1;
      tracing::warn!(reference, what, "unresolved item reference");
    }
    resolved
  }
}

fn date_or(raw: Option<&str>, fallback: NaiveDate) -> NaiveDate {
  raw.and_then(parse_date).unwrap_or(fallback)
}
