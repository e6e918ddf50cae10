//! The per-import item id map.
//!
//! Ledger entries, splits and transfers refer to budget items by the item's
//! external id. [`ItemIdMap`] translates those ids into item surrogate ids.
//! A map lives for exactly one period import: it starts empty, fills as
//! items are created, and is dropped when the period is done. Lookups only
//! see items created before them.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ItemIdMap {
  ids: HashMap<String, i64>,
}

impl ItemIdMap {
  pub fn new() -> Self { Self::default() }

  /// Map `external_id` to `item_id`. A repeated external id replaces the
  /// earlier mapping; the replaced id is returned.
  pub fn record(&mut self, external_id: &str, item_id: i64) -> Option<i64> {
    self.ids.insert(external_id.to_owned(), item_id)
  }

  /// Item id for `reference`, if an item with that external id was recorded.
  pub fn resolve(&self, reference: &str) -> Option<i64> {
    self.ids.get(reference).copied()
  }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}
