//! SQL schema for the Pennyboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Every ownership edge is `ON DELETE CASCADE`, so deleting a period removes
/// the whole subtree. Resolved item ids (`linked_item_id`, `from_item_id`,
/// `to_item_id`) are plain integers without a foreign key; `AUTOINCREMENT`
/// keeps a deleted item's id from ever being handed to a new row.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS periods (
    period_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    external_id     TEXT NOT NULL,
    display_name    TEXT NOT NULL,
    start_date      TEXT NOT NULL,   -- YYYY-MM-DD
    initial_balance TEXT NOT NULL,   -- decimal text
    UNIQUE (user_id, external_id)
);

-- Not owned by any period; survives period reimports.
CREATE TABLE IF NOT EXISTS income_sources (
    income_source_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          TEXT NOT NULL,
    external_id      TEXT NOT NULL,
    name             TEXT NOT NULL,
    image            TEXT,
    UNIQUE (user_id, external_id)
);

CREATE TABLE IF NOT EXISTS expected_income (
    expected_income_id INTEGER PRIMARY KEY AUTOINCREMENT,
    period_id          INTEGER NOT NULL REFERENCES periods(period_id) ON DELETE CASCADE,
    source_ref         TEXT,        -- income source external id, unresolved
    amount             TEXT NOT NULL,
    date               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS watch_items (
    watch_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    period_id     INTEGER NOT NULL REFERENCES periods(period_id) ON DELETE CASCADE,
    description   TEXT NOT NULL,
    amount        TEXT NOT NULL,
    due_date      TEXT,
    image         TEXT
);

CREATE TABLE IF NOT EXISTS cycles (
    cycle_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    period_id    INTEGER NOT NULL REFERENCES periods(period_id) ON DELETE CASCADE,
    cycle_number INTEGER NOT NULL,
    label        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    cycle_id       INTEGER NOT NULL REFERENCES cycles(cycle_id) ON DELETE CASCADE,
    external_id    TEXT,
    name           TEXT NOT NULL,
    planned_amount TEXT NOT NULL,
    carried_over   TEXT NOT NULL,
    image          TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    transaction_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    period_id       INTEGER NOT NULL REFERENCES periods(period_id) ON DELETE CASCADE,
    external_id     TEXT,
    date            TEXT NOT NULL,
    description     TEXT NOT NULL,
    amount          TEXT NOT NULL,
    kind            TEXT NOT NULL,
    source_ref      TEXT,
    linked_item_ref TEXT,
    linked_item_id  INTEGER
);

CREATE TABLE IF NOT EXISTS splits (
    split_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    transaction_id  INTEGER NOT NULL REFERENCES transactions(transaction_id) ON DELETE CASCADE,
    linked_item_ref TEXT,
    linked_item_id  INTEGER,
    amount          TEXT NOT NULL,
    note            TEXT
);

CREATE TABLE IF NOT EXISTS transfers (
    transfer_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    period_id    INTEGER NOT NULL REFERENCES periods(period_id) ON DELETE CASCADE,
    external_id  TEXT,
    date         TEXT NOT NULL,
    amount       TEXT NOT NULL,
    note         TEXT,
    from_ref     TEXT,
    from_item_id INTEGER,
    to_ref       TEXT,
    to_item_id   INTEGER
);

CREATE INDEX IF NOT EXISTS expected_income_period_idx ON expected_income(period_id);
CREATE INDEX IF NOT EXISTS watch_items_period_idx     ON watch_items(period_id);
CREATE INDEX IF NOT EXISTS cycles_period_idx          ON cycles(period_id);
CREATE INDEX IF NOT EXISTS items_cycle_idx            ON items(cycle_id);
CREATE INDEX IF NOT EXISTS transactions_period_idx    ON transactions(period_id);
CREATE INDEX IF NOT EXISTS splits_transaction_idx     ON splits(transaction_id);
CREATE INDEX IF NOT EXISTS transfers_period_idx       ON transfers(period_id);

PRAGMA user_version = 1;
";
