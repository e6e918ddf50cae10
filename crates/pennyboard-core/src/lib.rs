//! Core types and trait definitions for the Pennyboard budget store.
//!
//! This crate is deliberately free of database and JSON-parsing dependencies.
//! The import engine and storage backends both depend on it.

pub mod income;
pub mod ledger;
pub mod period;
pub mod planning;
pub mod store;

pub use rust_decimal::Decimal;
