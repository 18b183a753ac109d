//! Storage layer for the punch time tracker.
//!
//! Persists time entries in an ordered key-value store over `rusqlite`:
//! a single `kv` table whose TEXT primary key carries the sortable stamp
//! encoding from `punch-core`, so range scans come back in start-time order.
//! See [`kv::Store`] for the store contract and [`EntryStore`] for entry
//! semantics, including the atomic maintenance of the secondary type index.

pub mod entries;
pub mod kv;
pub mod query;

pub use entries::EntryStore;
pub use kv::{BatchOp, Record, Scan, Store, StoreError};
pub use query::{ScanQuery, ScannedEntry};
