//! Core domain logic for the punch time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Key encoding: sortable primary and type-index keys
//! - Entries: the stored record type with its open extension map
//! - Date expressions: the strict/natural/merge parser cascade
//! - Reporting: midnight splitting into day buckets and canonical reports

pub mod date;
pub mod entry;
pub mod filter;
pub mod keys;
pub mod report;

pub use date::{NaturalDateParser, NoNaturalDates, merge_date, parse_date_expression};
pub use entry::{Entry, ValidationError, entry_from_value};
pub use filter::TypeFilter;
pub use keys::ParseError;
pub use report::{DayBuckets, DayHours, Report};
