//! Start command for opening a new running entry.

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::date::{NoNaturalDates, parse_date_expression};
use punch_store::EntryStore;

pub fn run(
    store: &mut EntryStore,
    date: Option<&str>,
    message: Option<&str>,
    kind: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let start = match date {
        Some(expr) => parse_date_expression(expr, &NoNaturalDates, now)?,
        None => now,
    };
    let key = store.start_entry(start, message, kind)?;
    tracing::debug!(%key, "entry started");
    Ok(())
}
