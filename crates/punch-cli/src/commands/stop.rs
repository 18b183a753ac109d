//! Stop command for closing an entry.

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::date::{NoNaturalDates, parse_date_expression};
use punch_store::EntryStore;

pub fn run(
    store: &mut EntryStore,
    stamp: Option<&str>,
    date: Option<&str>,
    message: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let end = match date {
        Some(expr) => parse_date_expression(expr, &NoNaturalDates, now)?,
        None => now,
    };
    let key = store.stop_entry(stamp, end, message)?;
    tracing::debug!(%key, "entry stopped");
    Ok(())
}
