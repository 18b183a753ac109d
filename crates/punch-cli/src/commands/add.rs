//! Add command: insert a closed entry with both endpoints.

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::date::{NoNaturalDates, parse_date_expression};
use punch_store::EntryStore;

pub fn run(
    store: &mut EntryStore,
    start: &str,
    end: &str,
    message: Option<&str>,
    kind: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let start = parse_date_expression(start, &NoNaturalDates, now)?;
    let end = parse_date_expression(end, &NoNaturalDates, now)?;
    let key = store.add_entry(start, end, message, kind)?;
    tracing::debug!(%key, "entry added");
    Ok(())
}
