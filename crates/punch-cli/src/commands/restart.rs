//! Restart command: clone a previous entry into a fresh running one.

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_store::EntryStore;

pub fn run(store: &mut EntryStore, stamp: Option<&str>, now: NaiveDateTime) -> Result<()> {
    let key = store.restart_entry(stamp, now)?;
    tracing::debug!(%key, "entry restarted");
    Ok(())
}
