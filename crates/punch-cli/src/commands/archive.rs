//! Archive/unarchive commands: flag flips, by stamp or by range.

use anyhow::Result;

use punch_store::{EntryStore, ScanQuery};

pub fn run(
    store: &mut EntryStore,
    stamps: &[String],
    query: &ScanQuery,
    archived: bool,
) -> Result<()> {
    if stamps.is_empty() {
        let changed = store.archive_range(query, archived)?;
        tracing::debug!(changed, archived, "archive range");
        return Ok(());
    }
    for stamp in stamps {
        store.set_archived(stamp, archived)?;
    }
    Ok(())
}
