//! Insert command: write an empty entry under a stamp.

use anyhow::Result;

use punch_store::EntryStore;

pub fn run(store: &mut EntryStore, stamp: &str) -> Result<()> {
    let key = store.insert_blank(stamp)?;
    tracing::debug!(%key, "blank entry inserted");
    Ok(())
}
