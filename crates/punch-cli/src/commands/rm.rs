//! Rm command: remove entries and their index records.

use anyhow::Result;

use punch_store::EntryStore;

pub fn run(store: &mut EntryStore, stamps: &[String]) -> Result<()> {
    for stamp in stamps {
        store.remove_entry(stamp)?;
    }
    Ok(())
}
