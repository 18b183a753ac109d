//! Get command: print one entry's stored value.

use std::io::Write;

use anyhow::Result;

use punch_store::EntryStore;

pub fn run<W: Write>(writer: &mut W, store: &EntryStore, stamp: &str) -> Result<()> {
    let (_key, entry) = store.get_entry(stamp)?;
    writeln!(writer, "{}", serde_json::to_string_pretty(&entry)?)?;
    Ok(())
}
