//! Status command: elapsed time of the running entry, if any.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::keys;
use punch_store::EntryStore;

use super::util::format_elapsed;

pub fn run<W: Write>(writer: &mut W, store: &EntryStore, now: NaiveDateTime) -> Result<()> {
    let status = match store.latest()? {
        Some((key, entry)) if entry.is_open() => {
            let start = keys::decode_key(&key)?;
            format!("elapsed time: {}", format_elapsed(now - start))
        }
        _ => "stopped".to_string(),
    };
    writeln!(writer, "{status}")?;
    Ok(())
}
