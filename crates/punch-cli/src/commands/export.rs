//! CSV export with the fixed column layout.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use csv::Writer;

use punch_core::keys;
use punch_store::{EntryStore, ScanQuery};

use super::util::format_elapsed;

const HEADER: [&str; 8] = [
    "Key", "Date", "Start", "End", "Duration", "Archived", "Type", "Message",
];

pub fn run<W: Write>(
    writer: &mut W,
    store: &EntryStore,
    query: &ScanQuery,
    now: NaiveDateTime,
) -> Result<()> {
    let mut out = Writer::from_writer(writer);
    out.write_record(HEADER)?;

    for row in store.scan_entries(query)? {
        let end = row
            .entry
            .end
            .map_or_else(|| "NOW".to_string(), |end| end.format("%H:%M:%S").to_string());
        out.write_record(&[
            keys::epoch_stamp(&row.key)?.to_string(),
            row.start.format("%Y-%m-%d").to_string(),
            row.start.format("%H:%M:%S").to_string(),
            end,
            format_elapsed(row.entry.effective_end(now) - row.start),
            if row.entry.archive { "A" } else { "" }.to_string(),
            row.entry.kind.clone().unwrap_or_default(),
            row.entry.message.clone().unwrap_or_default(),
        ])?;
    }
    out.flush()?;
    Ok(())
}
