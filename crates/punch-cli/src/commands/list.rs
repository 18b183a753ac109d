//! List command: formatted or raw entry rows in start-time order.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::keys;
use punch_store::{EntryStore, ScanQuery};

use super::util::format_elapsed;

pub fn run<W: Write>(
    writer: &mut W,
    store: &EntryStore,
    query: &ScanQuery,
    long: bool,
    raw: bool,
    now: NaiveDateTime,
) -> Result<()> {
    if raw {
        for record in store.scan_raw(query)? {
            let value: serde_json::Value = serde_json::from_str(&record.value)?;
            let row = serde_json::json!({ "key": record.key, "value": value });
            writeln!(writer, "{}", serde_json::to_string(&row)?)?;
        }
        return Ok(());
    }

    for row in store.scan_entries(query)? {
        let end = row
            .entry
            .end
            .map_or_else(|| "NOW".to_string(), |end| end.format("%H:%M:%S").to_string());
        let elapsed = format_elapsed(row.entry.effective_end(now) - row.start);
        let kind = row
            .entry
            .kind
            .as_deref()
            .map(|kind| format!("  [{kind}]"))
            .unwrap_or_default();
        let archived = if row.entry.archive { " A" } else { "" };

        writeln!(
            writer,
            "{}  {}  [ {} - {} ]  ({elapsed}){kind}{archived}",
            keys::epoch_stamp(&row.key)?,
            row.start.format("%Y-%m-%d"),
            row.start.format("%H:%M:%S"),
            end,
        )?;

        if long {
            if let Some(message) = &row.entry.message {
                writeln!(writer)?;
                for line in message.lines() {
                    writeln!(writer, "    {line}")?;
                }
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}
