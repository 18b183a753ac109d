//! Data command: the canonical hour report.
//!
//! Matched entries are split at local midnight into per-day buckets and the
//! buckets serialized as deterministic JSON, so two runs over identical data
//! produce byte-identical output.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::{DayBuckets, Report};
use punch_store::{EntryStore, ScanQuery};

pub fn run<W: Write>(
    writer: &mut W,
    store: &EntryStore,
    query: &ScanQuery,
    title: &str,
    rate: Option<f64>,
    now: NaiveDateTime,
) -> Result<()> {
    let mut buckets = DayBuckets::new();
    for row in store.scan_entries(query)? {
        buckets.add_interval(row.start, row.entry.effective_end(now));
    }

    let report = Report::build(title, rate, &buckets);
    writeln!(writer, "{}", report.to_canonical_json()?)?;
    Ok(())
}
