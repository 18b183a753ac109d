//! Bounded, ordered, filterable scans over primary entries.

use chrono::NaiveDateTime;

use punch_core::{TypeFilter, keys};

use crate::entries::{EntryStore, decode_entry};
use crate::kv::{Record, Scan, StoreError};

/// Options for a filtered entry scan.
///
/// `gt`/`lt` are stamp suffixes appended to the `time!` prefix, defaulting to
/// the full primary range. The type filter is resolved before the scan runs;
/// rows are tested against the built filter, not the raw token.
#[derive(Debug, Clone, Default)]
pub struct ScanQuery {
    pub gt: Option<String>,
    pub lt: Option<String>,
    pub limit: Option<usize>,
    pub reverse: bool,
    pub include_archived: bool,
    pub kind: Option<TypeFilter>,
}

impl ScanQuery {
    /// The concrete exclusive key bounds this query covers.
    pub fn bounds(&self) -> (String, String) {
        let gt = format!("{}{}", keys::TIME_PREFIX, self.gt.as_deref().unwrap_or(""));
        let lt = format!("{}{}", keys::TIME_PREFIX, self.lt.as_deref().unwrap_or("~"));
        (gt, lt)
    }

    /// Whether any per-row predicate applies after the store scan.
    fn filters_rows(&self) -> bool {
        self.kind.is_some() || !self.include_archived
    }

    fn admits(&self, entry: &punch_core::Entry) -> bool {
        if entry.archive && !self.include_archived {
            return false;
        }
        match &self.kind {
            Some(filter) => filter.matches(entry.kind.as_deref()),
            None => true,
        }
    }
}

/// One scanned entry with its key decoded.
#[derive(Debug, Clone)]
pub struct ScannedEntry {
    pub key: String,
    pub start: NaiveDateTime,
    pub entry: punch_core::Entry,
}

impl EntryStore {
    /// Runs a filtered scan, in key order (reversed when asked).
    ///
    /// The limit is pushed down into the store only when no per-row filter
    /// applies; otherwise it bounds the number of *matches* returned.
    pub fn scan_entries(&self, query: &ScanQuery) -> Result<Vec<ScannedEntry>, StoreError> {
        let (gt, lt) = query.bounds();
        let mut scan = Scan::over(gt, lt);
        scan.reverse = query.reverse;
        if !query.filters_rows() {
            scan.limit = query.limit;
        }

        let mut matches = Vec::new();
        for record in self.store.scan(&scan)? {
            let entry = decode_entry(&record.key, &record.value)?;
            if !query.admits(&entry) {
                continue;
            }
            matches.push(ScannedEntry {
                start: keys::decode_key(&record.key)?,
                key: record.key,
                entry,
            });
            if query.limit.is_some_and(|limit| matches.len() >= limit) {
                break;
            }
        }
        Ok(matches)
    }

    /// Runs an unfiltered scan over the same bounds, returning raw records.
    pub fn scan_raw(&self, query: &ScanQuery) -> Result<Vec<Record>, StoreError> {
        let (gt, lt) = query.bounds();
        let mut scan = Scan::over(gt, lt);
        scan.reverse = query.reverse;
        scan.limit = query.limit;
        self.store.scan(&scan)
    }

    /// Flips the archive flag on every entry the query matches that is not
    /// already in the requested state. Returns how many entries changed.
    pub fn archive_range(
        &mut self,
        query: &ScanQuery,
        archived: bool,
    ) -> Result<usize, StoreError> {
        let mut query = query.clone();
        query.include_archived = true;
        query.limit = None;

        let mut changed = 0;
        for scanned in self.scan_entries(&query)? {
            if scanned.entry.archive == archived {
                continue;
            }
            let mut entry = scanned.entry;
            entry.archive = archived;
            self.write(&scanned.key, &entry)?;
            changed += 1;
        }
        tracing::debug!(changed, archived, "archive range applied");
        Ok(changed)
    }
}
