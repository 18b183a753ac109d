//! Entry CRUD over the ordered store.
//!
//! Every mutation that touches more than one key (creating a typed entry,
//! moving an entry to a new start, renaming a type, deleting) goes through
//! a single atomic batch, so the type index can never be observed out of
//! step with the primary entries.

use chrono::NaiveDateTime;

use punch_core::date::{NaturalDateParser, NoNaturalDates, merge_date};
use punch_core::{Entry, entry_from_value, keys};

use crate::kv::{BatchOp, Scan, Store, StoreError};

/// CRUD and atomic batch operations over primary entries, keeping the
/// secondary type index consistent.
pub struct EntryStore {
    pub(crate) store: Store,
    natural: Box<dyn NaturalDateParser>,
}

impl EntryStore {
    /// Opens an entry store backed by the given file.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        Ok(Self::new(Store::open(path)?))
    }

    /// Opens an in-memory entry store, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Store::open_in_memory()?))
    }

    /// Wraps an already-open store.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            natural: Box::new(NoNaturalDates),
        }
    }

    /// Installs a natural-language date parser for the cascade's second
    /// stage.
    #[must_use]
    pub fn with_natural_parser(mut self, natural: Box<dyn NaturalDateParser>) -> Self {
        self.natural = natural;
        self
    }

    /// The underlying key-value store.
    pub const fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn read(&self, key: &str) -> Result<Entry, StoreError> {
        let raw = self.store.get(key)?;
        decode_entry(key, &raw)
    }

    pub(crate) fn write(&self, key: &str, entry: &Entry) -> Result<(), StoreError> {
        self.store.put(key, &encode_entry(key, entry)?)
    }

    /// The entry with the greatest start time, via a reverse limit-1 scan.
    pub fn latest(&self) -> Result<Option<(String, Entry)>, StoreError> {
        let records = self.store.scan(
            &Scan::over(keys::TIME_PREFIX, keys::TIME_SCAN_END)
                .reversed()
                .limit(1),
        )?;
        records
            .into_iter()
            .next()
            .map(|record| Ok((record.key.clone(), decode_entry(&record.key, &record.value)?)))
            .transpose()
    }

    /// Resolves an optional stamp token: explicit token, or the most recent
    /// entry's key.
    fn resolve_target(&self, target: Option<&str>) -> Result<String, StoreError> {
        match target {
            Some(token) => Ok(keys::resolve_stamp(token)?),
            None => self
                .latest()?
                .map(|(key, _)| key)
                .ok_or(StoreError::Empty),
        }
    }

    /// Creates a running entry starting at `start`.
    ///
    /// The primary record and (for a non-empty type) the index record land
    /// in one batch: either both exist afterwards, or neither does.
    pub fn start_entry(
        &mut self,
        start: NaiveDateTime,
        message: Option<&str>,
        kind: Option<&str>,
    ) -> Result<String, StoreError> {
        self.put_new(start, None, message, kind)
    }

    /// Inserts a closed entry with both endpoints known.
    pub fn add_entry(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        message: Option<&str>,
        kind: Option<&str>,
    ) -> Result<String, StoreError> {
        self.put_new(start, Some(end), message, kind)
    }

    fn put_new(
        &mut self,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        message: Option<&str>,
        kind: Option<&str>,
    ) -> Result<String, StoreError> {
        let key = keys::primary_key(start);
        let kind = kind.filter(|kind| !kind.is_empty());
        let entry = Entry {
            kind: kind.map(str::to_string),
            message: message.map(str::to_string),
            end,
            ..Entry::default()
        };

        let mut ops = vec![BatchOp::put(key.clone(), encode_entry(&key, &entry)?)];
        if let Some(kind) = kind {
            ops.push(BatchOp::put(
                keys::type_key(kind, keys::stamp_of(&key)?),
                SENTINEL,
            ));
        }
        self.store.batch(&ops)?;
        tracing::debug!(%key, "entry created");
        Ok(key)
    }

    /// Closes an entry: the given stamp's, or the most recent one.
    ///
    /// `extra_message` is appended to any existing note, newline-joined.
    pub fn stop_entry(
        &mut self,
        target: Option<&str>,
        end: NaiveDateTime,
        extra_message: Option<&str>,
    ) -> Result<String, StoreError> {
        let key = self.resolve_target(target)?;
        let mut entry = self.read(&key)?;
        if let Some(extra) = extra_message {
            entry.append_message(extra);
        }
        entry.end = Some(end);
        self.write(&key, &entry)?;
        tracing::debug!(%key, "entry stopped");
        Ok(key)
    }

    /// Starts a fresh entry cloning the target's message and type.
    pub fn restart_entry(
        &mut self,
        target: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<String, StoreError> {
        let key = self.resolve_target(target)?;
        let entry = self.read(&key)?;
        self.start_entry(now, entry.message.as_deref(), entry.kind.as_deref())
    }

    /// Point lookup by stamp token.
    pub fn get_entry(&self, stamp: &str) -> Result<(String, Entry), StoreError> {
        let key = keys::resolve_stamp(stamp)?;
        let entry = self.read(&key)?;
        Ok((key, entry))
    }

    /// Generic property mutation.
    ///
    /// `end` rewrites in place; `start` migrates the primary key; `type`
    /// migrates the index entry; anything else lands in the entry value
    /// directly (an empty value deletes the property). `stop` is accepted as
    /// an alias for `end`.
    pub fn set_property(
        &mut self,
        stamp: &str,
        name: &str,
        value: &str,
        original_hint: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<(), StoreError> {
        let key = keys::resolve_stamp(stamp)?;
        let mut entry = self.read(&key)?;
        let name = if name == "stop" { "end" } else { name };

        match name {
            "end" => {
                let reference = original_hint
                    .and_then(|hint| keys::decode_stamp(hint).ok())
                    .or(entry.end)
                    .map_or_else(|| keys::decode_key(&key), Ok)?;
                entry.end = Some(merge_date(reference, value, self.natural.as_ref(), now)?);
                self.write(&key, &entry)?;
            }
            "start" => {
                let old_start = keys::decode_key(&key)?;
                let new_start = merge_date(old_start, value, self.natural.as_ref(), now)?;
                let new_key = keys::primary_key(new_start);
                if new_key == key {
                    return Ok(());
                }

                let mut ops = vec![
                    BatchOp::put(new_key.clone(), encode_entry(&key, &entry)?),
                    BatchOp::delete(key.clone()),
                ];
                if let Some(kind) = entry.kind.as_deref().filter(|kind| !kind.is_empty()) {
                    ops.push(BatchOp::delete(keys::type_key(kind, keys::stamp_of(&key)?)));
                    ops.push(BatchOp::put(
                        keys::type_key(kind, keys::stamp_of(&new_key)?),
                        SENTINEL,
                    ));
                }
                self.store.batch(&ops)?;
                tracing::debug!(old = %key, new = %new_key, "entry start moved");
            }
            "type" => {
                let stamp = keys::stamp_of(&key)?.to_string();
                let previous = original_hint
                    .map(str::to_string)
                    .or_else(|| entry.kind.clone())
                    .filter(|kind| !kind.is_empty());
                let next = (!value.is_empty()).then(|| value.to_string());

                let mut ops = Vec::new();
                if let Some(previous) = previous {
                    ops.push(BatchOp::delete(keys::type_key(&previous, &stamp)));
                }
                if let Some(next) = &next {
                    ops.push(BatchOp::put(keys::type_key(next, &stamp), SENTINEL));
                }
                entry.kind = next;
                ops.push(BatchOp::put(key.clone(), encode_entry(&key, &entry)?));
                self.store.batch(&ops)?;
            }
            _ => {
                entry.set_property(name, value);
                self.write(&key, &entry)?;
            }
        }
        Ok(())
    }

    /// Replaces a whole entry value with externally supplied JSON.
    ///
    /// The value must be an object. A type change migrates the index entry
    /// in the same batch as the rewrite.
    pub fn replace_entry(
        &mut self,
        stamp: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError> {
        let key = keys::resolve_stamp(stamp)?;
        let previous = self.read(&key)?;
        let next = entry_from_value(value)?;
        let stamp = keys::stamp_of(&key)?.to_string();

        let mut ops = vec![BatchOp::put(key.clone(), encode_entry(&key, &next)?)];
        if previous.kind != next.kind {
            if let Some(kind) = previous.kind.as_deref().filter(|kind| !kind.is_empty()) {
                ops.push(BatchOp::delete(keys::type_key(kind, &stamp)));
            }
            if let Some(kind) = next.kind.as_deref().filter(|kind| !kind.is_empty()) {
                ops.push(BatchOp::put(keys::type_key(kind, &stamp), SENTINEL));
            }
        }
        self.store.batch(&ops)?;
        Ok(())
    }

    /// Writes an empty entry value under the resolved key.
    pub fn insert_blank(&mut self, stamp: &str) -> Result<String, StoreError> {
        let key = keys::resolve_stamp(stamp)?;
        self.write(&key, &Entry::default())?;
        Ok(key)
    }

    /// Deletes an entry and its index record in one batch.
    pub fn remove_entry(&mut self, stamp: &str) -> Result<(), StoreError> {
        let key = keys::resolve_stamp(stamp)?;
        let entry = self.read(&key)?;

        let mut ops = vec![BatchOp::delete(key.clone())];
        if let Some(kind) = entry.kind.as_deref().filter(|kind| !kind.is_empty()) {
            ops.push(BatchOp::delete(keys::type_key(kind, keys::stamp_of(&key)?)));
        }
        self.store.batch(&ops)?;
        tracing::debug!(%key, "entry removed");
        Ok(())
    }

    /// Flips the archive flag in place. The key never changes.
    pub fn set_archived(&mut self, stamp: &str, archived: bool) -> Result<(), StoreError> {
        let key = keys::resolve_stamp(stamp)?;
        let mut entry = self.read(&key)?;
        entry.archive = archived;
        self.write(&key, &entry)
    }
}

/// Index records carry no payload; only the key matters.
const SENTINEL: &str = "0";

pub(crate) fn decode_entry(key: &str, raw: &str) -> Result<Entry, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::InvalidEntry {
        key: key.to_string(),
        message: err.to_string(),
    })
}

fn encode_entry(key: &str, entry: &Entry) -> Result<String, StoreError> {
    serde_json::to_string(entry).map_err(|err| StoreError::InvalidEntry {
        key: key.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn now() -> NaiveDateTime {
        instant(2024, 6, 1, 12, 0, 0)
    }

    #[test]
    fn start_entry_writes_primary_and_index_atomically() {
        let mut store = EntryStore::open_in_memory().unwrap();
        let key = store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), Some("kickoff"), Some("consulting"))
            .unwrap();

        assert_eq!(key, "time!2024-03-05 08:15:00");
        assert!(store.store().get(&key).is_ok());
        assert!(
            store
                .store()
                .get("time-type!consulting!2024-03-05 08:15:00")
                .is_ok()
        );
    }

    #[test]
    fn untyped_entry_gets_no_index_record() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();

        let index = store
            .store()
            .scan(&Scan::over(keys::TYPE_PREFIX, "time-type!~"))
            .unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn same_second_start_overwrites() {
        let mut store = EntryStore::open_in_memory().unwrap();
        let start = instant(2024, 3, 5, 8, 15, 0);
        store.start_entry(start, Some("first"), None).unwrap();
        let key = store.start_entry(start, Some("second"), None).unwrap();

        let (_, entry) = store.get_entry(keys::stamp_of(&key).unwrap()).unwrap();
        assert_eq!(entry.message.as_deref(), Some("second"));
    }

    #[test]
    fn stop_without_target_closes_latest_and_appends_message() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 0, 0), Some("early"), None)
            .unwrap();
        store
            .start_entry(instant(2024, 3, 5, 9, 0, 0), Some("base"), None)
            .unwrap();

        let key = store
            .stop_entry(None, instant(2024, 3, 5, 17, 0, 0), Some("wrap-up"))
            .unwrap();

        assert_eq!(key, "time!2024-03-05 09:00:00");
        let (_, entry) = store.get_entry("2024-03-05 09:00:00").unwrap();
        assert_eq!(entry.end, Some(instant(2024, 3, 5, 17, 0, 0)));
        assert_eq!(entry.message.as_deref(), Some("base\nwrap-up"));
    }

    #[test]
    fn stop_on_empty_store_reports_empty() {
        let mut store = EntryStore::open_in_memory().unwrap();
        assert!(matches!(
            store.stop_entry(None, now(), None),
            Err(StoreError::Empty)
        ));
    }

    #[test]
    fn restart_clones_message_and_type() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 0, 0), Some("retainer"), Some("client"))
            .unwrap();
        store
            .stop_entry(None, instant(2024, 3, 5, 12, 0, 0), None)
            .unwrap();

        let key = store.restart_entry(None, instant(2024, 3, 5, 13, 0, 0)).unwrap();
        let (_, entry) = store.get_entry(keys::stamp_of(&key).unwrap()).unwrap();
        assert!(entry.is_open());
        assert_eq!(entry.message.as_deref(), Some("retainer"));
        assert_eq!(entry.kind.as_deref(), Some("client"));
        assert!(
            store
                .store()
                .get("time-type!client!2024-03-05 13:00:00")
                .is_ok()
        );
    }

    #[test]
    fn get_entry_accepts_epoch_references() {
        let mut store = EntryStore::open_in_memory().unwrap();
        let key = store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();
        let epoch = keys::epoch_stamp(&key).unwrap();

        let (by_epoch, _) = store.get_entry(&epoch.to_string()).unwrap();
        let (by_suffix, _) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(by_epoch, key);
        assert_eq!(by_suffix, key);
    }

    #[test]
    fn set_end_merges_bare_time_onto_entry_date() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();

        store
            .set_property("2024-03-05 08:15:00", "end", "17:30", None, now())
            .unwrap();
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(entry.end, Some(instant(2024, 3, 5, 17, 30, 0)));
    }

    #[test]
    fn set_end_merges_against_a_supplied_original_value() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();

        // The hint's calendar date wins over the entry's own start date.
        store
            .set_property(
                "2024-03-05 08:15:00",
                "end",
                "01:30",
                Some("2024-03-06 02:00:00"),
                now(),
            )
            .unwrap();
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(entry.end, Some(instant(2024, 3, 6, 1, 30, 0)));
    }

    #[test]
    fn stop_is_an_alias_for_end() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();
        store
            .set_property("2024-03-05 08:15:00", "stop", "2024-03-05 16:00:00", None, now())
            .unwrap();
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(entry.end, Some(instant(2024, 3, 5, 16, 0, 0)));
    }

    #[test]
    fn set_start_moves_the_key_and_the_index_record() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), Some("note"), Some("dev"))
            .unwrap();

        store
            .set_property("2024-03-05 08:15:00", "start", "07:00", None, now())
            .unwrap();

        assert!(store.get_entry("2024-03-05 08:15:00").is_err());
        let (_, entry) = store.get_entry("2024-03-05 07:00:00").unwrap();
        assert_eq!(entry.message.as_deref(), Some("note"));
        assert!(
            store
                .store()
                .get("time-type!dev!2024-03-05 08:15:00")
                .is_err()
        );
        assert!(
            store
                .store()
                .get("time-type!dev!2024-03-05 07:00:00")
                .is_ok()
        );
    }

    #[test]
    fn type_rename_migrates_exactly_one_index_record() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, Some("old"))
            .unwrap();

        store
            .set_property("2024-03-05 08:15:00", "type", "new", None, now())
            .unwrap();

        assert!(
            store
                .store()
                .get("time-type!old!2024-03-05 08:15:00")
                .is_err()
        );
        assert!(
            store
                .store()
                .get("time-type!new!2024-03-05 08:15:00")
                .is_ok()
        );
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(entry.kind.as_deref(), Some("new"));
    }

    #[test]
    fn clearing_the_type_drops_the_index_record() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, Some("old"))
            .unwrap();
        store
            .set_property("2024-03-05 08:15:00", "type", "", None, now())
            .unwrap();

        assert!(
            store
                .store()
                .get("time-type!old!2024-03-05 08:15:00")
                .is_err()
        );
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(entry.kind, None);
    }

    #[test]
    fn plain_properties_set_and_delete_in_place() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();

        store
            .set_property("2024-03-05 08:15:00", "invoice", "INV-7", None, now())
            .unwrap();
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(
            entry.extra.get("invoice"),
            Some(&serde_json::Value::String("INV-7".to_string()))
        );

        store
            .set_property("2024-03-05 08:15:00", "invoice", "", None, now())
            .unwrap();
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert!(!entry.extra.contains_key("invoice"));
    }

    #[test]
    fn set_property_on_missing_key_is_not_found() {
        let mut store = EntryStore::open_in_memory().unwrap();
        assert!(matches!(
            store.set_property("2024-03-05 08:15:00", "message", "x", None, now()),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn replace_entry_validates_and_migrates_the_index() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, Some("old"))
            .unwrap();

        assert!(matches!(
            store.replace_entry("2024-03-05 08:15:00", serde_json::json!("text")),
            Err(StoreError::Validation(_))
        ));

        store
            .replace_entry(
                "2024-03-05 08:15:00",
                serde_json::json!({"type": "new", "message": "edited"}),
            )
            .unwrap();
        assert!(
            store
                .store()
                .get("time-type!old!2024-03-05 08:15:00")
                .is_err()
        );
        assert!(
            store
                .store()
                .get("time-type!new!2024-03-05 08:15:00")
                .is_ok()
        );
    }

    #[test]
    fn remove_entry_also_deletes_the_index_record() {
        let mut store = EntryStore::open_in_memory().unwrap();
        store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, Some("dev"))
            .unwrap();

        store.remove_entry("2024-03-05 08:15:00").unwrap();
        assert!(store.get_entry("2024-03-05 08:15:00").is_err());
        assert!(
            store
                .store()
                .get("time-type!dev!2024-03-05 08:15:00")
                .is_err()
        );
    }

    #[test]
    fn insert_blank_writes_an_empty_record() {
        let mut store = EntryStore::open_in_memory().unwrap();
        let key = store.insert_blank("2024-03-05 08:15:00").unwrap();
        assert_eq!(store.store().get(&key).unwrap(), "{}");
    }

    #[test]
    fn set_archived_flips_in_place() {
        let mut store = EntryStore::open_in_memory().unwrap();
        let key = store
            .start_entry(instant(2024, 3, 5, 8, 15, 0), None, None)
            .unwrap();

        store.set_archived("2024-03-05 08:15:00", true).unwrap();
        let (archived_key, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert_eq!(archived_key, key);
        assert!(entry.archive);

        store.set_archived("2024-03-05 08:15:00", false).unwrap();
        let (_, entry) = store.get_entry("2024-03-05 08:15:00").unwrap();
        assert!(!entry.archive);
    }
}
