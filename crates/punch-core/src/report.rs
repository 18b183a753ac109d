//! Hour reports: day bucketing and canonical serialization.
//!
//! Each matched entry's interval is split at local midnight so hours land on
//! the calendar day they were worked, then per-day totals are assembled into
//! a deterministic report record.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Accumulating per-day hour totals.
///
/// Totals stay unrounded while accumulating; rounding happens once at report
/// build time so splits never compound rounding error.
#[derive(Debug, Default)]
pub struct DayBuckets {
    totals: BTreeMap<NaiveDate, f64>,
}

impl DayBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `[start, end)` at each local midnight and adds the pieces to
    /// their day buckets.
    ///
    /// A zero-duration interval still touches its day's bucket. An interval
    /// whose end precedes its start is taken at face value and contributes a
    /// negative addend; stored data is not second-guessed here.
    pub fn add_interval(&mut self, start: NaiveDateTime, end: NaiveDateTime) {
        if end <= start || start.date() == end.date() {
            self.add_hours(start.date(), hours_between(start, end));
            return;
        }
        let midnight = next_midnight(start);
        self.add_hours(start.date(), hours_between(start, midnight));
        // Each step advances start to a strictly later midnight, so the
        // recursion consumes the interval one calendar day at a time.
        self.add_interval(midnight, end);
    }

    fn add_hours(&mut self, date: NaiveDate, hours: f64) {
        *self.totals.entry(date).or_insert(0.0) += hours;
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Date-ascending view of the accumulated totals.
    pub const fn totals(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.totals
    }
}

/// First local midnight strictly after `instant`.
fn next_midnight(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        .date()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MAX)
}

fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = (end - start).num_seconds() as f64;
    seconds / 3600.0
}

/// One day's rounded total.
///
/// Field order is alphabetical so `serde_json` output is canonically
/// key-ordered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHours {
    pub date: NaiveDate,
    pub hours: f64,
}

/// The assembled report record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub hours: Vec<DayHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    pub title: String,
}

impl Report {
    /// Assembles day buckets into a report, rounding each total to two
    /// decimal places.
    pub fn build(title: impl Into<String>, rate: Option<f64>, buckets: &DayBuckets) -> Self {
        let hours = buckets
            .totals()
            .iter()
            .map(|(&date, &hours)| DayHours {
                date,
                hours: round_to_cents(hours),
            })
            .collect();
        Self {
            hours,
            rate,
            title: title.into(),
        }
    }

    /// Canonical serialization: repeated generation from identical data is
    /// byte-for-byte identical.
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn round_to_cents(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    #[test]
    fn same_day_interval_fills_one_bucket() {
        let mut buckets = DayBuckets::new();
        buckets.add_interval(instant(2024, 1, 1, 9, 0, 0), instant(2024, 1, 1, 17, 30, 0));
        assert_eq!(buckets.totals().len(), 1);
        let total = buckets.totals()[&date(2024, 1, 1)];
        assert!((total - 8.5).abs() < 1e-9);
    }

    #[test]
    fn single_midnight_crossing_splits_in_two() {
        let mut buckets = DayBuckets::new();
        buckets.add_interval(instant(2024, 1, 1, 22, 0, 0), instant(2024, 1, 2, 2, 0, 0));
        assert_eq!(buckets.totals().len(), 2);
        assert!((buckets.totals()[&date(2024, 1, 1)] - 2.0).abs() < 1e-9);
        assert!((buckets.totals()[&date(2024, 1, 2)] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn three_full_days_split_preserves_the_total() {
        let mut buckets = DayBuckets::new();
        let start = instant(2024, 1, 1, 10, 0, 0);
        let end = instant(2024, 1, 4, 10, 0, 0);
        buckets.add_interval(start, end);

        assert!(buckets.totals().len() >= 3);
        let sum: f64 = buckets.totals().values().sum();
        assert!((sum - 72.0).abs() < 0.01);
        assert!((buckets.totals()[&date(2024, 1, 2)] - 24.0).abs() < 1e-9);
        assert!((buckets.totals()[&date(2024, 1, 3)] - 24.0).abs() < 1e-9);
    }

    #[test]
    fn month_and_year_boundaries_split_like_any_midnight() {
        let mut buckets = DayBuckets::new();
        buckets.add_interval(
            instant(2023, 12, 31, 23, 0, 0),
            instant(2024, 1, 1, 1, 0, 0),
        );
        assert!((buckets.totals()[&date(2023, 12, 31)] - 1.0).abs() < 1e-9);
        assert!((buckets.totals()[&date(2024, 1, 1)] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_interval_touches_its_bucket() {
        let mut buckets = DayBuckets::new();
        let start = instant(2024, 1, 1, 9, 0, 0);
        buckets.add_interval(start, start);
        assert_eq!(buckets.totals().len(), 1);
        assert!(buckets.totals()[&date(2024, 1, 1)].abs() < 1e-9);
    }

    #[test]
    fn accumulation_rounds_only_at_build_time() {
        let mut buckets = DayBuckets::new();
        // 3 x 20 minutes; rounding each piece to cents first would drift.
        for hour in [9, 11, 13] {
            buckets.add_interval(
                instant(2024, 1, 1, hour, 0, 0),
                instant(2024, 1, 1, hour, 20, 0),
            );
        }
        let report = Report::build("t", None, &buckets);
        assert!((report.hours[0].hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn report_orders_days_ascending() {
        let mut buckets = DayBuckets::new();
        buckets.add_interval(instant(2024, 2, 10, 9, 0, 0), instant(2024, 2, 10, 10, 0, 0));
        buckets.add_interval(instant(2024, 1, 5, 9, 0, 0), instant(2024, 1, 5, 10, 0, 0));
        let report = Report::build("consulting", None, &buckets);
        let dates: Vec<NaiveDate> = report.hours.iter().map(|day| day.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 2, 10)]);
    }

    #[test]
    fn canonical_json_is_stable_and_key_ordered() {
        let mut buckets = DayBuckets::new();
        buckets.add_interval(instant(2024, 1, 1, 22, 0, 0), instant(2024, 1, 2, 2, 0, 0));
        let report = Report::build("consulting", Some(75.0), &buckets);

        let first = report.to_canonical_json().unwrap();
        let second = report.to_canonical_json().unwrap();
        assert_eq!(first, second);

        let compact = serde_json::to_string(&report).unwrap();
        assert_eq!(
            compact,
            r#"{"hours":[{"date":"2024-01-01","hours":2.0},{"date":"2024-01-02","hours":2.0}],"rate":75.0,"title":"consulting"}"#
        );
    }

    #[test]
    fn rate_is_omitted_when_absent() {
        let report = Report::build("consulting", None, &DayBuckets::new());
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"hours":[],"title":"consulting"}"#);
    }
}
