//! Sortable key encoding for the entry store.
//!
//! Entries live under `time!<stamp>` where the stamp is the entry's start
//! instant rendered as fixed-width local wall-clock time. Because the
//! rendering is fixed-width and most-significant-field-first, lexicographic
//! key order is chronological order and range scans need no secondary sort.
//! The secondary type index lives under `time-type!<type>!<stamp>`.

use chrono::{Local, LocalResult, NaiveDateTime, TimeZone};
use thiserror::Error;

/// Prefix for primary entry keys.
pub const TIME_PREFIX: &str = "time!";

/// Prefix for secondary type index keys.
pub const TYPE_PREFIX: &str = "time-type!";

/// Exclusive upper bound for a full scan of the primary range.
///
/// `~` sorts after every character the stamp rendering can produce.
pub const TIME_SCAN_END: &str = "time!~";

/// Fixed-width stamp rendering. Second resolution, local wall clock.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from key and date-expression handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A key did not carry the expected prefix or a well-formed stamp.
    #[error("malformed key: {key}")]
    Key { key: String },
    /// A date expression survived no stage of the parser cascade.
    #[error("unparseable date expression: {expr}")]
    DateExpression { expr: String },
    /// A type filter token compiled to an invalid pattern.
    #[error("invalid type pattern: {pattern}")]
    Pattern { pattern: String },
}

/// Renders an instant as a sortable stamp.
pub fn encode_stamp(instant: NaiveDateTime) -> String {
    instant.format(STAMP_FORMAT).to_string()
}

/// Parses a sortable stamp back into an instant.
pub fn decode_stamp(stamp: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).map_err(|_| ParseError::Key {
        key: stamp.to_string(),
    })
}

/// Builds the primary key for an entry starting at `instant`.
pub fn primary_key(instant: NaiveDateTime) -> String {
    format!("{TIME_PREFIX}{}", encode_stamp(instant))
}

/// Builds the secondary index key for a typed entry.
pub fn type_key(kind: &str, stamp: &str) -> String {
    format!("{TYPE_PREFIX}{kind}!{stamp}")
}

/// Returns the stamp portion of a primary key.
pub fn stamp_of(key: &str) -> Result<&str, ParseError> {
    key.strip_prefix(TIME_PREFIX).ok_or_else(|| ParseError::Key {
        key: key.to_string(),
    })
}

/// Decodes the start instant out of a primary key.
pub fn decode_key(key: &str) -> Result<NaiveDateTime, ParseError> {
    decode_stamp(stamp_of(key)?)
}

/// Resolves a user-supplied stamp token into a canonical primary key.
///
/// A purely numeric token is a Unix-epoch-seconds reference and is converted
/// to the local stamp it encodes; anything else is taken as a literal stamp
/// suffix.
pub fn resolve_stamp(token: &str) -> Result<String, ParseError> {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = token.parse().map_err(|_| ParseError::Key {
            key: token.to_string(),
        })?;
        let local = match Local.timestamp_opt(secs, 0) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
            LocalResult::None => {
                return Err(ParseError::Key {
                    key: token.to_string(),
                });
            }
        };
        return Ok(primary_key(local.naive_local()));
    }
    Ok(format!("{TIME_PREFIX}{token}"))
}

/// Converts a primary key into its Unix-epoch-seconds stamp.
///
/// Inverse of the numeric branch of [`resolve_stamp`]. DST fold ambiguity
/// resolves to the earlier instant.
pub fn epoch_stamp(key: &str) -> Result<i64, ParseError> {
    let start = decode_key(key)?;
    match Local.from_local_datetime(&start) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.timestamp()),
        LocalResult::None => Err(ParseError::Key {
            key: key.to_string(),
        }),
    }
}
