//! Date-expression parsing.
//!
//! User-facing commands accept dates in three shapes, tried in order:
//! a strict calendar parse, an opaque natural-language parser, and (for
//! updates against an existing entry) a merge of the reference entry's
//! calendar date with a bare time of day. Each stage either resolves an
//! instant or passes through to the next; only when every stage declines
//! does the expression fail.

use chrono::{NaiveDateTime, NaiveTime};

use crate::keys::{ParseError, STAMP_FORMAT};

/// An opaque natural-language date parser.
///
/// Implementations are external; the grammar is out of scope here. `now`
/// anchors relative expressions such as "two hours ago".
pub trait NaturalDateParser {
    fn parse(&self, expr: &str, now: NaiveDateTime) -> Option<NaiveDateTime>;
}

/// The default parser: declines everything, leaving only the strict and
/// merge stages active.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNaturalDates;

impl NaturalDateParser for NoNaturalDates {
    fn parse(&self, _expr: &str, _now: NaiveDateTime) -> Option<NaiveDateTime> {
        None
    }
}

const STRICT_FORMATS: [&str; 2] = [STAMP_FORMAT, "%Y-%m-%dT%H:%M:%S"];

/// Stage 1: strict calendar-date-plus-time parse. A bare date resolves to
/// midnight.
fn strict_stage(expr: &str) -> Option<NaiveDateTime> {
    for format in STRICT_FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(expr, format) {
            return Some(instant);
        }
    }
    chrono::NaiveDate::parse_from_str(expr, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Stage 3: interpret the expression as a bare time of day on the reference
/// instant's calendar date.
fn time_merge_stage(reference: NaiveDateTime, expr: &str) -> Option<NaiveDateTime> {
    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(expr, format) {
            return Some(reference.date().and_time(time));
        }
    }
    None
}

/// Parses a full date expression (stages 1 and 2).
pub fn parse_date_expression(
    expr: &str,
    natural: &dyn NaturalDateParser,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, ParseError> {
    strict_stage(expr)
        .or_else(|| natural.parse(expr, now))
        .ok_or_else(|| ParseError::DateExpression {
            expr: expr.to_string(),
        })
}

/// Parses an update expression against a reference instant (stages 1-3).
///
/// The reference is the value being replaced: the entry's current start or
/// end, or an original value supplied alongside the update.
pub fn merge_date(
    reference: NaiveDateTime,
    expr: &str,
    natural: &dyn NaturalDateParser,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, ParseError> {
    strict_stage(expr)
        .or_else(|| natural.parse(expr, now))
        .or_else(|| time_merge_stage(reference, expr))
        .ok_or_else(|| ParseError::DateExpression {
            expr: expr.to_string(),
        })
}
