//! Type filtering for range scans.

use regex::Regex;

use crate::keys::ParseError;

/// A type filter, resolved once at query construction.
///
/// A token of the form `/…/` compiles to a pattern match; anything else is an
/// exact string comparison. Rows are tested against the already-built filter,
/// never against the raw token.
#[derive(Debug, Clone)]
pub enum TypeFilter {
    Exact(String),
    Pattern(Regex),
}

impl TypeFilter {
    /// Builds a filter from a user-supplied token.
    pub fn new(token: &str) -> Result<Self, ParseError> {
        if let Some(pattern) = token
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            let regex = Regex::new(pattern).map_err(|_| ParseError::Pattern {
                pattern: token.to_string(),
            })?;
            return Ok(Self::Pattern(regex));
        }
        Ok(Self::Exact(token.to_string()))
    }

    /// Tests an entry's type label. Untyped entries never match.
    pub fn matches(&self, kind: Option<&str>) -> bool {
        match (self, kind) {
            (Self::Exact(wanted), Some(kind)) => wanted == kind,
            (Self::Pattern(regex), Some(kind)) => regex.is_match(kind),
            (_, None) => false,
        }
    }
}
