//! Target resolution for manual cleanup.
//!
//! Exactly one selector mode is used per invocation. Selectors are compiled
//! (pattern / cutoff validated) before the repository is listed, so malformed
//! input fails before any deletion is attempted.

use std::fmt;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::SnapshotRecord;

/// How a cleanup pattern is translated into a regular expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatternSyntax {
    /// Only `*` is special; the pattern must match the whole name.
    #[default]
    Strict,
    /// `*` becomes `.*` and everything else keeps its regex meaning; the
    /// pattern only has to match a prefix of the name.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    InvalidPattern { pattern: String, message: String },
    InvalidDate { value: String, message: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::InvalidPattern { pattern, message } => {
                write!(f, "invalid pattern '{pattern}': {message}")
            }
            SelectionError::InvalidDate { value, message } => {
                write!(f, "invalid date '{value}' (expected YYYY-MM-DD): {message}")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Glob-style snapshot name pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn compile(pattern: &str, syntax: PatternSyntax) -> Result<Self, SelectionError> {
        let invalid = |message: String| SelectionError::InvalidPattern {
            pattern: pattern.to_string(),
            message,
        };

        let expr = match syntax {
            PatternSyntax::Strict => {
                if pattern.is_empty() {
                    return Err(invalid("pattern is empty".to_string()));
                }
                let body = pattern
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                format!("^{body}$")
            }
            PatternSyntax::Legacy => format!("^(?:{})", pattern.replace('*', ".*")),
        };

        let regex = Regex::new(&expr).map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Parse a `YYYY-MM-DD` cutoff.
pub fn parse_cutoff_date(value: &str) -> Result<NaiveDate, SelectionError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| SelectionError::InvalidDate {
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// A validated cleanup selector.
#[derive(Debug, Clone)]
pub enum Selector {
    Names(Vec<String>),
    Pattern(GlobPattern),
    /// Names dated strictly before this calendar day.
    OlderThan(NaiveDate),
    All,
}

/// Resolved cleanup targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// In listing order.
    pub targets: Vec<String>,
    /// Requested names that do not exist (by-name mode only).
    pub missing: Vec<String>,
    /// Names skipped by the age cutoff because they carry no date.
    pub undated: Vec<String>,
}

impl Selector {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn pattern(pattern: &str, syntax: PatternSyntax) -> Result<Self, SelectionError> {
        GlobPattern::compile(pattern, syntax).map(Selector::Pattern)
    }

    pub fn older_than(value: &str) -> Result<Self, SelectionError> {
        parse_cutoff_date(value).map(Selector::OlderThan)
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Selector::Names(_) => "names",
            Selector::Pattern(_) => "pattern",
            Selector::OlderThan(_) => "older_than",
            Selector::All => "all",
        }
    }

    /// Resolve targets against the current listing.
    pub fn resolve(&self, existing: &[SnapshotRecord]) -> Selection {
        let mut out = Selection::default();

        match self {
            Selector::All => {
                out.targets = existing.iter().map(|s| s.name.clone()).collect();
            }
            Selector::Names(requested) => {
                // Listing order, not request order.
                out.targets = existing
                    .iter()
                    .filter(|s| requested.iter().any(|r| r == &s.name))
                    .map(|s| s.name.clone())
                    .collect();
                out.missing = requested
                    .iter()
                    .filter(|r| !existing.iter().any(|s| &s.name == *r))
                    .cloned()
                    .collect();
            }
            Selector::Pattern(glob) => {
                out.targets = existing
                    .iter()
                    .filter(|s| glob.is_match(&s.name))
                    .map(|s| s.name.clone())
                    .collect();
            }
            Selector::OlderThan(cutoff) => {
                for s in existing {
                    match s.parsed_date() {
                        Some(date) if date.date() < *cutoff => out.targets.push(s.name.clone()),
                        Some(_) => {}
                        None => out.undated.push(s.name.clone()),
                    }
                }
            }
        }

        out
    }
}
