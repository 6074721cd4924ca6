//! Snapshot-name date extraction.
//!
//! Two naming conventions exist in the wild, tried in this order:
//!
//! 1. `snapshot_<date>[<sep><time>]` with `_`, `-` or `t`/`T` separators,
//!    e.g. `snapshot_20250729_130424` or `snapshot_2025_07_29t13_04_24`.
//! 2. `snapshot<YYYYMMDD>_<HHMMSS>`, e.g. `snapshot20250729_131212`.
//!
//! Anything else is "unparsable". Parsing never fails loudly: callers decide
//! whether an unparsable name is worth a warning.

use chrono::{NaiveDate, NaiveDateTime};

const EXTENDED_PREFIX: &str = "snapshot_";
const COMPACT_PREFIX: &str = "snapshot";

/// Extract the creation timestamp encoded in a snapshot name.
pub fn parse_snapshot_date(name: &str) -> Option<NaiveDateTime> {
    if let Some(rest) = name.strip_prefix(EXTENDED_PREFIX) {
        parse_extended(rest)
    } else if let Some(rest) = name.strip_prefix(COMPACT_PREFIX) {
        parse_compact(rest)
    } else {
        None
    }
}

/// `YYYYMMDD[_HHMM[SS]]` or `YYYY_MM_DD[_HH_MM[_SS]]`, any of `_ - t T` as separator.
fn parse_extended(rest: &str) -> Option<NaiveDateTime> {
    let groups: Vec<&str> = rest.split(['_', '-', 't', 'T']).collect();
    if groups.iter().any(|g| !is_digits(g)) {
        return None;
    }

    let lens: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    match lens.as_slice() {
        [8] | [8, 4] | [8, 6] | [4, 2, 2] | [4, 2, 2, 2, 2] | [4, 2, 2, 2, 2, 2] => {
            assemble(&groups.concat())
        }
        _ => None,
    }
}

/// `YYYYMMDD_HHMMSS`, exact digit counts required.
fn parse_compact(rest: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = rest.split_once('_')?;
    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }
    if !is_digits(date_part) || !is_digits(time_part) {
        return None;
    }
    assemble(&format!("{date_part}{time_part}"))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Build a timestamp from a run of 8, 12 or 14 ASCII digits
/// (`YYYYMMDD`, then optional `HHMM`, then optional `SS`).
fn assemble(digits: &str) -> Option<NaiveDateTime> {
    let field = |from: usize| -> Option<u32> { digits.get(from..from + 2)?.parse().ok() };

    let year: i32 = digits.get(0..4)?.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4)?, field(6)?)?;

    let hour = field(8).unwrap_or(0);
    let minute = field(10).unwrap_or(0);
    let second = field(12).unwrap_or(0);
    date.and_hms_opt(hour, minute, second)
}
