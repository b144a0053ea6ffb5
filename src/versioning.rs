//! Practices versions
//!
//! A published practice set is named after the day it was published,
//! `YYYY-MM-DD`, with an `rN` suffix when that day already has a version.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{EngineError, Result};
use crate::practice::Practice;

lazy_static! {
    static ref VERSION: Regex = Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:r(\d+))?$").unwrap();
}

/// The name for a version published on `today`, and whether it needed a revision suffix.
///
/// The revision is one more than the highest seen for that day, so names are
/// not reused even if an intermediate version was deleted. An unsuffixed
/// version counts as revision 1.
pub fn next_version(existing: &[String], today: NaiveDate) -> Result<(String, bool)> {
    let date = today.format("%Y-%m-%d").to_string();
    let mut highest = 0u32;

    for version in existing.iter().filter(|v| v.starts_with(&date)) {
        let caps = VERSION
            .captures(version)
            .filter(|c| &c[1] == date)
            .ok_or_else(|| EngineError::InvalidVersion(version.clone()))?;
        let rev = match caps.get(2) {
            Some(r) => r
                .as_str()
                .parse::<u32>()
                .map_err(|_| EngineError::InvalidVersion(version.clone()))?,
            None => 1,
        };
        highest = highest.max(rev.max(1));
    }

    if highest == 0 {
        Ok((date, false))
    } else {
        Ok((format!("{}r{}", date, highest + 1), true))
    }
}

/// Whether two practice sets are identical, regardless of order
pub fn practices_match(a: &[Practice], b: &[Practice]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&Practice> = a.iter().collect();
    let mut b: Vec<&Practice> = b.iter().collect();
    a.sort_by(|x, y| x.id.cmp(&y.id));
    b.sort_by(|x, y| x.id.cmp(&y.id));
    a == b
}
