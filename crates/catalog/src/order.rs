//! Sort keys for chapter and page names.
//!
//! Two conventions live side by side:
//!
//! - **Natural chapter order** (used by chapter listings) is strict: every
//!   chapter name is a number, optionally followed by `" - "` and a title
//!   (`"12"`, `"12.5"`, `"13 - The Return"`).
//! - **Combined order** (used by the flattened view of a whole collection) is
//!   lenient: a chapter name only *starts* with a number if it has one at all,
//!   and names without a number are given a synthetic negative rank by
//!   [`ChapterRanks`](crate::ChapterRanks).
//!
//! Page names are always an integer followed by an extension (`"7.png"`).

use crate::error::{ErrorKind, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Separator between a chapter's number and its title.
const TITLE_SEPARATOR: &str = " - ";

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9.]+").unwrap());

fn parse_float(text: &str, name: &str) -> Result<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => exn::bail!(ErrorKind::MalformedName(name.to_string())),
    }
}

fn parse_int(text: &str, name: &str) -> Result<i64> {
    match text.trim().parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) => exn::bail!(ErrorKind::MalformedName(name.to_string())),
    }
}

/// Natural sort key of a chapter name: the number before `" - "` if the name
/// has a title, otherwise the whole name as a number.
///
/// ```
/// use shelf_catalog::order::chapter_key;
/// assert_eq!(chapter_key("12").unwrap(), 12.0);
/// assert_eq!(chapter_key("12.5 - Interlude").unwrap(), 12.5);
/// assert!(chapter_key("Extra").is_err());
/// ```
pub fn chapter_key(name: &str) -> Result<f64> {
    let number = name.split_once(TITLE_SEPARATOR).map_or(name, |(number, _)| number);
    parse_float(number, name)
}

/// Sorts chapter names by [`chapter_key`], ascending.
pub fn sort_chapters(names: Vec<String>) -> Result<Vec<String>> {
    let mut keyed = names
        .into_iter()
        .map(|name| -> Result<(f64, String)> { Ok((chapter_key(&name)?, name)) })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

/// Page number of a file within a chapter listing: the integer before the
/// first `.` (`"3.png"` → 3, `"12"` → 12).
pub fn page_number(file_name: &str) -> Result<i64> {
    let stem = file_name.split_once('.').map_or(file_name, |(stem, _)| stem);
    parse_int(stem, file_name)
}

/// Page number of a file within the combined view: the integer before the
/// *last* `.`. A file without an extension has no page number here.
pub fn combined_page_number(file_name: &str) -> Result<i64> {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => parse_int(stem, file_name),
        None => exn::bail!(ErrorKind::MalformedName(file_name.to_string())),
    }
}

/// Value of the run of digits and dots a chapter name starts with, or `None`
/// if it doesn't start with one. A run that isn't a valid number (`"1.2.3"`)
/// is malformed.
///
/// ```
/// use shelf_catalog::order::leading_number;
/// assert_eq!(leading_number("12_-_Extra").unwrap(), Some(12.0));
/// assert_eq!(leading_number("Extra").unwrap(), None);
/// ```
pub fn leading_number(chapter: &str) -> Result<Option<f64>> {
    LEADING_NUMBER.find(chapter).map(|run| parse_float(run.as_str(), chapter)).transpose()
}

/// Orders `(chapter rank, page number)` keys of the combined view.
pub(crate) fn compare_combined(a: &(f64, i64), b: &(f64, i64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}
