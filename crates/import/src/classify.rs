//! Cell and column type heuristics for headerless exports.
//!
//! These are deliberately loose: a bare `2024` classifies as a number, not a
//! date. Stored column markers were learned against exactly this behaviour.

use std::sync::OnceLock;

use bankmap_core::{is_amount_space, ColumnMarker};
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_dotted, r"^\d{1,2}\.\d{1,2}\.\d{4}$");
re!(re_date_slash, r"^\d{1,2}/\d{1,2}/\d{4}$");
re!(re_date_iso,
    r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?(?:Z|[+-]\d{2}:?\d{2})?$");
re!(re_number, r"^[+-]?(?:\d{1,3}(?:[.,]\d{3})+|\d+)(?:[.,]\d+)?$");

pub fn is_empty_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

pub fn is_probably_date(value: &str) -> bool {
    let v = value.trim();
    re_date_dotted().is_match(v) || re_date_slash().is_match(v) || re_date_iso().is_match(v)
}

pub fn is_probably_number(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !is_amount_space(*c))
        .collect();
    re_number().is_match(&compact)
}

pub fn classify_cell(value: &str) -> ColumnMarker {
    if value.trim().is_empty() {
        ColumnMarker::Empty
    } else if is_probably_date(value) {
        ColumnMarker::Date
    } else if is_probably_number(value) {
        ColumnMarker::Number
    } else {
        ColumnMarker::Text
    }
}

/// A column is `date`/`number` only if every non-empty cell agrees,
/// `empty` if it has no content at all, and `text` otherwise.
pub fn classify_column<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnMarker {
    let mut marker = ColumnMarker::Empty;
    for cell in cells {
        match (marker, classify_cell(cell)) {
            (_, ColumnMarker::Empty) => {}
            (ColumnMarker::Empty, found) => marker = found,
            (current, found) if current == found => {}
            _ => return ColumnMarker::Text,
        }
    }
    marker
}

/// Markers for the first `width` columns, looking at up to `max_cells`
/// cells per column. Missing cells count as empty.
pub fn column_markers(sample: &[&[String]], width: usize, max_cells: usize) -> Vec<ColumnMarker> {
    (0..width)
        .map(|col| {
            classify_column(
                sample
                    .iter()
                    .take(max_cells)
                    .map(|row| row.get(col).map(String::as_str).unwrap_or("")),
            )
        })
        .collect()
}
