//! Turns raw CSV bytes into the trimmed row matrix detection works on.

use std::io::Read;

use tracing::{debug, warn};

use crate::error::ImportError;

const CANDIDATE_DELIMITERS: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Most frequent unquoted delimiter on the first non-empty line. Ties go to
/// `;`, then `,`; a line with none of them yields `,`.
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in first_line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte) {
                counts[i] += 1;
            }
        }
    }

    let mut best = (b',', 0usize);
    for (delimiter, count) in CANDIDATE_DELIMITERS.iter().zip(counts) {
        if count > best.1 {
            best = (*delimiter, count);
        }
    }
    best.0
}

fn decode(mut data: impl Read) -> Result<String, ImportError> {
    let mut bytes = Vec::new();
    data.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&*text).to_string())
}

/// Reads every record with a sniffed delimiter. Malformed records are
/// skipped with a warning rather than failing the file.
pub fn read_rows<R: Read>(data: R) -> Result<Vec<Vec<String>>, ImportError> {
    let content = decode(data)?;
    let delimiter = detect_delimiter(&content);
    debug!(delimiter = %char::from(delimiter).escape_default(), "sniffed csv delimiter");
    parse_rows(&content, delimiter)
}

pub fn read_rows_with_delimiter<R: Read>(data: R, delimiter: u8) -> Result<Vec<Vec<String>>, ImportError> {
    let content = decode(data)?;
    parse_rows(&content, delimiter)
}

fn parse_rows(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(record.iter().map(|s| s.to_string()).collect()),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => warn!(record = line, error = %e, "skipping malformed csv record"),
        }
    }
    Ok(rows)
}
