use std::cmp::Ordering;
use std::fmt;

use bankmap_core::{parse_amount, BankMapping, ColumnSpec, DateFormatProgram, StructureHint};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{column_markers, is_empty_row, is_probably_date};

/// A signature hit always outranks the best structural score (sum of the
/// bonuses below is 100).
pub const HEADER_SIGNATURE_BASE: i64 = 1000;
pub const COLUMN_COUNT_BONUS: i64 = 20;
pub const COLUMN_MARKERS_BONUS: i64 = 40;
pub const DATE_COMPATIBLE_BONUS: i64 = 25;
pub const AMOUNT_COMPATIBLE_BONUS: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    HeaderSignatureMismatch,
    ColumnCountMismatch,
    ColumnMarkersMismatch,
    DateIncompatible,
    AmountIncompatible,
    NoDataRows,
    NoStructureChecks,
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCode::HeaderSignatureMismatch => write!(f, "header_signature_mismatch"),
            IssueCode::ColumnCountMismatch => write!(f, "column_count_mismatch"),
            IssueCode::ColumnMarkersMismatch => write!(f, "column_markers_mismatch"),
            IssueCode::DateIncompatible => write!(f, "date_incompatible"),
            IssueCode::AmountIncompatible => write!(f, "amount_incompatible"),
            IssueCode::NoDataRows => write!(f, "no_data_rows"),
            IssueCode::NoStructureChecks => write!(f, "no_structure_checks"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// How many leading rows are searched for a header signature or for the
    /// first row of a headerless export.
    pub header_scan_rows: usize,
    /// Rows (and cells per column) sampled by the structure detector.
    pub sample_rows: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: 50,
            sample_rows: 10,
        }
    }
}

/// How well one mapping fits a row matrix. `score` ranks, `passed` gates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionCandidate<'a> {
    pub bank_name: String,
    #[serde(skip)]
    pub mapping: &'a BankMapping,
    pub score: i64,
    pub passed: bool,
    pub matched_header_signature: bool,
    pub matched_structure: bool,
    pub header_row_index: Option<usize>,
    pub data_start_index: Option<usize>,
    pub issues: Vec<IssueCode>,
}

impl<'a> DetectionCandidate<'a> {
    fn new(mapping: &'a BankMapping) -> Self {
        Self {
            bank_name: mapping.bank_name.clone(),
            mapping,
            score: 0,
            passed: false,
            matched_header_signature: false,
            matched_structure: false,
            header_row_index: None,
            data_start_index: None,
            issues: Vec::new(),
        }
    }
}

fn cells_equal(cell: &str, expected: &str) -> bool {
    cell.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// First non-empty value among the positional specifiers, per sampled row.
/// Header-name specifiers have nothing to resolve against in a headerless
/// file and are skipped.
fn positional_values<'r>(sample: &[&'r [String]], specs: &[ColumnSpec]) -> Option<Vec<&'r str>> {
    let positions: Vec<usize> = specs.iter().filter_map(ColumnSpec::index).collect();
    if positions.is_empty() {
        return None;
    }
    Some(
        sample
            .iter()
            .copied()
            .filter_map(|row| {
                positions
                    .iter()
                    .filter_map(|&i| row.get(i))
                    .map(|cell| cell.trim())
                    .find(|cell| !cell.is_empty())
            })
            .collect(),
    )
}

#[derive(Debug, Clone, Default)]
pub struct CandidateEvaluator {
    config: DetectionConfig,
}

impl CandidateEvaluator {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Runs every applicable detector for `mapping`. A mapping with neither
    /// a signature nor the headerless flag can never pass.
    pub fn evaluate<'a>(&self, mapping: &'a BankMapping, rows: &[Vec<String>]) -> DetectionCandidate<'a> {
        let mut candidate = DetectionCandidate::new(mapping);
        let mut applicable = false;
        let mut all_matched = true;

        if let Some(signature) = mapping.header_signature() {
            applicable = true;
            match self.find_signature(signature, rows) {
                Some(idx) => {
                    candidate.matched_header_signature = true;
                    candidate.score += HEADER_SIGNATURE_BASE + signature.len() as i64;
                    candidate.header_row_index = Some(idx);
                    candidate.data_start_index = Some(idx + 1);
                }
                None => {
                    all_matched = false;
                    candidate.issues.push(IssueCode::HeaderSignatureMismatch);
                }
            }
        }

        if mapping.without_header {
            applicable = true;
            if self.detect_structure(mapping, rows, &mut candidate) {
                candidate.matched_structure = true;
            } else {
                all_matched = false;
            }
        }

        candidate.passed = applicable && all_matched;
        debug!(
            bank = %candidate.bank_name,
            score = candidate.score,
            passed = candidate.passed,
            issues = ?candidate.issues,
            "evaluated bank mapping"
        );
        candidate
    }

    /// Evaluates the whole catalog, ranked best first.
    pub fn evaluate_all<'a>(&self, catalog: &'a [BankMapping], rows: &[Vec<String>]) -> Vec<DetectionCandidate<'a>> {
        let mut candidates: Vec<_> = catalog.iter().map(|m| self.evaluate(m, rows)).collect();
        rank_candidates(&mut candidates);
        candidates
    }

    fn find_signature(&self, signature: &[String], rows: &[Vec<String>]) -> Option<usize> {
        rows.iter().take(self.config.header_scan_rows).position(|row| {
            row.len() >= signature.len()
                && row
                    .iter()
                    .zip(signature)
                    .all(|(cell, expected)| cells_equal(cell, expected))
        })
    }

    fn detect_structure(
        &self,
        mapping: &BankMapping,
        rows: &[Vec<String>],
        candidate: &mut DetectionCandidate<'_>,
    ) -> bool {
        let default_hint = StructureHint::default();
        let hint = mapping.structure_hint().unwrap_or(&default_hint);
        let scan = self.config.header_scan_rows;

        let Some(first_non_empty) = rows.iter().take(scan).position(|r| !is_empty_row(r)) else {
            candidate.issues.push(IssueCode::NoDataRows);
            return false;
        };

        let mut matched = true;
        let mut checks = 0usize;
        let start = match hint.column_count {
            Some(count) => {
                checks += 1;
                match rows
                    .iter()
                    .take(scan)
                    .position(|r| !is_empty_row(r) && r.len() == count)
                {
                    Some(idx) => {
                        candidate.score += COLUMN_COUNT_BONUS;
                        idx
                    }
                    None => {
                        matched = false;
                        candidate.issues.push(IssueCode::ColumnCountMismatch);
                        first_non_empty
                    }
                }
            }
            None => first_non_empty,
        };

        if candidate.header_row_index.is_none() {
            candidate.header_row_index = Some(start);
            candidate.data_start_index = Some(start + 1);
        }

        let sample: Vec<&[String]> = rows[start..]
            .iter()
            .filter(|r| !is_empty_row(r))
            .take(self.config.sample_rows)
            .map(Vec::as_slice)
            .collect();

        if !hint.column_markers.is_empty() {
            checks += 1;
            let width = hint.column_count.unwrap_or(hint.column_markers.len());
            let markers = column_markers(&sample, width, self.config.sample_rows);
            if markers == hint.column_markers {
                candidate.score += COLUMN_MARKERS_BONUS;
            } else {
                matched = false;
                candidate.issues.push(IssueCode::ColumnMarkersMismatch);
            }
        }

        if let Some(dates) = positional_values(&sample, &mapping.booking_date) {
            checks += 1;
            let program = mapping.date_parse_format().and_then(DateFormatProgram::compile);
            let compatible = !dates.is_empty()
                && dates.iter().all(|v| match &program {
                    Some(p) => p.parse(v).is_some(),
                    None => is_probably_date(v),
                });
            if compatible {
                candidate.score += DATE_COMPATIBLE_BONUS;
            } else {
                matched = false;
                candidate.issues.push(IssueCode::DateIncompatible);
            }
        }

        if let Some(amounts) = positional_values(&sample, &mapping.booking_amount) {
            checks += 1;
            let compatible =
                !amounts.is_empty() && amounts.iter().all(|v| parse_amount(v).is_some());
            if compatible {
                candidate.score += AMOUNT_COMPATIBLE_BONUS;
            } else {
                matched = false;
                candidate.issues.push(IssueCode::AmountIncompatible);
            }
        }

        if checks == 0 {
            candidate.issues.push(IssueCode::NoStructureChecks);
            return false;
        }
        matched
    }
}

/// Score descending, then bank name ascending.
pub fn rank_candidates(candidates: &mut [DetectionCandidate<'_>]) {
    candidates.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.bank_name.cmp(&b.bank_name),
        other => other,
    });
}
