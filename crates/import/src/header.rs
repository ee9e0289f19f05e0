use bankmap_core::BankMapping;
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::is_empty_row;
use crate::detect::{CandidateEvaluator, DetectionCandidate, DetectionConfig};

/// Exactly one of these describes every detection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionOutcome {
    HeaderSignature { bank_name: String },
    HeaderlessStructure { bank_name: String },
    Fallback,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderDetectionResult<'a> {
    /// For headerless matches this is the first data row, not labels.
    pub header: Vec<String>,
    pub data_rows: Vec<Vec<String>>,
    /// Every catalog mapping, ranked; kept for diagnostics whatever the outcome.
    pub candidates: Vec<DetectionCandidate<'a>>,
    pub has_header: bool,
    pub skipped_rows: usize,
    pub warning: Option<String>,
    pub outcome: DetectionOutcome,
}

impl<'a> HeaderDetectionResult<'a> {
    /// The mapping that matched, if detection did not fall back.
    pub fn matched_mapping(&self) -> Option<&'a BankMapping> {
        match self.outcome {
            DetectionOutcome::HeaderSignature { .. } | DetectionOutcome::HeaderlessStructure { .. } => {
                self.candidates.iter().find(|c| c.passed).map(|c| c.mapping)
            }
            DetectionOutcome::Fallback | DetectionOutcome::Empty => None,
        }
    }

    /// The best-scoring candidate, passed or not.
    pub fn preferred(&self) -> Option<&DetectionCandidate<'a>> {
        self.candidates
            .iter()
            .find(|c| c.passed)
            .or_else(|| self.candidates.first())
    }
}

fn non_empty_after(rows: &[Vec<String>], idx: usize) -> Vec<Vec<String>> {
    rows.iter()
        .skip(idx + 1)
        .filter(|r| !is_empty_row(r))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct HeaderResolver {
    evaluator: CandidateEvaluator,
}

impl HeaderResolver {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            evaluator: CandidateEvaluator::new(config),
        }
    }

    /// Picks a header for `rows`. Never fails: when nothing in the catalog
    /// fits, the first non-empty row becomes the header and a warning is set.
    pub fn resolve<'a>(&self, rows: &[Vec<String>], catalog: &'a [BankMapping]) -> HeaderDetectionResult<'a> {
        let candidates = self.evaluator.evaluate_all(catalog, rows);

        let Some(first_non_empty) = rows.iter().position(|r| !is_empty_row(r)) else {
            warn!("no non-empty rows to detect a header in");
            return HeaderDetectionResult {
                header: Vec::new(),
                data_rows: Vec::new(),
                candidates,
                has_header: false,
                skipped_rows: 0,
                warning: Some("File contains no non-empty rows".to_string()),
                outcome: DetectionOutcome::Empty,
            };
        };

        let matched = candidates
            .iter()
            .find(|c| c.passed)
            .and_then(|c| c.header_row_index.map(|idx| (c, idx)));

        let (idx, has_header, outcome) = match matched {
            Some((c, idx)) if c.matched_header_signature => (
                idx,
                true,
                DetectionOutcome::HeaderSignature {
                    bank_name: c.bank_name.clone(),
                },
            ),
            Some((c, idx)) => (
                idx,
                false,
                DetectionOutcome::HeaderlessStructure {
                    bank_name: c.bank_name.clone(),
                },
            ),
            None => (first_non_empty, true, DetectionOutcome::Fallback),
        };

        let warning = match (&outcome, candidates.first()) {
            (DetectionOutcome::Fallback, None) => Some(
                "No bank mappings configured; using the first non-empty row as header".to_string(),
            ),
            (DetectionOutcome::Fallback, Some(best)) => Some(format!(
                "No bank mapping matched (closest: {}, score {}); using the first non-empty row as header",
                best.bank_name, best.score
            )),
            _ => None,
        };

        match &warning {
            Some(w) => warn!(row = idx, "{w}"),
            None => info!(row = idx, has_header, outcome = ?outcome, "header resolved"),
        }

        HeaderDetectionResult {
            header: rows[idx].clone(),
            data_rows: non_empty_after(rows, idx),
            candidates,
            has_header,
            skipped_rows: idx,
            warning,
            outcome,
        }
    }
}

pub fn detect_header<'a>(rows: &[Vec<String>], catalog: &'a [BankMapping]) -> HeaderDetectionResult<'a> {
    HeaderResolver::default().resolve(rows, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankmap_core::{ColumnMarker, DetectionHint, HeaderSignature, StructureHint};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn signature_mapping(name: &str, columns: &[&str]) -> BankMapping {
        let mut m = BankMapping::new(name);
        m.detection.push(DetectionHint::HeaderSignature(HeaderSignature {
            columns: columns.iter().map(|s| s.to_string()).collect(),
        }));
        m
    }

    fn headerless_mapping(name: &str) -> BankMapping {
        let mut m = BankMapping::new(name);
        m.without_header = true;
        m.booking_date = vec!["$1".parse().unwrap()];
        m.booking_amount = vec!["$3".parse().unwrap()];
        m.detection.push(DetectionHint::HeaderlessStructure(StructureHint {
            column_count: Some(3),
            column_markers: vec![ColumnMarker::Date, ColumnMarker::Text, ColumnMarker::Number],
        }));
        m
    }

    // ── outcomes ──────────────────────────────────────────────────────────────

    #[test]
    fn signature_match_sets_header_and_skipped_rows() {
        let data = rows(&[
            &["Konto", "DE00"],
            &[""],
            &["Datum", "Text", "Betrag"],
            &["01.01.2024", "REWE", "-5,00"],
            &[""],
            &["02.01.2024", "Lidl", "-7,00"],
        ]);
        let catalog = vec![signature_mapping("ING", &["datum", "text"])];
        let result = detect_header(&data, &catalog);

        assert!(result.has_header);
        assert_eq!(result.skipped_rows, 2);
        assert_eq!(result.header, vec!["Datum", "Text", "Betrag"]);
        assert_eq!(result.data_rows.len(), 2);
        assert_eq!(result.warning, None);
        assert_eq!(
            result.outcome,
            DetectionOutcome::HeaderSignature { bank_name: "ING".into() }
        );
        assert_eq!(result.matched_mapping().unwrap().bank_name, "ING");
    }

    #[test]
    fn headerless_match_keeps_first_data_row_as_header() {
        let data = rows(&[
            &["01.01.2024", "REWE", "-5,00"],
            &["02.01.2024", "Lidl", "-7,00"],
        ]);
        let catalog = vec![headerless_mapping("Volksbank")];
        let result = detect_header(&data, &catalog);

        assert!(!result.has_header);
        assert_eq!(result.header, vec!["01.01.2024", "REWE", "-5,00"]);
        assert_eq!(result.data_rows, vec![vec!["02.01.2024", "Lidl", "-7,00"]]);
        assert_eq!(result.skipped_rows, 0);
        assert_eq!(
            result.outcome,
            DetectionOutcome::HeaderlessStructure { bank_name: "Volksbank".into() }
        );
    }

    #[test]
    fn fallback_to_first_non_empty_row() {
        let data = rows(&[&[""], &["a", "b"], &["1", "2"]]);
        let catalog = vec![signature_mapping("ING", &["Datum"])];
        let result = detect_header(&data, &catalog);

        assert!(result.has_header);
        assert_eq!(result.header, vec!["a", "b"]);
        assert_eq!(result.skipped_rows, 1);
        assert_eq!(result.outcome, DetectionOutcome::Fallback);
        assert!(result.warning.as_deref().unwrap().contains("closest: ING"));
        assert!(result.matched_mapping().is_none());
        assert_eq!(result.preferred().unwrap().bank_name, "ING");
        assert_eq!(result.candidates.len(), 1);
    }

    #[test]
    fn fallback_without_catalog() {
        let data = rows(&[&["a", "b"], &["1", "2"]]);
        let result = detect_header(&data, &[]);
        assert_eq!(result.outcome, DetectionOutcome::Fallback);
        assert!(result.warning.as_deref().unwrap().contains("No bank mappings configured"));
        assert!(result.candidates.is_empty());
        assert_eq!(result.data_rows.len(), 1);
    }

    #[test]
    fn empty_input() {
        let catalog = vec![signature_mapping("ING", &["Datum"])];
        for data in [Vec::new(), rows(&[&["", " "], &[""]])] {
            let result = detect_header(&data, &catalog);
            assert_eq!(result.outcome, DetectionOutcome::Empty);
            assert!(result.header.is_empty());
            assert!(result.data_rows.is_empty());
            assert!(result.warning.is_some());
            assert_eq!(result.candidates.len(), 1);
        }
    }

    // ── preference ────────────────────────────────────────────────────────────

    #[test]
    fn passed_candidate_beats_higher_failing_one() {
        let data = rows(&[
            &["01.01.2024", "REWE", "-5,00"],
            &["02.01.2024", "Lidl", "-7,00"],
        ]);
        let mut wide = headerless_mapping("Alpha");
        wide.detection = vec![DetectionHint::HeaderlessStructure(StructureHint {
            column_count: Some(5),
            column_markers: Vec::new(),
        })];
        let mut narrow = BankMapping::new("Zulu");
        narrow.without_header = true;
        narrow.detection = vec![DetectionHint::HeaderlessStructure(StructureHint {
            column_count: Some(3),
            column_markers: Vec::new(),
        })];
        let catalog = vec![wide, narrow];

        let result = detect_header(&data, &catalog);
        assert_eq!(result.candidates[0].bank_name, "Alpha");
        assert!(!result.candidates[0].passed);
        assert_eq!(
            result.outcome,
            DetectionOutcome::HeaderlessStructure { bank_name: "Zulu".into() }
        );
        assert_eq!(result.matched_mapping().unwrap().bank_name, "Zulu");
        assert_eq!(result.preferred().unwrap().bank_name, "Zulu");
    }

    #[test]
    fn unconstrained_headerless_mapping_does_not_claim_files() {
        let data = rows(&[&["Foo", "Bar"], &["1", "2"]]);
        let mut generic = BankMapping::new("Generic");
        generic.without_header = true;
        generic.booking_text = vec!["Beschreibung".parse().unwrap()];
        let catalog = vec![signature_mapping("ING", &["Datum"]), generic];

        let result = detect_header(&data, &catalog);
        assert_eq!(result.outcome, DetectionOutcome::Fallback);
        assert!(result.has_header);
        assert!(result.warning.is_some());
        assert!(result.matched_mapping().is_none());
    }

    #[test]
    fn preferred_falls_back_to_top_score() {
        let data = rows(&[&["01.01.2024", "REWE", "-5,00", "x"]]);
        let catalog = vec![headerless_mapping("Alpha"), signature_mapping("Beta", &["Datum"])];
        let result = detect_header(&data, &catalog);
        assert_eq!(result.outcome, DetectionOutcome::Fallback);
        let preferred = result.preferred().unwrap();
        assert_eq!(preferred.bank_name, "Alpha");
        assert!(!preferred.passed);
        assert!(preferred.score > 0);
    }

    #[test]
    fn result_serializes_for_diagnostics() {
        let data = rows(&[&["a"]]);
        let catalog = vec![signature_mapping("ING", &["Datum"])];
        let json = serde_json::to_value(detect_header(&data, &catalog)).unwrap();
        assert_eq!(json["outcome"]["kind"], "fallback");
        assert_eq!(json["candidates"][0]["issues"][0], "header_signature_mismatch");
    }
}
