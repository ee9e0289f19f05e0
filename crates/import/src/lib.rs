pub mod classify;
pub mod csv;
pub mod detect;
pub mod error;
pub mod header;
pub mod settings;
pub mod transform;

pub use detect::{CandidateEvaluator, DetectionCandidate, DetectionConfig, IssueCode};
pub use error::ImportError;
pub use header::{detect_header, DetectionOutcome, HeaderDetectionResult, HeaderResolver};
pub use settings::ImportSettings;
pub use transform::{apply_mapping, DisplaySettings, MappingTransformer, TxLabels};

pub mod import {
    use bankmap_core::{BankMapping, MappingCatalog, UnifiedTx};
    use serde::Serialize;
    use tracing::{info, warn};

    use crate::*;

    /// Everything one import produced, diagnostics included.
    #[derive(Debug, Clone, Serialize)]
    pub struct ImportOutcome<'a> {
        pub detection: HeaderDetectionResult<'a>,
        #[serde(skip)]
        pub mapping: Option<&'a BankMapping>,
        pub transactions: Vec<UnifiedTx>,
    }

    /// Detects, resolves and transforms `rows`. `selected` names a catalog
    /// mapping to apply regardless of what detection found; without it only
    /// a passing detected mapping is applied.
    pub fn import_rows<'a>(
        rows: &[Vec<String>],
        catalog: &'a MappingCatalog,
        settings: &ImportSettings,
        selected: Option<&str>,
    ) -> Result<ImportOutcome<'a>, ImportError> {
        let chosen = match selected {
            Some(name) => Some(
                catalog
                    .get(name)
                    .ok_or_else(|| ImportError::UnknownMapping(name.to_string()))?,
            ),
            None => None,
        };

        let detection = HeaderResolver::new(settings.detection.clone()).resolve(rows, catalog.mappings());
        let mapping = chosen.or_else(|| detection.matched_mapping());

        let transactions = match mapping {
            Some(m) => {
                let txs = apply_mapping(&detection.data_rows, &detection.header, m, &settings.labels, &settings.display);
                info!(bank = %m.bank_name, transactions = txs.len(), "imported statement");
                txs
            }
            None => {
                warn!(outcome = ?detection.outcome, "no bank mapping to apply; nothing imported");
                Vec::new()
            }
        };

        Ok(ImportOutcome {
            detection,
            mapping,
            transactions,
        })
    }

    pub fn import_csv<'a, R: std::io::Read>(
        data: R,
        catalog: &'a MappingCatalog,
        settings: &ImportSettings,
        selected: Option<&str>,
    ) -> Result<ImportOutcome<'a>, ImportError> {
        let rows = crate::csv::read_rows(data)?;
        import_rows(&rows, catalog, settings, selected)
    }

}
