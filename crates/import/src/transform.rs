use std::collections::HashMap;

use bankmap_core::{parse_amount, BankMapping, ColumnSpec, DateFormatProgram, NumberPattern, UnifiedTx};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How normalised values are rendered for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Date format for `booking_date`; the mapping's parse format when unset.
    pub date_format: Option<String>,
    /// Number pattern amounts are re-rendered through, e.g. `#.##0,00`.
    pub amount_format: Option<String>,
}

/// Labels stamped onto every emitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxLabels {
    /// Overrides the mapping's bank name.
    pub bank_name: Option<String>,
    pub account: String,
}

/// A mapping bound to one header row, with its date programs compiled.
#[derive(Debug)]
pub struct MappingTransformer<'m> {
    mapping: &'m BankMapping,
    header_index: HashMap<String, usize>,
    parse_program: Option<DateFormatProgram>,
    display_program: Option<DateFormatProgram>,
    amount_pattern: Option<NumberPattern>,
}

impl<'m> MappingTransformer<'m> {
    pub fn new(mapping: &'m BankMapping, header: &[String], display: &DisplaySettings) -> Self {
        let mut header_index = HashMap::new();
        if !mapping.without_header {
            for (i, name) in header.iter().enumerate() {
                header_index.entry(name.trim().to_string()).or_insert(i);
            }
        }

        let parse_program = mapping.date_parse_format().and_then(DateFormatProgram::compile);
        let display_program = display
            .date_format
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .and_then(DateFormatProgram::compile)
            .or_else(|| parse_program.clone());
        let amount_pattern = display.amount_format.as_deref().and_then(NumberPattern::parse);

        Self {
            mapping,
            header_index,
            parse_program,
            display_program,
            amount_pattern,
        }
    }

    fn cell<'r>(&self, row: &'r [String], spec: &ColumnSpec) -> Option<&'r str> {
        let idx = match spec {
            ColumnSpec::Position(_) => spec.index()?,
            ColumnSpec::Header(name) => *self.header_index.get(name.trim())?,
        };
        row.get(idx).map(|v| v.trim())
    }

    fn first_value(&self, row: &[String], specs: &[ColumnSpec]) -> String {
        specs
            .iter()
            .filter_map(|spec| self.cell(row, spec))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    fn joined_value(&self, row: &[String], specs: &[ColumnSpec]) -> String {
        specs
            .iter()
            .filter_map(|spec| self.cell(row, spec))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalises one row. `None` when the row carries none of the
    /// four target fields.
    pub fn transform_row(&self, row: &[String], labels: &TxLabels) -> Option<UnifiedTx> {
        let raw_date = self.first_value(row, &self.mapping.booking_date);
        let booking_text = self.joined_value(row, &self.mapping.booking_text);
        let booking_type = self.first_value(row, &self.mapping.booking_type);
        let raw_amount = self.first_value(row, &self.mapping.booking_amount);

        if raw_date.is_empty() && booking_text.is_empty() && booking_type.is_empty() && raw_amount.is_empty() {
            return None;
        }

        let booking_date_iso = match &self.parse_program {
            Some(program) if !raw_date.is_empty() => program.parse(&raw_date),
            _ => None,
        };
        let booking_date = match (&booking_date_iso, &self.display_program) {
            (Some(dt), Some(display)) => display.format(dt),
            _ => raw_date.clone(),
        };

        let booking_amount = match &self.amount_pattern {
            Some(pattern) => parse_amount(&raw_amount)
                .map(|v| pattern.format(v))
                .unwrap_or(raw_amount),
            None => raw_amount,
        };

        Some(UnifiedTx {
            bank_name: labels
                .bank_name
                .clone()
                .unwrap_or_else(|| self.mapping.bank_name.clone()),
            booking_date,
            booking_date_raw: raw_date,
            booking_date_iso,
            booking_text,
            booking_type,
            booking_amount,
            booking_account: labels.account.clone(),
        })
    }
}

/// Applies `mapping` to `data_rows`. For headerless mappings `header` is the
/// first data row and is emitted too.
pub fn apply_mapping(
    data_rows: &[Vec<String>],
    header: &[String],
    mapping: &BankMapping,
    labels: &TxLabels,
    display: &DisplaySettings,
) -> Vec<UnifiedTx> {
    let transformer = MappingTransformer::new(mapping, header, display);
    let leading = mapping.without_header.then_some(header);

    let mut dropped = 0usize;
    let txs: Vec<UnifiedTx> = leading
        .into_iter()
        .chain(data_rows.iter().map(Vec::as_slice))
        .filter_map(|row| {
            let tx = transformer.transform_row(row, labels);
            if tx.is_none() {
                dropped += 1;
            }
            tx
        })
        .collect();

    debug!(
        bank = %mapping.bank_name,
        emitted = txs.len(),
        dropped,
        "applied bank mapping"
    );
    txs
}
