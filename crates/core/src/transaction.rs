use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::amount::{format_number_with_pattern, parse_amount};

/// One statement line normalised into the canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTx {
    pub bank_name: String,
    /// Display date: re-rendered when the raw date parsed, else the raw text.
    pub booking_date: String,
    pub booking_date_raw: String,
    pub booking_date_iso: Option<NaiveDateTime>,
    pub booking_text: String,
    pub booking_type: String,
    /// As found in the file, separators and all.
    pub booking_amount: String,
    pub booking_account: String,
}

impl UnifiedTx {
    pub fn amount_value(&self) -> Option<f64> {
        parse_amount(&self.booking_amount)
    }

    /// The amount rendered through `pattern`, or `None` if it does not parse.
    pub fn amount_formatted(&self, pattern: &str) -> Option<String> {
        self.amount_value()
            .map(|v| format_number_with_pattern(v, pattern))
    }

    pub fn has_canonical_date(&self) -> bool {
        self.booking_date_iso.is_some()
    }
}
