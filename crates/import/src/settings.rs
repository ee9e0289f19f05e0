use serde::{Deserialize, Serialize};

use crate::detect::DetectionConfig;
use crate::error::ImportError;
use crate::transform::{DisplaySettings, TxLabels};

/// Per-import knobs, usually loaded from a small TOML file:
///
/// ```toml
/// [display]
/// date_format = "yyyy-MM-dd"
/// amount_format = "#.##0,00"
///
/// [detection]
/// header_scan_rows = 30
///
/// [labels]
/// account = "Giro"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub display: DisplaySettings,
    pub detection: DetectionConfig,
    pub labels: TxLabels,
}

impl ImportSettings {
    pub fn from_toml(toml_content: &str) -> Result<Self, ImportError> {
        Ok(toml::from_str(toml_content)?)
    }
}
