use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::MappingError;

/// Where a target field reads its value from: a header label, or a 1-based
/// column position written as `$N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnSpec {
    Header(String),
    Position(usize),
}

impl ColumnSpec {
    /// Zero-based column index for positional specifiers.
    pub fn index(&self) -> Option<usize> {
        match self {
            ColumnSpec::Position(n) => n.checked_sub(1),
            ColumnSpec::Header(_) => None,
        }
    }
}

impl FromStr for ColumnSpec {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MappingError::InvalidColumnSpec(s.to_string()));
        }
        match s.strip_prefix('$') {
            Some(n) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(ColumnSpec::Position(n)),
                _ => Err(MappingError::InvalidColumnSpec(s.to_string())),
            },
            None => Ok(ColumnSpec::Header(s.to_string())),
        }
    }
}

impl TryFrom<String> for ColumnSpec {
    type Error = MappingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnSpec> for String {
    fn from(spec: ColumnSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSpec::Header(name) => write!(f, "{name}"),
            ColumnSpec::Position(n) => write!(f, "${n}"),
        }
    }
}

/// Coarse type of a column in a headerless export. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnMarker {
    Date,
    Number,
    Text,
    Empty,
}

impl fmt::Display for ColumnMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMarker::Date => write!(f, "date"),
            ColumnMarker::Number => write!(f, "number"),
            ColumnMarker::Text => write!(f, "text"),
            ColumnMarker::Empty => write!(f, "empty"),
        }
    }
}

impl FromStr for ColumnMarker {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(ColumnMarker::Date),
            "number" => Ok(ColumnMarker::Number),
            "text" => Ok(ColumnMarker::Text),
            "empty" => Ok(ColumnMarker::Empty),
            other => Err(MappingError::InvalidColumnMarker(other.to_string())),
        }
    }
}

impl TryFrom<String> for ColumnMarker {
    type Error = MappingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnMarker> for String {
    fn from(marker: ColumnMarker) -> Self {
        marker.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSignature {
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureHint {
    #[serde(default)]
    pub column_count: Option<usize>,
    #[serde(default)]
    pub column_markers: Vec<ColumnMarker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionHint {
    HeaderSignature(HeaderSignature),
    HeaderlessStructure(StructureHint),
}

/// A learned description of one bank's CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMapping {
    pub bank_name: String,
    #[serde(default)]
    pub booking_date: Vec<ColumnSpec>,
    #[serde(default)]
    pub booking_text: Vec<ColumnSpec>,
    #[serde(default)]
    pub booking_type: Vec<ColumnSpec>,
    #[serde(default)]
    pub booking_amount: Vec<ColumnSpec>,
    #[serde(default)]
    pub booking_date_parse_format: Option<String>,
    /// The export has no label row. Cannot be combined with a header
    /// signature; catalogs reject that pairing.
    #[serde(default)]
    pub without_header: bool,
    #[serde(default)]
    pub detection: Vec<DetectionHint>,
}

impl BankMapping {
    pub fn new(bank_name: &str) -> Self {
        BankMapping {
            bank_name: bank_name.to_string(),
            booking_date: Vec::new(),
            booking_text: Vec::new(),
            booking_type: Vec::new(),
            booking_amount: Vec::new(),
            booking_date_parse_format: None,
            without_header: false,
            detection: Vec::new(),
        }
    }

    /// The first non-empty header signature, if any.
    pub fn header_signature(&self) -> Option<&[String]> {
        self.detection.iter().find_map(|hint| match hint {
            DetectionHint::HeaderSignature(sig) if !sig.columns.is_empty() => {
                Some(sig.columns.as_slice())
            }
            _ => None,
        })
    }

    pub fn structure_hint(&self) -> Option<&StructureHint> {
        self.detection.iter().find_map(|hint| match hint {
            DetectionHint::HeaderlessStructure(hint) => Some(hint),
            _ => None,
        })
    }

    pub fn date_parse_format(&self) -> Option<&str> {
        self.booking_date_parse_format
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

/// The set of known bank mappings. Bank names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingCatalog {
    #[serde(default, rename = "mapping")]
    mappings: Vec<BankMapping>,
}

impl MappingCatalog {
    pub fn new(mappings: Vec<BankMapping>) -> Result<Self, MappingError> {
        let mut seen = HashSet::new();
        for m in &mappings {
            if !seen.insert(m.bank_name.as_str()) {
                return Err(MappingError::DuplicateBank(m.bank_name.clone()));
            }
            if m.without_header && m.header_signature().is_some() {
                return Err(MappingError::SignatureWithoutHeader(m.bank_name.clone()));
            }
        }
        Ok(Self { mappings })
    }

    /// Loads `[[mapping]]` tables.
    pub fn from_toml(toml_content: &str) -> Result<Self, MappingError> {
        let parsed: MappingCatalog = toml::from_str(toml_content)?;
        Self::new(parsed.mappings)
    }

    /// Loads a JSON array of mappings.
    pub fn from_json(json: &str) -> Result<Self, MappingError> {
        let mappings: Vec<BankMapping> = serde_json::from_str(json)?;
        Self::new(mappings)
    }

    pub fn mappings(&self) -> &[BankMapping] {
        &self.mappings
    }

    pub fn get(&self, bank_name: &str) -> Option<&BankMapping> {
        self.mappings.iter().find(|m| m.bank_name == bank_name)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
