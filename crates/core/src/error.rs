use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Invalid column specifier: '{0}'")]
    InvalidColumnSpec(String),
    #[error("Invalid column marker: '{0}'")]
    InvalidColumnMarker(String),
    #[error("Failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate bank mapping: {0}")]
    DuplicateBank(String),
    #[error("Bank mapping '{0}' has a header signature but is marked without_header")]
    SignatureWithoutHeader(String),
}
