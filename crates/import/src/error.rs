use bankmap_core::MappingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
    #[error("Unknown bank mapping: {0}")]
    UnknownMapping(String),
}
