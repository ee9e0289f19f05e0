pub mod amount;
pub mod date_format;
pub mod error;
pub mod mapping;
pub mod transaction;

pub use amount::{format_number_with_pattern, is_amount_space, parse_amount, NumberPattern};
pub use date_format::{format_date, parse_date, DateFormatProgram};
pub use error::MappingError;
pub use mapping::{
    BankMapping, ColumnMarker, ColumnSpec, DetectionHint, HeaderSignature, MappingCatalog,
    StructureHint,
};
pub use transaction::UnifiedTx;
