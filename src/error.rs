//! Error types for the CNAB240 importer.

use thiserror::Error;

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, CnabError>;

/// Errors that can occur while decoding and reconciling a CNAB240 file.
#[derive(Error, Debug)]
pub enum CnabError {
    /// Failed to open or read the input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The bank layout identifier is not registered
    #[error("Unknown bank layout '{0}'")]
    UnknownBankLayout(String),

    /// A layout descriptor has fields outside the record or an unusable scale
    #[error("Invalid layout '{id}': {reason}")]
    InvalidLayout { id: String, reason: String },

    /// A physical line does not have the fixed record width
    #[error("Malformed record length at line {line_index}: expected {expected} columns, found {found}")]
    MalformedRecordLength {
        line_index: usize,
        expected: usize,
        found: usize,
    },

    /// The input contains a byte outside 7-bit ASCII
    #[error("Non-ASCII byte 0x{byte:02x} at line {line_index}, column {column}")]
    InvalidEncoding {
        line_index: usize,
        column: usize,
        byte: u8,
    },

    /// A field could not be decoded
    #[error("Record {record_index}: cannot decode field '{field}': {reason}")]
    RecordDecode {
        record_index: usize,
        field: &'static str,
        reason: String,
    },

    /// A date field does not hold a valid DDMMYYYY calendar date
    #[error("Record {record_index}: invalid date '{value}' in field '{field}'")]
    InvalidDate {
        record_index: usize,
        field: &'static str,
        value: String,
    },

    /// The record type column holds an unknown code
    #[error("Record {record_index}: unknown record type '{code}'")]
    UnknownRecordType { record_index: usize, code: char },

    /// A record arrived where the file structure does not allow it
    #[error("Record {record_index}: unexpected {kind}: {reason}")]
    OutOfOrderRecord {
        record_index: usize,
        kind: &'static str,
        reason: &'static str,
    },

    /// Correction segment with no primary segment to correct
    #[error("Record {record_index}: correction segment U without a preceding segment T in batch {batch}")]
    OrphanCorrectionSegment { record_index: usize, batch: u32 },

    /// Second correction segment for an already corrected transaction
    #[error("Record {record_index}: transaction already corrected in batch {batch}")]
    UnexpectedCorrectionSegment { record_index: usize, batch: u32 },

    /// Two transactions in the same file share an import id
    #[error("Record {record_index}: duplicate import id {id}")]
    DuplicateImportId { record_index: usize, id: String },

    /// A header field required to build the statement is blank or absent
    #[error("Incomplete file header: missing {0}")]
    IncompleteHeader(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing command line arguments
    #[error("Missing arguments. Usage: cnab240-import <layout> <file> [--strict|--tolerant]")]
    MissingArgument,
}

impl CnabError {
    /// Returns `true` for errors scoped to a single field of a single record.
    ///
    /// Only these may be downgraded to a skipped record in tolerant mode.
    pub fn is_field_level(&self) -> bool {
        matches!(
            self,
            CnabError::RecordDecode { .. } | CnabError::InvalidDate { .. }
        )
    }
}
