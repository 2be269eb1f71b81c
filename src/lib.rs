//! # CNAB240 Import
//!
//! Decodes CNAB240 bank return files ("arquivos de retorno") and rebuilds
//! the settled títulos as statement transactions ready for reconciliation.
//!
//! ## Design Principles
//!
//! - **Layouts are data**: each bank is a [`FileLayout`] of column ranges
//!   resolved once through the [`LayoutRegistry`]
//! - **Exact amounts**: monetary fields go through `rust_decimal`, never `f64`
//! - **Single forward pass**: records are read lazily and reconciled by an
//!   explicit state machine
//! - **No silent loss**: tolerant mode reports every skipped record
//!
//! ## Example
//!
//! ```no_run
//! use cnab240_import::{Cnab240Parser, ParserConfig};
//!
//! let data = std::fs::read("retorno.ret").unwrap();
//! let parser = Cnab240Parser::new(ParserConfig::strict());
//! let outcome = parser.parse_bytes(&data, "sicoob_240").unwrap();
//! outcome.statement.write_csv(std::io::stdout()).unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod money;
pub mod reconciler;
pub mod record;
pub mod segment;
pub mod statement;
pub mod transaction;

#[cfg(test)]
#[path = "../tests/common/line.rs"]
mod test_line;

pub use config::{DecodeMode, ParserConfig};
pub use engine::{Cnab240Parser, ParseOutcome, PARSER_NAME};
pub use error::{CnabError, Result};
pub use layout::{Field, FileLayout, LayoutRegistry, CNAB240_WIDTH};
pub use money::Money;
pub use reconciler::{Reconciler, Reconciliation, SkippedRecord};
pub use record::{RawRecord, RecordReader};
pub use segment::{DecodedRecord, Event, Segment};
pub use statement::Statement;
pub use transaction::{StatementLine, Transaction};
