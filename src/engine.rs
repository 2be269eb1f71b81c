//! CNAB240 parsing engine.
//!
//! Drives one forward pass over a file: records are read lazily, decoded
//! with the selected bank layout, fed to the [`Reconciler`] and finally
//! assembled into a [`Statement`]. Each call to [`Cnab240Parser::parse`] is
//! independent, so one parser can serve many files from many threads.

use crate::config::{DecodeMode, ParserConfig};
use crate::error::{CnabError, Result};
use crate::layout::{FileLayout, LayoutRegistry};
use crate::reconciler::{Reconciler, SkippedRecord};
use crate::record::{RawRecord, RecordReader};
use crate::segment::{self, DecodedRecord, FileHeader, RecordType};
use crate::statement::{self, Statement};
use log::{debug, info, warn};
use std::io::Read;

/// Parser name this engine answers to in the import framework.
pub const PARSER_NAME: &str = "cnab240_so";

/// Result of parsing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub statement: Statement,
    /// Events left out in tolerant mode, in file order.
    pub skipped: Vec<SkippedRecord>,
}

/// CNAB240 return-file parser.
pub struct Cnab240Parser {
    registry: LayoutRegistry,
    config: ParserConfig,
}

impl Cnab240Parser {
    /// Creates a parser over the built-in bank layouts.
    pub fn new(config: ParserConfig) -> Self {
        Self::with_registry(LayoutRegistry::builtin(), config)
    }

    pub fn with_registry(registry: LayoutRegistry, config: ParserConfig) -> Self {
        Cnab240Parser { registry, config }
    }

    /// Returns `true` if `parser_name` selects this parser.
    pub fn handles(parser_name: &str) -> bool {
        parser_name == PARSER_NAME
    }

    pub fn registry(&self) -> &LayoutRegistry {
        &self.registry
    }

    /// Parses an in-memory file.
    pub fn parse_bytes(&self, data: &[u8], layout_id: &str) -> Result<ParseOutcome> {
        self.parse(data, layout_id)
    }

    /// Parses a file read from `reader` with the layout registered as
    /// `layout_id`.
    ///
    /// The layout is resolved before any byte is read.
    pub fn parse<R: Read>(&self, reader: R, layout_id: &str) -> Result<ParseOutcome> {
        let layout = self.registry.resolve(layout_id)?;
        debug!("Parsing with layout {} ({} mode)", layout.id, self.config.mode);

        let mut pass = Pass::new(layout, self.config.mode);
        for record in RecordReader::new(reader, layout.record_width) {
            pass.feed(record?)?;
        }
        let outcome = pass.finish()?;

        info!(
            "{}: {} transactions, closing balance {} {}, {} skipped",
            outcome.statement.name,
            outcome.statement.transactions.len(),
            outcome.statement.balance_end_real,
            outcome.statement.currency_code,
            outcome.skipped.len()
        );
        Ok(outcome)
    }
}

impl Default for Cnab240Parser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

/// State of a single parse call.
struct Pass<'a> {
    layout: &'a FileLayout,
    mode: DecodeMode,
    header: Option<FileHeader>,
    reconciler: Option<Reconciler>,
    in_batch: bool,
}

impl<'a> Pass<'a> {
    fn new(layout: &'a FileLayout, mode: DecodeMode) -> Self {
        Pass {
            layout,
            mode,
            header: None,
            reconciler: None,
            in_batch: false,
        }
    }

    fn feed(&mut self, record: RawRecord) -> Result<()> {
        let record_type = segment::record_type(&record, self.layout)?;

        let decoded = match segment::decode(&record, self.layout) {
            Ok(decoded) => decoded,
            Err(e) if self.can_skip(record_type, &e) => {
                let code = segment::segment_code(&record, self.layout);
                return self
                    .event_sink(record.index())?
                    .skip(record.index(), code, e.to_string());
            }
            Err(e) => return Err(e),
        };
        debug!("Record {}: {}", record.index(), decoded.kind());

        match decoded {
            DecodedRecord::FileHeader(header) => self.file_header(record.index(), header),
            DecodedRecord::BatchHeader(batch) => {
                let reconciler = self.reconciler_for(record.index(), "batch header")?;
                reconciler.begin_batch(batch.batch);
                self.in_batch = true;
                Ok(())
            }
            DecodedRecord::Event(event) => {
                self.event_sink(record.index())?
                    .apply(record.index(), event)
            }
            DecodedRecord::BatchTrailer { .. } => {
                self.reconciler_for(record.index(), "batch trailer")?
                    .end_batch();
                self.in_batch = false;
                Ok(())
            }
            DecodedRecord::FileTrailer => Ok(()),
        }
    }

    /// Only event records may be skipped, and only in tolerant mode.
    fn can_skip(&self, record_type: RecordType, err: &CnabError) -> bool {
        self.mode == DecodeMode::Tolerant
            && record_type == RecordType::Event
            && err.is_field_level()
    }

    fn file_header(&mut self, record_index: usize, header: FileHeader) -> Result<()> {
        if self.header.is_some() {
            return Err(CnabError::OutOfOrderRecord {
                record_index,
                kind: "file header",
                reason: "the file already has one",
            });
        }
        if header.bank_code != self.layout.bank_code {
            warn!(
                "Record {}: bank code {} does not match layout {} ({})",
                record_index, header.bank_code, self.layout.id, self.layout.bank_code
            );
        }

        let file_sequence = header
            .file_sequence
            .ok_or(CnabError::IncompleteHeader("file sequence"))?;
        self.reconciler = Some(Reconciler::new(file_sequence));
        self.header = Some(header);
        Ok(())
    }

    fn reconciler_for(
        &mut self,
        record_index: usize,
        kind: &'static str,
    ) -> Result<&mut Reconciler> {
        self.reconciler.as_mut().ok_or(CnabError::OutOfOrderRecord {
            record_index,
            kind,
            reason: "before the file header",
        })
    }

    /// The reconciler, provided an event is allowed here.
    fn event_sink(&mut self, record_index: usize) -> Result<&mut Reconciler> {
        if self.reconciler.is_some() && !self.in_batch {
            return Err(CnabError::OutOfOrderRecord {
                record_index,
                kind: "event",
                reason: "outside a batch",
            });
        }
        self.reconciler_for(record_index, "event")
    }

    fn finish(self) -> Result<ParseOutcome> {
        let header = self.header.ok_or(CnabError::IncompleteHeader("file header"))?;
        let reconciliation = match self.reconciler {
            Some(reconciler) => reconciler.finish(),
            None => return Err(CnabError::IncompleteHeader("file sequence")),
        };

        let statement = statement::assemble(
            &header,
            reconciliation.transactions,
            reconciliation.total,
        )?;
        Ok(ParseOutcome {
            statement,
            skipped: reconciliation.skipped,
        })
    }
}
