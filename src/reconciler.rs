//! Transaction reconciler.
//!
//! Consumes decoded events batch by batch and merges each segment T with
//! the segment U that may follow it into one [`Transaction`]. The open
//! transaction is an explicit slot in [`State`], so a correction can only
//! ever touch the primary segment immediately before it.

use crate::error::{CnabError, Result};
use crate::money::Money;
use crate::segment::{CorrectionSegment, Event, PrimarySegment, Segment};
use crate::transaction::Transaction;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug)]
enum State {
    /// No open transaction and nothing to correct.
    AwaitingPrimary,

    /// A segment T is open and may still be corrected.
    HavePrimary(Transaction),

    /// The last transaction already took its correction.
    Corrected,

    /// The last segment T was skipped; its correction is skipped too.
    PrimarySkipped,
}

/// A record left out of the statement in tolerant mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub record_index: usize,
    pub segment_code: char,
    pub reason: String,
}

/// Output of a full reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub transactions: Vec<Transaction>,
    /// Sum of the net amounts reported by the bank.
    pub total: Money,
    pub skipped: Vec<SkippedRecord>,
}

/// Per-file reconciliation state machine.
pub struct Reconciler {
    file_sequence: u32,
    batch: u32,
    state: State,
    transactions: Vec<Transaction>,
    total: Money,
    import_ids: HashSet<String>,
    skipped: Vec<SkippedRecord>,
}

impl Reconciler {
    /// Creates a reconciler for the file with the given sequence number.
    pub fn new(file_sequence: u32) -> Self {
        Reconciler {
            file_sequence,
            batch: 0,
            state: State::AwaitingPrimary,
            transactions: Vec::new(),
            total: Money::ZERO,
            import_ids: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    /// Starts a new batch. Any open transaction is closed uncorrected.
    pub fn begin_batch(&mut self, batch: u32) {
        self.close();
        self.state = State::AwaitingPrimary;
        self.batch = batch;
        debug!("Batch {}: started", batch);
    }

    /// Ends the current batch, closing the open transaction uncorrected.
    pub fn end_batch(&mut self) {
        self.close();
        self.state = State::AwaitingPrimary;
        debug!("Batch {}: ended", self.batch);
    }

    /// Feeds one decoded event.
    pub fn apply(&mut self, record_index: usize, event: Event) -> Result<()> {
        match event.segment {
            Segment::Primary(segment) => self.open(record_index, segment),
            Segment::Correction(segment) => self.correct(record_index, segment),
            Segment::Other(code) => {
                debug!("Record {}: ignoring segment '{}'", record_index, code);
                Ok(())
            }
        }
    }

    /// Records an event that failed to decode and keeps the state machine
    /// consistent: a skipped T takes its U with it, and a skipped U drops the
    /// transaction it would have corrected.
    ///
    /// A U that could not be placed even if it had decoded is still a
    /// structural error.
    pub fn skip(&mut self, record_index: usize, segment_code: char, reason: String) -> Result<()> {
        match segment_code {
            'T' => {
                self.close();
                self.state = State::PrimarySkipped;
            }
            'U' => match std::mem::replace(&mut self.state, State::Corrected) {
                State::HavePrimary(tx) => {
                    warn!(
                        "Record {}: dropping transaction {} left without its correction",
                        record_index, tx.unique_import_id
                    );
                }
                State::PrimarySkipped => {}
                State::AwaitingPrimary => {
                    return Err(CnabError::OrphanCorrectionSegment {
                        record_index,
                        batch: self.batch,
                    });
                }
                State::Corrected => {
                    return Err(CnabError::UnexpectedCorrectionSegment {
                        record_index,
                        batch: self.batch,
                    });
                }
            },
            _ => {}
        }

        self.report(record_index, segment_code, reason);
        Ok(())
    }

    /// Closes the last batch and returns the results.
    pub fn finish(mut self) -> Reconciliation {
        self.close();
        Reconciliation {
            transactions: self.transactions,
            total: self.total,
            skipped: self.skipped,
        }
    }

    fn open(&mut self, record_index: usize, segment: PrimarySegment) -> Result<()> {
        self.close();

        let tx = Transaction::from_primary(segment, self.file_sequence);
        if !self.import_ids.insert(tx.unique_import_id.clone()) {
            return Err(CnabError::DuplicateImportId {
                record_index,
                id: tx.unique_import_id,
            });
        }

        debug!(
            "Record {}: opened transaction {} for {}",
            record_index, tx.unique_import_id, tx.amount
        );
        self.state = State::HavePrimary(tx);
        Ok(())
    }

    fn correct(&mut self, record_index: usize, segment: CorrectionSegment) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Corrected) {
            State::HavePrimary(mut tx) => {
                tx.apply_correction(&segment);
                debug!(
                    "Record {}: corrected transaction {} to {}",
                    record_index, tx.unique_import_id, tx.amount
                );
                self.transactions.push(tx);
            }
            State::AwaitingPrimary => {
                return Err(CnabError::OrphanCorrectionSegment {
                    record_index,
                    batch: self.batch,
                });
            }
            State::Corrected => {
                return Err(CnabError::UnexpectedCorrectionSegment {
                    record_index,
                    batch: self.batch,
                });
            }
            State::PrimarySkipped => {
                self.report(
                    record_index,
                    'U',
                    "correction of a skipped segment T".to_string(),
                );
            }
        }

        self.total += segment.net_amount;
        Ok(())
    }

    fn report(&mut self, record_index: usize, segment_code: char, reason: String) {
        warn!(
            "Record {}: skipping segment '{}': {}",
            record_index, segment_code, reason
        );
        self.skipped.push(SkippedRecord {
            record_index,
            segment_code,
            reason,
        });
    }

    /// Moves the open transaction, if any, to the output uncorrected.
    fn close(&mut self) {
        if let State::HavePrimary(tx) = std::mem::replace(&mut self.state, State::AwaitingPrimary)
        {
            debug!("Closing transaction {} uncorrected", tx.unique_import_id);
            self.transactions.push(tx);
        }
    }
}
