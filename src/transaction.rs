//! Reconciled transactions and their ledger-facing statement lines.

use crate::money::Money;
use crate::segment::{CorrectionSegment, PrimarySegment};
use chrono::NaiveDate;
use serde::Serialize;

/// One título event after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Payer name
    pub name: String,

    /// Due date, or the occurrence date once corrected
    pub date: Option<NaiveDate>,

    /// Título amount, or the corrected amount once corrected
    pub amount: Money,

    /// Document number
    #[serde(rename = "ref")]
    pub reference: String,

    /// Payer tax id (CPF/CNPJ)
    pub label: String,

    pub transaction_id: String,

    /// `<file sequence>-<document number>`, unique within one file
    pub unique_import_id: String,

    /// Bank fee charged on the título, if reported
    pub commission_amount: Option<Money>,

    pub movement_code: Option<u8>,

    /// Occurrence reason codes reported by the bank
    pub occurrence_codes: Vec<String>,

    /// Whether a segment U has been applied
    pub corrected: bool,
}

impl Transaction {
    /// Seeds a transaction from a segment T.
    pub fn from_primary(segment: PrimarySegment, file_sequence: u32) -> Self {
        Transaction {
            unique_import_id: format!("{}-{}", file_sequence, segment.document_number),
            transaction_id: segment.document_number.clone(),
            reference: segment.document_number,
            name: segment.payer_name,
            date: segment.due_date,
            amount: segment.amount,
            label: segment.payer_tax_id,
            commission_amount: segment.fee,
            movement_code: segment.movement_code,
            occurrence_codes: segment.occurrence_codes,
            corrected: false,
        }
    }

    /// Applies a segment U.
    ///
    /// `amount = base + surcharge - (discount + rebate)`; the date moves to
    /// the occurrence date when one is reported.
    pub fn apply_correction(&mut self, correction: &CorrectionSegment) {
        self.amount =
            self.amount + correction.surcharge - (correction.discount + correction.rebate);
        if let Some(date) = correction.occurrence_date {
            self.date = Some(date);
        }
        self.corrected = true;
    }

    /// Maps the transaction to a ledger statement line, filling defaults for
    /// absent values. `fallback_date` stands in for a missing date.
    pub fn to_statement_line(&self, fallback_date: NaiveDate) -> StatementLine {
        StatementLine {
            name: self.name.clone(),
            date: self.date.unwrap_or(fallback_date),
            amount: self.amount,
            reference: or_slash(&self.reference),
            label: self.label.clone(),
            transaction_id: or_slash(&self.transaction_id),
            commission_amount: self.commission_amount.unwrap_or(Money::ZERO),
            movement_code: self.movement_code.unwrap_or(0),
        }
    }
}

fn or_slash(value: &str) -> String {
    if value.is_empty() {
        "/".to_string()
    } else {
        value.to_string()
    }
}

/// Values handed to the ledger when recording one statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub name: String,
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(rename = "ref")]
    pub reference: String,
    pub label: String,
    pub transaction_id: String,
    pub commission_amount: Money,
    pub movement_code: u8,
}

impl StatementLine {
    /// Column names in CSV output order.
    pub const HEADERS: [&'static str; 8] = [
        "name",
        "date",
        "amount",
        "ref",
        "label",
        "transaction_id",
        "commission_amount",
        "movement_code",
    ];

    /// Fields in CSV output order.
    pub fn to_record(&self) -> [String; 8] {
        [
            self.name.clone(),
            self.date.format("%Y-%m-%d").to_string(),
            self.amount.to_string(),
            self.reference.clone(),
            self.label.clone(),
            self.transaction_id.clone(),
            self.commission_amount.to_string(),
            self.movement_code.to_string(),
        ]
    }
}
