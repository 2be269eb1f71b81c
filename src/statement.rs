//! Statement assembly.

use crate::error::{CnabError, Result};
use crate::money::Money;
use crate::segment::FileHeader;
use crate::transaction::{StatementLine, Transaction};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// Currency of every CNAB240 statement.
pub const CURRENCY_CODE: &str = "BRL";

/// A bank statement built from one CNAB240 file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// `<bank name> - <DDMMYYYY generation date>`
    pub name: String,
    pub date: NaiveDate,
    pub balance_start: Money,
    /// Sum of the net amounts reported in the file
    pub balance_end_real: Money,
    pub currency_code: &'static str,
    pub account_number: String,
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// Statement lines for the ledger, with defaults filled in.
    pub fn lines(&self) -> Vec<StatementLine> {
        self.transactions
            .iter()
            .map(|tx| tx.to_statement_line(self.date))
            .collect()
    }

    /// Writes the statement lines as CSV, in file order.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(StatementLine::HEADERS)?;
        for line in self.lines() {
            csv_writer.write_record(line.to_record())?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Builds the statement from the file header, the reconciled transactions
/// and the net total.
pub fn assemble(
    header: &FileHeader,
    transactions: Vec<Transaction>,
    total: Money,
) -> Result<Statement> {
    let bank_name = header
        .bank_name
        .as_deref()
        .ok_or(CnabError::IncompleteHeader("bank name"))?;
    let date = header
        .generation_date
        .ok_or(CnabError::IncompleteHeader("generation date"))?;
    let account_number = header
        .account_number
        .clone()
        .ok_or(CnabError::IncompleteHeader("account number"))?;

    Ok(Statement {
        name: format!("{} - {}", bank_name, date.format("%d%m%Y")),
        date,
        balance_start: Money::ZERO,
        balance_end_real: total,
        currency_code: CURRENCY_CODE,
        account_number,
        transactions,
    })
}
