//! Segment decoder: turns a [`RawRecord`] into typed header, batch and
//! event values using a bank [`FileLayout`].
//!
//! Decoding is a pure function of the record text and the layout.

use crate::error::{CnabError, Result};
use crate::layout::{Field, FileLayout};
use crate::money::Money;
use crate::record::RawRecord;
use chrono::NaiveDate;

/// Decoded file header (record type `0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub bank_code: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub generation_date: Option<NaiveDate>,
    pub file_sequence: Option<u32>,
}

/// Decoded batch header (record type `1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    pub batch: u32,
}

/// Segment `T`: the título as registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimarySegment {
    pub movement_code: Option<u8>,
    pub document_number: String,
    pub due_date: Option<NaiveDate>,
    pub amount: Money,
    pub payer_tax_id: String,
    pub payer_name: String,
    pub fee: Option<Money>,
    pub occurrence_codes: Vec<String>,
}

/// Segment `U`: amounts and dates of the actual settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionSegment {
    pub movement_code: Option<u8>,
    pub surcharge: Money,
    pub discount: Money,
    pub rebate: Money,
    pub net_amount: Money,
    pub occurrence_date: Option<NaiveDate>,
}

/// Event payload, one case per segment code the reconciler understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Primary(PrimarySegment),
    Correction(CorrectionSegment),
    /// Any other segment code; carried through and ignored.
    Other(char),
}

impl Segment {
    pub fn code(&self) -> char {
        match self {
            Segment::Primary(_) => 'T',
            Segment::Correction(_) => 'U',
            Segment::Other(code) => *code,
        }
    }
}

/// Decoded event (record type `3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub batch: u32,
    pub sequence: u32,
    pub segment: Segment,
}

/// A decoded record of any type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRecord {
    FileHeader(FileHeader),
    BatchHeader(BatchHeader),
    Event(Event),
    BatchTrailer { batch: u32 },
    FileTrailer,
}

impl DecodedRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedRecord::FileHeader(_) => "file header",
            DecodedRecord::BatchHeader(_) => "batch header",
            DecodedRecord::Event(_) => "event",
            DecodedRecord::BatchTrailer { .. } => "batch trailer",
            DecodedRecord::FileTrailer => "file trailer",
        }
    }
}

/// Record type code in column 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    FileHeader,
    BatchHeader,
    Event,
    BatchTrailer,
    FileTrailer,
}

impl RecordType {
    fn from_code(code: char) -> Option<Self> {
        match code {
            '0' => Some(RecordType::FileHeader),
            '1' => Some(RecordType::BatchHeader),
            '3' => Some(RecordType::Event),
            '5' => Some(RecordType::BatchTrailer),
            '9' => Some(RecordType::FileTrailer),
            _ => None,
        }
    }
}

/// Classifies a record without decoding its fields.
pub fn record_type(record: &RawRecord, layout: &FileLayout) -> Result<RecordType> {
    let code = record.code(&layout.record_type).unwrap_or(' ');
    RecordType::from_code(code).ok_or(CnabError::UnknownRecordType {
        record_index: record.index(),
        code,
    })
}

/// Segment code of an event record, blank-trimmed.
pub fn segment_code(record: &RawRecord, layout: &FileLayout) -> char {
    record.code(&layout.segment_code).unwrap_or(' ')
}

/// Decodes one record.
pub fn decode(record: &RawRecord, layout: &FileLayout) -> Result<DecodedRecord> {
    let fields = FieldReader { record, layout };

    let decoded = match record_type(record, layout)? {
        RecordType::FileHeader => DecodedRecord::FileHeader(fields.file_header()?),
        RecordType::BatchHeader => DecodedRecord::BatchHeader(fields.batch_header()?),
        RecordType::Event => DecodedRecord::Event(fields.event()?),
        RecordType::BatchTrailer => DecodedRecord::BatchTrailer {
            batch: fields.number(&layout.batch_number)?,
        },
        RecordType::FileTrailer => DecodedRecord::FileTrailer,
    };
    Ok(decoded)
}

/// Typed field extraction bound to one record.
struct FieldReader<'a> {
    record: &'a RawRecord,
    layout: &'a FileLayout,
}

impl<'a> FieldReader<'a> {
    fn file_header(&self) -> Result<FileHeader> {
        let h = &self.layout.file_header;
        Ok(FileHeader {
            bank_code: self.text(&h.bank_code),
            bank_name: self.optional_text(&h.bank_name),
            account_number: self.optional_text(&h.account_number),
            generation_date: self.date(&h.generation_date)?,
            file_sequence: self.optional_number(&h.file_sequence)?,
        })
    }

    fn batch_header(&self) -> Result<BatchHeader> {
        Ok(BatchHeader {
            batch: self.number(&self.layout.batch_number)?,
        })
    }

    fn event(&self) -> Result<Event> {
        let segment = match segment_code(self.record, self.layout) {
            'T' => Segment::Primary(self.primary()?),
            'U' => Segment::Correction(self.correction()?),
            other => Segment::Other(other),
        };
        Ok(Event {
            batch: self.number(&self.layout.batch_number)?,
            sequence: self.number(&self.layout.record_sequence)?,
            segment,
        })
    }

    fn primary(&self) -> Result<PrimarySegment> {
        let t = &self.layout.segment_t;
        Ok(PrimarySegment {
            movement_code: self.optional_number(&t.movement_code)?,
            document_number: self.text(&t.document_number),
            due_date: self.date(&t.due_date)?,
            amount: self.money(&t.amount)?,
            payer_tax_id: self.text(&t.payer_tax_id),
            payer_name: self.text(&t.payer_name),
            fee: self.optional_money(&t.fee)?,
            occurrence_codes: occurrence_codes(self.record.field(&t.occurrence_reasons)),
        })
    }

    fn correction(&self) -> Result<CorrectionSegment> {
        let u = &self.layout.segment_u;
        Ok(CorrectionSegment {
            movement_code: self.optional_number(&u.movement_code)?,
            surcharge: self.money(&u.surcharge)?,
            discount: self.money(&u.discount)?,
            rebate: self.money(&u.rebate)?,
            net_amount: self.money(&u.net_amount)?,
            occurrence_date: self.date(&u.occurrence_date)?,
        })
    }

    fn decode_error(&self, field: &Field, reason: impl Into<String>) -> CnabError {
        CnabError::RecordDecode {
            record_index: self.record.index(),
            field: field.name,
            reason: reason.into(),
        }
    }

    /// Trimmed text; internal spaces are kept.
    fn text(&self, field: &Field) -> String {
        self.record.field(field).trim().to_string()
    }

    fn optional_text(&self, field: &Field) -> Option<String> {
        Some(self.text(field)).filter(|s| !s.is_empty())
    }

    fn number<T: std::str::FromStr>(&self, field: &Field) -> Result<T> {
        self.optional_number(field)?
            .ok_or_else(|| self.decode_error(field, "blank numeric field"))
    }

    /// Blank numeric fields decode to `None`.
    fn optional_number<T: std::str::FromStr>(&self, field: &Field) -> Result<Option<T>> {
        let raw = self.record.field(field);
        let digits = raw.trim();
        if digits.is_empty() {
            return Ok(None);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.decode_error(field, format!("'{}' is not numeric", raw)));
        }
        digits
            .parse()
            .map(Some)
            .map_err(|_| self.decode_error(field, format!("'{}' is out of range", raw)))
    }

    fn money(&self, field: &Field) -> Result<Money> {
        self.optional_money(field)
            .map(|value| value.unwrap_or(Money::ZERO))
    }

    /// Blank monetary fields decode to `None`; zero-filled ones to zero.
    fn optional_money(&self, field: &Field) -> Result<Option<Money>> {
        let raw = self.record.field(field);
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Money::from_minor_units(raw, self.layout.money_scale)
            .map(Some)
            .ok_or_else(|| self.decode_error(field, format!("'{}' is not an amount", raw)))
    }

    fn date(&self, field: &Field) -> Result<Option<NaiveDate>> {
        parse_date(self.record.field(field)).ok_or_else(|| CnabError::InvalidDate {
            record_index: self.record.index(),
            field: field.name,
            value: self.record.field(field).to_string(),
        })
    }
}

/// Parses a `DDMMYYYY` date.
///
/// Zero-filled or blank fields mean "no date" and yield `Some(None)`;
/// anything that is not a calendar date yields `None`.
pub fn parse_date(raw: &str) -> Option<Option<NaiveDate>> {
    if raw.trim().is_empty() || raw.bytes().all(|b| b == b'0') {
        return Some(None);
    }
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = raw[0..2].parse().ok()?;
    let month: u32 = raw[2..4].parse().ok()?;
    let year: i32 = raw[4..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(Some)
}

/// Splits the occurrence-reason column into 2-character codes.
fn occurrence_codes(raw: &str) -> Vec<String> {
    raw.as_bytes()
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .map(str::trim)
        .filter(|code| !code.is_empty() && code.bytes().any(|b| b != b'0'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ITAU_COBRANCA_240, SICOOB_240};
    use crate::test_line::Line;
    use std::str::FromStr;

    fn line(record_type: char) -> Line {
        Line::new("756", 1, record_type)
    }

    fn record(line: &Line, index: usize) -> RawRecord {
        RawRecord::new(index, index, line.build())
    }

    fn segment_t() -> Line {
        let mut line = line('3');
        line.num(9, 13, 1)
            .put(14, 14, "T")
            .put(16, 17, "06")
            .put(59, 73, "DOC 123")
            .put(74, 81, "10032024")
            .num(82, 96, 10000)
            .num(134, 148, 12345678000199)
            .put(149, 188, "MARIA DA SILVA")
            .num(199, 213, 250)
            .put(214, 223, "0200000000");
        line
    }

    fn segment_u() -> Line {
        let mut line = line('3');
        line.num(9, 13, 2)
            .put(14, 14, "U")
            .put(16, 17, "06")
            .num(18, 32, 500)
            .num(33, 47, 200)
            .num(48, 62, 0)
            .num(78, 92, 10300)
            .num(93, 107, 10050)
            .put(138, 145, "12032024")
            .put(146, 153, "00000000");
        line
    }

    fn brl(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_decode_file_header() {
        let mut line = line('0');
        line.put(1, 7, "7560000")
            .put(59, 70, "000012345678")
            .put(103, 132, "SICOOB")
            .put(144, 151, "15032024")
            .num(158, 163, 42);

        match decode(&record(&line, 0), &SICOOB_240).unwrap() {
            DecodedRecord::FileHeader(header) => {
                assert_eq!(header.bank_code, "756");
                assert_eq!(header.bank_name.as_deref(), Some("SICOOB"));
                assert_eq!(header.account_number.as_deref(), Some("000012345678"));
                assert_eq!(header.generation_date, NaiveDate::from_ymd_opt(2024, 3, 15));
                assert_eq!(header.file_sequence, Some(42));
            }
            other => panic!("Expected FileHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_blank_header_fields_are_absent() {
        let line = line('0');
        match decode(&record(&line, 0), &SICOOB_240).unwrap() {
            DecodedRecord::FileHeader(header) => {
                assert!(header.bank_name.is_none());
                assert!(header.account_number.is_none());
                assert!(header.generation_date.is_none());
                assert!(header.file_sequence.is_none());
            }
            other => panic!("Expected FileHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_batch_header() {
        let mut batch = line('1');
        batch.put(74, 103, "ACME LTDA").put(192, 199, "99999999");

        let decoded = decode(&record(&batch, 1), &SICOOB_240).unwrap();
        assert_eq!(decoded, DecodedRecord::BatchHeader(BatchHeader { batch: 1 }));
    }

    #[test]
    fn test_decode_segment_t() {
        let decoded = decode(&record(&segment_t(), 2), &SICOOB_240).unwrap();
        let event = match decoded {
            DecodedRecord::Event(event) => event,
            other => panic!("Expected Event, got {:?}", other),
        };
        assert_eq!(event.batch, 1);
        assert_eq!(event.sequence, 1);
        assert_eq!(event.segment.code(), 'T');

        match event.segment {
            Segment::Primary(t) => {
                assert_eq!(t.movement_code, Some(6));
                assert_eq!(t.document_number, "DOC 123");
                assert_eq!(t.due_date, NaiveDate::from_ymd_opt(2024, 3, 10));
                assert_eq!(t.amount, brl("100.00"));
                assert_eq!(t.payer_tax_id, "012345678000199");
                assert_eq!(t.payer_name, "MARIA DA SILVA");
                assert_eq!(t.fee, Some(brl("2.50")));
                assert_eq!(t.occurrence_codes, vec!["02".to_string()]);
            }
            other => panic!("Expected Primary, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_segment_u() {
        match decode(&record(&segment_u(), 3), &SICOOB_240).unwrap() {
            DecodedRecord::Event(Event {
                segment: Segment::Correction(u),
                ..
            }) => {
                assert_eq!(u.surcharge, brl("5.00"));
                assert_eq!(u.discount, brl("2.00"));
                assert_eq!(u.rebate, Money::ZERO);
                assert_eq!(u.net_amount, brl("100.50"));
                assert_eq!(u.occurrence_date, NaiveDate::from_ymd_opt(2024, 3, 12));
            }
            other => panic!("Expected Correction, got {:?}", other),
        }
    }

    #[test]
    fn test_segment_u_ignores_unused_columns() {
        let mut line = segment_u();
        line.put(78, 92, "NOT AN AMOUNT").put(146, 153, "31029999");

        match decode(&record(&line, 3), &SICOOB_240).unwrap() {
            DecodedRecord::Event(Event {
                segment: Segment::Correction(u),
                ..
            }) => assert_eq!(u.net_amount, brl("100.50")),
            other => panic!("Expected Correction, got {:?}", other),
        }
    }

    #[test]
    fn test_other_segment_is_passed_through() {
        let mut line = line('3');
        line.num(9, 13, 3).put(14, 14, "Y").put(82, 96, "GARBAGE");

        match decode(&record(&line, 4), &SICOOB_240).unwrap() {
            DecodedRecord::Event(event) => assert_eq!(event.segment, Segment::Other('Y')),
            other => panic!("Expected Event, got {:?}", other),
        }
    }

    #[test]
    fn test_trailers() {
        let mut batch_trailer = line('5');
        batch_trailer.put(4, 7, "0002");
        assert_eq!(
            decode(&record(&batch_trailer, 5), &SICOOB_240).unwrap(),
            DecodedRecord::BatchTrailer { batch: 2 }
        );

        let mut file_trailer = line('9');
        file_trailer.put(4, 7, "9999");
        assert_eq!(
            decode(&record(&file_trailer, 6), &SICOOB_240).unwrap(),
            DecodedRecord::FileTrailer
        );
    }

    #[test]
    fn test_unknown_record_type() {
        let line = line('7');
        match decode(&record(&line, 9), &SICOOB_240) {
            Err(CnabError::UnknownRecordType { record_index, code }) => {
                assert_eq!(record_index, 9);
                assert_eq!(code, '7');
            }
            other => panic!("Expected UnknownRecordType, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_amount_names_field() {
        let mut line = segment_t();
        line.put(82, 96, "0000000001X0000");

        match decode(&record(&line, 7), &SICOOB_240) {
            Err(CnabError::RecordDecode {
                record_index,
                field,
                ..
            }) => {
                assert_eq!(record_index, 7);
                assert_eq!(field, "valor_titulo");
            }
            other => panic!("Expected RecordDecode, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_date() {
        let mut line = segment_t();
        line.put(74, 81, "31022024");

        match decode(&record(&line, 8), &SICOOB_240) {
            Err(CnabError::InvalidDate { field, value, .. }) => {
                assert_eq!(field, "vencimento_titulo");
                assert_eq!(value, "31022024");
            }
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_due_date_is_no_date() {
        let mut line = segment_t();
        line.put(74, 81, "00000000");

        match decode(&record(&line, 2), &SICOOB_240).unwrap() {
            DecodedRecord::Event(Event {
                segment: Segment::Primary(t),
                ..
            }) => assert_eq!(t.due_date, None),
            other => panic!("Expected Primary, got {:?}", other),
        }
    }

    #[test]
    fn test_itau_document_number_width() {
        let mut line = segment_t();
        line.put(59, 73, "1234567890ABCDE");

        match decode(&record(&line, 2), &ITAU_COBRANCA_240).unwrap() {
            DecodedRecord::Event(Event {
                segment: Segment::Primary(t),
                ..
            }) => assert_eq!(t.document_number, "1234567890"),
            other => panic!("Expected Primary, got {:?}", other),
        }
    }

    #[test]
    fn test_decoding_is_idempotent() {
        let record = record(&segment_u(), 3);
        let first = decode(&record, &SICOOB_240).unwrap();
        let second = decode(&record, &SICOOB_240).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("29022024"),
            Some(NaiveDate::from_ymd_opt(2024, 2, 29))
        );
        assert_eq!(parse_date("00000000"), Some(None));
        assert_eq!(parse_date("        "), Some(None));
        assert_eq!(parse_date("29022023"), None);
        assert_eq!(parse_date("1503202A"), None);
        assert_eq!(parse_date("150324"), None);
    }

    #[test]
    fn test_occurrence_codes() {
        assert_eq!(occurrence_codes("0000000000"), Vec::<String>::new());
        assert_eq!(occurrence_codes("          "), Vec::<String>::new());
        assert_eq!(
            occurrence_codes("0214    A1"),
            vec!["02".to_string(), "14".to_string(), "A1".to_string()]
        );
    }
}
