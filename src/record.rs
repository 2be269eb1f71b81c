//! Fixed-width record reader.
//!
//! Splits the input into records of exactly `width` columns. Line
//! terminators (`\r`, `\n`) between records are skipped and never used to
//! find boundaries, but a terminator inside a record means the physical line
//! was too short or too long and fails with `MalformedRecordLength`.

use crate::error::{CnabError, Result};
use crate::layout::Field;
use std::io::{BufReader, Bytes, Read};

/// One fixed-width line of a CNAB240 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    index: usize,
    line_index: usize,
    text: String,
}

impl RawRecord {
    /// Wraps an already split line. Width is not checked here.
    pub fn new(index: usize, line_index: usize, text: impl Into<String>) -> Self {
        RawRecord {
            index,
            line_index,
            text: text.into(),
        }
    }

    /// Zero-based position of the record in the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Zero-based physical line the record started on.
    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> usize {
        self.text.len()
    }

    /// Raw, untrimmed text of a field. Empty if the field lies outside the record.
    pub fn field(&self, field: &Field) -> &str {
        self.text.get(field.range()).unwrap_or("")
    }

    /// First character of a field, for single-column codes.
    pub fn code(&self, field: &Field) -> Option<char> {
        self.field(field).chars().next()
    }
}

/// Lazy iterator of [`RawRecord`]s over any byte source.
///
/// Reading stops after the first error.
pub struct RecordReader<R: Read> {
    bytes: Bytes<BufReader<R>>,
    width: usize,
    line_index: usize,
    column: usize,
    /// Records already cut from the current physical line.
    line_records: usize,
    next_index: usize,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, width: usize) -> Self {
        RecordReader {
            bytes: BufReader::new(reader).bytes(),
            width,
            line_index: 0,
            column: 0,
            line_records: 0,
            next_index: 0,
            done: false,
        }
    }

    fn fail(&mut self, err: CnabError) -> Option<Result<RawRecord>> {
        self.done = true;
        Some(Err(err))
    }

    fn malformed(&self, found: usize) -> CnabError {
        CnabError::MalformedRecordLength {
            line_index: self.line_index,
            expected: self.width,
            found,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf: Vec<u8> = Vec::with_capacity(self.width);

        loop {
            match self.bytes.next() {
                None => {
                    self.done = true;
                    if buf.is_empty() {
                        return None;
                    }
                    // Truncated tail: report the short record itself.
                    let err = self.malformed(buf.len());
                    return Some(Err(err));
                }
                Some(Err(e)) => return self.fail(e.into()),
                Some(Ok(byte @ (b'\r' | b'\n'))) => {
                    if !buf.is_empty() {
                        // A single overlong line reports its own width; a
                        // run of records with no terminators reports the tail.
                        let found = if self.line_records > 1 {
                            buf.len()
                        } else {
                            self.column
                        };
                        let err = self.malformed(found);
                        return self.fail(err);
                    }
                    if byte == b'\n' {
                        self.line_index += 1;
                        self.column = 0;
                        self.line_records = 0;
                    }
                }
                Some(Ok(byte)) if !byte.is_ascii() => {
                    let err = CnabError::InvalidEncoding {
                        line_index: self.line_index,
                        column: self.column + 1,
                        byte,
                    };
                    return self.fail(err);
                }
                Some(Ok(byte)) => {
                    buf.push(byte);
                    self.column += 1;

                    if buf.len() == self.width {
                        let index = self.next_index;
                        self.next_index += 1;
                        self.line_records += 1;
                        let text: String = buf.into_iter().map(char::from).collect();
                        return Some(Ok(RawRecord::new(index, self.line_index, text)));
                    }
                }
            }
        }
    }
}

/// Convenience: reads every record of an in-memory buffer.
pub fn read(bytes: &[u8], width: usize) -> RecordReader<&[u8]> {
    RecordReader::new(bytes, width)
}
