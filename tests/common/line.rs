//! Positional builder for single 240-column lines.
//!
//! Shared by the unit tests inside the crate and the integration tests.
//! Positions are 1-based and inclusive, as in the bank manuals.

pub const WIDTH: usize = 240;

/// One 240-column line under construction.
pub struct Line(Vec<u8>);

impl Line {
    pub fn new(bank: &str, batch: u32, record_type: char) -> Self {
        let mut line = Line(vec![b' '; WIDTH]);
        line.put(1, 3, bank).num(4, 7, batch as u64);
        line.0[7] = record_type as u8;
        line
    }

    /// Left-aligned, space-padded text.
    pub fn put(&mut self, start: usize, end: usize, value: &str) -> &mut Self {
        let width = end + 1 - start;
        let padded = format!("{:<width$}", value, width = width);
        self.0[start - 1..end].copy_from_slice(&padded.as_bytes()[..width]);
        self
    }

    /// Right-aligned, zero-padded number.
    pub fn num(&mut self, start: usize, end: usize, value: u64) -> &mut Self {
        let width = end + 1 - start;
        self.put(start, end, &format!("{:0width$}", value, width = width))
    }

    pub fn build(&self) -> String {
        String::from_utf8(self.0.clone()).unwrap()
    }
}
