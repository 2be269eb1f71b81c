//! Fixture builder for CNAB240 return files in the FEBRABAN layout.
//!
//! Positions are 1-based and inclusive, as in the bank manuals.

#![allow(dead_code)]

mod line;

pub use line::Line;

/// Title (segment T) fields used by the fixtures.
pub struct Titulo<'a> {
    pub document: &'a str,
    pub due_date: &'a str,
    pub cents: u64,
    pub payer: &'a str,
    pub tax_id: u64,
    pub fee_cents: Option<u64>,
    pub movement: &'a str,
    pub reasons: &'a str,
}

impl<'a> Titulo<'a> {
    pub fn new(document: &'a str, cents: u64) -> Self {
        Titulo {
            document,
            due_date: "10032024",
            cents,
            payer: "MARIA DA SILVA",
            tax_id: 12345678000199,
            fee_cents: None,
            movement: "06",
            reasons: "0000000000",
        }
    }
}

/// Settlement (segment U) fields used by the fixtures.
pub struct Liquidacao<'a> {
    pub surcharge: u64,
    pub discount: u64,
    pub rebate: u64,
    pub paid: u64,
    pub net: u64,
    pub occurrence_date: &'a str,
    pub credit_date: &'a str,
}

impl<'a> Liquidacao<'a> {
    pub fn new(surcharge: u64, discount: u64, rebate: u64, net: u64) -> Self {
        Liquidacao {
            surcharge,
            discount,
            rebate,
            paid: net,
            net,
            occurrence_date: "12032024",
            credit_date: "00000000",
        }
    }
}

/// Assembles a whole file, numbering batches and records.
pub struct FileBuilder {
    bank: String,
    bank_name: String,
    account: String,
    generation_date: String,
    sequence: u64,
    lines: Vec<String>,
    batch: u32,
    record_in_batch: u64,
}

impl FileBuilder {
    pub fn new(bank: &str, bank_name: &str) -> Self {
        FileBuilder {
            bank: bank.to_string(),
            bank_name: bank_name.to_string(),
            account: "000012345678".to_string(),
            generation_date: "15032024".to_string(),
            sequence: 42,
            lines: Vec::new(),
            batch: 0,
            record_in_batch: 0,
        }
    }

    pub fn sicoob() -> Self {
        FileBuilder::new("756", "SICOOB")
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn header(mut self) -> Self {
        let mut line = Line::new(&self.bank, 0, '0');
        line.put(59, 70, &self.account)
            .put(103, 132, &self.bank_name)
            .put(144, 151, &self.generation_date)
            .num(158, 163, self.sequence);
        self.lines.push(line.build());
        self
    }

    pub fn batch(self) -> Self {
        let recording_date = self.generation_date.clone();
        self.batch_recorded_on(&recording_date)
    }

    /// Opens a batch whose header carries `recording_date` in columns 192-199.
    pub fn batch_recorded_on(mut self, recording_date: &str) -> Self {
        self.batch += 1;
        self.record_in_batch = 0;
        let mut line = Line::new(&self.bank, self.batch, '1');
        line.put(74, 103, "ACME COMERCIO LTDA")
            .put(192, 199, recording_date);
        self.lines.push(line.build());
        self
    }

    fn event(&mut self, segment: char) -> Line {
        self.record_in_batch += 1;
        let mut line = Line::new(&self.bank, self.batch, '3');
        line.num(9, 13, self.record_in_batch)
            .put(14, 14, &segment.to_string());
        line
    }

    pub fn t(mut self, titulo: Titulo) -> Self {
        let mut line = self.event('T');
        line.put(16, 17, titulo.movement)
            .put(59, 73, titulo.document)
            .put(74, 81, titulo.due_date)
            .num(82, 96, titulo.cents)
            .num(134, 148, titulo.tax_id)
            .put(149, 188, titulo.payer)
            .put(214, 223, titulo.reasons);
        if let Some(fee) = titulo.fee_cents {
            line.num(199, 213, fee);
        }
        self.lines.push(line.build());
        self
    }

    pub fn u(mut self, liquidacao: Liquidacao) -> Self {
        let mut line = self.event('U');
        line.put(16, 17, "06")
            .num(18, 32, liquidacao.surcharge)
            .num(33, 47, liquidacao.discount)
            .num(48, 62, liquidacao.rebate)
            .num(78, 92, liquidacao.paid)
            .num(93, 107, liquidacao.net)
            .put(138, 145, liquidacao.occurrence_date)
            .put(146, 153, liquidacao.credit_date);
        self.lines.push(line.build());
        self
    }

    /// An event with an arbitrary segment code.
    pub fn segment(mut self, code: char) -> Self {
        let line = self.event(code);
        self.lines.push(line.build());
        self
    }

    /// Appends a prebuilt line verbatim.
    pub fn raw(mut self, line: String) -> Self {
        self.lines.push(line);
        self
    }

    pub fn batch_trailer(mut self) -> Self {
        let mut line = Line::new(&self.bank, self.batch, '5');
        line.num(18, 23, self.record_in_batch + 2);
        self.lines.push(line.build());
        self
    }

    pub fn trailer(mut self) -> Self {
        let mut line = Line::new(&self.bank, 9999, '9');
        line.num(18, 23, self.batch as u64)
            .num(24, 29, self.lines.len() as u64 + 1);
        self.lines.push(line.build());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// CRLF-terminated file contents.
    pub fn build(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out
    }
}
