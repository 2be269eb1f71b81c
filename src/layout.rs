//! Bank layout descriptors and the registry that resolves them.
//!
//! Every bank publishes its own variant of the FEBRABAN CNAB240 return
//! layout. A [`FileLayout`] is pure data: the column range of each field the
//! decoder needs, plus the encodings shared by all fields (record width and
//! implied monetary scale). Positions follow the bank manuals: 1-based and
//! inclusive on both ends.

use crate::error::{CnabError, Result};
use std::collections::HashMap;
use std::ops::Range;

/// Width of every CNAB240 line.
pub const CNAB240_WIDTH: usize = 240;

/// A named column range within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// First column, 1-based.
    pub start: usize,
    /// Last column, 1-based and inclusive.
    pub end: usize,
}

impl Field {
    pub const fn new(name: &'static str, start: usize, end: usize) -> Self {
        Field { name, start, end }
    }

    pub fn width(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Zero-based byte range of the field.
    pub fn range(&self) -> Range<usize> {
        (self.start - 1)..self.end
    }
}

/// Columns of the file header (record type `0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeaderLayout {
    pub bank_code: Field,
    pub bank_name: Field,
    pub account_number: Field,
    pub generation_date: Field,
    pub file_sequence: Field,
}

/// Columns of the primary event segment `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimarySegmentLayout {
    pub movement_code: Field,
    pub document_number: Field,
    pub due_date: Field,
    pub amount: Field,
    pub payer_tax_id: Field,
    pub payer_name: Field,
    pub fee: Field,
    pub occurrence_reasons: Field,
}

/// Columns of the correction event segment `U`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionSegmentLayout {
    pub movement_code: Field,
    pub surcharge: Field,
    pub discount: Field,
    pub rebate: Field,
    pub net_amount: Field,
    pub occurrence_date: Field,
}

/// Complete field layout for one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLayout {
    /// Registry identifier, e.g. `sicoob_240`.
    pub id: &'static str,
    /// FEBRABAN bank code expected in columns 1-3.
    pub bank_code: &'static str,
    pub record_width: usize,
    /// Implied decimal places of every monetary field.
    pub money_scale: u32,
    pub batch_number: Field,
    pub record_type: Field,
    pub record_sequence: Field,
    pub segment_code: Field,
    pub file_header: FileHeaderLayout,
    pub segment_t: PrimarySegmentLayout,
    pub segment_u: CorrectionSegmentLayout,
}

/// Largest implied scale `rust_decimal` can represent.
const MAX_MONEY_SCALE: u32 = 28;

impl FileLayout {
    /// Every field the decoder reads, in record order.
    pub fn fields(&self) -> [Field; 23] {
        let h = &self.file_header;
        let t = &self.segment_t;
        let u = &self.segment_u;
        [
            self.batch_number,
            self.record_type,
            self.record_sequence,
            self.segment_code,
            h.bank_code,
            h.bank_name,
            h.account_number,
            h.generation_date,
            h.file_sequence,
            t.movement_code,
            t.document_number,
            t.due_date,
            t.amount,
            t.payer_tax_id,
            t.payer_name,
            t.fee,
            t.occurrence_reasons,
            u.movement_code,
            u.surcharge,
            u.discount,
            u.rebate,
            u.net_amount,
            u.occurrence_date,
        ]
    }

    /// Checks that every field lies inside the record and that the money
    /// scale is representable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| CnabError::InvalidLayout {
            id: self.id.to_string(),
            reason,
        };

        if self.money_scale > MAX_MONEY_SCALE {
            return Err(invalid(format!(
                "money scale {} exceeds {}",
                self.money_scale, MAX_MONEY_SCALE
            )));
        }
        for field in self.fields() {
            if field.start == 0 || field.start > field.end {
                return Err(invalid(format!(
                    "field '{}' has columns {}-{}",
                    field.name, field.start, field.end
                )));
            }
            if field.end > self.record_width {
                return Err(invalid(format!(
                    "field '{}' ends at column {}, past the record width {}",
                    field.name, field.end, self.record_width
                )));
            }
        }
        Ok(())
    }
}

/// FEBRABAN v08.7 cobrança return layout, the base every bank adapts.
pub const FEBRABAN_240: FileLayout = FileLayout {
    id: "febraban_240",
    bank_code: "000",
    record_width: CNAB240_WIDTH,
    money_scale: 2,
    batch_number: Field::new("lote", 4, 7),
    record_type: Field::new("tipo_registro", 8, 8),
    record_sequence: Field::new("numero_registro", 9, 13),
    segment_code: Field::new("servico_segmento", 14, 14),
    file_header: FileHeaderLayout {
        bank_code: Field::new("banco_codigo", 1, 3),
        bank_name: Field::new("nome_do_banco", 103, 132),
        account_number: Field::new("cedente_conta", 59, 70),
        generation_date: Field::new("arquivo_data_de_geracao", 144, 151),
        file_sequence: Field::new("arquivo_sequencia", 158, 163),
    },
    segment_t: PrimarySegmentLayout {
        movement_code: Field::new("servico_codigo_movimento", 16, 17),
        document_number: Field::new("numero_documento", 59, 73),
        due_date: Field::new("vencimento_titulo", 74, 81),
        amount: Field::new("valor_titulo", 82, 96),
        payer_tax_id: Field::new("sacado_inscricao_numero", 134, 148),
        payer_name: Field::new("sacado_nome", 149, 188),
        fee: Field::new("valor_tarifa", 199, 213),
        occurrence_reasons: Field::new("motivo_ocorrencia", 214, 223),
    },
    segment_u: CorrectionSegmentLayout {
        movement_code: Field::new("servico_codigo_movimento", 16, 17),
        surcharge: Field::new("titulo_acrescimos", 18, 32),
        discount: Field::new("titulo_desconto", 33, 47),
        rebate: Field::new("titulo_abatimento", 48, 62),
        net_amount: Field::new("titulo_liquido", 93, 107),
        occurrence_date: Field::new("data_ocorrencia", 138, 145),
    },
};

pub const BRADESCO_PAG_FOR: FileLayout = FileLayout {
    id: "bradesco_pag_for",
    bank_code: "237",
    ..FEBRABAN_240
};

pub const BRADESCO_COBRANCA_240: FileLayout = FileLayout {
    id: "bradesco_cobranca_240",
    bank_code: "237",
    ..FEBRABAN_240
};

/// Itaú keeps "seu número" in ten columns and leaves 69-73 blank.
pub const ITAU_COBRANCA_240: FileLayout = FileLayout {
    id: "itau_cobranca_240",
    bank_code: "341",
    segment_t: PrimarySegmentLayout {
        document_number: Field::new("numero_documento", 59, 68),
        ..FEBRABAN_240.segment_t
    },
    ..FEBRABAN_240
};

pub const SICOOB_240: FileLayout = FileLayout {
    id: "sicoob_240",
    bank_code: "756",
    ..FEBRABAN_240
};

/// Maps layout identifiers to layout descriptors.
///
/// Read-only after construction, so one registry can be shared by any
/// number of concurrent parses.
#[derive(Debug, Clone)]
pub struct LayoutRegistry {
    layouts: HashMap<&'static str, FileLayout>,
}

impl LayoutRegistry {
    /// Creates a registry with no layouts.
    pub fn empty() -> Self {
        LayoutRegistry {
            layouts: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in bank layouts.
    pub fn builtin() -> Self {
        let mut registry = LayoutRegistry::empty();
        for layout in [
            BRADESCO_PAG_FOR,
            BRADESCO_COBRANCA_240,
            ITAU_COBRANCA_240,
            SICOOB_240,
        ] {
            registry.layouts.insert(layout.id, layout);
        }
        registry
    }

    /// Adds a layout, returning the one it replaced under the same id.
    ///
    /// Fails with `InvalidLayout` if the layout does not pass
    /// [`FileLayout::validate`]; the registry is left unchanged.
    pub fn register(&mut self, layout: FileLayout) -> Result<Option<FileLayout>> {
        layout.validate()?;
        Ok(self.layouts.insert(layout.id, layout))
    }

    /// Looks up a layout by identifier.
    pub fn resolve(&self, id: &str) -> Result<&FileLayout> {
        self.layouts
            .get(id)
            .ok_or_else(|| CnabError::UnknownBankLayout(id.to_string()))
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.layouts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
