//! Guest-function translation driver.
//!
//! Walks a function's instruction words in address order, resolves each word
//! through the dispatch tables, and runs the matched semantic-emit handler
//! against the function builder. Branch targets discovered after their
//! instructions were already emitted are patched in by splitting the owning
//! block. Translation of one function is single-threaded and synchronous;
//! independent functions may be translated concurrently only with
//! independent translator/builder pairs sharing the read-only tables.

pub mod decoder;
pub mod disasm;
pub mod dispatch;
pub mod emit;
pub mod regfile;
pub mod tables;

use std::ops::{Deref, DerefMut};

use crate::error::TranslateError;
use crate::ir::block::LabelId;
use crate::ir::builder::FunctionBuilder;
use crate::ir::instr::InstrId;
use crate::ir::value::{TypeName, ValueId};
use self::decoder::InstrData;
use self::dispatch::DispatchTables;

/// Result of translating one guest function.
pub struct Translation {
    pub builder: FunctionBuilder,
    /// Addresses (with raw words) that decoded to nothing or declined to
    /// emit; each received a guest-visible trap in the IR. A caller that
    /// prefers to reject the whole function checks this list.
    pub untranslatable: Vec<(u32, u32)>,
}

/// Per-function translation state binding the dispatch tables to a builder.
pub struct FunctionTranslator<'a> {
    tables: &'a DispatchTables,
    builder: FunctionBuilder,
    start_address: u32,
    instr_count: usize,
    /// Labels assigned to instruction offsets, filled in as branch targets
    /// are discovered during the walk.
    label_list: Vec<Option<LabelId>>,
    /// First IR instruction emitted for each guest instruction; used to map
    /// late-discovered labels back onto already-emitted positions.
    first_instr_list: Vec<Option<InstrId>>,
    with_comments: bool,
    untranslatable: Vec<(u32, u32)>,
}

impl<'a> Deref for FunctionTranslator<'a> {
    type Target = FunctionBuilder;

    fn deref(&self) -> &FunctionBuilder {
        &self.builder
    }
}

impl<'a> DerefMut for FunctionTranslator<'a> {
    fn deref_mut(&mut self) -> &mut FunctionBuilder {
        &mut self.builder
    }
}

impl<'a> FunctionTranslator<'a> {
    pub fn new(tables: &'a DispatchTables, start_address: u32, instr_count: usize) -> Self {
        assert_eq!(start_address % 4, 0, "misaligned function start");
        FunctionTranslator {
            tables,
            builder: FunctionBuilder::new(),
            start_address,
            instr_count,
            label_list: vec![None; instr_count],
            first_instr_list: vec![None; instr_count],
            with_comments: false,
            untranslatable: Vec::new(),
        }
    }

    /// Annotate every translated instruction with its disassembly.
    pub fn with_comments(mut self, enabled: bool) -> Self {
        self.with_comments = enabled;
        self
    }

    pub fn start_address(&self) -> u32 {
        self.start_address
    }

    /// Translate the function body and finalize the graph.
    pub fn translate(mut self, words: &[u32]) -> Translation {
        assert!(words.len() <= self.instr_count, "word count exceeds range");
        let tables = self.tables;

        // Always mark the entry with a label.
        if !self.label_list.is_empty() {
            let entry_label = self.builder.new_label();
            self.label_list[0] = Some(entry_label);
        }

        for (offset, &code) in words.iter().enumerate() {
            let address = self.start_address + (offset as u32) * 4;

            // Mark the label if one was assigned earlier in the walk; a
            // backward target found later is inserted by lookup_label.
            if let Some(label) = self.label_list[offset] {
                self.builder.mark_label(label);
                self.builder
                    .set_label_name(label, format!("loc_{:08X}", address));
            }

            let entry = tables.lookup(code);
            let data = InstrData::new(address, code);

            let mut first_instr = None;
            if self.with_comments {
                let mut text = format!("{:08X} {:08X} ", address, code);
                match entry {
                    Some(e) => disasm::disassemble(e, &data, &mut text),
                    None => text.push('?'),
                }
                self.builder.comment(text);
                first_instr = self.builder.last_instr();
            }

            // Source offset marker for the label map and debugging.
            self.builder.source_offset(address as u64);
            if first_instr.is_none() {
                first_instr = self.builder.last_instr();
            }
            self.first_instr_list[offset] = first_instr;

            match entry {
                None => {
                    log::warn!("invalid instruction {:08X} {:08X}", address, code);
                    self.builder.comment("INVALID!");
                    self.builder.trap(0);
                    self.untranslatable.push((address, code));
                }
                Some(entry) => {
                    let result = match entry.emit {
                        Some(emit) => emit(&mut self, &data),
                        None => Err(TranslateError::Unimplemented {
                            name: entry.name,
                            address,
                            code,
                        }),
                    };
                    if let Err(e) = result {
                        log::error!("{}", e);
                        self.builder.comment("UNIMPLEMENTED!");
                        self.builder.trap(0);
                        self.untranslatable.push((address, code));
                    }
                }
            }
        }

        self.builder.finalize();
        self.builder.assert_no_cycles();
        Translation {
            builder: self.builder,
            untranslatable: self.untranslatable,
        }
    }

    /// Resolve a branch-target address within the function to a label,
    /// creating one (and splitting the owning block if the target was
    /// already emitted) as needed. `None` for addresses outside the range.
    pub fn lookup_label(&mut self, address: u32) -> Option<LabelId> {
        if address < self.start_address {
            return None;
        }
        let offset = ((address - self.start_address) / 4) as usize;
        if offset >= self.instr_count {
            return None;
        }
        if let Some(label) = self.label_list[offset] {
            return Some(label);
        }
        let label = self.builder.new_label();
        self.builder
            .set_label_name(label, format!("loc_{:08X}", address));
        self.label_list[offset] = Some(label);
        if let Some(instr) = self.first_instr_list[offset] {
            // Already emitted: go back and attach the label there.
            match self.builder.instr(instr).prev {
                Some(prev) => self.builder.insert_label(label, prev),
                None => {
                    let block = self.builder.instr(instr).block;
                    self.builder.mark_label_on(label, block);
                }
            }
        }
        Some(label)
    }

    // ----------------------------------------------------------------
    // Guest register file accessors
    // ----------------------------------------------------------------

    pub fn load_gpr(&mut self, n: u32) -> ValueId {
        self.builder.load_context(regfile::gpr(n), TypeName::Int64)
    }

    pub fn store_gpr(&mut self, n: u32, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Int64);
        self.builder.store_context(regfile::gpr(n), value);
    }

    pub fn load_fpr(&mut self, n: u32) -> ValueId {
        self.builder
            .load_context(regfile::fpr(n), TypeName::Float64)
    }

    pub fn store_fpr(&mut self, n: u32, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Float64);
        self.builder.store_context(regfile::fpr(n), value);
    }

    pub fn load_vr(&mut self, n: u32) -> ValueId {
        self.builder.load_context(regfile::vr(n), TypeName::Vec128)
    }

    pub fn store_vr(&mut self, n: u32, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Vec128);
        self.builder.store_context(regfile::vr(n), value);
    }

    pub fn load_lr(&mut self) -> ValueId {
        self.builder.load_context(regfile::LR, TypeName::Int64)
    }

    pub fn store_lr(&mut self, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Int64);
        self.builder.store_context(regfile::LR, value);
    }

    pub fn load_ctr(&mut self) -> ValueId {
        self.builder.load_context(regfile::CTR, TypeName::Int64)
    }

    pub fn store_ctr(&mut self, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Int64);
        self.builder.store_context(regfile::CTR, value);
    }

    pub fn load_ca(&mut self) -> ValueId {
        self.builder.load_context(regfile::XER_CA, TypeName::Int8)
    }

    pub fn store_ca(&mut self, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Int8);
        self.builder.store_context(regfile::XER_CA, value);
    }

    /// Reservation value captured by the last load-and-reserve.
    pub fn load_reserved(&mut self) -> ValueId {
        self.builder
            .load_context(regfile::RESERVED, TypeName::Int64)
    }

    pub fn store_reserved(&mut self, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Int64);
        self.builder.store_context(regfile::RESERVED, value);
    }

    /// Load one CR bit (BI numbering: field = bi / 4, flag = bi % 4).
    pub fn load_cr_bit(&mut self, bi: u32) -> ValueId {
        self.builder
            .load_context(regfile::cr_bit(bi >> 2, bi & 3), TypeName::Int8)
    }

    pub fn store_cr_bit(&mut self, bi: u32, value: ValueId) {
        assert_eq!(self.builder.value_ty(value), TypeName::Int8);
        self.builder
            .store_context(regfile::cr_bit(bi >> 2, bi & 3), value);
    }

    /// Reconstruct one 4-bit CR field as the low bits of an i64.
    pub fn load_cr_field(&mut self, n: u32) -> ValueId {
        let lt = self.builder.load_context(regfile::cr_lt(n), TypeName::Int8);
        let lt = self.builder.zero_extend(lt, TypeName::Int64);
        let mut v = self.builder.shl_imm(lt, 3);
        let gt = self.builder.load_context(regfile::cr_gt(n), TypeName::Int8);
        let gt = self.builder.zero_extend(gt, TypeName::Int64);
        let gt = self.builder.shl_imm(gt, 2);
        v = self.builder.or(v, gt);
        let eq = self.builder.load_context(regfile::cr_eq(n), TypeName::Int8);
        let eq = self.builder.zero_extend(eq, TypeName::Int64);
        let eq = self.builder.shl_imm(eq, 1);
        v = self.builder.or(v, eq);
        let so = self.builder.load_context(regfile::cr_so(n), TypeName::Int8);
        let so = self.builder.zero_extend(so, TypeName::Int64);
        self.builder.or(v, so)
    }

    /// Compare a 64-bit result against zero and set CR0 lt/gt/eq.
    pub fn update_cr0(&mut self, value: ValueId) {
        let zero = self.builder.load_zero(TypeName::Int64);
        let lt = self.builder.compare_slt(value, zero);
        self.builder.store_context(regfile::cr_lt(0), lt);
        let zero = self.builder.load_zero(TypeName::Int64);
        let gt = self.builder.compare_sgt(value, zero);
        self.builder.store_context(regfile::cr_gt(0), gt);
        let zero = self.builder.load_zero(TypeName::Int64);
        let eq = self.builder.compare_eq(value, zero);
        self.builder.store_context(regfile::cr_eq(0), eq);
    }

    /// Set one CR field from an ordered comparison.
    pub fn update_cr_cmp(&mut self, field: u32, lhs: ValueId, rhs: ValueId, signed: bool) {
        let lt = if signed {
            self.builder.compare_slt(lhs, rhs)
        } else {
            self.builder.compare_ult(lhs, rhs)
        };
        self.builder.store_context(regfile::cr_lt(field), lt);
        let gt = if signed {
            self.builder.compare_sgt(lhs, rhs)
        } else {
            self.builder.compare_ugt(lhs, rhs)
        };
        self.builder.store_context(regfile::cr_gt(field), gt);
        let eq = self.builder.compare_eq(lhs, rhs);
        self.builder.store_context(regfile::cr_eq(field), eq);
    }
}

/// Translate one guest function from its raw instruction words.
pub fn translate_function(
    tables: &DispatchTables,
    start_address: u32,
    words: &[u32],
    with_comments: bool,
) -> Translation {
    FunctionTranslator::new(tables, start_address, words.len())
        .with_comments(with_comments)
        .translate(words)
}
