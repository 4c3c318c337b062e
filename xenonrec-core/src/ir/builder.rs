//! Function builder: the construction surface the semantic emitters drive.
//!
//! The builder owns the arena for every value, instruction, block and label
//! of one function under translation, tracks the currently open block, and
//! performs constant folding and identity simplification as operations are
//! issued. Every arithmetic/logical/compare/convert/shift/rotate/byte-swap/
//! splat operation first checks whether all value operands are compile-time
//! constants and, if so, computes the result directly as a new constant
//! without creating an instruction or touching the block graph.
//!
//! Block-linkage state machine:
//! - a non-branch operation issued with no open block opens a new block;
//! - a branch-class operation appends, then closes the block;
//! - an open block with labels but no instructions is retained on close,
//!   since it may already be a resolved branch target;
//! - marking a label while the open block is non-empty closes it and opens a
//!   fresh labeled block;
//! - attaching a label at an arbitrary prior instruction splits the owning
//!   block.

use std::fmt::Write;

use crate::ir::block::{Block, BlockId, Label, LabelId};
use crate::ir::instr::{
    instr_flags, opcode_flags, Instr, InstrId, Opcode, Operand, OperandShape,
};
use crate::ir::value::{CompareOp, ConstantValue, TypeName, Value, ValueId, Vec128};

/// Swizzle mask selecting every lane from its own position.
pub const SWIZZLE_XYZW_TO_XYZW: u32 = 0b11_10_01_00;

/// Per-function construction state. One builder and its arena serve exactly
/// one translation at a time; the whole graph is released by dropping it.
pub struct FunctionBuilder {
    values: Vec<Value>,
    instrs: Vec<Instr>,
    blocks: Vec<Block>,
    labels: Vec<Label>,
    comments: Vec<String>,
    block_head: Option<BlockId>,
    block_tail: Option<BlockId>,
    current_block: Option<BlockId>,
    next_label_id: u32,
    next_value_ordinal: u32,
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionBuilder {
    pub fn new() -> Self {
        FunctionBuilder {
            values: Vec::new(),
            instrs: Vec::new(),
            blocks: Vec::new(),
            labels: Vec::new(),
            comments: Vec::new(),
            block_head: None,
            block_tail: None,
            current_block: None,
            next_label_id: 0,
            next_value_ordinal: 0,
        }
    }

    /// Clear all state for reuse on another function.
    pub fn reset(&mut self) {
        self.values.clear();
        self.instrs.clear();
        self.blocks.clear();
        self.labels.clear();
        self.comments.clear();
        self.block_head = None;
        self.block_tail = None;
        self.current_block = None;
        self.next_label_id = 0;
        self.next_value_ordinal = 0;
    }

    // ----------------------------------------------------------------
    // Arena access
    // ----------------------------------------------------------------

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.instrs[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn label(&self, id: LabelId) -> &Label {
        &self.labels[id.index()]
    }

    /// Comment text referenced by a comment instruction's offset operand.
    pub fn comment_text(&self, index: u64) -> &str {
        &self.comments[index as usize]
    }

    pub fn first_block(&self) -> Option<BlockId> {
        self.block_head
    }

    pub fn last_block(&self) -> Option<BlockId> {
        self.block_tail
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    pub fn max_value_ordinal(&self) -> u32 {
        self.next_value_ordinal
    }

    /// Block ids in program order.
    pub fn block_order(&self) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut cur = self.block_head;
        while let Some(b) = cur {
            out.push(b);
            cur = self.blocks[b.index()].next;
        }
        out
    }

    /// Instruction ids of one block, head to tail.
    pub fn block_instrs(&self, block: BlockId) -> Vec<InstrId> {
        let mut out = Vec::new();
        let mut cur = self.blocks[block.index()].instr_head;
        while let Some(i) = cur {
            out.push(i);
            cur = self.instrs[i.index()].next;
        }
        out
    }

    /// Total number of instructions appended so far.
    pub fn instr_count(&self) -> usize {
        self.instrs.len()
    }

    pub fn value_ty(&self, id: ValueId) -> TypeName {
        self.values[id.index()].ty
    }

    pub fn constant_of(&self, id: ValueId) -> Option<ConstantValue> {
        self.values[id.index()].constant
    }

    pub fn is_constant(&self, id: ValueId) -> bool {
        self.values[id.index()].is_constant()
    }

    pub fn is_constant_zero(&self, id: ValueId) -> bool {
        self.values[id.index()].is_constant_zero()
    }

    pub fn last_instr(&self) -> Option<InstrId> {
        if let Some(cb) = self.current_block {
            if let Some(tail) = self.blocks[cb.index()].instr_tail {
                return Some(tail);
            }
        }
        self.block_tail
            .and_then(|b| self.blocks[b.index()].instr_tail)
    }

    // ----------------------------------------------------------------
    // Type constraint checks. Violations are programming errors: continuing
    // would corrupt the graph, so they abort the translation loudly.
    // ----------------------------------------------------------------

    fn assert_address_type(&self, v: ValueId) {
        let ty = self.value_ty(v);
        assert!(
            ty == TypeName::Int32 || ty == TypeName::Int64,
            "operand v{} is not address-typed ({:?})",
            self.value(v).ordinal,
            ty
        );
    }

    fn assert_integer_type(&self, v: ValueId) {
        assert!(
            self.value_ty(v).is_integer(),
            "operand v{} is not integer-typed ({:?})",
            self.value(v).ordinal,
            self.value_ty(v)
        );
    }

    fn assert_non_float_type(&self, v: ValueId) {
        assert!(
            !self.value_ty(v).is_float(),
            "operand v{} must not be float-typed",
            self.value(v).ordinal
        );
    }

    fn assert_vector_type(&self, v: ValueId) {
        assert!(
            self.value_ty(v).is_vector(),
            "operand v{} is not vector-typed ({:?})",
            self.value(v).ordinal,
            self.value_ty(v)
        );
    }

    fn assert_types_equal(&self, a: ValueId, b: ValueId) {
        assert_eq!(
            self.value_ty(a),
            self.value_ty(b),
            "operand type mismatch (v{} vs v{})",
            self.value(a).ordinal,
            self.value(b).ordinal
        );
    }

    // ----------------------------------------------------------------
    // Value allocation
    // ----------------------------------------------------------------

    fn alloc_value(&mut self, ty: TypeName) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            ordinal: self.next_value_ordinal,
            ty,
            constant: None,
        });
        self.next_value_ordinal += 1;
        id
    }

    fn alloc_constant(&mut self, c: ConstantValue) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            ordinal: self.next_value_ordinal,
            ty: c.ty(),
            constant: Some(c),
        });
        self.next_value_ordinal += 1;
        id
    }

    pub fn load_zero(&mut self, ty: TypeName) -> ValueId {
        self.alloc_constant(ConstantValue::zero(ty))
    }

    pub fn load_constant_i8(&mut self, v: i8) -> ValueId {
        self.alloc_constant(ConstantValue::Int8(v))
    }

    pub fn load_constant_u8(&mut self, v: u8) -> ValueId {
        self.alloc_constant(ConstantValue::Int8(v as i8))
    }

    pub fn load_constant_i16(&mut self, v: i16) -> ValueId {
        self.alloc_constant(ConstantValue::Int16(v))
    }

    pub fn load_constant_u16(&mut self, v: u16) -> ValueId {
        self.alloc_constant(ConstantValue::Int16(v as i16))
    }

    pub fn load_constant_i32(&mut self, v: i32) -> ValueId {
        self.alloc_constant(ConstantValue::Int32(v))
    }

    pub fn load_constant_u32(&mut self, v: u32) -> ValueId {
        self.alloc_constant(ConstantValue::Int32(v as i32))
    }

    pub fn load_constant_i64(&mut self, v: i64) -> ValueId {
        self.alloc_constant(ConstantValue::Int64(v))
    }

    pub fn load_constant_u64(&mut self, v: u64) -> ValueId {
        self.alloc_constant(ConstantValue::Int64(v as i64))
    }

    pub fn load_constant_f32(&mut self, v: f32) -> ValueId {
        self.alloc_constant(ConstantValue::Float32(v))
    }

    pub fn load_constant_f64(&mut self, v: f64) -> ValueId {
        self.alloc_constant(ConstantValue::Float64(v))
    }

    pub fn load_constant_vec128(&mut self, v: Vec128) -> ValueId {
        self.alloc_constant(ConstantValue::Vec128(v))
    }

    // ----------------------------------------------------------------
    // Block and label plumbing
    // ----------------------------------------------------------------

    fn append_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            prev: self.block_tail,
            next: None,
            ..Block::default()
        });
        if let Some(tail) = self.block_tail {
            self.blocks[tail.index()].next = Some(id);
        }
        self.block_tail = Some(id);
        if self.block_head.is_none() {
            self.block_head = Some(id);
        }
        self.current_block = Some(id);
        id
    }

    fn end_block(&mut self) {
        if let Some(cb) = self.current_block {
            if self.blocks[cb.index()].instr_tail.is_none() {
                // Block never had anything added to it. It likely has an
                // incoming edge, so keep it open.
                return;
            }
        }
        self.current_block = None;
    }

    pub fn new_label(&mut self) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(Label {
            id: self.next_label_id,
            name: None,
            block: None,
            prev: None,
            next: None,
        });
        self.next_label_id += 1;
        id
    }

    pub fn set_label_name(&mut self, label: LabelId, name: String) {
        self.labels[label.index()].name = Some(name);
    }

    fn attach_label(&mut self, block: BlockId, label: LabelId) {
        let tail = self.blocks[block.index()].label_tail;
        {
            let l = &mut self.labels[label.index()];
            l.block = Some(block);
            l.prev = tail;
            l.next = None;
        }
        if let Some(tail) = tail {
            self.labels[tail.index()].next = Some(label);
            self.blocks[block.index()].label_tail = Some(label);
        } else {
            let b = &mut self.blocks[block.index()];
            b.label_head = Some(label);
            b.label_tail = Some(label);
        }
    }

    /// Mark a label at the current position. Closes a non-empty open block
    /// and opens a fresh labeled one.
    pub fn mark_label(&mut self, label: LabelId) {
        if let Some(cb) = self.current_block {
            if self.blocks[cb.index()].instr_tail.is_some() {
                self.end_block();
            }
        }
        if self.current_block.is_none() {
            self.append_block();
        }
        let block = self.current_block.unwrap();
        self.attach_label(block, label);
    }

    /// Mark a label on a specific existing block.
    pub fn mark_label_on(&mut self, label: LabelId, block: BlockId) {
        self.attach_label(block, label);
    }

    fn block_contains(&self, block: BlockId, instr: InstrId) -> bool {
        let mut cur = self.blocks[block.index()].instr_head;
        while let Some(i) = cur {
            if i == instr {
                return true;
            }
            cur = self.instrs[i.index()].next;
        }
        false
    }

    /// Attach a label immediately after `prev_instr`, splitting the owning
    /// block when the position is mid-block. The spliced-in block inherits
    /// the tail instructions and the label heads it.
    pub fn insert_label(&mut self, label: LabelId, prev_instr: InstrId) {
        // Adding at the very end is the normal mark path.
        if Some(prev_instr) == self.last_instr() {
            self.mark_label(label);
            return;
        }

        let prev_block = self.instrs[prev_instr.index()].block;
        debug_assert!(
            self.block_contains(prev_block, prev_instr),
            "label insertion at an instruction absent from the target block"
        );

        if self.instrs[prev_instr.index()].next.is_none() {
            // Last instruction in its block: the label belongs to the
            // following block.
            match self.blocks[prev_block.index()].next {
                Some(next_block) => self.attach_label(next_block, label),
                None => self.mark_label(label),
            }
            return;
        }

        // In the middle of a block. Split the block in two and splice the
        // new block in after it.
        let next_block = self.blocks[prev_block.index()].next;
        let new_block = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            prev: Some(prev_block),
            next: next_block,
            ..Block::default()
        });
        self.blocks[prev_block.index()].next = Some(new_block);
        match next_block {
            Some(nb) => self.blocks[nb.index()].prev = Some(new_block),
            None => self.block_tail = Some(new_block),
        }

        // Label heads the new block.
        {
            let l = &mut self.labels[label.index()];
            l.block = Some(new_block);
            l.prev = None;
            l.next = None;
        }
        let b = &mut self.blocks[new_block.index()];
        b.label_head = Some(label);
        b.label_tail = Some(label);

        // Move the tail instructions across.
        let first_moved = self.instrs[prev_instr.index()].next.unwrap();
        let old_tail = self.blocks[prev_block.index()].instr_tail;
        self.instrs[prev_instr.index()].next = None;
        self.blocks[prev_block.index()].instr_tail = Some(prev_instr);
        self.instrs[first_moved.index()].prev = None;
        {
            let b = &mut self.blocks[new_block.index()];
            b.instr_head = Some(first_moved);
            b.instr_tail = old_tail;
        }
        let mut cur = Some(first_moved);
        while let Some(i) = cur {
            self.instrs[i.index()].block = new_block;
            cur = self.instrs[i.index()].next;
        }

        if self.current_block == Some(prev_block) {
            self.current_block = Some(new_block);
        }
    }

    fn is_unconditional_jump(&self, instr: InstrId) -> bool {
        let i = &self.instrs[instr.index()];
        match i.opcode {
            Opcode::Branch | Opcode::Return => true,
            Opcode::Call => i.flags & instr_flags::CALL_TAIL != 0,
            _ => false,
        }
    }

    /// Scan blocks in order and add fall-through branches; blocks may have
    /// been added out of order and must fall through in the right order. A
    /// trailing block with no successor gets trap+return.
    pub fn finalize(&mut self) {
        for block in self.block_order() {
            let tail = self.blocks[block.index()].instr_tail;
            let needs_branch = match tail {
                Some(t) => !self.is_unconditional_jump(t),
                None => true,
            };
            if !needs_branch {
                continue;
            }
            self.current_block = Some(block);
            match self.blocks[block.index()].next {
                None => {
                    // Fall-through out of the function; terminate it.
                    self.trap(0);
                    self.ret();
                    self.current_block = None;
                    break;
                }
                Some(next) => {
                    self.branch_to_block(next, instr_flags::BRANCH_LIKELY);
                    self.current_block = None;
                }
            }
        }
    }

    /// Flag a cycle in the block list (corrupted splice) via panic.
    pub fn assert_no_cycles(&self) {
        let mut hare = self.block_head;
        let mut tortoise = self.block_head;
        loop {
            for _ in 0..2 {
                hare = match hare {
                    Some(h) => self.blocks[h.index()].next,
                    None => return,
                };
                assert!(hare != tortoise || hare.is_none(), "cycle in block list");
            }
            tortoise = tortoise.and_then(|t| self.blocks[t.index()].next);
        }
    }

    // ----------------------------------------------------------------
    // Instruction plumbing
    // ----------------------------------------------------------------

    fn shape_ok(declared: OperandShape, operand: Operand) -> bool {
        declared == operand.shape()
    }

    fn push_instr(
        &mut self,
        opcode: Opcode,
        flags: u16,
        dest: Option<ValueId>,
        srcs: [Operand; 3],
    ) -> InstrId {
        let sig = opcode.info().signature;
        assert!(
            (dest.is_some()) == (sig.dest == OperandShape::Value),
            "{}: destination does not match signature",
            opcode.info().name
        );
        assert!(
            Self::shape_ok(sig.src1, srcs[0])
                && Self::shape_ok(sig.src2, srcs[1])
                && Self::shape_ok(sig.src3, srcs[2]),
            "{}: operand shape does not match signature",
            opcode.info().name
        );

        if self.current_block.is_none() {
            self.append_block();
        }
        let block = self.current_block.unwrap();
        let id = InstrId(self.instrs.len() as u32);
        let tail = self.blocks[block.index()].instr_tail;
        self.instrs.push(Instr {
            opcode,
            flags,
            dest,
            srcs,
            block,
            prev: tail,
            next: None,
        });
        if let Some(tail) = tail {
            self.instrs[tail.index()].next = Some(id);
        }
        let b = &mut self.blocks[block.index()];
        b.instr_tail = Some(id);
        if b.instr_head.is_none() {
            b.instr_head = Some(id);
        }
        id
    }

    // ----------------------------------------------------------------
    // Diagnostics and no-ops
    // ----------------------------------------------------------------

    pub fn comment(&mut self, text: impl Into<String>) {
        let index = self.comments.len() as u64;
        self.comments.push(text.into());
        self.push_instr(
            Opcode::Comment,
            0,
            None,
            [Operand::Offset(index), Operand::None, Operand::None],
        );
    }

    pub fn nop(&mut self) {
        self.push_instr(Opcode::Nop, 0, None, [Operand::None; 3]);
    }

    /// Record the guest address the following instructions were lowered from.
    pub fn source_offset(&mut self, address: u64) {
        self.push_instr(
            Opcode::SourceOffset,
            0,
            None,
            [Operand::Offset(address), Operand::None, Operand::None],
        );
    }

    pub fn debug_break(&mut self) {
        self.push_instr(Opcode::DebugBreak, 0, None, [Operand::None; 3]);
    }

    pub fn trap(&mut self, trap_code: u16) {
        self.push_instr(Opcode::Trap, trap_code, None, [Operand::None; 3]);
    }

    pub fn trap_true(&mut self, cond: ValueId, trap_code: u16) {
        if let Some(c) = self.constant_of(cond) {
            if c.is_true() {
                self.trap(trap_code);
            }
            return;
        }
        self.push_instr(
            Opcode::TrapTrue,
            trap_code,
            None,
            [Operand::Value(cond), Operand::None, Operand::None],
        );
    }

    // ----------------------------------------------------------------
    // Control flow
    // ----------------------------------------------------------------

    /// Transfer to another function at a dynamic or constant address.
    pub fn call(&mut self, target: ValueId, call_flags: u16) {
        self.assert_address_type(target);
        self.push_instr(
            Opcode::Call,
            call_flags,
            None,
            [Operand::Value(target), Operand::None, Operand::None],
        );
        self.end_block();
    }

    pub fn call_true(&mut self, cond: ValueId, target: ValueId, call_flags: u16) {
        self.assert_address_type(target);
        if let Some(c) = self.constant_of(cond) {
            if c.is_true() {
                self.call(target, call_flags);
            }
            return;
        }
        self.push_instr(
            Opcode::CallTrue,
            call_flags,
            None,
            [Operand::Value(cond), Operand::Value(target), Operand::None],
        );
        self.end_block();
    }

    pub fn ret(&mut self) {
        self.push_instr(Opcode::Return, 0, None, [Operand::None; 3]);
        self.end_block();
    }

    pub fn ret_true(&mut self, cond: ValueId) {
        if let Some(c) = self.constant_of(cond) {
            if c.is_true() {
                self.ret();
            }
            return;
        }
        self.push_instr(
            Opcode::ReturnTrue,
            0,
            None,
            [Operand::Value(cond), Operand::None, Operand::None],
        );
        self.end_block();
    }

    pub fn branch(&mut self, label: LabelId, branch_flags: u16) {
        self.push_instr(
            Opcode::Branch,
            branch_flags,
            None,
            [Operand::Label(label), Operand::None, Operand::None],
        );
        self.end_block();
    }

    /// Branch to a block, labeling it first if necessary.
    pub fn branch_to_block(&mut self, block: BlockId, branch_flags: u16) {
        let label = match self.blocks[block.index()].label_head {
            Some(l) => l,
            None => {
                let l = self.new_label();
                self.mark_label_on(l, block);
                l
            }
        };
        self.branch(label, branch_flags);
    }

    pub fn branch_true(&mut self, cond: ValueId, label: LabelId, branch_flags: u16) {
        if let Some(c) = self.constant_of(cond) {
            if c.is_true() {
                self.branch(label, branch_flags);
            }
            return;
        }
        self.push_instr(
            Opcode::BranchTrue,
            branch_flags,
            None,
            [Operand::Value(cond), Operand::Label(label), Operand::None],
        );
        self.end_block();
    }

    pub fn branch_false(&mut self, cond: ValueId, label: LabelId, branch_flags: u16) {
        if let Some(c) = self.constant_of(cond) {
            if !c.is_true() {
                self.branch(label, branch_flags);
            }
            return;
        }
        self.push_instr(
            Opcode::BranchFalse,
            branch_flags,
            None,
            [Operand::Value(cond), Operand::Label(label), Operand::None],
        );
        self.end_block();
    }

    // ----------------------------------------------------------------
    // Moves and conversions
    // ----------------------------------------------------------------

    pub fn assign(&mut self, value: ValueId) -> ValueId {
        if self.is_constant(value) {
            return value;
        }
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Assign,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn cast(&mut self, value: ValueId, target: TypeName) -> ValueId {
        if self.value_ty(value) == target {
            return value;
        }
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.cast(target));
        }
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::Cast,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn zero_extend(&mut self, value: ValueId, target: TypeName) -> ValueId {
        if self.value_ty(value) == target {
            return value;
        }
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.zero_extend(target));
        }
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::ZeroExtend,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn sign_extend(&mut self, value: ValueId, target: TypeName) -> ValueId {
        if self.value_ty(value) == target {
            return value;
        }
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.sign_extend(target));
        }
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::SignExtend,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn truncate(&mut self, value: ValueId, target: TypeName) -> ValueId {
        self.assert_integer_type(value);
        assert!(target.is_integer(), "truncate to a non-integer type");
        if self.value_ty(value) == target {
            return value;
        }
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.truncate(target));
        }
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::Truncate,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn convert(&mut self, value: ValueId, target: TypeName) -> ValueId {
        if self.value_ty(value) == target {
            return value;
        }
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.convert(target));
        }
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::Convert,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    // ----------------------------------------------------------------
    // Register file and memory
    // ----------------------------------------------------------------

    /// Load a fixed offset of the opaque per-guest-thread register file.
    pub fn load_context(&mut self, offset: usize, ty: TypeName) -> ValueId {
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::LoadContext,
            0,
            Some(dest),
            [Operand::Offset(offset as u64), Operand::None, Operand::None],
        );
        dest
    }

    pub fn store_context(&mut self, offset: usize, value: ValueId) {
        self.push_instr(
            Opcode::StoreContext,
            0,
            None,
            [
                Operand::Offset(offset as u64),
                Operand::Value(value),
                Operand::None,
            ],
        );
    }

    pub fn load(&mut self, address: ValueId, ty: TypeName, load_flags: u16) -> ValueId {
        self.assert_address_type(address);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Load,
            load_flags,
            Some(dest),
            [Operand::Value(address), Operand::None, Operand::None],
        );
        dest
    }

    pub fn load_offset(
        &mut self,
        address: ValueId,
        offset: ValueId,
        ty: TypeName,
        load_flags: u16,
    ) -> ValueId {
        self.assert_address_type(address);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::LoadOffset,
            load_flags,
            Some(dest),
            [Operand::Value(address), Operand::Value(offset), Operand::None],
        );
        dest
    }

    pub fn store(&mut self, address: ValueId, value: ValueId, store_flags: u16) {
        self.assert_address_type(address);
        self.push_instr(
            Opcode::Store,
            store_flags,
            None,
            [Operand::Value(address), Operand::Value(value), Operand::None],
        );
    }

    pub fn store_offset(
        &mut self,
        address: ValueId,
        offset: ValueId,
        value: ValueId,
        store_flags: u16,
    ) {
        self.assert_address_type(address);
        self.push_instr(
            Opcode::StoreOffset,
            store_flags,
            None,
            [
                Operand::Value(address),
                Operand::Value(offset),
                Operand::Value(value),
            ],
        );
    }

    pub fn memory_barrier(&mut self) {
        self.push_instr(Opcode::MemoryBarrier, 0, None, [Operand::None; 3]);
    }

    // ----------------------------------------------------------------
    // Selection and comparison
    // ----------------------------------------------------------------

    pub fn select(&mut self, cond: ValueId, value1: ValueId, value2: ValueId) -> ValueId {
        self.assert_types_equal(value1, value2);
        if let Some(c) = self.constant_of(cond) {
            return if c.is_true() { value1 } else { value2 };
        }
        let ty = self.value_ty(value1);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Select,
            0,
            Some(dest),
            [
                Operand::Value(cond),
                Operand::Value(value1),
                Operand::Value(value2),
            ],
        );
        dest
    }

    pub fn is_true(&mut self, value: ValueId) -> ValueId {
        if let Some(c) = self.constant_of(value) {
            return self.load_constant_i8(c.is_true() as i8);
        }
        let dest = self.alloc_value(TypeName::Int8);
        self.push_instr(
            Opcode::IsTrue,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn is_false(&mut self, value: ValueId) -> ValueId {
        if let Some(c) = self.constant_of(value) {
            return self.load_constant_i8(!c.is_true() as i8);
        }
        let dest = self.alloc_value(TypeName::Int8);
        self.push_instr(
            Opcode::IsFalse,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    fn compare(&mut self, opcode: Opcode, op: CompareOp, a: ValueId, b: ValueId) -> ValueId {
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            if !ca.ty().is_vector() {
                return self.load_constant_i8(ca.compare(op, cb) as i8);
            }
        }
        let dest = self.alloc_value(TypeName::Int8);
        self.push_instr(
            opcode,
            0,
            Some(dest),
            [Operand::Value(a), Operand::Value(b), Operand::None],
        );
        dest
    }

    pub fn compare_eq(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareEq, CompareOp::Eq, a, b)
    }

    pub fn compare_ne(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareNe, CompareOp::Ne, a, b)
    }

    pub fn compare_slt(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareSlt, CompareOp::Slt, a, b)
    }

    pub fn compare_sle(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareSle, CompareOp::Sle, a, b)
    }

    pub fn compare_sgt(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareSgt, CompareOp::Sgt, a, b)
    }

    pub fn compare_sge(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareSge, CompareOp::Sge, a, b)
    }

    pub fn compare_ult(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareUlt, CompareOp::Ult, a, b)
    }

    pub fn compare_ule(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareUle, CompareOp::Ule, a, b)
    }

    pub fn compare_ugt(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareUgt, CompareOp::Ugt, a, b)
    }

    pub fn compare_uge(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.compare(Opcode::CompareUge, CompareOp::Uge, a, b)
    }

    // ----------------------------------------------------------------
    // Arithmetic
    // ----------------------------------------------------------------

    fn binary(&mut self, opcode: Opcode, flags: u16, a: ValueId, b: ValueId) -> ValueId {
        let ty = self.value_ty(a);
        let dest = self.alloc_value(ty);
        self.push_instr(
            opcode,
            flags,
            Some(dest),
            [Operand::Value(a), Operand::Value(b), Operand::None],
        );
        dest
    }

    pub fn add(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            if !ca.ty().is_vector() {
                return self.alloc_constant(ca.add(cb));
            }
        }
        if self.value_ty(a).is_integer() {
            if self.is_constant_zero(a) {
                return b;
            }
            if self.is_constant_zero(b) {
                return a;
            }
        }
        self.binary(Opcode::Add, 0, a, b)
    }

    pub fn sub(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            if !ca.ty().is_vector() {
                return self.alloc_constant(ca.sub(cb));
            }
        }
        let ty = self.value_ty(a);
        if ty.is_integer() {
            if a == b {
                return self.load_zero(ty);
            }
            if self.is_constant_zero(b) {
                return a;
            }
        }
        self.binary(Opcode::Sub, 0, a, b)
    }

    pub fn mul(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            if !ca.ty().is_vector() {
                return self.alloc_constant(ca.mul(cb));
            }
        }
        self.binary(Opcode::Mul, 0, a, b)
    }

    pub fn mul_hi(&mut self, a: ValueId, b: ValueId, unsigned: bool) -> ValueId {
        self.assert_types_equal(a, b);
        self.assert_integer_type(a);
        let flags = if unsigned {
            instr_flags::ARITHMETIC_UNSIGNED
        } else {
            0
        };
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            return self.alloc_constant(ca.mul_hi(cb, unsigned));
        }
        self.binary(Opcode::MulHi, flags, a, b)
    }

    pub fn div(&mut self, a: ValueId, b: ValueId, unsigned: bool) -> ValueId {
        self.assert_types_equal(a, b);
        let flags = if unsigned {
            instr_flags::ARITHMETIC_UNSIGNED
        } else {
            0
        };
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            // Division by a constant zero traps at runtime; leave it to the
            // backend rather than fold an undefined result.
            if !ca.ty().is_vector() && !cb.is_zero() {
                return self.alloc_constant(ca.div(cb, unsigned));
            }
        }
        self.binary(Opcode::Div, flags, a, b)
    }

    pub fn mul_add(&mut self, a: ValueId, b: ValueId, c: ValueId) -> ValueId {
        self.assert_types_equal(a, b);
        self.assert_types_equal(a, c);
        if let (Some(ca), Some(cb), Some(cc)) = (
            self.constant_of(a),
            self.constant_of(b),
            self.constant_of(c),
        ) {
            if !ca.ty().is_vector() {
                return self.alloc_constant(ca.mul(cb).add(cc));
            }
        }
        let ty = self.value_ty(a);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::MulAdd,
            0,
            Some(dest),
            [Operand::Value(a), Operand::Value(b), Operand::Value(c)],
        );
        dest
    }

    pub fn neg(&mut self, value: ValueId) -> ValueId {
        if let Some(c) = self.constant_of(value) {
            if !c.ty().is_vector() {
                return self.alloc_constant(c.neg());
            }
        }
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Neg,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    // ----------------------------------------------------------------
    // Logical
    // ----------------------------------------------------------------

    pub fn and(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.assert_non_float_type(a);
        self.assert_non_float_type(b);
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            return self.alloc_constant(ca.and(cb));
        }
        if a == b {
            return a;
        }
        if self.is_constant_zero(a) {
            return a;
        }
        if self.is_constant_zero(b) {
            return b;
        }
        self.binary(Opcode::And, 0, a, b)
    }

    pub fn or(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.assert_non_float_type(a);
        self.assert_non_float_type(b);
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            return self.alloc_constant(ca.or(cb));
        }
        if a == b {
            return a;
        }
        if self.is_constant_zero(a) {
            return b;
        }
        if self.is_constant_zero(b) {
            return a;
        }
        self.binary(Opcode::Or, 0, a, b)
    }

    pub fn xor(&mut self, a: ValueId, b: ValueId) -> ValueId {
        self.assert_non_float_type(a);
        self.assert_non_float_type(b);
        self.assert_types_equal(a, b);
        if let (Some(ca), Some(cb)) = (self.constant_of(a), self.constant_of(b)) {
            return self.alloc_constant(ca.xor(cb));
        }
        if a == b {
            let ty = self.value_ty(a);
            return self.load_zero(ty);
        }
        self.binary(Opcode::Xor, 0, a, b)
    }

    pub fn not(&mut self, value: ValueId) -> ValueId {
        self.assert_non_float_type(value);
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.not());
        }
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Not,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    // ----------------------------------------------------------------
    // Shifts and rotates. Shift amounts are coerced to a single-byte type.
    // ----------------------------------------------------------------

    fn shift_amount(&mut self, amount: ValueId) -> ValueId {
        self.assert_integer_type(amount);
        if self.value_ty(amount) != TypeName::Int8 {
            self.truncate(amount, TypeName::Int8)
        } else {
            amount
        }
    }

    fn shift(&mut self, opcode: Opcode, value: ValueId, amount: ValueId) -> ValueId {
        self.assert_non_float_type(value);
        if self.is_constant_zero(amount) {
            return value;
        }
        let amount = self.shift_amount(amount);
        if let (Some(cv), Some(ca)) = (self.constant_of(value), self.constant_of(amount)) {
            if !cv.ty().is_vector() {
                let amt = ca.as_u64() as u32;
                let folded = match opcode {
                    Opcode::Shl => cv.shl(amt),
                    Opcode::Shr => cv.shr(amt),
                    Opcode::Sha => cv.sha(amt),
                    Opcode::RotateLeft => cv.rotate_left(amt),
                    _ => unreachable!(),
                };
                return self.alloc_constant(folded);
            }
        }
        self.binary(opcode, 0, value, amount)
    }

    pub fn shl(&mut self, value: ValueId, amount: ValueId) -> ValueId {
        self.shift(Opcode::Shl, value, amount)
    }

    pub fn shl_imm(&mut self, value: ValueId, amount: i8) -> ValueId {
        let amount = self.load_constant_i8(amount);
        self.shl(value, amount)
    }

    pub fn shr(&mut self, value: ValueId, amount: ValueId) -> ValueId {
        self.shift(Opcode::Shr, value, amount)
    }

    pub fn shr_imm(&mut self, value: ValueId, amount: i8) -> ValueId {
        let amount = self.load_constant_i8(amount);
        self.shr(value, amount)
    }

    pub fn sha(&mut self, value: ValueId, amount: ValueId) -> ValueId {
        self.assert_integer_type(value);
        self.shift(Opcode::Sha, value, amount)
    }

    pub fn sha_imm(&mut self, value: ValueId, amount: i8) -> ValueId {
        let amount = self.load_constant_i8(amount);
        self.sha(value, amount)
    }

    pub fn rotate_left(&mut self, value: ValueId, amount: ValueId) -> ValueId {
        self.assert_integer_type(value);
        self.shift(Opcode::RotateLeft, value, amount)
    }

    pub fn rotate_left_imm(&mut self, value: ValueId, amount: i8) -> ValueId {
        let amount = self.load_constant_i8(amount);
        self.rotate_left(value, amount)
    }

    // ----------------------------------------------------------------
    // Bit manipulation
    // ----------------------------------------------------------------

    pub fn byte_swap(&mut self, value: ValueId) -> ValueId {
        if self.value_ty(value) == TypeName::Int8 {
            return value;
        }
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.byte_swap());
        }
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::ByteSwap,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn count_leading_zeros(&mut self, value: ValueId) -> ValueId {
        self.assert_integer_type(value);
        if let Some(c) = self.constant_of(value) {
            let n = c.count_leading_zeros();
            return self.load_constant_u8(n);
        }
        let dest = self.alloc_value(TypeName::Int8);
        self.push_instr(
            Opcode::CountLeadingZeros,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    // ----------------------------------------------------------------
    // Vector lane operations
    // ----------------------------------------------------------------

    pub fn insert(&mut self, value: ValueId, index: ValueId, part: ValueId) -> ValueId {
        self.assert_vector_type(value);
        let index = self.shift_amount(index);
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Insert,
            0,
            Some(dest),
            [
                Operand::Value(value),
                Operand::Value(index),
                Operand::Value(part),
            ],
        );
        dest
    }

    pub fn insert_imm(&mut self, value: ValueId, index: u8, part: ValueId) -> ValueId {
        let index = self.load_constant_u8(index);
        self.insert(value, index, part)
    }

    pub fn extract(&mut self, value: ValueId, index: ValueId, target: TypeName) -> ValueId {
        self.assert_vector_type(value);
        let index = self.shift_amount(index);
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::Extract,
            0,
            Some(dest),
            [Operand::Value(value), Operand::Value(index), Operand::None],
        );
        dest
    }

    pub fn extract_imm(&mut self, value: ValueId, index: u8, target: TypeName) -> ValueId {
        let index = self.load_constant_u8(index);
        self.extract(value, index, target)
    }

    pub fn splat(&mut self, value: ValueId, target: TypeName) -> ValueId {
        assert!(target.is_vector(), "splat target must be a vector type");
        if let Some(c) = self.constant_of(value) {
            return self.alloc_constant(c.splat());
        }
        let dest = self.alloc_value(target);
        self.push_instr(
            Opcode::Splat,
            0,
            Some(dest),
            [Operand::Value(value), Operand::None, Operand::None],
        );
        dest
    }

    pub fn permute(
        &mut self,
        control: ValueId,
        value1: ValueId,
        value2: ValueId,
        part: TypeName,
    ) -> ValueId {
        self.assert_types_equal(value1, value2);
        assert!(
            part >= TypeName::Int8 && part <= TypeName::Int32,
            "permute part type must be an 8/16/32-bit integer"
        );
        let ty = self.value_ty(value1);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Permute,
            part as u16,
            Some(dest),
            [
                Operand::Value(control),
                Operand::Value(value1),
                Operand::Value(value2),
            ],
        );
        dest
    }

    pub fn swizzle(&mut self, value: ValueId, part: TypeName, swizzle_mask: u32) -> ValueId {
        assert!(
            part == TypeName::Int32 || part == TypeName::Float32,
            "swizzle part type must be 32-bit"
        );
        if swizzle_mask == SWIZZLE_XYZW_TO_XYZW {
            return self.assign(value);
        }
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::Swizzle,
            part as u16,
            Some(dest),
            [
                Operand::Value(value),
                Operand::Offset(swizzle_mask as u64),
                Operand::None,
            ],
        );
        dest
    }

    fn vector_lanewise(
        &mut self,
        opcode: Opcode,
        a: ValueId,
        b: ValueId,
        part: TypeName,
        fold: impl Fn(ConstantValue, ConstantValue) -> ConstantValue,
    ) -> ValueId {
        self.assert_vector_type(a);
        self.assert_vector_type(b);
        if let (Some(ConstantValue::Vec128(va)), Some(ConstantValue::Vec128(vb))) =
            (self.constant_of(a), self.constant_of(b))
        {
            if part == TypeName::Int32 || part == TypeName::Float32 {
                let wa = va.to_u32x4();
                let wb = vb.to_u32x4();
                let mut out = [0u32; 4];
                for n in 0..4 {
                    let (la, lb) = if part == TypeName::Float32 {
                        (
                            ConstantValue::Float32(f32::from_bits(wa[n])),
                            ConstantValue::Float32(f32::from_bits(wb[n])),
                        )
                    } else {
                        (
                            ConstantValue::Int32(wa[n] as i32),
                            ConstantValue::Int32(wb[n] as i32),
                        )
                    };
                    out[n] = fold(la, lb).as_u64() as u32;
                }
                return self.load_constant_vec128(Vec128::from_u32x4(out));
            }
        }
        self.binary(opcode, part as u16, a, b)
    }

    pub fn vector_add(&mut self, a: ValueId, b: ValueId, part: TypeName) -> ValueId {
        self.vector_lanewise(Opcode::VectorAdd, a, b, part, |x, y| x.add(y))
    }

    pub fn vector_sub(&mut self, a: ValueId, b: ValueId, part: TypeName) -> ValueId {
        self.vector_lanewise(Opcode::VectorSub, a, b, part, |x, y| x.sub(y))
    }

    // ----------------------------------------------------------------
    // Atomics
    // ----------------------------------------------------------------

    /// Compare-exchange at `address`; yields a single-byte success flag.
    /// `flags` carries the memory-ordering bits of the exchanging store.
    pub fn atomic_compare_exchange(
        &mut self,
        address: ValueId,
        old_value: ValueId,
        new_value: ValueId,
        flags: u16,
    ) -> ValueId {
        self.assert_address_type(address);
        self.assert_types_equal(old_value, new_value);
        let dest = self.alloc_value(TypeName::Int8);
        self.push_instr(
            Opcode::AtomicCompareExchange,
            flags,
            Some(dest),
            [
                Operand::Value(address),
                Operand::Value(old_value),
                Operand::Value(new_value),
            ],
        );
        dest
    }

    pub fn atomic_add(&mut self, address: ValueId, value: ValueId) -> ValueId {
        self.assert_address_type(address);
        self.assert_integer_type(value);
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::AtomicAdd,
            0,
            Some(dest),
            [Operand::Value(address), Operand::Value(value), Operand::None],
        );
        dest
    }

    pub fn atomic_sub(&mut self, address: ValueId, value: ValueId) -> ValueId {
        self.assert_address_type(address);
        self.assert_integer_type(value);
        let ty = self.value_ty(value);
        let dest = self.alloc_value(ty);
        self.push_instr(
            Opcode::AtomicSub,
            0,
            Some(dest),
            [Operand::Value(address), Operand::Value(value), Operand::None],
        );
        dest
    }

    // ----------------------------------------------------------------
    // Text dump
    // ----------------------------------------------------------------

    fn dump_value(&self, out: &mut String, id: ValueId) {
        let v = self.value(id);
        match v.constant {
            Some(c) => {
                let _ = write!(out, "{}", c);
            }
            None => {
                let _ = write!(out, "v{}.{}", v.ordinal, v.ty.name());
            }
        }
    }

    fn dump_operand(&self, out: &mut String, operand: Operand) {
        match operand {
            Operand::None => {}
            Operand::Value(v) => self.dump_value(out, v),
            Operand::Label(l) => {
                let label = self.label(l);
                match &label.name {
                    Some(name) => out.push_str(name),
                    None => {
                        let _ = write!(out, "label{}", label.id);
                    }
                }
            }
            Operand::Offset(o) => {
                let _ = write!(out, "+{}", o);
            }
        }
    }

    /// Render the block/instruction graph as text for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut block_ordinal = 0u32;
        for block_id in self.block_order() {
            let block = self.block(block_id);
            if Some(block_id) == self.block_head {
                out.push_str("<entry>:\n");
            } else if block.label_head.is_none() {
                let _ = writeln!(out, "<block{}>:", block_ordinal);
            }
            block_ordinal += 1;

            let mut label = block.label_head;
            while let Some(l) = label {
                let data = self.label(l);
                match &data.name {
                    Some(name) => {
                        let _ = writeln!(out, "{}:", name);
                    }
                    None => {
                        let _ = writeln!(out, "label{}:", data.id);
                    }
                }
                label = data.next;
            }

            for instr_id in self.block_instrs(block_id) {
                let i = self.instr(instr_id);
                if i.opcode == Opcode::Comment {
                    let index = i.srcs[0].as_offset().unwrap();
                    let _ = writeln!(out, "  ; {}", self.comment_text(index));
                    continue;
                }
                if i.opcode.info().flags & opcode_flags::HIDE != 0 {
                    continue;
                }
                out.push_str("  ");
                if let Some(dest) = i.dest {
                    self.dump_value(&mut out, dest);
                    out.push_str(" = ");
                }
                if i.flags != 0 {
                    let _ = write!(out, "{}.{}", i.opcode.info().name, i.flags);
                } else {
                    out.push_str(i.opcode.info().name);
                }
                let mut first = true;
                for src in i.srcs {
                    if src == Operand::None {
                        continue;
                    }
                    if first {
                        out.push(' ');
                        first = false;
                    } else {
                        out.push_str(", ");
                    }
                    self.dump_operand(&mut out, src);
                }
                out.push('\n');
            }
        }
        out
    }
}
