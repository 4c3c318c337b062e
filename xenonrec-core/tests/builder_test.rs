// Unit tests for the IR builder: constant folding, identity simplification
// and the block-linkage state machine.
#[cfg(test)]
mod tests {
    use xenonrec_core::ir::builder::FunctionBuilder;
    use xenonrec_core::ir::instr::Opcode;
    use xenonrec_core::ir::value::{ConstantValue, TypeName, ValueId};

    fn constant_i64(b: &FunctionBuilder, v: ValueId) -> i64 {
        match b.constant_of(v) {
            Some(c) => c.as_i64(),
            None => panic!("expected a constant, got a dynamic value"),
        }
    }

    #[test]
    fn test_add_constants_folds_without_instrs() {
        // Building Add(2, 3) yields constant 5 and appends zero instructions.
        let mut b = FunctionBuilder::new();
        let two = b.load_constant_i32(2);
        let three = b.load_constant_i32(3);
        let sum = b.add(two, three);
        assert_eq!(b.constant_of(sum), Some(ConstantValue::Int32(5)));
        assert_eq!(b.instr_count(), 0);
        assert!(b.first_block().is_none());
    }

    #[test]
    fn test_folding_is_total_over_integer_ops() {
        // Every arithmetic/logical op over constant operands must fold to
        // the correct typed constant and leave the graph untouched.
        let mut b = FunctionBuilder::new();
        let a = b.load_constant_i64(0x1234_5678_9ABC_DEF0u64 as i64);
        let c = b.load_constant_i64(0x0F0F);

        let v = b.sub(a, c);
        assert_eq!(constant_i64(&b, v), 0x1234_5678_9ABC_DEF0u64 as i64 - 0x0F0F);
        let v = b.mul(c, c);
        assert_eq!(constant_i64(&b, v), 0x0F0F * 0x0F0F);
        let v = b.div(a, c, false);
        assert_eq!(constant_i64(&b, v), (0x1234_5678_9ABC_DEF0u64 as i64) / 0x0F0F);
        let v = b.and(a, c);
        assert_eq!(constant_i64(&b, v), (0x1234_5678_9ABC_DEF0u64 as i64) & 0x0F0F);
        let v = b.or(a, c);
        assert_eq!(constant_i64(&b, v), (0x1234_5678_9ABC_DEF0u64 as i64) | 0x0F0F);
        let v = b.xor(a, c);
        assert_eq!(constant_i64(&b, v), (0x1234_5678_9ABC_DEF0u64 as i64) ^ 0x0F0F);
        let v = b.not(c);
        assert_eq!(constant_i64(&b, v), !0x0F0F);
        let v = b.neg(c);
        assert_eq!(constant_i64(&b, v), -0x0F0F);

        let sh = b.load_constant_i8(4);
        let v = b.shl(c, sh);
        assert_eq!(constant_i64(&b, v), 0x0F0F << 4);
        let sh = b.load_constant_i8(4);
        let v = b.shr(c, sh);
        assert_eq!(constant_i64(&b, v), 0x0F0F >> 4);
        let m1 = b.load_constant_i64(-16);
        let sh = b.load_constant_i8(2);
        let v = b.sha(m1, sh);
        assert_eq!(constant_i64(&b, v), -4);
        let sh = b.load_constant_i8(8);
        let v = b.rotate_left(a, sh);
        assert_eq!(
            constant_i64(&b, v),
            (0x1234_5678_9ABC_DEF0u64).rotate_left(8) as i64
        );
        let v = b.byte_swap(c);
        assert_eq!(constant_i64(&b, v), 0x0F0Fi64.swap_bytes());

        let minus_one = b.load_constant_i64(-1);
        let v = b.compare_slt(minus_one, c);
        assert_eq!(b.constant_of(v), Some(ConstantValue::Int8(1)));
        let v = b.compare_ult(minus_one, c);
        assert_eq!(b.constant_of(v), Some(ConstantValue::Int8(0)));

        let v = b.zero_extend(c, TypeName::Int64);
        assert!(b.is_constant(v));
        let t = b.truncate(a, TypeName::Int16);
        assert_eq!(b.constant_of(t), Some(ConstantValue::Int16(0xDEF0u16 as i16)));

        assert_eq!(b.instr_count(), 0, "folding must not append instructions");
    }

    #[test]
    fn test_add_zero_identity_returns_operand() {
        // Building Add(dynamic, 0) returns the dynamic value unchanged.
        let mut b = FunctionBuilder::new();
        let dynamic = b.load_context(0x100, TypeName::Int64);
        let before = b.instr_count();
        let zero = b.load_zero(TypeName::Int64);
        let sum = b.add(dynamic, zero);
        assert_eq!(sum, dynamic);
        assert_eq!(b.instr_count(), before);
    }

    #[test]
    fn test_more_identity_simplifications() {
        let mut b = FunctionBuilder::new();
        let x = b.load_context(0x100, TypeName::Int64);
        let before = b.instr_count();

        let zero = b.load_zero(TypeName::Int64);
        let v = b.and(x, zero);
        assert!(b.is_constant_zero(v));
        let v = b.sub(x, x);
        assert!(b.is_constant_zero(v));
        let v = b.xor(x, x);
        assert!(b.is_constant_zero(v));
        let zero = b.load_zero(TypeName::Int64);
        assert_eq!(b.or(x, zero), x);
        assert_eq!(b.or(x, x), x);
        assert_eq!(b.and(x, x), x);
        let zero_sh = b.load_constant_i8(0);
        assert_eq!(b.shl(x, zero_sh), x);
        let zero_sh = b.load_constant_i8(0);
        assert_eq!(b.rotate_left(x, zero_sh), x);
        assert_eq!(b.zero_extend(x, TypeName::Int64), x);

        let byte = b.load_context(0x108, TypeName::Int8);
        let swapped = b.byte_swap(byte);
        assert_eq!(swapped, byte);

        // Only the two context loads hit the graph.
        assert_eq!(b.instr_count(), before + 1);
    }

    #[test]
    fn test_branch_closes_block() {
        // A branch issued while the open block has 3 instructions closes the
        // 4-instruction block; the next call opens a new block.
        let mut b = FunctionBuilder::new();
        b.nop();
        b.nop();
        b.nop();
        let target = b.new_label();
        b.branch(target, 0);
        assert!(b.current_block().is_none());

        b.nop();
        let blocks = b.block_order();
        assert_eq!(blocks.len(), 2);
        assert_eq!(b.block_instrs(blocks[0]).len(), 4);
        assert_eq!(b.block_instrs(blocks[1]).len(), 1);
        let tail = b.block(blocks[0]).instr_tail.unwrap();
        assert_eq!(b.instr(tail).opcode, Opcode::Branch);
    }

    #[test]
    fn test_mark_label_closes_nonempty_block() {
        let mut b = FunctionBuilder::new();
        b.nop();
        b.nop();
        let label = b.new_label();
        b.mark_label(label);
        b.nop();
        let blocks = b.block_order();
        assert_eq!(blocks.len(), 2);
        assert_eq!(b.label(label).block, Some(blocks[1]));
        assert_eq!(b.block(blocks[1]).label_head, Some(label));
    }

    #[test]
    fn test_insert_label_splits_block() {
        // Splitting a 5-instruction block after its third instruction yields
        // a 3-instruction block and a 2-instruction label-headed block whose
        // concatenation equals the original sequence.
        let mut b = FunctionBuilder::new();
        b.nop();
        b.nop();
        b.nop();
        b.nop();
        b.nop();
        let blocks = b.block_order();
        assert_eq!(blocks.len(), 1);
        let original = b.block_instrs(blocks[0]);
        assert_eq!(original.len(), 5);

        let label = b.new_label();
        b.insert_label(label, original[2]);

        let blocks = b.block_order();
        assert_eq!(blocks.len(), 2);
        let head = b.block_instrs(blocks[0]);
        let tail = b.block_instrs(blocks[1]);
        assert_eq!(head, original[..3].to_vec());
        assert_eq!(tail, original[3..].to_vec());
        assert_eq!(b.block(blocks[1]).label_head, Some(label));
        assert_eq!(b.label(label).block, Some(blocks[1]));
        for &id in &tail {
            assert_eq!(b.instr(id).block, blocks[1]);
        }

        // The open-block cursor follows the split.
        b.nop();
        assert_eq!(b.block_instrs(blocks[1]).len(), 3);
    }

    #[test]
    fn test_every_instr_belongs_to_exactly_one_block() {
        let mut b = FunctionBuilder::new();
        for n in 0..7 {
            b.nop();
            if n % 3 == 2 {
                let l = b.new_label();
                b.mark_label(l);
            }
        }
        let mut seen = std::collections::HashSet::new();
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                assert_eq!(b.instr(id).block, block);
                assert!(seen.insert(id), "instruction linked into two blocks");
            }
        }
        assert_eq!(seen.len(), b.instr_count());
        b.assert_no_cycles();
    }

    #[test]
    fn test_finalize_adds_fallthrough_branches() {
        let mut b = FunctionBuilder::new();
        b.nop();
        let l = b.new_label();
        b.mark_label(l);
        b.nop();
        b.finalize();

        let blocks = b.block_order();
        assert_eq!(blocks.len(), 2);
        // First block now falls through explicitly.
        let tail = b.block(blocks[0]).instr_tail.unwrap();
        assert_eq!(b.instr(tail).opcode, Opcode::Branch);
        // Trailing block is terminated.
        let tail = b.block(blocks[1]).instr_tail.unwrap();
        assert_eq!(b.instr(tail).opcode, Opcode::Return);
    }

    #[test]
    fn test_dump_renders_blocks_and_values() {
        let mut b = FunctionBuilder::new();
        let v = b.load_context(0x10, TypeName::Int64);
        let c = b.load_constant_i64(1);
        let sum = b.add(v, c);
        b.store_context(0x10, sum);
        let l = b.new_label();
        b.mark_label(l);
        b.nop();
        let text = b.dump();
        assert!(text.starts_with("<entry>:"));
        assert!(text.contains("load_context +16"));
        assert!(text.contains("add"));
        assert!(text.contains("label0:"));
    }

    #[test]
    #[should_panic(expected = "operand type mismatch")]
    fn test_type_mismatch_is_fatal() {
        let mut b = FunctionBuilder::new();
        let a = b.load_constant_i32(1);
        let c = b.load_constant_i64(1);
        let _ = b.add(a, c);
    }
}
