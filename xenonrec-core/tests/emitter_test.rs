// Tests for the semantic emitters: effective-address formation, byte-order
// handling, reservation semantics and the unimplemented-opcode trap path.
#[cfg(test)]
mod tests {
    use xenonrec_core::ir::builder::FunctionBuilder;
    use xenonrec_core::ir::instr::{instr_flags, Opcode};
    use xenonrec_core::ir::value::TypeName;
    use xenonrec_core::translator::dispatch::DispatchTables;
    use xenonrec_core::translator::{regfile, translate_function, Translation};

    const BASE: u32 = 0x8200_0000;

    fn translate(words: &[u32]) -> Translation {
        let tables = DispatchTables::build();
        translate_function(&tables, BASE, words, false)
    }

    fn opcodes_of(builder: &FunctionBuilder) -> Vec<Opcode> {
        let mut out = Vec::new();
        for block in builder.block_order() {
            for id in builder.block_instrs(block) {
                out.push(builder.instr(id).opcode);
            }
        }
        out
    }

    /// True if any instruction loads the register-file slot of GPR 0.
    fn reads_gpr0(builder: &FunctionBuilder) -> bool {
        let gpr0 = regfile::gpr(0) as u64;
        for block in builder.block_order() {
            for id in builder.block_instrs(block) {
                let i = builder.instr(id);
                if i.opcode == Opcode::LoadContext && i.srcs[0].as_offset() == Some(gpr0) {
                    return true;
                }
            }
        }
        false
    }

    const fn xw(o: u32, xop: u32) -> u32 {
        (o << 26) | (xop << 1)
    }

    const fn d_form(o: u32, rt: u32, ra: u32, d: u32) -> u32 {
        (o << 26) | (rt << 21) | (ra << 16) | (d & 0xFFFF)
    }

    const fn x_regs(word: u32, rt: u32, ra: u32, rb: u32) -> u32 {
        word | (rt << 21) | (ra << 16) | (rb << 11)
    }

    #[test]
    fn test_ra0_means_literal_zero_base() {
        // For every address-forming emitter, a register-A field of 0 must
        // never read GPR index 0.
        let cases = [
            d_form(32, 3, 0, 8),               // lwz r3, 8(r0)
            d_form(34, 3, 0, 8),               // lbz
            d_form(40, 3, 0, 8),               // lhz
            d_form(42, 3, 0, 8),               // lha
            d_form(36, 3, 0, 8),               // stw
            d_form(38, 3, 0, 8),               // stb
            d_form(44, 3, 0, 8),               // sth
            d_form(48, 1, 0, 8),               // lfs
            d_form(54, 1, 0, 8),               // stfd
            x_regs(xw(31, 23), 3, 0, 4),       // lwzx r3, r0, r4
            x_regs(xw(31, 87), 3, 0, 4),       // lbzx
            x_regs(xw(31, 151), 3, 0, 4),      // stwx
            x_regs(xw(31, 20), 3, 0, 4),       // lwarx
            x_regs(xw(31, 150) | 1, 3, 0, 4),  // stwcx.
            x_regs(xw(31, 103), 3, 0, 4),      // lvx
        ];
        for word in cases {
            let t = translate(&[word]);
            assert!(t.untranslatable.is_empty(), "word {:08X} did not emit", word);
            assert!(
                !reads_gpr0(&t.builder),
                "word {:08X} read GPR 0 despite RA=0",
                word
            );
        }
    }

    #[test]
    fn test_lwz_ra0_uses_raw_displacement() {
        // With RA=0 the effective address is the sign-extended displacement
        // alone; the load is 4 bytes, swapped, then zero-extended.
        let t = translate(&[d_form(32, 3, 0, 8)]);
        let b = &t.builder;
        let ops = opcodes_of(b);
        assert!(ops.contains(&Opcode::LoadOffset));
        assert!(ops.contains(&Opcode::ByteSwap));
        assert!(ops.contains(&Opcode::ZeroExtend));
        // The store into r3 receives the zero-extended value.
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::StoreContext {
                    assert_eq!(i.srcs[0].as_offset(), Some(regfile::gpr(3) as u64));
                    let value = i.srcs[1].as_value().unwrap();
                    assert_eq!(b.value_ty(value), TypeName::Int64);
                }
            }
        }
    }

    #[test]
    fn test_lbz_has_no_byte_swap() {
        let t = translate(&[d_form(34, 3, 4, 8)]);
        let ops = opcodes_of(&t.builder);
        assert!(ops.contains(&Opcode::LoadOffset));
        assert!(!ops.contains(&Opcode::ByteSwap));
    }

    #[test]
    fn test_lwarx_emits_acquire_ordered_load() {
        // 0x7C000028 is lwarx r0, r0, r0: an acquire-ordered 4-byte load
        // then zero-extension. Register B gets no literal-zero treatment.
        let t = translate(&[0x7C00_0028]);
        let b = &t.builder;
        assert!(t.untranslatable.is_empty());
        assert!(reads_gpr0(b), "lwarx must read GPR 0 through the RB field");

        let mut found_load = false;
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::Load {
                    found_load = true;
                    assert_ne!(i.flags & instr_flags::LOAD_ACQUIRE, 0);
                    let dest = i.dest.unwrap();
                    assert_eq!(b.value_ty(dest), TypeName::Int32);
                }
            }
        }
        assert!(found_load);
        let ops = opcodes_of(b);
        assert!(ops.contains(&Opcode::ZeroExtend));
        assert!(ops.contains(&Opcode::MemoryBarrier));
    }

    #[test]
    fn test_stwcx_writes_success_flag_to_cr0_eq() {
        let word = x_regs(xw(31, 150) | 1, 3, 4, 5); // stwcx. r3, r4, r5
        let t = translate(&[word]);
        let b = &t.builder;
        assert!(t.untranslatable.is_empty());

        let mut exchange_dest = None;
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::AtomicCompareExchange {
                    assert_ne!(i.flags & instr_flags::STORE_RELEASE, 0);
                    exchange_dest = i.dest;
                }
            }
        }
        let exchange_dest = exchange_dest.expect("no compare-exchange emitted");

        let mut stored_to_eq = false;
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::StoreContext
                    && i.srcs[0].as_offset() == Some(regfile::cr_eq(0) as u64)
                {
                    assert_eq!(i.srcs[1].as_value(), Some(exchange_dest));
                    stored_to_eq = true;
                }
            }
        }
        assert!(stored_to_eq, "success flag never written to CR0.EQ");
    }

    #[test]
    fn test_store_truncates_and_swaps() {
        let t = translate(&[d_form(44, 3, 4, 16)]); // sth r3, 16(r4)
        let ops = opcodes_of(&t.builder);
        assert!(ops.contains(&Opcode::Truncate));
        assert!(ops.contains(&Opcode::ByteSwap));
        assert!(ops.contains(&Opcode::StoreOffset));
    }

    #[test]
    fn test_byte_reversed_load_skips_swap() {
        let word = x_regs(xw(31, 534), 3, 4, 5); // lwbrx r3, r4, r5
        let t = translate(&[word]);
        let ops = opcodes_of(&t.builder);
        assert!(ops.contains(&Opcode::Load));
        assert!(!ops.contains(&Opcode::ByteSwap));
    }

    #[test]
    fn test_unimplemented_opcode_traps() {
        // subfic is registered but declines to emit; the driver must
        // substitute a guest-visible trap, never skip it.
        let word = d_form(8, 3, 4, 1);
        let t = translate(&[word]);
        assert_eq!(t.untranslatable, vec![(BASE, word)]);
        let ops = opcodes_of(&t.builder);
        assert!(ops.contains(&Opcode::Trap));
    }

    #[test]
    fn test_invalid_word_traps() {
        let t = translate(&[0xFFFF_FFFF]);
        assert_eq!(t.untranslatable, vec![(BASE, 0xFFFF_FFFF)]);
        let ops = opcodes_of(&t.builder);
        assert!(ops.contains(&Opcode::Trap));
    }

    #[test]
    fn test_backward_branch_splits_emitted_block() {
        // addi; addi; b .-4 -- the branch targets the second addi, which was
        // already emitted, so its block is split and the label resolves.
        let words = [
            d_form(14, 3, 0, 1),              // addi r3, 0, 1
            d_form(14, 4, 0, 2),              // addi r4, 0, 2
            (18 << 26) | ((-4i32 as u32) & 0x03FF_FFFC), // b .-4
        ];
        let t = translate(&words);
        let b = &t.builder;
        assert!(t.untranslatable.is_empty());

        let mut branch_label = None;
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::Branch {
                    branch_label = i.srcs[0].as_label();
                }
            }
        }
        let label = branch_label.expect("no branch emitted");
        let target_block = b.label(label).block.expect("label not attached");
        // The labeled block must hold the second instruction's marker.
        let target_addr = (BASE + 4) as u64;
        let holds_target = b
            .block_instrs(target_block)
            .iter()
            .any(|&id| {
                let i = b.instr(id);
                i.opcode == Opcode::SourceOffset && i.srcs[0].as_offset() == Some(target_addr)
            });
        assert!(holds_target, "branch label attached to the wrong block");
        b.assert_no_cycles();
    }

    #[test]
    fn test_vector128_operands_reassemble() {
        // vor128 vr100, vr38, vr99: registers split across the low/high
        // field groups must recombine before reaching the register file.
        let vd = 100u32;
        let va = 38u32;
        let vb = 99u32;
        let word = 0x1400_02D0
            | ((vd & 0x1F) << 21)
            | ((va & 0x1F) << 16)
            | ((vb & 0x1F) << 11)
            | (((va >> 6) & 1) << 10)
            | (((va >> 5) & 1) << 5)
            | (((vd >> 5) & 3) << 2)
            | ((vb >> 5) & 3);
        let t = translate(&[word]);
        let b = &t.builder;
        assert!(t.untranslatable.is_empty());

        let mut loaded = Vec::new();
        let mut stored = Vec::new();
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::LoadContext {
                    loaded.push(i.srcs[0].as_offset().unwrap());
                }
                if i.opcode == Opcode::StoreContext {
                    stored.push(i.srcs[0].as_offset().unwrap());
                }
            }
        }
        assert!(loaded.contains(&(regfile::vr(va) as u64)));
        assert!(loaded.contains(&(regfile::vr(vb) as u64)));
        assert!(stored.contains(&(regfile::vr(vd) as u64)));
    }

    #[test]
    fn test_update_form_writes_back_ea() {
        let word = d_form(33, 3, 4, 8); // lwzu r3, 8(r4)
        let t = translate(&[word]);
        let b = &t.builder;
        let mut wrote_ra = false;
        for block in b.block_order() {
            for id in b.block_instrs(block) {
                let i = b.instr(id);
                if i.opcode == Opcode::StoreContext
                    && i.srcs[0].as_offset() == Some(regfile::gpr(4) as u64)
                {
                    wrote_ra = true;
                }
            }
        }
        assert!(wrote_ra, "lwzu must write the effective address to RA");
    }
}
