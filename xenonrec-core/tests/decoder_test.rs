// Unit tests for dispatch-table construction and word decoding
#[cfg(test)]
mod tests {
    use xenonrec_core::translator::decoder::InstrData;
    use xenonrec_core::translator::disasm;
    use xenonrec_core::translator::dispatch::DispatchTables;

    #[test]
    fn test_every_registered_pattern_round_trips() {
        // Decoding a synthetic word equal to a pattern (don't-care bits
        // zeroed) must resolve to that pattern's descriptor, and the
        // descriptor's canonical opcode must survive its own mask.
        let tables = DispatchTables::build();
        for entry in tables.entries() {
            let resolved = tables
                .lookup(entry.opcode)
                .unwrap_or_else(|| panic!("{} did not resolve", entry.name));
            assert_eq!(resolved.name, entry.name, "wrong descriptor for {}", entry.name);
            assert_eq!(
                entry.opcode & entry.mask,
                entry.opcode,
                "{} pattern has bits outside its mask",
                entry.name
            );
        }
    }

    #[test]
    fn test_table_completeness() {
        let tables = DispatchTables::build();
        assert!(tables.verify_coverage().is_ok());
    }

    #[test]
    fn test_duplicate_fill_covers_dont_care_bits() {
        // fadd leaves FRC as don't-care; every projection of those five bits
        // must land on the same descriptor since decode does no masking.
        let tables = DispatchTables::build();
        let fadd = (63 << 26) | (21 << 1);
        for frc in 0..32u32 {
            let word = fadd | (frc << 6);
            let entry = tables.lookup(word).expect("fadd slot unfilled");
            assert_eq!(entry.name, "fadd", "frc={}", frc);
        }
    }

    #[test]
    fn test_lwz_decodes() {
        // 0x80000000 is lwz r0, 0(r0).
        let tables = DispatchTables::build();
        let entry = tables.lookup(0x8000_0000).expect("lwz did not resolve");
        assert_eq!(entry.name, "lwz");

        let i = InstrData::new(0x8200_0000, 0x8064_FFF8);
        let d = i.d();
        assert_eq!(d.rt, 3);
        assert_eq!(d.ra, 4);
        assert_eq!(d.d(), -8);
    }

    #[test]
    fn test_lwarx_decodes() {
        // 0x7C000028 is lwarx r0, r0, r0.
        let tables = DispatchTables::build();
        let entry = tables.lookup(0x7C00_0028).expect("lwarx did not resolve");
        assert_eq!(entry.name, "lwarx");
    }

    #[test]
    fn test_vector128_scan_resolution() {
        let tables = DispatchTables::build();
        // lvx128 vd, ra, rb with split register fields set.
        let lvx128 = 0x1000_00C3 | (5 << 21) | (0b11 << 2);
        let entry = tables.lookup(lvx128).expect("lvx128 did not resolve");
        assert_eq!(entry.name, "lvx128");
        let d = InstrData::new(0, lvx128).vx128_1();
        assert_eq!(d.vd, 101);

        // vor128 with nonzero operand fields still matches its pattern.
        let vor128 = 0x1400_02D0 | (1 << 21) | (2 << 16) | (3 << 11);
        let entry = tables.lookup(vor128).expect("vor128 did not resolve");
        assert_eq!(entry.name, "vor128");

        // The sub-families with shared low bits stay distinct.
        assert_eq!(tables.lookup(0x1400_0010).unwrap().name, "vaddfp128");
        assert_eq!(tables.lookup(0x1400_0000).unwrap().name, "vperm128");
    }

    #[test]
    fn test_unknown_words_yield_null_descriptor() {
        let tables = DispatchTables::build();
        assert!(tables.lookup(0x0000_0000).is_none());
        assert!(tables.lookup(0xFFFF_FFFF).is_none());
        // An opcode-31 slot nothing registered.
        assert!(tables.lookup((31 << 26) | (1013 << 1)).is_none());
    }

    #[test]
    fn test_disassembly_text() {
        let tables = DispatchTables::build();
        let word = 0x8064_FFF8; // lwz r3, -8(r4)
        let entry = tables.lookup(word).unwrap();
        let mut out = String::new();
        disasm::disassemble(entry, &InstrData::new(0, word), &mut out);
        assert_eq!(out, "lwz r3, -8(r4)");

        let word = 0x7C63_2050; // subf r3, r3, r4
        let entry = tables.lookup(word).unwrap();
        assert_eq!(entry.name, "subf");
        let mut out = String::new();
        disasm::disassemble(entry, &InstrData::new(0, word), &mut out);
        assert_eq!(out, "subf r3, r3, r4");
    }
}
