//! Static instruction registrations.
//!
//! One entry per opcode: canonical pattern, format, kind, name and the
//! semantic-emit/disassembly handlers. Entries with no emit handler decline
//! translation; the driver substitutes a guest-visible trap for them. The
//! table set follows the 64-bit PowerPC books plus the console's VMX128
//! extension.

use crate::translator::disasm;
use crate::translator::dispatch::{
    DisasmFn, EmitFn, InstrFormat, InstrKind, InstrType, TableBuilder,
};
use crate::translator::emit::{altivec, alu, control, fpu, memory};

const fn op(o: u32) -> u32 {
    o << 26
}

/// X/XL/XFX/XO-style extended opcode in bits 1-10.
const fn xw(o: u32, xop: u32) -> u32 {
    op(o) | (xop << 1)
}

/// A-form extended opcode in bits 1-5.
const fn af(o: u32, xop: u32) -> u32 {
    op(o) | (xop << 1)
}

/// VX-style extended opcode in bits 0-10.
const fn vx(o: u32, xop: u32) -> u32 {
    op(o) | xop
}

/// VXA-style extended opcode in bits 0-5.
const fn vxa(o: u32, xop: u32) -> u32 {
    op(o) | xop
}

const fn vx128(o: u32, xop: u32) -> u32 {
    op(o) | (xop & 0x3D0)
}

const fn vx128_1(o: u32, xop: u32) -> u32 {
    op(o) | (xop & 0x7F3)
}

const fn vx128_2(o: u32, xop: u32) -> u32 {
    op(o) | (xop & 0x210)
}

const fn vx128_3(o: u32, xop: u32) -> u32 {
    op(o) | (xop & 0x7F0)
}

const fn vx128_p(o: u32, xop: u32) -> u32 {
    op(o) | (xop & 0x630)
}

fn e(
    b: &mut TableBuilder,
    name: &'static str,
    opcode: u32,
    format: InstrFormat,
    kind: InstrKind,
    emit: Option<EmitFn>,
    disasm: Option<DisasmFn>,
) {
    b.register(InstrType {
        opcode,
        mask: format.mask(),
        format,
        kind,
        name,
        emit,
        disasm,
    });
}

/// As [`e`] but with an explicit mask, for entries whose record bit is a
/// fixed part of the encoding (the conditional stores).
fn e_masked(
    b: &mut TableBuilder,
    name: &'static str,
    opcode: u32,
    mask: u32,
    format: InstrFormat,
    kind: InstrKind,
    emit: Option<EmitFn>,
    disasm: Option<DisasmFn>,
) {
    b.register(InstrType {
        opcode,
        mask,
        format,
        kind,
        name,
        emit,
        disasm,
    });
}

/// Register every instruction descriptor. Called exactly once by
/// `DispatchTables::build`.
pub(crate) fn register_all(b: &mut TableBuilder) {
    use InstrFormat::*;
    use InstrKind::*;

    // Primary-opcode bucket.
    e(b, "twi", op(3), D, General, Some(control::twi), Some(disasm::d_to_ra_simm));
    e(b, "mulli", op(7), D, General, Some(alu::mulli), Some(disasm::d_rt_ra_simm));
    e(b, "subfic", op(8), D, General, None, Some(disasm::d_rt_ra_simm));
    e(b, "cmpli", op(10), D, General, Some(alu::cmpli), Some(disasm::d_crfd_ra_uimm));
    e(b, "cmpi", op(11), D, General, Some(alu::cmpi), Some(disasm::d_crfd_ra_simm));
    e(b, "addic", op(12), D, General, None, Some(disasm::d_rt_ra_simm));
    e(b, "addic.", op(13), D, General, None, Some(disasm::d_rt_ra_simm));
    e(b, "addi", op(14), D, General, Some(alu::addi), Some(disasm::d_rt_ra_simm));
    e(b, "addis", op(15), D, General, Some(alu::addis), Some(disasm::d_rt_ra_simm));
    e(b, "bc", op(16), B, BranchCond, Some(control::bcx), Some(disasm::b_cond_target));
    e(b, "sc", op(17) | 2, Sc, Syscall, Some(control::sc), Some(disasm::sc_lev));
    e(b, "b", op(18), I, BranchAlways, Some(control::bx), Some(disasm::i_target));
    e(b, "rlwimi", op(20), M, General, Some(alu::rlwimi), Some(disasm::m_ra_rt_sh_mb_me));
    e(b, "rlwinm", op(21), M, General, Some(alu::rlwinm), Some(disasm::m_ra_rt_sh_mb_me));
    e(b, "rlwnm", op(23), M, General, Some(alu::rlwnm), Some(disasm::m_ra_rt_sh_mb_me));
    e(b, "ori", op(24), D, General, Some(alu::ori), Some(disasm::d_ra_rt_uimm));
    e(b, "oris", op(25), D, General, Some(alu::oris), Some(disasm::d_ra_rt_uimm));
    e(b, "xori", op(26), D, General, Some(alu::xori), Some(disasm::d_ra_rt_uimm));
    e(b, "xoris", op(27), D, General, Some(alu::xoris), Some(disasm::d_ra_rt_uimm));
    e(b, "andi.", op(28), D, General, Some(alu::andi_rc), Some(disasm::d_ra_rt_uimm));
    e(b, "andis.", op(29), D, General, Some(alu::andis_rc), Some(disasm::d_ra_rt_uimm));
    e(b, "lwz", op(32), D, General, Some(memory::lwz), Some(disasm::d_rt_d_ra));
    e(b, "lwzu", op(33), D, General, Some(memory::lwzu), Some(disasm::d_rt_d_ra));
    e(b, "lbz", op(34), D, General, Some(memory::lbz), Some(disasm::d_rt_d_ra));
    e(b, "lbzu", op(35), D, General, Some(memory::lbzu), Some(disasm::d_rt_d_ra));
    e(b, "stw", op(36), D, General, Some(memory::stw), Some(disasm::d_rt_d_ra));
    e(b, "stwu", op(37), D, General, Some(memory::stwu), Some(disasm::d_rt_d_ra));
    e(b, "stb", op(38), D, General, Some(memory::stb), Some(disasm::d_rt_d_ra));
    e(b, "stbu", op(39), D, General, Some(memory::stbu), Some(disasm::d_rt_d_ra));
    e(b, "lhz", op(40), D, General, Some(memory::lhz), Some(disasm::d_rt_d_ra));
    e(b, "lhzu", op(41), D, General, Some(memory::lhzu), Some(disasm::d_rt_d_ra));
    e(b, "lha", op(42), D, General, Some(memory::lha), Some(disasm::d_rt_d_ra));
    e(b, "lhau", op(43), D, General, Some(memory::lhau), Some(disasm::d_rt_d_ra));
    e(b, "sth", op(44), D, General, Some(memory::sth), Some(disasm::d_rt_d_ra));
    e(b, "sthu", op(45), D, General, Some(memory::sthu), Some(disasm::d_rt_d_ra));
    e(b, "lfs", op(48), D, General, Some(memory::lfs), Some(disasm::d_frt_d_ra));
    e(b, "lfd", op(50), D, General, Some(memory::lfd), Some(disasm::d_frt_d_ra));
    e(b, "stfs", op(52), D, General, Some(memory::stfs), Some(disasm::d_frt_d_ra));
    e(b, "stfd", op(54), D, General, Some(memory::stfd), Some(disasm::d_frt_d_ra));

    // Bucket 19.
    e(b, "bclr", xw(19, 16), Xl, BranchCond, Some(control::bclrx), Some(disasm::xl_bo_bi));
    e(b, "isync", xw(19, 150), X, General, Some(memory::isync), Some(disasm::x_none));
    e(b, "bcctr", xw(19, 528), Xl, BranchCond, Some(control::bcctrx), Some(disasm::xl_bo_bi));

    // Bucket 30: the 64-bit rotate family shares one uber entry.
    e(b, "rld", op(30), Md, General, None, None);

    // Bucket 31: integer X/XO space.
    e(b, "cmp", xw(31, 0), X, General, Some(alu::cmp), Some(disasm::x_crfd_ra_rb));
    e(b, "tw", xw(31, 4), X, General, Some(control::tw), Some(disasm::x_to_ra_rb));
    e(b, "subfc", xw(31, 8), Xo, General, None, Some(disasm::xo_rt_ra_rb));
    e(b, "addc", xw(31, 10), Xo, General, None, Some(disasm::xo_rt_ra_rb));
    e(b, "mulhwu", xw(31, 11), Xo, General, Some(alu::mulhwu), Some(disasm::xo_rt_ra_rb));
    e(b, "mfcr", xw(31, 19), Xfx, General, Some(control::mfcr), Some(disasm::x_rt));
    e(b, "lwarx", xw(31, 20), X, General, Some(memory::lwarx), Some(disasm::x_rt_ra_rb));
    e(b, "ldx", xw(31, 21), X, General, Some(memory::ldx), Some(disasm::x_rt_ra_rb));
    e(b, "lwzx", xw(31, 23), X, General, Some(memory::lwzx), Some(disasm::x_rt_ra_rb));
    e(b, "slw", xw(31, 24), X, General, Some(alu::slw), Some(disasm::x_ra_rt_rb));
    e(b, "cntlzw", xw(31, 26), X, General, Some(alu::cntlzw), Some(disasm::x_ra_rt));
    e(b, "sld", xw(31, 27), X, General, Some(alu::sld), Some(disasm::x_ra_rt_rb));
    e(b, "and", xw(31, 28), X, General, Some(alu::and), Some(disasm::x_ra_rt_rb));
    e(b, "cmpl", xw(31, 32), X, General, Some(alu::cmpl), Some(disasm::x_crfd_ra_rb));
    e(b, "subf", xw(31, 40), Xo, General, Some(alu::subf), Some(disasm::xo_rt_ra_rb));
    e(b, "lwzux", xw(31, 55), X, General, Some(memory::lwzux), Some(disasm::x_rt_ra_rb));
    e(b, "andc", xw(31, 60), X, General, Some(alu::andc), Some(disasm::x_ra_rt_rb));
    e(b, "mulhw", xw(31, 75), Xo, General, Some(alu::mulhw), Some(disasm::xo_rt_ra_rb));
    e(b, "ldarx", xw(31, 84), X, General, Some(memory::ldarx), Some(disasm::x_rt_ra_rb));
    e(b, "lbzx", xw(31, 87), X, General, Some(memory::lbzx), Some(disasm::x_rt_ra_rb));
    e(b, "lvx", xw(31, 103), X, General, Some(altivec::lvx), Some(disasm::x_rt_ra_rb));
    e(b, "neg", xw(31, 104), Xo, General, Some(alu::neg), Some(disasm::xo_rt_ra));
    e(b, "lbzux", xw(31, 119), X, General, Some(memory::lbzux), Some(disasm::x_rt_ra_rb));
    e(b, "nor", xw(31, 124), X, General, Some(alu::nor), Some(disasm::x_ra_rt_rb));
    e(b, "subfe", xw(31, 136), Xo, General, None, Some(disasm::xo_rt_ra_rb));
    e(b, "adde", xw(31, 138), Xo, General, None, Some(disasm::xo_rt_ra_rb));
    e(b, "stdx", xw(31, 149), X, General, Some(memory::stdx), Some(disasm::x_rt_ra_rb));
    e_masked(
        b,
        "stwcx.",
        xw(31, 150) | 1,
        0xFC00_07FF,
        X,
        General,
        Some(memory::stwcx),
        Some(disasm::x_rt_ra_rb),
    );
    e(b, "stwx", xw(31, 151), X, General, Some(memory::stwx), Some(disasm::x_rt_ra_rb));
    e(b, "subfze", xw(31, 200), Xo, General, None, Some(disasm::xo_rt_ra));
    e(b, "addze", xw(31, 202), Xo, General, None, Some(disasm::xo_rt_ra));
    e_masked(
        b,
        "stdcx.",
        xw(31, 214) | 1,
        0xFC00_07FF,
        X,
        General,
        Some(memory::stdcx),
        Some(disasm::x_rt_ra_rb),
    );
    e(b, "stbx", xw(31, 215), X, General, Some(memory::stbx), Some(disasm::x_rt_ra_rb));
    e(b, "stvx", xw(31, 231), X, General, Some(altivec::stvx), Some(disasm::x_rt_ra_rb));
    e(b, "subfme", xw(31, 232), Xo, General, None, Some(disasm::xo_rt_ra));
    e(b, "addme", xw(31, 234), Xo, General, None, Some(disasm::xo_rt_ra));
    e(b, "mullw", xw(31, 235), Xo, General, Some(alu::mullw), Some(disasm::xo_rt_ra_rb));
    e(b, "lhzx", xw(31, 279), X, General, Some(memory::lhzx), Some(disasm::x_rt_ra_rb));
    e(b, "eqv", xw(31, 284), X, General, Some(alu::eqv), Some(disasm::x_ra_rt_rb));
    e(b, "lhzux", xw(31, 311), X, General, Some(memory::lhzux), Some(disasm::x_rt_ra_rb));
    e(b, "xor", xw(31, 316), X, General, Some(alu::xor), Some(disasm::x_ra_rt_rb));
    e(b, "mfspr", xw(31, 339), Xfx, General, Some(control::mfspr), Some(disasm::xfx_rt_spr));
    e(b, "lwax", xw(31, 341), X, General, Some(memory::lwax), Some(disasm::x_rt_ra_rb));
    e(b, "lhax", xw(31, 343), X, General, Some(memory::lhax), Some(disasm::x_rt_ra_rb));
    e(b, "sthx", xw(31, 407), X, General, Some(memory::sthx), Some(disasm::x_rt_ra_rb));
    e(b, "orc", xw(31, 412), X, General, Some(alu::orc), Some(disasm::x_ra_rt_rb));
    e(b, "or", xw(31, 444), X, General, Some(alu::or), Some(disasm::x_ra_rt_rb));
    e(b, "divwu", xw(31, 459), Xo, General, Some(alu::divwu), Some(disasm::xo_rt_ra_rb));
    e(b, "mtspr", xw(31, 467), Xfx, General, Some(control::mtspr), Some(disasm::xfx_spr_rt));
    e(b, "nand", xw(31, 476), X, General, Some(alu::nand), Some(disasm::x_ra_rt_rb));
    e(b, "divw", xw(31, 491), Xo, General, Some(alu::divw), Some(disasm::xo_rt_ra_rb));
    e(b, "lwbrx", xw(31, 534), X, General, Some(memory::lwbrx), Some(disasm::x_rt_ra_rb));
    e(b, "srw", xw(31, 536), X, General, Some(alu::srw), Some(disasm::x_ra_rt_rb));
    e(b, "srd", xw(31, 539), X, General, Some(alu::srd), Some(disasm::x_ra_rt_rb));
    e(b, "sync", xw(31, 598), X, General, Some(memory::sync), Some(disasm::x_none));
    e(b, "sthbrx", xw(31, 918), X, General, Some(memory::sthbrx), Some(disasm::x_rt_ra_rb));
    e(b, "stwbrx", xw(31, 662), X, General, Some(memory::stwbrx), Some(disasm::x_rt_ra_rb));
    e(b, "lhbrx", xw(31, 790), X, General, Some(memory::lhbrx), Some(disasm::x_rt_ra_rb));
    e(b, "sraw", xw(31, 792), X, General, Some(alu::sraw), Some(disasm::x_ra_rt_rb));
    e(b, "srawi", xw(31, 824), X, General, Some(alu::srawi), Some(disasm::x_ra_rt_sh));
    e(b, "eieio", xw(31, 854), X, General, Some(memory::eieio), Some(disasm::x_none));
    e(b, "extsh", xw(31, 922), X, General, Some(alu::extsh), Some(disasm::x_ra_rt));
    e(b, "extsb", xw(31, 954), X, General, Some(alu::extsb), Some(disasm::x_ra_rt));
    e(b, "extsw", xw(31, 986), X, General, Some(alu::extsw), Some(disasm::x_ra_rt));

    // Buckets 58/62: 64-bit loads and stores with the 2-bit sub-opcode.
    e(b, "ld", op(58), Ds, General, Some(memory::ld), Some(disasm::ds_rt_d_ra));
    e(b, "ldu", op(58) | 1, Ds, General, Some(memory::ldu), Some(disasm::ds_rt_d_ra));
    e(b, "lwa", op(58) | 2, Ds, General, Some(memory::lwa), Some(disasm::ds_rt_d_ra));
    e(b, "std", op(62), Ds, General, Some(memory::std), Some(disasm::ds_rt_d_ra));
    e(b, "stdu", op(62) | 1, Ds, General, Some(memory::stdu), Some(disasm::ds_rt_d_ra));

    // Bucket 63: floating point. A-format entries duplicate-fill their
    // don't-care FRC projections.
    e(b, "fdiv", af(63, 18), A, General, Some(fpu::fdiv), Some(disasm::a_frt_fra_frb));
    e(b, "fsub", af(63, 20), A, General, Some(fpu::fsub), Some(disasm::a_frt_fra_frb));
    e(b, "fadd", af(63, 21), A, General, Some(fpu::fadd), Some(disasm::a_frt_fra_frb));
    e(b, "fmul", af(63, 25), A, General, Some(fpu::fmul), Some(disasm::a_frt_fra_frc));
    e(b, "fmsub", af(63, 28), A, General, Some(fpu::fmsub), Some(disasm::a_frt_fra_frc_frb));
    e(b, "fmadd", af(63, 29), A, General, Some(fpu::fmadd), Some(disasm::a_frt_fra_frc_frb));
    e(b, "fneg", xw(63, 40), X, General, Some(fpu::fneg), Some(disasm::x_frt_frb));
    e(b, "fmr", xw(63, 72), X, General, Some(fpu::fmr), Some(disasm::x_frt_frb));

    // Bucket 4: VMX dense entries.
    e(b, "vaddfp", vx(4, 10), Vx, General, Some(altivec::vaddfp), Some(disasm::vx_vd_va_vb));
    e(b, "vsubfp", vx(4, 74), Vx, General, Some(altivec::vsubfp), Some(disasm::vx_vd_va_vb));
    e(b, "vspltw", vx(4, 652), Vx, General, Some(altivec::vspltw), Some(disasm::vx_vd_vb_uimm));
    e(b, "vspltisw", vx(4, 908), Vx, General, Some(altivec::vspltisw), Some(disasm::vx_vd_simm));
    e(b, "vand", vx(4, 1028), Vx, General, Some(altivec::vand), Some(disasm::vx_vd_va_vb));
    e(b, "vor", vx(4, 1156), Vx, General, Some(altivec::vor), Some(disasm::vx_vd_va_vb));
    e(b, "vxor", vx(4, 1220), Vx, General, Some(altivec::vxor), Some(disasm::vx_vd_va_vb));

    // VMX four-operand forms resolve by scan.
    e(b, "vperm", vxa(4, 43), Vxa, General, Some(altivec::vperm), Some(disasm::vxa_vd_va_vb_vc));
    e(b, "vmaddfp", vxa(4, 46), Vxa, General, Some(altivec::vmaddfp), Some(disasm::vxa_vd_va_vb_vc));

    // VMX128 extended space, scan-resolved.
    e(
        b,
        "lvx128",
        vx128_1(4, 195),
        Vx128_1,
        General,
        Some(altivec::lvx128),
        Some(disasm::vx128_1_vd_ra0_rb),
    );
    e(
        b,
        "stvx128",
        vx128_1(4, 451),
        Vx128_1,
        General,
        Some(altivec::stvx128),
        Some(disasm::vx128_1_vd_ra0_rb),
    );
    e(
        b,
        "vperm128",
        vx128_2(5, 0),
        Vx128_2,
        General,
        Some(altivec::vperm128),
        Some(disasm::vx128_2_vd_va_vb_vc),
    );
    e(
        b,
        "vaddfp128",
        vx128(5, 16),
        Vx128,
        General,
        Some(altivec::vaddfp128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vsubfp128",
        vx128(5, 80),
        Vx128,
        General,
        Some(altivec::vsubfp128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vmulfp128",
        vx128(5, 144),
        Vx128,
        General,
        Some(altivec::vmulfp128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vmaddfp128",
        vx128(5, 208),
        Vx128,
        General,
        Some(altivec::vmaddfp128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vand128",
        vx128(5, 528),
        Vx128,
        General,
        Some(altivec::vand128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vor128",
        vx128(5, 720),
        Vx128,
        General,
        Some(altivec::vor128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vxor128",
        vx128(5, 784),
        Vx128,
        General,
        Some(altivec::vxor128),
        Some(disasm::vx128_vd_va_vb),
    );
    e(
        b,
        "vspltw128",
        vx128_3(6, 1840),
        Vx128_3,
        General,
        Some(altivec::vspltw128),
        Some(disasm::vx128_3_vd_vb_imm),
    );
    e(
        b,
        "vspltisw128",
        vx128_3(6, 1904),
        Vx128_3,
        General,
        Some(altivec::vspltisw128),
        Some(disasm::vx128_3_vd_vb_imm),
    );
    e(
        b,
        "vpermwi128",
        vx128_p(6, 528),
        Vx128P,
        General,
        Some(altivec::vpermwi128),
        Some(disasm::vx128_p_vd_vb_perm),
    );
}
