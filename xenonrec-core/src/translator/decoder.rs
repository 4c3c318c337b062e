//! Instruction word field extraction.
//!
//! A fetched word is a pure function input: each encoding format gets an
//! explicit decode function returning a plain record of extracted fields,
//! rather than reinterpreting the word through overlapping memory layouts.
//! Words arrive already converted to a native value whose bit numbering
//! follows the architectural convention (bit 0 = most significant); the
//! extraction below works on the native value with LSB-relative shifts.
//!
//! The vector-extension ("VX128") formats split their 7-bit register numbers
//! across low/high (and sometimes a third single-bit) field groups; the
//! records here reassemble them so emitters see one logical index.

/// Sign-extend the low 16 bits of a field.
pub fn exts16(v: u32) -> i64 {
    v as u16 as i16 as i64
}

/// Sign-extend a 26-bit value (a 24-bit branch displacement shifted left 2).
pub fn exts26(v: u32) -> i64 {
    if v & 0x0200_0000 != 0 {
        (v | 0xFC00_0000) as i32 as i64
    } else {
        v as i32 as i64
    }
}

/// Zero-extend the low 16 bits of a field.
pub fn extz16(v: u32) -> u64 {
    (v as u16) as u64
}

/// Big-endian bit-range mask over 64 bits: ones in [mstart, mstop]
/// (architectural numbering, bit 0 = MSB), wrapping when mstart > mstop.
pub fn bit_mask(mstart: u32, mstop: u32) -> u64 {
    let mstart = mstart & 0x3F;
    let mstop = mstop & 0x3F;
    let value = (u64::MAX >> mstart)
        ^ if mstop >= 63 {
            0
        } else {
            u64::MAX >> (mstop + 1)
        };
    if mstart <= mstop {
        value
    } else {
        !value
    }
}

fn bits(code: u32, shift: u32, width: u32) -> u32 {
    (code >> shift) & ((1 << width) - 1)
}

/// A decoded instruction: raw word plus guest address. Field views are
/// produced on demand by the per-format accessors; the descriptor resolved
/// by dispatch travels separately.
#[derive(Debug, Clone, Copy)]
pub struct InstrData {
    pub address: u32,
    pub code: u32,
}

/// D-form: `op RT, RA, d/SIMM/UIMM`.
#[derive(Debug, Clone, Copy)]
pub struct FormatD {
    pub rt: u32,
    pub ra: u32,
    pub ds: u32,
}

impl FormatD {
    pub fn d(&self) -> i64 {
        exts16(self.ds)
    }

    pub fn simm(&self) -> i64 {
        self.d()
    }

    pub fn uimm(&self) -> u64 {
        extz16(self.ds)
    }

    /// Compare-immediate view: CR field in the high bits of RT.
    pub fn crfd(&self) -> u32 {
        self.rt >> 2
    }

    /// Trap-conditions view of the RT field.
    pub fn to(&self) -> u32 {
        self.rt
    }
}

/// DS-form: `op RT, RA, ds(RA)` with a 14-bit scaled displacement and a
/// 2-bit sub-opcode in the low bits.
#[derive(Debug, Clone, Copy)]
pub struct FormatDs {
    pub rt: u32,
    pub ra: u32,
    pub ds_field: u32,
}

impl FormatDs {
    pub fn ds(&self) -> i64 {
        exts16(self.ds_field << 2)
    }
}

/// X-form: `op RT, RA, RB` with a record bit.
#[derive(Debug, Clone, Copy)]
pub struct FormatX {
    pub rt: u32,
    pub ra: u32,
    pub rb: u32,
    pub rc: bool,
}

impl FormatX {
    pub fn crfd(&self) -> u32 {
        self.rt >> 2
    }

    /// Compare-word length bit (0 = 32-bit, 1 = 64-bit operands).
    pub fn l(&self) -> u32 {
        self.rt & 1
    }

    /// Shift-immediate view of the RB field.
    pub fn sh(&self) -> u32 {
        self.rb
    }

    pub fn to(&self) -> u32 {
        self.rt
    }
}

/// XO-form: `op RT, RA, RB` with overflow-enable and record bits.
#[derive(Debug, Clone, Copy)]
pub struct FormatXo {
    pub rt: u32,
    pub ra: u32,
    pub rb: u32,
    pub oe: bool,
    pub rc: bool,
}

/// XL-form: condition-register branches.
#[derive(Debug, Clone, Copy)]
pub struct FormatXl {
    pub bo: u32,
    pub bi: u32,
    pub bb: u32,
    pub lk: bool,
}

/// XFX-form: special-purpose register moves.
#[derive(Debug, Clone, Copy)]
pub struct FormatXfx {
    pub rt: u32,
    pub spr_raw: u32,
}

impl FormatXfx {
    /// The SPR number has its 5-bit halves swapped in the encoding.
    pub fn spr(&self) -> u32 {
        ((self.spr_raw & 0x1F) << 5) | ((self.spr_raw >> 5) & 0x1F)
    }
}

/// I-form: unconditional branch with a 24-bit displacement.
#[derive(Debug, Clone, Copy)]
pub struct FormatI {
    pub li: u32,
    pub aa: bool,
    pub lk: bool,
}

impl FormatI {
    /// Resolved branch target for an instruction at `address`.
    pub fn target(&self, address: u32) -> u32 {
        let disp = exts26(self.li << 2) as u32;
        if self.aa {
            disp
        } else {
            address.wrapping_add(disp)
        }
    }
}

/// B-form: conditional branch with a 14-bit displacement.
#[derive(Debug, Clone, Copy)]
pub struct FormatB {
    pub bo: u32,
    pub bi: u32,
    pub bd: u32,
    pub aa: bool,
    pub lk: bool,
}

impl FormatB {
    pub fn target(&self, address: u32) -> u32 {
        let disp = exts16(self.bd << 2) as u32;
        if self.aa {
            disp
        } else {
            address.wrapping_add(disp)
        }
    }
}

/// M-form: rotate-and-mask.
#[derive(Debug, Clone, Copy)]
pub struct FormatM {
    pub rt: u32,
    pub ra: u32,
    pub sh: u32,
    pub mb: u32,
    pub me: u32,
    pub rc: bool,
}

impl FormatM {
    /// The 64-bit mask of the 32-bit rotate (fields offset into the high
    /// word of the doubled register image).
    pub fn mask(&self) -> u64 {
        bit_mask(self.mb + 32, self.me + 32)
    }
}

/// A-form: four-operand floating arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct FormatA {
    pub frt: u32,
    pub fra: u32,
    pub frb: u32,
    pub frc: u32,
    pub rc: bool,
}

/// SC-form: system call.
#[derive(Debug, Clone, Copy)]
pub struct FormatSc {
    pub lev: u32,
}

/// VX-form: three 5-bit vector registers.
#[derive(Debug, Clone, Copy)]
pub struct FormatVx {
    pub vd: u32,
    pub va: u32,
    pub vb: u32,
}

/// VXA-form: four 5-bit vector registers.
#[derive(Debug, Clone, Copy)]
pub struct FormatVxa {
    pub vd: u32,
    pub va: u32,
    pub vb: u32,
    pub vc: u32,
}

/// VXR-form: vector compare with record bit.
#[derive(Debug, Clone, Copy)]
pub struct FormatVxr {
    pub vd: u32,
    pub va: u32,
    pub vb: u32,
    pub rc: bool,
}

/// VX128-form: three 7-bit vector registers reassembled from split fields.
#[derive(Debug, Clone, Copy)]
pub struct FormatVx128 {
    pub vd: u32,
    pub va: u32,
    pub vb: u32,
}

/// VX128_1-form: vector target with GPR base/index (vector load/store).
#[derive(Debug, Clone, Copy)]
pub struct FormatVx128_1 {
    pub vd: u32,
    pub ra: u32,
    pub rb: u32,
}

/// VX128_2-form: three 7-bit vector registers plus a 3-bit control register.
#[derive(Debug, Clone, Copy)]
pub struct FormatVx128_2 {
    pub vd: u32,
    pub va: u32,
    pub vb: u32,
    pub vc: u32,
}

/// VX128_3-form: vector target/source with a 5-bit immediate.
#[derive(Debug, Clone, Copy)]
pub struct FormatVx128_3 {
    pub vd: u32,
    pub vb: u32,
    pub imm: u32,
}

/// VX128_P-form: permute-immediate with a split 8-bit control field.
#[derive(Debug, Clone, Copy)]
pub struct FormatVx128P {
    pub vd: u32,
    pub vb: u32,
    pub perm: u32,
}

impl InstrData {
    pub fn new(address: u32, code: u32) -> InstrData {
        InstrData { address, code }
    }

    /// Primary opcode, bits 0-5 architectural (top six bits of the word).
    pub fn primary_opcode(&self) -> u32 {
        self.code >> 26
    }

    pub fn d(&self) -> FormatD {
        FormatD {
            rt: bits(self.code, 21, 5),
            ra: bits(self.code, 16, 5),
            ds: bits(self.code, 0, 16),
        }
    }

    pub fn ds(&self) -> FormatDs {
        FormatDs {
            rt: bits(self.code, 21, 5),
            ra: bits(self.code, 16, 5),
            ds_field: bits(self.code, 2, 14),
        }
    }

    pub fn x(&self) -> FormatX {
        FormatX {
            rt: bits(self.code, 21, 5),
            ra: bits(self.code, 16, 5),
            rb: bits(self.code, 11, 5),
            rc: self.code & 1 != 0,
        }
    }

    pub fn xo(&self) -> FormatXo {
        FormatXo {
            rt: bits(self.code, 21, 5),
            ra: bits(self.code, 16, 5),
            rb: bits(self.code, 11, 5),
            oe: bits(self.code, 10, 1) != 0,
            rc: self.code & 1 != 0,
        }
    }

    pub fn xl(&self) -> FormatXl {
        FormatXl {
            bo: bits(self.code, 21, 5),
            bi: bits(self.code, 16, 5),
            bb: bits(self.code, 11, 5),
            lk: self.code & 1 != 0,
        }
    }

    pub fn xfx(&self) -> FormatXfx {
        FormatXfx {
            rt: bits(self.code, 21, 5),
            spr_raw: bits(self.code, 11, 10),
        }
    }

    pub fn i(&self) -> FormatI {
        FormatI {
            li: bits(self.code, 2, 24),
            aa: bits(self.code, 1, 1) != 0,
            lk: self.code & 1 != 0,
        }
    }

    pub fn b(&self) -> FormatB {
        FormatB {
            bo: bits(self.code, 21, 5),
            bi: bits(self.code, 16, 5),
            bd: bits(self.code, 2, 14),
            aa: bits(self.code, 1, 1) != 0,
            lk: self.code & 1 != 0,
        }
    }

    pub fn m(&self) -> FormatM {
        FormatM {
            rt: bits(self.code, 21, 5),
            ra: bits(self.code, 16, 5),
            sh: bits(self.code, 11, 5),
            mb: bits(self.code, 6, 5),
            me: bits(self.code, 1, 5),
            rc: self.code & 1 != 0,
        }
    }

    pub fn a(&self) -> FormatA {
        FormatA {
            frt: bits(self.code, 21, 5),
            fra: bits(self.code, 16, 5),
            frb: bits(self.code, 11, 5),
            frc: bits(self.code, 6, 5),
            rc: self.code & 1 != 0,
        }
    }

    pub fn sc(&self) -> FormatSc {
        FormatSc {
            lev: bits(self.code, 5, 7),
        }
    }

    pub fn vx(&self) -> FormatVx {
        FormatVx {
            vd: bits(self.code, 21, 5),
            va: bits(self.code, 16, 5),
            vb: bits(self.code, 11, 5),
        }
    }

    pub fn vxa(&self) -> FormatVxa {
        FormatVxa {
            vd: bits(self.code, 21, 5),
            va: bits(self.code, 16, 5),
            vb: bits(self.code, 11, 5),
            vc: bits(self.code, 6, 5),
        }
    }

    pub fn vxr(&self) -> FormatVxr {
        FormatVxr {
            vd: bits(self.code, 21, 5),
            va: bits(self.code, 16, 5),
            vb: bits(self.code, 11, 5),
            rc: bits(self.code, 10, 1) != 0,
        }
    }

    pub fn vx128(&self) -> FormatVx128 {
        // VD = VDl | (VDh << 5)
        // VA = VAl | (VAh << 5) | (VAhh << 6)
        // VB = VBl | (VBh << 5)
        let vb_h = bits(self.code, 0, 2);
        let vd_h = bits(self.code, 2, 2);
        let va_h = bits(self.code, 5, 1);
        let va_hh = bits(self.code, 10, 1);
        let vb_l = bits(self.code, 11, 5);
        let va_l = bits(self.code, 16, 5);
        let vd_l = bits(self.code, 21, 5);
        FormatVx128 {
            vd: vd_l | (vd_h << 5),
            va: va_l | (va_h << 5) | (va_hh << 6),
            vb: vb_l | (vb_h << 5),
        }
    }

    pub fn vx128_1(&self) -> FormatVx128_1 {
        let vd_h = bits(self.code, 2, 2);
        FormatVx128_1 {
            vd: bits(self.code, 21, 5) | (vd_h << 5),
            ra: bits(self.code, 16, 5),
            rb: bits(self.code, 11, 5),
        }
    }

    pub fn vx128_2(&self) -> FormatVx128_2 {
        let vb_h = bits(self.code, 0, 2);
        let vd_h = bits(self.code, 2, 2);
        let va_h = bits(self.code, 5, 1);
        let vc = bits(self.code, 6, 3);
        let va_hh = bits(self.code, 10, 1);
        FormatVx128_2 {
            vd: bits(self.code, 21, 5) | (vd_h << 5),
            va: bits(self.code, 16, 5) | (va_h << 5) | (va_hh << 6),
            vb: bits(self.code, 11, 5) | (vb_h << 5),
            vc,
        }
    }

    pub fn vx128_3(&self) -> FormatVx128_3 {
        let vb_h = bits(self.code, 0, 2);
        let vd_h = bits(self.code, 2, 2);
        FormatVx128_3 {
            vd: bits(self.code, 21, 5) | (vd_h << 5),
            vb: bits(self.code, 11, 5) | (vb_h << 5),
            imm: bits(self.code, 16, 5),
        }
    }

    pub fn vx128_p(&self) -> FormatVx128P {
        let vb_h = bits(self.code, 0, 2);
        let vd_h = bits(self.code, 2, 2);
        let perm_h = bits(self.code, 6, 3);
        FormatVx128P {
            vd: bits(self.code, 21, 5) | (vd_h << 5),
            vb: bits(self.code, 11, 5) | (vb_h << 5),
            perm: bits(self.code, 16, 5) | (perm_h << 5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d_form_fields() {
        // lwz r3, -8(r4): 0x8064FFF8
        let i = InstrData::new(0x8200_0000, 0x8064_FFF8);
        let d = i.d();
        assert_eq!(d.rt, 3);
        assert_eq!(d.ra, 4);
        assert_eq!(d.d(), -8);
    }

    #[test]
    fn i_form_backward_target() {
        // b .-16 at 0x100: LI field = -4 words
        let li = ((-16i32 >> 2) as u32) & 0x00FF_FFFF;
        let code = (18 << 26) | (li << 2);
        let i = InstrData::new(0x100, code);
        assert_eq!(i.i().target(0x100), 0xF0);
    }

    #[test]
    fn bit_mask_matches_rotate_semantics() {
        assert_eq!(bit_mask(32, 63), 0xFFFF_FFFF);
        assert_eq!(bit_mask(0, 0), 0x8000_0000_0000_0000);
        // Wrapped mask.
        assert_eq!(bit_mask(63, 0), 0x8000_0000_0000_0001);
    }

    #[test]
    fn vx128_register_reassembly() {
        // Set VDl=5, VDh=0b11 -> vd = 0b1100101 = 101
        let code = (5u32 << 21) | (0b11 << 2);
        let i = InstrData::new(0, code);
        assert_eq!(i.vx128().vd, 101);
        // VAl=1, VAh=1, VAhh=1 -> va = 1 | 32 | 64 = 97
        let code = (1u32 << 16) | (1 << 5) | (1 << 10);
        let i = InstrData::new(0, code);
        assert_eq!(i.vx128().va, 97);
    }
}
