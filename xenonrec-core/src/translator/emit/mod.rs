//! Per-opcode semantic emitters.
//!
//! One routine per implemented guest opcode, each replaying that
//! instruction's architectural effect through the builder API. Split by
//! family the way the instruction set groups them.

pub mod altivec;
pub mod alu;
pub mod control;
pub mod fpu;
pub mod memory;

use crate::error::TranslateError;
use crate::ir::value::ValueId;
use crate::translator::FunctionTranslator;

pub type EmitResult = Result<(), TranslateError>;

/// EA = (RA) + (RB).
pub(crate) fn calculate_ea(f: &mut FunctionTranslator<'_>, ra: u32, rb: u32) -> ValueId {
    let a = f.load_gpr(ra);
    let b = f.load_gpr(rb);
    f.add(a, b)
}

/// EA = (RA|0) + (RB). A zero RA field means a literal zero base, not the
/// contents of register 0.
pub(crate) fn calculate_ea_0(f: &mut FunctionTranslator<'_>, ra: u32, rb: u32) -> ValueId {
    if ra != 0 {
        calculate_ea(f, ra, rb)
    } else {
        f.load_gpr(rb)
    }
}

/// EA = (RA) + imm.
pub(crate) fn calculate_ea_i(f: &mut FunctionTranslator<'_>, ra: u32, imm: u64) -> ValueId {
    let a = f.load_gpr(ra);
    let i = f.load_constant_u64(imm);
    f.add(a, i)
}

/// EA = (RA|0) + imm.
pub(crate) fn calculate_ea_0_i(f: &mut FunctionTranslator<'_>, ra: u32, imm: u64) -> ValueId {
    if ra != 0 {
        calculate_ea_i(f, ra, imm)
    } else {
        f.load_constant_u64(imm)
    }
}

/// Update-form writeback of the effective address into RA.
pub(crate) fn store_ea(f: &mut FunctionTranslator<'_>, ra: u32, ea: ValueId) {
    f.store_gpr(ra, ea);
}
