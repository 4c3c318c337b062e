//! Branch, trap, syscall and special-register move emitters.
//!
//! Branch targets inside the function resolve to labels (splitting blocks
//! for backward targets discovered late); targets outside it become tail
//! transfers to the target address.

use crate::error::TranslateError;
use crate::ir::instr::instr_flags::CALL_TAIL;
use crate::ir::value::{TypeName, ValueId};
use crate::translator::decoder::InstrData;
use crate::translator::dispatch::select_bits;
use crate::translator::emit::EmitResult;
use crate::translator::FunctionTranslator;

/// Link-register save for the `l` branch variants.
fn store_return_address(f: &mut FunctionTranslator<'_>, address: u32) {
    let lr = f.load_constant_u64(address as u64 + 4);
    f.store_lr(lr);
}

pub fn bx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // NIA <- target; if LK then LR <- CIA + 4
    let d = i.i();
    if d.lk {
        store_return_address(f, i.address);
    }
    let target = d.target(i.address);
    match f.lookup_label(target) {
        Some(label) => f.branch(label, 0),
        None => {
            let t = f.load_constant_u64(target as u64);
            let flags = if d.lk { 0 } else { CALL_TAIL };
            f.call(t, flags);
        }
    }
    Ok(())
}

/// Evaluate the BO field's CTR and condition tests. Returns `None` for an
/// unconditional branch. Note the BO bits are numbered MSB-first in the
/// architecture books; the raw field is tested LSB-relative here.
fn branch_condition(
    f: &mut FunctionTranslator<'_>,
    bo: u32,
    bi: u32,
) -> Option<ValueId> {
    let mut ctr_ok = None;
    if select_bits(bo, 2, 2) == 0 {
        // CTR <- CTR - 1; test against zero, sense from BO.
        let ctr = f.load_ctr();
        let one = f.load_constant_i64(1);
        let ctr = f.sub(ctr, one);
        f.store_ctr(ctr);
        let zero = f.load_zero(TypeName::Int64);
        ctr_ok = Some(if select_bits(bo, 1, 1) != 0 {
            f.compare_eq(ctr, zero)
        } else {
            f.compare_ne(ctr, zero)
        });
    }

    let mut cond_ok = None;
    if select_bits(bo, 4, 4) == 0 {
        let bit = f.load_cr_bit(bi);
        cond_ok = Some(if select_bits(bo, 3, 3) != 0 {
            f.is_true(bit)
        } else {
            f.is_false(bit)
        });
    }

    match (ctr_ok, cond_ok) {
        (Some(a), Some(b)) => Some(f.and(a, b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

pub fn bcx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.b();
    if d.lk {
        store_return_address(f, i.address);
    }
    let ok = branch_condition(f, d.bo, d.bi);
    let target = d.target(i.address);
    match f.lookup_label(target) {
        Some(label) => match ok {
            Some(cond) => f.branch_true(cond, label, 0),
            None => f.branch(label, 0),
        },
        None => {
            let t = f.load_constant_u64(target as u64);
            match ok {
                Some(cond) => f.call_true(cond, t, CALL_TAIL),
                None => f.call(t, CALL_TAIL),
            }
        }
    }
    Ok(())
}

pub fn bclrx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // Branch to LR is a return from the function under translation.
    let d = i.xl();
    if d.lk {
        store_return_address(f, i.address);
    }
    let ok = branch_condition(f, d.bo, d.bi);
    match ok {
        Some(cond) => f.ret_true(cond),
        None => f.ret(),
    }
    Ok(())
}

pub fn bcctrx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // Branch to CTR: an indirect transfer out of the function. The CTR form
    // never tests CTR itself.
    let d = i.xl();
    if d.lk {
        store_return_address(f, i.address);
    }
    let mut cond_ok = None;
    if select_bits(d.bo, 4, 4) == 0 {
        let bit = f.load_cr_bit(d.bi);
        cond_ok = Some(if select_bits(d.bo, 3, 3) != 0 {
            f.is_true(bit)
        } else {
            f.is_false(bit)
        });
    }
    let ctr = f.load_ctr();
    let flags = if d.lk { 0 } else { CALL_TAIL };
    match cond_ok {
        Some(cond) => f.call_true(cond, ctr, flags),
        None => f.call(ctr, flags),
    }
    Ok(())
}

pub fn sc(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // Kernel dispatch happens outside the translation core; surface the
    // syscall as a trap carrying the level field.
    let d = i.sc();
    f.trap(d.lev as u16);
    Ok(())
}

/// Emit the trap condition selected by the TO field over two operands:
/// TO[0]=lt, TO[1]=gt, TO[2]=eq, TO[3]=ult, TO[4]=ugt (book numbering).
fn emit_trap(f: &mut FunctionTranslator<'_>, to: u32, a: ValueId, b: ValueId) {
    if to == 0x1F {
        // All conditions selected: unconditional.
        f.trap(0);
        return;
    }
    let mut cond: Option<ValueId> = None;
    let accumulate = |f: &mut FunctionTranslator<'_>, cond: &mut Option<ValueId>, c: ValueId| {
        *cond = Some(match *cond {
            Some(prev) => f.or(prev, c),
            None => c,
        });
    };
    if to & 0x10 != 0 {
        let c = f.compare_slt(a, b);
        accumulate(f, &mut cond, c);
    }
    if to & 0x08 != 0 {
        let c = f.compare_sgt(a, b);
        accumulate(f, &mut cond, c);
    }
    if to & 0x04 != 0 {
        let c = f.compare_eq(a, b);
        accumulate(f, &mut cond, c);
    }
    if to & 0x02 != 0 {
        let c = f.compare_ult(a, b);
        accumulate(f, &mut cond, c);
    }
    if to & 0x01 != 0 {
        let c = f.compare_ugt(a, b);
        accumulate(f, &mut cond, c);
    }
    if let Some(cond) = cond {
        f.trap_true(cond, 0);
    }
}

pub fn twi(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let a = f.load_gpr(d.ra);
    let b = f.load_constant_i64(d.simm());
    emit_trap(f, d.to(), a, b);
    Ok(())
}

pub fn tw(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let a = f.load_gpr(x.ra);
    let b = f.load_gpr(x.rb);
    emit_trap(f, x.to(), a, b);
    Ok(())
}

// Special-purpose register moves. Only LR and CTR live in the fast context;
// anything else declines.

pub fn mfspr(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.xfx();
    let v = match d.spr() {
        8 => f.load_lr(),
        9 => f.load_ctr(),
        _ => {
            return Err(TranslateError::Unimplemented {
                name: "mfspr",
                address: i.address,
                code: i.code,
            })
        }
    };
    f.store_gpr(d.rt, v);
    Ok(())
}

pub fn mtspr(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.xfx();
    let rs = f.load_gpr(d.rt);
    match d.spr() {
        8 => f.store_lr(rs),
        9 => f.store_ctr(rs),
        _ => {
            return Err(TranslateError::Unimplemented {
                name: "mtspr",
                address: i.address,
                code: i.code,
            })
        }
    }
    Ok(())
}

pub fn mfcr(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // Reassemble the 32-bit CR image from the per-field flag bytes.
    let d = i.xfx();
    let field = f.load_cr_field(0);
    let mut v = f.shl_imm(field, 28);
    for n in 1..8 {
        let field = f.load_cr_field(n);
        let shifted = f.shl_imm(field, (4 * (7 - n)) as i8);
        v = f.or(v, shifted);
    }
    f.store_gpr(d.rt, v);
    Ok(())
}
