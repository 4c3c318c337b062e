//! Vector (VMX and VMX128) emitters.
//!
//! The 128-register extension encodes its operand numbers across split
//! field groups; the decoder reassembles them, so the emitters here see one
//! logical index per operand. Vector loads and stores are 16-byte aligned
//! by masking the effective address, and swap each word lane between the
//! guest's byte order and the host's.

use crate::ir::value::{TypeName, ValueId, Vec128};
use crate::translator::decoder::InstrData;
use crate::translator::emit::{calculate_ea_0, EmitResult};
use crate::translator::FunctionTranslator;

fn aligned_ea_0(f: &mut FunctionTranslator<'_>, ra: u32, rb: u32) -> ValueId {
    let ea = calculate_ea_0(f, ra, rb);
    let mask = f.load_constant_u64(!0xF);
    f.and(ea, mask)
}

// Load/store

pub fn lvx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // VD <- MEM(EA & ~0xF, 16)
    let x = i.x();
    let ea = aligned_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Vec128, 0);
    let v = f.byte_swap(v);
    f.store_vr(x.rt, v);
    Ok(())
}

pub fn stvx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = aligned_ea_0(f, x.ra, x.rb);
    let v = f.load_vr(x.rt);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    Ok(())
}

pub fn lvx128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128_1();
    let ea = aligned_ea_0(f, d.ra, d.rb);
    let v = f.load(ea, TypeName::Vec128, 0);
    let v = f.byte_swap(v);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn stvx128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128_1();
    let ea = aligned_ea_0(f, d.ra, d.rb);
    let v = f.load_vr(d.vd);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    Ok(())
}

// Logical

pub fn vand(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.and(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vor(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.or(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vxor(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.xor(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vand128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.and(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vor128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.or(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vxor128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.xor(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

// Float arithmetic, four f32 lanes per register.

pub fn vaddfp(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.vector_add(va, vb, TypeName::Float32);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vsubfp(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.vector_sub(va, vb, TypeName::Float32);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vmaddfp(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // VD <- (VA) * (VC) + (VB)
    let d = i.vxa();
    let va = f.load_vr(d.va);
    let vc = f.load_vr(d.vc);
    let vb = f.load_vr(d.vb);
    let v = f.mul_add(va, vc, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vaddfp128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.vector_add(va, vb, TypeName::Float32);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vsubfp128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.vector_sub(va, vb, TypeName::Float32);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vmulfp128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.mul(va, vb);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vmaddfp128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // VD <- (VA) * (VB) + (VD): the 128-form reuses the target as addend.
    let d = i.vx128();
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let vd = f.load_vr(d.vd);
    let v = f.mul_add(va, vb, vd);
    f.store_vr(d.vd, v);
    Ok(())
}

// Splat and permute

pub fn vspltw(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // VD <- replicate word lane UIMM of (VB)
    let d = i.vx();
    let vb = f.load_vr(d.vb);
    let lane = f.extract_imm(vb, (d.va & 0x3) as u8, TypeName::Int32);
    let v = f.splat(lane, TypeName::Vec128);
    f.store_vr(d.vd, v);
    Ok(())
}

/// Sign-extend the 5-bit splat immediate.
fn simm5(v: u32) -> i32 {
    if v & 0x10 != 0 {
        (v | 0xFFFF_FFE0) as i32
    } else {
        v as i32
    }
}

pub fn vspltisw(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx();
    let lane = simm5(d.va) as u32;
    let v = f.load_constant_vec128(Vec128::from_u32x4([lane; 4]));
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vspltw128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128_3();
    let vb = f.load_vr(d.vb);
    let lane = f.extract_imm(vb, (d.imm & 0x3) as u8, TypeName::Int32);
    let v = f.splat(lane, TypeName::Vec128);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vspltisw128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.vx128_3();
    let lane = simm5(d.imm) as u32;
    let v = f.load_constant_vec128(Vec128::from_u32x4([lane; 4]));
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vperm(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // VD <- bytes of (VA)||(VB) selected by (VC)
    let d = i.vxa();
    let control = f.load_vr(d.vc);
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.permute(control, va, vb, TypeName::Int8);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vpermwi128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // VD <- word lanes of (VB) selected by the 8-bit immediate, two bits
    // per destination lane.
    let d = i.vx128_p();
    let vb = f.load_vr(d.vb);
    let v = f.swizzle(vb, TypeName::Float32, d.perm & 0xFF);
    f.store_vr(d.vd, v);
    Ok(())
}

pub fn vperm128(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // The 128-form restricts the control register to v0-v7.
    let d = i.vx128_2();
    let control = f.load_vr(d.vc);
    let va = f.load_vr(d.va);
    let vb = f.load_vr(d.vb);
    let v = f.permute(control, va, vb, TypeName::Int8);
    f.store_vr(d.vd, v);
    Ok(())
}
