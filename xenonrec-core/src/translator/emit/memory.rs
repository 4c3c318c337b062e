//! Integer and floating-point load/store emitters.
//!
//! The guest is big-endian while the IR load/store primitives are
//! native-endian, so every multi-byte access carries an explicit byte-swap;
//! the byte-reversed access family is the exception, as is the
//! reserved-load/store-conditional family, which uses acquire/release
//! ordered primitives and writes its success flag into CR0.EQ.

use crate::ir::instr::instr_flags::{LOAD_ACQUIRE, STORE_RELEASE};
use crate::ir::value::TypeName;
use crate::translator::decoder::{exts16, InstrData};
use crate::translator::emit::{
    calculate_ea, calculate_ea_0, calculate_ea_0_i, calculate_ea_i, store_ea, EmitResult,
};
use crate::translator::regfile;
use crate::translator::FunctionTranslator;

// Integer load

pub fn lbz(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // EA <- (RA|0) + EXTS(D)
    // RT <- zext(MEM(EA, 1))
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(b, offset, TypeName::Int8, 0);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    Ok(())
}

pub fn lbzu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // EA <- (RA) + EXTS(D); RA <- EA
    let d = i.d();
    let ra = f.load_gpr(d.ra);
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(ra, offset, TypeName::Int8, 0);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    let ea = f.add(ra, offset);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn lbzx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int8, 0);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn lbzux(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int8, 0);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    store_ea(f, x.ra, ea);
    Ok(())
}

pub fn lhz(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(b, offset, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    Ok(())
}

pub fn lhzu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ra = f.load_gpr(d.ra);
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(ra, offset, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    let ea = f.add(ra, offset);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn lhzx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn lhzux(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    store_ea(f, x.ra, ea);
    Ok(())
}

pub fn lha(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // RT <- EXTS(MEM(EA, 2))
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(b, offset, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.sign_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    Ok(())
}

pub fn lhau(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ra = f.load_gpr(d.ra);
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(ra, offset, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.sign_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    let ea = f.add(ra, offset);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn lhax(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int16, 0);
    let v = f.byte_swap(v);
    let rt = f.sign_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn lwz(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // EA <- (RA|0) + EXTS(D)
    // RT <- zext(MEM(EA, 4))
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(b, offset, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    Ok(())
}

pub fn lwzu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ra = f.load_gpr(d.ra);
    let offset = f.load_constant_i64(d.d());
    let v = f.load_offset(ra, offset, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(d.rt, rt);
    let ea = f.add(ra, offset);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn lwzx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn lwzux(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    store_ea(f, x.ra, ea);
    Ok(())
}

pub fn lwa(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // RT <- EXTS(MEM(EA, 4)), EA from the scaled DS displacement.
    let ds = i.ds();
    let b = if ds.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(ds.ra)
    };
    let offset = f.load_constant_i64(ds.ds());
    let v = f.load_offset(b, offset, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let rt = f.sign_extend(v, TypeName::Int64);
    f.store_gpr(ds.rt, rt);
    Ok(())
}

pub fn lwax(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let rt = f.sign_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn ld(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let ds = i.ds();
    let b = if ds.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(ds.ra)
    };
    let offset = f.load_constant_i64(ds.ds());
    let v = f.load_offset(b, offset, TypeName::Int64, 0);
    let rt = f.byte_swap(v);
    f.store_gpr(ds.rt, rt);
    Ok(())
}

pub fn ldu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let ds = i.ds();
    let ea = calculate_ea_i(f, ds.ra, ds.ds() as u64);
    let v = f.load(ea, TypeName::Int64, 0);
    let rt = f.byte_swap(v);
    f.store_gpr(ds.rt, rt);
    store_ea(f, ds.ra, ea);
    Ok(())
}

pub fn ldx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int64, 0);
    let rt = f.byte_swap(v);
    f.store_gpr(x.rt, rt);
    Ok(())
}

// Integer store

pub fn stb(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // MEM(EA, 1) <- (RS)[56:63]
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let rs = f.load_gpr(d.rt);
    let v = f.truncate(rs, TypeName::Int8);
    f.store_offset(b, offset, v, 0);
    Ok(())
}

pub fn stbu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ea = calculate_ea_i(f, d.ra, exts16(d.ds) as u64);
    let rs = f.load_gpr(d.rt);
    let v = f.truncate(rs, TypeName::Int8);
    f.store(ea, v, 0);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn stbx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let v = f.truncate(rs, TypeName::Int8);
    f.store(ea, v, 0);
    Ok(())
}

pub fn sth(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let rs = f.load_gpr(d.rt);
    let v = f.truncate(rs, TypeName::Int16);
    let v = f.byte_swap(v);
    f.store_offset(b, offset, v, 0);
    Ok(())
}

pub fn sthu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ea = calculate_ea_i(f, d.ra, exts16(d.ds) as u64);
    let rs = f.load_gpr(d.rt);
    let v = f.truncate(rs, TypeName::Int16);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn sthx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let v = f.truncate(rs, TypeName::Int16);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    Ok(())
}

pub fn stw(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let b = if d.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(d.ra)
    };
    let offset = f.load_constant_i64(d.d());
    let rs = f.load_gpr(d.rt);
    let v = f.truncate(rs, TypeName::Int32);
    let v = f.byte_swap(v);
    f.store_offset(b, offset, v, 0);
    Ok(())
}

pub fn stwu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ea = calculate_ea_i(f, d.ra, exts16(d.ds) as u64);
    let rs = f.load_gpr(d.rt);
    let v = f.truncate(rs, TypeName::Int32);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    store_ea(f, d.ra, ea);
    Ok(())
}

pub fn stwx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let v = f.truncate(rs, TypeName::Int32);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    Ok(())
}

pub fn std(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let ds = i.ds();
    let b = if ds.ra == 0 {
        f.load_zero(TypeName::Int64)
    } else {
        f.load_gpr(ds.ra)
    };
    let offset = f.load_constant_i64(ds.ds());
    let rs = f.load_gpr(ds.rt);
    let v = f.byte_swap(rs);
    f.store_offset(b, offset, v, 0);
    Ok(())
}

pub fn stdu(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let ds = i.ds();
    let ea = calculate_ea_i(f, ds.ra, ds.ds() as u64);
    let rs = f.load_gpr(ds.rt);
    let v = f.byte_swap(rs);
    f.store(ea, v, 0);
    store_ea(f, ds.ra, ea);
    Ok(())
}

pub fn stdx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let v = f.byte_swap(rs);
    f.store(ea, v, 0);
    Ok(())
}

// Byte-reversed access: the memory image is already in the wanted order, so
// the native-endian load/store needs no swap.

pub fn lhbrx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int16, 0);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn lwbrx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int32, 0);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn sthbrx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let v = f.truncate(rs, TypeName::Int16);
    f.store(ea, v, 0);
    Ok(())
}

pub fn stwbrx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let v = f.truncate(rs, TypeName::Int32);
    f.store(ea, v, 0);
    Ok(())
}

// Reservation family. The load captures the reserved value; the conditional
// store compare-exchanges against it and reports success in CR0.EQ.

pub fn lwarx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // RESERVE <- 1; RESERVE_ADDR <- EA; RT <- zext(MEM(EA, 4))
    let x = i.x();
    f.memory_barrier();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int32, LOAD_ACQUIRE);
    let v = f.byte_swap(v);
    let rt = f.zero_extend(v, TypeName::Int64);
    f.store_reserved(rt);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn ldarx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    f.memory_barrier();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let v = f.load(ea, TypeName::Int64, LOAD_ACQUIRE);
    let rt = f.byte_swap(v);
    f.store_reserved(rt);
    f.store_gpr(x.rt, rt);
    Ok(())
}

pub fn stwcx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // MEM(EA, 4) <- (RS)[32:63] if still reserved
    // CR0[LT GT EQ] <- 0b00 || success
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let rt = f.truncate(rs, TypeName::Int32);
    let rt = f.byte_swap(rt);
    let res = f.load_reserved();
    let res = f.truncate(res, TypeName::Int32);
    let res = f.byte_swap(res);
    let v = f.atomic_compare_exchange(ea, res, rt, STORE_RELEASE);
    f.store_context(regfile::cr_eq(0), v);
    let zero = f.load_zero(TypeName::Int8);
    f.store_context(regfile::cr_lt(0), zero);
    let zero = f.load_zero(TypeName::Int8);
    f.store_context(regfile::cr_gt(0), zero);
    f.memory_barrier();
    Ok(())
}

pub fn stdcx(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let ea = calculate_ea_0(f, x.ra, x.rb);
    let rs = f.load_gpr(x.rt);
    let rt = f.byte_swap(rs);
    let res = f.load_reserved();
    let res = f.byte_swap(res);
    let v = f.atomic_compare_exchange(ea, res, rt, STORE_RELEASE);
    f.store_context(regfile::cr_eq(0), v);
    let zero = f.load_zero(TypeName::Int8);
    f.store_context(regfile::cr_lt(0), zero);
    let zero = f.load_zero(TypeName::Int8);
    f.store_context(regfile::cr_gt(0), zero);
    f.memory_barrier();
    Ok(())
}

// Synchronization

pub fn sync(f: &mut FunctionTranslator<'_>, _i: &InstrData) -> EmitResult {
    f.memory_barrier();
    Ok(())
}

pub fn eieio(f: &mut FunctionTranslator<'_>, _i: &InstrData) -> EmitResult {
    f.memory_barrier();
    Ok(())
}

pub fn isync(f: &mut FunctionTranslator<'_>, _i: &InstrData) -> EmitResult {
    f.nop();
    Ok(())
}

// Floating-point load/store

pub fn lfs(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // FRT <- DOUBLE(MEM(EA, 4))
    let d = i.d();
    let ea = calculate_ea_0_i(f, d.ra, d.d() as u64);
    let v = f.load(ea, TypeName::Int32, 0);
    let v = f.byte_swap(v);
    let v = f.cast(v, TypeName::Float32);
    let rt = f.convert(v, TypeName::Float64);
    f.store_fpr(d.rt, rt);
    Ok(())
}

pub fn lfd(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ea = calculate_ea_0_i(f, d.ra, d.d() as u64);
    let v = f.load(ea, TypeName::Int64, 0);
    let v = f.byte_swap(v);
    let rt = f.cast(v, TypeName::Float64);
    f.store_fpr(d.rt, rt);
    Ok(())
}

pub fn stfs(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // MEM(EA, 4) <- SINGLE(FRS)
    let d = i.d();
    let ea = calculate_ea_0_i(f, d.ra, d.d() as u64);
    let frs = f.load_fpr(d.rt);
    let v = f.convert(frs, TypeName::Float32);
    let v = f.cast(v, TypeName::Int32);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    Ok(())
}

pub fn stfd(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let d = i.d();
    let ea = calculate_ea_0_i(f, d.ra, d.d() as u64);
    let frs = f.load_fpr(d.rt);
    let v = f.cast(frs, TypeName::Int64);
    let v = f.byte_swap(v);
    f.store(ea, v, 0);
    Ok(())
}
