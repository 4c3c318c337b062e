//! Floating-point arithmetic and move emitters.
//!
//! All guest FPRs hold doubles; single-precision forms round through f32 at
//! the memory boundary, which the load/store emitters handle.

use crate::translator::decoder::InstrData;
use crate::translator::emit::EmitResult;
use crate::translator::FunctionTranslator;

pub fn fmr(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // FRT <- (FRB)
    let x = i.x();
    let v = f.load_fpr(x.rb);
    f.store_fpr(x.rt, v);
    Ok(())
}

pub fn fneg(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let x = i.x();
    let v = f.load_fpr(x.rb);
    let v = f.neg(v);
    f.store_fpr(x.rt, v);
    Ok(())
}

pub fn fadd(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // FRT <- (FRA) + (FRB)
    let a = i.a();
    let fra = f.load_fpr(a.fra);
    let frb = f.load_fpr(a.frb);
    let v = f.add(fra, frb);
    f.store_fpr(a.frt, v);
    Ok(())
}

pub fn fsub(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let a = i.a();
    let fra = f.load_fpr(a.fra);
    let frb = f.load_fpr(a.frb);
    let v = f.sub(fra, frb);
    f.store_fpr(a.frt, v);
    Ok(())
}

pub fn fmul(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // FRT <- (FRA) * (FRC)
    let a = i.a();
    let fra = f.load_fpr(a.fra);
    let frc = f.load_fpr(a.frc);
    let v = f.mul(fra, frc);
    f.store_fpr(a.frt, v);
    Ok(())
}

pub fn fdiv(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    let a = i.a();
    let fra = f.load_fpr(a.fra);
    let frb = f.load_fpr(a.frb);
    let v = f.div(fra, frb, false);
    f.store_fpr(a.frt, v);
    Ok(())
}

pub fn fmadd(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // FRT <- (FRA) * (FRC) + (FRB)
    let a = i.a();
    let fra = f.load_fpr(a.fra);
    let frc = f.load_fpr(a.frc);
    let frb = f.load_fpr(a.frb);
    let v = f.mul_add(fra, frc, frb);
    f.store_fpr(a.frt, v);
    Ok(())
}

pub fn fmsub(f: &mut FunctionTranslator<'_>, i: &InstrData) -> EmitResult {
    // FRT <- (FRA) * (FRC) - (FRB)
    let a = i.a();
    let fra = f.load_fpr(a.fra);
    let frc = f.load_fpr(a.frc);
    let frb = f.load_fpr(a.frb);
    let frb = f.neg(frb);
    let v = f.mul_add(fra, frc, frb);
    f.store_fpr(a.frt, v);
    Ok(())
}
