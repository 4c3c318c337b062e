//! Per-format disassembly handlers.
//!
//! Each handler renders one instruction as `name operands`, selected by the
//! dispatch descriptor. The record-form dot is part of the registered name
//! where it is mandatory (stwcx.) and appended from the Rc bit otherwise.

use std::fmt::Write;

use crate::translator::decoder::InstrData;
use crate::translator::dispatch::InstrType;

/// Render `i` through the descriptor's handler, or just the name when the
/// descriptor carries none.
pub fn disassemble(entry: &InstrType, i: &InstrData, out: &mut String) {
    match entry.disasm {
        Some(handler) => handler(entry, i, out),
        None => out.push_str(entry.name),
    }
}

fn name_rc(entry: &InstrType, rc: bool, out: &mut String) {
    out.push_str(entry.name);
    if rc {
        out.push('.');
    }
    out.push(' ');
}

pub fn d_rt_d_ra(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(out, "{} r{}, {}(r{})", entry.name, d.rt, d.d(), d.ra);
}

pub fn d_frt_d_ra(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(out, "{} f{}, {}(r{})", entry.name, d.rt, d.d(), d.ra);
}

pub fn d_rt_ra_simm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(out, "{} r{}, r{}, {}", entry.name, d.rt, d.ra, d.simm());
}

pub fn d_ra_rt_uimm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(out, "{} r{}, r{}, 0x{:X}", entry.name, d.ra, d.rt, d.uimm());
}

pub fn d_crfd_ra_simm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(out, "{} cr{}, r{}, {}", entry.name, d.crfd(), d.ra, d.simm());
}

pub fn d_crfd_ra_uimm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(
        out,
        "{} cr{}, r{}, 0x{:X}",
        entry.name,
        d.crfd(),
        d.ra,
        d.uimm()
    );
}

pub fn d_to_ra_simm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.d();
    let _ = write!(out, "{} {}, r{}, {}", entry.name, d.to(), d.ra, d.simm());
}

pub fn ds_rt_d_ra(entry: &InstrType, i: &InstrData, out: &mut String) {
    let ds = i.ds();
    let _ = write!(out, "{} r{}, {}(r{})", entry.name, ds.rt, ds.ds(), ds.ra);
}

pub fn x_rt_ra_rb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    let _ = write!(out, "{} r{}, r{}, r{}", entry.name, x.rt, x.ra, x.rb);
}

pub fn x_ra_rt_rb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    name_rc(entry, x.rc, out);
    let _ = write!(out, "r{}, r{}, r{}", x.ra, x.rt, x.rb);
}

pub fn x_ra_rt(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    name_rc(entry, x.rc, out);
    let _ = write!(out, "r{}, r{}", x.ra, x.rt);
}

pub fn x_ra_rt_sh(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    name_rc(entry, x.rc, out);
    let _ = write!(out, "r{}, r{}, {}", x.ra, x.rt, x.sh());
}

pub fn x_crfd_ra_rb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    let _ = write!(out, "{} cr{}, r{}, r{}", entry.name, x.crfd(), x.ra, x.rb);
}

pub fn x_to_ra_rb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    let _ = write!(out, "{} {}, r{}, r{}", entry.name, x.to(), x.ra, x.rb);
}

pub fn x_frt_frb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    name_rc(entry, x.rc, out);
    let _ = write!(out, "f{}, f{}", x.rt, x.rb);
}

pub fn x_rt(entry: &InstrType, i: &InstrData, out: &mut String) {
    let x = i.x();
    let _ = write!(out, "{} r{}", entry.name, x.rt);
}

pub fn x_none(entry: &InstrType, _i: &InstrData, out: &mut String) {
    out.push_str(entry.name);
}

pub fn xo_rt_ra_rb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let xo = i.xo();
    out.push_str(entry.name);
    if xo.oe {
        out.push('o');
    }
    if xo.rc {
        out.push('.');
    }
    let _ = write!(out, " r{}, r{}, r{}", xo.rt, xo.ra, xo.rb);
}

pub fn xo_rt_ra(entry: &InstrType, i: &InstrData, out: &mut String) {
    let xo = i.xo();
    out.push_str(entry.name);
    if xo.oe {
        out.push('o');
    }
    if xo.rc {
        out.push('.');
    }
    let _ = write!(out, " r{}, r{}", xo.rt, xo.ra);
}

pub fn i_target(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.i();
    out.push_str(entry.name);
    if d.lk {
        out.push('l');
    }
    if d.aa {
        out.push('a');
    }
    let _ = write!(out, " 0x{:08X}", d.target(i.address));
}

pub fn b_cond_target(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.b();
    out.push_str(entry.name);
    if d.lk {
        out.push('l');
    }
    if d.aa {
        out.push('a');
    }
    let _ = write!(out, " {}, {}, 0x{:08X}", d.bo, d.bi, d.target(i.address));
}

pub fn xl_bo_bi(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.xl();
    out.push_str(entry.name);
    if d.lk {
        out.push('l');
    }
    let _ = write!(out, " {}, {}", d.bo, d.bi);
}

pub fn xfx_rt_spr(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.xfx();
    let _ = write!(out, "{} r{}, {}", entry.name, d.rt, d.spr());
}

pub fn xfx_spr_rt(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.xfx();
    let _ = write!(out, "{} {}, r{}", entry.name, d.spr(), d.rt);
}

pub fn sc_lev(entry: &InstrType, i: &InstrData, out: &mut String) {
    let d = i.sc();
    let _ = write!(out, "{} {}", entry.name, d.lev);
}

pub fn m_ra_rt_sh_mb_me(entry: &InstrType, i: &InstrData, out: &mut String) {
    let m = i.m();
    name_rc(entry, m.rc, out);
    let _ = write!(out, "r{}, r{}, {}, {}, {}", m.ra, m.rt, m.sh, m.mb, m.me);
}

pub fn a_frt_fra_frb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let a = i.a();
    name_rc(entry, a.rc, out);
    let _ = write!(out, "f{}, f{}, f{}", a.frt, a.fra, a.frb);
}

pub fn a_frt_fra_frc(entry: &InstrType, i: &InstrData, out: &mut String) {
    let a = i.a();
    name_rc(entry, a.rc, out);
    let _ = write!(out, "f{}, f{}, f{}", a.frt, a.fra, a.frc);
}

pub fn a_frt_fra_frc_frb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let a = i.a();
    name_rc(entry, a.rc, out);
    let _ = write!(out, "f{}, f{}, f{}, f{}", a.frt, a.fra, a.frc, a.frb);
}

pub fn vx_vd_va_vb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx();
    let _ = write!(out, "{} vr{}, vr{}, vr{}", entry.name, v.vd, v.va, v.vb);
}

pub fn vx_vd_vb_uimm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx();
    let _ = write!(out, "{} vr{}, vr{}, {}", entry.name, v.vd, v.vb, v.va);
}

pub fn vx_vd_simm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx();
    let simm = if v.va & 0x10 != 0 {
        (v.va | 0xFFFF_FFE0) as i32
    } else {
        v.va as i32
    };
    let _ = write!(out, "{} vr{}, {}", entry.name, v.vd, simm);
}

pub fn vxa_vd_va_vb_vc(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vxa();
    let _ = write!(
        out,
        "{} vr{}, vr{}, vr{}, vr{}",
        entry.name, v.vd, v.va, v.vb, v.vc
    );
}

pub fn vx128_vd_va_vb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx128();
    let _ = write!(out, "{} vr{}, vr{}, vr{}", entry.name, v.vd, v.va, v.vb);
}

pub fn vx128_1_vd_ra0_rb(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx128_1();
    let _ = write!(out, "{} vr{}, r{}, r{}", entry.name, v.vd, v.ra, v.rb);
}

pub fn vx128_2_vd_va_vb_vc(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx128_2();
    let _ = write!(
        out,
        "{} vr{}, vr{}, vr{}, vr{}",
        entry.name, v.vd, v.va, v.vb, v.vc
    );
}

pub fn vx128_3_vd_vb_imm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx128_3();
    let _ = write!(out, "{} vr{}, vr{}, {}", entry.name, v.vd, v.vb, v.imm);
}

pub fn vx128_p_vd_vb_perm(entry: &InstrType, i: &InstrData, out: &mut String) {
    let v = i.vx128_p();
    let _ = write!(out, "{} vr{}, vr{}, 0x{:02X}", entry.name, v.vd, v.vb, v.perm);
}
