//! x86_64 control register backend.
//!
//! Keeps the x87 control word and MXCSR in agreement so the configuration
//! holds no matter which unit the compiler picks for a given expression.
//! The `native-x87` feature selects which register is treated as the
//! authority when the two are read back.

use core::arch::asm;
use core::arch::x86_64::{_mm_getcsr, _mm_setcsr};

use super::{Exceptions, FpEnv, Precision, RoundingMode};

const CW_MASK_ALL: u16 = 0x003F;
const CW_PC: u16 = 0x0300;
const CW_RC: u16 = 0x0C00;

const MXCSR_FLAGS: u32 = 0x003F;
const MXCSR_MASK_ALL: u32 = 0x1F80;
const MXCSR_RC: u32 = 0x6000;
const MXCSR_FLUSH: u32 = 0x8040;

/// x87 environment image as stored by `fnstenv` in 32-bit protected mode.
#[repr(C)]
#[derive(Clone, Copy)]
struct X87Env {
    control: u32,
    status: u32,
    tag: u32,
    ip: u32,
    cs: u32,
    operand: u32,
    ds: u32,
}

fn read_cw() -> u16 {
    let mut cw: u16 = 0;
    unsafe {
        asm!("fnstcw [{0}]", in(reg) &mut cw, options(nostack, preserves_flags));
    }
    cw
}

fn write_cw(cw: u16) {
    unsafe {
        asm!("fldcw [{0}]", in(reg) &cw, options(nostack, preserves_flags));
    }
}

fn read_sw() -> u16 {
    let sw: u16;
    unsafe {
        asm!("fnstsw ax", out("ax") sw, options(nostack, preserves_flags));
    }
    sw
}

fn read_env() -> X87Env {
    let mut env = X87Env {
        control: 0,
        status: 0,
        tag: 0,
        ip: 0,
        cs: 0,
        operand: 0,
        ds: 0,
    };
    unsafe {
        // fnstenv masks all exceptions as a side effect; reload the saved
        // control word to undo that.
        asm!(
            "fnstenv [{0}]",
            "fldcw [{0}]",
            in(reg) &mut env,
            options(nostack, preserves_flags),
        );
    }
    env
}

fn write_env(env: &X87Env) {
    unsafe {
        asm!("fldenv [{0}]", in(reg) env, options(nostack, preserves_flags));
    }
}

fn read_mxcsr() -> u32 {
    unsafe { _mm_getcsr() }
}

fn write_mxcsr(csr: u32) {
    unsafe { _mm_setcsr(csr) }
}

pub(super) fn configure(precision: Precision) {
    let flush = if cfg!(feature = "no-denormals") {
        MXCSR_FLUSH
    } else {
        0
    };
    unsafe {
        asm!("fnclex", options(nostack, preserves_flags));
    }
    let cw = (read_cw() & !(CW_PC | CW_RC)) | CW_MASK_ALL | precision.pc_bits();
    write_cw(cw);
    let csr = (read_mxcsr() & !(MXCSR_RC | MXCSR_FLUSH | MXCSR_FLAGS)) | MXCSR_MASK_ALL | flush;
    write_mxcsr(csr);
}

pub(super) fn set_rounding(mode: RoundingMode) {
    let rc = mode as u16;
    write_cw((read_cw() & !CW_RC) | (rc << 10));
    write_mxcsr((read_mxcsr() & !MXCSR_RC) | ((rc as u32) << 13));
}

pub(super) fn rounding_mode() -> RoundingMode {
    if cfg!(feature = "native-x87") {
        RoundingMode::from_rc((read_cw() >> 10) as u8)
    } else {
        RoundingMode::from_rc((read_mxcsr() >> 13) as u8)
    }
}

pub(super) fn enable_traps(ex: Exceptions) {
    write_cw(read_cw() & !(ex.bits() as u16));
    write_mxcsr(read_mxcsr() & !((ex.bits() as u32) << 7));
}

pub(super) fn disable_traps(ex: Exceptions) {
    write_cw(read_cw() | ex.bits() as u16);
    write_mxcsr(read_mxcsr() | ((ex.bits() as u32) << 7));
}

pub(super) fn enabled_traps() -> Exceptions {
    let masked = if cfg!(feature = "native-x87") {
        read_cw() as u8
    } else {
        (read_mxcsr() >> 7) as u8
    };
    !Exceptions::from_bits(masked)
}

pub(super) fn raised() -> Exceptions {
    Exceptions::from_bits(read_sw() as u8 | (read_mxcsr() & MXCSR_FLAGS) as u8)
}

pub(super) fn clear(ex: Exceptions) {
    if ex == Exceptions::ALL {
        unsafe {
            asm!("fnclex", options(nostack, preserves_flags));
        }
    } else {
        let mut env = read_env();
        env.status &= !(ex.bits() as u32);
        write_env(&env);
    }
    write_mxcsr(read_mxcsr() & !(ex.bits() as u32));
}

pub(super) fn save() -> FpEnv {
    FpEnv {
        cw: read_cw(),
        status: read_sw() & 0x3F,
        mxcsr: read_mxcsr(),
    }
}

pub(super) fn restore(env: &FpEnv) {
    let mut x87 = read_env();
    x87.control = env.cw as u32;
    x87.status = (x87.status & !0x3F) | env.status as u32;
    write_env(&x87);
    write_mxcsr(env.mxcsr);
}
