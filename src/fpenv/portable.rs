//! Software floating-point environment.
//!
//! Serves two roles: the full backend on targets without direct control
//! register access, and the flag store for the software arithmetic engine
//! on every target. State is per-thread, like the hardware registers it
//! stands in for. Saved environments use the x87/MXCSR bit encodings so an
//! [`FpEnv`] means the same thing on every backend.

// Only the flag store is referenced when a hardware backend is active.
#![allow(dead_code)]

use core::cell::Cell;

use super::{Exceptions, FpEnv, Precision, RoundingMode};

thread_local! {
    static ROUNDING: Cell<u8> = const { Cell::new(0) };
    static TRAPS: Cell<u8> = const { Cell::new(0) };
    static RAISED: Cell<u8> = const { Cell::new(0) };
    static PC_BITS: Cell<u16> = const { Cell::new(0x0300) };
}

#[cfg(feature = "no-denormals")]
const MXCSR_FLUSH: u32 = 0x8040;
#[cfg(not(feature = "no-denormals"))]
const MXCSR_FLUSH: u32 = 0;

pub(super) fn configure(precision: Precision) {
    ROUNDING.with(|c| c.set(RoundingMode::Nearest as u8));
    TRAPS.with(|c| c.set(0));
    PC_BITS.with(|c| c.set(precision.pc_bits()));
}

pub(super) fn set_rounding(mode: RoundingMode) {
    ROUNDING.with(|c| c.set(mode as u8));
}

pub(super) fn rounding_mode() -> RoundingMode {
    RoundingMode::from_rc(ROUNDING.with(Cell::get))
}

pub(super) fn enable_traps(ex: Exceptions) {
    TRAPS.with(|c| c.set(c.get() | ex.bits()));
}

pub(super) fn disable_traps(ex: Exceptions) {
    TRAPS.with(|c| c.set(c.get() & !ex.bits()));
}

pub(super) fn enabled_traps() -> Exceptions {
    Exceptions::from_bits(TRAPS.with(Cell::get))
}

pub(super) fn record(ex: Exceptions) {
    RAISED.with(|c| c.set(c.get() | ex.bits()));
}

pub(super) fn raised() -> Exceptions {
    Exceptions::from_bits(RAISED.with(Cell::get))
}

pub(super) fn set_raised(ex: Exceptions) {
    RAISED.with(|c| c.set(ex.bits()));
}

pub(super) fn clear(ex: Exceptions) {
    RAISED.with(|c| c.set(c.get() & !ex.bits()));
}

pub(super) fn save() -> FpEnv {
    let traps = TRAPS.with(Cell::get);
    let rc = ROUNDING.with(Cell::get) as u16;
    let cw = (!traps as u16 & 0x3F) | PC_BITS.with(Cell::get) | (rc << 10);
    let mxcsr =
        ((!traps as u32 & 0x3F) << 7) | ((rc as u32) << 13) | RAISED.with(Cell::get) as u32 | MXCSR_FLUSH;
    FpEnv {
        cw,
        status: RAISED.with(Cell::get) as u16,
        mxcsr,
    }
}

pub(super) fn restore(env: &FpEnv) {
    TRAPS.with(|c| c.set(!(env.cw as u8) & 0x3F));
    ROUNDING.with(|c| c.set((env.cw >> 10) as u8 & 3));
    PC_BITS.with(|c| c.set(env.cw & 0x0300));
    RAISED.with(|c| c.set(env.status as u8 & 0x3F));
}
