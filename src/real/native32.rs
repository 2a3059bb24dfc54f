//! binary32 operations on the host FPU.
//!
//! Reproducible on any target whose f32 arithmetic is strict IEEE754,
//! which SSE2 and AArch64 both guarantee. Conversions to the 80-bit
//! format are exact, so they share the software path.

use core::cmp::Ordering;

#[cfg(feature = "extended")]
use crate::soft::x80::X80;

pub(super) fn add(a: u32, b: u32) -> u32 {
    (f32::from_bits(a) + f32::from_bits(b)).to_bits()
}

pub(super) fn sub(a: u32, b: u32) -> u32 {
    (f32::from_bits(a) - f32::from_bits(b)).to_bits()
}

pub(super) fn mul(a: u32, b: u32) -> u32 {
    (f32::from_bits(a) * f32::from_bits(b)).to_bits()
}

pub(super) fn div(a: u32, b: u32) -> u32 {
    (f32::from_bits(a) / f32::from_bits(b)).to_bits()
}

pub(super) fn neg(a: u32) -> u32 {
    a ^ 0x8000_0000
}

pub(super) fn compare(a: u32, b: u32) -> Option<Ordering> {
    f32::from_bits(a).partial_cmp(&f32::from_bits(b))
}

pub(super) fn from_i64(v: i64) -> u32 {
    (v as f32).to_bits()
}

pub(super) fn from_u64(v: u64) -> u32 {
    (v as f32).to_bits()
}

pub(super) fn to_i32(a: u32) -> i32 {
    f32::from_bits(a) as i32
}

pub(super) fn to_i64(a: u32) -> i64 {
    f32::from_bits(a) as i64
}

pub(super) fn to_u32(a: u32) -> u32 {
    f32::from_bits(a) as u32
}

pub(super) fn to_u64(a: u32) -> u64 {
    f32::from_bits(a) as u64
}

pub(super) fn to_b64(a: u32) -> u64 {
    (f32::from_bits(a) as f64).to_bits()
}

#[cfg(feature = "extended")]
pub(super) fn to_x80(a: u32) -> X80 {
    crate::soft::b32::to_x80(a)
}
