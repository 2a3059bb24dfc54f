//! binary64 operations on the host FPU.

use core::cmp::Ordering;

#[cfg(feature = "extended")]
use crate::soft::x80::X80;

pub(super) fn add(a: u64, b: u64) -> u64 {
    (f64::from_bits(a) + f64::from_bits(b)).to_bits()
}

pub(super) fn sub(a: u64, b: u64) -> u64 {
    (f64::from_bits(a) - f64::from_bits(b)).to_bits()
}

pub(super) fn mul(a: u64, b: u64) -> u64 {
    (f64::from_bits(a) * f64::from_bits(b)).to_bits()
}

pub(super) fn div(a: u64, b: u64) -> u64 {
    (f64::from_bits(a) / f64::from_bits(b)).to_bits()
}

pub(super) fn neg(a: u64) -> u64 {
    a ^ 0x8000_0000_0000_0000
}

pub(super) fn compare(a: u64, b: u64) -> Option<Ordering> {
    f64::from_bits(a).partial_cmp(&f64::from_bits(b))
}

pub(super) fn from_i64(v: i64) -> u64 {
    (v as f64).to_bits()
}

pub(super) fn from_u64(v: u64) -> u64 {
    (v as f64).to_bits()
}

pub(super) fn to_i32(a: u64) -> i32 {
    f64::from_bits(a) as i32
}

pub(super) fn to_i64(a: u64) -> i64 {
    f64::from_bits(a) as i64
}

pub(super) fn to_u32(a: u64) -> u32 {
    f64::from_bits(a) as u32
}

pub(super) fn to_u64(a: u64) -> u64 {
    f64::from_bits(a) as u64
}

pub(super) fn to_b32(a: u64) -> u32 {
    (f64::from_bits(a) as f32).to_bits()
}

#[cfg(feature = "extended")]
pub(super) fn to_x80(a: u64) -> X80 {
    crate::soft::b64::to_x80(a)
}
