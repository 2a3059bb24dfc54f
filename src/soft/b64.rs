//! binary64 packing and operation entry points.

// the native backends call only the conversion and exponent helpers
#![cfg_attr(not(feature = "soft-float"), allow(dead_code))]

use core::cmp::Ordering;

#[cfg(feature = "extended")]
use super::{x80, BINARY80};
use super::{b32, Class, Norm, Value, BINARY32, BINARY64};

const SIGN: u64 = 0x8000_0000_0000_0000;
const FRAC: u64 = 0x000F_FFFF_FFFF_FFFF;
const QUIET: u64 = 0x0008_0000_0000_0000;
const INF: u64 = 0x7FF0_0000_0000_0000;

pub(crate) fn unpack(bits: u64) -> Class {
    let sign = bits & SIGN != 0;
    let biased = (bits >> 52) & 0x7FF;
    let frac = bits & FRAC;
    match (biased, frac) {
        (0, 0) => Class::Zero { sign },
        (0, _) => super::norm_from_u64(sign, frac, -1074),
        (0x7FF, 0) => Class::Inf { sign },
        (0x7FF, _) => Class::Nan {
            sign,
            quiet: frac & QUIET != 0,
            frac,
        },
        _ => Class::Finite(Norm {
            sign,
            exp: biased as i32 - (1023 + 52 + 11),
            sig: (frac | 0x0010_0000_0000_0000) << 11,
        }),
    }
}

pub(crate) fn pack(v: Value) -> u64 {
    match v {
        Value::Zero { sign } => (sign as u64) << 63,
        Value::Inf { sign } => ((sign as u64) << 63) | INF,
        Value::Nan { sign, frac } => ((sign as u64) << 63) | INF | (frac & FRAC),
        Value::Finite { sign, biased, sig } => {
            ((sign as u64) << 63) | ((biased as u64) << 52) | (sig & FRAC)
        }
    }
}

pub(crate) fn add(a: u64, b: u64) -> u64 {
    pack(super::add(unpack(a), unpack(b), &BINARY64))
}

pub(crate) fn sub(a: u64, b: u64) -> u64 {
    pack(super::add(unpack(a), unpack(b).negate(), &BINARY64))
}

pub(crate) fn mul(a: u64, b: u64) -> u64 {
    pack(super::mul(unpack(a), unpack(b), &BINARY64))
}

pub(crate) fn div(a: u64, b: u64) -> u64 {
    pack(super::div(unpack(a), unpack(b), &BINARY64))
}

pub(crate) fn neg(a: u64) -> u64 {
    a ^ SIGN
}

pub(crate) fn compare(a: u64, b: u64) -> Option<Ordering> {
    super::compare(unpack(a), unpack(b))
}

pub(crate) fn to_b32(a: u64) -> u32 {
    b32::pack(super::convert(unpack(a), &BINARY64, &BINARY32))
}

#[cfg(feature = "extended")]
pub(crate) fn to_x80(a: u64) -> x80::X80 {
    x80::pack(super::convert(unpack(a), &BINARY64, &BINARY80))
}

pub(crate) fn from_i64(v: i64) -> u64 {
    pack(super::convert(super::from_i64(v), &BINARY64, &BINARY64))
}

pub(crate) fn to_i32(a: u64) -> i32 {
    super::to_int(unpack(a), i32::MIN as i64, i32::MAX as i64) as i32
}

pub(crate) fn ilogb(a: u64) -> i32 {
    super::ilogb_class(unpack(a))
}

pub(crate) fn logb(a: u64) -> u64 {
    pack(super::logb_value(unpack(a), &BINARY64))
}

pub(crate) fn to_i64(a: u64) -> i64 {
    super::to_int(unpack(a), i64::MIN, i64::MAX)
}

pub(crate) fn from_u64(v: u64) -> u64 {
    pack(super::convert(super::from_u64(v), &BINARY64, &BINARY64))
}

pub(crate) fn to_u32(a: u64) -> u32 {
    super::to_uint(unpack(a), u32::MAX as u64) as u32
}

pub(crate) fn to_u64(a: u64) -> u64 {
    super::to_uint(unpack(a), u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_host_on_random_bit_patterns() {
        let mut rng = fastrand::Rng::with_seed(0xD0B1E);
        for _ in 0..20_000 {
            let a = rng.u64(..);
            let b = rng.u64(..);
            let fa = f64::from_bits(a);
            let fb = f64::from_bits(b);
            if fa.is_nan() || fb.is_nan() {
                continue;
            }
            for (name, soft, hard) in [
                ("add", add(a, b), (fa + fb).to_bits()),
                ("sub", sub(a, b), (fa - fb).to_bits()),
                ("mul", mul(a, b), (fa * fb).to_bits()),
                ("div", div(a, b), (fa / fb).to_bits()),
            ] {
                assert_eq!(soft, hard, "{name} {a:#018x} {b:#018x}");
            }
        }
    }

    #[test]
    fn test_matches_host_near_extremes() {
        // raw uniform bit patterns rarely land near the subnormal and
        // overflow boundaries, so aim some there
        let mut rng = fastrand::Rng::with_seed(0xB0B);
        for _ in 0..20_000 {
            let exp_a = rng.u64(0..4) * 0x7FC + rng.u64(0..8);
            let exp_b = rng.u64(0..4) * 0x7FC + rng.u64(0..8);
            let a = (rng.u64(..) & !INF) | ((exp_a & 0x7FF) << 52);
            let b = (rng.u64(..) & !INF) | ((exp_b & 0x7FF) << 52);
            let fa = f64::from_bits(a);
            let fb = f64::from_bits(b);
            if fa.is_nan() || fb.is_nan() {
                continue;
            }
            for (name, soft, hard) in [
                ("add", add(a, b), (fa + fb).to_bits()),
                ("sub", sub(a, b), (fa - fb).to_bits()),
                ("mul", mul(a, b), (fa * fb).to_bits()),
                ("div", div(a, b), (fa / fb).to_bits()),
            ] {
                assert_eq!(soft, hard, "{name} {a:#018x} {b:#018x}");
            }
        }
    }

    #[test]
    fn test_invalid_operations_yield_hardware_default_nan() {
        let zero = 0u64;
        assert_eq!(div(zero, zero), 0xFFF8_0000_0000_0000);
        assert_eq!(sub(INF, INF), 0xFFF8_0000_0000_0000);
        // black_box keeps the compiler from folding the division to the
        // positive canonical NaN
        let host = std::hint::black_box(0.0f64) / std::hint::black_box(0.0f64);
        assert_eq!(div(zero, zero), host.to_bits());
    }

    #[test]
    fn test_narrowing_rounds() {
        let third = 1.0f64 / 3.0;
        assert_eq!(to_b32(third.to_bits()), (third as f32).to_bits());
        assert_eq!(to_b32((1e300f64).to_bits()), f32::INFINITY.to_bits());
        assert_eq!(to_b32((1e-300f64).to_bits()), 0);
        assert_eq!(to_b32((-1e-310f64).to_bits()), 0x8000_0000);
    }

    #[test]
    fn test_int_roundtrip() {
        for v in [0i64, 1, -1, 42, -360, i32::MAX as i64, i32::MIN as i64] {
            assert_eq!(to_i64(from_i64(v)), v);
        }
        assert_eq!(to_i64((9.75f64).to_bits()), 9);
        assert_eq!(to_i64((-9.75f64).to_bits()), -9);
        assert_eq!(to_i64(f64::INFINITY.to_bits()), i64::MAX);
    }

    #[test]
    fn test_unsigned_conversions() {
        for v in [0u64, 1, 42, u32::MAX as u64, 1 << 53] {
            assert_eq!(to_u64(from_u64(v)), v);
            assert_eq!(from_u64(v), (v as f64).to_bits());
        }
        assert_eq!(to_u32((4294967295.0f64).to_bits()), u32::MAX);
        assert_eq!(to_u32((4294967296.0f64).to_bits()), u32::MAX); // saturates
        assert_eq!(to_u64((-1.0f64).to_bits()), 0); // negative saturates
        assert_eq!(to_u64((0.75f64).to_bits()), 0); // truncates
        assert_eq!(to_u64(f64::INFINITY.to_bits()), u64::MAX);
    }
}
