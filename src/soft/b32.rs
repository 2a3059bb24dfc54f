//! binary32 packing and operation entry points.

// the native backends call only the conversion and exponent helpers
#![cfg_attr(not(feature = "soft-float"), allow(dead_code))]

use core::cmp::Ordering;

#[cfg(feature = "extended")]
use super::{x80, BINARY80};
use super::{b64, Class, Norm, Value, BINARY32, BINARY64};

const SIGN: u32 = 0x8000_0000;
const FRAC: u32 = 0x007F_FFFF;
const QUIET: u32 = 0x0040_0000;
const INF: u32 = 0x7F80_0000;

pub(crate) fn unpack(bits: u32) -> Class {
    let sign = bits & SIGN != 0;
    let biased = (bits >> 23) & 0xFF;
    let frac = bits & FRAC;
    match (biased, frac) {
        (0, 0) => Class::Zero { sign },
        (0, _) => super::norm_from_u64(sign, frac as u64, -149),
        (0xFF, 0) => Class::Inf { sign },
        (0xFF, _) => Class::Nan {
            sign,
            quiet: frac & QUIET != 0,
            frac: frac as u64,
        },
        _ => Class::Finite(Norm {
            sign,
            exp: biased as i32 - (127 + 23 + 40),
            sig: ((frac | 0x0080_0000) as u64) << 40,
        }),
    }
}

pub(crate) fn pack(v: Value) -> u32 {
    match v {
        Value::Zero { sign } => (sign as u32) << 31,
        Value::Inf { sign } => ((sign as u32) << 31) | INF,
        Value::Nan { sign, frac } => ((sign as u32) << 31) | INF | (frac as u32 & FRAC),
        Value::Finite { sign, biased, sig } => {
            ((sign as u32) << 31) | ((biased as u32) << 23) | (sig as u32 & FRAC)
        }
    }
}

pub(crate) fn add(a: u32, b: u32) -> u32 {
    pack(super::add(unpack(a), unpack(b), &BINARY32))
}

pub(crate) fn sub(a: u32, b: u32) -> u32 {
    pack(super::add(unpack(a), unpack(b).negate(), &BINARY32))
}

pub(crate) fn mul(a: u32, b: u32) -> u32 {
    pack(super::mul(unpack(a), unpack(b), &BINARY32))
}

pub(crate) fn div(a: u32, b: u32) -> u32 {
    pack(super::div(unpack(a), unpack(b), &BINARY32))
}

pub(crate) fn neg(a: u32) -> u32 {
    a ^ SIGN
}

pub(crate) fn compare(a: u32, b: u32) -> Option<Ordering> {
    super::compare(unpack(a), unpack(b))
}

pub(crate) fn to_b64(a: u32) -> u64 {
    b64::pack(super::convert(unpack(a), &BINARY32, &BINARY64))
}

#[cfg(feature = "extended")]
pub(crate) fn to_x80(a: u32) -> x80::X80 {
    x80::pack(super::convert(unpack(a), &BINARY32, &BINARY80))
}

pub(crate) fn from_i64(v: i64) -> u32 {
    pack(super::convert(super::from_i64(v), &BINARY32, &BINARY32))
}

pub(crate) fn to_i32(a: u32) -> i32 {
    super::to_int(unpack(a), i32::MIN as i64, i32::MAX as i64) as i32
}

pub(crate) fn ilogb(a: u32) -> i32 {
    super::ilogb_class(unpack(a))
}

pub(crate) fn logb(a: u32) -> u32 {
    pack(super::logb_value(unpack(a), &BINARY32))
}

pub(crate) fn to_i64(a: u32) -> i64 {
    super::to_int(unpack(a), i64::MIN, i64::MAX)
}

pub(crate) fn from_u64(v: u64) -> u32 {
    pack(super::convert(super::from_u64(v), &BINARY32, &BINARY32))
}

pub(crate) fn to_u32(a: u32) -> u32 {
    super::to_uint(unpack(a), u32::MAX as u64) as u32
}

pub(crate) fn to_u64(a: u32) -> u64 {
    super::to_uint(unpack(a), u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(op: impl Fn(f32, f32) -> f32, a: u32, b: u32) -> u32 {
        op(f32::from_bits(a), f32::from_bits(b)).to_bits()
    }

    const CASES: &[u32] = &[
        0x0000_0000, // +0
        0x8000_0000, // -0
        0x3F80_0000, // 1
        0xBF80_0000, // -1
        0x4000_0000, // 2
        0x3EAA_AAAB, // 1/3
        0x0000_0001, // min subnormal
        0x8000_0001,
        0x007F_FFFF, // max subnormal
        0x0080_0000, // min normal
        0x7F7F_FFFF, // max finite
        0xFF7F_FFFF,
        0x7F80_0000, // inf
        0xFF80_0000,
        0x4049_0FDB, // pi
        0x3DCC_CCCD, // 0.1
        0x5F00_0000,
        0xDF00_0000,
        0x0034_5678, // subnormal
        0x7F00_0001,
    ];

    #[test]
    fn test_matches_host_on_fixed_cases() {
        for &a in CASES {
            for &b in CASES {
                assert_eq!(add(a, b), host(|x, y| x + y, a, b), "add {a:#x} {b:#x}");
                assert_eq!(sub(a, b), host(|x, y| x - y, a, b), "sub {a:#x} {b:#x}");
                assert_eq!(mul(a, b), host(|x, y| x * y, a, b), "mul {a:#x} {b:#x}");
                assert_eq!(div(a, b), host(|x, y| x / y, a, b), "div {a:#x} {b:#x}");
            }
        }
    }

    #[test]
    fn test_matches_host_on_random_bit_patterns() {
        let mut rng = fastrand::Rng::with_seed(0x5EED);
        for _ in 0..20_000 {
            let a = rng.u32(..);
            let b = rng.u32(..);
            let fa = f32::from_bits(a);
            let fb = f32::from_bits(b);
            if fa.is_nan() || fb.is_nan() {
                continue;
            }
            for (name, soft, hard) in [
                ("add", add(a, b), (fa + fb).to_bits()),
                ("sub", sub(a, b), (fa - fb).to_bits()),
                ("mul", mul(a, b), (fa * fb).to_bits()),
                ("div", div(a, b), (fa / fb).to_bits()),
            ] {
                assert_eq!(soft, hard, "{name} {a:#010x} {b:#010x}");
            }
        }
    }

    #[test]
    fn test_nan_propagates_quieted() {
        let quiet = 0x7FC0_0001;
        let one = 0x3F80_0000;
        assert_eq!(add(quiet, one), quiet);
        assert_eq!(mul(one, quiet), quiet);
        // signaling payload comes out with the quiet bit set
        let signaling = 0x7F80_0001;
        assert_eq!(add(signaling, one), signaling | 0x0040_0000);
    }

    #[test]
    fn test_invalid_operations_yield_hardware_default_nan() {
        // x86 produces the sign-set quiet NaN for invalid operations
        assert_eq!(div(0x0000_0000, 0x0000_0000), 0xFFC0_0000);
        assert_eq!(sub(0x7F80_0000, 0x7F80_0000), 0xFFC0_0000);
        assert_eq!(mul(0x0000_0000, 0x7F80_0000), 0xFFC0_0000);
        // black_box keeps the compiler from folding the division to the
        // positive canonical NaN
        let hw = std::hint::black_box(0.0f32) / std::hint::black_box(0.0f32);
        assert_eq!(div(0x0000_0000, 0x0000_0000), hw.to_bits());
    }

    #[test]
    fn test_compare_semantics() {
        assert_eq!(compare(0x0000_0000, 0x8000_0000), Some(Ordering::Equal));
        assert_eq!(compare(0xBF80_0000, 0x3F80_0000), Some(Ordering::Less));
        assert_eq!(compare(0x7FC0_0000, 0x3F80_0000), None);
        assert_eq!(compare(0xFF80_0000, 0x7F80_0000), Some(Ordering::Less));
    }

    #[test]
    fn test_int_conversions_saturate() {
        assert_eq!(to_i32(0x4F00_0000), 2_147_483_647); // 2^31
        assert_eq!(to_i32(0xCF00_0000), i32::MIN); // -2^31 is exact
        assert_eq!(to_i32(0x7FC0_0000), 0); // NaN
        assert_eq!(to_i32(0xBFC0_0000), -1); // -1.5 truncates
        assert_eq!(from_i64(16_777_217), 0x4B80_0000); // rounds to 2^24
    }

    #[test]
    fn test_widening_is_exact() {
        for &a in CASES {
            let wide = f64::from_bits(to_b64(a));
            let narrow = f32::from_bits(a);
            if narrow.is_nan() {
                assert!(wide.is_nan());
            } else {
                assert_eq!(wide, narrow as f64);
            }
        }
    }
}
