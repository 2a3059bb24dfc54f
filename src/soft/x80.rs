//! x87 double-extended (80-bit) format.
//!
//! The significand is a full 64-bit field with an explicit integer bit, so
//! unlike the interchange formats there is nothing hidden to reconstruct.
//! Pseudo-denormals and unnormals (integer bit inconsistent with the
//! exponent) are accepted on input and normalized away.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{b32, b64, Class, Norm, Value, BINARY32, BINARY64, BINARY80};

/// Raw bit pattern of an 80-bit value: sign and biased exponent packed in
/// `se`, the 64-bit significand in `sig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X80 {
    pub se: u16,
    pub sig: u64,
}

impl X80 {
    pub const ZERO: Self = Self { se: 0, sig: 0 };
    pub const ONE: Self = Self {
        se: 0x3FFF,
        sig: 0x8000_0000_0000_0000,
    };

    /// Little-endian byte image, significand first, matching the x87
    /// memory layout of a 10-byte store.
    pub fn to_le_bytes(self) -> [u8; 10] {
        let mut out = [0u8; 10];
        out[..8].copy_from_slice(&self.sig.to_le_bytes());
        out[8..].copy_from_slice(&self.se.to_le_bytes());
        out
    }

    pub fn from_le_bytes(bytes: [u8; 10]) -> Self {
        let mut sig = [0u8; 8];
        sig.copy_from_slice(&bytes[..8]);
        let mut se = [0u8; 2];
        se.copy_from_slice(&bytes[8..]);
        Self {
            sig: u64::from_le_bytes(sig),
            se: u16::from_le_bytes(se),
        }
    }
}

const FRAC: u64 = 0x7FFF_FFFF_FFFF_FFFF;
const INT_BIT: u64 = 0x8000_0000_0000_0000;
const QUIET: u64 = 0x4000_0000_0000_0000;

pub(crate) fn unpack(x: X80) -> Class {
    let sign = x.se & 0x8000 != 0;
    let biased = (x.se & 0x7FFF) as i32;
    if biased == 0x7FFF {
        return if x.sig & FRAC == 0 {
            Class::Inf { sign }
        } else {
            Class::Nan {
                sign,
                quiet: x.sig & QUIET != 0,
                frac: x.sig & FRAC,
            }
        };
    }
    if x.sig == 0 {
        // includes pseudo-zeros with a nonzero exponent
        return Class::Zero { sign };
    }
    let e = if biased == 0 { 1 } else { biased };
    super::norm_from_u64(sign, x.sig, e - 16383 - 63)
}

pub(crate) fn pack(v: Value) -> X80 {
    match v {
        Value::Zero { sign } => X80 {
            se: (sign as u16) << 15,
            sig: 0,
        },
        Value::Inf { sign } => X80 {
            se: ((sign as u16) << 15) | 0x7FFF,
            sig: INT_BIT,
        },
        Value::Nan { sign, frac } => X80 {
            se: ((sign as u16) << 15) | 0x7FFF,
            sig: INT_BIT | (frac & FRAC),
        },
        Value::Finite { sign, biased, sig } => X80 {
            se: ((sign as u16) << 15) | biased as u16,
            sig,
        },
    }
}

pub(crate) fn add(a: X80, b: X80) -> X80 {
    pack(super::add(unpack(a), unpack(b), &BINARY80))
}

pub(crate) fn sub(a: X80, b: X80) -> X80 {
    pack(super::add(unpack(a), unpack(b).negate(), &BINARY80))
}

pub(crate) fn mul(a: X80, b: X80) -> X80 {
    pack(super::mul(unpack(a), unpack(b), &BINARY80))
}

pub(crate) fn div(a: X80, b: X80) -> X80 {
    pack(super::div(unpack(a), unpack(b), &BINARY80))
}

pub(crate) fn neg(a: X80) -> X80 {
    X80 {
        se: a.se ^ 0x8000,
        sig: a.sig,
    }
}

pub(crate) fn abs(a: X80) -> X80 {
    X80 {
        se: a.se & 0x7FFF,
        sig: a.sig,
    }
}

pub(crate) fn copysign(a: X80, b: X80) -> X80 {
    X80 {
        se: (a.se & 0x7FFF) | (b.se & 0x8000),
        sig: a.sig,
    }
}

pub(crate) fn compare(a: X80, b: X80) -> Option<Ordering> {
    super::compare(unpack(a), unpack(b))
}

pub(crate) fn is_nan(a: X80) -> bool {
    matches!(unpack(a), Class::Nan { .. })
}

pub(crate) fn is_inf(a: X80) -> bool {
    matches!(unpack(a), Class::Inf { .. })
}

pub(crate) fn is_finite(a: X80) -> bool {
    !matches!(unpack(a), Class::Nan { .. } | Class::Inf { .. })
}

pub(crate) fn to_b32(a: X80) -> u32 {
    b32::pack(super::convert(unpack(a), &BINARY80, &BINARY32))
}

pub(crate) fn to_b64(a: X80) -> u64 {
    b64::pack(super::convert(unpack(a), &BINARY80, &BINARY64))
}

pub(crate) fn from_i64(v: i64) -> X80 {
    // every i64 is exactly representable in a 64-bit significand
    pack(super::convert(super::from_i64(v), &BINARY80, &BINARY80))
}

pub(crate) fn to_i32(a: X80) -> i32 {
    super::to_int(unpack(a), i32::MIN as i64, i32::MAX as i64) as i32
}

pub(crate) fn to_i64(a: X80) -> i64 {
    super::to_int(unpack(a), i64::MIN, i64::MAX)
}

pub(crate) fn from_u64(v: u64) -> X80 {
    // every u64 is exactly representable in a 64-bit significand
    pack(super::convert(super::from_u64(v), &BINARY80, &BINARY80))
}

pub(crate) fn to_u32(a: X80) -> u32 {
    super::to_uint(unpack(a), u32::MAX as u64) as u32
}

pub(crate) fn to_u64(a: X80) -> u64 {
    super::to_uint(unpack(a), u64::MAX)
}

pub(crate) fn round_with(a: X80, mode: super::IntRound, raise_inexact: bool) -> X80 {
    pack(super::round_to_int(unpack(a), mode, &BINARY80, raise_inexact))
}

/// `a * 2^n` with a single rounding.
pub(crate) fn scalbn(a: X80, n: i32) -> X80 {
    match unpack(a) {
        Class::Finite(x) => pack(super::convert(
            Class::Finite(Norm {
                exp: x.exp.saturating_add(n.clamp(-40_000, 40_000)),
                ..x
            }),
            &BINARY80,
            &BINARY80,
        )),
        other => pack(super::convert(other, &BINARY80, &BINARY80)),
    }
}

/// Splits into a significand in `[0.5, 1)` and a power of two.
pub(crate) fn frexp(a: X80) -> (X80, i32) {
    match unpack(a) {
        Class::Finite(n) => (
            pack(Value::Finite {
                sign: n.sign,
                biased: 16382,
                sig: n.sig,
            }),
            n.exp + 64,
        ),
        _ => (a, 0),
    }
}

pub(crate) fn ilogb(a: X80) -> i32 {
    match unpack(a) {
        Class::Finite(n) => n.exp + 63,
        Class::Zero { .. } => i32::MIN,
        Class::Inf { .. } => i32::MAX,
        Class::Nan { .. } => i32::MAX,
    }
}

pub(crate) fn logb(a: X80) -> X80 {
    pack(super::logb_value(unpack(a), &BINARY80))
}

/// The next representable value after `a` in the direction of `b`.
pub(crate) fn next_after(a: X80, b: X80) -> X80 {
    let (ca, cb) = (unpack(a), unpack(b));
    if matches!(ca, Class::Nan { .. }) || matches!(cb, Class::Nan { .. }) {
        return pack(super::add(ca, cb, &BINARY80));
    }
    let ord = match super::compare(ca, cb) {
        None | Some(Ordering::Equal) => return b,
        Some(ord) => ord,
    };
    if matches!(ca, Class::Zero { .. }) {
        // smallest subnormal with the sign of the destination
        return X80 {
            se: (matches!(ord, Ordering::Greater) as u16) << 15,
            sig: 1,
        };
    }
    // Biased exponent and fraction concatenate into a magnitude ordering,
    // so stepping is an integer increment. The integer bit is implied by
    // the exponent and reattached afterwards.
    let sign = a.se & 0x8000 != 0;
    let grow = sign == matches!(ord, Ordering::Greater);
    let mag = ((a.se & 0x7FFF) as u128) << 63 | (a.sig & FRAC) as u128;
    let mag = if grow { mag + 1 } else { mag - 1 };
    if mag == 0 {
        return X80 {
            se: (sign as u16) << 15,
            sig: 0,
        };
    }
    let biased = (mag >> 63) as u16;
    let frac = mag as u64 & FRAC;
    X80 {
        se: ((sign as u16) << 15) | biased,
        sig: if biased > 0 { INT_BIT | frac } else { frac },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_f64(v: f64) -> X80 {
        b64::to_x80(v.to_bits())
    }

    fn to_f64(v: X80) -> f64 {
        f64::from_bits(to_b64(v))
    }

    #[test]
    fn test_one_third_is_correctly_rounded() {
        let third = div(from_i64(1), from_i64(3));
        assert_eq!(third.se, 0x3FFD);
        assert_eq!(third.sig, 0xAAAA_AAAA_AAAA_AAAB);
    }

    #[test]
    fn test_exact_arithmetic_roundtrips_through_f64() {
        let cases = [
            (1.5, 2.25),
            (-3.0, 0.125),
            (1048576.0, -0.5),
            (0.0, -0.0),
            (1e300, 0.5),
        ];
        for (x, y) in cases {
            assert_eq!(to_f64(add(from_f64(x), from_f64(y))), x + y);
            assert_eq!(to_f64(sub(from_f64(x), from_f64(y))), x - y);
            assert_eq!(to_f64(mul(from_f64(x), from_f64(y))), x * y);
        }
    }

    #[test]
    fn test_wider_intermediate_than_f64() {
        // 1 + 2^-60 is representable here but collapses to 1 in binary64
        let tiny = scalbn(X80::ONE, -60);
        let sum = add(X80::ONE, tiny);
        assert_eq!(sum.se, 0x3FFF);
        assert_eq!(sum.sig, 0x8000_0000_0000_0008);
        assert_eq!(to_f64(sum), 1.0);
    }

    #[test]
    fn test_subnormal_boundary() {
        // min normal is 2^-16382
        let min_normal = scalbn(X80::ONE, -16382);
        assert_eq!(min_normal.se, 1);
        assert_eq!(min_normal.sig, INT_BIT);
        let sub = scalbn(X80::ONE, -16400);
        assert_eq!(sub.se, 0);
        assert_eq!(sub.sig, 1 << 45);
        assert_eq!(to_f64(sub), 0.0);
    }

    #[test]
    fn test_byte_layout_roundtrip() {
        let v = div(from_i64(-7), from_i64(11));
        assert_eq!(X80::from_le_bytes(v.to_le_bytes()), v);
    }

    #[test]
    fn test_frexp_and_ilogb() {
        let v = from_f64(48.0);
        let (m, e) = frexp(v);
        assert_eq!(e, 6);
        assert_eq!(to_f64(m), 0.75);
        assert_eq!(ilogb(v), 5);
        assert_eq!(ilogb(X80::ZERO), i32::MIN);
    }
}
