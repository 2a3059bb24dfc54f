//! The three reproducible value types.
//!
//! [`Simple`], [`Double`] and [`Extended`] wrap the raw bit patterns of the
//! binary32, binary64 and x87 double-extended formats. Holding bits rather
//! than host floats keeps serialization, hashing of wire images and
//! cross-format conversion exact; arithmetic reinterprets the bits on the
//! way through. With a native backend the operators compile to plain
//! hardware arithmetic, under `soft-float` they run the software engine.
//! `Extended` exists only with the `extended` feature and always uses the
//! software engine since Rust has no portable 80-bit primitive.

use core::cmp::Ordering;
use core::fmt;
use core::num::FpCategory;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::fpenv::{FloatFormat, Precision};
#[cfg(feature = "extended")]
use crate::soft::x80;

#[cfg(feature = "extended")]
pub use crate::soft::x80::X80;

#[cfg(feature = "soft-float")]
use crate::soft::{b32 as ops32, b64 as ops64};

#[cfg(not(feature = "soft-float"))]
mod native32;
#[cfg(not(feature = "soft-float"))]
mod native64;
#[cfg(not(feature = "soft-float"))]
use native32 as ops32;
#[cfg(not(feature = "soft-float"))]
use native64 as ops64;

/// binary32 value.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Simple(u32);

/// binary64 value.
#[derive(Clone, Copy, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Double(u64);

/// x87 double-extended value, always evaluated in software.
#[cfg(feature = "extended")]
#[derive(Clone, Copy, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Extended(X80);

#[cfg(feature = "extended")]
impl Default for Extended {
    fn default() -> Self {
        Self::ZERO
    }
}

macro_rules! int_conversions {
    ($ty:ident, [$($int:ident),* $(,)?]) => {
        $(
            impl From<$int> for $ty {
                fn from(v: $int) -> Self {
                    Self::from(v as i64)
                }
            }
        )*
    };
}

macro_rules! binops {
    ($ty:ident, $ops:ident) => {
        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self($ops::add(self.0, rhs.0))
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self($ops::sub(self.0, rhs.0))
            }
        }

        impl Mul for $ty {
            type Output = Self;
            fn mul(self, rhs: Self) -> Self {
                Self($ops::mul(self.0, rhs.0))
            }
        }

        impl Div for $ty {
            type Output = Self;
            fn div(self, rhs: Self) -> Self {
                Self($ops::div(self.0, rhs.0))
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self($ops::neg(self.0))
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl MulAssign for $ty {
            fn mul_assign(&mut self, rhs: Self) {
                *self = *self * rhs;
            }
        }

        impl DivAssign for $ty {
            fn div_assign(&mut self, rhs: Self) {
                *self = *self / rhs;
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $ops::compare(self.0, other.0) == Some(Ordering::Equal)
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                $ops::compare(self.0, other.0)
            }
        }

        impl From<i64> for $ty {
            fn from(v: i64) -> Self {
                Self($ops::from_i64(v))
            }
        }

        impl From<u64> for $ty {
            fn from(v: u64) -> Self {
                Self($ops::from_u64(v))
            }
        }

        // every narrower integer width converts exactly through i64
        int_conversions!($ty, [i8, i16, i32, u8, u16, u32]);

        impl $ty {
            /// Truncating conversion, saturating at the integer range.
            pub fn to_i32(self) -> i32 {
                $ops::to_i32(self.0)
            }

            /// Truncating conversion, saturating at the integer range.
            pub fn to_i64(self) -> i64 {
                $ops::to_i64(self.0)
            }

            /// Truncating conversion, saturating at the integer range.
            pub fn to_u32(self) -> u32 {
                $ops::to_u32(self.0)
            }

            /// Truncating conversion, saturating at the integer range.
            pub fn to_u64(self) -> u64 {
                $ops::to_u64(self.0)
            }
        }
    };
}

binops!(Simple, ops32);
binops!(Double, ops64);
#[cfg(feature = "extended")]
binops!(Extended, x80);

impl Simple {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(0x3F80_0000);
    pub const INFINITY: Self = Self(0x7F80_0000);
    pub const NEG_INFINITY: Self = Self(0xFF80_0000);
    pub const NAN: Self = Self(0x7FC0_0000);
    /// Distance from one to the next representable value.
    pub const EPSILON: Self = Self(0x3400_0000);
    pub const MAX: Self = Self(0x7F7F_FFFF);
    pub const MIN_POSITIVE: Self = Self(0x0080_0000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u32 {
        self.0
    }

    pub fn from_f32(v: f32) -> Self {
        Self(v.to_bits())
    }

    pub fn to_f32(self) -> f32 {
        f32::from_bits(self.0)
    }

    pub fn is_nan(self) -> bool {
        self.0 & 0x7FFF_FFFF > 0x7F80_0000
    }

    pub fn is_infinite(self) -> bool {
        self.0 & 0x7FFF_FFFF == 0x7F80_0000
    }

    pub fn is_finite(self) -> bool {
        self.0 & 0x7F80_0000 != 0x7F80_0000
    }

    pub fn is_sign_negative(self) -> bool {
        self.0 >> 31 != 0
    }

    pub fn is_normal(self) -> bool {
        self.classify() == FpCategory::Normal
    }

    pub fn classify(self) -> FpCategory {
        match (self.0 >> 23 & 0xFF, self.0 & 0x007F_FFFF) {
            (0xFF, 0) => FpCategory::Infinite,
            (0xFF, _) => FpCategory::Nan,
            (0, 0) => FpCategory::Zero,
            (0, _) => FpCategory::Subnormal,
            _ => FpCategory::Normal,
        }
    }
}

impl Double {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(0x3FF0_0000_0000_0000);
    pub const INFINITY: Self = Self(0x7FF0_0000_0000_0000);
    pub const NEG_INFINITY: Self = Self(0xFFF0_0000_0000_0000);
    pub const NAN: Self = Self(0x7FF8_0000_0000_0000);
    pub const EPSILON: Self = Self(0x3CB0_0000_0000_0000);
    pub const MAX: Self = Self(0x7FEF_FFFF_FFFF_FFFF);
    pub const MIN_POSITIVE: Self = Self(0x0010_0000_0000_0000);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u64 {
        self.0
    }

    pub fn from_f64(v: f64) -> Self {
        Self(v.to_bits())
    }

    pub fn to_f64(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// Narrows with a single rounding in the current direction.
    pub fn to_simple(self) -> Simple {
        Simple(ops64::to_b32(self.0))
    }

    pub fn is_nan(self) -> bool {
        self.0 & 0x7FFF_FFFF_FFFF_FFFF > 0x7FF0_0000_0000_0000
    }

    pub fn is_infinite(self) -> bool {
        self.0 & 0x7FFF_FFFF_FFFF_FFFF == 0x7FF0_0000_0000_0000
    }

    pub fn is_finite(self) -> bool {
        self.0 & 0x7FF0_0000_0000_0000 != 0x7FF0_0000_0000_0000
    }

    pub fn is_sign_negative(self) -> bool {
        self.0 >> 63 != 0
    }

    pub fn is_normal(self) -> bool {
        self.classify() == FpCategory::Normal
    }

    pub fn classify(self) -> FpCategory {
        match (self.0 >> 52 & 0x7FF, self.0 & 0x000F_FFFF_FFFF_FFFF) {
            (0x7FF, 0) => FpCategory::Infinite,
            (0x7FF, _) => FpCategory::Nan,
            (0, 0) => FpCategory::Zero,
            (0, _) => FpCategory::Subnormal,
            _ => FpCategory::Normal,
        }
    }
}

#[cfg(feature = "extended")]
impl Extended {
    pub const ZERO: Self = Self(X80::ZERO);
    pub const ONE: Self = Self(X80::ONE);
    pub const INFINITY: Self = Self(X80 {
        se: 0x7FFF,
        sig: 0x8000_0000_0000_0000,
    });
    pub const NEG_INFINITY: Self = Self(X80 {
        se: 0xFFFF,
        sig: 0x8000_0000_0000_0000,
    });
    pub const NAN: Self = Self(X80 {
        se: 0x7FFF,
        sig: 0xC000_0000_0000_0000,
    });
    pub const EPSILON: Self = Self(X80 {
        se: 0x3FC0,
        sig: 0x8000_0000_0000_0000,
    });
    pub const MAX: Self = Self(X80 {
        se: 0x7FFE,
        sig: 0xFFFF_FFFF_FFFF_FFFF,
    });
    pub const MIN_POSITIVE: Self = Self(X80 {
        se: 0x0001,
        sig: 0x8000_0000_0000_0000,
    });

    pub const fn from_bits(bits: X80) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> X80 {
        self.0
    }

    /// Widens exactly.
    pub fn from_f64(v: f64) -> Self {
        Self(ops64::to_x80(v.to_bits()))
    }

    /// Narrows with a single rounding in the current direction.
    pub fn to_f64(self) -> f64 {
        f64::from_bits(x80::to_b64(self.0))
    }

    /// Narrows with a single rounding in the current direction.
    pub fn to_double(self) -> Double {
        Double(x80::to_b64(self.0))
    }

    /// Narrows with a single rounding in the current direction.
    pub fn to_simple(self) -> Simple {
        Simple(x80::to_b32(self.0))
    }

    pub fn is_nan(self) -> bool {
        x80::is_nan(self.0)
    }

    pub fn is_infinite(self) -> bool {
        x80::is_inf(self.0)
    }

    pub fn is_finite(self) -> bool {
        x80::is_finite(self.0)
    }

    pub fn is_sign_negative(self) -> bool {
        self.0.se >> 15 != 0
    }

    pub fn is_normal(self) -> bool {
        self.classify() == FpCategory::Normal
    }

    pub fn classify(self) -> FpCategory {
        if self.is_nan() {
            FpCategory::Nan
        } else if self.is_infinite() {
            FpCategory::Infinite
        } else if self.0.se & 0x7FFF != 0 {
            FpCategory::Normal
        } else if self.0.sig == 0 {
            FpCategory::Zero
        } else {
            FpCategory::Subnormal
        }
    }
}

impl From<Simple> for Double {
    fn from(v: Simple) -> Self {
        Self(ops32::to_b64(v.0))
    }
}

#[cfg(feature = "extended")]
impl From<Simple> for Extended {
    fn from(v: Simple) -> Self {
        Self(ops32::to_x80(v.0))
    }
}

#[cfg(feature = "extended")]
impl From<Double> for Extended {
    fn from(v: Double) -> Self {
        Self(ops64::to_x80(v.0))
    }
}

impl FloatFormat for Simple {
    const PRECISION: Precision = Precision::Single;
}

impl FloatFormat for Double {
    const PRECISION: Precision = Precision::Double;
}

#[cfg(feature = "extended")]
impl FloatFormat for Extended {
    const PRECISION: Precision = Precision::Extended;
}

impl fmt::Display for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f32(), f)
    }
}

impl fmt::Debug for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Simple({})", self.to_f32())
    }
}

impl fmt::Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

impl fmt::Debug for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Double({})", self.to_f64())
    }
}

#[cfg(feature = "extended")]
impl fmt::Display for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // display precision is limited to binary64; the bits stay exact
        fmt::Display::fmt(&f64::from_bits(x80::to_b64(self.0)), f)
    }
}

#[cfg(feature = "extended")]
impl fmt::Debug for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extended({:#06x}, {:#018x})", self.0.se, self.0.sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_signs_compare_equal() {
        let pz = Simple::from_f32(0.0);
        let nz = Simple::from_f32(-0.0);
        assert_eq!(pz, nz);
        assert_ne!(pz.to_bits(), nz.to_bits());
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Simple::NAN, Simple::NAN);
        assert_ne!(Double::NAN, Double::NAN);
        #[cfg(feature = "extended")]
        {
            assert_ne!(Extended::NAN, Extended::NAN);
            assert!(Extended::NAN.is_nan());
        }
    }

    #[test]
    fn test_arithmetic_through_the_facade() {
        let a = Double::from_f64(1.5);
        let b = Double::from_f64(0.25);
        assert_eq!((a + b).to_f64(), 1.75);
        assert_eq!((a - b).to_f64(), 1.25);
        assert_eq!((a * b).to_f64(), 0.375);
        assert_eq!((a / b).to_f64(), 6.0);
        assert_eq!((-a).to_f64(), -1.5);
    }

    #[test]
    fn test_widening_conversions() {
        let s = Simple::from_f32(0.1);
        assert_eq!(Double::from(s).to_f64(), 0.1f32 as f64);
        #[cfg(feature = "extended")]
        {
            assert_eq!(Extended::from(s).to_simple(), s);
            let d = Double::from_f64(1.0 / 3.0);
            assert_eq!(Extended::from(d).to_double(), d);
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(Simple::ZERO.classify(), FpCategory::Zero);
        assert_eq!(Simple::INFINITY.classify(), FpCategory::Infinite);
        assert_eq!(Simple::NAN.classify(), FpCategory::Nan);
        assert_eq!(Simple::ONE.classify(), FpCategory::Normal);
        assert!(Simple::ONE.is_normal());
        let sub = Simple::from_bits(1);
        assert_eq!(sub.classify(), FpCategory::Subnormal);
        assert!(!sub.is_normal());

        assert_eq!(Double::NEG_INFINITY.classify(), FpCategory::Infinite);
        assert_eq!(Double::from_bits(1).classify(), FpCategory::Subnormal);
        #[cfg(feature = "extended")]
        {
            assert_eq!(Extended::ZERO.classify(), FpCategory::Zero);
            assert_eq!(Extended::MIN_POSITIVE.classify(), FpCategory::Normal);
            assert_eq!(Extended::INFINITY.classify(), FpCategory::Infinite);
        }
    }

    #[test]
    fn test_integer_widths_convert_exactly() {
        assert_eq!(Simple::from(-3i8).to_f32(), -3.0);
        assert_eq!(Simple::from(40_000u16).to_f32(), 40_000.0);
        assert_eq!(Double::from(u32::MAX).to_f64(), u32::MAX as f64);
        assert_eq!(Double::from(i64::MIN).to_f64(), i64::MIN as f64);
    }

    #[test]
    fn test_int_conversions_match_casts() {
        for v in [0.0f64, 1.9, -1.9, 2e9, -2e9, 1e19] {
            assert_eq!(Double::from_f64(v).to_i32(), v as i32);
            assert_eq!(Double::from_f64(v).to_i64(), v as i64);
            assert_eq!(Double::from_f64(v).to_u32(), v as u32);
            assert_eq!(Double::from_f64(v).to_u64(), v as u64);
        }
        assert_eq!(Double::NAN.to_i32(), 0);
        assert_eq!(Double::NAN.to_u64(), 0);
    }

    #[test]
    fn test_unsigned_conversions_round_trip_and_saturate() {
        assert_eq!(Double::from(u64::MAX).to_f64(), u64::MAX as f64);
        for v in [0u64, 1, 0xFFFF_FFFF, 1 << 53, u64::MAX & !0x7FF] {
            assert_eq!(Double::from(v).to_u64(), v);
        }
        // 5e9 needs the unsigned path and is exact in f32 (9765625 * 2^9)
        assert_eq!(Simple::from(5_000_000_000u64).to_u64(), 5_000_000_000);
        // negative and oversized values saturate
        assert_eq!(Double::from_f64(-2.5).to_u32(), 0);
        assert_eq!(Double::from_f64(1e20).to_u64(), u64::MAX);
        #[cfg(feature = "extended")]
        {
            assert_eq!(Extended::from(u64::MAX).to_u64(), u64::MAX);
            assert_eq!(Extended::from_f64(-1.0).to_u32(), 0);
        }
    }

    #[test]
    fn test_serialized_form_is_bit_exact() {
        let v = Double::from_f64(-0.0);
        let bytes = bincode::serialize(&v).unwrap();
        let back: Double = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.to_bits(), v.to_bits());

        #[cfg(feature = "extended")]
        {
            let e = Extended::ONE / Extended::from(3i32);
            let bytes = bincode::serialize(&e).unwrap();
            let back: Extended = bincode::deserialize(&bytes).unwrap();
            assert_eq!(back.to_bits(), e.to_bits());
        }
    }
}
