//! Exact-width integer plumbing shared by the RNG and the software float engine.
//!
//! The generator state, rejection-sampling masks and IEEE754 bit patterns all
//! need integers of a known, portable width. Rust's fixed-width types already
//! guarantee that, so the resolver is a pair of traits: a width with no impl
//! simply does not compile.

use core::ops::{BitAnd, BitOr, Shl, Shr};

/// An unsigned word of exact bit width.
pub trait Word:
    Copy
    + Eq
    + Ord
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const BITS: u32;
    const ZERO: Self;
    const ONE: Self;
    const MAX: Self;

    /// Truncating construction from a 64-bit draw.
    fn from_u64(w: u64) -> Self;
    fn to_u64(self) -> u64;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;

    /// Smear the leading set bit downward, producing the smallest
    /// all-ones mask covering `self`.
    fn smear(self) -> Self {
        let mut mask = self;
        let mut shift = 1;
        while shift < Self::BITS {
            mask = mask | (mask >> shift);
            shift <<= 1;
        }
        mask
    }
}

macro_rules! impl_word {
    ($($t:ty),*) => {$(
        impl Word for $t {
            const BITS: u32 = <$t>::BITS;
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MAX: Self = <$t>::MAX;

            #[inline]
            fn from_u64(w: u64) -> Self {
                w as $t
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
        }
    )*};
}

impl_word!(u8, u16, u32, u64);

/// An integer usable as a random-range endpoint.
///
/// Range sizes are always computed in the unsigned domain with wrapping
/// subtraction, so signed ranges like `(i32::MIN, i32::MAX)` work without
/// relying on signed overflow anywhere.
pub trait RangeInt: Copy {
    type Unsigned: Word;

    /// Bit-preserving reinterpretation into the unsigned domain.
    fn to_unsigned(self) -> Self::Unsigned;
    fn from_unsigned(u: Self::Unsigned) -> Self;
}

macro_rules! impl_range_int {
    ($($t:ty => $u:ty),*) => {$(
        impl RangeInt for $t {
            type Unsigned = $u;

            #[inline]
            fn to_unsigned(self) -> $u {
                self as $u
            }

            #[inline]
            fn from_unsigned(u: $u) -> Self {
                u as $t
            }
        }
    )*};
}

impl_range_int!(
    u8 => u8, u16 => u16, u32 => u32, u64 => u64,
    i8 => u8, i16 => u16, i32 => u32, i64 => u64
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smear_covers_value() {
        assert_eq!(0u32.smear(), 0);
        assert_eq!(1u32.smear(), 1);
        assert_eq!(5u32.smear(), 7);
        assert_eq!(0x80u8.smear(), 0xFF);
        assert_eq!(0x1234u16.smear(), 0x1FFF);
        assert_eq!(u64::MAX.smear(), u64::MAX);
    }

    #[test]
    fn test_signed_range_is_unsigned_width() {
        // The full i32 range must map onto the full u32 range without overflow.
        let span = i32::MAX.to_unsigned().wrapping_sub(i32::MIN.to_unsigned());
        assert_eq!(span, u32::MAX);
        assert_eq!(i32::from_unsigned(i32::MIN.to_unsigned()), i32::MIN);
    }
}
