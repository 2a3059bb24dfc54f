//! Elementary math functions.
//!
//! Transcendental functions must come from one implementation for results
//! to match across machines; the system libm differs between platforms and
//! even between versions of the same platform. Everything here delegates
//! to the pinned pure-Rust `libm` crate, so a given crate version produces
//! identical bit patterns everywhere. `Extended` has no 64-bit-significand
//! libm, so its transcendentals evaluate through `Double`: the operand is
//! rounded to binary64, the function runs at binary64 precision and widens
//! back. Exponent and rounding manipulations (`floor`, `frexp`, `logb`,
//! `next_after`, ...) work directly on the 80-bit representation and are
//! exact.

#[cfg(feature = "extended")]
use crate::real::Extended;
use crate::real::{Double, Simple};
#[cfg(feature = "extended")]
use crate::soft::{x80, IntRound};
use crate::soft::{b32, b64};

macro_rules! forward_unary {
    ($ty:ident, $to:ident, $from:ident, [$(($m:ident, $f:path)),* $(,)?]) => {
        impl $ty {
            $(
                pub fn $m(self) -> Self {
                    Self::$from($f(self.$to()))
                }
            )*
        }
    };
}

macro_rules! forward_binary {
    ($ty:ident, $to:ident, $from:ident, [$(($m:ident, $f:path)),* $(,)?]) => {
        impl $ty {
            $(
                pub fn $m(self, rhs: Self) -> Self {
                    Self::$from($f(self.$to(), rhs.$to()))
                }
            )*
        }
    };
}

forward_unary!(Simple, to_f32, from_f32, [
    (sqrt, libm::sqrtf),
    (cbrt, libm::cbrtf),
    (exp, libm::expf),
    (exp2, libm::exp2f),
    (exp_m1, libm::expm1f),
    (ln, libm::logf),
    (ln_1p, libm::log1pf),
    (log2, libm::log2f),
    (log10, libm::log10f),
    (sin, libm::sinf),
    (cos, libm::cosf),
    (tan, libm::tanf),
    (asin, libm::asinf),
    (acos, libm::acosf),
    (atan, libm::atanf),
    (sinh, libm::sinhf),
    (cosh, libm::coshf),
    (tanh, libm::tanhf),
    (asinh, libm::asinhf),
    (acosh, libm::acoshf),
    (atanh, libm::atanhf),
    (erf, libm::erff),
    (erfc, libm::erfcf),
    (j0, libm::j0f),
    (j1, libm::j1f),
    (y0, libm::y0f),
    (y1, libm::y1f),
    (floor, libm::floorf),
    (ceil, libm::ceilf),
    (trunc, libm::truncf),
    (round, libm::roundf),
    (rint, libm::rintf),
    (nearby_int, libm::rintf),
    (abs, libm::fabsf),
]);

forward_binary!(Simple, to_f32, from_f32, [
    (pow, libm::powf),
    (atan2, libm::atan2f),
    (hypot, libm::hypotf),
    (fmod, libm::fmodf),
    (remainder, libm::remainderf),
    (fdim, libm::fdimf),
    (max, libm::fmaxf),
    (min, libm::fminf),
    (copysign, libm::copysignf),
    (next_after, libm::nextafterf),
]);

forward_unary!(Double, to_f64, from_f64, [
    (sqrt, libm::sqrt),
    (cbrt, libm::cbrt),
    (exp, libm::exp),
    (exp2, libm::exp2),
    (exp_m1, libm::expm1),
    (ln, libm::log),
    (ln_1p, libm::log1p),
    (log2, libm::log2),
    (log10, libm::log10),
    (sin, libm::sin),
    (cos, libm::cos),
    (tan, libm::tan),
    (asin, libm::asin),
    (acos, libm::acos),
    (atan, libm::atan),
    (sinh, libm::sinh),
    (cosh, libm::cosh),
    (tanh, libm::tanh),
    (asinh, libm::asinh),
    (acosh, libm::acosh),
    (atanh, libm::atanh),
    (erf, libm::erf),
    (erfc, libm::erfc),
    (j0, libm::j0),
    (j1, libm::j1),
    (y0, libm::y0),
    (y1, libm::y1),
    (floor, libm::floor),
    (ceil, libm::ceil),
    (trunc, libm::trunc),
    (round, libm::round),
    (rint, libm::rint),
    (nearby_int, libm::rint),
    (abs, libm::fabs),
]);

forward_binary!(Double, to_f64, from_f64, [
    (pow, libm::pow),
    (atan2, libm::atan2),
    (hypot, libm::hypot),
    (fmod, libm::fmod),
    (remainder, libm::remainder),
    (fdim, libm::fdim),
    (max, libm::fmax),
    (min, libm::fmin),
    (copysign, libm::copysign),
    (next_after, libm::nextafter),
]);

impl Simple {
    pub fn mul_add(self, a: Self, b: Self) -> Self {
        Self::from_f32(libm::fmaf(self.to_f32(), a.to_f32(), b.to_f32()))
    }

    /// Remainder and the low bits of the quotient, as `remquo`.
    pub fn remquo(self, rhs: Self) -> (Self, i32) {
        let (r, q) = libm::remquof(self.to_f32(), rhs.to_f32());
        (Self::from_f32(r), q)
    }

    /// Significand in `[0.5, 1)` and the power of two that scales it back.
    pub fn frexp(self) -> (Self, i32) {
        let (m, e) = libm::frexpf(self.to_f32());
        (Self::from_f32(m), e)
    }

    pub fn scalbn(self, n: i32) -> Self {
        Self::from_f32(libm::scalbnf(self.to_f32(), n))
    }

    pub fn ldexp(self, n: i32) -> Self {
        self.scalbn(n)
    }

    pub fn scalbln(self, n: i64) -> Self {
        self.scalbn(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    pub fn ilogb(self) -> i32 {
        b32::ilogb(self.to_bits())
    }

    pub fn logb(self) -> Self {
        Self::from_bits(b32::logb(self.to_bits()))
    }

    /// Bessel function of the first kind of order `n`.
    pub fn jn(self, n: i32) -> Self {
        Self::from_f32(libm::jnf(n, self.to_f32()))
    }

    /// Bessel function of the second kind of order `n`.
    pub fn yn(self, n: i32) -> Self {
        Self::from_f32(libm::ynf(n, self.to_f32()))
    }
}

impl Double {
    pub fn mul_add(self, a: Self, b: Self) -> Self {
        Self::from_f64(libm::fma(self.to_f64(), a.to_f64(), b.to_f64()))
    }

    pub fn remquo(self, rhs: Self) -> (Self, i32) {
        let (r, q) = libm::remquo(self.to_f64(), rhs.to_f64());
        (Self::from_f64(r), q)
    }

    pub fn frexp(self) -> (Self, i32) {
        let (m, e) = libm::frexp(self.to_f64());
        (Self::from_f64(m), e)
    }

    pub fn scalbn(self, n: i32) -> Self {
        Self::from_f64(libm::scalbn(self.to_f64(), n))
    }

    pub fn ldexp(self, n: i32) -> Self {
        self.scalbn(n)
    }

    pub fn scalbln(self, n: i64) -> Self {
        self.scalbn(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    pub fn ilogb(self) -> i32 {
        b64::ilogb(self.to_bits())
    }

    pub fn logb(self) -> Self {
        Self::from_bits(b64::logb(self.to_bits()))
    }

    /// Bessel function of the first kind of order `n`.
    pub fn jn(self, n: i32) -> Self {
        Self::from_f64(libm::jn(n, self.to_f64()))
    }

    /// Bessel function of the second kind of order `n`.
    pub fn yn(self, n: i32) -> Self {
        Self::from_f64(libm::yn(n, self.to_f64()))
    }
}

#[cfg(feature = "extended")]
macro_rules! extended_via_double {
    (unary: [$($m:ident),* $(,)?], binary: [$($m2:ident),* $(,)?]) => {
        impl Extended {
            $(
                pub fn $m(self) -> Self {
                    Self::from(self.to_double().$m())
                }
            )*
            $(
                pub fn $m2(self, rhs: Self) -> Self {
                    Self::from(self.to_double().$m2(rhs.to_double()))
                }
            )*
        }
    };
}

#[cfg(feature = "extended")]
extended_via_double!(
    unary: [
        sqrt, cbrt, exp, exp2, exp_m1, ln, ln_1p, log2, log10,
        sin, cos, tan, asin, acos, atan, sinh, cosh, tanh,
        asinh, acosh, atanh, erf, erfc, j0, j1, y0, y1,
    ],
    binary: [pow, atan2, hypot, fmod, remainder]
);

#[cfg(feature = "extended")]
impl Extended {
    pub fn abs(self) -> Self {
        Self::from_bits(x80::abs(self.to_bits()))
    }

    pub fn copysign(self, sign: Self) -> Self {
        Self::from_bits(x80::copysign(self.to_bits(), sign.to_bits()))
    }

    pub fn floor(self) -> Self {
        Self::from_bits(x80::round_with(self.to_bits(), IntRound::Down, false))
    }

    pub fn ceil(self) -> Self {
        Self::from_bits(x80::round_with(self.to_bits(), IntRound::Up, false))
    }

    pub fn trunc(self) -> Self {
        Self::from_bits(x80::round_with(self.to_bits(), IntRound::Trunc, false))
    }

    /// Nearest integral value, ties away from zero.
    pub fn round(self) -> Self {
        Self::from_bits(x80::round_with(
            self.to_bits(),
            IntRound::NearestAway,
            false,
        ))
    }

    /// Integral value in the current rounding direction, raising INEXACT
    /// when the value changes.
    pub fn rint(self) -> Self {
        Self::from_bits(x80::round_with(self.to_bits(), IntRound::ambient(), true))
    }

    /// Integral value in the current rounding direction, without INEXACT.
    pub fn nearby_int(self) -> Self {
        Self::from_bits(x80::round_with(self.to_bits(), IntRound::ambient(), false))
    }

    /// Bessel function of the first kind of order `n`.
    pub fn jn(self, n: i32) -> Self {
        Self::from(self.to_double().jn(n))
    }

    /// Bessel function of the second kind of order `n`.
    pub fn yn(self, n: i32) -> Self {
        Self::from(self.to_double().yn(n))
    }

    pub fn max(self, rhs: Self) -> Self {
        if self.is_nan() {
            return rhs;
        }
        if rhs.is_nan() || rhs < self {
            self
        } else {
            rhs
        }
    }

    pub fn min(self, rhs: Self) -> Self {
        if self.is_nan() {
            return rhs;
        }
        if rhs.is_nan() || self < rhs {
            self
        } else {
            rhs
        }
    }

    pub fn fdim(self, rhs: Self) -> Self {
        if self > rhs || self.is_nan() || rhs.is_nan() {
            self - rhs
        } else {
            Self::ZERO
        }
    }

    pub fn mul_add(self, a: Self, b: Self) -> Self {
        Self::from(self.to_double().mul_add(a.to_double(), b.to_double()))
    }

    pub fn remquo(self, rhs: Self) -> (Self, i32) {
        let (r, q) = self.to_double().remquo(rhs.to_double());
        (Self::from(r), q)
    }

    pub fn frexp(self) -> (Self, i32) {
        let (m, e) = x80::frexp(self.to_bits());
        (Self::from_bits(m), e)
    }

    pub fn scalbn(self, n: i32) -> Self {
        Self::from_bits(x80::scalbn(self.to_bits(), n))
    }

    pub fn ldexp(self, n: i32) -> Self {
        self.scalbn(n)
    }

    pub fn scalbln(self, n: i64) -> Self {
        self.scalbn(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    pub fn ilogb(self) -> i32 {
        x80::ilogb(self.to_bits())
    }

    pub fn logb(self) -> Self {
        Self::from_bits(x80::logb(self.to_bits()))
    }

    pub fn next_after(self, toward: Self) -> Self {
        Self::from_bits(x80::next_after(self.to_bits(), toward.to_bits()))
    }
}
