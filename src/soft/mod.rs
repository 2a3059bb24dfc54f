//! Software IEEE754 arithmetic.
//!
//! All three interchange formats share one engine: operands are unpacked
//! into a sign, a significand normalized to `[2^63, 2^64)` and a power-of-two
//! exponent, the operation runs in 128-bit integer arithmetic, and a single
//! rounding routine packs the result back for the target format. Exception
//! flags and the rounding direction go through [`crate::fpenv`], so software
//! results honor the same environment the hardware backends do.

use core::cmp::Ordering;

use crate::fpenv::{self, Exceptions, RoundingMode};

pub(crate) mod b32;
pub(crate) mod b64;
#[cfg(feature = "extended")]
pub(crate) mod x80;

/// Extra low-order bits carried through an operation so rounding can see
/// the round and sticky information.
const GUARD: u32 = 8;

/// Static description of an interchange format.
#[derive(Clone, Copy)]
pub(crate) struct Format {
    /// Significand width in bits, counting the leading integer bit.
    pub prec: u32,
    pub bias: i32,
    /// Largest biased exponent of a finite value.
    pub max_biased: i32,
}

pub(crate) const BINARY32: Format = Format {
    prec: 24,
    bias: 127,
    max_biased: 0xFE,
};

pub(crate) const BINARY64: Format = Format {
    prec: 53,
    bias: 1023,
    max_biased: 0x7FE,
};

#[cfg(feature = "extended")]
pub(crate) const BINARY80: Format = Format {
    prec: 64,
    bias: 16383,
    max_biased: 0x7FFE,
};

/// A finite nonzero value `sig * 2^exp` with `sig` in `[2^63, 2^64)`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Norm {
    pub sign: bool,
    pub exp: i32,
    pub sig: u64,
}

/// An unpacked operand.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Class {
    Zero {
        sign: bool,
    },
    Finite(Norm),
    Inf {
        sign: bool,
    },
    /// `frac` is the raw fraction field of the source format; the quiet bit
    /// is its most significant bit.
    Nan {
        sign: bool,
        quiet: bool,
        frac: u64,
    },
}

impl Class {
    fn sign(self) -> bool {
        match self {
            Class::Zero { sign }
            | Class::Inf { sign }
            | Class::Nan { sign, .. } => sign,
            Class::Finite(n) => n.sign,
        }
    }

    /// Flips the sign of a numeric operand. NaNs pass through unchanged so
    /// subtraction preserves their payload and sign.
    pub(crate) fn negate(self) -> Self {
        match self {
            Class::Zero { sign } => Class::Zero { sign: !sign },
            Class::Inf { sign } => Class::Inf { sign: !sign },
            Class::Finite(n) => Class::Finite(Norm { sign: !n.sign, ..n }),
            nan => nan,
        }
    }
}

/// A result ready for packing. `Finite` significands are already rounded
/// to the target precision; `biased == 0` is the subnormal range.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Value {
    Zero { sign: bool },
    Finite { sign: bool, biased: i32, sig: u64 },
    Inf { sign: bool },
    Nan { sign: bool, frac: u64 },
}

fn shift_right_jam(x: u128, n: u32) -> u128 {
    if n == 0 {
        x
    } else if n < 128 {
        (x >> n) | ((x << (128 - n) != 0) as u128)
    } else {
        (x != 0) as u128
    }
}

fn quiet_nan(sign: bool, frac: u64, fmt: &Format) -> Value {
    Value::Nan {
        sign,
        frac: frac | 1 << (fmt.prec - 2),
    }
}

// x86 generates the sign-set quiet NaN for invalid operations; matching it
// keeps the software and native backends bit-identical
fn default_nan(fmt: &Format) -> Value {
    quiet_nan(true, 0, fmt)
}

/// Propagates a NaN operand, quieted, preferring the left one. Signaling
/// NaNs raise INVALID on the way through.
fn nan_result(a: Class, b: Class, fmt: &Format) -> Option<Value> {
    let signaling = matches!(a, Class::Nan { quiet: false, .. })
        || matches!(b, Class::Nan { quiet: false, .. });
    match (a, b) {
        (Class::Nan { sign, frac, .. }, _) | (_, Class::Nan { sign, frac, .. }) => {
            if signaling {
                fpenv::raise(Exceptions::INVALID);
            }
            Some(quiet_nan(sign, frac, fmt))
        }
        _ => None,
    }
}

/// Rounds `sign * r * 2^exp` to `fmt`, raising INEXACT, UNDERFLOW and
/// OVERFLOW as needed. Tininess is detected before rounding.
fn round_finite(sign: bool, mut exp: i32, mut r: u128, fmt: &Format) -> Value {
    debug_assert!(r != 0);
    let mode = fpenv::rounding_mode();
    let desired = (fmt.prec + GUARD - 1) as i32;
    let top = 127 - r.leading_zeros() as i32;
    if top > desired {
        r = shift_right_jam(r, (top - desired) as u32);
        exp += top - desired;
    } else if top < desired {
        r <<= (desired - top) as u32;
        exp -= desired - top;
    }

    let mut biased = exp + desired + fmt.bias;
    let tiny = biased < 1;
    if tiny {
        r = shift_right_jam(r, (1 - biased).min(160) as u32);
        biased = 0;
    }

    let round_bits = r as u32 & ((1 << GUARD) - 1);
    let mut keep = r >> GUARD;
    let inexact = round_bits != 0;
    let half = 1u32 << (GUARD - 1);
    let increment = match mode {
        RoundingMode::Nearest => {
            round_bits > half || (round_bits == half && keep & 1 == 1)
        }
        RoundingMode::TowardZero => false,
        RoundingMode::Up => !sign && inexact,
        RoundingMode::Down => sign && inexact,
    };
    if increment {
        keep += 1;
        if keep == 1u128 << fmt.prec {
            keep >>= 1;
            biased += 1;
        }
        if biased == 0 && keep == 1u128 << (fmt.prec - 1) {
            // rounded up out of the subnormal range
            biased = 1;
        }
    }

    if biased > fmt.max_biased {
        fpenv::raise(Exceptions::OVERFLOW | Exceptions::INEXACT);
        let max_finite = Value::Finite {
            sign,
            biased: fmt.max_biased,
            sig: ((1u128 << fmt.prec) - 1) as u64,
        };
        return match mode {
            RoundingMode::Nearest => Value::Inf { sign },
            RoundingMode::TowardZero => max_finite,
            RoundingMode::Up if sign => max_finite,
            RoundingMode::Up => Value::Inf { sign },
            RoundingMode::Down if sign => Value::Inf { sign },
            RoundingMode::Down => max_finite,
        };
    }

    if inexact {
        let mut flags = Exceptions::INEXACT;
        if tiny {
            flags |= Exceptions::UNDERFLOW;
        }
        fpenv::raise(flags);
    }
    Value::Finite {
        sign,
        biased,
        sig: keep as u64,
    }
}

/// Repacks a value that is already representable in `fmt`.
fn repack(n: Norm, fmt: &Format) -> Value {
    round_finite(n.sign, n.exp, n.sig as u128, fmt)
}

/// Builds a normalized finite class from an integer significand.
pub(crate) fn norm_from_u64(sign: bool, sig: u64, exp: i32) -> Class {
    debug_assert!(sig != 0);
    let lz = sig.leading_zeros();
    Class::Finite(Norm {
        sign,
        exp: exp - lz as i32,
        sig: sig << lz,
    })
}

pub(crate) fn from_i64(v: i64) -> Class {
    if v == 0 {
        Class::Zero { sign: false }
    } else {
        norm_from_u64(v < 0, v.unsigned_abs(), 0)
    }
}

pub(crate) fn from_u64(v: u64) -> Class {
    if v == 0 {
        Class::Zero { sign: false }
    } else {
        norm_from_u64(false, v, 0)
    }
}

pub(crate) fn add(a: Class, b: Class, fmt: &Format) -> Value {
    if let Some(v) = nan_result(a, b, fmt) {
        return v;
    }
    match (a, b) {
        (Class::Inf { sign: sa }, Class::Inf { sign: sb }) => {
            if sa == sb {
                Value::Inf { sign: sa }
            } else {
                fpenv::raise(Exceptions::INVALID);
                default_nan(fmt)
            }
        }
        (Class::Inf { sign }, _) | (_, Class::Inf { sign }) => Value::Inf { sign },
        (Class::Zero { sign: sa }, Class::Zero { sign: sb }) => {
            if sa == sb {
                Value::Zero { sign: sa }
            } else {
                Value::Zero {
                    sign: fpenv::rounding_mode() == RoundingMode::Down,
                }
            }
        }
        (Class::Zero { .. }, Class::Finite(n)) | (Class::Finite(n), Class::Zero { .. }) => {
            repack(n, fmt)
        }
        (Class::Finite(x), Class::Finite(y)) => add_norms(x, y, fmt),
        _ => unreachable!("NaN operands handled above"),
    }
}

fn add_norms(x: Norm, y: Norm, fmt: &Format) -> Value {
    let (hi, lo) = if (x.exp, x.sig) >= (y.exp, y.sig) {
        (x, y)
    } else {
        (y, x)
    };
    let d = (hi.exp - lo.exp) as u32;
    let hi_r = (hi.sig as u128) << GUARD;
    let lo_r = shift_right_jam((lo.sig as u128) << GUARD, d);
    let exp = hi.exp - GUARD as i32;
    if x.sign == y.sign {
        round_finite(hi.sign, exp, hi_r + lo_r, fmt)
    } else if hi_r == lo_r {
        Value::Zero {
            sign: fpenv::rounding_mode() == RoundingMode::Down,
        }
    } else {
        round_finite(hi.sign, exp, hi_r - lo_r, fmt)
    }
}

pub(crate) fn mul(a: Class, b: Class, fmt: &Format) -> Value {
    if let Some(v) = nan_result(a, b, fmt) {
        return v;
    }
    let sign = a.sign() ^ b.sign();
    match (a, b) {
        (Class::Inf { .. }, Class::Zero { .. }) | (Class::Zero { .. }, Class::Inf { .. }) => {
            fpenv::raise(Exceptions::INVALID);
            default_nan(fmt)
        }
        (Class::Inf { .. }, _) | (_, Class::Inf { .. }) => Value::Inf { sign },
        (Class::Zero { .. }, _) | (_, Class::Zero { .. }) => Value::Zero { sign },
        (Class::Finite(x), Class::Finite(y)) => round_finite(
            sign,
            x.exp + y.exp,
            x.sig as u128 * y.sig as u128,
            fmt,
        ),
        _ => unreachable!("NaN operands handled above"),
    }
}

pub(crate) fn div(a: Class, b: Class, fmt: &Format) -> Value {
    if let Some(v) = nan_result(a, b, fmt) {
        return v;
    }
    let sign = a.sign() ^ b.sign();
    match (a, b) {
        (Class::Inf { .. }, Class::Inf { .. }) | (Class::Zero { .. }, Class::Zero { .. }) => {
            fpenv::raise(Exceptions::INVALID);
            default_nan(fmt)
        }
        (Class::Inf { .. }, _) => Value::Inf { sign },
        (_, Class::Inf { .. }) => Value::Zero { sign },
        (Class::Zero { .. }, _) => Value::Zero { sign },
        (_, Class::Zero { .. }) => {
            fpenv::raise(Exceptions::DIV_BY_ZERO);
            Value::Inf { sign }
        }
        (Class::Finite(x), Class::Finite(y)) => div_norms(sign, x, y, fmt),
        _ => unreachable!("NaN operands handled above"),
    }
}

fn div_norms(sign: bool, x: Norm, y: Norm, fmt: &Format) -> Value {
    // Restoring division, one quotient bit per step. The invariant
    // rem < 2 * divisor holds because both significands are normalized.
    let divisor = y.sig as u128;
    let mut rem = x.sig as u128;
    let mut q: u128 = 0;
    for _ in 0..67 {
        q <<= 1;
        if rem >= divisor {
            rem -= divisor;
            q |= 1;
        }
        rem <<= 1;
    }
    let sticky = (rem != 0) as u128;
    round_finite(sign, x.exp - y.exp - 67, (q << 1) | sticky, fmt)
}

/// IEEE comparison: `None` for unordered. Zeros compare equal regardless
/// of sign; a signaling NaN operand raises INVALID.
pub(crate) fn compare(a: Class, b: Class) -> Option<Ordering> {
    if matches!(a, Class::Nan { .. }) || matches!(b, Class::Nan { .. }) {
        let signaling = matches!(a, Class::Nan { quiet: false, .. })
            || matches!(b, Class::Nan { quiet: false, .. });
        if signaling {
            fpenv::raise(Exceptions::INVALID);
        }
        return None;
    }
    let (za, zb) = (
        matches!(a, Class::Zero { .. }),
        matches!(b, Class::Zero { .. }),
    );
    if za && zb {
        return Some(Ordering::Equal);
    }
    if za {
        return Some(if b.sign() {
            Ordering::Greater
        } else {
            Ordering::Less
        });
    }
    if zb {
        return Some(if a.sign() {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    if a.sign() != b.sign() {
        return Some(if a.sign() {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    let magnitude = match (a, b) {
        (Class::Inf { .. }, Class::Inf { .. }) => Ordering::Equal,
        (Class::Inf { .. }, _) => Ordering::Greater,
        (_, Class::Inf { .. }) => Ordering::Less,
        (Class::Finite(x), Class::Finite(y)) => (x.exp, x.sig).cmp(&(y.exp, y.sig)),
        _ => unreachable!("zeros and NaNs handled above"),
    };
    Some(if a.sign() { magnitude.reverse() } else { magnitude })
}

/// Truncating conversion to an integer in `[min, max]`, saturating with
/// INVALID on NaN and out-of-range values, raising INEXACT when fraction
/// bits are discarded.
pub(crate) fn to_int(c: Class, min: i64, max: i64) -> i64 {
    let n = match c {
        Class::Nan { .. } => {
            fpenv::raise(Exceptions::INVALID);
            return 0;
        }
        Class::Inf { sign } => {
            fpenv::raise(Exceptions::INVALID);
            return if sign { min } else { max };
        }
        Class::Zero { .. } => return 0,
        Class::Finite(n) => n,
    };
    let (mag, inexact): (u128, bool) = if n.exp >= 0 {
        if n.exp > 63 {
            (u128::MAX, false)
        } else {
            ((n.sig as u128) << n.exp, false)
        }
    } else {
        let s = (-n.exp) as u32;
        if s > 63 {
            (0, true)
        } else {
            ((n.sig >> s) as u128, n.sig & ((1 << s) - 1) != 0)
        }
    };
    let limit = if n.sign {
        (min as i128).unsigned_abs() as u128
    } else {
        max as u128
    };
    if mag > limit {
        fpenv::raise(Exceptions::INVALID);
        return if n.sign { min } else { max };
    }
    if inexact {
        fpenv::raise(Exceptions::INEXACT);
    }
    if n.sign {
        (mag as i128).wrapping_neg() as i64
    } else {
        mag as i64
    }
}

/// Truncating conversion to an unsigned integer in `[0, max]`, saturating
/// with INVALID on NaN, negative values and overflow, raising INEXACT when
/// fraction bits are discarded.
pub(crate) fn to_uint(c: Class, max: u64) -> u64 {
    let n = match c {
        Class::Nan { .. } => {
            fpenv::raise(Exceptions::INVALID);
            return 0;
        }
        Class::Inf { sign } => {
            fpenv::raise(Exceptions::INVALID);
            return if sign { 0 } else { max };
        }
        Class::Zero { .. } => return 0,
        Class::Finite(n) => n,
    };
    let (mag, inexact): (u128, bool) = if n.exp >= 0 {
        if n.exp > 63 {
            (u128::MAX, false)
        } else {
            ((n.sig as u128) << n.exp, false)
        }
    } else {
        let s = (-n.exp) as u32;
        if s > 63 {
            (0, true)
        } else {
            ((n.sig >> s) as u128, n.sig & ((1 << s) - 1) != 0)
        }
    };
    if n.sign && mag != 0 {
        fpenv::raise(Exceptions::INVALID);
        return 0;
    }
    if mag > max as u128 {
        fpenv::raise(Exceptions::INVALID);
        return max;
    }
    if inexact {
        fpenv::raise(Exceptions::INEXACT);
    }
    mag as u64
}

/// Converts between interchange formats, re-rounding as needed and
/// shifting NaN payloads to the destination fraction width.
pub(crate) fn convert(c: Class, from: &Format, to: &Format) -> Value {
    match c {
        Class::Zero { sign } => Value::Zero { sign },
        Class::Inf { sign } => Value::Inf { sign },
        Class::Nan { sign, quiet, frac } => {
            if !quiet {
                fpenv::raise(Exceptions::INVALID);
            }
            let frac = if to.prec >= from.prec {
                frac << (to.prec - from.prec)
            } else {
                frac >> (from.prec - to.prec)
            };
            quiet_nan(sign, frac, to)
        }
        Class::Finite(n) => repack(n, to),
    }
}

/// Integral rounding direction. Distinct from [`RoundingMode`] because the
/// C `round` family needs ties-away-from-zero, which the environment never
/// selects.
#[cfg(feature = "extended")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IntRound {
    NearestEven,
    NearestAway,
    Trunc,
    Up,
    Down,
}

#[cfg(feature = "extended")]
impl IntRound {
    pub(crate) fn ambient() -> Self {
        match fpenv::rounding_mode() {
            RoundingMode::Nearest => IntRound::NearestEven,
            RoundingMode::TowardZero => IntRound::Trunc,
            RoundingMode::Up => IntRound::Up,
            RoundingMode::Down => IntRound::Down,
        }
    }
}

/// Exponent of the leading significand bit, as `ilogb` reports it.
pub(crate) fn ilogb_class(c: Class) -> i32 {
    match c {
        Class::Finite(n) => n.exp + 63,
        Class::Zero { .. } => i32::MIN,
        Class::Inf { .. } | Class::Nan { .. } => i32::MAX,
    }
}

/// `logb` as a value in the same format.
pub(crate) fn logb_value(c: Class, fmt: &Format) -> Value {
    match c {
        Class::Finite(n) => convert(from_i64((n.exp + 63) as i64), fmt, fmt),
        Class::Zero { .. } => {
            fpenv::raise(Exceptions::DIV_BY_ZERO);
            Value::Inf { sign: true }
        }
        Class::Inf { .. } => Value::Inf { sign: false },
        nan => convert(nan, fmt, fmt),
    }
}

/// Rounds to an integral value in the same format. `mode` is explicit so
/// the truncating and directed variants work under any ambient rounding
/// direction.
#[cfg(feature = "extended")]
pub(crate) fn round_to_int(
    c: Class,
    mode: IntRound,
    fmt: &Format,
    raise_inexact: bool,
) -> Value {
    let n = match c {
        Class::Nan { sign, quiet, frac } => {
            if !quiet {
                fpenv::raise(Exceptions::INVALID);
            }
            return quiet_nan(sign, frac, fmt);
        }
        Class::Inf { sign } => return Value::Inf { sign },
        Class::Zero { sign } => return Value::Zero { sign },
        Class::Finite(n) => n,
    };
    if n.exp >= 0 {
        return repack(n, fmt);
    }
    let s = (-n.exp) as u32;
    let mag: u64 = if s > 63 {
        // magnitude below one; it is exactly one half when s == 64 and
        // only the top significand bit is set
        let up = match mode {
            IntRound::NearestEven => s == 64 && n.sig > 1 << 63,
            IntRound::NearestAway => s == 64,
            IntRound::Trunc => false,
            IntRound::Up => !n.sign,
            IntRound::Down => n.sign,
        };
        up as u64
    } else {
        let int = n.sig >> s;
        let frac = n.sig & ((1 << s) - 1);
        let half = 1u64 << (s - 1);
        let up = match mode {
            IntRound::NearestEven => frac > half || (frac == half && int & 1 == 1),
            IntRound::NearestAway => frac >= half,
            IntRound::Trunc => false,
            IntRound::Up => !n.sign && frac != 0,
            IntRound::Down => n.sign && frac != 0,
        };
        if frac == 0 {
            return repack(n, fmt);
        }
        int + up as u64
    };
    if raise_inexact {
        fpenv::raise(Exceptions::INEXACT);
    }
    if mag == 0 {
        Value::Zero { sign: n.sign }
    } else {
        match norm_from_u64(n.sign, mag, 0) {
            Class::Finite(i) => repack(i, fmt),
            _ => unreachable!(),
        }
    }
}
