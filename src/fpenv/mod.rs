//! Floating-point environment control.
//!
//! Rounding direction, trap masks and raised exception flags are process
//! state that every participant in a lockstep session must agree on. This
//! module owns that state: on x86_64 with a native backend it drives the
//! x87 control word and MXCSR directly, everywhere else it keeps a
//! per-thread software environment. The software arithmetic engine reports
//! its exception flags here as well, so `raised()` is the single place to
//! ask what happened regardless of backend.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(all(target_arch = "x86_64", not(feature = "soft-float")))]
mod hw;
mod portable;

#[cfg(all(target_arch = "x86_64", not(feature = "soft-float")))]
use hw as backend;
#[cfg(not(all(target_arch = "x86_64", not(feature = "soft-float"))))]
use portable as backend;

/// Exception status and trap-mask flags, one bit per condition.
///
/// The bit layout matches the low six bits of the x87 status word and of
/// MXCSR, so backend code can move values around without translation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Exceptions(u8);

impl Exceptions {
    pub const NONE: Self = Self(0);
    pub const INVALID: Self = Self(0x01);
    pub const DENORMAL: Self = Self(0x02);
    pub const DIV_BY_ZERO: Self = Self(0x04);
    pub const OVERFLOW: Self = Self(0x08);
    pub const UNDERFLOW: Self = Self(0x10);
    pub const INEXACT: Self = Self(0x20);
    pub const ALL: Self = Self(0x3F);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Exceptions {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Exceptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Exceptions {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Exceptions {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl fmt::Debug for Exceptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 6] = [
            (0x01, "INVALID"),
            (0x02, "DENORMAL"),
            (0x04, "DIV_BY_ZERO"),
            (0x08, "OVERFLOW"),
            (0x10, "UNDERFLOW"),
            (0x20, "INEXACT"),
        ];
        if self.0 == 0 {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (bit, name) in NAMES {
            if self.0 & bit != 0 {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// IEEE754 rounding direction.
///
/// Discriminants are the x87 RC field values; MXCSR uses the same encoding
/// three bits higher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RoundingMode {
    Nearest = 0,
    Down = 1,
    Up = 2,
    TowardZero = 3,
}

impl RoundingMode {
    pub(crate) fn from_rc(rc: u8) -> Self {
        match rc & 3 {
            0 => Self::Nearest,
            1 => Self::Down,
            2 => Self::Up,
            _ => Self::TowardZero,
        }
    }
}

/// Internal significand precision of the x87 unit.
///
/// `Single` and `Double` make every x87 operation round its result to 24 or
/// 53 bits, which is what makes x87 arithmetic agree with SSE arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Single,
    Double,
    Extended,
}

impl Precision {
    /// PC field value for the x87 control word.
    pub(crate) fn pc_bits(self) -> u16 {
        match self {
            Precision::Single => 0x0000,
            Precision::Double => 0x0200,
            Precision::Extended => 0x0300,
        }
    }
}

/// A saved floating-point environment.
///
/// The control word and MXCSR images are kept in their hardware encodings
/// even on the portable backend, so snapshots serialize identically on
/// every platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpEnv {
    pub(crate) cw: u16,
    pub(crate) status: u16,
    pub(crate) mxcsr: u32,
}

/// Ties a value type to the internal precision it needs.
pub trait FloatFormat {
    const PRECISION: Precision;
}

/// Puts the environment into the reproducible configuration for `F`:
/// round to nearest, all traps masked, internal precision fixed to the
/// width of `F`.
///
/// Every participant in a deterministic session calls this once at startup
/// and after any library call that may clobber the control registers.
pub fn init<F: FloatFormat>() {
    init_precision(F::PRECISION);
}

/// Non-generic form of [`init`].
pub fn init_precision(precision: Precision) {
    backend::configure(precision);
    portable::clear(Exceptions::ALL);
    debug!(?precision, "floating-point environment initialized");
}

/// Sets the rounding direction for subsequent operations.
pub fn set_rounding(mode: RoundingMode) {
    backend::set_rounding(mode);
}

/// Currently configured rounding direction.
pub fn rounding_mode() -> RoundingMode {
    backend::rounding_mode()
}

/// Unmasks the given exceptions so that raising one of them aborts the
/// computation instead of producing a default result. On native backends
/// this arms hardware traps; the software engine panics instead.
pub fn enable_traps(ex: Exceptions) {
    backend::enable_traps(ex);
}

/// Masks the given exceptions again.
pub fn disable_traps(ex: Exceptions) {
    backend::disable_traps(ex);
}

/// The set of currently unmasked exceptions.
pub fn enabled_traps() -> Exceptions {
    backend::enabled_traps()
}

/// Exception flags accumulated since the last [`clear`].
pub fn raised() -> Exceptions {
    backend::raised() | portable::raised()
}

/// Clears the given accumulated exception flags.
pub fn clear(ex: Exceptions) {
    backend::clear(ex);
    portable::clear(ex);
}

/// Records exception flags, honoring the trap configuration.
///
/// This is how the software engine reports exceptions; it is public so
/// user code layered on top of it can do the same.
pub fn raise(ex: Exceptions) {
    portable::record(ex);
    let armed = enabled_traps() & ex;
    if !armed.is_empty() {
        panic!("floating-point exception trapped: {:?}", armed);
    }
}

/// Saves the current environment.
///
/// Status flags recorded through [`raise`] live in the software store even
/// on hardware backends; the snapshot carries the union of both.
pub fn save() -> FpEnv {
    let mut env = backend::save();
    env.status |= portable::raised().bits() as u16;
    env
}

/// Restores a previously saved environment, including its status flags.
pub fn restore(env: &FpEnv) {
    backend::restore(env);
    portable::set_raised(Exceptions::from_bits(env.status as u8));
}

/// Saves the environment, then masks all traps and clears all status
/// flags, so a region of code can run without trapping.
pub fn hold() -> FpEnv {
    let env = save();
    disable_traps(Exceptions::ALL);
    clear(Exceptions::ALL);
    env
}

/// Restores `env` but keeps any exception flags raised since [`hold`].
pub fn update(env: &FpEnv) {
    let pending = raised();
    restore(env);
    raise(pending);
}

/// The environment as first observed by this process, captured lazily.
pub fn default_env() -> FpEnv {
    use std::sync::OnceLock;
    static DEFAULT: OnceLock<FpEnv> = OnceLock::new();
    *DEFAULT.get_or_init(save)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_roundtrip() {
        let saved = save();
        for mode in [
            RoundingMode::Down,
            RoundingMode::Up,
            RoundingMode::TowardZero,
            RoundingMode::Nearest,
        ] {
            set_rounding(mode);
            assert_eq!(rounding_mode(), mode);
        }
        restore(&saved);
    }

    #[test]
    fn test_raise_accumulates_and_clears() {
        let saved = hold();
        raise(Exceptions::INEXACT);
        raise(Exceptions::UNDERFLOW);
        assert!(raised().contains(Exceptions::INEXACT | Exceptions::UNDERFLOW));
        clear(Exceptions::INEXACT);
        assert!(!raised().contains(Exceptions::INEXACT));
        assert!(raised().contains(Exceptions::UNDERFLOW));
        restore(&saved);
    }

    #[test]
    fn test_software_flags_survive_snapshot() {
        let outer = hold();

        // flags recorded through raise() live in the software store; the
        // snapshot must carry them on every backend
        raise(Exceptions::UNDERFLOW);
        let env = save();
        clear(Exceptions::ALL);
        assert!(raised().is_empty());
        restore(&env);
        assert!(raised().contains(Exceptions::UNDERFLOW));

        clear(Exceptions::ALL);
        raise(Exceptions::INEXACT);
        let held = hold();
        raise(Exceptions::INVALID);
        update(&held);
        assert!(raised().contains(Exceptions::INEXACT | Exceptions::INVALID));

        restore(&outer);
    }

    #[test]
    #[should_panic(expected = "floating-point exception trapped")]
    fn test_unmasked_exception_panics() {
        let _saved = hold();
        enable_traps(Exceptions::DIV_BY_ZERO);
        raise(Exceptions::DIV_BY_ZERO);
    }

    #[test]
    fn test_exceptions_debug_names() {
        let ex = Exceptions::INVALID | Exceptions::INEXACT;
        assert_eq!(format!("{:?}", ex), "INVALID|INEXACT");
        assert_eq!(format!("{:?}", Exceptions::NONE), "NONE");
    }
}
