//! Deterministic floating-point arithmetic and reproducible randomness.
//!
//! Lockstep simulations need every participant to compute bit-identical
//! results from identical inputs. Native floating point breaks that promise
//! as soon as two machines disagree on x87 versus SSE, on intermediate
//! precision, or on denormal handling. This crate closes the gap:
//!
//! - [`Simple`], [`Double`] and [`Extended`] wrap IEEE754 binary32, binary64
//!   and the 80-bit extended format behind fixed-width bit layouts. On
//!   x86-64 the first two run on the host FPU after [`fpenv::init`] pins its
//!   configuration; with the `soft-float` feature every operation goes
//!   through the software engine instead, and the `extended` work always
//!   does.
//! - [`fpenv`] reads and writes the floating-point environment in hardware
//!   encodings (x87 control/status words and MXCSR), with a portable
//!   fallback that keeps the same observable behavior on other targets.
//! - [`rng`] provides MT19937 and MT19937-64 plus a distribution layer whose
//!   integer ranges and mantissa-bit real draws are pure integer code, so
//!   streams replay identically everywhere.
//!
//! Call [`fpenv::init`] once per thread before any arithmetic; the OS does
//! not guarantee the startup state of the FPU, and threads do not inherit a
//! configured environment.

pub mod fpenv;
mod math;
pub mod real;
pub mod rng;
pub(crate) mod soft;
pub mod words;

pub use fpenv::{Exceptions, FpEnv, Precision, RoundingMode};
#[cfg(feature = "extended")]
pub use real::{Extended, X80};
pub use real::{Double, Simple};
pub use rng::{Draws, Mt19937, Mt19937_64, RandomReal, RandomState, WordSource};
