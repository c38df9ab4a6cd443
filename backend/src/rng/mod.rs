//! Deterministic random number generation
//!
//! Uses xorshift64* for draws and SplitMix64 for deriving independent
//! per-batch streams. All stochastic sampling in the engine goes through
//! this module so that a fixed seed reproduces a run exactly.

mod xorshift;

pub use xorshift::RngManager;
