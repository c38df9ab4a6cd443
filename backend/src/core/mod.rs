//! Core primitives shared by every component
//!
//! - **period**: quarter-coded reporting periods with rollover arithmetic

pub mod period;

pub use period::{Period, PeriodError};
