//! `fantoccini`-backed implementation of the capability traits.
pub mod cadence;
pub mod driver;
pub mod page;
