//! Driver layer for browser automation.
//!
//! The core never talks to a browser directly; it depends on the narrow
//! capability traits in [`capability`]. This crate provides those traits,
//! a WebDriver implementation of them, and local profile discovery.
//!
//! - [`capability`]: [`BrowserDriver`], [`BrowserSession`], [`Page`], [`Element`]
//! - [`browser::driver::FantocciniDriver`]: WebDriver client wrapper
//! - [`browser::page`]: page/element adapters over `fantoccini`
//! - [`browser::cadence::TypingCadence`]: per-keystroke jitter for typed text
//! - [`profiles`]: Chrome profile discovery
//! - `fake` (feature `fake`): scripted in-memory DOM for tests
pub mod browser;
pub mod capability;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod profiles;

pub use capability::{BrowserDriver, BrowserSession, Element, Page, WaitUntil};
pub use error::{DriverError, DriverResult};
