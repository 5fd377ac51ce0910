//! Job-application automation core.
//!
//! - [`delay`]: randomized pauses between human-like actions
//! - [`blacklist`]: posting exclusion by company/title fragment
//! - [`form`]: field resolution and the multi-step form state machine
//! - [`recovery`]: failure classification and single-attempt recovery
//! - [`engine`]: session lifecycle and the search/process loop
//! - [`control`]: control-plane facade used by the CLI
//!
//! Everything talks to the browser through the capability traits of
//! `applybot-drivers`, so the whole loop runs against the in-memory fake
//! in tests.
pub mod blacklist;
pub mod control;
pub mod delay;
pub mod engine;
pub mod form;
pub mod recovery;

pub use blacklist::is_blacklisted;
pub use control::Controller;
pub use delay::{DelayBounds, DelaySimulator};
pub use engine::{Engine, EngineSettings, RunEnd, RunReport};
pub use form::{FieldResolver, FormFiller, FormState};
pub use recovery::{classify, Classification, ErrorContext, Recovery, RecoveryActions, RecoveryPolicy};
