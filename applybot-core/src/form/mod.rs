//! Multi-step application forms.
//!
//! [`FieldResolver`] decides what goes into a control; [`FormFiller`] walks
//! the displayed steps until the submit control has been activated.
pub mod filler;
pub mod resolver;

pub use filler::{FormFiller, FormState};
pub use resolver::{normalize, FieldResolver};
