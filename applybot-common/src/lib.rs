//! Common types shared across the applybot crates.
//!
//! This crate defines the session configuration model, the error taxonomy,
//! the log sink that fans engine events out to subscribers, and the tracing
//! initialisation used by binaries and tests. Every other crate depends on
//! it, so it stays free of browser and runtime specifics.
//!
//! # Overview
//!
//! - [`SessionConfig`]: everything a run needs, as submitted by the control plane
//! - [`ValidatedConfig`]: the same data once the required sections are checked
//! - [`ApplyError`] and [`Result`]: shared error handling
//! - [`log`]: the [`LogSink`] observer interface and [`LogEvent`]
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`site`]: search URL and CSS selectors of the job board
//!
//! # Examples
//!
//! Validating a minimal configuration:
//!
//! ```rust
//! use applybot_common::{ApplicantProfile, JobPreferences, SessionConfig};
//!
//! let cfg = SessionConfig {
//!     personal_info: Some(ApplicantProfile {
//!         full_name: "Jane Doe".into(),
//!         ..ApplicantProfile::default()
//!     }),
//!     job_preferences: Some(JobPreferences {
//!         job_titles: vec!["Rust Engineer".into()],
//!         locations: vec![],
//!     }),
//!     ..SessionConfig::default()
//! };
//! let validated = cfg.validate().unwrap();
//! assert_eq!(validated.preferences.search_query(), Some("Rust Engineer"));
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod log;
pub mod observability;
pub mod site;

pub use log::{LogEvent, LogLevel, LogSink, LogSubscriber, SubscriptionId};
pub use site::SiteSelectors;

/// Value supplied to a form control.
///
/// Text goes to typed inputs and selects; a flag only ever activates a
/// checkbox when it is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }
}

/// Personal details typed into application forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    #[serde(default, alias = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    /// Extra answers keyed by normalized (lower-case) field name.
    #[serde(default)]
    pub answers: BTreeMap<String, FieldValue>,
}

impl ApplicantProfile {
    /// First whitespace-delimited token of the full name.
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("")
    }

    /// Remaining tokens of the full name joined by a single space.
    pub fn last_name(&self) -> String {
        self.full_name
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What to search for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPreferences {
    #[serde(default, alias = "jobTitles")]
    pub job_titles: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

impl JobPreferences {
    /// The query typed into the search control.
    ///
    /// Only the first configured title is searched; further titles and the
    /// locations are carried but not used yet.
    pub fn search_query(&self) -> Option<&str> {
        self.job_titles
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
    }
}

/// Company and title fragments that exclude a posting.
///
/// Matching is case-insensitive substring containment, see
/// `applybot_core::blacklist`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blacklist {
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default)]
    pub titles: Vec<String>,
}

/// Documents uploaded into file controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Documents {
    #[serde(default, alias = "resumePath")]
    pub resume_path: Option<PathBuf>,
    #[serde(default, alias = "coverLetterPath")]
    pub cover_letter_path: Option<PathBuf>,
}

/// Configuration for one automation session as accepted by the control plane.
///
/// The required sections are optional here so that validation can report
/// every missing one instead of failing on the first during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default, alias = "personalInfo")]
    pub personal_info: Option<ApplicantProfile>,
    #[serde(default, alias = "jobPreferences")]
    pub job_preferences: Option<JobPreferences>,
    #[serde(default)]
    pub blacklist: Blacklist,
    #[serde(default)]
    pub documents: Documents,
    /// Browser profile directory that holds the logged-in identity.
    #[serde(default, alias = "chromeProfilePath", alias = "chromeProfile")]
    pub chrome_profile_path: Option<PathBuf>,
}

/// A [`SessionConfig`] whose required sections are present and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub profile: ApplicantProfile,
    pub preferences: JobPreferences,
    pub blacklist: Blacklist,
    pub documents: Documents,
    pub chrome_profile_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Check the required sections, listing every problem found.
    pub fn validate(self) -> Result<ValidatedConfig> {
        let mut problems = Vec::new();

        match &self.personal_info {
            None => problems.push("Missing required section: personalInfo".to_string()),
            Some(p) if p.full_name.trim().is_empty() => {
                problems.push("personalInfo.fullName must not be empty".to_string())
            }
            Some(_) => {}
        }
        match &self.job_preferences {
            None => problems.push("Missing required section: jobPreferences".to_string()),
            Some(p) if p.search_query().is_none() => {
                problems.push("jobPreferences.jobTitles must not be empty".to_string())
            }
            Some(_) => {}
        }

        match (self.personal_info, self.job_preferences) {
            (Some(profile), Some(preferences)) if problems.is_empty() => Ok(ValidatedConfig {
                profile,
                preferences,
                blacklist: self.blacklist,
                documents: self.documents,
                chrome_profile_path: self.chrome_profile_path,
            }),
            _ => Err(ApplyError::InvalidConfig(problems)),
        }
    }
}

/// Error types used across the applybot system.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    /// Required configuration sections were missing or empty.
    #[error("Configuration validation failed: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    /// `start` was called while a session is active.
    #[error("Bot is already running")]
    AlreadyRunning,

    /// `stop` was called without an active session.
    #[error("Bot is not running")]
    NotRunning,

    /// Browser session or page-level navigation failed.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Navigation under a network-sensitive wait failed.
    #[error("Network error: {0}")]
    Network(String),

    /// A form step or posting interaction failed.
    #[error("Application error: {0}")]
    Application(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Convenient alias for results that use [`ApplyError`].
pub type Result<T> = std::result::Result<T, ApplyError>;
