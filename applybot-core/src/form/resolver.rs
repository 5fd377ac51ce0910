//! Maps a form control's identifying name to an applicant value.
use applybot_common::{ApplicantProfile, Documents, FieldValue};
use std::path::Path;

/// Lower-cased, trimmed form of a control name used for lookups.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Resolves control names against one applicant.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    profile: &'a ApplicantProfile,
    documents: &'a Documents,
}

impl<'a> FieldResolver<'a> {
    pub fn new(profile: &'a ApplicantProfile, documents: &'a Documents) -> Self {
        Self { profile, documents }
    }

    /// Value for a typed, selected, or checked control.
    ///
    /// The fixed dictionary (`firstname`, `lastname`, `email`, `phone`,
    /// `location`) wins over the profile's free-form answers. `None` means
    /// the control stays untouched.
    pub fn resolve(&self, name: &str) -> Option<FieldValue> {
        let key = normalize(name);
        let p = self.profile;
        let fixed = match key.as_str() {
            "firstname" => Some(p.first_name().to_string()),
            "lastname" => Some(p.last_name()),
            "email" => Some(p.email.clone()),
            "phone" => Some(p.phone.clone()),
            "location" => Some(p.location.clone()),
            _ => None,
        };
        fixed
            .map(FieldValue::Text)
            .or_else(|| p.answers.get(&key).cloned())
    }

    /// Document for a file control: the resume when the name mentions it,
    /// the cover letter otherwise.
    pub fn resolve_file(&self, name: &str) -> Option<&'a Path> {
        if normalize(name).contains("resume") {
            self.documents.resume_path.as_deref()
        } else {
            self.documents.cover_letter_path.as_deref()
        }
    }
}
