#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use applybot_common::observability::{LogConfig, LogFormat};
use applybot_common::{
    ApplicantProfile, Blacklist, Documents, FieldValue, JobPreferences, LogEvent, LogSink,
    SessionConfig,
};
use applybot_core::{Engine, EngineSettings};
use applybot_drivers::fake::FakeBrowser;
use tokio::sync::mpsc::UnboundedReceiver;

static INIT_PATH: OnceLock<PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "applybot-tests",
            emit_stderr: true,
            format: if std::env::var("APPLYBOT_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug",
            ..LogConfig::default()
        };

        applybot_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn profile() -> ApplicantProfile {
    let mut profile = ApplicantProfile {
        full_name: "Jane Doe".into(),
        email: "jane@example.com".into(),
        phone: "555-0100".into(),
        location: "Berlin".into(),
        ..ApplicantProfile::default()
    };
    profile
        .answers
        .insert("relocate".into(), FieldValue::Flag(true));
    profile
        .answers
        .insert("country".into(), FieldValue::Text("DE".into()));
    profile
}

pub fn documents() -> Documents {
    Documents {
        resume_path: Some(PathBuf::from("/docs/cv.pdf")),
        cover_letter_path: None,
    }
}

pub fn config(blocked_companies: &[&str]) -> SessionConfig {
    SessionConfig {
        personal_info: Some(profile()),
        job_preferences: Some(JobPreferences {
            job_titles: vec!["Backend Engineer".into(), "Rust Developer".into()],
            locations: vec!["Remote".into()],
        }),
        blacklist: Blacklist {
            companies: blocked_companies.iter().map(|c| c.to_string()).collect(),
            titles: vec![],
        },
        documents: documents(),
        chrome_profile_path: None,
    }
}

pub fn engine_with(browser: &FakeBrowser, settings: EngineSettings) -> Arc<Engine> {
    init_test_tracing();
    Arc::new(Engine::new(
        Arc::new(browser.clone()),
        settings,
        LogSink::new(),
    ))
}

pub fn new_engine(browser: &FakeBrowser) -> Arc<Engine> {
    engine_with(browser, EngineSettings::default())
}

/// Every message received so far.
pub fn drain(rx: &mut UnboundedReceiver<LogEvent>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        messages.push(event.message);
    }
    messages
}

pub fn count_prefixed(messages: &[String], prefix: &str) -> usize {
    messages.iter().filter(|m| m.starts_with(prefix)).count()
}
