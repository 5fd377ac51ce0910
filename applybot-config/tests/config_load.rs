use applybot_config::{AppConfigLoader, ConfigFormat, load_session_config, save_config};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a file in a temp dir and return its path.
fn write_file(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, contents).expect("write config");
    p
}

const APP_YAML: &str = r#"
browser:
  chrome_profile: "${CHROME_HOME}/Profile 1"
  wait_timeout_secs: 20
engine:
  delay:
    min_ms: 200
    max_ms: 400
  site:
    next_page: 'button[aria-label="Page forward"]'
session:
  personal_info:
    full_name: "Jane Doe"
    email: "${APPLICANT_EMAIL}"
  job_preferences:
    job_titles: ["Backend Engineer", "SRE"]
  blacklist:
    companies: ["Acme"]
    titles: ["Intern"]
  documents:
    resume_path: "/docs/cv.pdf"
"#;

#[test]
#[serial]
fn loads_file_with_env_expansion_and_overrides() {
    let tmp = TempDir::new().unwrap();
    let p = write_file(&tmp, "applybot.yaml", APP_YAML);

    let config = temp_env::with_vars(
        [
            ("CHROME_HOME", Some("/home/jane/.config/google-chrome")),
            ("APPLICANT_EMAIL", Some("jane@example.com")),
            ("APPLYBOT__BROWSER__HEADLESS", Some("true")),
            ("APPLYBOT__ENGINE__MAX_SESSION_RESTARTS", Some("5")),
        ],
        || AppConfigLoader::new().with_file(&p).load(),
    )
    .expect("load app config");

    assert!(config.browser.headless);
    assert_eq!(config.browser.wait_timeout_secs, 20);
    assert_eq!(
        config.browser.chrome_profile,
        Some(PathBuf::from("/home/jane/.config/google-chrome/Profile 1"))
    );
    assert_eq!(config.engine.max_session_restarts, 5);
    assert_eq!(config.engine.max_form_steps, 25);
    assert_eq!((config.engine.delay.min_ms, config.engine.delay.max_ms), (200, 400));
    assert_eq!(config.engine.site.next_page, r#"button[aria-label="Page forward"]"#);
    assert_eq!(config.engine.site.job_card, ".job-card-container");

    let session = config.session.validate().expect("valid session");
    assert_eq!(session.profile.email, "jane@example.com");
    assert_eq!(session.preferences.search_query(), Some("Backend Engineer"));
    assert_eq!(session.blacklist.titles, vec!["Intern".to_string()]);
}

#[test]
#[serial]
fn environment_overrides_files() {
    let config = temp_env::with_var("APPLYBOT__BROWSER__WEBDRIVER_URL", Some("http://env:9"), || {
        AppConfigLoader::new()
            .with_yaml_str("browser:\n  webdriver_url: http://file:1")
            .load()
    })
    .unwrap();
    assert_eq!(config.browser.webdriver_url, "http://env:9");

    let config = temp_env::with_var("CUSTOM__BROWSER__HEADLESS", Some("true"), || {
        AppConfigLoader::new().with_env_prefix("CUSTOM").load()
    })
    .unwrap();
    assert!(config.browser.headless);
}

#[test]
#[serial]
fn later_sources_win() {
    let config = AppConfigLoader::new()
        .with_yaml_str("browser:\n  webdriver_url: http://a:1\n  headless: true")
        .with_json_str(r#"{ "browser": { "webdriver_url": "http://b:2" } }"#)
        .load()
        .unwrap();
    assert_eq!(config.browser.webdriver_url, "http://b:2");
    assert!(config.browser.headless);
}

#[test]
#[serial]
fn missing_files_are_errors_unless_optional() {
    let tmp = TempDir::new().unwrap();
    let absent = tmp.path().join("absent.yaml");
    assert!(AppConfigLoader::new().with_file(&absent).load().is_err());

    let config = AppConfigLoader::new()
        .with_optional_file(&absent)
        .load()
        .unwrap();
    assert_eq!(config, Default::default());
}

#[test]
fn control_plane_payload_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let payload = write_file(
        &tmp,
        "session.json",
        r#"{
            "personalInfo": { "fullName": "Jane Doe", "phone": "555-0100" },
            "jobPreferences": { "jobTitles": ["Backend Engineer"] },
            "chromeProfile": "/chrome/Default"
        }"#,
    );
    let session = load_session_config(&payload).unwrap();
    assert_eq!(session.chrome_profile_path, Some(PathBuf::from("/chrome/Default")));

    let saved = save_config(&session, &tmp.path().join("out"), ConfigFormat::Yaml).unwrap();
    assert_eq!(load_session_config(&saved).unwrap(), session);
}
