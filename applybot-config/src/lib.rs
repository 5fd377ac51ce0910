//! Loader for applybot configuration with YAML/JSON + environment overlays.
//!
//! An `applybot.yaml` has three sections, all optional:
//!
//! ```yaml
//! browser:
//!   webdriver_url: http://localhost:9515
//!   headless: false
//!   chrome_profile: ~/.config/google-chrome/Default
//!   wait_timeout_secs: 10
//! engine:
//!   delay: { min_ms: 1000, max_ms: 3000 }
//!   max_session_restarts: 3
//!   max_form_steps: 25
//!   site: { search_url: "https://www.linkedin.com/jobs/" }
//! session:
//!   personal_info: { full_name: "Jane Doe", email: "${APPLICANT_EMAIL}" }
//!   job_preferences: { job_titles: ["Backend Engineer"] }
//!   blacklist: { companies: ["Acme"] }
//! ```
//!
//! Files and inline snippets merge in the order they are attached, later
//! ones winning; `APPLYBOT__`-prefixed environment variables
//! (`APPLYBOT__BROWSER__HEADLESS=true`) override all of them. `${VAR}`
//! placeholders in string values are expanded afterwards, recursively up to
//! a fixed depth. The session section is validated when a run starts, not
//! here.
use applybot_common::SessionConfig;
use applybot_core::EngineSettings;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod generate;
pub mod persist;

pub use generate::generate_config;
pub use persist::{load_session_config, save_config, ConfigFormat, PersistError};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: BrowserSettings,
    pub engine: EngineSettings,
    pub session: SessionConfig,
}

/// How to reach and start Chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    /// Profile directory used when none is chosen at start.
    pub chrome_profile: Option<PathBuf>,
    pub wait_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            chrome_profile: None,
            wait_timeout_secs: 10,
        }
    }
}

impl BrowserSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// `~/.config/applybot/applybot.yaml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("applybot").join("applybot.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (files + env overrides).
pub struct AppConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for AppConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigLoader {
    /// Start empty; every field has a default and `APPLYBOT__` env
    /// variables are applied on [`AppConfigLoader::load`].
    ///
    /// ```
    /// use applybot_config::AppConfigLoader;
    ///
    /// let config = AppConfigLoader::new()
    ///     .with_yaml_str("browser:\n  headless: true")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert!(config.browser.headless);
    /// assert_eq!(config.browser.webdriver_url, "http://localhost:9515");
    /// assert_eq!(config.engine.max_form_steps, 25);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "APPLYBOT".into(),
        }
    }

    /// Read overrides from `<PREFIX>__SECTION__KEY` instead of `APPLYBOT__…`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Attach a YAML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use applybot_config::AppConfigLoader;
    ///
    /// let cfg = AppConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// session:
    ///   personal_info:
    ///     full_name: "Jane Doe"
    ///   job_preferences:
    ///     job_titles: ["Backend Engineer"]
    ///   blacklist:
    ///     companies: ["Acme"]
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// let session = cfg.session.validate().unwrap();
    /// assert_eq!(session.profile.first_name(), "Jane");
    /// assert_eq!(session.blacklist.companies, vec!["Acme".to_string()]);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge an inline JSON snippet.
    pub fn with_json_str(mut self, json: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(json, config::FileFormat::Json));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use applybot_config::AppConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_WEBDRIVER", "http://chromedriver:4444"); }
    ///
    /// let config = AppConfigLoader::new()
    ///     .with_yaml_str("browser:\n  webdriver_url: \"${DOCTEST_WEBDRIVER}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.browser.webdriver_url, "http://chromedriver:4444");
    ///
    /// unsafe { std::env::remove_var("DOCTEST_WEBDRIVER"); }
    /// ```
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
