use crate::browser::{cadence::TypingCadence, page::FantocciniPage};
use crate::capability::{BrowserDriver, BrowserSession, Page};
use crate::error::{DriverError, DriverResult};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use webdriver::capabilities::Capabilities;

/// Default endpoint of a locally running Chromedriver.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Launches Chrome sessions through a WebDriver service.
#[derive(Debug, Clone)]
pub struct FantocciniDriver {
    webdriver_url: String,
    headless: bool,
    wait_timeout: Duration,
    cadence: TypingCadence,
}

impl Default for FantocciniDriver {
    fn default() -> Self {
        Self::new(DEFAULT_WEBDRIVER_URL, false, Duration::from_secs(10))
    }
}

impl FantocciniDriver {
    pub fn new(webdriver_url: impl Into<String>, headless: bool, wait_timeout: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
            wait_timeout,
            cadence: TypingCadence::default(),
        }
    }

    pub fn with_cadence(mut self, cadence: TypingCadence) -> Self {
        self.cadence = cadence;
        self
    }

    fn capabilities(&self, profile_dir: Option<&Path>) -> Capabilities {
        let mut args = vec![json!("--window-size=1280,800")];
        if let Some(dir) = profile_dir {
            args.push(json!(format!("--user-data-dir={}", dir.display())));
        }
        if self.headless {
            args.push(json!("--headless"));
            args.push(json!("--disable-gpu"));
        }

        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                // Images are not needed to fill forms.
                "prefs": { "profile.managed_default_content_settings.images": 2 },
            }),
        );
        caps
    }
}

#[async_trait]
impl BrowserDriver for FantocciniDriver {
    async fn launch(&self, profile_dir: Option<&Path>) -> DriverResult<Box<dyn BrowserSession>> {
        let client = ClientBuilder::native()
            .capabilities(self.capabilities(profile_dir))
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| DriverError::Launch(format!("{}: {e}", self.webdriver_url)))?;

        info!(
            target: "applybot.driver",
            webdriver = %self.webdriver_url,
            profile = ?profile_dir,
            "browser session started"
        );

        Ok(Box::new(FantocciniSession {
            client,
            wait_timeout: self.wait_timeout,
            cadence: self.cadence.clone(),
        }))
    }
}

/// One WebDriver session.
pub struct FantocciniSession {
    client: Client,
    wait_timeout: Duration,
    cadence: TypingCadence,
}

#[async_trait]
impl BrowserSession for FantocciniSession {
    async fn new_page(&self) -> DriverResult<Box<dyn Page>> {
        Ok(Box::new(FantocciniPage::new(
            self.client.clone(),
            self.wait_timeout,
            self.cadence.clone(),
        )))
    }

    /// Close the underlying browser session.
    async fn close(&self) -> DriverResult<()> {
        self.client.clone().close().await.map_err(|e| {
            warn!(target: "applybot.driver", error = %e, "closing browser session failed");
            DriverError::SessionClosed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_dir_and_headless_flags_reach_chrome() {
        let driver = FantocciniDriver::new(DEFAULT_WEBDRIVER_URL, true, Duration::from_secs(1));
        let caps = driver.capabilities(Some(Path::new("/tmp/chrome/Profile 1")));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        let args: Vec<&str> = args.iter().filter_map(|a| a.as_str()).collect();

        assert!(args.contains(&"--user-data-dir=/tmp/chrome/Profile 1"));
        assert!(args.contains(&"--headless"));
        assert!(args.contains(&"--window-size=1280,800"));
    }

    #[test]
    fn no_profile_means_no_user_data_dir() {
        let caps = FantocciniDriver::default().capabilities(None);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args
            .iter()
            .all(|a| !a.as_str().unwrap_or("").starts_with("--user-data-dir")));
        assert!(args.iter().all(|a| a != "--headless"));
    }
}
