//! The browser capabilities the automation core relies on.
//!
//! Everything is object safe so the engine can hold `Box<dyn Page>` and
//! tests can swap in a substitute implementation.
use crate::error::DriverResult;
use async_trait::async_trait;
use std::path::Path;

/// Condition awaited after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// The document has loaded.
    Load,
    /// The document has loaded and network activity has settled.
    NetworkIdle,
}

/// A DOM element on a live page.
#[async_trait]
pub trait Element: Send + Sync {
    /// First descendant matching `selector`, if any.
    async fn find_one(&self, selector: &str) -> DriverResult<Option<Box<dyn Element>>>;

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn Element>>>;

    /// Visible text content.
    async fn text(&self) -> DriverResult<String>;

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;

    /// Lower-case tag name (`input`, `select`, `textarea`, ...).
    async fn tag_name(&self) -> DriverResult<String>;

    async fn click(&self) -> DriverResult<()>;

    async fn clear(&self) -> DriverResult<()>;

    async fn type_text(&self, text: &str) -> DriverResult<()>;

    /// Select the option whose value equals `value`.
    async fn select_option(&self, value: &str) -> DriverResult<()>;

    async fn upload_file(&self, path: &Path) -> DriverResult<()>;
}

/// A browser tab.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Wait until `selector` matches, failing with a timeout otherwise.
    async fn wait_for_selector(&self, selector: &str) -> DriverResult<Box<dyn Element>>;

    async fn find_one(&self, selector: &str) -> DriverResult<Option<Box<dyn Element>>>;

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn Element>>>;

    async fn reload(&self, wait: WaitUntil) -> DriverResult<()>;
}

/// A running browser bound to one profile directory.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn new_page(&self) -> DriverResult<Box<dyn Page>>;

    async fn close(&self) -> DriverResult<()>;
}

/// Launches browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Start a session using `profile_dir` as the browser's user data dir.
    async fn launch(&self, profile_dir: Option<&Path>) -> DriverResult<Box<dyn BrowserSession>>;
}
