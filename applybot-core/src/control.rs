//! Control-plane facade over one [`Engine`].
//!
//! This is the boundary an HTTP layer or the CLI drives: start with a
//! chosen Chrome profile, stop (which also releases the browser), stream
//! logs, and list the profiles available on this machine.
use crate::engine::{Engine, RunReport};
use applybot_common::{ApplyError, LogEvent, Result, SessionConfig, SubscriptionId};
use applybot_drivers::profiles::{chrome_user_data_dir, discover_profiles, ChromeProfile};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Clone)]
pub struct Controller {
    engine: Arc<Engine>,
    profiles_root: Option<PathBuf>,
}

impl Controller {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            profiles_root: None,
        }
    }

    /// Look for Chrome profiles below `root` instead of the platform default.
    pub fn with_profiles_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profiles_root = Some(root.into());
        self
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Run the engine; a given `chrome_profile` replaces the config's.
    pub async fn start(
        &self,
        chrome_profile: Option<PathBuf>,
        mut config: SessionConfig,
    ) -> Result<RunReport> {
        if let Some(profile) = chrome_profile {
            config.chrome_profile_path = Some(profile);
        }
        self.engine.start(config).await
    }

    /// Request a stop, then release the browser session once the run yields.
    pub async fn stop(&self) -> Result<()> {
        self.engine.stop()?;
        self.engine.cleanup().await;
        Ok(())
    }

    /// Open a log stream; it ends when the receiver is dropped.
    pub fn subscribe_logs(&self) -> (SubscriptionId, UnboundedReceiver<LogEvent>) {
        self.engine.sink().stream()
    }

    pub fn unsubscribe_logs(&self, id: SubscriptionId) -> bool {
        self.engine.sink().unsubscribe(id)
    }

    pub fn chrome_profiles(&self) -> Result<Vec<ChromeProfile>> {
        let root = self
            .profiles_root
            .clone()
            .or_else(chrome_user_data_dir)
            .ok_or_else(|| ApplyError::Unknown("no Chrome user data directory".into()))?;
        discover_profiles(&root)
            .map_err(|e| ApplyError::Unknown(format!("{}: {e}", root.display())))
    }
}
