//! Classified, single-attempt recovery from failures.
//!
//! The policy never holds the engine. It acts through [`RecoveryActions`],
//! a narrow capability the engine hands in per occurrence, and reports
//! whether the one action it chose succeeded. Whether the run goes on is
//! the caller's decision.
use crate::delay::DelaySimulator;
use applybot_common::{ApplyError, LogSink, Result};
use applybot_drivers::{BrowserDriver, BrowserSession, Page, WaitUntil};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Where the failure was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    /// Session start, search navigation, page enumeration or page turns.
    Browser,
    /// Handling of a single posting.
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Browser,
    Network,
    ElementNotFound,
    Timeout,
    Unknown,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Classification::Browser => "browser",
            Classification::Network => "network",
            Classification::ElementNotFound => "element-not-found",
            Classification::Timeout => "timeout",
            Classification::Unknown => "unknown",
        })
    }
}

/// Outcome of one recovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovery {
    pub classification: Classification,
    pub recovered: bool,
}

/// Remediations the policy may ask for.
#[async_trait]
pub trait RecoveryActions: Send {
    /// Release the browser session and acquire a fresh one.
    async fn restart_session(&mut self) -> Result<()>;
    async fn reload_page(&mut self, wait: WaitUntil) -> Result<()>;
    async fn delay(&mut self);
}

/// Map an error and its context onto the recovery table.
pub fn classify(err: &ApplyError, context: ErrorContext) -> Classification {
    match err {
        ApplyError::Browser(_) if context == ErrorContext::Browser => Classification::Browser,
        ApplyError::Network(_) => Classification::Network,
        other => {
            let message = other.to_string().to_lowercase();
            if message.contains("element not found") {
                Classification::ElementNotFound
            } else if message.contains("timeout") || message.contains("timed out") {
                Classification::Timeout
            } else {
                Classification::Unknown
            }
        }
    }
}

/// Chooses and performs exactly one recovery action per failure.
#[derive(Clone, Default)]
pub struct RecoveryPolicy {
    sink: LogSink,
}

impl RecoveryPolicy {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    /// Log the failure with its classification, then attempt its recovery.
    pub async fn recover(
        &self,
        err: &ApplyError,
        context: ErrorContext,
        actions: &mut dyn RecoveryActions,
    ) -> Recovery {
        let classification = classify(err, context);
        self.sink
            .error(format!("{classification} error ({context:?} level): {err}"));

        let attempt = match classification {
            Classification::Browser => actions.restart_session().await,
            Classification::Network => actions.reload_page(WaitUntil::NetworkIdle).await,
            Classification::ElementNotFound | Classification::Timeout => {
                match actions.reload_page(WaitUntil::NetworkIdle).await {
                    Ok(()) => {
                        actions.delay().await;
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            Classification::Unknown => {
                return Recovery {
                    classification,
                    recovered: false,
                }
            }
        };

        let recovered = match attempt {
            Ok(()) => {
                info!(target: "applybot.recovery", %classification, "recovered");
                true
            }
            Err(e) => {
                warn!(target: "applybot.recovery", %classification, error = %e, "recovery failed");
                self.sink
                    .error(format!("Recovery from {classification} error failed: {e}"));
                false
            }
        };
        Recovery {
            classification,
            recovered,
        }
    }
}

/// The browser resources one run works on.
pub(crate) struct LiveSession {
    pub(crate) session: Box<dyn BrowserSession>,
    pub(crate) page: Box<dyn Page>,
}

impl LiveSession {
    pub(crate) async fn open(driver: &dyn BrowserDriver, profile: Option<&Path>) -> Result<Self> {
        let session = driver.launch(profile).await?;
        let page = match session.new_page().await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close) = session.close().await {
                    warn!(
                        target: "applybot.engine",
                        error = %close,
                        "closing half-open browser session failed"
                    );
                }
                return Err(e.into());
            }
        };
        Ok(Self { session, page })
    }

    pub(crate) async fn close(self) {
        if let Err(e) = self.session.close().await {
            warn!(target: "applybot.engine", error = %e, "closing browser session failed");
        }
    }
}

/// [`RecoveryActions`] over the engine's live session slot.
pub(crate) struct SessionActions<'a> {
    pub(crate) driver: &'a dyn BrowserDriver,
    pub(crate) profile: Option<&'a Path>,
    pub(crate) live: &'a mut Option<LiveSession>,
    pub(crate) delay: DelaySimulator,
}

#[async_trait]
impl RecoveryActions for SessionActions<'_> {
    async fn restart_session(&mut self) -> Result<()> {
        if let Some(old) = self.live.take() {
            old.close().await;
        }
        *self.live = Some(LiveSession::open(self.driver, self.profile).await?);
        Ok(())
    }

    async fn reload_page(&mut self, wait: WaitUntil) -> Result<()> {
        match self.live.as_ref() {
            Some(live) => Ok(live.page.reload(wait).await?),
            None => Err(ApplyError::Browser("no browser session to reload".into())),
        }
    }

    async fn delay(&mut self) {
        self.delay.pause().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applybot_drivers::{DriverError, DriverResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct ScriptedActions {
        fail: bool,
        calls: Vec<&'static str>,
    }

    #[async_trait]
    impl RecoveryActions for ScriptedActions {
        async fn restart_session(&mut self) -> Result<()> {
            self.calls.push("restart");
            self.outcome()
        }

        async fn reload_page(&mut self, wait: WaitUntil) -> Result<()> {
            assert_eq!(wait, WaitUntil::NetworkIdle);
            self.calls.push("reload");
            self.outcome()
        }

        async fn delay(&mut self) {
            self.calls.push("delay");
        }
    }

    impl ScriptedActions {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn outcome(&self) -> Result<()> {
            if self.fail {
                Err(ApplyError::Network("still broken".into()))
            } else {
                Ok(())
            }
        }
    }

    fn app(msg: &str) -> ApplyError {
        ApplyError::Application(msg.into())
    }

    #[test]
    fn classification_table() {
        use Classification::*;
        use ErrorContext as Ctx;

        let browser = ApplyError::Browser("navigation failed".into());
        assert_eq!(classify(&browser, Ctx::Browser), Browser);
        assert_eq!(classify(&browser, Ctx::Application), Unknown);
        assert_eq!(classify(&ApplyError::Network("x".into()), Ctx::Application), Network);
        assert_eq!(classify(&app("element not found: h3"), Ctx::Application), ElementNotFound);
        assert_eq!(classify(&app("timeout waiting for h3"), Ctx::Browser), Timeout);
        assert_eq!(classify(&app("request Timed Out"), Ctx::Application), Timeout);
        assert_eq!(classify(&ApplyError::Unknown("boom".into()), Ctx::Application), Unknown);
    }

    #[tokio::test]
    async fn element_not_found_reloads_then_delays_once() {
        let policy = RecoveryPolicy::default();
        let mut actions = ScriptedActions::default();
        let r = policy
            .recover(&app("element not found: x"), ErrorContext::Application, &mut actions)
            .await;
        assert!(r.recovered);
        assert_eq!(actions.calls, vec!["reload", "delay"]);
    }

    #[tokio::test]
    async fn failed_reload_reports_failure_without_retrying() {
        let policy = RecoveryPolicy::default();
        let mut actions = ScriptedActions::failing();
        let r = policy
            .recover(&app("element not found: x"), ErrorContext::Application, &mut actions)
            .await;
        assert_eq!(
            r,
            Recovery {
                classification: Classification::ElementNotFound,
                recovered: false
            }
        );
        assert_eq!(actions.calls, vec!["reload"]);
    }

    #[tokio::test]
    async fn browser_errors_restart_and_unknown_only_logs() {
        let sink = LogSink::new();
        let (_id, mut rx) = sink.stream();
        let policy = RecoveryPolicy::new(sink);

        let mut actions = ScriptedActions::default();
        let r = policy
            .recover(&ApplyError::Browser("gone".into()), ErrorContext::Browser, &mut actions)
            .await;
        assert!(r.recovered);
        assert_eq!(actions.calls, vec!["restart"]);

        let mut actions = ScriptedActions::default();
        let r = policy
            .recover(&ApplyError::Unknown("boom".into()), ErrorContext::Application, &mut actions)
            .await;
        assert!(!r.recovered);
        assert!(actions.calls.is_empty());

        let first = rx.try_recv().unwrap();
        assert!(first.message.starts_with("browser error"));
        let second = rx.try_recv().unwrap();
        assert!(second.message.contains("boom"));
    }

    struct BrokenSession {
        close_attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserSession for BrokenSession {
        async fn new_page(&self) -> DriverResult<Box<dyn Page>> {
            Err(DriverError::SessionClosed)
        }

        async fn close(&self) -> DriverResult<()> {
            self.close_attempts.fetch_add(1, Ordering::SeqCst);
            Err(DriverError::Interaction("window already gone".into()))
        }
    }

    struct BrokenDriver {
        close_attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserDriver for BrokenDriver {
        async fn launch(&self, _profile: Option<&Path>) -> DriverResult<Box<dyn BrowserSession>> {
            Ok(Box::new(BrokenSession {
                close_attempts: self.close_attempts.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn half_open_session_is_closed_and_the_page_error_returned() {
        let close_attempts = Arc::new(AtomicUsize::new(0));
        let driver = BrokenDriver {
            close_attempts: close_attempts.clone(),
        };

        let err = match LiveSession::open(&driver, None).await {
            Ok(_) => panic!("a session without a page must not open"),
            Err(err) => err,
        };
        assert_eq!(err, ApplyError::Browser("browser session is closed".into()));
        assert_eq!(close_attempts.load(Ordering::SeqCst), 1);
    }
}
