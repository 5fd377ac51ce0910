//! The automation engine: session lifecycle and the search/process loop.
//!
//! A run searches for the first configured job title, then walks result
//! pages. Every posting on a page is filtered against the blacklist, opened,
//! and, when it offers an in-page application, handed to the
//! [`FormFiller`]. Failures on one posting are recovered from and skipped;
//! failures while searching or turning pages get one recovery attempt and
//! otherwise end the run.
//!
//! Cancellation is cooperative. [`Engine::stop`] cancels the run's token and
//! the loop notices it before the next posting or page, never in the middle
//! of a browser action or a delay.
use crate::blacklist::is_blacklisted;
use crate::delay::{DelayBounds, DelaySimulator};
use crate::form::filler::DEFAULT_MAX_FORM_STEPS;
use crate::form::{FieldResolver, FormFiller};
use crate::recovery::{
    Classification, ErrorContext, LiveSession, RecoveryPolicy, SessionActions,
};
use applybot_common::{
    ApplyError, LogSink, Result, SessionConfig, SiteSelectors, ValidatedConfig,
};
use applybot_drivers::{BrowserDriver, Element, Page};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tunables of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub delay: DelayBounds,
    /// Browser-level recoveries allowed per run before it ends as fatal.
    pub max_session_restarts: u32,
    pub max_form_steps: usize,
    pub site: SiteSelectors,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            delay: DelayBounds::default(),
            max_session_restarts: 3,
            max_form_steps: DEFAULT_MAX_FORM_STEPS,
            site: SiteSelectors::default(),
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "lowercase")]
pub enum RunEnd {
    /// No next-page control was left.
    #[default]
    Exhausted,
    Stopped,
    /// A search or page-level failure could not be recovered.
    Fatal(String),
}

/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub pages: usize,
    pub applied: usize,
    /// Blacklisted postings and postings without an in-page application.
    pub skipped: usize,
    pub failed: usize,
    /// Browser-level recoveries that let the run continue.
    pub restarts: u32,
    pub end: RunEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Search,
    Page,
    TurnPage,
    /// A page turn was clicked; its result list has not shown up yet.
    AwaitResults,
}

enum Flow {
    Next(Phase),
    End(RunEnd),
}

enum PostingOutcome {
    Applied,
    Skipped,
}

/// A discovered posting, read lazily.
struct PostingHandle {
    card: Box<dyn Element>,
}

impl PostingHandle {
    /// Text of a part of the card the blacklist needs; a missing part fails
    /// the posting rather than letting it through unfiltered.
    async fn text_of(&self, selector: &str) -> Result<String> {
        match self.card.find_one(selector).await? {
            Some(element) => Ok(element.text().await?),
            None => Err(ApplyError::Application(format!(
                "element not found: {selector}"
            ))),
        }
    }
}

/// One page's postings, consumed once and never restarted.
struct PostingCursor {
    cards: std::iter::Skip<std::vec::IntoIter<Box<dyn Element>>>,
}

impl Iterator for PostingCursor {
    type Item = PostingHandle;

    fn next(&mut self) -> Option<PostingHandle> {
        self.cards.next().map(|card| PostingHandle { card })
    }
}

#[derive(Clone)]
struct Claim {
    generation: u64,
    token: CancellationToken,
}

fn page_of(live: &Option<LiveSession>) -> Result<&dyn Page> {
    live.as_ref()
        .map(|l| l.page.as_ref())
        .ok_or_else(|| ApplyError::Browser("browser session is gone".into()))
}

/// Owns one browser session at a time and runs the application loop on it.
pub struct Engine {
    driver: Arc<dyn BrowserDriver>,
    settings: EngineSettings,
    delay: DelaySimulator,
    sink: LogSink,
    policy: RecoveryPolicy,
    generation: AtomicU64,
    running: Mutex<Option<Claim>>,
    live: tokio::sync::Mutex<Option<LiveSession>>,
}

impl Engine {
    pub fn new(driver: Arc<dyn BrowserDriver>, settings: EngineSettings, sink: LogSink) -> Self {
        Self {
            driver,
            delay: DelaySimulator::new(settings.delay),
            policy: RecoveryPolicy::new(sink.clone()),
            settings,
            sink,
            generation: AtomicU64::new(0),
            running: Mutex::new(None),
            live: tokio::sync::Mutex::new(None),
        }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Whether a session is active and not asked to stop.
    pub fn is_running(&self) -> bool {
        matches!(&*self.running(), Some(c) if !c.token.is_cancelled())
    }

    fn running(&self) -> MutexGuard<'_, Option<Claim>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self) -> Result<Claim> {
        let mut running = self.running();
        if matches!(&*running, Some(c) if !c.token.is_cancelled()) {
            return Err(ApplyError::AlreadyRunning);
        }
        let claim = Claim {
            generation: self.generation.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        };
        *running = Some(claim.clone());
        Ok(claim)
    }

    fn release(&self, claim: &Claim) {
        let mut running = self.running();
        if matches!(&*running, Some(c) if c.generation == claim.generation) {
            *running = None;
        }
    }

    fn actions<'a>(
        &'a self,
        profile: Option<&'a Path>,
        live: &'a mut Option<LiveSession>,
    ) -> SessionActions<'a> {
        SessionActions {
            driver: self.driver.as_ref(),
            profile,
            live,
            delay: self.delay,
        }
    }

    /// Validate `config`, acquire a browser session and run until the
    /// postings are exhausted, a stop is requested, or a page-level failure
    /// cannot be recovered.
    ///
    /// The session stays open after the loop ends; release it with
    /// [`Engine::cleanup`]. Until then, or until [`Engine::stop`], a second
    /// `start` fails with [`ApplyError::AlreadyRunning`].
    pub async fn start(&self, config: SessionConfig) -> Result<RunReport> {
        let claim = self.claim()?;
        let config = match config.validate() {
            Ok(config) => config,
            Err(err) => {
                self.release(&claim);
                self.sink.error(err.to_string());
                return Err(err);
            }
        };

        let mut live = self.live.lock().await;
        if let Some(stale) = live.take() {
            stale.close().await;
        }
        let profile = config.chrome_profile_path.as_deref();
        match LiveSession::open(self.driver.as_ref(), profile).await {
            Ok(session) => *live = Some(session),
            Err(err) => {
                let recovery = self
                    .policy
                    .recover(&err, ErrorContext::Browser, &mut self.actions(profile, &mut *live))
                    .await;
                if !recovery.recovered {
                    self.release(&claim);
                    return Err(err);
                }
            }
        }
        self.sink.info("Bot started");

        let mut report = RunReport::default();
        let end = self
            .run(&config, &claim.token, &mut *live, &mut report)
            .await;
        report.end = end;
        match &report.end {
            RunEnd::Exhausted => self.sink.info(format!(
                "No more postings; run finished ({} applied, {} skipped, {} failed)",
                report.applied, report.skipped, report.failed
            )),
            RunEnd::Stopped => self.sink.info("Run stopped"),
            RunEnd::Fatal(reason) => self
                .sink
                .error(format!("Run ended after unrecoverable error: {reason}")),
        }
        Ok(report)
    }

    /// Ask the active run to stop at its next checkpoint.
    pub fn stop(&self) -> Result<()> {
        match &*self.running() {
            Some(claim) if !claim.token.is_cancelled() => claim.token.cancel(),
            _ => return Err(ApplyError::NotRunning),
        }
        self.sink.info("Stop requested");
        Ok(())
    }

    /// Release the browser session, if any. Safe to call repeatedly.
    ///
    /// Waits for a run in progress to return first.
    pub async fn cleanup(&self) {
        let session = self.live.lock().await.take();
        if let Some(session) = session {
            session.close().await;
            self.sink.info("Browser session closed");
        }
        *self.running() = None;
    }

    async fn run(
        &self,
        config: &ValidatedConfig,
        token: &CancellationToken,
        live: &mut Option<LiveSession>,
        report: &mut RunReport,
    ) -> RunEnd {
        let profile = config.chrome_profile_path.as_deref();
        let mut phase = Phase::Search;
        loop {
            if token.is_cancelled() {
                return RunEnd::Stopped;
            }
            debug!(target: "applybot.engine", ?phase, "phase");
            let flow = match phase {
                Phase::Search => self.search(live, config).await,
                Phase::Page => self.process_page(config, token, live, report).await,
                Phase::TurnPage => self.turn_page(live).await,
                Phase::AwaitResults => self.await_results(live).await,
            };
            let err = match flow {
                Ok(Flow::Next(next)) => {
                    phase = next;
                    continue;
                }
                Ok(Flow::End(end)) => return end,
                Err(err) => err,
            };

            if report.restarts >= self.settings.max_session_restarts {
                self.sink.error(format!(
                    "Giving up after {} browser-level recoveries: {err}",
                    report.restarts
                ));
                return RunEnd::Fatal(err.to_string());
            }
            let recovery = self
                .policy
                .recover(&err, ErrorContext::Browser, &mut self.actions(profile, live))
                .await;
            if !recovery.recovered {
                return RunEnd::Fatal(err.to_string());
            }
            report.restarts += 1;
            // a fresh session starts over; anything else retries the phase
            if recovery.classification == Classification::Browser {
                phase = Phase::Search;
            }
        }
    }

    async fn search(&self, live: &Option<LiveSession>, config: &ValidatedConfig) -> Result<Flow> {
        let site = &self.settings.site;
        let page = page_of(live)?;
        let query = config.preferences.search_query().unwrap_or_default();

        page.navigate(&site.search_url).await?;
        let input = page.wait_for_selector(&site.search_input).await?;
        input.clear().await?;
        input.type_text(query).await?;
        self.delay.pause().await;
        self.sink.info(format!("Searching for \"{query}\""));
        Ok(Flow::Next(Phase::Page))
    }

    async fn process_page(
        &self,
        config: &ValidatedConfig,
        token: &CancellationToken,
        live: &mut Option<LiveSession>,
        report: &mut RunReport,
    ) -> Result<Flow> {
        let profile = config.chrome_profile_path.as_deref();
        let mut postings = self.postings(live, 0).await?;
        report.pages += 1;
        debug!(target: "applybot.engine", page = report.pages, postings = postings.cards.len(), "page enumerated");

        let mut seen = 0;
        while let Some(posting) = postings.next() {
            if token.is_cancelled() {
                return Ok(Flow::End(RunEnd::Stopped));
            }
            seen += 1;
            let outcome = match page_of(live) {
                Ok(page) => self.process_posting(page, &posting, config).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(PostingOutcome::Applied) => report.applied += 1,
                Ok(PostingOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    report.failed += 1;
                    let recovery = self
                        .policy
                        .recover(&err, ErrorContext::Application, &mut self.actions(profile, live))
                        .await;
                    if recovery.recovered {
                        // the reload left the remaining handles stale
                        postings = self.postings(live, seen).await?;
                    } else {
                        self.sink.warn(format!(
                            "Moving on to the next posting after an unrecovered {} error",
                            recovery.classification
                        ));
                    }
                }
            }
        }
        Ok(Flow::Next(Phase::TurnPage))
    }

    /// Enumerate the displayed postings, passing over the first `seen`.
    async fn postings(&self, live: &Option<LiveSession>, seen: usize) -> Result<PostingCursor> {
        let cards = page_of(live)?.find_all(&self.settings.site.job_card).await?;
        Ok(PostingCursor {
            cards: cards.into_iter().skip(seen),
        })
    }

    async fn process_posting(
        &self,
        page: &dyn Page,
        posting: &PostingHandle,
        config: &ValidatedConfig,
    ) -> Result<PostingOutcome> {
        let site = &self.settings.site;
        let title = posting.text_of(&site.card_title).await?;
        let company = posting.text_of(&site.card_company).await?;
        if is_blacklisted(&title, &company, &config.blacklist) {
            self.sink
                .info(format!("Skipping blacklisted posting: {title} at {company}"));
            return Ok(PostingOutcome::Skipped);
        }

        posting.card.click().await?;
        self.delay.pause().await;
        let Some(apply) = page.find_one(&site.apply_button).await? else {
            self.sink
                .info(format!("No in-page application for {title} at {company}"));
            return Ok(PostingOutcome::Skipped);
        };

        let resolver = FieldResolver::new(&config.profile, &config.documents);
        FormFiller::new(page, site, resolver, self.delay)
            .with_max_steps(self.settings.max_form_steps)
            .submit(apply.as_ref())
            .await?;
        self.sink
            .info(format!("Successfully applied to {title} at {company}"));
        Ok(PostingOutcome::Applied)
    }

    async fn turn_page(&self, live: &Option<LiveSession>) -> Result<Flow> {
        let site = &self.settings.site;
        let page = page_of(live)?;
        let Some(next) = page.find_one(&site.next_page).await? else {
            return Ok(Flow::End(RunEnd::Exhausted));
        };
        next.click().await?;
        Ok(Flow::Next(Phase::AwaitResults))
    }

    async fn await_results(&self, live: &Option<LiveSession>) -> Result<Flow> {
        page_of(live)?
            .wait_for_selector(&self.settings.site.job_card)
            .await?;
        self.delay.pause().await;
        Ok(Flow::Next(Phase::Page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_end_serializes_with_its_reason() {
        let fatal = serde_json::to_value(RunEnd::Fatal("boom".into())).unwrap();
        assert_eq!(fatal, serde_json::json!({ "kind": "fatal", "reason": "boom" }));
        let done = serde_json::to_value(RunEnd::Exhausted).unwrap();
        assert_eq!(done, serde_json::json!({ "kind": "exhausted" }));
    }

    #[test]
    fn default_settings() {
        let s = EngineSettings::default();
        assert_eq!(s.delay, DelayBounds { min_ms: 1000, max_ms: 3000 });
        assert_eq!(s.max_session_restarts, 3);
        assert_eq!(s.max_form_steps, 25);
    }
}
