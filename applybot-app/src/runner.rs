use anyhow::Result;
use applybot_common::{LogSink, SessionConfig};
use applybot_config::AppConfig;
use applybot_core::{Controller, Engine, RunReport};
use applybot_drivers::browser::driver::FantocciniDriver;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Wire a WebDriver-backed engine behind a controller.
pub fn build_controller(cfg: &AppConfig) -> Controller {
    let driver = FantocciniDriver::new(
        cfg.browser.webdriver_url.clone(),
        cfg.browser.headless,
        cfg.browser.wait_timeout(),
    );
    let engine = Engine::new(Arc::new(driver), cfg.engine.clone(), LogSink::new());
    Controller::new(Arc::new(engine))
}

/// Run once, printing the log stream as JSON lines; Ctrl-C stops the run.
pub async fn run(
    controller: Controller,
    profile: Option<PathBuf>,
    session: SessionConfig,
) -> Result<RunReport> {
    let (subscription, mut logs) = controller.subscribe_logs();
    let printer = tokio::spawn(async move {
        while let Some(event) = logs.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "unprintable log event"),
            }
        }
    });

    let runner = controller.clone();
    let mut run = tokio::spawn(async move { runner.start(profile, session).await });
    let outcome = tokio::select! {
        res = &mut run => res,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received; stopping at the next checkpoint");
            if let Err(e) = controller.stop().await {
                warn!(error = %e, "stop request failed");
            }
            run.await
        }
    };

    controller.engine().cleanup().await;
    controller.unsubscribe_logs(subscription);
    let _ = printer.await;
    Ok(outcome??)
}
