use crate::browser::cadence::TypingCadence;
use crate::capability::{Element, Page, WaitUntil};
use crate::error::{DriverError, DriverResult};
use async_trait::async_trait;
use fantoccini::{elements, error::CmdError, Client, Locator};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

const READY_STATE_POLL: Duration = Duration::from_millis(250);
const NETWORK_SETTLE: Duration = Duration::from_millis(500);

fn lookup_error(selector: &str, err: CmdError) -> DriverError {
    match err {
        CmdError::WaitTimeout => DriverError::Timeout(selector.to_string()),
        e if e.is_timeout() => DriverError::Timeout(format!("{selector}: {e}")),
        e if e.is_no_such_element() => DriverError::ElementNotFound(selector.to_string()),
        e if e.is_stale_element_reference() => {
            DriverError::ElementNotFound(format!("{selector}: stale element reference"))
        }
        e => DriverError::Interaction(format!("{selector}: {e}")),
    }
}

fn interaction_error(action: &str, err: CmdError) -> DriverError {
    if err.is_no_such_element() || err.is_stale_element_reference() {
        DriverError::ElementNotFound(format!("{action}: {err}"))
    } else {
        DriverError::Interaction(format!("{action}: {err}"))
    }
}

/// Page wrapper around a WebDriver client.
pub struct FantocciniPage {
    client: Client,
    wait_timeout: Duration,
    cadence: TypingCadence,
}

impl FantocciniPage {
    pub fn new(client: Client, wait_timeout: Duration, cadence: TypingCadence) -> Self {
        Self {
            client,
            wait_timeout,
            cadence,
        }
    }

    fn wrap(&self, element: elements::Element) -> Box<dyn Element> {
        Box::new(FantocciniElement::new(element, &self.cadence))
    }

    async fn ready_state(&self) -> DriverResult<String> {
        let state = self
            .client
            .execute("return document.readyState", vec![])
            .await
            .map_err(|e| DriverError::Network(format!("readyState probe failed: {e}")))?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }

    /// Poll until the document reports `complete`, then give the network a
    /// moment to settle when asked to.
    async fn wait_for_load(&self, wait: WaitUntil) -> DriverResult<()> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if self.ready_state().await? == "complete" {
                break;
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Network(format!(
                    "document not ready after {:?}",
                    self.wait_timeout
                )));
            }
            sleep(READY_STATE_POLL).await;
        }
        if wait == WaitUntil::NetworkIdle {
            sleep(NETWORK_SETTLE).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Page for FantocciniPage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!(target: "applybot.driver", %url, "navigate");
        self.client
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(format!("{url}: {e}")))
    }

    async fn wait_for_selector(&self, selector: &str) -> DriverResult<Box<dyn Element>> {
        let element = self
            .client
            .wait()
            .at_most(self.wait_timeout)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, e))?;
        Ok(self.wrap(element))
    }

    async fn find_one(&self, selector: &str) -> DriverResult<Option<Box<dyn Element>>> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(element) => Ok(Some(self.wrap(element))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(lookup_error(selector, e)),
        }
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn Element>>> {
        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, e))?;
        Ok(elements.into_iter().map(|e| self.wrap(e)).collect())
    }

    async fn reload(&self, wait: WaitUntil) -> DriverResult<()> {
        debug!(target: "applybot.driver", ?wait, "reload");
        self.client
            .refresh()
            .await
            .map_err(|e| DriverError::Network(format!("reload failed: {e}")))?;
        self.wait_for_load(wait).await
    }
}

/// Element wrapper that types with the page's cadence.
#[derive(Clone)]
pub struct FantocciniElement {
    element: elements::Element,
    cadence: TypingCadence,
}

impl FantocciniElement {
    pub fn new(element: elements::Element, cadence: &TypingCadence) -> Self {
        Self {
            element,
            cadence: cadence.clone(),
        }
    }

    fn wrap(&self, element: elements::Element) -> Box<dyn Element> {
        Box::new(FantocciniElement::new(element, &self.cadence))
    }
}

#[async_trait]
impl Element for FantocciniElement {
    async fn find_one(&self, selector: &str) -> DriverResult<Option<Box<dyn Element>>> {
        match self.element.find(Locator::Css(selector)).await {
            Ok(element) => Ok(Some(self.wrap(element))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(lookup_error(selector, e)),
        }
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn Element>>> {
        let elements = self
            .element
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, e))?;
        Ok(elements.into_iter().map(|e| self.wrap(e)).collect())
    }

    async fn text(&self) -> DriverResult<String> {
        self.element
            .text()
            .await
            .map(|t| t.trim().to_string())
            .map_err(|e| interaction_error("read text", e))
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        self.element
            .attr(name)
            .await
            .map_err(|e| interaction_error("read attribute", e))
    }

    async fn tag_name(&self) -> DriverResult<String> {
        self.element
            .tag_name()
            .await
            .map(|t| t.to_ascii_lowercase())
            .map_err(|e| interaction_error("read tag name", e))
    }

    async fn click(&self) -> DriverResult<()> {
        self.element
            .click()
            .await
            .map_err(|e| interaction_error("click", e))
    }

    async fn clear(&self) -> DriverResult<()> {
        self.element
            .clear()
            .await
            .map_err(|e| interaction_error("clear", e))
    }

    async fn type_text(&self, text: &str) -> DriverResult<()> {
        self.cadence.type_into(&self.element, text).await
    }

    async fn select_option(&self, value: &str) -> DriverResult<()> {
        self.element
            .select_by_value(value)
            .await
            .map_err(|e| interaction_error("select option", e))
    }

    async fn upload_file(&self, path: &Path) -> DriverResult<()> {
        // File inputs take the absolute path as typed keys.
        self.element
            .send_keys(&path.display().to_string())
            .await
            .map_err(|e| interaction_error("upload file", e))
    }
}
