//! Scripted in-memory browser (testing only)
//!
//! [`FakeBrowser`] implements the capability traits over a tiny model of a
//! job board: pages of postings, an optional multi-step application form per
//! posting, and a pager. It interprets the selectors of a
//! [`SiteSelectors`] value, records every interaction in a journal, and can
//! be told to fail launches, navigations, page turns, reloads, or the
//! opening of specific postings. Like a live document, every navigation,
//! reload or page turn makes previously returned card handles stale.

use crate::capability::{BrowserDriver, BrowserSession, Element, Page, WaitUntil};
use crate::error::{DriverError, DriverResult};
use applybot_common::SiteSelectors;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Launch(Option<PathBuf>),
    Close,
    Navigate(String),
    Reload,
    Click(String),
    Clear(String),
    Type { target: String, text: String },
    Select { target: String, value: String },
    Upload { target: String, path: PathBuf },
}

/// Failure raised when a posting's card is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    ElementNotFound,
    Timeout,
    Unknown,
}

impl FakeFailure {
    fn into_error(self, what: &str) -> DriverError {
        match self {
            FakeFailure::ElementNotFound => DriverError::ElementNotFound(what.to_string()),
            FakeFailure::Timeout => DriverError::Timeout(what.to_string()),
            FakeFailure::Unknown => DriverError::Other(anyhow::anyhow!("{what} exploded")),
        }
    }
}

/// A form control and whatever was entered into it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FakeField {
    pub tag: String,
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub options: Vec<String>,
    pub value: String,
    pub selected: Option<String>,
    pub checked: bool,
    pub uploaded: Option<PathBuf>,
}

impl FakeField {
    fn input(input_type: &str, name: &str) -> Self {
        Self {
            tag: "input".into(),
            input_type: Some(input_type.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn text(name: &str) -> Self {
        Self::input("text", name)
    }

    pub fn email(name: &str) -> Self {
        Self::input("email", name)
    }

    pub fn tel(name: &str) -> Self {
        Self::input("tel", name)
    }

    pub fn checkbox(name: &str) -> Self {
        Self::input("checkbox", name)
    }

    pub fn file(name: &str) -> Self {
        Self::input("file", name)
    }

    pub fn textarea(name: &str) -> Self {
        Self {
            tag: "textarea".into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn select(name: &str, options: &[&str]) -> Self {
        Self {
            tag: "select".into(),
            name: Some(name.into()),
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Identify the control by `id` instead of `name`.
    pub fn with_id(mut self, id: &str) -> Self {
        self.name = None;
        self.id = Some(id.into());
        self
    }

    /// Identify the control by `placeholder` only.
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.name = None;
        self.id = None;
        self.placeholder = Some(placeholder.into());
        self
    }

    fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .or_else(|| self.placeholder.clone())
            .unwrap_or_else(|| "<unnamed>".into())
    }
}

/// One displayed step of an application form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FakeStep {
    pub fields: Vec<FakeField>,
}

impl FakeStep {
    pub fn new(fields: Vec<FakeField>) -> Self {
        Self { fields }
    }
}

/// A job card on a result page.
#[derive(Debug, Clone)]
pub struct FakePosting {
    pub title: String,
    pub company: String,
    pub easy_apply: bool,
    pub steps: Vec<FakeStep>,
    pub open_failure: Option<FakeFailure>,
    /// When false, no continue or submit control is ever displayed.
    pub form_controls: bool,
}

impl FakePosting {
    /// An easy-apply posting with a single empty step.
    pub fn new(title: &str, company: &str) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            easy_apply: true,
            steps: vec![FakeStep::default()],
            open_failure: None,
            form_controls: true,
        }
    }

    pub fn with_steps(mut self, steps: Vec<FakeStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn without_easy_apply(mut self) -> Self {
        self.easy_apply = false;
        self
    }

    pub fn failing_open(mut self, failure: FakeFailure) -> Self {
        self.open_failure = Some(failure);
        self
    }

    pub fn without_form_controls(mut self) -> Self {
        self.form_controls = false;
        self
    }
}

/// A form that reached its submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedApplication {
    pub title: String,
    pub company: String,
    pub steps: Vec<FakeStep>,
}

impl SubmittedApplication {
    /// Find a filled control by its name, id, or placeholder.
    pub fn field(&self, label: &str) -> Option<&FakeField> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.label() == label)
    }
}

#[derive(Debug)]
struct FormCursor {
    posting: usize,
    step: usize,
    steps: Vec<FakeStep>,
    controls: bool,
    done: bool,
}

impl FormCursor {
    fn active(&self) -> bool {
        !self.done && self.step < self.steps.len()
    }

    fn shows_continue(&self) -> bool {
        self.controls && self.active() && self.step + 1 < self.steps.len()
    }

    fn shows_submit(&self) -> bool {
        self.controls && self.active() && self.step + 1 == self.steps.len()
    }
}

#[derive(Debug)]
struct DomState {
    selectors: SiteSelectors,
    pages: Vec<Vec<FakePosting>>,
    page: usize,
    loaded: bool,
    open: Option<usize>,
    form: Option<FormCursor>,
    submitted: Vec<SubmittedApplication>,
    journal: Vec<Action>,
    launch_failures: usize,
    navigate_failures: usize,
    page_turn_failures: usize,
    page_turn_stalls: usize,
    stalled: bool,
    reload_fails: bool,
    reload_attempts: usize,
    launches: usize,
    live_sessions: usize,
    epoch: u64,
}

impl DomState {
    fn postings(&self) -> &[FakePosting] {
        self.pages.get(self.page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Close any open posting and invalidate outstanding card handles.
    fn reset_view(&mut self) {
        self.open = None;
        self.form = None;
        self.epoch += 1;
    }

    fn locate(&self, selector: &str) -> Vec<Node> {
        let s = &self.selectors;
        if !self.loaded {
            return Vec::new();
        }
        let (page, epoch) = (self.page, self.epoch);
        if selector == s.search_input {
            vec![Node::SearchInput]
        } else if selector == s.job_card {
            if self.stalled {
                return Vec::new();
            }
            (0..self.postings().len())
                .map(|index| Node::Card { epoch, index })
                .collect()
        } else if selector == s.apply_button {
            match self.open {
                Some(i) if self.postings()[i].easy_apply => vec![Node::ApplyButton],
                _ => Vec::new(),
            }
        } else if selector == s.continue_button {
            match &self.form {
                Some(f) if f.shows_continue() => vec![Node::ContinueButton],
                _ => Vec::new(),
            }
        } else if selector == s.submit_button {
            match &self.form {
                Some(f) if f.shows_submit() => vec![Node::SubmitButton],
                _ => Vec::new(),
            }
        } else if selector == s.next_page {
            if page + 1 < self.pages.len() {
                vec![Node::NextPage]
            } else {
                Vec::new()
            }
        } else if selector == s.form_fields {
            match &self.form {
                Some(f) if f.active() => (0..f.steps[f.step].fields.len())
                    .map(|index| Node::Field {
                        step: f.step,
                        index,
                    })
                    .collect(),
                _ => Vec::new(),
            }
        } else {
            Vec::new()
        }
    }

    fn field_mut(&mut self, step: usize, index: usize) -> DriverResult<&mut FakeField> {
        match &mut self.form {
            Some(f) if f.active() && f.step == step => f.steps[step]
                .fields
                .get_mut(index)
                .ok_or_else(|| DriverError::ElementNotFound(format!("field #{index}"))),
            _ => Err(DriverError::ElementNotFound(format!(
                "stale element reference: field #{index}"
            ))),
        }
    }

    fn card(&self, epoch: u64, index: usize) -> DriverResult<&FakePosting> {
        if epoch != self.epoch || !self.loaded {
            return Err(DriverError::ElementNotFound(format!(
                "stale element reference: card #{index}"
            )));
        }
        self.postings()
            .get(index)
            .ok_or_else(|| DriverError::ElementNotFound(format!("card #{index}")))
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    SearchInput,
    Card { epoch: u64, index: usize },
    CardTitle { epoch: u64, index: usize },
    CardCompany { epoch: u64, index: usize },
    ApplyButton,
    ContinueButton,
    SubmitButton,
    NextPage,
    Field { step: usize, index: usize },
}

#[derive(Debug, Clone)]
struct Shared(Arc<Mutex<DomState>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DomState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn elements(&self, nodes: Vec<Node>) -> Vec<Box<dyn Element>> {
        nodes
            .into_iter()
            .map(|node| {
                Box::new(FakeElement {
                    dom: self.clone(),
                    node,
                }) as Box<dyn Element>
            })
            .collect()
    }
}

/// In-memory browser; clones share the same DOM.
#[derive(Debug, Clone)]
pub struct FakeBrowser {
    dom: Shared,
}

impl FakeBrowser {
    /// A board with the given result pages, using the default selectors.
    pub fn new(pages: Vec<Vec<FakePosting>>) -> Self {
        Self {
            dom: Shared(Arc::new(Mutex::new(DomState {
                selectors: SiteSelectors::default(),
                pages,
                page: 0,
                loaded: false,
                open: None,
                form: None,
                submitted: Vec::new(),
                journal: Vec::new(),
                launch_failures: 0,
                navigate_failures: 0,
                page_turn_failures: 0,
                page_turn_stalls: 0,
                stalled: false,
                reload_fails: false,
                reload_attempts: 0,
                launches: 0,
                live_sessions: 0,
                epoch: 0,
            }))),
        }
    }

    pub fn with_selectors(self, selectors: SiteSelectors) -> Self {
        self.dom.lock().selectors = selectors;
        self
    }

    pub fn fail_launches(self, n: usize) -> Self {
        self.dom.lock().launch_failures = n;
        self
    }

    pub fn fail_navigations(self, n: usize) -> Self {
        self.dom.lock().navigate_failures = n;
        self
    }

    pub fn fail_page_turns(self, n: usize) -> Self {
        self.dom.lock().page_turn_failures = n;
        self
    }

    /// The next `n` page turns land on the new page but leave its result
    /// list unrendered until the page is reloaded.
    pub fn stall_page_turns(self, n: usize) -> Self {
        self.dom.lock().page_turn_stalls = n;
        self
    }

    pub fn fail_reloads(self) -> Self {
        self.dom.lock().reload_fails = true;
        self
    }

    pub fn journal(&self) -> Vec<Action> {
        self.dom.lock().journal.clone()
    }

    /// Labels of every recorded click, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.dom
            .lock()
            .journal
            .iter()
            .filter_map(|a| match a {
                Action::Click(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, action: &Action) -> usize {
        self.dom.lock().journal.iter().filter(|a| *a == action).count()
    }

    pub fn submitted(&self) -> Vec<SubmittedApplication> {
        self.dom.lock().submitted.clone()
    }

    /// Reloads requested, including failed ones.
    pub fn reload_attempts(&self) -> usize {
        self.dom.lock().reload_attempts
    }

    pub fn launches(&self) -> usize {
        self.dom.lock().launches
    }

    pub fn live_sessions(&self) -> usize {
        self.dom.lock().live_sessions
    }

    /// Index of the result page currently displayed.
    pub fn current_page(&self) -> usize {
        self.dom.lock().page
    }

    /// Open `posting` on the current page directly, bypassing the engine.
    pub fn open_posting(&self, index: usize) {
        let mut dom = self.dom.lock();
        dom.loaded = true;
        dom.open = Some(index);
        dom.form = None;
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn launch(&self, profile_dir: Option<&Path>) -> DriverResult<Box<dyn BrowserSession>> {
        let mut dom = self.dom.lock();
        if dom.launch_failures > 0 {
            dom.launch_failures -= 1;
            return Err(DriverError::Launch("scripted launch failure".into()));
        }
        dom.launches += 1;
        dom.live_sessions += 1;
        dom.loaded = false;
        dom.reset_view();
        dom.journal
            .push(Action::Launch(profile_dir.map(Path::to_path_buf)));
        Ok(Box::new(FakeSession {
            dom: self.dom.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct FakeSession {
    dom: Shared,
    closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(&self) -> DriverResult<Box<dyn Page>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::SessionClosed);
        }
        Ok(Box::new(FakePage {
            dom: self.dom.clone(),
        }))
    }

    async fn close(&self) -> DriverResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut dom = self.dom.lock();
            dom.live_sessions = dom.live_sessions.saturating_sub(1);
            dom.journal.push(Action::Close);
        }
        Ok(())
    }
}

struct FakePage {
    dom: Shared,
}

#[async_trait]
impl Page for FakePage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        if dom.navigate_failures > 0 {
            dom.navigate_failures -= 1;
            return Err(DriverError::Navigation(format!("{url}: scripted failure")));
        }
        dom.loaded = true;
        dom.page = 0;
        dom.stalled = false;
        dom.reset_view();
        dom.journal.push(Action::Navigate(url.to_string()));
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str) -> DriverResult<Box<dyn Element>> {
        let nodes = self.dom.lock().locate(selector);
        self.dom
            .elements(nodes)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::Timeout(selector.to_string()))
    }

    async fn find_one(&self, selector: &str) -> DriverResult<Option<Box<dyn Element>>> {
        let nodes = self.dom.lock().locate(selector);
        Ok(self.dom.elements(nodes).into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn Element>>> {
        let nodes = self.dom.lock().locate(selector);
        Ok(self.dom.elements(nodes))
    }

    async fn reload(&self, _wait: WaitUntil) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        dom.reload_attempts += 1;
        if dom.reload_fails {
            return Err(DriverError::Network("scripted reload failure".into()));
        }
        dom.stalled = false;
        dom.reset_view();
        dom.journal.push(Action::Reload);
        Ok(())
    }
}

struct FakeElement {
    dom: Shared,
    node: Node,
}

impl FakeElement {
    fn label(&self, dom: &DomState) -> String {
        match self.node {
            Node::SearchInput => "search".into(),
            Node::Card { epoch, index }
            | Node::CardTitle { epoch, index }
            | Node::CardCompany { epoch, index } => dom
                .card(epoch, index)
                .map(|p| format!("card:{}", p.company))
                .unwrap_or_else(|_| "card:<stale>".into()),
            Node::ApplyButton => "apply".into(),
            Node::ContinueButton => "continue".into(),
            Node::SubmitButton => "submit".into(),
            Node::NextPage => "next-page".into(),
            Node::Field { step, index } => dom
                .form
                .as_ref()
                .and_then(|f| f.steps.get(step))
                .and_then(|s| s.fields.get(index))
                .map(FakeField::label)
                .unwrap_or_else(|| "<stale>".into()),
        }
    }
}

#[async_trait]
impl Element for FakeElement {
    async fn find_one(&self, selector: &str) -> DriverResult<Option<Box<dyn Element>>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn Element>>> {
        let nodes = {
            let dom = self.dom.lock();
            match self.node {
                Node::Card { epoch, index } if selector == dom.selectors.card_title => {
                    vec![Node::CardTitle { epoch, index }]
                }
                Node::Card { epoch, index } if selector == dom.selectors.card_company => {
                    vec![Node::CardCompany { epoch, index }]
                }
                _ => Vec::new(),
            }
        };
        Ok(self.dom.elements(nodes))
    }

    async fn text(&self) -> DriverResult<String> {
        let dom = self.dom.lock();
        match self.node {
            Node::CardTitle { epoch, index } => Ok(dom.card(epoch, index)?.title.clone()),
            Node::CardCompany { epoch, index } => Ok(dom.card(epoch, index)?.company.clone()),
            Node::Card { epoch, index } => {
                let p = dom.card(epoch, index)?;
                Ok(format!("{}\n{}", p.title, p.company))
            }
            _ => Ok(self.label(&dom)),
        }
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        let mut dom = self.dom.lock();
        match self.node {
            Node::Field { step, index } => {
                let field = dom.field_mut(step, index)?;
                Ok(match name {
                    "name" => field.name.clone(),
                    "id" => field.id.clone(),
                    "placeholder" => field.placeholder.clone(),
                    "type" => field.input_type.clone(),
                    _ => None,
                })
            }
            _ => Ok(None),
        }
    }

    async fn tag_name(&self) -> DriverResult<String> {
        let mut dom = self.dom.lock();
        Ok(match self.node {
            Node::SearchInput => "input".into(),
            Node::Card { .. } => "li".into(),
            Node::CardTitle { .. } => "h3".into(),
            Node::CardCompany { .. } => "div".into(),
            Node::ApplyButton | Node::ContinueButton | Node::SubmitButton | Node::NextPage => {
                "button".into()
            }
            Node::Field { step, index } => dom.field_mut(step, index)?.tag.clone(),
        })
    }

    async fn click(&self) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        let label = self.label(&dom);
        match self.node {
            Node::Card { epoch, index } => {
                let posting = dom.card(epoch, index)?;
                if let Some(failure) = posting.open_failure {
                    return Err(failure.into_error(&label));
                }
                dom.open = Some(index);
                dom.form = None;
            }
            Node::ApplyButton => {
                let index = dom
                    .open
                    .ok_or_else(|| DriverError::ElementNotFound("apply".into()))?;
                let posting = dom.postings()[index].clone();
                dom.form = Some(FormCursor {
                    posting: index,
                    step: 0,
                    steps: posting.steps,
                    controls: posting.form_controls,
                    done: false,
                });
            }
            Node::ContinueButton => match &mut dom.form {
                Some(f) if f.shows_continue() => f.step += 1,
                _ => return Err(DriverError::ElementNotFound("continue".into())),
            },
            Node::SubmitButton => {
                let submitted = match &mut dom.form {
                    Some(f) if f.shows_submit() => {
                        f.done = true;
                        (f.posting, f.steps.clone())
                    }
                    _ => return Err(DriverError::ElementNotFound("submit".into())),
                };
                let posting = dom.postings()[submitted.0].clone();
                dom.submitted.push(SubmittedApplication {
                    title: posting.title,
                    company: posting.company,
                    steps: submitted.1,
                });
            }
            Node::NextPage => {
                if dom.page_turn_failures > 0 {
                    dom.page_turn_failures -= 1;
                    return Err(DriverError::Navigation("next page: scripted failure".into()));
                }
                if dom.page + 1 >= dom.pages.len() {
                    return Err(DriverError::ElementNotFound("next-page".into()));
                }
                dom.page += 1;
                dom.reset_view();
                if dom.page_turn_stalls > 0 {
                    dom.page_turn_stalls -= 1;
                    dom.stalled = true;
                }
            }
            Node::Field { step, index } => {
                let field = dom.field_mut(step, index)?;
                if field.input_type.as_deref() == Some("checkbox") {
                    field.checked = !field.checked;
                }
            }
            Node::SearchInput | Node::CardTitle { .. } | Node::CardCompany { .. } => {}
        }
        dom.journal.push(Action::Click(label));
        Ok(())
    }

    async fn clear(&self) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        let label = self.label(&dom);
        if let Node::Field { step, index } = self.node {
            dom.field_mut(step, index)?.value.clear();
        }
        dom.journal.push(Action::Clear(label));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        let label = self.label(&dom);
        if let Node::Field { step, index } = self.node {
            dom.field_mut(step, index)?.value.push_str(text);
        }
        dom.journal.push(Action::Type {
            target: label,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn select_option(&self, value: &str) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        let label = self.label(&dom);
        let Node::Field { step, index } = self.node else {
            return Err(DriverError::Interaction(format!("{label} is not a select")));
        };
        let field = dom.field_mut(step, index)?;
        if !field.options.iter().any(|o| o == value) {
            return Err(DriverError::Interaction(format!(
                "{label} has no option {value:?}"
            )));
        }
        field.selected = Some(value.to_string());
        dom.journal.push(Action::Select {
            target: label,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> DriverResult<()> {
        let mut dom = self.dom.lock();
        let label = self.label(&dom);
        let Node::Field { step, index } = self.node else {
            return Err(DriverError::Interaction(format!("{label} is not a file input")));
        };
        dom.field_mut(step, index)?.uploaded = Some(path.to_path_buf());
        dom.journal.push(Action::Upload {
            target: label,
            path: path.to_path_buf(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> FakeBrowser {
        FakeBrowser::new(vec![
            vec![FakePosting::new("Engineer", "Globex").with_steps(vec![
                FakeStep::new(vec![FakeField::text("firstName")]),
                FakeStep::new(vec![FakeField::select("country", &["DE", "US"])]),
            ])],
            vec![FakePosting::new("Analyst", "Initech")],
        ])
    }

    #[tokio::test]
    async fn walks_a_two_step_form() {
        let browser = board();
        let s = SiteSelectors::default();
        let session = browser.launch(None).await.unwrap();
        let page = session.new_page().await.unwrap();
        page.navigate(&s.search_url).await.unwrap();

        let cards = page.find_all(&s.job_card).await.unwrap();
        assert_eq!(cards.len(), 1);
        let company = cards[0].find_one(&s.card_company).await.unwrap().unwrap();
        assert_eq!(company.text().await.unwrap(), "Globex");

        cards[0].click().await.unwrap();
        page.find_one(&s.apply_button).await.unwrap().unwrap().click().await.unwrap();

        let fields = page.find_all(&s.form_fields).await.unwrap();
        assert_eq!(fields[0].attribute("name").await.unwrap().as_deref(), Some("firstName"));
        fields[0].type_text("Jane").await.unwrap();
        assert!(page.find_one(&s.submit_button).await.unwrap().is_none());
        page.find_one(&s.continue_button).await.unwrap().unwrap().click().await.unwrap();

        // the old step's handles are stale now
        assert!(fields[0].type_text("x").await.is_err());

        let fields = page.find_all(&s.form_fields).await.unwrap();
        assert_eq!(fields[0].tag_name().await.unwrap(), "select");
        assert!(fields[0].select_option("FR").await.is_err());
        fields[0].select_option("DE").await.unwrap();
        page.find_one(&s.submit_button).await.unwrap().unwrap().click().await.unwrap();

        let done = browser.submitted();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].field("firstName").unwrap().value, "Jane");
        assert_eq!(done[0].field("country").unwrap().selected.as_deref(), Some("DE"));
    }

    #[tokio::test]
    async fn pager_and_scripted_failures() {
        let browser = board().fail_launches(1).fail_page_turns(1).fail_reloads();
        assert!(browser.launch(None).await.is_err());
        let session = browser.launch(Some(Path::new("/p"))).await.unwrap();
        assert_eq!(browser.launches(), 1);

        let page = session.new_page().await.unwrap();
        let s = SiteSelectors::default();
        page.navigate(&s.search_url).await.unwrap();
        let next = page.find_one(&s.next_page).await.unwrap().unwrap();
        assert!(matches!(next.click().await, Err(DriverError::Navigation(_))));
        next.click().await.unwrap();
        assert_eq!(browser.current_page(), 1);
        assert!(page.find_one(&s.next_page).await.unwrap().is_none());
        assert!(page.reload(WaitUntil::NetworkIdle).await.is_err());
        assert_eq!(browser.reload_attempts(), 1);
        assert_eq!(browser.count(&Action::Reload), 0);

        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(browser.live_sessions(), 0);
        assert_eq!(browser.count(&Action::Close), 1);
        assert!(session.new_page().await.is_err());
    }

    #[tokio::test]
    async fn reloads_and_page_turns_invalidate_card_handles() {
        let browser = board().stall_page_turns(1);
        let s = SiteSelectors::default();
        let session = browser.launch(None).await.unwrap();
        let page = session.new_page().await.unwrap();
        page.navigate(&s.search_url).await.unwrap();

        let cards = page.find_all(&s.job_card).await.unwrap();
        page.reload(WaitUntil::NetworkIdle).await.unwrap();
        assert!(matches!(cards[0].text().await, Err(DriverError::ElementNotFound(_))));
        assert!(cards[0].click().await.is_err());

        let cards = page.find_all(&s.job_card).await.unwrap();
        assert_eq!(cards[0].text().await.unwrap(), "Engineer\nGlobex");

        page.find_one(&s.next_page).await.unwrap().unwrap().click().await.unwrap();
        assert_eq!(browser.current_page(), 1);
        assert!(cards[0].text().await.is_err());
        assert!(matches!(
            page.wait_for_selector(&s.job_card).await,
            Err(DriverError::Timeout(_))
        ));
        page.reload(WaitUntil::NetworkIdle).await.unwrap();
        let cards = page.find_all(&s.job_card).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].text().await.unwrap(), "Analyst\nInitech");
    }
}
