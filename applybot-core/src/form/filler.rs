//! State machine submitting one posting's application form.
//!
//! No step counter from the page is trusted: each step is inspected for a
//! continue control or a submit control and the next state follows from
//! what is displayed.
use crate::delay::DelaySimulator;
use crate::form::resolver::{normalize, FieldResolver};
use applybot_common::{ApplyError, FieldValue, Result, SiteSelectors};
use applybot_drivers::{DriverResult, Element, Page};
use tracing::debug;

/// Upper bound on continue activations for one form.
pub const DEFAULT_MAX_FORM_STEPS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// A step is displayed and not yet filled.
    StepPending,
    /// The displayed step's fields have been populated.
    StepFilled,
    /// Only a submit control is displayed.
    AwaitingSubmit,
    Completed,
    Aborted,
}

impl FormState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FormState::Completed | FormState::Aborted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlKind {
    Text,
    Select,
    Checkbox,
    File,
    Other,
}

fn control_kind(tag: &str, input_type: Option<&str>) -> ControlKind {
    match (tag, input_type) {
        ("textarea", _) => ControlKind::Text,
        ("select", _) => ControlKind::Select,
        ("input", None | Some("" | "text" | "email" | "tel")) => ControlKind::Text,
        ("input", Some("checkbox")) => ControlKind::Checkbox,
        ("input", Some("file")) => ControlKind::File,
        _ => ControlKind::Other,
    }
}

/// Name, else id, else placeholder, normalized.
async fn identify(field: &dyn Element) -> DriverResult<Option<String>> {
    for attr in ["name", "id", "placeholder"] {
        if let Some(value) = field.attribute(attr).await? {
            if !value.trim().is_empty() {
                return Ok(Some(normalize(&value)));
            }
        }
    }
    Ok(None)
}

/// Drives one application form from the first displayed step to submission.
pub struct FormFiller<'a> {
    page: &'a dyn Page,
    selectors: &'a SiteSelectors,
    resolver: FieldResolver<'a>,
    delay: DelaySimulator,
    max_steps: usize,
    state: FormState,
    continues: usize,
}

impl<'a> FormFiller<'a> {
    pub fn new(
        page: &'a dyn Page,
        selectors: &'a SiteSelectors,
        resolver: FieldResolver<'a>,
        delay: DelaySimulator,
    ) -> Self {
        Self {
            page,
            selectors,
            resolver,
            delay,
            max_steps: DEFAULT_MAX_FORM_STEPS,
            state: FormState::StepPending,
            continues: 0,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    /// Continue controls activated so far.
    pub fn steps_advanced(&self) -> usize {
        self.continues
    }

    /// Open the form with `apply_button` and drive it to completion.
    pub async fn submit(&mut self, apply_button: &dyn Element) -> Result<()> {
        apply_button.click().await?;
        self.delay.pause().await;
        self.run().await
    }

    /// Advance until `Completed`; the first error leaves the filler `Aborted`.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.advance().await? {
                FormState::Completed => return Ok(()),
                FormState::Aborted => {
                    return Err(ApplyError::Application("form was already aborted".into()))
                }
                _ => {}
            }
        }
    }

    /// Perform exactly one transition. Terminal states are returned as is.
    pub async fn advance(&mut self) -> Result<FormState> {
        let next = match self.state {
            FormState::StepPending => self.fill_step().await.map(|_| FormState::StepFilled),
            FormState::StepFilled => self.leave_step().await,
            FormState::AwaitingSubmit => self
                .activate_submit()
                .await
                .map(|_| FormState::Completed),
            terminal => return Ok(terminal),
        };
        match next {
            Ok(state) => {
                debug!(target: "applybot.form", from = ?self.state, to = ?state, "form transition");
                self.state = state;
                Ok(state)
            }
            Err(err) => {
                debug!(target: "applybot.form", from = ?self.state, error = %err, "form aborted");
                self.state = FormState::Aborted;
                Err(err)
            }
        }
    }

    async fn fill_step(&self) -> Result<usize> {
        let fields = self.page.find_all(&self.selectors.form_fields).await?;
        let mut filled = 0;
        for field in &fields {
            if self.fill_field(field.as_ref()).await? {
                filled += 1;
            }
        }
        debug!(target: "applybot.form", fields = fields.len(), filled, "step filled");
        Ok(filled)
    }

    /// Returns whether the control was touched.
    async fn fill_field(&self, field: &dyn Element) -> Result<bool> {
        let Some(name) = identify(field).await? else {
            return Ok(false);
        };
        let tag = field.tag_name().await?;
        let input_type = field
            .attribute("type")
            .await?
            .map(|t| t.trim().to_ascii_lowercase());

        match control_kind(&tag, input_type.as_deref()) {
            ControlKind::File => match self.resolver.resolve_file(&name) {
                Some(path) => field.upload_file(path).await?,
                None => return Ok(false),
            },
            ControlKind::Text => match self.resolver.resolve(&name) {
                Some(FieldValue::Text(value)) if !value.is_empty() => {
                    field.clear().await?;
                    field.type_text(&value).await?;
                }
                _ => return Ok(false),
            },
            ControlKind::Select => match self.resolver.resolve(&name) {
                Some(FieldValue::Text(value)) if !value.is_empty() => {
                    field.select_option(&value).await?
                }
                _ => return Ok(false),
            },
            ControlKind::Checkbox => match self.resolver.resolve(&name) {
                Some(FieldValue::Flag(true)) => field.click().await?,
                _ => return Ok(false),
            },
            ControlKind::Other => return Ok(false),
        }
        debug!(target: "applybot.form", field = %name, %tag, "field filled");
        Ok(true)
    }

    async fn leave_step(&mut self) -> Result<FormState> {
        if let Some(next) = self.page.find_one(&self.selectors.continue_button).await? {
            if self.continues >= self.max_steps {
                return Err(ApplyError::Application(format!(
                    "form did not reach a submit control within {} steps",
                    self.max_steps
                )));
            }
            self.delay.pause().await;
            next.click().await?;
            self.continues += 1;
            return Ok(FormState::StepPending);
        }
        if self
            .page
            .find_one(&self.selectors.submit_button)
            .await?
            .is_some()
        {
            return Ok(FormState::AwaitingSubmit);
        }
        Err(ApplyError::Application(format!(
            "element not found: neither {} nor {} is displayed",
            self.selectors.continue_button, self.selectors.submit_button
        )))
    }

    async fn activate_submit(&self) -> Result<()> {
        let button = self
            .page
            .find_one(&self.selectors.submit_button)
            .await?
            .ok_or_else(|| {
                ApplyError::Application(format!(
                    "element not found: {}",
                    self.selectors.submit_button
                ))
            })?;
        button.click().await?;
        Ok(())
    }
}
