//! Interaction simulator
//!
//! Drives a loaded document the way a user would: typing into fields,
//! toggling checkboxes and submitting. Every interaction queues `input` /
//! `change` / `submit` notifications and flushes them before returning, so
//! listener effects are visible synchronously and submission snapshots are
//! deterministic.
//!
//! The simulator owns its document and runs on one task. Interactions take
//! `&mut self`, which rules out overlapping calls on the same document.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use formgrade_common::{Error, FieldSnapshot, FieldType, FieldValue, FormSpec, Result};

use crate::config::TimingConfig;
use crate::dom::{Document, EventKind, NodeId, Query};
use crate::resolver::{resolve_id, resolve_submit_button};
use crate::validity::{self, ValidityIssue};

/// What happened when the submit button was clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub form: NodeId,
    pub button: NodeId,
    /// A listener cancelled the submission
    pub prevented: bool,
}

/// Interaction simulator over one document and its rubric
pub struct Simulator {
    document: Document,
    rubric: FormSpec,
    poll_interval: Duration,
    observe_timeout: Duration,
}

impl Simulator {
    /// Create a simulator with default timing
    pub fn new(document: Document, rubric: FormSpec) -> Self {
        Self::with_timing(document, rubric, &TimingConfig::default())
    }

    pub fn with_timing(document: Document, rubric: FormSpec, timing: &TimingConfig) -> Self {
        Self {
            document,
            rubric,
            poll_interval: timing.poll_interval(),
            observe_timeout: timing.observe_timeout(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for attaching listeners
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn rubric(&self) -> &FormSpec {
        &self.rubric
    }

    /// Default timeout used by the `see_*` style helpers
    pub fn observe_timeout(&self) -> Duration {
        self.observe_timeout
    }

    /// Resolve a field id, using the rubric's declared type when the id is
    /// part of the rubric and the generic input fallback otherwise.
    pub fn resolve(&self, field_id: &str) -> Option<NodeId> {
        let field_type = self
            .rubric
            .field(field_id)
            .map(|f| f.field_type.clone())
            .unwrap_or(FieldType::Text);
        resolve_id(self.document.dom(), field_id, &field_type)
    }

    fn resolve_required(&self, field_id: &str) -> Result<NodeId> {
        self.resolve(field_id).ok_or_else(|| {
            formgrade_common::CheckError::FieldNotFound {
                id: field_id.to_string(),
            }
            .into()
        })
    }

    /// Current value of a field: checked state for checkboxes, text value
    /// for everything else.
    pub fn field_value(&self, field_id: &str) -> Option<FieldValue> {
        let node = self.resolve(field_id)?;
        let dom = self.document.dom();
        if dom.control_type(node).as_deref() == Some("checkbox") {
            dom.checked(node).map(FieldValue::Checked)
        } else {
            dom.value(node).map(FieldValue::from)
        }
    }

    /// Set a field's value, then raise `input` and `change`
    pub fn enter_text(&mut self, field_id: &str, text: &str) -> Result<()> {
        let node = self.resolve_required(field_id)?;
        debug!("Entering {:?} into \"{}\"", text, field_id);
        let dom = self.document.dom_mut();
        dom.set_value(node, text)?;
        dom.dispatch(EventKind::Input, node);
        dom.dispatch(EventKind::Change, node);
        self.document.flush();
        Ok(())
    }

    /// Set a checkbox or radio, then raise `input` and `change`
    pub fn set_checked(&mut self, field_id: &str, checked: bool) -> Result<()> {
        let node = self.resolve_required(field_id)?;
        debug!("Setting \"{}\" checked={}", field_id, checked);
        let dom = self.document.dom_mut();
        dom.set_checked(node, checked)?;
        dom.dispatch(EventKind::Input, node);
        dom.dispatch(EventKind::Change, node);
        self.document.flush();
        Ok(())
    }

    /// Raise `submit` on the submit button's form (the first form in the
    /// document when the button sits outside one). Does not validate.
    pub fn click_submit(&mut self) -> Result<SubmitOutcome> {
        let dom = self.document.dom();
        let button = resolve_submit_button(dom, &self.rubric.submit_button)?;
        let form = dom
            .closest(button, "form")
            .or_else(|| dom.query(&Query::tag("form")))
            .ok_or(Error::FormNotFound)?;

        let prevented = self
            .document
            .dispatch_now(EventKind::Submit, form)
            .map_or(false, |event| event.default_prevented());
        info!("Submitted form (prevented: {})", prevented);

        Ok(SubmitOutcome {
            form,
            button,
            prevented,
        })
    }

    /// Flush pending notifications, snapshot every control of `form`, then
    /// raise `submit` on it.
    ///
    /// Checkboxes record their state under id-or-name; radios record their
    /// value under `name`, only when checked; other controls record their
    /// value under id-or-name.
    pub fn submit(&mut self, form: NodeId) -> FieldSnapshot {
        self.document.flush();

        let dom = self.document.dom();
        let mut snapshot = FieldSnapshot::new();
        for control in dom.form_controls(form) {
            let Some(element) = dom.element(control) else {
                continue;
            };
            let key = element.id().or_else(|| element.name());
            match dom.control_type(control).as_deref() {
                Some("checkbox") => {
                    if let (Some(key), Some(checked)) = (key, dom.checked(control)) {
                        snapshot.insert(key, FieldValue::Checked(checked));
                    }
                }
                Some("radio") => {
                    if dom.checked(control) == Some(true) {
                        if let (Some(name), Some(value)) = (element.name(), dom.value(control)) {
                            snapshot.insert(name, value.into());
                        }
                    }
                }
                _ => {
                    if let (Some(key), Some(value)) = (key, dom.value(control)) {
                        snapshot.insert(key, value.into());
                    }
                }
            }
        }

        self.document.dispatch_now(EventKind::Submit, form);
        debug!("Captured {} field value(s) at submission", snapshot.len());
        snapshot
    }

    /// [`Simulator::submit`] on the first form in the document
    pub fn submit_first_form(&mut self) -> Result<FieldSnapshot> {
        let form = self.first_form()?;
        Ok(self.submit(form))
    }

    fn first_form(&self) -> Result<NodeId> {
        self.document
            .dom()
            .query(&Query::tag("form"))
            .ok_or(Error::FormNotFound)
    }

    /// Constraint validation issues for the first form, on current values
    pub fn check_validity(&self) -> Result<Vec<ValidityIssue>> {
        let form = self.first_form()?;
        Ok(validity::check_form(self.document.dom(), form))
    }

    /// Poll `condition` until it holds or `timeout` elapses.
    ///
    /// Pending notifications are flushed before every poll. An error from
    /// the condition ends the wait immediately.
    pub async fn observe<F>(&mut self, mut condition: F, timeout: Duration) -> Result<()>
    where
        F: FnMut(&Document) -> Result<bool>,
    {
        let start = Instant::now();
        loop {
            self.document.flush();
            if condition(&self.document)? {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(Error::Timeout {
                    millis: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Poll until `predicate` holds for the field's current value. A field
    /// that does not resolve yet counts as not satisfied.
    pub async fn observe_field<F>(
        &mut self,
        field_id: &str,
        mut predicate: F,
        timeout: Duration,
    ) -> Result<()>
    where
        F: FnMut(&FieldValue) -> Result<bool>,
    {
        let field_type = self
            .rubric
            .field(field_id)
            .map(|f| f.field_type.clone())
            .unwrap_or(FieldType::Text);
        let id = field_id.to_string();

        self.observe(
            move |document| {
                let dom = document.dom();
                let Some(node) = resolve_id(dom, &id, &field_type) else {
                    return Ok(false);
                };
                let value = if dom.control_type(node).as_deref() == Some("checkbox") {
                    dom.checked(node).map(FieldValue::Checked)
                } else {
                    dom.value(node).map(FieldValue::from)
                };
                match value {
                    Some(value) => predicate(&value),
                    None => Ok(false),
                }
            },
            timeout,
        )
        .await
    }

    /// Wait until the field resolves
    pub async fn see_field(&mut self, field_id: &str) -> Result<()> {
        let timeout = self.observe_timeout;
        let id = field_id.to_string();
        let field_type = self
            .rubric
            .field(field_id)
            .map(|f| f.field_type.clone())
            .unwrap_or(FieldType::Text);
        self.observe(
            move |document| Ok(resolve_id(document.dom(), &id, &field_type).is_some()),
            timeout,
        )
        .await
    }

    /// Wait until the field holds `expected`
    pub async fn see_field_with_value(&mut self, field_id: &str, expected: &FieldValue) -> Result<()> {
        let timeout = self.observe_timeout;
        self.observe_field(field_id, |value| Ok(value == expected), timeout)
            .await
    }

    /// Wait until the submit button resolves
    pub async fn see_submit_button(&mut self) -> Result<()> {
        let timeout = self.observe_timeout;
        let button = self.rubric.submit_button.clone();
        self.observe(
            move |document| Ok(resolve_submit_button(document.dom(), &button).is_ok()),
            timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgrade_common::{FieldSpec, SubmitButtonSpec};

    fn rubric() -> FormSpec {
        FormSpec {
            id: "t".to_string(),
            fields: vec![
                FieldSpec::new("email", FieldType::Email),
                FieldSpec::new("gender", FieldType::Radio),
            ],
            submit_button: SubmitButtonSpec {
                id: "go".to_string(),
                text: None,
            },
        }
    }

    const MARKUP: &str = r#"
        <form>
            <input id="email" type="email">
            <input type="radio" name="gender" value="f">
            <input type="radio" name="gender" value="m">
            <button id="go">Go</button>
        </form>
    "#;

    #[test]
    fn test_enter_text_raises_input_then_change() {
        let mut sim = Simulator::new(Document::parse(MARKUP), rubric());
        sim.enter_text("email", "a@b.co").unwrap();

        let kinds: Vec<EventKind> = sim.document().events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::Input, EventKind::Change]);
        assert_eq!(sim.field_value("email"), Some(FieldValue::from("a@b.co")));
    }

    #[test]
    fn test_missing_field_is_reported_by_id() {
        let mut sim = Simulator::new(Document::parse(MARKUP), rubric());
        let err = sim.enter_text("phone", "1").unwrap_err();
        assert_eq!(err.missing_field(), Some("phone"));
    }

    #[test]
    fn test_radio_field_resolves_through_group_name() {
        let mut sim = Simulator::new(Document::parse(MARKUP), rubric());
        sim.set_checked("gender", true).unwrap();
        let snapshot = sim.submit_first_form().unwrap();
        assert_eq!(snapshot.get("gender"), Some(&FieldValue::from("f")));
    }

    #[test]
    fn test_click_submit_requires_a_form() {
        let doc = Document::parse(r#"<button id="go" type="submit">Go</button>"#);
        let mut sim = Simulator::new(doc, rubric());
        assert!(matches!(sim.click_submit(), Err(Error::FormNotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_errors_propagate_immediately() {
        let mut sim = Simulator::new(Document::parse(MARKUP), rubric());
        let started = Instant::now();
        let err = sim
            .observe(|_| Err(Error::Condition("boom".to_string())), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Condition(msg) if msg == "boom"));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
