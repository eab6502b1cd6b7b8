//! Scripted user journey
//!
//! Walks a document the way a student's form would be exercised by hand:
//! find the fields, type into them, tick the boxes, submit, and capture what
//! was submitted. Steps run in order and a failing step does not stop the
//! ones after it.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use formgrade_common::{FieldSnapshot, FieldSpec, FieldType, FieldValue, FormSpec, Result};

use crate::config::{GraderConfig, SampleValues};
use crate::dom::Document;
use crate::simulator::Simulator;
use crate::validity::ValidityIssue;

/// Number of text-like fields exercised by the typing step
const TEXT_FIELD_SAMPLE: usize = 3;

/// Result of one journey step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of a whole journey
#[derive(Debug, Clone, Serialize)]
pub struct JourneyReport {
    pub rubric_id: String,
    pub steps: Vec<StepResult>,
    /// Values captured at submission
    pub snapshot: Option<FieldSnapshot>,
    /// Constraint issues on the values as submitted
    pub validity: Vec<ValidityIssue>,
    /// Whether a listener cancelled the submit click
    pub submit_prevented: Option<bool>,
    pub duration_ms: u64,
}

impl JourneyReport {
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.success)
    }
}

/// A journey over one document
pub struct Journey {
    simulator: Simulator,
    samples: SampleValues,
}

impl Journey {
    pub fn new(document: Document, rubric: FormSpec, config: &GraderConfig) -> Self {
        Self {
            simulator: Simulator::with_timing(document, rubric, &config.timing),
            samples: config.samples.clone(),
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Mutable access, e.g. to attach listeners before running
    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.simulator
    }

    /// Put a plausible value into one field: tick checkboxes and radios,
    /// pick the first non-empty option of a select, and type the sample
    /// value for the field's type into anything else.
    pub fn fill_field(&mut self, field: &FieldSpec) -> Result<()> {
        match field.field_type {
            FieldType::Checkbox | FieldType::Radio => self.simulator.set_checked(&field.id, true),
            FieldType::Select => {
                let choice = self.simulator.resolve(&field.id).and_then(|node| {
                    self.simulator
                        .document()
                        .dom()
                        .option_values(node)
                        .into_iter()
                        .find(|value| !value.is_empty())
                });
                match choice {
                    Some(value) => self.simulator.enter_text(&field.id, &value),
                    None => self.simulator.enter_text(&field.id, ""),
                }
            }
            ref other => {
                let value = self.samples.for_type(other).to_string();
                self.simulator.enter_text(&field.id, &value)
            }
        }
    }

    /// Fill every required field
    pub fn fill_required_fields(&mut self) -> Result<()> {
        let fields: Vec<FieldSpec> = self.simulator.rubric().required_fields().cloned().collect();
        for field in &fields {
            self.fill_field(field)?;
        }
        Ok(())
    }

    /// Fill every field; optional checkboxes are left as they are
    pub fn fill_all_fields(&mut self) -> Result<()> {
        let fields: Vec<FieldSpec> = self
            .simulator
            .rubric()
            .fields
            .iter()
            .filter(|f| f.field_type.as_str() != "submit")
            .filter(|f| f.field_type != FieldType::Checkbox || f.required)
            .cloned()
            .collect();
        for field in &fields {
            self.fill_field(field)?;
        }
        Ok(())
    }

    async fn see_required_fields(&mut self) -> Result<()> {
        let ids: Vec<String> = self
            .simulator
            .rubric()
            .required_fields()
            .map(|f| f.id.clone())
            .collect();
        for id in &ids {
            self.simulator.see_field(id).await?;
        }
        Ok(())
    }

    async fn type_into(&mut self, fields: Vec<FieldSpec>) -> Result<()> {
        for field in &fields {
            let value = self.samples.for_type(&field.field_type).to_string();
            self.simulator.enter_text(&field.id, &value)?;
            self.simulator
                .see_field_with_value(&field.id, &FieldValue::Text(value))
                .await?;
        }
        Ok(())
    }

    async fn tick_checkboxes(&mut self) -> Result<()> {
        let ids: Vec<String> = self.fields_of(|t| *t == FieldType::Checkbox).map(|f| f.id).collect();
        for id in &ids {
            self.simulator.set_checked(id, true)?;
            self.simulator
                .see_field_with_value(id, &FieldValue::Checked(true))
                .await?;
        }
        Ok(())
    }

    fn fields_of<P>(&self, predicate: P) -> impl Iterator<Item = FieldSpec>
    where
        P: Fn(&FieldType) -> bool,
    {
        self.simulator
            .rubric()
            .fields
            .iter()
            .filter(|f| predicate(&f.field_type))
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Run every step and collect the results
    pub async fn run(mut self) -> JourneyReport {
        let start = Instant::now();
        let rubric_id = self.simulator.rubric().id.clone();
        info!("Running journey for \"{}\"", rubric_id);

        let mut steps = Vec::new();

        let started = Instant::now();
        let result = self.see_required_fields().await;
        record(&mut steps, "see required fields", started, result);

        let started = Instant::now();
        let result = self.simulator.see_submit_button().await;
        record(&mut steps, "see submit button", started, result);

        let started = Instant::now();
        let text_fields: Vec<FieldSpec> = self
            .fields_of(FieldType::is_textual)
            .take(TEXT_FIELD_SAMPLE)
            .collect();
        let result = self.type_into(text_fields).await;
        record(&mut steps, "enter text fields", started, result);

        let started = Instant::now();
        let number_fields: Vec<FieldSpec> = self.fields_of(|t| *t == FieldType::Number).collect();
        let result = self.type_into(number_fields).await;
        record(&mut steps, "enter number fields", started, result);

        let started = Instant::now();
        let result = self.tick_checkboxes().await;
        record(&mut steps, "check checkboxes", started, result);

        let started = Instant::now();
        let result = self.fill_required_fields();
        record(&mut steps, "fill required fields", started, result);

        let started = Instant::now();
        let mut submit_prevented = None;
        let result = self.fill_all_fields().and_then(|()| {
            let outcome = self.simulator.click_submit()?;
            submit_prevented = Some(outcome.prevented);
            Ok(())
        });
        record(&mut steps, "fill all fields and submit", started, result);

        let started = Instant::now();
        let mut snapshot = None;
        let mut validity = Vec::new();
        let result = self.simulator.check_validity().and_then(|issues| {
            validity = issues;
            snapshot = Some(self.simulator.submit_first_form()?);
            Ok(())
        });
        record(&mut steps, "capture submission", started, result);

        let report = JourneyReport {
            rubric_id,
            steps,
            snapshot,
            validity,
            submit_prevented,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Journey finished: {}/{} steps passed ({} ms)",
            report.steps.iter().filter(|s| s.success).count(),
            report.steps.len(),
            report.duration_ms
        );
        report
    }
}

fn record(steps: &mut Vec<StepResult>, name: &str, started: Instant, result: Result<()>) {
    let error = match result {
        Ok(()) => None,
        Err(e) => {
            error!("✗ {} - {}", name, e);
            Some(e.to_string())
        }
    };
    steps.push(StepResult {
        name: name.to_string(),
        success: error.is_none(),
        duration_ms: started.elapsed().as_millis() as u64,
        error,
    });
}
