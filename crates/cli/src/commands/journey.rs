//! Journey command
//!
//! Runs a scripted user journey over a document and prints each step and
//! the values captured at submission.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use formgrade_common::FormSpec;
use formgrade_engine::{Document, Journey, JourneyReport, StepResult, GraderConfig};

use crate::output::{
    print_error, print_json, print_list, print_success, print_warning, OutputFormat, TableDisplay,
};

#[derive(Args)]
pub struct JourneyArgs {
    /// Rubric JSON file
    #[arg(short, long)]
    pub rubric: PathBuf,

    /// HTML document to exercise
    #[arg(short, long)]
    pub document: PathBuf,

    /// Observation timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl TableDisplay for StepResult {
    fn headers() -> Vec<&'static str> {
        vec!["Step", "Result", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            if self.success { "✓" } else { "✗" }.to_string(),
            format!("{} ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// One captured field value
#[derive(Serialize)]
pub struct SnapshotRow {
    pub field: String,
    pub value: String,
}

impl TableDisplay for SnapshotRow {
    fn headers() -> Vec<&'static str> {
        vec!["Field", "Submitted Value"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.field.clone(), self.value.clone()]
    }
}

pub async fn execute(args: JourneyArgs, mut config: GraderConfig, format: OutputFormat) -> Result<bool> {
    if let Some(timeout_ms) = args.timeout_ms {
        config.timing.observe_timeout_ms = timeout_ms;
    }

    let rubric = FormSpec::from_file(&args.rubric)
        .with_context(|| format!("Failed to load rubric {}", args.rubric.display()))?;
    let document = Document::from_file(&args.document)
        .with_context(|| format!("Failed to load document {}", args.document.display()))?;

    info!(
        "Running journey for rubric {} (observe timeout {} ms)",
        rubric.id, config.timing.observe_timeout_ms
    );
    let report = Journey::new(document, rubric, &config).run().await;
    print_report(&report, format);

    Ok(report.is_success())
}

fn print_report(report: &JourneyReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(report);
        return;
    }

    print_list(&report.steps, format);

    if let Some(snapshot) = &report.snapshot {
        println!();
        let rows: Vec<SnapshotRow> = snapshot
            .iter()
            .map(|(field, value)| SnapshotRow {
                field: field.clone(),
                value: value.to_string(),
            })
            .collect();
        print_list(&rows, format);
    }

    for issue in &report.validity {
        print_warning(&issue.message);
    }

    let passed = report.steps.iter().filter(|s| s.success).count();
    let summary = format!(
        "{}/{} steps passed ({} ms)",
        passed,
        report.steps.len(),
        report.duration_ms
    );
    if report.is_success() {
        print_success(&summary);
    } else {
        print_error(&summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_row() {
        let step = StepResult {
            name: "see submit button".to_string(),
            success: false,
            duration_ms: 5000,
            error: Some("Timeout waiting for condition after 5000ms".to_string()),
        };
        assert_eq!(
            step.row(),
            vec![
                "see submit button",
                "✗",
                "5000 ms",
                "Timeout waiting for condition after 5000ms"
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_runs_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let rubric = dir.path().join("rubric.json");
        let document = dir.path().join("index.html");
        std::fs::write(
            &rubric,
            r#"{"id":"t","fields":[{"id":"email","type":"email","required":true}],"submitButton":{"id":"go"}}"#,
        )
        .unwrap();
        std::fs::write(
            &document,
            r#"<form><input id="email" type="email" required><button id="go" type="submit">Go</button></form>"#,
        )
        .unwrap();

        let args = JourneyArgs {
            rubric,
            document,
            timeout_ms: Some(100),
        };
        let success = execute(args, GraderConfig::default(), OutputFormat::Plain)
            .await
            .unwrap();
        assert!(success);
    }
}
