//! Grade command
//!
//! Grades a document against a rubric and prints per-field outcomes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use formgrade_engine::runner::FieldReport;
use formgrade_engine::{CheckKind, GradeReport, Grader, GraderConfig};

use crate::output::{
    outcome_symbol, print_error, print_info, print_json, print_list, print_success, OutputFormat,
    TableDisplay,
};

#[derive(Args)]
pub struct GradeArgs {
    /// Rubric JSON file
    #[arg(short, long)]
    pub rubric: PathBuf,

    /// HTML document to grade
    #[arg(short, long)]
    pub document: PathBuf,

    /// Write grade-report.json into this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum number of form controls the document must contain
    #[arg(long)]
    pub min_controls: Option<usize>,
}

/// One row per rubric field
#[derive(Serialize)]
pub struct FieldRow {
    pub field: String,
    pub field_type: String,
    pub outcomes: Vec<String>,
}

impl From<&FieldReport> for FieldRow {
    fn from(report: &FieldReport) -> Self {
        Self {
            field: report.id.clone(),
            field_type: report.field_type.clone(),
            outcomes: CheckKind::ALL
                .iter()
                .map(|kind| report.outcome(*kind).map_or("-", outcome_symbol).to_string())
                .collect(),
        }
    }
}

impl TableDisplay for FieldRow {
    fn headers() -> Vec<&'static str> {
        vec![
            "Field",
            "Type",
            "Presence",
            "Type Check",
            "Required",
            "Validation",
            "Label",
            "Placeholder",
        ]
    }

    fn row(&self) -> Vec<String> {
        let mut row = vec![self.field.clone(), self.field_type.clone()];
        row.extend(self.outcomes.iter().cloned());
        row
    }
}

pub async fn execute(args: GradeArgs, mut config: GraderConfig, format: OutputFormat) -> Result<bool> {
    if let Some(min) = args.min_controls {
        config.structure.min_controls = Some(min);
    }
    let output_dir = args.output.or_else(|| config.report.output_dir.clone());
    info!(
        "Grading {} against {}",
        args.document.display(),
        args.rubric.display()
    );

    let report = Grader::new(config)
        .grade_files(&args.rubric, &args.document)
        .with_context(|| format!("Failed to grade {}", args.document.display()))?;

    print_report(&report, format);

    if let Some(dir) = output_dir {
        let path = report.write_json(&dir)?;
        info!("Wrote grade report to {}", path.display());
        if format != OutputFormat::Json {
            print_info(&format!("Report written to {}", path.display()));
        }
    }

    Ok(report.is_success())
}

fn print_report(report: &GradeReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(report);
        return;
    }

    let rows: Vec<FieldRow> = report.fields.iter().map(FieldRow::from).collect();
    print_list(&rows, format);

    println!(
        "Submit button: {}   Form element: {}   Controls: {} ({})",
        outcome_symbol(&report.submit_button),
        outcome_symbol(&report.structure.form),
        outcome_symbol(&report.structure.controls),
        report.structure.control_count
    );
    println!();

    for failure in report.failures() {
        print_error(&format!(
            "{} [{}]: {}",
            failure.subject.bold(),
            failure.check,
            failure.message
        ));
    }

    let summary = format!(
        "{} passed, {} failed, {} skipped ({} ms)",
        report.summary.passed, report.summary.failed, report.summary.skipped, report.duration_ms
    );
    if report.is_success() {
        print_success(&summary);
    } else {
        print_error(&summary.red().to_string());
    }
}
