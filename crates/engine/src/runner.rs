//! Grading runner
//!
//! Runs every rule checker over every rubric field, plus the submit button
//! and structure checks, and collects the outcomes into a [`GradeReport`].
//! Check failures are recorded and grading continues; only loading the
//! rubric or the document can abort a run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use formgrade_common::{CheckError, Error, FailureKind, FieldSpec, FormSpec, Result};

use crate::checks::{check_submit_button, CheckKind};
use crate::config::GraderConfig;
use crate::dom::{Document, Query};

/// Report file name inside the output directory
pub const REPORT_FILE: &str = "grade-report.json";

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail { kind: FailureKind, message: String },
    Skipped,
}

impl Outcome {
    fn from_check(result: std::result::Result<(), CheckError>) -> Self {
        match result {
            Ok(()) => Outcome::Pass,
            Err(e) => Outcome::Fail {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail { .. })
    }

    /// Failure message, if this outcome failed
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Fail { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// One category's outcome for a field
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub check: CheckKind,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Outcomes for one rubric field, in category order
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub checks: Vec<CheckOutcome>,
}

impl FieldReport {
    pub fn passed(&self) -> bool {
        !self.checks.iter().any(|c| c.outcome.is_fail())
    }

    pub fn outcome(&self, check: CheckKind) -> Option<&Outcome> {
        self.checks
            .iter()
            .find(|c| c.check == check)
            .map(|c| &c.outcome)
    }
}

/// Document-level structure outcomes
#[derive(Debug, Clone, Serialize)]
pub struct StructureReport {
    pub form: Outcome,
    pub controls: Outcome,
    pub control_count: usize,
}

/// Check totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail { .. } => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

/// A flattened failure for human-readable listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Field id, `submitButton` or `structure`
    pub subject: String,
    pub check: String,
    pub message: String,
}

/// Result of grading one document against one rubric
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub rubric_id: String,
    pub generated_at: DateTime<Utc>,
    pub fields: Vec<FieldReport>,
    pub submit_button: Outcome,
    pub structure: StructureReport,
    pub summary: Summary,
    pub duration_ms: u64,
}

impl GradeReport {
    /// No check failed
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Every failure, fields first in rubric order
    pub fn failures(&self) -> Vec<Failure> {
        let mut failures = Vec::new();
        for field in &self.fields {
            for check in &field.checks {
                if let Some(message) = check.outcome.message() {
                    failures.push(Failure {
                        subject: field.id.clone(),
                        check: check.check.to_string(),
                        message: message.to_string(),
                    });
                }
            }
        }
        if let Some(message) = self.submit_button.message() {
            failures.push(Failure {
                subject: "submitButton".to_string(),
                check: "submit".to_string(),
                message: message.to_string(),
            });
        }
        for (check, outcome) in [("form", &self.structure.form), ("controls", &self.structure.controls)] {
            if let Some(message) = outcome.message() {
                failures.push(Failure {
                    subject: "structure".to_string(),
                    check: check.to_string(),
                    message: message.to_string(),
                });
            }
        }
        failures
    }

    /// Write the report as pretty JSON into `dir`
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Report(e.to_string()))?;
        std::fs::write(&path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path)
    }
}

/// Grades documents against rubrics
#[derive(Debug, Clone, Default)]
pub struct Grader {
    config: GraderConfig,
}

impl Grader {
    pub fn new(config: GraderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Load a rubric and a document from disk, then grade
    pub fn grade_files(&self, rubric_path: &Path, document_path: &Path) -> Result<GradeReport> {
        let rubric = FormSpec::from_file(rubric_path)?;
        let document = Document::from_file(document_path)?;
        Ok(self.grade(&rubric, &document))
    }

    /// Grade a loaded document
    pub fn grade(&self, rubric: &FormSpec, document: &Document) -> GradeReport {
        let start = Instant::now();
        info!("Grading {} field(s) for \"{}\"", rubric.fields.len(), rubric.id);

        let mut summary = Summary::default();
        let fields: Vec<FieldReport> = rubric
            .fields
            .iter()
            .map(|field| grade_field(document, field))
            .collect();
        for field in &fields {
            for check in &field.checks {
                summary.count(&check.outcome);
            }
        }

        let submit_button = Outcome::from_check(check_submit_button(document, &rubric.submit_button));
        summary.count(&submit_button);

        let structure = self.check_structure(document);
        summary.count(&structure.form);
        summary.count(&structure.controls);

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Grade results: {} passed, {} failed, {} skipped ({} ms)",
            summary.passed, summary.failed, summary.skipped, duration_ms
        );

        GradeReport {
            rubric_id: rubric.id.clone(),
            generated_at: Utc::now(),
            fields,
            submit_button,
            structure,
            summary,
            duration_ms,
        }
    }

    fn check_structure(&self, document: &Document) -> StructureReport {
        let dom = document.dom();

        let form = if dom.query(&Query::tag("form")).is_some() {
            Outcome::Pass
        } else {
            warn!("Document has no form element");
            Outcome::Fail {
                kind: FailureKind::FormNotFound,
                message: "Document should contain a form element".to_string(),
            }
        };

        let control_count = dom.controls().len();
        let controls = match self.config.structure.min_controls {
            None => Outcome::Skipped,
            Some(min) if control_count >= min => Outcome::Pass,
            Some(min) => Outcome::Fail {
                kind: FailureKind::ControlCount,
                message: format!(
                    "Form should have at least {} input elements, but found {}",
                    min, control_count
                ),
            },
        };

        StructureReport {
            form,
            controls,
            control_count,
        }
    }
}

fn grade_field(document: &Document, field: &FieldSpec) -> FieldReport {
    let checks = CheckKind::ALL
        .iter()
        .map(|kind| {
            let outcome = if kind.applies_to(field) {
                Outcome::from_check(kind.run(document, field))
            } else {
                Outcome::Skipped
            };
            debug!("{} {}: {:?}", field.id, kind, outcome);
            CheckOutcome {
                check: *kind,
                outcome,
            }
        })
        .collect();

    FieldReport {
        id: field.id.clone(),
        field_type: field.field_type.to_string(),
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgrade_common::{FieldType, SubmitButtonSpec};

    fn rubric(fields: Vec<FieldSpec>) -> FormSpec {
        FormSpec {
            id: "signup".to_string(),
            fields,
            submit_button: SubmitButtonSpec {
                id: "submit".to_string(),
                text: Some("Sign up".to_string()),
            },
        }
    }

    #[test]
    fn test_undeclared_aspects_are_skipped() {
        let doc = Document::parse(
            r#"<form><input id="name"><button id="submit">Sign up</button></form>"#,
        );
        let report = Grader::default().grade(
            &rubric(vec![FieldSpec::new("name", FieldType::Text)]),
            &doc,
        );

        let field = &report.fields[0];
        assert!(field.passed());
        assert_eq!(field.outcome(CheckKind::Label), Some(&Outcome::Skipped));
        assert_eq!(field.outcome(CheckKind::Validation), Some(&Outcome::Skipped));
        assert_eq!(field.outcome(CheckKind::Placeholder), Some(&Outcome::Skipped));
        assert_eq!(report.submit_button, Outcome::Pass);
        // min_controls is not configured by default
        assert_eq!(report.structure.controls, Outcome::Skipped);
        assert!(report.is_success());
    }

    #[test]
    fn test_missing_field_fails_every_declared_category() {
        let doc = Document::parse(r#"<form><button id="submit">Sign up</button></form>"#);
        let field = FieldSpec::new("email", FieldType::Email)
            .required(true)
            .with_label("Email");
        let report = Grader::default().grade(&rubric(vec![field]), &doc);

        assert_eq!(report.summary.failed, 4);
        let failures = report.failures();
        assert!(failures
            .iter()
            .all(|f| f.subject == "email" && f.message == "Field with id/name \"email\" not found"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_structure_checks() {
        let doc = Document::parse(r#"<input id="a"><input id="b"><button id="submit">Sign up</button>"#);
        let mut config = GraderConfig::default();
        config.structure.min_controls = Some(3);
        let report = Grader::new(config).grade(&rubric(vec![]), &doc);

        assert_eq!(report.structure.control_count, 2);
        assert!(matches!(
            report.structure.form,
            Outcome::Fail { kind: FailureKind::FormNotFound, .. }
        ));
        assert_eq!(
            report.structure.controls.message(),
            Some("Form should have at least 3 input elements, but found 2")
        );
        let checks: Vec<String> = report.failures().into_iter().map(|f| f.check).collect();
        assert_eq!(checks, vec!["form", "controls"]);
    }

    #[test]
    fn test_write_json() {
        let doc = Document::parse(r#"<form><button id="submit">Sign up</button></form>"#);
        let report = Grader::default().grade(&rubric(vec![]), &doc);

        let dir = tempfile::tempdir().unwrap();
        let path = report.write_json(&dir.path().join("out")).unwrap();
        assert!(path.ends_with(REPORT_FILE));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["rubric_id"], "signup");
        assert_eq!(json["submit_button"]["status"], "pass");
        assert_eq!(json["structure"]["controls"]["status"], "skipped");
    }
}
