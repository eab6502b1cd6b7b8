//! Rubric command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use formgrade_common::{FieldSpec, FormSpec};

use crate::output::{print_info, print_json, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RubricArgs {
    /// Rubric JSON file
    #[arg(short, long)]
    pub rubric: PathBuf,
}

/// Field summary for display
#[derive(Serialize)]
pub struct FieldInfo {
    pub id: String,
    pub field_type: String,
    pub required: bool,
    pub label: String,
    pub placeholder: String,
    pub validation: String,
}

impl From<&FieldSpec> for FieldInfo {
    fn from(field: &FieldSpec) -> Self {
        let validation = field
            .validation
            .as_ref()
            .map(|v| {
                v.expected_attributes()
                    .into_iter()
                    .map(|(constraint, value)| format!("{}={}", constraint, value))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        Self {
            id: field.id.clone(),
            field_type: field.field_type.to_string(),
            required: field.required,
            label: field.expected_label().unwrap_or_default().to_string(),
            placeholder: field.expected_placeholder().unwrap_or_default().to_string(),
            validation,
        }
    }
}

impl TableDisplay for FieldInfo {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Type", "Required", "Label", "Placeholder", "Validation"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.field_type.clone(),
            if self.required { "yes" } else { "no" }.to_string(),
            self.label.clone(),
            self.placeholder.clone(),
            self.validation.clone(),
        ]
    }
}

pub async fn execute(args: RubricArgs, format: OutputFormat) -> Result<bool> {
    let rubric = FormSpec::from_file(&args.rubric)
        .with_context(|| format!("Failed to load rubric {}", args.rubric.display()))?;
    info!("Rubric {} declares {} field(s)", rubric.id, rubric.fields.len());

    if format == OutputFormat::Json {
        print_json(&rubric);
        return Ok(true);
    }

    let fields: Vec<FieldInfo> = rubric.fields.iter().map(FieldInfo::from).collect();
    print_list(&fields, format);

    let button = &rubric.submit_button;
    match button.text.as_deref().filter(|t| !t.is_empty()) {
        Some(text) => print_info(&format!("Submit button: #{} containing \"{}\"", button.id, text)),
        None => print_info(&format!("Submit button: #{}", button.id)),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgrade_common::{FieldType, Validation};

    #[test]
    fn test_field_info_summarises_validation() {
        let field = FieldSpec::new("age", FieldType::Number)
            .required(true)
            .with_label("Age")
            .with_validation(Validation {
                min: Some(18i64.into()),
                max_length: Some("3".into()),
                ..Validation::default()
            });

        let info = FieldInfo::from(&field);
        assert_eq!(
            info.row(),
            vec!["age", "number", "yes", "Age", "", "min=18 maxLength=3"]
        );
    }
}
